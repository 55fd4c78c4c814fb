//! End-to-end lookup scenarios against a record store on disk.

use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

use defensoria_bot::lookup::{lookup, LookupReply};
use defensoria_bot::store::CaseStore;

fn write_store(content: &str) -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("radicados.csv");
    fs::write(&path, content).unwrap();
    (tmp, path)
}

fn run_lookup(content: &str, identifier: &str) -> LookupReply {
    let (_tmp, path) = write_store(content);
    let store = CaseStore::open(Some(&path));
    lookup(&store, identifier)
}

const MINOR_SINGLE: &str = "\
Número de identificación,Tipo de documento,Defensor asignado,Correo,Supervisor,Correo supervisor
12345678,TI,Ana Ruiz,ana@defensoria.gov.co,Luis Gil,luis@defensoria.gov.co
";

const ADULT_TWO_CASES: &str = "\
Número de identificación,Tipo de documento,Defensor asignado,Correo,Número de radicado,Departamento,Delito
99999999,CC,Ana Ruiz,ana@defensoria.gov.co,RAD-001,Antioquia,Hurto
99999999,CC,Ana Ruiz,ana@defensoria.gov.co,RAD-002,Cundinamarca,Estafa
";

const MIXED_CASES: &str = "\
Número de identificación,Tipo de documento,Defensor asignado,Número de radicado,Delito
55555555,TI,Ana Ruiz,RAD-100,Hurto
55555555,CC,Ana Ruiz,RAD-200,Estafa
";

#[test]
fn test_all_minor_emits_single_redacted_summary() {
    let reply = run_lookup(MINOR_SINGLE, "123.456.78");

    // Redacted summary plus the follow-up prompt, nothing else.
    assert_eq!(reply.fragments.len(), 2);
    let summary = &reply.fragments[0];
    assert!(summary.text.contains("menor de edad"));
    assert!(summary.text.contains("Ana Ruiz (ana@defensoria.gov.co)"));
    assert!(summary.text.contains("Luis Gil (luis@defensoria.gov.co)"));
    assert!(!summary.text.contains("Radicado"));
    assert!(!summary.text.contains("### Proceso"));
    assert!(reply.clear_slot);
}

#[test]
fn test_adult_cases_get_header_and_detail_cards_in_order() {
    let reply = run_lookup(ADULT_TWO_CASES, "99999999");

    // Header, one card per case, follow-up.
    assert_eq!(reply.fragments.len(), 4);
    assert!(reply.fragments[0].text.starts_with("**Defensor asignado:**"));
    assert!(reply.fragments[1].text.contains("### Proceso 1"));
    assert!(reply.fragments[1].text.contains("`RAD-001`"));
    assert!(reply.fragments[1].text.contains("- **Delito:** Hurto"));
    assert!(reply.fragments[2].text.contains("### Proceso 2"));
    assert!(reply.fragments[2].text.contains("`RAD-002`"));
    assert_eq!(reply.fragments[3].buttons.len(), 2);
    assert!(reply.clear_slot);
}

#[test]
fn test_mixed_set_redacts_only_minor_cases() {
    let reply = run_lookup(MIXED_CASES, "55555555");

    assert_eq!(reply.fragments.len(), 4);
    // First case involves a minor: redacted card, no file details.
    assert!(reply.fragments[1].text.contains("### Proceso 1"));
    assert!(reply.fragments[1].text.contains("menor de edad"));
    assert!(!reply.fragments[1].text.contains("RAD-100"));
    // Second case is an adult: full detail.
    assert!(reply.fragments[2].text.contains("### Proceso 2"));
    assert!(reply.fragments[2].text.contains("`RAD-200`"));
}

#[test]
fn test_unmatched_identifier_offers_recovery_actions() {
    let reply = run_lookup(MINOR_SINGLE, "87654321");

    assert_eq!(reply.fragments.len(), 1);
    let fragment = &reply.fragments[0];
    assert!(fragment.text.contains("No encontré registros"));
    assert_eq!(fragment.buttons.len(), 2);
    assert_eq!(fragment.buttons[0].payload, "/consultar_proceso");
    assert_eq!(fragment.buttons[1].payload, "/hablar_con_humano");
    assert!(reply.clear_slot);
}

#[test]
fn test_blank_identifier_reprompts_without_slot_clear() {
    let reply = run_lookup(MINOR_SINGLE, "   ");

    assert_eq!(reply.fragments.len(), 1);
    assert!(reply.fragments[0].text.contains("No recibí"));
    assert!(!reply.clear_slot);
}

#[test]
fn test_missing_store_reports_unavailable_without_slot_clear() {
    let tmp = TempDir::new().unwrap();
    let store = CaseStore::open(Some(&tmp.path().join("no-such.csv")));
    let reply = lookup(&store, "12345678");

    assert_eq!(reply.fragments.len(), 1);
    assert!(reply.fragments[0].text.contains("No puedo acceder"));
    assert!(!reply.clear_slot);
}

#[test]
fn test_snake_case_headers_resolve_through_aliases() {
    let csv = "\
numero_identificacion,tipo_documento,defensor_asignado,radicado
11112222,CC,Ana Ruiz,RAD-900
";
    let reply = run_lookup(csv, "11112222");
    assert!(reply.fragments[0].text.contains("Ana Ruiz"));
    assert!(reply.fragments[1].text.contains("`RAD-900`"));
}

#[test]
fn test_identifier_matching_ignores_formatting_on_both_sides() {
    let csv = "\
Cédula,Tipo de documento
12.345.678,CC
";
    let reply = run_lookup(csv, "12345678");
    // Matched: header + detail + follow-up.
    assert_eq!(reply.fragments.len(), 3);

    let reply = run_lookup(csv, "123-456-78");
    assert_eq!(reply.fragments.len(), 3);
}

#[test]
fn test_contact_info_comes_from_first_match_only() {
    let csv = "\
Cédula,Tipo de documento,Defensor asignado,Correo
777,CC,Primera Defensora,primera@defensoria.gov.co
777,CC,Segunda Defensora,segunda@defensoria.gov.co
";
    let reply = run_lookup(csv, "777");
    assert!(reply.fragments[0]
        .text
        .contains("Primera Defensora (primera@defensoria.gov.co)"));
    assert!(!reply.fragments[0].text.contains("Segunda Defensora"));
}
