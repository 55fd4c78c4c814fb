//! Logical-field resolution over loosely-schemed case records.
//!
//! The record store is maintained by hand in a spreadsheet, so column
//! headers drift between accented, unaccented, snake_case, and spaced
//! spellings. Each logical field is therefore described by an ordered
//! alias list; resolution tries the aliases in order and takes the first
//! non-blank value.
//!
//! Adding support for a new header spelling means appending to the
//! relevant list in [`aliases`]; no code changes elsewhere.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::store::Record;

/// Display sentinel for a field no alias could resolve.
pub const NOT_AVAILABLE: &str = "NA";

/// Accepted column-header spellings per logical field, in resolution order.
pub mod aliases {
    pub const IDENTIFICATION: &[&str] = &[
        "Número de identificación",
        "Numero de identificacion",
        "numero_identificacion",
        "Cédula",
        "Cedula",
        "cedula",
    ];
    pub const DOCUMENT_TYPE: &[&str] = &[
        "Tipo de documento",
        "tipo_documento",
        "Tipo doc",
        "tipo_doc",
        "Documento",
    ];
    pub const FULL_NAME: &[&str] = &["Nombre completo", "Usuario", "nombre_completo"];
    pub const DEFENDER: &[&str] = &["Defensor asignado", "defensor_asignado"];
    pub const DEFENDER_EMAIL: &[&str] = &["Correo", "correo", "email", "e-mail"];
    pub const SUPERVISOR: &[&str] = &["Supervisor", "supervisor"];
    pub const SUPERVISOR_EMAIL: &[&str] = &[
        "Correo supervisor",
        "Correo Supervisor",
        "correo_supervisor",
        "email_supervisor",
    ];
    pub const CASE_NUMBER: &[&str] = &["Número de radicado", "Numero de radicado", "radicado"];
    pub const DEPARTMENT: &[&str] = &["Departamento"];
    pub const MUNICIPALITY: &[&str] = &["Municipio"];
    pub const COURT: &[&str] = &["Juzgado"];
    pub const PROCESS_START: &[&str] = &["Inicio de proceso", "Inicio del proceso"];
    pub const OFFENSE: &[&str] = &["Delito"];
    pub const CAPTURED: &[&str] = &["Capturado"];
    pub const CAPTURE_TYPE: &[&str] = &["Tipo de captura"];
    pub const MEASURE: &[&str] = &["Medida impuesta"];
    pub const FACILITY: &[&str] = &[
        "Centro carcelario",
        "Centro de reclusión",
        "Centro de reclusion",
    ];
    // Optional columns, consulted by the minor-status check when present.
    pub const MINOR_FLAG: &[&str] = &[
        "Es menor",
        "es_menor",
        "Menor",
        "menor",
        "Menor de edad",
        "menor_de_edad",
    ];
    pub const AGE: &[&str] = &["Edad", "edad"];
}

/// First non-blank value among the alias candidates, trimmed.
/// Empty string when no alias resolves; use [`resolve_or_na`] for display.
pub fn resolve(record: &Record, aliases: &[&str]) -> String {
    for key in aliases {
        if let Some(value) = record.get(*key) {
            let value = value.trim();
            if !value.is_empty() {
                return value.to_string();
            }
        }
    }
    String::new()
}

/// Like [`resolve`], but substitutes the [`NOT_AVAILABLE`] sentinel when
/// no alias resolves.
pub fn resolve_or_na(record: &Record, aliases: &[&str]) -> String {
    let value = resolve(record, aliases);
    if value.is_empty() {
        NOT_AVAILABLE.to_string()
    } else {
        value
    }
}

/// Strip everything but ASCII digits. Identifiers are compared in this
/// form on both sides, so dashes, dots, and spaces never cause a miss.
pub fn digits(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// NFKD-decompose, drop combining marks, lowercase. "Petición" → "peticion".
pub fn strip_accents_lower(s: &str) -> String {
    s.nfkd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
}

/// Collapse whitespace runs to single spaces and trim the ends.
pub fn norm_spaces(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Lenient integer extraction: keeps digits and minus signs, then parses.
/// `None` when nothing parseable remains.
pub fn parse_int(s: &str) -> Option<i64> {
    let kept: String = s
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '-')
        .collect();
    kept.parse().ok()
}

/// Title-case a personal name: first letter of each word uppercased, the
/// rest lowercased, whitespace normalized.
pub fn title_case_name(s: &str) -> String {
    norm_spaces(s)
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn record(pairs: &[(&str, &str)]) -> Record {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<HashMap<_, _>>()
    }

    #[test]
    fn test_digits_strips_punctuation() {
        assert_eq!(digits("313-844-7735"), "3138447735");
        assert_eq!(digits("313 844 77 35"), "3138447735");
        assert_eq!(digits("31.38.44.77.35"), "3138447735");
        assert_eq!(digits("3138447735"), "3138447735");
    }

    #[test]
    fn test_digits_empty_input() {
        assert_eq!(digits(""), "");
        assert_eq!(digits("   "), "");
        assert_eq!(digits("abc"), "");
    }

    #[test]
    fn test_resolve_first_non_empty_wins() {
        let r = record(&[("Cédula", "123"), ("cedula", "999")]);
        assert_eq!(resolve(&r, aliases::IDENTIFICATION), "123");
    }

    #[test]
    fn test_resolve_skips_blank_values() {
        let r = record(&[("Número de identificación", "   "), ("Cedula", "456")]);
        assert_eq!(resolve(&r, aliases::IDENTIFICATION), "456");
    }

    #[test]
    fn test_resolve_missing_is_empty_string() {
        let r = record(&[("Departamento", "Antioquia")]);
        assert_eq!(resolve(&r, aliases::IDENTIFICATION), "");
        assert_eq!(resolve_or_na(&r, aliases::IDENTIFICATION), NOT_AVAILABLE);
    }

    #[test]
    fn test_strip_accents_lower() {
        assert_eq!(strip_accents_lower("Petición"), "peticion");
        assert_eq!(strip_accents_lower("SÍ"), "si");
        assert_eq!(strip_accents_lower("Tarjeta de Identidad"), "tarjeta de identidad");
    }

    #[test]
    fn test_parse_int() {
        assert_eq!(parse_int("17"), Some(17));
        assert_eq!(parse_int("17 años"), Some(17));
        assert_eq!(parse_int(""), None);
        assert_eq!(parse_int("n/a"), None);
    }

    #[test]
    fn test_title_case_name() {
        assert_eq!(title_case_name("juan  pérez"), "Juan Pérez");
        assert_eq!(title_case_name("MARÍA LÓPEZ"), "María López");
    }
}
