//! Case lookup and privacy-redaction engine.
//!
//! Resolves a citizen identifier to every matching case record and
//! composes the conversational reply. Records whose subject is a minor
//! are never rendered in detail: when every match involves a minor the
//! whole reply collapses to a single redacted summary, and in mixed sets
//! each minor case is replaced by a redacted card while adult cases keep
//! their full detail.
//!
//! Contact information (assigned defender and supervisor) is taken from
//! the first matching record only, even when a person has several cases;
//! minor status is evaluated across all of them. That asymmetry is a
//! business rule, not an accident.
//!
//! Composition faults never escape: [`lookup`] maps any internal error to
//! a generic retry-later fragment after logging the full chain.

use anyhow::Result;
use std::fmt::Write;
use tracing::error;

use crate::fields::{self, aliases, NOT_AVAILABLE};
use crate::minor;
use crate::models::{Button, Fragment};
use crate::store::{CaseStore, Record};

/// Conversation slot holding the identifier under lookup.
pub const IDENTIFIER_SLOT: &str = "numero_identificacion";

/// Outcome of one lookup: ordered fragments plus whether the identifier
/// slot should be cleared.
pub struct LookupReply {
    pub fragments: Vec<Fragment>,
    pub clear_slot: bool,
}

/// Run a lookup for a raw identifier string. Never fails.
pub fn lookup(store: &CaseStore, raw_identifier: &str) -> LookupReply {
    match compose(store, raw_identifier) {
        Ok(reply) => reply,
        Err(err) => {
            error!(error = %format!("{err:#}"), "case lookup failed");
            LookupReply {
                fragments: vec![Fragment::text(
                    "Ocurrió un problema al consultar tu proceso. Intenta de nuevo en un momento.",
                )],
                clear_slot: true,
            }
        }
    }
}

fn compose(store: &CaseStore, raw_identifier: &str) -> Result<LookupReply> {
    if store.is_empty() {
        return Ok(LookupReply {
            fragments: vec![Fragment::text(
                "No puedo acceder a la base en este momento. Intenta más tarde.",
            )],
            clear_slot: false,
        });
    }

    let identifier = fields::digits(raw_identifier);
    if identifier.is_empty() {
        return Ok(LookupReply {
            fragments: vec![Fragment::text(
                "No recibí el número de identificación. ¿Puedes indicarlo de nuevo?",
            )],
            clear_slot: false,
        });
    }

    let matches = store.find_by_identifier(&identifier);
    if matches.is_empty() {
        return Ok(LookupReply {
            fragments: vec![
                Fragment::with_buttons(
                    "No encontré registros con esa cédula. \
                     ¿Quieres intentar de nuevo o hablar con un asesor?",
                    vec![
                        Button::new("🔁 Intentar de nuevo", "/consultar_proceso"),
                        Button::new("👤 Hablar con una persona", "/hablar_con_humano"),
                    ],
                ),
            ],
            clear_slot: true,
        });
    }

    let contact = Contact::from_record(matches[0]);
    let mut fragments = Vec::new();

    let all_minor = matches.iter().all(|r| minor::is_minor(r));
    if all_minor {
        // No header, no detail, no name: one minimal card for the whole set.
        fragments.push(Fragment::text(redacted_card(None, &contact)?));
    } else {
        fragments.push(Fragment::text(contact.header()));
        for (index, record) in matches.iter().enumerate() {
            let case_number = index + 1;
            if minor::is_minor(record) {
                fragments.push(Fragment::text(redacted_card(Some(case_number), &contact)?));
            } else {
                fragments.push(Fragment::text(detail_card(case_number, record)?));
            }
        }
    }

    fragments.push(Fragment::with_buttons(
        "\n¿Quieres hacer otra consulta o volver al menú?",
        vec![
            Button::new("🔁 Consultar otro número de documento", "/consultar_proceso"),
            Button::new("🏠 Menú principal", "/saludar"),
        ],
    ));

    Ok(LookupReply {
        fragments,
        clear_slot: true,
    })
}

/// Contact lines resolved from the first matching record.
struct Contact {
    defender: String,
    supervisor: String,
    has_supervisor: bool,
}

impl Contact {
    fn from_record(record: &Record) -> Contact {
        let defender_name = fields::resolve_or_na(record, aliases::DEFENDER);
        let defender_email = fields::resolve_or_na(record, aliases::DEFENDER_EMAIL);
        let supervisor_name = fields::resolve_or_na(record, aliases::SUPERVISOR);
        let supervisor_email = fields::resolve_or_na(record, aliases::SUPERVISOR_EMAIL);

        Contact {
            defender: display_contact(&defender_name, &defender_email),
            supervisor: display_contact(&supervisor_name, &supervisor_email),
            has_supervisor: supervisor_name != NOT_AVAILABLE || supervisor_email != NOT_AVAILABLE,
        }
    }

    /// Header fragment for non-redacted replies. The supervisor line only
    /// appears when either the name or the email resolved.
    fn header(&self) -> String {
        let mut text = format!("**Defensor asignado:** {}", self.defender);
        if self.has_supervisor {
            text.push_str(&format!("\n**Supervisor:** {}", self.supervisor));
        }
        text
    }
}

/// `"Name (email)"`, `"Name"` alone without an email, `"No disponible"`
/// when the name itself is unresolved.
fn display_contact(name: &str, email: &str) -> String {
    let shown = if name == NOT_AVAILABLE {
        "No disponible"
    } else {
        name
    };
    if email == NOT_AVAILABLE {
        shown.to_string()
    } else {
        format!("{shown} ({email})")
    }
}

/// Minimal card for a case involving a minor: notice + contacts only.
fn redacted_card(case_number: Option<usize>, contact: &Contact) -> Result<String> {
    let mut card = String::new();
    if let Some(n) = case_number {
        writeln!(card, "### Proceso {n}")?;
    }
    write!(
        card,
        "**Caso con persona menor de edad.**\n\
         **Defensor(a):** {}\n\
         **Supervisor:** {}",
        contact.defender, contact.supervisor
    )?;
    Ok(card)
}

/// Full detail card for an adult case. Every field falls back to the
/// `"NA"` sentinel independently.
fn detail_card(case_number: usize, record: &Record) -> Result<String> {
    let captured = {
        let status = fields::resolve_or_na(record, aliases::CAPTURED);
        let capture_type = fields::resolve_or_na(record, aliases::CAPTURE_TYPE);
        if capture_type == NOT_AVAILABLE {
            status
        } else {
            format!("{status} ({capture_type})")
        }
    };

    let mut card = String::new();
    writeln!(card, "### Proceso {case_number}")?;
    writeln!(
        card,
        "**Radicado:** `{}`",
        fields::resolve_or_na(record, aliases::CASE_NUMBER)
    )?;
    writeln!(
        card,
        "- **Departamento:** {}",
        fields::resolve_or_na(record, aliases::DEPARTMENT)
    )?;
    writeln!(
        card,
        "- **Municipio:** {}",
        fields::resolve_or_na(record, aliases::MUNICIPALITY)
    )?;
    writeln!(
        card,
        "- **Juzgado:** {}",
        fields::resolve_or_na(record, aliases::COURT)
    )?;
    writeln!(
        card,
        "- **Inicio de proceso:** {}",
        fields::resolve_or_na(record, aliases::PROCESS_START)
    )?;
    writeln!(
        card,
        "- **Delito:** {}",
        fields::resolve_or_na(record, aliases::OFFENSE)
    )?;
    writeln!(card, "- **Capturado:** {captured}")?;
    writeln!(
        card,
        "- **Medida:** {}",
        fields::resolve_or_na(record, aliases::MEASURE)
    )?;
    write!(
        card,
        "- **Centro carcelario:** {}",
        fields::resolve_or_na(record, aliases::FACILITY)
    )?;
    Ok(card)
}
