//! Minor-status classification for case records.
//!
//! A record is classified as involving a minor when ANY of three signals
//! says so: the document type is a Tarjeta de Identidad, the optional age
//! column parses into [0, 18), or the optional explicit flag column is
//! truthy. The signals are independent: one positive is enough, and no
//! signal can veto another.

use crate::fields::{self, aliases};
use crate::store::Record;

/// Document-type spellings that identify a Tarjeta de Identidad, compared
/// after accent-stripping and lowercasing.
const MINOR_DOCUMENT_TYPES: &[&str] = &[
    "ti",
    "tarjeta de identidad",
    "tarjeta_identidad",
    "tarjeta identidad",
];

/// Truthy spellings for the explicit minor flag, same normalization.
const MINOR_FLAG_VALUES: &[&str] = &["si", "sí", "true", "1", "x", "yes"];

/// Whether the subject of this record is a minor.
///
/// Checks document type, then age, then the explicit flag, short-circuiting
/// on the first positive. An age that does not parse contributes nothing.
pub fn is_minor(record: &Record) -> bool {
    let doc_type = fields::strip_accents_lower(&fields::resolve(record, aliases::DOCUMENT_TYPE));
    if MINOR_DOCUMENT_TYPES.contains(&doc_type.as_str()) {
        return true;
    }

    if let Some(age) = fields::parse_int(&fields::resolve(record, aliases::AGE)) {
        if (0..18).contains(&age) {
            return true;
        }
    }

    let flag = fields::strip_accents_lower(&fields::resolve(record, aliases::MINOR_FLAG));
    MINOR_FLAG_VALUES.contains(&flag.as_str())
}
