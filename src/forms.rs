//! Form-field validation actions.
//!
//! Each dialogue form has a matching `validate_<form>` action. When the
//! backend collects a slot it calls the form's validator, which either
//! returns a canonicalized value or rejects it, setting the slot back to
//! null and uttering a re-prompt so the form asks again.
//!
//! Only pending values are validated: the requested slot when the form
//! names one, otherwise every known form slot present in the tracker.

use anyhow::Result;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::actions::{Action, ActionContext, Dispatcher};
use crate::fields::{digits, norm_spaces, strip_accents_lower, title_case_name};
use crate::models::{Event, Tracker};

const MIN_ID_DIGITS: usize = 6;
const MAX_ID_DIGITS: usize = 12;
const MIN_NAME_CHARS: usize = 5;
const MIN_DESCRIPTION_CHARS: usize = 10;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^[A-Z0-9._%+-]+@[A-Z0-9.-]+\.[A-Z]{2,}$").unwrap());
static NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-zÁÉÍÓÚÑáéíóúñüÜ'´` ]+$").unwrap());

/// Validates one slot value: `Some(canonical)` to accept, `None` to
/// reject after uttering a re-prompt.
type SlotValidator = fn(&Value, &mut Dispatcher) -> Option<Value>;

/// Render a slot value as text for validation. Identifiers and phone
/// numbers sometimes arrive as numerics.
fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

/// Run the per-slot validators over whatever the tracker holds.
fn validate_slots(
    tracker: &Tracker,
    dispatcher: &mut Dispatcher,
    slots: &[(&str, SlotValidator)],
) -> Vec<Event> {
    let requested = tracker.requested_slot();
    let mut events = Vec::new();
    for (name, validator) in slots {
        if let Some(ref wanted) = requested {
            if wanted != name {
                continue;
            }
        }
        let Some(value) = tracker.slot(name) else {
            continue;
        };
        if value.is_null() {
            continue;
        }
        let validated = validator(value, dispatcher).unwrap_or(Value::Null);
        events.push(Event::set_slot(*name, validated));
    }
    events
}

// ═══════════════════════════════════════════════════════════════════════
// Field checks
// ═══════════════════════════════════════════════════════════════════════

fn identification_digits(value: &Value) -> Option<String> {
    let d = digits(&value_text(value));
    (MIN_ID_DIGITS..=MAX_ID_DIGITS)
        .contains(&d.len())
        .then_some(d)
}

pub(crate) fn valid_email(s: &str) -> bool {
    EMAIL_RE.is_match(s.trim())
}

pub(crate) fn valid_name(s: &str) -> bool {
    let s = norm_spaces(s);
    s.chars().count() >= MIN_NAME_CHARS && NAME_RE.is_match(&s)
}

pub(crate) fn phone_ok(digits: &str) -> bool {
    // 7 to 11 covers long landlines and mobiles.
    (7..=11).contains(&digits.len())
}

/// Canonical PQRSDF type, including common synonyms.
pub(crate) fn map_pqrs_type(raw: &str) -> Option<&'static str> {
    let t = norm_spaces(&strip_accents_lower(raw));
    match t.as_str() {
        "peticion" | "pqr" | "pqrs" | "pqrsdf" => Some("peticion"),
        "queja" => Some("queja"),
        "reclamo" => Some("reclamo"),
        "sugerencia" => Some("sugerencia"),
        "denuncia" => Some("denuncia"),
        "felicitacion" => Some("felicitacion"),
        _ => None,
    }
}

/// Map free text like "por teléfono", "correo electrónico", "notificación
/// física" to a canonical notification channel.
pub(crate) fn map_notify_channel(raw: &str) -> Option<&'static str> {
    let t = norm_spaces(&strip_accents_lower(raw));
    const PHONE: &[&str] = &["telefono", "llamada", "celular", "movil", "whatsapp"];
    const MAIL: &[&str] = &["correo", "email", "e-mail", "mail", "electronico"];
    const PHYSICAL: &[&str] = &["fisica", "domicilio", "direccion"];
    if PHONE.iter().any(|w| t.contains(w)) {
        return Some("telefono");
    }
    if MAIL.iter().any(|w| t.contains(w)) {
        return Some("correo");
    }
    if PHYSICAL.iter().any(|w| t.contains(w)) {
        return Some("fisico");
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════
// Slot validators
// ═══════════════════════════════════════════════════════════════════════

fn validate_identification_consulta(value: &Value, dispatcher: &mut Dispatcher) -> Option<Value> {
    match identification_digits(value) {
        Some(d) => Some(Value::String(d)),
        None => {
            dispatcher.utter(
                "El número de identificación debe tener **entre 6 y 12 dígitos**. \
                 Intenta de nuevo.",
            );
            None
        }
    }
}

fn validate_identification_pqrs(value: &Value, dispatcher: &mut Dispatcher) -> Option<Value> {
    match identification_digits(value) {
        Some(d) => Some(Value::String(d)),
        None => {
            dispatcher.utter("El número de identificación debe tener **entre 6 y 12 dígitos**.");
            None
        }
    }
}

fn validate_pqrs_type(value: &Value, dispatcher: &mut Dispatcher) -> Option<Value> {
    match map_pqrs_type(&value_text(value)) {
        Some(kind) => Some(Value::String(kind.to_string())),
        None => {
            dispatcher.utter(
                "Por favor indica si es **petición, queja, reclamo, sugerencia, \
                 denuncia o felicitación**.",
            );
            None
        }
    }
}

fn validate_full_name(value: &Value, dispatcher: &mut Dispatcher) -> Option<Value> {
    let s = value_text(value);
    if valid_name(&s) {
        Some(Value::String(title_case_name(&s)))
    } else {
        dispatcher.utter("Por favor ingresa tu **nombre completo** (solo letras y espacios).");
        None
    }
}

fn validate_contact_email(value: &Value, dispatcher: &mut Dispatcher) -> Option<Value> {
    let s = value_text(value).trim().to_string();
    if valid_email(&s) {
        Some(Value::String(s))
    } else {
        dispatcher.utter("Por favor ingresa un **correo válido** (ej.: nombre@dominio.com).");
        None
    }
}

fn validate_contact_phone_pqrs(value: &Value, dispatcher: &mut Dispatcher) -> Option<Value> {
    let d = digits(&value_text(value));
    if phone_ok(&d) {
        Some(Value::String(d))
    } else {
        dispatcher.utter("Por favor digita **solo números** (7 a 11 dígitos).");
        None
    }
}

fn validate_case_description(value: &Value, dispatcher: &mut Dispatcher) -> Option<Value> {
    let text = norm_spaces(&value_text(value));
    if text.chars().count() >= MIN_DESCRIPTION_CHARS {
        Some(Value::String(text))
    } else {
        dispatcher
            .utter("Describe tu caso con **al menos 10 caracteres** para poder orientarte mejor.");
        None
    }
}

fn validate_notify_channel(value: &Value, dispatcher: &mut Dispatcher) -> Option<Value> {
    match map_notify_channel(&value_text(value)) {
        Some(channel) => Some(Value::String(channel.to_string())),
        None => {
            dispatcher.utter("Por favor elige una opción válida.");
            None
        }
    }
}

fn validate_contact_name(value: &Value, dispatcher: &mut Dispatcher) -> Option<Value> {
    // Name and phone often arrive in one message ("Sebastián 3138447735");
    // drop the digits before checking the name.
    let s = value_text(value);
    let without_digits: String = s.chars().filter(|c| !c.is_ascii_digit()).collect();
    let cleaned = norm_spaces(&without_digits);
    if valid_name(&cleaned) {
        Some(Value::String(title_case_name(&cleaned)))
    } else {
        dispatcher.utter(
            "Indica tu **nombre completo** (mínimo 5 caracteres, solo letras y espacios).",
        );
        None
    }
}

fn validate_contact_phone(value: &Value, dispatcher: &mut Dispatcher) -> Option<Value> {
    let d = digits(&value_text(value));
    if phone_ok(&d) {
        Some(Value::String(d))
    } else {
        dispatcher.utter("Por favor escribe **solo números** (7 a 11 dígitos).");
        None
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Validation actions
// ═══════════════════════════════════════════════════════════════════════

const CONSULTA_SLOTS: &[(&str, SlotValidator)] =
    &[("numero_identificacion", validate_identification_consulta)];

const PQRSDF_SLOTS: &[(&str, SlotValidator)] = &[
    ("tipo_pqrs", validate_pqrs_type),
    ("nombre_completo", validate_full_name),
    ("numero_identificacion", validate_identification_pqrs),
    ("correo_contacto", validate_contact_email),
    ("telefono_contacto", validate_contact_phone_pqrs),
    ("descripcion_caso", validate_case_description),
    ("medio_notificacion", validate_notify_channel),
];

const CONTACTO_SLOTS: &[(&str, SlotValidator)] = &[
    ("nombre_contacto", validate_contact_name),
    ("telefono_contacto", validate_contact_phone),
];

/// Validates the identifier for the case-lookup form.
pub struct ValidateConsultaProcesoForm;

#[async_trait]
impl Action for ValidateConsultaProcesoForm {
    fn name(&self) -> &str {
        "validate_consulta_proceso_form"
    }

    fn description(&self) -> &str {
        "Validación del formulario de consulta de proceso"
    }

    async fn run(
        &self,
        tracker: &Tracker,
        dispatcher: &mut Dispatcher,
        _ctx: &ActionContext,
    ) -> Result<Vec<Event>> {
        Ok(validate_slots(tracker, dispatcher, CONSULTA_SLOTS))
    }
}

/// Validates the PQRSDF intake form.
pub struct ValidatePqrsdfForm;

#[async_trait]
impl Action for ValidatePqrsdfForm {
    fn name(&self) -> &str {
        "validate_pqrsdf_form"
    }

    fn description(&self) -> &str {
        "Validación del formulario PQRSDF"
    }

    async fn run(
        &self,
        tracker: &Tracker,
        dispatcher: &mut Dispatcher,
        _ctx: &ActionContext,
    ) -> Result<Vec<Event>> {
        Ok(validate_slots(tracker, dispatcher, PQRSDF_SLOTS))
    }
}

/// Validates the human-handoff contact form.
pub struct ValidateContactoForm;

#[async_trait]
impl Action for ValidateContactoForm {
    fn name(&self) -> &str {
        "validate_contacto_form"
    }

    fn description(&self) -> &str {
        "Validación del formulario de contacto"
    }

    async fn run(
        &self,
        tracker: &Tracker,
        dispatcher: &mut Dispatcher,
        _ctx: &ActionContext,
    ) -> Result<Vec<Event>> {
        Ok(validate_slots(tracker, dispatcher, CONTACTO_SLOTS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::store::CaseStore;
    use serde_json::json;
    use std::sync::Arc;

    fn test_ctx() -> ActionContext {
        ActionContext {
            config: Arc::new(Config::default()),
            store: Arc::new(CaseStore::from_records(Vec::new())),
        }
    }

    fn tracker(slots: serde_json::Value) -> Tracker {
        serde_json::from_value(json!({ "sender_id": "t", "slots": slots })).unwrap()
    }

    #[test]
    fn test_valid_email() {
        assert!(valid_email("nombre@dominio.com"));
        assert!(valid_email("a.b-c_d%e@sub.dominio.co"));
        assert!(!valid_email("sin-arroba.com"));
        assert!(!valid_email("x@dominio"));
        assert!(!valid_email(""));
    }

    #[test]
    fn test_valid_name() {
        assert!(valid_name("María López"));
        assert!(valid_name("Juan  Pérez"));
        assert!(!valid_name("Ana1 Gómez"));
        assert!(!valid_name("Ana"));
    }

    #[test]
    fn test_map_pqrs_type_synonyms_and_accents() {
        assert_eq!(map_pqrs_type("Petición"), Some("peticion"));
        assert_eq!(map_pqrs_type("PQRSDF"), Some("peticion"));
        assert_eq!(map_pqrs_type("felicitación"), Some("felicitacion"));
        assert_eq!(map_pqrs_type("queja"), Some("queja"));
        assert_eq!(map_pqrs_type("otra cosa"), None);
    }

    #[test]
    fn test_map_notify_channel_keywords() {
        assert_eq!(map_notify_channel("por teléfono"), Some("telefono"));
        assert_eq!(map_notify_channel("WhatsApp"), Some("telefono"));
        assert_eq!(map_notify_channel("correo electrónico"), Some("correo"));
        assert_eq!(map_notify_channel("notificación física"), Some("fisico"));
        assert_eq!(map_notify_channel("paloma mensajera"), None);
    }

    #[tokio::test]
    async fn test_consulta_form_accepts_and_normalizes_identifier() {
        let mut dispatcher = Dispatcher::new();
        let events = ValidateConsultaProcesoForm
            .run(
                &tracker(json!({ "numero_identificacion": "12.345.678" })),
                &mut dispatcher,
                &test_ctx(),
            )
            .await
            .unwrap();
        assert_eq!(
            events,
            vec![Event::set_slot("numero_identificacion", json!("12345678"))]
        );
        assert!(dispatcher.messages().is_empty());
    }

    #[tokio::test]
    async fn test_consulta_form_rejects_short_identifier() {
        let mut dispatcher = Dispatcher::new();
        let events = ValidateConsultaProcesoForm
            .run(
                &tracker(json!({ "numero_identificacion": "123" })),
                &mut dispatcher,
                &test_ctx(),
            )
            .await
            .unwrap();
        assert_eq!(
            events,
            vec![Event::set_slot("numero_identificacion", Value::Null)]
        );
        assert!(dispatcher.messages()[0].text.contains("entre 6 y 12"));
    }

    #[tokio::test]
    async fn test_pqrsdf_form_validates_only_requested_slot() {
        let mut dispatcher = Dispatcher::new();
        let events = ValidatePqrsdfForm
            .run(
                &tracker(json!({
                    "requested_slot": "correo_contacto",
                    "correo_contacto": "nombre@dominio.com",
                    "telefono_contacto": "esto no es un teléfono"
                })),
                &mut dispatcher,
                &test_ctx(),
            )
            .await
            .unwrap();
        assert_eq!(
            events,
            vec![Event::set_slot("correo_contacto", json!("nombre@dominio.com"))]
        );
    }

    #[tokio::test]
    async fn test_contacto_form_strips_digits_from_name() {
        let mut dispatcher = Dispatcher::new();
        let events = ValidateContactoForm
            .run(
                &tracker(json!({
                    "nombre_contacto": "sebastián ruiz 3138447735",
                    "telefono_contacto": "313 844 77 35"
                })),
                &mut dispatcher,
                &test_ctx(),
            )
            .await
            .unwrap();
        assert!(events.contains(&Event::set_slot("nombre_contacto", json!("Sebastián Ruiz"))));
        assert!(events.contains(&Event::set_slot("telefono_contacto", json!("3138447735"))));
    }
}
