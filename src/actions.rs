//! Server-side conversation actions.
//!
//! The dialogue backend delegates anything that needs server logic (the
//! case lookup, form validation, human handoff, slot bookkeeping) to a
//! named [`Action`]. Actions are registered in an [`ActionRegistry`]
//! and dispatched by the webhook handler; each run collects its outbound
//! fragments in a [`Dispatcher`] and returns the conversation [`Event`]s
//! to apply.
//!
//! # Registered actions
//!
//! | Name | Purpose |
//! |------|---------|
//! | `action_lookup_cedula` | Case lookup with minor-privacy redaction |
//! | `action_handoff` | Hand the conversation to a human advisor |
//! | `action_reset_pqrs_slots` | Clear PQRSDF form slots between flows |
//! | `validate_consulta_proceso_form` | Identifier validation |
//! | `validate_pqrsdf_form` | PQRSDF form field validation |
//! | `validate_contacto_form` | Contact form field validation |

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use crate::config::Config;
use crate::forms::{ValidateConsultaProcesoForm, ValidateContactoForm, ValidatePqrsdfForm};
use crate::lookup::{self, IDENTIFIER_SLOT};
use crate::models::{Button, Event, Fragment, Tracker};
use crate::store::CaseStore;

/// Shared resources available to every action run.
pub struct ActionContext {
    pub config: Arc<Config>,
    pub store: Arc<CaseStore>,
}

/// Collects outbound fragments in utterance order during an action run.
#[derive(Default)]
pub struct Dispatcher {
    messages: Vec<Fragment>,
}

impl Dispatcher {
    pub fn new() -> Dispatcher {
        Dispatcher::default()
    }

    pub fn utter(&mut self, text: impl Into<String>) {
        self.messages.push(Fragment::text(text));
    }

    pub fn utter_with_buttons(&mut self, text: impl Into<String>, buttons: Vec<Button>) {
        self.messages.push(Fragment::with_buttons(text, buttons));
    }

    pub fn push(&mut self, fragment: Fragment) {
        self.messages.push(fragment);
    }

    pub fn messages(&self) -> &[Fragment] {
        &self.messages
    }

    pub fn into_messages(self) -> Vec<Fragment> {
        self.messages
    }
}

/// A named server-side action the dialogue backend can invoke.
#[async_trait]
pub trait Action: Send + Sync {
    /// Action name as referenced in the backend's domain (e.g.
    /// `"action_lookup_cedula"`, `"validate_pqrsdf_form"`).
    fn name(&self) -> &str;

    /// One-line description, shown in `GET /actions` and logs.
    fn description(&self) -> &str;

    /// Run the action against the current tracker state. Fragments go
    /// through the dispatcher; returned events are applied by the backend.
    async fn run(
        &self,
        tracker: &Tracker,
        dispatcher: &mut Dispatcher,
        ctx: &ActionContext,
    ) -> Result<Vec<Event>>;
}

// ═══════════════════════════════════════════════════════════════════════
// Concrete actions
// ═══════════════════════════════════════════════════════════════════════

/// Case lookup by identification number.
///
/// Thin adapter over [`lookup::lookup`]: reads the identifier slot,
/// forwards the reply fragments, and emits the slot-clear event when the
/// engine asks for it. The engine itself never faults outward.
pub struct LookupCedulaAction;

#[async_trait]
impl Action for LookupCedulaAction {
    fn name(&self) -> &str {
        "action_lookup_cedula"
    }

    fn description(&self) -> &str {
        "Consulta de procesos por número de identificación"
    }

    async fn run(
        &self,
        tracker: &Tracker,
        dispatcher: &mut Dispatcher,
        ctx: &ActionContext,
    ) -> Result<Vec<Event>> {
        let raw = tracker.slot_str(IDENTIFIER_SLOT).unwrap_or_default();
        let reply = lookup::lookup(&ctx.store, &raw);
        for fragment in reply.fragments {
            dispatcher.push(fragment);
        }
        if reply.clear_slot {
            Ok(vec![Event::clear_slot(IDENTIFIER_SLOT)])
        } else {
            Ok(Vec::new())
        }
    }
}

/// Hand the conversation over to a human advisor, then start the contact
/// form so the advisor has a name and phone number to work with.
pub struct HandoffAction;

#[async_trait]
impl Action for HandoffAction {
    fn name(&self) -> &str {
        "action_handoff"
    }

    fn description(&self) -> &str {
        "Transferencia a un asesor humano"
    }

    async fn run(
        &self,
        _tracker: &Tracker,
        dispatcher: &mut Dispatcher,
        _ctx: &ActionContext,
    ) -> Result<Vec<Event>> {
        dispatcher.utter(
            "Te pondré en contacto con un asesor humano. \
             Si quieres, puedes dejar tu **nombre** y **teléfono** para adelantar la gestión.",
        );
        Ok(vec![Event::followup("contacto_form")])
    }
}

/// Slots used by the PQRSDF form, cleared together so stale values never
/// leak into other flows.
pub const PQRS_SLOTS: &[&str] = &[
    "tipo_pqrs",
    "nombre_completo",
    "numero_identificacion",
    "correo_contacto",
    "telefono_contacto",
    "descripcion_caso",
    "medio_notificacion",
    "requested_slot",
];

/// Clear every PQRSDF slot when the form closes.
pub struct ResetPqrsSlotsAction;

#[async_trait]
impl Action for ResetPqrsSlotsAction {
    fn name(&self) -> &str {
        "action_reset_pqrs_slots"
    }

    fn description(&self) -> &str {
        "Limpieza de slots del formulario PQRSDF"
    }

    async fn run(
        &self,
        _tracker: &Tracker,
        _dispatcher: &mut Dispatcher,
        _ctx: &ActionContext,
    ) -> Result<Vec<Event>> {
        Ok(PQRS_SLOTS.iter().map(|slot| Event::clear_slot(*slot)).collect())
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Registry
// ═══════════════════════════════════════════════════════════════════════

/// Registry of actions, dispatched by name.
pub struct ActionRegistry {
    actions: Vec<Box<dyn Action>>,
}

impl ActionRegistry {
    /// Create an empty registry.
    pub fn new() -> ActionRegistry {
        ActionRegistry {
            actions: Vec::new(),
        }
    }

    /// Create a registry pre-loaded with every built-in action and form
    /// validator.
    pub fn with_builtins() -> ActionRegistry {
        let mut registry = ActionRegistry::new();
        registry.register(Box::new(LookupCedulaAction));
        registry.register(Box::new(HandoffAction));
        registry.register(Box::new(ResetPqrsSlotsAction));
        registry.register(Box::new(ValidateConsultaProcesoForm));
        registry.register(Box::new(ValidatePqrsdfForm));
        registry.register(Box::new(ValidateContactoForm));
        registry
    }

    /// Register an action.
    pub fn register(&mut self, action: Box<dyn Action>) {
        self.actions.push(action);
    }

    /// Get all registered actions.
    pub fn actions(&self) -> &[Box<dyn Action>] {
        &self.actions
    }

    /// Find an action by name.
    pub fn find(&self, name: &str) -> Option<&dyn Action> {
        self.actions
            .iter()
            .find(|a| a.name() == name)
            .map(|a| a.as_ref())
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }
}

impl Default for ActionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn test_ctx(records: Vec<crate::store::Record>) -> ActionContext {
        ActionContext {
            config: Arc::new(Config::default()),
            store: Arc::new(CaseStore::from_records(records)),
        }
    }

    fn tracker_with_slots(slots: serde_json::Value) -> Tracker {
        serde_json::from_value(json!({ "sender_id": "t", "slots": slots })).unwrap()
    }

    #[tokio::test]
    async fn test_registry_finds_builtins_by_name() {
        let registry = ActionRegistry::with_builtins();
        assert_eq!(registry.len(), 6);
        assert!(registry.find("action_lookup_cedula").is_some());
        assert!(registry.find("validate_contacto_form").is_some());
        assert!(registry.find("action_desconocida").is_none());
    }

    #[tokio::test]
    async fn test_handoff_utterance_and_followup() {
        let ctx = test_ctx(Vec::new());
        let mut dispatcher = Dispatcher::new();
        let events = HandoffAction
            .run(&Tracker::default(), &mut dispatcher, &ctx)
            .await
            .unwrap();
        assert_eq!(events, vec![Event::followup("contacto_form")]);
        assert_eq!(dispatcher.messages().len(), 1);
        assert!(dispatcher.messages()[0].text.contains("asesor humano"));
    }

    #[tokio::test]
    async fn test_reset_clears_every_pqrs_slot() {
        let ctx = test_ctx(Vec::new());
        let mut dispatcher = Dispatcher::new();
        let events = ResetPqrsSlotsAction
            .run(&Tracker::default(), &mut dispatcher, &ctx)
            .await
            .unwrap();
        assert_eq!(events.len(), PQRS_SLOTS.len());
        assert!(events.contains(&Event::clear_slot("requested_slot")));
        assert!(dispatcher.messages().is_empty());
    }

    #[tokio::test]
    async fn test_lookup_action_clears_slot_on_no_match() {
        let record: crate::store::Record = [("Cédula", "111")]
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let ctx = test_ctx(vec![record]);
        let tracker = tracker_with_slots(json!({ "numero_identificacion": "222" }));
        let mut dispatcher = Dispatcher::new();
        let events = LookupCedulaAction
            .run(&tracker, &mut dispatcher, &ctx)
            .await
            .unwrap();
        assert_eq!(events, vec![Event::clear_slot(IDENTIFIER_SLOT)]);
        assert_eq!(dispatcher.messages()[0].buttons.len(), 2);
    }

    #[tokio::test]
    async fn test_lookup_action_missing_identifier_keeps_slots() {
        let record: crate::store::Record = [("Cédula", "111")]
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let ctx = test_ctx(vec![record]);
        let mut dispatcher = Dispatcher::new();
        let events = LookupCedulaAction
            .run(&Tracker::default(), &mut dispatcher, &ctx)
            .await
            .unwrap();
        assert!(events.is_empty());
        assert!(dispatcher.messages()[0].text.contains("No recibí"));
    }
}
