//! Wire types shared by the action server and the chat relay.
//!
//! These mirror the dialogue backend's action-server protocol: the backend
//! POSTs an [`ActionRequest`] naming the action to run plus the current
//! conversation [`Tracker`], and receives an [`ActionResponse`] carrying
//! state [`Event`]s and outbound message [`Fragment`]s.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// One quick-reply button attached to a fragment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Button {
    pub title: String,
    pub payload: String,
}

impl Button {
    pub fn new(title: impl Into<String>, payload: impl Into<String>) -> Button {
        Button {
            title: title.into(),
            payload: payload.into(),
        }
    }
}

/// One unit of outbound conversational output.
///
/// Serialized without empty optionals so the backend's channel adapters
/// see the same shape a stock action server produces.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Fragment {
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub buttons: Vec<Button>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom: Option<Value>,
}

impl Fragment {
    pub fn text(text: impl Into<String>) -> Fragment {
        Fragment {
            text: text.into(),
            ..Fragment::default()
        }
    }

    pub fn with_buttons(text: impl Into<String>, buttons: Vec<Button>) -> Fragment {
        Fragment {
            text: text.into(),
            buttons,
            ..Fragment::default()
        }
    }
}

/// Conversation event returned to the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    /// Set (or clear, with a null value) a conversation slot.
    Slot { name: String, value: Value },
    /// Ask the backend to run another action next.
    Followup { name: String },
}

impl Event {
    pub fn set_slot(name: impl Into<String>, value: Value) -> Event {
        Event::Slot {
            name: name.into(),
            value,
        }
    }

    pub fn clear_slot(name: impl Into<String>) -> Event {
        Event::Slot {
            name: name.into(),
            value: Value::Null,
        }
    }

    pub fn followup(name: impl Into<String>) -> Event {
        Event::Followup { name: name.into() }
    }
}

/// Conversation state as supplied by the dialogue backend.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Tracker {
    #[serde(default)]
    pub sender_id: String,
    #[serde(default)]
    pub slots: HashMap<String, Value>,
    #[serde(default)]
    pub latest_message: Option<Value>,
    #[serde(default)]
    pub active_loop: Option<Value>,
}

impl Tracker {
    /// Raw slot value, if the slot exists at all.
    pub fn slot(&self, name: &str) -> Option<&Value> {
        self.slots.get(name)
    }

    /// Slot value rendered as text. Numbers are stringified (identifiers
    /// sometimes arrive as numerics); null and missing are both `None`.
    pub fn slot_str(&self, name: &str) -> Option<String> {
        match self.slots.get(name)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// The slot a form is currently asking for, when a form is active.
    pub fn requested_slot(&self) -> Option<String> {
        self.slot_str("requested_slot")
    }
}

/// Body of `POST /webhook` from the dialogue backend.
#[derive(Debug, Deserialize)]
pub struct ActionRequest {
    pub next_action: String,
    #[serde(default)]
    pub sender_id: String,
    #[serde(default)]
    pub tracker: Tracker,
    #[serde(default)]
    pub version: Option<String>,
}

/// Body of the action server's reply.
#[derive(Debug, Serialize)]
pub struct ActionResponse {
    pub events: Vec<Event>,
    pub responses: Vec<Fragment>,
}
