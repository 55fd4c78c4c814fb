//! Chat relay between the browser widget and the dialogue backend.
//!
//! The widget speaks a single `POST /chat` request/response shape; the
//! backend's REST webhook answers with a list of messages. The relay
//! forwards the user message and flattens the backend's reply: texts are
//! joined into one `bot_response` string, buttons, images, and custom
//! payloads are accumulated in order.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/chat` | Forward a user message to the dialogue backend |
//! | `GET`  | `/health` | Health check (returns version) |

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, info};

use crate::config::Config;
use crate::models::{Button, Fragment};
use crate::server::{bad_gateway, bad_request, handle_health, AppError};

#[derive(Clone)]
struct RelayState {
    config: Arc<Config>,
    client: reqwest::Client,
}

/// Starts the chat relay.
///
/// The HTTP client carries the configured backend timeout; the backend
/// URL and bind address come from `[relay]`.
pub async fn run_relay(config: &Config) -> anyhow::Result<()> {
    let bind_addr = config.relay.bind.clone();
    let backend_url = config.relay.backend_url.clone();
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.relay.timeout_secs))
        .build()?;
    let state = RelayState {
        config: Arc::new(config.clone()),
        client,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/chat", post(handle_chat))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(state);

    info!(backend = %backend_url, "chat relay listening on http://{}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Body of `POST /chat` from the widget.
#[derive(Debug, Deserialize)]
struct ChatRequest {
    #[serde(default)]
    message: String,
    /// Session identifier; the widget may pass one to keep conversation
    /// state across messages.
    #[serde(default = "default_sender")]
    sender: String,
}

fn default_sender() -> String {
    "user".to_string()
}

/// Flattened reply for the widget.
#[derive(Debug, Serialize)]
struct ChatResponse {
    bot_response: String,
    buttons: Vec<Button>,
    images: Vec<String>,
    custom: Vec<Value>,
}

async fn handle_chat(
    State(state): State<RelayState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let message = request.message.trim().to_string();
    if message.is_empty() {
        return Err(bad_request("Mensaje vacío"));
    }

    debug!(sender = %request.sender, "relaying message to dialogue backend");

    let response = state
        .client
        .post(&state.config.relay.backend_url)
        .json(&json!({ "sender": request.sender, "message": message }))
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .map_err(|e| bad_gateway(format!("Error connecting to dialogue backend: {e}")))?;

    // A malformed backend body is treated as an empty reply rather than a
    // relay failure.
    let fragments: Vec<Fragment> = response.json().await.unwrap_or_default();
    Ok(Json(aggregate(fragments)))
}

fn aggregate(fragments: Vec<Fragment>) -> ChatResponse {
    let mut texts = Vec::new();
    let mut buttons = Vec::new();
    let mut images = Vec::new();
    let mut custom = Vec::new();

    for fragment in fragments {
        if !fragment.text.is_empty() {
            texts.push(fragment.text);
        }
        buttons.extend(fragment.buttons);
        if let Some(image) = fragment.image {
            images.push(image);
        }
        if let Some(payload) = fragment.custom {
            custom.push(payload);
        }
    }

    ChatResponse {
        bot_response: texts.join(" ").trim().to_string(),
        buttons,
        images,
        custom,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregate_joins_texts_and_accumulates_buttons() {
        let reply = aggregate(vec![
            Fragment::text("Hola."),
            Fragment::with_buttons("¿Continuar?", vec![Button::new("Sí", "/afirmar")]),
            Fragment {
                image: Some("https://example.org/logo.png".to_string()),
                ..Fragment::default()
            },
        ]);
        assert_eq!(reply.bot_response, "Hola. ¿Continuar?");
        assert_eq!(reply.buttons.len(), 1);
        assert_eq!(reply.images, vec!["https://example.org/logo.png"]);
        assert!(reply.custom.is_empty());
    }

    #[test]
    fn test_aggregate_empty_reply() {
        let reply = aggregate(Vec::new());
        assert_eq!(reply.bot_response, "");
        assert!(reply.buttons.is_empty());
    }
}
