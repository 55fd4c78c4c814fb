//! Action server HTTP endpoint.
//!
//! Exposes the registered conversation [`Action`]s to the dialogue
//! backend over the standard action-server webhook protocol.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/webhook` | Run the action named in `next_action` |
//! | `GET`  | `/actions` | List all registered actions |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! Error responses carry a machine-readable code and a message:
//!
//! ```json
//! { "error": { "code": "action_not_found", "message": "..." } }
//! ```
//!
//! Codes: `bad_request` (400), `action_not_found` (404),
//! `action_error` (500).
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted: in development the
//! browser chat widget talks to the backend and this server directly.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, info};

use crate::actions::{ActionContext, ActionRegistry, Dispatcher};
use crate::config::Config;
use crate::models::{ActionRequest, ActionResponse};
use crate::store::CaseStore;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
struct AppState {
    registry: Arc<ActionRegistry>,
    ctx: Arc<ActionContext>,
}

/// Starts the action server.
///
/// Loads the shared record store, registers every built-in action, binds
/// to `[server].bind`, and serves until the process is terminated.
pub async fn run_action_server(config: &Config) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let config = Arc::new(config.clone());
    let store = CaseStore::shared(config.store.path.as_deref());

    let registry = ActionRegistry::with_builtins();
    info!(actions = registry.len(), "registered actions");
    for action in registry.actions() {
        debug!("action {}: {}", action.name(), action.description());
    }

    let state = AppState {
        registry: Arc::new(registry),
        ctx: Arc::new(ActionContext { config, store }),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/webhook", post(handle_webhook))
        .route("/actions", get(handle_list_actions))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(state);

    info!("action server listening on http://{}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// Internal error type that converts into an HTTP response.
pub(crate) struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

pub(crate) fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

pub(crate) fn bad_gateway(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_GATEWAY,
        code: "bad_gateway".to_string(),
        message: message.into(),
    }
}

fn action_not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "action_not_found".to_string(),
        message: message.into(),
    }
}

fn action_error(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "action_error".to_string(),
        message: message.into(),
    }
}

// ============ GET /health ============

/// JSON response body for `GET /health`.
#[derive(Serialize)]
pub(crate) struct HealthResponse {
    status: String,
    version: String,
}

/// Used by container orchestration and the backend's readiness probe.
/// Shared with the chat relay, which mounts the same route.
pub(crate) async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ GET /actions ============

#[derive(Serialize)]
struct ActionInfo {
    name: String,
    description: String,
}

#[derive(Serialize)]
struct ActionListResponse {
    actions: Vec<ActionInfo>,
}

async fn handle_list_actions(State(state): State<AppState>) -> Json<ActionListResponse> {
    let actions = state
        .registry
        .actions()
        .iter()
        .map(|a| ActionInfo {
            name: a.name().to_string(),
            description: a.description().to_string(),
        })
        .collect();
    Json(ActionListResponse { actions })
}

// ============ POST /webhook ============

/// Handler for `POST /webhook`.
///
/// Looks up the action named in `next_action` and runs it against the
/// supplied tracker. Unknown actions return 404 so the backend can log a
/// domain mismatch; an action failure returns 500. The case lookup never
/// reaches the 500 path: it maps its own faults to a user-facing
/// fragment.
async fn handle_webhook(
    State(state): State<AppState>,
    Json(request): Json<ActionRequest>,
) -> Result<Json<ActionResponse>, AppError> {
    let action = state
        .registry
        .find(&request.next_action)
        .ok_or_else(|| {
            action_not_found(format!(
                "no registered action with name: {}",
                request.next_action
            ))
        })?;

    debug!(
        action = %request.next_action,
        sender = %request.tracker.sender_id,
        "running action"
    );

    let mut dispatcher = Dispatcher::new();
    let events = action
        .run(&request.tracker, &mut dispatcher, &state.ctx)
        .await
        .map_err(|e| action_error(format!("{}: {:#}", request.next_action, e)))?;

    Ok(Json(ActionResponse {
        events,
        responses: dispatcher.into_messages(),
    }))
}
