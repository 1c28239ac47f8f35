//! HTTP routes for the gateway.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;

use tutor_core::directive::{ActionResult, SessionMutation};
use tutor_core::{ActionId, CoreError, Dispatcher, SessionStore};

/// Maximum accepted request body.
const BODY_LIMIT_BYTES: usize = 64 * 1024;

/// Whole-request timeout.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Shared state for all routes.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub sessions: Arc<SessionStore>,
}

/// One turn from the host runtime: run an action for a sender.
#[derive(Debug, Deserialize)]
pub struct WebhookRequest {
    pub sender_id: String,
    pub action: String,
    /// Slot values extracted by the host runtime's NLU, passed through
    /// opaquely
    #[serde(default)]
    pub slots: HashMap<String, Value>,
}

/// Submission of the credential form.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub sender_id: String,
    #[serde(default)]
    pub identifier: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Error body for failed requests.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Build the gateway router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/webhook", post(webhook))
        .route("/login", post(login))
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT_BYTES))
        .layer(TimeoutLayer::new(Duration::from_secs(REQUEST_TIMEOUT_SECS)))
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn webhook(
    State(state): State<AppState>,
    Json(request): Json<WebhookRequest>,
) -> Result<Json<ActionResult>, (StatusCode, Json<ErrorResponse>)> {
    let mut session = state.sessions.load(&request.sender_id).await;

    // Host-supplied slots are staged and applied like any other mutation
    for (name, value) in request.slots {
        session.apply(&SessionMutation::SetSlot { name, value });
    }

    let action = ActionId::new(request.action);
    match state.dispatcher.execute(&action, &session).await {
        Ok(result) => {
            session.apply_result(&result);
            state.sessions.save(session).await;
            Ok(Json(result))
        }
        Err(error) => Err(map_error(error)),
    }
}

async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<ActionResult>, (StatusCode, Json<ErrorResponse>)> {
    let mut session = state.sessions.load(&request.sender_id).await;

    match state
        .dispatcher
        .submit_login(
            &session,
            request.identifier.as_deref(),
            request.password.as_deref(),
        )
        .await
    {
        Ok(result) => {
            session.apply_result(&result);
            state.sessions.save(session).await;
            Ok(Json(result))
        }
        Err(error) => Err(map_error(error)),
    }
}

fn map_error(error: CoreError) -> (StatusCode, Json<ErrorResponse>) {
    match &error {
        CoreError::InvalidAction(action) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: format!("unknown action: {action}"),
            }),
        ),
        CoreError::InvalidPendingAction(action) => {
            tracing::error!(%action, "dangling pending action");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Something went wrong. Please try again.".to_string(),
                }),
            )
        }
        CoreError::Backend(backend_error) => {
            tracing::warn!(%backend_error, "backend call failed");
            (
                StatusCode::BAD_GATEWAY,
                Json(ErrorResponse {
                    error: "Something went wrong. Please try again.".to_string(),
                }),
            )
        }
    }
}
