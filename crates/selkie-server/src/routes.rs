//! Actor host routes
//!
//! The four routes the sidecar calls into. Handlers normalize the request
//! into an [`InvocationDescriptor`] and hand it to the dispatcher; the
//! dispatcher's response code and body map straight onto the HTTP reply.

use crate::health::HealthCheck;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, put},
    Json, Router,
};
use bytes::Bytes;
use selkie_core::{CallKind, ConfigDocument, InvocationDescriptor, InvocationResponse};
use selkie_runtime::Dispatcher;
use serde_json::Value;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Shared state behind the router
#[derive(Clone)]
pub struct AppState {
    pub(crate) dispatcher: Arc<Dispatcher>,
    pub(crate) document: Arc<ConfigDocument>,
    pub(crate) health: Arc<dyn HealthCheck>,
}

impl AppState {
    pub fn new(
        dispatcher: Arc<Dispatcher>,
        document: ConfigDocument,
        health: Arc<dyn HealthCheck>,
    ) -> Self {
        Self {
            dispatcher,
            document: Arc::new(document),
            health,
        }
    }
}

/// Create the actor host router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/actors/:actor_type/:actor_id/method/:method_name",
            put(invoke_method),
        )
        .route(
            "/actors/:actor_type/:actor_id/method/:method_name/:reminder_name",
            put(invoke_reminder),
        )
        .route("/actors/:actor_type/:actor_id", delete(deactivate_actor))
        .route("/dapr/config", get(actor_config))
        .route("/healthz", get(healthz))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Decode a request body; a missing or malformed body reads as absent
fn decode_body(bytes: &Bytes) -> Option<Value> {
    if bytes.is_empty() {
        return None;
    }
    serde_json::from_slice(bytes).ok()
}

fn into_http(response: InvocationResponse) -> Response {
    let status =
        StatusCode::from_u16(response.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    match response.body {
        Some(body) => (status, Json(body)).into_response(),
        None => status.into_response(),
    }
}

/// PUT /actors/{type}/{id}/method/{method}
async fn invoke_method(
    State(state): State<AppState>,
    Path((actor_type, actor_id, method_name)): Path<(String, String, String)>,
    body: Bytes,
) -> Response {
    let descriptor =
        InvocationDescriptor::method(actor_type, actor_id, method_name, decode_body(&body));
    into_http(state.dispatcher.dispatch(&descriptor).await)
}

/// PUT /actors/{type}/{id}/method/{method}/{reminder}
async fn invoke_reminder(
    State(state): State<AppState>,
    Path((actor_type, actor_id, method_name, reminder_name)): Path<(
        String,
        String,
        String,
        String,
    )>,
    body: Bytes,
) -> Response {
    let descriptor = InvocationDescriptor {
        actor_type,
        actor_id,
        call: CallKind::Method,
        method_name: Some(method_name),
        reminder_name: Some(reminder_name),
        body: decode_body(&body),
    };
    into_http(state.dispatcher.dispatch(&descriptor).await)
}

/// DELETE /actors/{type}/{id}
async fn deactivate_actor(
    State(state): State<AppState>,
    Path((actor_type, actor_id)): Path<(String, String)>,
) -> Response {
    let descriptor = InvocationDescriptor::delete(actor_type, actor_id);
    into_http(state.dispatcher.dispatch(&descriptor).await)
}

/// GET /dapr/config
async fn actor_config(State(state): State<AppState>) -> Json<ConfigDocument> {
    Json(state.document.as_ref().clone())
}

/// GET /healthz
async fn healthz(State(state): State<AppState>) -> Response {
    if state.health.healthy() {
        StatusCode::OK.into_response()
    } else {
        StatusCode::INTERNAL_SERVER_ERROR.into_response()
    }
}
