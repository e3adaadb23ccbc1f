//! # REST API Interface Layer
//!
//! HTTP endpoints of the birth registry. Handlers translate requests into
//! domain calls and domain errors into status codes; they hold no business
//! rules of their own.
//!
//! Every error body has the shape `{"error": "<notice>", "code": "<CODE>"}`.
//! The notice is safe to show a user; causes are logged, not returned.

pub mod actor;
pub mod auth_apis;
pub mod certificate_apis;
pub mod mappers;
pub mod record_apis;
pub mod verify_apis;

use axum::{http::StatusCode, response::Json, routing::get, Router};
use serde_json::{json, Value};
use shared::ErrorResponse;
use tracing::info;

use crate::AppState;

pub type ApiError = (StatusCode, Json<Value>);

pub fn error_body(error: &str, code: &str) -> Json<Value> {
    Json(json!(ErrorResponse::new(error, code)))
}

pub fn api_error(status: StatusCode, error: &str, code: &str) -> ApiError {
    (status, error_body(error, code))
}

/// Routes mounted under `/api`
pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .nest("/records", record_apis::router().merge(certificate_apis::router()))
        .nest("/auth", auth_apis::router())
}

/// Public verification page backend, mounted at the site root
pub fn verify_router() -> Router<AppState> {
    verify_apis::router()
}

pub async fn health() -> Json<Value> {
    info!("GET /api/health");
    Json(json!({ "status": "ok" }))
}
