//! # Verification endpoint
//!
//! Target of the QR code printed on every certificate:
//! `GET /verify/:id?hash=<digest>`.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use serde::Deserialize;
use shared::VerificationResponse;
use tracing::{error, info};

use super::mappers::record_mapper::RecordMapper;
use super::{api_error, ApiError};
use crate::domain::verification_service::VerificationError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct VerifyQuery {
    pub hash: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/verify/:id", get(verify_certificate))
}

pub async fn verify_certificate(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<VerifyQuery>,
) -> Result<Json<VerificationResponse>, ApiError> {
    info!("GET /verify/{}", id);

    let hash = match query.hash.as_deref().map(str::trim) {
        Some(hash) if !hash.is_empty() => hash.to_string(),
        _ => {
            return Err(api_error(
                StatusCode::BAD_REQUEST,
                "Verification hash is required",
                "INVALID_INPUT",
            ))
        }
    };

    match state.verification_service.verify(&id, &hash).await {
        Ok(outcome) => Ok(Json(RecordMapper::verification_to_dto(outcome))),
        Err(e @ VerificationError::NotFound(_)) => Err(api_error(StatusCode::NOT_FOUND, &e.to_string(), "NOT_FOUND")),
        Err(e) => {
            error!("Verification of {} failed: {:?}", id, e);
            Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string(), "VERIFICATION_FAILED"))
        }
    }
}
