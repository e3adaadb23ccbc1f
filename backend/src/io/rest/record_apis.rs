//! # REST API for Birth Records
//!
//! Listing with search and counts, registration, editing and deletion.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, put},
    Router,
};
use tracing::{error, info};

use super::actor::RequestActor;
use super::mappers::record_mapper::RecordMapper;
use super::{api_error, ApiError};
use crate::domain::record_list::RecordListError;
use crate::domain::registration_service::RegistrationError;
use crate::AppState;
use shared::{BirthRecordRequest, BirthRecordResponse, DeleteRecordResponse, RecordListRequest, RecordListResponse};

pub const RECORD_DELETED: &str = "Record deleted successfully";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_records).post(create_record))
        .route("/:id", put(update_record).delete(delete_record))
}

pub(crate) fn record_list_error(e: RecordListError) -> ApiError {
    let status = match &e {
        RecordListError::Unauthorized => StatusCode::FORBIDDEN,
        RecordListError::NotFound(_) => StatusCode::NOT_FOUND,
        RecordListError::LoadFailed(_) | RecordListError::DeleteFailed(_) | RecordListError::Certificate(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    let code = match &e {
        RecordListError::LoadFailed(_) => "LOAD_FAILED",
        RecordListError::Unauthorized => "ADMIN_ONLY",
        RecordListError::NotFound(_) => "NOT_FOUND",
        RecordListError::DeleteFailed(_) => "DELETE_FAILED",
        RecordListError::Certificate(_) => "CERTIFICATE_FAILED",
    };
    api_error(status, &e.to_string(), code)
}

fn registration_error(e: RegistrationError) -> ApiError {
    match &e {
        RegistrationError::Invalid(message) => api_error(StatusCode::BAD_REQUEST, message, "INVALID_INPUT"),
        RegistrationError::NotFound(_) => api_error(StatusCode::NOT_FOUND, &e.to_string(), "NOT_FOUND"),
        RegistrationError::Store(cause) => {
            error!("Record store error during registration: {}", cause);
            api_error(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string(), "STORE_ERROR")
        }
    }
}

/// List birth records, optionally filtered by `q`
pub async fn list_records(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    Query(query): Query<RecordListRequest>,
) -> Result<Json<RecordListResponse>, ApiError> {
    info!("GET /api/records - by {}, query: {:?}", actor.uid, query);

    let mut controller = state.record_list();
    controller.load().await.map_err(record_list_error)?;
    let records = RecordMapper::listed_to_dto_list(controller.search(query.q.as_deref().unwrap_or("")));

    Ok(Json(RecordListResponse {
        records,
        stats: controller.stats(),
    }))
}

/// Register a new birth
pub async fn create_record(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    Json(request): Json<BirthRecordRequest>,
) -> Result<(StatusCode, Json<BirthRecordResponse>), ApiError> {
    info!("POST /api/records - by {}", actor.uid);

    let result = state
        .registration_service
        .create(&actor, &request)
        .await
        .map_err(registration_error)?;

    Ok((
        StatusCode::CREATED,
        Json(BirthRecordResponse {
            record: RecordMapper::to_dto(result.record),
            success_message: result.success_message,
        }),
    ))
}

/// Edit an existing record
pub async fn update_record(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    Path(id): Path<String>,
    Json(request): Json<BirthRecordRequest>,
) -> Result<Json<BirthRecordResponse>, ApiError> {
    info!("PUT /api/records/{} - by {}", id, actor.uid);

    let result = state
        .registration_service
        .update(&actor, &id, &request)
        .await
        .map_err(registration_error)?;

    Ok(Json(BirthRecordResponse {
        record: RecordMapper::to_dto(result.record),
        success_message: result.success_message,
    }))
}

/// Delete a record (admins only)
pub async fn delete_record(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    Path(id): Path<String>,
) -> Result<Json<DeleteRecordResponse>, ApiError> {
    info!("DELETE /api/records/{} - by {}", id, actor.uid);

    let mut controller = state.record_list();
    if actor.is_admin {
        // A failed pre-load counts as a failed delete
        controller.load().await.map_err(|e| match e {
            RecordListError::LoadFailed(cause) => record_list_error(RecordListError::DeleteFailed(cause)),
            other => record_list_error(other),
        })?;
    }
    controller.delete(&actor, &id).await.map_err(record_list_error)?;

    Ok(Json(DeleteRecordResponse {
        deleted_id: id,
        success_message: RECORD_DELETED.to_string(),
    }))
}
