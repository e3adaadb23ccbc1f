//! # REST API for Birth Certificates
//!
//! Serves rendered certificates as PDF, inline for printing or as a download,
//! and saves download copies to the configured export directory. Any signed-in
//! registrar may view a certificate; only admins may write one to disk.

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderName, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use shared::{CertificateMode, CertificateRequest, ExportCertificateResponse};
use tracing::{info, warn};

use super::actor::RequestActor;
use super::record_apis::record_list_error;
use super::{api_error, ApiError};
use crate::domain::record_list::RecordListError;
use crate::AppState;

pub const SERIAL_HEADER: HeaderName = HeaderName::from_static("x-certificate-serial");
pub const HASH_HEADER: HeaderName = HeaderName::from_static("x-certificate-hash");

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/:id/certificate", get(get_certificate))
        .route("/:id/certificate/export", post(export_certificate))
}

/// Render the certificate for a record. `?mode=print` asks the viewer to
/// print on open.
pub async fn get_certificate(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    Path(id): Path<String>,
    Query(request): Query<CertificateRequest>,
) -> Result<Response, ApiError> {
    info!("GET /api/records/{}/certificate - by {}, mode: {}", id, actor.uid, request.mode);

    let mut controller = state.record_list();
    controller.load().await.map_err(record_list_error)?;
    let rendered = controller.render(&id, request.mode).map_err(record_list_error)?;

    let disposition = rendered.content_disposition();
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, rendered.content_type().to_string()),
            (header::CONTENT_DISPOSITION, disposition),
            (SERIAL_HEADER, rendered.serial_number.clone()),
            (HASH_HEADER, rendered.hash.clone()),
        ],
        rendered.bytes,
    )
        .into_response())
}

/// Render a download copy and write it into the export directory (admins only)
pub async fn export_certificate(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    Path(id): Path<String>,
) -> Result<Json<ExportCertificateResponse>, ApiError> {
    info!("POST /api/records/{}/certificate/export - by {}", id, actor.uid);

    if !actor.is_admin {
        warn!("Certificate export of {} refused: {} is not an admin", id, actor.uid);
        return Err(record_list_error(RecordListError::Unauthorized));
    }

    let mut controller = state.record_list();
    controller.load().await.map_err(record_list_error)?;
    let rendered = controller
        .render(&id, CertificateMode::Download)
        .map_err(record_list_error)?;

    let path = rendered.save_to(&state.export_dir).map_err(|e| {
        api_error(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string(), "CERTIFICATE_FAILED")
    })?;
    let file_path = path.to_string_lossy().to_string();

    Ok(Json(ExportCertificateResponse {
        success: true,
        message: format!("Certificate exported to {}", file_path),
        file_name: rendered.file_name,
        file_path,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::certificate::renderer::test_support::FailingEncoder;
    use crate::domain::models::birth_record::fixtures;
    use crate::test_support::{setup_test_state, setup_test_state_with, with_actor};
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::Value;
    use std::sync::Arc;
    use tower::util::ServiceExt; // for `oneshot`

    async fn seed(state: &AppState, child_name: &str) -> String {
        state
            .record_store
            .create(&fixtures::fields(child_name, "female", "Lagos"), &fixtures::author())
            .await
            .expect("seed record")
            .id
    }

    fn get(uri: &str) -> Request<Body> {
        with_actor(Request::builder().uri(uri), false).body(Body::empty()).unwrap()
    }

    fn export(id: &str, admin: bool) -> Request<Body> {
        with_actor(Request::builder().method("POST").uri(format!("/{}/certificate/export", id)), admin)
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_download_certificate() {
        let (state, _store, _dir) = setup_test_state().await;
        let id = seed(&state, "Ada Obi").await;
        let app = router().with_state(state);

        let response = app.oneshot(get(&format!("/{}/certificate?mode=download", id))).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers().clone();
        assert_eq!(headers[header::CONTENT_TYPE], "application/pdf");
        assert!(headers[header::CONTENT_DISPOSITION]
            .to_str()
            .unwrap()
            .starts_with("attachment; filename=\"Ada Obi_Birth_Certificate.pdf\""));
        assert!(headers[SERIAL_HEADER].to_str().unwrap().starts_with("NG-BR-"));
        assert_eq!(headers[HASH_HEADER].len(), 64);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(body.starts_with(b"%PDF-"));
    }

    #[tokio::test]
    async fn test_print_certificate_is_inline() {
        let (state, _store, _dir) = setup_test_state().await;
        let id = seed(&state, "Ada Obi").await;
        let app = router().with_state(state);

        let response = app.oneshot(get(&format!("/{}/certificate?mode=print", id))).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers()[header::CONTENT_DISPOSITION]
            .to_str()
            .unwrap()
            .starts_with("inline;"));
    }

    #[tokio::test]
    async fn test_unknown_record_certificate() {
        let (state, _store, _dir) = setup_test_state().await;
        let app = router().with_state(state);

        let response = app.oneshot(get("/missing/certificate")).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_certificate_requires_actor() {
        let (state, _store, _dir) = setup_test_state().await;
        let id = seed(&state, "Ada Obi").await;
        let app = router().with_state(state);

        let request = Request::builder()
            .uri(format!("/{}/certificate", id))
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().get(HASH_HEADER).is_none());
    }

    #[tokio::test]
    async fn test_export_requires_admin() {
        let (state, _store, _dir) = setup_test_state().await;
        let id = seed(&state, "Ada Obi").await;
        let export_dir = state.export_dir.clone();
        let app = router().with_state(state);

        let anonymous = Request::builder()
            .method("POST")
            .uri(format!("/{}/certificate/export", id))
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(anonymous).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app.oneshot(export(&id, false)).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["code"], "ADMIN_ONLY");
        assert!(!export_dir.exists());
    }

    #[tokio::test]
    async fn test_render_failure_is_generic_notice() {
        let (state, _store, _dir) = setup_test_state_with(Arc::new(FailingEncoder)).await;
        let id = seed(&state, "Ada Obi").await;
        let export_dir = state.export_dir.clone();
        let app = router().with_state(state);

        let response = app.oneshot(export(&id, true)).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "Certificate generation failed");
        assert_eq!(json["code"], "CERTIFICATE_FAILED");
        assert!(!export_dir.exists());
    }

    #[tokio::test]
    async fn test_export_certificate_writes_file() {
        let (state, _store, _dir) = setup_test_state().await;
        let id = seed(&state, "Ada Obi").await;
        let export_dir = state.export_dir.clone();
        let app = router().with_state(state);

        let response = app.oneshot(export(&id, true)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: ExportCertificateResponse = serde_json::from_slice(&body).unwrap();
        assert!(json.success);
        assert_eq!(json.file_name, "Ada Obi_Birth_Certificate.pdf");

        let written = std::fs::read(export_dir.join(&id).join("Ada Obi_Birth_Certificate.pdf")).unwrap();
        assert!(written.starts_with(b"%PDF-"));
    }
}
