//! # Birth Registry Backend
//!
//! Records births, lets registrars search and manage them, and issues PDF
//! birth certificates that can be checked later through a QR-coded link.
//!
//! ## Architecture
//!
//! ```text
//! IO Layer (REST API, handlers)
//!     ↓
//! Domain Layer (records, certificates, verification)
//!     ↓
//! Storage Layer (document store)
//! ```

pub mod config;
pub mod domain;
pub mod io;
pub mod storage;

use anyhow::Result;
use axum::{
    http::{HeaderValue, Method},
    Router,
};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::config::AppConfig;
use crate::domain::{
    AuthStateHub, CertificateRenderer, QrCodeEncoder, RecordListController, RegistrationService, VerificationService,
};
use crate::storage::{DbConnection, RecordStoreClient};

/// Services shared by every request
#[derive(Clone)]
pub struct AppState {
    pub record_store: RecordStoreClient,
    pub registration_service: RegistrationService,
    pub verification_service: VerificationService,
    pub renderer: Arc<CertificateRenderer>,
    pub auth_hub: AuthStateHub,
    pub export_dir: PathBuf,
}

impl AppState {
    pub fn new(record_store: RecordStoreClient, renderer: CertificateRenderer, export_dir: PathBuf) -> Self {
        Self {
            registration_service: RegistrationService::new(record_store.clone()),
            verification_service: VerificationService::new(record_store.clone()),
            record_store,
            renderer: Arc::new(renderer),
            auth_hub: AuthStateHub::new(),
            export_dir,
        }
    }

    /// A fresh, unloaded record list for one request
    pub fn record_list(&self) -> RecordListController {
        RecordListController::new(self.record_store.clone(), self.renderer.clone())
    }
}

/// Initialize the backend with all required services
pub async fn initialize_backend(config: &AppConfig) -> Result<AppState> {
    info!("Setting up database");
    let db = Arc::new(DbConnection::new(&config.database_url).await?);

    info!("Setting up domain model");
    let record_store = RecordStoreClient::new(db);
    let renderer = CertificateRenderer::new(config.public_origin.clone(), Arc::new(QrCodeEncoder));

    Ok(AppState::new(record_store, renderer, config.export_dir.clone()))
}

/// Create the Axum router with all routes configured
pub fn create_router(app_state: AppState, allowed_origin: &str) -> Result<Router> {
    let origin: HeaderValue = allowed_origin.parse()?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    Ok(Router::new()
        .nest("/api", io::rest::api_router())
        .merge(io::rest::verify_router())
        .layer(cors)
        .with_state(app_state))
}


#[cfg(test)]
mod tests {
    use super::test_support::{setup_test_state, with_actor};
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::util::ServiceExt; // for `oneshot`

    #[tokio::test]
    async fn test_full_router_paths() {
        let (state, _store, _dir) = setup_test_state().await;
        let app = create_router(state, "http://localhost:8080").unwrap();

        for (uri, expected) in [
            ("/api/health", StatusCode::OK),
            ("/api/records", StatusCode::OK),
            ("/api/records/missing/certificate", StatusCode::NOT_FOUND),
            ("/verify/missing?hash=abc", StatusCode::NOT_FOUND),
            ("/nowhere", StatusCode::NOT_FOUND),
        ] {
            let request = with_actor(Request::builder().uri(uri), false).body(Body::empty()).unwrap();
            let response = app.clone().oneshot(request).await.unwrap();
            assert_eq!(response.status(), expected, "{}", uri);
        }
    }

    #[tokio::test]
    async fn test_anonymous_callers_only_reach_public_routes() {
        let (state, _store, _dir) = setup_test_state().await;
        let app = create_router(state, "http://localhost:8080").unwrap();

        for (method, uri, expected) in [
            ("GET", "/api/health", StatusCode::OK),
            ("GET", "/verify/missing?hash=abc", StatusCode::NOT_FOUND),
            ("GET", "/api/records", StatusCode::UNAUTHORIZED),
            ("GET", "/api/records/abc/certificate", StatusCode::UNAUTHORIZED),
            ("POST", "/api/records/abc/certificate/export", StatusCode::UNAUTHORIZED),
            ("DELETE", "/api/records/abc", StatusCode::UNAUTHORIZED),
        ] {
            let request = Request::builder().method(method).uri(uri).body(Body::empty()).unwrap();
            let response = app.clone().oneshot(request).await.unwrap();
            assert_eq!(response.status(), expected, "{} {}", method, uri);
        }

        let request = Request::builder()
            .method("POST")
            .uri("/api/auth/state")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"signedIn": true, "uid": "x", "isAdmin": true}"#))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_cors_allows_public_origin() {
        let (state, _store, _dir) = setup_test_state().await;
        let app = create_router(state, "http://localhost:8080").unwrap();

        let request = Request::builder()
            .uri("/api/health")
            .header("origin", "http://localhost:8080")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(
            response.headers()["access-control-allow-origin"],
            "http://localhost:8080"
        );
    }

    #[tokio::test]
    async fn test_bad_origin_rejected() {
        let (state, _store, _dir) = setup_test_state().await;
        assert!(create_router(state, "bad\norigin").is_err());
    }
}
