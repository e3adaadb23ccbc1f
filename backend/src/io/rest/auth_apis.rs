//! # REST API for authentication state
//!
//! The identity provider pushes sign-in and sign-out events here; they are
//! published to every subscriber of the auth state hub. Only an admin
//! identity forwarded by the gateway may publish.

use axum::{extract::State, http::StatusCode, response::Json, routing::post, Router};
use shared::{AuthStateRequest, AuthStateResponse};
use tracing::{info, warn};

use super::actor::RequestActor;
use super::{api_error, ApiError};
use crate::domain::auth::AuthState;
use crate::domain::models::actor::Actor;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/state", post(update_auth_state))
}

pub async fn update_auth_state(
    State(state): State<AppState>,
    RequestActor(caller): RequestActor,
    Json(request): Json<AuthStateRequest>,
) -> Result<Json<AuthStateResponse>, ApiError> {
    info!("POST /api/auth/state - by {}, signed_in: {}", caller.uid, request.signed_in);

    if !caller.is_admin {
        warn!("Auth state publish refused: {} is not an admin", caller.uid);
        return Err(api_error(StatusCode::FORBIDDEN, "Admin only", "ADMIN_ONLY"));
    }

    let auth_state = if request.signed_in {
        let uid = request
            .uid
            .filter(|uid| !uid.trim().is_empty())
            .ok_or_else(|| api_error(StatusCode::BAD_REQUEST, "uid is required when signed in", "INVALID_INPUT"))?;
        let email = request.email.unwrap_or_default();
        AuthState::SignedIn(Actor {
            uid,
            display_name: request.display_name.unwrap_or_else(|| email.clone()),
            email,
            is_admin: request.is_admin,
        })
    } else {
        AuthState::SignedOut
    };

    let subscribers_notified = state.auth_hub.publish(auth_state);

    Ok(Json(AuthStateResponse {
        signed_in: request.signed_in,
        subscribers_notified,
    }))
}
