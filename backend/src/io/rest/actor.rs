//! Actor identity from the upstream auth gateway.
//!
//! The gateway authenticates the caller and forwards who they are in request
//! headers. This service never inspects credentials itself.

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap, StatusCode},
    Json,
};
use serde_json::Value;
use tracing::warn;

use super::error_body;
use crate::domain::models::actor::Actor;

pub const ACTOR_ID_HEADER: &str = "x-actor-id";
pub const ACTOR_NAME_HEADER: &str = "x-actor-name";
pub const ACTOR_EMAIL_HEADER: &str = "x-actor-email";
pub const ACTOR_ROLE_HEADER: &str = "x-actor-role";

const ADMIN_ROLE: &str = "admin";

/// Extracts the calling [`Actor`]; rejects with 401 when no identity was forwarded.
pub struct RequestActor(pub Actor);

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

pub fn actor_from_headers(headers: &HeaderMap) -> Option<Actor> {
    let uid = header(headers, ACTOR_ID_HEADER)?;
    let email = header(headers, ACTOR_EMAIL_HEADER).unwrap_or_default();
    let display_name = header(headers, ACTOR_NAME_HEADER).unwrap_or_else(|| email.clone());
    let is_admin = header(headers, ACTOR_ROLE_HEADER)
        .map(|role| role.eq_ignore_ascii_case(ADMIN_ROLE))
        .unwrap_or(false);

    Some(Actor {
        uid,
        display_name,
        email,
        is_admin,
    })
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for RequestActor
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<Value>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match actor_from_headers(&parts.headers) {
            Some(actor) => Ok(RequestActor(actor)),
            None => {
                warn!("{} {} rejected: no actor identity", parts.method, parts.uri.path());
                Err((
                    StatusCode::UNAUTHORIZED,
                    error_body("Sign in required", "UNAUTHORIZED"),
                ))
            }
        }
    }
}
