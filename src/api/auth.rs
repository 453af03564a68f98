use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequestParts, State};
use axum::http::request::Parts;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::server::AppState;
use crate::db::models::PublicUser;

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthPayload {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct AuthResponse {
    pub token: String,
}

/// Missing or malformed request bodies all surface as a plain 400.
pub(crate) fn require_json<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(inner)| inner)
        .map_err(|_| ApiError::Validation("Bad request".to_string()))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<AuthPayload>, JsonRejection>,
) -> Result<Json<AuthResponse>, ApiError> {
    let payload = require_json(payload)?;
    let token = state
        .access
        .login(&payload.username, &payload.password)
        .await?;
    Ok(Json(AuthResponse { token }))
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<AuthPayload>, JsonRejection>,
) -> Result<Json<AuthResponse>, ApiError> {
    let payload = require_json(payload)?;
    let token = state
        .access
        .register(&payload.username, &payload.password)
        .await?;
    Ok(Json(AuthResponse { token }))
}

/// Identity extracted from the `authorization` header. Rejects the request
/// with 401 when the header is missing or the token does not verify.
pub struct AuthUser(pub PublicUser);

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get("authorization")
            .and_then(|value| value.to_str().ok())
            .ok_or(ApiError::InvalidToken)?;

        // The header carries the bare token; a Bearer prefix is tolerated.
        let token = header.strip_prefix("Bearer ").unwrap_or(header).trim();
        Ok(AuthUser(state.access.identify(token)?))
    }
}
