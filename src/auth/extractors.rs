use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;

use crate::{
    auth::{
        jwt::{JwtKeys, TokenError},
        repo_types::User,
    },
    error::ApiError,
    state::AppState,
};

/// Auth gate. Verifies the bearer token and resolves it to a live user
/// record before the handler runs; attaches nothing else and mutates
/// nothing.
#[derive(Debug)]
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(ApiError::NoToken)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(ApiError::NoToken)?;

        let keys = JwtKeys::from_ref(state);
        let claims = keys.verify(token).map_err(|e| {
            warn!(error = %e, "token rejected");
            match e {
                TokenError::Expired => ApiError::TokenExpired,
                TokenError::Malformed => ApiError::TokenInvalid,
            }
        })?;

        // The record may have been removed after the token was issued.
        let user = state
            .users
            .find_by_id(claims.sub)
            .await?
            .ok_or(ApiError::UnknownUser)?;

        Ok(CurrentUser(user))
    }
}
