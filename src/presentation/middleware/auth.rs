//! Authentication Middleware
//!
//! Resolves the opaque bearer token of a request to a user.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

use crate::shared::error::AppError;
use crate::startup::AppState;

/// Authenticated user extension
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i64,
}

/// Reject requests without a known token; insert [`AuthUser`] otherwise.
///
/// Accepts `Authorization: Bearer <token>` or the bare token.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    // Extract Authorization header
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing authorization header".into()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .unwrap_or(auth_header)
        .trim();
    if token.is_empty() {
        return Err(AppError::Unauthorized("Missing token".into()));
    }

    let user = state
        .repos
        .users
        .find_by_token(token)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid token".into()))?;

    // Insert authenticated user into request extensions
    request.extensions_mut().insert(AuthUser { user_id: user.id });

    Ok(next.run(request).await)
}
