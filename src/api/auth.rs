use super::error::ApiError;
use super::state::AppState;
use axum::{
    extract::{Request, State},
    http::{HeaderMap, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};
use sha2::{Digest, Sha256};
use std::sync::Arc;

/// Bearer token from the `Authorization` header.
fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))
        .map(str::trim)
}

/// Compare digests so the comparison time does not depend on where the
/// strings first differ.
fn token_matches(expected: &str, presented: &str) -> bool {
    Sha256::digest(expected.as_bytes()) == Sha256::digest(presented.as_bytes())
}

/// Guard for `/api/admin`: 503 when no token is configured, 401 on a
/// missing or wrong token.
pub async fn require_admin(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(expected) = state.admin_token.as_deref() else {
        return Err(ApiError::AdminDisabled);
    };
    let authorized = extract_bearer_token(request.headers())
        .is_some_and(|presented| token_matches(expected, presented));
    if !authorized {
        tracing::warn!(path = %request.uri().path(), "rejected admin request");
        return Err(ApiError::Unauthorized);
    }
    Ok(next.run(request).await)
}
