//! Bearer token authentication for the control endpoints

use axum::{
    Json,
    extract::{Request, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::warn;

/// Reject requests whose `Authorization` header does not carry the expected bearer token
pub async fn auth_middleware(
    State(expected_token): State<String>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let token = bearer_token(request.headers())?;

    if token != expected_token {
        warn!(path = %request.uri().path(), "rejected request with invalid token");
        return Err(AuthError::InvalidToken);
    }

    Ok(next.run(request).await)
}

/// Extract the token from `Authorization: Bearer <token>`
///
/// The scheme is matched case-insensitively.
fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingToken)?;

    match value.split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() => {
            Ok(token.trim())
        }
        _ => Err(AuthError::InvalidFormat),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    MissingToken,
    InvalidFormat,
    InvalidToken,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::MissingToken => (StatusCode::UNAUTHORIZED, "missing Authorization header"),
            AuthError::InvalidFormat => (
                StatusCode::UNAUTHORIZED,
                "expected Authorization: Bearer <token>",
            ),
            AuthError::InvalidToken => (StatusCode::FORBIDDEN, "invalid token"),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
