//! Authentication middleware
//!
//! Protected route groups run one of these middlewares before any
//! handler touches the request. The three failure modes are distinct on
//! the wire: a missing credential and an invalid-or-expired one are
//! both 401 (with different messages), a valid credential of the wrong
//! role is 403. Verified claims ride to the handler in the request
//! extensions.

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use scolaris_common::auth::{verify_token, Role};
use serde_json::json;

use crate::AppState;

/// Require a student token
pub async fn student_auth(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AuthFailure> {
    authorize(state, request, next, Role::Student).await
}

/// Require an admin token
pub async fn admin_auth(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AuthFailure> {
    authorize(state, request, next, Role::Admin).await
}

async fn authorize(
    state: AppState,
    mut request: Request,
    next: Next,
    required: Role,
) -> Result<Response, AuthFailure> {
    let header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or(AuthFailure::Missing)?;

    // Expected shape: "Bearer <token>"
    let token = header
        .split_whitespace()
        .nth(1)
        .ok_or(AuthFailure::Invalid)?;

    let claims =
        verify_token(token, &state.signing_secret).map_err(|_| AuthFailure::Invalid)?;

    if claims.role != required {
        return Err(AuthFailure::Forbidden);
    }

    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

/// Authentication failure, mapped to the three distinct outcomes
#[derive(Debug)]
pub enum AuthFailure {
    /// No Authorization header at all
    Missing,
    /// Malformed, tampered, or expired token
    Invalid,
    /// Valid token, wrong role
    Forbidden,
}

impl IntoResponse for AuthFailure {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthFailure::Missing => (StatusCode::UNAUTHORIZED, "Token missing"),
            AuthFailure::Invalid => (StatusCode::UNAUTHORIZED, "Token invalid"),
            AuthFailure::Forbidden => (StatusCode::FORBIDDEN, "Access denied"),
        };

        let body = Json(json!({
            "message": message,
        }));

        (status, body).into_response()
    }
}
