//! services/api/src/web/middleware.rs
//!
//! Request middleware: bearer-token verification for protected routes and the
//! blanket `OPTIONS` short-circuit.

use axum::{
    extract::{Request, State},
    http::{header, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use scoping_core::ports::PortError;
use std::sync::Arc;
use tracing::{debug, error};

use crate::web::state::AppState;

/// The id of the account a verified bearer token was issued to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedSubject(pub String);

/// Middleware that verifies the `Authorization: Bearer <token>` header.
///
/// If valid, inserts the token's subject into request extensions for handlers to use.
/// If invalid or missing, returns 401 Unauthorized.
pub async fn require_bearer_token(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, (StatusCode, String)> {
    // 1. Extract the authorization header
    let authorization = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            (
                StatusCode::UNAUTHORIZED,
                "Missing Authorization header".to_string(),
            )
        })?;

    // 2. Parse the bearer token
    let token = authorization
        .split_once(' ')
        .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("bearer"))
        .map(|(_, token)| token.trim())
        .filter(|token| !token.is_empty())
        .ok_or_else(|| {
            (
                StatusCode::UNAUTHORIZED,
                "Authorization header must carry a bearer token".to_string(),
            )
        })?;

    // 3. Verify it with the identity provider
    let subject = state.token_verifier.verify_token(token).await.map_err(|e| {
        match e {
            PortError::Unauthorized => debug!("Rejected bearer token."),
            other => error!("Failed to verify bearer token: {}", other),
        }
        (StatusCode::UNAUTHORIZED, "Invalid bearer token".to_string())
    })?;

    // 4. Hand the subject to the handler
    req.extensions_mut().insert(VerifiedSubject(subject));
    Ok(next.run(req).await)
}

/// Answers every `OPTIONS` request with an empty 200.
pub async fn short_circuit_options(req: Request, next: Next) -> Response {
    if req.method() == Method::OPTIONS {
        return StatusCode::OK.into_response();
    }
    next.run(req).await
}
