//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::error::ApiError;
use crate::web::state::AppState;

/// The authenticated caller, inserted into request extensions by `require_auth`.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: String,
    pub role: String,
}

fn bearer_token(req: &Request) -> Option<&str> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer ").or_else(|| v.strip_prefix("bearer ")))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Middleware that validates the bearer token and resolves the caller.
///
/// If valid, inserts an `AuthUser` into request extensions for handlers to use.
/// If missing, invalid, expired or issued for a deleted user, returns 401.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(&req)
        .ok_or_else(|| ApiError::Unauthorized("missing bearer token".to_string()))?;

    let user_id = state.tokens.verify(token).map_err(|e| {
        debug!("Rejected token: {}", e);
        ApiError::Unauthorized("invalid or expired token".to_string())
    })?;

    let user = state.db.get_user_by_id(user_id).await.map_err(|e| {
        debug!("Token subject could not be resolved: {}", e);
        ApiError::Unauthorized("invalid or expired token".to_string())
    })?;

    req.extensions_mut().insert(AuthUser {
        user_id: user.id,
        email: user.email,
        role: user.role,
    });

    Ok(next.run(req).await)
}
