//! services/api/src/web/auth.rs
//!
//! Authentication endpoints for registration, login and the caller's profile.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use lpms_core::domain::User;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::auth::{self, NewAccount, Session};
use crate::error::ApiResult;
use crate::web::extract::ValidJson;
use crate::web::middleware::AuthUser;
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default, alias = "nome")]
    pub name: String,
    pub role: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Serialize, ToSchema)]
pub struct AuthResponse {
    #[schema(value_type = Object)]
    pub user: User,
    pub token: String,
}

impl From<Session> for AuthResponse {
    fn from(session: Session) -> Self {
        Self {
            user: session.user,
            token: session.token,
        }
    }
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /api/auth/register - Create a new user account
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User created", body = AuthResponse),
        (status = 400, description = "Missing fields or user already exists"),
    ),
    tag = "auth"
)]
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    ValidJson(req): ValidJson<RegisterRequest>,
) -> ApiResult<impl IntoResponse> {
    let session = auth::register(
        state.db.as_ref(),
        &state.tokens,
        NewAccount {
            email: req.email,
            password: req.password,
            name: req.name,
            role: req.role,
        },
    )
    .await?;
    Ok((StatusCode::CREATED, Json(AuthResponse::from(session))))
}

/// POST /api/auth/login - Login with an existing account
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 400, description = "Missing fields"),
        (status = 401, description = "Invalid email or password"),
    ),
    tag = "auth"
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    ValidJson(req): ValidJson<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let session = auth::login(state.db.as_ref(), &state.tokens, &req.email, &req.password).await?;
    Ok(Json(session.into()))
}

/// GET /api/auth/me - The authenticated user's profile
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current user"),
        (status = 401, description = "Missing or invalid token"),
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
pub async fn me_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthUser>,
) -> ApiResult<Json<User>> {
    Ok(Json(auth::get_user(state.db.as_ref(), caller.user_id).await?))
}
