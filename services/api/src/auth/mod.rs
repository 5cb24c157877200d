//! services/api/src/auth/mod.rs
//!
//! Registration, login and identity resolution on top of the database port.

pub mod password;
pub mod token;

use chrono::Utc;
use lpms_core::domain::{User, DEFAULT_ROLE};
use lpms_core::ports::{DatabaseService, PortError};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::web::extract::required;
pub use password::{hash_password, verify_password};
pub use token::{Claims, TokenError, TokenSigner};

pub const INVALID_CREDENTIALS: &str = "invalid email or password";
pub const USER_EXISTS: &str = "user already exists";

/// Input of a registration.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: String,
    pub password: String,
    pub name: String,
    pub role: Option<String>,
}

/// A user together with a freshly issued token.
#[derive(Debug, Clone)]
pub struct Session {
    pub user: User,
    pub token: String,
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub async fn register(
    db: &dyn DatabaseService,
    tokens: &TokenSigner,
    account: NewAccount,
) -> ApiResult<Session> {
    let email = normalize_email(&required(Some(account.email.as_str()), "email")?);
    if account.password.is_empty() {
        return Err(ApiError::Validation("password is required".to_string()));
    }
    let name = required(Some(account.name.as_str()), "name")?;

    if db.get_credentials_by_email(&email).await.is_ok() {
        return Err(ApiError::Validation(USER_EXISTS.to_string()));
    }

    let password_hash = hash_password(&account.password)?;
    let user = User {
        id: Uuid::new_v4(),
        email,
        name,
        role: account
            .role
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_ROLE.to_string()),
        created_at: Utc::now(),
    };

    let user = db
        .create_user(user, &password_hash)
        .await
        .map_err(|e| match e {
            PortError::Conflict(_) => ApiError::Validation(USER_EXISTS.to_string()),
            other => ApiError::Port(other),
        })?;
    info!("Registered user {}", user.id);

    let token = issue(tokens, user.id)?;
    Ok(Session { user, token })
}

pub async fn login(
    db: &dyn DatabaseService,
    tokens: &TokenSigner,
    email: &str,
    password: &str,
) -> ApiResult<Session> {
    let email = normalize_email(&required(Some(email), "email")?);
    if password.is_empty() {
        return Err(ApiError::Validation("password is required".to_string()));
    }

    // Unknown email and wrong password produce the same answer.
    let credentials = match db.get_credentials_by_email(&email).await {
        Ok(credentials) => credentials,
        Err(PortError::NotFound(_)) => {
            return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()))
        }
        Err(e) => return Err(ApiError::Port(e)),
    };
    if !verify_password(password, &credentials.password_hash)? {
        warn!("Failed login attempt for user {}", credentials.user.id);
        return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    }

    let token = issue(tokens, credentials.user.id)?;
    Ok(Session {
        user: credentials.user,
        token,
    })
}

pub async fn get_user(db: &dyn DatabaseService, user_id: Uuid) -> ApiResult<User> {
    db.get_user_by_id(user_id).await.map_err(|e| match e {
        PortError::NotFound(_) => ApiError::NotFound("user"),
        other => ApiError::Port(other),
    })
}

fn issue(tokens: &TokenSigner, user_id: Uuid) -> ApiResult<String> {
    tokens
        .issue(user_id)
        .map_err(|e| ApiError::Internal(e.to_string()))
}
