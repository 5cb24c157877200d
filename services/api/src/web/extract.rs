//! services/api/src/web/extract.rs
//!
//! Request extractors and small helpers shared by the handlers.

use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use lpms_core::ports::{PortError, PortResult};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};

/// `Json<T>` whose rejections are rendered as `ApiError::Validation`.
pub struct ValidJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e: JsonRejection| ApiError::Validation(e.body_text()))?;
        Ok(ValidJson(value))
    }
}

/// Path ids that are not UUIDs cannot name an existing row.
pub fn parse_id(raw: &str, what: &'static str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| ApiError::NotFound(what))
}

/// Maps a store lookup so a missing row becomes a typed 404.
pub fn found<T>(result: PortResult<T>, what: &'static str) -> ApiResult<T> {
    result.map_err(|e| match e {
        PortError::NotFound(_) => ApiError::NotFound(what),
        other => ApiError::Port(other),
    })
}

/// Rows owned by another user are reported as forbidden.
pub fn ensure_owner(owner_id: Uuid, caller: Uuid) -> ApiResult<()> {
    if owner_id != caller {
        return Err(ApiError::Forbidden);
    }
    Ok(())
}

/// Returns the trimmed value, or a 400 naming the field.
pub fn required(value: Option<&str>, field: &str) -> ApiResult<String> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(ApiError::Validation(format!("{} is required", field))),
    }
}

/// Blank strings in optional fields are stored as absent.
pub fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_ids_are_not_found() {
        assert!(matches!(parse_id("abc", "client"), Err(ApiError::NotFound("client"))));
        let id = Uuid::new_v4();
        assert_eq!(parse_id(&id.to_string(), "client").unwrap(), id);
    }

    #[test]
    fn required_rejects_blank_values() {
        assert!(required(Some("  "), "name").is_err());
        assert!(required(None, "name").is_err());
        assert_eq!(required(Some(" Ana "), "name").unwrap(), "Ana");
        assert_eq!(optional(Some("   ".to_string())), None);
    }
}
