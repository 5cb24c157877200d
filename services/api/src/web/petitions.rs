//! services/api/src/web/petitions.rs
//!
//! Petition drafting from templates, the structural validator, AI summaries
//! and CRUD over saved petitions.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::Utc;
use lpms_core::domain::{Petition, PetitionStatus};
use lpms_core::petition::{self, PetitionRequest, TemplateCatalog, Validation};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::web::cases::owned_case;
use crate::web::extract::{ensure_owner, found, optional, parse_id, required, ValidJson};
use crate::web::middleware::AuthUser;
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct GenerateRequest {
    /// Petition kind, e.g. `replica`.
    pub kind: Option<String>,
    pub thesis: Option<String>,
    pub client_name: Option<String>,
    pub case_number: Option<String>,
    pub additional_info: Option<String>,
    pub case_id: Option<Uuid>,
}

#[derive(Serialize)]
pub struct GenerateResponse {
    pub petition: Petition,
    pub validation: Validation,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ContentRequest {
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub content: String,
    pub document_kind: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct SummaryResponse {
    pub summary: String,
}

#[derive(Serialize, ToSchema)]
pub struct KeyPointsResponse {
    pub key_points: Vec<String>,
}

#[derive(Serialize, ToSchema)]
pub struct TemplatesResponse {
    pub templates: Vec<String>,
}

/// Petition fields. On update only the supplied fields change.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct PetitionInput {
    pub kind: Option<String>,
    pub thesis: Option<String>,
    pub client_name: Option<String>,
    pub case_number: Option<String>,
    pub content: Option<String>,
    #[schema(value_type = Option<String>)]
    pub status: Option<PetitionStatus>,
    pub case_id: Option<Uuid>,
}

async fn owned_petition(state: &AppState, id: &str, caller: Uuid) -> ApiResult<Petition> {
    let petition = found(state.db.get_petition(parse_id(id, "petition")?).await, "petition")?;
    ensure_owner(petition.owner_id, caller)?;
    Ok(petition)
}

async fn owned_case_id(state: &AppState, case_id: Option<Uuid>, caller: Uuid) -> ApiResult<Option<Uuid>> {
    match case_id {
        Some(id) => Ok(Some(owned_case(state, id, caller).await?.id)),
        None => Ok(None),
    }
}

fn non_blank(content: &str) -> ApiResult<()> {
    if content.trim().is_empty() {
        return Err(ApiError::Validation("content is required".to_string()));
    }
    Ok(())
}

//=========================================================================================
// Drafting Handlers
//=========================================================================================

/// Render a petition from its template, optionally rewritten with the extra
/// information, and save it as ready.
#[utoipa::path(
    post,
    path = "/api/petitions/generate",
    request_body = GenerateRequest,
    responses(
        (status = 201, description = "Saved petition with its validation"),
        (status = 400, description = "Missing kind, thesis, client_name or case_number"),
    ),
    security(("bearer" = [])),
    tag = "petitions"
)]
pub async fn generate_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthUser>,
    ValidJson(req): ValidJson<GenerateRequest>,
) -> ApiResult<impl IntoResponse> {
    let (Some(kind), Some(thesis), Some(client_name), Some(case_number)) = (
        optional(req.kind),
        optional(req.thesis),
        req.client_name.filter(|v| !v.trim().is_empty()),
        req.case_number.filter(|v| !v.trim().is_empty()),
    ) else {
        return Err(ApiError::Validation(
            "kind, thesis, client_name and case_number are required".to_string(),
        ));
    };
    let case_id = owned_case_id(&state, req.case_id, caller.user_id).await?;

    let request = PetitionRequest {
        kind,
        thesis,
        client_name,
        case_number,
        additional_info: optional(req.additional_info),
    };
    let content = petition::generate(&state.templates, state.completion.as_ref(), &request).await;
    let validation = petition::validate(&content);

    let now = Utc::now();
    let saved = state
        .db
        .insert_petition(Petition {
            id: Uuid::new_v4(),
            owner_id: caller.user_id,
            case_id,
            kind: request.kind,
            thesis: request.thesis,
            client_name: request.client_name,
            case_number: request.case_number,
            content,
            status: PetitionStatus::Ready,
            created_at: now,
            updated_at: now,
        })
        .await?;
    info!(
        "Petition {} generated from {}",
        saved.id,
        TemplateCatalog::key_for(&saved.kind, &saved.thesis)
    );

    Ok((
        StatusCode::CREATED,
        Json(GenerateResponse {
            petition: saved,
            validation,
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/api/petitions/validate",
    request_body = ContentRequest,
    responses((status = 200, description = "Structural warnings for the petition")),
    security(("bearer" = [])),
    tag = "petitions"
)]
pub async fn validate_handler(
    Extension(_caller): Extension<AuthUser>,
    ValidJson(req): ValidJson<ContentRequest>,
) -> ApiResult<Json<Validation>> {
    non_blank(&req.content)?;
    Ok(Json(petition::validate(&req.content)))
}

#[utoipa::path(
    post,
    path = "/api/petitions/summary",
    request_body = ContentRequest,
    responses((status = 200, description = "Executive summary, or a fixed notice", body = SummaryResponse)),
    security(("bearer" = [])),
    tag = "petitions"
)]
pub async fn summary_handler(
    State(state): State<Arc<AppState>>,
    Extension(_caller): Extension<AuthUser>,
    ValidJson(req): ValidJson<ContentRequest>,
) -> ApiResult<Json<SummaryResponse>> {
    non_blank(&req.content)?;
    let summary = petition::summarize(state.completion.as_ref(), &req.content).await;
    Ok(Json(SummaryResponse { summary }))
}

#[utoipa::path(
    post,
    path = "/api/petitions/analyze",
    request_body = AnalyzeRequest,
    responses((status = 200, description = "Key points, empty when unavailable", body = KeyPointsResponse)),
    security(("bearer" = [])),
    tag = "petitions"
)]
pub async fn analyze_handler(
    State(state): State<Arc<AppState>>,
    Extension(_caller): Extension<AuthUser>,
    ValidJson(req): ValidJson<AnalyzeRequest>,
) -> ApiResult<Json<KeyPointsResponse>> {
    non_blank(&req.content)?;
    let kind = optional(req.document_kind).unwrap_or_else(|| "documento".to_string());
    let key_points = petition::key_points(state.completion.as_ref(), &req.content, &kind).await;
    Ok(Json(KeyPointsResponse { key_points }))
}

#[utoipa::path(
    get,
    path = "/api/petitions/templates",
    responses((status = 200, description = "Available template keys", body = TemplatesResponse)),
    security(("bearer" = [])),
    tag = "petitions"
)]
pub async fn templates_handler(
    State(state): State<Arc<AppState>>,
    Extension(_caller): Extension<AuthUser>,
) -> Json<TemplatesResponse> {
    Json(TemplatesResponse {
        templates: state.templates.keys().map(str::to_string).collect(),
    })
}

//=========================================================================================
// CRUD Handlers
//=========================================================================================

#[utoipa::path(
    get,
    path = "/api/petitions",
    responses((status = 200, description = "Saved petitions of the caller")),
    security(("bearer" = [])),
    tag = "petitions"
)]
pub async fn list_petitions_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthUser>,
) -> ApiResult<Json<Vec<Petition>>> {
    Ok(Json(state.db.list_petitions(caller.user_id).await?))
}

#[utoipa::path(
    get,
    path = "/api/petitions/{id}",
    params(("id" = String, Path, description = "Petition id")),
    responses(
        (status = 200, description = "Saved petition"),
        (status = 403, description = "Owned by another user"),
        (status = 404, description = "No such petition"),
    ),
    security(("bearer" = [])),
    tag = "petitions"
)]
pub async fn get_petition_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<Petition>> {
    Ok(Json(owned_petition(&state, &id, caller.user_id).await?))
}

/// Save a hand-written petition as a draft unless another status is given.
#[utoipa::path(
    post,
    path = "/api/petitions",
    request_body = PetitionInput,
    responses(
        (status = 201, description = "Petition saved"),
        (status = 400, description = "Missing fields"),
    ),
    security(("bearer" = [])),
    tag = "petitions"
)]
pub async fn create_petition_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthUser>,
    ValidJson(input): ValidJson<PetitionInput>,
) -> ApiResult<impl IntoResponse> {
    let kind = required(input.kind.as_deref(), "kind")?;
    let thesis = required(input.thesis.as_deref(), "thesis")?;
    let client_name = required(input.client_name.as_deref(), "client_name")?;
    let case_number = required(input.case_number.as_deref(), "case_number")?;
    let content = required(input.content.as_deref(), "content")?;
    let case_id = owned_case_id(&state, input.case_id, caller.user_id).await?;

    let now = Utc::now();
    let petition = state
        .db
        .insert_petition(Petition {
            id: Uuid::new_v4(),
            owner_id: caller.user_id,
            case_id,
            kind,
            thesis,
            client_name,
            case_number,
            content,
            status: input.status.unwrap_or(PetitionStatus::Draft),
            created_at: now,
            updated_at: now,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(petition)))
}

#[utoipa::path(
    put,
    path = "/api/petitions/{id}",
    params(("id" = String, Path, description = "Petition id")),
    request_body = PetitionInput,
    responses(
        (status = 200, description = "Petition updated"),
        (status = 403, description = "Owned by another user"),
        (status = 404, description = "No such petition"),
    ),
    security(("bearer" = [])),
    tag = "petitions"
)]
pub async fn update_petition_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<String>,
    ValidJson(input): ValidJson<PetitionInput>,
) -> ApiResult<Json<Petition>> {
    let mut petition = owned_petition(&state, &id, caller.user_id).await?;
    if let Some(kind) = input.kind {
        petition.kind = required(Some(&kind), "kind")?;
    }
    if let Some(thesis) = input.thesis {
        petition.thesis = required(Some(&thesis), "thesis")?;
    }
    if let Some(client_name) = input.client_name {
        petition.client_name = required(Some(&client_name), "client_name")?;
    }
    if let Some(case_number) = input.case_number {
        petition.case_number = required(Some(&case_number), "case_number")?;
    }
    if let Some(content) = input.content {
        petition.content = required(Some(&content), "content")?;
    }
    if input.case_id.is_some() && input.case_id != petition.case_id {
        petition.case_id = owned_case_id(&state, input.case_id, caller.user_id).await?;
    }
    petition.status = input.status.unwrap_or(petition.status);
    petition.updated_at = Utc::now();
    Ok(Json(state.db.update_petition(petition).await?))
}

#[utoipa::path(
    delete,
    path = "/api/petitions/{id}",
    params(("id" = String, Path, description = "Petition id")),
    responses(
        (status = 200, description = "Petition deleted"),
        (status = 403, description = "Owned by another user"),
        (status = 404, description = "No such petition"),
    ),
    security(("bearer" = [])),
    tag = "petitions"
)]
pub async fn delete_petition_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    let petition = owned_petition(&state, &id, caller.user_id).await?;
    state.db.delete_petition(petition.id).await?;
    Ok(Json(json!({ "message": "petition deleted" })))
}
