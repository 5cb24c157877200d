//! services/api/src/web/cases.rs
//!
//! Lawsuits, their deadlines and their recorded procedural events.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::{NaiveDate, Utc};
use lpms_core::domain::{Case, CaseUpdate, Client, Deadline, Petition, DEFAULT_CASE_STATUS};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::web::extract::{ensure_owner, found, optional, parse_id, required, ValidJson};
use crate::web::middleware::AuthUser;
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CaseInput {
    pub case_number: Option<String>,
    pub client_id: Option<Uuid>,
    pub thesis: Option<String>,
    pub description: Option<String>,
    pub filing_date: Option<NaiveDate>,
    pub status: Option<String>,
    pub court: Option<String>,
    pub court_division: Option<String>,
    pub next_deadline: Option<NaiveDate>,
    pub deadline_description: Option<String>,
    pub client_dependency: Option<String>,
    pub office_dependency: Option<String>,
    pub estimated_value: Option<f64>,
    pub judgment_value: Option<f64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct DeadlineInput {
    pub due_date: NaiveDate,
    pub description: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct DeadlineChange {
    pub completed: Option<bool>,
    pub due_date: Option<NaiveDate>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CaseUpdateInput {
    pub date: Option<NaiveDate>,
    pub description: String,
    pub kind: Option<String>,
}

#[derive(Serialize)]
pub struct CaseDetail {
    #[serde(flatten)]
    pub case: Case,
    pub client: Client,
    pub deadlines: Vec<Deadline>,
    pub updates: Vec<CaseUpdate>,
    pub petitions: Vec<Petition>,
}

//=========================================================================================
// Helpers
//=========================================================================================

/// Loads a case and checks that the caller owns it.
pub async fn owned_case(state: &AppState, case_id: Uuid, caller: Uuid) -> ApiResult<Case> {
    let case = found(state.db.get_case(case_id).await, "case")?;
    ensure_owner(case.owner_id, caller)?;
    Ok(case)
}

/// A case can only reference a client of the same owner. A missing client is
/// reported as forbidden too, so ids of other users cannot be probed.
async fn client_for_case(state: &AppState, client_id: Uuid, caller: Uuid) -> ApiResult<Client> {
    match state.db.get_client(client_id).await {
        Ok(client) if client.owner_id == caller => Ok(client),
        Ok(_) | Err(lpms_core::ports::PortError::NotFound(_)) => Err(ApiError::Forbidden),
        Err(e) => Err(e.into()),
    }
}

fn merge(field: &mut Option<String>, value: Option<String>) {
    if value.is_some() {
        *field = optional(value);
    }
}

fn apply(case: &mut Case, input: CaseInput) -> ApiResult<()> {
    if let Some(number) = input.case_number {
        case.case_number = required(Some(&number), "case_number")?;
    }
    if let Some(thesis) = input.thesis {
        case.thesis = required(Some(&thesis), "thesis")?;
    }
    if let Some(status) = input.status {
        case.status = required(Some(&status), "status")?;
    }
    if let Some(date) = input.filing_date {
        case.filing_date = date;
    }
    merge(&mut case.description, input.description);
    merge(&mut case.court, input.court);
    merge(&mut case.court_division, input.court_division);
    merge(&mut case.deadline_description, input.deadline_description);
    merge(&mut case.client_dependency, input.client_dependency);
    merge(&mut case.office_dependency, input.office_dependency);
    case.next_deadline = input.next_deadline.or(case.next_deadline);
    case.estimated_value = input.estimated_value.or(case.estimated_value);
    case.judgment_value = input.judgment_value.or(case.judgment_value);
    Ok(())
}

//=========================================================================================
// Handlers
//=========================================================================================

#[utoipa::path(
    get,
    path = "/api/cases",
    responses((status = 200, description = "Cases of the caller, newest first")),
    security(("bearer" = [])),
    tag = "cases"
)]
pub async fn list_cases_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthUser>,
) -> ApiResult<Json<Vec<Case>>> {
    Ok(Json(state.db.list_cases(caller.user_id).await?))
}

#[utoipa::path(
    get,
    path = "/api/cases/{id}",
    params(("id" = String, Path, description = "Case id")),
    responses(
        (status = 200, description = "Case with client, deadlines, updates and petitions"),
        (status = 403, description = "Owned by another user"),
        (status = 404, description = "No such case"),
    ),
    security(("bearer" = [])),
    tag = "cases"
)]
pub async fn get_case_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<CaseDetail>> {
    let case = owned_case(&state, parse_id(&id, "case")?, caller.user_id).await?;
    let client = found(state.db.get_client(case.client_id).await, "client")?;
    let deadlines = state.db.list_deadlines(case.id).await?;
    let updates = state.db.list_case_updates(case.id).await?;
    let petitions = state.db.list_petitions_for_case(case.id).await?;
    Ok(Json(CaseDetail {
        case,
        client,
        deadlines,
        updates,
        petitions,
    }))
}

/// Open a case for an owned client.
#[utoipa::path(
    post,
    path = "/api/cases",
    request_body = CaseInput,
    responses(
        (status = 201, description = "Case created"),
        (status = 400, description = "Missing required fields"),
        (status = 403, description = "Client missing or owned by another user"),
    ),
    security(("bearer" = [])),
    tag = "cases"
)]
pub async fn create_case_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthUser>,
    ValidJson(input): ValidJson<CaseInput>,
) -> ApiResult<impl IntoResponse> {
    let (Some(case_number), Some(client_id), Some(thesis), Some(filing_date)) = (
        optional(input.case_number.clone()),
        input.client_id,
        optional(input.thesis.clone()),
        input.filing_date,
    ) else {
        return Err(ApiError::Validation(
            "case_number, client_id, thesis and filing_date are required".to_string(),
        ));
    };
    client_for_case(&state, client_id, caller.user_id).await?;

    let mut case = Case {
        id: Uuid::new_v4(),
        owner_id: caller.user_id,
        client_id,
        case_number,
        thesis,
        description: None,
        filing_date,
        status: DEFAULT_CASE_STATUS.to_string(),
        court: None,
        court_division: None,
        next_deadline: None,
        deadline_description: None,
        client_dependency: None,
        office_dependency: None,
        estimated_value: None,
        judgment_value: None,
        created_at: Utc::now(),
    };
    apply(&mut case, input)?;

    let case = state.db.insert_case(case).await?;
    info!("Case {} opened for client {}", case.id, case.client_id);
    Ok((StatusCode::CREATED, Json(case)))
}

#[utoipa::path(
    put,
    path = "/api/cases/{id}",
    params(("id" = String, Path, description = "Case id")),
    request_body = CaseInput,
    responses(
        (status = 200, description = "Case updated"),
        (status = 403, description = "Owned by another user"),
        (status = 404, description = "No such case"),
    ),
    security(("bearer" = [])),
    tag = "cases"
)]
pub async fn update_case_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<String>,
    ValidJson(input): ValidJson<CaseInput>,
) -> ApiResult<Json<Case>> {
    let mut case = owned_case(&state, parse_id(&id, "case")?, caller.user_id).await?;
    if let Some(client_id) = input.client_id.filter(|c| *c != case.client_id) {
        client_for_case(&state, client_id, caller.user_id).await?;
        case.client_id = client_id;
    }
    apply(&mut case, input)?;
    Ok(Json(state.db.update_case(case).await?))
}

#[utoipa::path(
    delete,
    path = "/api/cases/{id}",
    params(("id" = String, Path, description = "Case id")),
    responses(
        (status = 200, description = "Case deleted"),
        (status = 403, description = "Owned by another user"),
        (status = 404, description = "No such case"),
    ),
    security(("bearer" = [])),
    tag = "cases"
)]
pub async fn delete_case_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    let case = owned_case(&state, parse_id(&id, "case")?, caller.user_id).await?;
    state.db.delete_case(case.id).await?;
    info!("Case {} deleted by {}", case.id, caller.user_id);
    Ok(Json(json!({ "message": "case deleted" })))
}

/// Add a deadline to a case.
#[utoipa::path(
    post,
    path = "/api/cases/{id}/deadlines",
    params(("id" = String, Path, description = "Case id")),
    request_body = DeadlineInput,
    responses(
        (status = 201, description = "Deadline added"),
        (status = 403, description = "Owned by another user"),
        (status = 404, description = "No such case"),
    ),
    security(("bearer" = [])),
    tag = "cases"
)]
pub async fn add_deadline_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<String>,
    ValidJson(input): ValidJson<DeadlineInput>,
) -> ApiResult<impl IntoResponse> {
    let case = owned_case(&state, parse_id(&id, "case")?, caller.user_id).await?;
    let deadline = state
        .db
        .insert_deadline(Deadline {
            id: Uuid::new_v4(),
            case_id: case.id,
            due_date: input.due_date,
            description: required(Some(&input.description), "description")?,
            completed: false,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(deadline)))
}

/// Mark a deadline as completed, or move it.
#[utoipa::path(
    put,
    path = "/api/cases/{id}/deadlines/{deadline_id}",
    params(
        ("id" = String, Path, description = "Case id"),
        ("deadline_id" = String, Path, description = "Deadline id"),
    ),
    request_body = DeadlineChange,
    responses(
        (status = 200, description = "Deadline updated"),
        (status = 403, description = "Owned by another user"),
        (status = 404, description = "No such case or deadline"),
    ),
    security(("bearer" = [])),
    tag = "cases"
)]
pub async fn update_deadline_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthUser>,
    Path((id, deadline_id)): Path<(String, String)>,
    ValidJson(change): ValidJson<DeadlineChange>,
) -> ApiResult<Json<Deadline>> {
    let case = owned_case(&state, parse_id(&id, "case")?, caller.user_id).await?;
    let deadline_id = parse_id(&deadline_id, "deadline")?;
    let mut deadline = state
        .db
        .list_deadlines(case.id)
        .await?
        .into_iter()
        .find(|d| d.id == deadline_id)
        .ok_or(ApiError::NotFound("deadline"))?;

    if let Some(completed) = change.completed {
        deadline.completed = completed;
    }
    if let Some(due_date) = change.due_date {
        deadline.due_date = due_date;
    }
    if let Some(description) = change.description {
        deadline.description = required(Some(&description), "description")?;
    }
    Ok(Json(state.db.update_deadline(deadline).await?))
}

/// Record a procedural event of a case.
#[utoipa::path(
    post,
    path = "/api/cases/{id}/updates",
    params(("id" = String, Path, description = "Case id")),
    request_body = CaseUpdateInput,
    responses(
        (status = 201, description = "Update recorded"),
        (status = 403, description = "Owned by another user"),
        (status = 404, description = "No such case"),
    ),
    security(("bearer" = [])),
    tag = "cases"
)]
pub async fn add_case_update_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<String>,
    ValidJson(input): ValidJson<CaseUpdateInput>,
) -> ApiResult<impl IntoResponse> {
    let case = owned_case(&state, parse_id(&id, "case")?, caller.user_id).await?;
    let update = state
        .db
        .insert_case_update(CaseUpdate {
            id: Uuid::new_v4(),
            case_id: case.id,
            date: input.date.unwrap_or_else(|| Utc::now().date_naive()),
            description: required(Some(&input.description), "description")?,
            kind: optional(input.kind),
        })
        .await?;
    Ok((StatusCode::CREATED, Json(update)))
}
