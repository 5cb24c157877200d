//! services/api/src/web/responses.rs
//!
//! Canned replies to client questions and their delivery status.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::Utc;
use lpms_core::domain::{Case, Communication, CommunicationStatus, ResponseKind};
use lpms_core::responses;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::web::cases::owned_case;
use crate::web::clients::owned_client;
use crate::web::extract::{ensure_owner, found, optional, parse_id, required, ValidJson};
use crate::web::middleware::AuthUser;
use crate::web::state::AppState;

const DATE_FORMAT: &str = "%d/%m/%Y";

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct GenerateRequest {
    pub client_id: Option<Uuid>,
    pub client_name: Option<String>,
    pub case_id: Option<Uuid>,
    pub question: Option<String>,
    #[schema(value_type = Option<String>)]
    pub kind: Option<ResponseKind>,
    /// Placeholder values by name without brackets, e.g. `"FASE": "instrucao"`.
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
}

#[derive(Serialize)]
pub struct GenerateResponse {
    pub communication: Communication,
    pub unresolved: Vec<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct SendRequest {
    /// Delivery channel, e.g. `email` or `whatsapp`.
    pub channel: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CommunicationChange {
    pub body: Option<String>,
    #[schema(value_type = Option<String>)]
    pub status: Option<CommunicationStatus>,
    pub channel: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    #[param(value_type = Option<String>)]
    pub status: Option<CommunicationStatus>,
}

//=========================================================================================
// Helpers
//=========================================================================================

async fn owned_communication(state: &AppState, id: &str, caller: Uuid) -> ApiResult<Communication> {
    let communication = found(
        state.db.get_communication(parse_id(id, "communication")?).await,
        "communication",
    )?;
    ensure_owner(communication.owner_id, caller)?;
    Ok(communication)
}

/// Placeholder values known from the stored case and its latest update.
async fn case_facts(state: &AppState, case: &Case) -> ApiResult<BTreeMap<String, String>> {
    let mut facts = BTreeMap::new();
    facts.insert("PROCESSO".to_string(), case.case_number.clone());
    facts.insert("FASE".to_string(), case.status.clone());
    if let Some(deadline) = case.next_deadline {
        facts.insert("PROXIMO_PRAZO".to_string(), deadline.format(DATE_FORMAT).to_string());
    }
    if let Some(description) = &case.deadline_description {
        facts.insert("ACAO".to_string(), description.clone());
    }
    let updates = state.db.list_case_updates(case.id).await?;
    if let Some(latest) = updates.iter().max_by_key(|u| u.date) {
        facts.insert("DATA".to_string(), latest.date.format(DATE_FORMAT).to_string());
        facts.insert("EVENTO".to_string(), latest.description.clone());
    }
    Ok(facts)
}

//=========================================================================================
// Handlers
//=========================================================================================

/// Fill the template for the question kind and save it as generated.
///
/// Values come from the client name, then the case, then `fields`; later
/// sources win.
#[utoipa::path(
    post,
    path = "/api/responses/generate",
    request_body = GenerateRequest,
    responses(
        (status = 201, description = "Saved reply with its unresolved placeholders"),
        (status = 400, description = "Missing client, question or kind"),
        (status = 403, description = "Client or case owned by another user"),
    ),
    security(("bearer" = [])),
    tag = "responses"
)]
pub async fn generate_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthUser>,
    ValidJson(req): ValidJson<GenerateRequest>,
) -> ApiResult<impl IntoResponse> {
    let question = required(req.question.as_deref(), "question")?;
    let kind = req
        .kind
        .ok_or_else(|| ApiError::Validation("kind is required".to_string()))?;

    let client = match req.client_id {
        Some(id) => Some(owned_client(&state, id, caller.user_id).await?),
        None => None,
    };
    let client_name = match (&client, optional(req.client_name)) {
        (Some(client), _) => client.name.clone(),
        (None, Some(name)) => name,
        (None, None) => {
            return Err(ApiError::Validation(
                "client_id or client_name is required".to_string(),
            ))
        }
    };

    let mut values = BTreeMap::new();
    values.insert("CLIENTE".to_string(), client_name.clone());
    if let Some(case_id) = req.case_id {
        let case = owned_case(&state, case_id, caller.user_id).await?;
        values.extend(case_facts(&state, &case).await?);
    }
    values.extend(req.fields);
    let rendered = responses::render(kind, &values);

    let communication = state
        .db
        .insert_communication(Communication {
            id: Uuid::new_v4(),
            owner_id: caller.user_id,
            client_id: client.map(|c| c.id),
            client_name,
            question,
            kind,
            channel: None,
            body: rendered.body,
            status: CommunicationStatus::Generated,
            created_at: Utc::now(),
            sent_at: None,
        })
        .await?;
    info!(
        "Reply {} generated ({}), {} placeholders open",
        communication.id,
        kind.as_str(),
        rendered.unresolved.len()
    );

    Ok((
        StatusCode::CREATED,
        Json(GenerateResponse {
            communication,
            unresolved: rendered.unresolved,
        }),
    ))
}

/// Record that a reply went out through a channel.
#[utoipa::path(
    post,
    path = "/api/responses/{id}/send",
    params(("id" = String, Path, description = "Communication id")),
    request_body = SendRequest,
    responses(
        (status = 200, description = "Reply marked as sent"),
        (status = 400, description = "Missing channel"),
        (status = 403, description = "Owned by another user"),
        (status = 404, description = "No such communication"),
    ),
    security(("bearer" = [])),
    tag = "responses"
)]
pub async fn send_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<String>,
    ValidJson(req): ValidJson<SendRequest>,
) -> ApiResult<Json<Communication>> {
    let mut communication = owned_communication(&state, &id, caller.user_id).await?;
    communication.channel = Some(required(req.channel.as_deref(), "channel")?);
    communication.status = CommunicationStatus::Sent;
    communication.sent_at = Some(Utc::now());
    let communication = state.db.update_communication(communication).await?;
    info!(
        "Reply {} sent via {}",
        communication.id,
        communication.channel.as_deref().unwrap_or_default()
    );
    Ok(Json(communication))
}

#[utoipa::path(
    get,
    path = "/api/responses",
    params(ListQuery),
    responses((status = 200, description = "Replies of the caller, newest first")),
    security(("bearer" = [])),
    tag = "responses"
)]
pub async fn list_responses_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthUser>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<Communication>>> {
    let all = state.db.list_communications(caller.user_id).await?;
    Ok(Json(
        all.into_iter()
            .filter(|c| query.status.map_or(true, |s| c.status == s))
            .collect(),
    ))
}

#[utoipa::path(
    get,
    path = "/api/responses/{id}",
    params(("id" = String, Path, description = "Communication id")),
    responses(
        (status = 200, description = "Saved reply"),
        (status = 403, description = "Owned by another user"),
        (status = 404, description = "No such communication"),
    ),
    security(("bearer" = [])),
    tag = "responses"
)]
pub async fn get_response_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<Communication>> {
    Ok(Json(owned_communication(&state, &id, caller.user_id).await?))
}

#[utoipa::path(
    put,
    path = "/api/responses/{id}",
    params(("id" = String, Path, description = "Communication id")),
    request_body = CommunicationChange,
    responses(
        (status = 200, description = "Reply updated"),
        (status = 403, description = "Owned by another user"),
        (status = 404, description = "No such communication"),
    ),
    security(("bearer" = [])),
    tag = "responses"
)]
pub async fn update_response_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<String>,
    ValidJson(change): ValidJson<CommunicationChange>,
) -> ApiResult<Json<Communication>> {
    let mut communication = owned_communication(&state, &id, caller.user_id).await?;
    if let Some(body) = change.body {
        communication.body = required(Some(&body), "body")?;
    }
    if change.channel.is_some() {
        communication.channel = optional(change.channel);
    }
    if let Some(status) = change.status {
        if status == CommunicationStatus::Sent && communication.sent_at.is_none() {
            communication.sent_at = Some(Utc::now());
        }
        communication.status = status;
    }
    Ok(Json(state.db.update_communication(communication).await?))
}

#[utoipa::path(
    delete,
    path = "/api/responses/{id}",
    params(("id" = String, Path, description = "Communication id")),
    responses(
        (status = 200, description = "Reply deleted"),
        (status = 403, description = "Owned by another user"),
        (status = 404, description = "No such communication"),
    ),
    security(("bearer" = [])),
    tag = "responses"
)]
pub async fn delete_response_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    let communication = owned_communication(&state, &id, caller.user_id).await?;
    state.db.delete_communication(communication.id).await?;
    Ok(Json(json!({ "message": "communication deleted" })))
}
