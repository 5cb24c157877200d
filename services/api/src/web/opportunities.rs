//! services/api/src/web/opportunities.rs
//!
//! Claim discovery over client profiles and the lifecycle of stored
//! opportunities.

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use lpms_core::domain::{Client, Opportunity, OpportunityStatus};
use lpms_core::opportunity::{self, CandidateOpportunity, ClientProfile};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::web::clients::owned_client;
use crate::web::extract::{ensure_owner, found, optional, parse_id, ValidJson};
use crate::web::middleware::AuthUser;
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

/// Either a stored client (`client_id`) or inline profile data.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct AnalyzeClientRequest {
    pub client_id: Option<Uuid>,
    pub name: Option<String>,
    pub cpf: Option<String>,
    pub admission_date: Option<NaiveDate>,
    pub retirement_date: Option<NaiveDate>,
    pub position: Option<String>,
    pub salary: Option<f64>,
}

#[derive(Serialize)]
pub struct AnalyzedClient {
    pub name: String,
    pub cpf: Option<String>,
    pub position: Option<String>,
}

#[derive(Serialize)]
pub struct AnalyzeClientResponse {
    pub client: AnalyzedClient,
    pub opportunities: Vec<CandidateOpportunity>,
    pub total: usize,
    /// Rows persisted by this analysis; empty for inline profiles.
    pub saved: Vec<Opportunity>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AnalyzeBulkRequest {
    #[serde(default)]
    #[schema(value_type = Vec<Object>)]
    pub clients: Vec<ClientProfile>,
}

#[derive(Serialize)]
pub struct ClientOpportunities {
    pub client_id: String,
    pub opportunities: Vec<CandidateOpportunity>,
}

#[derive(Serialize)]
pub struct AnalyzeBulkResponse {
    pub total_clients: usize,
    pub total_opportunities: usize,
    pub results: Vec<ClientOpportunities>,
}

/// A `tenure_years` field is tolerated and ignored; tenure does not enter the score.
#[derive(Debug, Deserialize, ToSchema)]
pub struct PrioritizeRequest {
    #[schema(value_type = Vec<Object>)]
    pub opportunities: Vec<CandidateOpportunity>,
    #[serde(default)]
    pub salary: f64,
}

#[derive(Serialize)]
pub struct PrioritizeResponse {
    pub opportunities: Vec<CandidateOpportunity>,
    pub total: usize,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ReportRequest {
    #[schema(value_type = Vec<Object>)]
    pub opportunities: Vec<CandidateOpportunity>,
}

#[derive(Serialize)]
pub struct ReportResponse {
    pub report: String,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct StatusChange {
    #[schema(value_type = String)]
    pub status: OpportunityStatus,
}

//=========================================================================================
// Helpers
//=========================================================================================

async fn owned_opportunity(state: &AppState, id: &str, caller: Uuid) -> ApiResult<Opportunity> {
    let opportunity = found(
        state.db.get_opportunity(parse_id(id, "opportunity")?).await,
        "opportunity",
    )?;
    ensure_owner(opportunity.owner_id, caller)?;
    Ok(opportunity)
}

fn stored_profile(client: &Client, salary: f64) -> ApiResult<ClientProfile> {
    let (Some(admission_date), Some(retirement_date)) =
        (client.admission_date, client.expected_retirement_date)
    else {
        return Err(ApiError::Validation(
            "the client needs admission_date and expected_retirement_date".to_string(),
        ));
    };
    Ok(ClientProfile {
        id: client.id.to_string(),
        name: client.name.clone(),
        cpf: Some(client.cpf.clone()),
        admission_date,
        retirement_date,
        position: client.position.clone(),
        salary,
    })
}

fn transition(opportunity: &mut Opportunity, next: OpportunityStatus) -> ApiResult<()> {
    if !opportunity.status.can_transition_to(next) {
        return Err(ApiError::Validation(format!(
            "cannot move an opportunity from {} to {}",
            opportunity.status.as_str(),
            next.as_str()
        )));
    }
    if next == OpportunityStatus::Filed && opportunity.filed_at.is_none() {
        opportunity.filed_at = Some(Utc::now());
    }
    opportunity.status = next;
    Ok(())
}

//=========================================================================================
// Analysis Handlers
//=========================================================================================

/// Analyze one client. A stored client gets its new theses persisted.
#[utoipa::path(
    post,
    path = "/api/opportunities/analyze-client",
    request_body = AnalyzeClientRequest,
    responses(
        (status = 200, description = "Qualifying theses, highest confidence first"),
        (status = 400, description = "Missing name or dates"),
        (status = 403, description = "Client owned by another user"),
    ),
    security(("bearer" = [])),
    tag = "opportunities"
)]
pub async fn analyze_client_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthUser>,
    ValidJson(req): ValidJson<AnalyzeClientRequest>,
) -> ApiResult<Json<AnalyzeClientResponse>> {
    let salary = req.salary.unwrap_or(0.0);

    let Some(client_id) = req.client_id else {
        let (Some(name), Some(admission_date), Some(retirement_date)) =
            (optional(req.name), req.admission_date, req.retirement_date)
        else {
            return Err(ApiError::Validation(
                "name, admission_date and retirement_date are required".to_string(),
            ));
        };
        let profile = ClientProfile {
            id: Uuid::new_v4().to_string(),
            name,
            cpf: optional(req.cpf),
            admission_date,
            retirement_date,
            position: optional(req.position),
            salary,
        };
        let opportunities = opportunity::discover(&profile);
        return Ok(Json(AnalyzeClientResponse {
            client: AnalyzedClient {
                name: profile.name,
                cpf: profile.cpf,
                position: profile.position,
            },
            total: opportunities.len(),
            opportunities,
            saved: Vec::new(),
        }));
    };

    let client = owned_client(&state, client_id, caller.user_id).await?;
    let profile = stored_profile(&client, salary)?;
    let opportunities = opportunity::discover(&profile);

    let known: HashSet<_> = state
        .db
        .list_opportunities_for_client(client.id)
        .await?
        .into_iter()
        .map(|o| o.thesis)
        .collect();
    let mut saved = Vec::new();
    for candidate in opportunities.iter().filter(|c| !known.contains(&c.thesis)) {
        let row = state
            .db
            .insert_opportunity(Opportunity {
                id: Uuid::new_v4(),
                owner_id: caller.user_id,
                client_id: client.id,
                thesis: candidate.thesis,
                confidence: candidate.confidence,
                rationale: candidate.rationale.clone(),
                required_documents: candidate.required_documents.clone(),
                status: OpportunityStatus::New,
                created_at: Utc::now(),
                filed_at: None,
            })
            .await?;
        saved.push(row);
    }
    info!(
        "Analyzed client {}: {} theses, {} new",
        client.id,
        opportunities.len(),
        saved.len()
    );

    Ok(Json(AnalyzeClientResponse {
        client: AnalyzedClient {
            name: client.name,
            cpf: Some(client.cpf),
            position: client.position,
        },
        total: opportunities.len(),
        opportunities,
        saved,
    }))
}

#[utoipa::path(
    post,
    path = "/api/opportunities/analyze-bulk",
    request_body = AnalyzeBulkRequest,
    responses(
        (status = 200, description = "Theses per client"),
        (status = 400, description = "Empty client list"),
    ),
    security(("bearer" = [])),
    tag = "opportunities"
)]
pub async fn analyze_bulk_handler(
    Extension(_caller): Extension<AuthUser>,
    ValidJson(req): ValidJson<AnalyzeBulkRequest>,
) -> ApiResult<Json<AnalyzeBulkResponse>> {
    if req.clients.is_empty() {
        return Err(ApiError::Validation("clients must not be empty".to_string()));
    }
    let results: Vec<ClientOpportunities> = req
        .clients
        .iter()
        .map(|profile| ClientOpportunities {
            client_id: profile.id.clone(),
            opportunities: opportunity::discover(profile),
        })
        .collect();

    Ok(Json(AnalyzeBulkResponse {
        total_clients: req.clients.len(),
        total_opportunities: results.iter().map(|r| r.opportunities.len()).sum(),
        results,
    }))
}

#[utoipa::path(
    post,
    path = "/api/opportunities/prioritize",
    request_body = PrioritizeRequest,
    responses((status = 200, description = "Opportunities by priority score")),
    security(("bearer" = [])),
    tag = "opportunities"
)]
pub async fn prioritize_handler(
    Extension(_caller): Extension<AuthUser>,
    ValidJson(req): ValidJson<PrioritizeRequest>,
) -> ApiResult<Json<PrioritizeResponse>> {
    let opportunities = opportunity::prioritize(req.opportunities, req.salary);
    Ok(Json(PrioritizeResponse {
        total: opportunities.len(),
        opportunities,
    }))
}

#[utoipa::path(
    post,
    path = "/api/opportunities/report",
    request_body = ReportRequest,
    responses((status = 200, description = "Narrative analysis, or a fixed notice when unavailable")),
    security(("bearer" = [])),
    tag = "opportunities"
)]
pub async fn report_handler(
    State(state): State<Arc<AppState>>,
    Extension(_caller): Extension<AuthUser>,
    ValidJson(req): ValidJson<ReportRequest>,
) -> ApiResult<Json<ReportResponse>> {
    let report = opportunity::report(state.completion.as_ref(), &req.opportunities).await;
    Ok(Json(ReportResponse {
        report,
        generated_at: Utc::now(),
    }))
}

//=========================================================================================
// Stored Opportunities
//=========================================================================================

#[utoipa::path(
    get,
    path = "/api/opportunities",
    responses((status = 200, description = "Stored opportunities of the caller")),
    security(("bearer" = [])),
    tag = "opportunities"
)]
pub async fn list_opportunities_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthUser>,
) -> ApiResult<Json<Vec<Opportunity>>> {
    Ok(Json(state.db.list_opportunities(caller.user_id).await?))
}

#[utoipa::path(
    get,
    path = "/api/opportunities/{id}",
    params(("id" = String, Path, description = "Opportunity id")),
    responses(
        (status = 200, description = "Stored opportunity"),
        (status = 403, description = "Owned by another user"),
        (status = 404, description = "No such opportunity"),
    ),
    security(("bearer" = [])),
    tag = "opportunities"
)]
pub async fn get_opportunity_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<Opportunity>> {
    Ok(Json(owned_opportunity(&state, &id, caller.user_id).await?))
}

#[utoipa::path(
    put,
    path = "/api/opportunities/{id}/status",
    params(("id" = String, Path, description = "Opportunity id")),
    request_body = StatusChange,
    responses(
        (status = 200, description = "Status changed"),
        (status = 400, description = "Backward transition"),
        (status = 403, description = "Owned by another user"),
        (status = 404, description = "No such opportunity"),
    ),
    security(("bearer" = [])),
    tag = "opportunities"
)]
pub async fn update_status_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<String>,
    ValidJson(change): ValidJson<StatusChange>,
) -> ApiResult<Json<Opportunity>> {
    let mut opportunity = owned_opportunity(&state, &id, caller.user_id).await?;
    transition(&mut opportunity, change.status)?;
    Ok(Json(state.db.update_opportunity(opportunity).await?))
}

/// Mark an opportunity as filed in court.
#[utoipa::path(
    put,
    path = "/api/opportunities/{id}/file",
    params(("id" = String, Path, description = "Opportunity id")),
    responses(
        (status = 200, description = "Opportunity filed"),
        (status = 403, description = "Owned by another user"),
        (status = 404, description = "No such opportunity"),
    ),
    security(("bearer" = [])),
    tag = "opportunities"
)]
pub async fn file_opportunity_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<Opportunity>> {
    let mut opportunity = owned_opportunity(&state, &id, caller.user_id).await?;
    transition(&mut opportunity, OpportunityStatus::Filed)?;
    info!("Opportunity {} filed", opportunity.id);
    Ok(Json(state.db.update_opportunity(opportunity).await?))
}

#[utoipa::path(
    delete,
    path = "/api/opportunities/{id}",
    params(("id" = String, Path, description = "Opportunity id")),
    responses(
        (status = 200, description = "Opportunity deleted"),
        (status = 403, description = "Owned by another user"),
        (status = 404, description = "No such opportunity"),
    ),
    security(("bearer" = [])),
    tag = "opportunities"
)]
pub async fn delete_opportunity_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    let opportunity = owned_opportunity(&state, &id, caller.user_id).await?;
    state.db.delete_opportunity(opportunity.id).await?;
    Ok(Json(json!({ "message": "opportunity deleted" })))
}
