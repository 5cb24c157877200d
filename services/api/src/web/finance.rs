//! services/api/src/web/finance.rs
//!
//! Ledger movements, RPV forecasts and the aggregated finance views.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use chrono::{DateTime, Local, NaiveDate, Utc};
use lpms_core::domain::{FinancialMovement, MovementKind, RpvForecast, RpvStatus};
use lpms_core::finance::{self, FinanceReport, FinanceStats, MovementFilter, RpvFilter};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::info;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::pdf;
use crate::web::cases::owned_case;
use crate::web::clients::owned_client;
use crate::web::documents::pdf_attachment;
use crate::web::extract::{ensure_owner, found, optional, parse_id, required, ValidJson};
use crate::web::middleware::AuthUser;
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct MovementInput {
    pub date: Option<NaiveDate>,
    pub description: Option<String>,
    #[schema(value_type = Option<String>)]
    pub kind: Option<MovementKind>,
    pub amount: Option<f64>,
    pub category: Option<String>,
    pub case_id: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MovementQuery {
    #[param(value_type = Option<String>)]
    pub kind: Option<MovementKind>,
    pub category: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct RpvInput {
    pub client_id: Option<Uuid>,
    pub case_id: Option<Uuid>,
    pub expected_date: Option<NaiveDate>,
    pub amount: Option<f64>,
    pub thesis: Option<String>,
    #[schema(value_type = Option<String>)]
    pub status: Option<RpvStatus>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RpvQuery {
    #[param(value_type = Option<String>)]
    pub status: Option<RpvStatus>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Json,
    Pdf,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ReportQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    /// `json` (default) or `pdf`.
    #[param(value_type = Option<String>)]
    pub format: Option<ReportFormat>,
}

#[derive(Serialize)]
pub struct ReportResponse {
    #[serde(flatten)]
    pub report: FinanceReport,
    pub generated_at: DateTime<Utc>,
}

fn positive_amount(amount: f64) -> ApiResult<f64> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(ApiError::Validation("amount must be greater than zero".to_string()));
    }
    Ok(amount)
}

async fn owned_movement(state: &AppState, id: &str, caller: Uuid) -> ApiResult<FinancialMovement> {
    let movement = found(state.db.get_movement(parse_id(id, "movement")?).await, "movement")?;
    ensure_owner(movement.owner_id, caller)?;
    Ok(movement)
}

async fn owned_rpv(state: &AppState, id: &str, caller: Uuid) -> ApiResult<RpvForecast> {
    let rpv = found(state.db.get_rpv(parse_id(id, "rpv")?).await, "rpv")?;
    ensure_owner(rpv.owner_id, caller)?;
    Ok(rpv)
}

//=========================================================================================
// Movements
//=========================================================================================

#[utoipa::path(
    get,
    path = "/api/finance/movements",
    params(MovementQuery),
    responses((status = 200, description = "Ledger entries, most recent first")),
    security(("bearer" = [])),
    tag = "finance"
)]
pub async fn list_movements_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthUser>,
    Query(query): Query<MovementQuery>,
) -> ApiResult<Json<Vec<FinancialMovement>>> {
    let filter = MovementFilter {
        kind: query.kind,
        category: optional(query.category),
        from: query.from,
        to: query.to,
    };
    let movements = state.db.list_movements(caller.user_id).await?;
    Ok(Json(movements.into_iter().filter(|m| filter.matches(m)).collect()))
}

#[utoipa::path(
    get,
    path = "/api/finance/movements/{id}",
    params(("id" = String, Path, description = "Movement id")),
    responses(
        (status = 200, description = "Ledger entry"),
        (status = 403, description = "Owned by another user"),
        (status = 404, description = "No such movement"),
    ),
    security(("bearer" = [])),
    tag = "finance"
)]
pub async fn get_movement_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<FinancialMovement>> {
    Ok(Json(owned_movement(&state, &id, caller.user_id).await?))
}

#[utoipa::path(
    post,
    path = "/api/finance/movements",
    request_body = MovementInput,
    responses(
        (status = 201, description = "Movement recorded"),
        (status = 400, description = "Missing fields or non-positive amount"),
        (status = 403, description = "Case owned by another user"),
    ),
    security(("bearer" = [])),
    tag = "finance"
)]
pub async fn create_movement_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthUser>,
    ValidJson(input): ValidJson<MovementInput>,
) -> ApiResult<impl IntoResponse> {
    let (Some(date), Some(kind), Some(amount)) = (input.date, input.kind, input.amount) else {
        return Err(ApiError::Validation(
            "date, description, kind, amount and category are required".to_string(),
        ));
    };
    let description = required(input.description.as_deref(), "description")?;
    let category = required(input.category.as_deref(), "category")?;
    let amount = positive_amount(amount)?;
    let case_id = match input.case_id {
        Some(case_id) => Some(owned_case(&state, case_id, caller.user_id).await?.id),
        None => None,
    };

    let movement = state
        .db
        .insert_movement(FinancialMovement {
            id: Uuid::new_v4(),
            owner_id: caller.user_id,
            date,
            description,
            kind,
            amount,
            category,
            case_id,
            created_at: Utc::now(),
        })
        .await?;
    info!("Movement {} ({}) recorded", movement.id, movement.kind.as_str());
    Ok((StatusCode::CREATED, Json(movement)))
}

#[utoipa::path(
    put,
    path = "/api/finance/movements/{id}",
    params(("id" = String, Path, description = "Movement id")),
    request_body = MovementInput,
    responses(
        (status = 200, description = "Movement updated"),
        (status = 400, description = "Invalid field"),
        (status = 403, description = "Owned by another user"),
        (status = 404, description = "No such movement"),
    ),
    security(("bearer" = [])),
    tag = "finance"
)]
pub async fn update_movement_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<String>,
    ValidJson(input): ValidJson<MovementInput>,
) -> ApiResult<Json<FinancialMovement>> {
    let mut movement = owned_movement(&state, &id, caller.user_id).await?;
    if let Some(description) = input.description {
        movement.description = required(Some(&description), "description")?;
    }
    if let Some(category) = input.category {
        movement.category = required(Some(&category), "category")?;
    }
    if let Some(amount) = input.amount {
        movement.amount = positive_amount(amount)?;
    }
    if let Some(case_id) = input.case_id.filter(|c| Some(*c) != movement.case_id) {
        movement.case_id = Some(owned_case(&state, case_id, caller.user_id).await?.id);
    }
    movement.date = input.date.unwrap_or(movement.date);
    movement.kind = input.kind.unwrap_or(movement.kind);
    Ok(Json(state.db.update_movement(movement).await?))
}

#[utoipa::path(
    delete,
    path = "/api/finance/movements/{id}",
    params(("id" = String, Path, description = "Movement id")),
    responses(
        (status = 200, description = "Movement deleted"),
        (status = 403, description = "Owned by another user"),
        (status = 404, description = "No such movement"),
    ),
    security(("bearer" = [])),
    tag = "finance"
)]
pub async fn delete_movement_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    let movement = owned_movement(&state, &id, caller.user_id).await?;
    state.db.delete_movement(movement.id).await?;
    Ok(Json(json!({ "message": "movement deleted" })))
}

//=========================================================================================
// RPV Forecasts
//=========================================================================================

#[utoipa::path(
    get,
    path = "/api/finance/rpvs",
    params(RpvQuery),
    responses((status = 200, description = "RPV forecasts by expected date")),
    security(("bearer" = [])),
    tag = "finance"
)]
pub async fn list_rpvs_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthUser>,
    Query(query): Query<RpvQuery>,
) -> ApiResult<Json<Vec<RpvForecast>>> {
    let filter = RpvFilter {
        status: query.status,
        from: query.from,
        to: query.to,
    };
    let rpvs = state.db.list_rpvs(caller.user_id).await?;
    Ok(Json(rpvs.into_iter().filter(|r| filter.matches(r)).collect()))
}

#[utoipa::path(
    get,
    path = "/api/finance/rpvs/{id}",
    params(("id" = String, Path, description = "RPV id")),
    responses(
        (status = 200, description = "RPV forecast"),
        (status = 403, description = "Owned by another user"),
        (status = 404, description = "No such RPV"),
    ),
    security(("bearer" = [])),
    tag = "finance"
)]
pub async fn get_rpv_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<RpvForecast>> {
    Ok(Json(owned_rpv(&state, &id, caller.user_id).await?))
}

/// Record an expected payment. New forecasts always start as pending.
#[utoipa::path(
    post,
    path = "/api/finance/rpvs",
    request_body = RpvInput,
    responses(
        (status = 201, description = "Forecast recorded"),
        (status = 400, description = "Missing fields, non-positive amount or case of another client"),
        (status = 403, description = "Client or case owned by another user"),
    ),
    security(("bearer" = [])),
    tag = "finance"
)]
pub async fn create_rpv_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthUser>,
    ValidJson(input): ValidJson<RpvInput>,
) -> ApiResult<impl IntoResponse> {
    let (Some(client_id), Some(case_id), Some(expected_date), Some(amount)) =
        (input.client_id, input.case_id, input.expected_date, input.amount)
    else {
        return Err(ApiError::Validation(
            "client_id, case_id, expected_date and amount are required".to_string(),
        ));
    };
    let amount = positive_amount(amount)?;
    let client = owned_client(&state, client_id, caller.user_id).await?;
    let case = owned_case(&state, case_id, caller.user_id).await?;
    if case.client_id != client.id {
        return Err(ApiError::Validation(
            "case does not belong to the client".to_string(),
        ));
    }

    let rpv = state
        .db
        .insert_rpv(RpvForecast {
            id: Uuid::new_v4(),
            owner_id: caller.user_id,
            client_id: client.id,
            case_id: case.id,
            expected_date,
            amount,
            thesis: optional(input.thesis),
            status: RpvStatus::Pending,
            created_at: Utc::now(),
        })
        .await?;
    Ok((StatusCode::CREATED, Json(rpv)))
}

#[utoipa::path(
    put,
    path = "/api/finance/rpvs/{id}",
    params(("id" = String, Path, description = "RPV id")),
    request_body = RpvInput,
    responses(
        (status = 200, description = "Forecast updated"),
        (status = 400, description = "Invalid amount or status transition"),
        (status = 403, description = "Owned by another user"),
        (status = 404, description = "No such RPV"),
    ),
    security(("bearer" = [])),
    tag = "finance"
)]
pub async fn update_rpv_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<String>,
    ValidJson(input): ValidJson<RpvInput>,
) -> ApiResult<Json<RpvForecast>> {
    let mut rpv = owned_rpv(&state, &id, caller.user_id).await?;
    if let Some(status) = input.status {
        if !rpv.status.can_transition_to(status) {
            return Err(ApiError::Validation(format!(
                "cannot move an rpv from {} to {}",
                rpv.status.as_str(),
                status.as_str()
            )));
        }
        rpv.status = status;
    }
    if let Some(amount) = input.amount {
        rpv.amount = positive_amount(amount)?;
    }
    if input.thesis.is_some() {
        rpv.thesis = optional(input.thesis);
    }
    rpv.expected_date = input.expected_date.unwrap_or(rpv.expected_date);
    Ok(Json(state.db.update_rpv(rpv).await?))
}

#[utoipa::path(
    delete,
    path = "/api/finance/rpvs/{id}",
    params(("id" = String, Path, description = "RPV id")),
    responses(
        (status = 200, description = "Forecast deleted"),
        (status = 403, description = "Owned by another user"),
        (status = 404, description = "No such RPV"),
    ),
    security(("bearer" = [])),
    tag = "finance"
)]
pub async fn delete_rpv_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    let rpv = owned_rpv(&state, &id, caller.user_id).await?;
    state.db.delete_rpv(rpv.id).await?;
    Ok(Json(json!({ "message": "rpv deleted" })))
}

//=========================================================================================
// Aggregates
//=========================================================================================

#[utoipa::path(
    get,
    path = "/api/finance/stats",
    responses((status = 200, description = "Balance, month totals and pending RPVs")),
    security(("bearer" = [])),
    tag = "finance"
)]
pub async fn stats_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthUser>,
) -> ApiResult<Json<FinanceStats>> {
    let movements = state.db.list_movements(caller.user_id).await?;
    let rpvs = state.db.list_rpvs(caller.user_id).await?;
    let cases = state.db.list_cases(caller.user_id).await?;
    Ok(Json(finance::stats(
        &movements,
        &rpvs,
        &cases,
        Local::now().date_naive(),
    )))
}

#[utoipa::path(
    get,
    path = "/api/finance/report",
    params(ReportQuery),
    responses(
        (status = 200, description = "Period report as JSON, or Relatorio_Financeiro.pdf"),
    ),
    security(("bearer" = [])),
    tag = "finance"
)]
pub async fn report_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthUser>,
    Query(query): Query<ReportQuery>,
) -> ApiResult<Response> {
    if let (Some(from), Some(to)) = (query.from, query.to) {
        if from > to {
            return Err(ApiError::Validation("from must not be after to".to_string()));
        }
    }
    let movements = state.db.list_movements(caller.user_id).await?;
    let rpvs = state.db.list_rpvs(caller.user_id).await?;
    let cases = state.db.list_cases(caller.user_id).await?;
    let report = finance::report(&movements, &rpvs, &cases, query.from, query.to);
    let generated_at = Utc::now();

    match query.format.unwrap_or_default() {
        ReportFormat::Json => Ok(Json(ReportResponse {
            report,
            generated_at,
        })
        .into_response()),
        ReportFormat::Pdf => Ok(pdf_attachment(
            pdf::FINANCE_REPORT_FILE,
            pdf::render_finance_report(&report, generated_at),
        )),
    }
}
