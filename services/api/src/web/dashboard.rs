//! services/api/src/web/dashboard.rs

use axum::{extract::State, Extension, Json};
use chrono::Local;
use lpms_core::dashboard::{self, DashboardStats};
use std::sync::Arc;

use crate::error::ApiResult;
use crate::web::middleware::AuthUser;
use crate::web::state::AppState;

/// GET /api/dashboard - Office overview for the caller
#[utoipa::path(
    get,
    path = "/api/dashboard",
    responses((status = 200, description = "Counts of clients, cases, overdue deadlines and expected receipts")),
    security(("bearer" = [])),
    tag = "dashboard"
)]
pub async fn dashboard_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthUser>,
) -> ApiResult<Json<DashboardStats>> {
    let owner = caller.user_id;
    let clients = state.db.list_clients(owner).await?;
    let cases = state.db.list_cases(owner).await?;
    let deadlines = state.db.list_deadlines_for_owner(owner).await?;
    let opportunities = state.db.list_opportunities(owner).await?;
    let rpvs = state.db.list_rpvs(owner).await?;

    Ok(Json(dashboard::summarize(
        &clients,
        &cases,
        &deadlines,
        &opportunities,
        &rpvs,
        Local::now().date_naive(),
    )))
}
