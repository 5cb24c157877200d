//! services/api/src/web/court.rs
//!
//! Case status lookups on the public court portal.

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use lpms_core::court::{self, CourtCase};
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

use crate::error::{ApiError, ApiResult};
use crate::web::middleware::AuthUser;
use crate::web::state::AppState;

#[derive(Serialize)]
pub struct CaseStatus {
    #[serde(flatten)]
    pub case: CourtCase,
    pub summary: String,
}

impl From<CourtCase> for CaseStatus {
    fn from(case: CourtCase) -> Self {
        let summary = court::render_case_summary(&case);
        Self { case, summary }
    }
}

#[derive(Serialize)]
pub struct CpfCases {
    pub cpf: String,
    pub cases: Vec<CaseStatus>,
    pub total: usize,
}

#[utoipa::path(
    get,
    path = "/api/court/cases/{number}",
    params(("number" = String, Path, description = "Unified case number NNNNNNN-DD.AAAA.J.TT.OOOO")),
    responses(
        (status = 200, description = "Case status with a plain-language summary"),
        (status = 400, description = "Malformed case number"),
        (status = 404, description = "Not available from the portal"),
    ),
    security(("bearer" = [])),
    tag = "court"
)]
pub async fn lookup_case_handler(
    State(state): State<Arc<AppState>>,
    Extension(_caller): Extension<AuthUser>,
    Path(number): Path<String>,
) -> ApiResult<Json<CaseStatus>> {
    if !court::validate_case_number(&number) {
        return Err(ApiError::Validation("invalid case number".to_string()));
    }
    match state.court.lookup_case(&number).await {
        Ok(case) => Ok(Json(case.into())),
        Err(e) => {
            warn!("Court lookup for case {} failed: {}", number, e);
            Err(ApiError::NotFound("court case"))
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/court/cpf/{cpf}",
    params(("cpf" = String, Path, description = "Party CPF, punctuation allowed")),
    responses(
        (status = 200, description = "Cases of the party"),
        (status = 400, description = "Malformed CPF"),
        (status = 404, description = "Not available from the portal"),
    ),
    security(("bearer" = [])),
    tag = "court"
)]
pub async fn lookup_by_cpf_handler(
    State(state): State<Arc<AppState>>,
    Extension(_caller): Extension<AuthUser>,
    Path(cpf): Path<String>,
) -> ApiResult<Json<CpfCases>> {
    if !court::validate_cpf(&cpf) {
        return Err(ApiError::Validation("invalid cpf".to_string()));
    }
    let cpf = court::normalize_cpf(&cpf);
    match state.court.lookup_by_cpf(&cpf).await {
        Ok(cases) => {
            let cases: Vec<CaseStatus> = cases.into_iter().map(CaseStatus::from).collect();
            Ok(Json(CpfCases {
                cpf,
                total: cases.len(),
                cases,
            }))
        }
        Err(e) => {
            warn!("Court lookup by cpf failed: {}", e);
            Err(ApiError::NotFound("court case"))
        }
    }
}
