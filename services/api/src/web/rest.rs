//! services/api/src/web/rest.rs
//!
//! The master definition for the OpenAPI specification and the health probe.

use axum::response::Json;
use serde::Serialize;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, ToSchema};

use crate::web::{
    auth, cases, clients, court, dashboard, documents, finance, opportunities, petitions,
    responses,
};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        health_handler,
        auth::register_handler,
        auth::login_handler,
        auth::me_handler,
        clients::list_clients_handler,
        clients::get_client_handler,
        clients::create_client_handler,
        clients::update_client_handler,
        clients::delete_client_handler,
        cases::list_cases_handler,
        cases::get_case_handler,
        cases::create_case_handler,
        cases::update_case_handler,
        cases::delete_case_handler,
        cases::add_deadline_handler,
        cases::update_deadline_handler,
        cases::add_case_update_handler,
        documents::list_documents_handler,
        documents::get_document_handler,
        documents::create_document_handler,
        documents::update_document_handler,
        documents::delete_document_handler,
        documents::power_of_attorney_handler,
        documents::service_contract_handler,
        documents::indigency_declaration_handler,
        finance::list_movements_handler,
        finance::get_movement_handler,
        finance::create_movement_handler,
        finance::update_movement_handler,
        finance::delete_movement_handler,
        finance::list_rpvs_handler,
        finance::get_rpv_handler,
        finance::create_rpv_handler,
        finance::update_rpv_handler,
        finance::delete_rpv_handler,
        finance::stats_handler,
        finance::report_handler,
        dashboard::dashboard_handler,
        opportunities::analyze_client_handler,
        opportunities::analyze_bulk_handler,
        opportunities::prioritize_handler,
        opportunities::report_handler,
        opportunities::list_opportunities_handler,
        opportunities::get_opportunity_handler,
        opportunities::update_status_handler,
        opportunities::file_opportunity_handler,
        opportunities::delete_opportunity_handler,
        petitions::generate_handler,
        petitions::validate_handler,
        petitions::summary_handler,
        petitions::analyze_handler,
        petitions::templates_handler,
        petitions::list_petitions_handler,
        petitions::get_petition_handler,
        petitions::create_petition_handler,
        petitions::update_petition_handler,
        petitions::delete_petition_handler,
        responses::generate_handler,
        responses::send_handler,
        responses::list_responses_handler,
        responses::get_response_handler,
        responses::update_response_handler,
        responses::delete_response_handler,
        court::lookup_case_handler,
        court::lookup_by_cpf_handler,
    ),
    components(
        schemas(
            HealthResponse,
            auth::RegisterRequest,
            auth::LoginRequest,
            auth::AuthResponse,
            clients::ClientInput,
            cases::CaseInput,
            cases::DeadlineInput,
            cases::DeadlineChange,
            cases::CaseUpdateInput,
            documents::DocumentInput,
            documents::PartyInput,
            finance::MovementInput,
            finance::RpvInput,
            opportunities::AnalyzeClientRequest,
            opportunities::AnalyzeBulkRequest,
            opportunities::PrioritizeRequest,
            opportunities::ReportRequest,
            opportunities::StatusChange,
            petitions::GenerateRequest,
            petitions::ContentRequest,
            petitions::AnalyzeRequest,
            petitions::PetitionInput,
            petitions::SummaryResponse,
            petitions::KeyPointsResponse,
            petitions::TemplatesResponse,
            responses::GenerateRequest,
            responses::SendRequest,
            responses::CommunicationChange,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "LPMS API", description = "Case, client and finance management for a law office.")
    )
)]
pub struct ApiDoc;

/// Registers the bearer token scheme referenced by the protected paths.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

//=========================================================================================
// Health
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: &'static str,
    pub message: &'static str,
}

/// GET /api/health - Liveness probe, no authentication
#[utoipa::path(
    get,
    path = "/api/health",
    responses((status = 200, description = "Service is up", body = HealthResponse)),
    tag = "health"
)]
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        message: "LPMS API is running",
    })
}
