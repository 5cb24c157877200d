pub mod auth;
pub mod cases;
pub mod clients;
pub mod court;
pub mod dashboard;
pub mod documents;
pub mod extract;
pub mod finance;
pub mod middleware;
pub mod opportunities;
pub mod petitions;
pub mod responses;
pub mod rest;
pub mod state;

pub use middleware::require_auth;
pub use state::AppState;

use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::ConfigError;
use crate::error::ApiError;

const BODY_LIMIT: usize = 10 * 1024 * 1024;

/// Builds the complete application: public and protected API routes, CORS,
/// request tracing and the Swagger UI.
pub fn build_router(state: Arc<AppState>) -> Result<Router, ApiError> {
    let origin = state.config.cors_origin.parse::<HeaderValue>().map_err(|e| {
        ConfigError::InvalidValue("CORS_ORIGIN".to_string(), e.to_string())
    })?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/api/health", get(rest::health_handler))
        .route("/api/auth/register", post(auth::register_handler))
        .route("/api/auth/login", post(auth::login_handler));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/api/auth/me", get(auth::me_handler))
        // --- Clients ---
        .route(
            "/api/clients",
            get(clients::list_clients_handler).post(clients::create_client_handler),
        )
        .route(
            "/api/clients/{id}",
            get(clients::get_client_handler)
                .put(clients::update_client_handler)
                .delete(clients::delete_client_handler),
        )
        // --- Cases ---
        .route(
            "/api/cases",
            get(cases::list_cases_handler).post(cases::create_case_handler),
        )
        .route(
            "/api/cases/{id}",
            get(cases::get_case_handler)
                .put(cases::update_case_handler)
                .delete(cases::delete_case_handler),
        )
        .route("/api/cases/{id}/deadlines", post(cases::add_deadline_handler))
        .route(
            "/api/cases/{id}/deadlines/{deadline_id}",
            put(cases::update_deadline_handler),
        )
        .route("/api/cases/{id}/updates", post(cases::add_case_update_handler))
        // --- Documents ---
        .route(
            "/api/documents",
            get(documents::list_documents_handler).post(documents::create_document_handler),
        )
        .route(
            "/api/documents/{id}",
            get(documents::get_document_handler)
                .put(documents::update_document_handler)
                .delete(documents::delete_document_handler),
        )
        .route(
            "/api/documents/power-of-attorney",
            post(documents::power_of_attorney_handler),
        )
        .route(
            "/api/documents/service-contract",
            post(documents::service_contract_handler),
        )
        .route(
            "/api/documents/indigency-declaration",
            post(documents::indigency_declaration_handler),
        )
        // --- Finance ---
        .route(
            "/api/finance/movements",
            get(finance::list_movements_handler).post(finance::create_movement_handler),
        )
        .route(
            "/api/finance/movements/{id}",
            get(finance::get_movement_handler)
                .put(finance::update_movement_handler)
                .delete(finance::delete_movement_handler),
        )
        .route(
            "/api/finance/rpvs",
            get(finance::list_rpvs_handler).post(finance::create_rpv_handler),
        )
        .route(
            "/api/finance/rpvs/{id}",
            get(finance::get_rpv_handler)
                .put(finance::update_rpv_handler)
                .delete(finance::delete_rpv_handler),
        )
        .route("/api/finance/stats", get(finance::stats_handler))
        .route("/api/finance/report", get(finance::report_handler))
        .route("/api/dashboard", get(dashboard::dashboard_handler))
        // --- Opportunities ---
        .route(
            "/api/opportunities",
            get(opportunities::list_opportunities_handler),
        )
        .route(
            "/api/opportunities/analyze-client",
            post(opportunities::analyze_client_handler),
        )
        .route(
            "/api/opportunities/analyze-bulk",
            post(opportunities::analyze_bulk_handler),
        )
        .route(
            "/api/opportunities/prioritize",
            post(opportunities::prioritize_handler),
        )
        .route("/api/opportunities/report", post(opportunities::report_handler))
        .route(
            "/api/opportunities/{id}",
            get(opportunities::get_opportunity_handler)
                .delete(opportunities::delete_opportunity_handler),
        )
        .route(
            "/api/opportunities/{id}/status",
            put(opportunities::update_status_handler),
        )
        .route(
            "/api/opportunities/{id}/file",
            put(opportunities::file_opportunity_handler),
        )
        // --- Petitions ---
        .route(
            "/api/petitions",
            get(petitions::list_petitions_handler).post(petitions::create_petition_handler),
        )
        .route("/api/petitions/generate", post(petitions::generate_handler))
        .route("/api/petitions/validate", post(petitions::validate_handler))
        .route("/api/petitions/summary", post(petitions::summary_handler))
        .route("/api/petitions/analyze", post(petitions::analyze_handler))
        .route("/api/petitions/templates", get(petitions::templates_handler))
        .route(
            "/api/petitions/{id}",
            get(petitions::get_petition_handler)
                .put(petitions::update_petition_handler)
                .delete(petitions::delete_petition_handler),
        )
        // --- Canned responses ---
        .route("/api/responses", get(responses::list_responses_handler))
        .route("/api/responses/generate", post(responses::generate_handler))
        .route(
            "/api/responses/{id}",
            get(responses::get_response_handler)
                .put(responses::update_response_handler)
                .delete(responses::delete_response_handler),
        )
        .route("/api/responses/{id}/send", post(responses::send_handler))
        // --- Court portal ---
        .route("/api/court/cases/{number}", get(court::lookup_case_handler))
        .route("/api/court/cpf/{cpf}", get(court::lookup_by_cpf_handler))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ));

    let api_router = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state);

    // Merge the API router with the Swagger UI router for a complete application.
    Ok(Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", rest::ApiDoc::openapi())))
}
