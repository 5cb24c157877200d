//! services/api/src/web/clients.rs
//!
//! CRUD endpoints for the office's clients.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::{NaiveDate, Utc};
use lpms_core::court;
use lpms_core::domain::{Case, CaseUpdate, Client, Communication, Deadline, Document, Opportunity};
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

/// Client fields. On update only the supplied fields change.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ClientInput {
    pub name: Option<String>,
    pub cpf: Option<String>,
    pub rg: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub marital_status: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub street: Option<String>,
    pub number: Option<String>,
    pub complement: Option<String>,
    pub district: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub employer: Option<String>,
    pub position: Option<String>,
    pub registration: Option<String>,
    pub admission_date: Option<NaiveDate>,
    pub expected_retirement_date: Option<NaiveDate>,
    pub employment_status: Option<String>,
}

#[derive(Serialize)]
pub struct CaseWithHistory {
    #[serde(flatten)]
    pub case: Case,
    pub deadlines: Vec<Deadline>,
    pub updates: Vec<CaseUpdate>,
}

#[derive(Serialize)]
pub struct ClientDetail {
    #[serde(flatten)]
    pub client: Client,
    pub cases: Vec<CaseWithHistory>,
    pub documents: Vec<Document>,
    pub communications: Vec<Communication>,
    pub opportunities: Vec<Opportunity>,
}

//=========================================================================================
// Helpers
//=========================================================================================

/// Loads a client and checks that the caller owns it.
pub async fn owned_client(state: &AppState, client_id: Uuid, caller: Uuid) -> ApiResult<Client> {
    let client = found(state.db.get_client(client_id).await, "client")?;
    ensure_owner(client.owner_id, caller)?;
    Ok(client)
}

async fn ensure_cpf_free(state: &AppState, cpf: &str, except: Option<Uuid>) -> ApiResult<()> {
    match state.db.find_client_by_cpf(cpf).await? {
        Some(existing) if Some(existing.id) != except => Err(ApiError::Validation(
            "a client with this cpf already exists".to_string(),
        )),
        _ => Ok(()),
    }
}

/// CPFs are stored as their 11 digits so punctuation cannot dodge uniqueness.
fn checked_cpf(raw: &str) -> ApiResult<String> {
    if !court::validate_cpf(raw) {
        return Err(ApiError::Validation("invalid cpf".to_string()));
    }
    Ok(court::normalize_cpf(raw))
}

fn merge(field: &mut Option<String>, value: Option<String>) {
    if value.is_some() {
        *field = optional(value);
    }
}

fn apply(client: &mut Client, input: ClientInput) -> ApiResult<()> {
    if let Some(name) = input.name {
        client.name = required(Some(&name), "name")?;
    }
    if let Some(cpf) = input.cpf {
        client.cpf = checked_cpf(&required(Some(&cpf), "cpf")?)?;
    }
    if let Some(phone) = input.phone {
        client.phone = required(Some(&phone), "phone")?;
    }
    if let Some(email) = input.email {
        client.email = required(Some(&email), "email")?;
    }
    merge(&mut client.rg, input.rg);
    merge(&mut client.marital_status, input.marital_status);
    merge(&mut client.street, input.street);
    merge(&mut client.number, input.number);
    merge(&mut client.complement, input.complement);
    merge(&mut client.district, input.district);
    merge(&mut client.city, input.city);
    merge(&mut client.state, input.state);
    merge(&mut client.postal_code, input.postal_code);
    merge(&mut client.employer, input.employer);
    merge(&mut client.position, input.position);
    merge(&mut client.registration, input.registration);
    merge(&mut client.employment_status, input.employment_status);
    client.birth_date = input.birth_date.or(client.birth_date);
    client.admission_date = input.admission_date.or(client.admission_date);
    client.expected_retirement_date = input
        .expected_retirement_date
        .or(client.expected_retirement_date);
    Ok(())
}

//=========================================================================================
// Handlers
//=========================================================================================

/// List the caller's clients, newest first.
#[utoipa::path(
    get,
    path = "/api/clients",
    responses((status = 200, description = "Clients of the caller")),
    security(("bearer" = [])),
    tag = "clients"
)]
pub async fn list_clients_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthUser>,
) -> ApiResult<Json<Vec<Client>>> {
    Ok(Json(state.db.list_clients(caller.user_id).await?))
}

/// A client with its cases, documents, communications and opportunities.
#[utoipa::path(
    get,
    path = "/api/clients/{id}",
    params(("id" = String, Path, description = "Client id")),
    responses(
        (status = 200, description = "Client detail"),
        (status = 403, description = "Owned by another user"),
        (status = 404, description = "No such client"),
    ),
    security(("bearer" = [])),
    tag = "clients"
)]
pub async fn get_client_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<ClientDetail>> {
    let client = owned_client(&state, parse_id(&id, "client")?, caller.user_id).await?;

    let mut cases = Vec::new();
    for case in state.db.list_cases_for_client(client.id).await? {
        let deadlines = state.db.list_deadlines(case.id).await?;
        let updates = state.db.list_case_updates(case.id).await?;
        cases.push(CaseWithHistory {
            case,
            deadlines,
            updates,
        });
    }
    let documents = state.db.list_documents_for_client(client.id).await?;
    let communications = state.db.list_communications_for_client(client.id).await?;
    let opportunities = state.db.list_opportunities_for_client(client.id).await?;

    Ok(Json(ClientDetail {
        client,
        cases,
        documents,
        communications,
        opportunities,
    }))
}

/// Register a client. Name, cpf, phone and email are required; cpf is unique.
#[utoipa::path(
    post,
    path = "/api/clients",
    request_body = ClientInput,
    responses(
        (status = 201, description = "Client created"),
        (status = 400, description = "Missing fields or duplicate cpf"),
    ),
    security(("bearer" = [])),
    tag = "clients"
)]
pub async fn create_client_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthUser>,
    ValidJson(input): ValidJson<ClientInput>,
) -> ApiResult<impl IntoResponse> {
    let (Some(name), Some(cpf), Some(phone), Some(email)) = (
        optional(input.name.clone()),
        optional(input.cpf.clone()),
        optional(input.phone.clone()),
        optional(input.email.clone()),
    ) else {
        return Err(ApiError::Validation(
            "name, cpf, phone and email are required".to_string(),
        ));
    };
    let cpf = checked_cpf(&cpf)?;
    ensure_cpf_free(&state, &cpf, None).await?;

    let mut client = Client {
        id: Uuid::new_v4(),
        owner_id: caller.user_id,
        name,
        cpf,
        rg: None,
        birth_date: None,
        marital_status: None,
        phone,
        email,
        street: None,
        number: None,
        complement: None,
        district: None,
        city: None,
        state: None,
        postal_code: None,
        employer: None,
        position: None,
        registration: None,
        admission_date: None,
        expected_retirement_date: None,
        employment_status: None,
        created_at: Utc::now(),
    };
    apply(&mut client, input)?;

    let client = state.db.insert_client(client).await?;
    info!("Client {} created by {}", client.id, caller.user_id);
    Ok((StatusCode::CREATED, Json(client)))
}

/// Update the supplied fields of a client.
#[utoipa::path(
    put,
    path = "/api/clients/{id}",
    params(("id" = String, Path, description = "Client id")),
    request_body = ClientInput,
    responses(
        (status = 200, description = "Client updated"),
        (status = 400, description = "Invalid field or duplicate cpf"),
        (status = 403, description = "Owned by another user"),
        (status = 404, description = "No such client"),
    ),
    security(("bearer" = [])),
    tag = "clients"
)]
pub async fn update_client_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<String>,
    ValidJson(input): ValidJson<ClientInput>,
) -> ApiResult<Json<Client>> {
    let mut client = owned_client(&state, parse_id(&id, "client")?, caller.user_id).await?;
    apply(&mut client, input)?;
    ensure_cpf_free(&state, &client.cpf, Some(client.id)).await?;
    Ok(Json(state.db.update_client(client).await?))
}

/// Delete a client with its cases, documents and opportunities.
#[utoipa::path(
    delete,
    path = "/api/clients/{id}",
    params(("id" = String, Path, description = "Client id")),
    responses(
        (status = 200, description = "Client deleted"),
        (status = 403, description = "Owned by another user"),
        (status = 404, description = "No such client"),
    ),
    security(("bearer" = [])),
    tag = "clients"
)]
pub async fn delete_client_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    let client = owned_client(&state, parse_id(&id, "client")?, caller.user_id).await?;
    state.db.delete_client(client.id).await?;
    info!("Client {} deleted by {}", client.id, caller.user_id);
    Ok(Json(json!({ "message": "client deleted" })))
}
