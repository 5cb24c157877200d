//! services/api/src/web/documents.rs
//!
//! Client document metadata and the generated onboarding PDFs.

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use chrono::{Local, Utc};
use lpms_core::domain::Document;
use lpms_core::legal_documents::{self, LegalDocumentKind, PartyData};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::pdf;
use crate::web::clients::owned_client;
use crate::web::extract::{ensure_owner, found, optional, parse_id, required, ValidJson};
use crate::web::middleware::AuthUser;
use crate::web::state::AppState;

//=========================================================================================
// Request Types
//=========================================================================================

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct DocumentInput {
    pub client_id: Option<Uuid>,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub size_bytes: Option<i64>,
    pub description: Option<String>,
}

/// Signer data for the generated documents. Name, cpf and rg are required.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct PartyInput {
    pub name: Option<String>,
    pub cpf: Option<String>,
    pub rg: Option<String>,
    pub street: Option<String>,
    pub number: Option<String>,
    pub complement: Option<String>,
    pub district: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
}

impl PartyInput {
    fn into_party(self) -> ApiResult<PartyData> {
        let (Some(name), Some(cpf), Some(rg)) =
            (optional(self.name), optional(self.cpf), optional(self.rg))
        else {
            return Err(ApiError::Validation(
                "name, cpf and rg are required".to_string(),
            ));
        };
        Ok(PartyData {
            name,
            cpf,
            rg,
            street: self.street.unwrap_or_default(),
            number: self.number.unwrap_or_default(),
            complement: self.complement.unwrap_or_default(),
            district: self.district.unwrap_or_default(),
            city: self.city.unwrap_or_default(),
            state: self.state.unwrap_or_default(),
            postal_code: self.postal_code.unwrap_or_default(),
        })
    }
}

/// Wraps PDF bytes in a download response.
pub fn pdf_attachment(file_name: &str, bytes: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file_name),
            ),
        ],
        bytes,
    )
        .into_response()
}

async fn owned_document(state: &AppState, id: &str, caller: Uuid) -> ApiResult<Document> {
    let document = found(state.db.get_document(parse_id(id, "document")?).await, "document")?;
    ensure_owner(document.owner_id, caller)?;
    Ok(document)
}

//=========================================================================================
// Metadata Handlers
//=========================================================================================

#[utoipa::path(
    get,
    path = "/api/documents",
    responses((status = 200, description = "Document metadata of the caller")),
    security(("bearer" = [])),
    tag = "documents"
)]
pub async fn list_documents_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthUser>,
) -> ApiResult<Json<Vec<Document>>> {
    Ok(Json(state.db.list_documents(caller.user_id).await?))
}

#[utoipa::path(
    get,
    path = "/api/documents/{id}",
    params(("id" = String, Path, description = "Document id")),
    responses(
        (status = 200, description = "Document metadata"),
        (status = 403, description = "Owned by another user"),
        (status = 404, description = "No such document"),
    ),
    security(("bearer" = [])),
    tag = "documents"
)]
pub async fn get_document_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<Document>> {
    Ok(Json(owned_document(&state, &id, caller.user_id).await?))
}

#[utoipa::path(
    post,
    path = "/api/documents",
    request_body = DocumentInput,
    responses(
        (status = 201, description = "Document recorded"),
        (status = 400, description = "Missing client_id or file_name"),
        (status = 403, description = "Client owned by another user"),
        (status = 404, description = "No such client"),
    ),
    security(("bearer" = [])),
    tag = "documents"
)]
pub async fn create_document_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthUser>,
    ValidJson(input): ValidJson<DocumentInput>,
) -> ApiResult<impl IntoResponse> {
    let client_id = input
        .client_id
        .ok_or_else(|| ApiError::Validation("client_id is required".to_string()))?;
    let file_name = required(input.file_name.as_deref(), "file_name")?;
    let client = owned_client(&state, client_id, caller.user_id).await?;

    let document = state
        .db
        .insert_document(Document {
            id: Uuid::new_v4(),
            owner_id: caller.user_id,
            client_id: client.id,
            file_name,
            content_type: optional(input.content_type),
            size_bytes: input.size_bytes,
            description: optional(input.description),
            uploaded_at: Utc::now(),
        })
        .await?;
    Ok((StatusCode::CREATED, Json(document)))
}

#[utoipa::path(
    put,
    path = "/api/documents/{id}",
    params(("id" = String, Path, description = "Document id")),
    request_body = DocumentInput,
    responses(
        (status = 200, description = "Document updated"),
        (status = 403, description = "Owned by another user"),
        (status = 404, description = "No such document"),
    ),
    security(("bearer" = [])),
    tag = "documents"
)]
pub async fn update_document_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<String>,
    ValidJson(input): ValidJson<DocumentInput>,
) -> ApiResult<Json<Document>> {
    let mut document = owned_document(&state, &id, caller.user_id).await?;
    if let Some(client_id) = input.client_id.filter(|c| *c != document.client_id) {
        document.client_id = owned_client(&state, client_id, caller.user_id).await?.id;
    }
    if let Some(file_name) = input.file_name {
        document.file_name = required(Some(&file_name), "file_name")?;
    }
    if input.content_type.is_some() {
        document.content_type = optional(input.content_type);
    }
    if input.description.is_some() {
        document.description = optional(input.description);
    }
    document.size_bytes = input.size_bytes.or(document.size_bytes);
    Ok(Json(state.db.update_document(document).await?))
}

#[utoipa::path(
    delete,
    path = "/api/documents/{id}",
    params(("id" = String, Path, description = "Document id")),
    responses(
        (status = 200, description = "Document deleted"),
        (status = 403, description = "Owned by another user"),
        (status = 404, description = "No such document"),
    ),
    security(("bearer" = [])),
    tag = "documents"
)]
pub async fn delete_document_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    let document = owned_document(&state, &id, caller.user_id).await?;
    state.db.delete_document(document.id).await?;
    Ok(Json(json!({ "message": "document deleted" })))
}

//=========================================================================================
// Generated PDFs
//=========================================================================================

fn generate(kind: LegalDocumentKind, input: PartyInput) -> ApiResult<Response> {
    let party = input.into_party()?;
    let document = legal_documents::render(kind, &party, Local::now().date_naive());
    info!("Generated {} for {}", document.file_name, party.name);
    Ok(pdf_attachment(document.file_name, pdf::render_document(&document)))
}

#[utoipa::path(
    post,
    path = "/api/documents/power-of-attorney",
    request_body = PartyInput,
    responses(
        (status = 200, description = "Procuracao.pdf", content_type = "application/pdf"),
        (status = 400, description = "Missing name, cpf or rg"),
    ),
    security(("bearer" = [])),
    tag = "documents"
)]
pub async fn power_of_attorney_handler(
    Extension(_caller): Extension<AuthUser>,
    ValidJson(input): ValidJson<PartyInput>,
) -> ApiResult<Response> {
    generate(LegalDocumentKind::PowerOfAttorney, input)
}

#[utoipa::path(
    post,
    path = "/api/documents/service-contract",
    request_body = PartyInput,
    responses(
        (status = 200, description = "Contrato.pdf", content_type = "application/pdf"),
        (status = 400, description = "Missing name, cpf or rg"),
    ),
    security(("bearer" = [])),
    tag = "documents"
)]
pub async fn service_contract_handler(
    Extension(_caller): Extension<AuthUser>,
    ValidJson(input): ValidJson<PartyInput>,
) -> ApiResult<Response> {
    generate(LegalDocumentKind::ServiceContract, input)
}

#[utoipa::path(
    post,
    path = "/api/documents/indigency-declaration",
    request_body = PartyInput,
    responses(
        (status = 200, description = "Declaracao_Hipossuficiencia.pdf", content_type = "application/pdf"),
        (status = 400, description = "Missing name, cpf or rg"),
    ),
    security(("bearer" = [])),
    tag = "documents"
)]
pub async fn indigency_declaration_handler(
    Extension(_caller): Extension<AuthUser>,
    ValidJson(input): ValidJson<PartyInput>,
) -> ApiResult<Response> {
    generate(LegalDocumentKind::IndigencyDeclaration, input)
}
