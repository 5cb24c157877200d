//! crates/lpms_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or APIs.

use async_trait::async_trait;
use uuid::Uuid;

use crate::court::CourtCase;
use crate::domain::{
    Case, CaseUpdate, Client, Communication, Deadline, Document, FinancialMovement, Opportunity,
    Petition, RpvForecast, User, UserCredentials,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all persistence port operations.
/// This abstracts away the specific errors from the underlying store.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

/// Failure of a third-party service (completion API, court portal).
///
/// Callers decide the fallback; see `petition::improve_or_keep` and the court
/// routes for the policies applied.
#[derive(Debug, thiserror::Error)]
pub enum ExternalServiceError {
    #[error("external service is not configured")]
    NotConfigured,
    #[error("external request failed: {0}")]
    Request(String),
    #[error("external request timed out")]
    Timeout,
    #[error("external service returned an unusable response: {0}")]
    InvalidResponse(String),
}

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Persistence for every entity of the office.
///
/// Lookups by id return `PortError::NotFound` when the row is absent; ownership
/// is checked by the caller, not by the store.
#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- Users ---
    /// Fails with `PortError::Conflict` when the email is already registered.
    async fn create_user(&self, user: User, password_hash: &str) -> PortResult<User>;

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User>;

    async fn get_credentials_by_email(&self, email: &str) -> PortResult<UserCredentials>;

    // --- Clients ---
    async fn list_clients(&self, owner_id: Uuid) -> PortResult<Vec<Client>>;

    async fn get_client(&self, client_id: Uuid) -> PortResult<Client>;

    async fn find_client_by_cpf(&self, cpf: &str) -> PortResult<Option<Client>>;

    /// Fails with `PortError::Conflict` when the CPF is already taken.
    async fn insert_client(&self, client: Client) -> PortResult<Client>;

    async fn update_client(&self, client: Client) -> PortResult<Client>;

    /// Removes the client together with its cases, documents and opportunities.
    async fn delete_client(&self, client_id: Uuid) -> PortResult<()>;

    // --- Cases ---
    async fn list_cases(&self, owner_id: Uuid) -> PortResult<Vec<Case>>;

    async fn list_cases_for_client(&self, client_id: Uuid) -> PortResult<Vec<Case>>;

    async fn get_case(&self, case_id: Uuid) -> PortResult<Case>;

    async fn insert_case(&self, case: Case) -> PortResult<Case>;

    async fn update_case(&self, case: Case) -> PortResult<Case>;

    async fn delete_case(&self, case_id: Uuid) -> PortResult<()>;

    // --- Deadlines and case updates ---
    async fn insert_deadline(&self, deadline: Deadline) -> PortResult<Deadline>;

    async fn update_deadline(&self, deadline: Deadline) -> PortResult<Deadline>;

    async fn list_deadlines(&self, case_id: Uuid) -> PortResult<Vec<Deadline>>;

    /// Deadlines across every case owned by the user.
    async fn list_deadlines_for_owner(&self, owner_id: Uuid) -> PortResult<Vec<Deadline>>;

    async fn insert_case_update(&self, update: CaseUpdate) -> PortResult<CaseUpdate>;

    async fn list_case_updates(&self, case_id: Uuid) -> PortResult<Vec<CaseUpdate>>;

    // --- Documents ---
    async fn list_documents(&self, owner_id: Uuid) -> PortResult<Vec<Document>>;

    async fn list_documents_for_client(&self, client_id: Uuid) -> PortResult<Vec<Document>>;

    async fn get_document(&self, document_id: Uuid) -> PortResult<Document>;

    async fn insert_document(&self, document: Document) -> PortResult<Document>;

    async fn update_document(&self, document: Document) -> PortResult<Document>;

    async fn delete_document(&self, document_id: Uuid) -> PortResult<()>;

    // --- Opportunities ---
    async fn list_opportunities(&self, owner_id: Uuid) -> PortResult<Vec<Opportunity>>;

    async fn list_opportunities_for_client(&self, client_id: Uuid) -> PortResult<Vec<Opportunity>>;

    async fn get_opportunity(&self, opportunity_id: Uuid) -> PortResult<Opportunity>;

    async fn insert_opportunity(&self, opportunity: Opportunity) -> PortResult<Opportunity>;

    async fn update_opportunity(&self, opportunity: Opportunity) -> PortResult<Opportunity>;

    async fn delete_opportunity(&self, opportunity_id: Uuid) -> PortResult<()>;

    // --- Finance ---
    async fn list_movements(&self, owner_id: Uuid) -> PortResult<Vec<FinancialMovement>>;

    async fn get_movement(&self, movement_id: Uuid) -> PortResult<FinancialMovement>;

    async fn insert_movement(&self, movement: FinancialMovement) -> PortResult<FinancialMovement>;

    async fn update_movement(&self, movement: FinancialMovement) -> PortResult<FinancialMovement>;

    async fn delete_movement(&self, movement_id: Uuid) -> PortResult<()>;

    async fn list_rpvs(&self, owner_id: Uuid) -> PortResult<Vec<RpvForecast>>;

    async fn get_rpv(&self, rpv_id: Uuid) -> PortResult<RpvForecast>;

    async fn insert_rpv(&self, rpv: RpvForecast) -> PortResult<RpvForecast>;

    async fn update_rpv(&self, rpv: RpvForecast) -> PortResult<RpvForecast>;

    async fn delete_rpv(&self, rpv_id: Uuid) -> PortResult<()>;

    // --- Petitions ---
    async fn list_petitions(&self, owner_id: Uuid) -> PortResult<Vec<Petition>>;

    async fn list_petitions_for_case(&self, case_id: Uuid) -> PortResult<Vec<Petition>>;

    async fn get_petition(&self, petition_id: Uuid) -> PortResult<Petition>;

    async fn insert_petition(&self, petition: Petition) -> PortResult<Petition>;

    async fn update_petition(&self, petition: Petition) -> PortResult<Petition>;

    async fn delete_petition(&self, petition_id: Uuid) -> PortResult<()>;

    // --- Communications ---
    async fn list_communications(&self, owner_id: Uuid) -> PortResult<Vec<Communication>>;

    async fn list_communications_for_client(&self, client_id: Uuid) -> PortResult<Vec<Communication>>;

    async fn get_communication(&self, communication_id: Uuid) -> PortResult<Communication>;

    async fn insert_communication(&self, communication: Communication) -> PortResult<Communication>;

    async fn update_communication(&self, communication: Communication) -> PortResult<Communication>;

    async fn delete_communication(&self, communication_id: Uuid) -> PortResult<()>;
}

#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Sends a single-turn prompt to a text completion model.
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String, ExternalServiceError>;
}

#[async_trait]
pub trait CourtPortalService: Send + Sync {
    /// Looks up one case by its unified case number.
    async fn lookup_case(&self, case_number: &str) -> Result<CourtCase, ExternalServiceError>;

    /// Lists the cases a party (by CPF) is involved in.
    async fn lookup_by_cpf(&self, cpf: &str) -> Result<Vec<CourtCase>, ExternalServiceError>;
}
