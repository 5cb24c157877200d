pub mod court;
pub mod dashboard;
pub mod domain;
pub mod finance;
pub mod legal_documents;
pub mod opportunity;
pub mod petition;
pub mod ports;
pub mod responses;

pub use domain::{
    Case, CaseUpdate, Client, Communication, CommunicationStatus, Deadline, Document,
    FinancialMovement, MovementKind, Opportunity, OpportunityStatus, Petition, PetitionStatus,
    ResponseKind, RpvForecast, RpvStatus, Thesis, User, UserCredentials,
};
pub use ports::{
    CompletionService, CourtPortalService, DatabaseService, ExternalServiceError, PortError,
    PortResult,
};
