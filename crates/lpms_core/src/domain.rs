//! crates/lpms_core/src/domain.rs
//!
//! Defines the core data structures for the application.
//! These structs are independent of any database; they derive serde so the
//! API layer can return them directly as JSON.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Returned by the `FromStr` impls of the status enums below.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} value '{value}'")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseEnumError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

//=========================================================================================
// Users
//=========================================================================================

pub const DEFAULT_ROLE: &str = "advogado";

// Represents a user - used throughout app
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

// Only used internally for login/signup - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user: User,
    pub password_hash: String,
}

//=========================================================================================
// Clients
//=========================================================================================

/// A public servant represented by the office.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    /// National ID (CPF). Unique across the store.
    pub cpf: String,
    pub rg: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub marital_status: Option<String>,
    pub phone: String,
    pub email: String,
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
    pub created_at: DateTime<Utc>,
}

//=========================================================================================
// Cases
//=========================================================================================

pub const DEFAULT_CASE_STATUS: &str = "ativo";

/// A lawsuit ("processo") filed on behalf of a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Case {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub client_id: Uuid,
    pub case_number: String,
    pub thesis: String,
    pub description: Option<String>,
    pub filing_date: NaiveDate,
    pub status: String,
    pub court: Option<String>,
    pub court_division: Option<String>,
    pub next_deadline: Option<NaiveDate>,
    pub deadline_description: Option<String>,
    pub client_dependency: Option<String>,
    pub office_dependency: Option<String>,
    pub estimated_value: Option<f64>,
    pub judgment_value: Option<f64>,
    pub created_at: DateTime<Utc>,
}

impl Case {
    pub fn is_active(&self) -> bool {
        self.status.eq_ignore_ascii_case(DEFAULT_CASE_STATUS)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deadline {
    pub id: Uuid,
    pub case_id: Uuid,
    pub due_date: NaiveDate,
    pub description: String,
    pub completed: bool,
}

/// A recorded procedural event ("andamento") of a case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseUpdate {
    pub id: Uuid,
    pub case_id: Uuid,
    pub date: NaiveDate,
    pub description: String,
    pub kind: Option<String>,
}

//=========================================================================================
// Documents
//=========================================================================================

/// Metadata of a file uploaded for a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub client_id: Uuid,
    pub file_name: String,
    pub content_type: Option<String>,
    pub size_bytes: Option<i64>,
    pub description: Option<String>,
    pub uploaded_at: DateTime<Utc>,
}

//=========================================================================================
// Opportunities
//=========================================================================================

/// A named legal claim category ("tese").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Thesis {
    #[serde(rename = "licenca-premio", alias = "Licença-Prêmio", alias = "Licenca-Premio")]
    LicencaPremio,
    #[serde(rename = "abono-permanencia", alias = "Abono Permanência", alias = "Abono Permanencia")]
    AbonoPermanencia,
    #[serde(rename = "diferencas-salariais", alias = "Diferenças Salariais", alias = "Diferencas Salariais")]
    DiferencasSalariais,
    #[serde(rename = "gratificacao", alias = "Gratificação", alias = "Gratificacao")]
    Gratificacao,
    #[serde(rename = "indenizacao", alias = "Indenização", alias = "Indenizacao")]
    Indenizacao,
}

impl Thesis {
    pub const ALL: [Thesis; 5] = [
        Thesis::LicencaPremio,
        Thesis::AbonoPermanencia,
        Thesis::DiferencasSalariais,
        Thesis::Gratificacao,
        Thesis::Indenizacao,
    ];

    pub fn slug(self) -> &'static str {
        match self {
            Thesis::LicencaPremio => "licenca-premio",
            Thesis::AbonoPermanencia => "abono-permanencia",
            Thesis::DiferencasSalariais => "diferencas-salariais",
            Thesis::Gratificacao => "gratificacao",
            Thesis::Indenizacao => "indenizacao",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Thesis::LicencaPremio => "Licença-Prêmio",
            Thesis::AbonoPermanencia => "Abono Permanência",
            Thesis::DiferencasSalariais => "Diferenças Salariais",
            Thesis::Gratificacao => "Gratificação",
            Thesis::Indenizacao => "Indenização",
        }
    }
}

/// Lowercases, strips Portuguese diacritics and turns whitespace into `-`,
/// so "Licença-Prêmio", "Licenca Premio" and "licenca-premio" all agree.
pub fn slugify(value: &str) -> String {
    value
        .trim()
        .chars()
        .map(|c| match c.to_lowercase().next().unwrap_or(c) {
            'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'ç' => 'c',
            c if c.is_whitespace() || c == '_' => '-',
            c => c,
        })
        .collect()
}

impl FromStr for Thesis {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let slug = slugify(s);
        Thesis::ALL
            .into_iter()
            .find(|t| t.slug() == slug)
            .ok_or_else(|| ParseEnumError::new("thesis", s))
    }
}

impl fmt::Display for Thesis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpportunityStatus {
    #[serde(alias = "nova")]
    New,
    #[serde(alias = "analisada")]
    Analyzed,
    #[serde(alias = "ajuizada")]
    Filed,
}

impl OpportunityStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OpportunityStatus::New => "new",
            OpportunityStatus::Analyzed => "analyzed",
            OpportunityStatus::Filed => "filed",
        }
    }

    /// Statuses only move forward: new → analyzed → filed. Filing straight
    /// from `new` is allowed; re-applying the current status is a no-op.
    pub fn can_transition_to(self, next: OpportunityStatus) -> bool {
        use OpportunityStatus::*;
        matches!(
            (self, next),
            (New, New) | (New, Analyzed) | (New, Filed) | (Analyzed, Analyzed) | (Analyzed, Filed) | (Filed, Filed)
        )
    }
}

impl FromStr for OpportunityStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(Self::New),
            "analyzed" => Ok(Self::Analyzed),
            "filed" => Ok(Self::Filed),
            other => Err(ParseEnumError::new("opportunity status", other)),
        }
    }
}

/// A detected potential legal claim, persisted for a stored client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Opportunity {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub client_id: Uuid,
    pub thesis: Thesis,
    pub confidence: f64,
    pub rationale: String,
    pub required_documents: Vec<String>,
    pub status: OpportunityStatus,
    pub created_at: DateTime<Utc>,
    pub filed_at: Option<DateTime<Utc>>,
}

//=========================================================================================
// Finance
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    #[serde(alias = "entrada")]
    Inflow,
    #[serde(alias = "saida")]
    Outflow,
}

impl MovementKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MovementKind::Inflow => "inflow",
            MovementKind::Outflow => "outflow",
        }
    }
}

impl FromStr for MovementKind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "inflow" => Ok(Self::Inflow),
            "outflow" => Ok(Self::Outflow),
            other => Err(ParseEnumError::new("movement kind", other)),
        }
    }
}

/// A dated ledger entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialMovement {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub date: NaiveDate,
    pub description: String,
    pub kind: MovementKind,
    pub amount: f64,
    pub category: String,
    pub case_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl FinancialMovement {
    /// The amount with its sign: inflows positive, outflows negative.
    pub fn signed_amount(&self) -> f64 {
        match self.kind {
            MovementKind::Inflow => self.amount,
            MovementKind::Outflow => -self.amount,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RpvStatus {
    #[serde(alias = "pendente")]
    Pending,
    #[serde(alias = "recebido")]
    Received,
    #[serde(alias = "atrasado")]
    Late,
}

impl RpvStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RpvStatus::Pending => "pending",
            RpvStatus::Received => "received",
            RpvStatus::Late => "late",
        }
    }

    /// pending → received | late, and a late payment may still arrive.
    pub fn can_transition_to(self, next: RpvStatus) -> bool {
        use RpvStatus::*;
        self == next || matches!((self, next), (Pending, Received) | (Pending, Late) | (Late, Received))
    }
}

impl FromStr for RpvStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "received" => Ok(Self::Received),
            "late" => Ok(Self::Late),
            other => Err(ParseEnumError::new("rpv status", other)),
        }
    }
}

/// An expected court-ordered payment (RPV).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpvForecast {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub client_id: Uuid,
    pub case_id: Uuid,
    pub expected_date: NaiveDate,
    pub amount: f64,
    pub thesis: Option<String>,
    pub status: RpvStatus,
    pub created_at: DateTime<Utc>,
}

//=========================================================================================
// Petitions
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PetitionStatus {
    #[serde(alias = "rascunho")]
    Draft,
    #[serde(alias = "pronta")]
    Ready,
    #[serde(alias = "enviada")]
    Sent,
}

impl PetitionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PetitionStatus::Draft => "draft",
            PetitionStatus::Ready => "ready",
            PetitionStatus::Sent => "sent",
        }
    }
}

impl FromStr for PetitionStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "ready" => Ok(Self::Ready),
            "sent" => Ok(Self::Sent),
            other => Err(ParseEnumError::new("petition status", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Petition {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub case_id: Option<Uuid>,
    pub kind: String,
    pub thesis: String,
    pub client_name: String,
    pub case_number: String,
    pub content: String,
    pub status: PetitionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//=========================================================================================
// Communications (canned responses)
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseKind {
    #[serde(alias = "andamento")]
    CaseStatus,
    #[serde(alias = "documentos")]
    Documents,
    #[serde(alias = "prazos")]
    Deadlines,
    #[serde(alias = "honorarios")]
    Fees,
    #[serde(alias = "outro")]
    Other,
}

impl ResponseKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ResponseKind::CaseStatus => "case_status",
            ResponseKind::Documents => "documents",
            ResponseKind::Deadlines => "deadlines",
            ResponseKind::Fees => "fees",
            ResponseKind::Other => "other",
        }
    }
}

impl FromStr for ResponseKind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "case_status" => Ok(Self::CaseStatus),
            "documents" => Ok(Self::Documents),
            "deadlines" => Ok(Self::Deadlines),
            "fees" => Ok(Self::Fees),
            "other" => Ok(Self::Other),
            other => Err(ParseEnumError::new("response kind", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommunicationStatus {
    #[serde(alias = "gerada")]
    Generated,
    #[serde(alias = "enviada")]
    Sent,
}

impl CommunicationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CommunicationStatus::Generated => "generated",
            CommunicationStatus::Sent => "sent",
        }
    }
}

impl FromStr for CommunicationStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "generated" => Ok(Self::Generated),
            "sent" => Ok(Self::Sent),
            other => Err(ParseEnumError::new("communication status", other)),
        }
    }
}

/// A reply drafted for a client question, optionally sent through a channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Communication {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub client_id: Option<Uuid>,
    pub client_name: String,
    pub question: String,
    pub kind: ResponseKind,
    pub channel: Option<String>,
    pub body: String,
    pub status: CommunicationStatus,
    pub created_at: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thesis_parses_labels_and_slugs() {
        assert_eq!("Licença-Prêmio".parse(), Ok(Thesis::LicencaPremio));
        assert_eq!("licenca-premio".parse(), Ok(Thesis::LicencaPremio));
        assert_eq!("Abono Permanencia".parse(), Ok(Thesis::AbonoPermanencia));
        assert!("usucapiao".parse::<Thesis>().is_err());
    }

    #[test]
    fn thesis_serializes_as_slug_and_accepts_label() {
        let json = serde_json::to_string(&Thesis::Gratificacao).unwrap();
        assert_eq!(json, "\"gratificacao\"");
        let parsed: Thesis = serde_json::from_str("\"Diferenças Salariais\"").unwrap();
        assert_eq!(parsed, Thesis::DiferencasSalariais);
    }

    #[test]
    fn opportunity_status_only_moves_forward() {
        use OpportunityStatus::*;
        assert!(New.can_transition_to(Analyzed));
        assert!(Analyzed.can_transition_to(Filed));
        assert!(New.can_transition_to(Filed));
        assert!(!Filed.can_transition_to(New));
        assert!(!Analyzed.can_transition_to(New));
    }

    #[test]
    fn rpv_status_transitions() {
        use RpvStatus::*;
        assert!(Pending.can_transition_to(Received));
        assert!(Pending.can_transition_to(Late));
        assert!(Late.can_transition_to(Received));
        assert!(!Received.can_transition_to(Pending));
        assert!(!Received.can_transition_to(Late));
    }

    #[test]
    fn legacy_portuguese_values_deserialize() {
        let kind: MovementKind = serde_json::from_str("\"entrada\"").unwrap();
        assert_eq!(kind, MovementKind::Inflow);
        let status: RpvStatus = serde_json::from_str("\"atrasado\"").unwrap();
        assert_eq!(status, RpvStatus::Late);
    }
}
