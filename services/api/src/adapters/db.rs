//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use lpms_core::domain::{
    Case, CaseUpdate, Client, Communication, Deadline, Document, FinancialMovement, Opportunity,
    Petition, RpvForecast, User, UserCredentials,
};
use lpms_core::ports::{DatabaseService, PortError, PortResult};
use sqlx::{FromRow, PgPool};
use std::fmt::Display;
use std::str::FromStr;
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

//=========================================================================================
// Error mapping
//=========================================================================================

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

fn db_error(e: sqlx::Error, what: &str) -> PortError {
    match &e {
        sqlx::Error::RowNotFound => PortError::NotFound(format!("{} not found", what)),
        sqlx::Error::Database(db) => match db.code().as_deref() {
            Some(UNIQUE_VIOLATION) => PortError::Conflict(format!("{} already exists", what)),
            Some(FOREIGN_KEY_VIOLATION) => {
                PortError::NotFound(format!("{} references a missing row", what))
            }
            _ => PortError::Unexpected(e.to_string()),
        },
        _ => PortError::Unexpected(e.to_string()),
    }
}

fn parse_column<T>(value: &str) -> PortResult<T>
where
    T: FromStr,
    T::Err: Display,
{
    value
        .parse()
        .map_err(|e: T::Err| PortError::Unexpected(e.to_string()))
}

fn expect_deleted(result: sqlx::postgres::PgQueryResult, what: &str, id: Uuid) -> PortResult<()> {
    if result.rows_affected() == 0 {
        return Err(PortError::NotFound(format!("{} {} not found", what, id)));
    }
    Ok(())
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    id: Uuid,
    email: String,
    name: String,
    role: String,
    password_hash: String,
    created_at: DateTime<Utc>,
}
impl UserRecord {
    fn to_domain(self) -> UserCredentials {
        UserCredentials {
            user: User {
                id: self.id,
                email: self.email,
                name: self.name,
                role: self.role,
                created_at: self.created_at,
            },
            password_hash: self.password_hash,
        }
    }
}

#[derive(FromRow)]
struct ClientRecord {
    id: Uuid,
    owner_id: Uuid,
    name: String,
    cpf: String,
    rg: Option<String>,
    birth_date: Option<NaiveDate>,
    marital_status: Option<String>,
    phone: String,
    email: String,
    street: Option<String>,
    number: Option<String>,
    complement: Option<String>,
    district: Option<String>,
    city: Option<String>,
    state: Option<String>,
    postal_code: Option<String>,
    employer: Option<String>,
    position: Option<String>,
    registration: Option<String>,
    admission_date: Option<NaiveDate>,
    expected_retirement_date: Option<NaiveDate>,
    employment_status: Option<String>,
    created_at: DateTime<Utc>,
}
impl ClientRecord {
    fn to_domain(self) -> Client {
        Client {
            id: self.id,
            owner_id: self.owner_id,
            name: self.name,
            cpf: self.cpf,
            rg: self.rg,
            birth_date: self.birth_date,
            marital_status: self.marital_status,
            phone: self.phone,
            email: self.email,
            street: self.street,
            number: self.number,
            complement: self.complement,
            district: self.district,
            city: self.city,
            state: self.state,
            postal_code: self.postal_code,
            employer: self.employer,
            position: self.position,
            registration: self.registration,
            admission_date: self.admission_date,
            expected_retirement_date: self.expected_retirement_date,
            employment_status: self.employment_status,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct CaseRecord {
    id: Uuid,
    owner_id: Uuid,
    client_id: Uuid,
    case_number: String,
    thesis: String,
    description: Option<String>,
    filing_date: NaiveDate,
    status: String,
    court: Option<String>,
    court_division: Option<String>,
    next_deadline: Option<NaiveDate>,
    deadline_description: Option<String>,
    client_dependency: Option<String>,
    office_dependency: Option<String>,
    estimated_value: Option<f64>,
    judgment_value: Option<f64>,
    created_at: DateTime<Utc>,
}
impl CaseRecord {
    fn to_domain(self) -> Case {
        Case {
            id: self.id,
            owner_id: self.owner_id,
            client_id: self.client_id,
            case_number: self.case_number,
            thesis: self.thesis,
            description: self.description,
            filing_date: self.filing_date,
            status: self.status,
            court: self.court,
            court_division: self.court_division,
            next_deadline: self.next_deadline,
            deadline_description: self.deadline_description,
            client_dependency: self.client_dependency,
            office_dependency: self.office_dependency,
            estimated_value: self.estimated_value,
            judgment_value: self.judgment_value,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct DeadlineRecord {
    id: Uuid,
    case_id: Uuid,
    due_date: NaiveDate,
    description: String,
    completed: bool,
}
impl DeadlineRecord {
    fn to_domain(self) -> Deadline {
        Deadline {
            id: self.id,
            case_id: self.case_id,
            due_date: self.due_date,
            description: self.description,
            completed: self.completed,
        }
    }
}

#[derive(FromRow)]
struct CaseUpdateRecord {
    id: Uuid,
    case_id: Uuid,
    date: NaiveDate,
    description: String,
    kind: Option<String>,
}
impl CaseUpdateRecord {
    fn to_domain(self) -> CaseUpdate {
        CaseUpdate {
            id: self.id,
            case_id: self.case_id,
            date: self.date,
            description: self.description,
            kind: self.kind,
        }
    }
}

#[derive(FromRow)]
struct DocumentRecord {
    id: Uuid,
    owner_id: Uuid,
    client_id: Uuid,
    file_name: String,
    content_type: Option<String>,
    size_bytes: Option<i64>,
    description: Option<String>,
    uploaded_at: DateTime<Utc>,
}
impl DocumentRecord {
    fn to_domain(self) -> Document {
        Document {
            id: self.id,
            owner_id: self.owner_id,
            client_id: self.client_id,
            file_name: self.file_name,
            content_type: self.content_type,
            size_bytes: self.size_bytes,
            description: self.description,
            uploaded_at: self.uploaded_at,
        }
    }
}

#[derive(FromRow)]
struct OpportunityRecord {
    id: Uuid,
    owner_id: Uuid,
    client_id: Uuid,
    thesis: String,
    confidence: f64,
    rationale: String,
    required_documents: Vec<String>,
    status: String,
    created_at: DateTime<Utc>,
    filed_at: Option<DateTime<Utc>>,
}
impl OpportunityRecord {
    fn to_domain(self) -> PortResult<Opportunity> {
        Ok(Opportunity {
            id: self.id,
            owner_id: self.owner_id,
            client_id: self.client_id,
            thesis: parse_column(&self.thesis)?,
            confidence: self.confidence,
            rationale: self.rationale,
            required_documents: self.required_documents,
            status: parse_column(&self.status)?,
            created_at: self.created_at,
            filed_at: self.filed_at,
        })
    }
}

#[derive(FromRow)]
struct MovementRecord {
    id: Uuid,
    owner_id: Uuid,
    date: NaiveDate,
    description: String,
    kind: String,
    amount: f64,
    category: String,
    case_id: Option<Uuid>,
    created_at: DateTime<Utc>,
}
impl MovementRecord {
    fn to_domain(self) -> PortResult<FinancialMovement> {
        Ok(FinancialMovement {
            id: self.id,
            owner_id: self.owner_id,
            date: self.date,
            description: self.description,
            kind: parse_column(&self.kind)?,
            amount: self.amount,
            category: self.category,
            case_id: self.case_id,
            created_at: self.created_at,
        })
    }
}

#[derive(FromRow)]
struct RpvRecord {
    id: Uuid,
    owner_id: Uuid,
    client_id: Uuid,
    case_id: Uuid,
    expected_date: NaiveDate,
    amount: f64,
    thesis: Option<String>,
    status: String,
    created_at: DateTime<Utc>,
}
impl RpvRecord {
    fn to_domain(self) -> PortResult<RpvForecast> {
        Ok(RpvForecast {
            id: self.id,
            owner_id: self.owner_id,
            client_id: self.client_id,
            case_id: self.case_id,
            expected_date: self.expected_date,
            amount: self.amount,
            thesis: self.thesis,
            status: parse_column(&self.status)?,
            created_at: self.created_at,
        })
    }
}

#[derive(FromRow)]
struct PetitionRecord {
    id: Uuid,
    owner_id: Uuid,
    case_id: Option<Uuid>,
    kind: String,
    thesis: String,
    client_name: String,
    case_number: String,
    content: String,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}
impl PetitionRecord {
    fn to_domain(self) -> PortResult<Petition> {
        Ok(Petition {
            id: self.id,
            owner_id: self.owner_id,
            case_id: self.case_id,
            kind: self.kind,
            thesis: self.thesis,
            client_name: self.client_name,
            case_number: self.case_number,
            content: self.content,
            status: parse_column(&self.status)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(FromRow)]
struct CommunicationRecord {
    id: Uuid,
    owner_id: Uuid,
    client_id: Option<Uuid>,
    client_name: String,
    question: String,
    kind: String,
    channel: Option<String>,
    body: String,
    status: String,
    created_at: DateTime<Utc>,
    sent_at: Option<DateTime<Utc>>,
}
impl CommunicationRecord {
    fn to_domain(self) -> PortResult<Communication> {
        Ok(Communication {
            id: self.id,
            owner_id: self.owner_id,
            client_id: self.client_id,
            client_name: self.client_name,
            question: self.question,
            kind: parse_column(&self.kind)?,
            channel: self.channel,
            body: self.body,
            status: parse_column(&self.status)?,
            created_at: self.created_at,
            sent_at: self.sent_at,
        })
    }
}

//=========================================================================================
// Column lists
//=========================================================================================

const USER_COLUMNS: &str = "id, email, name, role, password_hash, created_at";
const CLIENT_COLUMNS: &str = "id, owner_id, name, cpf, rg, birth_date, marital_status, phone, email, \
     street, number, complement, district, city, state, postal_code, employer, position, \
     registration, admission_date, expected_retirement_date, employment_status, created_at";
const CASE_COLUMNS: &str = "id, owner_id, client_id, case_number, thesis, description, filing_date, \
     status, court, court_division, next_deadline, deadline_description, client_dependency, \
     office_dependency, estimated_value, judgment_value, created_at";
const DEADLINE_COLUMNS: &str = "id, case_id, due_date, description, completed";
const CASE_UPDATE_COLUMNS: &str = "id, case_id, date, description, kind";
const DOCUMENT_COLUMNS: &str =
    "id, owner_id, client_id, file_name, content_type, size_bytes, description, uploaded_at";
const OPPORTUNITY_COLUMNS: &str = "id, owner_id, client_id, thesis, confidence, rationale, \
     required_documents, status, created_at, filed_at";
const MOVEMENT_COLUMNS: &str =
    "id, owner_id, date, description, kind, amount, category, case_id, created_at";
const RPV_COLUMNS: &str =
    "id, owner_id, client_id, case_id, expected_date, amount, thesis, status, created_at";
const PETITION_COLUMNS: &str = "id, owner_id, case_id, kind, thesis, client_name, case_number, \
     content, status, created_at, updated_at";
const COMMUNICATION_COLUMNS: &str = "id, owner_id, client_id, client_name, question, kind, channel, \
     body, status, created_at, sent_at";

fn collect<R, T>(records: Vec<R>, convert: impl Fn(R) -> PortResult<T>) -> PortResult<Vec<T>> {
    records.into_iter().map(convert).collect()
}

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    // --- Users ---
    async fn create_user(&self, user: User, password_hash: &str) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "INSERT INTO users (id, email, name, role, password_hash, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {USER_COLUMNS}"
        ))
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.role)
        .bind(password_hash)
        .bind(user.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error(e, "User"))?;
        Ok(record.to_domain().user)
    }

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error(e, "User"))?;
        Ok(record.to_domain().user)
    }

    async fn get_credentials_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error(e, "User"))?;
        Ok(record.to_domain())
    }

    // --- Clients ---
    async fn list_clients(&self, owner_id: Uuid) -> PortResult<Vec<Client>> {
        let records = sqlx::query_as::<_, ClientRecord>(&format!(
            "SELECT {CLIENT_COLUMNS} FROM clients WHERE owner_id = $1 ORDER BY created_at DESC"
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error(e, "Client"))?;
        Ok(records.into_iter().map(ClientRecord::to_domain).collect())
    }

    async fn get_client(&self, client_id: Uuid) -> PortResult<Client> {
        let record = sqlx::query_as::<_, ClientRecord>(&format!(
            "SELECT {CLIENT_COLUMNS} FROM clients WHERE id = $1"
        ))
        .bind(client_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error(e, "Client"))?;
        Ok(record.to_domain())
    }

    async fn find_client_by_cpf(&self, cpf: &str) -> PortResult<Option<Client>> {
        let record = sqlx::query_as::<_, ClientRecord>(&format!(
            "SELECT {CLIENT_COLUMNS} FROM clients WHERE cpf = $1"
        ))
        .bind(cpf)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error(e, "Client"))?;
        Ok(record.map(ClientRecord::to_domain))
    }

    async fn insert_client(&self, c: Client) -> PortResult<Client> {
        let record = sqlx::query_as::<_, ClientRecord>(&format!(
            "INSERT INTO clients ({CLIENT_COLUMNS}) VALUES \
             ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, \
              $19, $20, $21, $22, $23) RETURNING {CLIENT_COLUMNS}"
        ))
        .bind(c.id)
        .bind(c.owner_id)
        .bind(&c.name)
        .bind(&c.cpf)
        .bind(&c.rg)
        .bind(c.birth_date)
        .bind(&c.marital_status)
        .bind(&c.phone)
        .bind(&c.email)
        .bind(&c.street)
        .bind(&c.number)
        .bind(&c.complement)
        .bind(&c.district)
        .bind(&c.city)
        .bind(&c.state)
        .bind(&c.postal_code)
        .bind(&c.employer)
        .bind(&c.position)
        .bind(&c.registration)
        .bind(c.admission_date)
        .bind(c.expected_retirement_date)
        .bind(&c.employment_status)
        .bind(c.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error(e, "Client"))?;
        Ok(record.to_domain())
    }

    async fn update_client(&self, c: Client) -> PortResult<Client> {
        let record = sqlx::query_as::<_, ClientRecord>(&format!(
            "UPDATE clients SET name = $2, cpf = $3, rg = $4, birth_date = $5, marital_status = $6, \
             phone = $7, email = $8, street = $9, number = $10, complement = $11, district = $12, \
             city = $13, state = $14, postal_code = $15, employer = $16, position = $17, \
             registration = $18, admission_date = $19, expected_retirement_date = $20, \
             employment_status = $21 WHERE id = $1 RETURNING {CLIENT_COLUMNS}"
        ))
        .bind(c.id)
        .bind(&c.name)
        .bind(&c.cpf)
        .bind(&c.rg)
        .bind(c.birth_date)
        .bind(&c.marital_status)
        .bind(&c.phone)
        .bind(&c.email)
        .bind(&c.street)
        .bind(&c.number)
        .bind(&c.complement)
        .bind(&c.district)
        .bind(&c.city)
        .bind(&c.state)
        .bind(&c.postal_code)
        .bind(&c.employer)
        .bind(&c.position)
        .bind(&c.registration)
        .bind(c.admission_date)
        .bind(c.expected_retirement_date)
        .bind(&c.employment_status)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error(e, "Client"))?;
        Ok(record.to_domain())
    }

    async fn delete_client(&self, client_id: Uuid) -> PortResult<()> {
        // Cases, documents, opportunities and forecasts cascade in the schema.
        let result = sqlx::query("DELETE FROM clients WHERE id = $1")
            .bind(client_id)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error(e, "Client"))?;
        expect_deleted(result, "Client", client_id)
    }

    // --- Cases ---
    async fn list_cases(&self, owner_id: Uuid) -> PortResult<Vec<Case>> {
        let records = sqlx::query_as::<_, CaseRecord>(&format!(
            "SELECT {CASE_COLUMNS} FROM cases WHERE owner_id = $1 ORDER BY created_at DESC"
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error(e, "Case"))?;
        Ok(records.into_iter().map(CaseRecord::to_domain).collect())
    }

    async fn list_cases_for_client(&self, client_id: Uuid) -> PortResult<Vec<Case>> {
        let records = sqlx::query_as::<_, CaseRecord>(&format!(
            "SELECT {CASE_COLUMNS} FROM cases WHERE client_id = $1 ORDER BY created_at DESC"
        ))
        .bind(client_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error(e, "Case"))?;
        Ok(records.into_iter().map(CaseRecord::to_domain).collect())
    }

    async fn get_case(&self, case_id: Uuid) -> PortResult<Case> {
        let record = sqlx::query_as::<_, CaseRecord>(&format!(
            "SELECT {CASE_COLUMNS} FROM cases WHERE id = $1"
        ))
        .bind(case_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error(e, "Case"))?;
        Ok(record.to_domain())
    }

    async fn insert_case(&self, c: Case) -> PortResult<Case> {
        let record = sqlx::query_as::<_, CaseRecord>(&format!(
            "INSERT INTO cases ({CASE_COLUMNS}) VALUES \
             ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17) \
             RETURNING {CASE_COLUMNS}"
        ))
        .bind(c.id)
        .bind(c.owner_id)
        .bind(c.client_id)
        .bind(&c.case_number)
        .bind(&c.thesis)
        .bind(&c.description)
        .bind(c.filing_date)
        .bind(&c.status)
        .bind(&c.court)
        .bind(&c.court_division)
        .bind(c.next_deadline)
        .bind(&c.deadline_description)
        .bind(&c.client_dependency)
        .bind(&c.office_dependency)
        .bind(c.estimated_value)
        .bind(c.judgment_value)
        .bind(c.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error(e, "Case"))?;
        Ok(record.to_domain())
    }

    async fn update_case(&self, c: Case) -> PortResult<Case> {
        let record = sqlx::query_as::<_, CaseRecord>(&format!(
            "UPDATE cases SET client_id = $2, case_number = $3, thesis = $4, description = $5, \
             filing_date = $6, status = $7, court = $8, court_division = $9, next_deadline = $10, \
             deadline_description = $11, client_dependency = $12, office_dependency = $13, \
             estimated_value = $14, judgment_value = $15 WHERE id = $1 RETURNING {CASE_COLUMNS}"
        ))
        .bind(c.id)
        .bind(c.client_id)
        .bind(&c.case_number)
        .bind(&c.thesis)
        .bind(&c.description)
        .bind(c.filing_date)
        .bind(&c.status)
        .bind(&c.court)
        .bind(&c.court_division)
        .bind(c.next_deadline)
        .bind(&c.deadline_description)
        .bind(&c.client_dependency)
        .bind(&c.office_dependency)
        .bind(c.estimated_value)
        .bind(c.judgment_value)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error(e, "Case"))?;
        Ok(record.to_domain())
    }

    async fn delete_case(&self, case_id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM cases WHERE id = $1")
            .bind(case_id)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error(e, "Case"))?;
        expect_deleted(result, "Case", case_id)
    }

    // --- Deadlines and case updates ---
    async fn insert_deadline(&self, d: Deadline) -> PortResult<Deadline> {
        let record = sqlx::query_as::<_, DeadlineRecord>(&format!(
            "INSERT INTO deadlines ({DEADLINE_COLUMNS}) VALUES ($1, $2, $3, $4, $5) \
             RETURNING {DEADLINE_COLUMNS}"
        ))
        .bind(d.id)
        .bind(d.case_id)
        .bind(d.due_date)
        .bind(&d.description)
        .bind(d.completed)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error(e, "Deadline"))?;
        Ok(record.to_domain())
    }

    async fn update_deadline(&self, d: Deadline) -> PortResult<Deadline> {
        let record = sqlx::query_as::<_, DeadlineRecord>(&format!(
            "UPDATE deadlines SET due_date = $2, description = $3, completed = $4 \
             WHERE id = $1 RETURNING {DEADLINE_COLUMNS}"
        ))
        .bind(d.id)
        .bind(d.due_date)
        .bind(&d.description)
        .bind(d.completed)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error(e, "Deadline"))?;
        Ok(record.to_domain())
    }

    async fn list_deadlines(&self, case_id: Uuid) -> PortResult<Vec<Deadline>> {
        let records = sqlx::query_as::<_, DeadlineRecord>(&format!(
            "SELECT {DEADLINE_COLUMNS} FROM deadlines WHERE case_id = $1 ORDER BY due_date ASC"
        ))
        .bind(case_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error(e, "Deadline"))?;
        Ok(records.into_iter().map(DeadlineRecord::to_domain).collect())
    }

    async fn list_deadlines_for_owner(&self, owner_id: Uuid) -> PortResult<Vec<Deadline>> {
        let records = sqlx::query_as::<_, DeadlineRecord>(
            "SELECT d.id, d.case_id, d.due_date, d.description, d.completed \
             FROM deadlines d JOIN cases c ON c.id = d.case_id \
             WHERE c.owner_id = $1 ORDER BY d.due_date ASC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error(e, "Deadline"))?;
        Ok(records.into_iter().map(DeadlineRecord::to_domain).collect())
    }

    async fn insert_case_update(&self, u: CaseUpdate) -> PortResult<CaseUpdate> {
        let record = sqlx::query_as::<_, CaseUpdateRecord>(&format!(
            "INSERT INTO case_updates ({CASE_UPDATE_COLUMNS}) VALUES ($1, $2, $3, $4, $5) \
             RETURNING {CASE_UPDATE_COLUMNS}"
        ))
        .bind(u.id)
        .bind(u.case_id)
        .bind(u.date)
        .bind(&u.description)
        .bind(&u.kind)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error(e, "Case update"))?;
        Ok(record.to_domain())
    }

    async fn list_case_updates(&self, case_id: Uuid) -> PortResult<Vec<CaseUpdate>> {
        let records = sqlx::query_as::<_, CaseUpdateRecord>(&format!(
            "SELECT {CASE_UPDATE_COLUMNS} FROM case_updates WHERE case_id = $1 ORDER BY date DESC"
        ))
        .bind(case_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error(e, "Case update"))?;
        Ok(records.into_iter().map(CaseUpdateRecord::to_domain).collect())
    }

    // --- Documents ---
    async fn list_documents(&self, owner_id: Uuid) -> PortResult<Vec<Document>> {
        let records = sqlx::query_as::<_, DocumentRecord>(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE owner_id = $1 ORDER BY uploaded_at DESC"
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error(e, "Document"))?;
        Ok(records.into_iter().map(DocumentRecord::to_domain).collect())
    }

    async fn list_documents_for_client(&self, client_id: Uuid) -> PortResult<Vec<Document>> {
        let records = sqlx::query_as::<_, DocumentRecord>(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE client_id = $1 ORDER BY uploaded_at DESC"
        ))
        .bind(client_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error(e, "Document"))?;
        Ok(records.into_iter().map(DocumentRecord::to_domain).collect())
    }

    async fn get_document(&self, document_id: Uuid) -> PortResult<Document> {
        let record = sqlx::query_as::<_, DocumentRecord>(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE id = $1"
        ))
        .bind(document_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error(e, "Document"))?;
        Ok(record.to_domain())
    }

    async fn insert_document(&self, d: Document) -> PortResult<Document> {
        let record = sqlx::query_as::<_, DocumentRecord>(&format!(
            "INSERT INTO documents ({DOCUMENT_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {DOCUMENT_COLUMNS}"
        ))
        .bind(d.id)
        .bind(d.owner_id)
        .bind(d.client_id)
        .bind(&d.file_name)
        .bind(&d.content_type)
        .bind(d.size_bytes)
        .bind(&d.description)
        .bind(d.uploaded_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error(e, "Document"))?;
        Ok(record.to_domain())
    }

    async fn update_document(&self, d: Document) -> PortResult<Document> {
        let record = sqlx::query_as::<_, DocumentRecord>(&format!(
            "UPDATE documents SET client_id = $2, file_name = $3, content_type = $4, \
             size_bytes = $5, description = $6 WHERE id = $1 RETURNING {DOCUMENT_COLUMNS}"
        ))
        .bind(d.id)
        .bind(d.client_id)
        .bind(&d.file_name)
        .bind(&d.content_type)
        .bind(d.size_bytes)
        .bind(&d.description)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error(e, "Document"))?;
        Ok(record.to_domain())
    }

    async fn delete_document(&self, document_id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM documents WHERE id = $1")
            .bind(document_id)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error(e, "Document"))?;
        expect_deleted(result, "Document", document_id)
    }

    // --- Opportunities ---
    async fn list_opportunities(&self, owner_id: Uuid) -> PortResult<Vec<Opportunity>> {
        let records = sqlx::query_as::<_, OpportunityRecord>(&format!(
            "SELECT {OPPORTUNITY_COLUMNS} FROM opportunities WHERE owner_id = $1 \
             ORDER BY created_at DESC"
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error(e, "Opportunity"))?;
        collect(records, OpportunityRecord::to_domain)
    }

    async fn list_opportunities_for_client(&self, client_id: Uuid) -> PortResult<Vec<Opportunity>> {
        let records = sqlx::query_as::<_, OpportunityRecord>(&format!(
            "SELECT {OPPORTUNITY_COLUMNS} FROM opportunities WHERE client_id = $1 \
             ORDER BY created_at DESC"
        ))
        .bind(client_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error(e, "Opportunity"))?;
        collect(records, OpportunityRecord::to_domain)
    }

    async fn get_opportunity(&self, opportunity_id: Uuid) -> PortResult<Opportunity> {
        sqlx::query_as::<_, OpportunityRecord>(&format!(
            "SELECT {OPPORTUNITY_COLUMNS} FROM opportunities WHERE id = $1"
        ))
        .bind(opportunity_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error(e, "Opportunity"))?
        .to_domain()
    }

    async fn insert_opportunity(&self, o: Opportunity) -> PortResult<Opportunity> {
        sqlx::query_as::<_, OpportunityRecord>(&format!(
            "INSERT INTO opportunities ({OPPORTUNITY_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING {OPPORTUNITY_COLUMNS}"
        ))
        .bind(o.id)
        .bind(o.owner_id)
        .bind(o.client_id)
        .bind(o.thesis.slug())
        .bind(o.confidence)
        .bind(&o.rationale)
        .bind(&o.required_documents)
        .bind(o.status.as_str())
        .bind(o.created_at)
        .bind(o.filed_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error(e, "Opportunity"))?
        .to_domain()
    }

    async fn update_opportunity(&self, o: Opportunity) -> PortResult<Opportunity> {
        sqlx::query_as::<_, OpportunityRecord>(&format!(
            "UPDATE opportunities SET thesis = $2, confidence = $3, rationale = $4, \
             required_documents = $5, status = $6, filed_at = $7 \
             WHERE id = $1 RETURNING {OPPORTUNITY_COLUMNS}"
        ))
        .bind(o.id)
        .bind(o.thesis.slug())
        .bind(o.confidence)
        .bind(&o.rationale)
        .bind(&o.required_documents)
        .bind(o.status.as_str())
        .bind(o.filed_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error(e, "Opportunity"))?
        .to_domain()
    }

    async fn delete_opportunity(&self, opportunity_id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM opportunities WHERE id = $1")
            .bind(opportunity_id)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error(e, "Opportunity"))?;
        expect_deleted(result, "Opportunity", opportunity_id)
    }

    // --- Finance ---
    async fn list_movements(&self, owner_id: Uuid) -> PortResult<Vec<FinancialMovement>> {
        let records = sqlx::query_as::<_, MovementRecord>(&format!(
            "SELECT {MOVEMENT_COLUMNS} FROM financial_movements WHERE owner_id = $1 \
             ORDER BY date DESC, created_at DESC"
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error(e, "Movement"))?;
        collect(records, MovementRecord::to_domain)
    }

    async fn get_movement(&self, movement_id: Uuid) -> PortResult<FinancialMovement> {
        sqlx::query_as::<_, MovementRecord>(&format!(
            "SELECT {MOVEMENT_COLUMNS} FROM financial_movements WHERE id = $1"
        ))
        .bind(movement_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error(e, "Movement"))?
        .to_domain()
    }

    async fn insert_movement(&self, m: FinancialMovement) -> PortResult<FinancialMovement> {
        sqlx::query_as::<_, MovementRecord>(&format!(
            "INSERT INTO financial_movements ({MOVEMENT_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING {MOVEMENT_COLUMNS}"
        ))
        .bind(m.id)
        .bind(m.owner_id)
        .bind(m.date)
        .bind(&m.description)
        .bind(m.kind.as_str())
        .bind(m.amount)
        .bind(&m.category)
        .bind(m.case_id)
        .bind(m.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error(e, "Movement"))?
        .to_domain()
    }

    async fn update_movement(&self, m: FinancialMovement) -> PortResult<FinancialMovement> {
        sqlx::query_as::<_, MovementRecord>(&format!(
            "UPDATE financial_movements SET date = $2, description = $3, kind = $4, amount = $5, \
             category = $6, case_id = $7 WHERE id = $1 RETURNING {MOVEMENT_COLUMNS}"
        ))
        .bind(m.id)
        .bind(m.date)
        .bind(&m.description)
        .bind(m.kind.as_str())
        .bind(m.amount)
        .bind(&m.category)
        .bind(m.case_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error(e, "Movement"))?
        .to_domain()
    }

    async fn delete_movement(&self, movement_id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM financial_movements WHERE id = $1")
            .bind(movement_id)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error(e, "Movement"))?;
        expect_deleted(result, "Movement", movement_id)
    }

    async fn list_rpvs(&self, owner_id: Uuid) -> PortResult<Vec<RpvForecast>> {
        let records = sqlx::query_as::<_, RpvRecord>(&format!(
            "SELECT {RPV_COLUMNS} FROM rpv_forecasts WHERE owner_id = $1 ORDER BY expected_date ASC"
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error(e, "RPV"))?;
        collect(records, RpvRecord::to_domain)
    }

    async fn get_rpv(&self, rpv_id: Uuid) -> PortResult<RpvForecast> {
        sqlx::query_as::<_, RpvRecord>(&format!(
            "SELECT {RPV_COLUMNS} FROM rpv_forecasts WHERE id = $1"
        ))
        .bind(rpv_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error(e, "RPV"))?
        .to_domain()
    }

    async fn insert_rpv(&self, r: RpvForecast) -> PortResult<RpvForecast> {
        sqlx::query_as::<_, RpvRecord>(&format!(
            "INSERT INTO rpv_forecasts ({RPV_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING {RPV_COLUMNS}"
        ))
        .bind(r.id)
        .bind(r.owner_id)
        .bind(r.client_id)
        .bind(r.case_id)
        .bind(r.expected_date)
        .bind(r.amount)
        .bind(&r.thesis)
        .bind(r.status.as_str())
        .bind(r.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error(e, "RPV"))?
        .to_domain()
    }

    async fn update_rpv(&self, r: RpvForecast) -> PortResult<RpvForecast> {
        sqlx::query_as::<_, RpvRecord>(&format!(
            "UPDATE rpv_forecasts SET expected_date = $2, amount = $3, thesis = $4, status = $5 \
             WHERE id = $1 RETURNING {RPV_COLUMNS}"
        ))
        .bind(r.id)
        .bind(r.expected_date)
        .bind(r.amount)
        .bind(&r.thesis)
        .bind(r.status.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error(e, "RPV"))?
        .to_domain()
    }

    async fn delete_rpv(&self, rpv_id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM rpv_forecasts WHERE id = $1")
            .bind(rpv_id)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error(e, "RPV"))?;
        expect_deleted(result, "RPV", rpv_id)
    }

    // --- Petitions ---
    async fn list_petitions(&self, owner_id: Uuid) -> PortResult<Vec<Petition>> {
        let records = sqlx::query_as::<_, PetitionRecord>(&format!(
            "SELECT {PETITION_COLUMNS} FROM petitions WHERE owner_id = $1 ORDER BY created_at DESC"
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error(e, "Petition"))?;
        collect(records, PetitionRecord::to_domain)
    }

    async fn list_petitions_for_case(&self, case_id: Uuid) -> PortResult<Vec<Petition>> {
        let records = sqlx::query_as::<_, PetitionRecord>(&format!(
            "SELECT {PETITION_COLUMNS} FROM petitions WHERE case_id = $1 ORDER BY created_at DESC"
        ))
        .bind(case_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error(e, "Petition"))?;
        collect(records, PetitionRecord::to_domain)
    }

    async fn get_petition(&self, petition_id: Uuid) -> PortResult<Petition> {
        sqlx::query_as::<_, PetitionRecord>(&format!(
            "SELECT {PETITION_COLUMNS} FROM petitions WHERE id = $1"
        ))
        .bind(petition_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error(e, "Petition"))?
        .to_domain()
    }

    async fn insert_petition(&self, p: Petition) -> PortResult<Petition> {
        sqlx::query_as::<_, PetitionRecord>(&format!(
            "INSERT INTO petitions ({PETITION_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) RETURNING {PETITION_COLUMNS}"
        ))
        .bind(p.id)
        .bind(p.owner_id)
        .bind(p.case_id)
        .bind(&p.kind)
        .bind(&p.thesis)
        .bind(&p.client_name)
        .bind(&p.case_number)
        .bind(&p.content)
        .bind(p.status.as_str())
        .bind(p.created_at)
        .bind(p.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error(e, "Petition"))?
        .to_domain()
    }

    async fn update_petition(&self, p: Petition) -> PortResult<Petition> {
        sqlx::query_as::<_, PetitionRecord>(&format!(
            "UPDATE petitions SET case_id = $2, kind = $3, thesis = $4, client_name = $5, \
             case_number = $6, content = $7, status = $8, updated_at = $9 \
             WHERE id = $1 RETURNING {PETITION_COLUMNS}"
        ))
        .bind(p.id)
        .bind(p.case_id)
        .bind(&p.kind)
        .bind(&p.thesis)
        .bind(&p.client_name)
        .bind(&p.case_number)
        .bind(&p.content)
        .bind(p.status.as_str())
        .bind(p.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error(e, "Petition"))?
        .to_domain()
    }

    async fn delete_petition(&self, petition_id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM petitions WHERE id = $1")
            .bind(petition_id)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error(e, "Petition"))?;
        expect_deleted(result, "Petition", petition_id)
    }

    // --- Communications ---
    async fn list_communications(&self, owner_id: Uuid) -> PortResult<Vec<Communication>> {
        let records = sqlx::query_as::<_, CommunicationRecord>(&format!(
            "SELECT {COMMUNICATION_COLUMNS} FROM communications WHERE owner_id = $1 \
             ORDER BY created_at DESC"
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error(e, "Communication"))?;
        collect(records, CommunicationRecord::to_domain)
    }

    async fn list_communications_for_client(&self, client_id: Uuid) -> PortResult<Vec<Communication>> {
        let records = sqlx::query_as::<_, CommunicationRecord>(&format!(
            "SELECT {COMMUNICATION_COLUMNS} FROM communications WHERE client_id = $1 \
             ORDER BY created_at DESC"
        ))
        .bind(client_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error(e, "Communication"))?;
        collect(records, CommunicationRecord::to_domain)
    }

    async fn get_communication(&self, communication_id: Uuid) -> PortResult<Communication> {
        sqlx::query_as::<_, CommunicationRecord>(&format!(
            "SELECT {COMMUNICATION_COLUMNS} FROM communications WHERE id = $1"
        ))
        .bind(communication_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error(e, "Communication"))?
        .to_domain()
    }

    async fn insert_communication(&self, c: Communication) -> PortResult<Communication> {
        sqlx::query_as::<_, CommunicationRecord>(&format!(
            "INSERT INTO communications ({COMMUNICATION_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) RETURNING {COMMUNICATION_COLUMNS}"
        ))
        .bind(c.id)
        .bind(c.owner_id)
        .bind(c.client_id)
        .bind(&c.client_name)
        .bind(&c.question)
        .bind(c.kind.as_str())
        .bind(&c.channel)
        .bind(&c.body)
        .bind(c.status.as_str())
        .bind(c.created_at)
        .bind(c.sent_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error(e, "Communication"))?
        .to_domain()
    }

    async fn update_communication(&self, c: Communication) -> PortResult<Communication> {
        sqlx::query_as::<_, CommunicationRecord>(&format!(
            "UPDATE communications SET client_id = $2, client_name = $3, question = $4, kind = $5, \
             channel = $6, body = $7, status = $8, sent_at = $9 \
             WHERE id = $1 RETURNING {COMMUNICATION_COLUMNS}"
        ))
        .bind(c.id)
        .bind(c.client_id)
        .bind(&c.client_name)
        .bind(&c.question)
        .bind(c.kind.as_str())
        .bind(&c.channel)
        .bind(&c.body)
        .bind(c.status.as_str())
        .bind(c.sent_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error(e, "Communication"))?
        .to_domain()
    }

    async fn delete_communication(&self, communication_id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM communications WHERE id = $1")
            .bind(communication_id)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error(e, "Communication"))?;
        expect_deleted(result, "Communication", communication_id)
    }
}
