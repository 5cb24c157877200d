//! services/api/src/adapters/memory.rs
//!
//! A `DatabaseService` kept entirely in process memory. Used by the test
//! suite and when the service starts without `DATABASE_URL`.

use async_trait::async_trait;
use lpms_core::domain::{
    Case, CaseUpdate, Client, Communication, Deadline, Document, FinancialMovement, Opportunity,
    Petition, RpvForecast, User, UserCredentials,
};
use lpms_core::ports::{DatabaseService, PortError, PortResult};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, UserCredentials>,
    clients: HashMap<Uuid, Client>,
    cases: HashMap<Uuid, Case>,
    deadlines: HashMap<Uuid, Deadline>,
    case_updates: HashMap<Uuid, CaseUpdate>,
    documents: HashMap<Uuid, Document>,
    opportunities: HashMap<Uuid, Opportunity>,
    movements: HashMap<Uuid, FinancialMovement>,
    rpvs: HashMap<Uuid, RpvForecast>,
    petitions: HashMap<Uuid, Petition>,
    communications: HashMap<Uuid, Communication>,
}

impl Tables {
    fn remove_case_rows(&mut self, case_id: Uuid) {
        self.deadlines.retain(|_, d| d.case_id != case_id);
        self.case_updates.retain(|_, u| u.case_id != case_id);
        self.rpvs.retain(|_, r| r.case_id != case_id);
        for petition in self.petitions.values_mut() {
            if petition.case_id == Some(case_id) {
                petition.case_id = None;
            }
        }
        for movement in self.movements.values_mut() {
            if movement.case_id == Some(case_id) {
                movement.case_id = None;
            }
        }
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn not_found(what: &str, id: Uuid) -> PortError {
    PortError::NotFound(format!("{} {} not found", what, id))
}

fn get_row<T: Clone>(map: &HashMap<Uuid, T>, id: Uuid, what: &str) -> PortResult<T> {
    map.get(&id).cloned().ok_or_else(|| not_found(what, id))
}

fn replace_row<T: Clone>(map: &mut HashMap<Uuid, T>, id: Uuid, row: T, what: &str) -> PortResult<T> {
    match map.get_mut(&id) {
        Some(slot) => {
            *slot = row.clone();
            Ok(row)
        }
        None => Err(not_found(what, id)),
    }
}

fn remove_row<T>(map: &mut HashMap<Uuid, T>, id: Uuid, what: &str) -> PortResult<()> {
    map.remove(&id).map(|_| ()).ok_or_else(|| not_found(what, id))
}

/// Collects the matching rows, newest first by the given key.
fn newest_first<T: Clone, K: Ord>(
    map: &HashMap<Uuid, T>,
    keep: impl Fn(&T) -> bool,
    key: impl Fn(&T) -> K,
) -> Vec<T> {
    let mut rows: Vec<T> = map.values().filter(|r| keep(r)).cloned().collect();
    rows.sort_by(|a, b| key(b).cmp(&key(a)));
    rows
}

#[async_trait]
impl DatabaseService for MemoryStore {
    // --- Users ---
    async fn create_user(&self, user: User, password_hash: &str) -> PortResult<User> {
        let mut t = self.tables.write().await;
        if t.users.values().any(|c| c.user.email == user.email) {
            return Err(PortError::Conflict("user already exists".to_string()));
        }
        t.users.insert(
            user.id,
            UserCredentials {
                user: user.clone(),
                password_hash: password_hash.to_string(),
            },
        );
        Ok(user)
    }

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User> {
        let t = self.tables.read().await;
        t.users
            .get(&user_id)
            .map(|c| c.user.clone())
            .ok_or_else(|| not_found("User", user_id))
    }

    async fn get_credentials_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let t = self.tables.read().await;
        t.users
            .values()
            .find(|c| c.user.email == email)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("User with email {} not found", email)))
    }

    // --- Clients ---
    async fn list_clients(&self, owner_id: Uuid) -> PortResult<Vec<Client>> {
        let t = self.tables.read().await;
        Ok(newest_first(&t.clients, |c| c.owner_id == owner_id, |c| c.created_at))
    }

    async fn get_client(&self, client_id: Uuid) -> PortResult<Client> {
        get_row(&self.tables.read().await.clients, client_id, "Client")
    }

    async fn find_client_by_cpf(&self, cpf: &str) -> PortResult<Option<Client>> {
        let t = self.tables.read().await;
        Ok(t.clients.values().find(|c| c.cpf == cpf).cloned())
    }

    async fn insert_client(&self, client: Client) -> PortResult<Client> {
        let mut t = self.tables.write().await;
        if t.clients.values().any(|c| c.cpf == client.cpf) {
            return Err(PortError::Conflict("cpf already registered".to_string()));
        }
        t.clients.insert(client.id, client.clone());
        Ok(client)
    }

    async fn update_client(&self, client: Client) -> PortResult<Client> {
        let mut t = self.tables.write().await;
        if t.clients.values().any(|c| c.cpf == client.cpf && c.id != client.id) {
            return Err(PortError::Conflict("cpf already registered".to_string()));
        }
        replace_row(&mut t.clients, client.id, client, "Client")
    }

    async fn delete_client(&self, client_id: Uuid) -> PortResult<()> {
        let mut t = self.tables.write().await;
        remove_row(&mut t.clients, client_id, "Client")?;

        let case_ids: Vec<Uuid> = t
            .cases
            .values()
            .filter(|c| c.client_id == client_id)
            .map(|c| c.id)
            .collect();
        for case_id in case_ids {
            t.cases.remove(&case_id);
            t.remove_case_rows(case_id);
        }
        t.documents.retain(|_, d| d.client_id != client_id);
        t.opportunities.retain(|_, o| o.client_id != client_id);
        t.rpvs.retain(|_, r| r.client_id != client_id);
        for communication in t.communications.values_mut() {
            if communication.client_id == Some(client_id) {
                communication.client_id = None;
            }
        }
        Ok(())
    }

    // --- Cases ---
    async fn list_cases(&self, owner_id: Uuid) -> PortResult<Vec<Case>> {
        let t = self.tables.read().await;
        Ok(newest_first(&t.cases, |c| c.owner_id == owner_id, |c| c.created_at))
    }

    async fn list_cases_for_client(&self, client_id: Uuid) -> PortResult<Vec<Case>> {
        let t = self.tables.read().await;
        Ok(newest_first(&t.cases, |c| c.client_id == client_id, |c| c.created_at))
    }

    async fn get_case(&self, case_id: Uuid) -> PortResult<Case> {
        get_row(&self.tables.read().await.cases, case_id, "Case")
    }

    async fn insert_case(&self, case: Case) -> PortResult<Case> {
        let mut t = self.tables.write().await;
        if !t.clients.contains_key(&case.client_id) {
            return Err(not_found("Client", case.client_id));
        }
        t.cases.insert(case.id, case.clone());
        Ok(case)
    }

    async fn update_case(&self, case: Case) -> PortResult<Case> {
        let mut t = self.tables.write().await;
        replace_row(&mut t.cases, case.id, case, "Case")
    }

    async fn delete_case(&self, case_id: Uuid) -> PortResult<()> {
        let mut t = self.tables.write().await;
        remove_row(&mut t.cases, case_id, "Case")?;
        t.remove_case_rows(case_id);
        Ok(())
    }

    // --- Deadlines and case updates ---
    async fn insert_deadline(&self, deadline: Deadline) -> PortResult<Deadline> {
        let mut t = self.tables.write().await;
        t.deadlines.insert(deadline.id, deadline.clone());
        Ok(deadline)
    }

    async fn update_deadline(&self, deadline: Deadline) -> PortResult<Deadline> {
        let mut t = self.tables.write().await;
        replace_row(&mut t.deadlines, deadline.id, deadline, "Deadline")
    }

    async fn list_deadlines(&self, case_id: Uuid) -> PortResult<Vec<Deadline>> {
        let t = self.tables.read().await;
        let mut rows: Vec<Deadline> = t
            .deadlines
            .values()
            .filter(|d| d.case_id == case_id)
            .cloned()
            .collect();
        rows.sort_by_key(|d| d.due_date);
        Ok(rows)
    }

    async fn list_deadlines_for_owner(&self, owner_id: Uuid) -> PortResult<Vec<Deadline>> {
        let t = self.tables.read().await;
        let mut rows: Vec<Deadline> = t
            .deadlines
            .values()
            .filter(|d| t.cases.get(&d.case_id).is_some_and(|c| c.owner_id == owner_id))
            .cloned()
            .collect();
        rows.sort_by_key(|d| d.due_date);
        Ok(rows)
    }

    async fn insert_case_update(&self, update: CaseUpdate) -> PortResult<CaseUpdate> {
        let mut t = self.tables.write().await;
        t.case_updates.insert(update.id, update.clone());
        Ok(update)
    }

    async fn list_case_updates(&self, case_id: Uuid) -> PortResult<Vec<CaseUpdate>> {
        let t = self.tables.read().await;
        Ok(newest_first(&t.case_updates, |u| u.case_id == case_id, |u| u.date))
    }

    // --- Documents ---
    async fn list_documents(&self, owner_id: Uuid) -> PortResult<Vec<Document>> {
        let t = self.tables.read().await;
        Ok(newest_first(&t.documents, |d| d.owner_id == owner_id, |d| d.uploaded_at))
    }

    async fn list_documents_for_client(&self, client_id: Uuid) -> PortResult<Vec<Document>> {
        let t = self.tables.read().await;
        Ok(newest_first(&t.documents, |d| d.client_id == client_id, |d| d.uploaded_at))
    }

    async fn get_document(&self, document_id: Uuid) -> PortResult<Document> {
        get_row(&self.tables.read().await.documents, document_id, "Document")
    }

    async fn insert_document(&self, document: Document) -> PortResult<Document> {
        let mut t = self.tables.write().await;
        t.documents.insert(document.id, document.clone());
        Ok(document)
    }

    async fn update_document(&self, document: Document) -> PortResult<Document> {
        let mut t = self.tables.write().await;
        replace_row(&mut t.documents, document.id, document, "Document")
    }

    async fn delete_document(&self, document_id: Uuid) -> PortResult<()> {
        remove_row(&mut self.tables.write().await.documents, document_id, "Document")
    }

    // --- Opportunities ---
    async fn list_opportunities(&self, owner_id: Uuid) -> PortResult<Vec<Opportunity>> {
        let t = self.tables.read().await;
        Ok(newest_first(&t.opportunities, |o| o.owner_id == owner_id, |o| o.created_at))
    }

    async fn list_opportunities_for_client(&self, client_id: Uuid) -> PortResult<Vec<Opportunity>> {
        let t = self.tables.read().await;
        Ok(newest_first(&t.opportunities, |o| o.client_id == client_id, |o| o.created_at))
    }

    async fn get_opportunity(&self, opportunity_id: Uuid) -> PortResult<Opportunity> {
        get_row(&self.tables.read().await.opportunities, opportunity_id, "Opportunity")
    }

    async fn insert_opportunity(&self, opportunity: Opportunity) -> PortResult<Opportunity> {
        let mut t = self.tables.write().await;
        t.opportunities.insert(opportunity.id, opportunity.clone());
        Ok(opportunity)
    }

    async fn update_opportunity(&self, opportunity: Opportunity) -> PortResult<Opportunity> {
        let mut t = self.tables.write().await;
        replace_row(&mut t.opportunities, opportunity.id, opportunity, "Opportunity")
    }

    async fn delete_opportunity(&self, opportunity_id: Uuid) -> PortResult<()> {
        remove_row(&mut self.tables.write().await.opportunities, opportunity_id, "Opportunity")
    }

    // --- Finance ---
    async fn list_movements(&self, owner_id: Uuid) -> PortResult<Vec<FinancialMovement>> {
        let t = self.tables.read().await;
        Ok(newest_first(&t.movements, |m| m.owner_id == owner_id, |m| (m.date, m.created_at)))
    }

    async fn get_movement(&self, movement_id: Uuid) -> PortResult<FinancialMovement> {
        get_row(&self.tables.read().await.movements, movement_id, "Movement")
    }

    async fn insert_movement(&self, movement: FinancialMovement) -> PortResult<FinancialMovement> {
        let mut t = self.tables.write().await;
        t.movements.insert(movement.id, movement.clone());
        Ok(movement)
    }

    async fn update_movement(&self, movement: FinancialMovement) -> PortResult<FinancialMovement> {
        let mut t = self.tables.write().await;
        replace_row(&mut t.movements, movement.id, movement, "Movement")
    }

    async fn delete_movement(&self, movement_id: Uuid) -> PortResult<()> {
        remove_row(&mut self.tables.write().await.movements, movement_id, "Movement")
    }

    async fn list_rpvs(&self, owner_id: Uuid) -> PortResult<Vec<RpvForecast>> {
        let t = self.tables.read().await;
        let mut rows: Vec<RpvForecast> = t
            .rpvs
            .values()
            .filter(|r| r.owner_id == owner_id)
            .cloned()
            .collect();
        rows.sort_by_key(|r| r.expected_date);
        Ok(rows)
    }

    async fn get_rpv(&self, rpv_id: Uuid) -> PortResult<RpvForecast> {
        get_row(&self.tables.read().await.rpvs, rpv_id, "RPV")
    }

    async fn insert_rpv(&self, rpv: RpvForecast) -> PortResult<RpvForecast> {
        let mut t = self.tables.write().await;
        t.rpvs.insert(rpv.id, rpv.clone());
        Ok(rpv)
    }

    async fn update_rpv(&self, rpv: RpvForecast) -> PortResult<RpvForecast> {
        let mut t = self.tables.write().await;
        replace_row(&mut t.rpvs, rpv.id, rpv, "RPV")
    }

    async fn delete_rpv(&self, rpv_id: Uuid) -> PortResult<()> {
        remove_row(&mut self.tables.write().await.rpvs, rpv_id, "RPV")
    }

    // --- Petitions ---
    async fn list_petitions(&self, owner_id: Uuid) -> PortResult<Vec<Petition>> {
        let t = self.tables.read().await;
        Ok(newest_first(&t.petitions, |p| p.owner_id == owner_id, |p| p.created_at))
    }

    async fn list_petitions_for_case(&self, case_id: Uuid) -> PortResult<Vec<Petition>> {
        let t = self.tables.read().await;
        Ok(newest_first(&t.petitions, |p| p.case_id == Some(case_id), |p| p.created_at))
    }

    async fn get_petition(&self, petition_id: Uuid) -> PortResult<Petition> {
        get_row(&self.tables.read().await.petitions, petition_id, "Petition")
    }

    async fn insert_petition(&self, petition: Petition) -> PortResult<Petition> {
        let mut t = self.tables.write().await;
        t.petitions.insert(petition.id, petition.clone());
        Ok(petition)
    }

    async fn update_petition(&self, petition: Petition) -> PortResult<Petition> {
        let mut t = self.tables.write().await;
        replace_row(&mut t.petitions, petition.id, petition, "Petition")
    }

    async fn delete_petition(&self, petition_id: Uuid) -> PortResult<()> {
        remove_row(&mut self.tables.write().await.petitions, petition_id, "Petition")
    }

    // --- Communications ---
    async fn list_communications(&self, owner_id: Uuid) -> PortResult<Vec<Communication>> {
        let t = self.tables.read().await;
        Ok(newest_first(&t.communications, |c| c.owner_id == owner_id, |c| c.created_at))
    }

    async fn list_communications_for_client(&self, client_id: Uuid) -> PortResult<Vec<Communication>> {
        let t = self.tables.read().await;
        Ok(newest_first(
            &t.communications,
            |c| c.client_id == Some(client_id),
            |c| c.created_at,
        ))
    }

    async fn get_communication(&self, communication_id: Uuid) -> PortResult<Communication> {
        get_row(&self.tables.read().await.communications, communication_id, "Communication")
    }

    async fn insert_communication(&self, communication: Communication) -> PortResult<Communication> {
        let mut t = self.tables.write().await;
        t.communications.insert(communication.id, communication.clone());
        Ok(communication)
    }

    async fn update_communication(&self, communication: Communication) -> PortResult<Communication> {
        let mut t = self.tables.write().await;
        replace_row(&mut t.communications, communication.id, communication, "Communication")
    }

    async fn delete_communication(&self, communication_id: Uuid) -> PortResult<()> {
        remove_row(
            &mut self.tables.write().await.communications,
            communication_id,
            "Communication",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn client(owner: Uuid, cpf: &str) -> Client {
        Client {
            id: Uuid::new_v4(),
            owner_id: owner,
            name: "Maria".to_string(),
            cpf: cpf.to_string(),
            rg: None,
            birth_date: None,
            marital_status: None,
            phone: "6199999999".to_string(),
            email: "maria@example.com".to_string(),
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
        }
    }

    fn case_for(client: &Client) -> Case {
        Case {
            id: Uuid::new_v4(),
            owner_id: client.owner_id,
            client_id: client.id,
            case_number: "0001234-56.2024.8.07.0001".to_string(),
            thesis: "Licença-Prêmio".to_string(),
            description: None,
            filing_date: "2024-03-01".parse().unwrap(),
            status: "ativo".to_string(),
            court: None,
            court_division: None,
            next_deadline: None,
            deadline_description: None,
            client_dependency: None,
            office_dependency: None,
            estimated_value: None,
            judgment_value: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn duplicate_cpf_is_a_conflict() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        store.insert_client(client(owner, "12345678901")).await.unwrap();
        let err = store.insert_client(client(owner, "12345678901")).await.unwrap_err();
        assert!(matches!(err, PortError::Conflict(_)));
    }

    #[tokio::test]
    async fn deleting_a_client_removes_its_cases_and_deadlines() {
        let store = MemoryStore::new();
        let c = store.insert_client(client(Uuid::new_v4(), "12345678901")).await.unwrap();
        let case = store.insert_case(case_for(&c)).await.unwrap();
        store
            .insert_deadline(Deadline {
                id: Uuid::new_v4(),
                case_id: case.id,
                due_date: "2024-05-01".parse().unwrap(),
                description: "Contestação".to_string(),
                completed: false,
            })
            .await
            .unwrap();

        store.delete_client(c.id).await.unwrap();

        assert!(matches!(store.get_case(case.id).await, Err(PortError::NotFound(_))));
        assert!(store.list_deadlines(case.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn deleting_a_missing_row_is_not_found() {
        let store = MemoryStore::new();
        let err = store.delete_petition(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, PortError::NotFound(_)));
    }
}
