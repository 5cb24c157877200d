//! End-to-end tests of the HTTP surface on the in-memory store.

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::Local;
use lpms_api::adapters::{court_portal, MemoryStore};
use lpms_api::config::Config;
use lpms_api::web::{build_router, state::AppState};
use lpms_core::court::CourtCase;
use lpms_core::petition::{TemplateCatalog, CASE_PLACEHOLDER, CLIENT_PLACEHOLDER};
use lpms_core::ports::{CompletionService, CourtPortalService, ExternalServiceError};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tower::ServiceExt;

//=========================================================================================
// Fakes and Helpers
//=========================================================================================

struct Offline;

#[async_trait]
impl CompletionService for Offline {
    async fn complete(&self, _prompt: &str, _max_tokens: u32) -> Result<String, ExternalServiceError> {
        Err(ExternalServiceError::NotConfigured)
    }
}

/// Answers with the sample data, or fails for every lookup.
struct FakeCourt {
    available: bool,
}

#[async_trait]
impl CourtPortalService for FakeCourt {
    async fn lookup_case(&self, case_number: &str) -> Result<CourtCase, ExternalServiceError> {
        if !self.available {
            return Err(ExternalServiceError::Timeout);
        }
        Ok(court_portal::sample_case(case_number, Local::now().date_naive()))
    }

    async fn lookup_by_cpf(&self, _cpf: &str) -> Result<Vec<CourtCase>, ExternalServiceError> {
        if !self.available {
            return Err(ExternalServiceError::Timeout);
        }
        Ok(court_portal::sample_listing(Local::now().date_naive()))
    }
}

fn app_with_court(available: bool) -> Router {
    let vars: HashMap<String, String> = [("JWT_SECRET", "integration-test-secret")]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    let config = Arc::new(Config::from_vars(&vars).unwrap());
    let state = AppState::new(
        Arc::new(MemoryStore::new()),
        config,
        Arc::new(Offline),
        Arc::new(FakeCourt { available }),
    );
    build_router(Arc::new(state)).unwrap()
}

fn app() -> Router {
    app_with_court(true)
}

struct Reply {
    status: StatusCode,
    headers: axum::http::HeaderMap,
    bytes: Vec<u8>,
}

impl Reply {
    fn json(&self) -> Value {
        serde_json::from_slice(&self.bytes).unwrap()
    }
}

async fn call(app: &Router, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Reply {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap().to_vec();
    Reply {
        status,
        headers,
        bytes,
    }
}

async fn register(app: &Router, email: &str) -> String {
    let reply = call(
        app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({ "email": email, "password": "s3cret-pass", "name": "Dra. Ana" })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::CREATED);
    reply.json()["token"].as_str().unwrap().to_string()
}

async fn create_client(app: &Router, token: &str, cpf: &str) -> String {
    let reply = call(
        app,
        Method::POST,
        "/api/clients",
        Some(token),
        Some(json!({
            "name": "Joao Silva",
            "cpf": cpf,
            "phone": "61999990000",
            "email": "joao@example.com",
            "admission_date": "2010-01-01",
            "expected_retirement_date": "2025-01-01"
        })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::CREATED);
    reply.json()["id"].as_str().unwrap().to_string()
}

async fn create_case(app: &Router, token: &str, client_id: &str) -> String {
    let reply = call(
        app,
        Method::POST,
        "/api/cases",
        Some(token),
        Some(json!({
            "case_number": "0001234-56.2023.5.10.0001",
            "client_id": client_id,
            "thesis": "licenca-premio",
            "filing_date": "2024-02-01"
        })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::CREATED);
    reply.json()["id"].as_str().unwrap().to_string()
}

//=========================================================================================
// Authentication
//=========================================================================================

#[tokio::test]
async fn register_then_login_with_the_same_credentials() {
    let app = app();
    register(&app, "ana@example.com").await;

    let reply = call(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": "Ana@Example.com", "password": "s3cret-pass" })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::OK);
    let token = reply.json()["token"].as_str().unwrap().to_string();

    let me = call(&app, Method::GET, "/api/auth/me", Some(&token), None).await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.json()["email"], "ana@example.com");
}

#[tokio::test]
async fn second_registration_with_the_same_email_is_rejected() {
    let app = app();
    register(&app, "ana@example.com").await;
    let reply = call(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({ "email": "ana@example.com", "password": "other", "name": "Ana" })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.json()["error"], "user already exists");
}

#[tokio::test]
async fn wrong_password_and_unknown_email_look_the_same() {
    let app = app();
    register(&app, "ana@example.com").await;
    let wrong = call(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": "ana@example.com", "password": "nope" })),
    )
    .await;
    let unknown = call(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": "nobody@example.com", "password": "nope" })),
    )
    .await;
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong.json(), unknown.json());
}

#[tokio::test]
async fn protected_routes_require_a_valid_token() {
    let app = app();
    let missing = call(&app, Method::GET, "/api/clients", None, None).await;
    assert_eq!(missing.status, StatusCode::UNAUTHORIZED);
    let forged = call(&app, Method::GET, "/api/clients", Some("a.b.c"), None).await;
    assert_eq!(forged.status, StatusCode::UNAUTHORIZED);

    let health = call(&app, Method::GET, "/api/health", None, None).await;
    assert_eq!(health.status, StatusCode::OK);
    assert_eq!(health.json()["status"], "ok");
}

//=========================================================================================
// Ownership
//=========================================================================================

#[tokio::test]
async fn another_user_cannot_read_change_or_delete_a_client() {
    let app = app();
    let owner = register(&app, "owner@example.com").await;
    let intruder = register(&app, "intruder@example.com").await;
    let client_id = create_client(&app, &owner, "12345678901").await;
    let uri = format!("/api/clients/{}", client_id);

    let get = call(&app, Method::GET, &uri, Some(&intruder), None).await;
    assert_eq!(get.status, StatusCode::FORBIDDEN);
    let put = call(&app, Method::PUT, &uri, Some(&intruder), Some(json!({ "name": "X" }))).await;
    assert_eq!(put.status, StatusCode::FORBIDDEN);
    let delete = call(&app, Method::DELETE, &uri, Some(&intruder), None).await;
    assert_eq!(delete.status, StatusCode::FORBIDDEN);

    let still_there = call(&app, Method::GET, &uri, Some(&owner), None).await;
    assert_eq!(still_there.status, StatusCode::OK);
    assert_eq!(still_there.json()["name"], "Joao Silva");
}

#[tokio::test]
async fn another_user_cannot_read_change_or_delete_a_case() {
    let app = app();
    let owner = register(&app, "owner@example.com").await;
    let intruder = register(&app, "intruder@example.com").await;
    let client_id = create_client(&app, &owner, "12345678901").await;
    let case_id = create_case(&app, &owner, &client_id).await;
    let uri = format!("/api/cases/{}", case_id);

    let get = call(&app, Method::GET, &uri, Some(&intruder), None).await;
    assert_eq!(get.status, StatusCode::FORBIDDEN);
    let put = call(&app, Method::PUT, &uri, Some(&intruder), Some(json!({ "status": "arquivado" }))).await;
    assert_eq!(put.status, StatusCode::FORBIDDEN);
    let delete = call(&app, Method::DELETE, &uri, Some(&intruder), None).await;
    assert_eq!(delete.status, StatusCode::FORBIDDEN);

    // A case cannot be opened against someone else's client either.
    let reply = call(
        &app,
        Method::POST,
        "/api/cases",
        Some(&intruder),
        Some(json!({
            "case_number": "0009999-11.2024.5.10.0001",
            "client_id": client_id,
            "thesis": "gratificacao",
            "filing_date": "2024-05-01"
        })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn deleting_a_missing_row_is_not_found() {
    let app = app();
    let token = register(&app, "ana@example.com").await;
    let id = uuid::Uuid::new_v4();
    for resource in ["clients", "cases", "documents", "petitions", "responses", "opportunities"] {
        let reply = call(
            &app,
            Method::DELETE,
            &format!("/api/{}/{}", resource, id),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(reply.status, StatusCode::NOT_FOUND, "DELETE /api/{}", resource);
    }
    let reply = call(&app, Method::DELETE, "/api/clients/not-a-uuid", Some(&token), None).await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn duplicate_cpf_is_rejected() {
    let app = app();
    let token = register(&app, "ana@example.com").await;
    create_client(&app, &token, "12345678901").await;
    let reply = call(
        &app,
        Method::POST,
        "/api/clients",
        Some(&token),
        Some(json!({
            "name": "Outra Pessoa",
            "cpf": "12345678901",
            "phone": "61988880000",
            "email": "outra@example.com"
        })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn cpf_punctuation_does_not_bypass_uniqueness() {
    let app = app();
    let token = register(&app, "ana@example.com").await;
    let first = call(
        &app,
        Method::POST,
        "/api/clients",
        Some(&token),
        Some(json!({
            "name": "Joao Silva",
            "cpf": "123.456.789-09",
            "phone": "61999990000",
            "email": "joao@example.com"
        })),
    )
    .await;
    assert_eq!(first.status, StatusCode::CREATED);
    assert_eq!(first.json()["cpf"], "12345678909");

    let bare = call(
        &app,
        Method::POST,
        "/api/clients",
        Some(&token),
        Some(json!({
            "name": "Joao Silva",
            "cpf": "12345678909",
            "phone": "61999990000",
            "email": "joao@example.com"
        })),
    )
    .await;
    assert_eq!(bare.status, StatusCode::BAD_REQUEST);

    for cpf in ["1234567890", "111.111.111-11"] {
        let reply = call(
            &app,
            Method::POST,
            "/api/clients",
            Some(&token),
            Some(json!({
                "name": "Outra Pessoa",
                "cpf": cpf,
                "phone": "61988880000",
                "email": "outra@example.com"
            })),
        )
        .await;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST, "cpf {}", cpf);
    }

    let id = first.json()["id"].as_str().unwrap().to_string();
    let update = call(
        &app,
        Method::PUT,
        &format!("/api/clients/{}", id),
        Some(&token),
        Some(json!({ "cpf": "987.654.321-00" })),
    )
    .await;
    assert_eq!(update.status, StatusCode::OK);
    assert_eq!(update.json()["cpf"], "98765432100");
}

/// Creates one row of every remaining owned resource and returns the item uri
/// with a body accepted by its update route.
async fn owned_rows(app: &Router, token: &str) -> Vec<(String, Method, Value)> {
    let client_id = create_client(app, token, "12345678901").await;
    let case_id = create_case(app, token, &client_id).await;
    let mut rows = Vec::new();

    let document = call(
        app,
        Method::POST,
        "/api/documents",
        Some(token),
        Some(json!({ "client_id": client_id, "file_name": "rg.pdf" })),
    )
    .await;
    assert_eq!(document.status, StatusCode::CREATED);
    rows.push((
        format!("/api/documents/{}", document.json()["id"].as_str().unwrap()),
        Method::PUT,
        json!({ "description": "X" }),
    ));

    let movement = call(
        app,
        Method::POST,
        "/api/finance/movements",
        Some(token),
        Some(json!({
            "date": "2025-01-10",
            "description": "Honorarios",
            "kind": "inflow",
            "amount": 500.0,
            "category": "honorarios",
            "case_id": case_id
        })),
    )
    .await;
    assert_eq!(movement.status, StatusCode::CREATED);
    rows.push((
        format!("/api/finance/movements/{}", movement.json()["id"].as_str().unwrap()),
        Method::PUT,
        json!({ "amount": 1.0 }),
    ));

    let rpv = call(
        app,
        Method::POST,
        "/api/finance/rpvs",
        Some(token),
        Some(json!({
            "client_id": client_id,
            "case_id": case_id,
            "expected_date": "2030-06-01",
            "amount": 12000.0
        })),
    )
    .await;
    assert_eq!(rpv.status, StatusCode::CREATED);
    rows.push((
        format!("/api/finance/rpvs/{}", rpv.json()["id"].as_str().unwrap()),
        Method::PUT,
        json!({ "status": "received" }),
    ));

    let petition = call(
        app,
        Method::POST,
        "/api/petitions",
        Some(token),
        Some(json!({
            "kind": "replica",
            "thesis": "licenca-premio",
            "client_name": "Joao Silva",
            "case_number": "0001234-56.2023.5.10.0001",
            "content": "EXCELENTISSIMO SENHOR JUIZ"
        })),
    )
    .await;
    assert_eq!(petition.status, StatusCode::CREATED);
    rows.push((
        format!("/api/petitions/{}", petition.json()["id"].as_str().unwrap()),
        Method::PUT,
        json!({ "content": "X" }),
    ));

    let response = call(
        app,
        Method::POST,
        "/api/responses/generate",
        Some(token),
        Some(json!({ "client_id": client_id, "question": "Prazo?", "kind": "deadlines" })),
    )
    .await;
    assert_eq!(response.status, StatusCode::CREATED);
    rows.push((
        format!(
            "/api/responses/{}",
            response.json()["communication"]["id"].as_str().unwrap()
        ),
        Method::PUT,
        json!({ "body": "X" }),
    ));

    let analysis = call(
        app,
        Method::POST,
        "/api/opportunities/analyze-client",
        Some(token),
        Some(json!({ "client_id": client_id })),
    )
    .await;
    assert_eq!(analysis.status, StatusCode::OK);
    let opportunity = format!(
        "/api/opportunities/{}",
        analysis.json()["saved"][0]["id"].as_str().unwrap()
    );
    rows.push((opportunity, Method::PUT, json!({ "status": "analyzed" })));

    rows
}

#[tokio::test]
async fn another_user_cannot_touch_any_owned_resource() {
    let app = app();
    let owner = register(&app, "owner@example.com").await;
    let intruder = register(&app, "intruder@example.com").await;

    for (uri, update, body) in owned_rows(&app, &owner).await {
        let update_uri = if uri.starts_with("/api/opportunities/") {
            format!("{}/status", uri)
        } else {
            uri.clone()
        };

        let get = call(&app, Method::GET, &uri, Some(&intruder), None).await;
        assert_eq!(get.status, StatusCode::FORBIDDEN, "GET {}", uri);
        let put = call(&app, update, &update_uri, Some(&intruder), Some(body)).await;
        assert_eq!(put.status, StatusCode::FORBIDDEN, "PUT {}", update_uri);
        let delete = call(&app, Method::DELETE, &uri, Some(&intruder), None).await;
        assert_eq!(delete.status, StatusCode::FORBIDDEN, "DELETE {}", uri);

        let kept = call(&app, Method::GET, &uri, Some(&owner), None).await;
        assert_eq!(kept.status, StatusCode::OK, "owner GET {}", uri);
        assert!(
            kept.json()["description"] != "X" && kept.json()["body"] != "X",
            "intruder changed {}",
            uri
        );
    }
}

#[tokio::test]
async fn client_detail_includes_cases_with_deadlines() {
    let app = app();
    let token = register(&app, "ana@example.com").await;
    let client_id = create_client(&app, &token, "12345678901").await;
    let case_id = create_case(&app, &token, &client_id).await;

    let reply = call(
        &app,
        Method::POST,
        &format!("/api/cases/{}/deadlines", case_id),
        Some(&token),
        Some(json!({ "due_date": "2020-01-10", "description": "Contrarrazoes" })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::CREATED);

    let detail = call(&app, Method::GET, &format!("/api/clients/{}", client_id), Some(&token), None).await;
    assert_eq!(detail.status, StatusCode::OK);
    let body = detail.json();
    assert_eq!(body["cases"][0]["id"], case_id.as_str());
    assert_eq!(body["cases"][0]["deadlines"][0]["description"], "Contrarrazoes");

    let dashboard = call(&app, Method::GET, "/api/dashboard", Some(&token), None).await;
    assert_eq!(dashboard.json()["overdue_deadlines"], 1);
    assert_eq!(dashboard.json()["active_cases"], 1);
}

//=========================================================================================
// Opportunities
//=========================================================================================

#[tokio::test]
async fn fifteen_year_servant_gets_licenca_premio_without_abono() {
    let app = app();
    let token = register(&app, "ana@example.com").await;
    let reply = call(
        &app,
        Method::POST,
        "/api/opportunities/analyze-client",
        Some(&token),
        Some(json!({
            "name": "Maria",
            "admission_date": "2010-01-01",
            "retirement_date": "2025-01-01",
            "salary": 6000.0
        })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::OK);
    let body = reply.json();
    let opportunities = body["opportunities"].as_array().unwrap();
    let licenca = opportunities
        .iter()
        .find(|o| o["thesis"] == "licenca-premio")
        .unwrap();
    assert_eq!(licenca["confidence"], 95.0);
    assert!(opportunities.iter().all(|o| o["thesis"] != "abono-permanencia"));
}

#[tokio::test]
async fn stored_analysis_persists_each_thesis_once() {
    let app = app();
    let token = register(&app, "ana@example.com").await;
    let client_id = create_client(&app, &token, "12345678901").await;
    let request = json!({ "client_id": client_id, "salary": 5000.0 });

    let first = call(&app, Method::POST, "/api/opportunities/analyze-client", Some(&token), Some(request.clone())).await;
    assert_eq!(first.status, StatusCode::OK);
    let saved = first.json()["saved"].as_array().unwrap().len();
    assert_eq!(saved, 4);

    let second = call(&app, Method::POST, "/api/opportunities/analyze-client", Some(&token), Some(request)).await;
    assert_eq!(second.json()["saved"].as_array().unwrap().len(), 0);

    let listed = call(&app, Method::GET, "/api/opportunities", Some(&token), None).await;
    let rows = listed.json();
    assert_eq!(rows.as_array().unwrap().len(), 4);

    let id = rows[0]["id"].as_str().unwrap().to_string();
    let filed = call(&app, Method::PUT, &format!("/api/opportunities/{}/file", id), Some(&token), None).await;
    assert_eq!(filed.status, StatusCode::OK);
    assert_eq!(filed.json()["status"], "filed");
    assert!(filed.json()["filed_at"].is_string());

    let back = call(
        &app,
        Method::PUT,
        &format!("/api/opportunities/{}/status", id),
        Some(&token),
        Some(json!({ "status": "new" })),
    )
    .await;
    assert_eq!(back.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn opportunity_report_falls_back_without_completion() {
    let app = app();
    let token = register(&app, "ana@example.com").await;
    let reply = call(
        &app,
        Method::POST,
        "/api/opportunities/report",
        Some(&token),
        Some(json!({ "opportunities": [] })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.json()["report"], "Relatorio nao disponivel");
}

//=========================================================================================
// Petitions and Documents
//=========================================================================================

#[tokio::test]
async fn generated_replica_is_the_template_with_substitutions() {
    let app = app();
    let token = register(&app, "ana@example.com").await;
    let reply = call(
        &app,
        Method::POST,
        "/api/petitions/generate",
        Some(&token),
        Some(json!({
            "kind": "replica",
            "thesis": "licenca-premio",
            "client_name": "Joao Silva",
            "case_number": "0001234-56.2023.5.10.0001"
        })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::CREATED);

    let expected = TemplateCatalog::default()
        .resolve("replica", "licenca-premio")
        .replace(CLIENT_PLACEHOLDER, "Joao Silva")
        .replace(CASE_PLACEHOLDER, "0001234-56.2023.5.10.0001");
    let body = reply.json();
    assert_eq!(body["petition"]["content"], expected.as_str());
    assert_eq!(body["petition"]["status"], "ready");
    assert_eq!(body["validation"]["valid"], true);
}

#[tokio::test]
async fn supplied_names_are_substituted_verbatim() {
    let app = app();
    let token = register(&app, "ana@example.com").await;
    let reply = call(
        &app,
        Method::POST,
        "/api/petitions/generate",
        Some(&token),
        Some(json!({
            "kind": "replica",
            "thesis": "licenca-premio",
            "client_name": "  Joao  ",
            "case_number": "0001234-56.2023.5.10.0001"
        })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::CREATED);
    let expected = TemplateCatalog::default()
        .resolve("replica", "licenca-premio")
        .replace(CLIENT_PLACEHOLDER, "  Joao  ")
        .replace(CASE_PLACEHOLDER, "0001234-56.2023.5.10.0001");
    assert_eq!(reply.json()["petition"]["content"], expected.as_str());

    let blank = call(
        &app,
        Method::POST,
        "/api/petitions/generate",
        Some(&token),
        Some(json!({
            "kind": "replica",
            "thesis": "licenca-premio",
            "client_name": "   ",
            "case_number": "0001234-56.2023.5.10.0001"
        })),
    )
    .await;
    assert_eq!(blank.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn additional_info_keeps_the_draft_when_completion_fails() {
    let app = app();
    let token = register(&app, "ana@example.com").await;
    let reply = call(
        &app,
        Method::POST,
        "/api/petitions/generate",
        Some(&token),
        Some(json!({
            "kind": "replica",
            "thesis": "abono-permanencia",
            "client_name": "Maria",
            "case_number": "0001234-56.2023.5.10.0001",
            "additional_info": "Servidora com 30 anos de contribuicao"
        })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::CREATED);
    let content = reply.json()["petition"]["content"].as_str().unwrap().to_string();
    assert!(content.contains("Maria"));
    assert!(!content.contains(CLIENT_PLACEHOLDER));

    let summary = call(
        &app,
        Method::POST,
        "/api/petitions/summary",
        Some(&token),
        Some(json!({ "content": content })),
    )
    .await;
    assert_eq!(summary.json()["summary"], "Resumo nao disponivel");
}

#[tokio::test]
async fn power_of_attorney_is_served_as_a_pdf_attachment() {
    let app = app();
    let token = register(&app, "ana@example.com").await;
    let reply = call(
        &app,
        Method::POST,
        "/api/documents/power-of-attorney",
        Some(&token),
        Some(json!({ "name": "Joao Silva", "cpf": "123.456.789-01", "rg": "1234567" })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.headers[header::CONTENT_TYPE], "application/pdf");
    assert_eq!(
        reply.headers[header::CONTENT_DISPOSITION],
        "attachment; filename=\"Procuracao.pdf\""
    );
    assert!(reply.bytes.starts_with(b"%PDF-1.4"));

    let missing_rg = call(
        &app,
        Method::POST,
        "/api/documents/service-contract",
        Some(&token),
        Some(json!({ "name": "Joao Silva", "cpf": "12345678901" })),
    )
    .await;
    assert_eq!(missing_rg.status, StatusCode::BAD_REQUEST);
}

//=========================================================================================
// Finance
//=========================================================================================

#[tokio::test]
async fn ledger_totals_and_pdf_report() {
    let app = app();
    let token = register(&app, "ana@example.com").await;
    let today = Local::now().date_naive().to_string();
    for (kind, amount) in [("inflow", 1000.0), ("outflow", 250.0)] {
        let reply = call(
            &app,
            Method::POST,
            "/api/finance/movements",
            Some(&token),
            Some(json!({
                "date": today,
                "description": "Honorarios",
                "kind": kind,
                "amount": amount,
                "category": "honorarios"
            })),
        )
        .await;
        assert_eq!(reply.status, StatusCode::CREATED);
    }
    let zero = call(
        &app,
        Method::POST,
        "/api/finance/movements",
        Some(&token),
        Some(json!({
            "date": today,
            "description": "Nada",
            "kind": "inflow",
            "amount": 0.0,
            "category": "outros"
        })),
    )
    .await;
    assert_eq!(zero.status, StatusCode::BAD_REQUEST);

    let stats = call(&app, Method::GET, "/api/finance/stats", Some(&token), None).await;
    assert_eq!(stats.json()["current_balance"], 750.0);
    assert_eq!(stats.json()["month_profit"], 750.0);

    let inflows = call(&app, Method::GET, "/api/finance/movements?kind=inflow", Some(&token), None).await;
    assert_eq!(inflows.json().as_array().unwrap().len(), 1);

    let report = call(&app, Method::GET, "/api/finance/report", Some(&token), None).await;
    assert_eq!(report.json()["net_profit"], 750.0);
    assert!(report.json()["generated_at"].is_string());

    let pdf = call(&app, Method::GET, "/api/finance/report?format=pdf", Some(&token), None).await;
    assert_eq!(pdf.status, StatusCode::OK);
    assert_eq!(
        pdf.headers[header::CONTENT_DISPOSITION],
        "attachment; filename=\"Relatorio_Financeiro.pdf\""
    );
}

#[tokio::test]
async fn rpv_status_cannot_move_backwards() {
    let app = app();
    let token = register(&app, "ana@example.com").await;
    let client_id = create_client(&app, &token, "12345678901").await;
    let case_id = create_case(&app, &token, &client_id).await;
    let created = call(
        &app,
        Method::POST,
        "/api/finance/rpvs",
        Some(&token),
        Some(json!({
            "client_id": client_id,
            "case_id": case_id,
            "expected_date": "2030-06-01",
            "amount": 12000.0
        })),
    )
    .await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.json()["status"], "pending");
    let uri = format!("/api/finance/rpvs/{}", created.json()["id"].as_str().unwrap());

    let received = call(&app, Method::PUT, &uri, Some(&token), Some(json!({ "status": "received" }))).await;
    assert_eq!(received.status, StatusCode::OK);
    let back = call(&app, Method::PUT, &uri, Some(&token), Some(json!({ "status": "pending" }))).await;
    assert_eq!(back.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn rpv_case_must_belong_to_the_named_client() {
    let app = app();
    let token = register(&app, "ana@example.com").await;
    let client_a = create_client(&app, &token, "12345678901").await;
    let client_b = create_client(&app, &token, "98765432100").await;
    let case_of_b = create_case(&app, &token, &client_b).await;

    let reply = call(
        &app,
        Method::POST,
        "/api/finance/rpvs",
        Some(&token),
        Some(json!({
            "client_id": client_a,
            "case_id": case_of_b,
            "expected_date": "2030-06-01",
            "amount": 12000.0
        })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.json()["error"], "case does not belong to the client");

    let listed = call(&app, Method::GET, "/api/finance/rpvs", Some(&token), None).await;
    assert!(listed.json().as_array().unwrap().is_empty());
}

//=========================================================================================
// Responses and Court
//=========================================================================================

#[tokio::test]
async fn canned_reply_uses_case_facts_and_reports_open_placeholders() {
    let app = app();
    let token = register(&app, "ana@example.com").await;
    let client_id = create_client(&app, &token, "12345678901").await;
    let case_id = create_case(&app, &token, &client_id).await;

    let reply = call(
        &app,
        Method::POST,
        "/api/responses/generate",
        Some(&token),
        Some(json!({
            "client_id": client_id,
            "case_id": case_id,
            "question": "Como esta meu processo?",
            "kind": "case_status",
            "fields": { "FASE": "instrucao" }
        })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::CREATED);
    let body = reply.json();
    let text = body["communication"]["body"].as_str().unwrap();
    assert!(text.contains("Prezado(a) Joao Silva"));
    assert!(text.contains("0001234-56.2023.5.10.0001"));
    assert!(text.contains("fase de instrucao"));
    let unresolved: Vec<&str> = body["unresolved"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap())
        .collect();
    assert!(unresolved.contains(&"DATA"));

    let id = body["communication"]["id"].as_str().unwrap();
    let sent = call(
        &app,
        Method::POST,
        &format!("/api/responses/{}/send", id),
        Some(&token),
        Some(json!({ "channel": "whatsapp" })),
    )
    .await;
    assert_eq!(sent.json()["status"], "sent");

    let pending = call(&app, Method::GET, "/api/responses?status=generated", Some(&token), None).await;
    assert_eq!(pending.json().as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn court_lookup_validates_input_and_summarizes() {
    let app = app();
    let token = register(&app, "ana@example.com").await;

    let bad = call(&app, Method::GET, "/api/court/cases/123", Some(&token), None).await;
    assert_eq!(bad.status, StatusCode::BAD_REQUEST);
    let bad_cpf = call(&app, Method::GET, "/api/court/cpf/11111111111", Some(&token), None).await;
    assert_eq!(bad_cpf.status, StatusCode::BAD_REQUEST);

    let ok = call(&app, Method::GET, "/api/court/cases/0001234-56.2023.5.10.0001", Some(&token), None).await;
    assert_eq!(ok.status, StatusCode::OK);
    assert!(ok.json()["summary"].as_str().unwrap().starts_with("Seu processo está em fase de"));

    let down = app_with_court(false);
    let token = register(&down, "ana@example.com").await;
    let reply = call(&down, Method::GET, "/api/court/cases/0001234-56.2023.5.10.0001", Some(&token), None).await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
}
