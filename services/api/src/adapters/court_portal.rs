//! services/api/src/adapters/court_portal.rs
//!
//! Public case lookup on the court's consultation portal.
//!
//! The portal only serves HTML. The request is made for real, but the page is
//! not parsed yet: a successful response yields fixed sample data.

use async_trait::async_trait;
use chrono::{Days, Local, NaiveDate};
use lpms_core::court::{CourtCase, CourtMovement};
use lpms_core::ports::{CourtPortalService, ExternalServiceError};
use std::time::Duration;
use tracing::{debug, instrument};

const LIST_VIEW_PATH: &str = "/ConsultaPublica/listView.seam";

#[derive(Clone)]
pub struct HttpCourtPortal {
    client: reqwest::Client,
    base_url: String,
}

impl HttpCourtPortal {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ExternalServiceError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ExternalServiceError::Request(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    async fn fetch_page(&self, param: &str, value: &str) -> Result<String, ExternalServiceError> {
        let url = format!("{}{}", self.base_url, LIST_VIEW_PATH);
        let response = self
            .client
            .get(&url)
            .query(&[(param, value)])
            .send()
            .await
            .map_err(request_error)?;

        if !response.status().is_success() {
            return Err(ExternalServiceError::Request(format!(
                "portal answered {}",
                response.status()
            )));
        }
        response.text().await.map_err(request_error)
    }
}

fn request_error(e: reqwest::Error) -> ExternalServiceError {
    if e.is_timeout() {
        ExternalServiceError::Timeout
    } else {
        ExternalServiceError::Request(e.to_string())
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Sample record standing in for the parsed detail page.
pub fn sample_case(case_number: &str, today: NaiveDate) -> CourtCase {
    CourtCase {
        case_number: case_number.to_string(),
        status: "Aguardando Sentença".to_string(),
        last_update: "Despacho do Juiz".to_string(),
        last_update_date: today,
        tribunal: "TRT 10ª Região (DF/TO)".to_string(),
        division: "Juizado Especial da Fazenda Pública".to_string(),
        movements: vec![
            CourtMovement {
                date: today,
                description: "Despacho do Juiz".to_string(),
                kind: "DESPACHO".to_string(),
            },
            CourtMovement {
                date: today.checked_sub_days(Days::new(7)).unwrap_or(today),
                description: "Petição recebida".to_string(),
                kind: "PETIÇÃO".to_string(),
            },
        ],
    }
}

/// Sample list standing in for the parsed search page.
pub fn sample_listing(today: NaiveDate) -> Vec<CourtCase> {
    let mut case = sample_case("0001234-56.2023.5.10.0001", today);
    case.movements.clear();
    vec![case]
}

#[async_trait]
impl CourtPortalService for HttpCourtPortal {
    #[instrument(skip(self))]
    async fn lookup_case(&self, case_number: &str) -> Result<CourtCase, ExternalServiceError> {
        let page = self.fetch_page("numeroProcesso", case_number).await?;
        debug!("Court portal returned {} bytes", page.len());
        Ok(sample_case(case_number, today()))
    }

    #[instrument(skip(self, cpf))]
    async fn lookup_by_cpf(&self, cpf: &str) -> Result<Vec<CourtCase>, ExternalServiceError> {
        let page = self.fetch_page("cpf", cpf).await?;
        debug!("Court portal returned {} bytes", page.len());
        Ok(sample_listing(today()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_case_keeps_the_requested_number() {
        let today = NaiveDate::from_ymd_opt(2025, 10, 28).unwrap();
        let case = sample_case("0007654-32.2024.8.07.0016", today);
        assert_eq!(case.case_number, "0007654-32.2024.8.07.0016");
        assert_eq!(case.movements.len(), 2);
        assert_eq!(case.movements[1].date, NaiveDate::from_ymd_opt(2025, 10, 21).unwrap());
    }

    #[test]
    fn trailing_slash_is_dropped_from_the_base() {
        let portal = HttpCourtPortal::new("https://portal.example/", Duration::from_secs(1)).unwrap();
        assert_eq!(portal.base_url, "https://portal.example");
    }
}
