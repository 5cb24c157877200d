//! crates/lpms_core/src/opportunity.rs
//!
//! Heuristic discovery of legal claims a client may be entitled to.
//!
//! Everything here is deterministic arithmetic over a fixed table of theses;
//! there is no learning and no external data.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::Thesis;
use crate::ports::CompletionService;

const DAYS_PER_YEAR: f64 = 365.25;

/// The facts about a client that discovery looks at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientProfile {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub cpf: Option<String>,
    pub admission_date: NaiveDate,
    pub retirement_date: NaiveDate,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub salary: f64,
}

impl ClientProfile {
    /// Years of service between admission and retirement.
    pub fn tenure_years(&self) -> f64 {
        tenure_years(self.admission_date, self.retirement_date)
    }
}

pub fn tenure_years(admission: NaiveDate, retirement: NaiveDate) -> f64 {
    (retirement - admission).num_days() as f64 / DAYS_PER_YEAR
}

/// A qualifying thesis for a client, before it is stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateOpportunity {
    pub id: String,
    pub thesis: Thesis,
    pub thesis_label: String,
    pub confidence: f64,
    pub rationale: String,
    pub required_documents: Vec<String>,
}

struct ThesisRule {
    thesis: Thesis,
    documents: &'static [&'static str],
}

const RULES: [ThesisRule; 5] = [
    ThesisRule {
        thesis: Thesis::LicencaPremio,
        documents: &["Contracheque", "Ficha Funcional", "Certidão de Tempo de Serviço"],
    },
    ThesisRule {
        thesis: Thesis::AbonoPermanencia,
        documents: &["Contracheque", "Certidão de Aposentadoria", "Comprovante de Contribuição"],
    },
    ThesisRule {
        thesis: Thesis::DiferencasSalariais,
        documents: &["Contracheque", "Folha de Pagamento", "Decreto de Reajuste"],
    },
    ThesisRule {
        thesis: Thesis::Gratificacao,
        documents: &["Contracheque", "Decreto de Gratificação"],
    },
    ThesisRule {
        thesis: Thesis::Indenizacao,
        documents: &["Documentação de Danos", "Comprovantes"],
    },
];

impl ThesisRule {
    /// Returns the confidence and rationale when the client qualifies.
    fn evaluate(&self, tenure: f64) -> Option<(f64, String)> {
        match self.thesis {
            Thesis::LicencaPremio if tenure >= 5.0 => Some((
                (50.0 + tenure * 5.0).min(95.0),
                format!("Cliente tem {tenure:.1} anos de serviço"),
            )),
            Thesis::AbonoPermanencia if tenure >= 25.0 => Some((
                (70.0 + (tenure - 25.0) * 2.0).min(95.0),
                "Cliente se enquadra nos critérios de aposentadoria".to_string(),
            )),
            Thesis::DiferencasSalariais => Some((
                60.0,
                "Possível diferença entre salário recebido e salário devido".to_string(),
            )),
            Thesis::Gratificacao => Some((
                55.0,
                "Possível direito a gratificações não recebidas".to_string(),
            )),
            Thesis::Indenizacao => Some((
                40.0,
                "Possível direito a indenizações por danos".to_string(),
            )),
            Thesis::LicencaPremio | Thesis::AbonoPermanencia => None,
        }
    }
}

/// Runs every thesis rule against the client and returns the qualifying ones,
/// highest confidence first.
pub fn discover(profile: &ClientProfile) -> Vec<CandidateOpportunity> {
    let tenure = profile.tenure_years();
    let mut found: Vec<CandidateOpportunity> = RULES
        .iter()
        .filter_map(|rule| {
            let (confidence, rationale) = rule.evaluate(tenure)?;
            Some(CandidateOpportunity {
                id: format!("{}-{}", profile.id, rule.thesis.slug()),
                thesis: rule.thesis,
                thesis_label: rule.thesis.label().to_string(),
                confidence,
                rationale,
                required_documents: rule.documents.iter().map(|d| d.to_string()).collect(),
            })
        })
        .collect();
    found.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    found
}

/// Rough amount a claim could recover, from the client's monthly salary.
pub fn potential_value(thesis: Thesis, salary: f64) -> f64 {
    match thesis {
        Thesis::LicencaPremio => (salary / 3.0) * 30.0,
        Thesis::AbonoPermanencia => salary * 0.1 * 12.0,
        Thesis::DiferencasSalariais => salary * 0.05 * 12.0,
        Thesis::Gratificacao => salary * 0.15,
        Thesis::Indenizacao => salary * 3.0,
    }
}

/// Blends confidence (70%) with the value relative to salary (30 points per salary).
pub fn priority_score(thesis: Thesis, confidence: f64, salary: f64) -> f64 {
    let value_weight = if salary > 0.0 {
        potential_value(thesis, salary) / salary * 30.0
    } else {
        0.0
    };
    confidence * 0.7 + value_weight
}

/// Reorders opportunities by priority score, highest first.
pub fn prioritize(mut opportunities: Vec<CandidateOpportunity>, salary: f64) -> Vec<CandidateOpportunity> {
    opportunities.sort_by(|a, b| {
        let sa = priority_score(a.thesis, a.confidence, salary);
        let sb = priority_score(b.thesis, b.confidence, salary);
        sb.total_cmp(&sa)
    });
    opportunities
}

pub const REPORT_FALLBACK: &str = "Relatorio nao disponivel";

/// Narrative analysis of a set of opportunities; falls back to a fixed notice.
pub async fn report(completion: &dyn CompletionService, opportunities: &[CandidateOpportunity]) -> String {
    let listing: String = opportunities
        .iter()
        .map(|o| format!("- {} ({:.0}%): {}\n", o.thesis_label, o.confidence, o.rationale))
        .collect();
    let prompt = format!(
        "Voce e um advogado especialista. Analise as seguintes oportunidades de acoes juridicas \
         e indique quais devem ser priorizadas e por que:\n\n{listing}"
    );
    match completion.complete(&prompt, 1000).await {
        Ok(text) if !text.trim().is_empty() => text,
        Ok(_) => REPORT_FALLBACK.to_string(),
        Err(e) => {
            warn!("Opportunity report unavailable: {}", e);
            REPORT_FALLBACK.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(admission: &str, retirement: &str) -> ClientProfile {
        ClientProfile {
            id: "c1".to_string(),
            name: "Maria".to_string(),
            cpf: None,
            admission_date: admission.parse().unwrap(),
            retirement_date: retirement.parse().unwrap(),
            position: None,
            salary: 6000.0,
        }
    }

    #[test]
    fn fifteen_years_caps_licenca_premio_and_skips_abono() {
        let found = discover(&profile("2010-01-01", "2025-01-01"));
        let licenca = found
            .iter()
            .find(|o| o.thesis == Thesis::LicencaPremio)
            .expect("licenca-premio should qualify");
        assert_eq!(licenca.confidence, 95.0);
        assert_eq!(licenca.thesis_label, "Licença-Prêmio");
        assert_eq!(licenca.id, "c1-licenca-premio");
        assert!(found.iter().all(|o| o.thesis != Thesis::AbonoPermanencia));
    }

    #[test]
    fn results_are_sorted_by_descending_confidence() {
        let found = discover(&profile("1995-03-01", "2024-03-01"));
        let confidences: Vec<f64> = found.iter().map(|o| o.confidence).collect();
        let mut sorted = confidences.clone();
        sorted.sort_by(|a, b| b.total_cmp(a));
        assert_eq!(confidences, sorted);
        assert_eq!(found.len(), 5);
    }

    #[test]
    fn abono_confidence_grows_with_tenure_past_25() {
        let found = discover(&profile("1994-01-01", "2024-01-01"));
        let abono = found
            .iter()
            .find(|o| o.thesis == Thesis::AbonoPermanencia)
            .unwrap();
        let tenure = tenure_years("1994-01-01".parse().unwrap(), "2024-01-01".parse().unwrap());
        assert!((abono.confidence - (70.0 + (tenure - 25.0) * 2.0)).abs() < 1e-9);
    }

    #[test]
    fn short_tenure_only_yields_unconditional_theses() {
        let found = discover(&profile("2022-01-01", "2024-01-01"));
        let theses: Vec<Thesis> = found.iter().map(|o| o.thesis).collect();
        assert_eq!(
            theses,
            vec![Thesis::DiferencasSalariais, Thesis::Gratificacao, Thesis::Indenizacao]
        );
    }

    #[test]
    fn prioritize_weighs_value_against_salary() {
        let found = discover(&profile("2022-01-01", "2024-01-01"));
        let ordered = prioritize(found, 5000.0);
        // indenizacao: 40*0.7 + 3*30 = 118; diferencas: 42 + 18 = 60; gratificacao: 38.5 + 4.5 = 43
        let theses: Vec<Thesis> = ordered.iter().map(|o| o.thesis).collect();
        assert_eq!(
            theses,
            vec![Thesis::Indenizacao, Thesis::DiferencasSalariais, Thesis::Gratificacao]
        );
    }

    #[test]
    fn zero_salary_falls_back_to_confidence_order() {
        let found = discover(&profile("2022-01-01", "2024-01-01"));
        let ordered = prioritize(found.clone(), 0.0);
        assert_eq!(ordered, found);
    }

    struct Unavailable;

    #[async_trait::async_trait]
    impl CompletionService for Unavailable {
        async fn complete(
            &self,
            _prompt: &str,
            _max_tokens: u32,
        ) -> Result<String, crate::ports::ExternalServiceError> {
            Err(crate::ports::ExternalServiceError::NotConfigured)
        }
    }

    #[tokio::test]
    async fn report_falls_back_when_completion_is_unavailable() {
        let found = discover(&profile("2010-01-01", "2025-01-01"));
        assert_eq!(report(&Unavailable, &found).await, REPORT_FALLBACK);
    }
}
