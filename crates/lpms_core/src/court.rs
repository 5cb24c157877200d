//! crates/lpms_core/src/court.rs
//!
//! Input validation and summaries for the external court-status lookup.

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// A case as reported by the court portal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourtCase {
    pub case_number: String,
    pub status: String,
    pub last_update: String,
    pub last_update_date: NaiveDate,
    pub tribunal: String,
    pub division: String,
    pub movements: Vec<CourtMovement>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourtMovement {
    pub date: NaiveDate,
    pub description: String,
    pub kind: String,
}

fn case_number_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // NNNNNNN-DD.AAAA.J.TT.OOOO
    PATTERN.get_or_init(|| {
        Regex::new(r"^\d{7}-\d{2}\.\d{4}\.\d\.\d{2}\.\d{4}$").expect("case number pattern is valid")
    })
}

/// Checks the unified case-number layout. No check digits are verified.
pub fn validate_case_number(case_number: &str) -> bool {
    case_number_pattern().is_match(case_number)
}

/// Strips punctuation and checks length and digit repetition.
///
/// The CPF check digits are not verified.
pub fn validate_cpf(cpf: &str) -> bool {
    let digits: Vec<char> = cpf.chars().filter(char::is_ascii_digit).collect();
    if digits.len() != 11 {
        return false;
    }
    digits.iter().any(|d| *d != digits[0])
}

/// CPF reduced to its digits.
pub fn normalize_cpf(cpf: &str) -> String {
    cpf.chars().filter(char::is_ascii_digit).collect()
}

/// A short plain-language description of where a case stands.
pub fn render_case_summary(case: &CourtCase) -> String {
    format!(
        "Seu processo está em fase de {}.\nO último andamento foi \"{}\" em {}.\nO processo tramita no {}.\nAcompanhe regularmente para não perder prazos importantes.",
        case.status.to_lowercase(),
        case.last_update,
        case.last_update_date.format("%d/%m/%Y"),
        case.tribunal,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn case_number_layout() {
        assert!(validate_case_number("0001234-56.2023.5.10.0001"));
        assert!(!validate_case_number("0001234-56.2023.5.10.001"));
        assert!(!validate_case_number("1234-56.2023.5.10.0001"));
        assert!(!validate_case_number(" 0001234-56.2023.5.10.0001"));
    }

    #[test]
    fn cpf_length_and_repetition() {
        assert!(validate_cpf("123.456.789-09"));
        assert!(validate_cpf("12345678909"));
        assert!(!validate_cpf("111.111.111-11"));
        assert!(!validate_cpf("1234567890"));
        assert_eq!(normalize_cpf("123.456.789-09"), "12345678909");
    }

    #[test]
    fn summary_mentions_status_update_and_tribunal() {
        let case = CourtCase {
            case_number: "0001234-56.2023.5.10.0001".to_string(),
            status: "Aguardando Sentença".to_string(),
            last_update: "Despacho do Juiz".to_string(),
            last_update_date: NaiveDate::from_ymd_opt(2025, 10, 28).unwrap(),
            tribunal: "TRT 10ª Região (DF/TO)".to_string(),
            division: "Juizado Especial da Fazenda Pública".to_string(),
            movements: Vec::new(),
        };
        let summary = render_case_summary(&case);
        assert!(summary.starts_with("Seu processo está em fase de aguardando sentença."));
        assert!(summary.contains("\"Despacho do Juiz\" em 28/10/2025"));
        assert!(summary.contains("tramita no TRT 10ª Região (DF/TO)."));
    }
}
