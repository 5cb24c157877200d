//! crates/lpms_core/src/finance.rs
//!
//! Aggregations over the ledger and the RPV forecasts.

use chrono::{Datelike, Days, NaiveDate};
use serde::Serialize;

use crate::domain::{Case, FinancialMovement, MovementKind, RpvForecast, RpvStatus};

/// How far ahead a case deadline counts as upcoming.
pub const UPCOMING_DEADLINE_DAYS: u64 = 7;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinanceStats {
    pub current_balance: f64,
    pub month_inflow: f64,
    pub month_outflow: f64,
    pub month_profit: f64,
    pub pending_rpvs: usize,
    pub pending_rpv_value: f64,
    pub cases_with_upcoming_deadline: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinanceReport {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub total_inflow: f64,
    pub total_outflow: f64,
    pub net_profit: f64,
    pub pending_rpv_value: f64,
    pub active_cases: usize,
    pub movement_count: usize,
}

/// Optional criteria for listing ledger entries.
#[derive(Debug, Clone, Default)]
pub struct MovementFilter {
    pub kind: Option<MovementKind>,
    pub category: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl MovementFilter {
    pub fn matches(&self, movement: &FinancialMovement) -> bool {
        self.kind.map_or(true, |k| movement.kind == k)
            && self
                .category
                .as_deref()
                .map_or(true, |c| movement.category.eq_ignore_ascii_case(c))
            && in_range(movement.date, self.from, self.to)
    }
}

#[derive(Debug, Clone, Default)]
pub struct RpvFilter {
    pub status: Option<RpvStatus>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl RpvFilter {
    pub fn matches(&self, rpv: &RpvForecast) -> bool {
        self.status.map_or(true, |s| rpv.status == s) && in_range(rpv.expected_date, self.from, self.to)
    }
}

/// Inclusive on both ends; a missing bound is open.
pub fn in_range(date: NaiveDate, from: Option<NaiveDate>, to: Option<NaiveDate>) -> bool {
    from.map_or(true, |f| date >= f) && to.map_or(true, |t| date <= t)
}

pub fn same_month(a: NaiveDate, b: NaiveDate) -> bool {
    a.year() == b.year() && a.month() == b.month()
}

fn totals<'a>(movements: impl Iterator<Item = &'a FinancialMovement>) -> (f64, f64) {
    movements.fold((0.0, 0.0), |(inflow, outflow), m| match m.kind {
        MovementKind::Inflow => (inflow + m.amount, outflow),
        MovementKind::Outflow => (inflow, outflow + m.amount),
    })
}

fn pending(rpvs: &[RpvForecast]) -> impl Iterator<Item = &RpvForecast> {
    rpvs.iter().filter(|r| r.status == RpvStatus::Pending)
}

pub fn stats(
    movements: &[FinancialMovement],
    rpvs: &[RpvForecast],
    cases: &[Case],
    today: NaiveDate,
) -> FinanceStats {
    let current_balance = movements.iter().map(FinancialMovement::signed_amount).sum();
    let (month_inflow, month_outflow) = totals(movements.iter().filter(|m| same_month(m.date, today)));
    let horizon = today
        .checked_add_days(Days::new(UPCOMING_DEADLINE_DAYS))
        .unwrap_or(today);
    let cases_with_upcoming_deadline = cases
        .iter()
        .filter(|c| c.next_deadline.is_some_and(|d| d >= today && d <= horizon))
        .count();

    FinanceStats {
        current_balance,
        month_inflow,
        month_outflow,
        month_profit: month_inflow - month_outflow,
        pending_rpvs: pending(rpvs).count(),
        pending_rpv_value: pending(rpvs).map(|r| r.amount).sum(),
        cases_with_upcoming_deadline,
    }
}

pub fn report(
    movements: &[FinancialMovement],
    rpvs: &[RpvForecast],
    cases: &[Case],
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> FinanceReport {
    let in_period: Vec<&FinancialMovement> = movements
        .iter()
        .filter(|m| in_range(m.date, from, to))
        .collect();
    let (total_inflow, total_outflow) = totals(in_period.iter().copied());

    FinanceReport {
        from,
        to,
        total_inflow,
        total_outflow,
        net_profit: total_inflow - total_outflow,
        pending_rpv_value: pending(rpvs).map(|r| r.amount).sum(),
        active_cases: cases.iter().filter(|c| c.is_active()).count(),
        movement_count: in_period.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn movement(on: &str, kind: MovementKind, amount: f64, category: &str) -> FinancialMovement {
        FinancialMovement {
            id: Uuid::new_v4(),
            owner_id: Uuid::nil(),
            date: date(on),
            description: "x".to_string(),
            kind,
            amount,
            category: category.to_string(),
            case_id: None,
            created_at: Utc::now(),
        }
    }

    fn rpv(status: RpvStatus, amount: f64) -> RpvForecast {
        RpvForecast {
            id: Uuid::new_v4(),
            owner_id: Uuid::nil(),
            client_id: Uuid::nil(),
            case_id: Uuid::nil(),
            expected_date: date("2025-11-15"),
            amount,
            thesis: None,
            status,
            created_at: Utc::now(),
        }
    }

    fn case_with_deadline(deadline: Option<&str>, status: &str) -> Case {
        Case {
            id: Uuid::new_v4(),
            owner_id: Uuid::nil(),
            client_id: Uuid::nil(),
            case_number: "0001234-56.2023.5.10.0001".to_string(),
            thesis: "licenca-premio".to_string(),
            description: None,
            filing_date: date("2024-01-10"),
            status: status.to_string(),
            court: None,
            court_division: None,
            next_deadline: deadline.map(date),
            deadline_description: None,
            client_dependency: None,
            office_dependency: None,
            estimated_value: None,
            judgment_value: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn stats_split_month_from_overall_balance() {
        let movements = vec![
            movement("2025-09-30", MovementKind::Inflow, 1000.0, "Honorarios"),
            movement("2025-10-02", MovementKind::Inflow, 5000.0, "Honorarios"),
            movement("2025-10-05", MovementKind::Outflow, 3000.0, "Aluguel"),
        ];
        let rpvs = vec![rpv(RpvStatus::Pending, 25000.0), rpv(RpvStatus::Received, 1.0)];
        let cases = vec![
            case_with_deadline(Some("2025-10-20"), "ativo"),
            case_with_deadline(Some("2025-11-30"), "ativo"),
            case_with_deadline(Some("2025-10-01"), "ativo"),
            case_with_deadline(None, "ativo"),
        ];
        let s = stats(&movements, &rpvs, &cases, date("2025-10-15"));
        assert_eq!(s.current_balance, 3000.0);
        assert_eq!(s.month_inflow, 5000.0);
        assert_eq!(s.month_outflow, 3000.0);
        assert_eq!(s.month_profit, 2000.0);
        assert_eq!(s.pending_rpvs, 1);
        assert_eq!(s.pending_rpv_value, 25000.0);
        assert_eq!(s.cases_with_upcoming_deadline, 1);
    }

    #[test]
    fn report_limits_movements_to_the_period() {
        let movements = vec![
            movement("2025-01-15", MovementKind::Inflow, 100.0, "Honorarios"),
            movement("2025-02-15", MovementKind::Outflow, 40.0, "Custas"),
            movement("2025-03-15", MovementKind::Inflow, 900.0, "Honorarios"),
        ];
        let cases = vec![case_with_deadline(None, "ativo"), case_with_deadline(None, "arquivado")];
        let r = report(&movements, &[], &cases, Some(date("2025-01-01")), Some(date("2025-02-28")));
        assert_eq!(r.total_inflow, 100.0);
        assert_eq!(r.total_outflow, 40.0);
        assert_eq!(r.net_profit, 60.0);
        assert_eq!(r.movement_count, 2);
        assert_eq!(r.active_cases, 1);
    }

    #[test]
    fn movement_filter_combines_criteria() {
        let m = movement("2025-10-02", MovementKind::Outflow, 3000.0, "Aluguel");
        let filter = MovementFilter {
            kind: Some(MovementKind::Outflow),
            category: Some("aluguel".to_string()),
            from: Some(date("2025-10-01")),
            to: None,
        };
        assert!(filter.matches(&m));
        let wrong_kind = MovementFilter {
            kind: Some(MovementKind::Inflow),
            ..MovementFilter::default()
        };
        assert!(!wrong_kind.matches(&m));
    }
}
