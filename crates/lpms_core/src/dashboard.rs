//! crates/lpms_core/src/dashboard.rs

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::{Case, Client, Deadline, Opportunity, OpportunityStatus, RpvForecast, RpvStatus};
use crate::finance::same_month;

/// Office overview shown on the landing page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardStats {
    pub total_clients: usize,
    pub total_cases: usize,
    pub active_cases: usize,
    pub overdue_deadlines: usize,
    pub new_opportunities: usize,
    pub expected_receipts_this_month: f64,
}

pub fn summarize(
    clients: &[Client],
    cases: &[Case],
    deadlines: &[Deadline],
    opportunities: &[Opportunity],
    rpvs: &[RpvForecast],
    today: NaiveDate,
) -> DashboardStats {
    DashboardStats {
        total_clients: clients.len(),
        total_cases: cases.len(),
        active_cases: cases.iter().filter(|c| c.is_active()).count(),
        overdue_deadlines: deadlines
            .iter()
            .filter(|d| !d.completed && d.due_date < today)
            .count(),
        new_opportunities: opportunities
            .iter()
            .filter(|o| o.status == OpportunityStatus::New)
            .count(),
        expected_receipts_this_month: rpvs
            .iter()
            .filter(|r| r.status == RpvStatus::Pending && same_month(r.expected_date, today))
            .map(|r| r.amount)
            .sum(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn deadline(due: &str, completed: bool) -> Deadline {
        Deadline {
            id: Uuid::new_v4(),
            case_id: Uuid::nil(),
            due_date: due.parse().unwrap(),
            description: "Prazo".to_string(),
            completed,
        }
    }

    #[test]
    fn overdue_ignores_completed_and_future_deadlines() {
        let deadlines = vec![
            deadline("2025-10-01", false),
            deadline("2025-10-01", true),
            deadline("2025-10-30", false),
        ];
        let stats = summarize(&[], &[], &deadlines, &[], &[], "2025-10-15".parse().unwrap());
        assert_eq!(stats.overdue_deadlines, 1);
        assert_eq!(stats.total_clients, 0);
        assert_eq!(stats.expected_receipts_this_month, 0.0);
    }
}
