//! Plan quality metrics (KPIs).
//!
//! Summarizes a finished plan the way a student dashboard reads it.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Placed / Unplaced / Approved | Course counts |
//! | Total Hours | Sum of assigned hours |
//! | Terms Used | Terms with at least one assignment |
//! | Last Term | Latest term with an assignment |
//! | Completion Rate | placed / (placed + unplaced) |
//! | Avg Load | Mean of hours / cap over used terms |
//! | Max Load | Largest hours / cap of any term |

use std::collections::BTreeMap;

use crate::models::{Plan, Preferences, TermId};

/// Plan performance indicators.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanKpi {
    /// Number of assignments.
    pub placed: usize,
    /// Number of unplaced courses.
    pub unplaced: usize,
    /// Number of approved courses.
    pub approved: usize,
    /// Sum of hours across all terms.
    pub total_hours: u32,
    /// Hours per term, for every horizon term.
    pub hours_by_term: BTreeMap<TermId, u32>,
    /// Terms with at least one assignment.
    pub terms_used: usize,
    /// Latest term with an assignment.
    pub last_term: Option<TermId>,
    /// Fraction of planned courses that were placed (0.0..=1.0).
    pub completion_rate: f64,
    /// Mean load ratio over used terms (0.0..=1.0).
    pub avg_load: f64,
    /// Highest load ratio of any term (0.0..=1.0).
    pub max_load: f64,
}

impl PlanKpi {
    /// Computes KPIs for a plan under the preferences it was built with.
    pub fn calculate(plan: &Plan, preferences: &Preferences) -> Self {
        let cap = f64::from(preferences.hour_cap());
        let placed = plan.assignment_count();
        let unplaced = plan.unplaced.len();

        let hours_by_term: BTreeMap<TermId, u32> =
            plan.terms.iter().map(|t| (t.term, t.total_hours)).collect();

        let used: Vec<u32> = plan
            .terms
            .iter()
            .filter(|t| !t.is_empty())
            .map(|t| t.total_hours)
            .collect();

        let avg_load = if used.is_empty() {
            0.0
        } else {
            used.iter().map(|&h| f64::from(h) / cap).sum::<f64>() / used.len() as f64
        };
        let max_load = used
            .iter()
            .map(|&h| f64::from(h) / cap)
            .fold(0.0, f64::max);

        let completion_rate = if placed + unplaced == 0 {
            1.0
        } else {
            placed as f64 / (placed + unplaced) as f64
        };

        Self {
            placed,
            unplaced,
            approved: plan.approved.len(),
            total_hours: plan.total_hours(),
            hours_by_term,
            terms_used: used.len(),
            last_term: plan.last_used_term(),
            completion_rate,
            avg_load,
            max_load,
        }
    }

    /// Whether the plan finishes within `max_terms` terms and places at
    /// least `min_completion` of its courses.
    pub fn meets_thresholds(&self, max_terms: usize, min_completion: f64) -> bool {
        self.terms_used <= max_terms && self.completion_rate >= min_completion
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        Assignment, Course, ScheduleOption, TermSchedule, UnplacedCourse, UnplacedReason,
    };

    fn plan() -> Plan {
        let option = ScheduleOption::parse(&["Lunes"], "14:00-18:00").unwrap();
        let terms: Vec<TermSchedule> = [(1, 1), (1, 2), (2, 1)]
            .into_iter()
            .map(|(y, h)| TermSchedule::new(TermId::new(y, h)))
            .collect();
        let mut plan = Plan {
            terms,
            unplaced: vec![UnplacedCourse {
                course: Course::new(9, "X"),
                reason: UnplacedReason::HorizonExhausted,
            }],
            approved: vec![7],
            rejected_locks: Vec::new(),
        };
        let t1 = TermId::new(1, 1);
        let t2 = TermId::new(1, 2);
        plan.terms[0].push(Assignment::new(1, t1, option.clone(), 128));
        plan.terms[0].push(Assignment::new(2, t1, option.clone(), 64));
        plan.terms[1].push(Assignment::new(3, t2, option, 96));
        plan
    }

    #[test]
    fn test_kpi_basic() {
        let kpi = PlanKpi::calculate(&plan(), &Preferences::new(192));
        assert_eq!(kpi.placed, 3);
        assert_eq!(kpi.unplaced, 1);
        assert_eq!(kpi.approved, 1);
        assert_eq!(kpi.total_hours, 288);
        assert_eq!(kpi.terms_used, 2);
        assert_eq!(kpi.last_term, Some(TermId::new(1, 2)));
        assert_eq!(kpi.hours_by_term[&TermId::new(2, 1)], 0);
        assert!((kpi.completion_rate - 0.75).abs() < 1e-10);
    }

    #[test]
    fn test_kpi_load() {
        let kpi = PlanKpi::calculate(&plan(), &Preferences::new(192));
        // 192/192 = 1.0, 96/192 = 0.5
        assert!((kpi.max_load - 1.0).abs() < 1e-10);
        assert!((kpi.avg_load - 0.75).abs() < 1e-10);
    }

    #[test]
    fn test_kpi_empty() {
        let kpi = PlanKpi::calculate(&Plan::default(), &Preferences::default());
        assert_eq!(kpi.placed, 0);
        assert_eq!(kpi.last_term, None);
        assert!((kpi.completion_rate - 1.0).abs() < 1e-10);
        assert!((kpi.avg_load - 0.0).abs() < 1e-10);
    }

    #[test]
    fn test_meets_thresholds() {
        let kpi = PlanKpi::calculate(&plan(), &Preferences::new(192));
        assert!(kpi.meets_thresholds(2, 0.75));
        assert!(!kpi.meets_thresholds(1, 0.75));
        assert!(!kpi.meets_thresholds(2, 0.8));
    }
}
