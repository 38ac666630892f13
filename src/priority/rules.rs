//! Built-in priority rules.
//!
//! All rules return lower scores for courses that should be placed first.

use super::{PriorityContext, PriorityRule, RuleScore};
use crate::models::Course;

/// Catalog order. Equivalent to having no rule at all, but useful as an
/// explicit tie-breaker ahead of later rules.
#[derive(Debug, Clone, Copy)]
pub struct CatalogOrder;

impl PriorityRule for CatalogOrder {
    fn name(&self) -> &'static str {
        "CATALOG_ORDER"
    }

    fn evaluate(&self, course: &Course, context: &PriorityContext) -> RuleScore {
        context.position_of(course.id) as f64
    }

    fn description(&self) -> &'static str {
        "Catalog insertion order"
    }
}

/// More prerequisites first.
#[derive(Debug, Clone, Copy)]
pub struct MostCorrelatives;

impl PriorityRule for MostCorrelatives {
    fn name(&self) -> &'static str {
        "MOST_CORRELATIVES"
    }

    fn evaluate(&self, course: &Course, _context: &PriorityContext) -> RuleScore {
        -(course.correlatives.len() as f64)
    }

    fn description(&self) -> &'static str {
        "Most prerequisites first"
    }
}

/// Heavier workload first.
#[derive(Debug, Clone, Copy)]
pub struct MostHours;

impl PriorityRule for MostHours {
    fn name(&self) -> &'static str {
        "MOST_HOURS"
    }

    fn evaluate(&self, course: &Course, _context: &PriorityContext) -> RuleScore {
        -(course.hours as f64)
    }

    fn description(&self) -> &'static str {
        "Most hours first"
    }
}

/// Courses that unlock the most other courses first.
#[derive(Debug, Clone, Copy)]
pub struct MostDependents;

impl PriorityRule for MostDependents {
    fn name(&self) -> &'static str {
        "MOST_DEPENDENTS"
    }

    fn evaluate(&self, course: &Course, context: &PriorityContext) -> RuleScore {
        -(context.dependents_of(course.id) as f64)
    }

    fn description(&self) -> &'static str {
        "Most direct dependents first"
    }
}

/// Earliest suggested term first; courses without a suggestion go last.
#[derive(Debug, Clone, Copy)]
pub struct SuggestedTerm;

impl PriorityRule for SuggestedTerm {
    fn name(&self) -> &'static str {
        "SUGGESTED_TERM"
    }

    fn evaluate(&self, course: &Course, _context: &PriorityContext) -> RuleScore {
        match course.suggested_term() {
            Some((year, term)) => year as f64 * 100.0 + term as f64,
            None => f64::MAX,
        }
    }

    fn description(&self) -> &'static str {
        "Earliest suggested term first"
    }
}
