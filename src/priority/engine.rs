//! Sequential rule engine for within-level ordering.
//!
//! Rules are applied in order; the next rule is consulted only when the
//! previous one ties. Remaining ties fall back to catalog order, so the
//! resulting order is total and deterministic.

use std::cmp::Ordering;
use std::sync::Arc;

use super::{rules, PriorityContext, PriorityRule, RuleScore};
use crate::models::Course;

/// Composable ordering of courses inside a level.
///
/// # Example
/// ```
/// use u_curriculum::models::Course;
/// use u_curriculum::priority::{CoursePriority, PriorityContext};
///
/// let a = Course::new(1, "Light").with_hours(32);
/// let b = Course::new(2, "Heavy").with_hours(128).with_correlative(1);
/// let ctx = PriorityContext::new().with_position(1, 0).with_position(2, 1);
///
/// let order = CoursePriority::prerequisites_first().sort_indices(&[&a, &b], &ctx);
/// assert_eq!(order, vec![1, 0]);
/// ```
#[derive(Clone)]
pub struct CoursePriority {
    rules: Vec<Arc<dyn PriorityRule>>,
    epsilon: f64,
}

impl CoursePriority {
    /// Creates an engine with no rules (catalog order).
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            epsilon: 1e-9,
        }
    }

    /// More prerequisites first, then heavier courses first.
    pub fn prerequisites_first() -> Self {
        Self::new()
            .with_rule(rules::MostCorrelatives)
            .with_rule(rules::MostHours)
    }

    /// Appends a rule; earlier rules take precedence.
    pub fn with_rule<R: PriorityRule + 'static>(mut self, rule: R) -> Self {
        self.rules.push(Arc::new(rule));
        self
    }

    /// Whether any rule is configured.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Scores of a course under each rule.
    pub fn evaluate(&self, course: &Course, context: &PriorityContext) -> Vec<RuleScore> {
        self.rules
            .iter()
            .map(|r| r.evaluate(course, context))
            .collect()
    }

    /// Returns indices into `courses`, highest priority first.
    pub fn sort_indices(&self, courses: &[&Course], context: &PriorityContext) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..courses.len()).collect();
        indices.sort_by(|&a, &b| self.compare(courses[a], courses[b], context));
        indices
    }

    fn compare(&self, a: &Course, b: &Course, context: &PriorityContext) -> Ordering {
        for rule in &self.rules {
            let score_a = rule.evaluate(a, context);
            let score_b = rule.evaluate(b, context);
            if (score_a - score_b).abs() > self.epsilon {
                return score_a.partial_cmp(&score_b).unwrap_or(Ordering::Equal);
            }
        }
        context
            .position_of(a.id)
            .cmp(&context.position_of(b.id))
            .then(a.id.cmp(&b.id))
    }
}

impl Default for CoursePriority {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CoursePriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoursePriority")
            .field(
                "rules",
                &self.rules.iter().map(|r| r.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}
