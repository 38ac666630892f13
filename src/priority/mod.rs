//! Course ordering rules and rule engine.
//!
//! Leveling fixes *which* courses may be attempted before which; inside a
//! level every order is valid. Priority rules pick that order, which
//! matters because earlier courses get first pick of slots and hours.
//!
//! # Usage
//!
//! ```
//! use u_curriculum::priority::{rules, CoursePriority};
//!
//! let priority = CoursePriority::new()
//!     .with_rule(rules::MostCorrelatives)
//!     .with_rule(rules::MostHours);
//! ```
//!
//! Without rules, courses keep catalog order.

mod context;
mod engine;
pub mod rules;

pub use context::PriorityContext;
pub use engine::CoursePriority;

use crate::models::Course;
use std::fmt::Debug;

/// Score returned by a priority rule.
///
/// Lower scores = attempted earlier.
pub type RuleScore = f64;

/// A rule that scores a course for within-level ordering.
///
/// # Score Convention
/// **Lower score = higher priority.** Rules should return smaller values
/// for courses that should be placed first.
pub trait PriorityRule: Send + Sync + Debug {
    /// Rule name (e.g., "MOST_CORRELATIVES").
    fn name(&self) -> &'static str;

    /// Scores a course.
    fn evaluate(&self, course: &Course, context: &PriorityContext) -> RuleScore;

    /// Rule description.
    fn description(&self) -> &'static str {
        self.name()
    }
}
