//! Term planning.
//!
//! Turns a [`PlanRequest`] into a [`Plan`](crate::models::Plan):
//!
//! 1. Locks are applied as fixed assignments.
//! 2. Pending courses are leveled by prerequisites ([`crate::graph`]).
//! 3. [`TermAllocator`] places each course in the earliest feasible term.
//! 4. The board is folded into a plan, and [`PlanKpi`] summarizes it.
//!
//! Progress is reported through [`PlanObserver`]; see [`events`].

mod allocator;
mod assembler;
pub mod events;
mod kpi;

pub use allocator::TermAllocator;
pub use events::{EventLog, NoopObserver, PlanEvent, PlanObserver, TracingObserver};
pub use kpi::PlanKpi;

use std::collections::BTreeSet;

use crate::models::{Catalog, CourseId, Horizon, Lock, Preferences};

/// Input container for one planning run.
#[derive(Debug, Clone)]
pub struct PlanRequest {
    /// Validated courses.
    pub catalog: Catalog,
    /// Terms available for placement.
    pub horizon: Horizon,
    /// Workload cap and time-of-day preference.
    pub preferences: Preferences,
    /// Courses already passed. They satisfy prerequisites and are not planned.
    pub approved: BTreeSet<CourseId>,
    /// Fixed placements, applied in order.
    pub locks: Vec<Lock>,
}

impl PlanRequest {
    /// Creates a request with no approvals and no locks.
    pub fn new(catalog: Catalog, horizon: Horizon, preferences: Preferences) -> Self {
        Self {
            catalog,
            horizon,
            preferences,
            approved: BTreeSet::new(),
            locks: Vec::new(),
        }
    }

    /// Marks courses as approved.
    ///
    /// IDs outside the catalog are accepted and still satisfy prerequisites.
    pub fn with_approved(mut self, ids: impl IntoIterator<Item = CourseId>) -> Self {
        self.approved.extend(ids);
        self
    }

    /// Appends a lock.
    pub fn with_lock(mut self, lock: Lock) -> Self {
        self.locks.push(lock);
        self
    }

    /// Appends several locks, keeping their order.
    pub fn with_locks(mut self, locks: impl IntoIterator<Item = Lock>) -> Self {
        self.locks.extend(locks);
        self
    }
}
