//! Plan assembly.
//!
//! Folds the allocator's per-term board into a [`Plan`]. Terms keep horizon
//! order and assignments keep commit order; unplaced courses are listed in
//! catalog order.

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::models::{
    Catalog, CourseId, Plan, RejectedLock, TermSchedule, UnplacedCourse, UnplacedReason,
};

/// Builds the read-only plan.
///
/// Every catalog course that is neither placed nor approved appears in
/// `unplaced`; a course with no recorded reason is reported as
/// [`UnplacedReason::HorizonExhausted`].
pub(crate) fn assemble(
    catalog: &Catalog,
    mut terms: Vec<TermSchedule>,
    reasons: &HashMap<CourseId, UnplacedReason>,
    approved: &BTreeSet<CourseId>,
    rejected_locks: Vec<RejectedLock>,
) -> Plan {
    for schedule in &mut terms {
        schedule.total_hours = schedule.assignments.iter().map(|a| a.hours).sum();
    }

    let placed: HashSet<CourseId> = terms
        .iter()
        .flat_map(|t| t.assignments.iter().map(|a| a.course_id))
        .collect();

    let unplaced = catalog
        .iter()
        .filter(|c| !placed.contains(&c.id) && !approved.contains(&c.id))
        .map(|c| UnplacedCourse {
            course: c.clone(),
            reason: reasons
                .get(&c.id)
                .cloned()
                .unwrap_or(UnplacedReason::HorizonExhausted),
        })
        .collect();

    Plan {
        terms,
        unplaced,
        approved: approved.iter().copied().collect(),
        rejected_locks,
    }
}
