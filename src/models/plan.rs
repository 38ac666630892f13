//! Plan (solution) model.
//!
//! A plan is the per-term table of course assignments produced by one
//! planning run, together with the courses that could not be placed.
//!
//! # Invariants
//! For every term of a plan produced by the allocator:
//! - total hours never exceed the run's workload cap;
//! - no two assignments share a weekday with intersecting clock ranges;
//! - every prerequisite of an assignment is approved or assigned to an
//!   earlier term.

use serde::{Deserialize, Serialize};

use super::{Course, CourseId, ScheduleOption, TermId};

/// A course placed in a term with a chosen weekly slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    /// Placed course.
    pub course_id: CourseId,
    /// Term the course is taken in.
    pub term: TermId,
    /// Chosen slot.
    pub option: ScheduleOption,
    /// Course workload (denormalized for summing).
    pub hours: u32,
}

impl Assignment {
    /// Creates an assignment.
    pub fn new(course_id: CourseId, term: TermId, option: ScheduleOption, hours: u32) -> Self {
        Self {
            course_id,
            term,
            option,
            hours,
        }
    }

    /// The equivalent lock.
    pub fn to_lock(&self) -> Lock {
        Lock::new(self.course_id, self.term, self.option.clone())
    }
}

/// An externally fixed placement. Never moved by the allocator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lock {
    /// Locked course.
    pub course_id: CourseId,
    /// Fixed term.
    pub term: TermId,
    /// Fixed slot.
    pub option: ScheduleOption,
}

impl Lock {
    /// Creates a lock.
    pub fn new(course_id: CourseId, term: TermId, option: ScheduleOption) -> Self {
        Self {
            course_id,
            term,
            option,
        }
    }
}

/// Why a lock was not applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum LockRejection {
    /// The course is not in the catalog.
    UnknownCourse,
    /// The term is outside the horizon.
    TermOutsideHorizon,
    /// The course is already approved.
    AlreadyApproved,
    /// The course was locked earlier in the same request.
    DuplicateLock,
    /// Applying the lock would exceed the term's hour cap.
    ExceedsHourCap,
    /// The slot overlaps an earlier lock in the same term.
    ScheduleConflict {
        /// Course whose lock occupies the slot.
        with: CourseId,
    },
    /// A prerequisite cannot be approved or placed in an earlier term, or a
    /// locked dependent sits in the same term or earlier.
    PrerequisiteOrder {
        /// The prerequisite or dependent that breaks the order.
        with: CourseId,
    },
}

/// A lock that was not applied, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedLock {
    /// The lock as supplied.
    pub lock: Lock,
    /// Why it was rejected.
    pub reason: LockRejection,
}

/// Why a course is missing from the plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum UnplacedReason {
    /// The course alone exceeds the per-term hour cap.
    ExceedsHourCap {
        /// Course hours.
        hours: u32,
        /// Effective cap.
        cap: u32,
    },
    /// The course has no schedule options.
    NoScheduleOptions,
    /// A prerequisite is not in the catalog and not approved.
    DanglingPrerequisite {
        /// Unknown prerequisite IDs.
        missing: Vec<CourseId>,
    },
    /// The course sits on a prerequisite cycle.
    Cycle {
        /// All courses of the cycle, ascending.
        members: Vec<CourseId>,
    },
    /// Some prerequisite could not be placed.
    PrerequisiteUnplaced {
        /// Unplaced prerequisite IDs.
        missing: Vec<CourseId>,
    },
    /// No term of the horizon has room or a compatible slot.
    HorizonExhausted,
}

impl UnplacedReason {
    /// Whether the course was kept out of the search entirely
    /// (structural problems in the prerequisite graph).
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            UnplacedReason::DanglingPrerequisite { .. } | UnplacedReason::Cycle { .. }
        )
    }
}

/// A course that could not be placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnplacedCourse {
    /// Copy of the course record.
    pub course: Course,
    /// Why it was not placed.
    pub reason: UnplacedReason,
}

/// Assignments of one term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TermSchedule {
    /// The term.
    pub term: TermId,
    /// Assignments in commit order.
    pub assignments: Vec<Assignment>,
    /// Sum of assignment hours.
    pub total_hours: u32,
}

impl TermSchedule {
    /// Creates an empty term.
    pub fn new(term: TermId) -> Self {
        Self {
            term,
            assignments: Vec::new(),
            total_hours: 0,
        }
    }

    /// Adds an assignment and its hours.
    pub fn push(&mut self, assignment: Assignment) {
        self.total_hours += assignment.hours;
        self.assignments.push(assignment);
    }

    /// Whether the term has no assignments.
    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }
}

/// Result of one planning run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    /// One entry per horizon term, in horizon order.
    pub terms: Vec<TermSchedule>,
    /// Courses not placed, in catalog order.
    pub unplaced: Vec<UnplacedCourse>,
    /// Courses treated as already approved, ascending.
    pub approved: Vec<CourseId>,
    /// Locks that could not be applied, in request order.
    pub rejected_locks: Vec<RejectedLock>,
}

impl Plan {
    /// Schedule for a term.
    pub fn term(&self, term: TermId) -> Option<&TermSchedule> {
        self.terms.iter().find(|t| t.term == term)
    }

    /// All assignments in term order.
    pub fn assignments(&self) -> impl Iterator<Item = &Assignment> {
        self.terms.iter().flat_map(|t| t.assignments.iter())
    }

    /// Assignment of a course.
    pub fn assignment_for(&self, course_id: CourseId) -> Option<&Assignment> {
        self.assignments().find(|a| a.course_id == course_id)
    }

    /// Term a course is placed in.
    pub fn term_of(&self, course_id: CourseId) -> Option<TermId> {
        self.assignment_for(course_id).map(|a| a.term)
    }

    /// Whether the course was placed.
    pub fn is_placed(&self, course_id: CourseId) -> bool {
        self.assignment_for(course_id).is_some()
    }

    /// Unplaced entry for a course.
    pub fn unplaced_course(&self, course_id: CourseId) -> Option<&UnplacedCourse> {
        self.unplaced.iter().find(|u| u.course.id == course_id)
    }

    /// Whether the course ended up unplaced.
    pub fn is_unplaced(&self, course_id: CourseId) -> bool {
        self.unplaced_course(course_id).is_some()
    }

    /// Number of assignments.
    pub fn assignment_count(&self) -> usize {
        self.terms.iter().map(|t| t.assignments.len()).sum()
    }

    /// Total hours across all terms.
    pub fn total_hours(&self) -> u32 {
        self.terms.iter().map(|t| t.total_hours).sum()
    }

    /// Whether every course was placed or approved.
    pub fn is_complete(&self) -> bool {
        self.unplaced.is_empty()
    }

    /// Last term with at least one assignment.
    pub fn last_used_term(&self) -> Option<TermId> {
        self.terms.iter().rev().find(|t| !t.is_empty()).map(|t| t.term)
    }

    /// Converts every assignment to a lock, term by term in commit order.
    pub fn to_locks(&self) -> Vec<Lock> {
        self.assignments().map(Assignment::to_lock).collect()
    }
}
