//! Planning events and observers.
//!
//! The allocator reports what it does through a [`PlanObserver`] passed in
//! by the caller. Nothing is logged unless an observer is supplied.

use crate::models::{CourseId, LockRejection, TermId, UnplacedReason};

/// Something the allocator did or decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanEvent {
    /// A topological level was built.
    LevelBuilt {
        /// Level index.
        level: usize,
        /// Courses in attempt order.
        courses: Vec<CourseId>,
    },
    /// A course was kept out of the search (dangling prerequisite or cycle).
    Excluded {
        /// The course.
        course: CourseId,
        /// Why.
        reason: UnplacedReason,
    },
    /// A lock could not be applied.
    LockRejected {
        /// Locked course.
        course: CourseId,
        /// Requested term.
        term: TermId,
        /// Why.
        reason: LockRejection,
    },
    /// A course was committed.
    Placed {
        /// The course.
        course: CourseId,
        /// Chosen term.
        term: TermId,
        /// Index of the chosen option in the course's option list.
        option: usize,
    },
    /// Every option of a course collides with the term's assignments.
    Conflict {
        /// The course.
        course: CourseId,
        /// Term tried.
        term: TermId,
    },
    /// The course does not fit in the term's remaining hours.
    OverCapacity {
        /// The course.
        course: CourseId,
        /// Term tried.
        term: TermId,
        /// Hours the term would reach.
        hours: u32,
        /// Effective cap.
        cap: u32,
    },
    /// A placed course was moved to make room for another.
    Backtrack {
        /// Course that needed room.
        course: CourseId,
        /// Course that was moved.
        displaced: CourseId,
        /// Term the displaced course left.
        from: TermId,
        /// Term it moved to.
        to: TermId,
    },
    /// Moving a placed course did not help; both were restored.
    BacktrackFailed {
        /// Course that needed room.
        course: CourseId,
        /// Course that was tried.
        displaced: CourseId,
    },
    /// A course ended the pass unplaced.
    Unplaceable {
        /// The course.
        course: CourseId,
        /// Why.
        reason: UnplacedReason,
    },
}

/// Receives planning events.
pub trait PlanObserver {
    /// Called for every event, in order.
    fn on_event(&mut self, event: &PlanEvent);
}

impl<F: FnMut(&PlanEvent)> PlanObserver for F {
    fn on_event(&mut self, event: &PlanEvent) {
        self(event)
    }
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl PlanObserver for NoopObserver {
    fn on_event(&mut self, _event: &PlanEvent) {}
}

/// Collects events in memory.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    /// Events in emission order.
    pub events: Vec<PlanEvent>,
}

impl EventLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of backtrack steps that succeeded.
    pub fn backtracks(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, PlanEvent::Backtrack { .. }))
            .count()
    }

    /// Placement events for a course.
    pub fn placements_of(&self, id: CourseId) -> Vec<TermId> {
        self.events
            .iter()
            .filter_map(|e| match e {
                PlanEvent::Placed { course, term, .. } if *course == id => Some(*term),
                _ => None,
            })
            .collect()
    }
}

impl PlanObserver for EventLog {
    fn on_event(&mut self, event: &PlanEvent) {
        self.events.push(event.clone());
    }
}

/// Forwards events to `tracing`.
///
/// Placements and level builds are `debug`, per-term rejections are
/// `trace`, backtracks and unplaceable courses are `info`, rejected locks
/// are `warn`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl PlanObserver for TracingObserver {
    fn on_event(&mut self, event: &PlanEvent) {
        match event {
            PlanEvent::LevelBuilt { level, courses } => {
                tracing::debug!(level, size = courses.len(), ?courses, "level built");
            }
            PlanEvent::Excluded { course, reason } => {
                tracing::info!(course, ?reason, "course excluded from search");
            }
            PlanEvent::LockRejected {
                course,
                term,
                reason,
            } => {
                tracing::warn!(course, term = %term, ?reason, "lock rejected");
            }
            PlanEvent::Placed {
                course,
                term,
                option,
            } => {
                tracing::debug!(course, term = %term, option, "course placed");
            }
            PlanEvent::Conflict { course, term } => {
                tracing::trace!(course, term = %term, "all schedule options conflict");
            }
            PlanEvent::OverCapacity {
                course,
                term,
                hours,
                cap,
            } => {
                tracing::trace!(course, term = %term, hours, cap, "term over capacity");
            }
            PlanEvent::Backtrack {
                course,
                displaced,
                from,
                to,
            } => {
                tracing::info!(
                    course,
                    displaced,
                    from = %from,
                    to = %to,
                    "moved placed course to make room"
                );
            }
            PlanEvent::BacktrackFailed { course, displaced } => {
                tracing::trace!(course, displaced, "backtrack attempt undone");
            }
            PlanEvent::Unplaceable { course, reason } => {
                tracing::info!(course, ?reason, "course unplaceable");
            }
        }
    }
}
