//! Course model.
//!
//! A course is a unit of study with a workload, a set of candidate weekly
//! slots and a set of prerequisite ("correlative") courses.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::ScheduleOption;

/// Stable course identifier.
pub type CourseId = u32;

/// A course in the catalog.
///
/// `year`/`term` are the curriculum's suggested placement; they are advisory
/// and only consulted when the allocator is asked to try them first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    /// Unique course identifier.
    pub id: CourseId,
    /// Display name.
    pub name: String,
    /// Suggested academic year.
    pub year: Option<u32>,
    /// Suggested term within the year.
    pub term: Option<u32>,
    /// Workload in hours for the term.
    pub hours: u32,
    /// Candidate weekly slots, in preference order.
    pub schedule_options: Vec<ScheduleOption>,
    /// Prerequisite course IDs.
    pub correlatives: BTreeSet<CourseId>,
}

impl Course {
    /// Creates a course with no hours, slots or prerequisites.
    pub fn new(id: CourseId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            year: None,
            term: None,
            hours: 0,
            schedule_options: Vec::new(),
            correlatives: BTreeSet::new(),
        }
    }

    /// Sets the workload.
    pub fn with_hours(mut self, hours: u32) -> Self {
        self.hours = hours;
        self
    }

    /// Sets the suggested year and term.
    pub fn with_suggested_term(mut self, year: u32, term: u32) -> Self {
        self.year = Some(year);
        self.term = Some(term);
        self
    }

    /// Appends a schedule option (lowest preference so far).
    pub fn with_option(mut self, option: ScheduleOption) -> Self {
        self.schedule_options.push(option);
        self
    }

    /// Adds a prerequisite.
    pub fn with_correlative(mut self, id: CourseId) -> Self {
        self.correlatives.insert(id);
        self
    }

    /// Adds several prerequisites.
    pub fn with_correlatives(mut self, ids: impl IntoIterator<Item = CourseId>) -> Self {
        self.correlatives.extend(ids);
        self
    }

    /// Whether the course has prerequisites.
    pub fn has_correlatives(&self) -> bool {
        !self.correlatives.is_empty()
    }

    /// Whether the course can be scheduled at all.
    pub fn has_schedule_options(&self) -> bool {
        !self.schedule_options.is_empty()
    }

    /// Suggested `(year, term)` when both are set.
    pub fn suggested_term(&self) -> Option<(u32, u32)> {
        self.year.zip(self.term)
    }
}
