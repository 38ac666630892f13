//! Context passed to priority rules.

use std::collections::HashMap;

use crate::models::CourseId;

/// Planning state visible to priority rules.
#[derive(Debug, Clone, Default)]
pub struct PriorityContext {
    /// Catalog position per course.
    pub catalog_position: HashMap<CourseId, usize>,
    /// Number of pending courses that depend directly on each course.
    pub dependents: HashMap<CourseId, usize>,
}

impl PriorityContext {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the catalog position of a course.
    pub fn with_position(mut self, id: CourseId, position: usize) -> Self {
        self.catalog_position.insert(id, position);
        self
    }

    /// Sets the direct dependent count of a course.
    pub fn with_dependents(mut self, id: CourseId, count: usize) -> Self {
        self.dependents.insert(id, count);
        self
    }

    /// Catalog position, or `usize::MAX` when unknown.
    pub fn position_of(&self, id: CourseId) -> usize {
        self.catalog_position.get(&id).copied().unwrap_or(usize::MAX)
    }

    /// Direct dependent count (zero when unknown).
    pub fn dependents_of(&self, id: CourseId) -> usize {
        self.dependents.get(&id).copied().unwrap_or(0)
    }
}
