//! Course catalog.
//!
//! The catalog is the immutable list of courses a plan is built from.
//! It is loaded once from raw records (typically JSON in the shape of the
//! curriculum data file) and validated on the way in, so planning never
//! sees a malformed time string or a duplicate ID.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use super::{Course, CourseId};
use crate::validation::{self, ValidationError};

/// Raw schedule option as found in catalog data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleOptionRecord {
    /// Day names (English or Spanish).
    pub days: Vec<String>,
    /// `"HH:MM-HH:MM"`.
    pub time: String,
}

/// Raw course record as found in catalog data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseRecord {
    /// Course identifier.
    pub id: CourseId,
    /// Display name.
    pub name: String,
    /// Suggested year.
    #[serde(default)]
    pub year: Option<u32>,
    /// Suggested term.
    #[serde(default)]
    pub term: Option<u32>,
    /// Workload; negative values are rejected by validation.
    pub hours: i64,
    /// Candidate slots.
    #[serde(default)]
    pub schedule_options: Vec<ScheduleOptionRecord>,
    /// Prerequisite IDs.
    #[serde(default)]
    pub correlatives: Vec<CourseId>,
}

/// Errors loading a catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The input is not valid JSON for a list of course records.
    #[error("catalog JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// One or more records failed validation.
    #[error("catalog has {} invalid entries: {}", .0.len(), summarize(.0))]
    Invalid(Vec<ValidationError>),
}

fn summarize(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

/// A validated, immutable list of courses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Catalog {
    courses: Vec<Course>,
    #[serde(skip)]
    index: HashMap<CourseId, usize>,
}

impl Catalog {
    /// Wraps courses that have already passed validation.
    pub(crate) fn from_validated(courses: Vec<Course>) -> Self {
        let index = courses
            .iter()
            .enumerate()
            .map(|(i, c)| (c.id, i))
            .collect();
        Self { courses, index }
    }

    /// Builds a catalog from typed courses.
    ///
    /// Rejects duplicate IDs and self-referencing prerequisites.
    pub fn new(courses: Vec<Course>) -> Result<Self, Vec<ValidationError>> {
        validation::validate_courses(&courses)?;
        Ok(Self::from_validated(courses))
    }

    /// Validates raw records into a catalog.
    pub fn from_records(records: &[CourseRecord]) -> Result<Self, Vec<ValidationError>> {
        validation::validate_catalog(records)
    }

    /// Parses and validates a JSON array of course records.
    ///
    /// # Example
    /// ```
    /// use u_curriculum::models::Catalog;
    ///
    /// let json = r#"[
    ///   {"id": 1, "name": "Algebra", "hours": 64,
    ///    "scheduleOptions": [{"days": ["Lunes"], "time": "14:00-18:00"}],
    ///    "correlatives": []}
    /// ]"#;
    /// let catalog = Catalog::from_json_str(json).unwrap();
    /// assert_eq!(catalog.len(), 1);
    /// assert_eq!(catalog.name_of(1), Some("Algebra"));
    /// ```
    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let records: Vec<CourseRecord> = serde_json::from_str(json)?;
        validation::validate_catalog(&records).map_err(CatalogError::Invalid)
    }

    /// Courses in catalog order.
    pub fn courses(&self) -> &[Course] {
        &self.courses
    }

    /// Looks up a course.
    pub fn get(&self, id: CourseId) -> Option<&Course> {
        self.index.get(&id).map(|&i| &self.courses[i])
    }

    /// Position of a course in catalog order.
    pub fn position(&self, id: CourseId) -> Option<usize> {
        self.index.get(&id).copied()
    }

    /// Whether the catalog contains a course.
    pub fn contains(&self, id: CourseId) -> bool {
        self.index.contains_key(&id)
    }

    /// Display name of a course.
    pub fn name_of(&self, id: CourseId) -> Option<&str> {
        self.get(id).map(|c| c.name.as_str())
    }

    /// Number of courses.
    pub fn len(&self) -> usize {
        self.courses.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.courses.is_empty()
    }

    /// Iterates courses in catalog order.
    pub fn iter(&self) -> std::slice::Iter<'_, Course> {
        self.courses.iter()
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a Course;
    type IntoIter = std::slice::Iter<'a, Course>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
