//! Input validation and plan verification.
//!
//! Catalog records are checked once at load time. Detects:
//! - Duplicate course IDs
//! - Negative workloads
//! - Malformed or empty time ranges
//! - Unknown weekday names and empty day sets
//! - Courses listing themselves as prerequisites
//!
//! Dangling prerequisite IDs are *not* load errors: they are a planning
//! condition and surface as unplaced courses.
//!
//! [`verify_plan`] re-checks a finished plan against its invariants
//! (hour caps, slot conflicts, prerequisite ordering).

use std::collections::{HashMap, HashSet};
use thiserror::Error;

use crate::conflict;
use crate::models::{
    Catalog, Course, CourseId, CourseRecord, Plan, Preferences, ScheduleOption, TermId,
    TimeParseError, TimeRange, Weekday,
};

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Offending course, when known.
    pub course_id: Option<CourseId>,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Two courses share the same ID.
    DuplicateId,
    /// A course has a negative (or unrepresentable) workload.
    NegativeHours,
    /// A clock string is not `HH:MM` or a range is not `HH:MM-HH:MM`.
    MalformedTime,
    /// A range does not end after it starts.
    EmptyTimeRange,
    /// A day name matches no weekday.
    UnknownWeekday,
    /// A schedule option has no days.
    NoDays,
    /// A course lists itself as a prerequisite.
    SelfReference,
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, course_id: CourseId, message: impl Into<String>) -> Self {
        Self {
            kind,
            course_id: Some(course_id),
            message: message.into(),
        }
    }
}

/// Validates raw catalog records and converts them into a [`Catalog`].
///
/// Checks:
/// 1. No duplicate course IDs
/// 2. Hours are non-negative
/// 3. Every time range parses and ends after it starts
/// 4. Every day name is a weekday and every option has at least one day
/// 5. No course is its own prerequisite
///
/// # Returns
/// The catalog if all checks pass, `Err(errors)` with every detected issue.
pub fn validate_catalog(records: &[CourseRecord]) -> Result<Catalog, Vec<ValidationError>> {
    let mut errors = Vec::new();
    let mut ids = HashSet::new();
    let mut courses = Vec::with_capacity(records.len());

    for record in records {
        if !ids.insert(record.id) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                record.id,
                format!("Duplicate course ID: {}", record.id),
            ));
        }

        let hours = match u32::try_from(record.hours) {
            Ok(h) => h,
            Err(_) => {
                errors.push(ValidationError::new(
                    ValidationErrorKind::NegativeHours,
                    record.id,
                    format!("Course {} has invalid hours {}", record.id, record.hours),
                ));
                0
            }
        };

        if record.correlatives.contains(&record.id) {
            errors.push(ValidationError::new(
                ValidationErrorKind::SelfReference,
                record.id,
                format!("Course {} lists itself as a prerequisite", record.id),
            ));
        }

        let mut options = Vec::with_capacity(record.schedule_options.len());
        for raw in &record.schedule_options {
            let time = match TimeRange::parse(&raw.time) {
                Ok(t) => Some(t),
                Err(e) => {
                    let kind = match e {
                        TimeParseError::EmptyRange(_) => ValidationErrorKind::EmptyTimeRange,
                        _ => ValidationErrorKind::MalformedTime,
                    };
                    errors.push(ValidationError::new(
                        kind,
                        record.id,
                        format!("Course {}: {e}", record.id),
                    ));
                    None
                }
            };

            if raw.days.is_empty() {
                errors.push(ValidationError::new(
                    ValidationErrorKind::NoDays,
                    record.id,
                    format!("Course {} has a schedule option without days", record.id),
                ));
            }

            let mut days = Vec::with_capacity(raw.days.len());
            for name in &raw.days {
                match name.parse::<Weekday>() {
                    Ok(d) => days.push(d),
                    Err(e) => errors.push(ValidationError::new(
                        ValidationErrorKind::UnknownWeekday,
                        record.id,
                        format!("Course {}: {e}", record.id),
                    )),
                }
            }

            if let Some(time) = time {
                options.push(ScheduleOption::new(days, time));
            }
        }

        courses.push(Course {
            id: record.id,
            name: record.name.clone(),
            year: record.year,
            term: record.term,
            hours,
            schedule_options: options,
            correlatives: record.correlatives.iter().copied().collect(),
        });
    }

    if errors.is_empty() {
        Ok(Catalog::from_validated(courses))
    } else {
        Err(errors)
    }
}

/// Validates typed courses (duplicate IDs, self references, empty day sets).
pub fn validate_courses(courses: &[Course]) -> ValidationResult {
    let mut errors = Vec::new();
    let mut ids = HashSet::new();

    for course in courses {
        if !ids.insert(course.id) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                course.id,
                format!("Duplicate course ID: {}", course.id),
            ));
        }
        if course.correlatives.contains(&course.id) {
            errors.push(ValidationError::new(
                ValidationErrorKind::SelfReference,
                course.id,
                format!("Course {} lists itself as a prerequisite", course.id),
            ));
        }
        if course.schedule_options.iter().any(|o| o.days.is_empty()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::NoDays,
                course.id,
                format!("Course {} has a schedule option without days", course.id),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// A plan invariant that does not hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Type of violation.
    pub violation_type: ViolationType,
    /// Term where it occurs.
    pub term: TermId,
    /// Course involved.
    pub course_id: CourseId,
    /// Human-readable description.
    pub message: String,
}

/// Classification of plan violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationType {
    /// Term hours above the cap.
    CapacityExceeded,
    /// Two assignments in a term overlap.
    ScheduleConflict,
    /// A prerequisite is neither approved nor placed earlier.
    PrecedenceViolation,
    /// A course is placed more than once.
    DuplicateAssignment,
}

/// Checks a plan against its invariants.
///
/// Returns every violation found; an empty list means the plan is sound.
/// `catalog` supplies prerequisite lists; courses missing from it are
/// checked for capacity and conflicts only.
pub fn verify_plan(plan: &Plan, catalog: &Catalog, preferences: &Preferences) -> Vec<Violation> {
    let cap = preferences.hour_cap();
    let mut violations = Vec::new();
    let approved: HashSet<CourseId> = plan.approved.iter().copied().collect();

    let mut placed_at: HashMap<CourseId, usize> = HashMap::new();
    for (idx, schedule) in plan.terms.iter().enumerate() {
        for a in &schedule.assignments {
            if placed_at.insert(a.course_id, idx).is_some() {
                violations.push(Violation {
                    violation_type: ViolationType::DuplicateAssignment,
                    term: schedule.term,
                    course_id: a.course_id,
                    message: format!("Course {} is placed more than once", a.course_id),
                });
            }
        }
    }

    for (idx, schedule) in plan.terms.iter().enumerate() {
        let hours: u32 = schedule.assignments.iter().map(|a| a.hours).sum();
        if hours > cap {
            if let Some(last) = schedule.assignments.last() {
                violations.push(Violation {
                    violation_type: ViolationType::CapacityExceeded,
                    term: schedule.term,
                    course_id: last.course_id,
                    message: format!("Term {} has {hours}h, cap is {cap}h", schedule.term),
                });
            }
        }

        for (i, a) in schedule.assignments.iter().enumerate() {
            for b in &schedule.assignments[i + 1..] {
                if conflict::overlaps(&a.option, &b.option) {
                    violations.push(Violation {
                        violation_type: ViolationType::ScheduleConflict,
                        term: schedule.term,
                        course_id: b.course_id,
                        message: format!(
                            "Courses {} and {} overlap in {}",
                            a.course_id, b.course_id, schedule.term
                        ),
                    });
                }
            }

            let Some(course) = catalog.get(a.course_id) else {
                continue;
            };
            for &pre in &course.correlatives {
                if approved.contains(&pre) {
                    continue;
                }
                let ok = placed_at.get(&pre).is_some_and(|&p| p < idx);
                if !ok {
                    violations.push(Violation {
                        violation_type: ViolationType::PrecedenceViolation,
                        term: schedule.term,
                        course_id: a.course_id,
                        message: format!(
                            "Course {} in {} requires {pre}, which is not approved or placed earlier",
                            a.course_id, schedule.term
                        ),
                    });
                }
            }
        }
    }

    violations
}
