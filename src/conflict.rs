//! Schedule conflict checking.
//!
//! Two weekly slots conflict iff they share a weekday AND their clock
//! ranges intersect. Ranges are half-open, so back-to-back classes
//! (one ends at 18:00, the next starts at 18:00) are compatible.
//!
//! # Reference
//! Allen (1983), "Maintaining Knowledge about Temporal Intervals"
//! (the `meets` relation is not an overlap).

use crate::models::{Assignment, ScheduleOption, TimeOfDay};

pub use crate::models::time_to_minutes;

/// Whether two slots collide.
///
/// # Example
/// ```
/// use u_curriculum::conflict::overlaps;
/// use u_curriculum::models::ScheduleOption;
///
/// let a = ScheduleOption::parse(&["Lunes"], "14:00-18:00").unwrap();
/// let b = ScheduleOption::parse(&["Lunes", "Martes"], "17:00-19:00").unwrap();
/// let c = ScheduleOption::parse(&["Lunes"], "18:00-20:00").unwrap();
/// assert!(overlaps(&a, &b));
/// assert!(!overlaps(&a, &c));
/// ```
#[inline]
pub fn overlaps(a: &ScheduleOption, b: &ScheduleOption) -> bool {
    a.time.overlaps(&b.time) && a.shares_day(b)
}

/// Whether a candidate slot is free of every slot already chosen in a term.
pub fn is_compatible(candidate: &ScheduleOption, term_assignments: &[Assignment]) -> bool {
    first_conflict(candidate, term_assignments).is_none()
}

/// The first assignment a candidate slot collides with.
pub fn first_conflict<'a>(
    candidate: &ScheduleOption,
    term_assignments: &'a [Assignment],
) -> Option<&'a Assignment> {
    term_assignments
        .iter()
        .find(|a| overlaps(candidate, &a.option))
}

/// Picks a slot for a course in a term.
///
/// Options are scanned in catalog order. The first compatible option that
/// matches `preference` wins; if none matches, the first compatible option
/// is used. Returns the option's index, or `None` when every option collides.
pub fn select_option(
    options: &[ScheduleOption],
    term_assignments: &[Assignment],
    preference: TimeOfDay,
) -> Option<usize> {
    select_option_where(options, term_assignments, preference, |_| true)
}

/// Like [`select_option`], restricted to option indices accepted by `allow`.
pub(crate) fn select_option_where(
    options: &[ScheduleOption],
    term_assignments: &[Assignment],
    preference: TimeOfDay,
    allow: impl Fn(usize) -> bool,
) -> Option<usize> {
    let mut fallback = None;
    for (idx, option) in options.iter().enumerate() {
        if !allow(idx) || !is_compatible(option, term_assignments) {
            continue;
        }
        if option.time.matches(preference) {
            return Some(idx);
        }
        if fallback.is_none() {
            fallback = Some(idx);
        }
    }
    fallback
}
