//! Planning preferences.

use serde::{Deserialize, Serialize};

use super::TimeOfDay;

/// Hard ceiling on the per-term workload cap.
///
/// Caps above this are clamped so a plan can never degenerate into
/// "everything in one term".
pub const MAX_HOURS_PER_TERM_CEILING: u32 = 640;

/// Workload cap used when none is configured.
pub const DEFAULT_MAX_HOURS_PER_TERM: u32 = 256;

/// Student preferences consumed by one planning run.
///
/// Deserializes from the settings store's camelCase shape, e.g.
/// `{"maxHoursPerTerm": 192, "preferredTimeOfDay": "night"}`.
/// Missing fields fall back to defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Preferences {
    /// Maximum hours of coursework in a single term.
    pub max_hours_per_term: u32,
    /// Preferred part of the day for classes.
    pub preferred_time_of_day: TimeOfDay,
}

impl Preferences {
    /// Creates preferences with the given cap and no time-of-day preference.
    pub fn new(max_hours_per_term: u32) -> Self {
        Self {
            max_hours_per_term,
            preferred_time_of_day: TimeOfDay::NoPreference,
        }
    }

    /// Sets the preferred time of day.
    pub fn with_preferred_time(mut self, time: TimeOfDay) -> Self {
        self.preferred_time_of_day = time;
        self
    }

    /// Effective cap, clamped into `1..=MAX_HOURS_PER_TERM_CEILING`.
    pub fn hour_cap(&self) -> u32 {
        self.max_hours_per_term.clamp(1, MAX_HOURS_PER_TERM_CEILING)
    }

    /// Copy with the cap already clamped.
    pub fn resolved(self) -> Self {
        Self {
            max_hours_per_term: self.hour_cap(),
            ..self
        }
    }
}

impl Default for Preferences {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_HOURS_PER_TERM)
    }
}
