//! Curriculum planning domain models.
//!
//! Provides the data types for describing a planning problem (catalog,
//! horizon, preferences, locks) and its solution (plan).
//!
//! # Domain Mappings
//!
//! | u-curriculum | Scheduling term | Catalog data (es) |
//! |--------------|-----------------|---------------|
//! | Course | Job | asignatura |
//! | ScheduleOption | Time slot | horario |
//! | TermId | Period | cuatrimestre (`1C2`) |
//! | correlatives | Precedence | correlativas |
//! | Plan | Schedule | plan de cursada |

mod catalog;
mod course;
mod plan;
mod preferences;
mod slot;
mod term;

pub use catalog::{Catalog, CatalogError, CourseRecord, ScheduleOptionRecord};
pub use course::{Course, CourseId};
pub use plan::{
    Assignment, Lock, LockRejection, Plan, RejectedLock, TermSchedule, UnplacedCourse,
    UnplacedReason,
};
pub use preferences::{Preferences, DEFAULT_MAX_HOURS_PER_TERM, MAX_HOURS_PER_TERM_CEILING};
pub use slot::{
    time_to_minutes, ScheduleOption, SlotParseError, TimeOfDay, TimeParseError, TimeRange,
    UnknownWeekday, Weekday, END_OF_DAY,
};
pub use term::{Horizon, HorizonError, TermId, TermParseError};
