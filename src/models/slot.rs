//! Weekly time-slot models.
//!
//! A course is taught in one of several weekly slots. A slot is a set of
//! weekdays plus one clock range that repeats on each of those days.
//!
//! # Time Model
//! Clock times are minutes past midnight on a 24h scale. Ranges are
//! half-open `[start, end)`: a class ending at 18:00 does not collide
//! with one starting at 18:00.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Latest representable clock time ("24:00", end of day).
pub const END_OF_DAY: u16 = 24 * 60;

/// Errors produced while parsing clock times and ranges.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimeParseError {
    /// Not of the form `HH:MM`.
    #[error("malformed clock time {0:?}, expected HH:MM")]
    MalformedClock(String),
    /// Hours or minutes outside the 24h clock.
    #[error("clock time {0:?} is out of range")]
    OutOfRange(String),
    /// Not of the form `HH:MM-HH:MM`.
    #[error("malformed time range {0:?}, expected HH:MM-HH:MM")]
    MalformedRange(String),
    /// End is not after start.
    #[error("time range {0:?} does not end after it starts")]
    EmptyRange(String),
}

/// Converts an `HH:MM` clock string to minutes past midnight.
///
/// Accepts one or two hour digits and exactly two minute digits.
/// `24:00` is accepted as the end of the day.
///
/// # Example
/// ```
/// use u_curriculum::models::time_to_minutes;
///
/// assert_eq!(time_to_minutes("08:30"), Ok(510));
/// assert_eq!(time_to_minutes("18:00"), Ok(1080));
/// assert!(time_to_minutes("8h30").is_err());
/// ```
pub fn time_to_minutes(clock: &str) -> Result<u16, TimeParseError> {
    let trimmed = clock.trim();
    let malformed = || TimeParseError::MalformedClock(clock.to_string());

    let (hh, mm) = trimmed.split_once(':').ok_or_else(malformed)?;
    let digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if !digits(hh) || hh.len() > 2 || !digits(mm) || mm.len() != 2 {
        return Err(malformed());
    }

    let hours: u16 = hh.parse().map_err(|_| malformed())?;
    let minutes: u16 = mm.parse().map_err(|_| malformed())?;
    if minutes >= 60 || hours > 24 || (hours == 24 && minutes != 0) {
        return Err(TimeParseError::OutOfRange(clock.to_string()));
    }
    Ok(hours * 60 + minutes)
}

fn format_clock(minutes: u16) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

/// Day of the week.
///
/// Parses English names and abbreviations as well as Spanish day names
/// (with or without accents), case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

/// A day name that matches no known weekday.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown weekday {0:?}")]
pub struct UnknownWeekday(pub String);

impl Weekday {
    /// All days, Monday first.
    pub const ALL: [Weekday; 7] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
        Weekday::Sunday,
    ];

    /// English name.
    pub fn name(self) -> &'static str {
        match self {
            Weekday::Monday => "Monday",
            Weekday::Tuesday => "Tuesday",
            Weekday::Wednesday => "Wednesday",
            Weekday::Thursday => "Thursday",
            Weekday::Friday => "Friday",
            Weekday::Saturday => "Saturday",
            Weekday::Sunday => "Sunday",
        }
    }
}

impl FromStr for Weekday {
    type Err = UnknownWeekday;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase();
        let day = match key.as_str() {
            "monday" | "mon" | "lunes" | "lun" => Weekday::Monday,
            "tuesday" | "tue" | "martes" | "mar" => Weekday::Tuesday,
            "wednesday" | "wed" | "miércoles" | "miercoles" | "mié" | "mie" => {
                Weekday::Wednesday
            }
            "thursday" | "thu" | "jueves" | "jue" => Weekday::Thursday,
            "friday" | "fri" | "viernes" | "vie" => Weekday::Friday,
            "saturday" | "sat" | "sábado" | "sabado" | "sáb" | "sab" => Weekday::Saturday,
            "sunday" | "sun" | "domingo" | "dom" => Weekday::Sunday,
            _ => return Err(UnknownWeekday(s.to_string())),
        };
        Ok(day)
    }
}

impl TryFrom<String> for Weekday {
    type Error = UnknownWeekday;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Weekday> for String {
    fn from(day: Weekday) -> Self {
        day.name().to_string()
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Preferred part of the day, used to break ties between schedule options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeOfDay {
    /// Entirely within 08:00–13:00.
    Morning,
    /// Entirely within 13:00–18:00.
    Afternoon,
    /// Starting at or after 18:00.
    Night,
    /// Entirely within 08:00–18:00.
    Day,
    /// No preference: the first compatible option wins.
    #[default]
    #[serde(rename = "none")]
    NoPreference,
}

/// A half-open clock range `[start, end)` in minutes past midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeRange {
    start: u16,
    end: u16,
}

impl TimeRange {
    /// Creates a range from minute offsets. Fails unless `start < end <= 24:00`.
    pub fn new(start: u16, end: u16) -> Result<Self, TimeParseError> {
        if end > END_OF_DAY {
            return Err(TimeParseError::OutOfRange(format_clock(end)));
        }
        if start >= end {
            return Err(TimeParseError::EmptyRange(format!(
                "{}-{}",
                format_clock(start),
                format_clock(end)
            )));
        }
        Ok(Self { start, end })
    }

    /// Parses `"HH:MM-HH:MM"`.
    pub fn parse(s: &str) -> Result<Self, TimeParseError> {
        let (a, b) = s
            .split_once('-')
            .ok_or_else(|| TimeParseError::MalformedRange(s.to_string()))?;
        let start = time_to_minutes(a)?;
        let end = time_to_minutes(b)?;
        if start >= end {
            return Err(TimeParseError::EmptyRange(s.to_string()));
        }
        Ok(Self { start, end })
    }

    /// Start (minutes past midnight, inclusive).
    #[inline]
    pub fn start(&self) -> u16 {
        self.start
    }

    /// End (minutes past midnight, exclusive).
    #[inline]
    pub fn end(&self) -> u16 {
        self.end
    }

    /// Length in minutes.
    #[inline]
    pub fn duration_minutes(&self) -> u16 {
        self.end - self.start
    }

    /// Whether two ranges intersect. Touching ranges do not.
    #[inline]
    pub fn overlaps(&self, other: &Self) -> bool {
        other.start < self.end && self.start < other.end
    }

    /// Whether the range lies within `[from, to]`.
    #[inline]
    pub fn within(&self, from: u16, to: u16) -> bool {
        self.start >= from && self.end <= to
    }

    /// Whether the range satisfies a time-of-day preference.
    pub fn matches(&self, preference: TimeOfDay) -> bool {
        const H08: u16 = 8 * 60;
        const H13: u16 = 13 * 60;
        const H18: u16 = 18 * 60;
        match preference {
            TimeOfDay::Morning => self.within(H08, H13),
            TimeOfDay::Afternoon => self.within(H13, H18),
            TimeOfDay::Night => self.start >= H18,
            TimeOfDay::Day => self.within(H08, H18),
            TimeOfDay::NoPreference => true,
        }
    }
}

impl FromStr for TimeRange {
    type Err = TimeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for TimeRange {
    type Error = TimeParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TimeRange> for String {
    fn from(range: TimeRange) -> Self {
        range.to_string()
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", format_clock(self.start), format_clock(self.end))
    }
}

/// Errors produced by [`ScheduleOption::parse`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SlotParseError {
    /// A day name was not recognized.
    #[error(transparent)]
    Day(#[from] UnknownWeekday),
    /// The clock range was invalid.
    #[error(transparent)]
    Time(#[from] TimeParseError),
}

/// One candidate weekly slot for a course.
///
/// Days are kept sorted and deduplicated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScheduleOption {
    /// Days the class meets.
    pub days: Vec<Weekday>,
    /// Clock range on each of those days.
    pub time: TimeRange,
}

impl ScheduleOption {
    /// Creates a slot from days and a clock range.
    pub fn new(days: impl IntoIterator<Item = Weekday>, time: TimeRange) -> Self {
        let mut days: Vec<Weekday> = days.into_iter().collect();
        days.sort();
        days.dedup();
        Self { days, time }
    }

    /// Parses a slot from day names and an `"HH:MM-HH:MM"` range.
    pub fn parse<S: AsRef<str>>(days: &[S], time: &str) -> Result<Self, SlotParseError> {
        let parsed_days = days
            .iter()
            .map(|d| d.as_ref().parse::<Weekday>())
            .collect::<Result<Vec<_>, _>>()?;
        let range = TimeRange::parse(time)?;
        Ok(Self::new(parsed_days, range))
    }

    /// Whether the slot meets on the given day.
    pub fn meets_on(&self, day: Weekday) -> bool {
        self.days.binary_search(&day).is_ok()
    }

    /// Whether any weekday is shared with another slot.
    pub fn shares_day(&self, other: &Self) -> bool {
        self.days.iter().any(|d| other.meets_on(*d))
    }

    /// Weekly minutes spent in class.
    pub fn weekly_minutes(&self) -> u32 {
        self.days.len() as u32 * u32::from(self.time.duration_minutes())
    }
}

impl fmt::Display for ScheduleOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let days: Vec<&str> = self.days.iter().map(|d| d.name()).collect();
        write!(f, "{} {}", days.join("/"), self.time)
    }
}
