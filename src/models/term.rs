//! Academic terms and the planning horizon.
//!
//! A term is one half-year slot identified by `(year, half)` and written
//! `"{year}C{half}"`, e.g. `"2C1"` for the first half of the second year.
//! The horizon is the ordered window of terms a plan may use.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors parsing a term identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed term {0:?}, expected <year>C<half> such as 1C2")]
pub struct TermParseError(pub String);

/// Errors building a horizon.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HorizonError {
    /// The horizon has no terms.
    #[error("planning horizon is empty")]
    Empty,
    /// A term appears twice.
    #[error("term {0} appears more than once in the horizon")]
    DuplicateTerm(TermId),
    /// Terms are not in increasing order.
    #[error("term {next} does not come after {previous}")]
    NotIncreasing {
        /// The earlier entry.
        previous: TermId,
        /// The offending entry.
        next: TermId,
    },
}

/// An academic term. Ordered by year, then half.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TermId {
    /// Academic year (1-based).
    pub year: u32,
    /// Term within the year (1-based).
    pub half: u32,
}

impl TermId {
    /// Creates a term identifier.
    pub const fn new(year: u32, half: u32) -> Self {
        Self { year, half }
    }
}

impl FromStr for TermId {
    type Err = TermParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || TermParseError(s.to_string());
        let (year, half) = s
            .trim()
            .split_once(['C', 'c'])
            .ok_or_else(err)?;
        let year: u32 = year.parse().map_err(|_| err())?;
        let half: u32 = half.parse().map_err(|_| err())?;
        Ok(Self { year, half })
    }
}

impl TryFrom<String> for TermId {
    type Error = TermParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TermId> for String {
    fn from(term: TermId) -> Self {
        term.to_string()
    }
}

impl fmt::Display for TermId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}C{}", self.year, self.half)
    }
}

/// Ordered, duplicate-free sequence of terms available for planning.
///
/// The position of a term in the horizon is what "earlier" means for
/// prerequisite checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<TermId>", into = "Vec<TermId>")]
pub struct Horizon {
    terms: Vec<TermId>,
}

impl Horizon {
    /// Builds a horizon, rejecting empty, duplicated or unordered input.
    pub fn new(terms: Vec<TermId>) -> Result<Self, HorizonError> {
        if terms.is_empty() {
            return Err(HorizonError::Empty);
        }
        for pair in terms.windows(2) {
            if pair[0] == pair[1] {
                return Err(HorizonError::DuplicateTerm(pair[1]));
            }
            if pair[0] > pair[1] {
                return Err(HorizonError::NotIncreasing {
                    previous: pair[0],
                    next: pair[1],
                });
            }
        }
        Ok(Self { terms })
    }

    /// Generates `years × terms_per_year` consecutive terms starting at `1C1`.
    ///
    /// Zero arguments are raised to one so the horizon is never empty.
    pub fn years(years: u32, terms_per_year: u32) -> Self {
        let terms = (1..=years.max(1))
            .flat_map(|y| (1..=terms_per_year.max(1)).map(move |h| TermId::new(y, h)))
            .collect();
        Self { terms }
    }

    /// Terms in planning order.
    pub fn terms(&self) -> &[TermId] {
        &self.terms
    }

    /// Number of terms.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Always false for a constructed horizon.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Position of a term, if it is part of the horizon.
    pub fn position(&self, term: TermId) -> Option<usize> {
        self.terms.binary_search(&term).ok()
    }

    /// Term at a position.
    pub fn get(&self, index: usize) -> Option<TermId> {
        self.terms.get(index).copied()
    }

    /// Whether the horizon contains a term.
    pub fn contains(&self, term: TermId) -> bool {
        self.position(term).is_some()
    }
}

impl Default for Horizon {
    /// Ten years of two terms each.
    fn default() -> Self {
        Self::years(10, 2)
    }
}

impl TryFrom<Vec<TermId>> for Horizon {
    type Error = HorizonError;

    fn try_from(terms: Vec<TermId>) -> Result<Self, Self::Error> {
        Self::new(terms)
    }
}

impl From<Horizon> for Vec<TermId> {
    fn from(horizon: Horizon) -> Self {
        horizon.terms
    }
}
