//! Birth date value object and age derivation.
//!
//! Age is always derived from the birth date against a reference date, never
//! stored. The minimum-age gate for enrollment is 10 years.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::value_object::ValueObject;

/// Minimum age (in completed years) required to enroll.
pub const MINIMUM_ENROLLMENT_AGE: i32 = 10;

/// Completed years between `birth` and `reference`.
///
/// Year difference, minus one when the birthday has not yet been reached in
/// the reference year (`(month, day)` compared lexicographically). A Feb 29
/// birthday therefore counts as reached on Mar 1 of non-leap years.
pub fn compute_age(birth: NaiveDate, reference: NaiveDate) -> i32 {
    let mut age = reference.year() - birth.year();
    if (reference.month(), reference.day()) < (birth.month(), birth.day()) {
        age -= 1;
    }
    age
}

/// Whether the person born on `birth` has completed `min_years` by `reference`.
pub fn meets_minimum_age(birth: NaiveDate, reference: NaiveDate, min_years: i32) -> bool {
    compute_age(birth, reference) >= min_years
}

/// A calendar birth date (no time component).
///
/// Parsing accepts the ISO `YYYY-MM-DD` form produced by date inputs. An
/// unparseable value is a validation error for the caller ("date required"),
/// never a panic. Future dates are rejected by [`BirthDate::validate_against`]
/// rather than at parse time, because "the future" depends on the reference
/// date the caller is validating with.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BirthDate(NaiveDate);

impl BirthDate {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Parse from the `YYYY-MM-DD` wire/input form.
    pub fn parse(raw: &str) -> DomainResult<Self> {
        NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
            .map(Self)
            .map_err(|_| DomainError::validation("birth date is required (YYYY-MM-DD)"))
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    /// Completed years as of `reference`.
    pub fn age_on(&self, reference: NaiveDate) -> i32 {
        compute_age(self.0, reference)
    }

    /// Reject future dates and enforce the minimum enrollment age.
    pub fn validate_against(&self, reference: NaiveDate) -> DomainResult<()> {
        if self.0 > reference {
            return Err(DomainError::validation(
                "birth date cannot be in the future",
            ));
        }
        if !meets_minimum_age(self.0, reference, MINIMUM_ENROLLMENT_AGE) {
            return Err(DomainError::validation(format!(
                "applicant must be at least {MINIMUM_ENROLLMENT_AGE} years old"
            )));
        }
        Ok(())
    }
}

impl ValueObject for BirthDate {}

impl core::fmt::Display for BirthDate {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}
