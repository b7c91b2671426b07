//! Phone number value object (Brazilian mobile/WhatsApp numbers).

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::value_object::ValueObject;

const PHONE_MAX_DIGITS: usize = 11;
const PHONE_MIN_DIGITS: usize = 10;

fn digits_of(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_digit())
        .take(PHONE_MAX_DIGITS)
        .collect()
}

/// Progressive display mask for a phone number (`(XX) XXXXX-XXXX`).
///
/// The dash lands after the fifth local digit, so a complete 11-digit mobile
/// number formats to exactly 15 characters (the wizard's "complete phone"
/// threshold).
pub fn format_phone(raw: &str) -> String {
    let d = digits_of(raw);
    match d.len() {
        0..=2 => d,
        3..=7 => format!("({}) {}", &d[..2], &d[2..]),
        _ => format!("({}) {}-{}", &d[..2], &d[2..7], &d[7..]),
    }
}

/// A validated phone number: 10 or 11 digits, canonical digits-only form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Phone(String);

impl Phone {
    pub fn parse(raw: &str) -> DomainResult<Self> {
        let count = raw.chars().filter(|c| c.is_ascii_digit()).count();
        if !(PHONE_MIN_DIGITS..=PHONE_MAX_DIGITS).contains(&count) {
            return Err(DomainError::validation(
                "phone must have 10 or 11 digits (area code included)",
            ));
        }
        Ok(Self(digits_of(raw)))
    }

    pub fn digits(&self) -> &str {
        &self.0
    }

    pub fn masked(&self) -> String {
        format_phone(&self.0)
    }
}

impl ValueObject for Phone {}

impl core::fmt::Display for Phone {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.masked())
    }
}

impl TryFrom<String> for Phone {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Phone::parse(&value)
    }
}

impl From<Phone> for String {
    fn from(value: Phone) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_masks_progressively() {
        assert_eq!(format_phone(""), "");
        assert_eq!(format_phone("98"), "98");
        assert_eq!(format_phone("989"), "(98) 9");
        assert_eq!(format_phone("9898123"), "(98) 98123");
        assert_eq!(format_phone("98981234"), "(98) 98123-4");
        assert_eq!(format_phone("98981234567"), "(98) 98123-4567");
    }

    #[test]
    fn complete_mobile_number_formats_to_fifteen_chars() {
        assert_eq!(format_phone("98981234567").len(), 15);
    }

    #[test]
    fn format_truncates_beyond_eleven_digits() {
        assert_eq!(format_phone("989812345679999"), "(98) 98123-4567");
    }

    #[test]
    fn parse_accepts_ten_or_eleven_digits() {
        assert!(Phone::parse("(98) 98123-4567").is_ok());
        assert!(Phone::parse("9898123456").is_ok());
        assert!(Phone::parse("989812345").is_err());
        assert!(Phone::parse("").is_err());
    }
}
