//! CEP (Brazilian postal code) value object.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::value_object::ValueObject;

const CEP_DIGITS: usize = 8;

fn digits_of(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_digit())
        .take(CEP_DIGITS)
        .collect()
}

/// Progressive display mask for a (possibly partial) CEP (`XXXXX-XXX`).
pub fn format_cep(raw: &str) -> String {
    let d = digits_of(raw);
    match d.len() {
        0..=5 => d,
        _ => format!("{}-{}", &d[..5], &d[5..]),
    }
}

/// A validated CEP: exactly 8 digits, canonical digits-only form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Cep(String);

impl Cep {
    pub fn parse(raw: &str) -> DomainResult<Self> {
        let count = raw.chars().filter(|c| c.is_ascii_digit()).count();
        if count != CEP_DIGITS {
            return Err(DomainError::validation("CEP must have exactly 8 digits"));
        }
        Ok(Self(digits_of(raw)))
    }

    /// Canonical 8-digit form (what the address lookup expects in its path).
    pub fn digits(&self) -> &str {
        &self.0
    }

    pub fn masked(&self) -> String {
        format_cep(&self.0)
    }
}

impl ValueObject for Cep {}

impl core::fmt::Display for Cep {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.masked())
    }
}

impl TryFrom<String> for Cep {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Cep::parse(&value)
    }
}

impl From<Cep> for String {
    fn from(value: Cep) -> Self {
        value.0
    }
}
