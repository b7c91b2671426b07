//! CPF (Brazilian individual taxpayer registry number) value object.
//!
//! A CPF is an 11-digit identifier whose last two digits are checksums over
//! the preceding ones. Everything here is deterministic and side-effect free:
//! input is reduced to digits before any decision, so `"111.444.777-35"` and
//! `"11144477735"` validate identically.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::value_object::ValueObject;

const CPF_DIGITS: usize = 11;

/// Strip non-digit characters, keeping at most the first 11 digits.
fn digits_of(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_digit())
        .take(CPF_DIGITS)
        .collect()
}

/// Progressive display mask for a (possibly partial) CPF.
///
/// Strips all non-digits, truncates beyond 11 digits and inserts separators
/// as the digits accumulate (`XXX.XXX.XXX-XX`). Total function: partial input
/// yields a partial mask, and re-formatting an already-masked value is a
/// no-op.
pub fn format_cpf(raw: &str) -> String {
    let d = digits_of(raw);
    match d.len() {
        0..=3 => d,
        4..=6 => format!("{}.{}", &d[..3], &d[3..]),
        7..=9 => format!("{}.{}.{}", &d[..3], &d[3..6], &d[6..]),
        _ => format!("{}.{}.{}-{}", &d[..3], &d[3..6], &d[6..9], &d[9..]),
    }
}

/// Weighted checksum digit over `digits[..len]` with weights `len+1 .. 2`.
///
/// remainder < 2 maps to 0, otherwise to `11 - remainder`.
fn check_digit(digits: &[u32], len: usize) -> u32 {
    let sum: u32 = digits[..len]
        .iter()
        .enumerate()
        .map(|(i, d)| d * (len as u32 + 1 - i as u32))
        .sum();
    let remainder = sum % 11;
    if remainder < 2 { 0 } else { 11 - remainder }
}

/// Validate a CPF in any separator formatting.
///
/// Rejects inputs that do not contain exactly 11 digits, the known-invalid
/// repeated-digit sequences (`000...0` through `999...9`), and anything whose
/// two check digits do not match the weighted sums over the first 9 and 10
/// digits respectively.
pub fn is_valid_cpf(raw: &str) -> bool {
    // digits_of truncates for display purposes; validation must reject longer
    // inputs too, so count digits on the raw string.
    if raw.chars().filter(|c| c.is_ascii_digit()).count() != CPF_DIGITS {
        return false;
    }

    let digits: Vec<u32> = digits_of(raw)
        .chars()
        .filter_map(|c| c.to_digit(10))
        .collect();

    if digits.iter().all(|&x| x == digits[0]) {
        return false;
    }

    digits[9] == check_digit(&digits, 9) && digits[10] == check_digit(&digits, 10)
}

/// A validated CPF, held in canonical digits-only form.
///
/// Construction goes through [`Cpf::parse`], so a `Cpf` in hand is always
/// checksum-valid. `Display` renders the masked form (`ddd.ddd.ddd-dd`);
/// serde round-trips the canonical digits and re-validates on deserialize.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Cpf(String);

impl Cpf {
    /// Parse and validate a CPF from raw user input (masked or not).
    pub fn parse(raw: &str) -> DomainResult<Self> {
        if is_valid_cpf(raw) {
            Ok(Self(digits_of(raw)))
        } else {
            Err(DomainError::validation("invalid CPF"))
        }
    }

    /// Canonical 11-digit form.
    pub fn digits(&self) -> &str {
        &self.0
    }

    /// Masked display form (`ddd.ddd.ddd-dd`).
    pub fn masked(&self) -> String {
        format_cpf(&self.0)
    }
}

impl ValueObject for Cpf {}

impl core::fmt::Display for Cpf {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.masked())
    }
}

impl TryFrom<String> for Cpf {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Cpf::parse(&value)
    }
}

impl From<Cpf> for String {
    fn from(value: Cpf) -> Self {
        value.0
    }
}
