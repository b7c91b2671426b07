//! Declarative per-step validation schemas.
//!
//! Each wizard step carries a schema: an ordered list of field rules plus any
//! required manual confirmations (checkboxes). Validity is always re-derived
//! by [`validate_step`], a pure function of `(schema, values, remote flags,
//! reference date)`, so there is no imperative revalidation to forget.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;

use matricula_core::{BirthDate, is_valid_cpf, meets_minimum_age};

/// A single validation rule for a field.
///
/// Rules run in declaration order; the first failing rule supplies the
/// field's error message. For an empty value only `Required` fires; the
/// remaining rules are skipped, so optional fields stay valid when blank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    /// Non-empty after trimming.
    Required,
    /// Minimum length of the (formatted) value.
    MinLen(usize),
    /// Exact count of digit characters.
    ExactDigits(usize),
    /// Exactly `n` ASCII letters, uppercased (state code).
    UppercaseLetters(usize),
    /// Value must be one of the listed options.
    OneOf(&'static [&'static str]),
    /// Value must pass the CPF checksum.
    ValidCpf,
    /// Value must parse as a date, not lie in the future, and meet the
    /// minimum age in completed years.
    MinimumAge(i32),
}

/// A field and its ordered rules, each paired with its failure message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub rules: Vec<(Rule, &'static str)>,
}

impl FieldSpec {
    pub fn new(name: &'static str, rules: Vec<(Rule, &'static str)>) -> Self {
        Self { name, rules }
    }
}

/// A manual confirmation (checkbox) the step requires before it is valid.
///
/// Not expressible as a string-field rule: the box is either checked or not,
/// and validity is the boolean AND of the schema result with every
/// confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmationSpec {
    pub name: &'static str,
    pub message: &'static str,
}

/// Schema for one wizard step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepSchema {
    pub title: &'static str,
    pub fields: Vec<FieldSpec>,
    pub confirmations: Vec<ConfirmationSpec>,
}

impl StepSchema {
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }
}

/// Latest results of asynchronous remote checks, merged into step validity.
///
/// `cpf_exists == Some(true)` forces the CPF field invalid regardless of the
/// schema result; `None` means the check is still unresolved (or not
/// applicable), which does not block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RemoteFlags {
    pub cpf_exists: Option<bool>,
}

/// Outcome of validating one step: field name → first failing message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepValidation {
    errors: BTreeMap<String, String>,
}

impl StepValidation {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn error(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }

    pub fn errors(&self) -> impl Iterator<Item = (&str, &str)> {
        self.errors.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    fn insert(&mut self, field: &str, message: impl Into<String>) {
        self.errors.entry(field.to_string()).or_insert(message.into());
    }
}

fn digit_count(value: &str) -> usize {
    value.chars().filter(|c| c.is_ascii_digit()).count()
}

fn rule_passes(rule: &Rule, value: &str, reference: NaiveDate) -> bool {
    match rule {
        Rule::Required => !value.trim().is_empty(),
        Rule::MinLen(n) => value.chars().count() >= *n,
        Rule::ExactDigits(n) => digit_count(value) == *n,
        Rule::UppercaseLetters(n) => {
            value.chars().count() == *n && value.chars().all(|c| c.is_ascii_uppercase())
        }
        Rule::OneOf(options) => options.contains(&value),
        Rule::ValidCpf => is_valid_cpf(value),
        Rule::MinimumAge(min_years) => match BirthDate::parse(value) {
            Ok(birth) => {
                birth.date() <= reference
                    && meets_minimum_age(birth.date(), reference, *min_years)
            }
            Err(_) => false,
        },
    }
}

/// Validate a step's field values and confirmations against its schema.
///
/// Pure and total: re-run on every relevant input change (field edit, remote
/// result arriving, checkbox toggle). `reference` is "today" for age checks.
pub fn validate_step(
    schema: &StepSchema,
    values: &BTreeMap<String, String>,
    confirmations: &BTreeSet<String>,
    remote: &RemoteFlags,
    reference: NaiveDate,
) -> StepValidation {
    let mut result = StepValidation::default();
    let empty = String::new();

    for field in &schema.fields {
        let value = values.get(field.name).unwrap_or(&empty);

        for (rule, message) in &field.rules {
            // Blank optional fields skip everything but Required.
            if value.trim().is_empty() && !matches!(rule, Rule::Required) {
                continue;
            }
            if !rule_passes(rule, value, reference) {
                result.insert(field.name, *message);
                break;
            }
        }

        // The duplicate-CPF flag overrides a schema-clean CPF field.
        if field.name == "cpf"
            && result.error("cpf").is_none()
            && remote.cpf_exists == Some(true)
        {
            result.insert("cpf", "an enrollment with this CPF already exists");
        }
    }

    for confirmation in &schema.confirmations {
        if !confirmations.contains(confirmation.name) {
            result.insert(confirmation.name, confirmation.message);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()
    }

    fn personal_schema() -> StepSchema {
        StepSchema {
            title: "personal",
            fields: vec![
                FieldSpec::new(
                    "nome",
                    vec![
                        (Rule::Required, "name is required"),
                        (Rule::MinLen(2), "name must have at least 2 characters"),
                    ],
                ),
                FieldSpec::new(
                    "cpf",
                    vec![
                        (Rule::Required, "CPF is required"),
                        (Rule::ExactDigits(11), "CPF must be complete"),
                        (Rule::ValidCpf, "invalid CPF"),
                    ],
                ),
            ],
            confirmations: vec![ConfirmationSpec {
                name: "genero_confirmado",
                message: "confirm the self-identification statement",
            }],
        }
    }

    fn values(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn first_failing_rule_wins() {
        let v = values(&[("nome", "A"), ("cpf", "123")]);
        let result = validate_step(
            &personal_schema(),
            &v,
            &BTreeSet::new(),
            &RemoteFlags::default(),
            reference(),
        );
        assert_eq!(result.error("nome"), Some("name must have at least 2 characters"));
        assert_eq!(result.error("cpf"), Some("CPF must be complete"));
    }

    #[test]
    fn missing_required_field_reports_required_message() {
        let result = validate_step(
            &personal_schema(),
            &BTreeMap::new(),
            &BTreeSet::new(),
            &RemoteFlags::default(),
            reference(),
        );
        assert_eq!(result.error("nome"), Some("name is required"));
    }

    #[test]
    fn remote_duplicate_flag_forces_cpf_invalid() {
        let v = values(&[("nome", "Ana Silva"), ("cpf", "111.444.777-35")]);
        let mut confirmations = BTreeSet::new();
        confirmations.insert("genero_confirmado".to_string());

        let clean = validate_step(
            &personal_schema(),
            &v,
            &confirmations,
            &RemoteFlags { cpf_exists: Some(false) },
            reference(),
        );
        assert!(clean.is_valid());

        let duplicate = validate_step(
            &personal_schema(),
            &v,
            &confirmations,
            &RemoteFlags { cpf_exists: Some(true) },
            reference(),
        );
        assert!(!duplicate.is_valid());
        assert!(duplicate.error("cpf").unwrap().contains("already exists"));
    }

    #[test]
    fn unresolved_remote_check_does_not_block() {
        let v = values(&[("nome", "Ana Silva"), ("cpf", "111.444.777-35")]);
        let mut confirmations = BTreeSet::new();
        confirmations.insert("genero_confirmado".to_string());

        let pending = validate_step(
            &personal_schema(),
            &v,
            &confirmations,
            &RemoteFlags { cpf_exists: None },
            reference(),
        );
        assert!(pending.is_valid());
    }

    #[test]
    fn unchecked_confirmation_invalidates_step() {
        let v = values(&[("nome", "Ana Silva"), ("cpf", "111.444.777-35")]);
        let result = validate_step(
            &personal_schema(),
            &v,
            &BTreeSet::new(),
            &RemoteFlags { cpf_exists: Some(false) },
            reference(),
        );
        assert!(!result.is_valid());
        assert!(result.error("genero_confirmado").is_some());
    }

    #[test]
    fn minimum_age_rule_parses_and_gates() {
        let schema = StepSchema {
            title: "dates",
            fields: vec![FieldSpec::new(
                "data_nascimento",
                vec![
                    (Rule::Required, "birth date is required"),
                    (Rule::MinimumAge(10), "applicant must be at least 10 years old"),
                ],
            )],
            confirmations: vec![],
        };

        let ok = validate_step(
            &schema,
            &values(&[("data_nascimento", "2015-06-15")]),
            &BTreeSet::new(),
            &RemoteFlags::default(),
            reference(),
        );
        assert!(ok.is_valid());

        let young = validate_step(
            &schema,
            &values(&[("data_nascimento", "2015-06-16")]),
            &BTreeSet::new(),
            &RemoteFlags::default(),
            reference(),
        );
        assert!(!young.is_valid());

        let future = validate_step(
            &schema,
            &values(&[("data_nascimento", "2026-01-01")]),
            &BTreeSet::new(),
            &RemoteFlags::default(),
            reference(),
        );
        assert!(!future.is_valid());

        let garbage = validate_step(
            &schema,
            &values(&[("data_nascimento", "15/06/2015")]),
            &BTreeSet::new(),
            &RemoteFlags::default(),
            reference(),
        );
        assert!(!garbage.is_valid());
    }

    #[test]
    fn optional_blank_field_skips_non_required_rules() {
        let schema = StepSchema {
            title: "address",
            fields: vec![FieldSpec::new(
                "complemento",
                vec![(Rule::MinLen(3), "complement too short")],
            )],
            confirmations: vec![],
        };
        let result = validate_step(
            &schema,
            &BTreeMap::new(),
            &BTreeSet::new(),
            &RemoteFlags::default(),
            reference(),
        );
        assert!(result.is_valid());
    }
}
