//! Multi-step enrollment wizard state machine.
//!
//! One state per step (1..N), an explicit Submitted terminal, and three
//! transitions: `next` (gated on the active step's validity), `back` (always
//! allowed above step 1, preserves everything) and submission (last step
//! only). Validity is never cached; it is re-derived from the current field
//! values, confirmations and remote flags on every query.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;

use matricula_core::{DomainError, DomainResult, format_cep, format_cpf, format_phone};

use crate::flows::Flow;
use crate::schema::{RemoteFlags, StepValidation, validate_step};
use crate::uniqueness::{ProbeTag, UniquenessProbe};

/// Lifecycle phase of the wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardPhase {
    /// Collecting data; `current` is the 1-based active step.
    InProgress { current: usize },
    /// Terminal: the enrollment was accepted by the server.
    Submitted,
}

/// Per-step mutable state: the field bag and what the user has interacted with.
#[derive(Debug, Clone, Default)]
struct StepState {
    values: BTreeMap<String, String>,
    touched: BTreeSet<String>,
    confirmations: BTreeSet<String>,
}

/// The wizard: owns all step state plus the CPF uniqueness probe.
///
/// `reference` is the date used for age checks, injected so tests are
/// deterministic and the wizard itself never reads the clock.
#[derive(Debug, Clone)]
pub struct Wizard {
    flow: Flow,
    steps: Vec<StepState>,
    phase: WizardPhase,
    probe: UniquenessProbe,
    prefilled: BTreeMap<String, String>,
    submit_error: Option<String>,
    reference: NaiveDate,
}

impl Wizard {
    pub fn new(flow: Flow, reference: NaiveDate) -> Self {
        let steps = vec![StepState::default(); flow.len()];
        Self {
            flow,
            steps,
            phase: WizardPhase::InProgress { current: 1 },
            probe: UniquenessProbe::new(),
            prefilled: BTreeMap::new(),
            submit_error: None,
            reference,
        }
    }

    /// Prefill a value outside the step schemas (e.g. the e-mail carried in
    /// from the landing page). Prefilled values are merged into the collected
    /// bag but never marked touched.
    pub fn with_prefilled(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.prefilled.insert(field.into(), value.into());
        self
    }

    pub fn phase(&self) -> WizardPhase {
        self.phase
    }

    pub fn is_submitted(&self) -> bool {
        self.phase == WizardPhase::Submitted
    }

    /// 1-based active step; the last value it had once submitted.
    pub fn current_step(&self) -> usize {
        match self.phase {
            WizardPhase::InProgress { current } => current,
            WizardPhase::Submitted => self.flow.len(),
        }
    }

    pub fn step_count(&self) -> usize {
        self.flow.len()
    }

    fn ensure_in_progress(&self) -> DomainResult<usize> {
        match self.phase {
            WizardPhase::InProgress { current } => Ok(current),
            WizardPhase::Submitted => Err(DomainError::invariant("wizard already submitted")),
        }
    }

    // ── field edits ──────────────────────────────────────────────────────

    /// Edit a field of the active step.
    ///
    /// Applies the input mask for masked fields (CPF, CEP, phone), marks the
    /// field touched, restarts the CPF uniqueness probe on CPF edits and
    /// resets the dependent school-year field when the schooling level
    /// changes. Returns the stored (masked) value.
    pub fn edit(&mut self, field: &str, raw: &str) -> DomainResult<String> {
        let current = self.ensure_in_progress()?;
        let schema = self
            .flow
            .step(current)
            .ok_or_else(|| DomainError::invariant("active step out of range"))?;
        if !schema.has_field(field) {
            return Err(DomainError::validation(format!(
                "step {current} has no field '{field}'"
            )));
        }

        let value = match field {
            "cpf" => format_cpf(raw),
            "cep" => format_cep(raw),
            "telefone_whatsapp" => format_phone(raw),
            _ => raw.to_string(),
        };

        let state = &mut self.steps[current - 1];
        state.values.insert(field.to_string(), value.clone());
        state.touched.insert(field.to_string());

        // A stale school year from the previous level must not survive as
        // valid: the option set is a function of the schooling level.
        if field == "escolaridade" {
            state.values.remove("ano_escolar");
            state.touched.remove("ano_escolar");
        }

        if field == "cpf" {
            self.probe.edit(value.clone());
        }

        self.submit_error = None;
        Ok(value)
    }

    /// Toggle a manual confirmation (checkbox) on the active step.
    pub fn set_confirmation(&mut self, name: &str, checked: bool) -> DomainResult<()> {
        let current = self.ensure_in_progress()?;
        let schema = self
            .flow
            .step(current)
            .ok_or_else(|| DomainError::invariant("active step out of range"))?;
        if !schema.confirmations.iter().any(|c| c.name == name) {
            return Err(DomainError::validation(format!(
                "step {current} has no confirmation '{name}'"
            )));
        }

        let state = &mut self.steps[current - 1];
        if checked {
            state.confirmations.insert(name.to_string());
        } else {
            state.confirmations.remove(name);
        }
        Ok(())
    }

    // ── remote uniqueness ────────────────────────────────────────────────

    /// Tag for the latest CPF edit; requests must carry it.
    pub fn cpf_tag(&self) -> ProbeTag {
        self.probe.current_tag()
    }

    /// The CPF value the latest tag refers to (masked form).
    pub fn cpf_value(&self) -> &str {
        self.probe.value()
    }

    /// Apply an existence-check response; stale tags are discarded.
    pub fn resolve_cpf_check(&mut self, tag: ProbeTag, exists: bool) -> bool {
        self.probe.resolve(tag, exists)
    }

    fn remote_flags(&self) -> RemoteFlags {
        RemoteFlags {
            cpf_exists: self.probe.exists(),
        }
    }

    // ── validity ─────────────────────────────────────────────────────────

    /// Validate the given (1-based) step against its schema right now.
    pub fn validation_for(&self, step: usize) -> StepValidation {
        let Some(schema) = self.flow.step(step) else {
            return StepValidation::default();
        };
        let state = &self.steps[step - 1];
        validate_step(
            schema,
            &state.values,
            &state.confirmations,
            &self.remote_flags(),
            self.reference,
        )
    }

    pub fn current_validation(&self) -> StepValidation {
        self.validation_for(self.current_step())
    }

    pub fn is_current_step_valid(&self) -> bool {
        self.current_validation().is_valid()
    }

    /// Error message for a field of the active step, only once the field has
    /// been touched. Untouched fields never show errors.
    pub fn field_error(&self, field: &str) -> Option<String> {
        let current = self.current_step();
        let state = &self.steps[current - 1];
        if !state.touched.contains(field) {
            return None;
        }
        self.validation_for(current)
            .error(field)
            .map(str::to_string)
    }

    /// Current value of a field on the active step.
    pub fn value(&self, field: &str) -> Option<&str> {
        let state = &self.steps[self.current_step() - 1];
        state.values.get(field).map(String::as_str)
    }

    // ── transitions ──────────────────────────────────────────────────────

    /// Advance to the next step.
    ///
    /// Fails (leaving the step unchanged) while the active step is invalid;
    /// a no-op on the last step, where submission replaces advancement.
    pub fn next(&mut self) -> DomainResult<()> {
        let current = self.ensure_in_progress()?;
        if !self.is_current_step_valid() {
            return Err(DomainError::validation(
                "complete the current step before continuing",
            ));
        }
        if current < self.flow.len() {
            self.phase = WizardPhase::InProgress {
                current: current + 1,
            };
        }
        Ok(())
    }

    /// Go back one step. Always permitted above step 1; entered data and
    /// resolved remote checks are preserved.
    pub fn back(&mut self) {
        if let WizardPhase::InProgress { current } = self.phase {
            if current > 1 {
                self.phase = WizardPhase::InProgress {
                    current: current - 1,
                };
            }
        }
    }

    /// Whether submission is currently permitted (last step, valid, not yet
    /// submitted).
    pub fn can_submit(&self) -> bool {
        matches!(self.phase, WizardPhase::InProgress { current } if current == self.flow.len())
            && self.is_current_step_valid()
    }

    /// Record a successful enrollment creation: transition to the terminal
    /// Submitted state.
    pub fn complete_submission(&mut self) -> DomainResult<()> {
        if !self.can_submit() {
            return Err(DomainError::invariant(
                "submission is only permitted from a valid final step",
            ));
        }
        self.phase = WizardPhase::Submitted;
        self.submit_error = None;
        Ok(())
    }

    /// Record a failed enrollment creation: stay on the final step and
    /// surface the reason; the user may retry indefinitely.
    pub fn fail_submission(&mut self, reason: impl Into<String>) {
        if self.phase != WizardPhase::Submitted {
            self.submit_error = Some(reason.into());
        }
    }

    pub fn submit_error(&self) -> Option<&str> {
        self.submit_error.as_deref()
    }

    // ── collected output ─────────────────────────────────────────────────

    /// The merged field bag across all steps (plus prefilled values), as the
    /// submission endpoint expects it.
    pub fn collected_values(&self) -> BTreeMap<String, String> {
        let mut bag = self.prefilled.clone();
        for state in &self.steps {
            for (k, v) in &state.values {
                bag.insert(k.clone(), v.clone());
            }
        }
        bag
    }
}
