//! `matricula-enrollment` — the enrollment domain.
//!
//! Client-facing half: declarative per-step field schemas, the multi-step
//! wizard state machine (advancement gated on step validity) and the tagged
//! remote-uniqueness model (last-edit-wins).
//!
//! Server-facing half: the event-sourced `Enrollment` aggregate covering the
//! submit → approve / reject / waitlist lifecycle driven from the monitor
//! panel.

pub mod application;
pub mod enrollment;
pub mod flows;
pub mod schema;
pub mod uniqueness;
pub mod wizard;

pub use application::{Address, EnrollmentApplication, SchoolingLevel, school_year_options};
pub use enrollment::{
    ApproveEnrollment, Enrollment, EnrollmentApproved, EnrollmentCommand, EnrollmentEvent,
    EnrollmentId, EnrollmentRejected, EnrollmentStatus, EnrollmentSubmitted, EnrollmentWaitlisted,
    RejectEnrollment, SubmitEnrollment, WaitlistEnrollment,
};
pub use flows::{Flow, FlowKind};
pub use schema::{
    ConfirmationSpec, FieldSpec, RemoteFlags, Rule, StepSchema, StepValidation, validate_step,
};
pub use uniqueness::{ProbeTag, UniquenessProbe};
pub use wizard::{Wizard, WizardPhase};
