//! Enrollment aggregate: the persisted record behind a submitted wizard.
//!
//! Lifecycle: `Submitted → Approved | Rejected | Waitlisted`, driven by the
//! monitor panel. A waitlisted enrollment may still be approved later (a slot
//! opened); nothing transitions out of Rejected.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use matricula_core::{Aggregate, AggregateId, AggregateRoot, DomainError, EditionId, MonitorId};
use matricula_events::Event;

use crate::application::EnrollmentApplication;

/// Enrollment identifier (edition-scoped via `edition_id` in events/commands).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnrollmentId(pub AggregateId);

impl EnrollmentId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for EnrollmentId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Review status of an enrollment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnrollmentStatus {
    /// Submitted and awaiting review.
    Submitted,
    /// Accepted into the course.
    Approved,
    /// Turned down (terminal).
    Rejected,
    /// Valid but over capacity ("excedente"); may be approved later.
    Waitlisted,
}

/// Aggregate root: one applicant's enrollment in one program edition.
#[derive(Debug, Clone, PartialEq)]
pub struct Enrollment {
    id: EnrollmentId,
    edition_id: Option<EditionId>,
    application: Option<EnrollmentApplication>,
    status: EnrollmentStatus,
    version: u64,
    submitted: bool,
}

impl Enrollment {
    /// Create an empty, not-yet-submitted instance for rehydration.
    pub fn empty(id: EnrollmentId) -> Self {
        Self {
            id,
            edition_id: None,
            application: None,
            status: EnrollmentStatus::Submitted,
            version: 0,
            submitted: false,
        }
    }

    pub fn id_typed(&self) -> EnrollmentId {
        self.id
    }

    pub fn edition_id(&self) -> Option<EditionId> {
        self.edition_id
    }

    pub fn application(&self) -> Option<&EnrollmentApplication> {
        self.application.as_ref()
    }

    pub fn status(&self) -> EnrollmentStatus {
        self.status
    }

    /// Invariant helper: whether a review decision can still be made.
    ///
    /// Rejected is terminal; approved stays approved.
    pub fn is_decidable(&self) -> bool {
        self.submitted
            && matches!(
                self.status,
                EnrollmentStatus::Submitted | EnrollmentStatus::Waitlisted
            )
    }
}

impl AggregateRoot for Enrollment {
    type Id = EnrollmentId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: SubmitEnrollment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitEnrollment {
    pub edition_id: EditionId,
    pub enrollment_id: EnrollmentId,
    pub application: EnrollmentApplication,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ApproveEnrollment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApproveEnrollment {
    pub edition_id: EditionId,
    pub enrollment_id: EnrollmentId,
    pub decided_by: MonitorId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RejectEnrollment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectEnrollment {
    pub edition_id: EditionId,
    pub enrollment_id: EnrollmentId,
    pub decided_by: MonitorId,
    /// Optional human-readable reason shown to the applicant.
    pub reason: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: WaitlistEnrollment ("excedente").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitlistEnrollment {
    pub edition_id: EditionId,
    pub enrollment_id: EnrollmentId,
    pub decided_by: MonitorId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EnrollmentCommand {
    SubmitEnrollment(SubmitEnrollment),
    ApproveEnrollment(ApproveEnrollment),
    RejectEnrollment(RejectEnrollment),
    WaitlistEnrollment(WaitlistEnrollment),
}

/// Event: EnrollmentSubmitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrollmentSubmitted {
    pub edition_id: EditionId,
    pub enrollment_id: EnrollmentId,
    pub application: EnrollmentApplication,
    pub occurred_at: DateTime<Utc>,
}

/// Event: EnrollmentApproved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrollmentApproved {
    pub edition_id: EditionId,
    pub enrollment_id: EnrollmentId,
    pub decided_by: MonitorId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: EnrollmentRejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrollmentRejected {
    pub edition_id: EditionId,
    pub enrollment_id: EnrollmentId,
    pub decided_by: MonitorId,
    pub reason: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: EnrollmentWaitlisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrollmentWaitlisted {
    pub edition_id: EditionId,
    pub enrollment_id: EnrollmentId,
    pub decided_by: MonitorId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EnrollmentEvent {
    EnrollmentSubmitted(EnrollmentSubmitted),
    EnrollmentApproved(EnrollmentApproved),
    EnrollmentRejected(EnrollmentRejected),
    EnrollmentWaitlisted(EnrollmentWaitlisted),
}

impl Event for EnrollmentEvent {
    fn event_type(&self) -> &'static str {
        match self {
            EnrollmentEvent::EnrollmentSubmitted(_) => "enrollment.submitted",
            EnrollmentEvent::EnrollmentApproved(_) => "enrollment.approved",
            EnrollmentEvent::EnrollmentRejected(_) => "enrollment.rejected",
            EnrollmentEvent::EnrollmentWaitlisted(_) => "enrollment.waitlisted",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            EnrollmentEvent::EnrollmentSubmitted(e) => e.occurred_at,
            EnrollmentEvent::EnrollmentApproved(e) => e.occurred_at,
            EnrollmentEvent::EnrollmentRejected(e) => e.occurred_at,
            EnrollmentEvent::EnrollmentWaitlisted(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Enrollment {
    type Command = EnrollmentCommand;
    type Event = EnrollmentEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            EnrollmentEvent::EnrollmentSubmitted(e) => {
                self.id = e.enrollment_id;
                self.edition_id = Some(e.edition_id);
                self.application = Some(e.application.clone());
                self.status = EnrollmentStatus::Submitted;
                self.submitted = true;
            }
            EnrollmentEvent::EnrollmentApproved(_) => {
                self.status = EnrollmentStatus::Approved;
            }
            EnrollmentEvent::EnrollmentRejected(_) => {
                self.status = EnrollmentStatus::Rejected;
            }
            EnrollmentEvent::EnrollmentWaitlisted(_) => {
                self.status = EnrollmentStatus::Waitlisted;
            }
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            EnrollmentCommand::SubmitEnrollment(cmd) => self.handle_submit(cmd),
            EnrollmentCommand::ApproveEnrollment(cmd) => self.handle_approve(cmd),
            EnrollmentCommand::RejectEnrollment(cmd) => self.handle_reject(cmd),
            EnrollmentCommand::WaitlistEnrollment(cmd) => self.handle_waitlist(cmd),
        }
    }
}

impl Enrollment {
    fn ensure_edition(&self, edition_id: EditionId) -> Result<(), DomainError> {
        if !self.submitted {
            return Ok(());
        }
        if self.edition_id != Some(edition_id) {
            return Err(DomainError::invariant("edition mismatch"));
        }
        Ok(())
    }

    fn ensure_enrollment_id(&self, enrollment_id: EnrollmentId) -> Result<(), DomainError> {
        if self.id != enrollment_id {
            return Err(DomainError::invariant("enrollment_id mismatch"));
        }
        Ok(())
    }

    fn ensure_decidable(&self) -> Result<(), DomainError> {
        if !self.submitted {
            return Err(DomainError::not_found());
        }
        match self.status {
            EnrollmentStatus::Submitted | EnrollmentStatus::Waitlisted => Ok(()),
            EnrollmentStatus::Approved => Err(DomainError::conflict("enrollment already approved")),
            EnrollmentStatus::Rejected => Err(DomainError::conflict("enrollment was rejected")),
        }
    }

    fn handle_submit(&self, cmd: &SubmitEnrollment) -> Result<Vec<EnrollmentEvent>, DomainError> {
        if self.submitted {
            return Err(DomainError::conflict("enrollment already submitted"));
        }

        // Defense in depth: re-run the wizard's semantic checks server-side.
        cmd.application.validate(cmd.occurred_at.date_naive())?;

        Ok(vec![EnrollmentEvent::EnrollmentSubmitted(
            EnrollmentSubmitted {
                edition_id: cmd.edition_id,
                enrollment_id: cmd.enrollment_id,
                application: cmd.application.clone(),
                occurred_at: cmd.occurred_at,
            },
        )])
    }

    fn handle_approve(&self, cmd: &ApproveEnrollment) -> Result<Vec<EnrollmentEvent>, DomainError> {
        self.ensure_decidable()?;
        self.ensure_edition(cmd.edition_id)?;
        self.ensure_enrollment_id(cmd.enrollment_id)?;

        Ok(vec![EnrollmentEvent::EnrollmentApproved(
            EnrollmentApproved {
                edition_id: cmd.edition_id,
                enrollment_id: cmd.enrollment_id,
                decided_by: cmd.decided_by,
                occurred_at: cmd.occurred_at,
            },
        )])
    }

    fn handle_reject(&self, cmd: &RejectEnrollment) -> Result<Vec<EnrollmentEvent>, DomainError> {
        self.ensure_decidable()?;
        self.ensure_edition(cmd.edition_id)?;
        self.ensure_enrollment_id(cmd.enrollment_id)?;

        Ok(vec![EnrollmentEvent::EnrollmentRejected(
            EnrollmentRejected {
                edition_id: cmd.edition_id,
                enrollment_id: cmd.enrollment_id,
                decided_by: cmd.decided_by,
                reason: cmd.reason.clone(),
                occurred_at: cmd.occurred_at,
            },
        )])
    }

    fn handle_waitlist(
        &self,
        cmd: &WaitlistEnrollment,
    ) -> Result<Vec<EnrollmentEvent>, DomainError> {
        self.ensure_decidable()?;
        self.ensure_edition(cmd.edition_id)?;
        self.ensure_enrollment_id(cmd.enrollment_id)?;

        if self.status == EnrollmentStatus::Waitlisted {
            return Err(DomainError::conflict("enrollment is already waitlisted"));
        }

        Ok(vec![EnrollmentEvent::EnrollmentWaitlisted(
            EnrollmentWaitlisted {
                edition_id: cmd.edition_id,
                enrollment_id: cmd.enrollment_id,
                decided_by: cmd.decided_by,
                occurred_at: cmd.occurred_at,
            },
        )])
    }
}
