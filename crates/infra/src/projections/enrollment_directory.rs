//! Enrollment directory projection.
//!
//! Consumes published envelopes (JSON payloads) and maintains an
//! edition-isolated read model of enrollments for the monitor panel list and
//! the per-edition CPF existence lookup behind `POST /api/check-cpf`.

use std::collections::HashMap;
use std::sync::RwLock;

use serde_json::Value as JsonValue;
use thiserror::Error;

use matricula_core::{AggregateId, EditionId};
use matricula_enrollment::{EnrollmentEvent, EnrollmentId, EnrollmentStatus};
use matricula_events::EventEnvelope;

use crate::read_model::EditionStore;

/// Queryable enrollment read model row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrollmentReadModel {
    pub enrollment_id: EnrollmentId,
    pub name: String,
    /// Canonical digits-only CPF (uniqueness key within an edition).
    pub cpf: String,
    pub email: String,
    pub course: String,
    pub status: EnrollmentStatus,
}

/// Edition+aggregate cursor to support at-least-once delivery (idempotent
/// projection).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
struct CursorKey {
    edition_id: EditionId,
    aggregate_id: AggregateId,
}

#[derive(Debug, Error)]
pub enum ProjectionError {
    #[error("failed to deserialize enrollment event: {0}")]
    Deserialize(String),

    #[error("projection row missing for decision event on {0}")]
    MissingRow(String),
}

/// Enrollment directory projection.
#[derive(Debug)]
pub struct EnrollmentDirectoryProjection<S>
where
    S: EditionStore<EnrollmentId, EnrollmentReadModel>,
{
    store: S,
    cursors: RwLock<HashMap<CursorKey, u64>>,
}

impl<S> EnrollmentDirectoryProjection<S>
where
    S: EditionStore<EnrollmentId, EnrollmentReadModel>,
{
    pub fn new(store: S) -> Self {
        Self {
            store,
            cursors: RwLock::new(HashMap::new()),
        }
    }

    /// Apply one published envelope.
    ///
    /// Envelopes for other aggregate types are ignored; envelopes at or
    /// behind the stream cursor are duplicates and are skipped (idempotence
    /// under at-least-once delivery).
    pub fn apply_envelope(
        &self,
        envelope: &EventEnvelope<JsonValue>,
    ) -> Result<(), ProjectionError> {
        if envelope.aggregate_type() != "enrollment" {
            return Ok(());
        }

        let key = CursorKey {
            edition_id: envelope.edition_id(),
            aggregate_id: envelope.aggregate_id(),
        };

        {
            let cursors = self
                .cursors
                .read()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            if let Some(&seen) = cursors.get(&key) {
                if envelope.sequence_number() <= seen {
                    return Ok(());
                }
            }
        }

        let event: EnrollmentEvent = serde_json::from_value(envelope.payload().clone())
            .map_err(|e| ProjectionError::Deserialize(e.to_string()))?;

        self.apply_event(envelope.edition_id(), &event)?;

        let mut cursors = self
            .cursors
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        cursors.insert(key, envelope.sequence_number());
        Ok(())
    }

    fn apply_event(
        &self,
        edition_id: EditionId,
        event: &EnrollmentEvent,
    ) -> Result<(), ProjectionError> {
        match event {
            EnrollmentEvent::EnrollmentSubmitted(e) => {
                self.store.upsert(
                    edition_id,
                    e.enrollment_id,
                    EnrollmentReadModel {
                        enrollment_id: e.enrollment_id,
                        name: e.application.name.clone(),
                        cpf: e.application.cpf.digits().to_string(),
                        email: e.application.email.clone(),
                        course: e.application.course.clone(),
                        status: EnrollmentStatus::Submitted,
                    },
                );
                Ok(())
            }
            EnrollmentEvent::EnrollmentApproved(e) => {
                self.set_status(edition_id, e.enrollment_id, EnrollmentStatus::Approved)
            }
            EnrollmentEvent::EnrollmentRejected(e) => {
                self.set_status(edition_id, e.enrollment_id, EnrollmentStatus::Rejected)
            }
            EnrollmentEvent::EnrollmentWaitlisted(e) => {
                self.set_status(edition_id, e.enrollment_id, EnrollmentStatus::Waitlisted)
            }
        }
    }

    fn set_status(
        &self,
        edition_id: EditionId,
        enrollment_id: EnrollmentId,
        status: EnrollmentStatus,
    ) -> Result<(), ProjectionError> {
        let mut row = self
            .store
            .get(edition_id, &enrollment_id)
            .ok_or_else(|| ProjectionError::MissingRow(enrollment_id.to_string()))?;
        row.status = status;
        self.store.upsert(edition_id, enrollment_id, row);
        Ok(())
    }

    // ── queries ──────────────────────────────────────────────────────────

    pub fn get(
        &self,
        edition_id: EditionId,
        enrollment_id: EnrollmentId,
    ) -> Option<EnrollmentReadModel> {
        self.store.get(edition_id, &enrollment_id)
    }

    pub fn list(&self, edition_id: EditionId) -> Vec<EnrollmentReadModel> {
        self.store.list(edition_id)
    }

    /// Whether an enrollment with this CPF exists in the edition.
    ///
    /// Accepts masked or raw input; comparison is over canonical digits.
    pub fn cpf_exists(&self, edition_id: EditionId, cpf: &str) -> bool {
        let digits: String = cpf.chars().filter(|c| c.is_ascii_digit()).collect();
        self.store
            .list(edition_id)
            .iter()
            .any(|row| row.cpf == digits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    use matricula_enrollment::EnrollmentSubmitted;
    use matricula_events::Event;

    use crate::read_model::InMemoryEditionStore;

    type Projection =
        EnrollmentDirectoryProjection<Arc<InMemoryEditionStore<EnrollmentId, EnrollmentReadModel>>>;

    fn projection() -> Projection {
        EnrollmentDirectoryProjection::new(Arc::new(InMemoryEditionStore::new()))
    }

    fn sample_application() -> matricula_enrollment::EnrollmentApplication {
        serde_json::from_value(serde_json::json!({
            "email": "ana@example.com",
            "nome": "Ana Silva",
            "cpf": "11144477735",
            "data_nascimento": "2010-06-15",
            "cep": "65900100",
            "logradouro": "Rua das Flores",
            "numero": "42",
            "bairro": "Centro",
            "cidade": "Imperatriz",
            "estado": "MA",
            "nome_responsavel": "Maria Silva",
            "telefone_whatsapp": "99981234567",
            "escolaridade": "Ensino Médio",
            "ano_escolar": "1º ano",
            "curso": "Jogos Digitais"
        }))
        .unwrap()
    }

    fn submitted_envelope(
        edition_id: EditionId,
        aggregate_id: AggregateId,
        sequence: u64,
    ) -> EventEnvelope<JsonValue> {
        let event = EnrollmentEvent::EnrollmentSubmitted(EnrollmentSubmitted {
            edition_id,
            enrollment_id: EnrollmentId::new(aggregate_id),
            application: sample_application(),
            occurred_at: Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap(),
        });
        EventEnvelope::new(
            Uuid::now_v7(),
            edition_id,
            aggregate_id,
            "enrollment",
            sequence,
            serde_json::to_value(&event).unwrap(),
        )
    }

    fn approved_envelope(
        edition_id: EditionId,
        aggregate_id: AggregateId,
        sequence: u64,
    ) -> EventEnvelope<JsonValue> {
        let event = EnrollmentEvent::EnrollmentApproved(matricula_enrollment::EnrollmentApproved {
            edition_id,
            enrollment_id: EnrollmentId::new(aggregate_id),
            decided_by: matricula_core::MonitorId::new(),
            occurred_at: Utc.with_ymd_and_hms(2025, 6, 16, 9, 0, 0).unwrap(),
        });
        assert_eq!(event.event_type(), "enrollment.approved");
        EventEnvelope::new(
            Uuid::now_v7(),
            edition_id,
            aggregate_id,
            "enrollment",
            sequence,
            serde_json::to_value(&event).unwrap(),
        )
    }

    #[test]
    fn submitted_event_creates_a_row_and_cpf_becomes_visible() {
        let projection = projection();
        let edition_id = EditionId::new();
        let aggregate_id = AggregateId::new();

        assert!(!projection.cpf_exists(edition_id, "111.444.777-35"));

        projection
            .apply_envelope(&submitted_envelope(edition_id, aggregate_id, 1))
            .unwrap();

        let rows = projection.list(edition_id);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "Ana Silva");
        assert_eq!(rows[0].status, EnrollmentStatus::Submitted);

        // Existence lookup works masked or raw.
        assert!(projection.cpf_exists(edition_id, "111.444.777-35"));
        assert!(projection.cpf_exists(edition_id, "11144477735"));
    }

    #[test]
    fn duplicate_delivery_is_idempotent() {
        let projection = projection();
        let edition_id = EditionId::new();
        let aggregate_id = AggregateId::new();

        let envelope = submitted_envelope(edition_id, aggregate_id, 1);
        projection.apply_envelope(&envelope).unwrap();
        projection.apply_envelope(&envelope).unwrap();

        assert_eq!(projection.list(edition_id).len(), 1);
    }

    #[test]
    fn decision_events_update_status() {
        let projection = projection();
        let edition_id = EditionId::new();
        let aggregate_id = AggregateId::new();

        projection
            .apply_envelope(&submitted_envelope(edition_id, aggregate_id, 1))
            .unwrap();
        projection
            .apply_envelope(&approved_envelope(edition_id, aggregate_id, 2))
            .unwrap();

        let row = projection
            .get(edition_id, EnrollmentId::new(aggregate_id))
            .unwrap();
        assert_eq!(row.status, EnrollmentStatus::Approved);
    }

    #[test]
    fn cpf_existence_is_per_edition() {
        let projection = projection();
        let edition_a = EditionId::new();
        let edition_b = EditionId::new();
        let aggregate_id = AggregateId::new();

        projection
            .apply_envelope(&submitted_envelope(edition_a, aggregate_id, 1))
            .unwrap();

        assert!(projection.cpf_exists(edition_a, "11144477735"));
        assert!(!projection.cpf_exists(edition_b, "11144477735"));
    }

    #[test]
    fn unrelated_aggregate_types_are_ignored() {
        let projection = projection();
        let edition_id = EditionId::new();

        let envelope = EventEnvelope::new(
            Uuid::now_v7(),
            edition_id,
            AggregateId::new(),
            "monitor",
            1,
            serde_json::json!({"unrelated": true}),
        );
        projection.apply_envelope(&envelope).unwrap();
        assert!(projection.list(edition_id).is_empty());
    }
}
