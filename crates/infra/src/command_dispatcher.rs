//! Command execution pipeline.
//!
//! One consistent lifecycle for every aggregate command:
//!
//! ```text
//! load stream → validate stream → rehydrate → handle → append → publish
//! ```
//!
//! Edition isolation and optimistic concurrency are enforced here so domain
//! code stays pure. Events are persisted before publication; a failed publish
//! leaves the append intact (at-least-once; projections are idempotent).

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use uuid::Uuid;

use matricula_core::{Aggregate, AggregateId, DomainError, EditionId, ExpectedVersion};
use matricula_events::{EventBus, EventEnvelope};

use crate::event_store::{EventStore, EventStoreError, StoredEvent, UncommittedEvent};

#[derive(Debug)]
pub enum DispatchError {
    /// Optimistic concurrency failure (stale aggregate version).
    Concurrency(String),
    /// Edition isolation violation (cross-edition stream mixing).
    EditionIsolation(String),
    /// Domain validation failure (deterministic).
    Validation(String),
    /// Domain invariant failure (deterministic).
    InvariantViolation(String),
    /// Domain authorization failure.
    Unauthorized,
    /// Domain-level not found.
    NotFound,
    /// Failed to deserialize historical payloads into the aggregate event type.
    Deserialize(String),
    /// Persisting to the event store failed.
    Store(EventStoreError),
    /// Publication failed after a successful append (safe to retry).
    Publish(String),
}

impl From<EventStoreError> for DispatchError {
    fn from(value: EventStoreError) -> Self {
        match &value {
            EventStoreError::Concurrency(msg) => DispatchError::Concurrency(msg.clone()),
            EventStoreError::EditionIsolation(msg) => DispatchError::EditionIsolation(msg.clone()),
            _ => DispatchError::Store(value),
        }
    }
}

impl From<DomainError> for DispatchError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) => DispatchError::Validation(msg),
            DomainError::InvariantViolation(msg) => DispatchError::InvariantViolation(msg),
            DomainError::Conflict(msg) => DispatchError::Concurrency(msg),
            DomainError::Unauthorized => DispatchError::Unauthorized,
            DomainError::NotFound => DispatchError::NotFound,
            DomainError::InvalidId(msg) => DispatchError::Validation(msg),
        }
    }
}

/// Reusable command execution engine for event-sourced aggregates.
///
/// Generic over the store and bus so tests and production share the same
/// pipeline; the aggregate factory keeps the dispatcher ignorant of how
/// aggregates are constructed (`Enrollment::empty(id)` and friends).
#[derive(Debug)]
pub struct CommandDispatcher<S, B> {
    store: S,
    bus: B,
}

impl<S, B> CommandDispatcher<S, B> {
    pub fn new(store: S, bus: B) -> Self {
        Self { store, bus }
    }

    pub fn into_parts(self) -> (S, B) {
        (self.store, self.bus)
    }
}

impl<S, B> CommandDispatcher<S, B>
where
    S: EventStore,
    B: EventBus<EventEnvelope<JsonValue>>,
{
    /// Dispatch a command through the full pipeline.
    ///
    /// Returns the committed events (with assigned sequence numbers) on
    /// success. On a concurrency error the caller reloads and retries (or
    /// surfaces a conflict).
    pub fn dispatch<A>(
        &self,
        edition_id: EditionId,
        aggregate_id: AggregateId,
        aggregate_type: impl Into<String>,
        command: A::Command,
        make_aggregate: impl FnOnce(EditionId, AggregateId) -> A,
    ) -> Result<Vec<StoredEvent>, DispatchError>
    where
        A: Aggregate<Error = DomainError>,
        A::Event: matricula_events::Event + Serialize + DeserializeOwned,
    {
        // 1) Load history (edition-scoped)
        let history = self.store.load_stream(edition_id, aggregate_id)?;
        validate_loaded_stream(edition_id, aggregate_id, &history)?;
        let expected = ExpectedVersion::Exact(stream_version(&history));

        // 2) Rehydrate aggregate
        let mut aggregate = make_aggregate(edition_id, aggregate_id);
        apply_history::<A>(&mut aggregate, &history)?;

        // 3) Decide events (no mutation)
        let decided = aggregate.handle(&command).map_err(DispatchError::from)?;
        if decided.is_empty() {
            return Ok(vec![]);
        }

        // 4) Persist (append-only, optimistic)
        let aggregate_type = aggregate_type.into();
        let uncommitted = decided
            .iter()
            .map(|ev| {
                UncommittedEvent::from_typed(
                    edition_id,
                    aggregate_id,
                    aggregate_type.clone(),
                    Uuid::now_v7(),
                    ev,
                )
            })
            .collect::<Result<Vec<_>, _>>()?;

        let committed = self.store.append(uncommitted, expected)?;

        // 5) Publish committed events (after append)
        for stored in &committed {
            self.bus
                .publish(stored.to_envelope())
                .map_err(|e| DispatchError::Publish(format!("{e:?}")))?;
        }

        Ok(committed)
    }
}

fn stream_version(stream: &[StoredEvent]) -> u64 {
    stream.last().map(|e| e.sequence_number).unwrap_or(0)
}

fn validate_loaded_stream(
    edition_id: EditionId,
    aggregate_id: AggregateId,
    stream: &[StoredEvent],
) -> Result<(), DispatchError> {
    // Enforce edition isolation even if a buggy backend returns cross-edition
    // data, and require monotonically increasing sequence numbers.
    let mut last = 0u64;
    for (idx, e) in stream.iter().enumerate() {
        if e.edition_id != edition_id {
            return Err(DispatchError::EditionIsolation(format!(
                "loaded stream contains wrong edition_id at index {idx}"
            )));
        }
        if e.aggregate_id != aggregate_id {
            return Err(DispatchError::EditionIsolation(format!(
                "loaded stream contains wrong aggregate_id at index {idx}"
            )));
        }
        if e.sequence_number == 0 {
            return Err(DispatchError::Store(EventStoreError::InvalidAppend(
                "stored event has sequence_number=0".to_string(),
            )));
        }
        if e.sequence_number <= last {
            return Err(DispatchError::Store(EventStoreError::InvalidAppend(format!(
                "non-monotonic sequence_number in loaded stream (last={last}, found={})",
                e.sequence_number
            ))));
        }
        last = e.sequence_number;
    }
    Ok(())
}

fn apply_history<A>(aggregate: &mut A, history: &[StoredEvent]) -> Result<(), DispatchError>
where
    A: Aggregate,
    A::Event: DeserializeOwned,
{
    // Ensure deterministic ordering.
    let mut sorted = history.to_vec();
    sorted.sort_by_key(|e| e.sequence_number);

    for stored in sorted {
        let ev: A::Event = serde_json::from_value(stored.payload)
            .map_err(|e| DispatchError::Deserialize(e.to_string()))?;
        aggregate.apply(&ev);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::{TimeZone, Utc};

    use matricula_enrollment::{
        ApproveEnrollment, Enrollment, EnrollmentCommand, EnrollmentId, SubmitEnrollment,
    };
    use matricula_events::InMemoryEventBus;

    use crate::event_store::InMemoryEventStore;

    fn test_time() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()
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

    fn dispatcher() -> CommandDispatcher<
        Arc<InMemoryEventStore>,
        Arc<InMemoryEventBus<EventEnvelope<JsonValue>>>,
    > {
        CommandDispatcher::new(
            Arc::new(InMemoryEventStore::new()),
            Arc::new(InMemoryEventBus::new()),
        )
    }

    #[test]
    fn dispatch_persists_and_publishes_committed_events() {
        let bus: Arc<InMemoryEventBus<EventEnvelope<JsonValue>>> = Arc::new(InMemoryEventBus::new());
        let dispatcher = CommandDispatcher::new(Arc::new(InMemoryEventStore::new()), bus.clone());
        let edition_id = EditionId::new();
        let agg = AggregateId::new();

        // Subscribe before dispatch to observe publications.
        let sub = bus.subscribe();

        let cmd = EnrollmentCommand::SubmitEnrollment(SubmitEnrollment {
            edition_id,
            enrollment_id: EnrollmentId::new(agg),
            application: sample_application(),
            occurred_at: test_time(),
        });

        let committed = dispatcher
            .dispatch::<Enrollment>(edition_id, agg, "enrollment", cmd, |_e, id| {
                Enrollment::empty(EnrollmentId::new(id))
            })
            .unwrap();

        assert_eq!(committed.len(), 1);
        assert_eq!(committed[0].sequence_number, 1);
        assert_eq!(committed[0].event_type, "enrollment.submitted");

        let published = sub.try_recv().unwrap();
        assert_eq!(published.sequence_number(), 1);
        assert_eq!(published.edition_id(), edition_id);
    }

    #[test]
    fn dispatch_rehydrates_before_deciding() {
        let dispatcher = dispatcher();
        let edition_id = EditionId::new();
        let agg = AggregateId::new();
        let enrollment_id = EnrollmentId::new(agg);

        let submit = EnrollmentCommand::SubmitEnrollment(SubmitEnrollment {
            edition_id,
            enrollment_id,
            application: sample_application(),
            occurred_at: test_time(),
        });
        dispatcher
            .dispatch::<Enrollment>(edition_id, agg, "enrollment", submit.clone(), |_e, id| {
                Enrollment::empty(EnrollmentId::new(id))
            })
            .unwrap();

        // A second submit must be refused by the rehydrated aggregate.
        let err = dispatcher
            .dispatch::<Enrollment>(edition_id, agg, "enrollment", submit, |_e, id| {
                Enrollment::empty(EnrollmentId::new(id))
            })
            .unwrap_err();
        assert!(matches!(err, DispatchError::Concurrency(_)));

        // A decision on the rehydrated state succeeds.
        let approve = EnrollmentCommand::ApproveEnrollment(ApproveEnrollment {
            edition_id,
            enrollment_id,
            decided_by: matricula_core::MonitorId::new(),
            occurred_at: test_time(),
        });
        let committed = dispatcher
            .dispatch::<Enrollment>(edition_id, agg, "enrollment", approve, |_e, id| {
                Enrollment::empty(EnrollmentId::new(id))
            })
            .unwrap();
        assert_eq!(committed[0].sequence_number, 2);
        assert_eq!(committed[0].event_type, "enrollment.approved");
    }
}
