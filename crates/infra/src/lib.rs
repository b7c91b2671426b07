//! `matricula-infra` — infrastructure composition for the enrollment portal.
//!
//! In-memory event store, the command dispatcher that orchestrates the
//! event-sourcing pipeline, edition-scoped read-model storage and the
//! enrollment directory projection. Persistence backends are out of scope by
//! design; the in-memory implementations here are the production wiring.

pub mod command_dispatcher;
pub mod event_store;
pub mod projections;
pub mod read_model;

pub use command_dispatcher::{CommandDispatcher, DispatchError};
pub use event_store::{EventStore, EventStoreError, InMemoryEventStore, StoredEvent, UncommittedEvent};
pub use projections::enrollment_directory::{
    EnrollmentDirectoryProjection, EnrollmentReadModel, ProjectionError,
};
pub use read_model::{EditionStore, InMemoryEditionStore};
