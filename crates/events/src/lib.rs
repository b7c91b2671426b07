//! `matricula-events` — event contracts and distribution mechanics.
//!
//! Domain crates define typed events; this crate provides the trait they
//! implement, the envelope they travel in, and a minimal pub/sub bus used to
//! feed projections.

pub mod bus;
pub mod envelope;
pub mod event;
pub mod in_memory_bus;

pub use bus::{EventBus, Subscription};
pub use envelope::EventEnvelope;
pub use event::Event;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
