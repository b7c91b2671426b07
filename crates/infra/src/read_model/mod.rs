//! Edition-isolated read model storage abstractions.

mod edition_store;

pub use edition_store::{EditionStore, InMemoryEditionStore};
