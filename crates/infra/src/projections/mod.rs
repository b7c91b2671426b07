//! Read-model projections fed from the event bus.

pub mod enrollment_directory;
