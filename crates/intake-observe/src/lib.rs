//! Diagnostics layer for the Intake voice assistant.
//!
//! Implements the bounded in-memory diagnostic log: a fixed-capacity ring of
//! timestamped entries that the hosting application owns and injects into the
//! components that need it. Failures anywhere in the session (chat round
//! trips, recognition errors, synthesis errors) are recorded here for later
//! retrieval without ever growing without bound.
//!
//! The log is an instance, not a global: the host constructs one
//! [`DiagnosticLog`], wraps it in an `Arc`, and hands it to the session driver
//! and the agent. When the ring is full, recording a new entry evicts the
//! oldest. Every recorded entry is also emitted through `tracing`.

mod entry;
mod log;

pub use entry::DiagnosticEntry;
pub use log::{DiagnosticLog, DEFAULT_CAPACITY};
