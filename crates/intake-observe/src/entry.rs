//! A single diagnostic record.

use serde::{Deserialize, Serialize};

/// One recorded diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticEntry {
    /// ISO 8601 timestamp of when the entry was recorded.
    pub occurred_at: String,
    /// The component that recorded the entry (e.g. `"chat"`, `"capture"`).
    pub source: String,
    /// Human-readable description of what happened.
    pub message: String,
}

impl std::fmt::Display for DiagnosticEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} [{}] {}", self.occurred_at, self.source, self.message)
    }
}
