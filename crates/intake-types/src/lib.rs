//! Shared types for the Intake voice assistant.
//!
//! This crate provides the foundational types used across all Intake crates:
//! conversation turns, extracted case details, and the timing configuration
//! for the half-duplex call loop.
//!
//! No crate in the workspace depends on anything *except* `intake-types` for
//! cross-cutting type definitions. This keeps the dependency graph clean and
//! prevents circular dependencies.

use serde::{Deserialize, Serialize};

/// Speaker role for a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The human participant.
    User,
    /// The remote conversational AI.
    Assistant,
    /// Session-level notices (e.g. a retry prompt after a failed request).
    System,
}

impl Role {
    /// Returns the wire label for this role.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::System => "system",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One message exchanged in the conversation, tagged by speaker role.
///
/// Turns form an ordered, append-only sequence for the lifetime of a session.
/// They are held in memory only and discarded on exit; there is no identity
/// beyond position in the sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }
}

/// Case details extracted best-effort from the user's turns.
///
/// Every field is optional; for each field the last match found in the
/// history wins. Values are stored as matched, without validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseDetails {
    /// The user turn that looked like the core inquiry.
    pub inquiry: Option<String>,
    /// Name captured from a "my name is ..." phrase, original casing.
    pub name: Option<String>,
    /// A run of 8+ digits, taken as a phone number.
    pub mobile_number: Option<String>,
    /// An email address.
    pub email_address: Option<String>,
    /// A date/time phrase from an appointment or call-back request.
    pub appointment_date_time: Option<String>,
}

impl CaseDetails {
    /// True when no field has been extracted yet.
    pub fn is_empty(&self) -> bool {
        self.inquiry.is_none()
            && self.name.is_none()
            && self.mobile_number.is_none()
            && self.email_address.is_none()
            && self.appointment_date_time.is_none()
    }
}

fn default_silence_debounce_ms() -> u64 {
    1500
}

fn default_restart_grace_ms() -> u64 {
    100
}

fn default_restart_delay_ms() -> u64 {
    300
}

fn default_max_restart_attempts() -> u32 {
    5
}

/// Timing configuration for the half-duplex call loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallConfig {
    /// How long after the last interim result an utterance is considered
    /// finished. Default: 1500 ms.
    #[serde(default = "default_silence_debounce_ms")]
    pub silence_debounce_ms: u64,

    /// Delay between synthesis finishing and recognition restarting, so the
    /// microphone never captures the tail of synthesized audio.
    /// Default: 100 ms.
    #[serde(default = "default_restart_grace_ms")]
    pub restart_grace_ms: u64,

    /// Delay before retrying recognition after a transient error.
    /// Default: 300 ms.
    #[serde(default = "default_restart_delay_ms")]
    pub restart_delay_ms: u64,

    /// Maximum consecutive recognition restarts before the call is ended.
    /// The counter resets on any successful recognition result. Default: 5.
    #[serde(default = "default_max_restart_attempts")]
    pub max_restart_attempts: u32,
}

impl Default for CallConfig {
    fn default() -> Self {
        Self {
            silence_debounce_ms: default_silence_debounce_ms(),
            restart_grace_ms: default_restart_grace_ms(),
            restart_delay_ms: default_restart_delay_ms(),
            max_restart_attempts: default_max_restart_attempts(),
        }
    }
}
