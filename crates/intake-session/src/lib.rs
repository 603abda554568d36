//! The half-duplex voice turn-taking loop.
//!
//! This crate serializes microphone capture and speaker playback on one
//! logical timeline so the assistant never hears itself and partial
//! utterances are never sent prematurely.
//!
//! The design splits into two layers:
//!
//! - [`CallSession`] is a pure, synchronous state machine: events in,
//!   commands out, zero I/O. The call states (`Idle`, `Listening`,
//!   `SilencePending`, `AiResponding`, `Speaking`) are a single tagged
//!   value, so illegal combinations such as listening-while-speaking are
//!   unrepresentable.
//! - [`SessionDriver`] owns the event queue and executes commands against
//!   the speech engines and the backend client: it runs the silence
//!   debounce, the post-playback restart grace, and the bounded
//!   error-restart timers, and keeps the in-memory conversation history.
//!
//! Engine callbacks and timers only ever enqueue events; every decision is
//! made inside the machine, which makes transition order deterministic and
//! testable without real engines.

mod driver;
mod error;
mod machine;

pub use driver::{SessionDriver, SessionHandle, SessionUpdate};
pub use error::SessionError;
pub use machine::{CallSession, CallState, Command, Notice, RestartCause, SessionEvent};

#[cfg(test)]
mod tests;
