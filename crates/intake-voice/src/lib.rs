//! Speech engines for the Intake voice assistant.
//!
//! Defines the two seams the call loop speaks through — [`SpeechCapture`]
//! (microphone to text) and [`SpeechSynthesis`] (text to speaker) — plus
//! subprocess-backed implementations of both:
//!
//! - [`PipedCapture`] runs a streaming speech-to-text binary and turns its
//!   stdout line protocol into [`RecognitionEvent`]s (continuous capture
//!   with interim results);
//! - [`PipedSynthesis`] runs a text-to-speech binary per utterance, with at
//!   most one utterance in flight; a new utterance or an explicit cancel
//!   kills the previous one.
//!
//! The traits exist so the call loop can be driven deterministically in
//! tests with scripted engines; nothing outside this crate spawns a
//! process.

mod capture;
mod error;
mod event;
mod probe;
mod synthesis;

pub use capture::{PipedCapture, SpeechCapture, RECOGNITION_CHANNEL_CAPACITY};
pub use error::VoiceError;
pub use event::{RecognitionErrorKind, RecognitionEvent};
pub use probe::probe_binary;
pub use synthesis::{PipedSynthesis, SpeechSynthesis};
