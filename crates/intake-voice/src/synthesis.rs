//! Speech synthesis: the text-to-speaker seam and its subprocess engine.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::sync::Notify;
use tracing::debug;

use crate::error::VoiceError;

/// Maximum text input size for synthesis (64 KiB). Prevents resource
/// exhaustion from oversized synthesis requests.
const MAX_SYNTHESIS_INPUT_BYTES: usize = 64 * 1024;

/// Timeout for one synthesis playback.
const SYNTHESIS_TIMEOUT: Duration = Duration::from_secs(60);

/// Text-to-speech playback with at most one utterance in flight.
#[async_trait]
pub trait SpeechSynthesis: Send + Sync {
    /// Speaks `text`, resolving when playback completes.
    ///
    /// Starting a new utterance cancels any still playing. A cancelled
    /// utterance resolves `Ok(())` — cancellation is not a failure.
    async fn speak(&self, text: &str) -> Result<(), VoiceError>;

    /// Cancels the current utterance, if any.
    async fn cancel(&self);
}

/// Synthesis engine backed by a text-to-speech binary (espeak-ng style)
/// that plays to the audio device and exits when playback ends.
#[derive(Debug)]
pub struct PipedSynthesis {
    binary: PathBuf,
    extra_args: Vec<String>,
    cancel: Notify,
}

impl PipedSynthesis {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            extra_args: Vec::new(),
            cancel: Notify::new(),
        }
    }

    /// Appends extra arguments passed verbatim before the text argument.
    pub fn with_args(mut self, args: impl IntoIterator<Item = String>) -> Self {
        self.extra_args.extend(args);
        self
    }
}

#[async_trait]
impl SpeechSynthesis for PipedSynthesis {
    async fn speak(&self, text: &str) -> Result<(), VoiceError> {
        if text.len() > MAX_SYNTHESIS_INPUT_BYTES {
            return Err(VoiceError::Synthesis(format!(
                "text exceeds maximum size: {} bytes (limit: {} bytes)",
                text.len(),
                MAX_SYNTHESIS_INPUT_BYTES
            )));
        }
        if text.trim().is_empty() {
            return Ok(());
        }

        // Kill any utterance still playing before starting this one.
        self.cancel.notify_waiters();
        let cancelled = self.cancel.notified();
        tokio::pin!(cancelled);

        let mut child = Command::new(&self.binary)
            .args(&self.extra_args)
            .arg(text)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| VoiceError::Synthesis(format!("failed to spawn synthesis binary: {e}")))?;

        debug!(chars = text.len(), "synthesis started");

        tokio::select! {
            status = tokio::time::timeout(SYNTHESIS_TIMEOUT, child.wait()) => match status {
                Ok(Ok(exit)) if exit.success() => Ok(()),
                Ok(Ok(exit)) => Err(VoiceError::Synthesis(format!(
                    "synthesis binary exited with {exit}"
                ))),
                Ok(Err(e)) => Err(VoiceError::Synthesis(format!(
                    "failed to wait for synthesis binary: {e}"
                ))),
                Err(_) => {
                    let _ = child.kill().await;
                    Err(VoiceError::Synthesis(format!(
                        "synthesis timed out after {} seconds",
                        SYNTHESIS_TIMEOUT.as_secs()
                    )))
                }
            },
            _ = &mut cancelled => {
                let _ = child.kill().await;
                debug!("synthesis cancelled");
                Ok(())
            }
        }
    }

    async fn cancel(&self) {
        self.cancel.notify_waiters();
    }
}
