//! Speech capture: the microphone-to-text seam and its subprocess engine.

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, warn};

use crate::error::VoiceError;
use crate::event::{RecognitionErrorKind, RecognitionEvent};

/// Capacity of the per-capture event channel.
pub const RECOGNITION_CHANNEL_CAPACITY: usize = 256;

/// Maximum accepted length of one engine output line. Longer lines are
/// dropped rather than buffered without bound.
const MAX_LINE_BYTES: usize = 8 * 1024;

/// Continuous speech capture with interim results.
#[async_trait]
pub trait SpeechCapture: Send + Sync {
    /// Starts capture and returns the stream of recognition events.
    ///
    /// The stream ends after a [`RecognitionEvent::Error`] or when
    /// [`stop`](SpeechCapture::stop) is called.
    async fn start(&self) -> Result<mpsc::Receiver<RecognitionEvent>, VoiceError>;

    /// Stops capture. Idempotent; never emits an error event.
    async fn stop(&self);
}

/// Capture engine backed by a streaming speech-to-text binary.
///
/// The binary is expected to write one line per recognition update to
/// stdout: lines prefixed with `~` are interim updates (each superseding the
/// last), any other non-empty line is a finalized utterance. When the
/// process exits while capture is still wanted, the exit is reported as a
/// transient `network`-class error so the call loop can restart it.
#[derive(Debug)]
pub struct PipedCapture {
    binary: PathBuf,
    model_path: Option<PathBuf>,
    extra_args: Vec<String>,
    child: Mutex<Option<Child>>,
    stopping: Arc<AtomicBool>,
}

impl PipedCapture {
    pub fn new(binary: impl Into<PathBuf>, model_path: Option<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            model_path,
            extra_args: Vec::new(),
            child: Mutex::new(None),
            stopping: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Appends extra arguments passed verbatim to the engine binary.
    pub fn with_args(mut self, args: impl IntoIterator<Item = String>) -> Self {
        self.extra_args.extend(args);
        self
    }
}

#[async_trait]
impl SpeechCapture for PipedCapture {
    async fn start(&self) -> Result<mpsc::Receiver<RecognitionEvent>, VoiceError> {
        let mut slot = self.child.lock().await;

        // A previous engine instance may still be running if the last stop
        // raced a restart; replace it.
        if let Some(mut old) = slot.take() {
            let _ = old.kill().await;
        }
        self.stopping.store(false, Ordering::SeqCst);

        let mut command = Command::new(&self.binary);
        if let Some(model) = &self.model_path {
            command.arg("-m").arg(model);
        }
        command
            .args(&self.extra_args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        let mut child = command
            .spawn()
            .map_err(|e| VoiceError::Capture(format!("failed to spawn capture binary: {e}")))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| VoiceError::Capture("failed to open capture stdout".to_string()))?;

        debug!(binary = %self.binary.display(), "capture engine started");
        *slot = Some(child);

        let (tx, rx) = mpsc::channel(RECOGNITION_CHANNEL_CAPACITY);
        let stopping = Arc::clone(&self.stopping);

        tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        if line.len() > MAX_LINE_BYTES {
                            warn!(len = line.len(), "dropping oversized capture line");
                            continue;
                        }
                        let line = line.trim();
                        if line.is_empty() {
                            continue;
                        }
                        let event = match line.strip_prefix('~') {
                            Some(rest) => RecognitionEvent::Interim(rest.trim().to_string()),
                            None => RecognitionEvent::Final(line.to_string()),
                        };
                        if tx.send(event).await.is_err() {
                            break;
                        }
                    }
                    Ok(None) => {
                        if !stopping.load(Ordering::SeqCst) {
                            warn!("capture engine exited unexpectedly");
                            let _ = tx
                                .send(RecognitionEvent::Error(RecognitionErrorKind::Network))
                                .await;
                        }
                        break;
                    }
                    Err(e) => {
                        if !stopping.load(Ordering::SeqCst) {
                            warn!(error = %e, "failed to read from capture engine");
                            let _ = tx
                                .send(RecognitionEvent::Error(RecognitionErrorKind::AudioCapture))
                                .await;
                        }
                        break;
                    }
                }
            }
        });

        Ok(rx)
    }

    async fn stop(&self) {
        self.stopping.store(true, Ordering::SeqCst);
        let mut slot = self.child.lock().await;
        if let Some(mut child) = slot.take() {
            let _ = child.kill().await;
            debug!("capture engine stopped");
        }
    }
}
