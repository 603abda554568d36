//! The async driver: owns the event queue, executes machine commands
//! against the engines and the backend, and keeps the session history.

use std::sync::Arc;
use std::time::Duration;

use intake_agent::{ConversationFlow, RETRY_PROMPT};
use intake_observe::DiagnosticLog;
use intake_types::{CallConfig, CaseDetails, Turn};
use intake_voice::{RecognitionEvent, SpeechCapture, SpeechSynthesis};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::error::SessionError;
use crate::machine::{CallSession, CallState, Command, RestartCause, SessionEvent};

/// Updates streamed to the hosting application for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionUpdate {
    StateChanged(CallState),
    /// A provisional transcript of what the user is currently saying.
    Interim(String),
    /// A turn was appended to the conversation history.
    TurnAdded(Turn),
    /// A user-facing notice (permission denied, capture lost, ...).
    Notice(String),
}

enum UserOp {
    ToggleCall,
    SendText(String),
    Details(oneshot::Sender<CaseDetails>),
    History(oneshot::Sender<Vec<Turn>>),
    Shutdown,
}

/// Handle for the hosting application to drive a running session.
#[derive(Clone)]
pub struct SessionHandle {
    ops: mpsc::UnboundedSender<UserOp>,
}

impl SessionHandle {
    /// Toggles call mode on or off.
    pub fn toggle_call(&self) -> Result<(), SessionError> {
        self.ops
            .send(UserOp::ToggleCall)
            .map_err(|_| SessionError::Closed)
    }

    /// Sends one text-entry chat message (only honored while no call is in
    /// progress).
    pub fn send_text(&self, text: impl Into<String>) -> Result<(), SessionError> {
        self.ops
            .send(UserOp::SendText(text.into()))
            .map_err(|_| SessionError::Closed)
    }

    /// Returns the case details extracted so far.
    pub async fn case_details(&self) -> Result<CaseDetails, SessionError> {
        let (tx, rx) = oneshot::channel();
        self.ops
            .send(UserOp::Details(tx))
            .map_err(|_| SessionError::Closed)?;
        rx.await.map_err(|_| SessionError::Closed)
    }

    /// Returns a snapshot of the conversation history.
    pub async fn history(&self) -> Result<Vec<Turn>, SessionError> {
        let (tx, rx) = oneshot::channel();
        self.ops
            .send(UserOp::History(tx))
            .map_err(|_| SessionError::Closed)?;
        rx.await.map_err(|_| SessionError::Closed)
    }

    /// Ends the session, tearing down any active call first (which flushes
    /// a pending transcript exactly like a call-off toggle).
    pub fn shutdown(&self) -> Result<(), SessionError> {
        self.ops
            .send(UserOp::Shutdown)
            .map_err(|_| SessionError::Closed)
    }
}

/// Runs one conversation session: a state machine fed by an event queue,
/// with all side effects executed here.
pub struct SessionDriver {
    machine: CallSession,
    config: CallConfig,
    capture: Arc<dyn SpeechCapture>,
    synthesis: Arc<dyn SpeechSynthesis>,
    flow: Arc<ConversationFlow>,
    diagnostics: Arc<DiagnosticLog>,

    history: Vec<Turn>,
    details: CaseDetails,

    events_tx: mpsc::UnboundedSender<SessionEvent>,
    updates_tx: mpsc::UnboundedSender<SessionUpdate>,

    capture_task: Option<JoinHandle<()>>,
    silence_timer: Option<JoinHandle<()>>,
    restart_timer: Option<JoinHandle<()>>,
}

impl SessionDriver {
    /// Spawns the driver task. Returns the control handle, the stream of
    /// display updates, and the task handle.
    pub fn spawn(
        config: CallConfig,
        capture: Arc<dyn SpeechCapture>,
        synthesis: Arc<dyn SpeechSynthesis>,
        flow: Arc<ConversationFlow>,
        diagnostics: Arc<DiagnosticLog>,
    ) -> (
        SessionHandle,
        mpsc::UnboundedReceiver<SessionUpdate>,
        JoinHandle<()>,
    ) {
        let (ops_tx, ops_rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (updates_tx, updates_rx) = mpsc::unbounded_channel();

        let driver = Self {
            machine: CallSession::new(config.max_restart_attempts),
            config,
            capture,
            synthesis,
            flow,
            diagnostics,
            history: Vec::new(),
            details: CaseDetails::default(),
            events_tx,
            updates_tx,
            capture_task: None,
            silence_timer: None,
            restart_timer: None,
        };

        let task = tokio::spawn(driver.run(ops_rx, events_rx));
        (SessionHandle { ops: ops_tx }, updates_rx, task)
    }

    async fn run(
        mut self,
        mut ops_rx: mpsc::UnboundedReceiver<UserOp>,
        mut events_rx: mpsc::UnboundedReceiver<SessionEvent>,
    ) {
        loop {
            tokio::select! {
                op = ops_rx.recv() => match op {
                    Some(op) => {
                        if !self.handle_op(op).await {
                            break;
                        }
                    }
                    None => break,
                },
                Some(event) = events_rx.recv() => {
                    self.handle_event(event).await;
                }
            }
        }

        // Teardown mirrors a call-off toggle so nothing keeps running.
        if self.machine.call_active() {
            self.handle_event(SessionEvent::ToggleCall).await;
        }
        self.capture.stop().await;
        self.synthesis.cancel().await;
        info!("session ended");
    }

    /// Returns false when the session should end.
    async fn handle_op(&mut self, op: UserOp) -> bool {
        match op {
            UserOp::ToggleCall => {
                self.handle_event(SessionEvent::ToggleCall).await;
                true
            }
            UserOp::SendText(text) => {
                self.handle_text(text).await;
                true
            }
            UserOp::Details(reply) => {
                let _ = reply.send(self.details.clone());
                true
            }
            UserOp::History(reply) => {
                let _ = reply.send(self.history.clone());
                true
            }
            UserOp::Shutdown => false,
        }
    }

    /// Text-entry path: one full turn against the shared history. Only
    /// honored while no call is in progress, to keep the single logical
    /// timeline.
    async fn handle_text(&mut self, text: String) {
        if text.trim().is_empty() {
            return;
        }
        if self.machine.call_active() {
            self.push_update(SessionUpdate::Notice(
                "call in progress; toggle the call off before typing".to_string(),
            ));
            return;
        }

        match self.flow.run_turn(&mut self.history, &text).await {
            Ok(outcome) => {
                self.details = outcome.case_details;
                let added = self.history.len().saturating_sub(2);
                for turn in self.history[added..].to_vec() {
                    self.push_update(SessionUpdate::TurnAdded(turn));
                }
            }
            Err(_) => self.push_system_turn(),
        }
    }

    async fn handle_event(&mut self, event: SessionEvent) {
        // History and display effects that do not depend on call state.
        match &event {
            SessionEvent::Interim(text) => {
                self.push_update(SessionUpdate::Interim(text.clone()));
            }
            SessionEvent::ReplyReceived(text) => {
                let turn = Turn::assistant(text.clone());
                self.history.push(turn.clone());
                self.push_update(SessionUpdate::TurnAdded(turn));
                let (details, _) = self.flow.review_details(&self.history).await;
                self.details = details;
            }
            SessionEvent::ReplyFailed => self.push_system_turn(),
            _ => {}
        }

        let before = self.machine.state();
        let commands = self.machine.handle(event);
        let after = self.machine.state();
        if before != after {
            debug!(from = %before, to = %after, "call state changed");
            self.push_update(SessionUpdate::StateChanged(after));
        }

        for command in commands {
            self.execute(command).await;
        }
    }

    async fn execute(&mut self, command: Command) {
        match command {
            Command::StartCapture => self.start_capture().await,
            Command::StopCapture => {
                if let Some(task) = self.capture_task.take() {
                    task.abort();
                }
                self.capture.stop().await;
            }
            Command::ArmSilenceTimer => {
                self.arm_timer(
                    TimerKind::Silence,
                    Duration::from_millis(self.config.silence_debounce_ms),
                );
            }
            Command::DisarmSilenceTimer => {
                if let Some(timer) = self.silence_timer.take() {
                    timer.abort();
                }
            }
            Command::SendChat(text) => self.begin_chat_request(text),
            Command::Speak(text) => {
                // At most one utterance in flight: cancel before speaking.
                self.synthesis.cancel().await;
                let synthesis = Arc::clone(&self.synthesis);
                let diagnostics = Arc::clone(&self.diagnostics);
                let events = self.events_tx.clone();
                tokio::spawn(async move {
                    if let Err(e) = synthesis.speak(&text).await {
                        diagnostics.record("synthesis", e.to_string());
                    }
                    // Playback end and playback error feed the same event.
                    let _ = events.send(SessionEvent::PlaybackFinished);
                });
            }
            Command::CancelSpeech => self.synthesis.cancel().await,
            Command::ScheduleRestart(cause) => {
                let delay = match cause {
                    RestartCause::PlaybackGrace => self.config.restart_grace_ms,
                    RestartCause::TransientError => self.config.restart_delay_ms,
                };
                self.arm_timer(TimerKind::Restart, Duration::from_millis(delay));
            }
            Command::Notify(notice) => {
                self.diagnostics.record("session", notice.user_message());
                self.push_update(SessionUpdate::Notice(notice.user_message().to_string()));
            }
        }
    }

    async fn start_capture(&mut self) {
        match self.capture.start().await {
            Ok(mut events) => {
                if let Some(task) = self.capture_task.take() {
                    task.abort();
                }
                let tx = self.events_tx.clone();
                self.capture_task = Some(tokio::spawn(async move {
                    while let Some(event) = events.recv().await {
                        let mapped = match event {
                            RecognitionEvent::Interim(text) => SessionEvent::Interim(text),
                            RecognitionEvent::Final(text) => SessionEvent::Final(text),
                            RecognitionEvent::Error(kind) => SessionEvent::RecognitionError(kind),
                        };
                        if tx.send(mapped).is_err() {
                            break;
                        }
                    }
                }));
            }
            Err(e) => {
                self.diagnostics.record("capture", e.to_string());
                // Feed the failure back through the machine so the bounded
                // restart policy applies.
                let _ = self.events_tx.send(SessionEvent::RecognitionError(
                    intake_voice::RecognitionErrorKind::AudioCapture,
                ));
            }
        }
    }

    /// Pushes the user turn and fires the backend request for it. The
    /// request task reports back through the event queue.
    fn begin_chat_request(&mut self, text: String) {
        let snapshot = self.history.clone();
        let turn = Turn::user(text.clone());
        self.history.push(turn.clone());
        self.push_update(SessionUpdate::TurnAdded(turn));

        let flow = Arc::clone(&self.flow);
        let events = self.events_tx.clone();
        tokio::spawn(async move {
            let event = match flow.request_reply(&text, &snapshot).await {
                Ok(reply) => SessionEvent::ReplyReceived(reply),
                Err(_) => SessionEvent::ReplyFailed,
            };
            let _ = events.send(event);
        });
    }

    fn arm_timer(&mut self, kind: TimerKind, delay: Duration) {
        let slot = match kind {
            TimerKind::Silence => &mut self.silence_timer,
            TimerKind::Restart => &mut self.restart_timer,
        };
        if let Some(old) = slot.take() {
            old.abort();
        }
        let tx = self.events_tx.clone();
        *slot = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let event = match kind {
                TimerKind::Silence => SessionEvent::SilenceTimerFired,
                TimerKind::Restart => SessionEvent::RestartTimerFired,
            };
            let _ = tx.send(event);
        }));
    }

    fn push_system_turn(&mut self) {
        let turn = Turn::system(RETRY_PROMPT);
        self.history.push(turn.clone());
        self.push_update(SessionUpdate::TurnAdded(turn));
    }

    fn push_update(&self, update: SessionUpdate) {
        let _ = self.updates_tx.send(update);
    }
}

#[derive(Clone, Copy)]
enum TimerKind {
    Silence,
    Restart,
}
