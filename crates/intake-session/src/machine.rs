//! The call-loop state machine: pure transitions, no I/O.

use intake_voice::RecognitionErrorKind;

/// Phase of the voice call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallState {
    /// No call in progress.
    Idle,
    /// Microphone open, waiting for speech.
    Listening,
    /// Speech heard; the silence debounce timer is armed.
    SilencePending,
    /// An utterance was sent; the backend reply is in flight.
    AiResponding,
    /// The reply is being played back.
    Speaking,
}

impl CallState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Listening => "listening",
            Self::SilencePending => "silence-pending",
            Self::AiResponding => "ai-responding",
            Self::Speaking => "speaking",
        }
    }
}

impl std::fmt::Display for CallState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything that can happen to a call, as a single queue-fed event type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The user toggled the call control.
    ToggleCall,
    /// A provisional transcript fragment arrived (supersedes the previous
    /// one for the current utterance).
    Interim(String),
    /// The capture engine finalized an utterance.
    Final(String),
    /// The silence debounce timer elapsed.
    SilenceTimerFired,
    /// The backend replied.
    ReplyReceived(String),
    /// The backend round trip failed.
    ReplyFailed,
    /// Playback of the reply finished, successfully or not.
    PlaybackFinished,
    /// The capture engine reported an error.
    RecognitionError(RecognitionErrorKind),
    /// A scheduled capture restart (grace or error backoff) is due.
    RestartTimerFired,
}

/// Why a capture restart was scheduled; determines the delay used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartCause {
    /// Fixed grace after playback so the microphone misses the tail of
    /// synthesized audio.
    PlaybackGrace,
    /// Backoff after a transient recognition error.
    TransientError,
}

/// User-facing condition surfaced by the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    /// Microphone permission was denied; capture is disabled.
    MicrophoneDenied,
    /// Capture kept failing past the restart bound; the call was ended.
    CaptureLost,
}

impl Notice {
    pub fn user_message(self) -> &'static str {
        match self {
            Self::MicrophoneDenied => {
                "Microphone access denied. Please allow microphone access to use this feature."
            }
            Self::CaptureLost => "Speech capture keeps failing; the call has been ended.",
        }
    }
}

/// Side effects requested from the driver. The machine itself performs
/// none of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    StartCapture,
    StopCapture,
    ArmSilenceTimer,
    DisarmSilenceTimer,
    /// Send exactly one chat request for this finalized utterance.
    SendChat(String),
    /// Play the reply; any utterance still playing is cancelled first.
    Speak(String),
    CancelSpeech,
    ScheduleRestart(RestartCause),
    Notify(Notice),
}

/// The half-duplex call loop.
///
/// Call phase is one tagged value rather than a set of sibling boolean
/// flags, so capture and playback can never be active at the same time.
#[derive(Debug)]
pub struct CallSession {
    state: CallState,
    transcript: String,
    restart_attempts: u32,
    max_restart_attempts: u32,
}

impl CallSession {
    pub fn new(max_restart_attempts: u32) -> Self {
        Self {
            state: CallState::Idle,
            transcript: String::new(),
            restart_attempts: 0,
            max_restart_attempts,
        }
    }

    pub fn state(&self) -> CallState {
        self.state
    }

    /// True while the microphone is conceptually open.
    pub fn is_listening(&self) -> bool {
        matches!(self.state, CallState::Listening | CallState::SilencePending)
    }

    /// True while the reply is being played back.
    pub fn is_speaking(&self) -> bool {
        matches!(self.state, CallState::Speaking)
    }

    /// True while a call is in progress in any phase.
    pub fn call_active(&self) -> bool {
        self.state != CallState::Idle
    }

    /// Applies one event and returns the side effects to perform, in order.
    pub fn handle(&mut self, event: SessionEvent) -> Vec<Command> {
        match event {
            SessionEvent::ToggleCall => self.on_toggle(),
            SessionEvent::Interim(text) => self.on_interim(text),
            SessionEvent::Final(text) => self.on_final(text),
            SessionEvent::SilenceTimerFired => self.on_silence_timer(),
            SessionEvent::ReplyReceived(text) => self.on_reply(text),
            SessionEvent::ReplyFailed => self.on_reply_failed(),
            SessionEvent::PlaybackFinished => self.on_playback_finished(),
            SessionEvent::RecognitionError(kind) => self.on_recognition_error(kind),
            SessionEvent::RestartTimerFired => self.on_restart_timer(),
        }
    }

    fn on_toggle(&mut self) -> Vec<Command> {
        if self.state == CallState::Idle {
            self.state = CallState::Listening;
            self.transcript.clear();
            self.restart_attempts = 0;
            return vec![Command::StartCapture];
        }

        // Call off: tear everything down, flushing any unsent transcript
        // as a final send on the way out.
        let mut commands = vec![
            Command::CancelSpeech,
            Command::StopCapture,
            Command::DisarmSilenceTimer,
        ];
        let pending = std::mem::take(&mut self.transcript);
        if !pending.trim().is_empty() {
            commands.push(Command::SendChat(pending));
        }
        self.state = CallState::Idle;
        commands
    }

    fn on_interim(&mut self, text: String) -> Vec<Command> {
        match self.state {
            CallState::Listening | CallState::SilencePending => {
                self.transcript = text;
                self.restart_attempts = 0;
                self.state = CallState::SilencePending;
                vec![Command::ArmSilenceTimer]
            }
            _ => Vec::new(),
        }
    }

    fn on_final(&mut self, text: String) -> Vec<Command> {
        match self.state {
            CallState::Listening | CallState::SilencePending => {
                self.restart_attempts = 0;
                let utterance = if text.trim().is_empty() {
                    std::mem::take(&mut self.transcript)
                } else {
                    self.transcript.clear();
                    text
                };
                if utterance.trim().is_empty() {
                    self.state = CallState::Listening;
                    return vec![Command::DisarmSilenceTimer];
                }
                self.state = CallState::AiResponding;
                vec![
                    Command::StopCapture,
                    Command::DisarmSilenceTimer,
                    Command::SendChat(utterance),
                ]
            }
            _ => Vec::new(),
        }
    }

    fn on_silence_timer(&mut self) -> Vec<Command> {
        // A timer that fires after a final result already sent the
        // utterance arrives here in `AiResponding` and is ignored, so the
        // same utterance can never be sent twice.
        if self.state != CallState::SilencePending {
            return Vec::new();
        }
        let utterance = std::mem::take(&mut self.transcript);
        if utterance.trim().is_empty() {
            self.state = CallState::Listening;
            return Vec::new();
        }
        self.state = CallState::AiResponding;
        vec![Command::StopCapture, Command::SendChat(utterance)]
    }

    fn on_reply(&mut self, text: String) -> Vec<Command> {
        match self.state {
            CallState::AiResponding => {
                self.state = CallState::Speaking;
                vec![Command::Speak(text)]
            }
            // Call mode lapsed while the request was in flight: the driver
            // records the turn, nothing is spoken.
            _ => Vec::new(),
        }
    }

    fn on_reply_failed(&mut self) -> Vec<Command> {
        match self.state {
            CallState::AiResponding => {
                self.state = CallState::Listening;
                vec![Command::StartCapture]
            }
            _ => Vec::new(),
        }
    }

    fn on_playback_finished(&mut self) -> Vec<Command> {
        match self.state {
            CallState::Speaking => {
                self.state = CallState::Listening;
                vec![Command::ScheduleRestart(RestartCause::PlaybackGrace)]
            }
            _ => Vec::new(),
        }
    }

    fn on_recognition_error(&mut self, kind: RecognitionErrorKind) -> Vec<Command> {
        if !matches!(
            self.state,
            CallState::Listening | CallState::SilencePending
        ) {
            return Vec::new();
        }

        if !kind.is_transient() {
            self.state = CallState::Idle;
            self.transcript.clear();
            return vec![
                Command::StopCapture,
                Command::DisarmSilenceTimer,
                Command::Notify(Notice::MicrophoneDenied),
            ];
        }

        self.restart_attempts += 1;
        if self.restart_attempts > self.max_restart_attempts {
            self.state = CallState::Idle;
            self.transcript.clear();
            return vec![
                Command::StopCapture,
                Command::DisarmSilenceTimer,
                Command::Notify(Notice::CaptureLost),
            ];
        }
        vec![Command::ScheduleRestart(RestartCause::TransientError)]
    }

    fn on_restart_timer(&mut self) -> Vec<Command> {
        match self.state {
            CallState::Listening | CallState::SilencePending => vec![Command::StartCapture],
            // Call ended while the restart was pending.
            _ => Vec::new(),
        }
    }
}
