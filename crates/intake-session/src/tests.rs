//! Unit tests for the call-loop state machine.

use intake_voice::RecognitionErrorKind;

use crate::machine::{CallSession, CallState, Command, Notice, RestartCause, SessionEvent};

fn session() -> CallSession {
    CallSession::new(5)
}

/// Drives the session into `Listening` with capture started.
fn start_call(session: &mut CallSession) {
    let commands = session.handle(SessionEvent::ToggleCall);
    assert_eq!(commands, vec![Command::StartCapture]);
    assert_eq!(session.state(), CallState::Listening);
}

fn sends_in(commands: &[Command]) -> Vec<&str> {
    commands
        .iter()
        .filter_map(|c| match c {
            Command::SendChat(text) => Some(text.as_str()),
            _ => None,
        })
        .collect()
}

#[test]
fn toggle_starts_and_stops_the_call() {
    let mut session = session();
    assert_eq!(session.state(), CallState::Idle);

    start_call(&mut session);

    let commands = session.handle(SessionEvent::ToggleCall);
    assert_eq!(session.state(), CallState::Idle);
    assert!(commands.contains(&Command::CancelSpeech));
    assert!(commands.contains(&Command::StopCapture));
    assert!(sends_in(&commands).is_empty(), "nothing buffered, nothing sent");
}

#[test]
fn interim_results_arm_and_rearm_the_silence_timer() {
    let mut session = session();
    start_call(&mut session);

    let commands = session.handle(SessionEvent::Interim("hel".to_string()));
    assert_eq!(commands, vec![Command::ArmSilenceTimer]);
    assert_eq!(session.state(), CallState::SilencePending);

    // Every further interim result supersedes the buffer and re-arms.
    let commands = session.handle(SessionEvent::Interim("hello".to_string()));
    assert_eq!(commands, vec![Command::ArmSilenceTimer]);
    assert_eq!(session.state(), CallState::SilencePending);
}

#[test]
fn silence_timer_sends_the_buffered_utterance_once() {
    let mut session = session();
    start_call(&mut session);
    session.handle(SessionEvent::Interim("book an appointment".to_string()));

    let commands = session.handle(SessionEvent::SilenceTimerFired);
    assert_eq!(sends_in(&commands), vec!["book an appointment"]);
    assert!(commands.contains(&Command::StopCapture));
    assert_eq!(session.state(), CallState::AiResponding);

    // A stale timer firing again must not re-send.
    let commands = session.handle(SessionEvent::SilenceTimerFired);
    assert!(commands.is_empty());
}

#[test]
fn final_result_sends_without_waiting_for_the_timer() {
    let mut session = session();
    start_call(&mut session);
    session.handle(SessionEvent::Interim("hello th".to_string()));

    let commands = session.handle(SessionEvent::Final("hello there".to_string()));
    assert_eq!(sends_in(&commands), vec!["hello there"]);
    assert!(commands.contains(&Command::DisarmSilenceTimer));
    assert_eq!(session.state(), CallState::AiResponding);
}

#[test]
fn final_result_and_timer_never_double_send() {
    let mut session = session();
    start_call(&mut session);
    session.handle(SessionEvent::Interim("hello".to_string()));

    // Both fire for the same utterance; only the first may send.
    let first = session.handle(SessionEvent::Final("hello".to_string()));
    let second = session.handle(SessionEvent::SilenceTimerFired);

    assert_eq!(sends_in(&first).len(), 1);
    assert!(second.is_empty(), "the stale timer must be ignored");
}

#[test]
fn timer_with_empty_buffer_returns_to_listening_without_sending() {
    let mut session = session();
    start_call(&mut session);
    session.handle(SessionEvent::Interim("   ".to_string()));

    let commands = session.handle(SessionEvent::SilenceTimerFired);
    assert!(sends_in(&commands).is_empty());
    assert_eq!(session.state(), CallState::Listening);
}

#[test]
fn whitespace_final_result_sends_nothing() {
    let mut session = session();
    start_call(&mut session);

    let commands = session.handle(SessionEvent::Final("  \t ".to_string()));
    assert!(sends_in(&commands).is_empty());
    assert_eq!(session.state(), CallState::Listening);
}

#[test]
fn toggle_off_flushes_a_pending_transcript() {
    let mut session = session();
    start_call(&mut session);
    session.handle(SessionEvent::Interim("call me back tomorrow".to_string()));
    assert_eq!(session.state(), CallState::SilencePending);

    let commands = session.handle(SessionEvent::ToggleCall);
    assert_eq!(sends_in(&commands), vec!["call me back tomorrow"]);
    assert!(commands.contains(&Command::DisarmSilenceTimer));
    assert_eq!(session.state(), CallState::Idle);
}

#[test]
fn reply_is_spoken_while_the_call_is_active() {
    let mut session = session();
    start_call(&mut session);
    session.handle(SessionEvent::Final("hello".to_string()));
    assert_eq!(session.state(), CallState::AiResponding);

    let commands = session.handle(SessionEvent::ReplyReceived("hi there".to_string()));
    assert_eq!(commands, vec![Command::Speak("hi there".to_string())]);
    assert_eq!(session.state(), CallState::Speaking);
}

#[test]
fn reply_after_call_ends_is_not_spoken() {
    let mut session = session();
    start_call(&mut session);
    session.handle(SessionEvent::Final("hello".to_string()));
    session.handle(SessionEvent::ToggleCall);
    assert_eq!(session.state(), CallState::Idle);

    let commands = session.handle(SessionEvent::ReplyReceived("hi there".to_string()));
    assert!(commands.is_empty(), "no speech once the call is over");
    assert_eq!(session.state(), CallState::Idle);
}

#[test]
fn failed_reply_returns_to_listening() {
    let mut session = session();
    start_call(&mut session);
    session.handle(SessionEvent::Final("hello".to_string()));

    let commands = session.handle(SessionEvent::ReplyFailed);
    assert_eq!(commands, vec![Command::StartCapture]);
    assert_eq!(session.state(), CallState::Listening);
}

#[test]
fn playback_end_restarts_capture_after_the_grace_delay() {
    let mut session = session();
    start_call(&mut session);
    session.handle(SessionEvent::Final("hello".to_string()));
    session.handle(SessionEvent::ReplyReceived("hi".to_string()));
    assert_eq!(session.state(), CallState::Speaking);

    let commands = session.handle(SessionEvent::PlaybackFinished);
    assert_eq!(
        commands,
        vec![Command::ScheduleRestart(RestartCause::PlaybackGrace)]
    );
    assert_eq!(session.state(), CallState::Listening);

    let commands = session.handle(SessionEvent::RestartTimerFired);
    assert_eq!(commands, vec![Command::StartCapture]);
}

#[test]
fn restart_timer_after_call_end_is_ignored() {
    let mut session = session();
    start_call(&mut session);
    session.handle(SessionEvent::Final("hello".to_string()));
    session.handle(SessionEvent::ReplyReceived("hi".to_string()));
    session.handle(SessionEvent::PlaybackFinished);
    session.handle(SessionEvent::ToggleCall);

    let commands = session.handle(SessionEvent::RestartTimerFired);
    assert!(commands.is_empty());
    assert_eq!(session.state(), CallState::Idle);
}

#[test]
fn listening_and_speaking_are_never_concurrent() {
    let mut session = session();
    let script = vec![
        SessionEvent::ToggleCall,
        SessionEvent::Interim("hel".to_string()),
        SessionEvent::Interim("hello".to_string()),
        SessionEvent::Final("hello there".to_string()),
        SessionEvent::SilenceTimerFired,
        SessionEvent::ReplyReceived("hi, how can I help?".to_string()),
        SessionEvent::PlaybackFinished,
        SessionEvent::RestartTimerFired,
        SessionEvent::Interim("bye".to_string()),
        SessionEvent::ToggleCall,
        SessionEvent::ReplyReceived("goodbye".to_string()),
    ];

    for event in script {
        session.handle(event);
        assert!(
            !(session.is_listening() && session.is_speaking()),
            "listening and speaking overlapped in state {}",
            session.state()
        );
    }
}

#[test]
fn transient_errors_restart_capture_with_a_bound() {
    let mut session = session();
    start_call(&mut session);

    for _ in 0..5 {
        let commands = session.handle(SessionEvent::RecognitionError(
            RecognitionErrorKind::NoSpeech,
        ));
        assert_eq!(
            commands,
            vec![Command::ScheduleRestart(RestartCause::TransientError)]
        );
        session.handle(SessionEvent::RestartTimerFired);
    }

    // The sixth consecutive failure exceeds the bound and ends the call.
    let commands = session.handle(SessionEvent::RecognitionError(
        RecognitionErrorKind::Network,
    ));
    assert!(commands.contains(&Command::Notify(Notice::CaptureLost)));
    assert!(commands.contains(&Command::StopCapture));
    assert_eq!(session.state(), CallState::Idle);
}

#[test]
fn successful_recognition_resets_the_restart_counter() {
    let mut session = session();
    start_call(&mut session);

    for _ in 0..4 {
        session.handle(SessionEvent::RecognitionError(
            RecognitionErrorKind::NoSpeech,
        ));
        session.handle(SessionEvent::RestartTimerFired);
    }

    // A real result arrives; the counter starts over.
    session.handle(SessionEvent::Interim("hello".to_string()));

    for _ in 0..5 {
        let commands = session.handle(SessionEvent::RecognitionError(
            RecognitionErrorKind::NoSpeech,
        ));
        assert_eq!(
            commands,
            vec![Command::ScheduleRestart(RestartCause::TransientError)],
            "counter must have been reset by the successful result"
        );
        session.handle(SessionEvent::RestartTimerFired);
    }
}

#[test]
fn permission_denial_ends_the_call_with_a_notice() {
    let mut session = session();
    start_call(&mut session);
    session.handle(SessionEvent::Interim("hello".to_string()));

    let commands = session.handle(SessionEvent::RecognitionError(
        RecognitionErrorKind::NotAllowed,
    ));
    assert!(commands.contains(&Command::Notify(Notice::MicrophoneDenied)));
    assert!(commands.contains(&Command::StopCapture));
    assert_eq!(session.state(), CallState::Idle);

    // Capture stays disabled until the user toggles again.
    let commands = session.handle(SessionEvent::RestartTimerFired);
    assert!(commands.is_empty());
}

#[test]
fn events_outside_a_call_are_ignored() {
    let mut session = session();

    for event in [
        SessionEvent::Interim("stray".to_string()),
        SessionEvent::Final("stray".to_string()),
        SessionEvent::SilenceTimerFired,
        SessionEvent::PlaybackFinished,
        SessionEvent::RecognitionError(RecognitionErrorKind::Network),
        SessionEvent::RestartTimerFired,
    ] {
        assert!(session.handle(event).is_empty());
        assert_eq!(session.state(), CallState::Idle);
    }
}

#[test]
fn state_labels() {
    assert_eq!(CallState::Idle.as_str(), "idle");
    assert_eq!(CallState::Listening.as_str(), "listening");
    assert_eq!(CallState::SilencePending.as_str(), "silence-pending");
    assert_eq!(CallState::AiResponding.as_str(), "ai-responding");
    assert_eq!(CallState::Speaking.as_str(), "speaking");
}
