//! Tests for the subprocess engines that need no real speech binary: guard
//! paths, spawn failures, and the stdout line protocol (driven by `echo`).

use intake_voice::{
    probe_binary, PipedCapture, PipedSynthesis, RecognitionErrorKind, RecognitionEvent,
    SpeechCapture, SpeechSynthesis, VoiceError,
};
use std::io::Write;
use std::path::Path;

#[tokio::test]
async fn synthesis_rejects_oversized_text() {
    let synthesis = PipedSynthesis::new("/nonexistent/tts");
    let text = "a".repeat(64 * 1024 + 1);

    let err = synthesis.speak(&text).await.unwrap_err();
    match err {
        VoiceError::Synthesis(msg) => assert!(msg.contains("maximum size")),
        other => panic!("expected Synthesis error, got {other:?}"),
    }
}

#[tokio::test]
async fn synthesis_skips_blank_text_without_spawning() {
    // A blank utterance must resolve Ok even with no engine installed.
    let synthesis = PipedSynthesis::new("/nonexistent/tts");
    synthesis.speak("   ").await.expect("blank text is a no-op");
}

#[tokio::test]
async fn synthesis_spawn_failure_is_reported() {
    let synthesis = PipedSynthesis::new("/nonexistent/tts");
    let err = synthesis.speak("hello").await.unwrap_err();
    match err {
        VoiceError::Synthesis(msg) => assert!(msg.contains("spawn")),
        other => panic!("expected Synthesis error, got {other:?}"),
    }
}

#[tokio::test]
async fn capture_spawn_failure_is_reported() {
    let capture = PipedCapture::new("/nonexistent/stt", None);
    let err = capture.start().await.unwrap_err();
    assert!(matches!(err, VoiceError::Capture(_)));
}

#[cfg(unix)]
#[tokio::test]
async fn capture_parses_the_line_protocol() {
    // `echo` stands in for the engine: one interim line, one final line,
    // then process exit (reported as a transient network-class error).
    let capture = PipedCapture::new("/bin/echo", None)
        .with_args(["~ hello wor\nhello world".to_string()]);

    let mut events = capture.start().await.expect("echo should spawn");

    assert_eq!(
        events.recv().await,
        Some(RecognitionEvent::Interim("hello wor".to_string()))
    );
    assert_eq!(
        events.recv().await,
        Some(RecognitionEvent::Final("hello world".to_string()))
    );
    assert_eq!(
        events.recv().await,
        Some(RecognitionEvent::Error(RecognitionErrorKind::Network)),
        "unexpected engine exit must surface as a transient error"
    );
    assert_eq!(events.recv().await, None);
}

#[cfg(unix)]
#[tokio::test]
async fn stop_suppresses_the_exit_error() {
    // `sleep` produces no output and blocks until killed.
    let capture = PipedCapture::new("/bin/sleep", None).with_args(["30".to_string()]);
    let mut events = capture.start().await.expect("sleep should spawn");

    capture.stop().await;

    // The stream must end without a spurious error event.
    assert_eq!(events.recv().await, None);
}

#[test]
fn probe_accepts_a_regular_file() {
    let mut file = tempfile::NamedTempFile::new().expect("should create temp file");
    file.write_all(b"#!/bin/sh\n").expect("should write");

    probe_binary(file.path(), "capture").expect("existing file should probe ok");
    assert!(probe_binary(Path::new("/nonexistent/engine"), "capture").is_err());
}
