//! Intake console binary — a terminal chat client for the Intake voice
//! assistant, with text entry and a voice call mode.
//!
//! Starts the session driver with subprocess speech engines, structured
//! logging, and graceful shutdown on Ctrl-C. If the speech engine binaries
//! are missing the call control is disabled with an explanatory message and
//! the text path keeps working.

mod commands;
mod config;

use std::path::Path;
use std::sync::Arc;

use intake_agent::{ChatClient, ConversationFlow};
use intake_observe::DiagnosticLog;
use intake_session::{SessionDriver, SessionHandle, SessionUpdate};
use intake_types::{CaseDetails, Turn};
use intake_voice::{probe_binary, PipedCapture, PipedSynthesis, SpeechCapture, SpeechSynthesis};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use commands::{parse, ReplCommand, HELP_TEXT};

fn resolve_config_path() -> (Option<String>, &'static str) {
    if let Some(path) = std::env::args()
        .nth(1)
        .filter(|value| !value.trim().is_empty())
    {
        return (Some(path), "cli-arg");
    }

    if let Ok(path) = std::env::var("INTAKE_CONFIG_PATH") {
        if !path.trim().is_empty() {
            return (Some(path), "env-var");
        }
    }

    (None, "default")
}

/// Checks both engine binaries once at startup. Returns the reason call
/// mode is unavailable, if it is.
fn probe_engines(voice: &config::VoiceConfig) -> Option<String> {
    if let Err(e) = probe_binary(Path::new(&voice.capture_binary), "capture") {
        return Some(e.to_string());
    }
    if let Err(e) = probe_binary(Path::new(&voice.synthesis_binary), "synthesis") {
        return Some(e.to_string());
    }
    None
}

fn print_update(update: SessionUpdate) {
    match update {
        SessionUpdate::StateChanged(state) => println!("(call: {state})"),
        SessionUpdate::Interim(text) => println!("(hearing) {text}"),
        SessionUpdate::TurnAdded(Turn { role, content }) => println!("[{role}] {content}"),
        SessionUpdate::Notice(notice) => println!("! {notice}"),
    }
}

fn print_details(details: &CaseDetails) {
    if details.is_empty() {
        println!("(no case details extracted yet)");
        return;
    }
    let field = |value: &Option<String>| value.clone().unwrap_or_else(|| "-".to_string());
    println!("inquiry:      {}", field(&details.inquiry));
    println!("name:         {}", field(&details.name));
    println!("mobile:       {}", field(&details.mobile_number));
    println!("email:        {}", field(&details.email_address));
    println!("appointment:  {}", field(&details.appointment_date_time));
}

async fn handle_command(
    command: ReplCommand,
    handle: &SessionHandle,
    diagnostics: &DiagnosticLog,
    voice_unavailable: &Option<String>,
) -> bool {
    match command {
        ReplCommand::Chat(text) => {
            if handle.send_text(text).is_err() {
                return false;
            }
        }
        ReplCommand::ToggleCall => match voice_unavailable {
            Some(reason) => println!("! call mode unavailable: {reason}"),
            None => {
                if handle.toggle_call().is_err() {
                    return false;
                }
            }
        },
        ReplCommand::Details => match handle.case_details().await {
            Ok(details) => print_details(&details),
            Err(_) => return false,
        },
        ReplCommand::ShowLog => {
            if diagnostics.is_empty() {
                println!("(diagnostic log is empty)");
            } else {
                println!("{}", diagnostics.render());
            }
        }
        ReplCommand::ClearLog => {
            diagnostics.clear();
            println!("(diagnostic log cleared)");
        }
        ReplCommand::Help => println!("{HELP_TEXT}"),
        ReplCommand::Quit => return false,
        ReplCommand::Empty => {}
        ReplCommand::Unknown(name) => {
            println!("! unknown command: /{name} (try /help)");
        }
    }
    true
}

async fn repl(
    handle: SessionHandle,
    mut updates: mpsc::UnboundedReceiver<SessionUpdate>,
    diagnostics: Arc<DiagnosticLog>,
    voice_unavailable: Option<String>,
) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                result.expect("failed to install Ctrl+C handler");
                tracing::info!("received SIGINT, shutting down");
                break;
            }
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    let command = parse(&line);
                    if !handle_command(command, &handle, &diagnostics, &voice_unavailable).await {
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    tracing::error!(error = %e, "failed to read input");
                    break;
                }
            },
            Some(update) = updates.recv() => print_update(update),
        }
    }

    // Tears down any active call, flushing a pending transcript.
    let _ = handle.shutdown();
}

#[tokio::main]
async fn main() {
    let (resolved_config_path, config_source) = resolve_config_path();
    let selected_config_path = resolved_config_path.as_deref().or(Some("config.toml"));

    // Load configuration
    let config = config::load_config(selected_config_path)
        .expect("failed to load configuration — the console cannot start without valid config");

    // Initialize tracing
    let filter =
        EnvFilter::try_new(&config.logging.level).unwrap_or_else(|_| EnvFilter::new("info"));

    if config.logging.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    tracing::info!(
        source = config_source,
        path = selected_config_path.unwrap_or("<none>"),
        "resolved startup configuration path"
    );

    let diagnostics = Arc::new(DiagnosticLog::with_capacity(config.diagnostics.capacity));
    let flow = Arc::new(ConversationFlow::new(
        ChatClient::new(&config.backend.base_url),
        Arc::clone(&diagnostics),
    ));

    let voice_unavailable = probe_engines(&config.voice);
    if let Some(reason) = &voice_unavailable {
        diagnostics.record("startup", reason.clone());
        println!("! voice call mode is unavailable: {reason}");
        println!("! text chat still works; see /help");
    }

    let capture: Arc<dyn SpeechCapture> = Arc::new(PipedCapture::new(
        &config.voice.capture_binary,
        config.voice.capture_model.clone().map(Into::into),
    ));
    let synthesis: Arc<dyn SpeechSynthesis> =
        Arc::new(PipedSynthesis::new(&config.voice.synthesis_binary));

    let (handle, updates, driver_task) = SessionDriver::spawn(
        config.call.clone(),
        capture,
        synthesis,
        flow,
        Arc::clone(&diagnostics),
    );

    println!("intake console — type /help for commands");
    tracing::info!(backend = %config.backend.base_url, "starting intake console");

    repl(handle, updates, Arc::clone(&diagnostics), voice_unavailable).await;

    driver_task.await.expect("session driver task failed");
    tracing::info!("intake console shut down");
}
