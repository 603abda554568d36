//! Per-utterance conversation flow.
//!
//! One finalized utterance drives one backend round trip. After a
//! successful reply the updated history is re-scanned for case details, and
//! once an appointment date/time has been captured a call-back is requested
//! from the backend. Call-back scheduling is best-effort: failures are
//! recorded to the diagnostic log and swallowed, and the same appointment is
//! not re-submitted on every subsequent turn.

use std::sync::{Arc, Mutex};

use intake_observe::DiagnosticLog;
use intake_types::{CaseDetails, Turn};
use tracing::info;

use crate::client::ChatClient;
use crate::error::AgentError;
use crate::extract::extract_case_details;

/// Shown to the user (as a system turn) when the backend round trip fails.
pub const RETRY_PROMPT: &str =
    "I'm sorry, I'm having trouble processing your request right now. Could you please try again?";

/// Result of one completed conversation turn.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub ai_response: String,
    pub case_details: CaseDetails,
    /// True when this turn submitted a new call-back request.
    pub callback_requested: bool,
}

/// Orchestrates chat round trips, extraction, and call-back scheduling.
pub struct ConversationFlow {
    client: ChatClient,
    diagnostics: Arc<DiagnosticLog>,
    last_scheduled: Mutex<Option<String>>,
}

impl ConversationFlow {
    pub fn new(client: ChatClient, diagnostics: Arc<DiagnosticLog>) -> Self {
        Self {
            client,
            diagnostics,
            last_scheduled: Mutex::new(None),
        }
    }

    /// Sends one utterance against the given history snapshot.
    ///
    /// Failures are recorded to the diagnostic log before being returned;
    /// the caller decides how to surface them (typically as a system turn
    /// carrying [`RETRY_PROMPT`]).
    pub async fn request_reply(
        &self,
        user_input: &str,
        history: &[Turn],
    ) -> Result<String, AgentError> {
        match self.client.send_chat(user_input, history).await {
            Ok(reply) => Ok(reply),
            Err(err) => {
                self.diagnostics.record("chat", err.to_string());
                Err(err)
            }
        }
    }

    /// Re-extracts case details from `history` and, when a new appointment
    /// date/time is present, requests a call-back.
    ///
    /// Returns the extracted details and whether a call-back was submitted
    /// this time. Scheduling failures are logged and swallowed so that the
    /// next turn retries.
    pub async fn review_details(&self, history: &[Turn]) -> (CaseDetails, bool) {
        let details = extract_case_details(history);

        let Some(appointment) = details.appointment_date_time.clone() else {
            return (details, false);
        };

        let already_scheduled = {
            let last = self.lock_last_scheduled();
            last.as_deref() == Some(appointment.as_str())
        };
        if already_scheduled {
            return (details, false);
        }

        match self
            .client
            .schedule_callback(&appointment, details.email_address.as_deref())
            .await
        {
            Ok(()) => {
                info!(%appointment, "callback scheduled");
                *self.lock_last_scheduled() = Some(appointment);
                (details, true)
            }
            Err(err) => {
                self.diagnostics
                    .record("callback", format!("failed to schedule callback: {err}"));
                (details, false)
            }
        }
    }

    /// Runs one full conversation turn for the text-entry path: send the
    /// utterance, append the user and assistant turns to `history`, then
    /// review the updated history for case details.
    ///
    /// On failure nothing is appended; the caller surfaces the error.
    pub async fn run_turn(
        &self,
        history: &mut Vec<Turn>,
        user_input: &str,
    ) -> Result<TurnOutcome, AgentError> {
        let reply = self.request_reply(user_input, history).await?;

        history.push(Turn::user(user_input));
        history.push(Turn::assistant(reply.clone()));

        let (case_details, callback_requested) = self.review_details(history).await;

        Ok(TurnOutcome {
            ai_response: reply,
            case_details,
            callback_requested,
        })
    }

    fn lock_last_scheduled(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        self.last_scheduled.lock().unwrap_or_else(|e| e.into_inner())
    }
}
