use std::time::Duration;

use intake_types::Turn;
use tracing::debug;

use crate::error::AgentError;
use crate::wire::{CallbackRequest, ChatRequest, ChatResponse};

/// Timeout for one backend round trip.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client for the conversational-AI backend.
#[derive(Debug, Clone)]
pub struct ChatClient {
    http: reqwest::Client,
    base_url: String,
}

impl ChatClient {
    /// Creates a client for the backend at `base_url` (no trailing slash
    /// required).
    pub fn new(base_url: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Returns the configured backend base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Sends one finalized utterance and returns the assistant's reply.
    ///
    /// `history` is the conversation *before* this utterance; the backend
    /// receives it unchanged alongside `user_input`. Exactly one request is
    /// sent per call; empty or whitespace-only input is rejected before any
    /// network activity.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::EmptyInput`] for blank input,
    /// [`AgentError::Backend`] for non-success statuses, and
    /// [`AgentError::Transport`] for connection or decode failures.
    pub async fn send_chat(&self, user_input: &str, history: &[Turn]) -> Result<String, AgentError> {
        if user_input.trim().is_empty() {
            return Err(AgentError::EmptyInput);
        }

        debug!(chars = user_input.len(), turns = history.len(), "sending chat request");

        let response = self
            .http
            .post(format!("{}/chat", self.base_url))
            .json(&ChatRequest {
                user_input,
                conversation_history: history,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AgentError::Backend(status.as_u16()));
        }

        let reply: ChatResponse = response.json().await?;
        Ok(reply.ai_response)
    }

    /// Requests a call-back at the extracted appointment time.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Backend`] for non-success statuses and
    /// [`AgentError::Transport`] for connection failures.
    pub async fn schedule_callback(
        &self,
        appointment_date_time: &str,
        email_address: Option<&str>,
    ) -> Result<(), AgentError> {
        debug!(appointment_date_time, "scheduling callback");

        let response = self
            .http
            .post(format!("{}/schedule-callback", self.base_url))
            .json(&CallbackRequest {
                appointment_date_time,
                email_address,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AgentError::Backend(status.as_u16()));
        }
        Ok(())
    }
}
