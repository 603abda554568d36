//! Wire types for the backend API.
//!
//! Requests use snake_case field names. Older backend revisions answered
//! with camelCase (`aiResponse`); the response type accepts both spellings
//! so neither drift direction breaks the client.

use intake_types::Turn;
use serde::{Deserialize, Serialize};

/// Body of `POST /chat`.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest<'a> {
    pub user_input: &'a str,
    pub conversation_history: &'a [Turn],
}

/// Reply of `POST /chat`.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    #[serde(alias = "aiResponse")]
    pub ai_response: String,
}

/// Body of `POST /schedule-callback`.
#[derive(Debug, Clone, Serialize)]
pub struct CallbackRequest<'a> {
    pub appointment_date_time: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_address: Option<&'a str>,
}
