//! Outbound interface to the conversational-AI backend.
//!
//! This crate owns everything that crosses the wire to the backend and
//! everything derived from the conversation text:
//!
//! - [`ChatClient`] posts finalized utterances to `POST /chat` and schedules
//!   call-backs via `POST /schedule-callback`;
//! - [`extract_case_details`] runs best-effort regex extraction over the
//!   user's turns;
//! - [`ConversationFlow`] ties the two together for one conversation turn:
//!   request a reply, re-extract details from the updated history, and fire a
//!   call-back request when an appointment has been captured.
//!
//! The backend is an external collaborator. Requests use snake_case field
//! names; the reply decoder tolerates the camelCase drift observed in older
//! backend revisions (`aiResponse`).

mod client;
mod error;
mod extract;
mod flow;
mod wire;

pub use client::ChatClient;
pub use error::AgentError;
pub use extract::extract_case_details;
pub use flow::{ConversationFlow, TurnOutcome, RETRY_PROMPT};
pub use wire::{CallbackRequest, ChatRequest, ChatResponse};
