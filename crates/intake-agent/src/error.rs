use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgentError {
    /// The utterance was empty or whitespace-only; nothing was sent.
    #[error("refusing to send an empty utterance")]
    EmptyInput,

    /// The request could not be sent or the reply could not be decoded.
    #[error("backend transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("backend returned status {0}")]
    Backend(u16),
}
