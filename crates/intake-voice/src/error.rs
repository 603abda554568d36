use thiserror::Error;

#[derive(Error, Debug)]
pub enum VoiceError {
    #[error("capture error: {0}")]
    Capture(String),

    #[error("synthesis error: {0}")]
    Synthesis(String),

    #[error("engine unavailable: {0}")]
    Unavailable(String),

    #[error("invalid engine configuration: {0}")]
    Config(String),
}
