//! Console configuration loading from file and environment variables.

use intake_types::CallConfig;
use serde::Deserialize;
use thiserror::Error;

/// Top-level console configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Conversational-AI backend settings.
    #[serde(default)]
    pub backend: BackendConfig,

    /// Speech engine settings.
    #[serde(default)]
    pub voice: VoiceConfig,

    /// Call-loop timing.
    #[serde(default)]
    pub call: CallConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Diagnostic ring settings.
    #[serde(default)]
    pub diagnostics: DiagnosticsConfig,
}

/// Where the chat backend lives.
#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    /// Base URL for `POST /chat` and `POST /schedule-callback`.
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

/// Speech engine binaries.
#[derive(Debug, Clone, Deserialize)]
pub struct VoiceConfig {
    /// Streaming speech-to-text binary.
    #[serde(default = "default_capture_binary")]
    pub capture_binary: String,

    /// Model file passed to the capture binary via `-m`, if any.
    #[serde(default)]
    pub capture_model: Option<String>,

    /// Text-to-speech binary.
    #[serde(default = "default_synthesis_binary")]
    pub synthesis_binary: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g. "info", "debug", "intake_session=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

/// Diagnostic ring configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DiagnosticsConfig {
    /// Maximum retained diagnostic entries.
    #[serde(default = "default_diagnostics_capacity")]
    pub capacity: usize,
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_capture_binary() -> String {
    "whisper-stream".to_string()
}

fn default_synthesis_binary() -> String {
    "espeak-ng".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_diagnostics_capacity() -> usize {
    100
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            capture_binary: default_capture_binary(),
            capture_model: None,
            synthesis_binary: default_synthesis_binary(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            capacity: default_diagnostics_capacity(),
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Loads configuration from a TOML file, falling back to defaults.
///
/// Environment variable overrides:
/// - `INTAKE_BACKEND_URL` overrides `backend.base_url`
/// - `INTAKE_CAPTURE_BINARY` overrides `voice.capture_binary`
/// - `INTAKE_CAPTURE_MODEL` overrides `voice.capture_model`
/// - `INTAKE_SYNTHESIS_BINARY` overrides `voice.synthesis_binary`
/// - `INTAKE_LOG_LEVEL` overrides `logging.level`
/// - `INTAKE_LOG_JSON` overrides `logging.json` (set to "true" to enable)
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    // Environment variable overrides
    if let Ok(url) = std::env::var("INTAKE_BACKEND_URL") {
        config.backend.base_url = url;
    }
    if let Ok(binary) = std::env::var("INTAKE_CAPTURE_BINARY") {
        config.voice.capture_binary = binary;
    }
    if let Ok(model) = std::env::var("INTAKE_CAPTURE_MODEL") {
        config.voice.capture_model = Some(model);
    }
    if let Ok(binary) = std::env::var("INTAKE_SYNTHESIS_BINARY") {
        config.voice.synthesis_binary = binary;
    }
    if let Ok(level) = std::env::var("INTAKE_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Ok(json) = std::env::var("INTAKE_LOG_JSON") {
        config.logging.json = json == "true";
    }

    Ok(config)
}
