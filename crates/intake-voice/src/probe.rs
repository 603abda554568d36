//! Startup capability probe.

use std::path::Path;

use crate::error::VoiceError;

/// Checks once, at startup, that an engine binary is present.
///
/// The hosting application calls this for the capture and synthesis
/// binaries before offering call mode; on failure the call control is
/// disabled with the returned message instead of failing later mid-call.
pub fn probe_binary(path: &Path, what: &str) -> Result<(), VoiceError> {
    match std::fs::metadata(path) {
        Ok(meta) if meta.is_file() => Ok(()),
        Ok(_) => Err(VoiceError::Unavailable(format!(
            "{what} engine path {} is not a regular file",
            path.display()
        ))),
        Err(e) => Err(VoiceError::Unavailable(format!(
            "{what} engine binary {} is not available: {e}",
            path.display()
        ))),
    }
}
