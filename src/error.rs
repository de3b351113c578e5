//! Error types for the Attune engine

use thiserror::Error;

/// Result type alias for Attune operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the voice interaction engine
///
/// Nothing here is fatal to the process: every failure degrades a single
/// feature (listening, one command, or voice selection) while leaving the
/// rest of the state machine usable.
#[derive(Debug, Error)]
pub enum Error {
    /// The platform offers no speech-capture capability
    #[error("speech capture is not supported on this platform")]
    CaptureUnsupported,

    /// Runtime capture failure; the code is surfaced verbatim from the provider
    #[error("capture error: {0}")]
    Capture(String),

    /// A single command binding's action failed
    #[error("action '{binding}' failed: {message}")]
    Action {
        /// Name of the binding whose action failed
        binding: String,
        /// Failure message from the action
        message: String,
    },

    /// No synthetic voice matched the requested locale
    #[error("no voice available for locale {0}")]
    VoiceResolution(String),

    /// Speech synthesis error
    #[error("synthesis error: {0}")]
    Synthesis(String),

    /// Unknown locale or modality name
    #[error("unrecognized value: {0}")]
    Parse(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
