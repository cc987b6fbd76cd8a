//! Error types for the revid library.
//!
//! Every failure is reported to the caller as a typed result; nothing in
//! this library terminates the host process.

use thiserror::Error;

/// Main error type for the revid library.
#[derive(Error, Debug)]
pub enum Error {
    /// The container holds no track whose media type begins with `video/`.
    #[error("No video track found in container")]
    NoVideoTrack,

    /// A decoder or encoder could not be created or configured for a format.
    #[error("Codec configuration failure: {0}")]
    CodecConfig(String),

    /// The container is malformed or unreadable.
    #[error("Extractor failure: {0}")]
    Extractor(String),

    /// A pump made no progress within its liveness budget.
    #[error("Pump stalled after {idle_iterations} idle iterations")]
    PumpStall { idle_iterations: u32 },

    /// I/O errors while writing intermediate or output bytes.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The conversion was cancelled by the caller.
    #[error("Operation cancelled")]
    Cancelled,

    /// Invalid parameter provided.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Discriminant of an [`Error`], used where only the kind matters
/// (e.g. the orchestrator's terminal `Failed` state).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NoVideoTrack,
    CodecConfig,
    Extractor,
    PumpStall,
    Io,
    Cancelled,
    InvalidParameter,
}

impl Error {
    /// Create a codec configuration error.
    pub fn codec_config(msg: impl Into<String>) -> Self {
        Error::CodecConfig(msg.into())
    }

    /// Create an extractor error.
    pub fn extractor(msg: impl Into<String>) -> Self {
        Error::Extractor(msg.into())
    }

    /// Create an invalid parameter error.
    pub fn invalid_param(msg: impl Into<String>) -> Self {
        Error::InvalidParameter(msg.into())
    }

    /// Get the kind of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NoVideoTrack => ErrorKind::NoVideoTrack,
            Error::CodecConfig(_) => ErrorKind::CodecConfig,
            Error::Extractor(_) => ErrorKind::Extractor,
            Error::PumpStall { .. } => ErrorKind::PumpStall,
            Error::Io(_) => ErrorKind::Io,
            Error::Cancelled => ErrorKind::Cancelled,
            Error::InvalidParameter(_) => ErrorKind::InvalidParameter,
        }
    }

    /// Check if this error was caused by cancellation.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
