//! Error handling module for the edit engine

use std::time::Duration;
use thiserror::Error;

/// Main error type for engine operations
#[derive(Error, Debug)]
pub enum EngineError {
    /// The external program could not be started
    #[error("Failed to launch {program}: {source}")]
    LaunchFailure {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The external program ran but reported failure
    #[error("{program} exited with {}", exit_label(.code))]
    NonZeroExit { program: String, code: Option<i32> },

    /// Reading process output, writing a manifest or scratch I/O failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The external program did not finish within the configured timeout
    #[error("{program} timed out after {after:?}")]
    TimedOut { program: String, after: Duration },

    /// The operation was cancelled by the caller
    #[error("Operation cancelled")]
    Cancelled,

    /// A pipeline was asked to do something it cannot
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Configuration could not be loaded or is invalid
    #[error("Configuration error: {0}")]
    Config(String),
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "a signal".to_string(),
    }
}

impl EngineError {
    /// Short machine-readable name of the failure kind
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::LaunchFailure { .. } => "launch_failure",
            EngineError::NonZeroExit { .. } => "non_zero_exit",
            EngineError::Io(_) => "io_failure",
            EngineError::TimedOut { .. } => "timed_out",
            EngineError::Cancelled => "cancelled",
            EngineError::InvalidArgument(_) => "invalid_argument",
            EngineError::Config(_) => "config",
        }
    }
}

/// Result type alias for engine operations
pub type EngineResult<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_zero_exit_message() {
        let err = EngineError::NonZeroExit {
            program: "ffmpeg".to_string(),
            code: Some(1),
        };
        assert_eq!(err.to_string(), "ffmpeg exited with 1");

        let killed = EngineError::NonZeroExit {
            program: "ffmpeg".to_string(),
            code: None,
        };
        assert_eq!(killed.to_string(), "ffmpeg exited with a signal");
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(EngineError::Cancelled.kind(), "cancelled");
        let io = EngineError::from(std::io::Error::new(std::io::ErrorKind::Other, "boom"));
        assert_eq!(io.kind(), "io_failure");
    }
}
