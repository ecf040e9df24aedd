// Error handling for the session layer

use thiserror::Error;

/// Session error types
#[derive(Error, Debug, Clone)]
pub enum SessionError {
    /// A playback source could not be resolved into a queue entry
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Failed to construct a media engine handle
    #[error("Initialization error: {0}")]
    Initialization(String),

    /// Failure reported by the media engine after prepare
    #[error("Engine error: {0}")]
    Engine(String),
}

/// Result type alias for session operations
pub type Result<T> = std::result::Result<T, SessionError>;
