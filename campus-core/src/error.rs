//! Error types for the campus portal

use thiserror::Error;

/// Result type alias for portal operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for portal operations
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Input failed validation (unknown role, empty title, bad file, ...)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A workflow transition was refused by the rules
    #[error("Transition refused: {reason}")]
    TransitionRefused {
        /// Why the transition is not allowed
        reason: String,
        /// What the caller can do instead
        suggestion: String,
    },

    /// A history log could not be replayed
    #[error("History replay failed: {0}")]
    Replay(String),

    /// Object store failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// Requested item does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Database error
    #[cfg(feature = "database")]
    #[error("Database error: {0}")]
    Database(#[from] campus_db::Error),
}
