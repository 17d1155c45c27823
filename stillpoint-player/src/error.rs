//! Error types for the playback engine
//!
//! None of these are fatal to the process: narration and ambient failures
//! degrade the session silently, upload and persistence failures are
//! surfaced to the caller as dismissible conditions.

use thiserror::Error;

/// Main error type for the playback engine
#[derive(Error, Debug)]
pub enum Error {
    /// Speech capability missing or erroring; playback continues silently
    #[error("Narration unavailable: {0}")]
    NarrationUnavailable(String),

    /// Ambient track failed to resolve or play; session continues without
    /// background sound
    #[error("Ambient track failed to load: {0}")]
    AmbientLoadFailure(String),

    /// Custom sound upload failed; does not affect an in-progress session
    #[error("Sound upload failed: {0}")]
    UploadFailure(String),

    /// Completion record failed to save; the session still completes
    #[error("Failed to persist completion record: {0}")]
    PersistenceFailure(String),

    /// Operation not valid in the current playback state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Shared library errors
    #[error(transparent)]
    Common(#[from] stillpoint_common::Error),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type using the playback engine Error
pub type Result<T> = std::result::Result<T, Error>;
