//! External persistence collaborators
//!
//! The engine hands exactly one [`CompletionRecord`] to a [`CompletionStore`]
//! when a session completes; store failure is surfaced to the caller but the
//! session still reaches its terminal state. [`SoundUploader`] accepts a
//! user-supplied audio file for the custom ambient slot; upload failure never
//! touches an in-progress session.

use crate::error::{Error, Result};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use stillpoint_common::session::CompletionRecord;
use tracing::{debug, info};

/// External store for completed-session records
pub trait CompletionStore: Send + Sync {
    fn create(&self, record: &CompletionRecord) -> Result<()>;
}

/// Append-only JSON-lines file store
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CompletionStore for JsonFileStore {
    fn create(&self, record: &CompletionRecord) -> Result<()> {
        let line = serde_json::to_string(record)
            .map_err(|e| Error::PersistenceFailure(e.to_string()))?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| Error::PersistenceFailure(format!("{}: {}", self.path.display(), e)))?;
        writeln!(file, "{}", line)
            .map_err(|e| Error::PersistenceFailure(format!("{}: {}", self.path.display(), e)))?;

        info!(
            "completion record saved: {} minutes of {} on {}",
            record.duration_minutes, record.meditation_type, record.date
        );
        Ok(())
    }
}

/// Upload collaborator for custom ambient sounds
pub trait SoundUploader: Send + Sync {
    /// Store the uploaded bytes and return a URL the ambient mixer can play
    fn upload(&self, file_name: &str, bytes: &[u8]) -> Result<String>;
}

/// Uploader that copies the bytes into a local sounds directory
pub struct LocalFileUploader {
    dir: PathBuf,
}

impl LocalFileUploader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl SoundUploader for LocalFileUploader {
    fn upload(&self, file_name: &str, bytes: &[u8]) -> Result<String> {
        // Strip any path components from the caller-supplied name
        let name = Path::new(file_name)
            .file_name()
            .ok_or_else(|| Error::UploadFailure(format!("invalid file name: {}", file_name)))?;

        std::fs::create_dir_all(&self.dir)
            .map_err(|e| Error::UploadFailure(format!("{}: {}", self.dir.display(), e)))?;

        let target = self.dir.join(name);
        std::fs::write(&target, bytes)
            .map_err(|e| Error::UploadFailure(format!("{}: {}", target.display(), e)))?;

        debug!("custom sound uploaded: {}", target.display());
        Ok(target.to_string_lossy().to_string())
    }
}
