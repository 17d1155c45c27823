//! Session configuration and record types
//!
//! A session is one timed run of the guided playback engine. The caller
//! assembles a [`SessionConfig`] (the engine never generates instruction
//! text) and receives exactly one [`CompletionRecord`] when the session
//! reaches its terminal state.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of guided session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionKind {
    Breathing,
    BodyScan,
    LovingKindness,
    Scripture,
    Custom,
}

impl SessionKind {
    /// Stable string form used in persisted records
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionKind::Breathing => "breathing",
            SessionKind::BodyScan => "body_scan",
            SessionKind::LovingKindness => "loving_kindness",
            SessionKind::Scripture => "scripture",
            SessionKind::Custom => "custom",
        }
    }
}

/// Immutable configuration for one session
///
/// Supplied at session start and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Kind of session (recorded in the completion record)
    pub kind: SessionKind,

    /// Total session length in minutes (must be > 0)
    pub duration_minutes: u32,

    /// Ordered guidance lines narrated over the session (must be non-empty)
    pub instructions: Vec<String>,

    /// Ambient track selected when the caller asks for `TrackRef::Default`
    #[serde(default)]
    pub ambient_default_track_id: Option<String>,
}

impl SessionConfig {
    /// Total session length in seconds
    pub fn duration_seconds(&self) -> u64 {
        self.duration_minutes as u64 * 60
    }

    /// Validate the configuration before handing it to the engine
    pub fn validate(&self) -> Result<()> {
        if self.duration_minutes == 0 {
            return Err(Error::InvalidInput(
                "duration_minutes must be greater than zero".to_string(),
            ));
        }
        if self.instructions.is_empty() {
            return Err(Error::InvalidInput(
                "session requires at least one instruction".to_string(),
            ));
        }
        Ok(())
    }
}

/// Reference to an ambient audio selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TrackRef {
    /// The session's configured default track
    Default,
    /// A named track from the static catalog
    Catalog { id: String },
    /// A user-uploaded custom track
    Custom { url: String },
    /// No background sound
    Silent,
}

/// One entry in the ambient track catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmbientTrack {
    pub id: String,
    pub name: String,
    pub url: String,
}

/// Record produced exactly once when a session completes
///
/// Handed to the external completion store; persistence failure does not
/// roll the session back out of its terminal state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionRecord {
    /// Calendar date of completion
    pub date: chrono::NaiveDate,
    /// Configured session length in minutes
    pub duration_minutes: u32,
    /// Session kind, string form
    pub meditation_type: String,
    /// Caller-reported mood before the session
    pub mood_before: String,
    /// Caller-reported mood after the session
    pub mood_after: String,
    /// Engine instance that produced this record
    pub guided_session_id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(minutes: u32, instructions: usize) -> SessionConfig {
        SessionConfig {
            kind: SessionKind::Breathing,
            duration_minutes: minutes,
            instructions: (0..instructions).map(|i| format!("step {}", i)).collect(),
            ambient_default_track_id: None,
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(config(5, 9).validate().is_ok());
    }

    #[test]
    fn test_zero_duration_rejected() {
        assert!(config(0, 3).validate().is_err());
    }

    #[test]
    fn test_empty_instructions_rejected() {
        assert!(config(5, 0).validate().is_err());
    }

    #[test]
    fn test_duration_seconds() {
        assert_eq!(config(5, 9).duration_seconds(), 300);
    }

    #[test]
    fn test_track_ref_serialization() {
        let track = TrackRef::Catalog {
            id: "rain".to_string(),
        };
        let json = serde_json::to_string(&track).unwrap();
        assert!(json.contains("\"kind\":\"catalog\""));

        let back: TrackRef = serde_json::from_str(&json).unwrap();
        assert_eq!(back, track);
    }

    #[test]
    fn test_session_kind_str() {
        assert_eq!(SessionKind::BodyScan.as_str(), "body_scan");
    }
}
