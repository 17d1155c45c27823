//! Playback state snapshot
//!
//! State is owned exclusively by the playback controller; observers receive
//! cloned [`SessionSnapshot`]s (or bus events), never a writable reference.

use serde::{Deserialize, Serialize};
use stillpoint_common::session::TrackRef;
use uuid::Uuid;

// Re-export the state machine enum shared with callers
pub use stillpoint_common::events::PlaybackState;

/// Point-in-time view of a running session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Engine instance id (stamped into the completion record)
    pub session_id: Uuid,

    /// Current state machine position
    pub state: PlaybackState,

    /// Seconds elapsed, net of paused intervals; never exceeds
    /// `duration_seconds`
    pub elapsed_seconds: u64,

    /// Configured session length in seconds
    pub duration_seconds: u64,

    /// Always a valid index into the instruction list
    pub current_instruction_index: usize,

    /// Number of instructions in the session
    pub instruction_count: usize,

    /// True strictly while a narration is in flight
    pub narration_busy: bool,

    /// Current ambient selection
    pub ambient_selection: TrackRef,

    /// Narration volume (0.0-1.0)
    pub voice_volume: f32,

    /// Ambient volume (0.0-1.0)
    pub background_volume: f32,

    /// True once the session has reached its terminal state
    pub completed: bool,
}

impl SessionSnapshot {
    /// Whether the session clock is currently advancing
    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }
}
