//! Event types for the stillpoint event system
//!
//! Provides the shared [`SessionEvent`] definitions and the [`EventBus`].
//!
//! The engine never mutates caller state directly: it folds sub-component
//! callbacks into its own state and broadcasts events here. The UI (or any
//! other observer) subscribes and renders from the events.

use crate::session::{CompletionRecord, TrackRef};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Playback state of the session engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackState {
    /// Initial state before the first play command
    Idle,
    /// Clock running, narration and ambient audio active
    Playing,
    /// Clock stopped, narration cancelled, ambient audio paused
    Paused,
    /// Terminal state; entered at most once per session
    Completed,
}

/// Session event types
///
/// Events are broadcast via [`EventBus`] and can be serialized for
/// transmission to a remote UI.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SessionEvent {
    /// Playback state changed (Idle/Playing/Paused/Completed)
    PlaybackStateChanged {
        old_state: PlaybackState,
        new_state: PlaybackState,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Elapsed-time update, emitted at most once per second while playing
    /// and once after any seek
    ProgressUpdate {
        session_id: Uuid,
        elapsed_seconds: u64,
        duration_seconds: u64,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Current instruction index changed (clock-driven or explicit step)
    InstructionChanged {
        index: usize,
        total: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Narration of an instruction began
    NarrationStarted {
        index: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Narration ended naturally (not emitted for cancellations)
    NarrationEnded {
        index: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Voice (narration) volume changed
    VoiceVolumeChanged {
        volume: f32,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Ambient (background) volume changed
    AmbientVolumeChanged {
        volume: f32,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Ambient track selection changed
    AmbientTrackChanged {
        track: TrackRef,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Session reached its terminal state; emitted exactly once
    SessionCompleted {
        record: CompletionRecord,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Session view closed and resources released
    SessionClosed {
        session_id: Uuid,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

/// Broadcast bus for session events
///
/// One-to-many: the engine emits, any number of observers subscribe.
/// Slow subscribers lag and drop old events rather than blocking the engine.
pub struct EventBus {
    tx: broadcast::Sender<SessionEvent>,
    capacity: usize,
}

impl EventBus {
    /// Create a new bus buffering up to `capacity` events per subscriber
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.tx.subscribe()
    }

    /// Emit an event, ignoring the no-subscribers case
    pub fn emit_lossy(&self, event: SessionEvent) {
        let _ = self.tx.send(event);
    }

    /// Configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eventbus_new() {
        let bus = EventBus::new(100);
        assert_eq!(bus.capacity(), 100);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_eventbus_emit_no_subscribers() {
        let bus = EventBus::new(100);
        // Must not panic without subscribers
        bus.emit_lossy(SessionEvent::PlaybackStateChanged {
            old_state: PlaybackState::Idle,
            new_state: PlaybackState::Playing,
            timestamp: chrono::Utc::now(),
        });
    }

    #[tokio::test]
    async fn test_eventbus_emit_with_subscriber() {
        let bus = EventBus::new(100);
        let mut rx = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);

        bus.emit_lossy(SessionEvent::InstructionChanged {
            index: 2,
            total: 9,
            timestamp: chrono::Utc::now(),
        });

        match rx.recv().await.unwrap() {
            SessionEvent::InstructionChanged { index, total, .. } => {
                assert_eq!(index, 2);
                assert_eq!(total, 9);
            }
            other => panic!("wrong event type received: {:?}", other),
        }
    }

    #[test]
    fn test_event_serialization_tag() {
        let event = SessionEvent::ProgressUpdate {
            session_id: Uuid::new_v4(),
            elapsed_seconds: 40,
            duration_seconds: 300,
            timestamp: chrono::Utc::now(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"ProgressUpdate\""));
    }
}
