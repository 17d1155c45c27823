//! # Stillpoint Player Library
//!
//! Guided session playback engine.
//!
//! **Purpose:** Synchronize three independently-clocked resources (a 1 Hz
//! countdown clock, a narrated instruction track, and a looping ambient
//! audio track) behind a single playback facade supporting pause/resume,
//! seek, volume control, and a one-shot completion transition.
//!
//! **Architecture:** [`engine::PlaybackController`] is the sole serialization
//! point; the clock, sequencer, narration controller, and ambient mixer only
//! report inward, and observers consume state through the broadcast
//! [`stillpoint_common::events::EventBus`].

pub mod ambient;
pub mod clock;
pub mod engine;
pub mod error;
pub mod narration;
pub mod sequencer;
pub mod state;
pub mod store;

pub use engine::PlaybackController;
pub use error::{Error, Result};
pub use state::SessionSnapshot;
