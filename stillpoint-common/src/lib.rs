//! # Stillpoint Common Library
//!
//! Shared code for the stillpoint guided-session player:
//! - Session configuration types (SessionConfig, TrackRef, CompletionRecord)
//! - Event types (SessionEvent enum) and the EventBus
//! - TOML session file loading
//! - Time display formatting

pub mod config;
pub mod error;
pub mod events;
pub mod session;
pub mod time;

pub use error::{Error, Result};
pub use session::{AmbientTrack, CompletionRecord, SessionConfig, SessionKind, TrackRef};
