//! Playback engine orchestration
//!
//! [`PlaybackController`] is the facade over the session clock, the
//! instruction sequencer, the narration controller, and the ambient mixer.
//! Every command locks the single session core, so no intermediate state
//! (clock running with narration cancelled mid-switch, and so on) is ever
//! observable outside the controller.
//!
//! State machine: `Idle → Playing ⇄ Paused → Completed`. The completion
//! transition is one-shot: natural clock completion and an explicit
//! `finish()` share the same idempotent path, producing exactly one
//! completion record and one `SessionCompleted` event.

use crate::ambient::{AmbientMixer, AmbientSink, AmbientTrackCatalog};
use crate::clock::SessionClock;
use crate::error::{Error, Result};
use crate::narration::{NarrationController, NarrationProvider};
use crate::sequencer::{InstructionSequencer, SkipDirection};
use crate::state::{PlaybackState, SessionSnapshot};
use crate::store::CompletionStore;
use std::sync::Arc;
use stillpoint_common::config::VolumeSettings;
use stillpoint_common::events::{EventBus, SessionEvent};
use stillpoint_common::session::{CompletionRecord, SessionConfig, TrackRef};
use tokio::sync::{broadcast, Mutex};
use tokio::time::{interval, Duration};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Everything the engine owns; guarded by one mutex in the controller
struct SessionCore {
    config: SessionConfig,
    session_id: Uuid,
    state: PlaybackState,
    clock: SessionClock,
    sequencer: InstructionSequencer,
    narration: NarrationController,
    mixer: AmbientMixer,
    store: Arc<dyn CompletionStore>,
    events: Arc<EventBus>,
    current_index: usize,
    voice_volume: f32,
    mood_before: String,
    mood_after: String,
    completed: bool,
    closed: bool,
}

impl SessionCore {
    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(Error::InvalidState("session closed".to_string()));
        }
        Ok(())
    }

    fn ensure_active(&self) -> Result<()> {
        self.ensure_open()?;
        if self.completed {
            return Err(Error::InvalidState("session already completed".to_string()));
        }
        Ok(())
    }

    fn set_state(&mut self, new_state: PlaybackState) {
        let old_state = self.state;
        self.state = new_state;
        self.events.emit_lossy(SessionEvent::PlaybackStateChanged {
            old_state,
            new_state,
            timestamp: chrono::Utc::now(),
        });
        info!("playback state changed: {:?} -> {:?}", old_state, new_state);
    }

    fn emit_progress(&self) {
        self.events.emit_lossy(SessionEvent::ProgressUpdate {
            session_id: self.session_id,
            elapsed_seconds: self.clock.elapsed(),
            duration_seconds: self.clock.duration(),
            timestamp: chrono::Utc::now(),
        });
    }

    fn emit_instruction_changed(&self) {
        self.events.emit_lossy(SessionEvent::InstructionChanged {
            index: self.current_index,
            total: self.config.instructions.len(),
            timestamp: chrono::Utc::now(),
        });
    }

    /// Narrate the current instruction from its start, cancelling any
    /// in-flight narration first
    async fn narrate_current(&mut self) {
        let text = self.config.instructions[self.current_index].clone();
        self.narration
            .speak(self.current_index, text, self.voice_volume)
            .await;
    }

    /// One-shot completion path shared by the clock signal and `finish()`.
    ///
    /// The session transitions to `Completed` even when the store errors;
    /// the persistence failure is returned to the caller as a recoverable
    /// condition.
    async fn complete(&mut self) -> Result<()> {
        if self.completed {
            debug!("completion requested on already-completed session");
            return Ok(());
        }
        self.completed = true;

        self.narration.cancel_current().await;
        self.mixer.stop();
        self.set_state(PlaybackState::Completed);

        let record = CompletionRecord {
            date: chrono::Utc::now().date_naive(),
            duration_minutes: self.config.duration_minutes,
            meditation_type: self.config.kind.as_str().to_string(),
            mood_before: self.mood_before.clone(),
            mood_after: self.mood_after.clone(),
            guided_session_id: self.session_id,
        };

        let persisted = self.store.create(&record);
        self.events.emit_lossy(SessionEvent::SessionCompleted {
            record,
            timestamp: chrono::Utc::now(),
        });
        info!("session {} completed", self.session_id);

        persisted
    }
}

/// Guided session playback controller
///
/// Cheap to clone; clones share one session core.
pub struct PlaybackController {
    core: Arc<Mutex<SessionCore>>,
    events: Arc<EventBus>,
    session_id: Uuid,
}

impl PlaybackController {
    /// Create a controller for one session.
    ///
    /// Validates the config; the session starts in `Idle` with elapsed 0 and
    /// instruction index 0.
    pub fn new(
        config: SessionConfig,
        catalog: AmbientTrackCatalog,
        narrator: Arc<dyn NarrationProvider>,
        sink: Box<dyn AmbientSink>,
        store: Arc<dyn CompletionStore>,
        events: Arc<EventBus>,
        volumes: VolumeSettings,
    ) -> Result<Self> {
        config.validate().map_err(Error::Common)?;

        let session_id = Uuid::new_v4();
        let duration_seconds = config.duration_seconds();
        let instruction_count = config.instructions.len();
        info!(
            "creating session {} ({} minutes, {} instructions)",
            session_id, config.duration_minutes, instruction_count
        );

        let core = SessionCore {
            session_id,
            state: PlaybackState::Idle,
            clock: SessionClock::new(duration_seconds),
            sequencer: InstructionSequencer::new(duration_seconds, instruction_count),
            narration: NarrationController::new(narrator, Arc::clone(&events)),
            mixer: AmbientMixer::new(catalog, sink, volumes.ambient),
            store,
            events: Arc::clone(&events),
            current_index: 0,
            voice_volume: volumes.voice.clamp(0.0, 1.0),
            mood_before: String::new(),
            mood_after: String::new(),
            completed: false,
            closed: false,
            config,
        };

        Ok(Self {
            core: Arc::new(Mutex::new(core)),
            events,
            session_id,
        })
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Subscribe to the session event stream
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Spawn the 1 Hz drive task.
    ///
    /// The task calls [`tick`](Self::tick) once per second and exits when the
    /// session completes or closes. Drift from the periodic timer is
    /// accepted behavior.
    pub fn start(&self) -> tokio::task::JoinHandle<()> {
        let controller = self.clone_handles();
        tokio::spawn(async move {
            let mut ticker = interval(Duration::from_secs(1));
            // The first interval tick fires immediately; skip it so the
            // session does not advance at t=0
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if controller.driver_done().await {
                    debug!("drive task stopping");
                    break;
                }
                controller.tick().await;
            }
        })
    }

    /// Advance the session clock by one second.
    ///
    /// No-op unless the session is in `Playing`. Called by the drive task;
    /// exposed so callers with their own scheduling (and tests) can drive
    /// the session deterministically.
    pub async fn tick(&self) {
        let mut core = self.core.lock().await;
        if core.closed || core.state != PlaybackState::Playing {
            return;
        }

        let tick = core.clock.tick();
        core.emit_progress();

        let index = core.sequencer.index_for_elapsed(tick.elapsed);
        if index != core.current_index {
            core.current_index = index;
            core.emit_instruction_changed();
            core.narrate_current().await;
        }

        if tick.completed {
            if let Err(e) = core.complete().await {
                warn!("completion record not persisted: {}", e);
            }
        }
    }

    /// Start or resume playback.
    ///
    /// Starts the ambient track and (re)narrates the current instruction
    /// from its beginning; narration is never resumed mid-utterance.
    pub async fn play(&self) -> Result<()> {
        let mut core = self.core.lock().await;
        core.ensure_open()?;
        match core.state {
            PlaybackState::Idle | PlaybackState::Paused => {
                core.set_state(PlaybackState::Playing);
                core.mixer.play_if_active();
                core.narrate_current().await;
                Ok(())
            }
            PlaybackState::Playing => Ok(()),
            PlaybackState::Completed => {
                Err(Error::InvalidState("session already completed".to_string()))
            }
        }
    }

    /// Pause playback: the clock stops ticking, in-flight narration is
    /// cancelled, and ambient audio pauses. All three together, never
    /// partially.
    pub async fn pause(&self) -> Result<()> {
        let mut core = self.core.lock().await;
        core.ensure_open()?;
        if core.state != PlaybackState::Playing {
            debug!("pause ignored in state {:?}", core.state);
            return Ok(());
        }
        core.set_state(PlaybackState::Paused);
        core.narration.cancel_current().await;
        core.mixer.pause();
        Ok(())
    }

    /// Skip the clock forward 15 seconds (clamped to the session duration)
    pub async fn skip_forward(&self) -> Result<()> {
        self.skip(SkipDirection::Forward).await
    }

    /// Skip the clock back 15 seconds (clamped to zero)
    pub async fn skip_back(&self) -> Result<()> {
        self.skip(SkipDirection::Back).await
    }

    /// Step to the next instruction (clamped to the last)
    pub async fn next_instruction(&self) -> Result<()> {
        self.step(SkipDirection::Forward).await
    }

    /// Step to the previous instruction (clamped to the first)
    pub async fn previous_instruction(&self) -> Result<()> {
        self.step(SkipDirection::Back).await
    }

    /// Change the ambient track selection; abrupt switch while playing
    pub async fn select_track(&self, track: TrackRef) -> Result<()> {
        let mut core = self.core.lock().await;
        core.ensure_active()?;
        let playing = core.state == PlaybackState::Playing;
        core.mixer.select(track.clone(), playing);
        core.events.emit_lossy(SessionEvent::AmbientTrackChanged {
            track,
            timestamp: chrono::Utc::now(),
        });
        Ok(())
    }

    /// Remember an uploaded custom sound so `TrackRef::Custom` can play it
    pub async fn register_custom_track(&self, url: String) -> Result<()> {
        let mut core = self.core.lock().await;
        core.ensure_active()?;
        core.mixer.catalog_mut().register_custom(url);
        Ok(())
    }

    /// Set the narration volume; applies from the next utterance
    pub async fn set_voice_volume(&self, volume: f32) -> Result<()> {
        let mut core = self.core.lock().await;
        core.ensure_active()?;
        core.voice_volume = volume.clamp(0.0, 1.0);
        core.events.emit_lossy(SessionEvent::VoiceVolumeChanged {
            volume: core.voice_volume,
            timestamp: chrono::Utc::now(),
        });
        Ok(())
    }

    /// Set the ambient volume; applies immediately to a playing track
    pub async fn set_ambient_volume(&self, volume: f32) -> Result<()> {
        let mut core = self.core.lock().await;
        core.ensure_active()?;
        core.mixer.set_volume(volume);
        core.events.emit_lossy(SessionEvent::AmbientVolumeChanged {
            volume: core.mixer.volume(),
            timestamp: chrono::Utc::now(),
        });
        Ok(())
    }

    /// Record the caller-reported moods carried into the completion record
    pub async fn set_moods(&self, mood_before: &str, mood_after: &str) -> Result<()> {
        let mut core = self.core.lock().await;
        core.ensure_active()?;
        core.mood_before = mood_before.to_string();
        core.mood_after = mood_after.to_string();
        Ok(())
    }

    /// End the session now.
    ///
    /// Idempotent with natural clock completion: however often completion is
    /// requested, exactly one record is produced and one `SessionCompleted`
    /// event emitted. A `PersistenceFailure` is returned to the caller but
    /// the session still reaches `Completed`.
    pub async fn finish(&self) -> Result<()> {
        let mut core = self.core.lock().await;
        core.ensure_open()?;
        core.complete().await
    }

    /// Tear down the session regardless of completion status.
    ///
    /// Cancels narration, stops ambient audio, and stops the drive task.
    /// Safe to call more than once.
    pub async fn close(&self) {
        let mut core = self.core.lock().await;
        if core.closed {
            return;
        }
        core.closed = true;
        core.narration.cancel_current().await;
        core.mixer.stop();
        core.events.emit_lossy(SessionEvent::SessionClosed {
            session_id: core.session_id,
            timestamp: chrono::Utc::now(),
        });
        info!("session {} closed", core.session_id);
    }

    /// Point-in-time copy of the playback state
    pub async fn snapshot(&self) -> SessionSnapshot {
        let core = self.core.lock().await;
        SessionSnapshot {
            session_id: core.session_id,
            state: core.state,
            elapsed_seconds: core.clock.elapsed(),
            duration_seconds: core.clock.duration(),
            current_instruction_index: core.current_index,
            instruction_count: core.config.instructions.len(),
            narration_busy: core.narration.is_busy(),
            ambient_selection: core.mixer.selection().clone(),
            voice_volume: core.voice_volume,
            background_volume: core.mixer.volume(),
            completed: core.completed,
        }
    }

    async fn skip(&self, direction: SkipDirection) -> Result<()> {
        let mut core = self.core.lock().await;
        core.ensure_active()?;
        let target = core.sequencer.skip_seconds(core.clock.elapsed(), direction);
        core.clock.seek_to(target);
        // The instruction index is deliberately left alone here: the two
        // skip mechanisms are independent, and clock-driven advancement
        // reconsiders the index on the next tick
        core.emit_progress();
        Ok(())
    }

    async fn step(&self, direction: SkipDirection) -> Result<()> {
        let mut core = self.core.lock().await;
        core.ensure_active()?;
        let index = core.sequencer.step_index(core.current_index, direction);
        if index != core.current_index {
            core.current_index = index;
            core.emit_instruction_changed();
            if core.state == PlaybackState::Playing {
                core.narrate_current().await;
            }
        }
        Ok(())
    }

    async fn driver_done(&self) -> bool {
        let core = self.core.lock().await;
        core.closed || core.completed
    }

    /// Clone handles for spawned tasks
    fn clone_handles(&self) -> Self {
        Self {
            core: Arc::clone(&self.core),
            events: Arc::clone(&self.events),
            session_id: self.session_id,
        }
    }
}
