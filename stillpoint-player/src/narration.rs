//! Narration control
//!
//! The speech capability is injected behind [`NarrationProvider`] so the
//! engine can run against a fake in tests or a pre-recorded-audio backend
//! without touching orchestration logic.
//!
//! [`NarrationController`] serialises utterances: at most one narration is
//! ever in flight, starting a new one cancels the previous one first, and a
//! cancelled narration can never later report completion and retroactively
//! mutate state (generation check). Provider failure is non-fatal: it is
//! logged and playback continues on the visual/timer track.

use crate::error::Error;
use futures::future::BoxFuture;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use stillpoint_common::events::{EventBus, SessionEvent};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Pluggable speech capability.
///
/// The returned future resolves when the utterance ends naturally and errors
/// if the capability is unavailable. Cancellation is dropping the future;
/// implementations must not hold state that outlives it.
pub trait NarrationProvider: Send + Sync + 'static {
    fn speak(&self, text: &str, volume: f32) -> BoxFuture<'static, Result<(), Error>>;
}

/// Serialises narration requests from the playback engine
pub struct NarrationController {
    provider: Arc<dyn NarrationProvider>,
    events: Arc<EventBus>,
    busy: Arc<AtomicBool>,
    generation: Arc<AtomicU64>,
    current: Option<JoinHandle<()>>,
}

impl NarrationController {
    pub fn new(provider: Arc<dyn NarrationProvider>, events: Arc<EventBus>) -> Self {
        Self {
            provider,
            events,
            busy: Arc::new(AtomicBool::new(false)),
            generation: Arc::new(AtomicU64::new(0)),
            current: None,
        }
    }

    /// True strictly between narration start and its natural end or
    /// cancellation
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Cancel any in-flight narration.
    ///
    /// Awaits the aborted task so the old utterance is fully torn down
    /// before the caller proceeds; combined with the generation bump this
    /// guarantees a cancelled narration never reports completion.
    pub async fn cancel_current(&mut self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(handle) = self.current.take() {
            handle.abort();
            let _ = handle.await;
            debug!("in-flight narration cancelled");
        }
        self.busy.store(false, Ordering::SeqCst);
    }

    /// Narrate an instruction from its start, cancelling any in-flight
    /// narration first.
    pub async fn speak(&mut self, index: usize, text: String, volume: f32) {
        self.cancel_current().await;

        let generation = self.generation.load(Ordering::SeqCst);
        self.busy.store(true, Ordering::SeqCst);
        self.events.emit_lossy(SessionEvent::NarrationStarted {
            index,
            timestamp: chrono::Utc::now(),
        });

        let utterance = self.provider.speak(&text, volume);
        let busy = Arc::clone(&self.busy);
        let generations = Arc::clone(&self.generation);
        let events = Arc::clone(&self.events);

        self.current = Some(tokio::spawn(async move {
            match utterance.await {
                Ok(()) => {
                    // A stale generation means we lost a race with
                    // cancellation; the newer narration owns the flag.
                    if generations.load(Ordering::SeqCst) == generation {
                        busy.store(false, Ordering::SeqCst);
                        events.emit_lossy(SessionEvent::NarrationEnded {
                            index,
                            timestamp: chrono::Utc::now(),
                        });
                    }
                }
                Err(e) => {
                    warn!("narration failed, continuing without voice: {}", e);
                    if generations.load(Ordering::SeqCst) == generation {
                        busy.store(false, Ordering::SeqCst);
                    }
                }
            }
        }));
    }
}

/// Narrator backend that logs each line and paces itself by word count.
///
/// Used by the CLI runner; stands in for a real text-to-speech capability.
pub struct TracingNarrator {
    /// Per-word pacing in milliseconds
    pub millis_per_word: u64,
}

impl Default for TracingNarrator {
    fn default() -> Self {
        Self {
            millis_per_word: 350,
        }
    }
}

impl NarrationProvider for TracingNarrator {
    fn speak(&self, text: &str, volume: f32) -> BoxFuture<'static, Result<(), Error>> {
        let line = text.to_string();
        let words = line.split_whitespace().count().max(1) as u64;
        let pace = tokio::time::Duration::from_millis(words * self.millis_per_word);
        Box::pin(async move {
            info!(volume, "\u{1f5e3} {}", line);
            tokio::time::sleep(pace).await;
            Ok(())
        })
    }
}
