//! Ambient audio layer
//!
//! A looping background track independent of narration. The catalog is a
//! fixed list of named tracks plus one user-supplied custom slot; the mixer
//! resolves a [`TrackRef`] to a playable source and drives an [`AmbientSink`].
//!
//! Track switches while playing are abrupt (no crossfade) and volume changes
//! apply immediately. Load/play errors never interrupt the session: the
//! engine continues without background sound.

use crate::error::{Error, Result};
use std::io::BufReader;
use std::sync::mpsc;
use std::thread;
use stillpoint_common::session::{AmbientTrack, TrackRef};
use tracing::{debug, warn};

/// Playable backend for one looping track at a time.
///
/// Load and play are fire-and-forget: backends report failures by logging
/// and going silent rather than propagating into the playback path.
pub trait AmbientSink: Send {
    /// Start looping `url` at `volume`, replacing anything already playing
    fn play_looping(&mut self, url: &str, volume: f32) -> Result<()>;
    /// Apply a volume change to the current source without interrupting it
    fn set_volume(&mut self, volume: f32);
    fn pause(&mut self);
    fn resume(&mut self);
    fn stop(&mut self);
}

/// Fixed catalog of ambient tracks plus one custom upload slot
#[derive(Debug, Clone)]
pub struct AmbientTrackCatalog {
    tracks: Vec<AmbientTrack>,
    default_track_id: Option<String>,
    custom_url: Option<String>,
}

impl AmbientTrackCatalog {
    pub fn new(tracks: Vec<AmbientTrack>, default_track_id: Option<String>) -> Self {
        Self {
            tracks,
            default_track_id,
            custom_url: None,
        }
    }

    pub fn tracks(&self) -> &[AmbientTrack] {
        &self.tracks
    }

    /// Remember the most recent custom upload
    pub fn register_custom(&mut self, url: String) {
        self.custom_url = Some(url);
    }

    pub fn custom_url(&self) -> Option<&str> {
        self.custom_url.as_deref()
    }

    /// Resolve a track reference to a playable URL, or None for silence
    pub fn resolve(&self, track: &TrackRef) -> Option<String> {
        match track {
            TrackRef::Default => self
                .default_track_id
                .as_ref()
                .and_then(|id| self.url_for(id)),
            TrackRef::Catalog { id } => self.url_for(id),
            TrackRef::Custom { url } => Some(url.clone()),
            TrackRef::Silent => None,
        }
    }

    fn url_for(&self, id: &str) -> Option<String> {
        self.tracks
            .iter()
            .find(|track| track.id == id)
            .map(|track| track.url.clone())
    }
}

/// Owns the current track selection and drives the sink
pub struct AmbientMixer {
    catalog: AmbientTrackCatalog,
    sink: Box<dyn AmbientSink>,
    selection: TrackRef,
    volume: f32,
    loaded: Option<String>,
}

impl AmbientMixer {
    pub fn new(catalog: AmbientTrackCatalog, sink: Box<dyn AmbientSink>, volume: f32) -> Self {
        Self {
            catalog,
            sink,
            selection: TrackRef::Default,
            volume: volume.clamp(0.0, 1.0),
            loaded: None,
        }
    }

    pub fn selection(&self) -> &TrackRef {
        &self.selection
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn catalog_mut(&mut self) -> &mut AmbientTrackCatalog {
        &mut self.catalog
    }

    /// Change the track selection.
    ///
    /// While playing, the previous source stops and the new one starts
    /// immediately; while paused or idle the selection is only recorded and
    /// takes effect on the next `play_if_active`.
    pub fn select(&mut self, track: TrackRef, playing: bool) {
        self.selection = track;
        if playing {
            self.restart();
        }
    }

    /// Start or resume the selected track; silence if it resolves to none
    pub fn play_if_active(&mut self) {
        match self.catalog.resolve(&self.selection) {
            Some(url) if self.loaded.as_deref() == Some(url.as_str()) => self.sink.resume(),
            Some(_) => self.restart(),
            None => {
                self.sink.stop();
                self.loaded = None;
            }
        }
    }

    pub fn pause(&mut self) {
        self.sink.pause();
    }

    pub fn stop(&mut self) {
        self.sink.stop();
        self.loaded = None;
    }

    /// Apply a volume change immediately to any current source
    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        self.sink.set_volume(self.volume);
    }

    fn restart(&mut self) {
        self.sink.stop();
        self.loaded = None;
        if let Some(url) = self.catalog.resolve(&self.selection) {
            if let Err(e) = self.sink.play_looping(&url, self.volume) {
                warn!("ambient track failed to load, continuing in silence: {}", e);
            } else {
                debug!("ambient track started: {}", url);
                self.loaded = Some(url);
            }
        }
    }
}

/// Sink that plays nothing; used for headless runs and tests
#[derive(Debug, Default)]
pub struct NullSink;

impl AmbientSink for NullSink {
    fn play_looping(&mut self, _url: &str, _volume: f32) -> Result<()> {
        Ok(())
    }
    fn set_volume(&mut self, _volume: f32) {}
    fn pause(&mut self) {}
    fn resume(&mut self) {}
    fn stop(&mut self) {}
}

enum SinkCommand {
    Play { path: String, volume: f32 },
    SetVolume(f32),
    Pause,
    Resume,
    Stop,
    Shutdown,
}

/// Sink backed by a dedicated audio thread running rodio.
///
/// The rodio output stream is not `Send`, so it lives on its own thread and
/// the handle side only sends commands over a channel.
pub struct RodioSink {
    tx: mpsc::Sender<SinkCommand>,
    thread: Option<thread::JoinHandle<()>>,
}

impl RodioSink {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        let thread = thread::spawn(move || Self::audio_thread(rx));
        Self {
            tx,
            thread: Some(thread),
        }
    }

    fn audio_thread(rx: mpsc::Receiver<SinkCommand>) {
        let stream = match rodio::OutputStream::try_default() {
            Ok(pair) => pair,
            Err(e) => {
                warn!("no audio output device, ambient sound disabled: {}", e);
                // Keep draining commands so the handle side never errors
                while let Ok(command) = rx.recv() {
                    if matches!(command, SinkCommand::Shutdown) {
                        break;
                    }
                }
                return;
            }
        };
        let (_stream, handle) = stream;
        let mut sink: Option<rodio::Sink> = None;

        while let Ok(command) = rx.recv() {
            match command {
                SinkCommand::Play { path, volume } => {
                    if let Some(old) = sink.take() {
                        old.stop();
                    }
                    match Self::open_looping(&handle, &path, volume) {
                        Ok(new_sink) => sink = Some(new_sink),
                        Err(e) => {
                            warn!("ambient track {} failed to load: {}", path, e);
                        }
                    }
                }
                SinkCommand::SetVolume(volume) => {
                    if let Some(sink) = &sink {
                        sink.set_volume(volume);
                    }
                }
                SinkCommand::Pause => {
                    if let Some(sink) = &sink {
                        sink.pause();
                    }
                }
                SinkCommand::Resume => {
                    if let Some(sink) = &sink {
                        sink.play();
                    }
                }
                SinkCommand::Stop => {
                    if let Some(old) = sink.take() {
                        old.stop();
                    }
                }
                SinkCommand::Shutdown => break,
            }
        }
    }

    fn open_looping(
        handle: &rodio::OutputStreamHandle,
        path: &str,
        volume: f32,
    ) -> Result<rodio::Sink> {
        use rodio::Source;

        let file = std::fs::File::open(path)
            .map_err(|e| Error::AmbientLoadFailure(format!("{}: {}", path, e)))?;
        let source = rodio::Decoder::new(BufReader::new(file))
            .map_err(|e| Error::AmbientLoadFailure(format!("{}: {}", path, e)))?;
        let sink = rodio::Sink::try_new(handle)
            .map_err(|e| Error::AmbientLoadFailure(e.to_string()))?;
        sink.set_volume(volume);
        sink.append(source.repeat_infinite());
        Ok(sink)
    }

    fn send(&self, command: SinkCommand) {
        // The audio thread only exits on Shutdown; a closed channel means we
        // are already tearing down
        let _ = self.tx.send(command);
    }
}

impl Default for RodioSink {
    fn default() -> Self {
        Self::new()
    }
}

impl AmbientSink for RodioSink {
    fn play_looping(&mut self, url: &str, volume: f32) -> Result<()> {
        self.send(SinkCommand::Play {
            path: url.to_string(),
            volume,
        });
        Ok(())
    }

    fn set_volume(&mut self, volume: f32) {
        self.send(SinkCommand::SetVolume(volume));
    }

    fn pause(&mut self) {
        self.send(SinkCommand::Pause);
    }

    fn resume(&mut self) {
        self.send(SinkCommand::Resume);
    }

    fn stop(&mut self) {
        self.send(SinkCommand::Stop);
    }
}

impl Drop for RodioSink {
    fn drop(&mut self) {
        let _ = self.tx.send(SinkCommand::Shutdown);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::RecordingSink;
    use super::*;

    fn catalog() -> AmbientTrackCatalog {
        AmbientTrackCatalog::new(
            vec![
                AmbientTrack {
                    id: "rain".to_string(),
                    name: "Gentle Rain".to_string(),
                    url: "sounds/rain.ogg".to_string(),
                },
                AmbientTrack {
                    id: "stream".to_string(),
                    name: "Forest Stream".to_string(),
                    url: "sounds/stream.ogg".to_string(),
                },
            ],
            Some("rain".to_string()),
        )
    }

    #[test]
    fn test_resolve_default_and_catalog() {
        let catalog = catalog();
        assert_eq!(
            catalog.resolve(&TrackRef::Default),
            Some("sounds/rain.ogg".to_string())
        );
        assert_eq!(
            catalog.resolve(&TrackRef::Catalog {
                id: "stream".to_string()
            }),
            Some("sounds/stream.ogg".to_string())
        );
        assert_eq!(
            catalog.resolve(&TrackRef::Catalog {
                id: "missing".to_string()
            }),
            None
        );
        assert_eq!(catalog.resolve(&TrackRef::Silent), None);
    }

    #[test]
    fn test_resolve_custom() {
        let catalog = catalog();
        assert_eq!(
            catalog.resolve(&TrackRef::Custom {
                url: "uploads/me.ogg".to_string()
            }),
            Some("uploads/me.ogg".to_string())
        );
    }

    #[test]
    fn test_switch_while_playing_is_abrupt() {
        let (sink, calls) = RecordingSink::new();
        let mut mixer = AmbientMixer::new(catalog(), Box::new(sink), 0.5);

        mixer.play_if_active();
        mixer.select(
            TrackRef::Catalog {
                id: "stream".to_string(),
            },
            true,
        );

        let calls = calls.lock().unwrap();
        assert_eq!(
            *calls,
            vec![
                "stop".to_string(),
                "play sounds/rain.ogg @ 0.50".to_string(),
                "stop".to_string(),
                "play sounds/stream.ogg @ 0.50".to_string(),
            ]
        );
    }

    #[test]
    fn test_select_while_paused_defers_playback() {
        let (sink, calls) = RecordingSink::new();
        let mut mixer = AmbientMixer::new(catalog(), Box::new(sink), 0.5);

        mixer.select(
            TrackRef::Catalog {
                id: "stream".to_string(),
            },
            false,
        );
        assert!(calls.lock().unwrap().is_empty());

        mixer.play_if_active();
        assert_eq!(
            calls.lock().unwrap().last().unwrap(),
            "play sounds/stream.ogg @ 0.50"
        );
    }

    #[test]
    fn test_resume_same_track_does_not_restart() {
        let (sink, calls) = RecordingSink::new();
        let mut mixer = AmbientMixer::new(catalog(), Box::new(sink), 0.5);

        mixer.play_if_active();
        mixer.pause();
        mixer.play_if_active();

        assert_eq!(calls.lock().unwrap().last().unwrap(), "resume");
    }

    #[test]
    fn test_silent_selection_stops_playback() {
        let (sink, calls) = RecordingSink::new();
        let mut mixer = AmbientMixer::new(catalog(), Box::new(sink), 0.5);

        mixer.play_if_active();
        mixer.select(TrackRef::Silent, true);
        mixer.play_if_active();

        assert!(!calls
            .lock()
            .unwrap()
            .iter()
            .skip(2)
            .any(|call| call.starts_with("play")));
    }

    #[test]
    fn test_volume_applies_immediately_and_clamps() {
        let (sink, calls) = RecordingSink::new();
        let mut mixer = AmbientMixer::new(catalog(), Box::new(sink), 0.5);

        mixer.set_volume(1.5);
        assert_eq!(mixer.volume(), 1.0);
        assert_eq!(calls.lock().unwrap().last().unwrap(), "volume 1.00");
    }
}
