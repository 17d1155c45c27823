//! Stillpoint player - main entry point
//!
//! Runs one guided session from a TOML session file: 1 Hz countdown,
//! narrated instructions (logged narrator backend), and a looping ambient
//! track, with a completion record appended to a JSON-lines file.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stillpoint_common::config::load_session_file;
use stillpoint_common::events::{EventBus, SessionEvent};
use stillpoint_common::session::TrackRef;
use stillpoint_common::time::format_remaining;
use stillpoint_player::ambient::{AmbientSink, AmbientTrackCatalog, NullSink, RodioSink};
use stillpoint_player::narration::TracingNarrator;
use stillpoint_player::store::{JsonFileStore, LocalFileUploader, SoundUploader};
use stillpoint_player::PlaybackController;

/// Command-line arguments for the stillpoint player
#[derive(Parser, Debug)]
#[command(name = "stillpoint-player")]
#[command(about = "Guided session playback engine")]
#[command(version)]
struct Args {
    /// Session definition file (TOML)
    #[arg(short, long, env = "STILLPOINT_SESSION")]
    session: PathBuf,

    /// File completion records are appended to
    #[arg(
        long,
        default_value = "completions.jsonl",
        env = "STILLPOINT_COMPLETIONS"
    )]
    completions: PathBuf,

    /// Custom ambient sound file to upload and play instead of the catalog
    #[arg(long)]
    upload_sound: Option<PathBuf>,

    /// Directory uploaded custom sounds are copied into
    #[arg(long, default_value = "sounds", env = "STILLPOINT_SOUNDS_DIR")]
    sounds_dir: PathBuf,

    /// Run without an audio output device (ambient sound disabled)
    #[arg(long)]
    silent: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stillpoint_player=info,stillpoint_common=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let file = load_session_file(&args.session)
        .with_context(|| format!("failed to load session file {}", args.session.display()))?;
    info!(
        "loaded session: {} instructions over {} minutes",
        file.session.instructions.len(),
        file.session.duration_minutes
    );

    let catalog = AmbientTrackCatalog::new(
        file.tracks.clone(),
        file.session.ambient_default_track_id.clone(),
    );
    let sink: Box<dyn AmbientSink> = if args.silent {
        Box::new(NullSink)
    } else {
        Box::new(RodioSink::new())
    };
    let events = Arc::new(EventBus::new(256));

    let engine = PlaybackController::new(
        file.session,
        catalog,
        Arc::new(TracingNarrator::default()),
        sink,
        Arc::new(JsonFileStore::new(&args.completions)),
        Arc::clone(&events),
        file.volumes,
    )
    .context("failed to initialize playback engine")?;
    info!("session {} ready", engine.session_id());

    if let Some(source) = &args.upload_sound {
        let bytes = std::fs::read(source)
            .with_context(|| format!("failed to read {}", source.display()))?;
        let name = source
            .file_name()
            .and_then(|n| n.to_str())
            .with_context(|| format!("no file name in {}", source.display()))?;
        let uploader = LocalFileUploader::new(&args.sounds_dir);
        let url = uploader.upload(name, &bytes)?;
        engine.register_custom_track(url.clone()).await?;
        engine.select_track(TrackRef::Custom { url }).await?;
        info!("playing custom ambient sound: {}", source.display());
    }

    // Render the event stream; the engine never pushes into UI state
    let mut rx = engine.subscribe();
    let printer = tokio::spawn(async move {
        while let Ok(event) = rx.recv().await {
            match event {
                SessionEvent::ProgressUpdate {
                    elapsed_seconds,
                    duration_seconds,
                    ..
                } => {
                    info!(
                        "remaining {}",
                        format_remaining(elapsed_seconds, duration_seconds)
                    );
                }
                SessionEvent::InstructionChanged { index, total, .. } => {
                    info!("instruction {}/{}", index + 1, total);
                }
                SessionEvent::SessionCompleted { record, .. } => {
                    info!(
                        "session complete: {} minutes of {}",
                        record.duration_minutes, record.meditation_type
                    );
                }
                _ => {}
            }
        }
    });

    let driver = engine.start();
    engine.play().await?;

    tokio::select! {
        _ = driver => {
            info!("session finished");
        },
        _ = shutdown_signal() => {
            info!("interrupted, closing session");
        },
    }

    engine.close().await;
    printer.abort();
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
