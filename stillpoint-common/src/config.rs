//! Session file loading
//!
//! Sessions are described in TOML: the session config itself, the ambient
//! track catalog, and the starting volume levels. The file is assembled by
//! the caller (or shipped with the app); the engine only consumes the
//! resulting [`SessionConfig`] and catalog.

use crate::session::{AmbientTrack, SessionConfig};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

fn default_volume() -> f32 {
    0.75
}

/// Volume defaults carried in the session file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolumeSettings {
    /// Narration volume (0.0-1.0)
    #[serde(default = "default_volume")]
    pub voice: f32,
    /// Ambient track volume (0.0-1.0)
    #[serde(default = "default_volume")]
    pub ambient: f32,
}

impl Default for VolumeSettings {
    fn default() -> Self {
        Self {
            voice: default_volume(),
            ambient: default_volume(),
        }
    }
}

/// Top-level structure of a session TOML file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionFile {
    /// The session definition
    pub session: SessionConfig,

    /// Ambient track catalog (may be empty)
    #[serde(default, rename = "track")]
    pub tracks: Vec<AmbientTrack>,

    /// Starting volume levels
    #[serde(default)]
    pub volumes: VolumeSettings,
}

/// Load and validate a session file from disk
pub fn load_session_file(path: &Path) -> Result<SessionFile> {
    let content = std::fs::read_to_string(path)?;
    let file: SessionFile = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
    file.session.validate()?;

    for track in &file.tracks {
        if track.id.is_empty() || track.url.is_empty() {
            return Err(Error::Config(format!(
                "catalog track {:?} missing id or url",
                track.name
            )));
        }
    }

    if !(0.0..=1.0).contains(&file.volumes.voice) || !(0.0..=1.0).contains(&file.volumes.ambient) {
        return Err(Error::Config(
            "volume levels must be within 0.0-1.0".to_string(),
        ));
    }

    debug!(
        "session file loaded: {} ({} tracks)",
        path.display(),
        file.tracks.len()
    );
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const EXAMPLE: &str = r#"
[session]
kind = "breathing"
duration_minutes = 5
instructions = [
    "Settle into a comfortable position",
    "Close your eyes and breathe naturally",
    "Notice the breath at your nostrils",
]
ambient_default_track_id = "rain"

[[track]]
id = "rain"
name = "Gentle Rain"
url = "sounds/rain.ogg"

[[track]]
id = "stream"
name = "Forest Stream"
url = "sounds/stream.ogg"

[volumes]
voice = 0.8
ambient = 0.5
"#;

    fn write_temp(content: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    #[test]
    fn test_load_example_file() {
        let f = write_temp(EXAMPLE);
        let file = load_session_file(f.path()).unwrap();
        assert_eq!(file.session.duration_minutes, 5);
        assert_eq!(file.session.instructions.len(), 3);
        assert_eq!(file.tracks.len(), 2);
        assert_eq!(file.tracks[0].id, "rain");
        assert!((file.volumes.ambient - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_defaults_applied() {
        let minimal = r#"
[session]
kind = "custom"
duration_minutes = 1
instructions = ["Breathe"]
"#;
        let f = write_temp(minimal);
        let file = load_session_file(f.path()).unwrap();
        assert!(file.tracks.is_empty());
        assert!((file.volumes.voice - 0.75).abs() < f32::EPSILON);
        assert!(file.session.ambient_default_track_id.is_none());
    }

    #[test]
    fn test_invalid_session_rejected() {
        let bad = r#"
[session]
kind = "custom"
duration_minutes = 0
instructions = ["Breathe"]
"#;
        let f = write_temp(bad);
        assert!(load_session_file(f.path()).is_err());
    }

    #[test]
    fn test_out_of_range_volume_rejected() {
        let bad = r#"
[session]
kind = "custom"
duration_minutes = 1
instructions = ["Breathe"]

[volumes]
voice = 1.5
"#;
        let f = write_temp(bad);
        assert!(load_session_file(f.path()).is_err());
    }
}
