//! Recording session owning the HTTP cassette recorder.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::Utc;

use super::recorder::CassetteRecorder;

/// File name of the HTTP cassette inside a session directory.
pub const HTTP_CASSETTE_FILE: &str = "http.cassette.yaml";

/// Manages the recorder for one recording session.
///
/// Cassettes are stored in a timestamped directory below the base directory.
pub struct RecordingSession {
    /// Recorder for HTTP interactions.
    pub http: Arc<Mutex<CassetteRecorder>>,
    output_dir: PathBuf,
}

impl RecordingSession {
    /// Create a new recording session at `<base>/<timestamp>/`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The cassette directory already exists
    /// - The directory cannot be created
    pub fn new(base: &Path) -> Result<Self, String> {
        let timestamp = Utc::now().format("%Y-%m-%dT%H-%M-%S").to_string();
        let output_dir = base.join(&timestamp);

        if output_dir.exists() {
            return Err(format!("Cassette directory already exists: {}", output_dir.display()));
        }

        std::fs::create_dir_all(&output_dir)
            .map_err(|e| format!("Failed to create cassette directory: {e}"))?;

        let recorder =
            CassetteRecorder::new(output_dir.join(HTTP_CASSETTE_FILE), format!("{timestamp}-http"));

        Ok(Self { http: Arc::new(Mutex::new(recorder)), output_dir })
    }

    /// Directory the cassette is written into.
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Finish the recorder and write the cassette file to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if an adapter still holds the recorder or the file
    /// cannot be written.
    pub fn finish(self) -> Result<PathBuf, String> {
        let recorder = Arc::try_unwrap(self.http)
            .map_err(|_| "Recording adapter for http still has references".to_string())?
            .into_inner()
            .map_err(|e| format!("Recorder lock for http poisoned: {e}"))?;
        recorder.finish().map_err(|e| format!("Failed to write http cassette: {e}"))?;
        Ok(self.output_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_creates_output_directory_and_finishes() {
        let base = std::env::temp_dir().join("explainer_session_test");
        let session = RecordingSession::new(&base).expect("session should start");
        let dir = session.output_dir().to_path_buf();
        assert!(dir.exists(), "Output directory should exist after new()");

        let finished = session.finish().expect("finish() should succeed");
        assert_eq!(finished, dir);
        assert!(dir.join(HTTP_CASSETTE_FILE).exists());

        let _ = std::fs::remove_dir_all(&base);
    }

    #[test]
    fn finish_fails_while_recorder_is_shared() {
        let base = std::env::temp_dir().join("explainer_session_shared_test");
        let session = RecordingSession::new(&base).unwrap();
        let _held = Arc::clone(&session.http);

        let err = session.finish().unwrap_err();
        assert!(err.contains("still has references"));

        let _ = std::fs::remove_dir_all(&base);
    }
}
