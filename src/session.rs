//! Session management for screenshot output.
//!
//! Provides one directory per run with:
//! - Unique session directories under a configurable base location
//! - Automatic cleanup unless explicitly preserved
//! - Session metadata tracking

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::snapshot::SnapshotConfig;

/// A run's screenshot directory
#[derive(Debug, Clone)]
pub struct Session {
    /// Unique session ID
    pub id: String,
    /// Root directory for this session
    pub dir: PathBuf,
    /// Whether to keep files after session ends
    pub keep: bool,
    /// Backend the session was created for (e.g. "mock")
    pub backend: Option<String>,
    /// Screen size at session start
    pub screen_size: Option<(u32, u32)>,
}

impl Session {
    /// Create a session with a specific name/prefix under `base_dir`
    pub fn with_name(base_dir: impl AsRef<Path>, name: &str) -> Self {
        let timestamp = generate_timestamp_suffix();
        let id = format!("{}_{}", sanitize_name(name), timestamp);
        let dir = base_dir.as_ref().join(&id);

        Self {
            id,
            dir,
            keep: false,
            backend: None,
            screen_size: None,
        }
    }

    /// Use a specific directory; user-specified directories are kept by default
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let id = dir
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(generate_session_id);

        Self {
            id,
            dir,
            keep: true,
            backend: None,
            screen_size: None,
        }
    }

    /// Set whether to keep files after session ends
    pub fn keep(mut self, keep: bool) -> Self {
        self.keep = keep;
        self
    }

    /// Record which backend produced the screenshots
    pub fn with_backend(mut self, backend: &str, screen_size: Option<(u32, u32)>) -> Self {
        self.backend = Some(backend.to_string());
        self.screen_size = screen_size;
        self
    }

    /// Initialize the session directory
    pub fn init(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.dir)?;

        let metadata = serde_json::json!({
            "id": self.id,
            "created": chrono::Utc::now().to_rfc3339(),
            "backend": self.backend,
            "screen_size": self.screen_size,
        });

        let metadata_path = self.dir.join(".session.json");
        fs::write(metadata_path, serde_json::to_string_pretty(&metadata)?)?;

        Ok(())
    }

    /// Snapshot configuration writing into this session
    pub fn snapshot_config(&self) -> SnapshotConfig {
        SnapshotConfig::in_dir(&self.dir)
    }

    /// List all PNG files in the session
    pub fn list_screenshots(&self) -> std::io::Result<Vec<PathBuf>> {
        let mut screenshots = Vec::new();
        if self.dir.exists() {
            for entry in fs::read_dir(&self.dir)? {
                let path = entry?.path();
                if path.extension().is_some_and(|e| e == "png") {
                    screenshots.push(path);
                }
            }
        }
        screenshots.sort();
        Ok(screenshots)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if !self.keep {
            let _ = fs::remove_dir_all(&self.dir);
        }
    }
}

/// Generate a unique session ID
fn generate_session_id() -> String {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    let pid = std::process::id();
    format!("session_{}_{}", timestamp, pid)
}

/// Generate a timestamp suffix
fn generate_timestamp_suffix() -> String {
    chrono::Utc::now().format("%Y%m%d_%H%M%S").to_string()
}

/// Sanitize a name for use in filenames
fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' => c,
            _ => '_',
        })
        .collect()
}

/// Remove sessions under `base_dir` older than `max_age`
pub fn cleanup_old_sessions(
    base_dir: impl AsRef<Path>,
    max_age: std::time::Duration,
) -> std::io::Result<usize> {
    let base = base_dir.as_ref();
    if !base.exists() {
        return Ok(0);
    }

    let now = SystemTime::now();
    let mut cleaned = 0;

    for entry in fs::read_dir(base)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let age = entry
            .metadata()
            .and_then(|m| m.modified())
            .ok()
            .and_then(|modified| now.duration_since(modified).ok());
        if age.is_some_and(|age| age > max_age) && fs::remove_dir_all(&path).is_ok() {
            cleaned += 1;
        }
    }

    Ok(cleaned)
}

/// List all existing sessions under `base_dir`
pub fn list_sessions(base_dir: impl AsRef<Path>) -> std::io::Result<Vec<PathBuf>> {
    let base = base_dir.as_ref();
    if !base.exists() {
        return Ok(Vec::new());
    }

    let mut sessions = Vec::new();
    for entry in fs::read_dir(base)? {
        let path = entry?.path();
        if path.is_dir() {
            sessions.push(path);
        }
    }
    sessions.sort();
    Ok(sessions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_session_in_dir_is_kept() {
        let base = tempfile::tempdir().unwrap();
        let session = Session::in_dir(base.path().join("shots"));
        assert_eq!(session.id, "shots");
        assert!(session.keep);
    }

    #[test]
    fn test_session_with_name() {
        let base = tempfile::tempdir().unwrap();
        let session = Session::with_name(base.path(), "my run");
        assert!(session.id.starts_with("my_run_"));
    }

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("hello world"), "hello_world");
        assert_eq!(sanitize_name("ctrl+c"), "ctrl_c");
        assert_eq!(sanitize_name("a/b\\c"), "a_b_c");
    }

    #[test]
    fn test_init_writes_metadata_and_drop_cleans_up() {
        let base = tempfile::tempdir().unwrap();
        let dir = {
            let session = Session::with_name(base.path(), "run").with_backend("mock", Some((800, 600)));
            session.init().unwrap();
            let meta = fs::read_to_string(session.dir.join(".session.json")).unwrap();
            assert!(meta.contains("\"mock\""));
            session.dir.clone()
        };
        assert!(!dir.exists());
    }

    #[test]
    fn test_kept_session_survives_drop() {
        let base = tempfile::tempdir().unwrap();
        let dir = {
            let session = Session::with_name(base.path(), "run").keep(true);
            session.init().unwrap();
            fs::write(session.dir.join("b.png"), b"png").unwrap();
            fs::write(session.dir.join("a.png"), b"png").unwrap();
            let shots = session.list_screenshots().unwrap();
            assert_eq!(shots.len(), 2);
            assert!(shots[0].ends_with("a.png"));
            session.dir.clone()
        };
        assert!(dir.exists());
        assert_eq!(list_sessions(base.path()).unwrap(), vec![dir]);
        assert_eq!(cleanup_old_sessions(base.path(), Duration::from_secs(3600)).unwrap(), 0);
    }
}
