use chrono::Utc;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::snapshot::types::{CaptureResult, Snapshot, SnapshotConfig, SnapshotResult};

/// Generate a timestamp string in YYYYMMDD_HHMMSS_mmm format
pub fn generate_timestamp() -> String {
    Utc::now().format("%Y%m%d_%H%M%S_%3f").to_string()
}

/// Generate a filename for snapshot images
pub fn generate_filename(prefix: &str, timestamp: &str) -> String {
    format!("{}_{}.png", prefix, timestamp)
}

/// Create base metadata map for snapshots
pub fn create_base_metadata(
    width: u32,
    height: u32,
    source: &str,
    timestamp: &str,
) -> serde_json::Map<String, serde_json::Value> {
    let mut meta = serde_json::Map::new();
    meta.insert("width".to_string(), serde_json::Value::Number(width.into()));
    meta.insert(
        "height".to_string(),
        serde_json::Value::Number(height.into()),
    );
    meta.insert(
        "source".to_string(),
        serde_json::Value::String(source.to_string()),
    );
    meta.insert(
        "timestamp".to_string(),
        serde_json::Value::String(timestamp.to_string()),
    );
    meta
}

/// Write the JSON manifest for a snapshot if configured
pub fn write_manifest(snapshot: &Snapshot, config: &SnapshotConfig) -> SnapshotResult<()> {
    if config.include_manifest {
        let manifest_path = snapshot.image_path.with_extension("json");
        let manifest_data = serde_json::to_value(snapshot)?;
        fs::write(manifest_path, serde_json::to_string_pretty(&manifest_data)?)?;
    }
    Ok(())
}

/// Create a new image file that no earlier capture owns.
///
/// Captures within the same millisecond get a `_1`, `_2`, ... suffix.
fn create_unique(dir: &Path, prefix: &str, timestamp: &str) -> SnapshotResult<(PathBuf, File)> {
    let mut attempt = 0u32;
    loop {
        let filename = match attempt {
            0 => generate_filename(prefix, timestamp),
            n => generate_filename(prefix, &format!("{}_{}", timestamp, n)),
        };
        let path = dir.join(filename);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => attempt += 1,
            Err(e) => return Err(e.into()),
        }
    }
}

/// Save a capture into the configured directory and return the snapshot.
///
/// `source` names the backend that produced the image and prefixes the
/// file name (`screenshot_mock_20240101_120000_123.png`).
pub fn save_capture(
    capture: CaptureResult,
    source: &str,
    config: &SnapshotConfig,
) -> SnapshotResult<Snapshot> {
    fs::create_dir_all(&config.output_dir)?;

    let timestamp = generate_timestamp();
    let prefix = format!("screenshot_{}", source);
    let (image_path, mut file) = create_unique(&config.output_dir, &prefix, &timestamp)?;
    file.write_all(&capture.image_data)?;

    let metadata = if config.include_metadata {
        let mut meta = create_base_metadata(capture.width, capture.height, source, &timestamp);
        if let Some(serde_json::Value::Object(extra)) = capture.metadata {
            for (k, v) in extra {
                meta.insert(k, v);
            }
        }
        Some(serde_json::Value::Object(meta))
    } else {
        None
    };

    let snapshot = Snapshot::new(image_path, source.to_string(), metadata);
    write_manifest(&snapshot, config)?;

    tracing::debug!(path = %snapshot.image_path.display(), "screenshot saved");
    Ok(snapshot)
}
