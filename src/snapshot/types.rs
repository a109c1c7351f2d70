// Core types for screenshot capture and storage

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for saving screenshots
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotConfig {
    /// Directory where screenshots will be saved
    pub output_dir: PathBuf,

    /// Whether to record capture metadata (size, source, backend extras)
    pub include_metadata: bool,

    /// Whether to write a JSON manifest next to each image
    pub include_manifest: bool,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./screenshots"),
            include_metadata: true,
            include_manifest: true,
        }
    }
}

impl SnapshotConfig {
    /// Config writing into `output_dir` with metadata and manifest enabled
    pub fn in_dir(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            ..Default::default()
        }
    }
}

/// Raw result of a screen capture, before it is written anywhere
#[derive(Debug, Clone)]
pub struct CaptureResult {
    /// PNG-encoded image data
    pub image_data: Vec<u8>,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Optional backend-specific metadata
    pub metadata: Option<serde_json::Value>,
}

/// A screenshot saved to disk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// Path to the image file
    pub image_path: PathBuf,

    /// Source backend (e.g., "mock", "native")
    pub source: String,

    /// Optional metadata about the capture
    pub metadata: Option<serde_json::Value>,

    /// Timestamp when the snapshot was created
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

impl Snapshot {
    /// Create a new snapshot
    pub fn new(image_path: PathBuf, source: String, metadata: Option<serde_json::Value>) -> Self {
        Self {
            image_path,
            source,
            metadata,
            timestamp: Utc::now(),
        }
    }
}

/// Result type for snapshot operations
pub type SnapshotResult<T> = Result<T, SnapshotError>;

/// Error types for snapshot operations
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
