//! Intent Apparatus - natural-language desktop automation.
//!
//! This crate provides:
//! - A rule-based interpreter turning short commands ("click at 100, 200",
//!   "type 'hello'", "press ctrl+c") into typed action descriptors
//! - An executor that validates descriptors and drives mouse, keyboard and
//!   screen capture through a pluggable input backend
//! - MockBackend for testing without a display, NativeBackend (feature
//!   `native`) for the real desktop
//! - An in-memory history of every submission
//! - Session management for organized screenshot output
//!
//! # Example
//!
//! ```rust,no_run
//! use intent_apparatus::{Apparatus, Config, MockBackend, SnapshotConfig};
//!
//! let config = Config::from_env();
//! let mut apparatus = Apparatus::from_config(
//!     MockBackend::new(1920, 1080),
//!     SnapshotConfig::in_dir("/tmp/shots"),
//!     &config,
//! );
//! let submission = apparatus.submit("double click on 400, 300");
//! println!("{}", submission.result.message);
//! ```

pub mod apparatus;
pub mod config;
pub mod engine;
pub mod history;
pub mod intent;
pub mod session;
pub mod snapshot;

// Re-export the pipeline
pub use apparatus::{Apparatus, Submission};

// Re-export configuration
pub use config::Config;

// Re-export interpreter types
pub use intent::{ActionDescriptor, IntentParser, Key, MouseButton, ScrollDirection, interpret};

// Re-export executor types and backends
pub use engine::{
    BackendCall, EngineError, EngineResult, ExecutionResult, Executor, ExecutorSettings,
    InputBackend, MockBackend,
};
#[cfg(feature = "native")]
pub use engine::NativeBackend;

// Re-export history
pub use history::{ExecutionRecord, History};

// Re-export snapshot types
pub use snapshot::{CaptureResult, Snapshot, SnapshotConfig, SnapshotError, SnapshotResult};

// Re-export session management
pub use session::{Session, cleanup_old_sessions, list_sessions};
