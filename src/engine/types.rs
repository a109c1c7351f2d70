//! Result and error types shared by the executor and input backends.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Result type for backend primitives
pub type EngineResult<T> = Result<T, EngineError>;

/// Failures raised by an input backend.
///
/// These never leave the executor: they are converted into failed
/// [`ExecutionResult`]s at the attempt boundary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// The OS refused input injection (e.g. missing accessibility permission)
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// No display / input server to talk to
    #[error("no display available: {0}")]
    NoDisplay(String),

    /// The pointer was parked in a screen corner
    #[error("failsafe triggered: pointer is in a screen corner at ({x}, {y})")]
    Failsafe { x: i32, y: i32 },

    #[error("screen capture failed: {0}")]
    Capture(String),

    /// Any other error reported by the backend
    #[error("input backend error: {0}")]
    Backend(String),

    /// The backend panicked mid-call
    #[error("input backend panicked: {0}")]
    Panic(String),
}

impl EngineError {
    /// Classify a backend message into the closest variant
    pub fn from_backend_message(message: impl Into<String>) -> Self {
        let message = message.into();
        let lowered = message.to_lowercase();
        if lowered.contains("permission") || lowered.contains("not trusted") {
            Self::PermissionDenied(message)
        } else if lowered.contains("display") || lowered.contains("connection") {
            Self::NoDisplay(message)
        } else {
            Self::Backend(message)
        }
    }
}

/// Outcome of executing one action, reported as data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Whether the action was performed
    pub success: bool,

    /// Human-readable outcome
    pub message: String,

    /// Kind of the action that was attempted (see `ActionDescriptor::kind`)
    pub action: String,

    /// Screenshot taken by or after the action
    pub screenshot: Option<PathBuf>,
}

impl ExecutionResult {
    pub fn success(action: &str, message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            action: action.to_string(),
            screenshot: None,
        }
    }

    pub fn failure(action: &str, message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            action: action.to_string(),
            screenshot: None,
        }
    }

    /// Attach a screenshot path
    pub fn with_screenshot(mut self, path: impl Into<PathBuf>) -> Self {
        self.screenshot = Some(path.into());
        self
    }

    /// Short status label for display
    pub fn status(&self) -> &'static str {
        if self.success { "Success" } else { "Error" }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_backend_message() {
        assert!(matches!(
            EngineError::from_backend_message("Accessibility permission missing"),
            EngineError::PermissionDenied(_)
        ));
        assert!(matches!(
            EngineError::from_backend_message("could not open display :0"),
            EngineError::NoDisplay(_)
        ));
        assert!(matches!(
            EngineError::from_backend_message("something odd"),
            EngineError::Backend(_)
        ));
    }

    #[test]
    fn test_result_builders() {
        let ok = ExecutionResult::success("click", "done").with_screenshot("/tmp/a.png");
        assert!(ok.success);
        assert_eq!(ok.status(), "Success");
        assert_eq!(ok.screenshot.as_deref(), Some(std::path::Path::new("/tmp/a.png")));

        let err = ExecutionResult::failure("scroll", "nope");
        assert!(!err.success);
        assert_eq!(err.status(), "Error");
        assert!(err.screenshot.is_none());
    }
}
