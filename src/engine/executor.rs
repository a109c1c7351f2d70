//! Action executor: validates a descriptor, drives the backend and reports
//! the outcome as an [`ExecutionResult`].
//!
//! Every backend call goes through [`attempt`], which turns both returned
//! errors and panics into [`EngineError`]s, so no failure from the input
//! layer ever escapes `execute`.

use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::time::Duration;

use super::backend::InputBackend;
use super::types::{EngineError, EngineResult, ExecutionResult};
use crate::config::Config;
use crate::intent::{ActionDescriptor, Key, MouseButton, ScrollDirection, resolve_keys};
use crate::snapshot::{SnapshotConfig, save_capture};

/// Behavior switches for the executor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutorSettings {
    /// Capture a screenshot after each successful mutating action
    pub screenshot_after_action: bool,
    /// Abort input primitives while the pointer sits in a screen corner
    pub failsafe: bool,
    /// Sleep after each successful input primitive
    pub pause: Duration,
}

impl Default for ExecutorSettings {
    fn default() -> Self {
        Self {
            screenshot_after_action: false,
            failsafe: true,
            pause: Duration::ZERO,
        }
    }
}

impl ExecutorSettings {
    /// Settings taken from the environment-driven configuration
    pub fn from_config(config: &Config) -> Self {
        Self {
            screenshot_after_action: config.automation.screenshot_after_action,
            failsafe: config.automation.failsafe,
            pause: Duration::from_millis(config.automation.pause_ms),
        }
    }

    pub fn screenshot_after_action(mut self, enabled: bool) -> Self {
        self.screenshot_after_action = enabled;
        self
    }

    pub fn failsafe(mut self, enabled: bool) -> Self {
        self.failsafe = enabled;
        self
    }

    pub fn pause(mut self, pause: Duration) -> Self {
        self.pause = pause;
        self
    }
}

/// Run one backend operation, converting panics into [`EngineError::Panic`]
pub fn attempt<B, T, F>(backend: &mut B, op: F) -> EngineResult<T>
where
    B: InputBackend + ?Sized,
    F: FnOnce(&mut B) -> EngineResult<T>,
{
    match panic::catch_unwind(AssertUnwindSafe(|| op(backend))) {
        Ok(result) => result,
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            Err(EngineError::Panic(message))
        }
    }
}

/// Executes action descriptors against an input backend
pub struct Executor<B: InputBackend> {
    backend: B,
    settings: ExecutorSettings,
    snapshots: SnapshotConfig,
}

impl<B: InputBackend> Executor<B> {
    /// Create an executor saving screenshots according to `snapshots`
    pub fn new(backend: B, snapshots: SnapshotConfig) -> Self {
        Self {
            backend,
            settings: ExecutorSettings::default(),
            snapshots,
        }
    }

    pub fn with_settings(mut self, settings: ExecutorSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> &ExecutorSettings {
        &self.settings
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn snapshot_config(&self) -> &SnapshotConfig {
        &self.snapshots
    }

    /// Current screen size as reported by the backend
    pub fn screen_size(&mut self) -> EngineResult<(u32, u32)> {
        attempt(&mut self.backend, |b| b.screen_size())
    }

    /// Execute one action. Side effects are real and immediate; call once
    /// per submission.
    pub fn execute(&mut self, action: &ActionDescriptor) -> ExecutionResult {
        let mut result = self.dispatch(action);

        if result.success && action.is_mutating() && self.settings.screenshot_after_action {
            match self.capture_and_save() {
                Ok(path) => result = result.with_screenshot(path),
                Err(e) => {
                    tracing::warn!(action = action.kind(), error = %e, "follow-up screenshot failed");
                }
            }
        }

        if result.success {
            tracing::info!(action = action.kind(), message = %result.message, "action executed");
        } else {
            tracing::warn!(action = action.kind(), message = %result.message, "action failed");
        }
        result
    }

    fn dispatch(&mut self, action: &ActionDescriptor) -> ExecutionResult {
        let kind = action.kind();
        match action {
            ActionDescriptor::Click { x, y } => {
                self.pointer_action(kind, "click", *x, *y, Some((MouseButton::Left, 1)))
            }
            ActionDescriptor::RightClick { x, y } => {
                self.pointer_action(kind, "right click", *x, *y, Some((MouseButton::Right, 1)))
            }
            ActionDescriptor::DoubleClick { x, y } => {
                self.pointer_action(kind, "double click", *x, *y, Some((MouseButton::Left, 2)))
            }
            ActionDescriptor::MoveMouse { x, y } => {
                self.pointer_action(kind, "move mouse", *x, *y, None)
            }
            ActionDescriptor::TypeText { text } => self.input_primitive(
                kind,
                "type text",
                |b| b.type_text(text),
                format!("Typed text: '{}'", text),
            ),
            ActionDescriptor::PressKey { key } => match Key::from_name(key) {
                Some(resolved) => self.input_primitive(
                    kind,
                    "press key",
                    |b| b.key_tap(resolved),
                    format!("Pressed key: {}", resolved.name()),
                ),
                None => ExecutionResult::failure(kind, format!("Unknown key: '{}'", key)),
            },
            ActionDescriptor::PressCombo { keys } => {
                if keys.len() < 2 {
                    return ExecutionResult::failure(
                        kind,
                        "A key combination needs at least two keys",
                    );
                }
                match resolve_keys(keys) {
                    Ok(resolved) => {
                        let names: Vec<String> = resolved.iter().map(Key::name).collect();
                        self.input_primitive(
                            kind,
                            "press key combination",
                            |b| b.key_combo(&resolved),
                            format!("Pressed key combination: {}", names.join("+")),
                        )
                    }
                    Err(unknown) => ExecutionResult::failure(
                        kind,
                        format!("Unknown key in combination: '{}'", unknown),
                    ),
                }
            }
            ActionDescriptor::Scroll { direction, count } => {
                self.scroll(kind, *direction, *count)
            }
            ActionDescriptor::Screenshot => match self.capture_and_save() {
                Ok(path) => ExecutionResult::success(
                    kind,
                    format!("Screenshot saved as {}", path.display()),
                )
                .with_screenshot(path),
                Err(e) => ExecutionResult::failure(kind, format!("Failed to take screenshot: {}", e)),
            },
            ActionDescriptor::Unrecognized { text } => ExecutionResult::failure(
                kind,
                format!("Could not understand the command: '{}'", text),
            ),
        }
    }

    fn scroll(&mut self, kind: &str, direction: ScrollDirection, count: u32) -> ExecutionResult {
        if count == 0 {
            return ExecutionResult::failure(kind, "Scroll count must be at least 1");
        }
        self.input_primitive(
            kind,
            "scroll",
            |b| b.scroll(direction, count),
            format!("Scrolled {} {} clicks", direction, count),
        )
    }

    /// Bounds-check, move, then optionally click
    fn pointer_action(
        &mut self,
        kind: &str,
        verb: &str,
        x: i32,
        y: i32,
        click: Option<(MouseButton, u32)>,
    ) -> ExecutionResult {
        let (width, height) = match self.screen_size() {
            Ok(size) => size,
            Err(e) => {
                return ExecutionResult::failure(kind, format!("Failed to {}: {}", verb, e));
            }
        };
        if !within_bounds(x, y, width, height) {
            return ExecutionResult::failure(
                kind,
                format!(
                    "Coordinates ({}, {}) are outside screen bounds ({}x{})",
                    x, y, width, height
                ),
            );
        }

        let message = match click {
            None => format!("Moved mouse to ({}, {})", x, y),
            Some((_, 2)) => format!("Double-clicked at position ({}, {})", x, y),
            Some((button, _)) => {
                format!("Clicked at position ({}, {}) with {} button", x, y, button)
            }
        };
        self.input_primitive(
            kind,
            verb,
            |b| {
                b.move_to(x, y)?;
                match click {
                    Some((button, count)) => b.click(button, count),
                    None => Ok(()),
                }
            },
            message,
        )
    }

    /// Failsafe check, run the primitive through the attempt boundary, pause
    fn input_primitive<F>(&mut self, kind: &str, verb: &str, op: F, message: String) -> ExecutionResult
    where
        F: FnOnce(&mut B) -> EngineResult<()>,
    {
        if self.settings.failsafe {
            if let Err(e) = self.check_failsafe() {
                return ExecutionResult::failure(kind, format!("Failed to {}: {}", verb, e));
            }
        }

        tracing::debug!(action = kind, backend = self.backend.source_type(), "dispatching");
        match attempt(&mut self.backend, op) {
            Ok(()) => {
                if !self.settings.pause.is_zero() {
                    std::thread::sleep(self.settings.pause);
                }
                ExecutionResult::success(kind, message)
            }
            Err(e) => ExecutionResult::failure(kind, format!("Failed to {}: {}", verb, e)),
        }
    }

    fn check_failsafe(&mut self) -> EngineResult<()> {
        let (width, height) = self.screen_size()?;
        let (x, y) = attempt(&mut self.backend, |b| b.cursor_position())?;
        if in_corner(x, y, width, height) {
            return Err(EngineError::Failsafe { x, y });
        }
        Ok(())
    }

    fn capture_and_save(&mut self) -> EngineResult<PathBuf> {
        let capture = attempt(&mut self.backend, |b| b.capture_screen())?;
        let source = self.backend.source_type().to_string();
        let snapshot = save_capture(capture, &source, &self.snapshots)
            .map_err(|e| EngineError::Capture(format!("could not save screenshot: {}", e)))?;
        Ok(snapshot.image_path)
    }
}

fn within_bounds(x: i32, y: i32, width: u32, height: u32) -> bool {
    x >= 0 && y >= 0 && (x as u32) < width && (y as u32) < height
}

fn in_corner(x: i32, y: i32, width: u32, height: u32) -> bool {
    let right = width as i64 - 1;
    let bottom = height as i64 - 1;
    let (x, y) = (x as i64, y as i64);
    (x == 0 || x == right) && (y == 0 || y == bottom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::backend::{BackendCall, MockBackend};
    use pretty_assertions::assert_eq;

    fn executor(backend: MockBackend) -> (Executor<MockBackend>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let executor = Executor::new(backend, SnapshotConfig::in_dir(dir.path()));
        (executor, dir)
    }

    #[test]
    fn test_within_bounds() {
        assert!(within_bounds(0, 0, 100, 100));
        assert!(within_bounds(99, 99, 100, 100));
        // x == width is one past the last pixel column, so it is refused
        // rather than clamped onto the edge.
        assert!(!within_bounds(100, 0, 100, 100));
        assert!(!within_bounds(0, 100, 100, 100));
        assert!(!within_bounds(-1, 0, 100, 100));
    }

    #[test]
    fn test_in_corner() {
        assert!(in_corner(0, 0, 100, 50));
        assert!(in_corner(99, 49, 100, 50));
        assert!(in_corner(0, 49, 100, 50));
        assert!(!in_corner(50, 0, 100, 50));
        assert!(!in_corner(1, 1, 100, 50));
    }

    #[test]
    fn test_negative_click_is_not_dispatched() {
        let (mut exec, _dir) = executor(MockBackend::new(320, 240));
        let result = exec.execute(&ActionDescriptor::Click { x: -1, y: 0 });
        assert!(!result.success);
        assert!(result.message.contains("outside screen bounds"));
        assert!(exec.backend().calls().is_empty());
    }

    #[test]
    fn test_click_dispatches_move_then_click() {
        let (mut exec, _dir) = executor(MockBackend::new(320, 240));
        let result = exec.execute(&ActionDescriptor::Click { x: 100, y: 200 });
        assert!(result.success, "{}", result.message);
        assert_eq!(result.message, "Clicked at position (100, 200) with left button");
        assert_eq!(
            exec.backend().calls(),
            &[
                BackendCall::MoveTo { x: 100, y: 200 },
                BackendCall::Click { button: MouseButton::Left, count: 1 },
            ]
        );
    }

    #[test]
    fn test_type_text_passes_literal() {
        let (mut exec, _dir) = executor(MockBackend::new(320, 240));
        let result = exec.execute(&ActionDescriptor::TypeText { text: "Hello World".into() });
        assert!(result.success);
        assert_eq!(exec.backend().calls(), &[BackendCall::TypeText("Hello World".into())]);
    }

    #[test]
    fn test_unknown_key_is_validation_failure() {
        let (mut exec, _dir) = executor(MockBackend::new(320, 240));
        let result = exec.execute(&ActionDescriptor::PressKey { key: "banana".into() });
        assert!(!result.success);
        assert_eq!(result.message, "Unknown key: 'banana'");

        let result = exec.execute(&ActionDescriptor::PressCombo {
            keys: vec!["ctrl".into(), "banana".into()],
        });
        assert!(!result.success);

        let result = exec.execute(&ActionDescriptor::PressCombo { keys: vec!["ctrl".into()] });
        assert!(!result.success);
        assert!(exec.backend().calls().is_empty());
    }

    #[test]
    fn test_zero_scroll_is_validation_failure() {
        let (mut exec, _dir) = executor(MockBackend::new(320, 240));
        let result = exec.execute(&ActionDescriptor::Scroll {
            direction: ScrollDirection::Up,
            count: 0,
        });
        assert!(!result.success);
        assert!(exec.backend().calls().is_empty());
    }

    #[test]
    fn test_backend_error_becomes_failure() {
        let backend = MockBackend::new(320, 240)
            .fail_with(EngineError::NoDisplay("DISPLAY not set".into()));
        let (mut exec, _dir) = executor(backend);
        let result = exec.execute(&ActionDescriptor::PressKey { key: "enter".into() });
        assert!(!result.success);
        assert_eq!(result.message, "Failed to press key: no display available: DISPLAY not set");
    }

    #[test]
    fn test_backend_panic_becomes_failure() {
        let backend = MockBackend::new(320, 240).panic_with("driver exploded");
        let (mut exec, _dir) = executor(backend);
        let result = exec.execute(&ActionDescriptor::TypeText { text: "x".into() });
        assert!(!result.success);
        assert!(result.message.contains("driver exploded"), "{}", result.message);
    }

    #[test]
    fn test_failsafe_blocks_input_in_corner() {
        let mut backend = MockBackend::new(320, 240);
        backend.set_cursor(0, 0);
        let (mut exec, _dir) = executor(backend);

        let result = exec.execute(&ActionDescriptor::Scroll {
            direction: ScrollDirection::Down,
            count: 1,
        });
        assert!(!result.success);
        assert!(result.message.contains("failsafe"), "{}", result.message);
        assert!(exec.backend().calls().is_empty());
    }

    #[test]
    fn test_failsafe_can_be_disabled() {
        let mut backend = MockBackend::new(320, 240);
        backend.set_cursor(319, 239);
        let (exec, _dir) = executor(backend);
        let mut exec = exec.with_settings(ExecutorSettings::default().failsafe(false));

        let result = exec.execute(&ActionDescriptor::PressKey { key: "tab".into() });
        assert!(result.success);
    }

    #[test]
    fn test_screenshot_action_saves_file() {
        let (mut exec, _dir) = executor(MockBackend::new(64, 48));
        let result = exec.execute(&ActionDescriptor::Screenshot);
        assert!(result.success, "{}", result.message);
        let path = result.screenshot.expect("screenshot path");
        assert!(path.exists());
        assert!(result.message.starts_with("Screenshot saved as "));
    }

    #[test]
    fn test_rapid_screenshots_keep_their_own_files() {
        let (mut exec, dir) = executor(MockBackend::new(8, 8));
        let paths: Vec<PathBuf> = (0..20)
            .map(|_| exec.execute(&ActionDescriptor::Screenshot))
            .map(|r| r.screenshot.expect("screenshot path"))
            .collect();

        let distinct: std::collections::HashSet<_> = paths.iter().collect();
        assert_eq!(distinct.len(), 20);
        let pngs = std::fs::read_dir(dir.path())
            .unwrap()
            .filter(|e| e.as_ref().unwrap().path().extension().is_some_and(|x| x == "png"))
            .count();
        assert_eq!(pngs, 20);
    }

    #[test]
    fn test_screenshot_after_mutating_action() {
        let (exec, _dir) = executor(MockBackend::new(64, 48));
        let mut exec =
            exec.with_settings(ExecutorSettings::default().screenshot_after_action(true));

        let result = exec.execute(&ActionDescriptor::MoveMouse { x: 10, y: 10 });
        assert!(result.success);
        assert!(result.screenshot.as_ref().is_some_and(|p| p.exists()));

        // Failed actions get no screenshot
        let result = exec.execute(&ActionDescriptor::MoveMouse { x: 640, y: 10 });
        assert!(!result.success);
        assert!(result.screenshot.is_none());
    }

    #[test]
    fn test_unrecognized_is_failure_without_calls() {
        let (mut exec, _dir) = executor(MockBackend::new(64, 48));
        let result = exec.execute(&ActionDescriptor::Unrecognized { text: "asdkjf".into() });
        assert!(!result.success);
        assert_eq!(result.action, "unrecognized");
        assert!(exec.backend().calls().is_empty());
    }
}
