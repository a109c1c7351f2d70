//! The command pipeline: interpret a line of text, execute the resulting
//! action once and log the outcome.

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::engine::{EngineResult, ExecutionResult, Executor, ExecutorSettings, InputBackend};
use crate::history::{ExecutionRecord, History};
use crate::intent::{ActionDescriptor, IntentParser, format_examples};
use crate::snapshot::SnapshotConfig;

/// What one submission resolved to and how it went
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub input: String,
    pub action: ActionDescriptor,
    pub result: ExecutionResult,
}

/// Interpret-then-execute pipeline with its session history
pub struct Apparatus<B: InputBackend> {
    parser: IntentParser,
    executor: Executor<B>,
    history: History,
}

impl<B: InputBackend> Apparatus<B> {
    pub fn new(parser: IntentParser, executor: Executor<B>, history: History) -> Self {
        Self {
            parser,
            executor,
            history,
        }
    }

    /// Wire everything from configuration
    pub fn from_config(backend: B, snapshots: SnapshotConfig, config: &Config) -> Self {
        let parser =
            IntentParser::new().with_default_scroll_count(config.automation.default_scroll_count);
        let executor =
            Executor::new(backend, snapshots).with_settings(ExecutorSettings::from_config(config));
        let history = History::with_capacity(config.automation.history_capacity);
        Self::new(parser, executor, history)
    }

    /// Interpret `text`, execute it exactly once and append the outcome to
    /// the history. Every submission is recorded, recognized or not.
    pub fn submit(&mut self, text: &str) -> Submission {
        let action = self.parser.interpret(text);
        tracing::debug!(input = text, action = action.kind(), "submission interpreted");

        let result = if text.trim().is_empty() {
            ExecutionResult::failure(action.kind(), "Please enter a command.")
        } else {
            let mut result = self.executor.execute(&action);
            if !action.is_recognized() {
                result.message = format!("{}\n\n{}", result.message, format_examples(2));
            }
            result
        };

        self.history
            .record(ExecutionRecord::new(text, action.clone(), result.clone()));

        Submission {
            input: text.to_string(),
            action,
            result,
        }
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn clear_history(&self) {
        self.history.clear();
    }

    pub fn executor(&self) -> &Executor<B> {
        &self.executor
    }

    pub fn executor_mut(&mut self) -> &mut Executor<B> {
        &mut self.executor
    }

    /// "Screen size: WxH pixels"
    pub fn screen_info(&mut self) -> EngineResult<String> {
        let (width, height) = self.executor.screen_size()?;
        Ok(format!("Screen size: {}x{} pixels", width, height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{BackendCall, MockBackend};

    #[test]
    fn test_submit_records_every_outcome() {
        let dir = tempfile::tempdir().unwrap();
        let executor = Executor::new(MockBackend::new(320, 240), SnapshotConfig::in_dir(dir.path()));
        let mut apparatus = Apparatus::new(IntentParser::new(), executor, History::new());

        assert!(apparatus.submit("press enter").result.success);
        assert!(!apparatus.submit("asdkjf").result.success);
        assert!(!apparatus.submit("click at 5000, 1").result.success);
        assert!(!apparatus.submit("  ").result.success);

        let records = apparatus.history().records();
        assert_eq!(records.len(), 4);
        assert_eq!(records[1].action, ActionDescriptor::Unrecognized { text: "asdkjf".into() });
        assert!(records[1].outcome.message.starts_with("Could not understand the command: 'asdkjf'"));
        assert!(records[1].outcome.message.contains("Example commands:"));
        assert_eq!(records[3].outcome.message, "Please enter a command.");
        // Only the recognized, valid command reached the backend.
        assert_eq!(apparatus.executor().backend().calls().len(), 1);
        assert!(matches!(apparatus.executor().backend().calls()[0], BackendCall::KeyTap(_)));
    }

    #[test]
    fn test_from_config_applies_scroll_default() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::defaults();
        config.automation.default_scroll_count = 7;
        config.automation.pause_ms = 0;
        let mut apparatus = Apparatus::from_config(
            MockBackend::new(100, 100),
            SnapshotConfig::in_dir(dir.path()),
            &config,
        );

        let submission = apparatus.submit("scroll down");
        assert!(submission.result.success);
        assert_eq!(submission.result.message, "Scrolled down 7 clicks");
        assert_eq!(apparatus.screen_info().unwrap(), "Screen size: 100x100 pixels");
    }
}
