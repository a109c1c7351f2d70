//! Session-lifetime execution history.
//!
//! Records are appended once per submission and never modified afterwards.
//! The log lives only in memory and is dropped with the process.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::engine::ExecutionResult;
use crate::intent::ActionDescriptor;

/// One logged submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionRecord {
    /// Text as submitted
    pub input: String,

    /// What the interpreter made of it (possibly `Unrecognized`)
    pub action: ActionDescriptor,

    /// Outcome, including any screenshot reference
    pub outcome: ExecutionResult,

    /// When the attempt finished
    pub timestamp: DateTime<Utc>,
}

impl ExecutionRecord {
    pub fn new(input: impl Into<String>, action: ActionDescriptor, outcome: ExecutionResult) -> Self {
        Self {
            input: input.into(),
            action,
            outcome,
            timestamp: Utc::now(),
        }
    }
}

/// Append-only ordered log, safe to append from several threads
#[derive(Debug, Default)]
pub struct History {
    records: Mutex<VecDeque<ExecutionRecord>>,
    /// Oldest records are evicted beyond this many
    capacity: Option<usize>,
}

impl History {
    /// Unbounded history
    pub fn new() -> Self {
        Self::default()
    }

    /// History keeping at most `capacity` records (`None` for unbounded)
    pub fn with_capacity(capacity: Option<usize>) -> Self {
        Self {
            records: Mutex::new(VecDeque::new()),
            capacity: capacity.filter(|c| *c > 0),
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<ExecutionRecord>> {
        // A panic while holding the lock cannot leave a half-written record.
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a record
    pub fn record(&self, record: ExecutionRecord) {
        let mut records = self.lock();
        records.push_back(record);
        if let Some(capacity) = self.capacity {
            while records.len() > capacity {
                records.pop_front();
            }
        }
    }

    /// Copy of all records, oldest first
    pub fn records(&self) -> Vec<ExecutionRecord> {
        self.lock().iter().cloned().collect()
    }

    /// Copy of the last `n` records, oldest first
    pub fn recent(&self, n: usize) -> Vec<ExecutionRecord> {
        let records = self.lock();
        let skip = records.len().saturating_sub(n);
        records.iter().skip(skip).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Numbered summary of the last `n` records
    pub fn render(&self, n: usize) -> String {
        let recent = self.recent(n);
        if recent.is_empty() {
            return "No commands executed yet.".to_string();
        }
        recent
            .iter()
            .enumerate()
            .map(|(i, record)| {
                let status = if record.outcome.success { "✅" } else { "❌" };
                format!("{}. {} `{}` - {}", i + 1, status, record.input, record.outcome.message)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn record(input: &str, success: bool) -> ExecutionRecord {
        let outcome = if success {
            ExecutionResult::success("screenshot", "ok")
        } else {
            ExecutionResult::failure("unrecognized", "nope")
        };
        ExecutionRecord::new(input, ActionDescriptor::Screenshot, outcome)
    }

    #[test]
    fn test_append_preserves_order() {
        let history = History::new();
        assert!(history.is_empty());
        history.record(record("a", true));
        history.record(record("b", false));
        let inputs: Vec<String> = history.records().into_iter().map(|r| r.input).collect();
        assert_eq!(inputs, vec!["a", "b"]);
    }

    #[test]
    fn test_bounded_evicts_oldest() {
        let history = History::with_capacity(Some(2));
        for input in ["a", "b", "c"] {
            history.record(record(input, true));
        }
        let inputs: Vec<String> = history.records().into_iter().map(|r| r.input).collect();
        assert_eq!(inputs, vec!["b", "c"]);
        assert_eq!(History::with_capacity(Some(0)).capacity(), None);
    }

    #[test]
    fn test_recent_and_render() {
        let history = History::new();
        assert_eq!(history.render(10), "No commands executed yet.");
        for input in ["a", "b", "c"] {
            history.record(record(input, input != "b"));
        }
        assert_eq!(history.recent(2).len(), 2);
        assert_eq!(history.recent(2)[0].input, "b");
        assert_eq!(history.render(2), "1. ❌ `b` - nope\n2. ✅ `c` - ok");
    }

    #[test]
    fn test_concurrent_appends() {
        let history = Arc::new(History::new());
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let history = Arc::clone(&history);
                thread::spawn(move || {
                    for i in 0..25 {
                        history.record(record(&format!("{}-{}", t, i), true));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(history.len(), 100);
    }

    #[test]
    fn test_clear() {
        let history = History::new();
        history.record(record("a", true));
        history.clear();
        assert!(history.is_empty());
    }
}
