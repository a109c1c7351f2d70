//! Configuration management with environment variable support.
//!
//! This module provides centralized configuration for Intent Apparatus,
//! supporting:
//! - Environment variables for all configurable values
//! - Sensible defaults
//! - Builder-style overrides from the CLI
//!
//! # Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `INTENT_APPARATUS_SCREENSHOT_AFTER_ACTION` | Capture the screen after mutating actions | `false` |
//! | `INTENT_APPARATUS_SCROLL_COUNT` | Scroll notches when a command omits the count | `3` |
//! | `INTENT_APPARATUS_FAILSAFE` | Abort input while the pointer is in a screen corner | `true` |
//! | `INTENT_APPARATUS_PAUSE_MS` | Pause after each input primitive (ms) | `500` |
//! | `INTENT_APPARATUS_SESSION_DIR` | Base directory for screenshot sessions | `/tmp/intent-apparatus` |
//! | `INTENT_APPARATUS_MOCK_SCREEN` | Screen size of the mock backend (`WxH`) | `1920x1080` |
//! | `INTENT_APPARATUS_HISTORY_CAPACITY` | Max history records, `0` for unbounded | `0` |
//!
//! # Example
//!
//! ```bash
//! # Always attach a screenshot and scroll further by default
//! export INTENT_APPARATUS_SCREENSHOT_AFTER_ACTION=true
//! export INTENT_APPARATUS_SCROLL_COUNT=5
//! ```

use std::env;
use std::sync::OnceLock;

use crate::engine::MAX_MOCK_DIMENSION;

// ============================================================================
// Default Values
// ============================================================================

/// Default for capturing a screenshot after each mutating action
pub const DEFAULT_SCREENSHOT_AFTER_ACTION: bool = false;

/// Default scroll count when a command omits it
pub const DEFAULT_SCROLL_COUNT: u32 = crate::intent::DEFAULT_SCROLL_COUNT;

/// Default failsafe setting
pub const DEFAULT_FAILSAFE: bool = true;

/// Default pause after each input primitive (milliseconds)
pub const DEFAULT_PAUSE_MS: u64 = 500;

/// Default session base directory
pub const DEFAULT_SESSION_DIR: &str = "/tmp/intent-apparatus";

/// Default mock screen width (pixels)
pub const DEFAULT_MOCK_WIDTH: u32 = 1920;

/// Default mock screen height (pixels)
pub const DEFAULT_MOCK_HEIGHT: u32 = 1080;

/// Default history capacity (0 = unbounded)
pub const DEFAULT_HISTORY_CAPACITY: usize = 0;

// ============================================================================
// Environment Variable Names
// ============================================================================

pub const ENV_SCREENSHOT_AFTER_ACTION: &str = "INTENT_APPARATUS_SCREENSHOT_AFTER_ACTION";
pub const ENV_SCROLL_COUNT: &str = "INTENT_APPARATUS_SCROLL_COUNT";
pub const ENV_FAILSAFE: &str = "INTENT_APPARATUS_FAILSAFE";
pub const ENV_PAUSE_MS: &str = "INTENT_APPARATUS_PAUSE_MS";
pub const ENV_SESSION_DIR: &str = "INTENT_APPARATUS_SESSION_DIR";
pub const ENV_MOCK_SCREEN: &str = "INTENT_APPARATUS_MOCK_SCREEN";
pub const ENV_HISTORY_CAPACITY: &str = "INTENT_APPARATUS_HISTORY_CAPACITY";

// ============================================================================
// Configuration Getters (with caching)
// ============================================================================

static CONFIG: OnceLock<Config> = OnceLock::new();

/// Get the global configuration (initialized from environment on first access)
pub fn get() -> &'static Config {
    CONFIG.get_or_init(Config::from_env)
}

/// Centralized configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Interpreter / executor behavior
    pub automation: AutomationSettings,
    /// Session configuration
    pub session: SessionSettings,
    /// Mock backend configuration
    pub mock: MockSettings,
}

/// Settings for interpreting and executing commands
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutomationSettings {
    pub screenshot_after_action: bool,
    pub default_scroll_count: u32,
    pub failsafe: bool,
    /// Pause after each input primitive (milliseconds)
    pub pause_ms: u64,
    /// Maximum history records kept (`None` for unbounded)
    pub history_capacity: Option<usize>,
}

/// Session-related settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    /// Base directory for session storage
    pub base_dir: String,
}

/// Mock backend settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockSettings {
    pub screen_width: u32,
    pub screen_height: u32,
}

impl Config {
    /// Create configuration from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Create configuration with all defaults (ignoring environment)
    pub fn defaults() -> Self {
        Self::from_lookup(|_| None)
    }

    /// Build from an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            automation: AutomationSettings::from_lookup(&lookup),
            session: SessionSettings::from_lookup(&lookup),
            mock: MockSettings::from_lookup(&lookup),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

impl AutomationSettings {
    fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Self {
        let history_capacity = lookup(ENV_HISTORY_CAPACITY)
            .and_then(|s| s.trim().parse::<usize>().ok())
            .unwrap_or(DEFAULT_HISTORY_CAPACITY);

        Self {
            screenshot_after_action: lookup(ENV_SCREENSHOT_AFTER_ACTION)
                .and_then(|s| parse_bool(&s))
                .unwrap_or(DEFAULT_SCREENSHOT_AFTER_ACTION),
            default_scroll_count: lookup(ENV_SCROLL_COUNT)
                .and_then(|s| s.trim().parse::<u32>().ok())
                .filter(|n| *n >= 1)
                .unwrap_or(DEFAULT_SCROLL_COUNT),
            failsafe: lookup(ENV_FAILSAFE)
                .and_then(|s| parse_bool(&s))
                .unwrap_or(DEFAULT_FAILSAFE),
            pause_ms: lookup(ENV_PAUSE_MS)
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(DEFAULT_PAUSE_MS),
            history_capacity: (history_capacity > 0).then_some(history_capacity),
        }
    }
}

impl SessionSettings {
    fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Self {
        Self {
            base_dir: lookup(ENV_SESSION_DIR).unwrap_or_else(|| DEFAULT_SESSION_DIR.to_string()),
        }
    }
}

impl MockSettings {
    fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Self {
        let (screen_width, screen_height) = lookup(ENV_MOCK_SCREEN)
            .and_then(|s| parse_screen_size(&s))
            .unwrap_or((DEFAULT_MOCK_WIDTH, DEFAULT_MOCK_HEIGHT));
        Self {
            screen_width,
            screen_height,
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Parse a boolean flag: 1/0, true/false, yes/no, on/off
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a screen size string "WxH" into (width, height); each side must be
/// in `1..=MAX_MOCK_DIMENSION`
pub fn parse_screen_size(size: &str) -> Option<(u32, u32)> {
    let (w, h) = size.trim().to_lowercase().split_once('x').map(|(w, h)| {
        (w.trim().parse::<u32>().ok(), h.trim().parse::<u32>().ok())
    })?;
    let valid = |n: u32| (1..=MAX_MOCK_DIMENSION).contains(&n).then_some(n);
    Some((valid(w?)?, valid(h?)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("true"), Some(true));
        assert_eq!(parse_bool(" ON "), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    fn test_parse_screen_size() {
        assert_eq!(parse_screen_size("1920x1080"), Some((1920, 1080)));
        assert_eq!(parse_screen_size("800X600"), Some((800, 600)));
        assert_eq!(parse_screen_size("0x600"), None);
        assert_eq!(parse_screen_size("invalid"), None);
        assert_eq!(parse_screen_size("100"), None);
        assert_eq!(parse_screen_size("8192x8192"), Some((8192, 8192)));
        assert_eq!(parse_screen_size("70000x70000"), None);
        assert_eq!(parse_screen_size("99999999999x10"), None);
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::defaults();
        assert!(!config.automation.screenshot_after_action);
        assert_eq!(config.automation.default_scroll_count, 3);
        assert!(config.automation.failsafe);
        assert_eq!(config.automation.pause_ms, DEFAULT_PAUSE_MS);
        assert_eq!(config.automation.history_capacity, None);
        assert_eq!(config.session.base_dir, DEFAULT_SESSION_DIR);
        assert_eq!(config.mock.screen_width, DEFAULT_MOCK_WIDTH);
    }

    #[test]
    fn test_config_from_lookup() {
        let config = Config::from_lookup(lookup(&[
            (ENV_SCREENSHOT_AFTER_ACTION, "yes"),
            (ENV_SCROLL_COUNT, "5"),
            (ENV_FAILSAFE, "off"),
            (ENV_PAUSE_MS, "0"),
            (ENV_MOCK_SCREEN, "640x480"),
            (ENV_HISTORY_CAPACITY, "10"),
        ]));
        assert!(config.automation.screenshot_after_action);
        assert_eq!(config.automation.default_scroll_count, 5);
        assert!(!config.automation.failsafe);
        assert_eq!(config.automation.pause_ms, 0);
        assert_eq!(config.automation.history_capacity, Some(10));
        assert_eq!((config.mock.screen_width, config.mock.screen_height), (640, 480));
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = Config::from_lookup(lookup(&[
            (ENV_SCROLL_COUNT, "0"),
            (ENV_FAILSAFE, "sometimes"),
            (ENV_MOCK_SCREEN, "big"),
        ]));
        assert_eq!(config.automation.default_scroll_count, DEFAULT_SCROLL_COUNT);
        assert!(config.automation.failsafe);
        assert_eq!(config.mock.screen_height, DEFAULT_MOCK_HEIGHT);

        let config = Config::from_lookup(lookup(&[(ENV_MOCK_SCREEN, "70000x70000")]));
        assert_eq!(
            (config.mock.screen_width, config.mock.screen_height),
            (DEFAULT_MOCK_WIDTH, DEFAULT_MOCK_HEIGHT)
        );
    }
}
