//! Action descriptors produced by the interpreter and consumed by the executor.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Scroll wheel direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrollDirection {
    Up,
    Down,
}

impl ScrollDirection {
    /// Parse "up" / "down" (case-insensitive)
    pub fn from_str(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "up" => Some(Self::Up),
            "down" => Some(Self::Down),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
        }
    }
}

impl fmt::Display for ScrollDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mouse button used by click primitives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MouseButton {
    Left,
    Right,
}

impl MouseButton {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

impl fmt::Display for MouseButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single structured OS-input operation and its parameters.
///
/// Coordinates are signed so that out-of-range descriptors can be expressed;
/// the interpreter only produces non-negative values and the executor rejects
/// anything outside the current screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ActionDescriptor {
    /// Left click at a position
    Click { x: i32, y: i32 },

    /// Right click at a position
    RightClick { x: i32, y: i32 },

    /// Two left clicks at a position
    DoubleClick { x: i32, y: i32 },

    /// Move the pointer without clicking
    MoveMouse { x: i32, y: i32 },

    /// Type a literal string, case preserved
    TypeText { text: String },

    /// Tap a single key (normalized name)
    PressKey { key: String },

    /// Hold keys in order, then release in reverse (e.g. ctrl+c)
    PressCombo { keys: Vec<String> },

    /// Scroll the wheel `count` notches
    Scroll { direction: ScrollDirection, count: u32 },

    /// Capture the screen
    Screenshot,

    /// No pattern matched; carries the original text
    Unrecognized { text: String },
}

impl ActionDescriptor {
    /// Stable snake_case name of the action kind
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Click { .. } => "click",
            Self::RightClick { .. } => "right_click",
            Self::DoubleClick { .. } => "double_click",
            Self::MoveMouse { .. } => "move_mouse",
            Self::TypeText { .. } => "type_text",
            Self::PressKey { .. } => "press_key",
            Self::PressCombo { .. } => "press_combo",
            Self::Scroll { .. } => "scroll",
            Self::Screenshot => "screenshot",
            Self::Unrecognized { .. } => "unrecognized",
        }
    }

    /// Whether executing this action sends input to the OS
    pub fn is_mutating(&self) -> bool {
        !matches!(self, Self::Screenshot | Self::Unrecognized { .. })
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, Self::Unrecognized { .. })
    }

    /// Target coordinates for pointer actions
    pub fn position(&self) -> Option<(i32, i32)> {
        match *self {
            Self::Click { x, y }
            | Self::RightClick { x, y }
            | Self::DoubleClick { x, y }
            | Self::MoveMouse { x, y } => Some((x, y)),
            _ => None,
        }
    }
}

impl fmt::Display for ActionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Click { x, y } => write!(f, "click at ({}, {})", x, y),
            Self::RightClick { x, y } => write!(f, "right click at ({}, {})", x, y),
            Self::DoubleClick { x, y } => write!(f, "double click at ({}, {})", x, y),
            Self::MoveMouse { x, y } => write!(f, "move mouse to ({}, {})", x, y),
            Self::TypeText { text } => write!(f, "type '{}'", text),
            Self::PressKey { key } => write!(f, "press {}", key),
            Self::PressCombo { keys } => write!(f, "press {}", keys.join("+")),
            Self::Scroll { direction, count } => write!(f, "scroll {} {}", direction, count),
            Self::Screenshot => f.write_str("screenshot"),
            Self::Unrecognized { text } => write!(f, "unrecognized '{}'", text),
        }
    }
}
