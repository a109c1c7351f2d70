//! Ordered pattern table turning command text into an [`ActionDescriptor`].
//!
//! Routes are evaluated top to bottom and the first route whose regex matches
//! *and* whose extractor accepts the captures wins. Order is significant:
//! "right click at 1, 2" also matches the plain click pattern, and
//! "press ctrl+c" also matches the single-key pattern.

use regex::{Captures, Regex};
use std::sync::LazyLock;

use super::keys::normalize_key_name;
use super::types::{ActionDescriptor, ScrollDirection};

/// Scroll notches used when a command does not say how far to scroll
pub const DEFAULT_SCROLL_COUNT: u32 = 3;

/// `x, y` / `x,y` / `x y` / `(x, y)`, optionally after "at" and "position"
const COORDS: &str = r"(?:at\s+)?(?:position\s+)?\(?\s*(?P<x>\d+)(?:\s*,\s*|\s+)(?P<y>\d+)\s*\)?";

type Extractor = fn(&Captures<'_>, u32) -> Option<ActionDescriptor>;

/// One entry of the pattern table
struct Route {
    name: &'static str,
    regex: Regex,
    extract: Extractor,
}

impl Route {
    fn new(name: &'static str, pattern: &str, extract: Extractor) -> Self {
        let regex = Regex::new(&format!("(?i){}", pattern))
            .unwrap_or_else(|e| panic!("built-in pattern '{}' failed to compile: {}", name, e));
        Self { name, regex, extract }
    }
}

static ROUTES: LazyLock<Vec<Route>> = LazyLock::new(|| {
    vec![
        // Quoted literals are matched first so their contents never trigger
        // another route.
        Route::new(
            "type_text",
            r#"\b(?:type|write|enter|input)\s+(?:"(?P<dq>[^"]+)"|'(?P<sq>[^']+)')"#,
            |c, _| {
                let text = c.name("dq").or_else(|| c.name("sq"))?.as_str();
                Some(ActionDescriptor::TypeText { text: text.to_string() })
            },
        ),
        Route::new("right_click", &format!(r"\bright[\s-]*click\s+{}", COORDS), |c, _| {
            let (x, y) = coords(c)?;
            Some(ActionDescriptor::RightClick { x, y })
        }),
        Route::new("double_click", &format!(r"\bdouble[\s-]*click\s+{}", COORDS), |c, _| {
            let (x, y) = coords(c)?;
            Some(ActionDescriptor::DoubleClick { x, y })
        }),
        Route::new("click", &format!(r"\b(?:left[\s-]*)?click\s+{}", COORDS), |c, _| {
            let (x, y) = coords(c)?;
            Some(ActionDescriptor::Click { x, y })
        }),
        Route::new(
            "press_combo",
            r"\b(?:press|hit)\s+(?:the\s+)?(?P<keys>\w+(?:\s*\+\s*\w+)+)(?:\s+keys?)?",
            |c, _| combo(c),
        ),
        Route::new(
            "press_key",
            r"\b(?:press|hit)\s+(?:the\s+)?(?P<key>\w+)(?:\s+key)?",
            |c, _| {
                let key = normalize_key_name(c.name("key")?.as_str());
                Some(ActionDescriptor::PressKey { key })
            },
        ),
        Route::new("bare_combo", r"\b(?P<keys>\w+(?:\s*\+\s*\w+)+)", |c, _| combo(c)),
        Route::new(
            "scroll_counted",
            r"\bscroll\s+(?P<count>\d+)(?:\s+times?)?\s+(?P<dir>up|down)\b",
            |c, _| {
                let direction = ScrollDirection::from_str(c.name("dir")?.as_str())?;
                let count = positive(c.name("count")?.as_str())?;
                Some(ActionDescriptor::Scroll { direction, count })
            },
        ),
        Route::new(
            "scroll",
            r"\bscroll\s+(?P<dir>up|down)\b(?:\s+(?:by\s+)?(?P<count>\d+))?",
            |c, default_count| {
                let direction = ScrollDirection::from_str(c.name("dir")?.as_str())?;
                let count = match c.name("count") {
                    Some(m) => positive(m.as_str())?,
                    None => default_count,
                };
                Some(ActionDescriptor::Scroll { direction, count })
            },
        ),
        Route::new(
            "move_mouse",
            &format!(
                r"\bmove\s+(?:the\s+)?(?:(?:mouse|cursor|pointer)\s+)?(?:to\s+)?{}",
                COORDS
            ),
            |c, _| {
                let (x, y) = coords(c)?;
                Some(ActionDescriptor::MoveMouse { x, y })
            },
        ),
        Route::new(
            "screenshot",
            r"\b(?:take\s+(?:a\s+)?screenshot|capture\s+(?:the\s+)?screen|screenshot)\b",
            |_, _| Some(ActionDescriptor::Screenshot),
        ),
    ]
});

fn coords(c: &Captures<'_>) -> Option<(i32, i32)> {
    let x = c.name("x")?.as_str().parse().ok()?;
    let y = c.name("y")?.as_str().parse().ok()?;
    Some((x, y))
}

fn positive(value: &str) -> Option<u32> {
    value.parse::<u32>().ok().filter(|n| *n >= 1)
}

fn combo(c: &Captures<'_>) -> Option<ActionDescriptor> {
    let keys: Vec<String> = c
        .name("keys")?
        .as_str()
        .split('+')
        .map(normalize_key_name)
        .collect();
    if keys.len() < 2 || keys.iter().any(|k| k.is_empty()) {
        return None;
    }
    Some(ActionDescriptor::PressCombo { keys })
}

/// Example phrasings per action family
pub const ACTION_EXAMPLES: &[(&str, &[&str])] = &[
    (
        "click",
        &[
            "click at 100, 200",
            "left click at position (300, 400)",
            "right click at 150, 250",
            "double click at 500, 600",
        ],
    ),
    (
        "type",
        &[
            "type \"Hello World\"",
            "write \"This is a test\"",
            "enter \"some text here\"",
            "input \"username123\"",
        ],
    ),
    ("key", &["press enter", "hit the space key", "press ctrl+c", "alt+tab"]),
    ("scroll", &["scroll up", "scroll down 5", "scroll 3 times up"]),
    (
        "move",
        &["move mouse to 100, 200", "move cursor to position (300, 400)"],
    ),
    ("screenshot", &["take a screenshot", "capture screen", "screenshot"]),
];

/// Stateless command interpreter
#[derive(Debug, Clone)]
pub struct IntentParser {
    default_scroll_count: u32,
}

impl IntentParser {
    pub fn new() -> Self {
        Self {
            default_scroll_count: DEFAULT_SCROLL_COUNT,
        }
    }

    /// Set the scroll count used when a command omits it (clamped to at least 1)
    pub fn with_default_scroll_count(mut self, count: u32) -> Self {
        self.default_scroll_count = count.max(1);
        self
    }

    pub fn default_scroll_count(&self) -> u32 {
        self.default_scroll_count
    }

    /// Interpret one line of text.
    ///
    /// Never fails: text that matches no route comes back as
    /// [`ActionDescriptor::Unrecognized`] carrying the input unchanged.
    pub fn interpret(&self, text: &str) -> ActionDescriptor {
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            for route in ROUTES.iter() {
                let Some(captures) = route.regex.captures(trimmed) else {
                    continue;
                };
                match (route.extract)(&captures, self.default_scroll_count) {
                    Some(action) => {
                        tracing::debug!(route = route.name, %action, "command matched");
                        return action;
                    }
                    None => {
                        tracing::debug!(route = route.name, "pattern matched but parameters rejected");
                    }
                }
            }
        }

        tracing::debug!(text, "command not recognized");
        ActionDescriptor::Unrecognized {
            text: text.to_string(),
        }
    }

    /// Example commands grouped by action family
    pub fn examples(&self) -> &'static [(&'static str, &'static [&'static str])] {
        ACTION_EXAMPLES
    }

    /// Names of the routes in evaluation order
    pub fn route_names(&self) -> Vec<&'static str> {
        ROUTES.iter().map(|r| r.name).collect()
    }
}

impl Default for IntentParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Interpret with the default scroll count
pub fn interpret(text: &str) -> ActionDescriptor {
    IntentParser::new().interpret(text)
}

/// Render the first `per_family` examples of each family as a help block
pub fn format_examples(per_family: usize) -> String {
    let mut lines = vec!["Example commands:".to_string()];
    for (family, commands) in ACTION_EXAMPLES {
        lines.push(format!("  {}:", family.to_uppercase()));
        for command in commands.iter().take(per_family) {
            lines.push(format!("    - {}", command));
        }
    }
    lines.join("\n")
}
