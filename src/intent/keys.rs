//! Key names: alias normalization for the interpreter and the known-key set
//! the executor validates against.

use serde::{Deserialize, Serialize};

/// A key the executor knows how to send
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    Enter,
    Space,
    Tab,
    Escape,
    Delete,
    Backspace,
    Insert,
    CapsLock,
    Control,
    Alt,
    Shift,
    /// Windows / Super key
    Win,
    /// macOS Command key
    Command,
    /// F1..=F12
    Function(u8),
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    /// A single printable ASCII character
    Char(char),
}

impl Key {
    /// Resolve a normalized key name. Aliases are accepted as well, so names
    /// coming straight from a hand-built descriptor validate the same way.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = normalize_key_name(name);
        let key = match name.as_str() {
            "enter" => Self::Enter,
            "space" => Self::Space,
            "tab" => Self::Tab,
            "esc" => Self::Escape,
            "delete" => Self::Delete,
            "backspace" => Self::Backspace,
            "insert" => Self::Insert,
            "capslock" => Self::CapsLock,
            "ctrl" => Self::Control,
            "alt" => Self::Alt,
            "shift" => Self::Shift,
            "win" => Self::Win,
            "cmd" => Self::Command,
            "up" => Self::Up,
            "down" => Self::Down,
            "left" => Self::Left,
            "right" => Self::Right,
            "home" => Self::Home,
            "end" => Self::End,
            "pageup" => Self::PageUp,
            "pagedown" => Self::PageDown,
            other => {
                if let Some(n) = other.strip_prefix('f').and_then(|n| n.parse::<u8>().ok()) {
                    if (1..=12).contains(&n) {
                        return Some(Self::Function(n));
                    }
                    return None;
                }
                let mut chars = other.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) if c.is_ascii_graphic() => Self::Char(c),
                    _ => return None,
                }
            }
        };
        Some(key)
    }

    /// Canonical name, the inverse of [`Key::from_name`]
    pub fn name(&self) -> String {
        match self {
            Self::Enter => "enter".into(),
            Self::Space => "space".into(),
            Self::Tab => "tab".into(),
            Self::Escape => "esc".into(),
            Self::Delete => "delete".into(),
            Self::Backspace => "backspace".into(),
            Self::Insert => "insert".into(),
            Self::CapsLock => "capslock".into(),
            Self::Control => "ctrl".into(),
            Self::Alt => "alt".into(),
            Self::Shift => "shift".into(),
            Self::Win => "win".into(),
            Self::Command => "cmd".into(),
            Self::Function(n) => format!("f{}", n),
            Self::Up => "up".into(),
            Self::Down => "down".into(),
            Self::Left => "left".into(),
            Self::Right => "right".into(),
            Self::Home => "home".into(),
            Self::End => "end".into(),
            Self::PageUp => "pageup".into(),
            Self::PageDown => "pagedown".into(),
            Self::Char(c) => c.to_string(),
        }
    }
}

/// Map common spellings of a key to its canonical name.
///
/// Unknown names pass through lowercased; the executor decides whether they
/// are sendable.
pub fn normalize_key_name(name: &str) -> String {
    let lowered = name.trim().to_lowercase();
    let canonical = match lowered.as_str() {
        "return" => "enter",
        "spacebar" => "space",
        "escape" => "esc",
        "del" => "delete",
        "control" => "ctrl",
        "option" => "alt",
        "command" => "cmd",
        "windows" | "super" => "win",
        "pgup" => "pageup",
        "pgdn" => "pagedown",
        "arrowup" => "up",
        "arrowdown" => "down",
        "arrowleft" => "left",
        "arrowright" => "right",
        _ => return lowered,
    };
    canonical.to_string()
}

/// Resolve every name in a combo, reporting the first one that is unknown
pub fn resolve_keys(names: &[String]) -> Result<Vec<Key>, String> {
    names
        .iter()
        .map(|name| Key::from_name(name).ok_or_else(|| name.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aliases() {
        assert_eq!(normalize_key_name("Return"), "enter");
        assert_eq!(normalize_key_name("ESCAPE"), "esc");
        assert_eq!(normalize_key_name("control"), "ctrl");
        assert_eq!(normalize_key_name("windows"), "win");
        assert_eq!(normalize_key_name("pagedown"), "pagedown");
        assert_eq!(normalize_key_name("banana"), "banana");
    }

    #[test]
    fn test_known_keys() {
        assert_eq!(Key::from_name("enter"), Some(Key::Enter));
        assert_eq!(Key::from_name("f5"), Some(Key::Function(5)));
        assert_eq!(Key::from_name("f13"), None);
        assert_eq!(Key::from_name("c"), Some(Key::Char('c')));
        assert_eq!(Key::from_name("banana"), None);
        assert_eq!(Key::from_name(""), None);
    }

    #[test]
    fn test_name_roundtrip() {
        for name in ["enter", "esc", "ctrl", "f12", "pagedown", "x", "7"] {
            assert_eq!(Key::from_name(name).unwrap().name(), name);
        }
    }

    #[test]
    fn test_resolve_keys_reports_unknown() {
        let names = vec!["ctrl".to_string(), "bogus".to_string()];
        assert_eq!(resolve_keys(&names), Err("bogus".to_string()));
        let names = vec!["ctrl".to_string(), "c".to_string()];
        assert_eq!(resolve_keys(&names), Ok(vec![Key::Control, Key::Char('c')]));
    }
}
