//! Real OS backend: `enigo` for input, `xcap` for screen capture.

use enigo::{Axis, Button, Coordinate, Direction, Enigo, Keyboard, Mouse, Settings};
use std::io::Cursor;

use super::backend::InputBackend;
use super::types::{EngineError, EngineResult};
use crate::intent::{Key, MouseButton, ScrollDirection};
use crate::snapshot::CaptureResult;

/// Backend driving the real mouse, keyboard and primary monitor
pub struct NativeBackend {
    enigo: Enigo,
}

impl NativeBackend {
    /// Connect to the platform input system.
    ///
    /// Fails when there is no display server or input injection is not
    /// permitted (e.g. missing accessibility permission on macOS).
    pub fn new() -> EngineResult<Self> {
        let enigo = Enigo::new(&Settings::default())
            .map_err(|e| EngineError::from_backend_message(e.to_string()))?;
        tracing::debug!("native input backend connected");
        Ok(Self { enigo })
    }
}

fn input_error(err: enigo::InputError) -> EngineError {
    EngineError::from_backend_message(err.to_string())
}

fn to_enigo_key(key: Key) -> EngineResult<enigo::Key> {
    use enigo::Key as K;
    let mapped = match key {
        Key::Enter => K::Return,
        Key::Space => K::Space,
        Key::Tab => K::Tab,
        Key::Escape => K::Escape,
        Key::Delete => K::Delete,
        Key::Backspace => K::Backspace,
        #[cfg(not(target_os = "macos"))]
        Key::Insert => K::Insert,
        #[cfg(target_os = "macos")]
        Key::Insert => {
            return Err(EngineError::Backend("the insert key is not available on macOS".into()));
        }
        Key::CapsLock => K::CapsLock,
        Key::Control => K::Control,
        Key::Alt => K::Alt,
        Key::Shift => K::Shift,
        Key::Win | Key::Command => K::Meta,
        Key::Function(n) => match n {
            1 => K::F1,
            2 => K::F2,
            3 => K::F3,
            4 => K::F4,
            5 => K::F5,
            6 => K::F6,
            7 => K::F7,
            8 => K::F8,
            9 => K::F9,
            10 => K::F10,
            11 => K::F11,
            12 => K::F12,
            other => return Err(EngineError::Backend(format!("unsupported function key f{}", other))),
        },
        Key::Up => K::UpArrow,
        Key::Down => K::DownArrow,
        Key::Left => K::LeftArrow,
        Key::Right => K::RightArrow,
        Key::Home => K::Home,
        Key::End => K::End,
        Key::PageUp => K::PageUp,
        Key::PageDown => K::PageDown,
        Key::Char(c) => K::Unicode(c),
    };
    Ok(mapped)
}

impl InputBackend for NativeBackend {
    fn source_type(&self) -> &str {
        "native"
    }

    fn screen_size(&mut self) -> EngineResult<(u32, u32)> {
        let (w, h) = self.enigo.main_display().map_err(input_error)?;
        Ok((w.max(0) as u32, h.max(0) as u32))
    }

    fn cursor_position(&mut self) -> EngineResult<(i32, i32)> {
        self.enigo.location().map_err(input_error)
    }

    fn move_to(&mut self, x: i32, y: i32) -> EngineResult<()> {
        self.enigo.move_mouse(x, y, Coordinate::Abs).map_err(input_error)
    }

    fn click(&mut self, button: MouseButton, count: u32) -> EngineResult<()> {
        let button = match button {
            MouseButton::Left => Button::Left,
            MouseButton::Right => Button::Right,
        };
        for _ in 0..count {
            self.enigo.button(button, Direction::Click).map_err(input_error)?;
        }
        Ok(())
    }

    fn type_text(&mut self, text: &str) -> EngineResult<()> {
        self.enigo.text(text).map_err(input_error)
    }

    fn key_tap(&mut self, key: Key) -> EngineResult<()> {
        let key = to_enigo_key(key)?;
        self.enigo.key(key, Direction::Click).map_err(input_error)
    }

    fn key_combo(&mut self, keys: &[Key]) -> EngineResult<()> {
        let keys = keys
            .iter()
            .map(|k| to_enigo_key(*k))
            .collect::<EngineResult<Vec<_>>>()?;

        let mut pressed = Vec::with_capacity(keys.len());
        let mut outcome = Ok(());
        for key in &keys {
            match self.enigo.key(*key, Direction::Press) {
                Ok(()) => pressed.push(*key),
                Err(e) => {
                    outcome = Err(input_error(e));
                    break;
                }
            }
        }
        // Release whatever went down, even after a failed press.
        for key in pressed.iter().rev() {
            if let Err(e) = self.enigo.key(*key, Direction::Release) {
                tracing::warn!(error = %e, "failed to release key");
            }
        }
        outcome
    }

    fn scroll(&mut self, direction: ScrollDirection, count: u32) -> EngineResult<()> {
        let notches = i32::try_from(count)
            .map_err(|_| EngineError::Backend(format!("scroll count {} too large", count)))?;
        let length = match direction {
            ScrollDirection::Up => -notches,
            ScrollDirection::Down => notches,
        };
        self.enigo.scroll(length, Axis::Vertical).map_err(input_error)
    }

    fn capture_screen(&mut self) -> EngineResult<CaptureResult> {
        let monitors =
            xcap::Monitor::all().map_err(|e| EngineError::Capture(e.to_string()))?;
        let monitor = monitors
            .into_iter()
            .next()
            .ok_or_else(|| EngineError::NoDisplay("no monitor found".to_string()))?;
        let captured = monitor
            .capture_image()
            .map_err(|e| EngineError::Capture(e.to_string()))?;

        let (width, height) = (captured.width(), captured.height());
        let img = image::RgbaImage::from_raw(width, height, captured.into_raw())
            .ok_or_else(|| EngineError::Capture("captured buffer size mismatch".to_string()))?;

        let mut image_data = Vec::new();
        img.write_to(&mut Cursor::new(&mut image_data), image::ImageFormat::Png)
            .map_err(|e| EngineError::Capture(format!("Failed to encode PNG: {}", e)))?;

        Ok(CaptureResult {
            image_data,
            width,
            height,
            metadata: Some(serde_json::json!({ "capture": "xcap", "monitor_index": 0 })),
        })
    }
}
