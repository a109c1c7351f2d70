//! Input backend abstraction.
//!
//! The executor talks to the operating system only through [`InputBackend`]:
//! - `NativeBackend` (feature `native`) drives the real mouse, keyboard and screen
//! - [`MockBackend`] simulates a screen in memory and records every call

use font8x8::{BASIC_FONTS, UnicodeFonts};
use image::{ImageBuffer, RgbImage};
use std::io::Cursor;

use super::types::{EngineError, EngineResult};
use crate::intent::{Key, MouseButton, ScrollDirection};
use crate::snapshot::CaptureResult;

/// Trait for OS input backends
///
/// Query methods (`screen_size`, `cursor_position`) are read-only; every
/// other method is an input or capture primitive with real side effects.
pub trait InputBackend {
    /// Source identifier used in screenshot names and metadata (e.g. "mock")
    fn source_type(&self) -> &str;

    /// Current screen size in pixels
    fn screen_size(&mut self) -> EngineResult<(u32, u32)>;

    /// Current pointer position
    fn cursor_position(&mut self) -> EngineResult<(i32, i32)>;

    /// Move the pointer to absolute coordinates
    fn move_to(&mut self, x: i32, y: i32) -> EngineResult<()>;

    /// Click `count` times at the current pointer position
    fn click(&mut self, button: MouseButton, count: u32) -> EngineResult<()>;

    /// Type a literal string
    fn type_text(&mut self, text: &str) -> EngineResult<()>;

    /// Press and release a single key
    fn key_tap(&mut self, key: Key) -> EngineResult<()>;

    /// Hold keys in order, then release them in reverse order
    fn key_combo(&mut self, keys: &[Key]) -> EngineResult<()>;

    /// Scroll the wheel `count` notches
    fn scroll(&mut self, direction: ScrollDirection, count: u32) -> EngineResult<()>;

    /// Capture the whole screen as PNG
    fn capture_screen(&mut self) -> EngineResult<CaptureResult>;
}

impl<B: InputBackend + ?Sized> InputBackend for Box<B> {
    fn source_type(&self) -> &str {
        (**self).source_type()
    }

    fn screen_size(&mut self) -> EngineResult<(u32, u32)> {
        (**self).screen_size()
    }

    fn cursor_position(&mut self) -> EngineResult<(i32, i32)> {
        (**self).cursor_position()
    }

    fn move_to(&mut self, x: i32, y: i32) -> EngineResult<()> {
        (**self).move_to(x, y)
    }

    fn click(&mut self, button: MouseButton, count: u32) -> EngineResult<()> {
        (**self).click(button, count)
    }

    fn type_text(&mut self, text: &str) -> EngineResult<()> {
        (**self).type_text(text)
    }

    fn key_tap(&mut self, key: Key) -> EngineResult<()> {
        (**self).key_tap(key)
    }

    fn key_combo(&mut self, keys: &[Key]) -> EngineResult<()> {
        (**self).key_combo(keys)
    }

    fn scroll(&mut self, direction: ScrollDirection, count: u32) -> EngineResult<()> {
        (**self).scroll(direction, count)
    }

    fn capture_screen(&mut self) -> EngineResult<CaptureResult> {
        (**self).capture_screen()
    }
}

/// A primitive call recorded by [`MockBackend`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    MoveTo { x: i32, y: i32 },
    Click { button: MouseButton, count: u32 },
    TypeText(String),
    KeyTap(Key),
    KeyCombo(Vec<Key>),
    Scroll { direction: ScrollDirection, count: u32 },
    Capture,
}

/// Largest mock screen side in pixels; larger requests are clamped
pub const MAX_MOCK_DIMENSION: u32 = 8192;

const BACKGROUND: [u8; 3] = [32, 36, 48];
const STATUS_BAR: [u8; 3] = [16, 18, 24];
const TEXT_COLOR: [u8; 3] = [230, 230, 230];
const LEFT_MARK: [u8; 3] = [220, 60, 60];
const RIGHT_MARK: [u8; 3] = [60, 120, 220];
const CURSOR_COLOR: [u8; 3] = [255, 255, 255];

/// In-memory screen for tests and dry runs
///
/// Keeps an RGB framebuffer that click marks are painted onto, a virtual
/// pointer, and the log of every primitive call. Captures render the
/// framebuffer plus a status line and the pointer:
/// - `calls()` - recorded primitives, in order
/// - `fail_with()` - make every primitive return an error
/// - `set_cursor()` - park the pointer (e.g. in a corner)
#[derive(Debug, Clone)]
pub struct MockBackend {
    /// Width in pixels
    width: u32,
    /// Height in pixels
    height: u32,
    /// RGB pixel buffer (row-major, 3 bytes per pixel)
    buffer: Vec<u8>,
    cursor: (i32, i32),
    /// Last typed text / keys, shown in the status line
    status: String,
    calls: Vec<BackendCall>,
    failure: Option<EngineError>,
    panic_message: Option<String>,
}

impl MockBackend {
    /// Create a mock screen with the pointer in the middle.
    ///
    /// Each side is clamped to `1..=MAX_MOCK_DIMENSION`.
    pub fn new(width: u32, height: u32) -> Self {
        let width = width.clamp(1, MAX_MOCK_DIMENSION);
        let height = height.clamp(1, MAX_MOCK_DIMENSION);
        let mut backend = Self {
            width,
            height,
            buffer: vec![0u8; width as usize * height as usize * 3],
            cursor: ((width / 2) as i32, (height / 2) as i32),
            status: String::new(),
            calls: Vec::new(),
            failure: None,
            panic_message: None,
        };
        backend.fill(BACKGROUND);
        backend
    }

    /// Make every primitive fail with `error` (queries keep working)
    pub fn fail_with(mut self, error: EngineError) -> Self {
        self.failure = Some(error);
        self
    }

    /// Make every primitive panic with `message`
    pub fn panic_with(mut self, message: impl Into<String>) -> Self {
        self.panic_message = Some(message.into());
        self
    }

    /// Park the pointer without recording a call, as if the user moved it
    pub fn set_cursor(&mut self, x: i32, y: i32) {
        self.cursor = (x, y);
    }

    /// Recorded primitive calls
    pub fn calls(&self) -> &[BackendCall] {
        &self.calls
    }

    /// Text shown in the status line of the next capture
    pub fn status(&self) -> &str {
        &self.status
    }

    /// Get the color of a pixel
    pub fn get_pixel(&self, x: u32, y: u32) -> [u8; 3] {
        if x >= self.width || y >= self.height {
            return [0, 0, 0];
        }
        let idx = pixel_index(self.width, x, y);
        [self.buffer[idx], self.buffer[idx + 1], self.buffer[idx + 2]]
    }

    fn record(&mut self, call: BackendCall) -> EngineResult<()> {
        self.calls.push(call);
        if let Some(message) = &self.panic_message {
            panic!("{}", message);
        }
        match &self.failure {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    fn fill(&mut self, color: [u8; 3]) {
        fill_buffer(&mut self.buffer, color);
    }

    fn mark_click(&mut self, button: MouseButton) {
        let color = match button {
            MouseButton::Left => LEFT_MARK,
            MouseButton::Right => RIGHT_MARK,
        };
        let (x, y) = self.cursor;
        let (x, y) = (x.max(2) as u32 - 2, y.max(2) as u32 - 2);
        let (width, height) = (self.width, self.height);
        draw_rect(&mut self.buffer, width, height, x, y, 5, 5, color);
    }

    /// Compose framebuffer, status line and pointer into a PNG
    fn render(&self) -> EngineResult<Vec<u8>> {
        let mut frame = self.buffer.clone();
        let (w, h) = (self.width, self.height);

        draw_rect(&mut frame, w, h, 0, 0, w, 12, STATUS_BAR);
        draw_text(&mut frame, w, h, 2, 2, &self.status, TEXT_COLOR, STATUS_BAR);

        let (cx, cy) = self.cursor;
        if cx >= 0 && cy >= 0 {
            let (cx, cy) = (cx as u32, cy as u32);
            draw_rect(&mut frame, w, h, cx.saturating_sub(4), cy, 9, 1, CURSOR_COLOR);
            draw_rect(&mut frame, w, h, cx, cy.saturating_sub(4), 1, 9, CURSOR_COLOR);
        }

        let img: RgbImage = ImageBuffer::from_raw(w, h, frame)
            .ok_or_else(|| EngineError::Capture("framebuffer size mismatch".to_string()))?;
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .map_err(|e| EngineError::Capture(format!("Failed to encode PNG: {}", e)))?;
        Ok(bytes)
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new(1920, 1080)
    }
}

impl InputBackend for MockBackend {
    fn source_type(&self) -> &str {
        "mock"
    }

    fn screen_size(&mut self) -> EngineResult<(u32, u32)> {
        Ok((self.width, self.height))
    }

    fn cursor_position(&mut self) -> EngineResult<(i32, i32)> {
        Ok(self.cursor)
    }

    fn move_to(&mut self, x: i32, y: i32) -> EngineResult<()> {
        self.record(BackendCall::MoveTo { x, y })?;
        self.cursor = (x, y);
        Ok(())
    }

    fn click(&mut self, button: MouseButton, count: u32) -> EngineResult<()> {
        self.record(BackendCall::Click { button, count })?;
        self.mark_click(button);
        Ok(())
    }

    fn type_text(&mut self, text: &str) -> EngineResult<()> {
        self.record(BackendCall::TypeText(text.to_string()))?;
        self.status = format!("typed: {}", text);
        Ok(())
    }

    fn key_tap(&mut self, key: Key) -> EngineResult<()> {
        self.record(BackendCall::KeyTap(key))?;
        self.status = format!("key: {}", key.name());
        Ok(())
    }

    fn key_combo(&mut self, keys: &[Key]) -> EngineResult<()> {
        self.record(BackendCall::KeyCombo(keys.to_vec()))?;
        let names: Vec<String> = keys.iter().map(Key::name).collect();
        self.status = format!("keys: {}", names.join("+"));
        Ok(())
    }

    fn scroll(&mut self, direction: ScrollDirection, count: u32) -> EngineResult<()> {
        self.record(BackendCall::Scroll { direction, count })?;
        self.status = format!("scrolled {} {}", direction, count);
        Ok(())
    }

    fn capture_screen(&mut self) -> EngineResult<CaptureResult> {
        self.record(BackendCall::Capture)?;
        let image_data = self.render()?;
        Ok(CaptureResult {
            image_data,
            width: self.width,
            height: self.height,
            metadata: Some(serde_json::json!({
                "mock": true,
                "cursor": [self.cursor.0, self.cursor.1],
            })),
        })
    }
}

/// Byte offset of pixel (x, y) in a row-major RGB buffer
fn pixel_index(width: u32, x: u32, y: u32) -> usize {
    (y as usize * width as usize + x as usize) * 3
}

fn fill_buffer(buffer: &mut [u8], color: [u8; 3]) {
    for chunk in buffer.chunks_exact_mut(3) {
        chunk.copy_from_slice(&color);
    }
}

fn set_pixel(buffer: &mut [u8], width: u32, height: u32, x: u32, y: u32, color: [u8; 3]) {
    if x >= width || y >= height {
        return;
    }
    let idx = pixel_index(width, x, y);
    buffer[idx..idx + 3].copy_from_slice(&color);
}

#[allow(clippy::too_many_arguments)]
fn draw_rect(
    buffer: &mut [u8],
    width: u32,
    height: u32,
    x: u32,
    y: u32,
    w: u32,
    h: u32,
    color: [u8; 3],
) {
    for py in y..y.saturating_add(h).min(height) {
        for px in x..x.saturating_add(w).min(width) {
            set_pixel(buffer, width, height, px, py, color);
        }
    }
}

/// Draw text using font8x8 glyphs; each character is 8x8 pixels, no wrapping
#[allow(clippy::too_many_arguments)]
fn draw_text(
    buffer: &mut [u8],
    width: u32,
    height: u32,
    x: u32,
    y: u32,
    text: &str,
    fg: [u8; 3],
    bg: [u8; 3],
) {
    let mut cursor_x = x;
    for ch in text.chars() {
        if cursor_x >= width {
            break;
        }
        let glyph = BASIC_FONTS.get(ch).unwrap_or([0u8; 8]);
        for (row_idx, row) in glyph.iter().enumerate() {
            let py = y + row_idx as u32;
            for bit in 0..8 {
                // font8x8 stores LSB as leftmost pixel
                let color = if (row >> bit) & 1 == 1 { fg } else { bg };
                set_pixel(buffer, width, height, cursor_x + bit, py, color);
            }
        }
        cursor_x += 8;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_mock_starts_centered() {
        let mut backend = MockBackend::new(100, 50);
        assert_eq!(backend.screen_size().unwrap(), (100, 50));
        assert_eq!(backend.cursor_position().unwrap(), (50, 25));
        assert!(backend.calls().is_empty());
        assert_eq!(backend.get_pixel(0, 0), BACKGROUND);
    }

    #[test]
    fn test_oversized_mock_is_clamped() {
        let mut backend = MockBackend::new(70_000, 0);
        assert_eq!(backend.screen_size().unwrap(), (MAX_MOCK_DIMENSION, 1));
        assert_eq!(backend.get_pixel(MAX_MOCK_DIMENSION - 1, 0), BACKGROUND);
        assert_eq!(backend.cursor_position().unwrap(), ((MAX_MOCK_DIMENSION / 2) as i32, 0));
    }

    #[test]
    fn test_mock_records_calls_in_order() {
        let mut backend = MockBackend::new(100, 100);
        backend.move_to(10, 20).unwrap();
        backend.click(MouseButton::Right, 1).unwrap();
        backend.type_text("Hi").unwrap();
        backend.key_combo(&[Key::Control, Key::Char('c')]).unwrap();

        assert_eq!(
            backend.calls(),
            &[
                BackendCall::MoveTo { x: 10, y: 20 },
                BackendCall::Click { button: MouseButton::Right, count: 1 },
                BackendCall::TypeText("Hi".to_string()),
                BackendCall::KeyCombo(vec![Key::Control, Key::Char('c')]),
            ]
        );
        assert_eq!(backend.cursor_position().unwrap(), (10, 20));
        assert_eq!(backend.status(), "keys: ctrl+c");
        assert_eq!(backend.get_pixel(10, 20), RIGHT_MARK);
    }

    #[test]
    fn test_mock_failure_injection() {
        let mut backend = MockBackend::new(10, 10)
            .fail_with(EngineError::PermissionDenied("no accessibility".into()));
        let err = backend.move_to(1, 1).unwrap_err();
        assert_eq!(err, EngineError::PermissionDenied("no accessibility".into()));
        // The pointer did not move, but the attempt is on record.
        assert_eq!(backend.cursor_position().unwrap(), (5, 5));
        assert_eq!(backend.calls().len(), 1);
    }

    #[test]
    fn test_mock_capture_is_png() {
        let mut backend = MockBackend::new(64, 32);
        backend.type_text("abc").unwrap();
        let result = backend.capture_screen().unwrap();

        assert_eq!(result.width, 64);
        assert_eq!(result.height, 32);
        assert_eq!(&result.image_data[0..4], &[0x89, 0x50, 0x4E, 0x47]);

        let decoded = image::load_from_memory(&result.image_data).unwrap().to_rgb8();
        assert_eq!(decoded.dimensions(), (64, 32));
        // Pointer crosshair at the center
        assert_eq!(decoded.get_pixel(32, 16).0, CURSOR_COLOR);
    }

    #[test]
    fn test_boxed_backend_delegates() {
        let mut backend: Box<dyn InputBackend> = Box::new(MockBackend::new(40, 30));
        assert_eq!(backend.source_type(), "mock");
        assert_eq!(backend.screen_size().unwrap(), (40, 30));
        backend.scroll(ScrollDirection::Down, 2).unwrap();
    }
}
