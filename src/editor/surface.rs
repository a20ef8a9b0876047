//! The text-editing widget as seen by the engine
//!
//! The engine never owns a text widget. Hosts implement [`EditorSurface`]
//! for whatever widget they embed, and optionally [`LineGeometry`] when the
//! widget can report where lines are laid out.

use std::ops::Range;

use crate::string_utils::LineIndex;

// ─────────────────────────────────────────────────────────────────────────────
// Positions & Metrics
// ─────────────────────────────────────────────────────────────────────────────

/// Caret position: 0-based line and byte column within that line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CursorPosition {
    pub line: usize,
    pub ch: usize,
}

impl CursorPosition {
    pub fn new(line: usize, ch: usize) -> Self {
        Self { line, ch }
    }
}

/// Editor scroll metrics, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScrollInfo {
    /// Current scroll offset
    pub top: f32,
    /// Total scrollable content height
    pub height: f32,
    /// Visible viewport height
    pub client_height: f32,
}

impl ScrollInfo {
    /// Largest valid scroll offset.
    pub fn max_scroll(&self) -> f32 {
        (self.height - self.client_height).max(0.0)
    }
}

/// A laid-out line currently inside the viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineBlock {
    /// 1-based line number
    pub line: usize,
    /// Top of the line in content coordinates
    pub top: f32,
}

// ─────────────────────────────────────────────────────────────────────────────
// Traits
// ─────────────────────────────────────────────────────────────────────────────

/// Layout information some widgets can provide.
pub trait LineGeometry {
    /// Visible line blocks in ascending `top` order.
    fn viewport_line_blocks(&self) -> Vec<LineBlock>;

    /// Number of lines in the document.
    fn line_count(&self) -> usize;

    /// Top offset of a 1-based line; callers clamp `line` into range first.
    fn line_top(&self, line: usize) -> f32;
}

/// The host's text widget.
pub trait EditorSurface {
    /// Full document text.
    fn value(&self) -> String;

    /// Replace the full document text.
    fn set_value(&mut self, value: &str);

    /// Primary caret position.
    fn cursor(&self) -> CursorPosition;

    fn set_cursor(&mut self, position: CursorPosition);

    fn scroll_info(&self) -> ScrollInfo;

    /// Scroll so the content offset `top` is at the top of the viewport.
    fn scroll_to(&mut self, top: f32);

    fn has_focus(&self) -> bool;

    fn focus(&mut self);

    /// Layout access, when the widget exposes it.
    fn line_geometry(&self) -> Option<&dyn LineGeometry> {
        None
    }

    /// Replace a byte range of the document.
    ///
    /// The default goes through `value`/`set_value`; widgets with native
    /// range edits should override it.
    fn replace_range(&mut self, range: Range<usize>, text: &str) {
        let mut value = self.value();
        if range.start > range.end
            || range.end > value.len()
            || !value.is_char_boundary(range.start)
            || !value.is_char_boundary(range.end)
        {
            return;
        }
        value.replace_range(range, text);
        self.set_value(&value);
    }
}

/// Convert an absolute byte offset into a caret position.
pub fn cursor_at_offset(text: &str, offset: usize) -> CursorPosition {
    let index = LineIndex::new(text);
    let line = index.line_at(offset.min(text.len()));
    let start = index.line_start(line).unwrap_or(0);
    CursorPosition::new(line - 1, offset.min(text.len()) - start)
}

/// Convert a caret position into an absolute byte offset, clamped to the
/// document.
pub fn offset_of_cursor(text: &str, position: CursorPosition) -> usize {
    let index = LineIndex::new(text);
    let line = position.line + 1;
    match (index.line_start(line), index.line_text(line)) {
        (Some(start), Some(line_text)) => start + position.ch.min(line_text.len()),
        _ => text.len(),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
