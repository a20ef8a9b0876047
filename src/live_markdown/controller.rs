//! Live markdown controller
//!
//! Glue between an [`EditorSurface`] and the engine. Document changes are
//! inspected as they arrive, but any rewrite is queued and only applied on
//! [`LiveMarkdownController::flush`], outside the change that caused it.
//! Changes that arrive while a queued edit is being applied are ignored.

use log::debug;
use regex::Regex;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::ops::Range;
use std::sync::OnceLock;

use crate::config::Settings;
use crate::editor::{cursor_at_offset, EditorSurface};
use crate::live_markdown::context::derive_block_context;
use crate::live_markdown::engine::LiveMarkdownEngine;
use crate::live_markdown::types::InputTrigger;
use crate::string_utils::LineIndex;

static_pattern!(empty_list_line_pattern, r"^\s*(?:[-*+]|\d+\.)\s*$");
static_pattern!(empty_quote_line_pattern, r"^\s*>\s*$");

/// Classify the text inserted by a document change.
pub fn detect_trigger(inserted: &str) -> Option<InputTrigger> {
    if inserted.is_empty() {
        None
    } else if inserted == " " {
        Some(InputTrigger::Space)
    } else if inserted.contains('\n') {
        Some(InputTrigger::Enter)
    } else if inserted.chars().count() > 1 {
        Some(InputTrigger::Paste)
    } else {
        None
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Pending Edits
// ─────────────────────────────────────────────────────────────────────────────

/// A rewrite waiting to be applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingEdit {
    /// Byte range in the document the edit was computed against
    pub range: Range<usize>,
    /// Text the range held at that time
    pub expected: String,
    pub insert: String,
    /// Caret offset once the edit is applied
    pub cursor_offset: usize,
}

// ─────────────────────────────────────────────────────────────────────────────
// Controller
// ─────────────────────────────────────────────────────────────────────────────

/// Watches document changes and queues live markdown rewrites.
///
/// All state sits behind `Cell`/`RefCell` so a host can share the
/// controller through an `Rc` and call back into it from change handlers.
#[derive(Debug)]
pub struct LiveMarkdownController {
    engine: RefCell<LiveMarkdownEngine>,
    enabled: Cell<bool>,
    vim_mode: Cell<bool>,
    applying: Cell<bool>,
    pending: RefCell<VecDeque<PendingEdit>>,
}

impl Default for LiveMarkdownController {
    fn default() -> Self {
        Self::new(&Settings::default())
    }
}

impl LiveMarkdownController {
    pub fn new(settings: &Settings) -> Self {
        Self {
            engine: RefCell::new(LiveMarkdownEngine::from_settings(settings)),
            enabled: Cell::new(settings.live_markdown),
            vim_mode: Cell::new(settings.vim_mode),
            applying: Cell::new(false),
            pending: RefCell::new(VecDeque::new()),
        }
    }

    /// Pick up changed preferences.
    pub fn apply_settings(&self, settings: &Settings) {
        self.enabled.set(settings.live_markdown);
        self.vim_mode.set(settings.vim_mode);
        *self.engine.borrow_mut() = LiveMarkdownEngine::from_settings(settings);
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.set(enabled);
    }

    pub fn set_vim_mode(&self, vim_mode: bool) {
        self.vim_mode.set(vim_mode);
    }

    pub fn is_active(&self) -> bool {
        self.enabled.get() && !self.vim_mode.get()
    }

    /// True while a queued edit is being written to the editor.
    pub fn is_applying(&self) -> bool {
        self.applying.get()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.borrow().len()
    }

    /// Latency of the most recent rule evaluation.
    pub fn last_latency(&self) -> std::time::Duration {
        self.engine.borrow().last_latency()
    }

    /// Inspect a change the host has already applied to `editor`.
    ///
    /// `inserted` is the text the change inserted. Returns whether an edit
    /// was queued.
    pub fn on_document_change(&self, editor: &dyn EditorSurface, inserted: &str) -> bool {
        if !self.is_active() || self.applying.get() {
            return false;
        }
        let Some(trigger) = detect_trigger(inserted) else {
            return false;
        };

        let text = editor.value();
        let cursor = editor.cursor();
        let index = LineIndex::new(&text);
        let line_number = cursor.line + 1;
        let (Some(line_from), Some(line_text)) =
            (index.line_start(line_number), index.line_text(line_number))
        else {
            return false;
        };

        if trigger == InputTrigger::Enter && line_text.trim().is_empty() && cursor.line >= 1 {
            if let Some(edit) = Self::drop_empty_marker_line(&index, line_number, line_from) {
                self.queue(edit);
                return true;
            }
        }

        let lines: Vec<&str> = text.split('\n').collect();
        let context = derive_block_context(&lines, cursor.line, cursor.ch, self.vim_mode.get());
        let result = self
            .engine
            .borrow_mut()
            .process_input(line_text, cursor, trigger, &context);

        let Some(replacement) = result.replacement.filter(|_| result.transformed) else {
            return false;
        };
        if replacement == line_text {
            return false;
        }

        let cursor_ch = result
            .new_cursor
            .map(|at| at.ch)
            .unwrap_or(replacement.len());
        self.queue(PendingEdit {
            range: line_from..line_from + line_text.len(),
            expected: line_text.to_string(),
            cursor_offset: line_from + cursor_ch,
            insert: replacement,
        });
        true
    }

    /// Enter on a blank line below an empty list or quote marker removes
    /// the marker line.
    fn drop_empty_marker_line(
        index: &LineIndex<'_>,
        line_number: usize,
        line_from: usize,
    ) -> Option<PendingEdit> {
        let previous_text = index.line_text(line_number - 1)?;
        let previous_from = index.line_start(line_number - 1)?;
        let is_empty_marker = empty_list_line_pattern().is_match(previous_text)
            || empty_quote_line_pattern().is_match(previous_text);
        if !is_empty_marker {
            return None;
        }

        Some(PendingEdit {
            range: previous_from..line_from,
            expected: format!("{}\n", previous_text),
            insert: String::new(),
            cursor_offset: previous_from,
        })
    }

    fn queue(&self, edit: PendingEdit) {
        debug!(
            "Queued live markdown edit at {:?}: {:?}",
            edit.range, edit.insert
        );
        self.pending.borrow_mut().push_back(edit);
    }

    /// Apply queued edits in order. Returns how many were applied.
    ///
    /// Edits whose range no longer holds the text they were computed
    /// against are dropped.
    pub fn flush(&self, editor: &mut dyn EditorSurface) -> usize {
        let mut applied = 0;
        loop {
            let Some(edit) = self.pending.borrow_mut().pop_front() else {
                break;
            };

            let value = editor.value();
            if value.get(edit.range.clone()) != Some(edit.expected.as_str()) {
                debug!("Dropped stale live markdown edit at {:?}", edit.range);
                continue;
            }

            self.applying.set(true);
            editor.replace_range(edit.range.clone(), &edit.insert);
            let updated = editor.value();
            editor.set_cursor(cursor_at_offset(&updated, edit.cursor_offset));
            self.applying.set(false);
            applied += 1;
        }
        applied
    }

    /// Forget queued edits without applying them.
    pub fn clear_pending(&self) {
        self.pending.borrow_mut().clear();
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::{offset_of_cursor, CursorPosition, ScrollInfo};
    use std::rc::Rc;

    /// Text buffer editor. With a controller attached it reports its own
    /// edits back as a space insertion, like a host change listener would.
    #[derive(Default)]
    struct BufferEditor {
        text: String,
        cursor: CursorPosition,
        echo_to: Option<Rc<LiveMarkdownController>>,
        echo_results: Vec<bool>,
    }

    impl BufferEditor {
        fn with_text(text: &str) -> Self {
            let mut editor = Self {
                text: text.to_string(),
                ..Self::default()
            };
            editor.cursor = cursor_at_offset(text, text.len());
            editor
        }

        /// Insert at the caret the way typing does.
        fn type_text(&mut self, inserted: &str) {
            let offset = offset_of_cursor(&self.text, self.cursor);
            self.text.insert_str(offset, inserted);
            self.cursor = cursor_at_offset(&self.text, offset + inserted.len());
        }
    }

    impl EditorSurface for BufferEditor {
        fn value(&self) -> String {
            self.text.clone()
        }
        fn set_value(&mut self, value: &str) {
            self.text = value.to_string();
            if let Some(controller) = self.echo_to.clone() {
                let queued = controller.on_document_change(self, " ");
                self.echo_results.push(queued);
            }
        }
        fn cursor(&self) -> CursorPosition {
            self.cursor
        }
        fn set_cursor(&mut self, position: CursorPosition) {
            self.cursor = position;
        }
        fn scroll_info(&self) -> ScrollInfo {
            ScrollInfo::default()
        }
        fn scroll_to(&mut self, _top: f32) {}
        fn has_focus(&self) -> bool {
            true
        }
        fn focus(&mut self) {}
    }

    fn type_and_flush(controller: &LiveMarkdownController, editor: &mut BufferEditor, s: &str) {
        editor.type_text(s);
        controller.on_document_change(editor, s);
        controller.flush(editor);
    }

    #[test]
    fn test_detect_trigger() {
        assert_eq!(detect_trigger(""), None);
        assert_eq!(detect_trigger(" "), Some(InputTrigger::Space));
        assert_eq!(detect_trigger("\n"), Some(InputTrigger::Enter));
        assert_eq!(detect_trigger("a\nb"), Some(InputTrigger::Enter));
        assert_eq!(detect_trigger("pasted"), Some(InputTrigger::Paste));
        assert_eq!(detect_trigger("x"), None);
        assert_eq!(detect_trigger("é"), None);
    }

    #[test]
    fn test_space_rewrites_heading_on_flush() {
        let controller = LiveMarkdownController::default();
        let mut editor = BufferEditor::with_text("intro\n# ");

        editor.type_text(" ");
        assert!(controller.on_document_change(&editor, " "));
        // Nothing changes until the queue is flushed
        assert_eq!(editor.text, "intro\n#  ");
        assert_eq!(controller.pending_len(), 1);

        assert_eq!(controller.flush(&mut editor), 1);
        assert_eq!(editor.text, "intro\n# ");
        assert_eq!(editor.cursor, CursorPosition::new(1, 2));
        assert_eq!(controller.pending_len(), 0);
    }

    #[test]
    fn test_typing_heading_with_content() {
        let controller = LiveMarkdownController::default();
        let mut editor = BufferEditor::with_text("#  title");
        editor.cursor = CursorPosition::new(0, 2);

        type_and_flush(&controller, &mut editor, " ");
        // "#   title" normalizes and the caret lands at the end
        assert_eq!(editor.text, "# title");
        assert_eq!(editor.cursor, CursorPosition::new(0, 7));
    }

    #[test]
    fn test_enter_continues_ordered_list() {
        let controller = LiveMarkdownController::default();
        let mut editor = BufferEditor::with_text("1. first");

        type_and_flush(&controller, &mut editor, "\n");
        assert_eq!(editor.text, "1. first\n2. ");
        assert_eq!(editor.cursor, CursorPosition::new(1, 3));
    }

    #[test]
    fn test_enter_after_empty_item_removes_marker_line() {
        let controller = LiveMarkdownController::default();
        let mut editor = BufferEditor::with_text("- item\n- ");

        type_and_flush(&controller, &mut editor, "\n");
        assert_eq!(editor.text, "- item\n");
        assert_eq!(editor.cursor, CursorPosition::new(1, 0));
    }

    #[test]
    fn test_enter_after_empty_quote_removes_marker_line() {
        let controller = LiveMarkdownController::default();
        let mut editor = BufferEditor::with_text("> said\n>");

        type_and_flush(&controller, &mut editor, "\n");
        assert_eq!(editor.text, "> said\n");
    }

    #[test]
    fn test_disabled_or_vim_mode_is_inert() {
        let controller = LiveMarkdownController::default();
        controller.set_enabled(false);
        let mut editor = BufferEditor::with_text("# ");
        editor.type_text(" ");
        assert!(!controller.on_document_change(&editor, " "));

        controller.set_enabled(true);
        controller.set_vim_mode(true);
        assert!(!controller.on_document_change(&editor, " "));
        assert!(!controller.is_active());

        let settings = Settings::default();
        controller.apply_settings(&settings);
        assert!(controller.on_document_change(&editor, " "));
    }

    #[test]
    fn test_changes_during_apply_are_ignored() {
        let controller = Rc::new(LiveMarkdownController::default());
        let mut editor = BufferEditor::with_text("-  item");
        editor.cursor = CursorPosition::new(0, 2);
        editor.echo_to = Some(controller.clone());

        assert!(controller.on_document_change(&editor, " "));
        assert_eq!(controller.flush(&mut editor), 1);
        assert_eq!(editor.text, "- item");
        assert_eq!(editor.echo_results, vec![false]);
        assert_eq!(controller.pending_len(), 0);
        assert!(!controller.is_applying());
    }

    #[test]
    fn test_stale_edit_is_dropped() {
        let controller = LiveMarkdownController::default();
        let mut editor = BufferEditor::with_text("#  title");

        assert!(controller.on_document_change(&editor, " "));
        editor.text = "something else".to_string();
        assert_eq!(controller.flush(&mut editor), 0);
        assert_eq!(editor.text, "something else");
    }

    #[test]
    fn test_plain_typing_queues_nothing() {
        let controller = LiveMarkdownController::default();
        let mut editor = BufferEditor::with_text("hello");
        editor.type_text(" ");
        assert!(!controller.on_document_change(&editor, " "));
        editor.type_text("w");
        assert!(!controller.on_document_change(&editor, "w"));
        assert_eq!(controller.flush(&mut editor), 0);
    }

    #[test]
    fn test_clear_pending() {
        let controller = LiveMarkdownController::default();
        let editor = BufferEditor::with_text("#  title");
        controller.on_document_change(&editor, " ");
        controller.clear_pending();
        assert_eq!(controller.pending_len(), 0);
    }
}
