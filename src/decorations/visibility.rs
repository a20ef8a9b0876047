//! Delimiter visibility
//!
//! Delimiters are hidden unless the user is working on them: inside a
//! selection, or within a small radius of a caret on the same line.
//! Decorations are a pure function of the document snapshot, so the same
//! input always yields the same output.

use std::collections::BTreeSet;
use std::ops::Range;

use crate::config::Settings;
use crate::decorations::delimiters::{scan_line, DelimiterToken};
use crate::string_utils::{step_back_chars, step_forward_chars, LineIndex};

/// Class of a delimiter away from the caret.
pub const DELIMITER_CLASS_HIDDEN: &str = "cm-md-delim-hidden";
/// Class of a delimiter the user is editing.
pub const DELIMITER_CLASS_REVEAL: &str = "cm-md-delim-reveal";
/// Characters on each side of a caret that reveal a delimiter.
pub const REVEAL_RADIUS_CHARS: usize = 1;

// ─────────────────────────────────────────────────────────────────────────────
// Inputs
// ─────────────────────────────────────────────────────────────────────────────

/// A selection in byte offsets. `from == to` is a caret.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionRange {
    pub from: usize,
    pub to: usize,
}

impl SelectionRange {
    /// Normalizes `anchor`/`head` so that `from <= to`.
    pub fn new(anchor: usize, head: usize) -> Self {
        Self {
            from: anchor.min(head),
            to: anchor.max(head),
        }
    }

    pub fn caret(offset: usize) -> Self {
        Self::new(offset, offset)
    }

    pub fn is_empty(&self) -> bool {
        self.from == self.to
    }
}

/// What the decorator sees of the editor.
#[derive(Debug, Clone, Copy)]
pub struct EditorSnapshot<'a> {
    pub document: &'a str,
    pub selections: &'a [SelectionRange],
    /// Byte ranges currently on screen
    pub visible_ranges: &'a [Range<usize>],
}

// ─────────────────────────────────────────────────────────────────────────────
// Outputs
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelimiterVisibility {
    Hidden,
    Reveal,
}

impl DelimiterVisibility {
    pub fn class(&self) -> &'static str {
        match self {
            DelimiterVisibility::Hidden => DELIMITER_CLASS_HIDDEN,
            DelimiterVisibility::Reveal => DELIMITER_CLASS_REVEAL,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelimiterDecoration {
    pub from: usize,
    pub to: usize,
    pub token: DelimiterToken,
    pub visibility: DelimiterVisibility,
}

/// Styling for text between paired delimiters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentDecoration {
    pub from: usize,
    pub to: usize,
    pub class: &'static str,
}

/// A class over a byte range, ready for the host to paint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkDecoration {
    pub from: usize,
    pub to: usize,
    pub class: &'static str,
}

/// All decorations for one snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DecorationSet {
    /// Sorted by start, end, then token order
    pub delimiters: Vec<DelimiterDecoration>,
    /// Sorted by start within each line
    pub content: Vec<ContentDecoration>,
}

impl DecorationSet {
    pub fn is_empty(&self) -> bool {
        self.delimiters.is_empty() && self.content.is_empty()
    }

    /// Delimiter and content marks merged in document order.
    pub fn marks(&self) -> Vec<MarkDecoration> {
        let mut marks: Vec<MarkDecoration> = self
            .delimiters
            .iter()
            .map(|d| MarkDecoration {
                from: d.from,
                to: d.to,
                class: d.visibility.class(),
            })
            .chain(self.content.iter().map(|c| MarkDecoration {
                from: c.from,
                to: c.to,
                class: c.class,
            }))
            .collect();
        marks.sort_by_key(|mark| (mark.from, mark.to));
        marks
    }

    pub fn revealed(&self) -> impl Iterator<Item = &DelimiterDecoration> {
        self.delimiters
            .iter()
            .filter(|d| d.visibility == DelimiterVisibility::Reveal)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Computation
// ─────────────────────────────────────────────────────────────────────────────

fn intersects(a: &Range<usize>, b: &Range<usize>) -> bool {
    a.start < b.end && a.end > b.start
}

/// 1-based lines touched by any selection.
fn active_lines(index: &LineIndex<'_>, selections: &[SelectionRange], len: usize) -> BTreeSet<usize> {
    selections
        .iter()
        .flat_map(|selection| {
            let first = index.line_at(selection.from.min(len));
            let last = index.line_at(selection.to.min(len));
            first..=last
        })
        .collect()
}

/// 1-based lines overlapping the visible byte ranges.
fn viewport_lines(index: &LineIndex<'_>, visible: &[Range<usize>], len: usize) -> BTreeSet<usize> {
    let mut lines = BTreeSet::new();
    for range in visible {
        let mut line = index.line_at(range.start.min(len));
        while line <= index.line_count() {
            match index.line_start(line) {
                Some(start) if start <= range.end => {
                    lines.insert(line);
                    line += 1;
                }
                _ => break,
            }
        }
    }
    lines
}

fn visibility(
    document: &str,
    span: Range<usize>,
    line: usize,
    selections: &[SelectionRange],
    active: &BTreeSet<usize>,
    radius: usize,
) -> DelimiterVisibility {
    let revealed = selections.iter().any(|selection| {
        if !selection.is_empty() {
            return intersects(&span, &(selection.from..selection.to));
        }
        if !active.contains(&line) {
            return false;
        }
        let window = step_back_chars(document, selection.from, radius)
            ..step_forward_chars(document, selection.to, radius + 1);
        intersects(&span, &window)
    });

    if revealed {
        DelimiterVisibility::Reveal
    } else {
        DelimiterVisibility::Hidden
    }
}

/// Decorations for the visible lines plus every line a selection touches.
pub fn compute_decorations(snapshot: &EditorSnapshot<'_>, reveal_radius: usize) -> DecorationSet {
    let document = snapshot.document;
    let index = LineIndex::new(document);
    let len = document.len();

    let active = active_lines(&index, snapshot.selections, len);
    let mut lines = viewport_lines(&index, snapshot.visible_ranges, len);
    lines.extend(active.iter().copied());

    let mut set = DecorationSet::default();
    for line in lines {
        let (Some(text), Some(line_from)) = (index.line_text(line), index.line_start(line)) else {
            continue;
        };
        let scan = scan_line(text, line_from, line);

        set.delimiters
            .extend(scan.delimiters.into_iter().map(|range| DelimiterDecoration {
                from: range.from,
                to: range.to,
                token: range.token,
                visibility: visibility(
                    document,
                    range.from..range.to,
                    range.line,
                    snapshot.selections,
                    &active,
                    reveal_radius,
                ),
            }));
        set.content
            .extend(scan.content.into_iter().map(|range| ContentDecoration {
                from: range.from,
                to: range.to,
                class: range.class,
            }));
    }
    set
}

// ─────────────────────────────────────────────────────────────────────────────
// Decorator
// ─────────────────────────────────────────────────────────────────────────────

/// Which parts of the editor state changed since the last update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ViewChanges {
    pub doc_changed: bool,
    pub selection_set: bool,
    pub viewport_changed: bool,
    pub focus_changed: bool,
}

impl ViewChanges {
    pub fn any(&self) -> bool {
        self.doc_changed || self.selection_set || self.viewport_changed || self.focus_changed
    }
}

/// Holds the current decorations and recomputes them when the view
/// changes in a way that matters.
///
/// Vim mode does not affect delimiter visibility.
#[derive(Debug, Clone)]
pub struct SemanticDelimiterDecorator {
    enabled: bool,
    reveal_radius: usize,
    decorations: DecorationSet,
}

impl Default for SemanticDelimiterDecorator {
    fn default() -> Self {
        Self::new(&Settings::default())
    }
}

impl SemanticDelimiterDecorator {
    pub fn new(settings: &Settings) -> Self {
        Self {
            enabled: settings.semantic_delimiters,
            reveal_radius: settings.reveal_radius_chars,
            decorations: DecorationSet::default(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Apply changed preferences and rebuild from `snapshot`.
    pub fn apply_settings(&mut self, settings: &Settings, snapshot: &EditorSnapshot<'_>) {
        self.enabled = settings.semantic_delimiters;
        self.reveal_radius = settings.reveal_radius_chars;
        self.rebuild(snapshot);
    }

    /// Build decorations for a freshly attached view.
    pub fn rebuild(&mut self, snapshot: &EditorSnapshot<'_>) {
        self.decorations = if self.enabled {
            compute_decorations(snapshot, self.reveal_radius)
        } else {
            DecorationSet::default()
        };
    }

    /// Recompute when the document, selection, viewport or focus changed.
    /// Returns whether the decorations were rebuilt.
    pub fn update(&mut self, changes: ViewChanges, snapshot: &EditorSnapshot<'_>) -> bool {
        if !self.enabled {
            self.decorations = DecorationSet::default();
            return false;
        }
        if !changes.any() {
            return false;
        }
        self.decorations = compute_decorations(snapshot, self.reveal_radius);
        true
    }

    pub fn decorations(&self) -> &DecorationSet {
        &self.decorations
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    /// Decorations for a document with everything visible and one caret.
    fn with_caret(document: &str, caret: usize) -> DecorationSet {
        with_selection(document, SelectionRange::caret(caret))
    }

    fn with_selection(document: &str, selection: SelectionRange) -> DecorationSet {
        let snapshot = EditorSnapshot {
            document,
            selections: &[selection],
            visible_ranges: &[0..document.len()],
        };
        compute_decorations(&snapshot, REVEAL_RADIUS_CHARS)
    }

    fn snapshot(document: &str, set: &DecorationSet) -> Vec<String> {
        set.delimiters
            .iter()
            .map(|d| format!("{}:{}", d.visibility.class(), &document[d.from..d.to]))
            .collect()
    }

    fn has(document: &str, set: &DecorationSet, text: &str, visibility: DelimiterVisibility) -> bool {
        count(document, set, text, visibility) > 0
    }

    fn count(document: &str, set: &DecorationSet, text: &str, visibility: DelimiterVisibility) -> usize {
        set.delimiters
            .iter()
            .filter(|d| d.visibility == visibility && &document[d.from..d.to] == text)
            .count()
    }

    fn offset_of(document: &str, needle: &str) -> usize {
        document.find(needle).unwrap()
    }

    use DelimiterVisibility::{Hidden, Reveal};

    #[test]
    fn test_inline_markers_hidden_off_caret_and_revealed_near_it() {
        let doc = "# Heading\nlead **bold** and _soft_\ntail";

        let away = with_caret(doc, 1);
        assert!(has(doc, &away, "**", Hidden));
        assert!(has(doc, &away, "_", Hidden));
        assert_eq!(count(doc, &away, "**", Reveal), 0);

        let bold = with_caret(doc, offset_of(doc, "**bold") + 1);
        assert!(has(doc, &bold, "**", Reveal));

        let soft = with_caret(doc, offset_of(doc, "_soft") + 1);
        assert!(has(doc, &soft, "_", Reveal));
    }

    #[test]
    fn test_code_links_and_strikethrough_follow_reveal_policy() {
        let doc = "line `code` [label](url) ~~gone~~";

        let start = with_caret(doc, 0);
        for marker in ["`", "[", "]", "(", ")", "~~"] {
            assert!(has(doc, &start, marker, Hidden), "{} should be hidden", marker);
        }

        let code = with_caret(doc, offset_of(doc, "`code") + 1);
        assert!(has(doc, &code, "`", Reveal));

        let label = with_caret(doc, offset_of(doc, "[label") + 1);
        assert!(has(doc, &label, "[", Reveal));
        assert_eq!(count(doc, &label, "]", Reveal), 0);

        let label_end = with_caret(doc, offset_of(doc, "](url") + 1);
        assert!(has(doc, &label_end, "]", Reveal));
        assert!(has(doc, &label_end, "(", Reveal));
        assert_eq!(count(doc, &label_end, ")", Reveal), 0);

        let url = with_caret(doc, offset_of(doc, "(url") + 1);
        assert!(has(doc, &url, "(", Reveal));
        assert_eq!(count(doc, &url, ")", Reveal), 0);

        let url_end = with_caret(doc, offset_of(doc, "url)") + 3);
        assert!(has(doc, &url_end, ")", Reveal));

        let gone = with_caret(doc, offset_of(doc, "~~gone") + 1);
        assert!(has(doc, &gone, "~~", Reveal));

        let selected = with_selection(
            doc,
            SelectionRange::new(offset_of(doc, "["), offset_of(doc, "]") + 1),
        );
        assert!(has(doc, &selected, "[", Reveal));
        assert!(has(doc, &selected, "]", Reveal));
    }

    #[test]
    fn test_same_state_reproduces_same_output() {
        let doc = "combo **bold** _soft_ `code`";
        let bold = offset_of(doc, "**bold") + 1;
        let soft = offset_of(doc, "_soft") + 1;
        let code = offset_of(doc, "`code") + 1;

        let baseline = with_caret(doc, bold);
        with_caret(doc, soft);
        assert_eq!(with_caret(doc, bold), baseline);
        with_caret(doc, code);
        assert_eq!(with_caret(doc, bold), baseline);
        assert_eq!(with_caret(doc, bold).marks(), baseline.marks());
    }

    #[test]
    fn test_list_and_quote_markers() {
        let doc = "1. first item\n> quote line";
        let quote_from = offset_of(doc, "> quote");

        let on_quote = with_caret(doc, quote_from + 3);
        assert!(has(doc, &on_quote, "1. ", Hidden));
        assert!(has(doc, &on_quote, "> ", Hidden));
        assert_eq!(count(doc, &on_quote, "1. ", Reveal), 0);

        assert!(has(doc, &with_caret(doc, 1), "1. ", Reveal));
        assert!(has(doc, &with_caret(doc, quote_from + 1), "> ", Reveal));
    }

    #[test]
    fn test_adjacent_inline_delimiters() {
        let doc = "mix **bold**_tight_ and ~~gone~~`code`";
        let set = with_caret(doc, 0);
        for marker in ["**", "_", "~~", "`"] {
            assert!(has(doc, &set, marker, Hidden), "{} should be hidden", marker);
        }
    }

    #[test]
    fn test_tilde_fences() {
        let doc = "~~~ts\nconst a = 1\n~~~";
        let set = with_caret(doc, 0);
        assert_eq!(count(doc, &set, "~~~", Reveal), 1);
        assert_eq!(count(doc, &set, "~~~", Hidden), 1);
    }

    #[test]
    fn test_caret_between_bold_and_soft() {
        let doc = "prefix **bold** and _soft_";
        let set = with_caret(doc, offset_of(doc, "_soft") + 1);
        assert_eq!(
            snapshot(doc, &set),
            vec![
                "cm-md-delim-hidden:**",
                "cm-md-delim-hidden:**",
                "cm-md-delim-reveal:_",
                "cm-md-delim-hidden:_",
            ]
        );
    }

    #[test]
    fn test_malformed_markdown_is_safe() {
        let doc = "broken **open and `tick and [label( plus ~~oops";
        for caret in [0, 12, 21, doc.len()] {
            let set = with_caret(doc, caret);
            assert_eq!(set.revealed().count(), 0);
            assert!(set.delimiters.is_empty());
        }

        let nested = "broken **outer _inner [label(`code ~~oops";
        let first = snapshot(nested, &with_caret(nested, 0));
        with_caret(nested, 12);
        let second = snapshot(nested, &with_caret(nested, 21));
        assert!(first.is_empty());
        assert_eq!(first, second);
    }

    #[test]
    fn test_heading_and_list_block_markers() {
        let doc = "# Heading\n- Item";
        let set = with_caret(doc, doc.len());
        assert_eq!(
            snapshot(doc, &set),
            vec!["cm-md-delim-hidden:# ", "cm-md-delim-hidden:- "]
        );
    }

    #[test]
    fn test_only_visible_and_active_lines_are_scanned() {
        let doc = "**a**\n**b**\n**c**";
        let snapshot = EditorSnapshot {
            document: doc,
            selections: &[SelectionRange::caret(offset_of(doc, "**c"))],
            visible_ranges: &[0..3],
        };
        let set = compute_decorations(&snapshot, REVEAL_RADIUS_CHARS);
        let lines: Vec<usize> = set
            .delimiters
            .iter()
            .map(|d| LineIndex::new(doc).line_at(d.from))
            .collect();
        assert_eq!(lines, vec![1, 1, 3, 3]);
    }

    #[test]
    fn test_selection_spanning_lines_marks_them_active() {
        let doc = "**a**\nplain\n**c**";
        let set = with_selection(doc, SelectionRange::new(doc.len(), 2));
        // Delimiters inside the selection are revealed, the one before it is not
        let visibilities: Vec<_> = set.delimiters.iter().map(|d| d.visibility).collect();
        assert_eq!(visibilities, vec![Hidden, Reveal, Reveal, Reveal]);
    }

    #[test]
    fn test_reveal_radius_counts_characters() {
        // Two-byte characters before the closing marker
        let doc = "*éé*";
        let closing = doc.len() - 1;
        // Caret two characters before the closing marker
        let caret = offset_of(doc, "é");
        let set = with_caret(doc, caret);
        assert_eq!(set.delimiters[1].from, closing);
        assert_eq!(set.delimiters[1].visibility, Hidden);

        let wide = compute_decorations(
            &EditorSnapshot {
                document: doc,
                selections: &[SelectionRange::caret(caret)],
                visible_ranges: &[0..doc.len()],
            },
            2,
        );
        assert_eq!(wide.delimiters[1].visibility, Reveal);
    }

    #[test]
    fn test_document_is_never_modified() {
        let doc = String::from("a **b** `c");
        let before = doc.clone();
        with_caret(&doc, 3);
        assert_eq!(doc, before);
    }

    #[test]
    fn test_marks_merge_content_in_order() {
        let doc = "**b**";
        let marks = with_caret(doc, doc.len()).marks();
        let classes: Vec<_> = marks.iter().map(|m| m.class).collect();
        assert_eq!(
            classes,
            vec![DELIMITER_CLASS_HIDDEN, "cm-strong", DELIMITER_CLASS_REVEAL]
        );
    }

    #[test]
    fn test_decorator_updates_only_on_relevant_changes() {
        let doc = "line **bold**";
        let mut decorator = SemanticDelimiterDecorator::default();
        let caret = [SelectionRange::caret(0)];
        let visible = [0..doc.len()];
        let snapshot = EditorSnapshot {
            document: doc,
            selections: &caret,
            visible_ranges: &visible,
        };

        assert!(!decorator.update(ViewChanges::default(), &snapshot));
        assert!(decorator.decorations().is_empty());

        let changes = ViewChanges {
            selection_set: true,
            ..ViewChanges::default()
        };
        assert!(decorator.update(changes, &snapshot));
        assert_eq!(decorator.decorations().delimiters.len(), 2);

        let settings = Settings {
            semantic_delimiters: false,
            ..Settings::default()
        };
        decorator.apply_settings(&settings, &snapshot);
        assert!(!decorator.is_enabled());
        assert!(decorator.decorations().is_empty());
        assert!(!decorator.update(changes, &snapshot));
    }

    #[test]
    fn test_vim_mode_keeps_visibility_active() {
        let doc = "line **bold**";
        let settings = Settings {
            vim_mode: true,
            ..Settings::default()
        };
        let mut decorator = SemanticDelimiterDecorator::new(&settings);
        let caret = [SelectionRange::caret(offset_of(doc, "**bold") + 1)];
        let visible = [0..doc.len()];
        decorator.rebuild(&EditorSnapshot {
            document: doc,
            selections: &caret,
            visible_ranges: &visible,
        });
        assert!(decorator.decorations().revealed().count() > 0);
    }
}
