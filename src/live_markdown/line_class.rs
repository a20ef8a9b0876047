//! Line styling classes for markdown block lines

use regex::Regex;
use std::sync::OnceLock;

use crate::live_markdown::rules::horizontal_rule_marker;
use crate::string_utils::LineIndex;

static_pattern!(heading_pattern, r"^(\s*)(#{1,6})\s");
static_pattern!(unordered_list_pattern, r"^\s*[-*+]\s");
static_pattern!(ordered_list_pattern, r"^\s*\d+\.\s");
static_pattern!(blockquote_pattern, r"^\s*>\s?");
static_pattern!(code_fence_pattern, r"^\s*```");

/// Heading level of a line, 0 when it is not an ATX heading.
pub fn heading_level(text: &str) -> usize {
    heading_pattern()
        .captures(text)
        .map(|caps| caps[2].len())
        .unwrap_or(0)
}

/// CSS class for a whole line, if the line starts a markdown block.
pub fn line_class(text: &str) -> Option<String> {
    let level = heading_level(text);
    if level > 0 {
        return Some(format!("cm-livemd-heading cm-livemd-heading-{}", level));
    }

    let class = if unordered_list_pattern().is_match(text) {
        "cm-livemd-unordered-list"
    } else if ordered_list_pattern().is_match(text) {
        "cm-livemd-ordered-list"
    } else if blockquote_pattern().is_match(text) {
        "cm-livemd-blockquote"
    } else if code_fence_pattern().is_match(text) {
        "cm-livemd-code-fence"
    } else if horizontal_rule_marker(text, 0).is_some() {
        "cm-livemd-horizontal-rule"
    } else {
        return None;
    };
    Some(class.to_string())
}

/// A class attached to the start of a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineDecoration {
    /// 1-based line number
    pub line: usize,
    /// Byte offset of the line start
    pub from: usize,
    pub class: String,
}

/// Line classes for every line of `document`, in document order.
pub fn line_decorations(document: &str) -> Vec<LineDecoration> {
    let index = LineIndex::new(document);
    (1..=index.line_count())
        .filter_map(|line| {
            let text = index.line_text(line)?;
            let class = line_class(text)?;
            Some(LineDecoration {
                line,
                from: index.line_start(line)?,
                class,
            })
        })
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
