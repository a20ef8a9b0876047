//! Block context derivation
//!
//! Fence state is replayed from the first line on every call. Callers only
//! ask on trigger events, so the linear scan is acceptable.

use regex::Regex;
use std::sync::OnceLock;

use crate::live_markdown::types::BlockContext;

static_pattern!(fence_toggle_pattern, r"^\s*(?:```|~~~)");
static_pattern!(blockquote_pattern, r"^\s*>");
static_pattern!(list_item_pattern, r"^(\s*)(?:[-*+]|\d+\.)\s+");

/// Nesting depth of a list item line, 0 when the line is not one.
pub fn list_depth(line: &str) -> usize {
    list_item_pattern()
        .captures(line)
        .map(|caps| caps[1].len() / 2 + 1)
        .unwrap_or(0)
}

/// Derive the block context of the 0-based `line_number` in `lines`.
///
/// Out-of-range lines are treated as empty.
pub fn derive_block_context(
    lines: &[&str],
    line_number: usize,
    column: usize,
    vim_mode: bool,
) -> BlockContext {
    let in_code_fence = lines
        .iter()
        .take(line_number.saturating_add(1))
        .filter(|line| fence_toggle_pattern().is_match(line))
        .count()
        % 2
        == 1;

    let current_line = lines.get(line_number).copied().unwrap_or("");
    let previous_line_text = line_number
        .checked_sub(1)
        .and_then(|prev| lines.get(prev))
        .copied()
        .unwrap_or("")
        .to_string();

    BlockContext {
        line_number,
        column,
        in_code_fence,
        in_blockquote: blockquote_pattern().is_match(current_line),
        list_depth: list_depth(current_line),
        previous_line_text,
        vim_mode,
    }
}

/// Derive the context for a position in a whole document.
pub fn derive_block_context_for_text(
    text: &str,
    line_number: usize,
    column: usize,
    vim_mode: bool,
) -> BlockContext {
    let lines: Vec<&str> = text.split('\n').collect();
    derive_block_context(&lines, line_number, column, vim_mode)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
