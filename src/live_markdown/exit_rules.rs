//! Exit rules
//!
//! Enter-triggered rules that end or continue a block: an empty list or
//! quote item is cleared instead of repeated, an ordered item continues
//! with the next index, and a closing fence stops prefixing new lines.

use regex::Regex;
use std::sync::OnceLock;

use crate::editor::CursorPosition;
use crate::live_markdown::types::{BlockContext, ExitRuleId, ExitRuleResult, InputTrigger};

static_pattern!(empty_list_item_pattern, r"^(\s*)(?:[-*+]|\d+\.)\s*$");
static_pattern!(ordered_item_with_content_pattern, r"^(\s*)(\d+)\.\s+\S.*$");
static_pattern!(empty_blockquote_pattern, r"^(\s*)>\s*$");
static_pattern!(quote_line_pattern, r"^\s*>");
static_pattern!(closing_fence_pattern, r"^\s*```[A-Za-z0-9_-]*\s*$");

fn rule_matches(rule: ExitRuleId, line: &str, context: &BlockContext) -> bool {
    match rule {
        ExitRuleId::EmptyListEnter => {
            !context.in_code_fence && empty_list_item_pattern().is_match(line)
        }
        ExitRuleId::BlockquoteDoubleEnter => {
            !context.in_code_fence
                && empty_blockquote_pattern().is_match(line)
                && quote_line_pattern().is_match(&context.previous_line_text)
        }
        ExitRuleId::OrderedListContinue => {
            !context.in_code_fence
                && ordered_item_with_content_pattern().is_match(&context.previous_line_text)
        }
        ExitRuleId::CodeFenceClose => {
            context.in_code_fence && closing_fence_pattern().is_match(line)
        }
    }
}

fn apply(rule: ExitRuleId, context: &BlockContext) -> ExitRuleResult {
    match rule {
        ExitRuleId::EmptyListEnter | ExitRuleId::BlockquoteDoubleEnter => ExitRuleResult {
            matched: true,
            rule: Some(rule),
            replacement: Some(String::new()),
            new_cursor: Some(CursorPosition::new(0, 0)),
            ..ExitRuleResult::default()
        },
        ExitRuleId::OrderedListContinue => {
            let Some(caps) = ordered_item_with_content_pattern().captures(&context.previous_line_text)
            else {
                return ExitRuleResult::no_match();
            };
            // Indices too large to parse restart the list
            let next_index = caps[2].parse::<u64>().map(|n| n.saturating_add(1)).unwrap_or(1);
            ExitRuleResult {
                matched: true,
                rule: Some(rule),
                next_line_prefix: Some(format!("{}{}. ", &caps[1], next_index)),
                ..ExitRuleResult::default()
            }
        }
        ExitRuleId::CodeFenceClose => ExitRuleResult {
            matched: true,
            rule: Some(rule),
            next_line_prefix: Some(String::new()),
            ..ExitRuleResult::default()
        },
    }
}

/// Evaluate exit rules in order for `line`; the first match wins.
pub fn evaluate_exit_rule(
    line: &str,
    context: &BlockContext,
    trigger: InputTrigger,
) -> ExitRuleResult {
    if trigger != InputTrigger::Enter {
        return ExitRuleResult::no_match();
    }

    ExitRuleId::ORDER
        .iter()
        .filter(|rule| rule_matches(**rule, line, context))
        .map(|rule| apply(*rule, context))
        .find(|result| result.matched)
        .unwrap_or_default()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
