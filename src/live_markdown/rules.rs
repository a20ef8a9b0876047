//! Transform rules
//!
//! Each rule rewrites a line carrying loose, raw markdown syntax (a marker
//! followed by two or more spaces) into its canonical single-space form.
//! Rules fire on a space trigger only and are tried in fixed precedence;
//! the first rule that matches wins.

use regex::Regex;
use std::sync::OnceLock;

use crate::editor::CursorPosition;
use crate::live_markdown::types::{
    BlockContext, InputTrigger, TransformMatch, TransformRuleId, TransformRuleResult,
};

// ─────────────────────────────────────────────────────────────────────────────
// Patterns
// ─────────────────────────────────────────────────────────────────────────────

static_pattern!(heading_pattern, r"^(\s*)(#{1,})(\s{2,})(.*)$");
static_pattern!(unordered_list_pattern, r"^(\s*)([-*+])(\s{2,})(.*)$");
static_pattern!(ordered_list_pattern, r"^(\s*)(\d+)\.(\s{2,})(.*)$");
static_pattern!(blockquote_pattern, r"^(\s*)>(\s{2,})(.*)$");
static_pattern!(code_fence_pattern, r"^(\s*)(```|~~~)([A-Za-z0-9_-]*)\s{2,}$");
static_pattern!(ambiguous_heading_pattern, r"^#{1,6}[^#\s]");
static_pattern!(ambiguous_list_pattern, r"^(?:[-*+]|\d+\.)\S");
static_pattern!(ambiguous_quote_pattern, r"^>\S");

/// True when a marker is glued to the text after it (`#topic`, `-item`,
/// `1.x`, `>text`). Such lines are left alone.
pub fn is_ambiguous_raw_pattern(line: &str) -> bool {
    let trimmed = line.trim_start();
    if trimmed.is_empty() {
        return false;
    }

    ambiguous_heading_pattern().is_match(trimmed)
        || ambiguous_list_pattern().is_match(trimmed)
        || ambiguous_quote_pattern().is_match(trimmed)
}

/// Marker of a thematic break (`---`, `* * *`, `___`), if `line` is one.
///
/// The line is the marker repeated at least three times, optionally
/// separated by whitespace, followed by at least `min_trailing_whitespace`
/// whitespace characters.
pub fn horizontal_rule_marker(line: &str, min_trailing_whitespace: usize) -> Option<char> {
    let trimmed = line.trim_start();
    let marker = trimmed.chars().next().filter(|c| matches!(c, '-' | '*' | '_'))?;
    let rest = &trimmed[marker.len_utf8()..];
    let body = rest.trim_end();
    let trailing = rest[body.len()..].chars().count();

    let mut repeats = 0;
    for c in body.chars() {
        if c == marker {
            repeats += 1;
        } else if !c.is_whitespace() {
            return None;
        }
    }

    (repeats >= 2 && trailing >= min_trailing_whitespace).then_some(marker)
}

fn leading_whitespace(line: &str) -> &str {
    &line[..line.len() - line.trim_start().len()]
}

/// `<indent><marker> <content>`, keeping the trailing space when there is
/// no content yet.
fn canonical_line(indent: &str, marker: &str, content: &str) -> String {
    format!("{}{} {}", indent, marker, content)
}

// ─────────────────────────────────────────────────────────────────────────────
// Rules
// ─────────────────────────────────────────────────────────────────────────────

fn rule_matches(rule: TransformRuleId, line: &str, context: &BlockContext) -> bool {
    match rule {
        // The fence rule runs even inside a fence: it is what closes it.
        TransformRuleId::CodeFence => {
            code_fence_pattern().is_match(line) && !is_ambiguous_raw_pattern(line)
        }
        TransformRuleId::HorizontalRule => {
            !context.in_code_fence && horizontal_rule_marker(line, 2).is_some()
        }
        TransformRuleId::Heading => guarded(line, context) && heading_pattern().is_match(line),
        TransformRuleId::OrderedList => {
            guarded(line, context) && ordered_list_pattern().is_match(line)
        }
        TransformRuleId::UnorderedList => {
            guarded(line, context) && unordered_list_pattern().is_match(line)
        }
        TransformRuleId::Blockquote => {
            guarded(line, context) && blockquote_pattern().is_match(line)
        }
    }
}

fn guarded(line: &str, context: &BlockContext) -> bool {
    !context.in_code_fence && !is_ambiguous_raw_pattern(line)
}

fn apply(rule: TransformRuleId, line: &str) -> Option<TransformRuleResult> {
    let result = match rule {
        TransformRuleId::CodeFence => {
            let caps = code_fence_pattern().captures(line)?;
            let normalized = format!("{}{}{}", &caps[1], &caps[2], &caps[3]);
            TransformRuleResult {
                toggle_code_fence: true,
                ..TransformRuleResult::replaced(normalized)
            }
        }
        TransformRuleId::HorizontalRule => {
            let marker = horizontal_rule_marker(line, 2)?;
            let rule_text = marker.to_string().repeat(3);
            TransformRuleResult::replaced(format!("{}{}", leading_whitespace(line), rule_text))
        }
        TransformRuleId::Heading => {
            let caps = heading_pattern().captures(line)?;
            let level = caps[2].len().min(6);
            TransformRuleResult::replaced(canonical_line(&caps[1], &"#".repeat(level), &caps[4]))
        }
        TransformRuleId::OrderedList => {
            let caps = ordered_list_pattern().captures(line)?;
            let marker = format!("{}.", &caps[2]);
            TransformRuleResult::replaced(canonical_line(&caps[1], &marker, &caps[4]))
        }
        TransformRuleId::UnorderedList => {
            let caps = unordered_list_pattern().captures(line)?;
            TransformRuleResult::replaced(canonical_line(&caps[1], &caps[2], &caps[4]))
        }
        TransformRuleId::Blockquote => {
            let caps = blockquote_pattern().captures(line)?;
            TransformRuleResult::replaced(canonical_line(&caps[1], ">", &caps[3]))
        }
    };
    Some(result)
}

/// Find the highest-precedence transform rule for `line`.
///
/// Returns `None` when no rule applies, including for any trigger other
/// than space.
pub fn find_transform_rule(
    line: &str,
    _cursor: CursorPosition,
    context: &BlockContext,
    trigger: InputTrigger,
) -> Option<TransformMatch> {
    if trigger != InputTrigger::Space {
        return None;
    }

    TransformRuleId::PRECEDENCE
        .iter()
        .filter(|rule| rule_matches(**rule, line, context))
        .find_map(|rule| {
            apply(*rule, line)
                .filter(|result| result.transformed)
                .map(|result| TransformMatch { rule: *rule, result })
        })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::live_markdown::context::derive_block_context;

    fn transform(line: &str) -> Option<TransformMatch> {
        find_transform_rule(
            line,
            CursorPosition::new(0, line.len()),
            &BlockContext::default(),
            InputTrigger::Space,
        )
    }

    fn replacement(line: &str) -> Option<String> {
        transform(line).and_then(|m| m.result.replacement)
    }

    #[test]
    fn test_heading_normalizes_spacing() {
        let found = transform("#  title").unwrap();
        assert_eq!(found.rule, TransformRuleId::Heading);
        assert!(found.result.transformed);
        assert_eq!(found.result.replacement.as_deref(), Some("# title"));
        assert_eq!(found.result.new_cursor, Some(CursorPosition::new(0, 7)));
        assert_eq!(replacement("###   deep"), Some("### deep".to_string()));
    }

    #[test]
    fn test_deep_headings_normalize_and_clamp() {
        let found = transform("######  six").unwrap();
        assert_eq!(found.rule, TransformRuleId::Heading);
        assert_eq!(found.result.replacement.as_deref(), Some("###### six"));
        assert_eq!(replacement("##  title"), Some("## title".to_string()));
        assert_eq!(replacement("#######  seven"), Some("###### seven".to_string()));
    }

    #[test]
    fn test_heading_without_content_keeps_space() {
        assert_eq!(replacement("##  "), Some("## ".to_string()));
    }

    #[test]
    fn test_lists_and_quotes() {
        assert_eq!(replacement("-  item"), Some("- item".to_string()));
        assert_eq!(replacement("  *   nested"), Some("  * nested".to_string()));
        assert_eq!(replacement("3.  third"), Some("3. third".to_string()));
        assert_eq!(replacement(">  quoted"), Some("> quoted".to_string()));
        assert_eq!(transform(">  quoted").unwrap().rule, TransformRuleId::Blockquote);
        assert_eq!(transform("3.  third").unwrap().rule, TransformRuleId::OrderedList);
    }

    #[test]
    fn test_single_space_is_already_canonical() {
        assert!(transform("# title").is_none());
        assert!(transform("- item").is_none());
        assert!(transform("plain text  ").is_none());
    }

    #[test]
    fn test_ambiguous_patterns_are_left_alone() {
        assert!(transform("#topic").is_none());
        assert!(is_ambiguous_raw_pattern("#topic"));
        assert!(is_ambiguous_raw_pattern("  -item"));
        assert!(is_ambiguous_raw_pattern("1.x"));
        assert!(is_ambiguous_raw_pattern(">text"));
        assert!(!is_ambiguous_raw_pattern("# title"));
        assert!(is_ambiguous_raw_pattern("###deep"));
        assert!(!is_ambiguous_raw_pattern("##  title"));
        assert!(!is_ambiguous_raw_pattern("######  six"));
        assert!(!is_ambiguous_raw_pattern(""));
        assert!(!is_ambiguous_raw_pattern("   "));
    }

    #[test]
    fn test_code_fence_normalizes_and_toggles() {
        let found = transform("```ts  ").unwrap();
        assert_eq!(found.rule, TransformRuleId::CodeFence);
        assert_eq!(found.result.replacement.as_deref(), Some("```ts"));
        assert!(found.result.toggle_code_fence);

        assert_eq!(replacement("~~~ts  "), Some("~~~ts".to_string()));
        assert_eq!(replacement("  ```  "), Some("  ```".to_string()));
    }

    #[test]
    fn test_horizontal_rule_normalizes_to_three_markers() {
        let found = transform("-----  ").unwrap();
        assert_eq!(found.rule, TransformRuleId::HorizontalRule);
        assert_eq!(found.result.replacement.as_deref(), Some("---"));
        assert_eq!(replacement("* * *  "), Some("***".to_string()));
        assert_eq!(replacement("  ___  "), Some("  ___".to_string()));
        // One trailing space is not a trigger
        assert!(transform("--- ").is_none());
        // Mixed markers are not a rule
        assert!(horizontal_rule_marker("-*-  ", 2).is_none());
    }

    #[test]
    fn test_horizontal_rule_marker_trailing_requirement() {
        assert_eq!(horizontal_rule_marker("---", 0), Some('-'));
        assert_eq!(horizontal_rule_marker("- - -", 0), Some('-'));
        assert_eq!(horizontal_rule_marker("--", 0), None);
        assert_eq!(horizontal_rule_marker("---", 2), None);
        assert_eq!(horizontal_rule_marker("--- x", 0), None);
    }

    #[test]
    fn test_no_transforms_inside_fence() {
        let lines = ["~~~ts", "#  heading"];
        let context = derive_block_context(&lines, 1, 10, false);
        assert!(context.in_code_fence);

        let found = find_transform_rule(
            "#  heading",
            CursorPosition::new(1, 10),
            &context,
            InputTrigger::Space,
        );
        assert!(found.is_none());
    }

    #[test]
    fn test_only_space_triggers_transforms() {
        for trigger in [InputTrigger::Enter, InputTrigger::Backspace, InputTrigger::Paste] {
            let found = find_transform_rule(
                "#  title",
                CursorPosition::new(0, 8),
                &BlockContext::default(),
                trigger,
            );
            assert!(found.is_none());
        }
    }

    #[test]
    fn test_transforms_are_deterministic() {
        for _ in 0..3 {
            assert_eq!(replacement("#  title"), Some("# title".to_string()));
        }
    }
}
