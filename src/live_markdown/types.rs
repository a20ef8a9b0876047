//! Shared types for live markdown rules

use crate::editor::CursorPosition;

// ─────────────────────────────────────────────────────────────────────────────
// Triggers & Context
// ─────────────────────────────────────────────────────────────────────────────

/// The kind of input that may set off a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputTrigger {
    Space,
    Enter,
    Backspace,
    Paste,
}

/// Block-level state around the line being edited.
///
/// Always derived fresh from the document; nothing is cached between calls.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BlockContext {
    /// 0-based line of the caret
    pub line_number: usize,
    /// Byte column of the caret
    pub column: usize,
    pub in_code_fence: bool,
    pub in_blockquote: bool,
    /// 0 outside lists, otherwise `indent / 2 + 1`
    pub list_depth: usize,
    /// Text of the line above, empty on the first line
    pub previous_line_text: String,
    pub vim_mode: bool,
}

// ─────────────────────────────────────────────────────────────────────────────
// Rule Identifiers
// ─────────────────────────────────────────────────────────────────────────────

/// Transform rules in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransformRuleId {
    CodeFence,
    HorizontalRule,
    Heading,
    OrderedList,
    UnorderedList,
    Blockquote,
}

impl TransformRuleId {
    /// All transform rules, highest precedence first.
    pub const PRECEDENCE: [TransformRuleId; 6] = [
        TransformRuleId::CodeFence,
        TransformRuleId::HorizontalRule,
        TransformRuleId::Heading,
        TransformRuleId::OrderedList,
        TransformRuleId::UnorderedList,
        TransformRuleId::Blockquote,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TransformRuleId::CodeFence => "code-fence",
            TransformRuleId::HorizontalRule => "horizontal-rule",
            TransformRuleId::Heading => "heading",
            TransformRuleId::OrderedList => "ordered-list",
            TransformRuleId::UnorderedList => "unordered-list",
            TransformRuleId::Blockquote => "blockquote",
        }
    }
}

/// Exit rules in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExitRuleId {
    EmptyListEnter,
    BlockquoteDoubleEnter,
    OrderedListContinue,
    CodeFenceClose,
}

impl ExitRuleId {
    pub const ORDER: [ExitRuleId; 4] = [
        ExitRuleId::EmptyListEnter,
        ExitRuleId::BlockquoteDoubleEnter,
        ExitRuleId::OrderedListContinue,
        ExitRuleId::CodeFenceClose,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExitRuleId::EmptyListEnter => "empty-list-enter",
            ExitRuleId::BlockquoteDoubleEnter => "blockquote-double-enter",
            ExitRuleId::OrderedListContinue => "ordered-list-continue",
            ExitRuleId::CodeFenceClose => "code-fence-close",
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Rule Results
// ─────────────────────────────────────────────────────────────────────────────

/// Outcome of a transform rule. `transformed == false` means no mutation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TransformRuleResult {
    pub transformed: bool,
    /// New text for the whole line
    pub replacement: Option<String>,
    /// Caret after the edit; `ch` is the end of the replacement
    pub new_cursor: Option<CursorPosition>,
    /// The line opened or closed a code fence
    pub toggle_code_fence: bool,
}

impl TransformRuleResult {
    /// A rewrite of the line with the caret placed after it.
    pub fn replaced(replacement: String) -> Self {
        let ch = replacement.len();
        Self {
            transformed: true,
            replacement: Some(replacement),
            new_cursor: Some(CursorPosition::new(0, ch)),
            toggle_code_fence: false,
        }
    }
}

/// A transform rule that fired.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformMatch {
    pub rule: TransformRuleId,
    pub result: TransformRuleResult,
}

/// Outcome of an exit rule.
///
/// When matched, `replacement` rewrites the current line (exit) while
/// `next_line_prefix` seeds the new line (continue).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExitRuleResult {
    pub matched: bool,
    pub rule: Option<ExitRuleId>,
    pub replacement: Option<String>,
    pub next_line_prefix: Option<String>,
    pub new_cursor: Option<CursorPosition>,
}

impl ExitRuleResult {
    pub fn no_match() -> Self {
        Self::default()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Engine Results
// ─────────────────────────────────────────────────────────────────────────────

/// What made an exit rule fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCondition {
    EmptyLine,
    DoubleEnter,
}

/// What an exit rule did to the block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitBehavior {
    RemoveBullet,
    Deindent,
    ExitBlock,
}

/// Summary of an exit rule for callers that only care about block shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitAction {
    pub condition: ExitCondition,
    pub action: ExitBehavior,
}

/// Result of one engine evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TransformResult {
    pub transformed: bool,
    /// New text for the current line
    pub replacement: Option<String>,
    /// Caret after the edit, on the caret's own line
    pub new_cursor: Option<CursorPosition>,
    /// Set when an exit rule produced this result
    pub exit_actions: Vec<ExitAction>,
}

impl TransformResult {
    pub fn unchanged() -> Self {
        Self::default()
    }
}
