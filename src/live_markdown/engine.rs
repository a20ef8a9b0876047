//! Live markdown engine
//!
//! Runs transform rules first and exit rules second, and turns whichever
//! fires into a single line edit. Every evaluation is timed against the
//! typing latency budget.

use log::warn;
use regex::Regex;
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use crate::config::Settings;
use crate::editor::CursorPosition;
use crate::live_markdown::exit_rules::evaluate_exit_rule;
use crate::live_markdown::rules::find_transform_rule;
use crate::live_markdown::types::{
    BlockContext, ExitAction, ExitBehavior, ExitCondition, ExitRuleResult, InputTrigger,
    TransformResult,
};

static_pattern!(ordered_prefix_pattern, r"^\d+\.\s");

/// Stateless rule evaluation plus latency bookkeeping.
#[derive(Debug, Clone)]
pub struct LiveMarkdownEngine {
    max_latency: Duration,
    last_latency: Duration,
}

impl Default for LiveMarkdownEngine {
    fn default() -> Self {
        Self::new(Settings::DEFAULT_TYPING_LATENCY_MS)
    }
}

impl LiveMarkdownEngine {
    pub fn new(max_latency_ms: u64) -> Self {
        Self {
            max_latency: Duration::from_millis(max_latency_ms),
            last_latency: Duration::ZERO,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.max_typing_latency_ms)
    }

    /// How long the most recent `process_input` took.
    pub fn last_latency(&self) -> Duration {
        self.last_latency
    }

    pub fn max_latency(&self) -> Duration {
        self.max_latency
    }

    /// Evaluate the rules for `line` under `trigger`.
    ///
    /// In vim mode nothing is transformed. A transform's caret lands on the
    /// caret's own line; an exit rule's continuation prefix is appended to
    /// the line to form the replacement.
    pub fn process_input(
        &mut self,
        line: &str,
        cursor: CursorPosition,
        trigger: InputTrigger,
        context: &BlockContext,
    ) -> TransformResult {
        let started = Instant::now();
        let result = Self::evaluate(line, cursor, trigger, context);
        self.finish(started);
        result
    }

    fn evaluate(
        line: &str,
        cursor: CursorPosition,
        trigger: InputTrigger,
        context: &BlockContext,
    ) -> TransformResult {
        if context.vim_mode {
            return TransformResult::unchanged();
        }

        if let Some(found) = find_transform_rule(line, cursor, context, trigger) {
            return TransformResult {
                transformed: true,
                replacement: found.result.replacement,
                new_cursor: found
                    .result
                    .new_cursor
                    .map(|at| CursorPosition::new(cursor.line, at.ch)),
                exit_actions: Vec::new(),
            };
        }

        let exit = evaluate_exit_rule(line, context, trigger);
        if !exit.matched {
            return TransformResult::unchanged();
        }

        let exit_actions = vec![exit_action(&exit)];
        let replacement = match (exit.replacement, exit.next_line_prefix) {
            (Some(replacement), _) => Some(replacement),
            (None, Some(prefix)) => Some(format!("{}{}", line, prefix)),
            (None, None) => None,
        };

        TransformResult {
            transformed: replacement.is_some(),
            replacement,
            new_cursor: exit.new_cursor,
            exit_actions,
        }
    }

    fn finish(&mut self, started: Instant) {
        self.last_latency = started.elapsed();
        if self.last_latency > self.max_latency {
            warn!(
                "Live markdown processing exceeded latency budget: {:?} > {:?}",
                self.last_latency, self.max_latency
            );
        }
    }
}

/// Classify an exit rule result by the block shape it produces.
///
/// Only leading indentation is stripped from a continuation prefix: the
/// trailing space is part of the `N. ` marker, so an ordered continuation
/// (`"    3. "`) maps to `Deindent`. Trimming both ends would drop that space
/// and classify every continuation as `ExitBlock`.
fn exit_action(result: &ExitRuleResult) -> ExitAction {
    if result.replacement.as_deref() == Some("") {
        return ExitAction {
            condition: ExitCondition::EmptyLine,
            action: ExitBehavior::RemoveBullet,
        };
    }

    let continues_ordered_list = result
        .next_line_prefix
        .as_deref()
        .is_some_and(|prefix| ordered_prefix_pattern().is_match(prefix.trim_start()));

    ExitAction {
        condition: ExitCondition::DoubleEnter,
        action: if continues_ordered_list {
            ExitBehavior::Deindent
        } else {
            ExitBehavior::ExitBlock
        },
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
