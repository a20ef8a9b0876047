//! Live markdown
//!
//! Rewrites raw markdown syntax into canonical form while the user types,
//! and handles Enter at the edges of lists, quotes and code fences.

mod context;
mod controller;
mod engine;
mod exit_rules;
mod line_class;
mod rules;
mod types;

pub use context::{derive_block_context, derive_block_context_for_text, list_depth};
pub use controller::{detect_trigger, LiveMarkdownController, PendingEdit};
pub use engine::LiveMarkdownEngine;
pub use exit_rules::evaluate_exit_rule;
pub use line_class::{heading_level, line_class, line_decorations, LineDecoration};
pub use rules::{find_transform_rule, horizontal_rule_marker, is_ambiguous_raw_pattern};
pub use types::{
    BlockContext, ExitAction, ExitBehavior, ExitCondition, ExitRuleId, ExitRuleResult,
    InputTrigger, TransformMatch, TransformResult, TransformRuleId, TransformRuleResult,
};
