//! User settings for the editor engine
//!
//! This module defines the `Settings` struct holding every preference the
//! core consults (live markdown, vim mode, scroll sync, layout, markdown
//! extensions), with serde support so hosts can store it as JSON.

use serde::{Deserialize, Serialize};

use crate::markdown::syntax::DEFAULT_LIGHT_THEME;
use crate::markdown::MarkdownOptions;

// ─────────────────────────────────────────────────────────────────────────────
// Layout Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// How the editor and preview panes are arranged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LayoutMode {
    /// Editor and preview side by side
    #[default]
    Split,
    /// Only one pane visible
    Single,
    /// Distraction-free editor only
    Focus,
    /// Narrow viewport, panes toggled rather than shown together
    Mobile,
}

impl LayoutMode {
    /// Whether both panes are on screen at once.
    pub fn shows_both_panes(&self) -> bool {
        matches!(self, LayoutMode::Split)
    }

    /// Get a display label for the layout.
    pub fn label(&self) -> &'static str {
        match self {
            LayoutMode::Split => "Split",
            LayoutMode::Single => "Single",
            LayoutMode::Focus => "Focus",
            LayoutMode::Mobile => "Mobile",
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Main Settings Struct
// ─────────────────────────────────────────────────────────────────────────────

/// User preferences consulted by the engine.
///
/// All fields have defaults via `Default` and `#[serde(default)]`, so a
/// partial or older config file still loads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // ─────────────────────────────────────────────────────────────────────────
    // Editing
    // ─────────────────────────────────────────────────────────────────────────
    /// Rewrite raw markdown syntax as the user types
    pub live_markdown: bool,

    /// Vim keybindings are active; live transforms stand down while on
    pub vim_mode: bool,

    /// Hide inline/block delimiters away from the caret
    pub semantic_delimiters: bool,

    /// How many characters around the caret reveal a hidden delimiter
    pub reveal_radius_chars: usize,

    /// Budget for one live-markdown evaluation before a warning is logged
    pub max_typing_latency_ms: u64,

    // ─────────────────────────────────────────────────────────────────────────
    // Layout & Scrolling
    // ─────────────────────────────────────────────────────────────────────────
    /// Pane arrangement
    pub layout: LayoutMode,

    /// Whether synchronized scrolling between editor and preview is enabled
    pub scroll_sync: bool,

    // ─────────────────────────────────────────────────────────────────────────
    // Preview Rendering
    // ─────────────────────────────────────────────────────────────────────────
    /// Markdown extensions used for the preview
    pub markdown: MarkdownOptions,

    /// syntect theme used to build the code-block stylesheet
    pub syntax_theme: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            live_markdown: true,
            vim_mode: false,
            semantic_delimiters: true,
            reveal_radius_chars: Self::DEFAULT_REVEAL_RADIUS,
            max_typing_latency_ms: Self::DEFAULT_TYPING_LATENCY_MS,
            layout: LayoutMode::default(),
            scroll_sync: true,
            markdown: MarkdownOptions::default(),
            syntax_theme: DEFAULT_LIGHT_THEME.to_string(),
        }
    }
}

impl Settings {
    pub const DEFAULT_REVEAL_RADIUS: usize = 1;
    pub const MAX_REVEAL_RADIUS: usize = 8;
    pub const DEFAULT_TYPING_LATENCY_MS: u64 = 16;
    pub const MIN_TYPING_LATENCY_MS: u64 = 1;
    pub const MAX_TYPING_LATENCY_MS: u64 = 1000;

    /// Whether scroll sync may run right now.
    ///
    /// Sync needs both panes on screen, so it is off on mobile, in focus
    /// mode and in single-pane mode regardless of the `scroll_sync` flag.
    pub fn is_scroll_sync_allowed(&self) -> bool {
        self.scroll_sync && self.layout.shows_both_panes()
    }

    /// Whether live markdown transforms should fire.
    pub fn is_live_markdown_active(&self) -> bool {
        self.live_markdown && !self.vim_mode
    }

    /// Clamp out-of-range values loaded from disk.
    pub fn sanitize(&mut self) {
        self.reveal_radius_chars = self.reveal_radius_chars.min(Self::MAX_REVEAL_RADIUS);
        self.max_typing_latency_ms = self
            .max_typing_latency_ms
            .clamp(Self::MIN_TYPING_LATENCY_MS, Self::MAX_TYPING_LATENCY_MS);
        if self.syntax_theme.trim().is_empty() {
            self.syntax_theme = DEFAULT_LIGHT_THEME.to_string();
        }
    }

    /// Parse settings from JSON and sanitize them.
    pub fn from_json_sanitized(json: &str) -> Result<Self, serde_json::Error> {
        let mut settings: Self = serde_json::from_str(json)?;
        settings.sanitize();
        Ok(settings)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert!(settings.live_markdown);
        assert!(!settings.vim_mode);
        assert!(settings.scroll_sync);
        assert_eq!(settings.layout, LayoutMode::Split);
        assert_eq!(settings.reveal_radius_chars, 1);
        assert_eq!(settings.max_typing_latency_ms, 16);
        assert_eq!(settings.syntax_theme, DEFAULT_LIGHT_THEME);
    }

    #[test]
    fn test_scroll_sync_gate_by_layout() {
        let mut settings = Settings::default();
        assert!(settings.is_scroll_sync_allowed());

        for layout in [LayoutMode::Single, LayoutMode::Focus, LayoutMode::Mobile] {
            settings.layout = layout;
            assert!(
                !settings.is_scroll_sync_allowed(),
                "sync must be off in {} layout",
                layout.label()
            );
        }

        settings.layout = LayoutMode::Split;
        settings.scroll_sync = false;
        assert!(!settings.is_scroll_sync_allowed());
    }

    #[test]
    fn test_vim_mode_disables_live_markdown() {
        let mut settings = Settings::default();
        assert!(settings.is_live_markdown_active());
        settings.vim_mode = true;
        assert!(!settings.is_live_markdown_active());
    }

    #[test]
    fn test_layout_serializes_lowercase() {
        let json = serde_json::to_string(&LayoutMode::Focus).unwrap();
        assert_eq!(json, "\"focus\"");
    }

    #[test]
    fn test_from_json_sanitized() {
        let json = r#"{"reveal_radius_chars": 99, "max_typing_latency_ms": 0, "syntax_theme": " "}"#;
        let settings = Settings::from_json_sanitized(json).unwrap();
        assert_eq!(settings.reveal_radius_chars, Settings::MAX_REVEAL_RADIUS);
        assert_eq!(
            settings.max_typing_latency_ms,
            Settings::MIN_TYPING_LATENCY_MS
        );
        assert_eq!(settings.syntax_theme, DEFAULT_LIGHT_THEME);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings = Settings::from_json_sanitized(r#"{"layout": "mobile"}"#).unwrap();
        assert_eq!(settings.layout, LayoutMode::Mobile);
        assert!(settings.live_markdown);
        assert_eq!(settings.markdown, MarkdownOptions::default());
    }
}
