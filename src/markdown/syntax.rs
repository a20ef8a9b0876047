//! Syntax highlighting for fenced code in the preview
//!
//! Code blocks are highlighted with syntect into *classed* HTML spans, so
//! the colors come from a stylesheet generated once per theme rather than
//! being inlined into every render.

use log::debug;
use std::fmt::Write as _;
use std::sync::OnceLock;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::html::{css_for_theme_with_class_style, ClassStyle, ClassedHTMLGenerator};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;

use crate::error::{Error, Result};

// ─────────────────────────────────────────────────────────────────────────────
// Constants
// ─────────────────────────────────────────────────────────────────────────────

/// Default dark theme name from syntect's built-in themes
pub const DEFAULT_DARK_THEME: &str = "base16-ocean.dark";

/// Default light theme name from syntect's built-in themes
pub const DEFAULT_LIGHT_THEME: &str = "InspiredGitHub";

/// Class style shared by the generator and the stylesheet
const CLASS_STYLE: ClassStyle = ClassStyle::Spaced;

// ─────────────────────────────────────────────────────────────────────────────
// Syntax Highlighter
// ─────────────────────────────────────────────────────────────────────────────

/// Holds the loaded syntect sets, which are expensive to build.
pub struct SyntaxHighlighter {
    syntax_set: SyntaxSet,
    theme_set: ThemeSet,
}

impl Default for SyntaxHighlighter {
    fn default() -> Self {
        Self::new()
    }
}

impl SyntaxHighlighter {
    pub fn new() -> Self {
        debug!("Loading syntect syntax and theme sets");
        let syntax_set = SyntaxSet::load_defaults_newlines();
        let theme_set = ThemeSet::load_defaults();
        debug!(
            "Loaded {} syntaxes and {} themes",
            syntax_set.syntaxes().len(),
            theme_set.themes.len()
        );
        Self {
            syntax_set,
            theme_set,
        }
    }

    /// Get a theme by name.
    pub fn theme(&self, name: &str) -> Option<&Theme> {
        self.theme_set.themes.get(name)
    }

    /// Whether a fence language maps to a known syntax.
    pub fn supports_language(&self, language: &str) -> bool {
        self.find_syntax_for_language(language).is_some()
    }

    /// Highlight `code` as `language` into classed HTML spans.
    ///
    /// Returns `Ok(None)` when the language is unknown so the caller can emit
    /// escaped plain text instead.
    pub fn highlight_to_html(&self, code: &str, language: &str) -> Result<Option<String>> {
        let Some(syntax) = self.find_syntax_for_language(language) else {
            debug!("No syntax found for language: {}", language);
            return Ok(None);
        };

        let mut generator =
            ClassedHTMLGenerator::new_with_class_style(syntax, &self.syntax_set, CLASS_STYLE);
        for line in LinesWithEndings::from(code) {
            generator
                .parse_html_for_line_which_includes_newline(line)
                .map_err(Error::render)?;
        }
        Ok(Some(generator.finalize()))
    }

    /// CSS rules for the classed spans under the named theme.
    ///
    /// Unknown theme names fall back to the default light theme.
    pub fn stylesheet(&self, theme_name: &str) -> Result<String> {
        let theme = self
            .theme(theme_name)
            .or_else(|| self.theme(DEFAULT_LIGHT_THEME))
            .ok_or_else(|| Error::render(format!("no syntax theme named '{}'", theme_name)))?;
        css_for_theme_with_class_style(theme, CLASS_STYLE).map_err(Error::render)
    }

    /// Find syntax definition for a fence language identifier.
    ///
    /// Tries common aliases mapped to extensions, then the syntax name.
    fn find_syntax_for_language(&self, language: &str) -> Option<&SyntaxReference> {
        if language.is_empty() {
            return None;
        }

        let lang_lower = language.to_lowercase();
        let extension = match lang_lower.as_str() {
            "rust" | "rs" => "rs",
            "python" | "py" => "py",
            "javascript" | "js" | "mjs" => "js",
            "c" | "h" => "c",
            "cpp" | "c++" | "cxx" => "cpp",
            "csharp" | "c#" | "cs" => "cs",
            "java" => "java",
            "go" | "golang" => "go",
            "ruby" | "rb" => "rb",
            "php" => "php",
            "scala" => "scala",
            "html" | "htm" => "html",
            "css" => "css",
            "json" => "json",
            "yaml" | "yml" => "yaml",
            "xml" => "xml",
            "markdown" | "md" => "md",
            "sql" => "sql",
            "shell" | "sh" | "bash" | "zsh" => "sh",
            "makefile" | "make" => "Makefile",
            "lua" => "lua",
            "perl" | "pl" => "pl",
            "r" => "r",
            "haskell" | "hs" => "hs",
            "erlang" | "erl" => "erl",
            "clojure" | "clj" => "clj",
            "diff" | "patch" => "diff",
            other => other,
        };

        self.syntax_set
            .find_syntax_by_extension(extension)
            .or_else(|| self.syntax_set.find_syntax_by_name(language))
            .or_else(|| {
                self.syntax_set
                    .syntaxes()
                    .iter()
                    .find(|syntax| syntax.name.to_lowercase() == lang_lower)
            })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// HTML Helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Escape text for inclusion in HTML element content or attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Render a fenced code block as `<pre><code>` HTML.
///
/// Known languages get highlighted spans and a `language-*` class; anything
/// else, or a highlighting failure, becomes escaped plain text.
pub fn render_code_block(code: &str, language: &str) -> String {
    let highlighted = match get_highlighter().highlight_to_html(code, language) {
        Ok(html) => html,
        Err(e) => {
            debug!("Highlighting '{}' failed, using plain text: {}", language, e);
            None
        }
    };

    let mut html = String::new();
    // Writing into a String cannot fail
    let _ = match highlighted {
        Some(body) => write!(
            html,
            "<pre><code class=\"hljs language-{}\">{}</code></pre>\n",
            escape_html(language),
            body
        ),
        None => write!(
            html,
            "<pre><code class=\"hljs\">{}</code></pre>\n",
            escape_html(code)
        ),
    };
    html
}

// ─────────────────────────────────────────────────────────────────────────────
// Global Highlighter Instance
// ─────────────────────────────────────────────────────────────────────────────

static HIGHLIGHTER: OnceLock<SyntaxHighlighter> = OnceLock::new();

/// Get or create the global syntax highlighter.
pub fn get_highlighter() -> &'static SyntaxHighlighter {
    HIGHLIGHTER.get_or_init(SyntaxHighlighter::new)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
