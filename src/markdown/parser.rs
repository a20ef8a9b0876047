//! Markdown rendering with source anchors, using comrak
//!
//! Every top-level block of the document is rendered on its own and wrapped
//! in an element whose id and `data-source-line-*` attributes record the
//! source lines it came from. Those anchors are what the preview source map
//! is measured from.

use comrak::{
    format_html, markdown_to_html,
    nodes::{AstNode, NodeValue},
    parse_document, Arena, Options,
};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::markdown::syntax::render_code_block;

// ─────────────────────────────────────────────────────────────────────────────
// Options
// ─────────────────────────────────────────────────────────────────────────────

/// Markdown extensions for the preview renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkdownOptions {
    /// Enable GitHub Flavored Markdown tables
    pub tables: bool,
    /// Enable strikethrough syntax (~~text~~)
    pub strikethrough: bool,
    /// Turn bare URLs and emails into links
    pub autolink: bool,
    /// Enable task lists (- [ ] and - [x])
    pub tasklist: bool,
    /// Enable footnotes
    pub footnotes: bool,
    /// Render single newlines inside a paragraph as `<br>`
    pub hard_breaks: bool,
    /// Typographic quotes, dashes and ellipses
    pub smart_punctuation: bool,
    /// Front matter fence; `None` renders a leading `---` block as markdown
    pub front_matter_delimiter: Option<String>,
    /// Strip raw HTML and dangerous URLs
    pub safe_html: bool,
}

impl Default for MarkdownOptions {
    fn default() -> Self {
        Self {
            tables: true,
            strikethrough: true,
            autolink: true,
            tasklist: true,
            footnotes: true,
            hard_breaks: true,
            smart_punctuation: true,
            front_matter_delimiter: None,
            safe_html: true,
        }
    }
}

impl MarkdownOptions {
    /// Convert to comrak Options.
    fn to_comrak_options(&self) -> Options {
        let mut options = Options::default();

        options.extension.strikethrough = self.strikethrough;
        options.extension.table = self.tables;
        options.extension.autolink = self.autolink;
        options.extension.tasklist = self.tasklist;
        options.extension.footnotes = self.footnotes;
        options.extension.front_matter_delimiter = self.front_matter_delimiter.clone();

        options.parse.smart = self.smart_punctuation;

        options.render.hardbreaks = self.hard_breaks;
        options.render.unsafe_ = !self.safe_html;

        options
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Render Output
// ─────────────────────────────────────────────────────────────────────────────

/// A rendered block and the source lines it covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockAnchor {
    /// First source line, 1-based and inclusive
    pub line_start: usize,
    /// Last source line, inclusive
    pub line_end: usize,
    /// Id of the wrapping element in the rendered HTML
    pub element_id: String,
}

/// HTML plus the anchors embedded in it, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkdownRenderResult {
    pub html: String,
    pub anchors: Vec<BlockAnchor>,
}

/// Element id for the `index`-th anchor covering `line_start..=line_end`.
pub fn anchor_element_id(line_start: usize, line_end: usize, index: usize) -> String {
    format!("md-src-{}-{}-{}", line_start, line_end, index)
}

// ─────────────────────────────────────────────────────────────────────────────
// Rendering
// ─────────────────────────────────────────────────────────────────────────────

/// Render markdown to HTML with no anchors.
pub fn render_to_html(markdown: &str, options: &MarkdownOptions) -> String {
    markdown_to_html(markdown, &options.to_comrak_options())
}

/// Render markdown with a source anchor around each top-level block.
///
/// Blocks without a usable line range (front matter, or a block that would
/// overlap the previous anchor) are rendered unwrapped.
pub fn render_with_anchors(
    markdown: &str,
    options: &MarkdownOptions,
) -> Result<MarkdownRenderResult> {
    let arena = Arena::new();
    let comrak_options = options.to_comrak_options();
    let root = parse_document(&arena, markdown, &comrak_options);

    // comrak numbers lines from the end of the front matter
    let line_offset = front_matter_line_count(root);

    let mut result = MarkdownRenderResult::default();
    let mut last_line_end = 0;

    for block in root.children() {
        let (line_start, line_end) = {
            let ast = block.data.borrow();
            if matches!(ast.value, NodeValue::FrontMatter(_)) {
                continue;
            }
            if ast.sourcepos.start.line == 0 {
                (0, 0)
            } else {
                (
                    ast.sourcepos.start.line + line_offset,
                    ast.sourcepos.end.line + line_offset,
                )
            }
        };

        let block_html = render_block(block, &comrak_options)?;

        if line_start == 0 || line_end < line_start || line_start <= last_line_end {
            result.html.push_str(&block_html);
            continue;
        }

        let element_id = anchor_element_id(line_start, line_end, result.anchors.len());
        result.html.push_str(&format!(
            "<div id=\"{}\" data-source-line-start=\"{}\" data-source-line-end=\"{}\">\n{}</div>\n",
            element_id, line_start, line_end, block_html
        ));
        result.anchors.push(BlockAnchor {
            line_start,
            line_end,
            element_id,
        });
        last_line_end = line_end;
    }

    Ok(result)
}

/// Source lines taken up by a front matter block, including its fences.
fn front_matter_line_count<'a>(root: &'a AstNode<'a>) -> usize {
    root.children()
        .find_map(|block| match &block.data.borrow().value {
            NodeValue::FrontMatter(text) => Some(text.matches('\n').count()),
            _ => None,
        })
        .unwrap_or(0)
}

/// Render one top-level block; fenced code goes through syntect.
fn render_block<'a>(block: &'a AstNode<'a>, options: &Options) -> Result<String> {
    if let NodeValue::CodeBlock(code) = &block.data.borrow().value {
        if code.fenced {
            let language = code.info.split_whitespace().next().unwrap_or("");
            return Ok(render_code_block(&code.literal, language));
        }
    }

    let mut html = Vec::new();
    format_html(block, options, &mut html)?;
    Ok(String::from_utf8(html)?)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
