//! Markdown rendering for the preview pane
//!
//! Wraps comrak to turn raw text into HTML whose top-level blocks carry
//! source-line anchors, with fenced code highlighted by syntect.
//!
//! # Example
//! ```ignore
//! use typim::markdown::{render_with_anchors, MarkdownOptions};
//!
//! let result = render_with_anchors("# Hello\n\nWorld", &MarkdownOptions::default())?;
//! assert_eq!(result.anchors[0].element_id, "md-src-1-1-0");
//! ```

mod parser;
pub mod syntax;

pub use parser::{
    anchor_element_id, render_to_html, render_with_anchors, BlockAnchor, MarkdownOptions,
    MarkdownRenderResult,
};
