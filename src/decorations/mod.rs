//! Semantic delimiter decorations
//!
//! Markdown syntax characters are dimmed away from the caret and shown
//! again where the user is editing. Decorations never touch the document.

mod delimiters;
mod visibility;

pub use delimiters::{
    is_escaped, scan_line, ContentRange, DelimiterRange, DelimiterToken, LineScan,
};
pub use visibility::{
    compute_decorations, ContentDecoration, DecorationSet, DelimiterDecoration,
    DelimiterVisibility, EditorSnapshot, MarkDecoration, SelectionRange,
    SemanticDelimiterDecorator, ViewChanges, DELIMITER_CLASS_HIDDEN, DELIMITER_CLASS_REVEAL,
    REVEAL_RADIUS_CHARS,
};
