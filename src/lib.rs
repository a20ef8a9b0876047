//! Typim - core engine of a markdown editor with live preview
//!
//! The crate holds the editor-independent parts: preview rendering with a
//! source map, scroll synchronization between editor and preview, live
//! markdown rewriting while typing, and semantic delimiter decorations.
//! Hosts plug in their widgets through the surface traits in [`editor`]
//! and [`preview`], and install a `log` backend of their choice.

/// Declares a function returning a lazily compiled, process-wide regex.
macro_rules! static_pattern {
    ($name:ident, $pattern:expr) => {
        fn $name() -> &'static Regex {
            static PATTERN: OnceLock<Regex> = OnceLock::new();
            PATTERN.get_or_init(|| Regex::new($pattern).expect("valid regex literal"))
        }
    };
}

pub mod config;
pub mod decorations;
pub mod editor;
pub mod error;
pub mod live_markdown;
pub mod markdown;
pub mod preview;
pub mod string_utils;

pub use config::{LayoutMode, Settings};
pub use error::{Error, Result, ResultExt};
