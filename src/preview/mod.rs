//! Preview pane support
//!
//! Rendering markdown into the preview with a measured source map, and
//! keeping the editor and preview scroll positions synchronized.

mod renderer;
mod source_map;
mod surface;
mod sync_scroll;

pub use renderer::{code_stylesheet, ComrakRenderer, PreviewRenderer, SourceMapRenderer};
pub use source_map::{
    count_source_lines, MapProblem, PreviewSourceAnchor, PreviewSourceMap, SourceMapHandle,
    SourceMapProvider,
};
pub use surface::{ElementBox, PreviewSurface};
pub use sync_scroll::{
    FallbackReason, FrameId, FrameScheduler, ScrollCoordinator, ScrollSource, ScrollSyncInput,
    ScrollSyncOutput, SyncMode,
};
