//! Preview renderer that produces a measured source map
//!
//! Renders markdown into the preview surface, then measures every anchored
//! block so scroll sync can map lines to pixels. Identical input is a no-op
//! that hands back the very same map.

use log::{debug, warn};
use std::rc::Rc;

use crate::config::Settings;
use crate::error::{Result, ResultExt};
use crate::markdown::syntax::get_highlighter;
use crate::markdown::{self, MarkdownOptions, MarkdownRenderResult};
use crate::preview::source_map::{
    count_source_lines, PreviewSourceAnchor, PreviewSourceMap, SourceMapHandle,
};
use crate::preview::surface::PreviewSurface;

// ─────────────────────────────────────────────────────────────────────────────
// Markdown Backend
// ─────────────────────────────────────────────────────────────────────────────

/// Markdown to HTML conversion used by the preview.
pub trait SourceMapRenderer {
    /// Render with anchors around top-level blocks.
    fn render_with_source_map(&self, markdown: &str) -> Result<MarkdownRenderResult>;

    /// Render without anchors; used when anchored rendering fails.
    fn render_plain(&self, markdown: &str) -> String;
}

/// The comrak-backed renderer.
#[derive(Debug, Clone, Default)]
pub struct ComrakRenderer {
    options: MarkdownOptions,
}

impl ComrakRenderer {
    pub fn new(options: MarkdownOptions) -> Self {
        Self { options }
    }
}

impl SourceMapRenderer for ComrakRenderer {
    fn render_with_source_map(&self, markdown: &str) -> Result<MarkdownRenderResult> {
        markdown::render_with_anchors(markdown, &self.options)
    }

    fn render_plain(&self, markdown: &str) -> String {
        markdown::render_to_html(markdown, &self.options)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Preview Renderer
// ─────────────────────────────────────────────────────────────────────────────

/// Renders into a preview surface and keeps the latest source map.
pub struct PreviewRenderer<R: SourceMapRenderer = ComrakRenderer> {
    renderer: R,
    last_content: String,
    map_version: u64,
    source_map: Rc<PreviewSourceMap>,
    handle: SourceMapHandle,
}

impl PreviewRenderer<ComrakRenderer> {
    pub fn new(options: MarkdownOptions) -> Self {
        Self::with_renderer(ComrakRenderer::new(options))
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.markdown.clone())
    }
}

/// CSS for highlighted code blocks in the configured syntax theme.
///
/// Returns an empty stylesheet if the theme cannot be turned into CSS.
pub fn code_stylesheet(settings: &Settings) -> String {
    get_highlighter()
        .stylesheet(&settings.syntax_theme)
        .unwrap_or_warn_default(String::new(), "Failed to build code stylesheet")
}

impl<R: SourceMapRenderer> PreviewRenderer<R> {
    pub fn with_renderer(renderer: R) -> Self {
        let source_map = Rc::new(PreviewSourceMap::empty(0));
        let handle = SourceMapHandle::new();
        handle.publish(source_map.clone());
        Self {
            renderer,
            last_content: String::new(),
            map_version: 0,
            source_map,
            handle,
        }
    }

    /// Handle that always sees the latest map; give it to the scroll
    /// coordinator.
    pub fn source_map_handle(&self) -> SourceMapHandle {
        self.handle.clone()
    }

    /// Render `markdown` into `surface` and rebuild the source map.
    ///
    /// Unchanged input returns the current map without touching the surface
    /// or the version.
    pub fn render(
        &mut self,
        surface: &mut dyn PreviewSurface,
        markdown: &str,
    ) -> Rc<PreviewSourceMap> {
        if markdown == self.last_content {
            return self.source_map.clone();
        }

        self.last_content = markdown.to_string();
        self.map_version += 1;

        let map = match self.renderer.render_with_source_map(markdown) {
            Ok(result) => {
                surface.replace_html(&result.html);
                let anchors = result
                    .anchors
                    .into_iter()
                    .map(|anchor| {
                        let measured = surface.measure(&anchor.element_id);
                        PreviewSourceAnchor {
                            line_start: anchor.line_start,
                            line_end: anchor.line_end,
                            element_id: anchor.element_id,
                            offset_top: measured.map(|b| b.offset_top).unwrap_or(0.0),
                            offset_height: measured.map(|b| b.offset_height),
                        }
                    })
                    .collect();
                PreviewSourceMap::new(anchors, self.map_version, count_source_lines(markdown))
            }
            Err(e) => {
                warn!("Source-mapped render failed, using plain render: {}", e);
                surface.replace_html(&self.renderer.render_plain(markdown));
                PreviewSourceMap::empty(self.map_version)
            }
        };

        debug!(
            "Rebuilt preview source map v{} ({} anchors, {} lines)",
            map.map_version,
            map.anchors.len(),
            map.total_lines
        );
        self.publish(map)
    }

    /// Empty the surface and forget the cached content.
    pub fn clear(&mut self, surface: &mut dyn PreviewSurface) {
        self.last_content.clear();
        self.map_version += 1;
        surface.replace_html("");
        self.publish(PreviewSourceMap::empty(self.map_version));
    }

    /// The latest map.
    pub fn source_map(&self) -> Rc<PreviewSourceMap> {
        self.source_map.clone()
    }

    fn publish(&mut self, map: PreviewSourceMap) -> Rc<PreviewSourceMap> {
        self.source_map = Rc::new(map);
        self.handle.publish(self.source_map.clone());
        self.source_map.clone()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
