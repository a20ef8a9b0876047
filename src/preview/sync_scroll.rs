//! Bidirectional scroll synchronization between editor and preview
//!
//! Maps a scroll position in one pane to the matching position in the other:
//!
//! - **Source-map mode**: the preview source map ties line ranges to
//!   measured block offsets, and positions are interpolated within a block
//! - **Ratio fallback**: without a usable map, the scroll ratio of one pane
//!   is applied to the other
//!
//! # Feedback loops
//!
//! Writing the opposite pane's scroll offset makes that pane emit its own
//! scroll event. The coordinator raises an `is_syncing` guard before the
//! write and only drops it when the host reports the next animation frame,
//! so the echo is ignored while a fresh user scroll one frame later still
//! syncs. At most one guard-release frame is pending; requesting another
//! cancels the previous one.
//!
//! # Usage
//!
//! ```ignore
//! let mut coordinator = ScrollCoordinator::new(editor, preview, scheduler)
//!     .with_source_map(renderer.source_map_handle())
//!     .with_sync_gate(move || settings.borrow().is_scroll_sync_allowed());
//! coordinator.attach();
//!
//! // Host event wiring
//! coordinator.on_editor_scroll();
//! coordinator.on_animation_frame(frame_id);
//! ```

use log::debug;
use std::fmt;
use std::rc::Rc;

use crate::editor::EditorSurface;
use crate::preview::source_map::{MapProblem, PreviewSourceMap, SourceMapProvider};
use crate::preview::surface::PreviewSurface;

// ─────────────────────────────────────────────────────────────────────────────
// Frame Scheduling
// ─────────────────────────────────────────────────────────────────────────────

/// Identifier of a requested animation frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameId(pub u64);

/// The host's animation-frame facility.
///
/// When a requested frame fires, the host calls
/// [`ScrollCoordinator::on_animation_frame`] with its id.
pub trait FrameScheduler {
    fn request_frame(&mut self) -> FrameId;
    fn cancel_frame(&mut self, frame: FrameId);
}

// ─────────────────────────────────────────────────────────────────────────────
// Sync Input / Output
// ─────────────────────────────────────────────────────────────────────────────

/// Which pane scrolled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollSource {
    Editor,
    Preview,
}

/// Scroll metrics of the pane that scrolled.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrollSyncInput {
    pub source: ScrollSource,
    pub scroll_top: f32,
    pub scroll_height: f32,
    pub client_height: f32,
    /// Map to use instead of the coordinator's provider
    pub source_map: Option<Rc<PreviewSourceMap>>,
}

impl ScrollSyncInput {
    pub fn new(source: ScrollSource, scroll_top: f32, scroll_height: f32, client_height: f32) -> Self {
        Self {
            source,
            scroll_top,
            scroll_height,
            client_height,
            source_map: None,
        }
    }

    pub fn with_source_map(mut self, map: Rc<PreviewSourceMap>) -> Self {
        self.source_map = Some(map);
        self
    }

    /// Scroll position as a fraction of the scrollable range.
    fn ratio(&self) -> f32 {
        let range = (self.scroll_height - self.client_height).max(0.0);
        if range <= 0.0 {
            0.0
        } else {
            self.scroll_top / range
        }
    }
}

/// How a target was computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    SourceMap,
    RatioFallback,
}

/// Why the ratio fallback was used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    /// No map, or a map with no anchors
    MissingMap,
    /// The map describes a different document than the current one
    StaleMap,
    /// The scrolled line is not covered by any anchor
    NoAnchorMatch,
}

impl FallbackReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FallbackReason::MissingMap => "missing-map",
            FallbackReason::StaleMap => "stale-map",
            FallbackReason::NoAnchorMatch => "no-anchor-match",
        }
    }
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one sync computation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollSyncOutput {
    /// False when sync is gated off; the target is then the input offset
    pub synced: bool,
    pub target_scroll_top: f32,
    pub mode: Option<SyncMode>,
    pub fallback_reason: Option<FallbackReason>,
}

impl ScrollSyncOutput {
    fn blocked(scroll_top: f32) -> Self {
        Self {
            synced: false,
            target_scroll_top: scroll_top,
            mode: None,
            fallback_reason: None,
        }
    }

    fn source_map(target: f32) -> Self {
        Self {
            synced: true,
            target_scroll_top: target,
            mode: Some(SyncMode::SourceMap),
            fallback_reason: None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Scroll Coordinator
// ─────────────────────────────────────────────────────────────────────────────

/// Keeps the editor and preview scroll positions in step.
pub struct ScrollCoordinator<E, P, S>
where
    E: EditorSurface,
    P: PreviewSurface,
    S: FrameScheduler,
{
    editor: E,
    preview: P,
    scheduler: S,
    enabled: bool,
    attached: bool,
    is_syncing: bool,
    pending_frame: Option<FrameId>,
    sync_gate: Option<Box<dyn Fn() -> bool>>,
    source_map: Option<Box<dyn SourceMapProvider>>,
}

impl<E, P, S> ScrollCoordinator<E, P, S>
where
    E: EditorSurface,
    P: PreviewSurface,
    S: FrameScheduler,
{
    pub fn new(editor: E, preview: P, scheduler: S) -> Self {
        Self {
            editor,
            preview,
            scheduler,
            enabled: true,
            attached: false,
            is_syncing: false,
            pending_frame: None,
            sync_gate: None,
            source_map: None,
        }
    }

    /// Extra predicate consulted before every sync (layout, focus mode...).
    pub fn with_sync_gate(mut self, gate: impl Fn() -> bool + 'static) -> Self {
        self.sync_gate = Some(Box::new(gate));
        self
    }

    /// Where to read the current source map from.
    pub fn with_source_map(mut self, provider: impl SourceMapProvider + 'static) -> Self {
        self.source_map = Some(Box::new(provider));
        self
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Lifecycle
    // ─────────────────────────────────────────────────────────────────────────

    /// Start reacting to scroll events.
    pub fn attach(&mut self) {
        self.attached = true;
    }

    /// Stop reacting to scroll events.
    pub fn detach(&mut self) {
        self.attached = false;
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn enable(&mut self) {
        self.enabled = true;
    }

    /// Turn sync off and drop any pending guard release.
    pub fn disable(&mut self) {
        self.enabled = false;
        self.clear_pending_frame();
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn destroy(&mut self) {
        self.disable();
        self.detach();
    }

    /// Whether a programmatic scroll is in flight.
    pub fn is_syncing(&self) -> bool {
        self.is_syncing
    }

    pub fn pending_frame(&self) -> Option<FrameId> {
        self.pending_frame
    }

    pub fn editor(&self) -> &E {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut E {
        &mut self.editor
    }

    pub fn preview(&self) -> &P {
        &self.preview
    }

    pub fn preview_mut(&mut self) -> &mut P {
        &mut self.preview
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    fn can_sync(&self) -> bool {
        self.enabled && self.sync_gate.as_ref().map_or(true, |gate| gate())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Sync Computation
    // ─────────────────────────────────────────────────────────────────────────

    /// Compute the opposite pane's target offset. Never scrolls anything.
    pub fn sync(&self, input: &ScrollSyncInput) -> ScrollSyncOutput {
        if !self.can_sync() {
            return ScrollSyncOutput::blocked(input.scroll_top);
        }

        let map = input.source_map.clone().or_else(|| {
            self.source_map
                .as_ref()
                .and_then(|provider| provider.current_source_map())
        });

        let Some(map) = map else {
            return self.resolve_using_ratio(input, FallbackReason::MissingMap);
        };

        match map.validate() {
            Err(MapProblem::Empty) => self.resolve_using_ratio(input, FallbackReason::MissingMap),
            Err(MapProblem::Stale) => self.resolve_using_ratio(input, FallbackReason::StaleMap),
            Ok(()) => self
                .resolve_using_source_map(input, &map)
                .unwrap_or_else(|| self.resolve_using_ratio(input, FallbackReason::NoAnchorMatch)),
        }
    }

    fn resolve_using_source_map(
        &self,
        input: &ScrollSyncInput,
        map: &PreviewSourceMap,
    ) -> Option<ScrollSyncOutput> {
        match input.source {
            ScrollSource::Editor => self.editor_to_preview(input, map),
            ScrollSource::Preview => Some(self.preview_to_editor(input, map)),
        }
    }

    fn editor_to_preview(
        &self,
        input: &ScrollSyncInput,
        map: &PreviewSourceMap,
    ) -> Option<ScrollSyncOutput> {
        let line = self.resolve_editor_source_line(input, map);
        let index = map.anchor_index_for_line(line)?;
        let anchor = &map.anchors[index];
        let next = map.anchors.get(index + 1);

        let line_span = (anchor.line_end - anchor.line_start + 1).max(1) as f32;
        let progress = ((line as f32 - anchor.line_start as f32) / line_span).clamp(0.0, 1.0);
        let end = anchor.end_offset(next);
        let offset = anchor.offset_top + (end - anchor.offset_top).max(0.0) * progress;

        let target = offset.min(self.preview.max_scroll()).max(0.0);
        Some(ScrollSyncOutput::source_map(target))
    }

    fn preview_to_editor(&self, input: &ScrollSyncInput, map: &PreviewSourceMap) -> ScrollSyncOutput {
        let index = map.anchor_index_for_offset(input.scroll_top);
        let anchor = &map.anchors[index];
        let next = map.anchors.get(index + 1);

        let end = anchor.end_offset(next);
        let offset_span = (end - anchor.offset_top).max(1.0);
        let progress = ((input.scroll_top - anchor.offset_top) / offset_span).clamp(0.0, 1.0);

        let span_end = next.map_or(map.total_lines + 1, |n| n.line_start);
        let line_span = span_end.saturating_sub(anchor.line_start).max(1) as f32;
        let mapped_line = (anchor.line_start as f32 + progress * line_span).round() as usize;

        if let Some(top) = self.resolve_editor_top_for_line(mapped_line) {
            return ScrollSyncOutput::source_map(top.max(0.0));
        }

        let editor_range = self.editor.scroll_info().max_scroll();
        let denominator = map.total_lines.saturating_sub(1).max(1) as f32;
        let line_ratio = (mapped_line.saturating_sub(1) as f32 / denominator).clamp(0.0, 1.0);
        ScrollSyncOutput::source_map((editor_range * line_ratio).min(editor_range).max(0.0))
    }

    fn resolve_using_ratio(&self, input: &ScrollSyncInput, reason: FallbackReason) -> ScrollSyncOutput {
        debug!("Scroll sync using ratio fallback: {}", reason);
        let target_range = match input.source {
            ScrollSource::Editor => self.preview.max_scroll(),
            ScrollSource::Preview => self.editor.scroll_info().max_scroll(),
        };
        ScrollSyncOutput {
            synced: true,
            target_scroll_top: input.ratio() * target_range,
            mode: Some(SyncMode::RatioFallback),
            fallback_reason: Some(reason),
        }
    }

    /// 1-based line at the top of the editor viewport.
    fn resolve_editor_source_line(&self, input: &ScrollSyncInput, map: &PreviewSourceMap) -> usize {
        if let Some(geometry) = self.editor.line_geometry() {
            let blocks = geometry.viewport_line_blocks();
            if let Some(first) = blocks.first() {
                return blocks
                    .iter()
                    .take_while(|block| block.top <= input.scroll_top)
                    .last()
                    .unwrap_or(first)
                    .line;
            }
        }

        let max_line_index = map.total_lines.saturating_sub(1) as f32;
        (input.ratio() * max_line_index).round() as usize + 1
    }

    /// Exact editor offset of a line, when the widget exposes layout.
    fn resolve_editor_top_for_line(&self, line: usize) -> Option<f32> {
        let geometry = self.editor.line_geometry()?;
        let safe_line = line.clamp(1, geometry.line_count().max(1));
        Some(geometry.line_top(safe_line))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Event Handling
    // ─────────────────────────────────────────────────────────────────────────

    /// The editor scrolled; move the preview to match.
    ///
    /// Returns the applied sync, or `None` when nothing was scrolled.
    pub fn on_editor_scroll(&mut self) -> Option<ScrollSyncOutput> {
        if !self.attached || !self.can_sync() || self.is_syncing {
            return None;
        }

        let info = self.editor.scroll_info();
        let result = self.sync(&ScrollSyncInput::new(
            ScrollSource::Editor,
            info.top,
            info.height,
            info.client_height,
        ));
        if !result.synced {
            return None;
        }

        self.is_syncing = true;
        self.preview.set_scroll_top(result.target_scroll_top);
        self.release_guard_on_next_frame();
        Some(result)
    }

    /// The preview scrolled; move the editor to match.
    pub fn on_preview_scroll(&mut self) -> Option<ScrollSyncOutput> {
        if !self.attached || !self.can_sync() || self.is_syncing {
            return None;
        }

        let result = self.sync(&ScrollSyncInput::new(
            ScrollSource::Preview,
            self.preview.scroll_top(),
            self.preview.scroll_height(),
            self.preview.client_height(),
        ));
        if !result.synced {
            return None;
        }

        self.is_syncing = true;
        self.editor.scroll_to(result.target_scroll_top);
        self.release_guard_on_next_frame();
        Some(result)
    }

    /// A requested frame fired. Drops the guard if it is the pending one.
    pub fn on_animation_frame(&mut self, frame: FrameId) {
        if self.pending_frame == Some(frame) {
            self.pending_frame = None;
            self.is_syncing = false;
        }
    }

    fn release_guard_on_next_frame(&mut self) {
        if let Some(previous) = self.pending_frame.take() {
            self.scheduler.cancel_frame(previous);
        }
        self.pending_frame = Some(self.scheduler.request_frame());
    }

    fn clear_pending_frame(&mut self) {
        if let Some(frame) = self.pending_frame.take() {
            self.scheduler.cancel_frame(frame);
        }
        self.is_syncing = false;
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
