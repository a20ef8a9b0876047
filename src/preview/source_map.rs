//! Preview source map
//!
//! The map ties 1-based source line ranges to the measured position of the
//! block rendered from them. It is rebuilt wholesale on every render and
//! shared as an `Rc`, so readers can tell two renders apart by pointer.

use std::cell::RefCell;
use std::rc::Rc;

use crate::markdown::anchor_element_id;

// ─────────────────────────────────────────────────────────────────────────────
// Anchors
// ─────────────────────────────────────────────────────────────────────────────

/// One top-level block of the preview and where it sits.
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewSourceAnchor {
    /// First source line, 1-based and inclusive
    pub line_start: usize,
    /// Last source line, inclusive
    pub line_end: usize,
    /// Id of the rendered element
    pub element_id: String,
    /// Offset of the element from the top of the preview content
    pub offset_top: f32,
    /// Measured height; `None` or zero means unmeasured
    pub offset_height: Option<f32>,
}

impl PreviewSourceAnchor {
    pub fn new(line_start: usize, line_end: usize, offset_top: f32) -> Self {
        Self {
            line_start,
            line_end,
            element_id: anchor_element_id(line_start, line_end, 0),
            offset_top,
            offset_height: None,
        }
    }

    pub fn with_height(mut self, height: f32) -> Self {
        self.offset_height = Some(height);
        self
    }

    pub fn contains_line(&self, line: usize) -> bool {
        line >= self.line_start && line <= self.line_end
    }

    /// Measured height if it is usable for interpolation.
    pub fn measured_height(&self) -> Option<f32> {
        self.offset_height.filter(|height| *height > 0.0)
    }

    /// Bottom edge of the block. Unmeasured blocks extend to `next`'s top.
    pub fn end_offset(&self, next: Option<&PreviewSourceAnchor>) -> f32 {
        let own_end = self.offset_top + self.offset_height.unwrap_or(0.0);
        match self.measured_height() {
            Some(_) => own_end,
            None => next.map(|n| n.offset_top).unwrap_or(own_end),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Source Map
// ─────────────────────────────────────────────────────────────────────────────

/// Why a map cannot be used for anchor-based sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapProblem {
    /// No anchors, or an empty document
    Empty,
    /// An anchor's range falls outside the document it claims to describe
    Stale,
}

/// Anchors of one render, its version and the document's line count.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PreviewSourceMap {
    /// Ascending by `line_start`, non-overlapping
    pub anchors: Vec<PreviewSourceAnchor>,
    /// Increases on every distinct render or clear
    pub map_version: u64,
    /// 0 for an empty document, otherwise the `\n`-separated line count
    pub total_lines: usize,
}

impl PreviewSourceMap {
    pub fn new(anchors: Vec<PreviewSourceAnchor>, map_version: u64, total_lines: usize) -> Self {
        Self {
            anchors,
            map_version,
            total_lines,
        }
    }

    /// An empty map at `map_version`.
    pub fn empty(map_version: u64) -> Self {
        Self {
            map_version,
            ..Self::default()
        }
    }

    /// Check the map can drive anchor-based sync.
    pub fn validate(&self) -> Result<(), MapProblem> {
        if self.total_lines == 0 || self.anchors.is_empty() {
            return Err(MapProblem::Empty);
        }
        let out_of_range = self.anchors.iter().any(|anchor| {
            anchor.line_start == 0
                || anchor.line_end < anchor.line_start
                || anchor.line_end > self.total_lines
        });
        if out_of_range {
            return Err(MapProblem::Stale);
        }
        Ok(())
    }

    /// Index of the first anchor whose range contains `line`.
    pub fn anchor_index_for_line(&self, line: usize) -> Option<usize> {
        self.anchors
            .iter()
            .position(|anchor| anchor.contains_line(line))
    }

    /// Index of the last anchor starting at or above `offset`, or 0.
    pub fn anchor_index_for_offset(&self, offset: f32) -> usize {
        self.anchors
            .iter()
            .take_while(|anchor| anchor.offset_top <= offset)
            .count()
            .saturating_sub(1)
    }
}

/// Number of source lines as the preview counts them.
pub fn count_source_lines(markdown: &str) -> usize {
    if markdown.is_empty() {
        0
    } else {
        markdown.split('\n').count()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Sharing
// ─────────────────────────────────────────────────────────────────────────────

/// Anything that can hand out the current source map.
pub trait SourceMapProvider {
    fn current_source_map(&self) -> Option<Rc<PreviewSourceMap>>;
}

/// Single-writer, many-reader slot holding the latest map.
///
/// The preview renderer publishes into it; the scroll coordinator reads it
/// at the start of each sync.
#[derive(Debug, Clone, Default)]
pub struct SourceMapHandle {
    slot: Rc<RefCell<Option<Rc<PreviewSourceMap>>>>,
}

impl SourceMapHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, map: Rc<PreviewSourceMap>) {
        *self.slot.borrow_mut() = Some(map);
    }
}

impl SourceMapProvider for SourceMapHandle {
    fn current_source_map(&self) -> Option<Rc<PreviewSourceMap>> {
        self.slot.borrow().clone()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
