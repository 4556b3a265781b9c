//! Per-box layout state.
//!
//! Structure lives in the [`weft_dom::DomTree`]; everything layout needs to
//! remember about an element box between passes lives in its [`LayoutBox`]:
//! resolved style, geometry, the line index, float margins, fragments placed
//! on lines, the fonts the box holds and the changed-child marker.

use serde::Serialize;
use weft_css::{BoxStyle, Color, TextAlign, VerticalAlign, WhiteSpace};
use weft_dom::NodeId;

use crate::box_model::{BoxDimensions, Rect};
use crate::float::FloatMargins;
use crate::font::{FontFlags, FontHandle};
use crate::line_index::LineIndex;

/// Link state of content appended inside `begin_link`/`end_link`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LinkState {
    /// Not yet visited.
    Unvisited,
    /// Visited.
    Visited,
}

/// What was in effect when a child was appended.
///
/// Text, markers and replaced content are laid out with the font, color,
/// alignment and indent captured here, not with whatever is current at
/// layout time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsertionContext {
    /// Interned font.
    pub font: FontHandle,
    /// Font size in pixels.
    pub font_size: f32,
    /// Style bits.
    pub flags: FontFlags,
    /// Text color.
    pub color: Color,
    /// Alignment of the line this child starts.
    pub align: TextAlign,
    /// List indent level.
    pub indent: u32,
    /// Whitespace handling.
    pub white_space: WhiteSpace,
    /// Placement within the line.
    pub vertical_align: VerticalAlign,
    /// Link state, if appended inside a link.
    pub link: Option<LinkState>,
}

/// What a fragment shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum FragmentKind {
    /// A byte range of a text child.
    Text {
        /// Start offset.
        start: usize,
        /// End offset.
        end: usize,
    },
    /// A child box (in-flow, inline-block or float).
    Box,
    /// A list marker.
    Marker,
    /// Replaced content.
    Replaced,
    /// A line break.
    Break,
}

/// A child, or part of one, placed on a line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Fragment {
    /// The child.
    pub child: NodeId,
    /// Index of the line in the parent's line index.
    pub line: usize,
    /// Placement in the parent's content coordinates. For boxes this is the
    /// border box.
    pub rect: Rect,
    /// Baseline offset from `rect.y`; zero for boxes.
    pub baseline: f32,
    /// Content.
    pub kind: FragmentKind,
}

/// Measured widths and the available width they were measured at.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MeasureCache {
    /// Available width of the measure call.
    pub available_width: f32,
    /// Preferred border-box width.
    pub preferred: f32,
    /// Minimum border-box width.
    pub minimum: f32,
}

/// Result of laying out a box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LayoutOutcome {
    /// Border-box height.
    pub height: f32,
    /// Some replaced content was given a placeholder size; lay out again once
    /// its size is known.
    pub needs_another_pass: bool,
}

/// Layout state of one element box.
#[derive(Debug, Clone, Serialize)]
pub struct LayoutBox {
    /// Effective style: presentational attributes refined by the cascade
    /// and the inline style.
    pub style: BoxStyle,
    /// Attributes set through the configuration surface.
    pub presentational: BoxStyle,
    /// Inline `style` text.
    pub inline_style: Option<String>,
    /// Context in effect when the box was appended.
    pub context: InsertionContext,
    /// Border box relative to the parent's content box.
    pub frame: Rect,
    /// Resolved edges and content size.
    pub dimensions: BoxDimensions,
    /// Lines of the last layout.
    pub lines: LineIndex,
    /// Float margins at the end of the last layout.
    pub floats: FloatMargins,
    /// Fragments of the last layout, in line order.
    pub fragments: Vec<Fragment>,
    /// Fonts this box holds references to.
    pub fonts: Vec<FontHandle>,
    /// Earliest child changed since the last layout. May be stale.
    pub changed_child: Option<NodeId>,
    /// Whether the last layout is still valid.
    pub layout_ready: bool,
    /// Measured widths.
    pub measure_cache: Option<MeasureCache>,
    /// First line the last layout rewrote.
    pub first_touched_line: usize,
    /// Font stack depth when the box was opened.
    pub font_depth: usize,
    /// Available size of the last layout and its outcome.
    pub last_layout: Option<(f32, f32, LayoutOutcome)>,
    /// Anchored to the viewport (`position: fixed`).
    pub viewport_anchored: bool,
    /// Where an out-of-flow box would have started in its parent's flow.
    pub static_position: (f32, f32),
}

impl LayoutBox {
    /// Fresh box state.
    #[must_use]
    pub fn new(context: InsertionContext, presentational: BoxStyle, font_depth: usize) -> Self {
        Self {
            style: presentational.clone(),
            presentational,
            inline_style: None,
            context,
            frame: Rect::default(),
            dimensions: BoxDimensions::default(),
            lines: LineIndex::new(),
            floats: FloatMargins::new(),
            fragments: Vec::new(),
            fonts: Vec::new(),
            changed_child: None,
            layout_ready: false,
            measure_cache: None,
            first_touched_line: 0,
            font_depth,
            last_layout: None,
            viewport_anchored: false,
            static_position: (0.0, 0.0),
        }
    }

    /// Record that `child` changed. `earlier` says whether it precedes the
    /// child already recorded (or that one is gone); the earliest wins so
    /// layout resumes early enough for all of them.
    pub fn note_changed_child(&mut self, child: NodeId, earlier: bool) {
        if self.changed_child.is_none() || earlier {
            self.changed_child = Some(child);
        }
        self.layout_ready = false;
        self.measure_cache = None;
    }

    /// Whether the last layout can be reused for the given available size.
    #[must_use]
    pub fn cached_outcome(&self, available_width: f32, available_height: f32) -> Option<LayoutOutcome> {
        if !self.layout_ready || self.changed_child.is_some() {
            return None;
        }
        self.last_layout
            .filter(|(w, h, _)| (w - available_width).abs() < 0.01 && (h - available_height).abs() < 0.01)
            .map(|(_, _, outcome)| outcome)
    }

    /// Drop all layout results so the next pass starts from the top.
    pub fn invalidate(&mut self) {
        self.layout_ready = false;
        self.measure_cache = None;
        self.last_layout = None;
        self.changed_child = None;
    }
}
