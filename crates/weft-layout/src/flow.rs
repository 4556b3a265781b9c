//! Line layout.
//!
//! [§ 9.4.2 Inline formatting contexts](https://www.w3.org/TR/CSS2/visuren.html#inline-formatting)
//!
//! "In an inline formatting context, boxes are laid out horizontally, one
//! after the other, beginning at the top of a containing block."
//!
//! A box lays its children out in lines. Each line takes its alignment and
//! indent from the insertion context of its first visible child, then adds
//! children left to right between the current float margins until one of
//! them ends the line:
//!
//! - text that does not fit (the rest continues on the next line)
//! - a line break, optionally clearing floats
//! - a block-level child box, which gets a line of its own
//! - a float, which is placed against its margin before the line restarts
//!
//! Lines are recorded in the box's [`LineIndex`] so a later pass can resume
//! from the line holding the first changed child instead of starting over.

use std::collections::HashMap;

use weft_common::{Component, Diagnostic, DiagnosticKind, DiagnosticSink};
use weft_css::{BoxStyle, Clear, DisplayValue, Position, TextAlign, VerticalAlign};
use weft_dom::{BreakKind, Bullet, DomTree, NodeId, NodeType, ReplacedData};

use crate::box_model::{BoxDimensions, Rect};
use crate::config::EngineConfig;
use crate::document::Document;
use crate::error::LayoutError;
use crate::float::{FloatMargins, FloatSide};
use crate::font::{FontCache, FontKey, FontMetrics};
use crate::layout_box::{Fragment, FragmentKind, InsertionContext, LayoutBox, LayoutOutcome};
use crate::line_index::{LineIndex, LineRecord};
use crate::text::TextMeasure;

/// How a child takes part in its parent's flow.
#[derive(Debug, Clone, Copy)]
pub(crate) enum ChildRole<'t> {
    Text(&'t str),
    Break(BreakKind),
    Marker(&'t Bullet),
    Replaced(&'t ReplacedData),
    /// Block-level box: a line of its own.
    Block,
    Float(FloatSide),
    /// Inline or inline-block box, placed whole on a line.
    Atom,
    /// Absolutely or fixed positioned box, placed after sizing.
    OutOfFlow,
    /// `display: none`.
    Hidden,
}

/// Role of an element box with `style`.
pub(crate) fn role_for_style(style: &BoxStyle) -> ChildRole<'static> {
    if style.display == Some(DisplayValue::None) {
        return ChildRole::Hidden;
    }
    if style.position.is_some_and(Position::is_out_of_flow) {
        return ChildRole::OutOfFlow;
    }
    if let Some(side) = style.float.and_then(FloatSide::from_float) {
        return ChildRole::Float(side);
    }
    match style.display {
        Some(DisplayValue::Inline | DisplayValue::InlineBlock) => ChildRole::Atom,
        _ => ChildRole::Block,
    }
}

/// Position in a child list: child index and byte offset into its text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Cursor {
    index: usize,
    offset: usize,
}

impl Cursor {
    const fn next(self) -> Self {
        Self {
            index: self.index + 1,
            offset: 0,
        }
    }
}

/// One child (or text range) waiting on the current line.
struct LineItem {
    child: NodeId,
    kind: FragmentKind,
    x: f32,
    width: f32,
    ascent: f32,
    descent: f32,
    vertical_align: VerticalAlign,
}

enum FloatPlacement {
    Placed,
    /// No room beside the floats already there; try again lower down.
    Deferred(f32),
}

/// Where a line sits and how wide it may run.
#[derive(Debug, Clone, Copy)]
struct LineGeometry {
    y: f32,
    left: f32,
    right: f32,
    indent_x: f32,
    align: TextAlign,
}

enum AtomFit {
    Place,
    EndLine,
    MoveDown(f32),
}

/// State of one box's flow while its lines are built.
struct Flow<'t> {
    children: &'t [NodeId],
    content_width: f32,
    available_height: f32,
    y: f32,
    cursor: Cursor,
    floats: FloatMargins,
    lines: LineIndex,
    fragments: Vec<Fragment>,
    placed_floats: Vec<NodeId>,
    prev_indent: u32,
    needs_another_pass: bool,
    pending_child: Option<NodeId>,
    first_touched_line: usize,
}

impl Flow<'_> {
    fn wait_for(&mut self, child: NodeId) {
        self.needs_another_pass = true;
        let _ = self.pending_child.get_or_insert(child);
    }
}

/// Where an incremental pass picks up.
struct Resume {
    cursor: Cursor,
    y: f32,
    line: usize,
}

/// One measure or layout pass over part of a [`Document`].
pub(crate) struct LayoutPass<'a> {
    pub(crate) tree: &'a DomTree,
    pub(crate) boxes: &'a mut HashMap<NodeId, LayoutBox>,
    pub(crate) contexts: &'a HashMap<NodeId, InsertionContext>,
    pub(crate) fonts: &'a FontCache,
    pub(crate) metrics: &'a dyn FontMetrics,
    pub(crate) config: &'a EngineConfig,
    pub(crate) sink: &'a dyn DiagnosticSink,
    pub(crate) viewport: Rect,
    steps: usize,
    exhausted: bool,
}

impl<'a> LayoutPass<'a> {
    pub(crate) fn new(document: &'a mut Document) -> Self {
        Self {
            tree: &document.tree,
            boxes: &mut document.boxes,
            contexts: &document.contexts,
            fonts: &document.fonts,
            metrics: &*document.metrics,
            config: &document.config,
            sink: &*document.sink,
            viewport: document.viewport,
            steps: 0,
            exhausted: false,
        }
    }

    /// Count one unit of work; `false` once the pass is over budget.
    pub(crate) fn step(&mut self) -> bool {
        self.steps += 1;
        if self.steps <= self.config.layout_step_cap {
            return true;
        }
        if !self.exhausted {
            self.exhausted = true;
            self.sink.report(Diagnostic::new(
                Component::Layout,
                DiagnosticKind::IterationBudgetExceeded,
                format!(
                    "layout stopped after {} steps; the rest of the pass is truncated",
                    self.config.layout_step_cap
                ),
            ));
        }
        false
    }

    pub(crate) fn role(&self, child: NodeId) -> ChildRole<'a> {
        let tree = self.tree;
        let Some(node) = tree.get(child) else {
            return ChildRole::Hidden;
        };
        match &node.node_type {
            NodeType::Text(text) => ChildRole::Text(text),
            NodeType::Break(kind) => ChildRole::Break(*kind),
            NodeType::Marker(bullet) => ChildRole::Marker(bullet),
            NodeType::Replaced(data) => ChildRole::Replaced(data),
            NodeType::Element(_) => self
                .boxes
                .get(&child)
                .map_or(ChildRole::Hidden, |lb| role_for_style(&lb.style)),
            NodeType::Document => ChildRole::Hidden,
        }
    }

    pub(crate) fn content_context(&self, child: NodeId) -> Option<&'a InsertionContext> {
        let contexts = self.contexts;
        contexts.get(&child)
    }

    pub(crate) fn font_key(&self, ctx: &InsertionContext) -> FontKey {
        self.fonts.get(ctx.font).cloned().unwrap_or_else(|| {
            FontKey::new(&self.config.default_font_face, ctx.font_size, ctx.flags)
        })
    }

    fn font_extent(&self, ctx: &InsertionContext) -> (f32, f32) {
        let key = self.font_key(ctx);
        (self.metrics.ascent(&key), self.metrics.descent(&key))
    }

    /// Bullet glyph plus gap, or the label plus a space.
    pub(crate) fn marker_width(&self, bullet: &Bullet, ctx: &InsertionContext) -> f32 {
        match bullet {
            Bullet::Disc(_) | Bullet::Circle | Bullet::Square => ctx.font_size,
            Bullet::Label(label) => {
                let key = self.font_key(ctx);
                self.metrics.text_width(label, &key) + self.metrics.text_width(" ", &key)
            }
        }
    }

    /// Size of replaced content, the placeholder while it is pending.
    pub(crate) fn replaced_size(&self, data: &ReplacedData) -> (f32, f32, bool) {
        match (data.width, data.height) {
            (Some(width), Some(height)) => (width, height, false),
            _ => (self.config.placeholder_width, self.config.placeholder_height, true),
        }
    }

    /// Resolved edges, font size and explicit content width of a box.
    pub(crate) fn edges(&self, node: NodeId, available_width: f32) -> Result<(BoxDimensions, f32, Option<f32>), LayoutError> {
        let lb = self.boxes.get(&node).ok_or(LayoutError::NotABox(node))?;
        let font_size = lb.context.font_size;
        let dims = BoxDimensions::resolve_edges(&lb.style, font_size, available_width);
        let explicit = lb.style.width.map(|w| w.to_px(font_size, available_width));
        Ok((dims, font_size, explicit))
    }

    /// [§ 10.3.3 Block-level, non-replaced elements in normal flow](https://www.w3.org/TR/CSS2/visudet.html#blockwidth)
    ///
    /// Without an explicit width the box fills the available width less its
    /// margins, borders and padding.
    pub(crate) fn layout_box(
        &mut self,
        node: NodeId,
        available_width: f32,
        available_height: f32,
    ) -> Result<LayoutOutcome, LayoutError> {
        let (dims, _, explicit) = self.edges(node, available_width)?;
        let content_width = explicit
            .unwrap_or_else(|| available_width - dims.margin.horizontal() - dims.horizontal_chrome());
        self.layout_sized(node, available_width, available_height, content_width, dims)
    }

    /// [§ 10.3.5 Floating, non-replaced elements](https://www.w3.org/TR/CSS2/visudet.html#float-width)
    ///
    /// "Calculate the preferred width by formatting the content without
    /// breaking lines other than where explicit line breaks occur, and also
    /// calculate the preferred minimum width... the shrink-to-fit width is:
    /// min(max(preferred minimum width, available width), preferred width)."
    pub(crate) fn layout_shrink_to_fit(
        &mut self,
        node: NodeId,
        available_width: f32,
        available_height: f32,
    ) -> Result<LayoutOutcome, LayoutError> {
        let (dims, _, explicit) = self.edges(node, available_width)?;
        let content_width = match explicit {
            Some(width) => width,
            None => {
                let (preferred, minimum) = self.measure_box(node, available_width, available_height, true);
                let room = available_width - dims.margin.horizontal();
                minimum.max(room).min(preferred) - dims.horizontal_chrome()
            }
        };
        self.layout_sized(node, available_width, available_height, content_width, dims)
    }

    /// Lay out a box whose content width is decided.
    pub(crate) fn layout_sized(
        &mut self,
        node: NodeId,
        available_width: f32,
        available_height: f32,
        content_width: f32,
        mut dims: BoxDimensions,
    ) -> Result<LayoutOutcome, LayoutError> {
        let lb = self.boxes.get(&node).ok_or(LayoutError::NotABox(node))?;
        if let Some(outcome) = lb.cached_outcome(available_width, available_height) {
            return Ok(outcome);
        }
        let font_size = lb.context.font_size;
        let style = &lb.style;

        // STEP 1: Clamp the content width.
        // [§ 10.4](https://www.w3.org/TR/CSS2/visudet.html#min-max-widths)
        let mut content_width = content_width;
        if let Some(max) = style.max_width {
            content_width = content_width.min(max.to_px(font_size, available_width));
        }
        if let Some(min) = style.min_width {
            content_width = content_width.max(min.to_px(font_size, available_width));
        }
        let content_width = content_width.max(0.0);
        let explicit_height = style.height.map(|h| h.to_px(font_size, available_height));
        let min_height = style.min_height.map(|h| h.to_px(font_size, available_height));
        let max_height = style.max_height.map(|h| h.to_px(font_size, available_height));

        // STEP 2: Decide where to start, keeping lines above the change.
        let resume = self.resume_point(node, available_width, available_height);
        let tree = self.tree;
        let children = tree.children(node);
        let mut flow = Flow {
            children,
            content_width,
            available_height,
            y: 0.0,
            cursor: Cursor {
                index: 0,
                offset: 0,
            },
            floats: FloatMargins::new(),
            lines: LineIndex::new(),
            fragments: Vec::new(),
            placed_floats: Vec::new(),
            prev_indent: 0,
            needs_another_pass: false,
            pending_child: None,
            first_touched_line: 0,
        };
        if let Some(resume) = resume {
            flow.lines = lb.lines.clone();
            flow.lines.truncate(resume.line);
            flow.fragments = lb
                .fragments
                .iter()
                .filter(|f| f.line < resume.line)
                .cloned()
                .collect();
            flow.y = resume.y;
            flow.cursor = resume.cursor;
            flow.first_touched_line = resume.line;
            flow.prev_indent = self.line_context(&flow, resume.cursor.index).map_or(0, |(_, indent)| indent);
            log::trace!(target: "weft::layout", "{node:?} resumes at line {} (y {})", resume.line, resume.y);
        }
        let first_new_fragment = flow.fragments.len();

        // STEP 3: Build the lines.
        self.run_flow(&mut flow)?;

        // STEP 4: Height.
        // [§ 10.6.3](https://www.w3.org/TR/CSS2/visudet.html#normal-block)
        // and floats hanging below the last line.
        let mut content_height = explicit_height.unwrap_or_else(|| flow.y.max(flow.floats.max_end_y()));
        if let Some(max) = max_height {
            content_height = content_height.min(max);
        }
        if let Some(min) = min_height {
            content_height = content_height.max(min);
        }
        dims.set_content_size(content_width, content_height);

        // STEP 5: Relative offsets never move other content.
        // [§ 9.4.3](https://www.w3.org/TR/CSS2/visuren.html#relative-positioning)
        self.apply_relative_offsets(&mut flow.fragments[first_new_fragment..], content_width, available_height);

        // STEP 6: Commit.
        let Flow {
            lines,
            fragments,
            floats,
            needs_another_pass,
            pending_child,
            first_touched_line,
            ..
        } = flow;
        let border_box = dims.border_box();
        let lb = self.boxes.get_mut(&node).ok_or(LayoutError::NotABox(node))?;
        lb.dimensions = dims;
        lb.frame.width = border_box.width;
        lb.frame.height = border_box.height;
        lb.lines = lines;
        lb.fragments = fragments;
        lb.floats = floats;
        lb.first_touched_line = first_touched_line;

        // STEP 7: Out-of-flow children, against the now known size.
        let positioned_pending = self.place_out_of_flow(node, &dims)?;

        let outcome = LayoutOutcome {
            height: border_box.height,
            needs_another_pass: needs_another_pass || positioned_pending,
        };
        let lb = self.boxes.get_mut(&node).ok_or(LayoutError::NotABox(node))?;
        lb.last_layout = Some((available_width, available_height, outcome));
        lb.changed_child = pending_child;
        lb.layout_ready = !outcome.needs_another_pass;
        Ok(outcome)
    }

    /// The line to resume from: the one holding the changed child, backed up
    /// to the nearest line no float narrows.
    fn resume_point(&self, node: NodeId, available_width: f32, available_height: f32) -> Option<Resume> {
        let lb = self.boxes.get(&node)?;
        let (width, height, _) = lb.last_layout?;
        if (width - available_width).abs() >= 0.01 || (height - available_height).abs() >= 0.01 {
            return None;
        }
        let changed = lb.changed_child?;
        let children = self.tree.children(node);
        let position_of = |id: NodeId| children.iter().position(|&c| c == id);
        let changed_at = position_of(changed)?;
        let containing = lb
            .lines
            .records()
            .iter()
            .rposition(|r| position_of(r.child).is_some_and(|p| p <= changed_at))?;
        let line = lb.lines.resumable_at_or_before(containing)?;
        let record = lb.lines.get(line)?;
        Some(Resume {
            cursor: Cursor {
                index: position_of(record.child)?,
                offset: record.offset,
            },
            y: record.y,
            line,
        })
    }

    /// Alignment and indent of the line starting at child `from`: those of
    /// the first child that will show on it.
    fn line_context(&self, flow: &Flow<'_>, from: usize) -> Option<(TextAlign, u32)> {
        flow.children.get(from..)?.iter().find_map(|&child| {
            match self.role(child) {
                ChildRole::Hidden | ChildRole::OutOfFlow => None,
                ChildRole::Float(_) if flow.placed_floats.contains(&child) => None,
                ChildRole::Block | ChildRole::Float(_) | ChildRole::Atom => {
                    self.boxes.get(&child).map(|lb| (lb.context.align, lb.context.indent))
                }
                ChildRole::Text(_) | ChildRole::Break(_) | ChildRole::Marker(_) | ChildRole::Replaced(_) => {
                    self.content_context(child).map(|ctx| (ctx.align, ctx.indent))
                }
            }
        })
    }

    fn run_flow(&mut self, flow: &mut Flow<'a>) -> Result<(), LayoutError> {
        'lines: while flow.cursor.index < flow.children.len() {
            if !self.step() {
                break;
            }
            let Some((align, indent)) = self.line_context(flow, flow.cursor.index) else {
                // Nothing left that shows; out-of-flow boxes start here.
                for &child in &flow.children[flow.cursor.index..] {
                    self.set_static_position(child, 0.0, flow.y);
                }
                break;
            };

            // Floats from a deeper list stop narrowing once the list closes.
            if indent < flow.prev_indent {
                flow.y = flow.floats.find_indent_clear_y(flow.y, indent + 1);
            }
            flow.prev_indent = indent;

            let line_y = flow.y;
            let indent_x = indent as f32 * self.config.indent_width;
            let (left_used, right_used) = flow.floats.current_margins(line_y);
            let left = left_used.max(indent_x);
            let right = (flow.content_width - right_used).max(left);
            let line = LineGeometry {
                y: line_y,
                left,
                right,
                indent_x,
                align,
            };
            let line_start = flow.cursor;

            let mut items: Vec<LineItem> = Vec::new();
            let mut x = left;
            let mut at = flow.cursor;
            let mut clear_after = Clear::None;

            while at.index < flow.children.len() {
                if !self.step() {
                    break;
                }
                let child = flow.children[at.index];
                match self.role(child) {
                    ChildRole::Hidden => at = at.next(),
                    ChildRole::OutOfFlow => {
                        self.set_static_position(child, x, line_y);
                        at = at.next();
                    }
                    ChildRole::Block => {
                        if !items.is_empty() {
                            break;
                        }
                        self.place_block(flow, child, indent_x)?;
                        flow.cursor = at.next();
                        continue 'lines;
                    }
                    ChildRole::Float(side) => {
                        if flow.placed_floats.contains(&child) {
                            at = at.next();
                            continue;
                        }
                        match self.place_float(flow, child, side, indent, indent_x)? {
                            // Restart the line with the float excluded.
                            FloatPlacement::Placed => {}
                            FloatPlacement::Deferred(lower) => {
                                if !items.is_empty() {
                                    break;
                                }
                                flow.y = lower;
                            }
                        }
                        continue 'lines;
                    }
                    ChildRole::Break(kind) => {
                        if let Some(ctx) = self.content_context(child) {
                            let (ascent, descent) = self.font_extent(ctx);
                            items.push(LineItem {
                                child,
                                kind: FragmentKind::Break,
                                x,
                                width: 0.0,
                                ascent,
                                descent,
                                vertical_align: VerticalAlign::Baseline,
                            });
                        }
                        clear_after = match kind {
                            BreakKind::Line => Clear::None,
                            BreakKind::ClearLeft => Clear::Left,
                            BreakKind::ClearRight => Clear::Right,
                            BreakKind::ClearBoth => Clear::Both,
                        };
                        at = at.next();
                        break;
                    }
                    ChildRole::Text(text) => {
                        let Some(ctx) = self.content_context(child) else {
                            at = at.next();
                            continue;
                        };
                        let key = self.font_key(ctx);
                        let measure = TextMeasure {
                            font: &key,
                            metrics: self.metrics,
                            white_space: ctx.white_space,
                        };
                        let mut fit = measure.fit(text, at.offset, line.right - x, items.is_empty(), false);
                        if fit.is_empty() && !fit.forced_break {
                            if fit.resume >= text.len() {
                                // Only spaces were left.
                                at = at.next();
                                continue;
                            }
                            if !items.is_empty() {
                                break;
                            }
                            // First on the line and still too wide: look for
                            // room below the floats, else overflow.
                            fit = measure.fit(text, at.offset, line.right - x, true, true);
                            let lower = flow
                                .floats
                                .find_y_with_budget(line_y, flow.content_width - fit.width - indent_x);
                            if lower > line_y {
                                flow.y = lower;
                                continue 'lines;
                            }
                        }
                        let (ascent, descent) = self.font_extent(ctx);
                        items.push(LineItem {
                            child,
                            kind: FragmentKind::Text {
                                start: fit.start,
                                end: fit.end,
                            },
                            x,
                            width: fit.width,
                            ascent,
                            descent,
                            vertical_align: ctx.vertical_align,
                        });
                        x += fit.width;
                        let done = fit.resume >= text.len();
                        if done && !fit.forced_break {
                            at = at.next();
                            continue;
                        }
                        at = if done {
                            at.next()
                        } else {
                            Cursor {
                                index: at.index,
                                offset: fit.resume,
                            }
                        };
                        break;
                    }
                    ChildRole::Marker(bullet) => {
                        let Some(ctx) = self.content_context(child) else {
                            at = at.next();
                            continue;
                        };
                        let width = self.marker_width(bullet, ctx);
                        match Self::fit_atom(flow, &line, items.is_empty(), x, width) {
                            AtomFit::EndLine => break,
                            AtomFit::MoveDown(lower) => {
                                flow.y = lower;
                                continue 'lines;
                            }
                            AtomFit::Place => {}
                        }
                        let (ascent, descent) = self.font_extent(ctx);
                        items.push(LineItem {
                            child,
                            kind: FragmentKind::Marker,
                            x,
                            width,
                            ascent,
                            descent,
                            vertical_align: ctx.vertical_align,
                        });
                        x += width;
                        at = at.next();
                    }
                    ChildRole::Replaced(data) => {
                        let (width, height, pending) = self.replaced_size(data);
                        match Self::fit_atom(flow, &line, items.is_empty(), x, width) {
                            AtomFit::EndLine => break,
                            AtomFit::MoveDown(lower) => {
                                flow.y = lower;
                                continue 'lines;
                            }
                            AtomFit::Place => {}
                        }
                        if pending {
                            flow.wait_for(child);
                        }
                        items.push(LineItem {
                            child,
                            kind: FragmentKind::Replaced,
                            x,
                            width,
                            ascent: height,
                            descent: 0.0,
                            vertical_align: self
                                .content_context(child)
                                .map_or(VerticalAlign::Baseline, |ctx| ctx.vertical_align),
                        });
                        x += width;
                        at = at.next();
                    }
                    ChildRole::Atom => {
                        let outcome = self.layout_shrink_to_fit(child, flow.content_width, flow.available_height)?;
                        if outcome.needs_another_pass {
                            flow.wait_for(child);
                        }
                        let Some(lb) = self.boxes.get(&child) else {
                            at = at.next();
                            continue;
                        };
                        let width = lb.dimensions.margin_box_width();
                        let height = lb.dimensions.margin_box_height();
                        let vertical_align = lb.style.vertical_align.unwrap_or_default();
                        match Self::fit_atom(flow, &line, items.is_empty(), x, width) {
                            AtomFit::EndLine => break,
                            AtomFit::MoveDown(lower) => {
                                flow.y = lower;
                                continue 'lines;
                            }
                            AtomFit::Place => {}
                        }
                        items.push(LineItem {
                            child,
                            kind: FragmentKind::Box,
                            x,
                            width,
                            ascent: height,
                            descent: 0.0,
                            vertical_align,
                        });
                        x += width;
                        at = at.next();
                    }
                }
            }

            // Every line must consume something.
            flow.cursor = if at == line_start { line_start.next() } else { at };
            if !items.is_empty() {
                self.finish_line(flow, &items, line_start, &line)?;
            }
            flow.y = flow.floats.clear_y(clear_after, flow.y);
        }
        Ok(())
    }

    /// Whether an unbreakable item of `width` goes on the current line.
    fn fit_atom(flow: &Flow<'_>, line: &LineGeometry, first_on_line: bool, x: f32, width: f32) -> AtomFit {
        if x + width <= line.right + 0.01 {
            return AtomFit::Place;
        }
        if !first_on_line {
            return AtomFit::EndLine;
        }
        let lower = flow
            .floats
            .find_y_with_budget(line.y, flow.content_width - width - line.indent_x);
        if lower > line.y {
            AtomFit::MoveDown(lower)
        } else {
            AtomFit::Place
        }
    }

    /// Align the items of a line, place them on a shared baseline and record
    /// the line.
    fn finish_line(
        &mut self,
        flow: &mut Flow<'_>,
        items: &[LineItem],
        start: Cursor,
        geometry: &LineGeometry,
    ) -> Result<(), LayoutError> {
        let line = flow.lines.len();
        let line_y = geometry.y;

        // [§ 10.8](https://www.w3.org/TR/CSS2/visudet.html#line-height)
        // "The line box height is the distance between the uppermost box top
        // and the lowermost box bottom."
        let on_baseline = || items.iter().filter(|i| i.vertical_align == VerticalAlign::Baseline);
        let ascent = on_baseline().map(|i| i.ascent).fold(0.0, f32::max);
        let descent = on_baseline().map(|i| i.descent).fold(0.0, f32::max);
        let height = items
            .iter()
            .map(|i| i.ascent + i.descent)
            .fold(ascent + descent, f32::max);

        // [§ 16.2](https://www.w3.org/TR/CSS2/text.html#alignment-prop)
        let used = items.last().map_or(0.0, |i| i.x + i.width - geometry.left);
        let slack = (geometry.right - geometry.left - used).max(0.0);
        let shift = match geometry.align {
            TextAlign::Center => slack / 2.0,
            TextAlign::Right => slack,
            TextAlign::Left | TextAlign::Justify => 0.0,
        };

        flow.fragments
            .try_reserve(items.len())
            .map_err(|_| LayoutError::Allocation("fragment list"))?;
        for item in items {
            let item_height = item.ascent + item.descent;
            let top = match item.vertical_align {
                VerticalAlign::Baseline => line_y + ascent - item.ascent,
                VerticalAlign::Top => line_y,
                VerticalAlign::Middle => line_y + (height - item_height) / 2.0,
                VerticalAlign::Bottom => line_y + height - item_height,
            };
            let mut rect = Rect::new(item.x + shift, top, item.width, item_height);
            if item.kind == FragmentKind::Box
                && let Some(lb) = self.boxes.get_mut(&item.child)
            {
                lb.frame.x = rect.x + lb.dimensions.margin.left;
                lb.frame.y = rect.y + lb.dimensions.margin.top;
                rect = lb.frame;
            }
            flow.fragments.push(Fragment {
                child: item.child,
                line,
                rect,
                baseline: if item.kind == FragmentKind::Box { 0.0 } else { item.ascent },
                kind: item.kind.clone(),
            });
        }

        flow.lines.push(LineRecord {
            child: flow.children[start.index],
            offset: start.offset,
            y: line_y,
            width: used,
            height,
            continues: start.offset > 0,
            has_floats: flow.floats.is_active_at(line_y),
        })?;
        flow.y = line_y + height;
        Ok(())
    }

    /// A block-level child gets a line of its own, between the floats.
    fn place_block(&mut self, flow: &mut Flow<'_>, child: NodeId, indent_x: f32) -> Result<(), LayoutError> {
        // [§ 9.5.2](https://www.w3.org/TR/CSS2/visuren.html#flow-control)
        let clear = self
            .boxes
            .get(&child)
            .and_then(|lb| lb.style.clear)
            .unwrap_or_default();
        flow.y = flow.floats.clear_y(clear, flow.y);
        let (left_used, right_used) = flow.floats.current_margins(flow.y);
        let left = left_used.max(indent_x);
        let available = (flow.content_width - left - right_used).max(0.0);

        let outcome = self.layout_box(child, available, flow.available_height)?;
        if outcome.needs_another_pass {
            flow.wait_for(child);
        }
        let lb = self.boxes.get_mut(&child).ok_or(LayoutError::NotABox(child))?;
        let margin = lb.dimensions.margin;
        lb.frame.x = left + margin.left;
        lb.frame.y = flow.y + margin.top;
        let frame = lb.frame;

        flow.fragments
            .try_reserve(1)
            .map_err(|_| LayoutError::Allocation("fragment list"))?;
        flow.fragments.push(Fragment {
            child,
            line: flow.lines.len(),
            rect: frame,
            baseline: 0.0,
            kind: FragmentKind::Box,
        });
        let height = frame.height + margin.vertical();
        flow.lines.push(LineRecord {
            child,
            offset: 0,
            y: flow.y,
            width: frame.width + margin.horizontal(),
            height,
            continues: false,
            has_floats: left_used > 0.0 || right_used > 0.0,
        })?;
        flow.y += height;
        Ok(())
    }

    /// [§ 9.5.1 Positioning the float](https://www.w3.org/TR/CSS2/visuren.html#float-position)
    ///
    /// "A left-floating box must be put as far to the left as possible, a
    /// right-floating box as far to the right as possible."
    fn place_float(
        &mut self,
        flow: &mut Flow<'_>,
        child: NodeId,
        side: FloatSide,
        indent: u32,
        indent_x: f32,
    ) -> Result<FloatPlacement, LayoutError> {
        let line_y = flow.y;
        let outcome = self.layout_shrink_to_fit(child, flow.content_width, flow.available_height)?;
        if outcome.needs_another_pass {
            flow.wait_for(child);
        }
        let lb = self.boxes.get_mut(&child).ok_or(LayoutError::NotABox(child))?;
        let margin = lb.dimensions.margin;
        let width = lb.frame.width + margin.horizontal();
        let height = lb.frame.height + margin.vertical();

        // STEP 1: "A floating box must be placed as high as possible", but not
        // beside floats that leave it too little room.
        let (left_used, right_used) = flow.floats.peek_margins(line_y);
        if left_used + right_used > 0.0 && left_used + right_used + width > flow.content_width {
            let lower = flow.floats.find_y_with_budget(line_y, flow.content_width - width);
            if lower > line_y {
                return Ok(FloatPlacement::Deferred(lower));
            }
        }

        // STEP 2: Against the margin; the record compounds with what is
        // already consumed on that side.
        let x = match side {
            FloatSide::Left => left_used.max(indent_x),
            FloatSide::Right => (flow.content_width - right_used - width).max(0.0),
        };
        let added = match side {
            FloatSide::Left => x + width - left_used,
            FloatSide::Right => width,
        };
        flow.floats.add_margin(side, line_y + height, added, indent);

        lb.frame.x = x + margin.left;
        lb.frame.y = line_y + margin.top;
        let frame = lb.frame;
        flow.fragments
            .try_reserve(1)
            .map_err(|_| LayoutError::Allocation("fragment list"))?;
        flow.fragments.push(Fragment {
            child,
            line: flow.lines.len(),
            rect: frame,
            baseline: 0.0,
            kind: FragmentKind::Box,
        });
        flow.placed_floats.push(child);
        log::trace!(target: "weft::layout", "float {child:?} {side:?} at ({x}, {line_y}) {width}x{height}");
        Ok(FloatPlacement::Placed)
    }

    fn set_static_position(&mut self, child: NodeId, x: f32, y: f32) {
        if let Some(lb) = self.boxes.get_mut(&child) {
            lb.static_position = (x, y);
        }
    }
}
