//! The document: box tree, per-box state, stacks, fonts and stylesheet.
//!
//! The tree builder drives a [`Document`] top to bottom, appending boxes and
//! content and configuring boxes as markup arrives. Every append captures an
//! [`InsertionContext`] from the font and list stacks, and marks the parent
//! chain as changed so the next [`Document::layout`] only redoes the lines
//! from the first changed child down.

use std::collections::HashMap;

use weft_common::{Component, Diagnostic, DiagnosticKind, DiagnosticSink, LogSink};
use weft_css::{
    BorderStyle, BoxStyle, CascadeContext, Color, FontStyle, Length, Sides, Stylesheet, TextAlign,
    TextDecoration, TextTransform, VerticalAlign, WhiteSpace, match_link_color, restyle,
};
use weft_dom::{BreakKind, DomTree, ElementData, NodeId, NodeType, ReplacedData};

use crate::box_model::Rect;
use crate::config::EngineConfig;
use crate::error::LayoutError;
use crate::flow::LayoutPass;
use crate::font::{ApproximateFontMetrics, FontCache, FontFlags, FontHandle, FontMetrics, FontType};
use crate::font_stack::{FontRequest, FontSize, FontStack, ResolvedFont};
use crate::layout_box::{InsertionContext, LayoutBox, LayoutOutcome, LinkState};
use crate::line_index::LineIndex;
use crate::list_stack::ListStack;
use crate::properties::{BoxProperty, ListOp};
use crate::render::{Painter, RenderPass};
use crate::text::collapse_whitespace;

const UNVISITED_LINK: Color = Color::rgb(0, 0, 0xee);
const VISITED_LINK: Color = Color::rgb(0x55, 0x1a, 0x8b);

/// A styled, laid out box tree.
pub struct Document {
    pub(crate) tree: DomTree,
    pub(crate) boxes: HashMap<NodeId, LayoutBox>,
    pub(crate) contexts: HashMap<NodeId, InsertionContext>,
    pub(crate) fonts: FontCache,
    font_stack: FontStack,
    list_stack: ListStack,
    link: Option<(LinkState, usize)>,
    stylesheet: Stylesheet,
    pub(crate) config: EngineConfig,
    pub(crate) sink: Box<dyn DiagnosticSink>,
    pub(crate) metrics: Box<dyn FontMetrics>,
    text_transform: Option<TextTransform>,
    pub(crate) viewport: Rect,
}

impl Document {
    /// Empty document reporting to the `log` facade.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self::with_sink(config, Box::new(LogSink::new()))
    }

    /// Empty document reporting to `sink`.
    #[must_use]
    pub fn with_sink(config: EngineConfig, sink: Box<dyn DiagnosticSink>) -> Self {
        let base = ResolvedFont {
            face: config.default_font_face.clone(),
            fixed_face: config.fixed_font_face.clone(),
            size: config.default_font_size,
            flags: FontFlags::empty(),
            color: Color::BLACK,
            font_type: FontType::Normal,
        };
        Self {
            tree: DomTree::new(),
            boxes: HashMap::new(),
            contexts: HashMap::new(),
            fonts: FontCache::new(),
            font_stack: FontStack::new(base),
            list_stack: ListStack::new(),
            link: None,
            stylesheet: Stylesheet::new(),
            config,
            sink,
            metrics: Box::new(ApproximateFontMetrics),
            text_transform: None,
            viewport: Rect::default(),
        }
    }

    /// Measure text with `metrics` from now on.
    pub fn set_metrics(&mut self, metrics: Box<dyn FontMetrics>) {
        self.metrics = metrics;
        for lb in self.boxes.values_mut() {
            lb.invalidate();
        }
    }

    /// The box tree.
    #[must_use]
    pub const fn tree(&self) -> &DomTree {
        &self.tree
    }

    /// The merged stylesheet.
    #[must_use]
    pub const fn stylesheet(&self) -> &Stylesheet {
        &self.stylesheet
    }

    /// Engine configuration.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The font cache.
    #[must_use]
    pub const fn fonts(&self) -> &FontCache {
        &self.fonts
    }

    /// The font stack.
    #[must_use]
    pub const fn font_stack(&self) -> &FontStack {
        &self.font_stack
    }

    /// Mutable font stack, for patching the base entry.
    pub fn font_stack_mut(&mut self) -> &mut FontStack {
        &mut self.font_stack
    }

    /// The list stack.
    #[must_use]
    pub const fn list_stack(&self) -> &ListStack {
        &self.list_stack
    }

    /// Last text transform the cascade applied anywhere in the document.
    #[must_use]
    pub const fn text_transform(&self) -> Option<TextTransform> {
        self.text_transform
    }

    /// The root element box.
    #[must_use]
    pub fn root(&self) -> Option<NodeId> {
        self.tree.document_element()
    }

    /// Layout state of a box.
    ///
    /// # Errors
    ///
    /// [`LayoutError::UnknownNode`] or [`LayoutError::NotABox`].
    pub fn layout_box(&self, node: NodeId) -> Result<&LayoutBox, LayoutError> {
        if !self.tree.contains(node) {
            return Err(LayoutError::UnknownNode(node));
        }
        self.boxes.get(&node).ok_or(LayoutError::NotABox(node))
    }

    fn layout_box_mut(&mut self, node: NodeId) -> Result<&mut LayoutBox, LayoutError> {
        if !self.tree.contains(node) {
            return Err(LayoutError::UnknownNode(node));
        }
        self.boxes.get_mut(&node).ok_or(LayoutError::NotABox(node))
    }

    /// Effective style of a box.
    ///
    /// # Errors
    ///
    /// [`LayoutError::UnknownNode`] or [`LayoutError::NotABox`].
    pub fn style(&self, node: NodeId) -> Result<&BoxStyle, LayoutError> {
        self.layout_box(node).map(|lb| &lb.style)
    }

    /// Insertion context of any child.
    ///
    /// # Errors
    ///
    /// [`LayoutError::UnknownNode`] if `node` has no context (the document
    /// node, or a freed id).
    pub fn context(&self, node: NodeId) -> Result<&InsertionContext, LayoutError> {
        self.boxes
            .get(&node)
            .map(|lb| &lb.context)
            .or_else(|| self.contexts.get(&node))
            .ok_or(LayoutError::UnknownNode(node))
    }

    // ----- stylesheet -----------------------------------------------------

    /// Merge CSS text into the document stylesheet, restyle every box and
    /// invalidate layout.
    ///
    /// Rules keep increasing declaration order across merges, so a later
    /// stylesheet wins ties against an earlier one.
    pub fn merge_stylesheet(&mut self, text: &str) {
        self.stylesheet
            .merge_with(text, &self.config.parser_limits, &*self.sink);
        log::debug!(target: "weft::layout", "stylesheet now has {} rules", self.stylesheet.len());
        self.restyle_all();
    }

    fn restyle_all(&mut self) {
        let elements: Vec<NodeId> = self
            .tree
            .descendants(NodeId::ROOT)
            .filter(|&n| self.boxes.contains_key(&n))
            .collect();
        for &node in &elements {
            self.restyle_box(node);
        }
        self.refresh_contexts();
        for lb in self.boxes.values_mut() {
            lb.invalidate();
        }
    }

    /// Recompute a box's style from its presentational attributes, the
    /// stylesheet and its inline style. Idempotent.
    fn restyle_box(&mut self, node: NodeId) {
        let Some(lb) = self.boxes.get_mut(&node) else {
            return;
        };
        let mut style = lb.presentational.clone();
        let mut ctx = CascadeContext::with_limits(
            self.config.match_limits,
            self.config.parser_limits,
            &*self.sink,
        );
        restyle(
            &self.stylesheet,
            &self.tree,
            node,
            &mut style,
            lb.inline_style.as_deref(),
            &mut ctx,
        );
        if ctx.text_transform.is_some() {
            self.text_transform = ctx.text_transform;
        }
        if let Some(align) = style.vertical_align {
            lb.context.vertical_align = align;
        }
        lb.style = style;
    }

    /// Re-derive the box-dependent parts of content contexts after a restyle.
    fn refresh_contexts(&mut self) {
        let unvisited = match_link_color(&self.stylesheet, false);
        let visited = match_link_color(&self.stylesheet, true);
        let ids: Vec<NodeId> = self.contexts.keys().copied().collect();
        for id in ids {
            let Some(parent) = self.tree.parent(id) else {
                continue;
            };
            let align = self.effective_align(parent);
            let white_space = self.effective_white_space(parent);
            let vertical_align = self.vertical_align_of(parent);
            if let Some(ctx) = self.contexts.get_mut(&id) {
                ctx.align = align;
                ctx.white_space = white_space;
                ctx.vertical_align = vertical_align;
                match ctx.link {
                    Some(LinkState::Unvisited) => ctx.color = unvisited.unwrap_or(ctx.color),
                    Some(LinkState::Visited) => ctx.color = visited.unwrap_or(ctx.color),
                    None => {}
                }
            }
        }
        let boxes: Vec<NodeId> = self.boxes.keys().copied().collect();
        for id in boxes {
            let Some(parent) = self.tree.parent(id) else {
                continue;
            };
            let align = self.effective_align(parent);
            let white_space = self.effective_white_space(parent);
            if let Some(lb) = self.boxes.get_mut(&id) {
                lb.context.align = align;
                lb.context.white_space = white_space;
            }
        }
    }

    // ----- inherited box attributes -----------------------------------------

    fn box_chain(&self, node: NodeId) -> impl Iterator<Item = &LayoutBox> {
        std::iter::once(node)
            .chain(self.tree.ancestors(node))
            .filter_map(|n| self.boxes.get(&n))
    }

    fn effective_align(&self, node: NodeId) -> TextAlign {
        self.box_chain(node)
            .find_map(|lb| lb.style.text_align)
            .unwrap_or_default()
    }

    fn effective_white_space(&self, node: NodeId) -> WhiteSpace {
        self.box_chain(node)
            .find_map(|lb| lb.style.white_space)
            .unwrap_or_default()
    }

    fn effective_text_transform(&self, node: NodeId) -> TextTransform {
        self.box_chain(node)
            .find_map(|lb| lb.style.text_transform)
            .unwrap_or_default()
    }

    fn vertical_align_of(&self, node: NodeId) -> VerticalAlign {
        self.boxes
            .get(&node)
            .and_then(|lb| lb.style.vertical_align)
            .unwrap_or_default()
    }

    // ----- building -----------------------------------------------------------

    fn require_box(&self, node: NodeId) -> Result<(), LayoutError> {
        self.layout_box(node).map(|_| ())
    }

    /// Capture the current context for a child of `parent`, taking one
    /// reference to its font.
    fn capture_context(&mut self, parent: NodeId) -> Result<InsertionContext, LayoutError> {
        let resolved = self.font_stack.current().clone();
        let font = self.fonts.acquire(&resolved.key())?;
        Ok(InsertionContext {
            font,
            font_size: resolved.size,
            flags: resolved.flags,
            color: resolved.color,
            align: self.effective_align(parent),
            indent: self.list_stack.indent(),
            white_space: self.effective_white_space(parent),
            vertical_align: self.vertical_align_of(parent),
            link: self.link.map(|(state, _)| state),
        })
    }

    /// Make `owner` hold `handle`. A box holds each font once, so a
    /// duplicate reference is dropped again.
    fn adopt_font(&mut self, owner: NodeId, handle: FontHandle) -> Result<(), LayoutError> {
        let Some(lb) = self.boxes.get_mut(&owner) else {
            self.fonts.release(handle);
            return Ok(());
        };
        if lb.fonts.contains(&handle) {
            self.fonts.release(handle);
            return Ok(());
        }
        if lb.fonts.try_reserve(1).is_err() {
            self.fonts.release(handle);
            return Err(LayoutError::Allocation("box font set"));
        }
        lb.fonts.push(handle);
        Ok(())
    }

    /// Append an element box to `parent` (a box, or the document node for
    /// the root box) and cascade it.
    ///
    /// Font properties in the box's style push a font entry owned by the
    /// box, popped again by [`close_box`](Self::close_box).
    ///
    /// # Errors
    ///
    /// [`LayoutError::UnknownNode`] / [`LayoutError::NotABox`] for a bad
    /// parent, [`LayoutError::Allocation`] if the font cache cannot grow.
    pub fn add_box(&mut self, parent: NodeId, element: ElementData) -> Result<NodeId, LayoutError> {
        if parent != NodeId::ROOT {
            self.require_box(parent)?;
        }
        let node = self.tree.alloc(NodeType::Element(element));
        self.tree.append_child(parent, node);

        // Cascade first so the box's own font applies to its em lengths.
        let font_depth = self.font_stack.depth();
        let parent_context = self.capture_context(parent)?;
        let first_font = parent_context.font;
        let lb = LayoutBox::new(parent_context, BoxStyle::default(), font_depth);
        let _ = self.boxes.insert(node, lb);
        self.adopt_font(node, first_font)?;
        self.restyle_box(node);

        let request = self
            .boxes
            .get(&node)
            .map(|lb| font_request_for_style(&lb.style))
            .unwrap_or_default();
        if !request.is_empty() {
            let _ = self.font_stack.push(request, Some(node));
            let context = self.capture_context(parent)?;
            self.adopt_font(node, context.font)?;
            if let Some(lb) = self.boxes.get_mut(&node) {
                let vertical_align = lb.context.vertical_align;
                lb.context = InsertionContext {
                    vertical_align,
                    ..context
                };
            }
        }
        log::trace!(target: "weft::layout", "add box {node:?} under {parent:?}");
        self.mark_changed(parent, node);
        Ok(node)
    }

    /// Close a box: pop every font entry pushed since it was opened.
    ///
    /// # Errors
    ///
    /// [`LayoutError::UnknownNode`] / [`LayoutError::NotABox`].
    pub fn close_box(&mut self, node: NodeId) -> Result<(), LayoutError> {
        let depth = self.layout_box(node)?.font_depth;
        self.font_stack.pop_to(depth);
        Ok(())
    }

    fn add_content(&mut self, parent: NodeId, content: NodeType) -> Result<NodeId, LayoutError> {
        self.require_box(parent)?;
        let context = self.capture_context(parent)?;
        self.adopt_font(parent, context.font)?;
        let node = self.tree.alloc(content);
        self.tree.append_child(parent, node);
        let _ = self.contexts.insert(node, context);
        self.mark_changed(parent, node);
        Ok(node)
    }

    /// Append a run of text. Whitespace is collapsed unless the box
    /// preserves it, and the box's text transform is applied.
    ///
    /// # Errors
    ///
    /// [`LayoutError::UnknownNode`] / [`LayoutError::NotABox`] for a bad
    /// parent, [`LayoutError::Allocation`] if the font cache cannot grow.
    pub fn add_text(&mut self, parent: NodeId, text: &str) -> Result<NodeId, LayoutError> {
        self.require_box(parent)?;
        let transformed = self.effective_text_transform(parent).apply(text);
        let processed = collapse_whitespace(&transformed, self.effective_white_space(parent));
        self.add_content(parent, NodeType::Text(processed))
    }

    /// Append a line break.
    ///
    /// # Errors
    ///
    /// As [`add_text`](Self::add_text).
    pub fn add_break(&mut self, parent: NodeId, kind: BreakKind) -> Result<NodeId, LayoutError> {
        self.add_content(parent, NodeType::Break(kind))
    }

    /// Append the marker of the next item of the innermost list.
    ///
    /// Returns `None`, appending nothing, outside lists and for lists
    /// without markers.
    ///
    /// # Errors
    ///
    /// As [`add_text`](Self::add_text).
    pub fn add_marker(&mut self, parent: NodeId) -> Result<Option<NodeId>, LayoutError> {
        self.require_box(parent)?;
        let Some(bullet) = self.list_stack.next_bullet() else {
            return Ok(None);
        };
        self.add_content(parent, NodeType::Marker(bullet)).map(Some)
    }

    /// Append replaced content; `size` is `None` while it is still loading.
    ///
    /// # Errors
    ///
    /// As [`add_text`](Self::add_text).
    pub fn add_replaced(
        &mut self,
        parent: NodeId,
        kind: &str,
        size: Option<(f32, f32)>,
    ) -> Result<NodeId, LayoutError> {
        self.add_content(
            parent,
            NodeType::Replaced(ReplacedData {
                kind: kind.to_string(),
                width: size.map(|(w, _)| w),
                height: size.map(|(_, h)| h),
            }),
        )
    }

    /// Report the size of replaced content; its line is laid out again.
    ///
    /// # Errors
    ///
    /// [`LayoutError::UnknownNode`] unless `node` is live replaced content.
    pub fn set_replaced_size(&mut self, node: NodeId, width: f32, height: f32) -> Result<(), LayoutError> {
        let Some(NodeType::Replaced(data)) = self.tree.get_mut(node).map(|n| &mut n.node_type) else {
            return Err(LayoutError::UnknownNode(node));
        };
        data.width = Some(width.max(0.0));
        data.height = Some(height.max(0.0));
        if let Some(parent) = self.tree.parent(node) {
            self.mark_changed(parent, node);
        }
        Ok(())
    }

    /// Start a link; content appended until [`end_link`](Self::end_link)
    /// takes the link color and an underline.
    pub fn begin_link(&mut self, visited: bool) {
        if let Some((_, depth)) = self.link.take() {
            self.font_stack.pop_to(depth);
        }
        let (state, color) = if visited {
            (
                LinkState::Visited,
                match_link_color(&self.stylesheet, true).unwrap_or(VISITED_LINK),
            )
        } else {
            (
                LinkState::Unvisited,
                match_link_color(&self.stylesheet, false).unwrap_or(UNVISITED_LINK),
            )
        };
        let depth = self.font_stack.depth();
        let _ = self.font_stack.push(
            FontRequest {
                color: Some(color),
                set_flags: FontFlags::UNDERLINE,
                ..FontRequest::default()
            },
            None,
        );
        self.link = Some((state, depth));
    }

    /// End the current link.
    pub fn end_link(&mut self) {
        if let Some((_, depth)) = self.link.take() {
            self.font_stack.pop_to(depth);
        }
    }

    /// Remove a child and its subtree, releasing the fonts its boxes held.
    ///
    /// # Errors
    ///
    /// [`LayoutError::UnknownNode`] for a freed id or the document node.
    pub fn remove(&mut self, node: NodeId) -> Result<(), LayoutError> {
        if node == NodeId::ROOT || !self.tree.contains(node) {
            return Err(LayoutError::UnknownNode(node));
        }
        let parent = self.tree.parent(node);
        let neighbour = self
            .tree
            .prev_sibling(node)
            .or_else(|| self.tree.next_sibling(node));

        for freed in self.tree.remove(node) {
            if let Some(lb) = self.boxes.remove(&freed) {
                for handle in lb.fonts {
                    self.fonts.release(handle);
                }
            }
            let _ = self.contexts.remove(&freed);
        }
        log::trace!(target: "weft::layout", "removed {node:?}");

        if let Some(parent) = parent {
            match neighbour {
                Some(sibling) => self.mark_changed(parent, sibling),
                None => {
                    if let Some(lb) = self.boxes.get_mut(&parent) {
                        lb.invalidate();
                    }
                    if let Some(grand) = self.tree.parent(parent) {
                        self.mark_changed(grand, parent);
                    }
                }
            }
        }
        Ok(())
    }

    /// Mark `child` of `parent` as changed, and each ancestor's child on the
    /// path as changed in turn.
    fn mark_changed(&mut self, parent: NodeId, child: NodeId) {
        let mut parent = parent;
        let mut child = child;
        loop {
            if let Some(lb) = self.boxes.get_mut(&parent) {
                let earlier = match lb.changed_child {
                    Some(current) if self.tree.parent(current) == Some(parent) => {
                        self.tree.position_in_parent(child) < self.tree.position_in_parent(current)
                    }
                    _ => true,
                };
                lb.note_changed_child(child, earlier);
            }
            match self.tree.parent(parent) {
                Some(up) => {
                    child = parent;
                    parent = up;
                }
                None => break,
            }
        }
    }

    // ----- configuration --------------------------------------------------

    /// Apply configuration options to a box, in order.
    ///
    /// Consecutive font options form one font stack entry owned by the box.
    /// Returns the boxes created by [`BoxProperty::AddChild`].
    ///
    /// # Errors
    ///
    /// [`LayoutError::UnknownNode`] / [`LayoutError::NotABox`] for a bad
    /// node; errors of [`add_box`](Self::add_box) for `AddChild`.
    pub fn configure(
        &mut self,
        node: NodeId,
        properties: impl IntoIterator<Item = BoxProperty>,
    ) -> Result<Vec<NodeId>, LayoutError> {
        self.require_box(node)?;
        let mut pending: Option<FontRequest> = None;
        let mut restyle_needed = false;
        let mut added = Vec::new();

        for property in properties {
            if let Some(request) = font_request_for_option(&property) {
                pending.get_or_insert_with(FontRequest::default).merge(request);
                continue;
            }
            self.flush_font_request(&mut pending, node);
            match property {
                BoxProperty::List(op) => self.apply_list_op(op),
                BoxProperty::FontEnd => {
                    if !self.font_stack.pop() {
                        self.sink.report(Diagnostic::new(
                            Component::Builder,
                            DiagnosticKind::ParseRecoverable,
                            "font end without a matching font entry",
                        ));
                    }
                }
                BoxProperty::Style(text) => {
                    self.layout_box_mut(node)?.inline_style = Some(text);
                    restyle_needed = true;
                }
                BoxProperty::ChangedChild(child) => {
                    if self.tree.parent(child) == Some(node) {
                        self.mark_changed(node, child);
                    } else {
                        self.layout_box_mut(node)?.invalidate();
                        if let Some(parent) = self.tree.parent(node) {
                            self.mark_changed(parent, node);
                        }
                    }
                }
                BoxProperty::AddChild(element) => added.push(self.add_box(node, element)?),
                other => {
                    apply_presentational(&mut self.layout_box_mut(node)?.presentational, &other);
                    restyle_needed = true;
                }
            }
        }
        self.flush_font_request(&mut pending, node);

        if restyle_needed {
            self.restyle_box(node);
            self.layout_box_mut(node)?.invalidate();
            if let Some(parent) = self.tree.parent(node) {
                self.mark_changed(parent, node);
            }
        }
        Ok(added)
    }

    fn flush_font_request(&mut self, pending: &mut Option<FontRequest>, owner: NodeId) {
        if let Some(request) = pending.take() {
            let _ = self.font_stack.push(request, Some(owner));
        }
    }

    fn apply_list_op(&mut self, op: ListOp) {
        match op {
            ListOp::Push {
                kind,
                style,
                horizontal,
            } => self.list_stack.push_list(kind, style, horizontal),
            ListOp::Pop => {
                if !self.list_stack.pop_list() {
                    self.sink.report(Diagnostic::new(
                        Component::Builder,
                        DiagnosticKind::ParseRecoverable,
                        "list end without an open list",
                    ));
                }
            }
            ListOp::DefinitionTerm(active) => self.list_stack.set_definition_term(active),
        }
    }

    // ----- passes -----------------------------------------------------------

    /// Lay out the root box in a `width` x `height` viewport, reusing every
    /// line before the first changed child.
    ///
    /// # Errors
    ///
    /// [`LayoutError::Allocation`] if a cache cannot grow.
    pub fn layout(&mut self, width: f32, height: f32) -> Result<LayoutOutcome, LayoutError> {
        self.viewport = Rect::new(0.0, 0.0, width, height);
        let Some(root) = self.root() else {
            return Ok(LayoutOutcome {
                height: 0.0,
                needs_another_pass: false,
            });
        };
        self.layout_node(root, width, height, true)
    }

    /// Lay out one box. With `changed` false the box starts from its first
    /// line; with `changed` true it resumes from its changed child.
    ///
    /// # Errors
    ///
    /// [`LayoutError::UnknownNode`] / [`LayoutError::NotABox`] for a bad
    /// node, [`LayoutError::Allocation`] if a cache cannot grow.
    pub fn layout_node(
        &mut self,
        node: NodeId,
        available_width: f32,
        available_height: f32,
        changed: bool,
    ) -> Result<LayoutOutcome, LayoutError> {
        let lb = self.layout_box_mut(node)?;
        if !changed {
            lb.last_layout = None;
            lb.layout_ready = false;
        }
        if self.viewport.is_empty() {
            self.viewport = Rect::new(0.0, 0.0, available_width, available_height);
        }
        let mut pass = LayoutPass::new(self);
        let outcome = pass.layout_box(node, available_width, available_height)?;
        if let Some(lb) = self.boxes.get_mut(&node) {
            let margin = lb.dimensions.margin;
            if !lb.viewport_anchored && self.tree.parent(node) == Some(NodeId::ROOT) {
                lb.frame.x = margin.left;
                lb.frame.y = margin.top;
            }
        }
        Ok(outcome)
    }

    /// Preferred and minimum border-box widths of a box.
    ///
    /// # Errors
    ///
    /// [`LayoutError::UnknownNode`] / [`LayoutError::NotABox`].
    pub fn measure(
        &mut self,
        node: NodeId,
        available_width: f32,
        available_height: f32,
        changed: bool,
    ) -> Result<(f32, f32), LayoutError> {
        self.require_box(node)?;
        let mut pass = LayoutPass::new(self);
        Ok(pass.measure_box(node, available_width, available_height, changed))
    }

    /// Paint everything intersecting `clip`.
    ///
    /// With `changed`, only lines from the first one the last layout rewrote
    /// are painted; `clear` additionally repaints the background they sit on.
    ///
    /// # Errors
    ///
    /// Never fails on content; reserved for host lookups.
    pub fn render(&self, clip: Rect, changed: bool, clear: bool, painter: &mut dyn Painter) -> Result<(), LayoutError> {
        let Some(root) = self.root() else {
            return Ok(());
        };
        RenderPass::new(self, painter).render_root(root, clip, changed, clear);
        Ok(())
    }

    // ----- geometry queries -------------------------------------------------

    /// Final border box of a box relative to its parent's content box, or
    /// the first fragment of any other child.
    ///
    /// # Errors
    ///
    /// [`LayoutError::UnknownNode`] for freed ids and content never laid out.
    pub fn frame(&self, node: NodeId) -> Result<Rect, LayoutError> {
        if !self.tree.contains(node) {
            return Err(LayoutError::UnknownNode(node));
        }
        if let Some(lb) = self.boxes.get(&node) {
            return Ok(lb.frame);
        }
        let parent = self.tree.parent(node).ok_or(LayoutError::UnknownNode(node))?;
        self.boxes
            .get(&parent)
            .and_then(|lb| lb.fragments.iter().find(|f| f.child == node))
            .map(|f| f.rect)
            .ok_or(LayoutError::UnknownNode(node))
    }

    /// Frame of a node in viewport coordinates.
    ///
    /// # Errors
    ///
    /// As [`frame`](Self::frame).
    pub fn absolute_rect(&self, node: NodeId) -> Result<Rect, LayoutError> {
        let mut rect = self.frame(node)?;
        if self.boxes.get(&node).is_some_and(|lb| lb.viewport_anchored) {
            return Ok(rect);
        }
        for ancestor in self.tree.ancestors(node) {
            let Some(lb) = self.boxes.get(&ancestor) else {
                break;
            };
            rect = rect.translate(lb.frame.x + lb.dimensions.content.x, lb.frame.y + lb.dimensions.content.y);
            if lb.viewport_anchored {
                break;
            }
        }
        Ok(rect)
    }

    /// Line index of a box.
    ///
    /// # Errors
    ///
    /// [`LayoutError::UnknownNode`] / [`LayoutError::NotABox`].
    pub fn line_index(&self, node: NodeId) -> Result<&LineIndex, LayoutError> {
        self.layout_box(node).map(|lb| &lb.lines)
    }
}

/// Font entry for a box whose style sets font properties.
fn font_request_for_style(style: &BoxStyle) -> FontRequest {
    let mut request = FontRequest {
        size: style.font_size.map(|length| match length {
            Length::Px(px) => FontSize::Px(px),
            Length::Pt(_) => FontSize::Px(length.to_px(0.0, 0.0)),
            Length::Em(em) => FontSize::Scale(em),
            Length::Ex(ex) => FontSize::Scale(ex * 0.5),
            Length::Percent(p) => FontSize::Scale(p / 100.0),
        }),
        color: style.color,
        face: style.font_family.clone(),
        ..FontRequest::default()
    };
    match style.font_bold {
        Some(true) => request.set_flags |= FontFlags::BOLD,
        Some(false) => request.clear_flags |= FontFlags::BOLD,
        None => {}
    }
    match style.font_style {
        Some(FontStyle::Italic | FontStyle::Oblique) => request.set_flags |= FontFlags::ITALIC,
        Some(FontStyle::Normal) => request.clear_flags |= FontFlags::ITALIC,
        None => {}
    }
    let decorations = FontFlags::UNDERLINE | FontFlags::OVERLINE | FontFlags::LINE_THROUGH;
    match style.text_decoration {
        Some(TextDecoration::Underline) => request.set_flags |= FontFlags::UNDERLINE,
        Some(TextDecoration::Overline) => request.set_flags |= FontFlags::OVERLINE,
        Some(TextDecoration::LineThrough) => request.set_flags |= FontFlags::LINE_THROUGH,
        Some(TextDecoration::None) => request.clear_flags |= decorations,
        Some(TextDecoration::Blink) | None => {}
    }
    request
}

/// Font entry contribution of one configuration option, `None` for
/// options that are not about fonts.
fn font_request_for_option(property: &BoxProperty) -> Option<FontRequest> {
    let request = match property {
        BoxProperty::SetHardStyle(flags) => FontRequest {
            set_flags: *flags - FontFlags::FIXED,
            font_type: flags.contains(FontFlags::FIXED).then_some(FontType::Fixed),
            ..FontRequest::default()
        },
        BoxProperty::UnsetHardStyle(flags) => FontRequest {
            clear_flags: *flags - FontFlags::FIXED,
            font_type: flags.contains(FontFlags::FIXED).then_some(FontType::Normal),
            ..FontRequest::default()
        },
        BoxProperty::FontSize(px) => FontRequest {
            size: Some(FontSize::Px(*px)),
            ..FontRequest::default()
        },
        BoxProperty::FontSizeRel(steps) => FontRequest {
            size: Some(FontSize::steps(*steps)),
            ..FontRequest::default()
        },
        BoxProperty::FontColor(color) => FontRequest {
            color: Some(*color),
            ..FontRequest::default()
        },
        BoxProperty::FontFace(face) => FontRequest {
            face: Some(face.clone()),
            ..FontRequest::default()
        },
        _ => return None,
    };
    Some(request)
}

/// Write a box attribute option into the presentational style.
fn apply_presentational(style: &mut BoxStyle, property: &BoxProperty) {
    let px = |v: f32| Some(Length::Px(v));
    match property {
        BoxProperty::DivAlign(align) => style.text_align = Some(*align),
        BoxProperty::LeftMargin(v) => style.margin.left = px(*v),
        BoxProperty::TopMargin(v) => style.margin.top = px(*v),
        BoxProperty::BgColor(color) => style.background_color = Some(*color),
        BoxProperty::BgImage(reference) => style.background_image = Some(reference.clone()),
        BoxProperty::PaddingTop(v) => style.padding.top = px(*v),
        BoxProperty::PaddingRight(v) => style.padding.right = px(*v),
        BoxProperty::PaddingBottom(v) => style.padding.bottom = px(*v),
        BoxProperty::PaddingLeft(v) => style.padding.left = px(*v),
        BoxProperty::BorderWidth(v) => {
            style.border_width = Sides::uniform(px(*v));
            if style.border_style.is_none() {
                style.border_style = Some(BorderStyle::Solid);
            }
        }
        BoxProperty::BorderColor(color) => style.border_color = Some(*color),
        BoxProperty::BorderStyle(border) => style.border_style = Some(*border),
        BoxProperty::MinWidth(v) => style.min_width = px(*v),
        BoxProperty::MaxWidth(v) => style.max_width = px(*v),
        BoxProperty::MinHeight(v) => style.min_height = px(*v),
        BoxProperty::MaxHeight(v) => style.max_height = px(*v),
        BoxProperty::Position(position) => style.position = Some(*position),
        BoxProperty::Top(v) => style.offsets.top = px(*v),
        BoxProperty::Left(v) => style.offsets.left = px(*v),
        BoxProperty::Right(v) => style.offsets.right = px(*v),
        BoxProperty::Bottom(v) => style.offsets.bottom = px(*v),
        BoxProperty::ZIndex(z) => style.z_index = Some(*z),
        BoxProperty::Display(display) => style.display = Some(*display),
        BoxProperty::Overflow(overflow) => style.overflow = Some(*overflow),
        BoxProperty::Clear(clear) => style.clear = Some(*clear),
        BoxProperty::List(_)
        | BoxProperty::SetHardStyle(_)
        | BoxProperty::UnsetHardStyle(_)
        | BoxProperty::Style(_)
        | BoxProperty::FontSize(_)
        | BoxProperty::FontSizeRel(_)
        | BoxProperty::FontColor(_)
        | BoxProperty::FontFace(_)
        | BoxProperty::FontEnd
        | BoxProperty::ChangedChild(_)
        | BoxProperty::AddChild(_) => {}
    }
}
