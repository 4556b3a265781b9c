//! Render pass.
//!
//! [CSS 2.1 Appendix E.2 Painting order](https://www.w3.org/TR/CSS2/zindex.html#painting-order)
//!
//! Painting is delegated to a host [`Painter`]. Each box paints its
//! background and border, then its children:
//!
//! 1. positioned children with a negative `z-index`
//! 2. in-flow content, line by line
//! 3. the remaining positioned children, lowest `z-index` first
//!
//! Positioned children of equal `z-index` keep tree order.

mod display_list;

pub use display_list::{DisplayCommand, DisplayList};

use weft_css::{BorderStyle, Color, DisplayValue, Overflow, Position};
use weft_dom::{Bullet, NodeId, NodeType};

use crate::box_model::{EdgeSizes, Rect};
use crate::document::Document;
use crate::font::{FontFlags, FontKey};
use crate::layout_box::{Fragment, FragmentKind, LayoutBox, LinkState};

/// A run of text handed to the painter.
#[derive(Debug, Clone, Copy)]
pub struct TextRun<'a> {
    /// Area of the run in viewport coordinates.
    pub rect: Rect,
    /// Baseline y in viewport coordinates.
    pub baseline: f32,
    /// The characters.
    pub text: &'a str,
    /// Font the run is set in.
    pub font: &'a FontKey,
    /// Style bits, including decorations.
    pub flags: FontFlags,
    /// Text color.
    pub color: Color,
    /// Link state when inside a link.
    pub link: Option<LinkState>,
}

/// Drawing capability supplied by the host.
///
/// Rectangles are in viewport coordinates.
pub trait Painter {
    /// Fill a rectangle.
    fn fill_rect(&mut self, rect: Rect, color: Color);

    /// Stroke a box border.
    fn border(&mut self, rect: Rect, widths: EdgeSizes, color: Color, style: BorderStyle);

    /// Draw a background image.
    fn image(&mut self, rect: Rect, url: &str);

    /// Draw text.
    fn text(&mut self, run: &TextRun<'_>);

    /// Draw a list marker.
    fn marker(&mut self, rect: Rect, bullet: &Bullet, color: Color);

    /// Paint replaced content. `background` is the nearest background it
    /// sits on, for hosts that composite.
    fn replaced(&mut self, node: NodeId, kind: &str, rect: Rect, clip: Rect, background: Option<Color>);

    /// Clip everything until the matching [`pop_clip`](Self::pop_clip).
    fn push_clip(&mut self, rect: Rect);

    /// End the innermost clip.
    fn pop_clip(&mut self);
}

/// Where a box paints and what it paints over.
#[derive(Debug, Clone, Copy)]
struct PaintScope {
    /// Origin of the parent content box in viewport coordinates.
    origin: (f32, f32),
    clip: Rect,
    background: Option<Color>,
}

pub(crate) struct RenderPass<'a, 'p> {
    document: &'a Document,
    painter: &'p mut dyn Painter,
}

impl<'a, 'p> RenderPass<'a, 'p> {
    pub(crate) fn new(document: &'a Document, painter: &'p mut dyn Painter) -> Self {
        Self { document, painter }
    }

    pub(crate) fn render_root(&mut self, root: NodeId, clip: Rect, changed: bool, clear: bool) {
        let scope = PaintScope {
            origin: (0.0, 0.0),
            clip,
            background: None,
        };
        self.render_box(root, scope, changed, clear);
    }

    fn render_box(&mut self, node: NodeId, scope: PaintScope, changed: bool, clear: bool) {
        let document = self.document;
        let Some(lb) = document.boxes.get(&node) else {
            return;
        };
        if lb.style.display == Some(DisplayValue::None) {
            return;
        }
        let origin = if lb.viewport_anchored { (0.0, 0.0) } else { scope.origin };
        let border_box = lb.frame.translate(origin.0, origin.1);
        let dims = &lb.dimensions;
        let background = lb
            .style
            .background_color
            .filter(|c| !c.is_transparent());

        // STEP 1: Background and border, unless only the changed lines are
        // repainted.
        // [Appendix E.2](https://www.w3.org/TR/CSS2/zindex.html#painting-order)
        // "the background color of the element... the background image of the
        // element... the border of the element"
        if !changed && border_box.intersects(&scope.clip) {
            self.paint_decorations(lb, border_box, background);
        }

        let content_origin = (border_box.x + dims.content.x, border_box.y + dims.content.y);
        let padding = dims.padding_box().translate(border_box.x, border_box.y);
        let clips = lb.style.overflow.is_some_and(Overflow::clips);
        let child_scope = PaintScope {
            origin: content_origin,
            clip: if clips { scope.clip.intersect(&padding) } else { scope.clip },
            background: background.or(scope.background),
        };
        if clips {
            self.painter.push_clip(padding);
        }

        // STEP 2: Pick the first line to paint.
        let start_line = if changed {
            self.first_repaint_line(lb, content_origin, &child_scope, clear)
        } else {
            0
        };

        // STEP 3: Positioned children by stack level.
        let positioned = self.positioned_children(node);
        for &(child, _) in positioned.iter().filter(|(_, z)| *z < 0) {
            self.render_box(child, child_scope, false, false);
        }
        for fragment in lb.fragments.iter().filter(|f| f.line >= start_line) {
            self.render_fragment(fragment, &child_scope);
        }
        for &(child, _) in positioned.iter().filter(|(_, z)| *z >= 0) {
            self.render_box(child, child_scope, false, false);
        }

        if clips {
            self.painter.pop_clip();
        }
    }

    fn paint_decorations(&mut self, lb: &LayoutBox, border_box: Rect, background: Option<Color>) {
        if let Some(color) = background {
            self.painter.fill_rect(border_box, color);
        }
        if let Some(url) = &lb.style.background_image {
            self.painter.image(border_box, url);
        }
        let widths = lb.dimensions.border;
        if widths.horizontal() + widths.vertical() > 0.0 {
            let color = lb
                .style
                .border_color
                .or(lb.style.color)
                .unwrap_or(lb.context.color);
            let style = lb.style.border_style.unwrap_or(BorderStyle::Solid);
            self.painter.border(border_box, widths, color, style);
        }
    }

    /// First line the last layout rewrote. With `clear`, backs up past lines
    /// beside floats, whose float state was rebuilt, and repaints the
    /// background below.
    fn first_repaint_line(&mut self, lb: &LayoutBox, content_origin: (f32, f32), scope: &PaintScope, clear: bool) -> usize {
        let mut line = lb.first_touched_line;
        if !clear {
            return line;
        }
        while line > 0 && lb.lines.get(line).is_some_and(|r| r.has_floats) {
            line -= 1;
        }
        let top = lb.lines.get(line).map_or(lb.dimensions.content.height, |r| r.y);
        let exposed = Rect::new(
            content_origin.0,
            content_origin.1 + top,
            lb.dimensions.content.width,
            (lb.dimensions.content.height - top).max(0.0),
        );
        if let Some(color) = scope.background
            && !exposed.is_empty()
        {
            self.painter.fill_rect(exposed.intersect(&scope.clip), color);
        }
        line
    }

    /// Positioned children with their stack levels, stably sorted.
    fn positioned_children(&self, node: NodeId) -> Vec<(NodeId, i32)> {
        let document = self.document;
        let mut positioned: Vec<(NodeId, i32)> = document
            .tree
            .children(node)
            .iter()
            .filter_map(|&child| {
                let lb = document.boxes.get(&child)?;
                lb.style
                    .position
                    .filter(|p| *p != Position::Static)
                    .map(|_| (child, lb.style.z_index.unwrap_or(0)))
            })
            .collect();
        positioned.sort_by_key(|&(_, z)| z);
        positioned
    }

    fn render_fragment(&mut self, fragment: &Fragment, scope: &PaintScope) {
        let document = self.document;
        let rect = fragment.rect.translate(scope.origin.0, scope.origin.1);
        match &fragment.kind {
            FragmentKind::Box => {
                let relative = document
                    .boxes
                    .get(&fragment.child)
                    .is_some_and(|lb| lb.style.position == Some(Position::Relative));
                if !relative {
                    self.render_box(fragment.child, *scope, false, false);
                }
            }
            FragmentKind::Text { start, end } => {
                if !rect.intersects(&scope.clip) {
                    return;
                }
                let Some(text) = document.tree.as_text(fragment.child) else {
                    return;
                };
                let Some(ctx) = document.contexts.get(&fragment.child) else {
                    return;
                };
                let Some(font) = document.fonts.get(ctx.font) else {
                    return;
                };
                let Some(slice) = text.get(*start..*end) else {
                    return;
                };
                self.painter.text(&TextRun {
                    rect,
                    baseline: rect.y + fragment.baseline,
                    text: slice,
                    font,
                    flags: ctx.flags,
                    color: ctx.color,
                    link: ctx.link,
                });
            }
            FragmentKind::Marker => {
                if !rect.intersects(&scope.clip) {
                    return;
                }
                let Some(NodeType::Marker(bullet)) = document.tree.get(fragment.child).map(|n| &n.node_type) else {
                    return;
                };
                let color = document
                    .contexts
                    .get(&fragment.child)
                    .map_or(Color::BLACK, |ctx| ctx.color);
                self.painter.marker(rect, bullet, color);
            }
            FragmentKind::Replaced => {
                if !rect.intersects(&scope.clip) {
                    return;
                }
                let Some(NodeType::Replaced(data)) = document.tree.get(fragment.child).map(|n| &n.node_type) else {
                    return;
                };
                self.painter
                    .replaced(fragment.child, &data.kind, rect, scope.clip, scope.background);
            }
            FragmentKind::Break => {}
        }
    }
}
