//! Intrinsic widths.
//!
//! [§ 10.3.5](https://www.w3.org/TR/CSS2/visudet.html#float-width)
//!
//! "Roughly: calculate the preferred width by formatting the content without
//! breaking lines other than where explicit line breaks occur, and also
//! calculate the preferred minimum width, e.g., by trying all possible line
//! breaks."
//!
//! Measuring never moves or resizes anything; the only state it keeps is
//! the box's [`MeasureCache`].

use weft_css::WhiteSpace;
use weft_dom::NodeId;

use crate::box_model::BoxDimensions;
use crate::flow::{ChildRole, LayoutPass};
use crate::layout_box::MeasureCache;
use crate::text::TextMeasure;

/// Width of the line being measured.
#[derive(Default)]
struct Run {
    preferred: f32,
    minimum: f32,
    line: f32,
    open: bool,
}

impl Run {
    fn add(&mut self, indent: f32, width: f32, unbreakable: f32) {
        if !self.open {
            self.line = indent;
            self.open = true;
        }
        self.line += width;
        self.minimum = self.minimum.max(indent + unbreakable);
    }

    fn flush(&mut self) {
        self.preferred = self.preferred.max(self.line);
        self.line = 0.0;
        self.open = false;
    }
}

impl LayoutPass<'_> {
    /// Preferred and minimum border-box widths of `node`.
    ///
    /// With `changed`, a box with no changed descendant answers from its
    /// cache.
    pub(crate) fn measure_box(
        &mut self,
        node: NodeId,
        available_width: f32,
        available_height: f32,
        changed: bool,
    ) -> (f32, f32) {
        let Some(lb) = self.boxes.get(&node) else {
            return (0.0, 0.0);
        };
        if changed
            && lb.changed_child.is_none()
            && let Some(cache) = lb.measure_cache
            && (cache.available_width - available_width).abs() < 0.01
        {
            return (cache.preferred, cache.minimum);
        }

        let font_size = lb.context.font_size;
        let style = &lb.style;
        let dims = BoxDimensions::resolve_edges(style, font_size, available_width);
        let chrome = dims.horizontal_chrome();
        let explicit = style.width.map(|w| w.to_px(font_size, available_width));
        let min_width = style.min_width.map(|w| w.to_px(font_size, available_width));
        let max_width = style.max_width.map(|w| w.to_px(font_size, available_width));

        let (mut preferred, mut minimum) = match explicit {
            Some(width) => (width, width),
            None => {
                let room = (available_width - dims.margin.horizontal() - chrome).max(0.0);
                self.measure_content(node, room, available_height, changed)
            }
        };
        if let Some(max) = max_width {
            preferred = preferred.min(max);
            minimum = minimum.min(max);
        }
        if let Some(min) = min_width {
            preferred = preferred.max(min);
            minimum = minimum.max(min);
        }
        let preferred = preferred + chrome;
        let minimum = minimum + chrome;

        if let Some(lb) = self.boxes.get_mut(&node) {
            lb.measure_cache = Some(MeasureCache {
                available_width,
                preferred,
                minimum,
            });
        }
        (preferred, minimum)
    }

    fn measure_content(&mut self, node: NodeId, room: f32, available_height: f32, changed: bool) -> (f32, f32) {
        let tree = self.tree;
        let mut run = Run::default();
        for &child in tree.children(node) {
            if !self.step() {
                break;
            }
            let indent = self.child_indent(child);
            match self.role(child) {
                ChildRole::Hidden | ChildRole::OutOfFlow => {}
                ChildRole::Break(_) => run.flush(),
                ChildRole::Text(text) => {
                    let Some(ctx) = self.content_context(child) else {
                        continue;
                    };
                    let key = self.font_key(ctx);
                    let measure = TextMeasure {
                        font: &key,
                        metrics: self.metrics,
                        white_space: ctx.white_space,
                    };
                    let widest = measure.widest_word(text);
                    if ctx.white_space == WhiteSpace::Pre {
                        for (i, segment) in text.split('\n').enumerate() {
                            if i > 0 {
                                run.flush();
                            }
                            run.add(indent, measure.width(segment), widest);
                        }
                    } else {
                        let text = if run.open { text } else { text.trim_start() };
                        run.add(indent, measure.width(text), widest);
                    }
                }
                ChildRole::Marker(bullet) => {
                    if let Some(ctx) = self.content_context(child) {
                        let width = self.marker_width(bullet, ctx);
                        run.add(indent, width, width);
                    }
                }
                ChildRole::Replaced(data) => {
                    let (width, _, _) = self.replaced_size(data);
                    run.add(indent, width, width);
                }
                ChildRole::Atom | ChildRole::Float(_) => {
                    let (preferred, minimum) = self.measure_box(child, room, available_height, changed);
                    let margins = self.margin_width(child, room);
                    run.add(indent, preferred + margins, minimum + margins);
                }
                ChildRole::Block => {
                    run.flush();
                    let (preferred, minimum) = self.measure_box(child, room, available_height, changed);
                    let margins = self.margin_width(child, room);
                    run.add(indent, preferred + margins, minimum + margins);
                    run.flush();
                }
            }
        }
        run.flush();
        (run.preferred, run.minimum)
    }

    fn child_indent(&self, child: NodeId) -> f32 {
        let level = self
            .boxes
            .get(&child)
            .map(|lb| lb.context.indent)
            .or_else(|| self.contexts.get(&child).map(|ctx| ctx.indent))
            .unwrap_or(0);
        level as f32 * self.config.indent_width
    }

    fn margin_width(&self, child: NodeId, room: f32) -> f32 {
        self.edges(child, room)
            .map_or(0.0, |(dims, _, _)| dims.margin.horizontal())
    }
}
