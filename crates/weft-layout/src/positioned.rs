//! Positioned children.
//!
//! [§ 9.3 Positioning schemes](https://www.w3.org/TR/CSS2/visuren.html#positioning-scheme)
//!
//! Absolute and fixed boxes are laid out once their parent's size is known,
//! against the parent's padding box or the viewport. Relative boxes take
//! part in the flow and are shifted afterwards without moving anything else.

use weft_css::{Length, Position, Sides};
use weft_dom::NodeId;

use crate::box_model::{BoxDimensions, Rect};
use crate::error::LayoutError;
use crate::flow::{ChildRole, LayoutPass};
use crate::layout_box::{Fragment, FragmentKind};

/// Offsets resolved against a containing block; `None` is `auto`.
struct ResolvedOffsets {
    top: Option<f32>,
    right: Option<f32>,
    bottom: Option<f32>,
    left: Option<f32>,
}

impl ResolvedOffsets {
    fn resolve(offsets: &Sides<Option<Length>>, font_size: f32, width: f32, height: f32) -> Self {
        Self {
            top: offsets.top.map(|l| l.to_px(font_size, height)),
            right: offsets.right.map(|l| l.to_px(font_size, width)),
            bottom: offsets.bottom.map(|l| l.to_px(font_size, height)),
            left: offsets.left.map(|l| l.to_px(font_size, width)),
        }
    }
}

impl LayoutPass<'_> {
    /// [§ 10.3.7 Absolutely positioned, non-replaced elements](https://www.w3.org/TR/CSS2/visudet.html#abs-non-replaced-width)
    ///
    /// Size and place every absolute or fixed child of `node`, whose own
    /// size is final. Top and left win over bottom and right; a box with
    /// neither keeps its static position.
    ///
    /// Returns whether any of them wants another pass.
    pub(crate) fn place_out_of_flow(&mut self, node: NodeId, dims: &BoxDimensions) -> Result<bool, LayoutError> {
        let tree = self.tree;
        let padding = dims.padding_box();
        // Padding box in the content coordinates child frames use.
        let padding_box = Rect::new(
            padding.x - dims.content.x,
            padding.y - dims.content.y,
            padding.width,
            padding.height,
        );
        let mut pending = false;

        for &child in tree.children(node) {
            if !matches!(self.role(child), ChildRole::OutOfFlow) {
                continue;
            }
            let Some(lb) = self.boxes.get(&child) else {
                continue;
            };
            let fixed = lb.style.position == Some(Position::Fixed);
            let containing = if fixed { self.viewport } else { padding_box };
            let offsets = ResolvedOffsets::resolve(
                &lb.style.offsets,
                lb.context.font_size,
                containing.width,
                containing.height,
            );
            let stretch = lb.style.width.is_none() && offsets.left.is_some() && offsets.right.is_some();
            let (static_x, static_y) = if fixed { (0.0, 0.0) } else { lb.static_position };

            // STEP 1: Width. Explicit, stretched between both offsets, or
            // shrink-to-fit.
            let outcome = if stretch {
                let (edges, _, _) = self.edges(child, containing.width)?;
                let width = containing.width
                    - offsets.left.unwrap_or(0.0)
                    - offsets.right.unwrap_or(0.0)
                    - edges.margin.horizontal()
                    - edges.horizontal_chrome();
                self.layout_sized(child, containing.width, containing.height, width, edges)?
            } else if self.boxes.get(&child).is_some_and(|lb| lb.style.width.is_some()) {
                self.layout_box(child, containing.width, containing.height)?
            } else {
                self.layout_shrink_to_fit(child, containing.width, containing.height)?
            };
            pending |= outcome.needs_another_pass;

            // STEP 2: Place against the containing block.
            let lb = self.boxes.get_mut(&child).ok_or(LayoutError::NotABox(child))?;
            let margin = lb.dimensions.margin;
            let x = match (offsets.left, offsets.right) {
                (Some(left), _) => containing.x + left + margin.left,
                (None, Some(right)) => containing.right() - right - margin.right - lb.frame.width,
                (None, None) => containing.x.max(static_x) + margin.left,
            };
            let y = match (offsets.top, offsets.bottom) {
                (Some(top), _) => containing.y + top + margin.top,
                (None, Some(bottom)) => containing.bottom() - bottom - margin.bottom - lb.frame.height,
                (None, None) => containing.y.max(static_y) + margin.top,
            };
            lb.frame.x = x;
            lb.frame.y = y;
            lb.viewport_anchored = fixed;
            log::trace!(target: "weft::layout", "positioned {child:?} at ({x}, {y}) fixed={fixed}");
        }
        Ok(pending)
    }

    /// [§ 9.4.3 Relative positioning](https://www.w3.org/TR/CSS2/visuren.html#relative-positioning)
    ///
    /// "Once a box has been laid out according to the normal flow or
    /// floated, it may be shifted relative to this position."
    pub(crate) fn apply_relative_offsets(&mut self, fragments: &mut [Fragment], width: f32, height: f32) {
        for fragment in fragments.iter_mut().filter(|f| f.kind == FragmentKind::Box) {
            let Some(lb) = self.boxes.get_mut(&fragment.child) else {
                continue;
            };
            if lb.style.position != Some(Position::Relative) {
                continue;
            }
            let offsets = ResolvedOffsets::resolve(&lb.style.offsets, lb.context.font_size, width, height);
            let dx = offsets.left.or(offsets.right.map(|r| -r)).unwrap_or(0.0);
            let dy = offsets.top.or(offsets.bottom.map(|b| -b)).unwrap_or(0.0);
            fragment.rect = fragment.rect.translate(dx, dy);
            lb.frame = lb.frame.translate(dx, dy);
        }
    }
}
