//! Box geometry.
//!
//! [CSS 2.1 § 8 Box model](https://www.w3.org/TR/CSS2/box.html)
//!
//! A box's frame is its border box, positioned relative to the content box
//! of its parent. Its [`BoxDimensions`] keep the resolved edges so the
//! content and padding boxes can be recovered without re-resolving styles.

use serde::Serialize;
use weft_css::{BoxStyle, Length, Sides};

/// An axis-aligned rectangle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Rect {
    /// Horizontal position of the top-left corner.
    pub x: f32,
    /// Vertical position of the top-left corner.
    pub y: f32,
    /// Width of the rectangle.
    pub width: f32,
    /// Height of the rectangle.
    pub height: f32,
}

impl Rect {
    /// Build a rectangle.
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Right edge.
    #[must_use]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Bottom edge.
    #[must_use]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Whether the rectangle covers no area.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// The same rectangle moved by `(dx, dy)`.
    #[must_use]
    pub fn translate(&self, dx: f32, dy: f32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..*self
        }
    }

    /// Whether the two rectangles share any area.
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        self.x < other.right() && other.x < self.right() && self.y < other.bottom() && other.y < self.bottom()
    }

    /// Overlap of the two rectangles; zero-sized when they do not meet.
    #[must_use]
    pub fn intersect(&self, other: &Self) -> Self {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        Self {
            x,
            y,
            width: (right - x).max(0.0),
            height: (bottom - y).max(0.0),
        }
    }
}

/// Edge sizes for padding, border, or margin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct EdgeSizes {
    /// Top edge size.
    pub top: f32,
    /// Right edge size.
    pub right: f32,
    /// Bottom edge size.
    pub bottom: f32,
    /// Left edge size.
    pub left: f32,
}

impl EdgeSizes {
    /// Resolve a set of optional lengths; unset sides are zero.
    ///
    /// Percentages refer to the containing block width on every side, as
    /// [§ 8.3](https://www.w3.org/TR/CSS2/box.html#margin-properties) specifies
    /// for both margins and padding.
    #[must_use]
    pub fn resolve(sides: &Sides<Option<Length>>, font_size: f32, containing_width: f32) -> Self {
        let px = |l: Option<Length>| l.map_or(0.0, |l| l.to_px(font_size, containing_width));
        Self {
            top: px(sides.top),
            right: px(sides.right),
            bottom: px(sides.bottom),
            left: px(sides.left),
        }
    }

    /// Left plus right.
    #[must_use]
    pub fn horizontal(&self) -> f32 {
        self.left + self.right
    }

    /// Top plus bottom.
    #[must_use]
    pub fn vertical(&self) -> f32 {
        self.top + self.bottom
    }
}

/// Resolved edges and content size of one laid out box.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct BoxDimensions {
    /// Content area, relative to the border box origin.
    pub content: Rect,
    /// Padding widths.
    pub padding: EdgeSizes,
    /// Border widths.
    pub border: EdgeSizes,
    /// Margin widths.
    pub margin: EdgeSizes,
}

impl BoxDimensions {
    /// Resolve the edges of a box whose containing block is `containing_width` wide.
    ///
    /// [§ 8.5.3](https://www.w3.org/TR/CSS2/box.html#border-style-properties):
    /// "if the border style is 'none', the computed value of the width is '0'."
    #[must_use]
    pub fn resolve_edges(style: &BoxStyle, font_size: f32, containing_width: f32) -> Self {
        let border = if style.border_style.is_some_and(|s| s.is_visible()) {
            EdgeSizes::resolve(&style.border_width, font_size, containing_width)
        } else {
            EdgeSizes::default()
        };
        let padding = EdgeSizes::resolve(&style.padding, font_size, containing_width);
        Self {
            content: Rect::new(border.left + padding.left, border.top + padding.top, 0.0, 0.0),
            padding,
            border,
            margin: EdgeSizes::resolve(&style.margin, font_size, containing_width),
        }
    }

    /// Padding plus border on the left and right.
    #[must_use]
    pub fn horizontal_chrome(&self) -> f32 {
        self.padding.horizontal() + self.border.horizontal()
    }

    /// Padding plus border on the top and bottom.
    #[must_use]
    pub fn vertical_chrome(&self) -> f32 {
        self.padding.vertical() + self.border.vertical()
    }

    /// Set the content size; the content origin stays inside the edges.
    pub fn set_content_size(&mut self, width: f32, height: f32) {
        self.content.width = width.max(0.0);
        self.content.height = height.max(0.0);
    }

    /// [§ 8.1](https://www.w3.org/TR/CSS2/box.html#box-dimensions)
    /// "The padding edge surrounds the box padding."
    ///
    /// Relative to the border box origin.
    #[must_use]
    pub fn padding_box(&self) -> Rect {
        Rect {
            x: self.content.x - self.padding.left,
            y: self.content.y - self.padding.top,
            width: self.content.width + self.padding.horizontal(),
            height: self.content.height + self.padding.vertical(),
        }
    }

    /// [§ 8.1](https://www.w3.org/TR/CSS2/box.html#box-dimensions)
    /// "The border edge surrounds the box's border."
    ///
    /// Always has its origin at `(0, 0)`.
    #[must_use]
    pub fn border_box(&self) -> Rect {
        Rect {
            x: 0.0,
            y: 0.0,
            width: self.content.width + self.horizontal_chrome(),
            height: self.content.height + self.vertical_chrome(),
        }
    }

    /// Width including margins.
    #[must_use]
    pub fn margin_box_width(&self) -> f32 {
        self.border_box().width + self.margin.horizontal()
    }

    /// Height including margins.
    #[must_use]
    pub fn margin_box_height(&self) -> f32 {
        self.border_box().height + self.margin.vertical()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_css::BorderStyle;

    #[test]
    fn test_border_width_needs_a_visible_style() {
        let mut style = BoxStyle {
            border_width: Sides::uniform(Some(Length::Px(3.0))),
            padding: Sides::uniform(Some(Length::Px(2.0))),
            ..BoxStyle::default()
        };
        let dims = BoxDimensions::resolve_edges(&style, 16.0, 100.0);
        assert!((dims.border.left).abs() < f32::EPSILON);

        style.border_style = Some(BorderStyle::Solid);
        let mut dims = BoxDimensions::resolve_edges(&style, 16.0, 100.0);
        dims.set_content_size(50.0, 10.0);
        assert!((dims.content.x - 5.0).abs() < f32::EPSILON);
        assert!((dims.border_box().width - 60.0).abs() < f32::EPSILON);
        assert_eq!(dims.padding_box(), Rect::new(3.0, 3.0, 54.0, 14.0));
    }

    #[test]
    fn test_percent_padding_uses_containing_width() {
        let style = BoxStyle {
            padding: Sides::uniform(Some(Length::Percent(10.0))),
            ..BoxStyle::default()
        };
        let dims = BoxDimensions::resolve_edges(&style, 16.0, 200.0);
        assert!((dims.padding.top - 20.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_rect_intersection() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(5.0, 5.0, 10.0, 10.0);
        assert!(a.intersects(&b));
        assert_eq!(a.intersect(&b), Rect::new(5.0, 5.0, 5.0, 5.0));
        let far = Rect::new(20.0, 0.0, 1.0, 1.0);
        assert!(!a.intersects(&far));
        assert!(a.intersect(&far).is_empty());
    }
}
