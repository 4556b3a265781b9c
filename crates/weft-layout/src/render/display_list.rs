//! Display list: a recording [`Painter`].
//!
//! [CSS 2.1 Appendix E](https://www.w3.org/TR/CSS2/zindex.html)
//!
//! Commands are stored back to front, so a host can replay them in order, or
//! a test can inspect what a render pass painted.

use serde::Serialize;
use weft_css::{BorderStyle, Color};
use weft_dom::{Bullet, NodeId};

use crate::box_model::{EdgeSizes, Rect};
use crate::font::{FontFlags, FontKey};
use crate::layout_box::LinkState;

use super::{Painter, TextRun};

/// A single drawing command. All rectangles are in viewport coordinates.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum DisplayCommand {
    /// Fill a rectangle with a solid color.
    FillRect {
        /// Area.
        rect: Rect,
        /// Fill color.
        color: Color,
    },
    /// Stroke the border of a box.
    Border {
        /// Border box.
        rect: Rect,
        /// Width of each side.
        widths: EdgeSizes,
        /// Border color.
        color: Color,
        /// Line style.
        style: BorderStyle,
    },
    /// Draw a background image.
    Image {
        /// Area.
        rect: Rect,
        /// Image reference.
        url: String,
    },
    /// Draw a run of text.
    Text {
        /// Area of the run.
        rect: Rect,
        /// Baseline y.
        baseline: f32,
        /// The characters.
        text: String,
        /// Font.
        font: FontKey,
        /// Style bits, including decorations.
        flags: FontFlags,
        /// Text color.
        color: Color,
        /// Link state if inside a link.
        link: Option<LinkState>,
    },
    /// Draw a list marker.
    Marker {
        /// Area.
        rect: Rect,
        /// What to draw.
        bullet: Bullet,
        /// Color.
        color: Color,
    },
    /// Externally painted content.
    Replaced {
        /// The content node.
        node: NodeId,
        /// What it is.
        kind: String,
        /// Area.
        rect: Rect,
        /// Clip in effect.
        clip: Rect,
        /// Background the content sits on.
        background: Option<Color>,
    },
    /// Push a clip rectangle.
    ///
    /// [§ 11.1.1 overflow](https://www.w3.org/TR/CSS2/visufx.html#overflow)
    PushClip {
        /// Clip rectangle.
        rect: Rect,
    },
    /// Pop the most recent clip rectangle.
    PopClip,
}

/// A list of drawing commands in painting order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DisplayList {
    commands: Vec<DisplayCommand>,
}

impl DisplayList {
    /// Create an empty display list.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            commands: Vec::new(),
        }
    }

    /// Get the commands in painting order.
    #[must_use]
    pub fn commands(&self) -> &[DisplayCommand] {
        &self.commands
    }

    /// Get the number of commands.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.commands.len()
    }

    /// Check if the display list is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Text of every text command, in painting order.
    #[must_use]
    pub fn texts(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DisplayCommand::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl Painter for DisplayList {
    fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.commands.push(DisplayCommand::FillRect { rect, color });
    }

    fn border(&mut self, rect: Rect, widths: EdgeSizes, color: Color, style: BorderStyle) {
        self.commands.push(DisplayCommand::Border {
            rect,
            widths,
            color,
            style,
        });
    }

    fn image(&mut self, rect: Rect, url: &str) {
        self.commands.push(DisplayCommand::Image {
            rect,
            url: url.to_string(),
        });
    }

    fn text(&mut self, run: &TextRun<'_>) {
        self.commands.push(DisplayCommand::Text {
            rect: run.rect,
            baseline: run.baseline,
            text: run.text.to_string(),
            font: run.font.clone(),
            flags: run.flags,
            color: run.color,
            link: run.link,
        });
    }

    fn marker(&mut self, rect: Rect, bullet: &Bullet, color: Color) {
        self.commands.push(DisplayCommand::Marker {
            rect,
            bullet: bullet.clone(),
            color,
        });
    }

    fn replaced(&mut self, node: NodeId, kind: &str, rect: Rect, clip: Rect, background: Option<Color>) {
        self.commands.push(DisplayCommand::Replaced {
            node,
            kind: kind.to_string(),
            rect,
            clip,
            background,
        });
    }

    fn push_clip(&mut self, rect: Rect) {
        self.commands.push(DisplayCommand::PushClip { rect });
    }

    fn pop_clip(&mut self) {
        self.commands.push(DisplayCommand::PopClip);
    }
}
