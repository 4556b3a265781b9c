//! The box configuration surface.
//!
//! The tree builder describes presentational markup to the engine as a list
//! of [`BoxProperty`] values passed to
//! [`Document::configure`](crate::Document::configure). Box attributes land
//! in the box's presentational style, which the cascade then refines; font
//! and list options drive the document stacks.

use weft_css::{BorderStyle, Clear, Color, DisplayValue, ListStyleType, Overflow, Position, TextAlign};
use weft_dom::{ElementData, NodeId};

use crate::font::FontFlags;
use crate::list_stack::ListKind;

/// List stack operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListOp {
    /// Open a list.
    Push {
        /// Kind of list.
        kind: ListKind,
        /// Explicit marker style.
        style: Option<ListStyleType>,
        /// Items flow side by side.
        horizontal: bool,
    },
    /// Close the innermost list.
    Pop,
    /// Enter (`true`) or leave a definition term.
    DefinitionTerm(bool),
}

/// One configuration option.
#[derive(Debug, Clone, PartialEq)]
pub enum BoxProperty {
    /// Text alignment of the box's lines.
    DivAlign(TextAlign),
    /// Left margin in pixels.
    LeftMargin(f32),
    /// Top margin in pixels.
    TopMargin(f32),
    /// Background color.
    BgColor(Color),
    /// Background image reference.
    BgImage(String),
    /// Top padding in pixels.
    PaddingTop(f32),
    /// Right padding in pixels.
    PaddingRight(f32),
    /// Bottom padding in pixels.
    PaddingBottom(f32),
    /// Left padding in pixels.
    PaddingLeft(f32),
    /// Border width on all sides, in pixels.
    BorderWidth(f32),
    /// Border color.
    BorderColor(Color),
    /// Border style.
    BorderStyle(BorderStyle),
    /// Minimum width in pixels.
    MinWidth(f32),
    /// Maximum width in pixels.
    MaxWidth(f32),
    /// Minimum height in pixels.
    MinHeight(f32),
    /// Maximum height in pixels.
    MaxHeight(f32),
    /// Positioning scheme.
    Position(Position),
    /// Top offset in pixels.
    Top(f32),
    /// Left offset in pixels.
    Left(f32),
    /// Right offset in pixels.
    Right(f32),
    /// Bottom offset in pixels.
    Bottom(f32),
    /// Paint order among positioned siblings.
    ZIndex(i32),
    /// Display keyword.
    Display(DisplayValue),
    /// Overflow keyword.
    Overflow(Overflow),
    /// Clear keyword.
    Clear(Clear),
    /// List stack operation.
    List(ListOp),
    /// Add hard style bits (`<b>`, `<i>`, `<u>`).
    SetHardStyle(FontFlags),
    /// Remove hard style bits.
    UnsetHardStyle(FontFlags),
    /// Inline `style` attribute text.
    Style(String),
    /// Absolute font size in pixels.
    FontSize(f32),
    /// Relative font size in legacy steps (`+1`, `-2`).
    FontSizeRel(i32),
    /// Text color.
    FontColor(Color),
    /// Face name.
    FontFace(String),
    /// Pop one font entry.
    FontEnd,
    /// Flag a child whose content changed since the last layout.
    ChangedChild(NodeId),
    /// Append a child box.
    AddChild(ElementData),
}

impl BoxProperty {
    /// Whether this option contributes to a font stack entry.
    #[must_use]
    pub const fn is_font_option(&self) -> bool {
        matches!(
            self,
            Self::SetHardStyle(_)
                | Self::UnsetHardStyle(_)
                | Self::FontSize(_)
                | Self::FontSizeRel(_)
                | Self::FontColor(_)
                | Self::FontFace(_)
        )
    }
}
