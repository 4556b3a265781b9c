//! Box style attributes and typed CSS values.

mod box_style;
/// Typed values: colors, lengths and keyword sets.
pub mod values;

pub use box_style::{BoxStyle, DEFAULT_FONT_SIZE_PX, Sides, split_value};
