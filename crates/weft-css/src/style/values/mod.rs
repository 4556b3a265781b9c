//! Typed CSS values.

mod color;
mod keywords;
mod length;

pub use color::Color;
pub(crate) use color::function_args;
pub use keywords::{
    BorderStyle, Clear, DisplayValue, Float, FontStyle, ListStyleType, Overflow, Position, TextAlign,
    TextDecoration, TextTransform, VerticalAlign, WhiteSpace, parse_keyword,
};
pub use length::Length;
