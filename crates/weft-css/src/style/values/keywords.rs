//! Keyword-valued properties.
//!
//! Each enum parses case-insensitively from its CSS spelling through
//! `strum`'s `FromStr` derive.

use std::str::FromStr;

use serde::Serialize;
use strum_macros::{Display, EnumString};

/// Parse a keyword value, ignoring surrounding whitespace.
pub fn parse_keyword<T: FromStr>(value: &str) -> Option<T> {
    value.trim().parse().ok()
}

/// [§ 16.2 text-align](https://www.w3.org/TR/CSS2/text.html#alignment-prop)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Display, EnumString)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
#[serde(rename_all = "kebab-case")]
pub enum TextAlign {
    /// Flush left.
    #[default]
    Left,
    /// Centered in the line.
    Center,
    /// Flush right.
    Right,
    /// Treated as left; inter-word stretching is not performed.
    Justify,
}

/// [§ 9.3.1 position](https://www.w3.org/TR/CSS2/visuren.html#choose-position)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Display, EnumString)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
#[serde(rename_all = "kebab-case")]
pub enum Position {
    /// Normal flow.
    #[default]
    Static,
    /// Normal flow, then shifted by the offsets.
    Relative,
    /// Out of flow, placed against the parent content box.
    Absolute,
    /// Out of flow, placed against the viewport.
    Fixed,
}

impl Position {
    /// Whether the box is taken out of line flow.
    #[must_use]
    pub const fn is_out_of_flow(self) -> bool {
        matches!(self, Self::Absolute | Self::Fixed)
    }
}

/// [§ 9.2.4 display](https://www.w3.org/TR/CSS2/visuren.html#display-prop)
///
/// Only the values this engine lays out; `flex`, `grid` and table values are
/// reported as unsupported and leave the previous value in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, EnumString)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
#[serde(rename_all = "kebab-case")]
pub enum DisplayValue {
    /// Occupies its own line.
    Block,
    /// Flows within a line.
    Inline,
    /// Atomic box that flows within a line.
    InlineBlock,
    /// Block with a marker.
    ListItem,
    /// Generates nothing.
    None,
}

impl DisplayValue {
    /// Whether a child box with this display takes a whole line.
    #[must_use]
    pub const fn is_block_level(self) -> bool {
        matches!(self, Self::Block | Self::ListItem)
    }
}

/// [§ 11.1.1 overflow](https://www.w3.org/TR/CSS2/visufx.html#overflow)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Display, EnumString)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
#[serde(rename_all = "kebab-case")]
pub enum Overflow {
    /// Content may paint outside the box.
    #[default]
    Visible,
    /// Content is clipped to the padding box.
    Hidden,
    /// Clipped; scrolling belongs to the host.
    Scroll,
    /// Clipped; scrolling belongs to the host.
    Auto,
}

impl Overflow {
    /// Whether children are clipped to the padding box.
    #[must_use]
    pub const fn clips(self) -> bool {
        !matches!(self, Self::Visible)
    }
}

/// [§ 9.5.2 clear](https://www.w3.org/TR/CSS2/visuren.html#flow-control)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Display, EnumString)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
#[serde(rename_all = "kebab-case")]
pub enum Clear {
    /// No clearance.
    #[default]
    None,
    /// Move below left floats.
    Left,
    /// Move below right floats.
    Right,
    /// Move below all floats.
    Both,
}

/// [§ 9.5.1 float](https://www.w3.org/TR/CSS2/visuren.html#float-position)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Display, EnumString)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
#[serde(rename_all = "kebab-case")]
pub enum Float {
    /// In flow.
    #[default]
    None,
    /// Against the left margin.
    Left,
    /// Against the right margin.
    Right,
}

/// [§ 16.6 white-space](https://www.w3.org/TR/CSS2/text.html#white-space-prop)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Display, EnumString)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
#[serde(rename_all = "kebab-case")]
pub enum WhiteSpace {
    /// Collapse and wrap.
    #[default]
    Normal,
    /// Preserve, break only at newlines.
    Pre,
    /// Collapse, never wrap.
    Nowrap,
}

/// [§ 16.5 text-transform](https://www.w3.org/TR/CSS2/text.html#caps-prop)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Display, EnumString)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
#[serde(rename_all = "kebab-case")]
pub enum TextTransform {
    /// Text as written.
    #[default]
    None,
    /// Every letter upper case.
    Uppercase,
    /// Every letter lower case.
    Lowercase,
    /// First letter of each word upper case.
    Capitalize,
}

impl TextTransform {
    /// Apply the transform to a run of text.
    #[must_use]
    pub fn apply(self, text: &str) -> String {
        match self {
            Self::None => text.to_string(),
            Self::Uppercase => text.to_uppercase(),
            Self::Lowercase => text.to_lowercase(),
            Self::Capitalize => {
                let mut out = String::with_capacity(text.len());
                let mut at_word_start = true;
                for c in text.chars() {
                    if at_word_start && c.is_alphabetic() {
                        out.extend(c.to_uppercase());
                    } else {
                        out.push(c);
                    }
                    at_word_start = c.is_whitespace();
                }
                out
            }
        }
    }
}

/// [§ 16.3.1 text-decoration](https://www.w3.org/TR/CSS2/text.html#lining-striking-props)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Display, EnumString)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
#[serde(rename_all = "kebab-case")]
pub enum TextDecoration {
    /// No decoration.
    #[default]
    None,
    /// Line below the text.
    Underline,
    /// Line above the text.
    Overline,
    /// Line through the middle.
    LineThrough,
    /// Painted as plain text.
    Blink,
}

/// [§ 10.8.1 vertical-align](https://www.w3.org/TR/CSS2/visudet.html#propdef-vertical-align)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Display, EnumString)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
#[serde(rename_all = "kebab-case")]
pub enum VerticalAlign {
    /// Align on the shared line baseline.
    #[default]
    Baseline,
    /// Align the top with the line top.
    Top,
    /// Center within the line.
    Middle,
    /// Align the bottom with the line bottom.
    Bottom,
}

/// [§ 8.5.3 border-style](https://www.w3.org/TR/CSS2/box.html#border-style-properties)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Display, EnumString)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
#[serde(rename_all = "kebab-case")]
pub enum BorderStyle {
    /// No border; width computes to zero.
    #[default]
    None,
    /// Same as none.
    Hidden,
    /// Dots.
    Dotted,
    /// Dashes.
    Dashed,
    /// Single line.
    Solid,
    /// Two lines.
    Double,
    /// Carved.
    Groove,
    /// Raised.
    Ridge,
    /// Sunken.
    Inset,
    /// Embossed.
    Outset,
}

impl BorderStyle {
    /// Whether a border with this style is painted at all.
    #[must_use]
    pub const fn is_visible(self) -> bool {
        !matches!(self, Self::None | Self::Hidden)
    }
}

/// [§ 12.6.2 list-style-type](https://www.w3.org/TR/CSS2/generate.html#lists)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, EnumString)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
#[serde(rename_all = "kebab-case")]
pub enum ListStyleType {
    /// Filled circle.
    Disc,
    /// Hollow circle.
    Circle,
    /// Filled square.
    Square,
    /// 1, 2, 3.
    Decimal,
    /// a, b, c.
    LowerAlpha,
    /// A, B, C.
    UpperAlpha,
    /// i, ii, iii.
    LowerRoman,
    /// I, II, III.
    UpperRoman,
    /// No marker.
    None,
}

/// [§ 15.7 font-style](https://www.w3.org/TR/CSS2/fonts.html#font-styling)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Display, EnumString)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
#[serde(rename_all = "kebab-case")]
pub enum FontStyle {
    /// Upright.
    #[default]
    Normal,
    /// Italic face.
    Italic,
    /// Rendered with the italic face.
    Oblique,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keywords_parse_case_insensitively() {
        assert_eq!(parse_keyword::<DisplayValue>(" Inline-Block "), Some(DisplayValue::InlineBlock));
        assert_eq!(parse_keyword::<ListStyleType>("upper-roman"), Some(ListStyleType::UpperRoman));
        assert_eq!(parse_keyword::<TextDecoration>("line-through"), Some(TextDecoration::LineThrough));
        assert_eq!(parse_keyword::<DisplayValue>("flex"), None);
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(TextTransform::Capitalize.apply("hello big world"), "Hello Big World");
        assert_eq!(TextTransform::Uppercase.apply("abc"), "ABC");
    }
}
