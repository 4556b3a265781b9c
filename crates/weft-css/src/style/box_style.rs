//! Box attributes written by the cascade.

use serde::Serialize;
use weft_common::{Component, Diagnostic, DiagnosticKind};

use super::values::{
    BorderStyle, Clear, Color, DisplayValue, Float, FontStyle, Length, ListStyleType, Overflow,
    Position, TextAlign, TextDecoration, TextTransform, VerticalAlign, WhiteSpace, function_args,
    parse_keyword,
};
use crate::cascade::CascadeContext;
use crate::parser::Property;

/// Initial `medium` font size in pixels.
pub const DEFAULT_FONT_SIZE_PX: f32 = 16.0;

/// A value per box side.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Sides<T> {
    /// Top side.
    pub top: T,
    /// Right side.
    pub right: T,
    /// Bottom side.
    pub bottom: T,
    /// Left side.
    pub left: T,
}

impl<T: Copy> Sides<T> {
    /// Same value on every side.
    pub const fn uniform(value: T) -> Self {
        Self {
            top: value,
            right: value,
            bottom: value,
            left: value,
        }
    }

    /// [§ 8.3 Margin properties](https://www.w3.org/TR/CSS2/box.html#margin-properties)
    ///
    /// "If there is only one component value, it applies to all sides. If
    /// there are two values, the top and bottom margins are set to the first
    /// value and the right and left margins are set to the second. If there
    /// are three values, the top is set to the first value, the left and right
    /// are set to the second, and the bottom is set to the third. If there are
    /// four values, they apply to the top, right, bottom, and left,
    /// respectively."
    pub fn from_shorthand(values: &[T]) -> Option<Self> {
        let (top, right, bottom, left) = match *values {
            [all] => (all, all, all, all),
            [vertical, horizontal] => (vertical, horizontal, vertical, horizontal),
            [top, horizontal, bottom] => (top, horizontal, bottom, horizontal),
            [top, right, bottom, left] => (top, right, bottom, left),
            _ => return None,
        };
        Some(Self {
            top,
            right,
            bottom,
            left,
        })
    }
}

/// Every attribute the cascade can set on a box.
///
/// `None` means "not set here": the layout engine falls back to the inherited
/// font context or the property's initial value.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct BoxStyle {
    /// Horizontal alignment of lines.
    pub text_align: Option<TextAlign>,
    /// First family of `font-family`, unquoted.
    pub font_family: Option<String>,
    /// Font size, possibly relative.
    pub font_size: Option<Length>,
    /// Bold face requested.
    pub font_bold: Option<bool>,
    /// Italic face requested.
    pub font_style: Option<FontStyle>,
    /// Text color.
    pub color: Option<Color>,
    /// Background fill.
    pub background_color: Option<Color>,
    /// Background image reference from `url(...)`.
    pub background_image: Option<String>,
    /// Outer margins.
    pub margin: Sides<Option<Length>>,
    /// Padding.
    pub padding: Sides<Option<Length>>,
    /// Border widths.
    pub border_width: Sides<Option<Length>>,
    /// Border color for every side.
    pub border_color: Option<Color>,
    /// Border style for every side.
    pub border_style: Option<BorderStyle>,
    /// Positioning scheme.
    pub position: Option<Position>,
    /// Positioning offsets; `None` is `auto`.
    pub offsets: Sides<Option<Length>>,
    /// Stacking order of positioned boxes; `None` is `auto`.
    pub z_index: Option<i32>,
    /// Display type.
    pub display: Option<DisplayValue>,
    /// Overflow handling.
    pub overflow: Option<Overflow>,
    /// Float clearance.
    pub clear: Option<Clear>,
    /// Float side.
    pub float: Option<Float>,
    /// Whitespace handling.
    pub white_space: Option<WhiteSpace>,
    /// Case transform for appended text.
    pub text_transform: Option<TextTransform>,
    /// Text decoration line.
    pub text_decoration: Option<TextDecoration>,
    /// Vertical alignment within a line.
    pub vertical_align: Option<VerticalAlign>,
    /// List marker style.
    pub list_style_type: Option<ListStyleType>,
    /// Explicit width; `None` is `auto`.
    pub width: Option<Length>,
    /// Explicit height; `None` is `auto`.
    pub height: Option<Length>,
    /// Minimum width.
    pub min_width: Option<Length>,
    /// Maximum width; `None` is `none`.
    pub max_width: Option<Length>,
    /// Minimum height.
    pub min_height: Option<Length>,
    /// Maximum height; `None` is `none`.
    pub max_height: Option<Length>,
}

/// Side selector used by the per-side longhands.
#[derive(Debug, Clone, Copy)]
enum Side {
    Top,
    Right,
    Bottom,
    Left,
}

fn side_mut<T>(sides: &mut Sides<T>, side: Side) -> &mut T {
    match side {
        Side::Top => &mut sides.top,
        Side::Right => &mut sides.right,
        Side::Bottom => &mut sides.bottom,
        Side::Left => &mut sides.left,
    }
}

impl BoxStyle {
    /// Apply one declaration.
    ///
    /// Unknown property names and unparseable values are reported to the
    /// context's sink and leave the style untouched.
    pub fn apply_property(&mut self, property: &Property, ctx: &mut CascadeContext<'_>) {
        let value = property.value.trim();
        // Inheritance happens through the font and list stacks; an explicit
        // `inherit` or `initial` leaves the box attribute as it was.
        if value.eq_ignore_ascii_case("inherit") || value.eq_ignore_ascii_case("initial") {
            return;
        }
        let applied = match property.name.as_str() {
            "text-align" => set(&mut self.text_align, parse_keyword(value)),
            "font-family" => set(&mut self.font_family, parse_font_family(value)),
            "font-size" => set(&mut self.font_size, parse_font_size(value)),
            "font-weight" => set(&mut self.font_bold, parse_font_weight(value)),
            "font-style" => set(&mut self.font_style, parse_keyword(value)),
            "color" => set(&mut self.color, Color::parse(value)),
            "background" => self.apply_background_shorthand(value),
            "background-color" => set(&mut self.background_color, Color::parse(value)),
            "background-image" => match parse_image(value) {
                Some(image) => {
                    self.background_image = image;
                    true
                }
                None => false,
            },
            "margin" => set_sides(&mut self.margin, value, parse_margin),
            "margin-top" => set_side(&mut self.margin, Side::Top, parse_margin(value)),
            "margin-right" => set_side(&mut self.margin, Side::Right, parse_margin(value)),
            "margin-bottom" => set_side(&mut self.margin, Side::Bottom, parse_margin(value)),
            "margin-left" => set_side(&mut self.margin, Side::Left, parse_margin(value)),
            "padding" => set_sides(&mut self.padding, value, Length::parse),
            "padding-top" => set_side(&mut self.padding, Side::Top, Length::parse(value)),
            "padding-right" => set_side(&mut self.padding, Side::Right, Length::parse(value)),
            "padding-bottom" => set_side(&mut self.padding, Side::Bottom, Length::parse(value)),
            "padding-left" => set_side(&mut self.padding, Side::Left, Length::parse(value)),
            "border" => self.apply_border_shorthand(value, None),
            "border-top" => self.apply_border_shorthand(value, Some(Side::Top)),
            "border-right" => self.apply_border_shorthand(value, Some(Side::Right)),
            "border-bottom" => self.apply_border_shorthand(value, Some(Side::Bottom)),
            "border-left" => self.apply_border_shorthand(value, Some(Side::Left)),
            "border-width" => set_sides(&mut self.border_width, value, parse_border_width),
            "border-top-width" => {
                set_side(&mut self.border_width, Side::Top, parse_border_width(value))
            }
            "border-right-width" => {
                set_side(&mut self.border_width, Side::Right, parse_border_width(value))
            }
            "border-bottom-width" => {
                set_side(&mut self.border_width, Side::Bottom, parse_border_width(value))
            }
            "border-left-width" => {
                set_side(&mut self.border_width, Side::Left, parse_border_width(value))
            }
            "border-color" => set(
                &mut self.border_color,
                split_value(value).first().and_then(|v| Color::parse(v)),
            ),
            "border-style" => set(
                &mut self.border_style,
                split_value(value).first().and_then(|v| parse_keyword(v)),
            ),
            "position" => set(&mut self.position, parse_keyword(value)),
            "top" => set_optional(&mut self.offsets.top, parse_auto_length(value)),
            "right" => set_optional(&mut self.offsets.right, parse_auto_length(value)),
            "bottom" => set_optional(&mut self.offsets.bottom, parse_auto_length(value)),
            "left" => set_optional(&mut self.offsets.left, parse_auto_length(value)),
            "z-index" => set_optional(&mut self.z_index, parse_z_index(value)),
            "display" => {
                let parsed = parse_keyword::<DisplayValue>(value);
                if parsed.is_none() {
                    report(
                        ctx,
                        DiagnosticKind::Unsupported,
                        format!("display '{value}' not laid out"),
                    );
                    return;
                }
                set(&mut self.display, parsed)
            }
            "overflow" => set(&mut self.overflow, parse_keyword(value)),
            "clear" => set(&mut self.clear, parse_keyword(value)),
            "float" => set(&mut self.float, parse_keyword(value)),
            "white-space" => set(&mut self.white_space, parse_white_space(value)),
            "text-transform" => {
                let parsed = parse_keyword::<TextTransform>(value);
                if let Some(mode) = parsed {
                    ctx.text_transform = Some(mode);
                }
                set(&mut self.text_transform, parsed)
            }
            "text-decoration" => set(
                &mut self.text_decoration,
                split_value(value).first().and_then(|v| parse_keyword(v)),
            ),
            "vertical-align" => set(&mut self.vertical_align, parse_keyword(value)),
            "list-style-type" => set(&mut self.list_style_type, parse_keyword(value)),
            "list-style" => set(
                &mut self.list_style_type,
                split_value(value).iter().find_map(|v| parse_keyword(v)),
            ),
            "width" => set_optional(&mut self.width, parse_auto_length(value)),
            "height" => set_optional(&mut self.height, parse_auto_length(value)),
            "min-width" => set(&mut self.min_width, Length::parse(value)),
            "min-height" => set(&mut self.min_height, Length::parse(value)),
            "max-width" => set_optional(&mut self.max_width, parse_none_length(value)),
            "max-height" => set_optional(&mut self.max_height, parse_none_length(value)),
            other => {
                report(
                    ctx,
                    DiagnosticKind::Unsupported,
                    format!("unknown property '{other}'"),
                );
                return;
            }
        };
        if !applied {
            report(
                ctx,
                DiagnosticKind::ParseRecoverable,
                format!("invalid value '{value}' for '{}'", property.name),
            );
        }
    }

    /// `background: [color] [url(...)] [repeat/position keywords]`
    fn apply_background_shorthand(&mut self, value: &str) -> bool {
        let mut recognized = false;
        for token in split_value(value) {
            if let Some(color) = Color::parse(&token) {
                self.background_color = Some(color);
                recognized = true;
            } else if let Some(image) = parse_image(&token) {
                self.background_image = image;
                recognized = true;
            }
        }
        recognized
    }

    /// `border` and `border-<side>`: `[width] [style] [color]` in any order.
    fn apply_border_shorthand(&mut self, value: &str, side: Option<Side>) -> bool {
        let mut width = None;
        let mut style = None;
        let mut color = None;
        for token in split_value(value) {
            if let Some(w) = parse_border_width(&token) {
                width = Some(w);
            } else if let Some(s) = parse_keyword::<BorderStyle>(&token) {
                style = Some(s);
            } else if let Some(c) = Color::parse(&token) {
                color = Some(c);
            } else {
                return false;
            }
        }
        if width.is_none() && style.is_none() && color.is_none() {
            return false;
        }
        // A style given without a width draws the medium border.
        let width = width.or_else(|| {
            style
                .filter(|s| s.is_visible())
                .map(|_| Length::Px(3.0))
        });
        if let Some(width) = width {
            match side {
                Some(side) => *side_mut(&mut self.border_width, side) = Some(width),
                None => self.border_width = Sides::uniform(Some(width)),
            }
        }
        if style.is_some() {
            self.border_style = style;
        }
        if color.is_some() {
            self.border_color = color;
        }
        true
    }
}

fn report(ctx: &CascadeContext<'_>, kind: DiagnosticKind, message: String) {
    ctx.sink
        .report(Diagnostic::new(Component::Cascade, kind, message));
}

fn set<T>(slot: &mut Option<T>, parsed: Option<T>) -> bool {
    match parsed {
        Some(v) => {
            *slot = Some(v);
            true
        }
        None => false,
    }
}

/// For values where `auto`/`none` is a valid setting that clears the slot.
fn set_optional<T>(slot: &mut Option<T>, parsed: Option<Option<T>>) -> bool {
    match parsed {
        Some(v) => {
            *slot = v;
            true
        }
        None => false,
    }
}

fn set_side(sides: &mut Sides<Option<Length>>, side: Side, parsed: Option<Length>) -> bool {
    match parsed {
        Some(v) => {
            *side_mut(sides, side) = Some(v);
            true
        }
        None => false,
    }
}

fn set_sides(
    sides: &mut Sides<Option<Length>>,
    value: &str,
    parse: fn(&str) -> Option<Length>,
) -> bool {
    let parsed: Option<Vec<Length>> = split_value(value).iter().map(|v| parse(v)).collect();
    let Some(expanded) = parsed.and_then(|values| Sides::from_shorthand(&values)) else {
        return false;
    };
    *sides = Sides {
        top: Some(expanded.top),
        right: Some(expanded.right),
        bottom: Some(expanded.bottom),
        left: Some(expanded.left),
    };
    true
}

/// Split a value on whitespace outside parentheses and quotes.
#[must_use]
pub fn split_value(value: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    for c in value.chars() {
        match quote {
            Some(q) => {
                current.push(c);
                if c == q {
                    quote = None;
                }
            }
            None => match c {
                '"' | '\'' => {
                    quote = Some(c);
                    current.push(c);
                }
                '(' => {
                    depth += 1;
                    current.push(c);
                }
                ')' => {
                    depth = depth.saturating_sub(1);
                    current.push(c);
                }
                c if c.is_whitespace() && depth == 0 => {
                    if !current.is_empty() {
                        tokens.push(std::mem::take(&mut current));
                    }
                }
                _ => current.push(c),
            },
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

/// `auto` is zero: horizontal centering is done through `text-align` on
/// the parent in this engine.
fn parse_margin(value: &str) -> Option<Length> {
    if value.trim().eq_ignore_ascii_case("auto") {
        return Some(Length::ZERO);
    }
    Length::parse(value)
}

/// [§ 8.5.1 border-width](https://www.w3.org/TR/CSS2/box.html#border-width-properties)
/// "thin | medium | thick | <length>"
fn parse_border_width(value: &str) -> Option<Length> {
    match value.trim().to_ascii_lowercase().as_str() {
        "thin" => Some(Length::Px(1.0)),
        "medium" => Some(Length::Px(3.0)),
        "thick" => Some(Length::Px(5.0)),
        _ => Length::parse(value).filter(|l| !l.is_percent()),
    }
}

/// `Some(None)` for `auto`.
fn parse_auto_length(value: &str) -> Option<Option<Length>> {
    if value.trim().eq_ignore_ascii_case("auto") {
        return Some(None);
    }
    Length::parse(value).map(Some)
}

/// `Some(None)` for `none`.
fn parse_none_length(value: &str) -> Option<Option<Length>> {
    if value.trim().eq_ignore_ascii_case("none") {
        return Some(None);
    }
    Length::parse(value).map(Some)
}

fn parse_z_index(value: &str) -> Option<Option<i32>> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("auto") {
        return Some(None);
    }
    value.parse().ok().map(Some)
}

/// `Some(None)` for `none`, `Some(Some(url))` for `url(...)`.
fn parse_image(value: &str) -> Option<Option<String>> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("none") {
        return Some(None);
    }
    let lower = value.to_ascii_lowercase();
    let args = function_args(&lower, "url")?;
    // Recover original case from the same byte span.
    let start = value.len() - args.len() - 1;
    let url = value[start..value.len() - 1]
        .trim()
        .trim_matches(|c| c == '"' || c == '\'');
    Some(Some(url.to_string()))
}

fn parse_font_family(value: &str) -> Option<String> {
    let first = value.split(',').next()?.trim();
    let family = first.trim_matches(|c| c == '"' || c == '\'').trim();
    if family.is_empty() {
        None
    } else {
        Some(family.to_string())
    }
}

/// [§ 15.7 font-size](https://www.w3.org/TR/CSS2/fonts.html#font-size-props)
fn parse_font_size(value: &str) -> Option<Length> {
    let size = match value.trim().to_ascii_lowercase().as_str() {
        "xx-small" => Length::Px(9.0),
        "x-small" => Length::Px(10.0),
        "small" => Length::Px(13.0),
        "medium" => Length::Px(DEFAULT_FONT_SIZE_PX),
        "large" => Length::Px(18.0),
        "x-large" => Length::Px(24.0),
        "xx-large" => Length::Px(32.0),
        "smaller" => Length::Em(0.83),
        "larger" => Length::Em(1.2),
        _ => return Length::parse(value).filter(|l| l.to_px(1.0, 1.0) >= 0.0),
    };
    Some(size)
}

/// [§ 15.6 font-weight](https://www.w3.org/TR/CSS2/fonts.html#font-boldness)
/// Only a bold/regular distinction is kept.
fn parse_font_weight(value: &str) -> Option<bool> {
    let value = value.trim().to_ascii_lowercase();
    match value.as_str() {
        "bold" | "bolder" => Some(true),
        "normal" | "lighter" => Some(false),
        numeric => numeric.parse::<u32>().ok().map(|w| w >= 600),
    }
}

fn parse_white_space(value: &str) -> Option<WhiteSpace> {
    match value.trim().to_ascii_lowercase().as_str() {
        "pre-wrap" => Some(WhiteSpace::Pre),
        "pre-line" => Some(WhiteSpace::Normal),
        _ => parse_keyword(value),
    }
}
