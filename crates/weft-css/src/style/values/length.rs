//! CSS length values.
//!
//! [CSS 2.1 § 4.3.2 Lengths](https://www.w3.org/TR/CSS2/syndata.html#length-units)

use serde::Serialize;

/// Points per CSS pixel: "1pt is equal to 1/72nd of 1in", "1px = 1/96th of 1in".
const PX_PER_PT: f32 = 96.0 / 72.0;

/// A length with its unit still attached. Relative units resolve at layout
/// time against the font size or containing width in effect there.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Length {
    /// Absolute CSS pixels.
    Px(f32),
    /// Points.
    Pt(f32),
    /// Multiple of the element font size.
    Em(f32),
    /// Multiple of the x-height, approximated as half an em.
    Ex(f32),
    /// Percentage of the containing block dimension.
    Percent(f32),
}

impl Length {
    /// Zero pixels.
    pub const ZERO: Self = Self::Px(0.0);

    /// Parse a single length token such as `12px`, `1.5em`, `50%` or `0`.
    ///
    /// Unitless non-zero numbers are taken as pixels, as legacy pages expect.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        let split = value
            .char_indices()
            .find(|&(i, c)| !(c.is_ascii_digit() || c == '.' || (i == 0 && (c == '-' || c == '+'))))
            .map_or(value.len(), |(i, _)| i);
        let (number, unit) = value.split_at(split);
        if number.is_empty() || number == "-" || number == "+" {
            return None;
        }
        let n: f32 = number.parse().ok()?;
        if !n.is_finite() {
            return None;
        }
        let length = match unit.to_ascii_lowercase().as_str() {
            "" | "px" => Self::Px(n),
            "pt" => Self::Pt(n),
            "em" => Self::Em(n),
            "ex" => Self::Ex(n),
            "%" => Self::Percent(n),
            _ => return None,
        };
        Some(length)
    }

    /// Resolve to pixels.
    #[must_use]
    pub fn to_px(self, font_size: f32, percent_base: f32) -> f32 {
        match self {
            Self::Px(v) => v,
            Self::Pt(v) => v * PX_PER_PT,
            Self::Em(v) => v * font_size,
            Self::Ex(v) => v * font_size * 0.5,
            Self::Percent(v) => v * percent_base / 100.0,
        }
    }

    /// Whether this length depends on the containing block.
    #[must_use]
    pub const fn is_percent(self) -> bool {
        matches!(self, Self::Percent(_))
    }
}

impl Default for Length {
    fn default() -> Self {
        Self::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_units() {
        assert_eq!(Length::parse("12px"), Some(Length::Px(12.0)));
        assert_eq!(Length::parse("1.5EM"), Some(Length::Em(1.5)));
        assert_eq!(Length::parse("-4px"), Some(Length::Px(-4.0)));
        assert_eq!(Length::parse("50%"), Some(Length::Percent(50.0)));
        assert_eq!(Length::parse("0"), Some(Length::Px(0.0)));
        assert_eq!(Length::parse("3furlongs"), None);
        assert_eq!(Length::parse("px"), None);
        assert_eq!(Length::parse("auto"), None);
    }

    #[test]
    fn test_resolution() {
        assert!((Length::Pt(12.0).to_px(16.0, 0.0) - 16.0).abs() < 1e-4);
        assert!((Length::Em(2.0).to_px(10.0, 0.0) - 20.0).abs() < 1e-4);
        assert!((Length::Ex(2.0).to_px(10.0, 0.0) - 10.0).abs() < 1e-4);
        assert!((Length::Percent(25.0).to_px(16.0, 400.0) - 100.0).abs() < 1e-4);
    }
}
