//! CSS color values.
//!
//! [CSS Color Level 3](https://www.w3.org/TR/css3-color/)

use serde::{Deserialize, Serialize};

/// [§ 4 Color units](https://www.w3.org/TR/css3-color/#colorunits)
/// sRGB color with an alpha channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    /// Red channel (0-255).
    pub r: u8,
    /// Green channel (0-255).
    pub g: u8,
    /// Blue channel (0-255).
    pub b: u8,
    /// Alpha channel (0-255, 255 = opaque).
    pub a: u8,
}

impl Color {
    /// Black (#000000)
    pub const BLACK: Self = Self::rgb(0, 0, 0);

    /// White (#ffffff)
    pub const WHITE: Self = Self::rgb(255, 255, 255);

    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self {
        r: 0,
        g: 0,
        b: 0,
        a: 0,
    };

    /// Opaque color from channels.
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Whether painting this color is a no-op.
    #[must_use]
    pub const fn is_transparent(self) -> bool {
        self.a == 0
    }

    /// Parse any supported color notation.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.starts_with('#') {
            return Self::from_hex(value);
        }
        let lower = value.to_ascii_lowercase();
        if let Some(args) = function_args(&lower, "rgba").or_else(|| function_args(&lower, "rgb")) {
            return Self::from_rgb_args(args);
        }
        Self::from_named(&lower)
    }

    /// [§ 4.2.1 RGB color values](https://www.w3.org/TR/css3-color/#rgb-color)
    /// "The format of an RGB value in hexadecimal notation is a '#' immediately
    /// followed by either three or six hexadecimal characters."
    #[must_use]
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        match hex.len() {
            // "The three-digit RGB notation (#rgb) is converted into six-digit
            // form (#rrggbb) by replicating digits, not by adding zeros."
            3 => {
                let r = u8::from_str_radix(&hex[0..1].repeat(2), 16).ok()?;
                let g = u8::from_str_radix(&hex[1..2].repeat(2), 16).ok()?;
                let b = u8::from_str_radix(&hex[2..3].repeat(2), 16).ok()?;
                Some(Self::rgb(r, g, b))
            }
            6 => {
                let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
                let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
                let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
                Some(Self::rgb(r, g, b))
            }
            _ => None,
        }
    }

    /// `rgb(r, g, b)` / `rgba(r, g, b, a)` with integer or percentage channels.
    fn from_rgb_args(args: &str) -> Option<Self> {
        let parts: Vec<&str> = args.split(',').map(str::trim).collect();
        if parts.len() != 3 && parts.len() != 4 {
            return None;
        }
        let channel = |s: &str| -> Option<u8> {
            if let Some(pct) = s.strip_suffix('%') {
                let v: f32 = pct.trim().parse().ok()?;
                Some((v.clamp(0.0, 100.0) * 2.55).round() as u8)
            } else {
                let v: f32 = s.parse().ok()?;
                Some(v.clamp(0.0, 255.0).round() as u8)
            }
        };
        let r = channel(parts[0])?;
        let g = channel(parts[1])?;
        let b = channel(parts[2])?;
        let a = match parts.get(3) {
            Some(alpha) => {
                let v: f32 = alpha.parse().ok()?;
                (v.clamp(0.0, 1.0) * 255.0).round() as u8
            }
            None => 255,
        };
        Some(Self { r, g, b, a })
    }

    /// [§ 4.1 Basic color keywords](https://www.w3.org/TR/css3-color/#html4)
    /// The sixteen HTML 4 color names, plus `orange` and `transparent`.
    #[must_use]
    pub fn from_named(name: &str) -> Option<Self> {
        let color = match name.to_ascii_lowercase().as_str() {
            "black" => Self::BLACK,
            "silver" => Self::rgb(192, 192, 192),
            "gray" | "grey" => Self::rgb(128, 128, 128),
            "white" => Self::WHITE,
            "maroon" => Self::rgb(128, 0, 0),
            "red" => Self::rgb(255, 0, 0),
            "purple" => Self::rgb(128, 0, 128),
            "fuchsia" => Self::rgb(255, 0, 255),
            "green" => Self::rgb(0, 128, 0),
            "lime" => Self::rgb(0, 255, 0),
            "olive" => Self::rgb(128, 128, 0),
            "yellow" => Self::rgb(255, 255, 0),
            "navy" => Self::rgb(0, 0, 128),
            "blue" => Self::rgb(0, 0, 255),
            "teal" => Self::rgb(0, 128, 128),
            "aqua" => Self::rgb(0, 255, 255),
            "orange" => Self::rgb(255, 165, 0),
            "transparent" => Self::TRANSPARENT,
            _ => return None,
        };
        Some(color)
    }

    /// `#rrggbb` form, used by the CLI and display list dumps.
    #[must_use]
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Contents of `name( ... )` if `value` is that function call.
pub(crate) fn function_args<'a>(value: &'a str, name: &str) -> Option<&'a str> {
    let rest = value.strip_prefix(name)?.trim_start();
    rest.strip_prefix('(')?.strip_suffix(')')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_hex_replicates_digits() {
        assert_eq!(Color::parse("#f80"), Some(Color::rgb(255, 136, 0)));
    }

    #[test]
    fn test_rgb_function() {
        assert_eq!(Color::parse("rgb(10, 20, 30)"), Some(Color::rgb(10, 20, 30)));
        assert_eq!(
            Color::parse("RGBA(255, 0, 0, 0.5)"),
            Some(Color {
                r: 255,
                g: 0,
                b: 0,
                a: 128
            })
        );
        assert_eq!(Color::parse("rgb(100%, 0%, 0%)"), Some(Color::rgb(255, 0, 0)));
    }

    #[test]
    fn test_named_and_invalid() {
        assert_eq!(Color::parse("Navy"), Some(Color::rgb(0, 0, 128)));
        assert!(Color::parse("transparent").is_some_and(Color::is_transparent));
        assert_eq!(Color::parse("#12345"), None);
        assert_eq!(Color::parse("#ggg"), None);
        assert_eq!(Color::parse("chartreuse-ish"), None);
    }
}
