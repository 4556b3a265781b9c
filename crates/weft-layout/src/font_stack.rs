//! The document font stack.
//!
//! Presentational markup (`<font>`, `<b>`, `<tt>`, links) and boxes whose
//! style sets font properties push entries while the builder appends
//! content; closing them pops. Each entry keeps what it set explicitly and
//! its resolved font, computed from the entry below. Relative sizes
//! therefore chain down to the nearest absolute size, and a patched base
//! reaches every entry that did not override the patched attribute.

use serde::Serialize;
use weft_css::Color;
use weft_dom::NodeId;

use crate::font::{FontFlags, FontKey, FontType};

/// A font size as pushed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum FontSize {
    /// Absolute pixels.
    Px(f32),
    /// Multiple of the size below.
    Scale(f32),
}

impl FontSize {
    /// Legacy relative step (`<font size=+1>`): 1.2 per step.
    #[must_use]
    pub fn steps(steps: i32) -> Self {
        Self::Scale(1.2_f32.powi(steps.clamp(-6, 6)))
    }
}

/// Attributes an entry sets. Anything left `None` is inherited.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FontRequest {
    /// Proportional or fixed.
    pub font_type: Option<FontType>,
    /// Size.
    pub size: Option<FontSize>,
    /// Style bits added.
    pub set_flags: FontFlags,
    /// Style bits removed.
    pub clear_flags: FontFlags,
    /// Text color.
    pub color: Option<Color>,
    /// Face name.
    pub face: Option<String>,
}

impl FontRequest {
    /// Whether the request changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.font_type.is_none()
            && self.size.is_none()
            && self.set_flags.is_empty()
            && self.clear_flags.is_empty()
            && self.color.is_none()
            && self.face.is_none()
    }

    /// Fold `other` into this request; `other` wins where both set something.
    pub fn merge(&mut self, other: Self) {
        if other.font_type.is_some() {
            self.font_type = other.font_type;
        }
        if let Some(size) = other.size {
            self.size = Some(match (self.size, size) {
                (Some(FontSize::Px(a)), FontSize::Scale(b)) => FontSize::Px(a * b),
                (Some(FontSize::Scale(a)), FontSize::Scale(b)) => FontSize::Scale(a * b),
                (_, size) => size,
            });
        }
        self.set_flags = (self.set_flags - other.clear_flags) | other.set_flags;
        self.clear_flags = (self.clear_flags - other.set_flags) | other.clear_flags;
        if other.color.is_some() {
            self.color = other.color;
        }
        if other.face.is_some() {
            self.face = other.face;
        }
    }
}

/// A fully resolved font.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedFont {
    /// Proportional face name.
    pub face: String,
    /// Face used while the type is fixed.
    pub fixed_face: String,
    /// Size in pixels.
    pub size: f32,
    /// Style bits.
    pub flags: FontFlags,
    /// Text color.
    pub color: Color,
    /// Proportional or fixed.
    pub font_type: FontType,
}

impl ResolvedFont {
    /// Cache key; fixed fonts use the fixed face.
    #[must_use]
    pub fn key(&self) -> FontKey {
        let face = match self.font_type {
            FontType::Normal => &self.face,
            FontType::Fixed => &self.fixed_face,
        };
        FontKey::new(face, self.size, self.flags)
    }

    fn derive(&self, request: &FontRequest, base_type: FontType) -> Self {
        let size = match request.size {
            Some(FontSize::Px(px)) => px,
            Some(FontSize::Scale(factor)) => self.size * factor,
            None => self.size,
        };
        let requested_type = request.font_type.unwrap_or(self.font_type);
        Self {
            face: request.face.clone().unwrap_or_else(|| self.face.clone()),
            fixed_face: self.fixed_face.clone(),
            size: size.max(1.0),
            flags: (self.flags | request.set_flags) - request.clear_flags,
            color: request.color.unwrap_or(self.color),
            // A fixed base makes every entry fixed.
            font_type: if base_type == FontType::Fixed {
                FontType::Fixed
            } else {
                requested_type
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct FontEntry {
    request: FontRequest,
    resolved: ResolvedFont,
    owner: Option<NodeId>,
}

/// Stack of font entries; the base entry is never popped.
#[derive(Debug, Clone, Serialize)]
pub struct FontStack {
    entries: Vec<FontEntry>,
}

impl FontStack {
    /// Stack holding only `base`.
    #[must_use]
    pub fn new(base: ResolvedFont) -> Self {
        Self {
            entries: vec![FontEntry {
                request: FontRequest::default(),
                resolved: base,
                owner: None,
            }],
        }
    }

    /// Number of entries, base included. Never zero.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.entries.len()
    }

    /// Font in effect for content appended now.
    #[must_use]
    pub fn current(&self) -> &ResolvedFont {
        // The base entry is never removed.
        &self.entries[self.entries.len() - 1].resolved
    }

    /// The base entry.
    #[must_use]
    pub fn base(&self) -> &ResolvedFont {
        &self.entries[0].resolved
    }

    /// Box that pushed the top entry, if any.
    #[must_use]
    pub fn top_owner(&self) -> Option<NodeId> {
        self.entries.last().and_then(|e| e.owner)
    }

    /// Push an entry; returns the font it resolves to.
    pub fn push(&mut self, request: FontRequest, owner: Option<NodeId>) -> &ResolvedFont {
        let base_type = self.base().font_type;
        let resolved = self.current().derive(&request, base_type);
        log::trace!(target: "weft::font", "push font {} {}px at depth {}", resolved.face, resolved.size, self.entries.len());
        self.entries.push(FontEntry {
            request,
            resolved,
            owner,
        });
        self.current()
    }

    /// Pop the top entry. Returns `false`, leaving the stack alone, when only
    /// the base is left.
    pub fn pop(&mut self) -> bool {
        if self.entries.len() <= 1 {
            return false;
        }
        let _ = self.entries.pop();
        true
    }

    /// Pop until at most `depth` entries remain (never below the base).
    pub fn pop_to(&mut self, depth: usize) {
        self.entries.truncate(depth.max(1));
    }

    /// Change the base size; entries that did not set a size follow it and
    /// relative sizes rescale.
    pub fn patch_base_font_size(&mut self, size: f32) {
        self.entries[0].resolved.size = size.max(1.0);
        self.propagate();
    }

    /// Change the base color.
    pub fn patch_base_color(&mut self, color: Color) {
        self.entries[0].resolved.color = color;
        self.propagate();
    }

    /// Change the base face.
    pub fn patch_base_face(&mut self, face: &str) {
        face.clone_into(&mut self.entries[0].resolved.face);
        self.propagate();
    }

    /// Make the base fixed or proportional.
    pub fn patch_base_type(&mut self, font_type: FontType) {
        self.entries[0].resolved.font_type = font_type;
        self.propagate();
    }

    fn propagate(&mut self) {
        let base_type = self.base().font_type;
        for i in 1..self.entries.len() {
            let resolved = self.entries[i - 1].resolved.derive(&self.entries[i].request, base_type);
            self.entries[i].resolved = resolved;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> ResolvedFont {
        ResolvedFont {
            face: "serif".to_string(),
            fixed_face: "monospace".to_string(),
            size: 16.0,
            flags: FontFlags::empty(),
            color: Color::BLACK,
            font_type: FontType::Normal,
        }
    }

    #[test]
    fn test_base_is_never_popped() {
        let mut stack = FontStack::new(base());
        assert!(!stack.pop());
        let _ = stack.push(FontRequest::default(), None);
        assert!(stack.pop());
        assert!(!stack.pop());
        stack.pop_to(0);
        assert_eq!(stack.depth(), 1);
    }

    #[test]
    fn test_relative_sizes_chain() {
        let mut stack = FontStack::new(base());
        let _ = stack.push(
            FontRequest {
                size: Some(FontSize::Scale(1.5)),
                ..FontRequest::default()
            },
            None,
        );
        let _ = stack.push(
            FontRequest {
                size: Some(FontSize::Scale(0.5)),
                ..FontRequest::default()
            },
            None,
        );
        assert!((stack.current().size - 12.0).abs() < 1e-4);
    }

    #[test]
    fn test_patch_base_reaches_inheriting_entries() {
        let mut stack = FontStack::new(base());
        let _ = stack.push(
            FontRequest {
                size: Some(FontSize::Scale(1.5)),
                set_flags: FontFlags::BOLD,
                ..FontRequest::default()
            },
            None,
        );
        let _ = stack.push(
            FontRequest {
                color: Some(Color::rgb(255, 0, 0)),
                size: Some(FontSize::Px(12.0)),
                ..FontRequest::default()
            },
            None,
        );
        stack.patch_base_font_size(20.0);
        stack.patch_base_color(Color::rgb(0, 0, 255));
        stack.patch_base_face("sans-serif");

        let top = stack.current();
        assert!((top.size - 12.0).abs() < 1e-4);
        assert_eq!(top.color, Color::rgb(255, 0, 0));
        assert_eq!(top.face, "sans-serif");
        assert!(top.flags.contains(FontFlags::BOLD));
        let _ = stack.pop();
        assert!((stack.current().size - 30.0).abs() < 1e-4);
        assert_eq!(stack.current().color, Color::rgb(0, 0, 255));
    }

    #[test]
    fn test_fixed_base_forces_fixed() {
        let mut stack = FontStack::new(base());
        let _ = stack.push(
            FontRequest {
                font_type: Some(FontType::Normal),
                ..FontRequest::default()
            },
            None,
        );
        stack.patch_base_type(FontType::Fixed);
        assert_eq!(stack.current().font_type, FontType::Fixed);
        assert_eq!(stack.current().key().face, "monospace");

        let mut proportional = FontStack::new(base());
        let _ = proportional.push(
            FontRequest {
                font_type: Some(FontType::Fixed),
                ..FontRequest::default()
            },
            None,
        );
        assert_eq!(proportional.current().font_type, FontType::Fixed);
    }

    #[test]
    fn test_hard_style_set_and_unset() {
        let mut stack = FontStack::new(base());
        let _ = stack.push(
            FontRequest {
                set_flags: FontFlags::BOLD | FontFlags::ITALIC,
                ..FontRequest::default()
            },
            None,
        );
        let _ = stack.push(
            FontRequest {
                clear_flags: FontFlags::BOLD,
                ..FontRequest::default()
            },
            None,
        );
        assert_eq!(stack.current().flags, FontFlags::ITALIC);
    }
}
