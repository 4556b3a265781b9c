//! Fonts: handles, the interning cache and text metrics.
//!
//! [§ 10.8 Line height calculations](https://www.w3.org/TR/CSS2/visudet.html#line-height)
//!
//! "CSS assumes that every font has font metrics that specify a
//! characteristic height above the baseline and a depth below it."
//!
//! Layout never loads font data. It measures through a [`FontMetrics`]
//! implementation supplied by the host and identifies fonts by [`FontKey`].
//! Boxes hold [`FontHandle`]s into a [`FontCache`], which keeps one entry per
//! distinct key with a reference count.

use std::collections::HashMap;

use bitflags::bitflags;
use serde::Serialize;

use crate::error::LayoutError;

bitflags! {
    /// Style bits of a font.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
    pub struct FontFlags: u8 {
        /// Bold weight.
        const BOLD = 1 << 0;
        /// Italic or oblique face.
        const ITALIC = 1 << 1;
        /// Line below the text.
        const UNDERLINE = 1 << 2;
        /// Line above the text.
        const OVERLINE = 1 << 3;
        /// Line through the text.
        const LINE_THROUGH = 1 << 4;
        /// Fixed pitch. Only meaningful in hard style options, where it
        /// selects [`FontType::Fixed`]; never part of a resolved font.
        const FIXED = 1 << 5;
    }
}

/// Proportional or fixed-pitch text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum FontType {
    /// Proportional face.
    #[default]
    Normal,
    /// Fixed-pitch face.
    Fixed,
}

/// Identity of a font for caching and measurement.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct FontKey {
    /// Face name.
    pub face: String,
    /// Size in tenths of a pixel, so the key stays hashable.
    pub size_tenths: u32,
    /// Style bits.
    pub flags: FontFlags,
}

impl FontKey {
    /// Key for a face at `size` pixels.
    #[must_use]
    pub fn new(face: &str, size: f32, flags: FontFlags) -> Self {
        Self {
            face: face.to_string(),
            size_tenths: (size.max(0.0) * 10.0).round() as u32,
            flags,
        }
    }

    /// Size in pixels.
    #[must_use]
    pub fn size(&self) -> f32 {
        self.size_tenths as f32 / 10.0
    }
}

/// Reference to an interned font.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct FontHandle(u32);

#[derive(Debug, Clone)]
struct CacheEntry {
    key: FontKey,
    refs: u32,
}

/// Interns fonts by key. A key gets one handle for as long as anything
/// references it; the slot is freed when the last reference is released.
#[derive(Debug, Clone, Default)]
pub struct FontCache {
    slots: Vec<Option<CacheEntry>>,
    by_key: HashMap<FontKey, FontHandle>,
}

impl FontCache {
    /// Empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Take a reference to the font for `key`, creating it if needed.
    ///
    /// # Errors
    ///
    /// [`LayoutError::Allocation`] if the cache cannot grow.
    pub fn acquire(&mut self, key: &FontKey) -> Result<FontHandle, LayoutError> {
        if let Some(&handle) = self.by_key.get(key)
            && let Some(Some(entry)) = self.slots.get_mut(handle.0 as usize)
        {
            entry.refs += 1;
            return Ok(handle);
        }
        let free = self.slots.iter().position(Option::is_none);
        let index = if let Some(index) = free {
            index
        } else {
            self.slots
                .try_reserve(1)
                .map_err(|_| LayoutError::Allocation("font cache"))?;
            self.slots.push(None);
            self.slots.len() - 1
        };
        self.by_key
            .try_reserve(1)
            .map_err(|_| LayoutError::Allocation("font cache"))?;
        let handle = FontHandle(index as u32);
        self.slots[index] = Some(CacheEntry {
            key: key.clone(),
            refs: 1,
        });
        let _ = self.by_key.insert(key.clone(), handle);
        log::trace!(target: "weft::font", "interned {} {}px as {handle:?}", key.face, key.size());
        Ok(handle)
    }

    /// Take another reference to a live handle.
    pub fn retain(&mut self, handle: FontHandle) {
        if let Some(Some(entry)) = self.slots.get_mut(handle.0 as usize) {
            entry.refs += 1;
        }
    }

    /// Drop one reference; the entry is freed with its last reference.
    pub fn release(&mut self, handle: FontHandle) {
        let Some(slot) = self.slots.get_mut(handle.0 as usize) else {
            return;
        };
        let Some(entry) = slot else {
            return;
        };
        entry.refs = entry.refs.saturating_sub(1);
        if entry.refs == 0 {
            let _ = self.by_key.remove(&entry.key);
            *slot = None;
        }
    }

    /// Key of a live handle.
    #[must_use]
    pub fn get(&self, handle: FontHandle) -> Option<&FontKey> {
        self.slots
            .get(handle.0 as usize)
            .and_then(Option::as_ref)
            .map(|e| &e.key)
    }

    /// Reference count of a handle; zero once freed.
    #[must_use]
    pub fn ref_count(&self, handle: FontHandle) -> u32 {
        self.slots
            .get(handle.0 as usize)
            .and_then(Option::as_ref)
            .map_or(0, |e| e.refs)
    }

    /// Number of live fonts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    /// Whether no font is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}

/// Text measurement supplied by the host.
pub trait FontMetrics {
    /// Advance width of `text` set in `font`.
    fn text_width(&self, text: &str, font: &FontKey) -> f32;

    /// Height above the baseline.
    fn ascent(&self, font: &FontKey) -> f32;

    /// Depth below the baseline.
    fn descent(&self, font: &FontKey) -> f32;

    /// [§ 10.8.1](https://www.w3.org/TR/CSS2/visudet.html#leading)
    ///
    /// Ascent plus descent; leading is folded into the ratios.
    fn line_height(&self, font: &FontKey) -> f32 {
        self.ascent(font) + self.descent(font)
    }
}

/// Fixed-ratio metrics for hosts without font data, and for tests.
///
/// Glyphs advance 0.6 em (0.65 em when bold); lines are 1.2 em, split 0.95
/// above the baseline and 0.25 below.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApproximateFontMetrics;

impl FontMetrics for ApproximateFontMetrics {
    fn text_width(&self, text: &str, font: &FontKey) -> f32 {
        let ratio = if font.flags.contains(FontFlags::BOLD) {
            0.65
        } else {
            0.6
        };
        text.chars().count() as f32 * font.size() * ratio
    }

    fn ascent(&self, font: &FontKey) -> f32 {
        font.size() * 0.95
    }

    fn descent(&self, font: &FontKey) -> f32 {
        font.size() * 0.25
    }
}
