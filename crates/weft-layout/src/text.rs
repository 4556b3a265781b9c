//! Text runs: whitespace processing and fitting text into a line.
//!
//! [§ 16.6 Whitespace](https://www.w3.org/TR/CSS2/text.html#white-space-prop)

use weft_css::WhiteSpace;

use crate::font::{FontKey, FontMetrics};

/// Collapse runs of whitespace to one space, unless `white_space` preserves it.
///
/// Leading and trailing spaces are kept; line starts skip them at layout.
#[must_use]
pub fn collapse_whitespace(text: &str, white_space: WhiteSpace) -> String {
    if white_space == WhiteSpace::Pre {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for c in text.chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

/// How much of a text run fits in the rest of a line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextFit {
    /// Start of the placed range (after skipped line-start spaces).
    pub start: usize,
    /// End of the placed range.
    pub end: usize,
    /// Width of the placed range.
    pub width: f32,
    /// Offset the next line resumes at; the length of the text when done.
    pub resume: usize,
    /// The line must end after this range (preformatted newline).
    pub forced_break: bool,
}

impl TextFit {
    /// Whether anything was placed.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// A font, its metrics and a whitespace mode: everything needed to measure
/// and break one text run.
#[derive(Clone, Copy)]
pub struct TextMeasure<'a> {
    /// Font the run is set in.
    pub font: &'a FontKey,
    /// Host metrics.
    pub metrics: &'a dyn FontMetrics,
    /// Whitespace handling of the run.
    pub white_space: WhiteSpace,
}

impl TextMeasure<'_> {
    /// Advance width of `text`.
    #[must_use]
    pub fn width(&self, text: &str) -> f32 {
        self.metrics.text_width(text, self.font)
    }

    /// Fit `text[offset..]` into `available` pixels.
    ///
    /// With `force`, at least one word is placed even if it overflows, so a
    /// line that nothing else can share still makes progress.
    #[must_use]
    pub fn fit(&self, text: &str, offset: usize, available: f32, at_line_start: bool, force: bool) -> TextFit {
        let offset = offset.min(text.len());
        match self.white_space {
            WhiteSpace::Pre => self.fit_preformatted(text, offset),
            WhiteSpace::Nowrap => {
                let start = if at_line_start {
                    skip_spaces(text, offset)
                } else {
                    offset
                };
                let width = self.width(&text[start..]);
                let end = if width <= available || force {
                    text.len()
                } else {
                    start
                };
                TextFit {
                    start,
                    end,
                    width: if end == start { 0.0 } else { width },
                    resume: if end == start && start < text.len() {
                        offset
                    } else {
                        text.len()
                    },
                    forced_break: false,
                }
            }
            WhiteSpace::Normal => self.fit_words(text, offset, available, at_line_start, force),
        }
    }

    /// Preformatted text never wraps; it breaks only at newlines.
    fn fit_preformatted(&self, text: &str, offset: usize) -> TextFit {
        let rest = &text[offset..];
        match rest.find('\n') {
            Some(newline) => {
                let end = offset + newline;
                TextFit {
                    start: offset,
                    end,
                    width: self.width(&text[offset..end]),
                    resume: end + 1,
                    forced_break: true,
                }
            }
            None => TextFit {
                start: offset,
                end: text.len(),
                width: self.width(rest),
                resume: text.len(),
                forced_break: false,
            },
        }
    }

    fn fit_words(&self, text: &str, offset: usize, available: f32, at_line_start: bool, force: bool) -> TextFit {
        let start = if at_line_start {
            skip_spaces(text, offset)
        } else {
            offset
        };
        let mut end = start;
        let mut width = 0.0;
        let mut cursor = start;
        while cursor < text.len() {
            // A candidate is the following spaces plus the next word.
            let word_start = skip_spaces(text, cursor);
            let word_end = text[word_start..]
                .find(' ')
                .map_or(text.len(), |i| word_start + i);
            let candidate = self.width(&text[start..word_end]);
            if candidate > available && !(force && end == start) {
                break;
            }
            end = word_end;
            width = candidate;
            cursor = word_end;
        }
        let resume = if end >= text.len() {
            text.len()
        } else {
            skip_spaces(text, end)
        };
        TextFit {
            start,
            end,
            width,
            resume,
            forced_break: false,
        }
    }

    /// Width of the widest unbreakable piece of `text`.
    #[must_use]
    pub fn widest_word(&self, text: &str) -> f32 {
        match self.white_space {
            WhiteSpace::Normal => text
                .split(' ')
                .filter(|w| !w.is_empty())
                .map(|w| self.width(w))
                .fold(0.0, f32::max),
            WhiteSpace::Nowrap => self.width(text.trim()),
            WhiteSpace::Pre => text.split('\n').map(|l| self.width(l)).fold(0.0, f32::max),
        }
    }

    /// Width of the widest line `text` would make with unlimited room.
    #[must_use]
    pub fn unbroken_width(&self, text: &str) -> f32 {
        match self.white_space {
            WhiteSpace::Pre => text.split('\n').map(|l| self.width(l)).fold(0.0, f32::max),
            WhiteSpace::Normal | WhiteSpace::Nowrap => self.width(text.trim()),
        }
    }
}

fn skip_spaces(text: &str, offset: usize) -> usize {
    text[offset..]
        .find(|c: char| c != ' ')
        .map_or(text.len(), |i| offset + i)
}
