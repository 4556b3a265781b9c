//! CSS text to [`Stylesheet`].
//!
//! A recursive-descent reader over characters for the pragmatic CSS 2.1
//! subset legacy pages use. The reader must never hang or panic on hostile
//! input: every step either consumes a character or is forced past one, and
//! every loop runs under a cap from [`ParserLimits`]. Anything malformed is
//! reported to the diagnostic sink and dropped; parsing itself never fails.

mod reader;

use serde::{Deserialize, Serialize};
use weft_common::{DiagnosticSink, LogSink};

use crate::selector::Selector;
use reader::CssReader;

/// Hard caps that bound parsing of any input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserLimits {
    /// Top-level steps (rules, at-rules, recovery skips) per parse call.
    pub max_steps: usize,
    /// Comma separated selectors considered per rule.
    pub max_selector_iterations: usize,
    /// Declarations considered per block.
    pub max_property_iterations: usize,
    /// Characters accepted in one value, selector prelude or quoted string.
    pub max_scan_chars: usize,
}

impl Default for ParserLimits {
    fn default() -> Self {
        Self {
            max_steps: 100_000,
            max_selector_iterations: 1_000,
            max_property_iterations: 1_000,
            max_scan_chars: 10_000,
        }
    }
}

/// One declaration: `name: value [!important]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Property {
    /// Lowercase property name.
    pub name: String,
    /// Value text as written, trimmed, without the `!important` flag.
    pub value: String,
    /// Whether the declaration carried `!important`.
    pub important: bool,
}

impl Property {
    /// A normal (not important) declaration.
    #[must_use]
    pub fn new(name: &str, value: &str) -> Self {
        Self {
            name: name.to_ascii_lowercase(),
            value: value.to_string(),
            important: false,
        }
    }
}

/// A style rule: selector list plus declaration block.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    /// Selectors that parsed; unsupported ones are already dropped.
    pub selectors: Vec<Selector>,
    /// Declarations in source order.
    pub properties: Vec<Property>,
    /// Position of the rule across every merge into the stylesheet.
    pub order: usize,
}

/// An ordered, append-only list of rules.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Stylesheet {
    /// Rules in declaration order.
    pub rules: Vec<Rule>,
}

impl Stylesheet {
    /// Empty stylesheet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse with default limits, logging diagnostics through `log`.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        Self::parse_with(text, &ParserLimits::default(), &LogSink::new())
    }

    /// Parse with explicit limits and sink.
    #[must_use]
    pub fn parse_with(text: &str, limits: &ParserLimits, sink: &dyn DiagnosticSink) -> Self {
        let mut sheet = Self::new();
        sheet.merge_with(text, limits, sink);
        sheet
    }

    /// Append the rules of `text` after the existing ones.
    ///
    /// Existing rules are never replaced, so several `<link>`ed sheets
    /// accumulate and later ones win ties.
    pub fn merge(&mut self, text: &str) {
        self.merge_with(text, &ParserLimits::default(), &LogSink::new());
    }

    /// [`Self::merge`] with explicit limits and sink.
    pub fn merge_with(&mut self, text: &str, limits: &ParserLimits, sink: &dyn DiagnosticSink) {
        let next_order = self.rules.last().map_or(0, |r| r.order + 1);
        let mut reader = CssReader::new(text, limits, sink);
        let rules = reader.read_stylesheet(next_order);
        log::trace!(target: "weft::css", "merged {} rules", rules.len());
        self.rules.extend(rules);
    }

    /// Number of rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether there are no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Parse a stylesheet with default limits.
#[must_use]
pub fn parse(text: &str) -> Stylesheet {
    Stylesheet::parse(text)
}

/// Parse a bare declaration list such as the body of a `style` attribute.
#[must_use]
pub fn parse_declarations(text: &str) -> Vec<Property> {
    parse_declarations_with(text, &ParserLimits::default(), &LogSink::new())
}

/// [`parse_declarations`] with explicit limits and sink.
#[must_use]
pub fn parse_declarations_with(
    text: &str,
    limits: &ParserLimits,
    sink: &dyn DiagnosticSink,
) -> Vec<Property> {
    CssReader::new(text, limits, sink).read_declarations(false)
}
