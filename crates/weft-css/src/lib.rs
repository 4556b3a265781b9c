//! CSS parsing, selector matching and cascade for the weft engine.
//!
//! # Scope
//!
//! This crate implements:
//! - **CSS Parser** ([`parser`]): a bounded recursive-descent reader for the
//!   CSS 2.1 subset legacy pages use
//!   - Rules, comma separated selector lists, declaration blocks
//!   - `@`-rules and comments lexically skipped
//!   - `!important`
//!   - Hard caps on every loop so hostile input cannot hang the parser
//!
//! - **Selectors** ([`selector`]): type, class, id, universal, attribute
//!   (`=`, `~=`, `|=`, `^=`, `$=`, `*=`), `:root`, `:first-child`,
//!   `:last-child`, descendant and child combinators
//!   - Flattened subject-first chains matched iteratively
//!   - Specificity on the 100/10/1 scale
//!
//! - **Cascade** ([`cascade`]): specificity-ranked, order-stable application
//!   onto a [`BoxStyle`], inline `style` text, link colors
//!
//! # Not Implemented
//!
//! - Sibling combinators and functional pseudo-classes (dropped with a diagnostic)
//! - Media queries (skipped with the rest of the `@`-rule)
//! - Flex, grid and table display values

/// Specificity-ordered rule application.
pub mod cascade;
/// CSS text to stylesheet.
pub mod parser;
/// Selector chains and matching.
pub mod selector;
/// Box style attributes and CSS values.
pub mod style;

pub use cascade::{
    CascadeContext, MatchedRule, apply_cascade, apply_inline, apply_to_box, match_link_color,
    matching_rules, restyle,
};
pub use parser::{
    ParserLimits, Property, Rule, Stylesheet, parse, parse_declarations, parse_declarations_with,
};
pub use selector::{
    AttributeMatcher, AttributeOperator, Combinator, MatchLimits, PseudoClass, Selector,
    SelectorComponent, SelectorError, SelectorFlags, parse_selector,
};
pub use style::values::{
    BorderStyle, Clear, Color, DisplayValue, Float, FontStyle, Length, ListStyleType, Overflow,
    Position, TextAlign, TextDecoration, TextTransform, VerticalAlign, WhiteSpace,
};
pub use style::{BoxStyle, DEFAULT_FONT_SIZE_PX, Sides};
