//! Specificity-ordered application of matching rules onto a box.
//!
//! [CSS 2.1 § 6.4.1 Cascading order](https://www.w3.org/TR/CSS2/cascade.html#cascading-order)
//!
//! Every rule with at least one matching selector takes part, ranked by the
//! highest specificity among its matching selectors. Ranking is a stable
//! sort, so rules of equal specificity keep declaration order and the later
//! one is applied last. Applying properties overwrites, which makes the whole
//! operation idempotent: re-running it over an unchanged stylesheet writes the
//! same values again.

use weft_common::{DiagnosticSink, NullSink};
use weft_dom::{DomTree, NodeId};

use crate::parser::{ParserLimits, Property, Rule, Stylesheet, parse_declarations_with};
use crate::selector::{MatchLimits, PseudoClass};
use crate::style::values::{Color, TextTransform};
use crate::style::BoxStyle;

/// Shared state for one cascade run.
pub struct CascadeContext<'a> {
    /// Document-scope text transform, updated whenever a `text-transform`
    /// declaration is applied. The builder uses it for text appended later.
    pub text_transform: Option<TextTransform>,
    /// Selector matching caps.
    pub match_limits: MatchLimits,
    /// Caps for parsing inline `style` text.
    pub parser_limits: ParserLimits,
    /// Where unknown properties and bad values are reported.
    pub sink: &'a dyn DiagnosticSink,
}

impl<'a> CascadeContext<'a> {
    /// Context with default limits.
    #[must_use]
    pub fn new(sink: &'a dyn DiagnosticSink) -> Self {
        Self {
            text_transform: None,
            match_limits: MatchLimits::default(),
            parser_limits: ParserLimits::default(),
            sink,
        }
    }

    /// Context with explicit limits.
    #[must_use]
    pub const fn with_limits(
        match_limits: MatchLimits,
        parser_limits: ParserLimits,
        sink: &'a dyn DiagnosticSink,
    ) -> Self {
        Self {
            text_transform: None,
            match_limits,
            parser_limits,
            sink,
        }
    }
}

impl Default for CascadeContext<'static> {
    fn default() -> Self {
        Self::new(&NullSink)
    }
}

/// A rule that matched, with the specificity it ranks at.
#[derive(Debug, Clone, Copy)]
pub struct MatchedRule<'s> {
    /// Highest specificity among the rule's matching selectors.
    pub specificity: u32,
    /// The rule itself.
    pub rule: &'s Rule,
}

/// Rules matching `node`, in application order.
#[must_use]
pub fn matching_rules<'s>(
    sheet: &'s Stylesheet,
    tree: &DomTree,
    node: NodeId,
    limits: &MatchLimits,
) -> Vec<MatchedRule<'s>> {
    let mut matched: Vec<MatchedRule<'s>> = sheet
        .rules
        .iter()
        .filter_map(|rule| {
            rule.selectors
                .iter()
                .filter(|s| s.matches(tree, node, limits))
                .map(|s| s.specificity)
                .max()
                .map(|specificity| MatchedRule { specificity, rule })
        })
        .collect();
    // Stable: equal specificity keeps declaration order.
    matched.sort_by_key(|m| m.specificity);
    matched
}

/// Apply every matching rule of `sheet` onto `style`.
///
/// Normal declarations are applied in rank order first, then `!important`
/// declarations in the same order.
pub fn apply_cascade(
    sheet: &Stylesheet,
    tree: &DomTree,
    node: NodeId,
    style: &mut BoxStyle,
    ctx: &mut CascadeContext<'_>,
) {
    restyle(sheet, tree, node, style, None, ctx);
}

/// Cascade onto a box; its tag, class and id come from the box's element data.
///
/// Content that is not an element box (text, breaks, markers) is left alone.
pub fn apply_to_box(
    sheet: &Stylesheet,
    tree: &DomTree,
    node: NodeId,
    style: &mut BoxStyle,
    ctx: &mut CascadeContext<'_>,
) {
    if !tree.is_element(node) {
        return;
    }
    apply_cascade(sheet, tree, node, style, ctx);
}

/// Apply a `style` attribute body onto a box style.
///
/// `tag` is the element the attribute belongs to; it only labels diagnostics.
pub fn apply_inline(style: &mut BoxStyle, style_text: &str, tag: &str, ctx: &mut CascadeContext<'_>) {
    let properties = parse_declarations_with(style_text, &ctx.parser_limits, ctx.sink);
    log::trace!(target: "weft::css", "<{tag}> inline style: {} declarations", properties.len());
    apply_in_two_passes(style, std::iter::once(properties.as_slice()), ctx);
}

/// Full restyle of an element box: stylesheet rules, then its inline
/// declarations, in the standard precedence (sheet normal < inline normal <
/// sheet important < inline important).
pub fn restyle(
    sheet: &Stylesheet,
    tree: &DomTree,
    node: NodeId,
    style: &mut BoxStyle,
    inline: Option<&str>,
    ctx: &mut CascadeContext<'_>,
) {
    let matched = matching_rules(sheet, tree, node, &ctx.match_limits);
    let inline_properties = inline
        .map(|text| parse_declarations_with(text, &ctx.parser_limits, ctx.sink))
        .unwrap_or_default();
    let blocks = matched
        .iter()
        .map(|m| m.rule.properties.as_slice())
        .chain(std::iter::once(inline_properties.as_slice()));
    apply_in_two_passes(style, blocks, ctx);
}

fn apply_in_two_passes<'p, I>(style: &mut BoxStyle, blocks: I, ctx: &mut CascadeContext<'_>)
where
    I: Iterator<Item = &'p [Property]> + Clone,
{
    for important in [false, true] {
        for block in blocks.clone() {
            for property in block.iter().filter(|p| p.important == important) {
                style.apply_property(property, ctx);
            }
        }
    }
}

/// The color for links from `:link` / `a:link` (or the `:visited` variants).
///
/// Returns `None` when the stylesheet sets no such color.
#[must_use]
pub fn match_link_color(sheet: &Stylesheet, is_visited: bool) -> Option<Color> {
    let wanted = if is_visited {
        PseudoClass::Visited
    } else {
        PseudoClass::Link
    };
    let mut candidates: Vec<(u32, &Rule)> = sheet
        .rules
        .iter()
        .filter_map(|rule| {
            rule.selectors
                .iter()
                .filter(|s| {
                    s.components.len() == 1
                        && s.subject_has_pseudo_class(&wanted)
                        && s.subject()
                            .and_then(|c| c.element.as_deref())
                            .is_none_or(|tag| tag == "a")
                })
                .map(|s| s.specificity)
                .max()
                .map(|specificity| (specificity, rule))
        })
        .collect();
    candidates.sort_by_key(|(specificity, _)| *specificity);

    let mut color = None;
    for important in [false, true] {
        for (_, rule) in &candidates {
            for property in rule
                .properties
                .iter()
                .filter(|p| p.name == "color" && p.important == important)
            {
                if let Some(c) = Color::parse(&property.value) {
                    color = Some(c);
                }
            }
        }
    }
    color
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use crate::style::values::Length;
    use weft_dom::{ElementData, NodeType};

    fn single_box(data: ElementData) -> (DomTree, NodeId) {
        let mut tree = DomTree::new();
        let id = tree.alloc(NodeType::Element(data));
        tree.append_child(NodeId::ROOT, id);
        (tree, id)
    }

    #[test]
    fn test_important_beats_higher_specificity() {
        let sheet = parse("#x { color: red } p { color: blue !important }");
        let (tree, p) = single_box(ElementData::new("p").with_attr("id", "x"));
        let mut style = BoxStyle::default();
        apply_cascade(&sheet, &tree, p, &mut style, &mut CascadeContext::default());
        assert_eq!(style.color, Some(Color::rgb(0, 0, 255)));
    }

    #[test]
    fn test_inline_beats_sheet_but_not_important() {
        let sheet = parse(".c { width: 10px; height: 10px !important }");
        let (tree, div) = single_box(ElementData::new("div").with_attr("class", "c"));
        let mut style = BoxStyle::default();
        restyle(
            &sheet,
            &tree,
            div,
            &mut style,
            Some("width: 20px; height: 20px"),
            &mut CascadeContext::default(),
        );
        assert_eq!(style.width, Some(Length::Px(20.0)));
        assert_eq!(style.height, Some(Length::Px(10.0)));
    }

    #[test]
    fn test_text_nodes_are_skipped() {
        let sheet = parse("* { color: red }");
        let mut tree = DomTree::new();
        let text = tree.alloc(NodeType::Text("hi".to_string()));
        tree.append_child(NodeId::ROOT, text);
        let mut style = BoxStyle::default();
        apply_to_box(&sheet, &tree, text, &mut style, &mut CascadeContext::default());
        assert_eq!(style, BoxStyle::default());
    }

    #[test]
    fn test_link_colors() {
        let sheet = parse("a:link { color: #0000ee } :visited { color: purple } a:hover { color: red }");
        assert_eq!(match_link_color(&sheet, false), Some(Color::rgb(0, 0, 0xee)));
        assert_eq!(match_link_color(&sheet, true), Some(Color::rgb(128, 0, 128)));
        assert_eq!(match_link_color(&parse("p { color: red }"), false), None);
    }
}
