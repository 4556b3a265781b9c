//! Integration tests for the cascade.

use weft_common::{CollectingSink, DiagnosticKind};
use weft_css::{
    BoxStyle, CascadeContext, Color, Length, Stylesheet, TextTransform, apply_inline,
    apply_to_box, parse,
};
use weft_dom::{AttributesMap, DomTree, ElementData, NodeId, NodeType};

fn make_element(tag: &str, id: Option<&str>, classes: &[&str]) -> NodeType {
    let mut attrs = AttributesMap::new();
    if let Some(id_val) = id {
        let _ = attrs.insert("id".to_string(), id_val.to_string());
    }
    if !classes.is_empty() {
        let _ = attrs.insert("class".to_string(), classes.join(" "));
    }
    NodeType::Element(ElementData {
        tag_name: tag.to_string(),
        attrs,
    })
}

fn styled(sheet: &Stylesheet, node_type: NodeType) -> BoxStyle {
    let mut tree = DomTree::new();
    let html = tree.alloc(make_element("html", None, &[]));
    tree.append_child(NodeId::ROOT, html);
    let node = tree.alloc(node_type);
    tree.append_child(html, node);
    let mut style = BoxStyle::default();
    apply_to_box(sheet, &tree, node, &mut style, &mut CascadeContext::default());
    style
}

#[test]
fn test_id_beats_class_regardless_of_order() {
    let element = || make_element("div", Some("id"), &["cls"]);
    let before = parse("#id { color: red } .cls { color: blue }");
    let after = parse(".cls { color: blue } #id { color: red }");
    assert_eq!(styled(&before, element()).color, Some(Color::rgb(255, 0, 0)));
    assert_eq!(styled(&after, element()).color, Some(Color::rgb(255, 0, 0)));
}

#[test]
fn test_box_width_scenario() {
    let sheet = parse(".box{width:100px} #id{width:50px}");
    let style = styled(&sheet, make_element("div", Some("id"), &["box"]));
    assert_eq!(style.width, Some(Length::Px(50.0)));
}

#[test]
fn test_equal_specificity_later_declaration_wins() {
    let sheet = parse(".a { background-color: red } .b { background-color: green }");
    let style = styled(&sheet, make_element("p", None, &["b", "a"]));
    assert_eq!(style.background_color, Some(Color::rgb(0, 128, 0)));
}

#[test]
fn test_later_merge_wins_ties() {
    let mut sheet = parse("p { color: red }");
    sheet.merge("p { color: blue }");
    let style = styled(&sheet, make_element("p", None, &[]));
    assert_eq!(style.color, Some(Color::rgb(0, 0, 255)));
}

#[test]
fn test_rule_ranks_by_best_matching_selector() {
    // The first rule matches through its id selector (100) and outranks .c (10).
    let sheet = parse("#x, span { color: red } .c { color: blue }");
    let style = styled(&sheet, make_element("p", Some("x"), &["c"]));
    assert_eq!(style.color, Some(Color::rgb(255, 0, 0)));
}

#[test]
fn test_cascade_is_idempotent() {
    let sheet = parse(
        "div { margin: 1px 2px; color: #123 } .c { padding: 3px; text-transform: uppercase } \
         #i { border: 1px solid red; width: 40% } div.c { z-index: 3; position: relative }",
    );
    let mut tree = DomTree::new();
    let node = tree.alloc(make_element("div", Some("i"), &["c"]));
    tree.append_child(NodeId::ROOT, node);

    let mut style = BoxStyle::default();
    let mut ctx = CascadeContext::default();
    apply_to_box(&sheet, &tree, node, &mut style, &mut ctx);
    let once = style.clone();
    apply_to_box(&sheet, &tree, node, &mut style, &mut ctx);
    assert_eq!(style, once);
    assert_eq!(ctx.text_transform, Some(TextTransform::Uppercase));
    assert_eq!(style.z_index, Some(3));
}

#[test]
fn test_apply_inline() {
    let sink = CollectingSink::new();
    let mut ctx = CascadeContext::new(&sink);
    let mut style = BoxStyle::default();
    apply_inline(&mut style, "color: lime; float: left; bogus: 1", "span", &mut ctx);
    assert_eq!(style.color, Some(Color::rgb(0, 255, 0)));
    assert_eq!(style.float, Some(weft_css::Float::Left));
    assert_eq!(sink.count(DiagnosticKind::Unsupported), 1);
}

#[test]
fn test_unmatched_rules_leave_style_untouched() {
    let sheet = parse("ul li { color: red } #other { width: 1px }");
    let style = styled(&sheet, make_element("li", None, &[]));
    assert_eq!(style, BoxStyle::default());
}
