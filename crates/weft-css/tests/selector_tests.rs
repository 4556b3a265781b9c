//! Integration tests for selector parsing and tree matching.

use weft_css::{MatchLimits, parse_selector};
use weft_dom::{DomTree, ElementData, NodeId, NodeType};

/// Builds `<html><body><div id="main" class="box wide"><p class="note"><span>` .
struct Fixture {
    tree: DomTree,
    html: NodeId,
    body: NodeId,
    div: NodeId,
    p: NodeId,
    span: NodeId,
}

fn el(tree: &mut DomTree, parent: NodeId, data: ElementData) -> NodeId {
    let id = tree.alloc(NodeType::Element(data));
    tree.append_child(parent, id);
    id
}

fn fixture() -> Fixture {
    let mut tree = DomTree::new();
    let html = el(&mut tree, NodeId::ROOT, ElementData::new("html"));
    let body = el(&mut tree, html, ElementData::new("body"));
    let div = el(
        &mut tree,
        body,
        ElementData::new("div")
            .with_attr("id", "main")
            .with_attr("class", "box wide"),
    );
    let p = el(&mut tree, div, ElementData::new("p").with_attr("class", "note"));
    let span = el(&mut tree, p, ElementData::new("span").with_attr("lang", "en-US"));
    Fixture {
        tree,
        html,
        body,
        div,
        p,
        span,
    }
}

fn matches(selector: &str, f: &Fixture, node: NodeId) -> bool {
    parse_selector(selector)
        .unwrap_or_else(|e| panic!("{selector}: {e}"))
        .matches(&f.tree, node, &MatchLimits::default())
}

#[test]
fn test_type_class_id() {
    let f = fixture();
    assert!(matches("div", &f, f.div));
    assert!(matches("DIV", &f, f.div));
    assert!(matches(".box", &f, f.div));
    assert!(matches(".box.wide", &f, f.div));
    assert!(matches("#main", &f, f.div));
    assert!(matches("div#main.box", &f, f.div));
    assert!(!matches(".bo", &f, f.div));
    assert!(!matches("p", &f, f.div));
    assert!(matches("*", &f, f.span));
}

#[test]
fn test_combinators() {
    let f = fixture();
    assert!(matches("body span", &f, f.span));
    assert!(matches("div > p > span", &f, f.span));
    assert!(matches("html .note span", &f, f.span));
    assert!(!matches("div > span", &f, f.span));
    assert!(!matches("span p", &f, f.p));
    assert!(matches("body > #main", &f, f.div));
}

#[test]
fn test_root_only_matches_document_element() {
    let f = fixture();
    assert!(matches(":root", &f, f.html));
    assert!(matches("html:root", &f, f.html));
    assert!(!matches(":root", &f, f.body));
    assert!(matches(":root > body", &f, f.body));
}

#[test]
fn test_attribute_scenarios() {
    let mut tree = DomTree::new();
    let body = el(&mut tree, NodeId::ROOT, ElementData::new("body"));
    let yes = el(&mut tree, body, ElementData::new("div").with_attr("data-x", "abc"));
    let no = el(&mut tree, body, ElementData::new("div").with_attr("data-x", "xab"));
    let selector = parse_selector(r#"[data-x^="ab"]"#).unwrap();
    let limits = MatchLimits::default();
    assert!(selector.matches(&tree, yes, &limits));
    assert!(!selector.matches(&tree, no, &limits));
}

#[test]
fn test_attribute_operators_against_tree() {
    let f = fixture();
    assert!(matches("[lang]", &f, f.span));
    assert!(matches("[lang|=en]", &f, f.span));
    assert!(matches("[lang$=US]", &f, f.span));
    assert!(matches("[lang*='n-U']", &f, f.span));
    assert!(matches("[class~=wide]", &f, f.div));
    assert!(!matches("[class~=wid]", &f, f.div));
    assert!(!matches("[class=box]", &f, f.div));
    assert!(matches(r#"[class="box wide"]"#, &f, f.div));
}

#[test]
fn test_dynamic_pseudo_classes_and_elements_never_match() {
    let f = fixture();
    assert!(!matches("div:hover", &f, f.div));
    assert!(!matches("div:link", &f, f.div));
    assert!(!matches("p::first-line", &f, f.p));
    assert!(!matches("p:before", &f, f.p));
}

#[test]
fn test_non_element_content_never_matches() {
    let mut f = fixture();
    let text = f.tree.alloc(NodeType::Text("hello".to_string()));
    f.tree.append_child(f.p, text);
    assert!(!matches("*", &f, text));
}
