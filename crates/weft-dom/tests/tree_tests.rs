//! Structural tests for the box tree arena.

use weft_dom::{DomTree, ElementData, NodeId, NodeType};

fn element(tree: &mut DomTree, parent: NodeId, tag: &str) -> NodeId {
    let id = tree.alloc(NodeType::Element(ElementData::new(tag)));
    tree.append_child(parent, id);
    id
}

#[test]
fn test_append_links_siblings() {
    let mut tree = DomTree::new();
    let body = element(&mut tree, NodeId::ROOT, "body");
    let a = element(&mut tree, body, "p");
    let b = element(&mut tree, body, "p");
    let c = element(&mut tree, body, "p");

    assert_eq!(tree.children(body), &[a, b, c]);
    assert_eq!(tree.next_sibling(a), Some(b));
    assert_eq!(tree.prev_sibling(c), Some(b));
    assert_eq!(tree.parent(b), Some(body));
    assert_eq!(tree.position_in_parent(c), Some(2));
}

#[test]
fn test_remove_frees_subtree_and_relinks() {
    let mut tree = DomTree::new();
    let body = element(&mut tree, NodeId::ROOT, "body");
    let a = element(&mut tree, body, "div");
    let b = element(&mut tree, body, "div");
    let inner = element(&mut tree, b, "span");
    let c = element(&mut tree, body, "div");

    let freed = tree.remove(b);
    assert_eq!(freed, vec![b, inner]);
    assert!(!tree.contains(b));
    assert!(!tree.contains(inner));
    assert_eq!(tree.children(body), &[a, c]);
    assert_eq!(tree.next_sibling(a), Some(c));
    assert_eq!(tree.prev_sibling(c), Some(a));
}

#[test]
fn test_stale_ids_are_never_reused() {
    let mut tree = DomTree::new();
    let body = element(&mut tree, NodeId::ROOT, "body");
    let gone = element(&mut tree, body, "p");
    let _ = tree.remove(gone);
    let fresh = element(&mut tree, body, "p");

    assert_ne!(gone, fresh);
    assert!(tree.get(gone).is_none());
    assert!(tree.children(gone).is_empty());
}

#[test]
fn test_document_node_cannot_be_removed() {
    let mut tree = DomTree::new();
    let _ = element(&mut tree, NodeId::ROOT, "html");
    assert!(tree.remove(NodeId::ROOT).is_empty());
    assert_eq!(tree.len(), 2);
}

#[test]
fn test_ancestors_and_document_element() {
    let mut tree = DomTree::new();
    let html = element(&mut tree, NodeId::ROOT, "html");
    let body = element(&mut tree, html, "body");
    let p = element(&mut tree, body, "p");

    let chain: Vec<NodeId> = tree.ancestors(p).collect();
    assert_eq!(chain, vec![body, html, NodeId::ROOT]);
    assert_eq!(tree.document_element(), Some(html));
    assert!(tree.is_descendant_of(p, html));
    assert!(!tree.is_descendant_of(html, p));
}

#[test]
fn test_class_words_and_id() {
    let data = ElementData::new("DIV")
        .with_attr("class", "  note  warning ")
        .with_attr("ID", "main");
    assert_eq!(data.tag_name, "div");
    assert!(data.has_class("note"));
    assert!(data.has_class("warning"));
    assert!(!data.has_class("warn"));
    assert_eq!(data.id(), Some("main"));
}

#[test]
fn test_descendants_preorder() {
    let mut tree = DomTree::new();
    let body = element(&mut tree, NodeId::ROOT, "body");
    let a = element(&mut tree, body, "div");
    let a1 = element(&mut tree, a, "span");
    let b = element(&mut tree, body, "div");
    let order: Vec<NodeId> = tree.descendants(body).collect();
    assert_eq!(order, vec![body, a, a1, b]);
}
