//! Selector matching against the box tree.
//!
//! Matching is iterative: the subject component is tested against the box,
//! then each further component is tested against the parent (child
//! combinator) or some ancestor (descendant combinator). Candidate ancestors
//! are kept on an explicit stack so a descendant step can backtrack to a
//! farther ancestor, and both the ancestor walk and the total work are
//! bounded by [`MatchLimits`].

use serde::{Deserialize, Serialize};
use weft_dom::{DomTree, NodeId};

use super::{Combinator, PseudoClass, Selector, SelectorComponent};

/// Caps for selector matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchLimits {
    /// Ancestors examined by one descendant combinator.
    pub max_descendant_depth: usize,
    /// Components in a chain; longer selectors never match.
    pub max_chain_depth: usize,
}

impl Default for MatchLimits {
    fn default() -> Self {
        Self {
            max_descendant_depth: 50,
            max_chain_depth: 20,
        }
    }
}

impl Selector {
    /// Whether this selector matches `node`.
    ///
    /// Fails closed: a missing parent, an over-long chain or an exhausted
    /// budget all count as no match.
    #[must_use]
    pub fn matches(&self, tree: &DomTree, node: NodeId, limits: &MatchLimits) -> bool {
        let components = &self.components;
        if components.is_empty() || components.len() > limits.max_chain_depth {
            return false;
        }
        if !components[0].matches_node(tree, node) {
            return false;
        }

        // (index of the next component to satisfy, box that satisfied the previous one)
        let mut stack: Vec<(usize, NodeId)> = vec![(1, node)];
        let mut budget = limits
            .max_descendant_depth
            .saturating_mul(limits.max_chain_depth)
            .max(1);

        while let Some((index, at)) = stack.pop() {
            if index == components.len() {
                return true;
            }
            if budget == 0 {
                return false;
            }
            budget -= 1;

            let component = &components[index];
            match components[index - 1].combinator {
                Some(Combinator::Child) => {
                    if let Some(parent) = element_parent(tree, at) {
                        if component.matches_node(tree, parent) {
                            stack.push((index + 1, parent));
                        }
                    }
                }
                Some(Combinator::Descendant) | None => {
                    let candidates: Vec<NodeId> = tree
                        .ancestors(at)
                        .take_while(|&a| tree.is_element(a))
                        .take(limits.max_descendant_depth)
                        .filter(|&a| component.matches_node(tree, a))
                        .collect();
                    // Nearest ancestor is tried first.
                    stack.extend(candidates.into_iter().rev().map(|a| (index + 1, a)));
                }
            }
        }
        false
    }
}

impl SelectorComponent {
    /// Test this compound selector against a single box, ignoring combinators.
    #[must_use]
    pub fn matches_node(&self, tree: &DomTree, node: NodeId) -> bool {
        let Some(element) = tree.as_element(node) else {
            return false;
        };
        if self.pseudo_element.is_some() {
            return false;
        }
        if let Some(name) = &self.element {
            if !element.tag_name.eq_ignore_ascii_case(name) {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if element.id() != Some(id.as_str()) {
                return false;
            }
        }
        if !self.classes.iter().all(|c| element.has_class(c)) {
            return false;
        }
        if !self
            .attributes
            .iter()
            .all(|a| a.matches(element.attr(&a.name)))
        {
            return false;
        }
        self.pseudo_classes
            .iter()
            .all(|p| pseudo_class_matches(p, tree, node))
    }
}

fn pseudo_class_matches(pseudo: &PseudoClass, tree: &DomTree, node: NodeId) -> bool {
    match pseudo {
        PseudoClass::Root => tree.document_element() == Some(node),
        PseudoClass::FirstChild => {
            element_parent(tree, node).is_some()
                && !tree.preceding_siblings(node).any(|s| tree.is_element(s))
        }
        PseudoClass::LastChild => {
            let Some(parent) = element_parent(tree, node) else {
                return false;
            };
            let siblings = tree.children(parent);
            siblings
                .iter()
                .rev()
                .find(|&&s| tree.is_element(s))
                .is_some_and(|&s| s == node)
        }
        PseudoClass::Link | PseudoClass::Visited | PseudoClass::Dynamic(_) => false,
    }
}

/// Parent if it is an element box; the document node does not count.
fn element_parent(tree: &DomTree, node: NodeId) -> Option<NodeId> {
    tree.parent(node).filter(|&p| tree.is_element(p))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::parse_selector;
    use weft_dom::{ElementData, NodeType};

    fn el(tree: &mut DomTree, parent: NodeId, data: ElementData) -> NodeId {
        let id = tree.alloc(NodeType::Element(data));
        tree.append_child(parent, id);
        id
    }

    #[test]
    fn test_descendant_backtracks_past_nearest_ancestor() {
        // div > p span: the nearest <p> is not a child of <div>, a farther one is.
        let mut tree = DomTree::new();
        let html = el(&mut tree, NodeId::ROOT, ElementData::new("html"));
        let div = el(&mut tree, html, ElementData::new("div"));
        let outer_p = el(&mut tree, div, ElementData::new("p"));
        let section = el(&mut tree, outer_p, ElementData::new("section"));
        let inner_p = el(&mut tree, section, ElementData::new("p"));
        let span = el(&mut tree, inner_p, ElementData::new("span"));

        let sel = parse_selector("div > p span").unwrap();
        assert!(sel.matches(&tree, span, &MatchLimits::default()));
    }

    #[test]
    fn test_descendant_depth_cap() {
        let mut tree = DomTree::new();
        let html = el(&mut tree, NodeId::ROOT, ElementData::new("html"));
        let mut parent = el(&mut tree, html, ElementData::new("article"));
        for _ in 0..10 {
            parent = el(&mut tree, parent, ElementData::new("div"));
        }
        let sel = parse_selector("article span").unwrap();
        let span = el(&mut tree, parent, ElementData::new("span"));
        assert!(sel.matches(&tree, span, &MatchLimits::default()));
        let shallow = MatchLimits {
            max_descendant_depth: 5,
            ..MatchLimits::default()
        };
        assert!(!sel.matches(&tree, span, &shallow));
    }

    #[test]
    fn test_long_chain_fails_closed() {
        let mut tree = DomTree::new();
        let mut node = el(&mut tree, NodeId::ROOT, ElementData::new("div"));
        for _ in 0..25 {
            node = el(&mut tree, node, ElementData::new("div"));
        }
        let limits = MatchLimits::default();
        let twenty = parse_selector(&vec!["div"; 20].join(" ")).unwrap();
        let twenty_one = parse_selector(&vec!["div"; 21].join(" ")).unwrap();
        assert!(twenty.matches(&tree, node, &limits));
        assert!(!twenty_one.matches(&tree, node, &limits));
    }

    #[test]
    fn test_child_of_document_has_no_element_parent() {
        let mut tree = DomTree::new();
        let html = el(&mut tree, NodeId::ROOT, ElementData::new("html"));
        let sel = parse_selector("body > html").unwrap();
        assert!(!sel.matches(&tree, html, &MatchLimits::default()));
        let root = parse_selector(":root").unwrap();
        assert!(root.matches(&tree, html, &MatchLimits::default()));
    }

    #[test]
    fn test_first_and_last_child() {
        let mut tree = DomTree::new();
        let ul = el(&mut tree, NodeId::ROOT, ElementData::new("ul"));
        let a = el(&mut tree, ul, ElementData::new("li"));
        let b = el(&mut tree, ul, ElementData::new("li"));
        let limits = MatchLimits::default();
        let first = parse_selector("li:first-child").unwrap();
        let last = parse_selector("li:last-child").unwrap();
        assert!(first.matches(&tree, a, &limits));
        assert!(!first.matches(&tree, b, &limits));
        assert!(last.matches(&tree, b, &limits));
        assert!(!last.matches(&tree, a, &limits));
    }
}
