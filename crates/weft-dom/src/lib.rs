//! Box tree arena for the weft engine.
//!
//! The tree builder (an external collaborator) inserts element boxes and
//! their content here; the CSS matcher walks it upward through parent links,
//! and the layout engine keys its per-box state by [`NodeId`].
//!
//! # Design
//!
//! All nodes live in one arena and refer to each other by [`NodeId`]. A
//! parent owns its children (removing a node frees its whole subtree); the
//! parent link held by a child is only an index used for lookups such as
//! ancestor walks during selector matching. Slots are never reused, so a
//! stale `NodeId` (for example a remembered changed child that has since
//! been removed) resolves to `None` instead of aliasing a new node.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Map of attribute names to values for an element.
pub type AttributesMap = HashMap<String, String>;

/// A type-safe index into the box tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(pub usize);

impl NodeId {
    /// The document node is always at index 0.
    pub const ROOT: Self = Self(0);
}

/// A node of the tree with its structural links.
#[derive(Debug, Clone)]
pub struct Node {
    /// What this node holds.
    pub node_type: NodeType,
    /// Non-owning link to the containing box.
    pub parent: Option<NodeId>,
    /// Owned content, in flow order.
    pub children: Vec<NodeId>,
    /// Following sibling in the parent's child list.
    pub next_sibling: Option<NodeId>,
    /// Preceding sibling in the parent's child list.
    pub prev_sibling: Option<NodeId>,
}

/// The content kinds a box can hold.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeType {
    /// The document itself; parent of the root element box.
    Document,
    /// A rectangular element box.
    Element(ElementData),
    /// A run of text, already whitespace- and transform-processed by the builder.
    Text(String),
    /// A forced line break.
    Break(BreakKind),
    /// A list item marker.
    Marker(Bullet),
    /// Content painted by an external widget (image, form control).
    Replaced(ReplacedData),
}

/// Element identity used by selector matching.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ElementData {
    /// Lowercase tag name.
    pub tag_name: String,
    /// Attributes as given by the tree builder.
    pub attrs: AttributesMap,
}

impl ElementData {
    /// Element with a tag and no attributes.
    #[must_use]
    pub fn new(tag_name: &str) -> Self {
        Self {
            tag_name: tag_name.to_ascii_lowercase(),
            attrs: AttributesMap::new(),
        }
    }

    /// Builder-style attribute setter.
    #[must_use]
    pub fn with_attr(mut self, name: &str, value: &str) -> Self {
        let _ = self
            .attrs
            .insert(name.to_ascii_lowercase(), value.to_string());
        self
    }

    /// The `id` attribute, if present.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.attrs.get("id").map(String::as_str)
    }

    /// Iterate the whitespace separated words of the `class` attribute.
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attrs
            .get("class")
            .map(String::as_str)
            .unwrap_or_default()
            .split_ascii_whitespace()
    }

    /// Whether `class` contains `name` as a whole word.
    #[must_use]
    pub fn has_class(&self, name: &str) -> bool {
        self.classes().any(|c| c == name)
    }

    /// Attribute lookup.
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }
}

/// Forced line break flavours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BreakKind {
    /// Plain newline.
    #[default]
    Line,
    /// Newline, then move below all left floats.
    ClearLeft,
    /// Newline, then move below all right floats.
    ClearRight,
    /// Newline, then move below every float.
    ClearBoth,
}

/// Graphical or textual list markers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Bullet {
    /// Unordered list bullet; the class (1..=6) picks the glyph by nesting depth.
    Disc(u8),
    /// Hollow circle.
    Circle,
    /// Filled square.
    Square,
    /// A rendered ordinal such as `3.` or `iv.`.
    Label(String),
}

/// Externally painted content.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReplacedData {
    /// What the widget is, for the painter (`img`, `input`, ...).
    pub kind: String,
    /// Intrinsic width once known.
    pub width: Option<f32>,
    /// Intrinsic height once known.
    pub height: Option<f32>,
}

/// Arena-based box tree.
#[derive(Debug, Clone)]
pub struct DomTree {
    /// Slots indexed by `NodeId`; `None` once freed.
    nodes: Vec<Option<Node>>,
}

impl DomTree {
    /// Create a tree holding only the document node.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: vec![Some(Node {
                node_type: NodeType::Document,
                parent: None,
                children: Vec::new(),
                next_sibling: None,
                prev_sibling: None,
            })],
        }
    }

    /// The document node.
    #[must_use]
    pub const fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Get a live node.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    /// Get a live node mutably.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0).and_then(Option::as_mut)
    }

    /// Whether `id` refers to a live node.
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    /// Number of live nodes, the document included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    /// Always false: the document node cannot be removed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Allocate a detached node.
    pub fn alloc(&mut self, node_type: NodeType) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Some(Node {
            node_type,
            parent: None,
            children: Vec::new(),
            next_sibling: None,
            prev_sibling: None,
        }));
        id
    }

    /// Append `child` as the last child of `parent`.
    ///
    /// Does nothing if either node is not live.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if !self.contains(parent) || !self.contains(child) {
            return;
        }
        let prev_last = self.last_child(parent);
        if let Some(p) = self.get_mut(parent) {
            p.children.push(child);
        }
        if let Some(c) = self.get_mut(child) {
            c.parent = Some(parent);
            c.prev_sibling = prev_last;
            c.next_sibling = None;
        }
        if let Some(prev) = prev_last.and_then(|id| self.get_mut(id)) {
            prev.next_sibling = Some(child);
        }
    }

    /// Detach `id` from its parent and free it together with its subtree.
    ///
    /// Returns the freed ids in pre-order so callers can release per-node
    /// resources. Removing the document node is refused.
    pub fn remove(&mut self, id: NodeId) -> Vec<NodeId> {
        if id == NodeId::ROOT || !self.contains(id) {
            return Vec::new();
        }
        self.detach(id);
        let freed: Vec<NodeId> = self.descendants(id).collect();
        for &n in &freed {
            if let Some(slot) = self.nodes.get_mut(n.0) {
                *slot = None;
            }
        }
        freed
    }

    /// Unlink `id` from its parent and siblings, keeping its subtree.
    fn detach(&mut self, id: NodeId) {
        let (parent, prev, next) = match self.get(id) {
            Some(n) => (n.parent, n.prev_sibling, n.next_sibling),
            None => return,
        };
        if let Some(p) = parent.and_then(|p| self.get_mut(p)) {
            p.children.retain(|&c| c != id);
        }
        if let Some(prev_node) = prev.and_then(|p| self.get_mut(p)) {
            prev_node.next_sibling = next;
        }
        if let Some(next_node) = next.and_then(|n| self.get_mut(n)) {
            next_node.prev_sibling = prev;
        }
        if let Some(n) = self.get_mut(id) {
            n.parent = None;
            n.prev_sibling = None;
            n.next_sibling = None;
        }
    }

    /// Parent of a node.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent)
    }

    /// Children of a node (empty for freed ids).
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map_or(&[], |n| n.children.as_slice())
    }

    /// First child of a node.
    #[must_use]
    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).first().copied()
    }

    /// Last child of a node.
    #[must_use]
    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).last().copied()
    }

    /// Next sibling of a node.
    #[must_use]
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.next_sibling)
    }

    /// Previous sibling of a node.
    #[must_use]
    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.prev_sibling)
    }

    /// Index of `id` within its parent's children.
    #[must_use]
    pub fn position_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&c| c == id)
    }

    /// Whether `descendant` lies strictly below `ancestor`.
    #[must_use]
    pub fn is_descendant_of(&self, descendant: NodeId, ancestor: NodeId) -> bool {
        self.ancestors(descendant).any(|a| a == ancestor)
    }

    /// Iterate ancestors, from parent up to the document node.
    #[must_use]
    pub fn ancestors(&self, id: NodeId) -> AncestorIterator<'_> {
        AncestorIterator {
            tree: self,
            current: self.parent(id),
        }
    }

    /// Iterate preceding siblings, nearest first.
    #[must_use]
    pub fn preceding_siblings(&self, id: NodeId) -> PrecedingSiblingIterator<'_> {
        PrecedingSiblingIterator {
            tree: self,
            current: self.prev_sibling(id),
        }
    }

    /// Pre-order walk of `id` and everything below it.
    #[must_use]
    pub fn descendants(&self, id: NodeId) -> DescendantIterator<'_> {
        DescendantIterator {
            tree: self,
            stack: if self.contains(id) { vec![id] } else { Vec::new() },
        }
    }

    /// Element data if this node is an element box.
    #[must_use]
    pub fn as_element(&self, id: NodeId) -> Option<&ElementData> {
        self.get(id).and_then(|n| match &n.node_type {
            NodeType::Element(data) => Some(data),
            _ => None,
        })
    }

    /// Whether this node is an element box.
    #[must_use]
    pub fn is_element(&self, id: NodeId) -> bool {
        self.as_element(id).is_some()
    }

    /// Text content if this node is a text run.
    #[must_use]
    pub fn as_text(&self, id: NodeId) -> Option<&str> {
        self.get(id).and_then(|n| match &n.node_type {
            NodeType::Text(s) => Some(s.as_str()),
            _ => None,
        })
    }

    /// The first element child of the document: the root box.
    #[must_use]
    pub fn document_element(&self) -> Option<NodeId> {
        self.children(NodeId::ROOT)
            .iter()
            .copied()
            .find(|&id| self.is_element(id))
    }
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over ancestors of a node.
pub struct AncestorIterator<'a> {
    tree: &'a DomTree,
    current: Option<NodeId>,
}

impl Iterator for AncestorIterator<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.current?;
        self.current = self.tree.parent(id);
        Some(id)
    }
}

/// Iterator over preceding siblings of a node.
pub struct PrecedingSiblingIterator<'a> {
    tree: &'a DomTree,
    current: Option<NodeId>,
}

impl Iterator for PrecedingSiblingIterator<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.current?;
        self.current = self.tree.prev_sibling(id);
        Some(id)
    }
}

/// Pre-order iterator over a subtree.
pub struct DescendantIterator<'a> {
    tree: &'a DomTree,
    stack: Vec<NodeId>,
}

impl Iterator for DescendantIterator<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.tree.children(id).iter().rev().copied());
        Some(id)
    }
}
