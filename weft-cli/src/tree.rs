//! JSON box-tree descriptions.
//!
//! A description names the root box and, optionally, CSS merged before any
//! box is added:
//!
//! ```json
//! {
//!   "stylesheet": ".note { float: right; width: 80px }",
//!   "root": {
//!     "tag": "body",
//!     "children": [
//!       { "box": { "tag": "div", "attrs": { "class": "note" },
//!                  "children": [ { "text": "aside" } ] } },
//!       { "text": "Main text" },
//!       { "break": "clear-both" },
//!       { "list": { "kind": "unordered",
//!                   "items": [ [ { "text": "one" } ], [ { "text": "two" } ] ] } }
//!     ]
//!   }
//! }
//! ```
//!
//! A `style` attribute is applied as the box's inline style.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use serde::Deserialize;
use weft_dom::{BreakKind, ElementData, NodeId};
use weft_layout::{BoxProperty, Document, ListKind, ListOp};

/// A whole document.
#[derive(Debug, Deserialize)]
pub struct TreeDescription {
    /// CSS merged before the tree is built.
    #[serde(default)]
    pub stylesheet: Option<String>,
    /// The root box.
    pub root: BoxDescription,
}

/// An element box.
#[derive(Debug, Deserialize)]
pub struct BoxDescription {
    /// Tag name.
    pub tag: String,
    /// Attributes, matched by selectors.
    #[serde(default)]
    pub attrs: BTreeMap<String, String>,
    /// Children in order.
    #[serde(default)]
    pub children: Vec<ChildDescription>,
}

/// One child of a box.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChildDescription {
    /// A nested box.
    Box(BoxDescription),
    /// A run of text.
    Text(String),
    /// A forced break.
    Break(BreakKind),
    /// Externally painted content; no size means still loading.
    Replaced {
        /// What it is (`img`, `input`, ...).
        kind: String,
        /// Intrinsic width.
        #[serde(default)]
        width: Option<f32>,
        /// Intrinsic height.
        #[serde(default)]
        height: Option<f32>,
    },
    /// A list whose items are appended to the current box, each after its
    /// marker.
    List {
        /// Kind of list.
        kind: ListKind,
        /// `list-style-type` keyword.
        #[serde(default)]
        style: Option<String>,
        /// Items flow side by side.
        #[serde(default)]
        horizontal: bool,
        /// Content of each item.
        items: Vec<Vec<ChildDescription>>,
    },
    /// Content inside a link.
    Link {
        /// Whether the link was visited.
        #[serde(default)]
        visited: bool,
        /// Link content.
        children: Vec<ChildDescription>,
    },
}

impl TreeDescription {
    /// Parse a description from JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("invalid tree description")
    }

    /// Merge the stylesheet and append the root box to `document`.
    pub fn build(&self, document: &mut Document) -> Result<NodeId> {
        if let Some(css) = &self.stylesheet {
            document.merge_stylesheet(css);
        }
        add_box(document, NodeId::ROOT, &self.root)
    }
}

fn add_box(document: &mut Document, parent: NodeId, description: &BoxDescription) -> Result<NodeId> {
    let element = description
        .attrs
        .iter()
        .fold(ElementData::new(&description.tag), |element, (name, value)| {
            element.with_attr(name, value)
        });
    let node = document
        .add_box(parent, element)
        .with_context(|| format!("adding <{}>", description.tag))?;
    if let Some(style) = description.attrs.get("style") {
        let _ = document.configure(node, [BoxProperty::Style(style.clone())])?;
    }
    add_children(document, node, &description.children)?;
    document.close_box(node)?;
    Ok(node)
}

fn add_children(document: &mut Document, parent: NodeId, children: &[ChildDescription]) -> Result<()> {
    for child in children {
        match child {
            ChildDescription::Box(description) => {
                let _ = add_box(document, parent, description)?;
            }
            ChildDescription::Text(text) => {
                let _ = document.add_text(parent, text)?;
            }
            ChildDescription::Break(kind) => {
                let _ = document.add_break(parent, *kind)?;
            }
            ChildDescription::Replaced { kind, width, height } => {
                let _ = document.add_replaced(parent, kind, (*width).zip(*height))?;
            }
            ChildDescription::List {
                kind,
                style,
                horizontal,
                items,
            } => {
                let style = style.as_deref().and_then(|s| s.parse().ok());
                let push = ListOp::Push {
                    kind: *kind,
                    style,
                    horizontal: *horizontal,
                };
                let _ = document.configure(parent, [BoxProperty::List(push)])?;
                for item in items {
                    let _ = document.add_marker(parent)?;
                    add_children(document, parent, item)?;
                    if !*horizontal {
                        let _ = document.add_break(parent, BreakKind::Line)?;
                    }
                }
                let _ = document.configure(parent, [BoxProperty::List(ListOp::Pop)])?;
            }
            ChildDescription::Link { visited, children } => {
                document.begin_link(*visited);
                add_children(document, parent, children)?;
                document.end_link();
            }
        }
    }
    Ok(())
}
