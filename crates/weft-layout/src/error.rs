//! Layout errors.

use thiserror::Error;
use weft_dom::NodeId;

/// Failures surfaced to the host.
///
/// Layout, measure and render never fail on content; only resource
/// exhaustion and host lookups of bad ids produce errors. Each error leaves
/// the document in its last good state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    /// Growing a cache failed; the sub-operation was abandoned.
    #[error("allocation failed while growing {0}")]
    Allocation(&'static str),
    /// The id does not refer to a live node.
    #[error("unknown node {0:?}")]
    UnknownNode(NodeId),
    /// The node exists but is not an element box.
    #[error("node {0:?} is not a box")]
    NotABox(NodeId),
}
