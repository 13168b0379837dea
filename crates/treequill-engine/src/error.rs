use crate::dom::NodeId;
use thiserror::Error;

/// Failures the engine can report to a caller.
///
/// Structural precondition violations (operating on a detached node,
/// nonsense offsets) are programmer errors: they trip debug
/// assertions in development builds, and in release builds the
/// offending operation logs one of these and aborts without touching
/// the tree. No-op conditions (no resolvable selection, an empty
/// transform result) are not errors and return silently.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("node {0:?} is not attached to the document")]
    DetachedNode(NodeId),

    #[error("offset {offset} is out of range for node {node:?} (length {len})")]
    InvalidBoundary {
        node: NodeId,
        offset: usize,
        len: usize,
    },

    #[error("selection bookmark is incomplete (found one sentinel of a pair)")]
    LoneBookmark,
}
