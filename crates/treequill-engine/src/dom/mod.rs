/*!
 * Tree utility layer.
 *
 * The document is a mutable ordered tree stored in an arena
 * ([`DomTree`]); nodes are addressed by [`NodeId`] handles and owned
 * by their parent's child list. Splits and merges are explicit
 * ownership transfers through the arena, never pointer rewiring
 * shared between two trees.
 *
 * - `node`: node payloads, tag tables, classification predicates.
 * - `tree`: the arena itself and structural primitives.
 * - `walker`: filtered document-order traversal.
 * - `fix`: cursor/container repair so every node stays focusable.
 * - `surgery`: split/merge operations that keep ranges valid.
 */

pub mod fix;
pub mod node;
pub mod surgery;
pub mod tree;
pub mod walker;

pub use node::{Attr, Category, ElementData, NodeData, ZWS};
pub use tree::{DomTree, NodeId};
pub use walker::{NodeTest, TreeWalker};

use crate::config::{Capabilities, EditorConfig};

/// Shared read-only context threaded through tree repair operations.
#[derive(Clone, Copy)]
pub struct DomContext<'a> {
    pub config: &'a EditorConfig,
    pub caps: &'a Capabilities,
}
