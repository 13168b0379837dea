//! Filtered document-order traversal.
//!
//! Equivalent to a DOM tree walker restricted to a root subtree: the
//! walker holds a current position and steps to the next or previous
//! node (in pre-order) accepted by its test. The current node itself
//! is never re-tested, so callers can seed `current` with a boundary
//! node and ask "what is the next interesting thing after here".

use crate::dom::node::not_ws;
use crate::dom::tree::{DomTree, NodeId};
use crate::range::Range;

/// Node acceptance tests used by the editing operations.
#[derive(Debug, Clone, Copy)]
pub enum NodeTest {
    /// Block-level nodes (paragraph units).
    Block,
    /// Renderable content: non-whitespace text or an image.
    Content,
    /// Any text node.
    AnyText,
    /// Text nodes not already inside an anchor (link detection).
    TextOutsideAnchor,
    /// Any node at least partially inside the range.
    InRange(Range),
    /// Inline nodes at least partially inside the range.
    InlineInRange(Range),
    /// Block nodes partially (not fully) contained in the range.
    PartiallyContained(Range),
    /// Non-whitespace text or a BR (line-break scanning).
    NotWsTextOrBreak,
}

pub struct TreeWalker {
    pub root: NodeId,
    pub current: NodeId,
    test: NodeTest,
}

impl TreeWalker {
    pub fn new(root: NodeId, test: NodeTest) -> Self {
        Self {
            root,
            current: root,
            test,
        }
    }

    pub fn accepts(&self, tree: &DomTree, node: NodeId) -> bool {
        match &self.test {
            NodeTest::Block => tree.is_block(node),
            NodeTest::Content => {
                if let Some(text) = tree.text(node) {
                    not_ws(text)
                } else {
                    tree.has_tag(node, "IMG")
                }
            }
            NodeTest::AnyText => tree.is_text(node),
            NodeTest::TextOutsideAnchor => {
                tree.is_text(node) && tree.get_nearest(node, "A", &[]).is_none()
            }
            NodeTest::InRange(range) => range.contains_node(tree, node, true),
            NodeTest::InlineInRange(range) => {
                tree.is_inline(node) && range.contains_node(tree, node, true)
            }
            NodeTest::PartiallyContained(range) => {
                tree.is_block(node)
                    && range.contains_node(tree, node, true)
                    && !range.contains_node(tree, node, false)
            }
            NodeTest::NotWsTextOrBreak => {
                if let Some(text) = tree.text(node) {
                    not_ws(text)
                } else {
                    tree.has_tag(node, "BR")
                }
            }
        }
    }

    /// Step to the next accepted node in pre-order, or `None` when the
    /// subtree is exhausted.
    pub fn next_node(&mut self, tree: &DomTree) -> Option<NodeId> {
        let mut current = self.current;
        loop {
            let mut node = tree.first_child(current);
            while node.is_none() {
                if current == self.root {
                    return None;
                }
                node = tree.next_sibling(current);
                if node.is_none() {
                    current = tree.parent(current)?;
                }
            }
            let node = node?;
            if self.accepts(tree, node) {
                self.current = node;
                return Some(node);
            }
            current = node;
        }
    }

    /// Step to the previous accepted node in pre-order.
    pub fn previous_node(&mut self, tree: &DomTree) -> Option<NodeId> {
        let mut current = self.current;
        loop {
            if current == self.root {
                return None;
            }
            let node = match tree.previous_sibling(current) {
                Some(mut prev) => {
                    // Deepest last descendant of the previous sibling.
                    while let Some(last) = tree.last_child(prev) {
                        prev = last;
                    }
                    prev
                }
                None => tree.parent(current)?,
            };
            if self.accepts(tree, node) {
                self.current = node;
                return Some(node);
            }
            current = node;
        }
    }
}

/// Next block after `node` in document order, within `root`.
pub fn next_block(tree: &DomTree, root: NodeId, node: NodeId) -> Option<NodeId> {
    let mut walker = TreeWalker::new(root, NodeTest::Block);
    walker.current = node;
    walker.next_node(tree)
}

/// Previous block before `node` in document order. For a node inside
/// a block this is its containing block, since blocks precede their
/// content.
pub fn previous_block(tree: &DomTree, root: NodeId, node: NodeId) -> Option<NodeId> {
    let mut walker = TreeWalker::new(root, NodeTest::Block);
    walker.current = node;
    walker.previous_node(tree)
}
