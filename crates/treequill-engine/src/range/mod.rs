/*!
 * Selection model.
 *
 * A [`Range`] is a pair of boundaries, each a `(container, offset)`
 * pair: in an element the offset counts children, in a text node it
 * counts characters. Boundaries order by document position, with a
 * boundary "on" a node sorting just before any boundary inside it.
 *
 * Ranges hold plain node ids and survive tree mutation only as well
 * as their containers do; the mutation operations remap boundaries
 * themselves (see `dom::surgery`), and everything else re-derives
 * what it needs from the live tree.
 */

pub mod edit;

use std::cmp::Ordering;

use crate::dom::tree::{DomTree, NodeId};
use crate::dom::walker::{next_block, previous_block, NodeTest, TreeWalker};

/// One end of a range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Boundary {
    pub container: NodeId,
    pub offset: usize,
}

impl Boundary {
    pub fn new(container: NodeId, offset: usize) -> Self {
        Self { container, offset }
    }
}

/// A contiguous region of the document between two boundaries.
/// `start` must not come after `end`; the editing operations keep
/// this invariant themselves when they move boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    pub start: Boundary,
    pub end: Boundary,
}

/// Total order on boundaries by document position. A boundary at
/// `(parent, i)` sorts before every boundary inside child `i`.
pub fn compare_boundaries(tree: &DomTree, a: Boundary, b: Boundary) -> Ordering {
    position(tree, a).cmp(&position(tree, b))
}

fn position(tree: &DomTree, b: Boundary) -> Vec<usize> {
    let mut path = tree.path_from_root(b.container);
    path.push(b.offset);
    path
}

/// The node ending at a boundary: descend from the boundary into the
/// deepest last node before it. Returns the container itself when the
/// boundary sits at its very start.
pub fn get_node_before(tree: &DomTree, b: Boundary) -> NodeId {
    let mut node = b.container;
    let mut offset = b.offset;
    while offset > 0 && tree.is_element(node) {
        match tree.child(node, offset - 1) {
            Some(child) => {
                node = child;
                offset = tree.children(node).len();
            }
            None => break,
        }
    }
    node
}

/// The node starting at a boundary, climbing out of exhausted parents.
/// `None` when the boundary is at the very end of the document.
pub fn get_node_after(tree: &DomTree, b: Boundary) -> Option<NodeId> {
    let mut node = b.container;
    if tree.is_element(node) {
        if let Some(child) = tree.child(node, b.offset) {
            return Some(child);
        }
        loop {
            if let Some(next) = tree.next_sibling(node) {
                return Some(next);
            }
            node = tree.parent(node)?;
        }
    }
    Some(node)
}

impl Range {
    pub fn new(start: Boundary, end: Boundary) -> Self {
        Self { start, end }
    }

    /// A collapsed range (a caret).
    pub fn caret(container: NodeId, offset: usize) -> Self {
        let b = Boundary::new(container, offset);
        Self { start: b, end: b }
    }

    pub fn collapsed(&self) -> bool {
        self.start == self.end
    }

    pub fn set_start(&mut self, container: NodeId, offset: usize) {
        self.start = Boundary::new(container, offset);
    }

    pub fn set_end(&mut self, container: NodeId, offset: usize) {
        self.end = Boundary::new(container, offset);
    }

    pub fn collapse(&mut self, to_start: bool) {
        if to_start {
            self.end = self.start;
        } else {
            self.start = self.end;
        }
    }

    pub fn set_start_before(&mut self, tree: &DomTree, node: NodeId) {
        if let (Some(parent), Some(i)) = (tree.parent(node), tree.index_in_parent(node)) {
            self.start = Boundary::new(parent, i);
        }
    }

    pub fn set_start_after(&mut self, tree: &DomTree, node: NodeId) {
        if let (Some(parent), Some(i)) = (tree.parent(node), tree.index_in_parent(node)) {
            self.start = Boundary::new(parent, i + 1);
        }
    }

    pub fn set_end_before(&mut self, tree: &DomTree, node: NodeId) {
        if let (Some(parent), Some(i)) = (tree.parent(node), tree.index_in_parent(node)) {
            self.end = Boundary::new(parent, i);
        }
    }

    pub fn set_end_after(&mut self, tree: &DomTree, node: NodeId) {
        if let (Some(parent), Some(i)) = (tree.parent(node), tree.index_in_parent(node)) {
            self.end = Boundary::new(parent, i + 1);
        }
    }

    /// Select the node itself (boundaries in its parent).
    pub fn select_node(&mut self, tree: &DomTree, node: NodeId) {
        self.set_start_before(tree, node);
        self.set_end_after(tree, node);
    }

    /// Select everything inside the node.
    pub fn select_node_contents(&mut self, tree: &DomTree, node: NodeId) {
        self.start = Boundary::new(node, 0);
        self.end = Boundary::new(node, tree.len_of(node));
    }

    /// Deepest node containing both boundaries.
    pub fn common_ancestor(&self, tree: &DomTree) -> NodeId {
        let a = tree.path_from_root(self.start.container);
        let b = tree.path_from_root(self.end.container);
        let shared = a.iter().zip(&b).take_while(|(x, y)| x == y).count();
        let mut node = self.start.container;
        for _ in shared..a.len() {
            match tree.parent(node) {
                Some(p) => node = p,
                None => break,
            }
        }
        node
    }

    /// Whether `node` lies inside the range: fully, or (with
    /// `partial`) overlapping it at all. Touching without overlap
    /// does not count as partial containment.
    pub fn contains_node(&self, tree: &DomTree, node: NodeId, partial: bool) -> bool {
        let Some(parent) = tree.parent(node) else {
            return false;
        };
        let Some(index) = tree.index_in_parent(node) else {
            return false;
        };
        let node_start = Boundary::new(parent, index);
        let node_end = Boundary::new(parent, index + 1);
        if partial {
            compare_boundaries(tree, node_end, self.start) == Ordering::Greater
                && compare_boundaries(tree, self.end, node_start) == Ordering::Greater
        } else {
            compare_boundaries(tree, self.start, node_start) != Ordering::Greater
                && compare_boundaries(tree, node_end, self.end) != Ordering::Greater
        }
    }

    /// Push both boundaries as deep as possible, into text nodes where
    /// they exist, stopping above leaves.
    ///
    /// When the range is collapsed the descent finds the nearest text
    /// positions just outside the caret on either side, and the two
    /// results land swapped; the swap below restores a well-formed
    /// caret between them. Downstream code relies on the exact
    /// positions this produces, so the quirk is load-bearing.
    pub fn move_boundaries_down(&mut self, tree: &DomTree) {
        let was_collapsed = self.collapsed();
        let mut sc = self.start.container;
        let mut so = self.start.offset;
        let mut ec = self.end.container;
        let mut eo = self.end.offset;

        while !tree.is_text(sc) {
            let Some(child) = tree.child(sc, so) else {
                break;
            };
            if tree.is_leaf(child) {
                break;
            }
            sc = child;
            so = 0;
        }
        if eo > 0 {
            while !tree.is_text(ec) {
                let Some(child) = tree.child(ec, eo - 1) else {
                    break;
                };
                if tree.is_leaf(child) {
                    break;
                }
                ec = child;
                eo = tree.len_of(ec);
            }
        } else {
            while !tree.is_text(ec) {
                let Some(child) = tree.first_child(ec) else {
                    break;
                };
                if tree.is_leaf(child) {
                    break;
                }
                ec = child;
            }
        }

        if was_collapsed {
            self.start = Boundary::new(ec, eo);
            self.end = Boundary::new(sc, so);
        } else {
            self.start = Boundary::new(sc, so);
            self.end = Boundary::new(ec, eo);
        }
    }

    /// Pull boundaries up while they sit at the edge of their
    /// container, stopping at `common` (default: the common ancestor).
    pub fn move_boundaries_up(&mut self, tree: &DomTree, common: Option<NodeId>) {
        let common = common.unwrap_or_else(|| self.common_ancestor(tree));
        let mut sc = self.start.container;
        let mut so = self.start.offset;
        let mut ec = self.end.container;
        let mut eo = self.end.offset;

        while sc != common && so == 0 {
            let Some(parent) = tree.parent(sc) else {
                break;
            };
            so = tree.index_in_parent(sc).unwrap_or(0);
            sc = parent;
        }
        while ec != common && eo == tree.len_of(ec) {
            let Some(parent) = tree.parent(ec) else {
                break;
            };
            eo = tree.index_in_parent(ec).unwrap_or(0) + 1;
            ec = parent;
        }

        self.start = Boundary::new(sc, so);
        self.end = Boundary::new(ec, eo);
    }

    /// First block at least partially covered by the range, if any.
    pub fn start_block(&self, tree: &DomTree, root: NodeId) -> Option<NodeId> {
        let container = self.start.container;
        let block = if tree.is_inline(container) {
            previous_block(tree, root, container)
        } else if tree.is_block(container) {
            Some(container)
        } else {
            let before = get_node_before(tree, self.start);
            next_block(tree, root, before)
        };
        block.filter(|&b| self.contains_node(tree, b, true))
    }

    /// Last block at least partially covered by the range, if any.
    pub fn end_block(&self, tree: &DomTree, root: NodeId) -> Option<NodeId> {
        let container = self.end.container;
        let block = if tree.is_inline(container) {
            previous_block(tree, root, container)
        } else if tree.is_block(container) {
            Some(container)
        } else {
            let node = match get_node_after(tree, self.end) {
                Some(n) => n,
                None => {
                    let mut n = root;
                    while let Some(child) = tree.last_child(n) {
                        n = child;
                    }
                    n
                }
            };
            previous_block(tree, root, node)
        };
        block.filter(|&b| self.contains_node(tree, b, true))
    }

    /// True when no rendered content sits between the start of the
    /// containing block and the range start.
    pub fn starts_at_block_boundary(&self, tree: &DomTree, root: NodeId) -> bool {
        let Some(block) = self.start_block(tree, root) else {
            return false;
        };
        let mut walker = TreeWalker::new(block, NodeTest::Content);
        if tree.is_text(self.start.container) {
            if self.start.offset > 0 {
                return false;
            }
            walker.current = self.start.container;
        } else {
            walker.current = get_node_after(tree, self.start).unwrap_or(block);
        }
        walker.previous_node(tree).is_none()
    }

    /// True when no rendered content sits between the range end and
    /// the end of the containing block.
    pub fn ends_at_block_boundary(&self, tree: &DomTree, root: NodeId) -> bool {
        let Some(block) = self.end_block(tree, root) else {
            return false;
        };
        let mut walker = TreeWalker::new(block, NodeTest::Content);
        if let Some(text) = tree.text(self.end.container) {
            let len = text.chars().count();
            if len > 0 && self.end.offset < len {
                return false;
            }
            walker.current = self.end.container;
        } else {
            walker.current = get_node_before(tree, self.end);
        }
        walker.next_node(tree).is_none()
    }

    /// Widen the range to whole blocks (boundaries in the blocks'
    /// parents).
    pub fn expand_to_block_boundaries(&mut self, tree: &DomTree, root: NodeId) {
        let Some(start) = self.start_block(tree, root) else {
            return;
        };
        let Some(end) = self.end_block(tree, root) else {
            return;
        };
        if let (Some(parent), Some(i)) = (tree.parent(start), tree.index_in_parent(start)) {
            self.start = Boundary::new(parent, i);
        }
        if let (Some(parent), Some(i)) = (tree.parent(end), tree.index_in_parent(end)) {
            self.end = Boundary::new(parent, i + 1);
        }
    }
}
