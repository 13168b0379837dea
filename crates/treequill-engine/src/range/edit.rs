//! Structural edits driven by a range: insert, extract, delete, and
//! paste-style fragment insertion. All of them leave the range at a
//! well-defined position describing where the caret should go.

use crate::dom::fix::fix_cursor;
use crate::dom::surgery::{merge_containers, merge_with_block, split, SplitPoint};
use crate::dom::tree::{DomTree, NodeId};
use crate::dom::walker::{NodeTest, TreeWalker};
use crate::dom::DomContext;
use crate::range::Range;

/// Insert `node` at the start of the range, splitting a text
/// container if the boundary falls inside one. Boundaries are updated
/// to keep covering the same content.
pub fn insert_node_in_range(tree: &mut DomTree, range: &mut Range, node: NodeId) {
    let mut sc = range.start.container;
    let mut so = range.start.offset;
    let mut ec = range.end.container;
    let mut eo = range.end.offset;

    if tree.is_text(sc) {
        let Some(parent) = tree.parent(sc) else {
            return;
        };
        if so == tree.len_of(sc) {
            so = tree.index_in_parent(sc).unwrap_or(0) + 1;
            if range.collapsed() {
                ec = parent;
                eo = so;
            }
        } else {
            if so > 0 {
                let after_split = tree.split_text(sc, so);
                if ec == sc {
                    eo -= so;
                    ec = after_split;
                } else if ec == parent {
                    eo += 1;
                }
                sc = after_split;
            }
            so = tree.index_in_parent(sc).unwrap_or(0);
        }
        sc = parent;
    }

    let child_count = tree.children(sc).len();
    if so == child_count {
        tree.append(sc, node);
    } else {
        let reference = tree.child(sc, so);
        tree.insert_before(sc, node, reference);
    }
    if sc == ec {
        eo += tree.children(sc).len() - child_count;
    }

    range.set_start(sc, so);
    range.set_end(ec, eo);
}

/// Cut the range's content out of the tree and return it as a
/// fragment. The range collapses to the seam, with adjacent text
/// nodes at the seam merged so a caret can sit between them.
pub fn extract_contents_of_range(
    tree: &mut DomTree,
    ctx: DomContext,
    range: &mut Range,
    common: Option<NodeId>,
) -> NodeId {
    let mut common = common.unwrap_or_else(|| range.common_ancestor(tree));
    if tree.is_text(common) {
        common = tree.parent(common).unwrap_or(common);
    }

    let end_node = split(
        tree,
        ctx,
        range.end.container,
        SplitPoint::Index(range.end.offset),
        common,
    );
    let start_node = split(
        tree,
        ctx,
        range.start.container,
        SplitPoint::Index(range.start.offset),
        common,
    );

    let frag = tree.create_fragment();
    let mut node = start_node;
    while node != end_node {
        let Some(n) = node else {
            break;
        };
        let next = tree.next_sibling(n);
        tree.append(frag, n);
        node = next;
    }

    let mut sc = common;
    let mut so = end_node
        .and_then(|e| tree.index_in_parent(e))
        .unwrap_or_else(|| tree.children(common).len());

    // Merge text nodes that became adjacent across the cut, so the
    // caret does not land between two text nodes.
    if so > 0 {
        if let (Some(before), Some(after)) = (tree.child(common, so - 1), tree.child(common, so)) {
            if tree.is_text(before) && tree.is_text(after) {
                sc = before;
                so = tree.len_of(before);
                let data = tree.text(after).unwrap_or_default().to_string();
                tree.append_text_data(before, &data);
                tree.detach(after);
            }
        }
    }

    range.set_start(sc, so);
    range.collapse(true);

    fix_cursor(tree, ctx, common);
    frag
}

/// Delete the range's content, merging the start and end blocks when
/// the range spanned a block boundary. Returns the removed content as
/// a detached fragment.
pub fn delete_contents_of_range(
    tree: &mut DomTree,
    ctx: DomContext,
    range: &mut Range,
    root: NodeId,
) -> NodeId {
    // Move boundaries up as far as possible to reduce splitting.
    range.move_boundaries_up(tree, None);

    let frag = extract_contents_of_range(tree, ctx, range, None);

    // Bring the collapsed range back inside a block, otherwise the
    // start/end block lookups below find nothing.
    range.move_boundaries_down(tree);

    let start_block = range.start_block(tree, root);
    let end_block = range.end_block(tree, root);
    if let (Some(sb), Some(eb)) = (start_block, end_block) {
        if sb != eb {
            merge_with_block(tree, sb, eb, range);
        }
    }
    if let Some(sb) = start_block {
        fix_cursor(tree, ctx, sb);
    }

    // The document must keep at least one block.
    let child = tree.first_child(root);
    if child.is_none() || child.is_some_and(|c| tree.has_tag(c, "BR")) {
        fix_cursor(tree, ctx, root);
        if let Some(first) = tree.first_child(root) {
            range.select_node_contents(tree, first);
        }
    }
    frag
}

/// Insert parsed content at the range. Inline-only fragments slot in
/// at the caret; anything with block content splits the surrounding
/// structure (up to a containing quote, else the root), stitches the
/// fragment's edges into the split halves, and merges containers back
/// together.
pub fn insert_tree_fragment_into_range(
    tree: &mut DomTree,
    ctx: DomContext,
    range: &mut Range,
    frag: NodeId,
    root: NodeId,
) {
    let all_inline = tree.children(frag).iter().all(|&c| tree.is_inline(c));

    if !range.collapsed() {
        delete_contents_of_range(tree, ctx, range, root);
    }
    range.move_boundaries_down(tree);

    if all_inline {
        insert_node_in_range(tree, range, frag);
        range.collapse(false);
        return;
    }

    let split_point = range.start.container;
    let stop = tree
        .parent(split_point)
        .and_then(|p| tree.get_nearest(p, "BLOCKQUOTE", &[]))
        .unwrap_or(root);
    let node_after_split = split(
        tree,
        ctx,
        split_point,
        SplitPoint::Index(range.start.offset),
        stop,
    );
    let Some(node_after_split) = node_after_split else {
        // Cut landed at the very end of the stop node; just append.
        let mut at_end = Range::caret(stop, tree.children(stop).len());
        insert_node_in_range(tree, &mut at_end, frag);
        *range = at_end;
        range.collapse(false);
        range.move_boundaries_down(tree);
        return;
    };
    let Some(node_before_split) = tree.previous_sibling(node_after_split) else {
        return;
    };
    let Some(parent) = tree.parent(node_after_split) else {
        return;
    };

    let mut sc = node_before_split;
    let mut so = tree.children(sc).len();
    let mut ec = node_after_split;
    let mut eo = 0;

    while let Some(child) = tree.last_child(sc) {
        if !tree.is_element(child) || tree.has_tag(child, "BR") {
            break;
        }
        sc = child;
        so = tree.children(sc).len();
    }
    while let Some(child) = tree.first_child(ec) {
        if !tree.is_element(child) || tree.has_tag(child, "BR") {
            break;
        }
        ec = child;
    }

    // Inline runs at the fragment's edges belong to the blocks either
    // side of the split.
    while let Some(child) = tree.first_child(frag) {
        if !tree.is_inline(child) {
            break;
        }
        tree.append(sc, child);
    }
    while let Some(child) = tree.last_child(frag) {
        if !tree.is_inline(child) {
            break;
        }
        tree.insert_at(ec, 0, child);
        eo += 1;
    }

    // Make every block in the fragment focusable before it goes in.
    let mut walker = TreeWalker::new(frag, NodeTest::Block);
    while let Some(block) = walker.next_node(tree) {
        fix_cursor(tree, ctx, block);
    }

    tree.insert_before(parent, frag, Some(node_after_split));

    // Remove empty halves left by the split, and merge inserted
    // containers with the halves that stay.
    let node = tree.previous_sibling(node_after_split);
    if tree.text_content(node_after_split).is_empty() {
        tree.detach(node_after_split);
    } else {
        merge_containers(tree, ctx, node_after_split);
    }
    if tree.parent(node_after_split).is_none() {
        if let Some(node) = node {
            ec = node;
            eo = tree.len_of(node);
        }
    }

    if tree.text_content(node_before_split).is_empty() {
        if let Some(next) = tree.next_sibling(node_before_split) {
            sc = next;
            so = 0;
        }
        tree.detach(node_before_split);
    } else {
        merge_containers(tree, ctx, node_before_split);
    }

    range.set_start(sc, so);
    range.set_end(ec, eo);
    range.move_boundaries_down(tree);
}
