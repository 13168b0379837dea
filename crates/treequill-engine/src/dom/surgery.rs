//! Split and merge operations.
//!
//! These are the structural halves of every editing command: splits
//! carve the tree upwards to a stop node so content can be inserted
//! between the halves, merges knit adjacent alike nodes back together
//! while keeping any live range boundaries pointing at the same
//! logical position.

use crate::dom::fix::{create_wrapper, fix_container, fix_cursor};
use crate::dom::tree::{DomTree, NodeId};
use crate::dom::DomContext;
use crate::range::Range;

/// Where to cut when splitting: a child index (or character offset in
/// a text node), or an already-materialized node that starts the
/// second half.
#[derive(Debug, Clone, Copy)]
pub enum SplitPoint {
    Index(usize),
    Node(NodeId),
}

/// Split `node` at `point` and keep splitting ancestors until `stop`
/// is reached. Returns the first node of the second half (a child of
/// `stop`), or `None` when the cut lands at the very end.
pub fn split(
    tree: &mut DomTree,
    ctx: DomContext,
    node: NodeId,
    point: SplitPoint,
    stop: NodeId,
) -> Option<NodeId> {
    let mut node = node;
    let mut point = point;
    loop {
        if tree.is_text(node) && node != stop {
            let SplitPoint::Index(offset) = point else {
                return None;
            };
            let after = tree.split_text(node, offset);
            point = SplitPoint::Node(after);
            node = tree.parent(node)?;
            continue;
        }
        if !tree.is_element(node) {
            return match point {
                SplitPoint::Node(n) => Some(n),
                SplitPoint::Index(_) => None,
            };
        }

        let child = match point {
            SplitPoint::Index(i) => tree.child(node, i),
            SplitPoint::Node(n) => Some(n),
        };
        if node == stop {
            return child;
        }

        let parent = tree.parent(node)?;
        let clone = tree.clone_shallow(node);

        // Move the cut point and everything after it into the clone.
        let mut next = child;
        while let Some(n) = next {
            let following = tree.next_sibling(n);
            tree.append(clone, n);
            next = following;
        }

        // Keep list numbering continuous when an OL inside a quote is
        // cut in two.
        if tree.has_tag(node, "OL") && tree.get_nearest(node, "BLOCKQUOTE", &[]).is_some() {
            let start = tree
                .attribute(node, "start")
                .and_then(|s| s.parse::<i64>().ok())
                .unwrap_or(1);
            let value = start + tree.children(node).len() as i64 - 1;
            tree.set_attribute(clone, "start", &value.to_string());
        }

        // Do not normalize here, it may undo a cursor fix lower down.
        fix_cursor(tree, ctx, node);
        fix_cursor(tree, ctx, clone);

        let index = tree.index_in_parent(node)? + 1;
        tree.insert_at(parent, index, clone);

        point = SplitPoint::Node(clone);
        node = parent;
    }
}

/// Merge runs of alike inline siblings under `node`, recursively,
/// remapping `range` boundaries that pointed into merged nodes.
pub fn merge_inlines(tree: &mut DomTree, node: NodeId, range: &mut Range) {
    if !tree.is_element(node) && !tree.is_fragment(node) {
        return;
    }
    let mut frags: Vec<NodeId> = Vec::new();
    let mut l = tree.children(node).len();
    while l > 0 {
        l -= 1;
        let child = tree.children(node)[l];
        let prev = if l > 0 {
            Some(tree.children(node)[l - 1])
        } else {
            None
        };
        let mergeable = prev.is_some_and(|p| {
            tree.is_inline(child) && tree.are_alike(child, p) && !tree.is_leaf(child)
        });
        if mergeable {
            let prev = prev.unwrap_or(child);
            if range.start.container == child {
                range.start.container = prev;
                range.start.offset += tree.len_of(prev);
            }
            if range.end.container == child {
                range.end.container = prev;
                range.end.offset += tree.len_of(prev);
            }
            if range.start.container == node {
                if range.start.offset > l {
                    range.start.offset -= 1;
                } else if range.start.offset == l {
                    range.start.container = prev;
                    range.start.offset = tree.len_of(prev);
                }
            }
            if range.end.container == node {
                if range.end.offset > l {
                    range.end.offset -= 1;
                } else if range.end.offset == l {
                    range.end.container = prev;
                    range.end.offset = tree.len_of(prev);
                }
            }
            tree.detach(child);
            if let Some(data) = tree.text(child).map(str::to_string) {
                tree.append_text_data(prev, &data);
            } else {
                frags.push(tree.empty(child));
            }
        } else if tree.is_element(child) {
            while let Some(frag) = frags.pop() {
                tree.append(child, frag);
            }
            merge_inlines(tree, child, range);
        }
    }
}

/// Merge the content of `next` (a following block) into `block`,
/// collapsing `range` to the seam between the two.
pub fn merge_with_block(tree: &mut DomTree, block: NodeId, next: NodeId, range: &mut Range) {
    let mut container = next;
    while let Some(parent) = tree.parent(container) {
        if parent != tree.root() && tree.children(parent).len() == 1 {
            container = parent;
        } else {
            break;
        }
    }
    tree.detach(container);

    let mut offset = tree.children(block).len();
    if let Some(last) = tree.last_child(block) {
        if tree.has_tag(last, "BR") {
            tree.detach(last);
            offset -= 1;
        }
    }

    let mut seam = Range::caret(block, offset);
    let frag = tree.empty(next);
    tree.append(block, frag);
    merge_inlines(tree, block, &mut seam);

    range.set_start(seam.start.container, seam.start.offset);
    range.collapse(true);
}

/// Merge `node` with its previous sibling when the two containers are
/// alike. List items are only merged when they hold nothing but a
/// nested list; a lone list item instead grows a default block so it
/// can hold a caret.
pub fn merge_containers(tree: &mut DomTree, ctx: DomContext, node: NodeId) {
    let prev = tree.previous_sibling(node);
    let first = tree.first_child(node);
    let is_list_item = tree.has_tag(node, "LI");

    if is_list_item
        && !first.is_some_and(|f| tree.has_tag(f, "OL") || tree.has_tag(f, "UL"))
    {
        return;
    }

    if let Some(prev) = prev.filter(|&p| tree.are_alike(p, node)) {
        if !tree.is_container(prev) {
            if !is_list_item {
                return;
            }
            let block = create_wrapper(tree, ctx);
            let contents = tree.empty(prev);
            tree.append(block, contents);
            tree.append(prev, block);
        }
        tree.detach(node);
        let needs_fix = !tree.is_container(node);
        let contents = tree.empty(node);
        tree.append(prev, contents);
        if needs_fix {
            fix_container(tree, ctx, prev);
        }
        if let Some(first) = first {
            merge_containers(tree, ctx, first);
        }
    } else if is_list_item {
        let block = create_wrapper(tree, ctx);
        tree.insert_before(node, block, first);
        fix_cursor(tree, ctx, block);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Capabilities, EditorConfig};
    use crate::range::Boundary;
    use pretty_assertions::assert_eq;

    fn ctx_parts() -> (EditorConfig, Capabilities) {
        (EditorConfig::default(), Capabilities::default())
    }

    #[test]
    fn split_text_up_to_block() {
        let (config, caps) = ctx_parts();
        let ctx = DomContext {
            config: &config,
            caps: &caps,
        };
        // <body><div><em>ab</em>cd</div></body>, cut inside "ab".
        let mut tree = DomTree::new();
        let div = tree.create_element("DIV");
        let em = tree.create_element("EM");
        let ab = tree.create_text("ab");
        tree.append(em, ab);
        let cd = tree.create_text("cd");
        tree.append(div, em);
        tree.append(div, cd);
        let root = tree.root();
        tree.append(root, div);

        let second = split(&mut tree, ctx, ab, SplitPoint::Index(1), div).unwrap();

        // The EM is cloned; "b" lands in the clone, "cd" stays after.
        assert!(tree.has_tag(second, "EM"));
        assert_eq!(tree.text_content(second), "b");
        assert_eq!(tree.text_content(em), "a");
        let kids = tree.children(div).to_vec();
        assert_eq!(kids, vec![em, second, cd]);
    }

    #[test]
    fn split_block_up_to_root() {
        let (config, caps) = ctx_parts();
        let ctx = DomContext {
            config: &config,
            caps: &caps,
        };
        let mut tree = DomTree::new();
        let div = tree.create_element("DIV");
        let text = tree.create_text("hello");
        tree.append(div, text);
        let root = tree.root();
        tree.append(root, div);

        let second = split(&mut tree, ctx, text, SplitPoint::Index(5), root).unwrap();

        assert!(tree.has_tag(second, "DIV"));
        assert_eq!(tree.children(root).len(), 2);
        assert_eq!(tree.text_content(div), "hello");
        // The empty second half is made focusable.
        assert_eq!(tree.text_content(second), "");
        assert!(tree.has_tag(tree.last_child(second).unwrap(), "BR"));
    }

    #[test]
    fn merge_inlines_joins_split_halves_and_remaps_range() {
        let (_config, _caps) = ctx_parts();
        // <div><em>a</em><em>b</em></div> with the caret before "b".
        let mut tree = DomTree::new();
        let div = tree.create_element("DIV");
        let em1 = tree.create_element("EM");
        let a = tree.create_text("a");
        tree.append(em1, a);
        let em2 = tree.create_element("EM");
        let b = tree.create_text("b");
        tree.append(em2, b);
        tree.append(div, em1);
        tree.append(div, em2);
        let root = tree.root();
        tree.append(root, div);

        let mut range = Range::caret(div, 1);
        merge_inlines(&mut tree, div, &mut range);

        assert_eq!(tree.children(div).len(), 1);
        assert_eq!(tree.text_content(em1), "ab");
        // Caret between the halves maps to the seam in the merged
        // text node.
        assert_eq!(range.start, Boundary::new(a, 1));
        assert!(range.collapsed());
        // The text nodes themselves were merged too.
        assert_eq!(tree.children(em1).len(), 1);
        assert_eq!(tree.text(a), Some("ab"));
    }

    #[test]
    fn merge_with_block_collapses_to_seam() {
        // <div>one<br></div><div>two</div>, delete at boundary.
        let mut tree = DomTree::new();
        let b1 = tree.create_element("DIV");
        let one = tree.create_text("one");
        let br = tree.create_element("BR");
        tree.append(b1, one);
        tree.append(b1, br);
        let b2 = tree.create_element("DIV");
        let two = tree.create_text("two");
        tree.append(b2, two);
        let root = tree.root();
        tree.append(root, b1);
        tree.append(root, b2);

        let mut range = Range::caret(b2, 0);
        merge_with_block(&mut tree, b1, b2, &mut range);

        assert_eq!(tree.children(root).to_vec(), vec![b1]);
        assert_eq!(tree.text_content(b1), "onetwo");
        // The BR fixer was dropped and the caret sits at the seam.
        assert_eq!(range.start, Boundary::new(one, 3));
        assert!(range.collapsed());
    }

    #[test]
    fn merge_containers_joins_alike_lists() {
        let (config, caps) = ctx_parts();
        let ctx = DomContext {
            config: &config,
            caps: &caps,
        };
        // <ul><li>a</li></ul><ul><li>b</li></ul>
        let mut tree = DomTree::new();
        let ul1 = tree.create_element("UL");
        let li1 = tree.create_element("LI");
        let a = tree.create_text("a");
        tree.append(li1, a);
        tree.append(ul1, li1);
        let ul2 = tree.create_element("UL");
        let li2 = tree.create_element("LI");
        let b = tree.create_text("b");
        tree.append(li2, b);
        tree.append(ul2, li2);
        let root = tree.root();
        tree.append(root, ul1);
        tree.append(root, ul2);

        merge_containers(&mut tree, ctx, ul2);

        assert_eq!(tree.children(root).to_vec(), vec![ul1]);
        assert_eq!(tree.children(ul1).to_vec(), vec![li1, li2]);
    }

    #[test]
    fn plain_list_items_do_not_merge() {
        let (config, caps) = ctx_parts();
        let ctx = DomContext {
            config: &config,
            caps: &caps,
        };
        let mut tree = DomTree::new();
        let ul = tree.create_element("UL");
        let li1 = tree.create_element("LI");
        let a = tree.create_text("a");
        tree.append(li1, a);
        let li2 = tree.create_element("LI");
        let b = tree.create_text("b");
        tree.append(li2, b);
        tree.append(ul, li1);
        tree.append(ul, li2);
        let root = tree.root();
        tree.append(root, ul);

        merge_containers(&mut tree, ctx, li2);

        assert_eq!(tree.children(ul).to_vec(), vec![li1, li2]);
    }
}
