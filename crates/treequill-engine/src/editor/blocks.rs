//! Block-level transforms: lists, quote levels, and the
//! extract-modify-reinsert machinery they share.

use crate::dom::fix::{create_default_block, fix_container};
use crate::dom::surgery::{merge_containers, split, SplitPoint};
use crate::dom::tree::{DomTree, NodeId};
use crate::dom::walker::{next_block, NodeTest, TreeWalker};
use crate::dom::DomContext;
use crate::range::edit::{extract_contents_of_range, insert_node_in_range};
use crate::range::Range;

use super::{bookmark, Editor, ListKind};

impl Editor {
    /// Call `f` on every block the range (or the selection) touches,
    /// in document order, until it returns true.
    pub fn for_each_block(
        &mut self,
        range: Option<Range>,
        mutates: bool,
        mut f: impl FnMut(&mut DomTree, NodeId) -> bool,
    ) {
        let mut range = range.unwrap_or_else(|| self.selection());
        if mutates {
            self.checkpoint(&mut range);
        }
        let root = self.tree.root();
        let start = range.start_block(&self.tree, root);
        let end = range.end_block(&self.tree, root);
        if let (Some(mut block), Some(end)) = (start, end) {
            loop {
                if f(&mut self.tree, block) || block == end {
                    break;
                }
                match next_block(&self.tree, root, block) {
                    Some(next) => block = next,
                    None => break,
                }
            }
        }
        if mutates {
            self.set_selection(range);
            self.note_change();
        }
    }

    /// Lift the blocks covered by the selection out of the document,
    /// hand them to `modify` as a fragment, and put the result back.
    /// The selection rides along as a bookmark inside the fragment.
    pub(crate) fn modify_blocks(
        &mut self,
        range: Option<Range>,
        modify: impl FnOnce(&mut Self, NodeId) -> NodeId,
    ) {
        let mut range = range.unwrap_or_else(|| self.selection());
        if self.undo.in_undo {
            self.save_range_to_bookmark(&mut range);
        } else {
            self.record_snapshot(&mut range);
        }

        let root = self.tree.root();
        range.expand_to_block_boundaries(&self.tree, root);
        range.move_boundaries_up(&self.tree, Some(root));

        let frag = {
            let ctx = DomContext {
                config: &self.config,
                caps: &self.caps,
            };
            extract_contents_of_range(&mut self.tree, ctx, &mut range, Some(root))
        };
        let frag = modify(self, frag);
        insert_node_in_range(&mut self.tree, &mut range, frag);

        if range.end.offset < self.tree.children(range.end.container).len() {
            if let Some(child) = self.tree.child(range.end.container, range.end.offset) {
                let ctx = DomContext {
                    config: &self.config,
                    caps: &self.caps,
                };
                merge_containers(&mut self.tree, ctx, child);
            }
        }
        if let Some(child) = self.tree.child(range.start.container, range.start.offset) {
            let ctx = DomContext {
                config: &self.config,
                caps: &self.caps,
            };
            merge_containers(&mut self.tree, ctx, child);
        }

        if let Some(r) = self.range_and_remove_bookmark() {
            range = r;
        }
        self.set_selection(range);
        self.note_change();
    }

    fn is_plain_default_block(&self, node: NodeId) -> bool {
        let tag = self.config.block_tag.to_ascii_uppercase();
        self.tree
            .has_tag_attributes(node, &tag, &self.config.block_attributes)
    }

    /// Turn the blocks of `frag` into items of a `kind` list, reusing
    /// and retagging lists that are already there.
    pub(crate) fn make_list(&mut self, kind: ListKind, frag: NodeId) {
        let list_tag = kind.tag();
        let mut walker = TreeWalker::new(frag, NodeTest::Block);
        while let Some(found) = walker.next_node(&self.tree) {
            let mut node = found;
            // A block nested in a list item stands for the item.
            if let Some(parent) = self
                .tree
                .parent(node)
                .filter(|&p| self.tree.has_tag(p, "LI"))
            {
                node = parent;
                if let Some(last) = self.tree.last_child(node) {
                    walker.current = last;
                }
            }

            if !self.tree.has_tag(node, "LI") {
                let new_li = self.tree.create_element("LI");
                let prev = self
                    .tree
                    .previous_sibling(node)
                    .filter(|&p| self.tree.has_tag(p, list_tag));
                if let Some(prev) = prev {
                    self.tree.append(prev, new_li);
                    self.tree.detach(node);
                } else {
                    let list = self.tree.create_element(list_tag);
                    self.tree.replace_with(node, list);
                    self.tree.append(list, new_li);
                }
                // An unadorned default block dissolves into the item;
                // anything else (a heading, say) is kept whole.
                if self.is_plain_default_block(node) {
                    let contents = self.tree.empty(node);
                    self.tree.append(new_li, contents);
                } else {
                    self.tree.append(new_li, node);
                }
                walker.current = new_li;
            } else if let Some(list) = self.tree.parent(node) {
                let tag = self.tree.tag(list).unwrap_or_default().to_string();
                if tag != list_tag && (tag == "OL" || tag == "UL") {
                    let new_list = self.tree.create_element(list_tag);
                    let contents = self.tree.empty(list);
                    self.tree.append(new_list, contents);
                    self.tree.replace_with(list, new_list);
                }
            }
        }
    }

    fn remove_list_items(&mut self, frag: NodeId) {
        let mut lists = self.tree.elements_by_tag(frag, "UL");
        lists.extend(self.tree.elements_by_tag(frag, "OL"));
        let items = self.tree.elements_by_tag(frag, "LI");

        for list in lists {
            let ctx = DomContext {
                config: &self.config,
                caps: &self.caps,
            };
            let contents = self.tree.empty(list);
            fix_container(&mut self.tree, ctx, contents);
            self.tree.replace_with(list, contents);
        }
        for item in items {
            let ctx = DomContext {
                config: &self.config,
                caps: &self.caps,
            };
            if self.tree.is_block(item) {
                let contents = self.tree.empty(item);
                let block = create_default_block(&mut self.tree, ctx, vec![contents]);
                self.tree.replace_with(item, block);
            } else {
                fix_container(&mut self.tree, ctx, item);
                let contents = self.tree.empty(item);
                self.tree.replace_with(item, contents);
            }
        }
    }

    fn increase_list_items(&mut self, frag: NodeId) {
        let items = self.tree.elements_by_tag(frag, "LI");
        for item in items {
            if self
                .tree
                .first_child(item)
                .is_some_and(|f| self.tree.is_container(f))
            {
                continue;
            }
            let Some(list) = self.tree.parent(item) else {
                continue;
            };
            let list_tag = self.tree.tag(list).unwrap_or("UL").to_string();
            let nested = self
                .tree
                .previous_sibling(item)
                .and_then(|prev| self.tree.last_child(prev))
                .filter(|&last| self.tree.has_tag(last, &list_tag));
            let new_parent = match nested {
                Some(p) => p,
                None => {
                    let wrapper = self.tree.create_element("LI");
                    let new_list = self.tree.create_element(&list_tag);
                    self.tree.append(wrapper, new_list);
                    self.tree.replace_with(item, wrapper);
                    new_list
                }
            };
            if self.tree.is_attached(item) {
                self.tree.detach(item);
            }
            self.tree.append(new_parent, item);
        }
    }

    pub(crate) fn decrease_list_items(&mut self, frag: NodeId) {
        let items: Vec<NodeId> = self
            .tree
            .elements_by_tag(frag, "LI")
            .into_iter()
            .filter(|&item| {
                !self
                    .tree
                    .first_child(item)
                    .is_some_and(|f| self.tree.is_container(f))
            })
            .collect();

        for mut item in items {
            let Some(mut list) = self.tree.parent(item) else {
                continue;
            };
            let Some(new_parent) = self.tree.parent(list) else {
                continue;
            };
            let first = self.tree.first_child(item);

            if self.tree.previous_sibling(item).is_some() {
                let ctx = DomContext {
                    config: &self.config,
                    caps: &self.caps,
                };
                if let Some(second) =
                    split(&mut self.tree, ctx, list, SplitPoint::Node(item), new_parent)
                {
                    list = second;
                }
            }

            // Move the item's own line out in front of its old list;
            // nested lists inside the item stay behind with it.
            let mut node = first;
            while let Some(n) = node {
                if self.tree.is_container(n) {
                    break;
                }
                let next = self.tree.next_sibling(n);
                self.tree.detach(n);
                self.tree.insert_before(new_parent, n, Some(list));
                node = next;
            }

            if self.tree.has_tag(new_parent, "LI") {
                if let Some(first) = first.filter(|&f| self.tree.previous_sibling(f).is_some()) {
                    if let Some(grand) = self.tree.parent(new_parent) {
                        let ctx = DomContext {
                            config: &self.config,
                            caps: &self.caps,
                        };
                        split(
                            &mut self.tree,
                            ctx,
                            new_parent,
                            SplitPoint::Node(first),
                            grand,
                        );
                    }
                }
            }

            // Prune the now empty item and any list shells above it.
            while item != frag && self.tree.first_child(item).is_none() {
                let Some(parent) = self.tree.parent(item) else {
                    break;
                };
                self.tree.detach(item);
                item = parent;
            }
        }

        let ctx = DomContext {
            config: &self.config,
            caps: &self.caps,
        };
        fix_container(&mut self.tree, ctx, frag);
    }

    pub fn make_unordered_list(&mut self) {
        self.modify_blocks(None, |ed, frag| {
            ed.make_list(ListKind::Unordered, frag);
            frag
        });
        self.focus();
    }

    pub fn make_ordered_list(&mut self) {
        self.modify_blocks(None, |ed, frag| {
            ed.make_list(ListKind::Ordered, frag);
            frag
        });
        self.focus();
    }

    pub fn remove_list(&mut self) {
        self.modify_blocks(None, |ed, frag| {
            ed.remove_list_items(frag);
            frag
        });
        self.focus();
    }

    /// Nest the selected item one level deeper. Outside a list, or on
    /// the first item of its list (nothing above to nest under), the
    /// document and the undo history are left untouched.
    pub fn increase_list_level(&mut self) {
        let range = self.selection();
        let root = self.tree.root();
        let Some(mut node) = range.start_block(&self.tree, root) else {
            return;
        };
        loop {
            let Some(parent) = self.tree.parent(node) else {
                return;
            };
            if self.tree.has_tag(parent, "UL") || self.tree.has_tag(parent, "OL") {
                if self.tree.previous_sibling(node).is_none() {
                    return;
                }
                break;
            }
            node = parent;
        }
        self.modify_blocks(Some(range), |ed, frag| {
            ed.increase_list_items(frag);
            frag
        });
        self.focus();
    }

    /// Lift the selected item one level out of its list. A no-op when
    /// the selection is not in a list.
    pub fn decrease_list_level(&mut self) {
        let range = self.selection();
        let root = self.tree.root();
        let in_list = range.start_block(&self.tree, root).is_some_and(|block| {
            self.tree.get_nearest(block, "UL", &[]).is_some()
                || self.tree.get_nearest(block, "OL", &[]).is_some()
        });
        if !in_list {
            return;
        }
        self.modify_blocks(Some(range), |ed, frag| {
            ed.decrease_list_items(frag);
            frag
        });
        self.focus();
    }

    pub fn increase_quote_level(&mut self) {
        self.modify_blocks(None, |ed, frag| {
            let quote = ed.tree.create_element("BLOCKQUOTE");
            ed.tree.append(quote, frag);
            quote
        });
        self.focus();
    }

    /// Unwrap the outermost quotes in `frag`; nested quotes drop one
    /// level with them.
    pub(crate) fn unwrap_top_level_quotes(&mut self, frag: NodeId) {
        let quotes: Vec<NodeId> = self
            .tree
            .elements_by_tag(frag, "BLOCKQUOTE")
            .into_iter()
            .filter(|&q| {
                self.tree
                    .parent(q)
                    .map_or(true, |p| self.tree.get_nearest(p, "BLOCKQUOTE", &[]).is_none())
            })
            .collect();
        for quote in quotes {
            let contents = self.tree.empty(quote);
            self.tree.replace_with(quote, contents);
        }
    }

    pub fn decrease_quote_level(&mut self) {
        self.modify_blocks(None, |ed, frag| {
            ed.unwrap_top_level_quotes(frag);
            frag
        });
        self.focus();
    }

    /// Replacement fragment used when breaking out of a quote: a fresh
    /// default block carrying the selection bookmark.
    pub(crate) fn remove_block_quote(&mut self, _frag: NodeId) -> NodeId {
        let start = self.tree.create_element_with_attrs(
            "INPUT",
            &[("id", bookmark::START_SELECTION_ID), ("type", "hidden")],
        );
        let end = self.tree.create_element_with_attrs(
            "INPUT",
            &[("id", bookmark::END_SELECTION_ID), ("type", "hidden")],
        );
        let ctx = DomContext {
            config: &self.config,
            caps: &self.caps,
        };
        create_default_block(&mut self.tree, ctx, vec![start, end])
    }

    /// The document always ends with an empty default block so there
    /// is somewhere to put the caret after a list or table.
    pub(crate) fn ensure_bottom_line(&mut self) {
        let root = self.tree.root();
        let tag = self.config.block_tag.to_ascii_uppercase();
        let needs = match self.tree.last_element_child(root) {
            Some(last) => !self.tree.has_tag(last, &tag) || !self.tree.is_block(last),
            None => true,
        };
        if needs {
            let ctx = DomContext {
                config: &self.config,
                caps: &self.caps,
            };
            let block = create_default_block(&mut self.tree, ctx, Vec::new());
            self.tree.append(root, block);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Capabilities, EditorConfig};
    use crate::range::Boundary;
    use pretty_assertions::assert_eq;

    fn editor_with(html: &str) -> Editor {
        let mut ed = Editor::new(EditorConfig::default(), Capabilities::default());
        ed.set_html(html);
        ed
    }

    fn caret_in_first_text(ed: &mut Editor) {
        let root = ed.tree.root();
        let mut node = root;
        while let Some(child) = ed.tree.first_child(node) {
            node = child;
        }
        ed.set_selection(Range::caret(node, 0));
    }

    #[test]
    fn a_block_becomes_a_single_item_list() {
        let mut ed = editor_with("<div>one</div><div>two</div>");
        caret_in_first_text(&mut ed);
        ed.make_unordered_list();
        assert_eq!(ed.get_html(), "<ul><li>one</li></ul><div>two</div>");
    }

    #[test]
    fn adjacent_blocks_join_the_same_list() {
        let mut ed = editor_with("<div>one</div><div>two</div>");
        let root = ed.tree.root();
        let b1 = ed.tree.first_child(root).unwrap();
        let b2 = ed.tree.last_child(root).unwrap();
        let t1 = ed.tree.first_child(b1).unwrap();
        let t2 = ed.tree.first_child(b2).unwrap();
        ed.set_selection(Range::new(Boundary::new(t1, 0), Boundary::new(t2, 3)));

        ed.make_ordered_list();
        // Taking every block into the list leaves a fresh blank line
        // at the bottom of the document.
        assert_eq!(
            ed.get_html(),
            "<ol><li>one</li><li>two</li></ol><div><br></div>"
        );
    }

    #[test]
    fn an_existing_list_is_retagged_not_nested() {
        let mut ed = editor_with("<ul><li>one</li></ul><div>x</div>");
        caret_in_first_text(&mut ed);
        ed.make_ordered_list();
        assert_eq!(ed.get_html(), "<ol><li>one</li></ol><div>x</div>");
    }

    #[test]
    fn remove_list_restores_default_blocks() {
        let mut ed = editor_with("<ul><li>one</li></ul><div>x</div>");
        caret_in_first_text(&mut ed);
        ed.remove_list();
        assert_eq!(ed.get_html(), "<div>one</div><div>x</div>");
    }

    #[test]
    fn increase_list_level_nests_the_item() {
        let mut ed = editor_with("<ul><li>one</li><li>two</li></ul><div>x</div>");
        let root = ed.tree.root();
        let ul = ed.tree.first_child(root).unwrap();
        let li2 = ed.tree.last_child(ul).unwrap();
        let t2 = ed.tree.first_child(li2).unwrap();
        ed.set_selection(Range::caret(t2, 0));

        ed.increase_list_level();
        assert_eq!(
            ed.get_html(),
            "<ul><li>one</li><li><ul><li>two</li></ul></li></ul><div>x</div>"
        );
    }

    #[test]
    fn indent_outside_a_list_changes_nothing() {
        let mut ed = editor_with("<div>Hello <b>World</b></div>");
        let root = ed.tree.root();
        let block = ed.tree.first_child(root).unwrap();
        let b = ed.tree.last_child(block).unwrap();
        let text = ed.tree.first_child(b).unwrap();
        ed.set_selection(Range::caret(text, 5));

        ed.increase_list_level();
        assert_eq!(ed.get_html(), "<div>Hello <b>World</b></div>");
        assert!(!ed.can_undo());
    }

    #[test]
    fn the_first_list_item_stays_at_its_level() {
        let mut ed = editor_with("<ul><li>one</li><li>two</li></ul><div>x</div>");
        caret_in_first_text(&mut ed);
        ed.increase_list_level();
        assert_eq!(
            ed.get_html(),
            "<ul><li>one</li><li>two</li></ul><div>x</div>"
        );
    }

    #[test]
    fn outdent_outside_a_list_changes_nothing() {
        let mut ed = editor_with("<div>one</div><div>x</div>");
        caret_in_first_text(&mut ed);
        ed.decrease_list_level();
        assert_eq!(ed.get_html(), "<div>one</div><div>x</div>");
        assert!(!ed.can_undo());
    }

    #[test]
    fn decrease_list_level_unwraps_the_item() {
        let mut ed = editor_with("<ul><li>one</li></ul><div>x</div>");
        caret_in_first_text(&mut ed);
        ed.decrease_list_level();
        assert_eq!(ed.get_html(), "<div>one</div><div>x</div>");
    }

    #[test]
    fn quote_level_round_trips() {
        let mut ed = editor_with("<div>one</div><div>x</div>");
        caret_in_first_text(&mut ed);
        ed.increase_quote_level();
        assert_eq!(
            ed.get_html(),
            "<blockquote><div>one</div></blockquote><div>x</div>"
        );
        ed.decrease_quote_level();
        assert_eq!(ed.get_html(), "<div>one</div><div>x</div>");
    }

    #[test]
    fn block_transforms_are_undoable() {
        let mut ed = editor_with("<div>one</div><div>x</div>");
        caret_in_first_text(&mut ed);
        ed.make_unordered_list();
        assert_eq!(ed.get_html(), "<ul><li>one</li></ul><div>x</div>");
        ed.undo();
        assert_eq!(ed.get_html(), "<div>one</div><div>x</div>");
    }

    #[test]
    fn for_each_block_visits_blocks_in_order() {
        let mut ed = editor_with("<div>one</div><div>two</div>");
        let root = ed.tree.root();
        let b1 = ed.tree.first_child(root).unwrap();
        let b2 = ed.tree.last_child(root).unwrap();
        let t1 = ed.tree.first_child(b1).unwrap();
        let t2 = ed.tree.first_child(b2).unwrap();
        ed.set_selection(Range::new(Boundary::new(t1, 1), Boundary::new(t2, 1)));

        let mut seen = Vec::new();
        ed.for_each_block(None, false, |tree, block| {
            seen.push(tree.text_content(block));
            false
        });
        assert_eq!(seen, vec!["one".to_string(), "two".to_string()]);
    }
}
