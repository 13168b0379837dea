//! Key-driven editing commands: Enter, Backspace, Delete, Space and
//! cut. These own the structural consequences of typing so the host
//! only has to forward key events.

use crate::dom::fix::{fix_container, fix_cursor};
use crate::dom::node::ZWS;
use crate::dom::surgery::{merge_containers, merge_with_block, split, SplitPoint};
use crate::dom::tree::NodeId;
use crate::dom::walker::previous_block;
use crate::dom::DomContext;
use crate::html;
use crate::range::edit::{delete_contents_of_range, insert_node_in_range};
use crate::range::{get_node_after, get_node_before, Range};

use super::clean::{add_links, remove_empty_inlines, remove_zws};
use super::Editor;

impl Editor {
    fn tag_after_split(&self, block: NodeId) -> String {
        match self.tree.tag(block) {
            Some("DT") => "DD".to_string(),
            Some("DD") => "DT".to_string(),
            Some("LI") => "LI".to_string(),
            _ => self.config.block_tag.to_ascii_uppercase(),
        }
    }

    fn is_empty_block(&self, block: NodeId) -> bool {
        let text = self.tree.text_content(block);
        text.chars().all(|c| c == ZWS)
            && !self.tree.has_descendant(block, |t, n| t.has_tag(n, "IMG"))
    }

    /// Split `block` at `(node, offset)` and make sure the second half
    /// is the right kind of block (a DT continues as a DD, and so on).
    fn split_block_at(&mut self, block: NodeId, node: NodeId, offset: usize) -> Option<NodeId> {
        let split_tag = self.tag_after_split(block);
        let parent = self.tree.parent(block)?;
        let node_after = {
            let ctx = DomContext {
                config: &self.config,
                caps: &self.caps,
            };
            split(&mut self.tree, ctx, node, SplitPoint::Index(offset), parent)?
        };
        if self.tree.has_tag_attributes(node_after, &split_tag, &[]) {
            return Some(node_after);
        }
        let replacement = self.tree.create_element(&split_tag);
        self.tree.replace_with(node_after, replacement);
        let contents = self.tree.empty(node_after);
        self.tree.append(replacement, contents);
        Some(replacement)
    }

    /// Enter: split the current block at the caret. An empty list item
    /// or quoted block breaks out of its list or quote instead.
    pub fn split_block(&mut self) {
        let mut range = self.selection();
        self.record_snapshot(&mut range);
        add_links(&mut self.tree, range.start.container);
        self.sweep_zws();
        if let Some(r) = self.range_and_remove_bookmark() {
            range = r;
        }
        let root = self.tree.root();

        if !range.collapsed() {
            let ctx = DomContext {
                config: &self.config,
                caps: &self.caps,
            };
            delete_contents_of_range(&mut self.tree, ctx, &mut range, root);
        }

        let block = range.start_block(&self.tree, root);
        let block = match block {
            Some(b) if !self.tree.has_tag(b, "TH") && !self.tree.has_tag(b, "TD") => b,
            // Inside a table cell (or malformed content) a plain line
            // break is the best we can do.
            _ => {
                let br = self.tree.create_element("BR");
                insert_node_in_range(&mut self.tree, &mut range, br);
                range.collapse(false);
                self.set_selection(range);
                self.doc_was_changed();
                return;
            }
        };

        let block = self.tree.get_nearest(block, "LI", &[]).unwrap_or(block);
        if self.is_empty_block(block) {
            if self.tree.get_nearest(block, "UL", &[]).is_some()
                || self.tree.get_nearest(block, "OL", &[]).is_some()
            {
                self.modify_blocks(Some(range), |ed, frag| {
                    ed.decrease_list_items(frag);
                    frag
                });
                return;
            }
            if self.tree.get_nearest(block, "BLOCKQUOTE", &[]).is_some() {
                self.modify_blocks(Some(range), |ed, frag| ed.remove_block_quote(frag));
                return;
            }
        }

        let node_after = self.split_block_at(block, range.start.container, range.start.offset);
        remove_zws(&mut self.tree, block);
        remove_empty_inlines(&mut self.tree, block);
        {
            let ctx = DomContext {
                config: &self.config,
                caps: &self.caps,
            };
            fix_cursor(&mut self.tree, ctx, block);
        }

        let Some(mut node_after) = node_after else {
            self.set_selection(range);
            self.doc_was_changed();
            return;
        };

        // Walk down to where the caret should go in the second half.
        while self.tree.is_element(node_after) {
            let mut child = self.tree.first_child(node_after);

            // An anchor split just after its text carries nothing
            // useful into the new line.
            if self.tree.has_tag(node_after, "A") {
                let text = self.tree.text_content(node_after);
                if text.chars().all(|c| c == ZWS) {
                    let empty_text = self.tree.create_text("");
                    self.tree.replace_with(node_after, empty_text);
                    node_after = empty_text;
                    break;
                }
            }

            while let Some(c) = child.filter(|&c| self.tree.text(c).is_some_and(str::is_empty)) {
                let next = self.tree.next_sibling(c);
                match next {
                    Some(n) if !self.tree.has_tag(n, "BR") => {
                        self.tree.detach(c);
                        child = Some(n);
                    }
                    _ => break,
                }
            }

            match child {
                Some(c) if !self.tree.has_tag(c, "BR") && !self.tree.is_text(c) => {
                    node_after = c;
                }
                _ => break,
            }
        }

        let caret = Range::caret(node_after, 0);
        self.set_selection(caret);
        self.doc_was_changed();
    }

    /// Backspace.
    pub fn delete_backward(&mut self) {
        self.sweep_zws();
        let mut range = self.selection();
        self.checkpoint(&mut range);
        let root = self.tree.root();

        if !range.collapsed() {
            let ctx = DomContext {
                config: &self.config,
                caps: &self.caps,
            };
            delete_contents_of_range(&mut self.tree, ctx, &mut range, root);
            self.after_delete(range);
            self.note_change();
            return;
        }

        if range.starts_at_block_boundary(&self.tree, root) {
            let Some(current) = range.start_block(&self.tree, root) else {
                self.set_selection(range);
                return;
            };
            // Inline flotsam between blocks breaks the merge below.
            if let Some(parent) = self.tree.parent(current) {
                let ctx = DomContext {
                    config: &self.config,
                    caps: &self.caps,
                };
                fix_container(&mut self.tree, ctx, parent);
            }

            if let Some(previous) = previous_block(&self.tree, root, current) {
                merge_with_block(&mut self.tree, previous, current, &mut range);
                // The merge may have left two containers adjacent.
                let mut node = self.tree.parent(previous).unwrap_or(root);
                while node != root && self.tree.next_sibling(node).is_none() {
                    node = self.tree.parent(node).unwrap_or(root);
                }
                if node != root {
                    if let Some(next) = self.tree.next_sibling(node) {
                        let ctx = DomContext {
                            config: &self.config,
                            caps: &self.caps,
                        };
                        merge_containers(&mut self.tree, ctx, next);
                    }
                }
                self.set_selection(range);
            } else if self.tree.get_nearest(current, "UL", &[]).is_some()
                || self.tree.get_nearest(current, "OL", &[]).is_some()
            {
                // At the very start of the document: unwind structure.
                self.modify_blocks(Some(range), |ed, frag| {
                    ed.decrease_list_items(frag);
                    frag
                });
                return;
            } else if self.tree.get_nearest(current, "BLOCKQUOTE", &[]).is_some() {
                self.modify_blocks(Some(range), |ed, frag| {
                    ed.unwrap_top_level_quotes(frag);
                    frag
                });
                return;
            } else {
                self.set_selection(range);
            }
            self.note_change();
            return;
        }

        range.move_boundaries_down(&self.tree);
        let sc = range.start.container;
        let so = range.start.offset;
        if self.tree.is_text(sc) && so > 0 {
            self.tree.delete_text_char(sc, so - 1);
            range = Range::caret(sc, so - 1);
        } else {
            let before = get_node_before(&self.tree, range.start);
            if self.tree.is_text(before) {
                let len = self.tree.len_of(before);
                if len > 0 {
                    self.tree.delete_text_char(before, len - 1);
                    range = Range::caret(before, len - 1);
                }
            } else if self.tree.is_leaf(before) {
                range.set_start_before(&self.tree, before);
                range.collapse(true);
                self.tree.detach(before);
            }
        }
        self.after_delete(range);
        self.note_change();
    }

    /// Forward delete.
    pub fn delete_forward(&mut self) {
        self.sweep_zws();
        let mut range = self.selection();
        self.checkpoint(&mut range);
        let root = self.tree.root();

        if !range.collapsed() {
            let ctx = DomContext {
                config: &self.config,
                caps: &self.caps,
            };
            delete_contents_of_range(&mut self.tree, ctx, &mut range, root);
            self.after_delete(range);
            self.note_change();
            return;
        }

        if range.ends_at_block_boundary(&self.tree, root) {
            let Some(current) = range.start_block(&self.tree, root) else {
                self.set_selection(range);
                return;
            };
            if let Some(parent) = self.tree.parent(current) {
                let ctx = DomContext {
                    config: &self.config,
                    caps: &self.caps,
                };
                fix_container(&mut self.tree, ctx, parent);
            }

            if let Some(next) = crate::dom::walker::next_block(&self.tree, root, current) {
                merge_with_block(&mut self.tree, current, next, &mut range);
                let mut node = self.tree.parent(current).unwrap_or(root);
                while node != root && self.tree.next_sibling(node).is_none() {
                    node = self.tree.parent(node).unwrap_or(root);
                }
                if node != root {
                    if let Some(sibling) = self.tree.next_sibling(node) {
                        let ctx = DomContext {
                            config: &self.config,
                            caps: &self.caps,
                        };
                        merge_containers(&mut self.tree, ctx, sibling);
                    }
                }
            }
            self.set_selection(range);
            self.note_change();
            return;
        }

        range.move_boundaries_down(&self.tree);
        let sc = range.start.container;
        let so = range.start.offset;
        if self.tree.is_text(sc) && so < self.tree.len_of(sc) {
            self.tree.delete_text_char(sc, so);
            range = Range::caret(sc, so);
        } else if let Some(after) = get_node_after(&self.tree, range.start) {
            if self.tree.is_text(after) && self.tree.len_of(after) > 0 {
                self.tree.delete_text_char(after, 0);
                range = Range::caret(after, 0);
            } else if self.tree.is_leaf(after) {
                range.set_start_before(&self.tree, after);
                range.collapse(true);
                self.tree.detach(after);
            }
        }
        self.after_delete(range);
        self.note_change();
    }

    /// Shared tail of the delete commands: drop emptied inline
    /// wrappers around the caret and repair the landing block.
    fn after_delete(&mut self, mut range: Range) {
        let root = self.tree.root();
        let mut node = range.start.container;
        if self.tree.is_text(node) {
            node = self.tree.parent(node).unwrap_or(node);
        }
        let mut parent = node;
        while self.tree.is_inline(parent) && {
            let text = self.tree.text_content(parent);
            text.chars().all(|c| c == ZWS)
        } {
            node = parent;
            match self.tree.parent(parent) {
                Some(p) => parent = p,
                None => break,
            }
        }
        if node != parent {
            if let Some(index) = self.tree.index_in_parent(node) {
                range.set_start(parent, index);
                range.collapse(true);
            }
            self.tree.detach(node);
            let target = if self.tree.is_block(parent) {
                parent
            } else {
                previous_block(&self.tree, root, parent).unwrap_or(root)
            };
            let ctx = DomContext {
                config: &self.config,
                caps: &self.caps,
            };
            fix_cursor(&mut self.tree, ctx, target);
            range.move_boundaries_down(&self.tree);
        }
        self.ensure_bottom_line();
        self.set_selection(range);
    }

    /// Space: chance to linkify the word behind the caret, and step
    /// out of a link so the space is not part of its text.
    pub fn handle_space(&mut self) {
        let mut range = self.selection();
        self.record_snapshot(&mut range);
        add_links(&mut self.tree, range.start.container);
        if let Some(r) = self.range_and_remove_bookmark() {
            range = r;
        }
        let root = self.tree.root();

        if range.collapsed() && range.end.offset == self.tree.len_of(range.end.container) {
            let mut node = range.end.container;
            loop {
                if self.tree.has_tag(node, "A") {
                    range.set_start_after(&self.tree, node);
                    range.collapse(true);
                    break;
                }
                if self.tree.next_sibling(node).is_some() {
                    break;
                }
                match self.tree.parent(node) {
                    Some(p) if p != root => node = p,
                    _ => break,
                }
            }
        }

        if !range.collapsed() {
            let ctx = DomContext {
                config: &self.config,
                caps: &self.caps,
            };
            delete_contents_of_range(&mut self.tree, ctx, &mut range, root);
            self.ensure_bottom_line();
        }
        self.set_selection(range);
    }

    /// Remove the selection and return it as markup, for the host to
    /// put on the clipboard.
    pub fn cut_selection(&mut self) -> String {
        let mut range = self.selection();
        if range.collapsed() {
            return String::new();
        }
        self.checkpoint(&mut range);
        let root = self.tree.root();
        let frag = {
            let ctx = DomContext {
                config: &self.config,
                caps: &self.caps,
            };
            delete_contents_of_range(&mut self.tree, ctx, &mut range, root)
        };
        let markup = html::serialize_children(&self.tree, frag).replace(ZWS, "");
        self.ensure_bottom_line();
        self.set_selection(range);
        self.note_change();
        markup
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

    fn first_text(ed: &Editor) -> NodeId {
        let root = ed.tree.root();
        let mut node = root;
        while let Some(child) = ed.tree.first_child(node) {
            node = child;
        }
        node
    }

    #[test]
    fn enter_splits_the_block_at_the_caret() {
        let mut ed = editor_with("<div>hello</div>");
        let text = first_text(&ed);
        ed.set_selection(Range::caret(text, 2));
        ed.split_block();
        assert_eq!(ed.get_html(), "<div>he</div><div>llo</div>");
    }

    #[test]
    fn enter_at_the_end_opens_a_new_line() {
        let mut ed = editor_with("<div>hello</div>");
        let text = first_text(&ed);
        ed.set_selection(Range::caret(text, 5));
        ed.split_block();
        assert_eq!(ed.get_html(), "<div>hello</div><div><br></div>");
    }

    #[test]
    fn enter_in_a_list_item_continues_the_list() {
        let mut ed = editor_with("<ul><li>one</li></ul><div>x</div>");
        let text = first_text(&ed);
        ed.set_selection(Range::caret(text, 3));
        ed.split_block();
        assert_eq!(
            ed.get_html(),
            "<ul><li>one</li><li><br></li></ul><div>x</div>"
        );
    }

    #[test]
    fn enter_on_an_empty_list_item_leaves_the_list() {
        let mut ed = editor_with("<ul><li>one</li><li><br></li></ul>");
        let root = ed.tree.root();
        let ul = ed.tree.first_child(root).unwrap();
        let li2 = ed.tree.last_child(ul).unwrap();
        ed.set_selection(Range::caret(li2, 0));
        ed.split_block();
        assert_eq!(ed.get_html(), "<ul><li>one</li></ul><div><br></div>");
    }

    #[test]
    fn backspace_removes_the_previous_character() {
        let mut ed = editor_with("<div>hello</div>");
        let text = first_text(&ed);
        ed.set_selection(Range::caret(text, 5));
        ed.delete_backward();
        assert_eq!(ed.get_html(), "<div>hell</div>");
        assert_eq!(ed.selection().start, Boundary::new(text, 4));
    }

    #[test]
    fn backspace_at_block_start_merges_with_the_previous_block() {
        let mut ed = editor_with("<div>one</div><div>two</div>");
        let root = ed.tree.root();
        let b2 = ed.tree.last_child(root).unwrap();
        let t2 = ed.tree.first_child(b2).unwrap();
        ed.set_selection(Range::caret(t2, 0));
        ed.delete_backward();
        assert_eq!(ed.get_html(), "<div>onetwo</div>");
    }

    #[test]
    fn backspace_on_a_selection_deletes_it() {
        let mut ed = editor_with("<div>hello</div>");
        let text = first_text(&ed);
        ed.set_selection(Range::new(Boundary::new(text, 1), Boundary::new(text, 4)));
        ed.delete_backward();
        assert_eq!(ed.get_html(), "<div>ho</div>");
    }

    #[test]
    fn forward_delete_removes_the_next_character() {
        let mut ed = editor_with("<div>hello</div>");
        let text = first_text(&ed);
        ed.set_selection(Range::caret(text, 0));
        ed.delete_forward();
        assert_eq!(ed.get_html(), "<div>ello</div>");
    }

    #[test]
    fn forward_delete_at_block_end_pulls_the_next_block_up() {
        let mut ed = editor_with("<div>one</div><div>two</div>");
        let text = first_text(&ed);
        ed.set_selection(Range::caret(text, 3));
        ed.delete_forward();
        assert_eq!(ed.get_html(), "<div>onetwo</div>");
    }

    #[test]
    fn space_at_the_end_of_a_link_steps_outside_it() {
        let mut ed = editor_with("<div><a href=\"http://x\">link</a>tail</div>");
        let root = ed.tree.root();
        let block = ed.tree.first_child(root).unwrap();
        let a = ed.tree.first_child(block).unwrap();
        let link_text = ed.tree.first_child(a).unwrap();
        ed.set_selection(Range::caret(link_text, 4));

        ed.handle_space();
        let range = ed.selection();
        assert!(range.collapsed());
        assert_eq!(range.start, Boundary::new(block, 1));
    }

    #[test]
    fn cut_returns_the_selected_markup_and_removes_it() {
        let mut ed = editor_with("<div>a<b>bc</b>d</div>");
        let root = ed.tree.root();
        let block = ed.tree.first_child(root).unwrap();
        let t1 = ed.tree.first_child(block).unwrap();
        let b = ed.tree.child(block, 1).unwrap();
        let bt = ed.tree.first_child(b).unwrap();
        ed.set_selection(Range::new(Boundary::new(t1, 0), Boundary::new(bt, 2)));

        let markup = ed.cut_selection();
        assert_eq!(markup, "a<b>bc</b>");
        assert_eq!(ed.get_html(), "<div>d</div>");
    }
}
