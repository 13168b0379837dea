//! The paste pipeline.
//!
//! Hosts report a paste in two steps: `begin_paste` when the paste
//! event fires, then `insert_paste_html` once the clipboard content is
//! available. The guard keeps a second paste from landing while the
//! first is still in flight.

use crate::dom::fix::fix_cursor;
use crate::dom::tree::{DomTree, NodeId};
use crate::dom::walker::{NodeTest, TreeWalker};
use crate::dom::DomContext;
use crate::html;
use crate::range::edit::insert_tree_fragment_into_range;

use super::clean::{add_links, cleanup_brs, clean_tree, remove_empty_inlines};
use super::Editor;

impl Editor {
    /// Returns false if a previous paste has not finished yet.
    pub fn begin_paste(&mut self) -> bool {
        if self.awaiting_paste {
            return false;
        }
        self.awaiting_paste = true;
        true
    }

    pub fn cancel_paste(&mut self) {
        self.awaiting_paste = false;
    }

    /// Clean up pasted markup and insert it at the selection.
    /// `will_paste` sees the prepared fragment and can veto the
    /// insertion, mirroring a cancelable willPaste notification.
    pub fn insert_paste_html(
        &mut self,
        markup: &str,
        will_paste: impl FnOnce(&DomTree, NodeId) -> bool,
    ) {
        let mut range = self.selection();
        let frag = html::parse_fragment(&mut self.tree, markup);
        self.checkpoint(&mut range);

        // Clipboard serializers often wrap everything in one DIV.
        if let (Some(first), Some(last)) =
            (self.tree.first_child(frag), self.tree.last_child(frag))
        {
            if first == last && self.tree.has_tag(first, "DIV") {
                let contents = self.tree.empty(first);
                self.tree.detach(first);
                self.tree.append(frag, contents);
            }
        }

        self.tree.normalize(frag);
        add_links(&mut self.tree, frag);
        {
            let ctx = DomContext {
                config: &self.config,
                caps: &self.caps,
            };
            clean_tree(&mut self.tree, ctx, frag, false);
            cleanup_brs(&mut self.tree, ctx, frag);
            remove_empty_inlines(&mut self.tree, frag);
            let mut walker = TreeWalker::new(frag, NodeTest::Block);
            while let Some(block) = walker.next_node(&self.tree) {
                fix_cursor(&mut self.tree, ctx, block);
            }
        }

        if will_paste(&self.tree, frag) {
            let root = self.tree.root();
            let ctx = DomContext {
                config: &self.config,
                caps: &self.caps,
            };
            insert_tree_fragment_into_range(&mut self.tree, ctx, &mut range, frag, root);
            range.collapse(false);
            self.ensure_bottom_line();
            self.note_change();
        }
        self.set_selection(range);
        self.awaiting_paste = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Capabilities, EditorConfig};
    use crate::range::Range;
    use pretty_assertions::assert_eq;

    fn editor_with(html: &str) -> Editor {
        let mut ed = Editor::new(EditorConfig::default(), Capabilities::default());
        ed.set_html(html);
        ed
    }

    fn caret_in_first_text(ed: &mut Editor, offset: usize) {
        let root = ed.document().root();
        let mut node = root;
        while let Some(child) = ed.document().first_child(node) {
            node = child;
        }
        ed.set_selection(Range::caret(node, offset));
    }

    #[test]
    fn pasted_markup_is_cleaned_before_insertion() {
        let config = EditorConfig {
            semantic_markup: true,
            ..EditorConfig::default()
        };
        let mut ed = Editor::new(config, Capabilities::default());
        ed.set_html("<div>ab</div>");
        caret_in_first_text(&mut ed, 1);
        assert!(ed.begin_paste());
        ed.insert_paste_html("<span style=\"font-weight:bold\">X</span>", |_, _| true);
        assert_eq!(ed.get_html(), "<div>a<strong>X</strong>b</div>");
    }

    #[test]
    fn a_clipboard_div_wrapper_is_unwrapped() {
        let mut ed = editor_with("<div>ab</div>");
        caret_in_first_text(&mut ed, 2);
        assert!(ed.begin_paste());
        ed.insert_paste_html("<div>tail</div>", |_, _| true);
        assert_eq!(ed.get_html(), "<div>abtail</div>");
    }

    #[test]
    fn a_second_paste_cannot_start_while_one_is_in_flight() {
        let mut ed = editor_with("<div>ab</div>");
        assert!(ed.begin_paste());
        assert!(!ed.begin_paste());
        ed.cancel_paste();
        assert!(ed.begin_paste());
    }

    #[test]
    fn vetoed_paste_leaves_the_document_alone() {
        let mut ed = editor_with("<div>ab</div>");
        caret_in_first_text(&mut ed, 1);
        assert!(ed.begin_paste());
        ed.insert_paste_html("<div>nope</div>", |_, _| false);
        assert_eq!(ed.get_html(), "<div>ab</div>");
        // The guard is released either way.
        assert!(ed.begin_paste());
    }

    #[test]
    fn block_paste_splits_the_current_block() {
        let mut ed = editor_with("<div>abcd</div>");
        caret_in_first_text(&mut ed, 2);
        assert!(ed.begin_paste());
        ed.insert_paste_html("<div>one</div><div>two</div>", |_, _| true);
        assert_eq!(
            ed.get_html(),
            "<div>ab</div><div>one</div><div>two</div><div>cd</div>"
        );
    }
}
