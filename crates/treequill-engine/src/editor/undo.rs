//! Snapshot-based undo and redo.
//!
//! Each checkpoint serializes the whole document with the selection
//! bookmarked inside it, so restoring a snapshot restores the caret
//! too. A checkpoint is recorded before a change and stays "open"
//! until the change notifier reports that content actually changed;
//! further operations before that reuse the open checkpoint.

use crate::dom::fix::fix_cursor;
use crate::dom::walker::{NodeTest, TreeWalker};
use crate::dom::DomContext;
use crate::html;
use crate::range::Range;

use super::{Editor, Event};

pub(crate) struct UndoState {
    stack: Vec<String>,
    index: isize,
    length: usize,
    pub(crate) in_undo: bool,
}

impl UndoState {
    pub(crate) fn new() -> Self {
        Self {
            stack: Vec::new(),
            index: -1,
            length: 0,
            in_undo: false,
        }
    }
}

impl Editor {
    pub fn can_undo(&self) -> bool {
        self.undo.index > 0 || (self.undo.index == 0 && !self.undo.in_undo)
    }

    pub fn can_redo(&self) -> bool {
        self.undo.index + 1 < self.undo.length as isize && self.undo.in_undo
    }

    /// Record a snapshot of the document unless the current checkpoint
    /// is still open. The bookmark for `range` is left in the document
    /// and serialized with it.
    pub(crate) fn record_snapshot(&mut self, range: &mut Range) {
        if self.undo.in_undo {
            return;
        }
        self.undo.index += 1;
        let index = self.undo.index as usize;
        if index < self.undo.length {
            self.undo.stack.truncate(index);
            self.undo.length = index;
        }
        self.save_range_to_bookmark(range);
        let root = self.tree.root();
        self.undo.stack.push(html::serialize_children(&self.tree, root));
        self.undo.length += 1;
        self.undo.in_undo = true;
    }

    /// Record a snapshot and take the bookmark back out, leaving
    /// `range` pointing at the same content.
    pub(crate) fn checkpoint(&mut self, range: &mut Range) {
        self.record_snapshot(range);
        if let Some(r) = self.range_and_remove_bookmark() {
            *range = r;
        }
    }

    /// Close the open checkpoint: the next operation will record a new
    /// snapshot.
    pub(crate) fn doc_was_changed(&mut self) {
        if self.undo.in_undo {
            self.undo.in_undo = false;
            self.emit(Event::UndoStateChange {
                can_undo: true,
                can_redo: false,
            });
        }
        self.emit(Event::Input);
    }

    pub fn undo(&mut self) {
        if self.undo.index == 0 && self.undo.in_undo {
            return;
        }
        // Capture the state being undone so redo can come back to it.
        let mut range = self.selection();
        self.record_snapshot(&mut range);
        if self.undo.index <= 0 {
            // Nothing older to restore; take the capture sentinels
            // back out of the document.
            self.discard_bookmark();
            return;
        }
        self.undo.index -= 1;
        let markup = self.undo.stack[self.undo.index as usize].clone();
        self.apply_snapshot(&markup);
        self.undo.in_undo = true;
        self.emit(Event::UndoStateChange {
            can_undo: self.undo.index != 0,
            can_redo: true,
        });
        self.emit(Event::Input);
    }

    pub fn redo(&mut self) {
        if self.undo.index + 1 >= self.undo.length as isize || !self.undo.in_undo {
            return;
        }
        self.undo.index += 1;
        let markup = self.undo.stack[self.undo.index as usize].clone();
        self.apply_snapshot(&markup);
        self.emit(Event::UndoStateChange {
            can_undo: true,
            can_redo: self.undo.index + 1 < self.undo.length as isize,
        });
        self.emit(Event::Input);
    }

    /// Swap the document for a recorded snapshot and restore the
    /// selection from the bookmark inside it.
    fn apply_snapshot(&mut self, markup: &str) {
        let root = self.tree.root();
        let frag = html::parse_fragment(&mut self.tree, markup);
        self.tree.empty(root);
        self.tree.append(root, frag);
        let ctx = DomContext {
            config: &self.config,
            caps: &self.caps,
        };
        fix_cursor(&mut self.tree, ctx, root);
        let mut walker = TreeWalker::new(root, NodeTest::Block);
        while let Some(block) = walker.next_node(&self.tree) {
            fix_cursor(&mut self.tree, ctx, block);
        }
        let range = self
            .range_and_remove_bookmark()
            .unwrap_or_else(|| self.default_caret());
        self.set_selection(range);
        let revision = self.tree.revision();
        self.notifier.acknowledge(revision);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Capabilities, EditorConfig};
    use pretty_assertions::assert_eq;

    fn editor_with(html: &str) -> Editor {
        let mut ed = Editor::new(EditorConfig::default(), Capabilities::default());
        ed.set_html(html);
        ed.drain_events();
        ed
    }

    #[test]
    fn fresh_document_has_nothing_to_undo() {
        let ed = editor_with("<div>one</div>");
        assert!(!ed.can_undo());
        assert!(!ed.can_redo());
    }

    #[test]
    fn undo_restores_the_previous_snapshot() {
        let mut ed = editor_with("<div>one</div>");
        ed.insert_html("X");
        assert_eq!(ed.get_html(), "<div>X</div><div>one</div>");
        assert!(ed.can_undo());

        ed.undo();
        assert_eq!(ed.get_html(), "<div>one</div>");
        assert!(ed.can_redo());

        ed.redo();
        assert_eq!(ed.get_html(), "<div>X</div><div>one</div>");
        assert!(!ed.can_redo());
    }

    #[test]
    fn new_edit_after_undo_drops_the_redo_branch() {
        let mut ed = editor_with("<div>one</div>");
        ed.insert_html("X");
        ed.undo();
        assert!(ed.can_redo());
        ed.insert_html("Y");
        assert!(!ed.can_redo());
        assert_eq!(ed.get_html(), "<div>Y</div><div>one</div>");
        ed.undo();
        assert_eq!(ed.get_html(), "<div>one</div>");
    }

    #[test]
    fn operations_between_changes_share_a_checkpoint() {
        let mut ed = editor_with("<div>one</div>");
        // Two inserts, with the change notifier reporting in between:
        // two distinct undo steps.
        ed.insert_html("X");
        ed.insert_html("Y");
        ed.undo();
        assert_eq!(ed.get_html(), "<div>X</div><div>one</div>");
        ed.undo();
        assert_eq!(ed.get_html(), "<div>one</div>");
        assert!(!ed.can_undo());
    }

    #[test]
    fn undo_state_events_track_availability() {
        let mut ed = editor_with("<div>one</div>");
        ed.insert_html("X");
        let events = ed.drain_events();
        assert!(events.contains(&Event::UndoStateChange {
            can_undo: true,
            can_redo: false,
        }));
        ed.undo();
        let events = ed.drain_events();
        assert!(events.contains(&Event::UndoStateChange {
            can_undo: false,
            can_redo: true,
        }));
    }
}
