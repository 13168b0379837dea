/*!
 * The editor facade.
 *
 * [`Editor`] owns the document tree, the selection, the undo history
 * and the change notifier, and exposes the editing operations as
 * methods. It is host-agnostic: the host renders the tree, forwards
 * key and paste notifications, and drains [`Event`]s to keep its own
 * UI (toolbars, breadcrumbs) in sync.
 *
 * - `bookmark`: selection persistence through structural rewrites.
 * - `undo`: snapshot-based undo/redo.
 * - `observe`: change detection strategies.
 * - `path`: the element path under the selection.
 * - `clean`: markup normalization for loaded and pasted content.
 * - `format`: inline formatting (bold, links, arbitrary tags).
 * - `blocks`: block-level transforms (lists, quotes).
 * - `commands`: key-driven commands (enter, delete).
 * - `paste`: the paste pipeline.
 */

mod blocks;
mod bookmark;
mod clean;
mod commands;
mod format;
mod observe;
mod paste;
mod path;
mod undo;

pub use format::FormatDescriptor;
pub use observe::{ChangeNotifier, ChangeSignal, KeyUpHeuristic, RevisionWatcher};

use std::collections::VecDeque;

use crate::config::{Capabilities, EditorConfig};
use crate::dom::fix::{create_default_block, fix_container, fix_cursor};
use crate::dom::surgery::{split, SplitPoint};
use crate::dom::tree::{DomTree, NodeId};
use crate::dom::walker::{NodeTest, TreeWalker};
use crate::dom::{DomContext, ZWS};
use crate::error::EngineError;
use crate::html;
use crate::range::edit::insert_node_in_range;
use crate::range::Range;

use path::PathState;
use undo::UndoState;

/// Notifications produced by editing operations, drained by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// The document content changed.
    Input,
    /// Undo or redo availability changed.
    UndoStateChange { can_undo: bool, can_redo: bool },
    /// The element path under the selection changed.
    PathChange { path: Vec<String> },
    /// A non-collapsed selection exists.
    Select,
    Focus,
    Blur,
}

/// Which flavour of list to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Ordered,
    Unordered,
}

impl ListKind {
    fn tag(self) -> &'static str {
        match self {
            ListKind::Ordered => "OL",
            ListKind::Unordered => "UL",
        }
    }
}

pub struct Editor {
    tree: DomTree,
    config: EditorConfig,
    caps: Capabilities,
    undo: UndoState,
    notifier: Box<dyn ChangeNotifier>,
    events: VecDeque<Event>,
    last_selection: Option<Range>,
    focused: bool,
    path: PathState,
    awaiting_paste: bool,
}

impl Editor {
    pub fn new(config: EditorConfig, caps: Capabilities) -> Self {
        let notifier = observe::notifier_for(&caps);
        let mut editor = Self {
            tree: DomTree::new(),
            config,
            caps,
            undo: UndoState::new(),
            notifier,
            events: VecDeque::new(),
            last_selection: None,
            focused: false,
            path: PathState::new(),
            awaiting_paste: false,
        };
        editor.set_html("");
        editor
    }

    /// Read access to the document for rendering.
    pub fn document(&self) -> &DomTree {
        &self.tree
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub(crate) fn emit(&mut self, event: Event) {
        self.events.push_back(event);
    }

    /// Take all pending events, oldest first.
    pub fn drain_events(&mut self) -> Vec<Event> {
        self.events.drain(..).collect()
    }

    pub fn focus(&mut self) {
        if !self.focused {
            self.focused = true;
            self.emit(Event::Focus);
        }
    }

    pub fn blur(&mut self) {
        if self.focused {
            self.focused = false;
            self.emit(Event::Blur);
        }
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    // --- Selection ---

    pub(crate) fn default_caret(&self) -> Range {
        let root = self.tree.root();
        let node = self.tree.first_child(root).unwrap_or(root);
        Range::caret(node, 0)
    }

    /// The current selection, falling back to a caret at the start of
    /// the document when the stored one no longer points at attached
    /// nodes.
    pub fn selection(&self) -> Range {
        if let Some(range) = self.last_selection {
            if self.tree.is_attached(range.start.container)
                && self.tree.is_attached(range.end.container)
            {
                return range;
            }
        }
        self.default_caret()
    }

    pub fn set_selection(&mut self, range: Range) {
        for boundary in [range.start, range.end] {
            if !self.tree.is_attached(boundary.container) {
                let err = EngineError::DetachedNode(boundary.container);
                debug_assert!(false, "{err}");
                log::warn!("{err}");
                return;
            }
            let len = self.tree.len_of(boundary.container);
            if boundary.offset > len {
                let err = EngineError::InvalidBoundary {
                    node: boundary.container,
                    offset: boundary.offset,
                    len,
                };
                debug_assert!(false, "{err}");
                log::warn!("{err}");
                return;
            }
        }
        let mut range = range;
        // A leaf cannot contain a boundary; hoist it to the parent.
        if self.tree.is_leaf(range.start.container) {
            let node = range.start.container;
            range.set_start_before(&self.tree, node);
        }
        if self.tree.is_leaf(range.end.container) {
            let node = range.end.container;
            range.set_end_before(&self.tree, node);
        }
        self.last_selection = Some(range);
        self.update_path(range, false);
    }

    /// Select a whole node (an image, say) so the next command applies
    /// to it.
    pub fn select_node(&mut self, node: NodeId) {
        let mut range = self.selection();
        range.select_node(&self.tree, node);
        self.set_selection(range);
    }

    /// The single node wholly covered by the selection, if any.
    pub fn selected_node(&self) -> Option<NodeId> {
        self.selected_node_for(&self.selection())
    }

    pub(crate) fn selected_node_for(&self, range: &Range) -> Option<NodeId> {
        let sc = range.start.container;
        let ec = range.end.container;
        if self.tree.is_text(sc) {
            if sc == ec {
                if range.end.offset.checked_sub(range.start.offset) == Some(self.tree.len_of(sc)) {
                    return self.tree.parent(sc);
                }
            } else if range.start.offset == 0 {
                let end_len = if self.tree.is_text(ec) {
                    self.tree.len_of(ec)
                } else {
                    self.tree.text_content(ec).chars().count()
                };
                if range.end.offset == end_len {
                    let common = range.common_ancestor(&self.tree);
                    let children = self.tree.children(common);
                    // The trailing child is usually a BR fixer.
                    if children.first() == Some(&sc)
                        && children.len() >= 2
                        && children[children.len() - 2] == ec
                    {
                        return Some(common);
                    }
                }
            }
        } else if self.tree.is_element(sc)
            && sc == ec
            && range.end.offset.checked_sub(range.start.offset) == Some(1)
        {
            return self.tree.child(sc, range.start.offset);
        }
        None
    }

    /// Plain-text rendition of the selection, with newlines at block
    /// transitions.
    pub fn selected_text(&self) -> String {
        let range = self.selection();
        let mut walker = TreeWalker::new(range.common_ancestor(&self.tree), NodeTest::InRange(range));
        walker.current = range.start.container;
        let mut node = if walker.accepts(&self.tree, range.start.container) {
            Some(range.start.container)
        } else {
            walker.next_node(&self.tree)
        };
        let mut out = String::new();
        let mut added_text_in_block = false;
        while let Some(n) = node {
            if let Some(text) = self.tree.text(n) {
                if text.chars().any(|c| !c.is_whitespace()) {
                    let mut value = text.to_string();
                    if n == range.end.container {
                        value = value.chars().take(range.end.offset).collect();
                    }
                    if n == range.start.container {
                        value = value.chars().skip(range.start.offset).collect();
                    }
                    out.push_str(&value);
                    added_text_in_block = true;
                }
            } else if self.tree.has_tag(n, "BR")
                || (added_text_in_block && !self.tree.is_inline(n))
            {
                out.push('\n');
                added_text_in_block = false;
            }
            node = walker.next_node(&self.tree);
        }
        out
    }

    // --- Content ---

    /// Replace the whole document. Resets the undo history; a
    /// selection bookmark embedded in the markup is restored.
    pub fn set_html(&mut self, markup: &str) {
        let frag = html::parse_fragment(&mut self.tree, markup);
        let ctx = DomContext {
            config: &self.config,
            caps: &self.caps,
        };
        clean::clean_tree(&mut self.tree, ctx, frag, true);
        clean::cleanup_brs(&mut self.tree, ctx, frag);
        fix_container(&mut self.tree, ctx, frag);
        let mut walker = TreeWalker::new(frag, NodeTest::Block);
        while let Some(block) = walker.next_node(&self.tree) {
            fix_cursor(&mut self.tree, ctx, block);
        }

        let root = self.tree.root();
        self.tree.empty(root);
        self.tree.append(root, frag);
        fix_cursor(&mut self.tree, ctx, root);

        self.undo = UndoState::new();
        let mut range = self
            .range_and_remove_bookmark()
            .unwrap_or_else(|| self.default_caret());
        self.record_snapshot(&mut range);
        if let Some(r) = self.range_and_remove_bookmark() {
            range = r;
        }
        self.set_selection(range);
        let revision = self.tree.revision();
        self.notifier.acknowledge(revision);
    }

    /// Serialize the document. Zero-width space fixers never appear in
    /// the output.
    pub fn get_html(&mut self) -> String {
        let root = self.tree.root();
        let mut added = Vec::new();
        if self.caps.use_text_fixer {
            let mut walker = TreeWalker::new(root, NodeTest::Block);
            let mut blocks = Vec::new();
            while let Some(b) = walker.next_node(&self.tree) {
                blocks.push(b);
            }
            for block in blocks {
                if self.tree.text_content(block).is_empty()
                    && !self.tree.has_descendant(block, |t, n| t.has_tag(n, "BR"))
                {
                    let br = self.tree.create_element("BR");
                    self.tree.append(block, br);
                    added.push(br);
                }
            }
        }
        let mut out = html::serialize_children(&self.tree, root);
        let mutated = !added.is_empty();
        for br in added.into_iter().rev() {
            self.tree.detach(br);
        }
        if mutated {
            let revision = self.tree.revision();
            self.notifier.acknowledge(revision);
        }
        if out.contains(ZWS) {
            out = out.replace(ZWS, "");
        }
        out
    }

    /// Insert an element at the selection. Inline elements slot in at
    /// the caret; block elements go in at the top level, splitting the
    /// current block.
    pub fn insert_element(&mut self, el: NodeId, range: Option<Range>) {
        let mut range = range.unwrap_or_else(|| self.selection());
        range.collapse(true);
        if self.tree.is_inline(el) {
            insert_node_in_range(&mut self.tree, &mut range, el);
            range.set_start_after(&self.tree, el);
            range.collapse(true);
        } else {
            let root = self.tree.root();
            let mut split_node = range.start_block(&self.tree, root).unwrap_or(root);
            while split_node != root && self.tree.next_sibling(split_node).is_none() {
                match self.tree.parent(split_node) {
                    Some(p) => split_node = p,
                    None => break,
                }
            }
            let node_after = if split_node != root {
                match (self.tree.parent(split_node), self.tree.next_sibling(split_node)) {
                    (Some(parent), Some(next)) => {
                        let ctx = DomContext {
                            config: &self.config,
                            caps: &self.caps,
                        };
                        split(&mut self.tree, ctx, parent, SplitPoint::Node(next), root)
                    }
                    _ => None,
                }
            } else {
                None
            };
            match node_after {
                Some(after) => {
                    self.tree.insert_before(root, el, Some(after));
                    range.set_start(after, 0);
                    range.collapse(true);
                    range.move_boundaries_down(&self.tree);
                }
                None => {
                    self.tree.append(root, el);
                    let ctx = DomContext {
                        config: &self.config,
                        caps: &self.caps,
                    };
                    let block = create_default_block(&mut self.tree, ctx, Vec::new());
                    self.tree.append(root, block);
                    range.set_start(el, 0);
                    range.collapse(true);
                }
            }
        }
        self.focus();
        self.set_selection(range);
        self.note_change();
    }

    /// Parse and insert markup at the selection, replacing any
    /// selected content.
    pub fn insert_html(&mut self, markup: &str) {
        let mut range = self.selection();
        let frag = html::parse_fragment(&mut self.tree, markup);
        self.checkpoint(&mut range);
        self.prepare_fragment(frag, true);
        let root = self.tree.root();
        let ctx = DomContext {
            config: &self.config,
            caps: &self.caps,
        };
        crate::range::edit::insert_tree_fragment_into_range(
            &mut self.tree,
            ctx,
            &mut range,
            frag,
            root,
        );
        range.collapse(false);
        self.ensure_bottom_line();
        self.set_selection(range);
        self.note_change();
    }

    /// Insert plain text, mapping newlines to line breaks.
    pub fn insert_plain_text(&mut self, text: &str) {
        let mut markup = String::new();
        for (i, line) in text.split('\n').enumerate() {
            if i > 0 {
                markup.push_str("<br>");
            }
            markup.push_str(&html_escape::encode_text(line));
        }
        self.insert_html(&markup);
    }

    /// Normalize a parsed fragment the way loaded content is
    /// normalized.
    pub(crate) fn prepare_fragment(&mut self, frag: NodeId, allow_styles: bool) {
        self.tree.normalize(frag);
        clean::add_links(&mut self.tree, frag);
        let ctx = DomContext {
            config: &self.config,
            caps: &self.caps,
        };
        clean::clean_tree(&mut self.tree, ctx, frag, allow_styles);
        clean::cleanup_brs(&mut self.tree, ctx, frag);
        clean::remove_empty_inlines(&mut self.tree, frag);
        fix_container(&mut self.tree, ctx, frag);
        let mut walker = TreeWalker::new(frag, NodeTest::Block);
        while let Some(block) = walker.next_node(&self.tree) {
            fix_cursor(&mut self.tree, ctx, block);
        }
    }
}
