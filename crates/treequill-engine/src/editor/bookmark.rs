//! Selection bookmarks.
//!
//! Structural rewrites (block transforms, undo snapshots) cannot keep
//! a `(node, offset)` range valid, so the selection is materialized as
//! a pair of hidden INPUT sentinels inserted into the document. After
//! the rewrite the sentinels are looked up by id, removed, and the
//! range rebuilt around where they sat.

use crate::dom::surgery::merge_inlines;
use crate::error::EngineError;
use crate::range::edit::insert_node_in_range;
use crate::range::{Boundary, Range};

use super::Editor;

pub(crate) const START_SELECTION_ID: &str = "treequill-selection-start";
pub(crate) const END_SELECTION_ID: &str = "treequill-selection-end";

impl Editor {
    /// Replace the range with sentinel elements in the document.
    /// `range` is left selecting the region between the sentinels.
    pub(crate) fn save_range_to_bookmark(&mut self, range: &mut Range) {
        let mut start = self.tree.create_element_with_attrs(
            "INPUT",
            &[("id", START_SELECTION_ID), ("type", "hidden")],
        );
        let mut end = self.tree.create_element_with_attrs(
            "INPUT",
            &[("id", END_SELECTION_ID), ("type", "hidden")],
        );

        insert_node_in_range(&mut self.tree, range, start);
        range.collapse(false);
        insert_node_in_range(&mut self.tree, range, end);

        // In a collapsed range the second insertion lands before the
        // first; swap the sentinels back into document order.
        if self.tree.path_from_root(start) > self.tree.path_from_root(end) {
            self.tree.set_attribute(start, "id", END_SELECTION_ID);
            self.tree.set_attribute(end, "id", START_SELECTION_ID);
            std::mem::swap(&mut start, &mut end);
        }

        range.set_start_after(&self.tree, start);
        range.set_end_before(&self.tree, end);
    }

    /// Drop a saved bookmark without rebuilding a range from it, for
    /// operations abandoned partway.
    pub(crate) fn discard_bookmark(&mut self) {
        let root = self.tree.root();
        for id in [START_SELECTION_ID, END_SELECTION_ID] {
            if let Some(node) = self.tree.find_element_by_id_attr(root, id) {
                self.tree.detach(node);
            }
        }
    }

    /// Find and remove the bookmark sentinels, returning the range
    /// they delimited. `None` when no bookmark is present.
    pub(crate) fn range_and_remove_bookmark(&mut self) -> Option<Range> {
        let root = self.tree.root();
        let start = self.tree.find_element_by_id_attr(root, START_SELECTION_ID);
        let end = self.tree.find_element_by_id_attr(root, END_SELECTION_ID);

        let (start, end) = match (start, end) {
            (Some(s), Some(e)) => (s, e),
            (None, None) => return None,
            (lone, _) => {
                log::warn!("{}", EngineError::LoneBookmark);
                if let Some(n) = lone.or(end) {
                    self.tree.detach(n);
                }
                return None;
            }
        };

        let sc = self.tree.parent(start)?;
        let ec = self.tree.parent(end)?;
        let so = self.tree.index_in_parent(start)?;
        let mut eo = self.tree.index_in_parent(end)?;
        if sc == ec {
            eo -= 1;
        }
        self.tree.detach(start);
        self.tree.detach(end);

        let mut range = Range::new(Boundary::new(sc, so), Boundary::new(ec, eo));
        merge_inlines(&mut self.tree, sc, &mut range);
        if sc != ec {
            merge_inlines(&mut self.tree, ec, &mut range);
        }

        let collapsed = range.collapsed();
        range.move_boundaries_down(&self.tree);
        if collapsed {
            range.collapse(true);
        }
        Some(range)
    }
}
