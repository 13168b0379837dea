//! The element path under the selection, for toolbar state and
//! breadcrumb displays.

use crate::dom::tree::NodeId;
use crate::range::Range;

use super::{Editor, Event};

pub(crate) struct PathState {
    last_anchor: Option<NodeId>,
    last_focus: Option<NodeId>,
    current: Vec<String>,
}

impl PathState {
    pub(crate) fn new() -> Self {
        Self {
            last_anchor: None,
            last_focus: None,
            current: Vec::new(),
        }
    }
}

impl Editor {
    /// Segments from the root down to the selection, e.g.
    /// `["BLOCKQUOTE", "DIV", "B"]`. Ids and classes are appended
    /// selector-style: `DIV#intro.lead`.
    pub fn path(&self) -> &[String] {
        &self.path.current
    }

    pub(crate) fn update_path(&mut self, range: Range, force: bool) {
        let (anchor, focus) = match self.selected_node_for(&range) {
            Some(node) => (Some(node), Some(node)),
            None => (Some(range.start.container), Some(range.end.container)),
        };
        if force || anchor != self.path.last_anchor || focus != self.path.last_focus {
            self.path.last_anchor = anchor;
            self.path.last_focus = focus;
            let node = if anchor == focus {
                focus
            } else {
                Some(range.common_ancestor(&self.tree))
            };
            self.path.current = node.map(|n| self.node_path(n)).unwrap_or_default();
            let path = self.path.current.clone();
            self.emit(Event::PathChange { path });
        }
        if !range.collapsed() {
            self.emit(Event::Select);
        }
    }

    fn node_path(&self, node: NodeId) -> Vec<String> {
        let mut segments = Vec::new();
        let mut current = Some(node);
        while let Some(n) = current {
            if n == self.tree.root() {
                break;
            }
            if let Some(el) = self.tree.element(n) {
                let mut segment = el.tag.clone();
                if let Some(id) = el.attribute("id").filter(|v| !v.is_empty()) {
                    segment.push('#');
                    segment.push_str(id);
                }
                let class = el.class_name();
                if !class.is_empty() {
                    let mut classes: Vec<&str> = class.split_whitespace().collect();
                    classes.sort_unstable();
                    for c in classes {
                        segment.push('.');
                        segment.push_str(c);
                    }
                }
                segments.push(segment);
            }
            current = self.tree.parent(n);
        }
        segments.reverse();
        segments
    }
}
