//! Arena storage for the editable document tree.
//!
//! Every node is owned by its parent's child list; there is exactly
//! one path from the root to any attached node. Detaching returns
//! ownership to the caller (via the id), and all structural edits are
//! explicit transfers through `&mut self` methods. A revision counter
//! increments on every mutation and drives change observation.

use crate::dom::node::{self, Attr, Category, ElementData, NodeData};

/// Handle to a node in the arena. Plain index: using a handle whose
/// node has been rebuilt away (e.g. across `set_html`) is a caller
/// contract violation, not a memory-safety hazard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug)]
struct Node {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug)]
pub struct DomTree {
    nodes: Vec<Node>,
    root: NodeId,
    revision: u64,
    zws_dirty: bool,
}

impl DomTree {
    /// Create a tree holding an empty editable root (`BODY`).
    pub fn new() -> Self {
        let mut tree = Self {
            nodes: Vec::new(),
            root: NodeId(0),
            revision: 0,
            zws_dirty: false,
        };
        tree.root = tree.alloc(NodeData::Element(ElementData {
            tag: "BODY".to_string(),
            attrs: Vec::new(),
        }));
        tree
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Monotonic mutation counter (drives the revision watcher).
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn touch(&mut self) {
        self.revision += 1;
    }

    /// Records that a zero-width space was inserted somewhere, so the
    /// editor knows a sweep may be needed.
    pub(crate) fn note_zws_added(&mut self) {
        self.zws_dirty = true;
    }

    pub(crate) fn zws_dirty(&self) -> bool {
        self.zws_dirty
    }

    pub(crate) fn clear_zws_flag(&mut self) {
        self.zws_dirty = false;
    }

    fn alloc(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            data,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    // --- Creation ---

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.create_element_with_attrs(tag, &[])
    }

    pub fn create_element_with_attrs(&mut self, tag: &str, attrs: &[(&str, &str)]) -> NodeId {
        let data = ElementData {
            tag: tag.to_ascii_uppercase(),
            attrs: attrs
                .iter()
                .map(|(n, v)| Attr {
                    name: n.to_ascii_lowercase(),
                    value: (*v).to_string(),
                })
                .collect(),
        };
        self.alloc(NodeData::Element(data))
    }

    pub fn create_text(&mut self, data: impl Into<String>) -> NodeId {
        self.alloc(NodeData::Text(data.into()))
    }

    pub fn create_fragment(&mut self) -> NodeId {
        self.alloc(NodeData::Fragment)
    }

    /// Clone a node without its children (an ancestor shell for
    /// splits).
    pub fn clone_shallow(&mut self, id: NodeId) -> NodeId {
        let data = self.nodes[id.index()].data.clone();
        self.alloc(data)
    }

    // --- Accessors ---

    pub fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.index()].data
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.data(id), NodeData::Element(_))
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.data(id), NodeData::Text(_))
    }

    pub fn is_fragment(&self, id: NodeId) -> bool {
        matches!(self.data(id), NodeData::Fragment)
    }

    /// Uppercase tag name for elements, `None` otherwise.
    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match self.data(id) {
            NodeData::Element(el) => Some(el.tag.as_str()),
            _ => None,
        }
    }

    pub fn has_tag(&self, id: NodeId, tag: &str) -> bool {
        self.tag(id) == Some(tag)
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.data(id) {
            NodeData::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        match self.data(id) {
            NodeData::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id).and_then(|el| el.attribute(name))
    }

    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) {
        if let NodeData::Element(el) = &mut self.nodes[id.index()].data {
            el.set_attribute(name, value);
            self.touch();
        }
    }

    pub fn remove_attribute(&mut self, id: NodeId, name: &str) {
        if let NodeData::Element(el) = &mut self.nodes[id.index()].data {
            el.remove_attribute(name);
            self.touch();
        }
    }

    // --- Structure queries ---

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.index()].children
    }

    pub fn child(&self, id: NodeId, index: usize) -> Option<NodeId> {
        self.children(id).get(index).copied()
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).first().copied()
    }

    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).last().copied()
    }

    pub fn last_element_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id)
            .iter()
            .rev()
            .copied()
            .find(|&c| self.is_element(c))
    }

    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&c| c == id)
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let i = self.index_in_parent(id)?;
        self.child(parent, i + 1)
    }

    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        let i = self.index_in_parent(id)?;
        if i == 0 {
            return None;
        }
        self.child(self.parent(id)?, i - 1)
    }

    /// Node "length": child count for elements/fragments, character
    /// count for text nodes.
    pub fn len_of(&self, id: NodeId) -> usize {
        match self.data(id) {
            NodeData::Text(s) => s.chars().count(),
            _ => self.children(id).len(),
        }
    }

    /// True while `node` is `ancestor` or inside it.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cur = Some(node);
        while let Some(n) = cur {
            if n == ancestor {
                return true;
            }
            cur = self.parent(n);
        }
        false
    }

    pub fn is_attached(&self, id: NodeId) -> bool {
        self.contains(self.root, id)
    }

    /// Child indices from the root down to `id`. Only meaningful for
    /// attached nodes; for detached ones the path starts at their
    /// highest ancestor, which still gives a consistent order within
    /// that detached subtree.
    pub fn path_from_root(&self, id: NodeId) -> Vec<usize> {
        let mut path = Vec::new();
        let mut cur = id;
        while let Some(parent) = self.parent(cur) {
            // Missing index would mean corrupt parent links.
            path.push(self.index_in_parent(cur).unwrap_or(0));
            cur = parent;
        }
        path.reverse();
        path
    }

    /// Pre-order descendants of `id`, excluding `id` itself. Collected
    /// up front so callers may mutate while iterating the snapshot.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(n) = stack.pop() {
            out.push(n);
            stack.extend(self.children(n).iter().rev().copied());
        }
        out
    }

    pub fn elements_by_tag(&self, scope: NodeId, tag: &str) -> Vec<NodeId> {
        self.descendants(scope)
            .into_iter()
            .filter(|&n| self.has_tag(n, tag))
            .collect()
    }

    pub fn find_element_by_id_attr(&self, scope: NodeId, value: &str) -> Option<NodeId> {
        self.descendants(scope)
            .into_iter()
            .find(|&n| self.attribute(n, "id") == Some(value))
    }

    /// Concatenated text of all text descendants (and the node itself
    /// if it is text).
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        if let Some(t) = self.text(id) {
            out.push_str(t);
        }
        for n in self.descendants(id) {
            if let Some(t) = self.text(n) {
                out.push_str(t);
            }
        }
        out
    }

    /// Whether any proper descendant matches the predicate.
    pub fn has_descendant(&self, id: NodeId, pred: impl Fn(&Self, NodeId) -> bool) -> bool {
        self.descendants(id).into_iter().any(|n| pred(self, n))
    }

    // --- Structural mutation ---

    /// Unlink `id` from its parent. The subtree stays intact and
    /// owned by the caller through the id.
    pub fn detach(&mut self, id: NodeId) -> NodeId {
        if let Some(parent) = self.parent(id) {
            let pos = self.index_in_parent(id);
            if let Some(pos) = pos {
                self.nodes[parent.index()].children.remove(pos);
            }
            self.nodes[id.index()].parent = None;
            self.touch();
        }
        id
    }

    /// Append `child` as the last child of `parent`. Appending a
    /// fragment splices its children and leaves the fragment empty.
    pub fn append(&mut self, parent: NodeId, child: NodeId) {
        self.insert_at(parent, self.children(parent).len(), child);
    }

    /// Insert `child` immediately before `reference` (which must be a
    /// child of `parent`); `None` appends.
    pub fn insert_before(&mut self, parent: NodeId, child: NodeId, reference: Option<NodeId>) {
        let index = match reference {
            Some(r) => {
                debug_assert_eq!(self.parent(r), Some(parent));
                self.index_in_parent(r).unwrap_or(self.children(parent).len())
            }
            None => self.children(parent).len(),
        };
        self.insert_at(parent, index, child);
    }

    /// Insert `child` at `index` in `parent`'s child list.
    pub fn insert_at(&mut self, parent: NodeId, index: usize, child: NodeId) {
        debug_assert!(!self.contains(child, parent), "cycle insertion");
        if self.is_fragment(child) {
            let kids = std::mem::take(&mut self.nodes[child.index()].children);
            let mut at = index;
            for kid in kids {
                self.nodes[kid.index()].parent = Some(parent);
                self.nodes[parent.index()].children.insert(at, kid);
                at += 1;
            }
            self.touch();
            return;
        }
        self.detach(child);
        let index = index.min(self.children(parent).len());
        self.nodes[child.index()].parent = Some(parent);
        self.nodes[parent.index()].children.insert(index, child);
        self.touch();
    }

    /// Replace `old` with `new` in `old`'s parent; `old` is detached.
    pub fn replace_with(&mut self, old: NodeId, new: NodeId) {
        if let Some(parent) = self.parent(old) {
            let index = self.index_in_parent(old).unwrap_or(0);
            self.detach(old);
            self.insert_at(parent, index, new);
        }
    }

    /// Move all children of `id` into a fresh fragment and return it.
    pub fn empty(&mut self, id: NodeId) -> NodeId {
        let frag = self.create_fragment();
        let kids = std::mem::take(&mut self.nodes[id.index()].children);
        for kid in &kids {
            self.nodes[kid.index()].parent = Some(frag);
        }
        self.nodes[frag.index()].children = kids;
        self.touch();
        frag
    }

    // --- Text mutation ---

    pub fn set_text(&mut self, id: NodeId, data: impl Into<String>) {
        if let NodeData::Text(s) = &mut self.nodes[id.index()].data {
            *s = data.into();
            self.touch();
        }
    }

    pub fn append_text_data(&mut self, id: NodeId, extra: &str) {
        if let NodeData::Text(s) = &mut self.nodes[id.index()].data {
            s.push_str(extra);
            self.touch();
        }
    }

    /// Byte index of the `char_offset`-th character.
    pub fn byte_offset(&self, id: NodeId, char_offset: usize) -> usize {
        let s = self.text(id).unwrap_or("");
        s.char_indices()
            .nth(char_offset)
            .map(|(i, _)| i)
            .unwrap_or(s.len())
    }

    /// Split a text node at a character offset; the tail becomes a
    /// new text node inserted as the next sibling, and is returned.
    pub fn split_text(&mut self, id: NodeId, char_offset: usize) -> NodeId {
        let at = self.byte_offset(id, char_offset);
        let tail = match &mut self.nodes[id.index()].data {
            NodeData::Text(s) => s.split_off(at),
            _ => String::new(),
        };
        let after = self.create_text(tail);
        if let Some(parent) = self.parent(id) {
            let index = self.index_in_parent(id).unwrap_or(0);
            self.insert_at(parent, index + 1, after);
        }
        self.touch();
        after
    }

    /// Remove one character at `char_offset` from a text node.
    pub fn delete_text_char(&mut self, id: NodeId, char_offset: usize) {
        let at = self.byte_offset(id, char_offset);
        if let NodeData::Text(s) = &mut self.nodes[id.index()].data {
            if at < s.len() {
                s.remove(at);
                self.touch();
            }
        }
    }

    /// Merge adjacent text-node children, dropping empty ones, then
    /// recurse. The shallow equivalent of DOM `normalize()`.
    pub fn normalize(&mut self, id: NodeId) {
        let mut i = 0;
        while i < self.children(id).len() {
            let child = self.children(id)[i];
            if self.is_text(child) {
                if self.text(child).is_some_and(str::is_empty) {
                    self.detach(child);
                    continue;
                }
                while let Some(&next) = self.children(id).get(i + 1) {
                    if let Some(data) = self.text(next).map(str::to_string) {
                        self.append_text_data(child, &data);
                        self.detach(next);
                    } else {
                        break;
                    }
                }
            } else {
                self.normalize(child);
            }
            i += 1;
        }
    }

    // --- Classification ---

    /// Inline means text-flow level: text nodes, or elements whose
    /// tag participates in text flow.
    pub fn is_inline(&self, id: NodeId) -> bool {
        match self.data(id) {
            NodeData::Text(_) => true,
            NodeData::Element(el) => node::is_inline_tag(&el.tag),
            NodeData::Fragment => false,
        }
    }

    /// Block means a non-inline element all of whose children are
    /// inline.
    pub fn is_block(&self, id: NodeId) -> bool {
        self.is_element(id)
            && !self.is_inline(id)
            && self.children(id).iter().all(|&c| self.is_inline(c))
    }

    /// Container means a non-inline element with at least one
    /// non-inline child.
    pub fn is_container(&self, id: NodeId) -> bool {
        self.is_element(id) && !self.is_inline(id) && !self.is_block(id)
    }

    /// Void/atomic elements that cannot hold a caret.
    pub fn is_leaf(&self, id: NodeId) -> bool {
        match self.data(id) {
            NodeData::Element(el) => node::is_leaf_tag(&el.tag),
            _ => false,
        }
    }

    /// Semantic category, recomputed from tag and current children.
    /// A node with any non-inline child is never `Inline`.
    pub fn classify(&self, id: NodeId) -> Category {
        let all_inline = self.children(id).iter().all(|&c| self.is_inline(c));
        match self.data(id) {
            NodeData::Text(_) => Category::Inline,
            NodeData::Element(el) if node::is_inline_tag(&el.tag) && all_inline => {
                Category::Inline
            }
            _ if all_inline => Category::Block,
            _ => Category::Container,
        }
    }

    /// Structural equality used when deciding whether two siblings
    /// can merge: same kind, tag, class and style text.
    pub fn are_alike(&self, a: NodeId, b: NodeId) -> bool {
        match (self.data(a), self.data(b)) {
            (NodeData::Text(_), NodeData::Text(_)) => true,
            (NodeData::Element(ea), NodeData::Element(eb)) => {
                ea.tag == eb.tag
                    && ea.class_name() == eb.class_name()
                    && ea.css_text() == eb.css_text()
            }
            _ => false,
        }
    }

    /// Tag + attribute match for format descriptors. `tag` of `*`
    /// matches any element; an expected value of `*` requires the
    /// attribute to be present and non-empty.
    pub fn has_tag_attributes(&self, id: NodeId, tag: &str, attrs: &[(String, String)]) -> bool {
        let Some(el) = self.element(id) else {
            return false;
        };
        if tag != "*" && el.tag != tag {
            return false;
        }
        attrs.iter().all(|(name, wanted)| {
            let actual = el.attribute(name);
            if wanted == "*" {
                actual.is_some_and(|v| !v.is_empty())
            } else {
                actual == Some(wanted.as_str())
            }
        })
    }

    /// Nearest ancestor-or-self matching a tag + attribute pattern.
    pub fn get_nearest(&self, id: NodeId, tag: &str, attrs: &[(String, String)]) -> Option<NodeId> {
        let mut cur = Some(id);
        while let Some(n) = cur {
            if self.has_tag_attributes(n, tag, attrs) {
                return Some(n);
            }
            cur = self.parent(n);
        }
        None
    }
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_tree() -> (DomTree, NodeId, NodeId, NodeId) {
        // <body><div>Hello <em>World</em></div></body>
        let mut tree = DomTree::new();
        let div = tree.create_element("DIV");
        let text = tree.create_text("Hello ");
        let em = tree.create_element("EM");
        let world = tree.create_text("World");
        tree.append(em, world);
        tree.append(div, text);
        tree.append(div, em);
        let root = tree.root();
        tree.append(root, div);
        (tree, div, text, em)
    }

    #[test]
    fn classification_is_structural() {
        let (mut tree, div, text, em) = sample_tree();
        assert_eq!(tree.classify(text), Category::Inline);
        assert_eq!(tree.classify(em), Category::Inline);
        assert_eq!(tree.classify(div), Category::Block);

        // Nesting a block inside the div turns it into a container,
        // with no caching to invalidate.
        let inner = tree.create_element("DIV");
        tree.append(div, inner);
        assert_eq!(tree.classify(div), Category::Container);

        // And an inline tag with a block child is no longer inline.
        tree.append(em, inner);
        assert_ne!(tree.classify(em), Category::Inline);
    }

    #[test]
    fn fragment_insertion_splices_children() {
        let (mut tree, div, text, em) = sample_tree();
        let frag = tree.create_fragment();
        let a = tree.create_text("a");
        let b = tree.create_text("b");
        tree.append(frag, a);
        tree.append(frag, b);
        tree.insert_before(div, frag, Some(em));
        assert_eq!(tree.children(div), &[text, a, b, em]);
        assert_eq!(tree.parent(a), Some(div));
        assert!(tree.children(frag).is_empty());
    }

    #[test]
    fn split_text_keeps_order_and_data() {
        let (mut tree, div, text, em) = sample_tree();
        let after = tree.split_text(text, 5);
        assert_eq!(tree.text(text), Some("Hello"));
        assert_eq!(tree.text(after), Some(" "));
        assert_eq!(tree.children(div), &[text, after, em]);
    }

    #[test]
    fn empty_moves_children_to_fragment() {
        let (mut tree, div, text, em) = sample_tree();
        let frag = tree.empty(div);
        assert!(tree.children(div).is_empty());
        assert_eq!(tree.children(frag), &[text, em]);
        assert_eq!(tree.parent(text), Some(frag));
    }

    #[test]
    fn detach_then_reattach_transfers_ownership() {
        let (mut tree, div, _text, em) = sample_tree();
        tree.detach(em);
        assert_eq!(tree.parent(em), None);
        assert!(!tree.is_attached(em));
        let root = tree.root();
        tree.append(root, em);
        assert!(tree.is_attached(em));
        assert_eq!(tree.children(div).len(), 1);
    }

    #[test]
    fn wildcard_attribute_needs_non_empty_value() {
        let mut tree = DomTree::new();
        let a = tree.create_element_with_attrs("A", &[("href", "http://x")]);
        let bare = tree.create_element_with_attrs("A", &[("href", "")]);
        let attrs = vec![("href".to_string(), "*".to_string())];
        assert!(tree.has_tag_attributes(a, "A", &attrs));
        assert!(!tree.has_tag_attributes(bare, "A", &attrs));
        assert!(tree.has_tag_attributes(a, "*", &[]));
    }

    #[test]
    fn revision_advances_on_mutation_only() {
        let (mut tree, div, _, _) = sample_tree();
        let before = tree.revision();
        let _ = tree.children(div);
        let _ = tree.classify(div);
        assert_eq!(tree.revision(), before);
        let t = tree.create_text("x");
        tree.append(div, t);
        assert!(tree.revision() > before);
    }
}
