//! Inline formatting: querying, adding and removing tag-based formats
//! over a range.

use crate::dom::fix::fix_cursor;
use crate::dom::node::ZWS;
use crate::dom::surgery::merge_inlines;
use crate::dom::tree::{DomTree, NodeId};
use crate::dom::walker::{NodeTest, TreeWalker};
use crate::dom::DomContext;
use crate::range::edit::insert_node_in_range;
use crate::range::Range;

use super::Editor;

/// An inline format, identified by a tag and the attributes that must
/// be present on it (an `A` with a given `href`, say).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatDescriptor {
    tag: String,
    attributes: Vec<(String, String)>,
}

impl FormatDescriptor {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_uppercase(),
            attributes: Vec::new(),
        }
    }

    pub fn with_attributes(tag: &str, attributes: &[(&str, &str)]) -> Self {
        Self {
            tag: tag.to_ascii_uppercase(),
            attributes: attributes
                .iter()
                .map(|&(n, v)| (n.to_ascii_lowercase(), v.to_string()))
                .collect(),
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }
}

impl Editor {
    /// True when every piece of text in the range (or the current
    /// selection) sits inside an element matching the descriptor.
    pub fn has_format(&self, descriptor: &FormatDescriptor, range: Option<Range>) -> bool {
        let mut range = range.unwrap_or_else(|| self.selection());
        range.move_boundaries_down(&self.tree);

        let common = range.common_ancestor(&self.tree);
        if self
            .tree
            .get_nearest(common, &descriptor.tag, &descriptor.attributes)
            .is_some()
        {
            return true;
        }
        if self.tree.is_text(common) {
            return false;
        }

        let mut walker = TreeWalker::new(common, NodeTest::InRange(range));
        let mut seen_text = false;
        while let Some(node) = walker.next_node(&self.tree) {
            if !self.tree.is_text(node) {
                continue;
            }
            if self
                .tree
                .get_nearest(node, &descriptor.tag, &descriptor.attributes)
                .is_none()
            {
                return false;
            }
            seen_text = true;
        }
        seen_text
    }

    fn create_format_element(&mut self, descriptor: &FormatDescriptor) -> NodeId {
        let attrs: Vec<(&str, &str)> = descriptor
            .attributes
            .iter()
            .map(|(n, v)| (n.as_str(), v.as_str()))
            .collect();
        self.tree.create_element_with_attrs(&descriptor.tag, &attrs)
    }

    /// Wrap the range's text in elements matching the descriptor,
    /// splitting edge text nodes so only the selected part is wrapped.
    pub(crate) fn add_format(&mut self, descriptor: &FormatDescriptor, range: &mut Range) {
        if range.collapsed() {
            let el = self.create_format_element(descriptor);
            let ctx = DomContext {
                config: &self.config,
                caps: &self.caps,
            };
            fix_cursor(&mut self.tree, ctx, el);
            insert_node_in_range(&mut self.tree, range, el);
            let caret = self.tree.first_child(el).unwrap_or(el);
            range.set_start(caret, self.tree.len_of(caret));
            range.collapse(true);
            return;
        }

        let common = range.common_ancestor(&self.tree);
        let mut walker = TreeWalker::new(common, NodeTest::InRange(*range));
        let (mut sc, mut so) = (range.start.container, range.start.offset);
        let (mut ec, mut eo) = (range.end.container, range.end.offset);

        walker.current = sc;
        let mut node = if self.tree.is_text(sc) && walker.accepts(&self.tree, sc) {
            Some(sc)
        } else {
            so = 0;
            self.next_text_node(&mut walker)
        };

        while let Some(mut textnode) = node {
            let needs_format = self
                .tree
                .get_nearest(textnode, &descriptor.tag, &descriptor.attributes)
                .is_none();
            if needs_format {
                if textnode == ec && self.tree.len_of(textnode) > eo {
                    self.tree.split_text(textnode, eo);
                }
                if textnode == sc && so > 0 {
                    let parent = self.tree.parent(textnode);
                    let tail = self.tree.split_text(textnode, so);
                    if ec == sc {
                        ec = tail;
                        eo -= so;
                    } else if parent == Some(ec) {
                        eo += 1;
                    }
                    sc = tail;
                    so = 0;
                    textnode = tail;
                }
                let el = self.create_format_element(descriptor);
                self.tree.replace_with(textnode, el);
                self.tree.append(el, textnode);
                walker.current = textnode;
            }
            node = self.next_text_node(&mut walker);
        }

        range.set_start(sc, so);
        range.set_end(ec, eo);
    }

    fn next_text_node(&self, walker: &mut TreeWalker) -> Option<NodeId> {
        loop {
            match walker.next_node(&self.tree) {
                Some(n) if self.tree.is_text(n) => return Some(n),
                Some(_) => continue,
                None => return None,
            }
        }
    }

    /// Strip matching format elements from the range. With `partial`
    /// true, elements only partly covered by the range lose the format
    /// entirely; otherwise the uncovered parts are re-wrapped.
    pub(crate) fn remove_format(
        &mut self,
        descriptor: &FormatDescriptor,
        range: &mut Range,
        partial: bool,
    ) {
        self.save_range_to_bookmark(range);

        // A collapsed range needs a text node to hang on to while the
        // formatting elements around it are rebuilt.
        let mut fixer = None;
        if range.collapsed() {
            let text = if self.caps.cant_focus_empty_text_nodes {
                self.tree.note_zws_added();
                self.tree.create_text(ZWS.to_string())
            } else {
                self.tree.create_text("")
            };
            insert_node_in_range(&mut self.tree, range, text);
            fixer = Some(text);
        }

        let mut root = range.common_ancestor(&self.tree);
        while self.tree.is_inline(root) {
            match self.tree.parent(root) {
                Some(p) => root = p,
                None => break,
            }
        }

        let snapshot = *range;
        let format_tags: Vec<NodeId> = self
            .tree
            .elements_by_tag(root, &descriptor.tag)
            .into_iter()
            .filter(|&el| {
                snapshot.contains_node(&self.tree, el, true)
                    && self
                        .tree
                        .has_tag_attributes(el, &descriptor.tag, &descriptor.attributes)
            })
            .collect();

        if !partial {
            let mut to_wrap = Vec::new();
            for &el in &format_tags {
                examine_node(&mut self.tree, &snapshot, el, el, &mut to_wrap);
            }
            for (exemplar, node) in to_wrap {
                let el = self.tree.clone_shallow(exemplar);
                self.tree.replace_with(node, el);
                self.tree.append(el, node);
            }
        }

        for el in format_tags {
            let contents = self.tree.empty(el);
            self.tree.replace_with(el, contents);
        }

        if let Some(r) = self.range_and_remove_bookmark() {
            *range = r;
        }
        if fixer.is_some() {
            range.collapse(false);
        }
        merge_inlines(&mut self.tree, root, range);
    }

    /// Remove then add a format over the range (or the selection) and
    /// reselect the result.
    pub fn change_format(
        &mut self,
        add: Option<&FormatDescriptor>,
        remove: Option<&FormatDescriptor>,
        range: Option<Range>,
        partial: bool,
    ) {
        let mut range = range.unwrap_or_else(|| self.selection());
        self.checkpoint(&mut range);
        if let Some(descriptor) = remove {
            self.remove_format(descriptor, &mut range, partial);
        }
        if let Some(descriptor) = add {
            self.add_format(descriptor, &mut range);
        }
        self.set_selection(range);
        self.note_change();
    }

    pub fn bold(&mut self) {
        self.change_format(Some(&FormatDescriptor::new("B")), None, None, false);
    }

    pub fn remove_bold(&mut self) {
        self.change_format(None, Some(&FormatDescriptor::new("B")), None, false);
    }

    pub fn italic(&mut self) {
        self.change_format(Some(&FormatDescriptor::new("I")), None, None, false);
    }

    pub fn remove_italic(&mut self) {
        self.change_format(None, Some(&FormatDescriptor::new("I")), None, false);
    }

    pub fn underline(&mut self) {
        self.change_format(Some(&FormatDescriptor::new("U")), None, None, false);
    }

    pub fn remove_underline(&mut self) {
        self.change_format(None, Some(&FormatDescriptor::new("U")), None, false);
    }

    /// Wrap the selection in a link. A collapsed selection gets the
    /// URL itself (minus the protocol) inserted as the link text.
    pub fn make_link(&mut self, url: &str) {
        let mut range = self.selection();
        if range.collapsed() {
            let display = match url.find(':') {
                Some(i) => url[i + 1..].trim_start_matches('/'),
                None => url,
            };
            let text = self.tree.create_text(display);
            insert_node_in_range(&mut self.tree, &mut range, text);
        }
        self.change_format(
            Some(&FormatDescriptor::with_attributes("A", &[("href", url)])),
            Some(&FormatDescriptor::new("A")),
            Some(range),
            false,
        );
    }

    pub fn remove_link(&mut self) {
        self.change_format(None, Some(&FormatDescriptor::new("A")), None, true);
    }
}

/// Collect, into `to_wrap`, the parts of a matched format element's
/// subtree that fall outside the range and must keep the format.
fn examine_node(
    tree: &mut DomTree,
    range: &Range,
    node: NodeId,
    exemplar: NodeId,
    to_wrap: &mut Vec<(NodeId, NodeId)>,
) {
    if range.contains_node(tree, node, false) {
        return;
    }
    let is_text = tree.is_text(node);
    if !range.contains_node(tree, node, true) {
        // Completely outside the range.
        let keep = !tree.has_tag(node, "INPUT") && (!is_text || tree.len_of(node) > 0);
        if keep {
            to_wrap.push((exemplar, node));
        }
        return;
    }
    if is_text {
        if node == range.end.container && range.end.offset != tree.len_of(node) {
            let tail = tree.split_text(node, range.end.offset);
            to_wrap.push((exemplar, tail));
        }
        if node == range.start.container && range.start.offset > 0 {
            tree.split_text(node, range.start.offset);
            to_wrap.push((exemplar, node));
        }
    } else {
        for child in tree.children(node).to_vec() {
            examine_node(tree, range, child, exemplar, to_wrap);
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

    #[test]
    fn bold_wraps_only_the_selected_text() {
        let mut ed = editor_with("<div>hello</div>");
        let root = ed.tree.root();
        let block = ed.tree.first_child(root).unwrap();
        let text = ed.tree.first_child(block).unwrap();
        ed.set_selection(Range::new(Boundary::new(text, 1), Boundary::new(text, 3)));

        ed.bold();
        assert_eq!(ed.get_html(), "<div>h<b>el</b>lo</div>");
        assert!(ed.has_format(&FormatDescriptor::new("B"), None));
    }

    #[test]
    fn has_format_is_false_when_only_part_is_formatted() {
        let mut ed = editor_with("<div><b>ab</b>cd</div>");
        let root = ed.tree.root();
        let block = ed.tree.first_child(root).unwrap();
        let b = ed.tree.first_child(block).unwrap();
        let bold_text = ed.tree.first_child(b).unwrap();
        let plain_text = ed.tree.last_child(block).unwrap();

        let inside = Range::new(Boundary::new(bold_text, 0), Boundary::new(bold_text, 2));
        assert!(ed.has_format(&FormatDescriptor::new("B"), Some(inside)));

        let across = Range::new(Boundary::new(bold_text, 0), Boundary::new(plain_text, 2));
        assert!(!ed.has_format(&FormatDescriptor::new("B"), Some(across)));
    }

    #[test]
    fn removing_a_format_keeps_it_on_the_uncovered_part() {
        let mut ed = editor_with("<div><b>hello</b></div>");
        let root = ed.tree.root();
        let block = ed.tree.first_child(root).unwrap();
        let b = ed.tree.first_child(block).unwrap();
        let text = ed.tree.first_child(b).unwrap();
        ed.set_selection(Range::new(Boundary::new(text, 0), Boundary::new(text, 3)));

        ed.remove_bold();
        assert_eq!(ed.get_html(), "<div>hel<b>lo</b></div>");
    }

    #[test]
    fn partial_removal_drops_the_format_entirely() {
        let mut ed = editor_with("<div><a href=\"http://x\">hello</a></div>");
        let root = ed.tree.root();
        let block = ed.tree.first_child(root).unwrap();
        let a = ed.tree.first_child(block).unwrap();
        let text = ed.tree.first_child(a).unwrap();
        ed.set_selection(Range::new(Boundary::new(text, 0), Boundary::new(text, 3)));

        ed.remove_link();
        assert_eq!(ed.get_html(), "<div>hello</div>");
    }

    #[test]
    fn make_link_on_a_caret_inserts_the_url_text() {
        let mut ed = editor_with("<div>see:</div>");
        let root = ed.tree.root();
        let block = ed.tree.first_child(root).unwrap();
        let text = ed.tree.first_child(block).unwrap();
        ed.set_selection(Range::caret(text, 4));

        ed.make_link("https://example.com/");
        assert_eq!(
            ed.get_html(),
            "<div>see:<a href=\"https://example.com/\">example.com/</a></div>"
        );
    }

    #[test]
    fn formats_nest_instead_of_duplicating() {
        let mut ed = editor_with("<div><b>hi</b></div>");
        let root = ed.tree.root();
        let block = ed.tree.first_child(root).unwrap();
        let b = ed.tree.first_child(block).unwrap();
        let text = ed.tree.first_child(b).unwrap();
        ed.set_selection(Range::new(Boundary::new(text, 0), Boundary::new(text, 2)));

        // Already bold: adding bold again is a no-op on the markup.
        ed.bold();
        assert_eq!(ed.get_html(), "<div><b>hi</b></div>");
    }
}
