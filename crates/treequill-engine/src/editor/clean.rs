//! Markup sanitation.
//!
//! Everything that enters the document (initial markup, pasted or
//! inserted fragments) passes through here: unknown block tags are
//! unwrapped, collapsible whitespace is trimmed at block edges, bare
//! line-break BRs become block splits and URL-looking text gets
//! wrapped in anchors.

use std::sync::LazyLock;

use regex::Regex;

use crate::dom::fix::fix_container;
use crate::dom::node::{self, ZWS};
use crate::dom::surgery::{split, SplitPoint};
use crate::dom::tree::{DomTree, NodeId};
use crate::dom::walker::{NodeTest, TreeWalker};
use crate::dom::DomContext;

use super::Editor;

/// Recursively normalize the children of `node`.
///
/// With `allow_styles` false, `style` attributes are stripped from
/// every element (used for pasted content).
pub(crate) fn clean_tree(tree: &mut DomTree, ctx: DomContext, node: NodeId, allow_styles: bool) {
    let mut i = 0;
    while i < tree.children(node).len() {
        let child = tree.children(node)[i];
        if tree.is_element(child) {
            let had_children = tree.first_child(child).is_some();
            let mut child = child;
            if ctx.config.semantic_markup {
                child = rewrite_presentational(tree, child);
            }
            let keep = tree
                .tag(child)
                .is_some_and(|t| node::is_allowed_block_tag(t))
                || tree.is_inline(child);
            if !keep {
                // Unknown block-level tag: splice its contents in and
                // re-examine them at the same index.
                let contents = tree.empty(child);
                tree.replace_with(child, contents);
                continue;
            }
            if !allow_styles {
                tree.remove_attribute(child, "style");
            }
            if had_children {
                clean_tree(tree, ctx, child, allow_styles);
            }
            i += 1;
        } else if tree.is_text(child) {
            let data = tree.text(child).unwrap_or_default().to_string();
            if node::not_ws(&data) {
                if tree.is_inline(node) {
                    i += 1;
                    continue;
                }
                let mut trimmed = data.as_str();
                let at_block_start = i == 0 || !tree.is_inline(tree.children(node)[i - 1]);
                if at_block_start {
                    trimmed = trimmed.trim_start_matches(is_collapsible);
                }
                let at_block_end = i + 1 == tree.children(node).len()
                    || !tree.is_inline(tree.children(node)[i + 1]);
                if at_block_end {
                    trimmed = trimmed.trim_end_matches(is_collapsible);
                }
                if trimmed.is_empty() {
                    tree.detach(child);
                    continue;
                }
                if trimmed != data {
                    let trimmed = trimmed.to_string();
                    tree.set_text(child, trimmed);
                }
                i += 1;
            } else {
                // Whitespace-only text is only significant between two
                // inline siblings, where it collapses to one space.
                let between_inline = i > 0
                    && i + 1 < tree.children(node).len()
                    && tree.is_inline(tree.children(node)[i - 1])
                    && tree.is_inline(tree.children(node)[i + 1]);
                if between_inline {
                    tree.set_text(child, " ");
                    i += 1;
                } else {
                    tree.detach(child);
                }
            }
        } else {
            tree.detach(child);
        }
    }
}

fn is_collapsible(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}

/// Replace B/I and styled SPANs with their semantic equivalents.
/// Returns the node now occupying the original's position.
fn rewrite_presentational(tree: &mut DomTree, node: NodeId) -> NodeId {
    let tag = match tree.tag(node) {
        Some(t) => t.to_string(),
        None => return node,
    };
    match tag.as_str() {
        "B" => replace_with_tag(tree, node, "STRONG"),
        "I" => replace_with_tag(tree, node, "EM"),
        "SPAN" => {
            let style = tree
                .element(node)
                .map(|el| el.css_text().to_string())
                .unwrap_or_default();
            let tags = semantic_tags_for_style(&style);
            if tags.is_empty() {
                return node;
            }
            let top = tree.create_element(tags[0]);
            let mut bottom = top;
            for tag in &tags[1..] {
                let next = tree.create_element(tag);
                tree.append(bottom, next);
                bottom = next;
            }
            let contents = tree.empty(node);
            tree.append(bottom, contents);
            tree.replace_with(node, top);
            bottom
        }
        _ => node,
    }
}

fn replace_with_tag(tree: &mut DomTree, node: NodeId, tag: &str) -> NodeId {
    let el = tree.create_element(tag);
    let contents = tree.empty(node);
    tree.append(el, contents);
    tree.replace_with(node, el);
    el
}

fn semantic_tags_for_style(style: &str) -> Vec<&'static str> {
    let mut tags = Vec::new();
    for decl in style.split(';') {
        let mut parts = decl.splitn(2, ':');
        let (Some(prop), Some(value)) = (parts.next(), parts.next()) else {
            continue;
        };
        let prop = prop.trim().to_ascii_lowercase();
        let value = value.trim().to_ascii_lowercase();
        match prop.as_str() {
            "font-weight" => {
                let bold =
                    value.starts_with("bold") || value.parse::<u32>().is_ok_and(|w| w >= 600);
                if bold {
                    tags.push("STRONG");
                }
            }
            "font-style" if value == "italic" => tags.push("EM"),
            "text-decoration" if value.contains("underline") => tags.push("U"),
            _ => {}
        }
    }
    tags
}

/// A BR breaks a line if renderable content follows it within its
/// block; otherwise it only props an empty line open.
pub(crate) fn is_line_break(tree: &DomTree, br: NodeId) -> bool {
    let Some(parent) = tree.parent(br) else {
        return false;
    };
    let mut block = parent;
    while tree.is_inline(block) {
        match tree.parent(block) {
            Some(p) => block = p,
            None => break,
        }
    }
    let mut walker = TreeWalker::new(block, NodeTest::NotWsTextOrBreak);
    walker.current = br;
    walker.next_node(tree).is_some()
}

/// Rewrite BR-based line structure into proper blocks: a BR that
/// breaks a line inside a default block splits the block, one that
/// only ends a line is dropped. BRs inside headings and other
/// non-default blocks stay.
pub(crate) fn cleanup_brs(tree: &mut DomTree, ctx: DomContext, node: NodeId) {
    let brs = tree.elements_by_tag(node, "BR");
    let breaks: Vec<bool> = brs.iter().map(|&br| is_line_break(tree, br)).collect();
    let default_tag = ctx.config.block_tag.to_ascii_uppercase();

    for (idx, &br) in brs.iter().enumerate().rev() {
        let Some(parent) = tree.parent(br) else {
            continue;
        };
        if !breaks[idx] {
            tree.detach(br);
            continue;
        }
        let mut block = parent;
        while tree.is_inline(block) {
            match tree.parent(block) {
                Some(p) => block = p,
                None => break,
            }
        }
        if !tree.is_block(block) {
            fix_container(tree, ctx, block);
        } else if tree.has_tag(block, &default_tag) {
            if let Some(stop) = tree.parent(block) {
                split(tree, ctx, parent, SplitPoint::Node(br), stop);
            }
            tree.detach(br);
        }
    }
}

static LINK_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)\b(",
        r"(?:(?:ht|f)tps?://|www\d{0,3}\.|[a-z0-9][a-z0-9.\-]*\.[a-z]{2,}/)",
        r"[^\s<>]+",
        r"[^\s<>!.,;:'\x22?()\[\]{}]",
        r")|([\w\-.%+]+@(?:[\w\-]+\.)+[a-z]{2,})\b",
    ))
    .expect("link pattern compiles")
});

/// Wrap bare URLs and email addresses found in text (outside existing
/// anchors) in A elements.
pub(crate) fn add_links(tree: &mut DomTree, scope: NodeId) {
    let mut texts = Vec::new();
    let mut walker = TreeWalker::new(scope, NodeTest::TextOutsideAnchor);
    while let Some(n) = walker.next_node(tree) {
        texts.push(n);
    }

    for node in texts {
        loop {
            let data = match tree.text(node) {
                Some(t) => t.to_string(),
                None => break,
            };
            let Some(captures) = LINK_PATTERN.captures(&data) else {
                break;
            };
            let whole = captures.get(0).unwrap();
            let parent = match tree.parent(node) {
                Some(p) => p,
                None => break,
            };

            if whole.start() > 0 {
                let leading = tree.create_text(&data[..whole.start()]);
                tree.insert_before(parent, leading, Some(node));
            }
            let href = if let Some(url) = captures.get(1) {
                let url = url.as_str();
                let lower = url.to_ascii_lowercase();
                if lower.starts_with("http:")
                    || lower.starts_with("https:")
                    || lower.starts_with("ftp:")
                    || lower.starts_with("ftps:")
                {
                    url.to_string()
                } else {
                    format!("http://{}", url)
                }
            } else {
                format!("mailto:{}", &captures[2])
            };
            let anchor = tree.create_element_with_attrs("A", &[("href", &href)]);
            let link_text = tree.create_text(whole.as_str());
            tree.append(anchor, link_text);
            tree.insert_before(parent, anchor, Some(node));

            let tail = data[whole.end()..].to_string();
            tree.set_text(node, tail);
        }
    }
}

/// Remove the zero-width spaces left behind by cursor fixing, pruning
/// any inline wrappers emptied in the process.
pub(crate) fn remove_zws(tree: &mut DomTree, scope: NodeId) {
    let mut texts = Vec::new();
    let mut walker = TreeWalker::new(scope, NodeTest::AnyText);
    while let Some(n) = walker.next_node(tree) {
        texts.push(n);
    }

    for node in texts {
        while let Some(pos) = tree
            .text(node)
            .and_then(|t| t.chars().position(|c| c == ZWS))
        {
            if tree.len_of(node) == 1 {
                let mut target = node;
                while let Some(parent) = tree.parent(target) {
                    tree.detach(target);
                    if !tree.is_inline(parent) || tree.first_child(parent).is_some() {
                        break;
                    }
                    target = parent;
                }
                break;
            }
            tree.delete_text_char(node, pos);
        }
    }
}

/// Remove inline elements and text nodes that render nothing.
pub(crate) fn remove_empty_inlines(tree: &mut DomTree, node: NodeId) {
    let children = tree.children(node).to_vec();
    for child in children.into_iter().rev() {
        if tree.is_element(child) && !tree.is_leaf(child) {
            remove_empty_inlines(tree, child);
            if tree.is_inline(child) && tree.first_child(child).is_none() {
                tree.detach(child);
            }
        } else if tree.is_text(child) && tree.len_of(child) == 0 {
            tree.detach(child);
        }
    }
}

impl Editor {
    /// Sweep stale zero-width spaces out of the document, if any were
    /// added since the last sweep.
    pub(crate) fn sweep_zws(&mut self) {
        if self.tree.zws_dirty() {
            let root = self.tree.root();
            remove_zws(&mut self.tree, root);
            self.tree.clear_zws_flag();
        }
    }
}
