//! HTML parsing and serialization.
//!
//! The parser is deliberately lenient, in the way content pasted from
//! arbitrary sources demands: unknown tags become plain elements,
//! mismatched close tags pop to the nearest matching open element or
//! are dropped, and anything unparseable is kept as text. Structural
//! sanity (allowed tags, block nesting) is not this module's job;
//! `editor::clean` normalizes the parsed fragment afterwards.

use crate::dom::node::is_void_tag;
use crate::dom::tree::{DomTree, NodeId};
use crate::dom::NodeData;

/// Parse an HTML string into a detached fragment.
pub fn parse_fragment(tree: &mut DomTree, html: &str) -> NodeId {
    let frag = tree.create_fragment();
    let mut stack: Vec<NodeId> = vec![frag];
    let mut rest = html;

    while !rest.is_empty() {
        let Some(lt) = rest.find('<') else {
            append_text(tree, *stack.last().unwrap_or(&frag), rest);
            break;
        };
        if lt > 0 {
            append_text(tree, *stack.last().unwrap_or(&frag), &rest[..lt]);
        }
        rest = &rest[lt..];

        if let Some(tail) = rest.strip_prefix("<!--") {
            rest = match tail.find("-->") {
                Some(end) => &tail[end + 3..],
                None => "",
            };
            continue;
        }
        if rest.starts_with("<!") || rest.starts_with("<?") {
            rest = match rest.find('>') {
                Some(end) => &rest[end + 1..],
                None => "",
            };
            continue;
        }
        if let Some(tail) = rest.strip_prefix("</") {
            let Some(end) = tail.find('>') else {
                break;
            };
            let name = tail[..end].trim().to_ascii_uppercase();
            close_element(tree, &mut stack, &name);
            rest = &tail[end + 1..];
            continue;
        }

        let Some(end) = find_tag_end(rest) else {
            // A lone '<' that never closes; keep it as text.
            append_text(tree, *stack.last().unwrap_or(&frag), rest);
            break;
        };
        let raw = &rest[1..end];
        rest = &rest[end + 1..];
        open_element(tree, &mut stack, raw);
    }

    frag
}

/// Find the index of the '>' ending a tag, skipping quoted attribute
/// values.
fn find_tag_end(s: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    for (i, c) in s.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None => match c {
                '"' | '\'' => quote = Some(c),
                '>' => return Some(i),
                _ => {}
            },
        }
    }
    None
}

/// Tags that implicitly close an open element of the same name, the
/// way browsers recover from `<li>a<li>b`.
fn self_terminating(tag: &str) -> bool {
    matches!(tag, "LI" | "DT" | "DD" | "P" | "TR" | "TD" | "TH" | "OPTION")
}

fn open_element(tree: &mut DomTree, stack: &mut Vec<NodeId>, raw: &str) {
    let raw = raw.strip_suffix('/').unwrap_or(raw);
    let raw = raw.trim();
    if raw.is_empty() {
        return;
    }
    let name_end = raw
        .find(|c: char| c.is_whitespace())
        .unwrap_or(raw.len());
    let name = raw[..name_end].to_ascii_uppercase();
    let attrs = parse_attrs(&raw[name_end..]);

    if self_terminating(&name) {
        if let Some(&top) = stack.last() {
            if tree.tag(top) == Some(name.as_str()) {
                stack.pop();
            }
        }
    }

    let attr_refs: Vec<(&str, &str)> = attrs
        .iter()
        .map(|(n, v)| (n.as_str(), v.as_str()))
        .collect();
    let element = tree.create_element_with_attrs(&name, &attr_refs);
    let parent = *stack.last().expect("fragment root never popped");
    tree.append(parent, element);
    if !is_void_tag(&name) {
        stack.push(element);
    }
}

fn close_element(tree: &DomTree, stack: &mut Vec<NodeId>, name: &str) {
    // Skip index 0: the fragment root is not closeable.
    if let Some(at) = stack
        .iter()
        .skip(1)
        .rposition(|&n| tree.tag(n) == Some(name))
    {
        stack.truncate(at + 1);
    }
}

fn parse_attrs(mut s: &str) -> Vec<(String, String)> {
    let mut attrs = Vec::new();
    loop {
        s = s.trim_start();
        if s.is_empty() {
            break;
        }
        let name_end = s
            .find(|c: char| c.is_whitespace() || c == '=')
            .unwrap_or(s.len());
        let name = s[..name_end].to_ascii_lowercase();
        s = s[name_end..].trim_start();
        let value = if let Some(tail) = s.strip_prefix('=') {
            let tail = tail.trim_start();
            if let Some(q) = tail.strip_prefix('"').map(|t| (t, '"')).or_else(|| {
                tail.strip_prefix('\'').map(|t| (t, '\''))
            }) {
                let (inner, quote) = q;
                let end = inner.find(quote).unwrap_or(inner.len());
                s = inner.get(end + 1..).unwrap_or("");
                inner[..end].to_string()
            } else {
                let end = tail
                    .find(|c: char| c.is_whitespace())
                    .unwrap_or(tail.len());
                s = &tail[end..];
                tail[..end].to_string()
            }
        } else {
            String::new()
        };
        if !name.is_empty() {
            attrs.push((
                name,
                html_escape::decode_html_entities(&value).into_owned(),
            ));
        }
    }
    attrs
}

fn append_text(tree: &mut DomTree, parent: NodeId, raw: &str) {
    let decoded = html_escape::decode_html_entities(raw);
    if let Some(last) = tree.last_child(parent).filter(|&n| tree.is_text(n)) {
        tree.append_text_data(last, &decoded);
    } else {
        let text = tree.create_text(decoded.into_owned());
        tree.append(parent, text);
    }
}

/// Serialize the children of `node` (its inner HTML).
pub fn serialize_children(tree: &DomTree, node: NodeId) -> String {
    let mut out = String::new();
    for &child in tree.children(node) {
        write_node(tree, child, &mut out);
    }
    out
}

fn write_node(tree: &DomTree, node: NodeId, out: &mut String) {
    match tree.data(node) {
        NodeData::Text(text) => out.push_str(&html_escape::encode_text(text)),
        NodeData::Element(el) => {
            let tag = el.tag.to_ascii_lowercase();
            out.push('<');
            out.push_str(&tag);
            for attr in &el.attrs {
                out.push(' ');
                out.push_str(&attr.name);
                out.push_str("=\"");
                out.push_str(&html_escape::encode_double_quoted_attribute(&attr.value));
                out.push('"');
            }
            out.push('>');
            if !is_void_tag(&el.tag) {
                for &child in tree.children(node) {
                    write_node(tree, child, out);
                }
                out.push_str("</");
                out.push_str(&tag);
                out.push('>');
            }
        }
        NodeData::Fragment => {
            for &child in tree.children(node) {
                write_node(tree, child, out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn round_trip(html: &str) -> String {
        let mut tree = DomTree::new();
        let frag = parse_fragment(&mut tree, html);
        serialize_children(&tree, frag)
    }

    #[test]
    fn parses_nested_markup() {
        assert_eq!(
            round_trip("<div>Hello <b>World</b></div>"),
            "<div>Hello <b>World</b></div>"
        );
    }

    #[test]
    fn normalizes_tag_and_attribute_case() {
        assert_eq!(
            round_trip("<DIV CLASS=\"x\">a</DIV>"),
            "<div class=\"x\">a</div>"
        );
    }

    #[test]
    fn void_elements_do_not_swallow_content() {
        assert_eq!(round_trip("a<br>b"), "a<br>b");
        assert_eq!(round_trip("<img src='x.png'>tail"), "<img src=\"x.png\">tail");
    }

    #[test]
    fn entities_decode_and_reencode() {
        let mut tree = DomTree::new();
        let frag = parse_fragment(&mut tree, "a &amp; b &lt;c&gt;");
        let text = tree.first_child(frag).unwrap();
        assert_eq!(tree.text(text), Some("a & b <c>"));
        assert_eq!(serialize_children(&tree, frag), "a &amp; b &lt;c&gt;");
    }

    #[test]
    fn stray_close_tags_are_dropped() {
        assert_eq!(round_trip("a</div>b"), "ab");
        assert_eq!(round_trip("<em>a</strong></em>b"), "<em>a</em>b");
    }

    #[test]
    fn unclosed_elements_close_at_end_of_input() {
        assert_eq!(round_trip("<div><em>a"), "<div><em>a</em></div>");
    }

    #[test]
    fn list_items_terminate_each_other() {
        assert_eq!(
            round_trip("<ul><li>a<li>b</ul>"),
            "<ul><li>a</li><li>b</li></ul>"
        );
    }

    #[test]
    fn comments_and_doctypes_vanish() {
        assert_eq!(round_trip("<!-- note -->a<!DOCTYPE html>b"), "ab");
    }
}
