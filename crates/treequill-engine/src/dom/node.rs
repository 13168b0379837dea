//! Node payloads and tag-level classification tables.
//!
//! Semantic categories (`inline`/`block`/`container`) are computed
//! from the tag name and the current children, never cached: any
//! structural change silently changes the answer, which is exactly
//! what the editing operations rely on.

/// Zero-width space used to keep otherwise-empty inline elements
/// focusable on hosts that cannot place a caret in an empty text
/// node. Always stripped from serialized output.
pub const ZWS: char = '\u{200B}';

/// A single attribute on an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attr {
    pub name: String,
    pub value: String,
}

/// Data specific to element nodes. Tags are stored uppercase,
/// attribute names lowercase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementData {
    pub tag: String,
    pub attrs: Vec<Attr>,
}

impl ElementData {
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    pub fn set_attribute(&mut self, name: &str, value: &str) {
        if let Some(attr) = self.attrs.iter_mut().find(|a| a.name == name) {
            attr.value = value.to_string();
        } else {
            self.attrs.push(Attr {
                name: name.to_string(),
                value: value.to_string(),
            });
        }
    }

    pub fn remove_attribute(&mut self, name: &str) {
        self.attrs.retain(|a| a.name != name);
    }

    /// The `class` attribute, or "" when absent (structural equality
    /// treats the two the same).
    pub fn class_name(&self) -> &str {
        self.attribute("class").unwrap_or("")
    }

    /// The raw `style` attribute text, or "".
    pub fn css_text(&self) -> &str {
        self.attribute("style").unwrap_or("")
    }
}

/// The payload that distinguishes kinds of nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    Element(ElementData),
    Text(String),
    /// A detached extraction result: a parentless ordered list of
    /// children. Appending a fragment elsewhere splices its children,
    /// matching document-fragment semantics.
    Fragment,
}

/// Semantic category of a node. Disjoint, structural, recomputed on
/// demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    /// Text-flow level content: text, emphasis, anchors, media.
    Inline,
    /// A paragraph-like unit: only inline descendants.
    Block,
    /// Holds block or container children: lists, tables, quotes.
    Container,
}

/// Tags that participate in text flow. A node with one of these tags
/// and only inline children is `inline`.
const INLINE_TAGS: &[&str] = &[
    "A", "ABBR", "ACRONYM", "AUDIO", "B", "BDI", "BDO", "BR", "CITE", "CODE", "DATA", "DEL",
    "DFN", "EM", "FONT", "HR", "I", "IMG", "INPUT", "INS", "KBD", "MARK", "Q", "RP", "RT", "RUBY",
    "S", "SAMP", "SMALL", "SPAN", "STRIKE", "STRONG", "SUB", "SUP", "U", "VAR", "VIDEO", "WBR",
];

/// Void/atomic elements that cannot hold meaningful caret content.
const LEAF_TAGS: &[&str] = &[
    "AUDIO", "BR", "BUTTON", "IMG", "INPUT", "SELECT", "TEXTAREA", "VIDEO",
];

/// Block-level tags that survive markup cleaning; anything else
/// non-inline is spliced out.
const ALLOWED_BLOCK_TAGS: &[&str] = &[
    "ADDRESS", "ARTICLE", "ASIDE", "BLOCKQUOTE", "CAPTION", "DD", "DIV", "DL", "DT", "FIGURE",
    "FOOTER", "H1", "H2", "H3", "H4", "H5", "H6", "HEADER", "LABEL", "LEGEND", "LI", "OL",
    "OUTPUT", "P", "PRE", "SECTION", "TABLE", "TBODY", "TD", "TFOOT", "TH", "THEAD", "TR", "UL",
];

/// Elements the serializer writes without a closing tag and the
/// parser never pushes onto the open stack.
const VOID_TAGS: &[&str] = &[
    "AREA", "BASE", "BR", "COL", "EMBED", "HR", "IMG", "INPUT", "LINK", "META", "SOURCE", "TRACK",
    "WBR",
];

pub fn is_inline_tag(tag: &str) -> bool {
    INLINE_TAGS.contains(&tag)
}

pub fn is_leaf_tag(tag: &str) -> bool {
    LEAF_TAGS.contains(&tag)
}

pub fn is_allowed_block_tag(tag: &str) -> bool {
    ALLOWED_BLOCK_TAGS.contains(&tag)
}

pub fn is_void_tag(tag: &str) -> bool {
    VOID_TAGS.contains(&tag)
}

/// True for text nodes and text that is not plain whitespace.
/// Non-breaking space deliberately counts as content.
pub fn not_ws(text: &str) -> bool {
    text.chars().any(|c| !matches!(c, ' ' | '\t' | '\r' | '\n'))
}
