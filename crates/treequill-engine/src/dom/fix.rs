//! Cursor and container repair.
//!
//! Rendering hosts cannot place a caret in an empty block or, on some
//! hosts, an empty inline element. `fix_cursor` patches a single node
//! so a caret can land in it; `fix_container` restores the invariant
//! that a container's children are all blocks or containers, wrapping
//! loose inline runs in default blocks.

use crate::dom::node::ZWS;
use crate::dom::tree::{DomTree, NodeId};
use crate::dom::DomContext;

/// Build an implicit block from the configured tag and attributes,
/// adopt `children`, and make it focusable.
pub fn create_default_block(tree: &mut DomTree, ctx: DomContext, children: Vec<NodeId>) -> NodeId {
    let attrs: Vec<(&str, &str)> = ctx
        .config
        .block_attributes
        .iter()
        .map(|(n, v)| (n.as_str(), v.as_str()))
        .collect();
    let block = tree.create_element_with_attrs(&ctx.config.block_tag, &attrs);
    for child in children {
        tree.append(block, child);
    }
    fix_cursor(tree, ctx, block);
    block
}

/// Ensure a caret can be placed in `node`. Empty blocks get a BR,
/// empty inline elements an empty (or zero-width space) text child,
/// an empty root a whole default block. Returns `node` itself.
pub fn fix_cursor(tree: &mut DomTree, ctx: DomContext, node: NodeId) -> NodeId {
    let given = node;
    let mut node = node;
    let mut fixer: Option<NodeId> = None;

    if node == tree.root() {
        let child = tree.first_child(node);
        if child.is_none() || child.is_some_and(|c| tree.has_tag(c, "BR")) {
            let block = create_default_block(tree, ctx, Vec::new());
            match child {
                Some(c) => tree.replace_with(c, block),
                None => tree.append(node, block),
            }
            node = block;
        }
    }

    if tree.is_text(node) {
        return given;
    }

    if tree.is_inline(node) {
        let mut child = tree.first_child(node);
        if ctx.caps.cant_focus_empty_text_nodes {
            while let Some(c) = child {
                if tree.text(c).is_some_and(str::is_empty) {
                    tree.detach(c);
                    child = tree.first_child(node);
                } else {
                    break;
                }
            }
        }
        if child.is_none() {
            fixer = Some(if ctx.caps.cant_focus_empty_text_nodes {
                let t = tree.create_text(ZWS.to_string());
                tree.note_zws_added();
                t
            } else {
                tree.create_text("")
            });
        }
    } else if ctx.caps.use_text_fixer {
        loop {
            if tree.is_text(node) || tree.is_leaf(node) {
                break;
            }
            match tree.first_child(node) {
                Some(c) => node = c,
                None => {
                    fixer = Some(tree.create_text(""));
                    break;
                }
            }
        }
        if tree.is_text(node) {
            // A block holding only spaces renders collapsed; holding
            // no data at all it does not.
            if tree
                .text(node)
                .is_some_and(|t| !t.is_empty() && t.chars().all(|c| c == ' '))
            {
                tree.set_text(node, "");
            }
        } else if tree.is_leaf(node) {
            if let Some(parent) = tree.parent(node) {
                let t = tree.create_text("");
                tree.insert_before(parent, t, Some(node));
            }
        }
    } else if !tree.has_descendant(node, |t, n| t.has_tag(n, "BR")) {
        while let Some(child) = tree.last_element_child(node) {
            if tree.is_inline(child) {
                break;
            }
            node = child;
        }
        if tree.first_child(node).is_none() || tree.text_content(node).is_empty() {
            fixer = Some(tree.create_element("BR"));
        }
    }

    if let Some(fixer) = fixer {
        tree.append(node, fixer);
    }
    given
}

pub(crate) fn create_wrapper(tree: &mut DomTree, ctx: DomContext) -> NodeId {
    let attrs: Vec<(&str, &str)> = ctx
        .config
        .block_attributes
        .iter()
        .map(|(n, v)| (n.as_str(), v.as_str()))
        .collect();
    tree.create_element_with_attrs(&ctx.config.block_tag, &attrs)
}

/// Wrap loose inline runs in default blocks, turn bare BRs into empty
/// blocks, and recurse into nested containers.
pub fn fix_container(tree: &mut DomTree, ctx: DomContext, container: NodeId) {
    let mut wrapper: Option<NodeId> = None;
    let mut i = 0;
    while i < tree.children(container).len() {
        let child = tree.children(container)[i];
        let is_br = tree.has_tag(child, "BR");
        if !is_br && tree.is_inline(child) {
            let w = match wrapper {
                Some(w) => w,
                None => {
                    let w = create_wrapper(tree, ctx);
                    wrapper = Some(w);
                    w
                }
            };
            tree.append(w, child);
            continue;
        }
        if is_br || wrapper.is_some() {
            let w = match wrapper.take() {
                Some(w) => w,
                None => create_wrapper(tree, ctx),
            };
            fix_cursor(tree, ctx, w);
            if is_br {
                tree.replace_with(child, w);
            } else {
                tree.insert_at(container, i, w);
                i += 1;
            }
        }
        if tree.is_container(child) {
            fix_container(tree, ctx, child);
        }
        i += 1;
    }
    if let Some(w) = wrapper {
        fix_cursor(tree, ctx, w);
        tree.append(container, w);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Capabilities, EditorConfig};
    use pretty_assertions::assert_eq;

    fn ctx_parts() -> (EditorConfig, Capabilities) {
        (EditorConfig::default(), Capabilities::default())
    }

    #[test]
    fn empty_block_gets_a_line_break() {
        let (config, caps) = ctx_parts();
        let ctx = DomContext {
            config: &config,
            caps: &caps,
        };
        let mut tree = DomTree::new();
        let div = tree.create_element("DIV");
        let root = tree.root();
        tree.append(root, div);
        fix_cursor(&mut tree, ctx, div);
        let br = tree.first_child(div).unwrap();
        assert!(tree.has_tag(br, "BR"));

        // Already focusable, second pass adds nothing.
        fix_cursor(&mut tree, ctx, div);
        assert_eq!(tree.children(div).len(), 1);
    }

    #[test]
    fn filled_block_is_left_alone() {
        let (config, caps) = ctx_parts();
        let ctx = DomContext {
            config: &config,
            caps: &caps,
        };
        let mut tree = DomTree::new();
        let div = tree.create_element("DIV");
        let text = tree.create_text("Hello");
        tree.append(div, text);
        let root = tree.root();
        tree.append(root, div);
        fix_cursor(&mut tree, ctx, div);
        assert_eq!(tree.children(div), &[text]);
    }

    #[test]
    fn empty_inline_gets_zws_only_when_host_needs_it() {
        let (config, mut caps) = ctx_parts();
        let mut tree = DomTree::new();
        let em = tree.create_element("EM");
        let root = tree.root();
        tree.append(root, em);
        {
            let ctx = DomContext {
                config: &config,
                caps: &caps,
            };
            fix_cursor(&mut tree, ctx, em);
        }
        let child = tree.first_child(em).unwrap();
        assert_eq!(tree.text(child), Some(""));

        caps.cant_focus_empty_text_nodes = true;
        let ctx = DomContext {
            config: &config,
            caps: &caps,
        };
        // The empty text child is stripped and replaced with a
        // zero-width space.
        fix_cursor(&mut tree, ctx, em);
        let child = tree.first_child(em).unwrap();
        assert_eq!(tree.text(child), Some("\u{200B}"));
        assert!(tree.zws_dirty());
    }

    #[test]
    fn whitespace_only_text_collapses_under_the_text_fixer() {
        let (config, mut caps) = ctx_parts();
        caps.use_text_fixer = true;
        let ctx = DomContext {
            config: &config,
            caps: &caps,
        };
        // A block holding only spaces renders as a collapsed line.
        let mut tree = DomTree::new();
        let div = tree.create_element("DIV");
        let text = tree.create_text("   ");
        tree.append(div, text);
        let root = tree.root();
        tree.append(root, div);
        fix_cursor(&mut tree, ctx, div);
        assert_eq!(tree.text(text), Some(""));
    }

    #[test]
    fn empty_root_grows_a_default_block() {
        let (config, caps) = ctx_parts();
        let ctx = DomContext {
            config: &config,
            caps: &caps,
        };
        let mut tree = DomTree::new();
        let root = tree.root();
        fix_cursor(&mut tree, ctx, root);
        let block = tree.first_child(root).unwrap();
        assert!(tree.has_tag(block, "DIV"));
        assert!(tree.has_tag(tree.first_child(block).unwrap(), "BR"));
    }

    #[test]
    fn loose_inline_run_is_wrapped() {
        let (config, caps) = ctx_parts();
        let ctx = DomContext {
            config: &config,
            caps: &caps,
        };
        // <body>Hello <em>World</em><div>block</div>tail</body>
        let mut tree = DomTree::new();
        let root = tree.root();
        let hello = tree.create_text("Hello ");
        let em = tree.create_element("EM");
        let world = tree.create_text("World");
        tree.append(em, world);
        let div = tree.create_element("DIV");
        let b = tree.create_text("block");
        tree.append(div, b);
        let tail = tree.create_text("tail");
        tree.append(root, hello);
        tree.append(root, em);
        tree.append(root, div);
        tree.append(root, tail);

        fix_container(&mut tree, ctx, root);

        let kids = tree.children(root).to_vec();
        assert_eq!(kids.len(), 3);
        assert!(tree.has_tag(kids[0], "DIV"));
        assert_eq!(tree.children(kids[0]), &[hello, em]);
        assert_eq!(kids[1], div);
        assert!(tree.has_tag(kids[2], "DIV"));
        assert_eq!(tree.first_child(kids[2]), Some(tail));
    }

    #[test]
    fn bare_br_becomes_an_empty_block() {
        let (config, caps) = ctx_parts();
        let ctx = DomContext {
            config: &config,
            caps: &caps,
        };
        let mut tree = DomTree::new();
        let root = tree.root();
        let br = tree.create_element("BR");
        tree.append(root, br);
        fix_container(&mut tree, ctx, root);
        let kids = tree.children(root).to_vec();
        assert_eq!(kids.len(), 1);
        assert!(tree.has_tag(kids[0], "DIV"));
        assert!(!tree.is_attached(br));
    }
}
