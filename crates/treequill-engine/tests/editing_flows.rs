//! End-to-end flows through the public editor surface.

use pretty_assertions::assert_eq;
use treequill_engine::{Boundary, Capabilities, Editor, EditorConfig, Event, Range};

fn select_all(ed: &mut Editor) {
    let tree = ed.document();
    let root = tree.root();
    let end = tree.children(root).len();
    ed.set_selection(Range::new(Boundary::new(root, 0), Boundary::new(root, end)));
}

fn select_first_text(ed: &mut Editor) -> treequill_engine::NodeId {
    let tree = ed.document();
    let root = tree.root();
    let mut node = root;
    while let Some(child) = tree.first_child(node) {
        node = child;
    }
    let len = tree.len_of(node);
    ed.set_selection(Range::new(Boundary::new(node, 0), Boundary::new(node, len)));
    node
}

#[test]
fn loose_markup_becomes_an_ordered_list_under_a_custom_block_tag() {
    let config = EditorConfig {
        block_tag: "P".to_string(),
        ..EditorConfig::default()
    };
    let mut ed = Editor::new(config, Capabilities::default());
    ed.set_html("Hello <b>World</b>");
    assert_eq!(ed.get_html(), "<p>Hello <b>World</b></p>");

    select_all(&mut ed);
    ed.make_ordered_list();
    // Lifting every block into the list leaves a fresh empty line at
    // the bottom of the document.
    assert_eq!(
        ed.get_html(),
        "<ol><li>Hello <b>World</b></li></ol><p><br></p>"
    );
}

#[test]
fn formatting_round_trips_through_undo_and_redo() {
    let mut ed = Editor::new(EditorConfig::default(), Capabilities::default());
    ed.set_html("<div>hello</div>");
    select_first_text(&mut ed);

    ed.bold();
    assert_eq!(ed.get_html(), "<div><b>hello</b></div>");
    assert!(ed.can_undo());

    ed.undo();
    assert_eq!(ed.get_html(), "<div>hello</div>");
    assert!(ed.can_redo());

    ed.redo();
    assert_eq!(ed.get_html(), "<div><b>hello</b></div>");
}

#[test]
fn quote_and_list_commands_compose() {
    let mut ed = Editor::new(EditorConfig::default(), Capabilities::default());
    ed.set_html("<div>one</div><div>two</div>");

    select_all(&mut ed);
    ed.make_unordered_list();
    select_all(&mut ed);
    ed.increase_quote_level();
    assert!(ed.get_html().starts_with("<blockquote><ul><li>one</li>"));

    select_all(&mut ed);
    ed.decrease_quote_level();
    select_all(&mut ed);
    ed.remove_list();
    assert!(ed.get_html().starts_with("<div>one</div><div>two</div>"));
}

#[test]
fn pasted_markup_is_cleaned_and_inserted_at_the_caret() {
    let mut ed = Editor::new(EditorConfig::default(), Capabilities::default());
    ed.set_html("<div>start</div>");
    let tree = ed.document();
    let root = tree.root();
    let block = tree.first_child(root).unwrap();
    let text = tree.first_child(block).unwrap();
    ed.set_selection(Range::caret(text, 5));

    assert!(ed.begin_paste());
    assert!(!ed.begin_paste());
    ed.insert_paste_html("<b style=\"color:red\">X</b>", |_, _| true);
    assert_eq!(ed.get_html(), "<div>start<b>X</b></div>");

    // The guard is free again once the paste lands.
    assert!(ed.begin_paste());
    ed.cancel_paste();
}

#[test]
fn key_ups_count_as_changes_only_without_mutation_reporting() {
    let mut observing = Editor::new(EditorConfig::default(), Capabilities::default());
    observing.drain_events();
    observing.note_key_up(65, false, false, false);
    assert!(!observing.drain_events().contains(&Event::Input));

    let caps = Capabilities {
        can_observe_mutations: false,
        ..Capabilities::default()
    };
    let mut heuristic = Editor::new(EditorConfig::default(), caps);
    heuristic.drain_events();
    heuristic.note_key_up(65, false, false, false);
    assert!(heuristic.drain_events().contains(&Event::Input));
}

#[test]
fn serialization_is_stable_across_a_reload() {
    let mut ed = Editor::new(EditorConfig::default(), Capabilities::default());
    ed.set_html(
        "<blockquote><ul><li>item <em>one</em></li><li>two</li></ul></blockquote>\
         <div>tail <a href=\"https://example.com\">link</a></div>",
    );
    let once = ed.get_html();
    ed.set_html(&once);
    assert_eq!(ed.get_html(), once);
}

#[test]
fn typing_flow_splits_inserts_and_deletes() {
    let mut ed = Editor::new(EditorConfig::default(), Capabilities::default());
    ed.set_html("<div>ab</div>");
    let tree = ed.document();
    let root = tree.root();
    let block = tree.first_child(root).unwrap();
    let text = tree.first_child(block).unwrap();
    ed.set_selection(Range::caret(text, 1));

    ed.split_block();
    assert_eq!(ed.get_html(), "<div>a</div><div>b</div>");

    // Inserted text forms its own block; the caret ends up in front
    // of the split-off tail.
    ed.insert_plain_text("c");
    assert_eq!(ed.get_html(), "<div>a</div><div>c</div><div>b</div>");

    ed.delete_backward();
    assert_eq!(ed.get_html(), "<div>a</div><div>cb</div>");

    ed.delete_backward();
    assert_eq!(ed.get_html(), "<div>a</div><div>b</div>");

    ed.delete_backward();
    assert_eq!(ed.get_html(), "<div>ab</div>");
}
