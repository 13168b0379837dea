use std::io::Read;
use std::path::Path;
use std::{env, fs, process};

use anyhow::{bail, Context, Result};
use treequill_config::Config;
use treequill_engine::{Boundary, Capabilities, Editor, EditorConfig, Range};

const USAGE: &str = "\
Usage: treequill [--config <file.toml>] <command> <input.html | ->

Reads a document, applies one engine command to the whole of it, and
prints the resulting markup (or text) on stdout. Pass `-` to read the
document from stdin.

Commands:
  normalize        clean the markup and print it back
  ordered-list     turn every block into an ordered list item
  unordered-list   turn every block into an unordered list item
  remove-list      replace list items with plain blocks
  quote            wrap the document in a blockquote
  unquote          remove one level of blockquote
  text             print the document as plain text";

fn main() -> Result<()> {
    env_logger::init();

    let mut args: Vec<String> = env::args().skip(1).collect();
    let mut config_path = None;
    if args.first().map(String::as_str) == Some("--config") {
        if args.len() < 2 {
            eprintln!("{USAGE}");
            process::exit(1);
        }
        config_path = Some(args.remove(1));
        args.remove(0);
    }
    let [command, input] = args.as_slice() else {
        eprintln!("{USAGE}");
        process::exit(1);
    };

    let (editor_config, caps) = load_config(config_path.as_deref())?;
    let markup = read_input(input)?;

    let mut editor = Editor::new(editor_config, caps);
    editor.set_html(&markup);
    select_all(&mut editor);

    match command.as_str() {
        "normalize" => {}
        "ordered-list" => editor.make_ordered_list(),
        "unordered-list" => editor.make_unordered_list(),
        "remove-list" => editor.remove_list(),
        "quote" => editor.increase_quote_level(),
        "unquote" => editor.decrease_quote_level(),
        "text" => {
            println!("{}", editor.selected_text());
            return Ok(());
        }
        other => bail!("unknown command `{other}`\n{USAGE}"),
    }

    println!("{}", editor.get_html());
    Ok(())
}

fn load_config(path: Option<&str>) -> Result<(EditorConfig, Capabilities)> {
    let Some(path) = path else {
        return Ok((EditorConfig::default(), Capabilities::default()));
    };
    let config = Config::load_from_path(Path::new(path))
        .with_context(|| format!("loading config from {path}"))?
        .unwrap_or_default();

    let mut editor = EditorConfig::default();
    if let Some(tag) = config.editor.block_tag {
        editor.block_tag = tag;
    }
    editor.block_attributes = config.editor.block_attributes;
    editor.semantic_markup = config.editor.semantic_markup;

    let caps = Capabilities {
        can_observe_mutations: config.capabilities.can_observe_mutations,
        cant_focus_empty_text_nodes: config.capabilities.cant_focus_empty_text_nodes,
        use_text_fixer: config.capabilities.use_text_fixer,
    };
    Ok((editor, caps))
}

fn read_input(input: &str) -> Result<String> {
    if input == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("reading stdin")?;
        Ok(buf)
    } else {
        fs::read_to_string(input).with_context(|| format!("reading {input}"))
    }
}

fn select_all(editor: &mut Editor) {
    let tree = editor.document();
    let root = tree.root();
    let end = tree.children(root).len();
    editor.set_selection(Range::new(Boundary::new(root, 0), Boundary::new(root, end)));
}
