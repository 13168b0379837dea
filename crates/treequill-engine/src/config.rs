/// Editor behaviour knobs, fixed at construction time.
#[derive(Debug, Clone)]
pub struct EditorConfig {
    /// Tag used when the engine has to invent a paragraph wrapper
    /// (implicit blocks around loose inline runs, the bottom line,
    /// block splits that need a fresh block).
    pub block_tag: String,
    /// Attributes stamped onto every implicit block wrapper.
    pub block_attributes: Vec<(String, String)>,
    /// Rewrite presentational markup (B, I, bold/italic styled spans)
    /// to semantic tags when content is loaded or pasted.
    pub semantic_markup: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            block_tag: "DIV".to_string(),
            block_attributes: Vec::new(),
            semantic_markup: false,
        }
    }
}

/// What the host rendering surface can and cannot do.
///
/// The engine never sniffs its environment; the host describes itself
/// once and the engine picks strategies (change observation, cursor
/// fixing) from these flags.
#[derive(Debug, Clone)]
pub struct Capabilities {
    /// Host reports tree mutations itself. When false, the engine
    /// infers "content changed" from qualifying key-up notifications.
    pub can_observe_mutations: bool,
    /// Host cannot place a caret inside an empty text node; empty
    /// inline elements get a zero-width space child to stay
    /// focusable.
    pub cant_focus_empty_text_nodes: bool,
    /// Host needs an empty text child rather than a line break to
    /// make an empty block focusable.
    pub use_text_fixer: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            can_observe_mutations: true,
            cant_focus_empty_text_nodes: false,
            use_text_fixer: false,
        }
    }
}
