use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },
}

/// On-disk configuration for a treequill editor instance.
///
/// This is the file schema only; the engine takes plain structs at
/// construction time, and callers map this onto them.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub editor: EditorSection,
    #[serde(default)]
    pub capabilities: CapabilitiesSection,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EditorSection {
    /// Tag used for implicit paragraph wrappers ("DIV" if absent).
    pub block_tag: Option<String>,
    /// Attributes stamped onto every implicit block wrapper.
    #[serde(default)]
    pub block_attributes: Vec<(String, String)>,
    /// Rewrite presentational tags (B, I, styled spans) to semantic
    /// ones on load. Off by default so markup round-trips unchanged.
    #[serde(default)]
    pub semantic_markup: bool,
}

impl Default for EditorSection {
    fn default() -> Self {
        Self {
            block_tag: None,
            block_attributes: Vec::new(),
            semantic_markup: false,
        }
    }
}

/// Host capability flags, described explicitly rather than sniffed
/// from the environment.
#[derive(Debug, Serialize, Deserialize)]
pub struct CapabilitiesSection {
    /// Host can report tree mutations directly; otherwise the engine
    /// falls back to a key-up heuristic.
    pub can_observe_mutations: bool,
    /// Host cannot place a caret in an empty text node, so empty
    /// inlines need a zero-width space to stay focusable.
    pub cant_focus_empty_text_nodes: bool,
    /// Host needs a text fixer child rather than a line break to make
    /// empty blocks focusable.
    pub use_text_fixer: bool,
}

impl Default for CapabilitiesSection {
    fn default() -> Self {
        Self {
            can_observe_mutations: true,
            cant_focus_empty_text_nodes: false,
            use_text_fixer: false,
        }
    }
}

impl Config {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        Ok(Some(config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = Config::load_from_path(dir.path().join("absent.toml")).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn loads_editor_and_capability_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("treequill.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(
            f,
            "[editor]\nblock_tag = \"P\"\nsemantic_markup = true\n\n\
             [capabilities]\ncan_observe_mutations = false\n\
             cant_focus_empty_text_nodes = true\nuse_text_fixer = false"
        )
        .unwrap();

        let config = Config::load_from_path(&path).unwrap().unwrap();
        assert_eq!(config.editor.block_tag.as_deref(), Some("P"));
        assert!(config.editor.semantic_markup);
        assert!(!config.capabilities.can_observe_mutations);
        assert!(config.capabilities.cant_focus_empty_text_nodes);
    }

    #[test]
    fn empty_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.toml");
        std::fs::write(&path, "").unwrap();

        let config = Config::load_from_path(&path).unwrap().unwrap();
        assert_eq!(config.editor.block_tag, None);
        assert!(config.capabilities.can_observe_mutations);
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[editor\nblock_tag = ").unwrap();

        let err = Config::load_from_path(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ConfigParseError { .. }));
    }
}
