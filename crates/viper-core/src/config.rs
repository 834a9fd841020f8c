//! Editor configuration.
//!
//! Loaded from TOML. Every key is optional and falls back to [`EditorConfig::default`].
//!
//! ```toml
//! max_history_size = 30    # negative = unbounded
//! chars_to_color = 2500
//! wrap_content = true
//! default_encoding = "UTF-8"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::files::{FileOptions, encoding_for_label};
use crate::viewport::CHARS_TO_COLOR;

/// User-tunable editor settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Undo steps kept; negative keeps everything.
    pub max_history_size: i64,
    /// Highlight budget in characters.
    pub chars_to_color: usize,
    /// Syntax highlighting on.
    pub syntax_highlight: bool,
    /// Line-number gutter shown.
    pub line_numbers: bool,
    /// Soft wrap long lines.
    pub wrap_content: bool,
    /// Open documents read-only.
    pub read_only: bool,
    /// Split very large documents into pages.
    pub page_system: bool,
    /// Detect file encodings.
    pub auto_encoding: bool,
    /// Encoding label used when detection is off or inconclusive.
    pub default_encoding: String,
    /// Text inserted by the Tab key.
    pub tab_text: String,
    /// List dotfiles in the file browser.
    pub show_hidden_files: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            max_history_size: 30,
            chars_to_color: CHARS_TO_COLOR,
            syntax_highlight: true,
            line_numbers: true,
            wrap_content: true,
            read_only: false,
            page_system: true,
            auto_encoding: true,
            default_encoding: "UTF-8".to_string(),
            tab_text: "  ".to_string(),
            show_hidden_files: false,
        }
    }
}

impl EditorConfig {
    /// Load and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parse and validate TOML text.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, ConfigError> {
        let config: EditorConfig = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chars_to_color == 0 {
            return Err(ConfigError::Invalid(
                "chars_to_color must be greater than 0".to_string(),
            ));
        }
        if encoding_for_label(&self.default_encoding).is_err() {
            return Err(ConfigError::Invalid(format!(
                "default_encoding: unknown encoding {:?}",
                self.default_encoding
            )));
        }
        Ok(())
    }

    /// History bound as used by the undo log (`None` = unbounded).
    pub fn history_limit(&self) -> Option<usize> {
        usize::try_from(self.max_history_size).ok()
    }

    /// File decoding options derived from this config.
    pub fn file_options(&self) -> Result<FileOptions, ConfigError> {
        let default_encoding = encoding_for_label(&self.default_encoding)
            .map_err(|err| ConfigError::Invalid(err.to_string()))?;
        Ok(FileOptions {
            auto_encoding: self.auto_encoding,
            default_encoding,
            shell: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = EditorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.history_limit(), Some(30));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = EditorConfig::from_toml_str("wrap_content = false\nmax_history_size = -1\n").unwrap();
        assert!(!config.wrap_content);
        assert_eq!(config.history_limit(), None);
        assert_eq!(config.chars_to_color, CHARS_TO_COLOR);
        assert_eq!(config.tab_text, "  ");
    }

    #[test]
    fn test_validation_errors() {
        let err = EditorConfig::from_toml_str("chars_to_color = 0").unwrap_err();
        assert!(err.to_string().contains("chars_to_color"));

        let err = EditorConfig::from_toml_str("default_encoding = \"nope\"").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(
            EditorConfig::from_toml_str("wrap_content = \"yes\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("viper.toml");
        std::fs::write(&path, "default_encoding = \"latin1\"\nauto_encoding = false\n").unwrap();

        let config = EditorConfig::load(&path).unwrap();
        let options = config.file_options().unwrap();
        assert!(!options.auto_encoding);
        assert_eq!(options.default_encoding, encoding_rs::WINDOWS_1252);
    }
}
