//! Parser configuration.
//!
//! Configuration is loaded from a TOML file at:
//! 1. `$MAILTREE_CONFIG` (environment variable)
//! 2. `~/.config/mailtree/config.toml` (Linux/macOS)
//!    `%APPDATA%\mailtree\config.toml` (Windows)
//! 3. Built-in defaults
//!
//! Callers embedding the parser usually build a [`ParserConfig`] directly
//! and never touch the file.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level configuration file layout.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Parsing limits and fallbacks.
    pub parser: ParserConfig,
}

/// Options recognized by [`Message::parse`](crate::model::message::Message::parse).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Fail with `MalformedHeader` when a header section never reaches a blank line.
    /// When `false` the remainder is treated as headers and the body is empty.
    pub strict_header_termination: bool,
    /// Deepest allowed MIME nesting (the root part is depth 0).
    pub max_nesting_depth: usize,
    /// Cap on the total number of decoded body bytes across the whole tree.
    pub max_decoded_bytes: usize,
    /// Charset assumed for text parts that do not declare one.
    pub default_charset: String,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            strict_header_termination: false,
            max_nesting_depth: 100,
            max_decoded_bytes: 50 * 1024 * 1024, // 50 MB
            default_charset: "us-ascii".to_string(),
        }
    }
}

/// Load configuration, searching standard locations.
///
/// Returns the default configuration if no file is found or on parse error.
pub fn load_config() -> Config {
    if let Some(path) = config_file_path() {
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(contents) => match toml::from_str::<Config>(&contents) {
                    Ok(cfg) => {
                        tracing::info!(path = %path.display(), "Loaded config");
                        return cfg;
                    }
                    Err(e) => {
                        tracing::warn!(
                            path = %path.display(),
                            error = %e,
                            "Failed to parse config, using defaults"
                        );
                    }
                },
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "Failed to read config file, using defaults"
                    );
                }
            }
        }
    }
    Config::default()
}

/// Determine the config file path (checking env var first, then standard dirs).
pub fn config_file_path() -> Option<PathBuf> {
    if let Ok(env_path) = std::env::var("MAILTREE_CONFIG") {
        return Some(PathBuf::from(env_path));
    }

    dirs::config_dir().map(|d| d.join("mailtree").join("config.toml"))
}
