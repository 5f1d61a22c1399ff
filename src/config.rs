//! Include options and their on-disk configuration
//!
//! Options can be built in code, or loaded from a TOML file. The CLI reads
//! `~/.config/includer/config.toml` (XDG standard) when it exists:
//!
//! ```toml
//! max_nesting = 20
//! include_pattern = '^#include <([^>]+)>'
//! allow_glob = true
//! sort_glob = true
//! ```
//!
//! Every key is optional and falls back to its default.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default include directive: `%include "<target>"` at the start of a line
pub const DEFAULT_INCLUDE_PATTERN: &str = r#"^%include "([^"]+)""#;

/// Default maximum include nesting depth
pub const DEFAULT_MAX_NESTING: usize = 100;

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("cannot read config {path}: {source}")]
    Io {
        /// Path of the config file
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for these options
    #[error("invalid config {path}: {source}")]
    Parse {
        /// Path of the config file
        path: PathBuf,
        /// Underlying error
        #[source]
        source: toml::de::Error,
    },
}

/// Settings that control include expansion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IncludeOptions {
    /// Maximum include nesting depth (at least 1)
    pub max_nesting: usize,
    /// Regex matching an include directive; must have exactly one capture group
    pub include_pattern: String,
    /// Treat scheme-less targets as glob patterns
    pub allow_glob: bool,
    /// Sort glob matches before including them
    pub sort_glob: bool,
}

impl Default for IncludeOptions {
    fn default() -> Self {
        Self {
            max_nesting: DEFAULT_MAX_NESTING,
            include_pattern: DEFAULT_INCLUDE_PATTERN.to_string(),
            allow_glob: false,
            sort_glob: true,
        }
    }
}

impl IncludeOptions {
    /// Set the maximum nesting depth
    #[must_use]
    pub const fn max_nesting(mut self, max_nesting: usize) -> Self {
        self.max_nesting = max_nesting;
        self
    }

    /// Set the include directive pattern
    #[must_use]
    pub fn include_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.include_pattern = pattern.into();
        self
    }

    /// Enable or disable glob expansion of file targets
    #[must_use]
    pub const fn allow_glob(mut self, allow: bool) -> Self {
        self.allow_glob = allow;
        self
    }

    /// Enable or disable sorting of glob matches
    #[must_use]
    pub const fn sort_glob(mut self, sort: bool) -> Self {
        self.sort_glob = sort;
        self
    }

    /// Parse options from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

/// Path of the user-level config file
#[must_use]
pub fn default_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("includer")
        .join("config.toml")
}

/// Load options from a TOML file
pub fn load(path: &Path) -> Result<IncludeOptions, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    IncludeOptions::from_toml_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Load options from the user config file, or defaults if it does not exist
pub fn load_or_default() -> Result<IncludeOptions, ConfigError> {
    let path = default_path();
    if path.exists() {
        log::debug!("loading config from {}", path.display());
        load(&path)
    } else {
        Ok(IncludeOptions::default())
    }
}
