//! Configuration management for flint.
//!
//! This module provides the [`Config`] struct which controls the analysis.
//! Configuration can be loaded from:
//! - TOML files (`flint.toml`)
//! - CLI arguments (which override file settings)
//!
//! Config files are auto-discovered by searching parent directories from the file
//! being analyzed up to the filesystem root, plus the user's home directory.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Config file names to search for (in order of priority, later overrides earlier)
const CONFIG_FILE_NAMES: &[&str] = &["flint.toml"];

/// Get the user's home directory
fn dirs_home() -> Option<PathBuf> {
    if let Ok(home) = std::env::var("HOME") {
        return Some(PathBuf::from(home));
    }
    if let Ok(userprofile) = std::env::var("USERPROFILE") {
        return Some(PathBuf::from(userprofile));
    }
    None
}

// Serde default functions
fn default_line_length() -> usize {
    132
}
fn default_max_depth() -> usize {
    256
}
fn default_true() -> bool {
    true
}
fn default_comment_marker() -> char {
    '!'
}
fn default_directive_marker() -> char {
    '#'
}
fn default_extensions() -> Vec<String> {
    vec!["f90".to_string(), "F90".to_string()]
}

/// Main configuration struct for flint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Column limit for the line-width check (default: 132)
    #[serde(default = "default_line_length")]
    pub line_length: usize,

    /// Deepest nesting of units and constructs before analysis fails (default: 256)
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Fail on lex errors and malformed statements instead of recording them (default: false)
    #[serde(default)]
    pub strict: bool,

    /// Handle `#define`, `#undef` and `#include` (default: true)
    #[serde(default = "default_true")]
    pub preprocess: bool,

    /// Log every classified statement at debug level (default: false)
    #[serde(default)]
    pub trace: bool,

    /// Character that starts a comment (default: '!')
    #[serde(default = "default_comment_marker")]
    pub comment_marker: char,

    /// Character that starts a preprocessor directive line (default: '#')
    #[serde(default = "default_directive_marker")]
    pub directive_marker: char,

    /// Check spacing around operators and commas (default: true)
    #[serde(default = "default_true")]
    pub check_spacing: bool,

    /// Extra directories searched for include files
    #[serde(default)]
    pub include_dirs: Vec<PathBuf>,

    /// File extensions analyzed when scanning directories
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

/// Partial configuration for TOML parsing
///
/// All fields are `Option<T>` so we can distinguish between
/// "explicitly set" and "not specified" when merging configs.
#[derive(Debug, Clone, Default, Deserialize)]
struct PartialConfig {
    pub line_length: Option<usize>,
    pub max_depth: Option<usize>,
    pub strict: Option<bool>,
    pub preprocess: Option<bool>,
    pub trace: Option<bool>,
    pub comment_marker: Option<char>,
    pub directive_marker: Option<char>,
    pub check_spacing: Option<bool>,
    #[serde(default)]
    pub include_dirs: Vec<PathBuf>,
    pub extensions: Option<Vec<String>>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            line_length: 132,
            max_depth: 256,
            strict: false,
            preprocess: true,
            trace: false,
            comment_marker: '!',
            directive_marker: '#',
            check_spacing: true,
            include_dirs: Vec::new(),
            extensions: default_extensions(),
        }
    }
}

impl Config {
    /// Minimum reasonable line length (must fit at least some code)
    const MIN_LINE_LENGTH: usize = 40;
    /// Maximum reasonable line length
    const MAX_LINE_LENGTH: usize = 1000;

    /// Validate configuration values are within reasonable bounds
    ///
    /// Returns an error message if validation fails, None if valid.
    #[must_use]
    pub fn validate(&self) -> Option<String> {
        if self.max_depth == 0 {
            return Some("max_depth must be at least 1".to_string());
        }
        if self.line_length < Self::MIN_LINE_LENGTH {
            return Some(format!(
                "line_length {} is below minimum of {}",
                self.line_length,
                Self::MIN_LINE_LENGTH
            ));
        }
        if self.line_length > Self::MAX_LINE_LENGTH {
            return Some(format!(
                "line_length {} exceeds maximum of {}",
                self.line_length,
                Self::MAX_LINE_LENGTH
            ));
        }
        for (name, marker) in [
            ("comment_marker", self.comment_marker),
            ("directive_marker", self.directive_marker),
        ] {
            if marker.is_alphanumeric() || marker.is_whitespace() {
                return Some(format!("{name} {marker:?} must be a punctuation character"));
            }
        }
        if self.comment_marker == self.directive_marker {
            return Some(format!(
                "comment_marker and directive_marker are both {:?}",
                self.comment_marker
            ));
        }
        None
    }

    /// Load configuration from a TOML file
    ///
    /// Relative include directories are taken relative to the file's directory.
    pub fn from_toml_file(path: &Path) -> anyhow::Result<Self> {
        let mut config = Self::default();
        config.apply_partial(&read_partial(path)?, path.parent());
        Ok(config)
    }

    /// Apply a partial config, only overriding fields that are explicitly set
    fn apply_partial(&mut self, partial: &PartialConfig, base_dir: Option<&Path>) {
        if let Some(v) = partial.line_length {
            self.line_length = v;
        }
        if let Some(v) = partial.max_depth {
            self.max_depth = v;
        }
        if let Some(v) = partial.strict {
            self.strict = v;
        }
        if let Some(v) = partial.preprocess {
            self.preprocess = v;
        }
        if let Some(v) = partial.trace {
            self.trace = v;
        }
        if let Some(v) = partial.comment_marker {
            self.comment_marker = v;
        }
        if let Some(v) = partial.directive_marker {
            self.directive_marker = v;
        }
        if let Some(v) = partial.check_spacing {
            self.check_spacing = v;
        }
        if let Some(v) = &partial.extensions {
            self.extensions.clone_from(v);
        }
        // Include directories accumulate across files
        for dir in &partial.include_dirs {
            let dir = match base_dir {
                Some(base) if dir.is_relative() => base.join(dir),
                _ => dir.clone(),
            };
            if !self.include_dirs.contains(&dir) {
                self.include_dirs.push(dir);
            }
        }
    }

    /// Discover config files from parent directories of a given path
    ///
    /// Searches from the file's directory up to the root, then adds home directory config.
    /// Returns list of config file paths in order of priority (least specific first).
    #[must_use]
    pub fn discover_config_files(start_path: &Path) -> Vec<PathBuf> {
        let mut config_files = Vec::new();

        if let Some(home) = dirs_home() {
            for config_name in CONFIG_FILE_NAMES {
                let home_config = home.join(config_name);
                if home_config.is_file() {
                    config_files.push(home_config);
                }
            }
        }

        let start_dir = if start_path.is_file() {
            start_path.parent().map(Path::to_path_buf)
        } else if start_path.is_dir() {
            Some(start_path.to_path_buf())
        } else {
            std::env::current_dir().ok()
        };

        if let Some(dir) = start_dir {
            let mut ancestors: Vec<PathBuf> = dir.ancestors().map(Path::to_path_buf).collect();
            // Root first, so more specific files override
            ancestors.reverse();

            for ancestor in ancestors {
                for config_name in CONFIG_FILE_NAMES {
                    let config_path = ancestor.join(config_name);
                    if config_path.is_file() && !config_files.contains(&config_path) {
                        config_files.push(config_path);
                    }
                }
            }
        }

        config_files
    }

    /// Load and merge configuration from discovered config files
    ///
    /// Later files override earlier ones (only explicitly set values).
    /// Returns default config if no files found.
    #[must_use]
    pub fn from_discovered_files(start_path: &Path) -> Self {
        let mut config = Self::default();
        for path in Self::discover_config_files(start_path) {
            match read_partial(&path) {
                Ok(partial) => config.apply_partial(&partial, path.parent()),
                Err(e) => log::warn!("failed to load {}: {e:#}", path.display()),
            }
        }
        config
    }
}

fn read_partial(path: &Path) -> anyhow::Result<PartialConfig> {
    let contents = std::fs::read_to_string(path)?;
    Ok(toml::from_str(&contents)?)
}
