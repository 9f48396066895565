//! Settings and file eligibility rules.
//!
//! Settings are read from a TOML file. Every key is optional:
//!
//! ```toml
//! undo_log = "undo_log.json"
//! no_extension_folder = "No Extension"
//! backup_enabled = false
//!
//! [filters]
//! enable_hidden_files = true
//!
//! [filters.exclude]
//! filenames = [".DS_Store", "Thumbs.db"]
//! patterns = ["*.tmp"]
//! extensions = ["part"]
//! regex = []
//!
//! [filters.include]
//! patterns = []
//! ```
//!
//! With the defaults every regular file in the folder is organized,
//! hidden files included.

use crate::undo_log::DEFAULT_UNDO_LOG;
use glob::Pattern;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// Name of the per-directory configuration file.
pub const LOCAL_CONFIG_FILE: &str = ".filesortrc.toml";

/// Errors that can occur while loading settings or compiling filters.
#[derive(Error, Debug, Clone)]
pub enum ConfigError {
    #[error("Configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),

    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),

    #[error("Invalid glob pattern '{0}': expected something like *.ext")]
    InvalidGlobPattern(String),

    #[error("Invalid regex pattern '{pattern}': {reason}")]
    InvalidRegexPattern { pattern: String, reason: String },

    #[error("IO error reading configuration: {0}")]
    IoError(String),
}

/// Settings for the organizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Where the undo log is kept. Relative paths resolve against the
    /// working directory of the process.
    #[serde(default = "default_undo_log")]
    pub undo_log: PathBuf,

    /// Folder used by extension sorting for names without an extension.
    #[serde(default = "default_no_extension_folder")]
    pub no_extension_folder: String,

    /// Reserved. Backups are not implemented; enabling this only logs a warning.
    #[serde(default)]
    pub backup_enabled: bool,

    #[serde(default)]
    pub filters: FilterRules,
}

fn default_undo_log() -> PathBuf {
    PathBuf::from(DEFAULT_UNDO_LOG)
}

fn default_no_extension_folder() -> String {
    "No Extension".to_string()
}

/// Which files in the folder are eligible for organizing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterRules {
    /// Whether names starting with "." are organized. Defaults to true.
    #[serde(default = "default_enable_hidden_files")]
    pub enable_hidden_files: bool,

    #[serde(default)]
    pub exclude: ExcludeRules,

    /// Whitelist, overrides every exclude rule.
    #[serde(default)]
    pub include: IncludeRules,
}

fn default_enable_hidden_files() -> bool {
    true
}

impl Default for FilterRules {
    fn default() -> Self {
        Self {
            enable_hidden_files: default_enable_hidden_files(),
            exclude: ExcludeRules::default(),
            include: IncludeRules::default(),
        }
    }
}

/// Rules for leaving files where they are.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExcludeRules {
    /// Exact file names, e.g. ".DS_Store".
    #[serde(default)]
    pub filenames: Vec<String>,

    /// Glob patterns matched against the file name, e.g. "*.tmp".
    #[serde(default)]
    pub patterns: Vec<String>,

    /// Extensions, compared case-insensitively.
    #[serde(default)]
    pub extensions: Vec<String>,

    #[serde(default)]
    pub regex: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IncludeRules {
    #[serde(default)]
    pub patterns: Vec<String>,
}

impl Config {
    /// Load settings, falling back to defaults.
    ///
    /// Lookup order:
    /// 1. `config_path`, when given
    /// 2. `.filesortrc.toml` in the current directory
    /// 3. `~/.config/filesort/config.toml`
    /// 4. built-in defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the file that was picked cannot be read or parsed,
    /// or if it holds an unusable value.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from(LOCAL_CONFIG_FILE);
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Ok(home) = std::env::var("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("filesort")
                .join("config.toml");
            if home_config.exists() {
                return Self::load_from_file(&home_config);
            }
        }

        Ok(Self::default())
    }

    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
        let config: Self =
            toml::from_str(&content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))?;
        config.validate()?;

        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Checks values that would otherwise fail halfway through a run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut components = Path::new(&self.no_extension_folder).components();
        let single_name = matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        );
        if !single_name {
            return Err(ConfigError::ConfigInvalid(format!(
                "no_extension_folder must be a plain folder name, got '{}'",
                self.no_extension_folder
            )));
        }

        if self.undo_log.as_os_str().is_empty() {
            return Err(ConfigError::ConfigInvalid(
                "undo_log must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Compile the filter rules for matching.
    ///
    /// # Errors
    ///
    /// Returns an error if any regex or glob patterns are invalid.
    pub fn compile_filters(&self) -> Result<CompiledFilters, ConfigError> {
        CompiledFilters::new(&self.filters)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            undo_log: default_undo_log(),
            no_extension_folder: default_no_extension_folder(),
            backup_enabled: false,
            filters: FilterRules::default(),
        }
    }
}

/// Filter rules with every pattern parsed once up front.
#[derive(Debug, Clone)]
pub struct CompiledFilters {
    enable_hidden_files: bool,
    exclude_filenames: HashSet<String>,
    exclude_extensions: HashSet<String>,
    exclude_patterns: Vec<Pattern>,
    exclude_regexes: Vec<Regex>,
    include_patterns: Vec<Pattern>,
}

impl CompiledFilters {
    fn new(rules: &FilterRules) -> Result<Self, ConfigError> {
        let exclude_patterns = compile_globs(&rules.exclude.patterns)?;
        let include_patterns = compile_globs(&rules.include.patterns)?;

        let exclude_regexes = rules
            .exclude
            .regex
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| ConfigError::InvalidRegexPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            enable_hidden_files: rules.enable_hidden_files,
            exclude_filenames: rules.exclude.filenames.iter().cloned().collect(),
            exclude_extensions: rules
                .exclude
                .extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_lowercase())
                .collect(),
            exclude_patterns,
            exclude_regexes,
            include_patterns,
        })
    }

    /// Check if a file in the organized folder should be moved.
    ///
    /// Checks, in order with early return:
    /// 1. include patterns: always include
    /// 2. hidden files when disabled: exclude
    /// 3. exact file name: exclude
    /// 4. extension: exclude
    /// 5. glob patterns: exclude
    /// 6. regex patterns: exclude
    pub fn should_include(&self, file_name: &str) -> bool {
        if self
            .include_patterns
            .iter()
            .any(|pattern| pattern.matches(file_name))
        {
            return true;
        }

        if !self.enable_hidden_files && file_name.starts_with('.') {
            return false;
        }

        if self.exclude_filenames.contains(file_name) {
            return false;
        }

        if let Some(ext) = Path::new(file_name).extension() {
            let ext_lower = ext.to_string_lossy().to_lowercase();
            if self.exclude_extensions.contains(&ext_lower) {
                return false;
            }
        }

        if self
            .exclude_patterns
            .iter()
            .any(|pattern| pattern.matches(file_name))
        {
            return false;
        }

        !self
            .exclude_regexes
            .iter()
            .any(|regex| regex.is_match(file_name))
    }
}

impl Default for CompiledFilters {
    fn default() -> Self {
        Self {
            enable_hidden_files: true,
            exclude_filenames: HashSet::new(),
            exclude_extensions: HashSet::new(),
            exclude_patterns: Vec::new(),
            exclude_regexes: Vec::new(),
            include_patterns: Vec::new(),
        }
    }
}

fn compile_globs(patterns: &[String]) -> Result<Vec<Pattern>, ConfigError> {
    patterns
        .iter()
        .map(|pattern| {
            Pattern::new(pattern).map_err(|_| ConfigError::InvalidGlobPattern(pattern.clone()))
        })
        .collect()
}
