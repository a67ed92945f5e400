//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.setuptally.toml` files.

use crate::error::AnalyzerError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = ".setuptally.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Scanner settings.
    #[serde(default)]
    pub scanner: ScannerConfig,

    /// Component extraction settings.
    #[serde(default)]
    pub components: ComponentsConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Directory containing the setup files.
    #[serde(default = "default_input")]
    pub input: PathBuf,

    /// Path of the generated table.
    #[serde(default = "default_output")]
    pub output: PathBuf,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            input: default_input(),
            output: default_output(),
        }
    }
}

fn default_input() -> PathBuf {
    PathBuf::from("./setups")
}

fn default_output() -> PathBuf {
    PathBuf::from("setups_analysis.csv")
}

/// File scanner settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// File extensions to include.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// File or directory names to skip.
    #[serde(default)]
    pub excludes: Vec<String>,

    /// Descend into sub-directories.
    #[serde(default)]
    pub recursive: bool,

    /// Files larger than this many bytes are skipped.
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            excludes: Vec::new(),
            recursive: false,
            max_file_size: default_max_file_size(),
        }
    }
}

fn default_extensions() -> Vec<String> {
    vec!["json".to_string()]
}

fn default_max_file_size() -> u64 {
    1024 * 1024 // 1MB
}

/// How component identifiers are read out of a setup file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentsConfig {
    /// Key holding the identifier inside each component entry.
    #[serde(default = "default_id_key")]
    pub id_key: String,

    /// Reduce identifiers to their last path segment.
    #[serde(default = "default_true")]
    pub strip_paths: bool,

    /// Prefix put in front of each component column name.
    #[serde(default = "default_column_prefix")]
    pub column_prefix: String,
}

impl Default for ComponentsConfig {
    fn default() -> Self {
        Self {
            id_key: default_id_key(),
            strip_paths: true,
            column_prefix: default_column_prefix(),
        }
    }
}

fn default_id_key() -> String {
    "file".to_string()
}

fn default_column_prefix() -> String {
    "component_".to_string()
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Field delimiter of the table; must be a single ASCII character.
    #[serde(default = "default_delimiter")]
    pub delimiter: String,

    /// Number of authors listed in the summary.
    #[serde(default = "default_top")]
    pub top_authors: usize,

    /// Number of collections listed in the summary.
    #[serde(default = "default_top")]
    pub top_collections: usize,

    /// Number of components listed in the summary.
    #[serde(default = "default_top_components")]
    pub top_components: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            delimiter: default_delimiter(),
            top_authors: default_top(),
            top_collections: default_top(),
            top_components: default_top_components(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_delimiter() -> String {
    ";".to_string()
}

fn default_top() -> usize {
    5
}

fn default_top_components() -> usize {
    10
}

impl ReportConfig {
    /// The delimiter as the single byte the table writer expects.
    pub fn delimiter_byte(&self) -> Result<u8, AnalyzerError> {
        match self.delimiter.as_bytes() {
            [b] if b.is_ascii() && *b != b'"' && *b != b'\n' && *b != b'\r' => Ok(*b),
            _ => Err(AnalyzerError::Config(format!(
                "delimiter must be a single ASCII character other than a quote or newline, got {:?}",
                self.delimiter
            ))),
        }
    }
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(DEFAULT_CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// This method only overrides config when CLI provides explicit values.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref input) = args.input {
            self.general.input = input.clone();
        }
        if let Some(ref output) = args.output {
            self.general.output = output.clone();
        }

        if args.recursive {
            self.scanner.recursive = true;
        }

        if let Some(ref delimiter) = args.delimiter {
            self.report.delimiter = delimiter.clone();
        }

        if let Some(top) = args.top {
            self.report.top_authors = top;
            self.report.top_collections = top;
        }
    }

    /// Check settings that serde cannot express.
    pub fn validate(&self) -> Result<(), AnalyzerError> {
        self.report.delimiter_byte()?;

        if self.components.id_key.is_empty() {
            return Err(AnalyzerError::Config(
                "components.id_key must not be empty".to_string(),
            ));
        }

        if self.scanner.extensions.is_empty() {
            return Err(AnalyzerError::Config(
                "scanner.extensions must list at least one extension".to_string(),
            ));
        }

        Ok(())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
