//! File scanner for discovering and parsing setup description files.
//!
//! Discovery respects the configured extensions, excludes and size limit.
//! Parsing turns each file into a [`SetupRecord`]; a file that cannot be
//! read or parsed becomes a [`SkippedFile`] and the scan continues.

use crate::config::{ComponentsConfig, ScannerConfig};
use crate::error::AnalyzerError;
use crate::models::{SetupDocument, SetupRecord, SkippedFile};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Configuration for file scanning.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// File extensions to include, compared case-insensitively
    pub extensions: Vec<String>,
    /// File or directory names to skip
    pub excludes: Vec<String>,
    /// Maximum file size in bytes
    pub max_file_size: u64,
    /// Descend into sub-directories
    pub recursive: bool,
    /// Key holding the identifier inside each component entry
    pub id_key: String,
    /// Reduce identifiers to their last path segment
    pub strip_paths: bool,
    /// Draw a progress bar while parsing
    pub show_progress: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self::new(&ScannerConfig::default(), &ComponentsConfig::default())
    }
}

impl ScanConfig {
    pub fn new(scanner: &ScannerConfig, components: &ComponentsConfig) -> Self {
        Self {
            extensions: scanner
                .extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_lowercase())
                .collect(),
            excludes: scanner.excludes.clone(),
            max_file_size: scanner.max_file_size,
            recursive: scanner.recursive,
            id_key: components.id_key.clone(),
            strip_paths: components.strip_paths,
            show_progress: false,
        }
    }
}

/// A setup file found on disk.
#[derive(Debug, Clone)]
pub struct ScannedFile {
    /// Path relative to the input directory, with `/` separators
    pub path: String,
    /// Absolute or caller-relative path used for reading
    pub full_path: PathBuf,
    /// File size in bytes
    pub size: u64,
}

/// Result of parsing every discovered file.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    pub records: Vec<SetupRecord>,
    pub skipped: Vec<SkippedFile>,
}

impl ScanOutcome {
    /// Number of files looked at, parsed or not.
    pub fn total_files(&self) -> usize {
        self.records.len() + self.skipped.len()
    }
}

/// Scanner over one input directory.
pub struct SetupScanner {
    config: ScanConfig,
    input_dir: PathBuf,
}

impl SetupScanner {
    /// Create a new scanner.
    pub fn new(input_dir: PathBuf, config: ScanConfig) -> Self {
        Self { config, input_dir }
    }

    /// List all matching files, sorted by relative path.
    ///
    /// Fails only when the input directory itself cannot be read.
    pub fn discover(&self) -> Result<Vec<ScannedFile>, AnalyzerError> {
        let metadata = fs::metadata(&self.input_dir)
            .map_err(|e| AnalyzerError::input_not_found(&self.input_dir, e))?;
        if !metadata.is_dir() {
            return Err(AnalyzerError::input_not_found(
                &self.input_dir,
                "not a directory",
            ));
        }
        if let Err(e) = fs::read_dir(&self.input_dir) {
            return Err(AnalyzerError::input_not_found(&self.input_dir, e));
        }

        let max_depth = if self.config.recursive { usize::MAX } else { 1 };
        let walker = WalkDir::new(&self.input_dir)
            .min_depth(1)
            .max_depth(max_depth)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !self.is_excluded(&entry.file_name().to_string_lossy()));

        let mut files = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    // A setup file that cannot be stat'ed (dangling link, permissions)
                    // is still listed so that reading it reports a skip reason.
                    match e.path() {
                        Some(path) if self.is_candidate(path) => {
                            warn!("Cannot inspect {}: {}", path.display(), e);
                            files.push(self.scanned_file(path, 0));
                        }
                        _ => warn!("Cannot read entry under {}: {}", self.input_dir.display(), e),
                    }
                    continue;
                }
            };

            if !entry.file_type().is_file() || !self.has_wanted_extension(entry.path()) {
                continue;
            }

            let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
            files.push(self.scanned_file(entry.path(), size));
        }

        files.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(files)
    }

    fn scanned_file(&self, full_path: &Path, size: u64) -> ScannedFile {
        let rel_path = full_path.strip_prefix(&self.input_dir).unwrap_or(full_path);

        ScannedFile {
            path: rel_path
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/"),
            full_path: full_path.to_path_buf(),
            size,
        }
    }

    /// Path that would be scanned if it could be read.
    fn is_candidate(&self, path: &Path) -> bool {
        let excluded = path
            .file_name()
            .map(|name| self.is_excluded(&name.to_string_lossy()))
            .unwrap_or(true);
        !excluded && path != self.input_dir && self.has_wanted_extension(path)
    }

    /// Discover and parse every setup file.
    pub fn scan(&self) -> Result<ScanOutcome, AnalyzerError> {
        let files = self.discover()?;
        info!(
            "Found {} setup files in {}",
            files.len(),
            self.input_dir.display()
        );

        if files.is_empty() {
            warn!("No setup files found in {}", self.input_dir.display());
            return Ok(ScanOutcome::default());
        }

        let progress = self.progress_bar(files.len() as u64);
        let mut outcome = ScanOutcome::default();

        for file in &files {
            debug!("Processing: {}", file.path);
            match self.parse_file(file) {
                Ok(record) => outcome.records.push(record),
                Err(e) => {
                    warn!("Skipping {}", e);
                    outcome.skipped.push(SkippedFile {
                        filename: file.path.clone(),
                        reason: skip_reason(e),
                    });
                }
            }
            if let Some(ref pb) = progress {
                pb.inc(1);
            }
        }

        if let Some(pb) = progress {
            pb.finish_and_clear();
        }

        info!(
            "Successfully processed {} setup files ({} skipped)",
            outcome.records.len(),
            outcome.skipped.len()
        );

        Ok(outcome)
    }

    /// Read and parse a single file.
    pub fn parse_file(&self, file: &ScannedFile) -> Result<SetupRecord, AnalyzerError> {
        if file.size > self.config.max_file_size {
            return Err(AnalyzerError::file_parse(
                &file.full_path,
                format!(
                    "file is {} bytes, larger than the {} byte limit",
                    file.size, self.config.max_file_size
                ),
            ));
        }

        let content = fs::read_to_string(&file.full_path)
            .map_err(|e| AnalyzerError::file_parse(&file.full_path, e))?;

        parse_setup(&file.path, &content, &self.config)
            .map_err(|reason| AnalyzerError::file_parse(&file.full_path, reason))
    }

    fn progress_bar(&self, len: u64) -> Option<ProgressBar> {
        if !self.config.show_progress || !std::io::stderr().is_terminal() {
            return None;
        }

        let pb = ProgressBar::new(len);
        if let Ok(style) =
            ProgressStyle::default_bar().template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        Some(pb)
    }

    /// Check if a name matches exclusion patterns.
    fn is_excluded(&self, name: &str) -> bool {
        // Hidden files
        if name.starts_with('.') {
            return true;
        }

        // Explicit excludes
        self.config.excludes.iter().any(|pattern| name == pattern)
    }

    fn has_wanted_extension(&self, path: &Path) -> bool {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        self.config.extensions.contains(&ext)
    }
}

fn skip_reason(err: AnalyzerError) -> String {
    match err {
        AnalyzerError::FileParse { reason, .. } => reason,
        other => other.to_string(),
    }
}

/// Build a record from the text of one setup file.
///
/// `rel_path` is the file's path relative to the input directory; it fills
/// the `filename` column and, through its stem, the fallback name.
pub fn parse_setup(rel_path: &str, content: &str, config: &ScanConfig) -> Result<SetupRecord, String> {
    let value: Value =
        serde_json::from_str(content).map_err(|e| format!("invalid JSON: {}", e))?;

    if !value.is_object() {
        return Err(format!(
            "expected a JSON object at the top level, found {}",
            json_kind(&value)
        ));
    }

    let doc = SetupDocument::deserialize(value)
        .map_err(|e| format!("unexpected structure: {}", e))?;

    let name = doc
        .name
        .clone()
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| file_stem(rel_path));

    let entries = doc.component_entries();
    let component_counts = count_components(entries, &config.id_key, config.strip_paths);

    Ok(SetupRecord {
        filename: rel_path.to_string(),
        name,
        verified: doc.verified(),
        collection: doc.collection.clone().unwrap_or_default(),
        author: doc.author.clone().unwrap_or_default(),
        source_link: doc.source_link().unwrap_or_default().to_string(),
        description: doc.description.clone().unwrap_or_default(),
        category: doc.category.clone().unwrap_or_default(),
        version: doc.version.clone().unwrap_or_default(),
        created_at: doc.created_at().unwrap_or_default().to_string(),
        total_components: entries.len(),
        component_counts,
    })
}

/// Count references per component identifier within one file.
pub fn count_components(entries: &[Value], id_key: &str, strip_paths: bool) -> BTreeMap<String, u64> {
    let mut counts = BTreeMap::new();

    for entry in entries {
        // Bare strings are identifiers themselves
        let raw = match entry {
            Value::String(s) => s.as_str(),
            other => match other.get(id_key).and_then(Value::as_str) {
                Some(raw) => raw,
                None => continue,
            },
        };

        let id = if strip_paths { base_name(raw) } else { raw.trim() };
        if id.is_empty() {
            continue;
        }

        *counts.entry(id.to_string()).or_insert(0) += 1;
    }

    counts
}

/// Last segment of a path written with either `/` or `\` separators.
fn base_name(path: &str) -> &str {
    path.trim()
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or("")
}

fn file_stem(rel_path: &str) -> String {
    Path::new(base_name(rel_path))
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
