//! Data models for the setup analyzer.
//!
//! This module contains the wire shape of a setup description file, the
//! per-file record built from it, and the summary structures used by the
//! report generator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Raw contents of one setup description file.
///
/// Setup files are hand-written and drift between schema revisions, so
/// every field is optional and scalar fields accept whatever JSON type the
/// author happened to use. Both the UC2 key and its generic spelling are
/// read; the UC2 key wins when both are present.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SetupDocument {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "lenient_bool")]
    pub uc2_verified: Option<bool>,

    #[serde(default, deserialize_with = "lenient_bool")]
    pub verified: Option<bool>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub collection: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub author: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub github_link: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub source_link: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub description: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub category: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub version: Option<String>,

    #[serde(default, rename = "createdAt", deserialize_with = "lenient_string")]
    pub created_at_camel: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub created_at: Option<String>,

    #[serde(default)]
    pub uc2_components: Option<Vec<Value>>,

    #[serde(default)]
    pub components: Option<Vec<Value>>,
}

impl SetupDocument {
    pub fn verified(&self) -> bool {
        self.uc2_verified.or(self.verified).unwrap_or(false)
    }

    pub fn source_link(&self) -> Option<&str> {
        self.github_link.as_deref().or(self.source_link.as_deref())
    }

    pub fn created_at(&self) -> Option<&str> {
        self.created_at_camel
            .as_deref()
            .or(self.created_at.as_deref())
    }

    /// The component reference list, empty when neither key is present.
    pub fn component_entries(&self) -> &[Value] {
        self.uc2_components
            .as_deref()
            .or(self.components.as_deref())
            .unwrap_or(&[])
    }
}

/// Accepts strings, numbers and booleans; nested values keep their JSON text.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

/// Accepts booleans, common textual spellings, and numbers (non-zero is true).
fn lenient_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Bool(b)) => Some(b),
        Some(Value::String(s)) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        },
        Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0),
        _ => None,
    })
}

/// One successfully parsed setup file.
#[derive(Debug, Clone, PartialEq)]
pub struct SetupRecord {
    /// File name including extension, relative to the input directory.
    pub filename: String,
    pub name: String,
    pub verified: bool,
    pub collection: String,
    pub author: String,
    pub source_link: String,
    pub description: String,
    pub category: String,
    pub version: String,
    pub created_at: String,
    /// Length of the component list, including entries without an identifier.
    pub total_components: usize,
    /// References per component identifier within this file.
    pub component_counts: BTreeMap<String, u64>,
}

/// A file that was excluded from the record set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedFile {
    pub filename: String,
    pub reason: String,
}

/// A label with its frequency, used for the ranked summary lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedEntry {
    pub label: String,
    pub count: u64,
}

impl RankedEntry {
    pub fn new(label: impl Into<String>, count: u64) -> Self {
        Self {
            label: label.into(),
            count,
        }
    }
}

/// Aggregate statistics over one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SummaryStats {
    /// Files that produced a record.
    pub processed: usize,
    /// Files that were skipped.
    pub skipped: usize,
    /// `processed + skipped`.
    pub total_files: usize,
    /// Records flagged as verified.
    pub verified: usize,
    /// `verified / processed`, or 0.0 when nothing was processed.
    pub verification_rate: f64,
    pub distinct_collections: usize,
    pub distinct_authors: usize,
    pub top_authors: Vec<RankedEntry>,
    pub top_collections: Vec<RankedEntry>,
    pub unique_components: usize,
    pub top_components: Vec<RankedEntry>,
    pub avg_components: f64,
    pub max_components: usize,
    pub min_components: usize,
}

impl SummaryStats {
    /// Verification rate as a percentage.
    pub fn verification_percent(&self) -> f64 {
        self.verification_rate * 100.0
    }
}

/// Metadata about the run that produced a summary.
#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    /// Directory that was scanned.
    pub input_dir: String,
    /// Path of the delimited table.
    pub output_path: String,
    /// Date and time of the run.
    pub generated_at: DateTime<Utc>,
    /// Wall-clock duration in seconds.
    pub duration_seconds: f64,
}

/// Everything the summary renderers need.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryReport {
    pub metadata: ReportMetadata,
    pub summary: SummaryStats,
    pub skipped: Vec<SkippedFile>,
}
