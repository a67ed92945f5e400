//! Summary report generation.
//!
//! Renders [`SummaryReport`] as the console text block, as Markdown for
//! posting in a commit or pull request comment, or as JSON.

use crate::cli::SummaryFormat;
use crate::models::{RankedEntry, ReportMetadata, SkippedFile, SummaryReport, SummaryStats};
use anyhow::Result;

const RULE_WIDTH: usize = 60;

/// Render the report in the requested format.
pub fn render_summary(report: &SummaryReport, format: SummaryFormat) -> Result<String> {
    match format {
        SummaryFormat::Text => Ok(generate_text_summary(report)),
        SummaryFormat::Markdown => Ok(generate_markdown_summary(report)),
        SummaryFormat::Json => generate_json_summary(report),
    }
}

/// Generate the plain text block printed after a run.
pub fn generate_text_summary(report: &SummaryReport) -> String {
    let s = &report.summary;
    let rule = "=".repeat(RULE_WIDTH);
    let mut out = String::new();

    out.push_str(&format!("\n{}\n", rule));
    out.push_str("SETUP ANALYSIS SUMMARY\n");
    out.push_str(&format!("{}\n", rule));
    out.push_str(&format!("Setup files found: {}\n", s.total_files));
    out.push_str(&format!("Total setup files processed: {}\n", s.processed));
    out.push_str(&format!("Setup files skipped: {}\n", s.skipped));
    out.push_str(&format!("Total unique component files: {}\n", s.unique_components));
    out.push_str(&format!("Average components per setup: {:.1}\n", s.avg_components));
    out.push_str(&format!("Max components in a setup: {}\n", s.max_components));
    out.push_str(&format!("Min components in a setup: {}\n", s.min_components));
    out.push_str(&format!(
        "Verified setups: {}/{} ({:.1}%)\n",
        s.verified,
        s.processed,
        s.verification_percent()
    ));
    out.push_str(&format!(
        "Distinct authors: {} | Distinct collections: {}\n",
        s.distinct_authors, s.distinct_collections
    ));

    out.push_str("\nTop authors:\n");
    push_ranked_text(&mut out, &s.top_authors, "setups");

    out.push_str("\nTop collections:\n");
    push_ranked_text(&mut out, &s.top_collections, "setups");

    out.push_str(&format!(
        "\nMost used component files (top {}):\n",
        s.top_components.len()
    ));
    if s.top_components.is_empty() {
        out.push_str("  (none)\n");
    }
    for (i, entry) in s.top_components.iter().enumerate() {
        out.push_str(&format!(
            "  {}. {}: used {} times\n",
            i + 1,
            entry.label,
            entry.count
        ));
    }

    if !report.skipped.is_empty() {
        out.push_str("\nSkipped files:\n");
        for skipped in &report.skipped {
            out.push_str(&format!("  {}: {}\n", skipped.filename, skipped.reason));
        }
    }

    out.push_str(&format!(
        "\nDetailed results saved to: {}\n",
        report.metadata.output_path
    ));
    out.push_str(&format!("{}\n", rule));

    out
}

fn push_ranked_text(out: &mut String, entries: &[RankedEntry], unit: &str) {
    if entries.is_empty() {
        out.push_str("  (none)\n");
    }
    for entry in entries {
        out.push_str(&format!("  {}: {} {}\n", entry.label, entry.count, unit));
    }
}

/// Generate a Markdown summary.
pub fn generate_markdown_summary(report: &SummaryReport) -> String {
    let mut output = String::new();

    output.push_str("# Setup Analysis Summary\n\n");
    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_totals_section(&report.summary));
    output.push_str(&generate_ranked_section("Top Authors", "Author", &report.summary.top_authors));
    output.push_str(&generate_ranked_section(
        "Top Collections",
        "Collection",
        &report.summary.top_collections,
    ));
    output.push_str(&generate_ranked_section(
        "Most Used Components",
        "Component",
        &report.summary.top_components,
    ));
    output.push_str(&generate_skipped_section(&report.skipped));

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str(&format!("- **Input:** `{}`\n", metadata.input_dir));
    section.push_str(&format!("- **Output:** `{}`\n", metadata.output_path));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!(
        "- **Duration:** {:.2}s\n\n",
        metadata.duration_seconds
    ));

    section
}

fn generate_totals_section(summary: &SummaryStats) -> String {
    let mut section = String::new();

    section.push_str("## Totals\n\n");
    section.push_str("| Metric | Value |\n");
    section.push_str("|:---|---:|\n");
    section.push_str(&format!("| Setups processed | {} |\n", summary.processed));
    section.push_str(&format!("| Setups skipped | {} |\n", summary.skipped));
    section.push_str(&format!(
        "| Verified | {}/{} ({:.1}%) |\n",
        summary.verified,
        summary.processed,
        summary.verification_percent()
    ));
    section.push_str(&format!(
        "| Unique components | {} |\n",
        summary.unique_components
    ));
    section.push_str(&format!(
        "| Components per setup (avg / min / max) | {:.1} / {} / {} |\n",
        summary.avg_components, summary.min_components, summary.max_components
    ));
    section.push_str(&format!("| Distinct authors | {} |\n", summary.distinct_authors));
    section.push_str(&format!(
        "| Distinct collections | {} |\n\n",
        summary.distinct_collections
    ));

    section
}

fn generate_ranked_section(title: &str, label: &str, entries: &[RankedEntry]) -> String {
    if entries.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str(&format!("## {}\n\n", title));
    section.push_str(&format!("| {} | Count |\n", label));
    section.push_str("|:---|---:|\n");
    for entry in entries {
        section.push_str(&format!(
            "| {} | {} |\n",
            escape_cell(&entry.label),
            entry.count
        ));
    }
    section.push('\n');

    section
}

fn generate_skipped_section(skipped: &[SkippedFile]) -> String {
    if skipped.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Skipped Files\n\n");
    for file in skipped {
        section.push_str(&format!(
            "- `{}`: {}\n",
            file.filename,
            file.reason.replace('\n', " ")
        ));
    }
    section.push('\n');

    section
}

fn escape_cell(value: &str) -> String {
    value.replace('|', "\\|").replace('\n', " ")
}

/// Generate a JSON summary.
pub fn generate_json_summary(report: &SummaryReport) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}
