//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;

/// setuptally - component usage report for a folder of setup files
///
/// Reads every JSON setup description in a directory, counts the
/// components each one references and writes a semicolon-separated
/// table plus a summary of authors, collections and verification status.
///
/// Examples:
///   setuptally
///   setuptally --input ./setups --output setups_analysis.csv
///   setuptally --summary-output summary.md --summary-format markdown
///   setuptally --dry-run
///   setuptally --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Directory containing the setup JSON files
    ///
    /// Defaults to ./setups, or the value from .setuptally.toml.
    #[arg(short, long, value_name = "DIR", env = "SETUPTALLY_INPUT")]
    pub input: Option<PathBuf>,

    /// Output path for the delimited table
    ///
    /// Defaults to setups_analysis.csv. The file is replaced atomically.
    #[arg(short, long, value_name = "FILE", env = "SETUPTALLY_OUTPUT")]
    pub output: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .setuptally.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Scan sub-directories as well
    #[arg(long)]
    pub recursive: bool,

    /// Field delimiter for the table (single character)
    #[arg(long, value_name = "CHAR")]
    pub delimiter: Option<String>,

    /// Also write the summary to this file
    #[arg(long, value_name = "FILE")]
    pub summary_output: Option<PathBuf>,

    /// Format of the summary file (text, markdown, json)
    #[arg(long, default_value = "text", value_name = "FORMAT")]
    pub summary_format: SummaryFormat,

    /// Number of authors and collections listed in the summary
    #[arg(long, value_name = "COUNT")]
    pub top: Option<usize>,

    /// Exit with code 2 when any setup file had to be skipped
    ///
    /// The table is still written. Useful for CI pipelines.
    #[arg(long)]
    pub fail_on_skipped: bool,

    /// Dry run: list the files that would be scanned and exit
    #[arg(long)]
    pub dry_run: bool,

    /// Generate a default .setuptally.toml configuration file
    #[arg(long)]
    pub init_config: bool,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,
}

/// Output format for the summary file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum SummaryFormat {
    /// Plain text, as printed to the console (default)
    #[default]
    Text,
    /// Markdown tables
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(ref delimiter) = self.delimiter {
            if delimiter.len() != 1 || !delimiter.is_ascii() {
                return Err(format!(
                    "Delimiter must be a single ASCII character, got {:?}",
                    delimiter
                ));
            }
        }

        if self.top == Some(0) {
            return Err("--top must be at least 1".to_string());
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args() -> Args {
        Args {
            input: Some(PathBuf::from("./setups")),
            output: Some(PathBuf::from("out.csv")),
            config: None,
            recursive: false,
            delimiter: None,
            summary_output: None,
            summary_format: SummaryFormat::Text,
            top: None,
            fail_on_skipped: false,
            dry_run: false,
            init_config: false,
            verbose: false,
            quiet: false,
        }
    }

    #[test]
    fn test_parse_defaults() {
        let args = Args::try_parse_from(["setuptally"]).unwrap();
        assert_eq!(args.summary_format, SummaryFormat::Text);
        assert!(!args.dry_run);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_parse_flags() {
        let args = Args::try_parse_from([
            "setuptally",
            "-i",
            "in",
            "-o",
            "table.csv",
            "--summary-format",
            "markdown",
            "--fail-on-skipped",
            "--top",
            "3",
        ])
        .unwrap();
        assert_eq!(args.input, Some(PathBuf::from("in")));
        assert_eq!(args.output, Some(PathBuf::from("table.csv")));
        assert_eq!(args.summary_format, SummaryFormat::Markdown);
        assert!(args.fail_on_skipped);
        assert_eq!(args.top, Some(3));
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_delimiter() {
        let mut args = make_args();
        args.delimiter = Some(",".to_string());
        assert!(args.validate().is_ok());

        args.delimiter = Some(";;".to_string());
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }
}
