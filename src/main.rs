//! setuptally - component usage report for a folder of setup files
//!
//! Scans a directory of JSON setup descriptions, counts how often each
//! component is referenced, and writes a semicolon-separated table along
//! with a summary of verification status, authors and collections.
//!
//! Exit codes:
//!   0 - Success (also when no setup files were found)
//!   1 - Fatal error (missing input directory, unwritable output, bad config)
//!   2 - Some files were skipped and --fail-on-skipped was given

mod analysis;
mod cli;
mod config;
mod error;
mod models;
mod report;
mod scanner;

use analysis::{summarize, Accumulator, SetupTable, SummaryLimits};
use anyhow::{Context, Result};
use chrono::Utc;
use cli::{Args, SummaryFormat};
use config::{Config, DEFAULT_CONFIG_FILE};
use models::{ReportMetadata, SummaryReport};
use scanner::{ScanConfig, SetupScanner};
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    info!("setuptally v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run(args) {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Analysis failed: {:#}", e);
            eprintln!("\nError: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .setuptally.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(DEFAULT_CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "{} already exists. Remove it first or edit it manually.",
            DEFAULT_CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", DEFAULT_CONFIG_FILE))?;

    println!("Created {} with default settings.", DEFAULT_CONFIG_FILE);
    Ok(())
}

/// Initialize logging based on verbosity settings.
///
/// `RUST_LOG` directives, when set, refine the level chosen by -v/-q.
fn init_logging(args: &Args) {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(args.log_level()).into())
        .from_env_lossy();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Run one analysis pass. Returns the exit code (0 or 2).
fn run(args: Args) -> Result<i32> {
    let start_time = Instant::now();

    // Load configuration
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);
    config.validate()?;

    let input_dir = config.general.input.clone();
    let output_path = config.general.output.clone();
    let delimiter = config.report.delimiter_byte()?;

    if args.summary_output.as_ref() == Some(&output_path) {
        anyhow::bail!(
            "--summary-output must differ from the table output ({})",
            output_path.display()
        );
    }

    let mut scan_config = ScanConfig::new(&config.scanner, &config.components);
    scan_config.show_progress = !args.quiet;
    let setup_scanner = SetupScanner::new(input_dir.clone(), scan_config);

    // Handle --dry-run: list files and exit
    if args.dry_run {
        return handle_dry_run(&setup_scanner);
    }

    // Pass 1: parse every file into the accumulator
    info!("Scanning setups in {}", input_dir.display());
    let outcome = setup_scanner.scan()?;
    debug!("Scanned {} files", outcome.total_files());

    let mut acc = Accumulator::new();
    acc.extend(outcome.records);
    for skipped in outcome.skipped {
        acc.add_skipped(skipped);
    }

    if acc.records().is_empty() {
        warn!("No valid setup files found; writing a header-only table");
    }
    if acc.tally().is_empty() {
        debug!("No component references found");
    }

    // Pass 2: the full component vocabulary is known, materialize rows
    let table = SetupTable::build(&acc, &config.components.column_prefix);
    info!(
        "Found {} unique component files across {} setups",
        table.components.len(),
        table.rows.len()
    );

    report::write_table(&table, &output_path, delimiter)?;
    info!("CSV database saved to: {}", output_path.display());

    let summary = summarize(
        &acc,
        SummaryLimits {
            authors: config.report.top_authors,
            collections: config.report.top_collections,
            components: config.report.top_components,
        },
    );

    let summary_report = SummaryReport {
        metadata: ReportMetadata {
            input_dir: input_dir.display().to_string(),
            output_path: output_path.display().to_string(),
            generated_at: Utc::now(),
            duration_seconds: start_time.elapsed().as_secs_f64(),
        },
        summary,
        skipped: acc.skipped().to_vec(),
    };

    if !args.quiet {
        println!("{}", report::render_summary(&summary_report, SummaryFormat::Text)?);
    }

    if let Some(ref summary_path) = args.summary_output {
        let rendered = report::render_summary(&summary_report, args.summary_format)?;
        report::write_atomic(summary_path, rendered.as_bytes())?;
        info!("Summary saved to: {}", summary_path.display());
    }

    info!("Analysis complete!");

    if args.fail_on_skipped && !summary_report.skipped.is_empty() {
        eprintln!(
            "\n{} setup file(s) could not be parsed. Failing (exit code 2).",
            summary_report.skipped.len()
        );
        return Ok(2);
    }

    Ok(0)
}

/// Handle --dry-run: list the files that would be scanned, write nothing.
fn handle_dry_run(setup_scanner: &SetupScanner) -> Result<i32> {
    println!("\nDry run: listing setup files (nothing is written)...\n");

    let files = setup_scanner.discover()?;

    if files.is_empty() {
        println!("   No matching setup files found.");
    } else {
        for file in &files {
            println!("     {} ({} bytes)", file.path, file.size);
        }
        println!("\n   Total: {} files", files.len());
    }

    Ok(0)
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", DEFAULT_CONFIG_FILE);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {:#}", e);
            Ok(Config::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn make_args(input: &Path, output: &Path) -> Args {
        Args {
            input: Some(input.to_path_buf()),
            output: Some(output.to_path_buf()),
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
            quiet: true,
        }
    }

    fn write_scenario(dir: &Path) {
        fs::write(
            dir.join("a.json"),
            r#"{
                "name": "A",
                "uc2_verified": true,
                "author": "alice",
                "uc2_components": [{"file": "lens"}, {"file": "lens"}, {"file": "camera"}]
            }"#,
        )
        .unwrap();
        fs::write(
            dir.join("b.json"),
            r#"{"name": "B", "uc2_verified": false, "author": "bob",
                "uc2_components": [{"file": "camera"}]}"#,
        )
        .unwrap();
        fs::write(dir.join("c.json"), "{\"name\": \"C\", \"uc2_comp").unwrap();
    }

    fn read_table(path: &Path) -> (Vec<String>, Vec<Vec<String>>) {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b';')
            .from_path(path)
            .unwrap();
        let header = reader.headers().unwrap().iter().map(String::from).collect();
        let rows = reader
            .records()
            .map(|r| r.unwrap().iter().map(String::from).collect())
            .collect();
        (header, rows)
    }

    fn column(header: &[String], rows: &[Vec<String>], name: &str) -> Vec<String> {
        let idx = header.iter().position(|h| h == name).unwrap();
        rows.iter().map(|row| row[idx].clone()).collect()
    }

    #[test]
    fn test_run_scenario() {
        let input = TempDir::new().unwrap();
        let out_dir = TempDir::new().unwrap();
        write_scenario(input.path());
        let output = out_dir.path().join("setups_analysis.csv");
        let summary = out_dir.path().join("summary.json");

        let mut args = make_args(input.path(), &output);
        args.summary_output = Some(summary.clone());
        args.summary_format = SummaryFormat::Json;

        assert_eq!(run(args).unwrap(), 0);

        let (header, rows) = read_table(&output);
        assert_eq!(rows.len(), 2);
        assert_eq!(column(&header, &rows, "name"), vec!["A", "B"]);
        assert_eq!(column(&header, &rows, "component_lens"), vec!["2", "0"]);
        assert_eq!(column(&header, &rows, "component_camera"), vec!["1", "1"]);

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&summary).unwrap()).unwrap();
        assert_eq!(value["summary"]["processed"], 2);
        assert_eq!(value["summary"]["skipped"], 1);
        assert_eq!(value["summary"]["verification_rate"], 0.5);
        assert_eq!(value["skipped"][0]["filename"], "c.json");
    }

    #[test]
    fn test_run_is_byte_identical() {
        let input = TempDir::new().unwrap();
        let out_dir = TempDir::new().unwrap();
        write_scenario(input.path());
        let output = out_dir.path().join("out.csv");

        run(make_args(input.path(), &output)).unwrap();
        let first = fs::read(&output).unwrap();
        run(make_args(input.path(), &output)).unwrap();
        let second = fs::read(&output).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_run_fail_on_skipped() {
        let input = TempDir::new().unwrap();
        let out_dir = TempDir::new().unwrap();
        write_scenario(input.path());
        let output = out_dir.path().join("out.csv");

        let mut args = make_args(input.path(), &output);
        args.fail_on_skipped = true;

        assert_eq!(run(args).unwrap(), 2);
        assert!(output.exists());
    }

    #[test]
    fn test_run_empty_input_writes_header() {
        let input = TempDir::new().unwrap();
        let out_dir = TempDir::new().unwrap();
        let output = out_dir.path().join("out.csv");

        assert_eq!(run(make_args(input.path(), &output)).unwrap(), 0);

        let (header, rows) = read_table(&output);
        assert_eq!(header.len(), analysis::METADATA_COLUMNS.len());
        assert!(rows.is_empty());
    }

    #[test]
    fn test_run_missing_input_leaves_output_untouched() {
        let out_dir = TempDir::new().unwrap();
        let output = out_dir.path().join("out.csv");
        fs::write(&output, "previous").unwrap();

        let args = make_args(&out_dir.path().join("missing"), &output);
        let err = run(args).unwrap_err();

        assert!(err.to_string().contains("missing"));
        assert_eq!(fs::read_to_string(&output).unwrap(), "previous");
    }

    #[test]
    fn test_run_rejects_summary_over_table() {
        let input = TempDir::new().unwrap();
        let out_dir = TempDir::new().unwrap();
        write_scenario(input.path());

        // Output comes from the config file, not from -o
        let output = out_dir.path().join("setups_analysis.csv");
        let config_path = out_dir.path().join("setuptally.toml");
        fs::write(
            &config_path,
            format!("[general]\noutput = {:?}\n", output.display().to_string()),
        )
        .unwrap();

        let mut args = make_args(input.path(), &output);
        args.output = None;
        args.config = Some(config_path);
        args.summary_output = Some(output.clone());

        let err = run(args).unwrap_err();
        assert!(err.to_string().contains("--summary-output"));
        assert!(!output.exists());
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let input = TempDir::new().unwrap();
        let out_dir = TempDir::new().unwrap();
        write_scenario(input.path());
        let output = out_dir.path().join("out.csv");

        let mut args = make_args(input.path(), &output);
        args.dry_run = true;

        assert_eq!(run(args).unwrap(), 0);
        assert!(!output.exists());
    }
}
