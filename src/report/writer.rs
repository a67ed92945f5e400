//! Delimited table output.
//!
//! Every file this tool produces is written to a temporary file next to
//! the destination and renamed over it, so readers only ever see the old
//! content or the complete new content.

use crate::analysis::SetupTable;
use crate::error::AnalyzerError;
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

/// Serialize a table with the given delimiter.
pub fn table_to_bytes(table: &SetupTable, delimiter: u8) -> Result<Vec<u8>, csv::Error> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .quote_style(csv::QuoteStyle::Necessary)
        .from_writer(Vec::new());

    writer.write_record(&table.header)?;
    for row in &table.rows {
        writer.write_record(row)?;
    }

    writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))
}

/// Write the table to `path`, replacing any previous file.
pub fn write_table(table: &SetupTable, path: &Path, delimiter: u8) -> Result<(), AnalyzerError> {
    let bytes = table_to_bytes(table, delimiter).map_err(|e| AnalyzerError::output_write(path, e))?;
    write_atomic(path, &bytes)?;
    debug!(
        "Wrote {} rows x {} columns to {}",
        table.rows.len(),
        table.header.len(),
        path.display()
    );
    Ok(())
}

/// Replace `path` with `contents` via a temporary file and rename.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), AnalyzerError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    if path.is_dir() {
        return Err(AnalyzerError::output_write(path, "path is a directory"));
    }

    fs::create_dir_all(parent).map_err(|e| AnalyzerError::output_write(path, e))?;

    let mut tmp = NamedTempFile::new_in(parent).map_err(|e| AnalyzerError::output_write(path, e))?;
    tmp.write_all(contents)
        .and_then(|_| tmp.as_file().sync_all())
        .map_err(|e| AnalyzerError::output_write(path, e))?;

    // The temp file starts owner-only; give the result the mode of the file it replaces
    let permissions = match fs::metadata(path) {
        Ok(existing) => Some(existing.permissions()),
        Err(_) => default_permissions(),
    };
    if let Some(permissions) = permissions {
        tmp.as_file()
            .set_permissions(permissions)
            .map_err(|e| AnalyzerError::output_write(path, e))?;
    }

    tmp.persist(path)
        .map_err(|e| AnalyzerError::output_write(path, e.error))?;

    Ok(())
}

/// Mode for a file that did not exist before: `rw-r--r--`.
#[cfg(unix)]
fn default_permissions() -> Option<fs::Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Some(fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn default_permissions() -> Option<fs::Permissions> {
    None
}
