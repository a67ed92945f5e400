//! Error taxonomy for a setup analysis run.
//!
//! Only [`AnalyzerError::FileParse`] is recoverable: the scanner turns it
//! into a skipped entry and moves on. Every other variant aborts the run.

use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyzerError {
    #[error("Input directory not found or unreadable: {path}: {reason}")]
    InputNotFound { path: PathBuf, reason: String },

    #[error("Failed to parse setup file {path}: {reason}")]
    FileParse { path: PathBuf, reason: String },

    #[error("Failed to write output {path}: {reason}")]
    OutputWrite { path: PathBuf, reason: String },

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl AnalyzerError {
    pub fn input_not_found(path: &Path, reason: impl ToString) -> Self {
        Self::InputNotFound {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }

    pub fn file_parse(path: &Path, reason: impl ToString) -> Self {
        Self::FileParse {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }

    pub fn output_write(path: &Path, reason: impl ToString) -> Self {
        Self::OutputWrite {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_path() {
        let err = AnalyzerError::input_not_found(Path::new("./setups"), "No such file");
        assert!(err.to_string().contains("./setups"));

        let err = AnalyzerError::output_write(Path::new("out.csv"), "Permission denied");
        assert!(err.to_string().contains("out.csv"));
        assert!(err.to_string().contains("Permission denied"));
    }
}
