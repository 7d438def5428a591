use std::path::PathBuf;

use thiserror::Error;

pub type TabularResult<T> = Result<T, TabularError>;

#[derive(Error, Debug)]
pub enum TabularError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: PathBuf, source: csv::Error },

    #[error("Unexpected header in {path}: expected [{expected}], found [{found}]")]
    Header {
        path: PathBuf,
        expected: String,
        found: String,
    },

    #[error("{path} line {line}: expected {expected} fields, got {actual}")]
    Arity {
        path: PathBuf,
        line: u64,
        expected: usize,
        actual: usize,
    },

    #[error(transparent)]
    Row(#[from] mc_core::McError),
}

impl TabularError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        TabularError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn csv(path: &std::path::Path, source: csv::Error) -> Self {
        TabularError::Csv {
            path: path.to_path_buf(),
            source,
        }
    }

    /// File is absent, as opposed to present but unreadable or malformed.
    pub fn is_not_found(&self) -> bool {
        matches!(self, TabularError::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}
