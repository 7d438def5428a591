use std::path::PathBuf;

use thiserror::Error;

pub type PathResult<T> = Result<T, PathError>;

#[derive(Error, Debug)]
pub enum PathError {
    /// Nothing on disk matches the requested entity.
    #[error("{kind} {selector} not found in {root}")]
    NotFound {
        kind: mc_core::EntityKind,
        selector: String,
        root: PathBuf,
    },

    #[error("Invalid name: {what}")]
    InvalidName { what: String },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Bad name pattern: {0}")]
    Pattern(#[from] regex::Error),
}

impl PathError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, PathError::NotFound { .. })
    }
}
