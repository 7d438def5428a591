//! Error types for the mc-app service layer.

use std::path::PathBuf;

use mc_core::McError;
use mc_meta::MetaError;
use mc_paths::PathError;
use mc_tabular::TabularError;

/// One copy operation fails with exactly one of these.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Requested entity or file is absent.
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Cannot resolve {0}")]
    Resolution(String),

    /// Producer/consumer contract bug rather than bad input.
    #[error("Invariant violated: {0}")]
    Invariant(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Options error: {0}")]
    Config(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::NotFound(_))
    }
}

impl From<McError> for AppError {
    fn from(err: McError) -> Self {
        match err {
            McError::Invariant { .. } | McError::Arity { .. } => {
                AppError::Invariant(err.to_string())
            }
            McError::InvalidArg { .. } | McError::Parse { .. } | McError::UnknownEnum { .. } => {
                AppError::Validation(err.to_string())
            }
        }
    }
}

impl From<MetaError> for AppError {
    fn from(err: MetaError) -> Self {
        match err {
            MetaError::Io { path, source } => {
                if source.kind() == std::io::ErrorKind::NotFound {
                    AppError::NotFound(path.display().to_string())
                } else {
                    AppError::Io { path, source }
                }
            }
            other => AppError::Validation(other.to_string()),
        }
    }
}

impl From<TabularError> for AppError {
    fn from(err: TabularError) -> Self {
        match err {
            TabularError::Io { path, source } => {
                if source.kind() == std::io::ErrorKind::NotFound {
                    AppError::NotFound(path.display().to_string())
                } else {
                    AppError::Io { path, source }
                }
            }
            TabularError::Row(e) => e.into(),
            other => AppError::Validation(other.to_string()),
        }
    }
}

impl From<PathError> for AppError {
    fn from(err: PathError) -> Self {
        match err {
            PathError::NotFound { .. } => AppError::NotFound(err.to_string()),
            PathError::Io { path, source } => AppError::Io { path, source },
            PathError::InvalidName { .. } => AppError::Resolution(err.to_string()),
            PathError::Pattern(_) => AppError::Invariant(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_maps_to_not_found() {
        let err: AppError = TabularError::Io {
            path: PathBuf::from("a.csv"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        }
        .into();
        assert!(err.is_not_found());

        let err: AppError = TabularError::Io {
            path: PathBuf::from("a.csv"),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        }
        .into();
        assert!(matches!(err, AppError::Io { .. }));
    }

    #[test]
    fn row_errors_keep_their_bucket() {
        let err: AppError = TabularError::Row(McError::invariant("cursor")).into();
        assert!(matches!(err, AppError::Invariant(_)));
        let err: AppError = McError::parse("float", "x").into();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
