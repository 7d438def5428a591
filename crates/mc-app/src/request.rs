use std::fmt;
use std::path::PathBuf;

use mc_core::{EntityKind, Selector};

use crate::config::CopyOptions;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyDirection {
    ToText,
    FromText,
    ToCsv,
}

impl fmt::Display for CopyDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CopyDirection::ToText => "to-text",
            CopyDirection::FromText => "from-text",
            CopyDirection::ToCsv => "to-csv",
        })
    }
}

/// Unit of work, fixed when the operation starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CopyScope {
    Model,
    Run(Selector),
    Workset(Selector),
    Task(Selector),
}

impl CopyScope {
    pub fn kind(&self) -> Option<EntityKind> {
        match self {
            CopyScope::Model => None,
            CopyScope::Run(_) => Some(EntityKind::Run),
            CopyScope::Workset(_) => Some(EntityKind::Workset),
            CopyScope::Task(_) => Some(EntityKind::Task),
        }
    }

    pub fn selector(&self) -> Option<&Selector> {
        match self {
            CopyScope::Model => None,
            CopyScope::Run(s) | CopyScope::Workset(s) | CopyScope::Task(s) => Some(s),
        }
    }
}

impl fmt::Display for CopyScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.kind(), self.selector()) {
            (Some(kind), Some(sel)) => write!(f, "{} {}", kind, sel),
            _ => f.write_str("model"),
        }
    }
}

/// Request for one copy operation.
pub struct CopyRequest<'a> {
    /// Model name or digest.
    pub model: &'a str,
    pub scope: CopyScope,
    /// Output directory for export, input directory for import.
    pub dir: PathBuf,
    pub options: CopyOptions,
}

/// What one copy operation touched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CopySummary {
    pub model: String,
    pub root: PathBuf,
    pub runs: usize,
    pub worksets: usize,
    pub tasks: usize,
    /// Value and metadata files written or read.
    pub files: usize,
    /// Entities skipped because the store already had them.
    pub skipped: usize,
}
