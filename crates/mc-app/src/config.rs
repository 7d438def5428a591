//! Copy options and the YAML options file.

use std::path::Path;

use mc_core::FloatFormat;
use mc_flat::{CellOptions, LeadingField};
use mc_paths::NamePolicy;
use mc_tabular::TextFormat;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Delimiter {
    #[default]
    Comma,
    Tab,
}

/// Which identity fills the leading column of all-in-one value files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeadingColumn {
    Id,
    Name,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CopyOptions {
    /// Write dimension items as enum ids instead of enum codes.
    pub use_enum_ids: bool,
    /// printf-style float format, e.g. `%.15g` or `%.2f`.
    pub float_format: String,
    pub id_policy: NamePolicy,
    pub bom: bool,
    pub delimiter: Delimiter,
    pub no_accumulators: bool,
    pub no_microdata: bool,
    /// Flat export only: put values of every run (or workset) into shared files.
    pub all_in_one: Option<LeadingColumn>,
    pub check_digest: bool,
}

impl Default for CopyOptions {
    fn default() -> Self {
        Self {
            use_enum_ids: false,
            float_format: mc_core::DEFAULT_FLOAT_FORMAT.to_string(),
            id_policy: NamePolicy::default(),
            bom: false,
            delimiter: Delimiter::default(),
            no_accumulators: false,
            no_microdata: false,
            all_in_one: None,
            check_digest: true,
        }
    }
}

impl CopyOptions {
    pub fn text_format(&self) -> TextFormat {
        let base = match self.delimiter {
            Delimiter::Comma => TextFormat::default(),
            Delimiter::Tab => TextFormat::tab(),
        };
        TextFormat {
            bom: self.bom,
            ..base
        }
    }

    pub fn cell_options(&self, leading: Option<LeadingField>) -> AppResult<CellOptions> {
        let float_format = FloatFormat::parse(&self.float_format)
            .map_err(|e| AppError::Config(e.to_string()))?;
        Ok(CellOptions {
            use_enum_ids: self.use_enum_ids,
            float_format,
            leading,
        })
    }
}

/// Load options from a YAML file. Absent keys keep their defaults.
pub fn load_options(path: &Path) -> AppResult<CopyOptions> {
    let content = std::fs::read_to_string(path).map_err(|e| AppError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    let options: CopyOptions = serde_yaml::from_str(&content)
        .map_err(|e| AppError::Config(format!("Failed to parse options YAML: {}", e)))?;

    options.cell_options(None)?;
    Ok(options)
}
