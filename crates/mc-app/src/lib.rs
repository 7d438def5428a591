//! Copy service layer for modelcopy.
//!
//! Drives one copy operation at a time between a [`ModelStore`] and the
//! text form: JSON metadata documents plus CSV value tables, or flat CSV
//! metadata tables. Shared by the command line and the tests.

pub mod config;
pub mod error;
pub mod from_text;
pub mod listing;
pub mod memory;
pub mod progress;
pub mod request;
mod scope;
pub mod store;
pub mod to_csv;
pub mod to_text;
mod values;

pub use config::{CopyOptions, Delimiter, LeadingColumn, load_options};
pub use error::{AppError, AppResult};
pub use from_text::copy_from_text;
pub use listing::{EntitySummary, list_entities, list_models};
pub use memory::MemoryStore;
pub use progress::{CopyProgressEvent, CopyStage, ProgressCallback};
pub use request::{CopyDirection, CopyRequest, CopyScope, CopySummary};
pub use store::{
    CellCursor, Inserted, ModelStore, ModelSummary, NamedCells, RunValues, STORE_SCHEMA_VERSION,
    ValueOwner,
};
pub use to_csv::{ALL_RUNS_DIR, ALL_SETS_DIR, copy_to_csv, load_csv_tree};
pub use to_text::copy_to_text;
