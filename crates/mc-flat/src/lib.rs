//! mc-flat: flattening of the metadata tree and value cells into rows.
//!
//! - row: fixed-arity text rows and the row source trait
//! - sequencer: explicit-cursor walks over nested lists
//! - meta_tables: catalogue of flat metadata tables
//! - unflatten: rebuild a metadata tree from flat tables
//! - cell / convert: value cells and their row layouts
//! - digest: value digests over canonical rows

pub mod cell;
pub mod convert;
pub mod digest;
pub mod meta_tables;
pub mod row;
pub mod sequencer;
pub mod unflatten;

pub use cell::*;
pub use convert::{CellOptions, LeadingField, TableView, ValueLayout};
pub use digest::{ValueDigest, digest_cells};
pub use meta_tables::{META_TABLES, MetaTable, meta_table};
pub use row::{FlatRow, RowSource, collect_rows, column_names};
pub use sequencer::{ListRows, PairCursor, PairRows, TripleCursor, TripleRows};
pub use unflatten::unflatten;
