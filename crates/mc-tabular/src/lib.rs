//! mc-tabular: delimited text tables.
//!
//! Writing goes through a per-operation [`WriteRegistry`] so several
//! producers can append to one file with a single header. Reading validates
//! the header and the arity of every line.

pub mod error;
pub mod reader;
pub mod writer;

pub use error::{TabularError, TabularResult};
pub use reader::{TableReader, read_rows};
pub use writer::{TableWriter, WriteRegistry, write_source};

/// UTF-8 byte order mark.
pub const BOM: &[u8] = b"\xEF\xBB\xBF";

/// Text layout shared by the writer and the reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextFormat {
    pub delimiter: u8,
    /// Write a leading byte order mark into new files.
    pub bom: bool,
}

impl Default for TextFormat {
    fn default() -> Self {
        Self {
            delimiter: b',',
            bom: false,
        }
    }
}

impl TextFormat {
    pub fn tab() -> Self {
        Self {
            delimiter: b'\t',
            ..Self::default()
        }
    }
}
