//! Value digests.
//!
//! A digest is SHA-256 over the canonical text of a value table: enum ids
//! instead of codes, `%.15g` floats, no leading run column. Re-exports of
//! the same values therefore hash identically whatever the output options.

use mc_core::McResult;
use sha2::{Digest, Sha256};

use crate::cell::ValueCell;
use crate::convert::ValueLayout;
use crate::row::FlatRow;

pub struct ValueDigest {
    hasher: Sha256,
    layout: ValueLayout,
    row: FlatRow,
}

impl ValueDigest {
    pub fn new(layout: &ValueLayout) -> Self {
        let layout = layout.canonical();
        let mut hasher = Sha256::new();
        hasher.update(layout.columns().join(",").as_bytes());
        hasher.update(b"\n");
        Self {
            hasher,
            layout,
            row: FlatRow::new(),
        }
    }

    pub fn update(&mut self, cell: &ValueCell) -> McResult<()> {
        self.layout.write_row(cell, &mut self.row)?;
        for (i, field) in self.row.fields().iter().enumerate() {
            if i > 0 {
                self.hasher.update(b",");
            }
            self.hasher.update(field.as_bytes());
        }
        self.hasher.update(b"\n");
        Ok(())
    }

    pub fn finish(self) -> String {
        format!("{:x}", self.hasher.finalize())
    }
}

/// Digest of a whole cell sequence.
pub fn digest_cells<'c>(
    layout: &ValueLayout,
    cells: impl IntoIterator<Item = &'c ValueCell>,
) -> McResult<String> {
    let mut digest = ValueDigest::new(layout);
    for cell in cells {
        digest.update(cell)?;
    }
    Ok(digest.finish())
}
