//! Table writer with append-merge.

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use mc_flat::RowSource;
use tracing::debug;

use crate::{BOM, TabularError, TabularResult, TextFormat};

/// Files created during one copy operation, with their header.
///
/// The first open of a path truncates it and writes the header; later opens
/// of the same path append data rows only.
#[derive(Debug, Default)]
pub struct WriteRegistry {
    created: HashMap<PathBuf, Vec<String>>,
}

impl WriteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.created.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.created.len()
    }

    pub fn is_empty(&self) -> bool {
        self.created.is_empty()
    }

    pub fn open(
        &mut self,
        path: &Path,
        columns: &[String],
        format: TextFormat,
    ) -> TabularResult<TableWriter> {
        if let Some(header) = self.created.get(path) {
            if header.as_slice() != columns {
                return Err(TabularError::Header {
                    path: path.to_path_buf(),
                    expected: header.join(","),
                    found: columns.join(","),
                });
            }
            let file = OpenOptions::new()
                .append(true)
                .open(path)
                .map_err(|e| TabularError::io(path, e))?;
            debug!("Appending to {}", path.display());
            return Ok(TableWriter::new(path, file, columns.len(), format));
        }

        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|e| TabularError::io(dir, e))?;
        }
        let mut file = File::create(path).map_err(|e| TabularError::io(path, e))?;
        if format.bom {
            file.write_all(BOM).map_err(|e| TabularError::io(path, e))?;
        }
        let mut writer = TableWriter::new(path, file, columns.len(), format);
        writer
            .inner
            .write_record(columns)
            .map_err(|e| TabularError::csv(path, e))?;
        self.created.insert(path.to_path_buf(), columns.to_vec());
        debug!("Created {}", path.display());
        Ok(writer)
    }
}

pub struct TableWriter {
    path: PathBuf,
    inner: csv::Writer<File>,
    arity: usize,
    rows: usize,
}

impl TableWriter {
    fn new(path: &Path, file: File, arity: usize, format: TextFormat) -> Self {
        let inner = csv::WriterBuilder::new()
            .delimiter(format.delimiter)
            .terminator(csv::Terminator::Any(b'\n'))
            .has_headers(false)
            .from_writer(file);
        Self {
            path: path.to_path_buf(),
            inner,
            arity,
            rows: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write_row(&mut self, fields: &[String]) -> TabularResult<()> {
        if fields.len() != self.arity {
            return Err(TabularError::Arity {
                path: self.path.clone(),
                line: self.rows as u64 + 2,
                expected: self.arity,
                actual: fields.len(),
            });
        }
        self.inner
            .write_record(fields)
            .map_err(|e| TabularError::csv(&self.path, e))?;
        self.rows += 1;
        Ok(())
    }

    /// Flush and return the number of data rows written by this writer.
    pub fn finish(mut self) -> TabularResult<usize> {
        self.inner
            .flush()
            .map_err(|e| TabularError::io(&self.path, e))?;
        Ok(self.rows)
    }
}

/// Write every row of `source` to `path`.
pub fn write_source(
    registry: &mut WriteRegistry,
    path: &Path,
    format: TextFormat,
    source: &mut dyn RowSource,
) -> TabularResult<usize> {
    let mut writer = registry.open(path, source.columns(), format)?;
    while let Some(fields) = source.next_row()? {
        writer.write_row(fields)?;
    }
    writer.finish()
}
