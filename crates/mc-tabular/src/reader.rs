//! Table reader with header and arity validation.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use mc_flat::FlatRow;

use crate::{BOM, TabularError, TabularResult, TextFormat};

pub struct TableReader {
    path: PathBuf,
    inner: csv::Reader<BufReader<File>>,
    record: csv::StringRecord,
    row: FlatRow,
    arity: usize,
}

impl TableReader {
    /// Open `path` and check that its header equals `columns`.
    pub fn open(path: &Path, columns: &[String], format: TextFormat) -> TabularResult<Self> {
        let file = File::open(path).map_err(|e| TabularError::io(path, e))?;
        let mut buf = BufReader::new(file);
        let starts_with_bom = buf
            .fill_buf()
            .map_err(|e| TabularError::io(path, e))?
            .starts_with(BOM);
        if starts_with_bom {
            buf.consume(BOM.len());
        }

        let mut inner = csv::ReaderBuilder::new()
            .delimiter(format.delimiter)
            .has_headers(true)
            .flexible(true)
            .from_reader(buf);
        let header = inner
            .headers()
            .map_err(|e| TabularError::csv(path, e))?;
        if header.len() != columns.len() || header.iter().zip(columns).any(|(h, c)| h != c) {
            return Err(TabularError::Header {
                path: path.to_path_buf(),
                expected: columns.join(","),
                found: header.iter().collect::<Vec<_>>().join(","),
            });
        }

        Ok(Self {
            path: path.to_path_buf(),
            inner,
            record: csv::StringRecord::new(),
            row: FlatRow::new(),
            arity: columns.len(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Next data row, or `None` at end of file. A row with the wrong number
    /// of fields fails the read.
    pub fn next_row(&mut self) -> TabularResult<Option<&[String]>> {
        let more = self
            .inner
            .read_record(&mut self.record)
            .map_err(|e| TabularError::csv(&self.path, e))?;
        if !more {
            return Ok(None);
        }
        if self.record.len() != self.arity {
            return Err(TabularError::Arity {
                path: self.path.clone(),
                line: self.record.position().map_or(0, |p| p.line()),
                expected: self.arity,
                actual: self.record.len(),
            });
        }
        self.row.clear();
        for field in &self.record {
            self.row.push_str(field);
        }
        Ok(Some(self.row.fields()))
    }
}

/// Read a whole table into owned rows.
pub fn read_rows(
    path: &Path,
    columns: &[String],
    format: TextFormat,
) -> TabularResult<Vec<Vec<String>>> {
    let mut reader = TableReader::open(path, columns, format)?;
    let mut rows = Vec::new();
    while let Some(fields) = reader.next_row()? {
        rows.push(fields.to_vec());
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mc_flat::column_names;
    use std::fs;

    #[test]
    fn reads_quoted_fields_after_bom() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.csv");
        fs::write(&path, "\u{feff}a,b\n1,\"x, \"\"y\"\"\"\n2,\n").unwrap();

        let rows = read_rows(&path, &column_names(&["a", "b"]), TextFormat::default()).unwrap();
        assert_eq!(rows, vec![vec!["1", "x, \"y\""], vec!["2", ""]]);
    }

    #[test]
    fn wrong_header_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.csv");
        fs::write(&path, "a,c\n1,2\n").unwrap();
        assert!(matches!(
            read_rows(&path, &column_names(&["a", "b"]), TextFormat::default()),
            Err(TabularError::Header { .. })
        ));
    }

    #[test]
    fn short_row_reports_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.csv");
        fs::write(&path, "a,b\n1,2\n3\n").unwrap();
        let err = read_rows(&path, &column_names(&["a", "b"]), TextFormat::default()).unwrap_err();
        assert!(matches!(err, TabularError::Arity { line: 3, actual: 1, .. }));
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_rows(&dir.path().join("nope.csv"), &[], TextFormat::default()).unwrap_err();
        assert!(err.is_not_found());
    }
}
