//! Fixed-arity text rows.

use core::fmt::{Display, Write};

use mc_core::{FloatFormat, McError, McResult, NULL_MARKER, escape_null_text};

/// One output line as an ordered list of text fields.
///
/// The producer keeps a single `FlatRow` and refills it for every line;
/// field buffers are reused rather than reallocated.
#[derive(Debug, Default, Clone)]
pub struct FlatRow {
    fields: Vec<String>,
    len: usize,
}

impl FlatRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn fields(&self) -> &[String] {
        &self.fields[..self.len]
    }

    fn slot(&mut self) -> &mut String {
        if self.len == self.fields.len() {
            self.fields.push(String::new());
        }
        let s = &mut self.fields[self.len];
        s.clear();
        self.len += 1;
        s
    }

    pub fn push_str(&mut self, v: &str) {
        self.slot().push_str(v);
    }

    pub fn push<T: Display>(&mut self, v: T) {
        let _ = write!(self.slot(), "{}", v);
    }

    /// Absent values are written as [`NULL_MARKER`], never as empty text.
    /// Present text equal to the marker is escaped.
    pub fn push_opt(&mut self, v: Option<&str>) {
        match v {
            Some(v) => self.push_str(&escape_null_text(v)),
            None => self.push_str(NULL_MARKER),
        }
    }

    pub fn push_bool(&mut self, v: bool) {
        self.push_str(if v { "1" } else { "0" });
    }

    pub fn push_float(&mut self, v: f64, format: &FloatFormat) {
        format.write_to(v, self.slot());
    }
}

/// Lazy producer of rows for one destination table.
///
/// Column list and arity are fixed before the first row is pulled.
pub trait RowSource {
    fn columns(&self) -> &[String];

    /// Next row, or `None` once the source is exhausted.
    fn next_row(&mut self) -> McResult<Option<&[String]>>;
}

pub(crate) fn check_arity(table: &str, expected: usize, row: &FlatRow) -> McResult<()> {
    if row.len() != expected {
        return Err(McError::Arity {
            table: table.to_string(),
            expected,
            actual: row.len(),
        });
    }
    Ok(())
}

/// Drain a source into owned rows.
pub fn collect_rows(source: &mut dyn RowSource) -> McResult<Vec<Vec<String>>> {
    let mut rows = Vec::new();
    while let Some(fields) = source.next_row()? {
        rows.push(fields.to_vec());
    }
    Ok(rows)
}

/// Column list from static names.
pub fn column_names(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_reuses_buffers() {
        let mut row = FlatRow::new();
        row.push(1);
        row.push_str("abc");
        row.push_opt(None);
        assert_eq!(row.fields(), ["1", "abc", "NULL"]);

        row.clear();
        assert!(row.is_empty());
        row.push_opt(Some(""));
        assert_eq!(row.fields(), [""]);
        assert_eq!(row.len(), 1);

        row.clear();
        row.push_opt(Some("NULL"));
        assert_eq!(row.fields(), ["\\NULL"]);
    }

    #[test]
    fn float_uses_format() {
        let mut row = FlatRow::new();
        row.push_float(10.5, &FloatFormat::parse("%.2f").unwrap());
        row.push_bool(true);
        assert_eq!(row.fields(), ["10.50", "1"]);
    }
}
