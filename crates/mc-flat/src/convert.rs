//! Row layouts for value tables.
//!
//! A [`ValueLayout`] is built once per parameter, output table view or
//! microdata entity. It fixes the column list and converts cells to rows
//! and back, with dimension items written as enum codes or enum ids.

use mc_core::{FloatFormat, McError, McResult, NULL_MARKER, parse_bool, parse_float, parse_int};
use mc_meta::schema::{EntityDef, ModelDef, ParamDef, TableDef};

use crate::cell::*;
use crate::row::FlatRow;

/// Code written for the total item of a dimension with a total.
pub const TOTAL_CODE: &str = "all";

/// Extra first column used when many runs share one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeadingField {
    pub column: String,
    pub value: String,
}

/// Caller choices fixed for one conversion run.
#[derive(Debug, Clone, Default)]
pub struct CellOptions {
    /// Write enum ids instead of enum codes.
    pub use_enum_ids: bool,
    pub float_format: FloatFormat,
    pub leading: Option<LeadingField>,
}

/// Kind of value table, one per file name suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableView {
    Param,
    Expr,
    Acc,
    AllAcc,
    Micro,
}

impl TableView {
    pub fn file_name(self, name: &str) -> String {
        match self {
            TableView::Acc => format!("{}.acc.csv", name),
            TableView::AllAcc => format!("{}.acc-all.csv", name),
            _ => format!("{}.csv", name),
        }
    }
}

/// Dimension item conversion between enum id and code.
#[derive(Debug, Clone)]
struct DimCodec {
    name: String,
    enums: Vec<(i32, String)>,
    total: Option<i32>,
}

impl DimCodec {
    fn new(model: &ModelDef, name: &str, type_id: i32, with_total: bool) -> McResult<Self> {
        let ty = model.type_by_id(type_id).ok_or_else(|| McError::InvalidArg {
            what: format!("dimension '{}' has unknown type id {}", name, type_id),
        })?;
        Ok(Self {
            name: name.to_string(),
            enums: ty.enums.iter().map(|e| (e.enum_id, e.name.clone())).collect(),
            total: with_total.then_some(ty.total_enum_id),
        })
    }

    fn write(&self, id: i32, use_ids: bool, row: &mut FlatRow) -> McResult<()> {
        if use_ids {
            row.push(id);
            return Ok(());
        }
        if let Some((_, code)) = self.enums.iter().find(|(e, _)| *e == id) {
            row.push_str(code);
            return Ok(());
        }
        if self.total == Some(id) {
            row.push_str(TOTAL_CODE);
            return Ok(());
        }
        Err(McError::UnknownEnum {
            dim: self.name.clone(),
            key: id.to_string(),
        })
    }

    fn read(&self, text: &str, use_ids: bool) -> McResult<i32> {
        let found = if use_ids {
            let id = parse_int(text)?;
            self.enums
                .iter()
                .map(|(e, _)| *e)
                .chain(self.total)
                .find(|e| i64::from(*e) == id)
        } else if text == TOTAL_CODE && self.total.is_some() {
            self.total
        } else {
            self.enums.iter().find(|(_, c)| c == text).map(|(e, _)| *e)
        };
        found.ok_or_else(|| McError::UnknownEnum {
            dim: self.name.clone(),
            key: text.to_string(),
        })
    }
}

/// Value conversion for one typed column.
#[derive(Debug, Clone)]
struct ValueCodec {
    kind: ValueKind,
    dim: DimCodec,
}

impl ValueCodec {
    fn new(model: &ModelDef, name: &str, type_id: i32) -> McResult<Self> {
        Ok(Self {
            kind: value_kind(model, type_id)?,
            dim: DimCodec::new(model, name, type_id, false)?,
        })
    }

    fn write(&self, v: &CellValue, opts: &CellOptions, row: &mut FlatRow) -> McResult<()> {
        match (v, self.kind) {
            (CellValue::Null, _) => row.push_str(NULL_MARKER),
            (CellValue::Int(id), ValueKind::Enum) => {
                let id = i32::try_from(*id).map_err(|_| McError::UnknownEnum {
                    dim: self.dim.name.clone(),
                    key: id.to_string(),
                })?;
                self.dim.write(id, opts.use_enum_ids, row)?;
            }
            (CellValue::Int(i), _) => row.push(i),
            (CellValue::Float(f), _) => row.push_float(*f, &opts.float_format),
            (CellValue::Bool(b), _) => row.push(b),
            (CellValue::Text(s), _) => row.push_str(s),
        }
        Ok(())
    }

    fn read(&self, text: &str, opts: &CellOptions) -> McResult<CellValue> {
        if text == NULL_MARKER {
            return Ok(CellValue::Null);
        }
        Ok(match self.kind {
            ValueKind::Int => CellValue::Int(parse_int(text)?),
            ValueKind::Float => CellValue::Float(parse_float(text)?),
            ValueKind::Bool => CellValue::Bool(parse_bool(text)?),
            ValueKind::Text => CellValue::Text(text.to_string()),
            ValueKind::Enum => CellValue::Int(i64::from(self.dim.read(text, opts.use_enum_ids)?)),
        })
    }
}

/// Column list and converter for one value table.
#[derive(Debug, Clone)]
pub struct ValueLayout {
    view: TableView,
    name: String,
    columns: Vec<String>,
    dims: Vec<DimCodec>,
    /// Parameter value, or one per microdata attribute.
    values: Vec<ValueCodec>,
    /// Expression or accumulator (id, name) pairs.
    selectors: Vec<(i32, String)>,
    with_sub_id: bool,
    opts: CellOptions,
}

impl ValueLayout {
    /// Parameter values. Callers ask for the `sub_id` column only when the
    /// parameter has more than one sub-value, or when several runs share
    /// one file.
    pub fn parameter(
        model: &ModelDef,
        param: &ParamDef,
        with_sub_id: bool,
        opts: CellOptions,
    ) -> McResult<Self> {
        let dims = param
            .dims
            .iter()
            .map(|d| DimCodec::new(model, &d.name, d.type_id, false))
            .collect::<McResult<Vec<_>>>()?;
        let mut columns = Vec::new();
        if with_sub_id {
            columns.push("sub_id".to_string());
        }
        columns.extend(dims.iter().map(|d| d.name.clone()));
        columns.push("param_value".to_string());
        Ok(Self::assemble(
            TableView::Param,
            &param.name,
            columns,
            dims,
            vec![ValueCodec::new(model, &param.name, param.type_id)?],
            vec![],
            with_sub_id,
            opts,
        ))
    }

    /// Output table expression values.
    pub fn expressions(model: &ModelDef, table: &TableDef, opts: CellOptions) -> McResult<Self> {
        let dims = table_dims(model, table)?;
        let selector = if opts.use_enum_ids { "expr_id" } else { "expr_name" };
        let mut columns = vec![selector.to_string()];
        columns.extend(dims.iter().map(|d| d.name.clone()));
        columns.push("expr_value".to_string());
        let selectors = table.exprs.iter().map(|e| (e.expr_id, e.name.clone())).collect();
        Ok(Self::assemble(
            TableView::Expr,
            &table.name,
            columns,
            dims,
            vec![],
            selectors,
            false,
            opts,
        ))
    }

    /// Output table accumulator values, one row per accumulator, sub-value and cell.
    pub fn accumulators(model: &ModelDef, table: &TableDef, opts: CellOptions) -> McResult<Self> {
        let dims = table_dims(model, table)?;
        let selector = if opts.use_enum_ids { "acc_id" } else { "acc_name" };
        let mut columns = vec![selector.to_string(), "sub_id".to_string()];
        columns.extend(dims.iter().map(|d| d.name.clone()));
        columns.push("acc_value".to_string());
        let selectors = table.accs.iter().map(|a| (a.acc_id, a.name.clone())).collect();
        Ok(Self::assemble(
            TableView::Acc,
            &table.name,
            columns,
            dims,
            vec![],
            selectors,
            true,
            opts,
        ))
    }

    /// All accumulators of a cell side by side.
    pub fn all_accumulators(
        model: &ModelDef,
        table: &TableDef,
        opts: CellOptions,
    ) -> McResult<Self> {
        let dims = table_dims(model, table)?;
        let mut columns = vec!["sub_id".to_string()];
        columns.extend(dims.iter().map(|d| d.name.clone()));
        columns.extend(table.accs.iter().map(|a| a.name.clone()));
        let selectors = table.accs.iter().map(|a| (a.acc_id, a.name.clone())).collect();
        Ok(Self::assemble(
            TableView::AllAcc,
            &table.name,
            columns,
            dims,
            vec![],
            selectors,
            true,
            opts,
        ))
    }

    /// Microdata records of one entity.
    pub fn microdata(model: &ModelDef, entity: &EntityDef, opts: CellOptions) -> McResult<Self> {
        let values = entity
            .attrs
            .iter()
            .map(|a| ValueCodec::new(model, &a.name, a.type_id))
            .collect::<McResult<Vec<_>>>()?;
        let mut columns = vec!["key".to_string()];
        columns.extend(entity.attrs.iter().map(|a| a.name.clone()));
        Ok(Self::assemble(
            TableView::Micro,
            &entity.name,
            columns,
            vec![],
            values,
            vec![],
            false,
            opts,
        ))
    }

    #[allow(clippy::too_many_arguments)]
    fn assemble(
        view: TableView,
        name: &str,
        mut columns: Vec<String>,
        dims: Vec<DimCodec>,
        values: Vec<ValueCodec>,
        selectors: Vec<(i32, String)>,
        with_sub_id: bool,
        opts: CellOptions,
    ) -> Self {
        if let Some(lead) = &opts.leading {
            columns.insert(0, lead.column.clone());
        }
        Self {
            view,
            name: name.to_string(),
            columns,
            dims,
            values,
            selectors,
            with_sub_id,
            opts,
        }
    }

    pub fn view(&self) -> TableView {
        self.view
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn file_name(&self) -> String {
        self.view.file_name(&self.name)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn options(&self) -> &CellOptions {
        &self.opts
    }

    /// Same layout with a different leading field value, for the next run
    /// in an all-in-one file.
    pub fn set_leading_value(&mut self, value: impl Into<String>) {
        if let Some(lead) = &mut self.opts.leading {
            lead.value = value.into();
        }
    }

    /// Layout with digest options: enum ids, default float format, no
    /// leading column.
    pub fn canonical(&self) -> ValueLayout {
        let mut layout = self.clone();
        if layout.opts.leading.take().is_some() {
            layout.columns.remove(0);
        }
        layout.opts.use_enum_ids = true;
        layout.opts.float_format = FloatFormat::default();
        match layout.view {
            TableView::Expr => layout.columns[0] = "expr_id".to_string(),
            TableView::Acc => layout.columns[0] = "acc_id".to_string(),
            _ => {}
        }
        layout
    }

    fn write_dims(&self, ids: &[i32], row: &mut FlatRow) -> McResult<()> {
        if ids.len() != self.dims.len() {
            return Err(McError::Arity {
                table: self.name.clone(),
                expected: self.dims.len(),
                actual: ids.len(),
            });
        }
        for (dim, id) in self.dims.iter().zip(ids) {
            dim.write(*id, self.opts.use_enum_ids, row)?;
        }
        Ok(())
    }

    fn write_selector(&self, id: i32, row: &mut FlatRow) -> McResult<()> {
        if self.opts.use_enum_ids {
            row.push(id);
            return Ok(());
        }
        let (_, name) = self
            .selectors
            .iter()
            .find(|(s, _)| *s == id)
            .ok_or_else(|| McError::UnknownEnum {
                dim: self.name.clone(),
                key: id.to_string(),
            })?;
        row.push_str(name);
        Ok(())
    }

    fn push_opt_float(&self, v: Option<f64>, row: &mut FlatRow) {
        match v {
            Some(f) => row.push_float(f, &self.opts.float_format),
            None => row.push_str(NULL_MARKER),
        }
    }

    fn mismatch(&self) -> McError {
        McError::invariant(format!(
            "cell kind does not match {:?} layout of '{}'",
            self.view, self.name
        ))
    }

    /// Fill `row` from one cell. The row is cleared first.
    pub fn write_row(&self, cell: &ValueCell, row: &mut FlatRow) -> McResult<()> {
        row.clear();
        if let Some(lead) = &self.opts.leading {
            row.push_str(&lead.value);
        }
        match (self.view, cell) {
            (TableView::Param, ValueCell::Param(c)) => {
                if self.with_sub_id {
                    row.push(c.sub_id);
                }
                self.write_dims(&c.dims, row)?;
                let codec = self.values.first().ok_or_else(|| self.mismatch())?;
                codec.write(&c.value, &self.opts, row)?;
            }
            (TableView::Expr, ValueCell::Expr(c)) => {
                self.write_selector(c.expr_id, row)?;
                self.write_dims(&c.dims, row)?;
                self.push_opt_float(c.value, row);
            }
            (TableView::Acc, ValueCell::Acc(c)) => {
                self.write_selector(c.acc_id, row)?;
                row.push(c.sub_id);
                self.write_dims(&c.dims, row)?;
                self.push_opt_float(c.value, row);
            }
            (TableView::AllAcc, ValueCell::AllAcc(c)) => {
                row.push(c.sub_id);
                self.write_dims(&c.dims, row)?;
                for v in &c.values {
                    self.push_opt_float(*v, row);
                }
            }
            (TableView::Micro, ValueCell::Micro(c)) => {
                row.push(c.key);
                if c.values.len() != self.values.len() {
                    return Err(McError::Arity {
                        table: self.name.clone(),
                        expected: self.values.len(),
                        actual: c.values.len(),
                    });
                }
                for (codec, v) in self.values.iter().zip(&c.values) {
                    codec.write(v, &self.opts, row)?;
                }
            }
            _ => return Err(self.mismatch()),
        }
        if row.len() != self.columns.len() {
            return Err(McError::Arity {
                table: self.name.clone(),
                expected: self.columns.len(),
                actual: row.len(),
            });
        }
        Ok(())
    }

    fn read_dims(&self, fields: &[String]) -> McResult<Vec<i32>> {
        self.dims
            .iter()
            .zip(fields)
            .map(|(dim, text)| dim.read(text, self.opts.use_enum_ids))
            .collect()
    }

    fn read_selector(&self, text: &str) -> McResult<i32> {
        let found = if self.opts.use_enum_ids {
            let id = parse_int(text)?;
            self.selectors
                .iter()
                .find(|(s, _)| i64::from(*s) == id)
                .map(|(s, _)| *s)
        } else {
            self.selectors
                .iter()
                .find(|(_, n)| n == text)
                .map(|(s, _)| *s)
        };
        found.ok_or_else(|| McError::UnknownEnum {
            dim: self.name.clone(),
            key: text.to_string(),
        })
    }

    fn read_opt_float(text: &str) -> McResult<Option<f64>> {
        if text == NULL_MARKER {
            Ok(None)
        } else {
            parse_float(text).map(Some)
        }
    }

    fn read_sub_id(text: &str) -> McResult<i32> {
        i32::try_from(parse_int(text)?).map_err(|_| McError::parse("sub_id", text))
    }

    /// Parse one data row, leading field included when the layout has one.
    pub fn read_row(&self, fields: &[String]) -> McResult<ValueCell> {
        if fields.len() != self.columns.len() {
            return Err(McError::Arity {
                table: self.name.clone(),
                expected: self.columns.len(),
                actual: fields.len(),
            });
        }
        let mut f = fields;
        if self.opts.leading.is_some() {
            f = &f[1..];
        }
        let rank = self.dims.len();
        let cell = match self.view {
            TableView::Param => {
                let (sub_id, rest) = if self.with_sub_id {
                    (Self::read_sub_id(&f[0])?, &f[1..])
                } else {
                    (0, f)
                };
                let codec = self.values.first().ok_or_else(|| self.mismatch())?;
                ValueCell::Param(ParamCell {
                    sub_id,
                    dims: self.read_dims(&rest[..rank])?,
                    value: codec.read(&rest[rank], &self.opts)?,
                })
            }
            TableView::Expr => ValueCell::Expr(ExprCell {
                expr_id: self.read_selector(&f[0])?,
                dims: self.read_dims(&f[1..=rank])?,
                value: Self::read_opt_float(&f[rank + 1])?,
            }),
            TableView::Acc => ValueCell::Acc(AccCell {
                acc_id: self.read_selector(&f[0])?,
                sub_id: Self::read_sub_id(&f[1])?,
                dims: self.read_dims(&f[2..2 + rank])?,
                value: Self::read_opt_float(&f[2 + rank])?,
            }),
            TableView::AllAcc => ValueCell::AllAcc(AllAccCell {
                sub_id: Self::read_sub_id(&f[0])?,
                dims: self.read_dims(&f[1..=rank])?,
                values: f[rank + 1..]
                    .iter()
                    .map(|t| Self::read_opt_float(t))
                    .collect::<McResult<Vec<_>>>()?,
            }),
            TableView::Micro => {
                let key = f[0]
                    .trim()
                    .parse::<u64>()
                    .map_err(|_| McError::parse("microdata key", &f[0]))?;
                ValueCell::Micro(MicroCell {
                    key,
                    values: self
                        .values
                        .iter()
                        .zip(&f[1..])
                        .map(|(codec, t)| codec.read(t, &self.opts))
                        .collect::<McResult<Vec<_>>>()?,
                })
            }
        };
        Ok(cell)
    }
}

fn table_dims(model: &ModelDef, table: &TableDef) -> McResult<Vec<DimCodec>> {
    table
        .dims
        .iter()
        .map(|d| DimCodec::new(model, &d.name, d.type_id, d.is_total))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mc_meta::schema::*;

    fn model() -> ModelDef {
        ModelDef {
            model_id: 1,
            name: "M".to_string(),
            digest: "d".to_string(),
            version: String::new(),
            create_dt: String::new(),
            default_lang: "EN".to_string(),
            langs: vec![],
            texts: vec![],
            types: vec![
                TypeDef {
                    type_id: 7,
                    name: "double".to_string(),
                    digest: String::new(),
                    kind: TypeKind::Simple,
                    total_enum_id: 0,
                    enums: vec![],
                    texts: vec![],
                },
                TypeDef {
                    type_id: 101,
                    name: "AgeGroup".to_string(),
                    digest: String::new(),
                    kind: TypeKind::Classification,
                    total_enum_id: 2,
                    enums: vec![
                        EnumDef {
                            enum_id: 0,
                            name: "young".to_string(),
                        },
                        EnumDef {
                            enum_id: 1,
                            name: "old".to_string(),
                        },
                    ],
                    texts: vec![],
                },
            ],
            params: vec![ParamDef {
                param_id: 0,
                name: "Age".to_string(),
                digest: String::new(),
                rank: 1,
                type_id: 7,
                is_extendable: false,
                is_hidden: false,
                num_cumulated: 0,
                import_digest: None,
                dims: vec![DimDef {
                    dim_id: 0,
                    name: "dim0".to_string(),
                    type_id: 101,
                }],
                texts: vec![],
            }],
            tables: vec![TableDef {
                table_id: 0,
                name: "Income".to_string(),
                digest: String::new(),
                is_user: false,
                rank: 1,
                is_sparse: false,
                expr_pos: 0,
                dims: vec![TableDimDef {
                    dim_id: 0,
                    name: "dim0".to_string(),
                    type_id: 101,
                    is_total: true,
                    dim_size: 3,
                }],
                accs: vec![AccDef {
                    acc_id: 0,
                    name: "acc0".to_string(),
                    is_derived: false,
                    src: String::new(),
                }],
                exprs: vec![ExprDef {
                    expr_id: 0,
                    name: "expr0".to_string(),
                    decimals: 2,
                    src: String::new(),
                }],
                texts: vec![],
            }],
            entities: vec![],
        }
    }

    fn opts(use_enum_ids: bool) -> CellOptions {
        CellOptions {
            use_enum_ids,
            float_format: FloatFormat::parse("%.2f").unwrap(),
            leading: None,
        }
    }

    fn age_rows(use_enum_ids: bool) -> (Vec<String>, Vec<Vec<String>>) {
        let m = model();
        let layout = ValueLayout::parameter(&m, &m.params[0], false, opts(use_enum_ids)).unwrap();
        let mut row = FlatRow::new();
        let mut rows = Vec::new();
        for (id, v) in [(0, 10.5), (1, 20.25)] {
            let cell = ValueCell::Param(ParamCell {
                sub_id: 0,
                dims: vec![id],
                value: CellValue::Float(v),
            });
            layout.write_row(&cell, &mut row).unwrap();
            rows.push(row.fields().to_vec());
        }
        (layout.columns().to_vec(), rows)
    }

    #[test]
    fn age_parameter_numeric_mode() {
        let (header, rows) = age_rows(true);
        assert_eq!(header, vec!["dim0", "param_value"]);
        assert_eq!(rows, vec![vec!["0", "10.50"], vec!["1", "20.25"]]);
    }

    #[test]
    fn age_parameter_symbolic_mode() {
        let (_, rows) = age_rows(false);
        assert_eq!(rows, vec![vec!["young", "10.50"], vec!["old", "20.25"]]);
    }

    #[test]
    fn sub_id_column_is_optional() {
        let m = model();
        let one = ValueLayout::parameter(&m, &m.params[0], false, opts(false)).unwrap();
        let many = ValueLayout::parameter(&m, &m.params[0], true, opts(false)).unwrap();
        assert_eq!(one.columns()[0], "dim0");
        assert_eq!(many.columns()[0], "sub_id");
    }

    #[test]
    fn leading_field_prefixes_header_and_rows() {
        let m = model();
        let mut o = opts(false);
        o.leading = Some(LeadingField {
            column: "run_name".to_string(),
            value: "Base".to_string(),
        });
        let layout = ValueLayout::expressions(&m, &m.tables[0], o).unwrap();
        assert_eq!(layout.columns(), ["run_name", "expr_name", "dim0", "expr_value"]);

        let cell = ValueCell::Expr(ExprCell {
            expr_id: 0,
            dims: vec![2],
            value: None,
        });
        let mut row = FlatRow::new();
        layout.write_row(&cell, &mut row).unwrap();
        assert_eq!(row.fields(), ["Base", "expr0", "all", "NULL"]);
        assert_eq!(layout.read_row(row.fields()).unwrap(), cell);
    }

    #[test]
    fn acc_row_reads_back() {
        let m = model();
        let layout = ValueLayout::accumulators(&m, &m.tables[0], opts(true)).unwrap();
        assert_eq!(layout.file_name(), "Income.acc.csv");
        let cell = ValueCell::Acc(AccCell {
            acc_id: 0,
            sub_id: 3,
            dims: vec![1],
            value: Some(1.25),
        });
        let mut row = FlatRow::new();
        layout.write_row(&cell, &mut row).unwrap();
        assert_eq!(row.fields(), ["0", "3", "1", "1.25"]);
        assert_eq!(layout.read_row(row.fields()).unwrap(), cell);
    }

    #[test]
    fn unknown_enum_code_fails() {
        let m = model();
        let layout = ValueLayout::parameter(&m, &m.params[0], false, opts(false)).unwrap();
        let fields = vec!["middle".to_string(), "1.0".to_string()];
        assert!(matches!(
            layout.read_row(&fields),
            Err(McError::UnknownEnum { .. })
        ));
    }

    #[test]
    fn wrong_cell_kind_is_an_invariant_error() {
        let m = model();
        let layout = ValueLayout::parameter(&m, &m.params[0], false, opts(false)).unwrap();
        let cell = ValueCell::Micro(MicroCell {
            key: 1,
            values: vec![],
        });
        let mut row = FlatRow::new();
        assert!(matches!(
            layout.write_row(&cell, &mut row),
            Err(McError::Invariant { .. })
        ));
    }
}
