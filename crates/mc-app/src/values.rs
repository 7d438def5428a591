//! Value tables of runs and worksets: writing from the store, reading back.

use std::path::Path;

use mc_core::McError;
use mc_flat::{
    AccCell, ExprCell, FlatRow, LeadingField, MicroCell, ParamCell, ValueCell, ValueLayout,
    all_acc_cells, digest_cells,
};
use mc_meta::{ModelDef, RunDef, WorksetDef};
use mc_paths::{MICRODATA_DIR, OUTPUT_TABLES_DIR, PARAMETERS_DIR};
use mc_tabular::{TableReader, TextFormat, WriteRegistry};
use tracing::debug;

use crate::config::{CopyOptions, LeadingColumn};
use crate::error::{AppError, AppResult};
use crate::store::{ModelStore, ValueOwner};

/// Leading column of all-in-one files, e.g. `run_id` = `12`.
pub(crate) fn leading_field(word: &str, column: LeadingColumn, id: i32, name: &str) -> LeadingField {
    match column {
        LeadingColumn::Id => LeadingField {
            column: format!("{}_id", word),
            value: id.to_string(),
        },
        LeadingColumn::Name => LeadingField {
            column: format!("{}_name", word),
            value: name.to_string(),
        },
    }
}

fn unknown(what: &str, name: &str) -> AppError {
    AppError::Validation(format!("{} '{}' is not defined by the model", what, name))
}

/// Writes value tables through one registry, so shared files are appended.
pub(crate) struct ValueSink<'a> {
    pub registry: WriteRegistry,
    pub format: TextFormat,
    pub options: &'a CopyOptions,
    /// Leading field for every row, in all-in-one mode.
    pub leading: Option<LeadingField>,
    /// Always write the `sub_id` column of parameters.
    pub force_sub_id: bool,
    pub files: usize,
    row: FlatRow,
}

impl<'a> ValueSink<'a> {
    pub fn new(options: &'a CopyOptions) -> Self {
        Self {
            registry: WriteRegistry::new(),
            format: options.text_format(),
            options,
            leading: None,
            force_sub_id: false,
            files: 0,
            row: FlatRow::new(),
        }
    }

    fn write(
        &mut self,
        dir: &Path,
        layout: &ValueLayout,
        cells: impl Iterator<Item = ValueCell>,
    ) -> AppResult<usize> {
        let path = dir.join(layout.file_name());
        if !self.registry.contains(&path) {
            self.files += 1;
        }
        let mut writer = self.registry.open(&path, layout.columns(), self.format)?;
        for cell in cells {
            layout.write_row(&cell, &mut self.row)?;
            writer.write_row(self.row.fields())?;
        }
        Ok(writer.finish()?)
    }

    fn param_layout(
        &self,
        model: &ModelDef,
        name: &str,
        sub_count: i32,
    ) -> AppResult<ValueLayout> {
        let param = model
            .param_by_name(name)
            .ok_or_else(|| unknown("parameter", name))?;
        let opts = self.options.cell_options(self.leading.clone())?;
        Ok(ValueLayout::parameter(
            model,
            param,
            self.force_sub_id || sub_count > 1,
            opts,
        )?)
    }

    /// `parameters/`, `output-tables/` and `microdata/` of one run under `dir`.
    pub fn write_run(
        &mut self,
        store: &dyn ModelStore,
        model: &ModelDef,
        run: &RunDef,
        dir: &Path,
    ) -> AppResult<()> {
        let owner = ValueOwner::Run(run.run_id);
        let params_dir = dir.join(PARAMETERS_DIR);
        for rp in &run.params {
            let layout = self.param_layout(model, &rp.name, rp.sub_count)?;
            let cells = store.param_cells(&model.digest, owner, &rp.name)?;
            self.write(&params_dir, &layout, cells.map(ValueCell::Param))?;
        }

        let tables_dir = dir.join(OUTPUT_TABLES_DIR);
        for rt in &run.tables {
            let table = model
                .table_by_name(&rt.name)
                .ok_or_else(|| unknown("output table", &rt.name))?;
            let opts = self.options.cell_options(self.leading.clone())?;
            let layout = ValueLayout::expressions(model, table, opts.clone())?;
            let cells = store.expr_cells(&model.digest, run.run_id, &rt.name)?;
            self.write(&tables_dir, &layout, cells.map(ValueCell::Expr))?;

            if self.options.no_accumulators {
                continue;
            }
            let accs: Vec<AccCell> = store.acc_cells(&model.digest, run.run_id, &rt.name)?.collect();
            let layout = ValueLayout::accumulators(model, table, opts.clone())?;
            self.write(&tables_dir, &layout, accs.iter().cloned().map(ValueCell::Acc))?;
            let layout = ValueLayout::all_accumulators(model, table, opts)?;
            let grouped = all_acc_cells(table, accs)?;
            self.write(&tables_dir, &layout, grouped.into_iter().map(ValueCell::AllAcc))?;
        }

        if self.options.no_microdata {
            return Ok(());
        }
        let micro_dir = dir.join(MICRODATA_DIR);
        for re in &run.entities {
            let entity = model
                .entity_by_name(&re.name)
                .ok_or_else(|| unknown("entity", &re.name))?;
            let opts = self.options.cell_options(self.leading.clone())?;
            let layout = ValueLayout::microdata(model, entity, opts)?;
            let cells = store.micro_cells(&model.digest, run.run_id, &re.name)?;
            self.write(&micro_dir, &layout, cells.map(ValueCell::Micro))?;
        }
        Ok(())
    }

    /// One file per workset parameter directly under `dir`.
    pub fn write_workset(
        &mut self,
        store: &dyn ModelStore,
        model: &ModelDef,
        set: &WorksetDef,
        dir: &Path,
    ) -> AppResult<()> {
        let owner = ValueOwner::Workset(set.set_id);
        for sp in &set.params {
            let layout = self.param_layout(model, &sp.name, sp.sub_count)?;
            let cells = store.param_cells(&model.digest, owner, &sp.name)?;
            self.write(dir, &layout, cells.map(ValueCell::Param))?;
        }
        Ok(())
    }
}

fn in_file(path: &Path, err: McError) -> AppError {
    match AppError::from(err) {
        AppError::Validation(msg) => AppError::Validation(format!("{}: {}", path.display(), msg)),
        other => other,
    }
}

/// Read every row of one value file.
pub(crate) fn read_cells<T>(
    path: &Path,
    layout: &ValueLayout,
    format: TextFormat,
    unwrap: fn(ValueCell) -> Option<T>,
) -> AppResult<Vec<T>> {
    let mut reader = TableReader::open(path, layout.columns(), format)?;
    let mut cells = Vec::new();
    while let Some(fields) = reader.next_row()? {
        let cell = layout.read_row(fields).map_err(|e| in_file(path, e))?;
        let cell = unwrap(cell).ok_or_else(|| {
            AppError::Invariant(format!("{}: unexpected cell kind", path.display()))
        })?;
        cells.push(cell);
    }
    debug!("Read {} rows from {}", cells.len(), path.display());
    Ok(cells)
}

pub(crate) fn as_param(cell: ValueCell) -> Option<ParamCell> {
    match cell {
        ValueCell::Param(c) => Some(c),
        _ => None,
    }
}

pub(crate) fn as_expr(cell: ValueCell) -> Option<ExprCell> {
    match cell {
        ValueCell::Expr(c) => Some(c),
        _ => None,
    }
}

pub(crate) fn as_acc(cell: ValueCell) -> Option<AccCell> {
    match cell {
        ValueCell::Acc(c) => Some(c),
        _ => None,
    }
}

pub(crate) fn as_micro(cell: ValueCell) -> Option<MicroCell> {
    match cell {
        ValueCell::Micro(c) => Some(c),
        _ => None,
    }
}

/// Digest of `cells`, checked against `recorded` when both are known.
///
/// Returns the digest to keep: the recorded one, or the computed one when
/// nothing was recorded.
pub(crate) fn check_digest(
    layout: &ValueLayout,
    cells: &[ValueCell],
    recorded: &str,
    what: &str,
    verify: bool,
) -> AppResult<String> {
    let computed = digest_cells(layout, cells)?;
    if recorded.is_empty() {
        return Ok(computed);
    }
    if verify && computed != recorded {
        return Err(AppError::Validation(format!(
            "value digest mismatch for {}: recorded {}, computed {}",
            what, recorded, computed
        )));
    }
    Ok(recorded.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leading_columns() {
        let f = leading_field("run", LeadingColumn::Id, 12, "Base");
        assert_eq!((f.column.as_str(), f.value.as_str()), ("run_id", "12"));
        let f = leading_field("set", LeadingColumn::Name, 3, "Default");
        assert_eq!((f.column.as_str(), f.value.as_str()), ("set_name", "Default"));
    }
}
