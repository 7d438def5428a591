//! Narrow interface to the relational store.
//!
//! The orchestrator reads an already materialized metadata forest and
//! value cursors, and hands back whole reconstructed entities.

use mc_flat::{AccCell, ExprCell, MicroCell, ParamCell};
use mc_meta::{MetaTree, ModelDef, RunDef, TaskDef, WorksetDef};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Store layout version this crate reads and writes.
pub const STORE_SCHEMA_VERSION: u32 = 1;

/// Run or workset holding a set of parameter values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueOwner {
    Run(i32),
    Workset(i32),
}

/// Values of one parameter, output table or entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedCells<T> {
    pub name: String,
    pub cells: Vec<T>,
}

impl<T> NamedCells<T> {
    pub fn new(name: impl Into<String>, cells: Vec<T>) -> Self {
        Self {
            name: name.into(),
            cells,
        }
    }
}

/// Everything a run carries besides its metadata.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunValues {
    pub params: Vec<NamedCells<ParamCell>>,
    pub exprs: Vec<NamedCells<ExprCell>>,
    pub accs: Vec<NamedCells<AccCell>>,
    pub micro: Vec<NamedCells<MicroCell>>,
}

impl RunValues {
    /// Put every cell list into store order.
    pub fn sort(&mut self) {
        for p in &mut self.params {
            sort_param_cells(&mut p.cells);
        }
        for e in &mut self.exprs {
            e.cells.sort_by(|a, b| (a.expr_id, &a.dims).cmp(&(b.expr_id, &b.dims)));
        }
        for a in &mut self.accs {
            a.cells
                .sort_by(|x, y| (x.acc_id, x.sub_id, &x.dims).cmp(&(y.acc_id, y.sub_id, &y.dims)));
        }
        for m in &mut self.micro {
            m.cells.sort_by_key(|c| c.key);
        }
    }
}

/// Store order of parameter values: sub-value id, then dimension ids.
pub fn sort_param_cells(cells: &mut [ParamCell]) {
    cells.sort_by(|a, b| (a.sub_id, &a.dims).cmp(&(b.sub_id, &b.dims)));
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Inserted {
    /// Id assigned by the store, or of the entity that was already there.
    pub id: i32,
    pub existed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSummary {
    pub model_id: i32,
    pub name: String,
    pub digest: String,
    pub runs: usize,
    pub worksets: usize,
    pub tasks: usize,
}

pub type CellCursor<'s, T> = Box<dyn Iterator<Item = T> + 's>;

pub trait ModelStore {
    fn schema_version(&self) -> AppResult<u32>;

    fn models(&self) -> AppResult<Vec<ModelSummary>>;

    /// Metadata forest of the model with this digest or name, children in
    /// source order.
    fn model_tree(&self, model: &str) -> AppResult<MetaTree>;

    fn param_cells<'s>(
        &'s self,
        model_digest: &str,
        owner: ValueOwner,
        param: &str,
    ) -> AppResult<CellCursor<'s, ParamCell>>;

    fn expr_cells<'s>(
        &'s self,
        model_digest: &str,
        run_id: i32,
        table: &str,
    ) -> AppResult<CellCursor<'s, ExprCell>>;

    fn acc_cells<'s>(
        &'s self,
        model_digest: &str,
        run_id: i32,
        table: &str,
    ) -> AppResult<CellCursor<'s, AccCell>>;

    fn micro_cells<'s>(
        &'s self,
        model_digest: &str,
        run_id: i32,
        entity: &str,
    ) -> AppResult<CellCursor<'s, MicroCell>>;

    /// Insert a model unless one with the same digest exists.
    fn insert_model(&mut self, model: &ModelDef) -> AppResult<Inserted>;

    /// Insert a run with its values. A run whose digest is already stored
    /// is left alone.
    fn insert_run(
        &mut self,
        model_digest: &str,
        run: &RunDef,
        values: RunValues,
    ) -> AppResult<Inserted>;

    /// Insert a workset, replacing a writable workset of the same name.
    fn insert_workset(
        &mut self,
        model_digest: &str,
        set: &WorksetDef,
        values: Vec<NamedCells<ParamCell>>,
    ) -> AppResult<Inserted>;

    /// Insert a task, replacing a task of the same name.
    fn insert_task(&mut self, model_digest: &str, task: &TaskDef) -> AppResult<Inserted>;
}

pub(crate) fn check_schema(store: &dyn ModelStore) -> AppResult<()> {
    let version = store.schema_version()?;
    if version != STORE_SCHEMA_VERSION {
        return Err(AppError::Store(format!(
            "store schema version {} is not supported (expected {})",
            version, STORE_SCHEMA_VERSION
        )));
    }
    Ok(())
}
