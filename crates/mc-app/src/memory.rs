//! In-memory store, persisted as a JSON snapshot.

use std::fs;
use std::path::Path;

use mc_flat::{AccCell, ExprCell, MicroCell, ParamCell};
use mc_meta::{MetaTree, ModelDef, RunDef, TaskDef, WorksetDef};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult};
use crate::store::*;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct OwnedCells<T> {
    owner: ValueOwner,
    #[serde(flatten)]
    values: NamedCells<T>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct StoredModel {
    tree: MetaTree,
    #[serde(default)]
    params: Vec<OwnedCells<ParamCell>>,
    #[serde(default)]
    exprs: Vec<OwnedCells<ExprCell>>,
    #[serde(default)]
    accs: Vec<OwnedCells<AccCell>>,
    #[serde(default)]
    micro: Vec<OwnedCells<MicroCell>>,
}

impl StoredModel {
    fn new(model: ModelDef) -> Self {
        Self {
            tree: MetaTree::new(model),
            params: Vec::new(),
            exprs: Vec::new(),
            accs: Vec::new(),
            micro: Vec::new(),
        }
    }

    fn drop_values(&mut self, owner: ValueOwner) {
        self.params.retain(|c| c.owner != owner);
        if let ValueOwner::Run(_) = owner {
            self.exprs.retain(|c| c.owner != owner);
            self.accs.retain(|c| c.owner != owner);
            self.micro.retain(|c| c.owner != owner);
        }
    }
}

fn find_cells<'s, T: Clone + 's>(
    list: &'s [OwnedCells<T>],
    owner: ValueOwner,
    name: &str,
) -> CellCursor<'s, T> {
    let cells = list
        .iter()
        .filter(move |c| c.owner == owner && c.values.name == name)
        .flat_map(|c| c.values.cells.iter().cloned());
    Box::new(cells.collect::<Vec<_>>().into_iter())
}

fn owned<T>(owner: ValueOwner, values: Vec<NamedCells<T>>) -> impl Iterator<Item = OwnedCells<T>> {
    values
        .into_iter()
        .map(move |values| OwnedCells { owner, values })
}

/// Store with every model, entity and value held in memory.
///
/// Ids of runs, worksets and tasks are unique across the whole store and
/// are reassigned on insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryStore {
    schema_version: u32,
    #[serde(default)]
    models: Vec<StoredModel>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            schema_version: STORE_SCHEMA_VERSION,
            models: Vec::new(),
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a snapshot, or start empty if the file does not exist.
    pub fn open(path: &Path) -> AppResult<Self> {
        if !path.exists() {
            info!("Store {} does not exist, starting empty", path.display());
            return Ok(Self::new());
        }
        let content = fs::read_to_string(path).map_err(|e| AppError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&content)
            .map_err(|e| AppError::Store(format!("Failed to parse {}: {}", path.display(), e)))
    }

    /// Write the snapshot to a temporary file next to `path`, then rename.
    pub fn save(&self, path: &Path) -> AppResult<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| AppError::Store(format!("Failed to serialize store: {}", e)))?;
        let tmp = path.with_extension("json.tmp");
        let io = |p: &Path| {
            let path = p.to_path_buf();
            move |source| AppError::Io { path, source }
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io(parent))?;
        }
        fs::write(&tmp, content).map_err(io(&tmp))?;
        fs::rename(&tmp, path).map_err(io(path))?;
        debug!("Saved store snapshot {}", path.display());
        Ok(())
    }

    fn find(&self, model: &str) -> AppResult<&StoredModel> {
        let index = self.find_index(model)?;
        Ok(&self.models[index])
    }

    fn find_index(&self, model: &str) -> AppResult<usize> {
        if let Some(i) = self.models.iter().position(|m| m.tree.model.digest == model) {
            return Ok(i);
        }
        let mut named = self
            .models
            .iter()
            .enumerate()
            .filter(|(_, m)| m.tree.model.name == model)
            .map(|(i, _)| i);
        let first = named
            .next()
            .ok_or_else(|| AppError::NotFound(format!("model '{}'", model)))?;
        if named.next().is_some() {
            warn!(
                "Several models are named '{}': using digest {}",
                model, self.models[first].tree.model.digest
            );
        }
        Ok(first)
    }

    fn next_model_id(&self) -> i32 {
        self.models
            .iter()
            .map(|m| m.tree.model.model_id)
            .max()
            .map_or(1, |id| id + 1)
    }

    fn next_entity_id(&self) -> i32 {
        let trees = self.models.iter().map(|m| &m.tree);
        let max = trees
            .flat_map(|t| {
                t.runs
                    .iter()
                    .map(|r| r.run_id)
                    .chain(t.worksets.iter().map(|s| s.set_id))
                    .chain(t.tasks.iter().map(|k| k.task_id))
            })
            .max();
        max.map_or(1, |id| id + 1)
    }
}

impl ModelStore for MemoryStore {
    fn schema_version(&self) -> AppResult<u32> {
        Ok(self.schema_version)
    }

    fn models(&self) -> AppResult<Vec<ModelSummary>> {
        Ok(self
            .models
            .iter()
            .map(|m| ModelSummary {
                model_id: m.tree.model.model_id,
                name: m.tree.model.name.clone(),
                digest: m.tree.model.digest.clone(),
                runs: m.tree.runs.len(),
                worksets: m.tree.worksets.len(),
                tasks: m.tree.tasks.len(),
            })
            .collect())
    }

    fn model_tree(&self, model: &str) -> AppResult<MetaTree> {
        Ok(self.find(model)?.tree.clone())
    }

    fn param_cells<'s>(
        &'s self,
        model_digest: &str,
        owner: ValueOwner,
        param: &str,
    ) -> AppResult<CellCursor<'s, ParamCell>> {
        Ok(find_cells(&self.find(model_digest)?.params, owner, param))
    }

    fn expr_cells<'s>(
        &'s self,
        model_digest: &str,
        run_id: i32,
        table: &str,
    ) -> AppResult<CellCursor<'s, ExprCell>> {
        let m = self.find(model_digest)?;
        Ok(find_cells(&m.exprs, ValueOwner::Run(run_id), table))
    }

    fn acc_cells<'s>(
        &'s self,
        model_digest: &str,
        run_id: i32,
        table: &str,
    ) -> AppResult<CellCursor<'s, AccCell>> {
        let m = self.find(model_digest)?;
        Ok(find_cells(&m.accs, ValueOwner::Run(run_id), table))
    }

    fn micro_cells<'s>(
        &'s self,
        model_digest: &str,
        run_id: i32,
        entity: &str,
    ) -> AppResult<CellCursor<'s, MicroCell>> {
        let m = self.find(model_digest)?;
        Ok(find_cells(&m.micro, ValueOwner::Run(run_id), entity))
    }

    fn insert_model(&mut self, model: &ModelDef) -> AppResult<Inserted> {
        if let Some(m) = self.models.iter().find(|m| m.tree.model.digest == model.digest) {
            debug!("Model {} ({}) already in store", model.name, model.digest);
            return Ok(Inserted {
                id: m.tree.model.model_id,
                existed: true,
            });
        }
        let id = self.next_model_id();
        let mut model = model.clone();
        model.model_id = id;
        if model.create_dt.is_empty() {
            model.create_dt = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S%.3f").to_string();
        }
        self.models.push(StoredModel::new(model));
        Ok(Inserted { id, existed: false })
    }

    fn insert_run(
        &mut self,
        model_digest: &str,
        run: &RunDef,
        mut values: RunValues,
    ) -> AppResult<Inserted> {
        let id = self.next_entity_id();
        let index = self.find_index(model_digest)?;
        let stored = &mut self.models[index];

        if !run.run_digest.is_empty()
            && let Some(r) = stored.tree.runs.iter().find(|r| r.run_digest == run.run_digest)
        {
            return Ok(Inserted {
                id: r.run_id,
                existed: true,
            });
        }

        let mut run = run.clone();
        run.run_id = id;
        values.sort();
        let owner = ValueOwner::Run(id);
        stored.params.extend(owned(owner, values.params));
        stored.exprs.extend(owned(owner, values.exprs));
        stored.accs.extend(owned(owner, values.accs));
        stored.micro.extend(owned(owner, values.micro));
        stored.tree.runs.push(run);
        Ok(Inserted { id, existed: false })
    }

    fn insert_workset(
        &mut self,
        model_digest: &str,
        set: &WorksetDef,
        mut params: Vec<NamedCells<ParamCell>>,
    ) -> AppResult<Inserted> {
        let next = self.next_entity_id();
        let index = self.find_index(model_digest)?;
        let stored = &mut self.models[index];

        let existing = stored.tree.worksets.iter().position(|s| s.name == set.name);
        let id = match existing {
            Some(i) if stored.tree.worksets[i].is_readonly => {
                return Err(AppError::Validation(format!(
                    "workset '{}' is read-only and cannot be replaced",
                    set.name
                )));
            }
            Some(i) => stored.tree.worksets[i].set_id,
            None => next,
        };

        let mut set = set.clone();
        set.set_id = id;
        if set.update_dt.is_empty() {
            set.update_dt = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S%.3f").to_string();
        }
        let owner = ValueOwner::Workset(id);
        stored.drop_values(owner);
        for p in &mut params {
            sort_param_cells(&mut p.cells);
        }
        stored.params.extend(owned(owner, params));
        match existing {
            Some(i) => stored.tree.worksets[i] = set,
            None => stored.tree.worksets.push(set),
        }
        Ok(Inserted {
            id,
            existed: existing.is_some(),
        })
    }

    fn insert_task(&mut self, model_digest: &str, task: &TaskDef) -> AppResult<Inserted> {
        let next = self.next_entity_id();
        let index = self.find_index(model_digest)?;
        let stored = &mut self.models[index];

        for name in &task.sets {
            if !stored.tree.worksets.iter().any(|s| &s.name == name) {
                return Err(AppError::Validation(format!(
                    "task '{}' refers to unknown workset '{}'",
                    task.name, name
                )));
            }
        }

        let existing = stored.tree.tasks.iter().position(|t| t.name == task.name);
        let id = existing.map_or(next, |i| stored.tree.tasks[i].task_id);
        let mut task = task.clone();
        task.task_id = id;
        match existing {
            Some(i) => stored.tree.tasks[i] = task,
            None => stored.tree.tasks.push(task),
        }
        Ok(Inserted {
            id,
            existed: existing.is_some(),
        })
    }
}
