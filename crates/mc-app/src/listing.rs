//! What a store holds.

use mc_core::EntityKind;

use crate::error::AppResult;
use crate::store::{ModelStore, ModelSummary, check_schema};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitySummary {
    pub kind: EntityKind,
    pub id: i32,
    pub name: String,
    /// Run digest; empty for worksets and tasks.
    pub digest: String,
}

pub fn list_models(store: &dyn ModelStore) -> AppResult<Vec<ModelSummary>> {
    check_schema(store)?;
    store.models()
}

/// Runs, then worksets, then tasks of one model, in store order.
pub fn list_entities(store: &dyn ModelStore, model: &str) -> AppResult<Vec<EntitySummary>> {
    check_schema(store)?;
    let tree = store.model_tree(model)?;
    let runs = tree.runs.into_iter().map(|r| EntitySummary {
        kind: EntityKind::Run,
        id: r.run_id,
        name: r.name,
        digest: r.run_digest,
    });
    let sets = tree.worksets.into_iter().map(|s| EntitySummary {
        kind: EntityKind::Workset,
        id: s.set_id,
        name: s.name,
        digest: String::new(),
    });
    let tasks = tree.tasks.into_iter().map(|t| EntitySummary {
        kind: EntityKind::Task,
        id: t.task_id,
        name: t.name,
        digest: String::new(),
    });
    Ok(runs.chain(sets).chain(tasks).collect())
}
