//! Narrow a metadata forest to the requested scope and place it on disk.

use std::path::{Path, PathBuf};

use mc_core::{EntityKind, EntityLocator, Selector};
use mc_meta::MetaTree;
use mc_paths::{SlugPlan, scope_dir_name};
use tracing::warn;

use crate::error::{AppError, AppResult};
use crate::request::CopyScope;

/// Forest reduced to one scope, and the entity it was narrowed to.
pub(crate) struct Scoped {
    pub tree: MetaTree,
    pub target: Option<EntityLocator>,
}

/// Index of the entity matching `sel`; the id wins over the name.
pub(crate) fn pick<T>(
    items: &[T],
    sel: &Selector,
    kind: EntityKind,
    key: impl Fn(&T) -> (i32, &str),
) -> AppResult<usize> {
    if sel.is_empty() {
        return Err(AppError::Resolution(format!("empty {} selector", kind)));
    }
    let mut hits = items
        .iter()
        .enumerate()
        .filter(|(_, item)| {
            let (id, name) = key(item);
            sel.matches(id, name)
        })
        .map(|(i, _)| i);
    let first = hits
        .next()
        .ok_or_else(|| AppError::NotFound(format!("{} {}", kind, sel)))?;
    if hits.next().is_some() {
        warn!("{} {} matches several entities: using the first", kind, sel);
    }
    Ok(first)
}

pub(crate) fn narrow(mut tree: MetaTree, scope: &CopyScope) -> AppResult<Scoped> {
    let target = match scope {
        CopyScope::Model => None,
        CopyScope::Run(sel) => {
            let i = pick(&tree.runs, sel, EntityKind::Run, |r| (r.run_id, r.name.as_str()))?;
            let run = tree.runs.swap_remove(i);
            let loc = EntityLocator::new(EntityKind::Run, run.run_id, run.name.clone());
            tree.runs = vec![run];
            tree.worksets.clear();
            tree.tasks.clear();
            Some(loc)
        }
        CopyScope::Workset(sel) => {
            let i = pick(&tree.worksets, sel, EntityKind::Workset, |s| {
                (s.set_id, s.name.as_str())
            })?;
            let set = tree.worksets.swap_remove(i);
            let loc = EntityLocator::new(EntityKind::Workset, set.set_id, set.name.clone());
            tree.runs.clear();
            tree.worksets = vec![set];
            tree.tasks.clear();
            Some(loc)
        }
        CopyScope::Task(sel) => {
            let i = pick(&tree.tasks, sel, EntityKind::Task, |t| (t.task_id, t.name.as_str()))?;
            let task = tree.tasks.swap_remove(i);
            let loc = EntityLocator::new(EntityKind::Task, task.task_id, task.name.clone());
            tree.runs.clear();
            tree.worksets.clear();
            tree.tasks = vec![task];
            Some(loc)
        }
    };
    Ok(Scoped { tree, target })
}

/// Every run, workset and task of the forest, for slug planning.
pub(crate) fn locators(tree: &MetaTree) -> Vec<EntityLocator> {
    let runs = tree
        .runs
        .iter()
        .map(|r| EntityLocator::new(EntityKind::Run, r.run_id, r.name.clone()));
    let sets = tree
        .worksets
        .iter()
        .map(|s| EntityLocator::new(EntityKind::Workset, s.set_id, s.name.clone()));
    let tasks = tree
        .tasks
        .iter()
        .map(|t| EntityLocator::new(EntityKind::Task, t.task_id, t.name.clone()));
    runs.chain(sets).chain(tasks).collect()
}

/// `{dir}/{model}` for a whole model, `{dir}/{model}.{kind}.{slug}` otherwise.
pub(crate) fn scope_root(
    dir: &Path,
    model: &str,
    target: Option<&EntityLocator>,
    plan: &SlugPlan,
) -> PathBuf {
    match target {
        None => dir.join(model),
        Some(loc) => dir.join(scope_dir_name(model, loc.kind, &plan.slug(loc))),
    }
}
