//! Store to text: JSON documents plus CSV value tables.

use std::fs;
use std::time::Instant;

use mc_core::{EntityKind, EntityLocator};
use mc_meta::{MetaError, save_entity_doc, save_model_doc, validate_tree};
use mc_paths::{SlugPlan, entity_dir_name, entity_doc_name, model_doc_name};
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::progress::{CopyStage, ProgressCallback, emit_progress};
use crate::request::{CopyDirection, CopyRequest, CopyScope, CopySummary};
use crate::scope::{Scoped, locators, narrow, scope_root};
use crate::store::{ModelStore, check_schema};
use crate::values::ValueSink;

/// Export a model, run, workset or task from `store` into `request.dir`.
pub fn copy_to_text(
    store: &dyn ModelStore,
    request: &CopyRequest<'_>,
    progress_cb: ProgressCallback<'_>,
) -> AppResult<CopySummary> {
    let mut progress_cb = progress_cb;
    let started = Instant::now();
    let direction = CopyDirection::ToText;

    emit_progress(
        &mut progress_cb,
        direction,
        CopyStage::Resolve,
        started,
        Some(format!("{} of model {}", request.scope, request.model)),
    );
    check_schema(store)?;
    let Scoped { tree, target } = narrow(store.model_tree(request.model)?, &request.scope)?;
    let plan = SlugPlan::new(request.options.id_policy, &locators(&tree));
    let root = scope_root(&request.dir, &tree.model.name, target.as_ref(), &plan);

    emit_progress(&mut progress_cb, direction, CopyStage::ReadMetadata, started, None);
    validate_tree(&tree).map_err(MetaError::from)?;
    let model = &tree.model;

    emit_progress(
        &mut progress_cb,
        direction,
        CopyStage::EmitSequences,
        started,
        Some(root.display().to_string()),
    );
    fs::create_dir_all(&root).map_err(|e| AppError::Io {
        path: root.clone(),
        source: e,
    })?;

    let mut sink = ValueSink::new(&request.options);
    let mut docs = 0;
    if request.scope == CopyScope::Model {
        save_model_doc(&root.join(model_doc_name(&model.name)), model)?;
        docs += 1;
    }

    for run in &tree.runs {
        let slug = plan.slug(&EntityLocator::new(EntityKind::Run, run.run_id, run.name.clone()));
        save_entity_doc(
            &root.join(entity_doc_name(&model.name, EntityKind::Run, &slug)),
            model,
            run,
            Some(request.options.float_format.as_str()),
        )?;
        docs += 1;
        sink.write_run(store, model, run, &root.join(entity_dir_name(EntityKind::Run, &slug)))?;
    }

    for set in &tree.worksets {
        let slug = plan.slug(&EntityLocator::new(
            EntityKind::Workset,
            set.set_id,
            set.name.clone(),
        ));
        save_entity_doc(
            &root.join(entity_doc_name(&model.name, EntityKind::Workset, &slug)),
            model,
            set,
            Some(request.options.float_format.as_str()),
        )?;
        docs += 1;
        let dir = root.join(entity_dir_name(EntityKind::Workset, &slug));
        sink.write_workset(store, model, set, &dir)?;
    }

    for task in &tree.tasks {
        let slug = plan.slug(&EntityLocator::new(
            EntityKind::Task,
            task.task_id,
            task.name.clone(),
        ));
        save_entity_doc(
            &root.join(entity_doc_name(&model.name, EntityKind::Task, &slug)),
            model,
            task,
            None,
        )?;
        docs += 1;
    }

    let summary = CopySummary {
        model: model.name.clone(),
        root: root.clone(),
        runs: tree.runs.len(),
        worksets: tree.worksets.len(),
        tasks: tree.tasks.len(),
        files: docs + sink.files,
        skipped: 0,
    };
    emit_progress(
        &mut progress_cb,
        direction,
        CopyStage::PersistOrPackage,
        started,
        Some(format!("{} files", summary.files)),
    );
    info!(
        "Exported {} of model {} into {}: {} runs, {} worksets, {} tasks, {} files",
        request.scope,
        summary.model,
        root.display(),
        summary.runs,
        summary.worksets,
        summary.tasks,
        summary.files
    );
    emit_progress(&mut progress_cb, direction, CopyStage::Done, started, None);
    Ok(summary)
}
