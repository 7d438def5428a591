//! Store to flat CSV: one file per metadata table, plus values.

use std::fs;
use std::path::Path;
use std::time::Instant;

use mc_core::{EntityKind, EntityLocator};
use mc_flat::{META_TABLES, column_names, unflatten};
use mc_meta::{MetaError, MetaTree, validate_tree};
use mc_paths::{SlugPlan, entity_dir_name};
use mc_tabular::{TextFormat, read_rows, write_source};
use tracing::{debug, info};

use crate::error::{AppError, AppResult};
use crate::progress::{CopyStage, ProgressCallback, emit_progress};
use crate::request::{CopyDirection, CopyRequest, CopySummary};
use crate::scope::{Scoped, locators, narrow, scope_root};
use crate::store::{ModelStore, check_schema};
use crate::values::{ValueSink, leading_field};

/// Directory of the shared run value files in all-in-one mode.
pub const ALL_RUNS_DIR: &str = "all-runs";
/// Directory of the shared workset value files in all-in-one mode.
pub const ALL_SETS_DIR: &str = "all-sets";

/// Export the metadata forest as flat tables, with the values of every
/// run and workset in scope.
pub fn copy_to_csv(
    store: &dyn ModelStore,
    request: &CopyRequest<'_>,
    progress_cb: ProgressCallback<'_>,
) -> AppResult<CopySummary> {
    let mut progress_cb = progress_cb;
    let started = Instant::now();
    let direction = CopyDirection::ToCsv;

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
    for table in META_TABLES {
        let rows = write_source(
            &mut sink.registry,
            &root.join(table.file_name()),
            sink.format,
            &mut *table.rows(&tree),
        )?;
        sink.files += 1;
        debug!("{}: {} rows", table.name, rows);
    }

    match request.options.all_in_one {
        Some(column) => {
            sink.force_sub_id = true;
            let runs_dir = root.join(ALL_RUNS_DIR);
            for run in &tree.runs {
                sink.leading = Some(leading_field("run", column, run.run_id, &run.name));
                sink.write_run(store, model, run, &runs_dir)?;
            }
            let sets_dir = root.join(ALL_SETS_DIR);
            for set in &tree.worksets {
                sink.leading = Some(leading_field("set", column, set.set_id, &set.name));
                sink.write_workset(store, model, set, &sets_dir)?;
            }
        }
        None => {
            for run in &tree.runs {
                let loc = EntityLocator::new(EntityKind::Run, run.run_id, run.name.clone());
                let dir = root.join(entity_dir_name(EntityKind::Run, &plan.slug(&loc)));
                sink.write_run(store, model, run, &dir)?;
            }
            for set in &tree.worksets {
                let loc = EntityLocator::new(EntityKind::Workset, set.set_id, set.name.clone());
                let dir = root.join(entity_dir_name(EntityKind::Workset, &plan.slug(&loc)));
                sink.write_workset(store, model, set, &dir)?;
            }
        }
    }

    let summary = CopySummary {
        model: model.name.clone(),
        root: root.clone(),
        runs: tree.runs.len(),
        worksets: tree.worksets.len(),
        tasks: tree.tasks.len(),
        files: sink.files,
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
        "Exported {} of model {} as flat tables into {}: {} files",
        request.scope,
        summary.model,
        root.display(),
        summary.files
    );
    emit_progress(&mut progress_cb, direction, CopyStage::Done, started, None);
    Ok(summary)
}

/// Read the flat metadata tables under `root` back into a forest.
pub fn load_csv_tree(root: &Path, format: TextFormat) -> AppResult<MetaTree> {
    let tree = unflatten(|table| -> AppResult<Vec<Vec<String>>> {
        let path = root.join(table.file_name());
        Ok(read_rows(&path, &column_names(table.columns), format)?)
    })?;
    validate_tree(&tree).map_err(MetaError::from)?;
    Ok(tree)
}
