//! Text to store: parse documents and value tables, then insert.
//!
//! Every file is read and checked before the first insert, so a bad input
//! directory leaves the store untouched.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Instant;

use mc_core::{EntityKind, FloatFormat, Selector};
use mc_flat::{ParamCell, ValueCell, ValueLayout};
use mc_meta::{
    MetaError, MetaTree, Migrate, ModelDef, RunDef, TaskDef, WorksetDef, load_entity_doc,
    load_model_doc, validate_tree,
};
use mc_paths::{
    EntryPattern, Found, MICRODATA_DIR, OUTPUT_TABLES_DIR, PARAMETERS_DIR, entity_dir_name,
    list_entries, model_doc_name, resolve_entity,
};
use mc_tabular::TextFormat;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::config::CopyOptions;
use crate::error::{AppError, AppResult};
use crate::progress::{CopyStage, ProgressCallback, emit_progress};
use crate::request::{CopyDirection, CopyRequest, CopyScope, CopySummary};
use crate::store::{ModelStore, NamedCells, RunValues, check_schema, sort_param_cells};
use crate::values::{as_acc, as_expr, as_micro, as_param, check_digest, read_cells};

/// Entity document found on disk, with its value directory if any.
struct Located<T> {
    def: T,
    data: Option<PathBuf>,
    /// Values were written with enough digits to reproduce recorded digests.
    exact: bool,
}

/// Everything parsed from the input directory.
struct Input {
    model: ModelDef,
    runs: Vec<Located<RunDef>>,
    worksets: Vec<Located<WorksetDef>>,
    tasks: Vec<TaskDef>,
    docs: usize,
}

/// Import a model, run, workset or task from `request.dir` into `store`.
pub fn copy_from_text(
    store: &mut dyn ModelStore,
    request: &CopyRequest<'_>,
    progress_cb: ProgressCallback<'_>,
) -> AppResult<CopySummary> {
    let mut progress_cb = progress_cb;
    let started = Instant::now();
    let direction = CopyDirection::FromText;

    emit_progress(
        &mut progress_cb,
        direction,
        CopyStage::Resolve,
        started,
        Some(format!("{} of model {}", request.scope, request.model)),
    );
    check_schema(&*store)?;
    let root = input_root(request)?;

    emit_progress(
        &mut progress_cb,
        direction,
        CopyStage::ReadMetadata,
        started,
        Some(root.display().to_string()),
    );
    let mut input = match (request.scope.kind(), request.scope.selector()) {
        (Some(kind), Some(sel)) => {
            let model = store.model_tree(request.model)?.model;
            read_entity_dir(&root, model, kind, sel)?
        }
        _ => read_model_dir(&root, request.model)?,
    };
    let existing = match store.model_tree(&input.model.digest) {
        Ok(tree) => Some(tree),
        Err(e) if e.is_not_found() => None,
        Err(e) => return Err(e),
    };
    check_replaceable(existing.as_ref(), &input)?;
    check_task_sets(existing.as_ref(), &input)?;
    let known_runs: HashSet<String> = existing
        .iter()
        .flat_map(|t| t.runs.iter().map(|r| r.run_digest.clone()))
        .filter(|d| !d.is_empty())
        .collect();

    emit_progress(&mut progress_cb, direction, CopyStage::ParseSequences, started, None);
    let format = request.options.text_format();
    let mut reader = ValueReader {
        model: &input.model,
        options: &request.options,
        format,
        files: 0,
    };
    let mut run_values = Vec::new();
    let mut skipped = 0;
    for run in &mut input.runs {
        if known_runs.contains(&run.def.run_digest) {
            info!("Run '{}' ({}) already in store, skipping", run.def.name, run.def.run_digest);
            skipped += 1;
            run_values.push(None);
            continue;
        }
        run_values.push(Some(reader.read_run(&mut run.def, run.data.as_deref(), run.exact)?));
    }
    let mut set_values = Vec::new();
    for set in &mut input.worksets {
        set_values.push(reader.read_workset(&mut set.def, set.data.as_deref())?);
    }
    let files = reader.files;

    emit_progress(&mut progress_cb, direction, CopyStage::PersistOrPackage, started, None);
    let model = &input.model;
    if request.scope == CopyScope::Model {
        let inserted = store.insert_model(model)?;
        if inserted.existed {
            info!("Model {} ({}) already in store", model.name, model.digest);
        }
    }
    let mut runs = 0;
    for (run, values) in input.runs.iter().zip(run_values) {
        let Some(values) = values else { continue };
        let inserted = store.insert_run(&model.digest, &run.def, values)?;
        if inserted.existed {
            skipped += 1;
        } else {
            runs += 1;
            debug!("Inserted run '{}' as {}", run.def.name, inserted.id);
        }
    }
    for (set, values) in input.worksets.iter().zip(set_values) {
        let inserted = store.insert_workset(&model.digest, &set.def, values)?;
        debug!("Inserted workset '{}' as {}", set.def.name, inserted.id);
    }
    for task in &input.tasks {
        let inserted = store.insert_task(&model.digest, task)?;
        debug!("Inserted task '{}' as {}", task.name, inserted.id);
    }

    let summary = CopySummary {
        model: model.name.clone(),
        root,
        runs,
        worksets: input.worksets.len(),
        tasks: input.tasks.len(),
        files: input.docs + files,
        skipped,
    };
    info!(
        "Imported {} of model {} from {}: {} runs ({} skipped), {} worksets, {} tasks",
        request.scope,
        summary.model,
        summary.root.display(),
        summary.runs,
        summary.skipped,
        summary.worksets,
        summary.tasks
    );
    emit_progress(&mut progress_cb, direction, CopyStage::Done, started, None);
    Ok(summary)
}

/// Directory holding the documents of the requested scope.
///
/// A narrowed scope is looked up as `{model}.{kind}.{slug}/` first and
/// falls back to a whole-model directory `{model}/`.
fn input_root(request: &CopyRequest<'_>) -> AppResult<PathBuf> {
    let model_dir = request.dir.join(request.model);
    let (Some(kind), Some(sel)) = (request.scope.kind(), request.scope.selector()) else {
        let doc = model_dir.join(model_doc_name(request.model));
        if !doc.is_file() {
            return Err(AppError::NotFound(format!("model document {}", doc.display())));
        }
        return Ok(model_dir);
    };
    match resolve_entity(&request.dir, &EntryPattern::scope_dir(request.model, kind), sel) {
        Ok(found) => Ok(found.path),
        Err(e) if e.is_not_found() && model_dir.is_dir() => {
            debug!("No {} directory for {}, using {}", kind, sel, model_dir.display());
            Ok(model_dir)
        }
        Err(e) => Err(e.into()),
    }
}

fn load_doc<T>(path: &Path, model: &ModelDef) -> AppResult<(T, bool)>
where
    T: DeserializeOwned + Migrate,
{
    let doc = load_entity_doc::<T>(path)?;
    if !doc.model_digest.is_empty() && doc.model_digest != model.digest {
        return Err(AppError::Validation(format!(
            "{} belongs to model {} ({}), not {} ({})",
            path.display(),
            doc.model_name,
            doc.model_digest,
            model.name,
            model.digest
        )));
    }
    Ok((doc.body, exact_format(doc.value_format.as_deref())))
}

/// Documents without a recorded format predate it and were written with the
/// digest format. An unparsable format is treated as lossy.
fn exact_format(value_format: Option<&str>) -> bool {
    match value_format {
        None => true,
        Some(f) => FloatFormat::parse(f).is_ok_and(|f| f.keeps_digest_precision()),
    }
}

/// Value directory of an entity whose document was found under `key`.
fn data_dir(
    root: &Path,
    kind: EntityKind,
    key: &str,
    id: i32,
    name: &str,
) -> AppResult<Option<PathBuf>> {
    let exact = root.join(entity_dir_name(kind, key));
    if exact.is_dir() {
        return Ok(Some(exact));
    }
    let sel = Selector {
        id: Some(id),
        name: Some(name.to_string()),
    };
    match resolve_entity(root, &EntryPattern::dir(kind), &sel) {
        Ok(found) => Ok(Some(found.path)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn locate_run(root: &Path, model: &ModelDef, found: &Found) -> AppResult<Located<RunDef>> {
    let (def, exact): (RunDef, bool) = load_doc(&found.path, model)?;
    let data = data_dir(root, EntityKind::Run, &found.key, def.run_id, &def.name)?;
    Ok(Located { def, data, exact })
}

fn locate_workset(root: &Path, model: &ModelDef, found: &Found) -> AppResult<Located<WorksetDef>> {
    let (def, exact): (WorksetDef, bool) = load_doc(&found.path, model)?;
    let data = data_dir(root, EntityKind::Workset, &found.key, def.set_id, &def.name)?;
    Ok(Located { def, data, exact })
}

fn read_model_dir(root: &Path, model_name: &str) -> AppResult<Input> {
    let model = load_model_doc(&root.join(model_doc_name(model_name)))?;
    let mut input = Input {
        model,
        runs: Vec::new(),
        worksets: Vec::new(),
        tasks: Vec::new(),
        docs: 1,
    };
    for found in list_entries(root, &EntryPattern::doc(model_name, EntityKind::Run))? {
        input.runs.push(locate_run(root, &input.model, &found)?);
    }
    for found in list_entries(root, &EntryPattern::doc(model_name, EntityKind::Workset))? {
        input.worksets.push(locate_workset(root, &input.model, &found)?);
    }
    for found in list_entries(root, &EntryPattern::doc(model_name, EntityKind::Task))? {
        input.tasks.push(load_doc(&found.path, &input.model)?.0);
    }
    input.docs += input.runs.len() + input.worksets.len() + input.tasks.len();
    validate_input(&input)?;
    Ok(input)
}

fn read_entity_dir(
    root: &Path,
    model: ModelDef,
    kind: EntityKind,
    sel: &Selector,
) -> AppResult<Input> {
    let found = resolve_entity(root, &EntryPattern::doc(&model.name, kind), sel)?;
    let mut input = Input {
        model,
        runs: Vec::new(),
        worksets: Vec::new(),
        tasks: Vec::new(),
        docs: 1,
    };
    match kind {
        EntityKind::Run => input.runs.push(locate_run(root, &input.model, &found)?),
        EntityKind::Workset => input.worksets.push(locate_workset(root, &input.model, &found)?),
        EntityKind::Task => input.tasks.push(load_doc(&found.path, &input.model)?.0),
    }
    validate_input(&input)?;
    Ok(input)
}

fn validate_input(input: &Input) -> AppResult<()> {
    let tree = MetaTree {
        model: input.model.clone(),
        runs: input.runs.iter().map(|r| r.def.clone()).collect(),
        worksets: input.worksets.iter().map(|s| s.def.clone()).collect(),
        tasks: input.tasks.clone(),
    };
    validate_tree(&tree).map_err(MetaError::from)?;
    Ok(())
}

/// Read-only worksets in the store cannot be replaced; refuse before any insert.
fn check_replaceable(existing: Option<&MetaTree>, input: &Input) -> AppResult<()> {
    let Some(tree) = existing else {
        return Ok(());
    };
    for set in &input.worksets {
        if tree
            .worksets
            .iter()
            .any(|s| s.name == set.def.name && s.is_readonly)
        {
            return Err(AppError::Validation(format!(
                "workset '{}' is read-only in the store and cannot be replaced",
                set.def.name
            )));
        }
    }
    Ok(())
}

/// Each task workset must come with the input or already be stored, so a task
/// insert cannot fail after runs and worksets went in.
fn check_task_sets(existing: Option<&MetaTree>, input: &Input) -> AppResult<()> {
    let known: HashSet<&str> = input
        .worksets
        .iter()
        .map(|s| s.def.name.as_str())
        .chain(existing.into_iter().flat_map(|t| t.worksets.iter().map(|s| s.name.as_str())))
        .collect();
    for task in &input.tasks {
        if let Some(name) = task.sets.iter().find(|n| !known.contains(n.as_str())) {
            return Err(AppError::Validation(format!(
                "task '{}' refers to unknown workset '{}'",
                task.name, name
            )));
        }
    }
    Ok(())
}

/// Absent required values are a validation failure, not a lookup miss.
fn required(err: AppError, what: &str) -> AppError {
    match err {
        AppError::NotFound(msg) => {
            AppError::Validation(format!("missing values of {}: {}", what, msg))
        }
        other => other,
    }
}

struct ValueReader<'a> {
    model: &'a ModelDef,
    options: &'a CopyOptions,
    format: TextFormat,
    files: usize,
}

impl ValueReader<'_> {
    fn read_param(
        &mut self,
        dir: &Path,
        name: &str,
        sub_count: i32,
        what: &str,
    ) -> AppResult<(ValueLayout, Vec<ParamCell>)> {
        let param = self.model.param_by_name(name).ok_or_else(|| {
            AppError::Validation(format!("{} refers to unknown parameter '{}'", what, name))
        })?;
        let layout =
            ValueLayout::parameter(self.model, param, sub_count > 1, self.options.cell_options(None)?)?;
        let path = dir.join(layout.file_name());
        let mut cells = read_cells(&path, &layout, self.format, as_param)
            .map_err(|e| required(e, &format!("parameter '{}' of {}", name, what)))?;
        sort_param_cells(&mut cells);
        self.files += 1;
        Ok((layout, cells))
    }

    /// Check values read back against a recorded digest. Values written with
    /// a lossy float format cannot reproduce it, so the digest of what was
    /// read is kept instead.
    fn settle_digest(
        &self,
        layout: &ValueLayout,
        cells: &[ValueCell],
        recorded: &str,
        what: &str,
        exact: bool,
    ) -> AppResult<String> {
        if !exact && !recorded.is_empty() {
            debug!("Values of {} written with a lossy format, not verifying digest", what);
            return check_digest(layout, cells, "", what, false);
        }
        check_digest(layout, cells, recorded, what, self.options.check_digest)
    }

    fn read_run(
        &mut self,
        run: &mut RunDef,
        dir: Option<&Path>,
        exact: bool,
    ) -> AppResult<RunValues> {
        let what = format!("run '{}'", run.name);
        for p in &self.model.params {
            if !run.params.iter().any(|rp| rp.name == p.name) {
                return Err(AppError::Validation(format!(
                    "{} has no values for parameter '{}'",
                    what, p.name
                )));
            }
        }
        let mut values = RunValues::default();
        let Some(dir) = dir else {
            if run.params.is_empty() && run.tables.is_empty() {
                return Ok(values);
            }
            return Err(AppError::Validation(format!(
                "value directory of {} not found",
                what
            )));
        };

        let params_dir = dir.join(PARAMETERS_DIR);
        for rp in &mut run.params {
            let (layout, cells) = self.read_param(&params_dir, &rp.name, rp.sub_count, &what)?;
            let wrapped: Vec<ValueCell> = cells.iter().cloned().map(ValueCell::Param).collect();
            let label = format!("parameter '{}' of {}", rp.name, what);
            rp.value_digest = self.settle_digest(&layout, &wrapped, &rp.value_digest, &label, exact)?;
            values.params.push(NamedCells::new(rp.name.clone(), cells));
        }

        let tables_dir = dir.join(OUTPUT_TABLES_DIR);
        for rt in &mut run.tables {
            let table = self.model.table_by_name(&rt.name).ok_or_else(|| {
                AppError::Validation(format!("{} refers to unknown table '{}'", what, rt.name))
            })?;
            let opts = self.options.cell_options(None)?;
            let layout = ValueLayout::expressions(self.model, table, opts.clone())?;
            let path = tables_dir.join(layout.file_name());
            let mut exprs = read_cells(&path, &layout, self.format, as_expr)
                .map_err(|e| required(e, &format!("table '{}' of {}", rt.name, what)))?;
            exprs.sort_by(|a, b| (a.expr_id, &a.dims).cmp(&(b.expr_id, &b.dims)));
            self.files += 1;
            let wrapped: Vec<ValueCell> = exprs.iter().cloned().map(ValueCell::Expr).collect();
            let label = format!("table '{}' of {}", rt.name, what);
            rt.value_digest = self.settle_digest(&layout, &wrapped, &rt.value_digest, &label, exact)?;
            values.exprs.push(NamedCells::new(rt.name.clone(), exprs));

            if self.options.no_accumulators {
                continue;
            }
            let layout = ValueLayout::accumulators(self.model, table, opts)?;
            let path = tables_dir.join(layout.file_name());
            match read_cells(&path, &layout, self.format, as_acc) {
                Ok(accs) => {
                    self.files += 1;
                    values.accs.push(NamedCells::new(rt.name.clone(), accs));
                }
                Err(e) if e.is_not_found() => {
                    debug!("No accumulators for table '{}' of {}", rt.name, what);
                }
                Err(e) => return Err(e),
            }
        }

        if !self.options.no_microdata {
            let micro_dir = dir.join(MICRODATA_DIR);
            for re in &mut run.entities {
                let entity = self.model.entity_by_name(&re.name).ok_or_else(|| {
                    AppError::Validation(format!("{} refers to unknown entity '{}'", what, re.name))
                })?;
                let layout = ValueLayout::microdata(self.model, entity, self.options.cell_options(None)?)?;
                let path = micro_dir.join(layout.file_name());
                let mut cells = match read_cells(&path, &layout, self.format, as_micro) {
                    Ok(cells) => cells,
                    Err(e) if e.is_not_found() => {
                        debug!("No microdata for entity '{}' of {}", re.name, what);
                        continue;
                    }
                    Err(e) => return Err(e),
                };
                cells.sort_by_key(|c| c.key);
                self.files += 1;
                let wrapped: Vec<ValueCell> = cells.iter().cloned().map(ValueCell::Micro).collect();
                let label = format!("entity '{}' of {}", re.name, what);
                re.value_digest =
                    self.settle_digest(&layout, &wrapped, &re.value_digest, &label, exact)?;
                values.micro.push(NamedCells::new(re.name.clone(), cells));
            }
        }
        Ok(values)
    }

    fn read_workset(
        &mut self,
        set: &mut WorksetDef,
        dir: Option<&Path>,
    ) -> AppResult<Vec<NamedCells<ParamCell>>> {
        let what = format!("workset '{}'", set.name);
        let Some(dir) = dir else {
            if set.params.is_empty() {
                return Ok(Vec::new());
            }
            return Err(AppError::Validation(format!(
                "value directory of {} not found",
                what
            )));
        };
        let mut params = Vec::with_capacity(set.params.len());
        for sp in &set.params {
            let (_, cells) = self.read_param(dir, &sp.name, sp.sub_count, &what)?;
            params.push(NamedCells::new(sp.name.clone(), cells));
        }
        Ok(params)
    }
}
