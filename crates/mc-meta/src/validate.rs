//! Metadata tree validation.

use crate::schema::{MetaTree, ModelDef, ParamDef, TableDef, TypeDef};
use std::collections::HashSet;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Duplicate ID: {id} in {context}")]
    DuplicateId { id: String, context: String },

    #[error("Missing reference: {id} in {context}")]
    MissingReference { id: String, context: String },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

pub fn validate_version(version: u32) -> Result<(), ValidationError> {
    if version > crate::migrate::LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion { version });
    }
    Ok(())
}

fn unique<T: ToString + Eq + std::hash::Hash>(
    items: impl IntoIterator<Item = T>,
    context: impl Fn() -> String,
) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    for item in items {
        if seen.contains(&item) {
            return Err(ValidationError::DuplicateId {
                id: item.to_string(),
                context: context(),
            });
        }
        seen.insert(item);
    }
    Ok(())
}

pub fn validate_model(model: &ModelDef) -> Result<(), ValidationError> {
    if model.name.is_empty() {
        return Err(ValidationError::InvalidValue {
            field: "model name".to_string(),
            value: String::new(),
            reason: "must not be empty".to_string(),
        });
    }

    unique(model.langs.iter().map(|l| &l.lang_code), || {
        "languages".to_string()
    })?;
    for lang in &model.langs {
        unique(lang.words.iter().map(|w| &w.code), || {
            format!("language '{}' words", lang.lang_code)
        })?;
    }

    unique(model.types.iter().map(|t| t.type_id), || "types".to_string())?;
    for ty in &model.types {
        validate_type(ty)?;
    }

    unique(model.params.iter().map(|p| &p.name), || {
        "parameters".to_string()
    })?;
    unique(model.params.iter().map(|p| p.param_id), || {
        "parameter ids".to_string()
    })?;
    for param in &model.params {
        validate_param(model, param)?;
    }

    unique(model.tables.iter().map(|t| &t.name), || {
        "output tables".to_string()
    })?;
    unique(model.tables.iter().map(|t| t.table_id), || {
        "output table ids".to_string()
    })?;
    for table in &model.tables {
        validate_table(model, table)?;
    }

    unique(model.entities.iter().map(|e| &e.name), || {
        "entities".to_string()
    })?;
    for entity in &model.entities {
        unique(entity.attrs.iter().map(|a| &a.name), || {
            format!("entity '{}' attributes", entity.name)
        })?;
        for attr in &entity.attrs {
            if model.type_by_id(attr.type_id).is_none() {
                return Err(ValidationError::MissingReference {
                    id: attr.type_id.to_string(),
                    context: format!("entity '{}' attribute '{}' type", entity.name, attr.name),
                });
            }
        }
    }

    Ok(())
}

fn validate_type(ty: &TypeDef) -> Result<(), ValidationError> {
    unique(ty.enums.iter().map(|e| e.enum_id), || {
        format!("type '{}' enum ids", ty.name)
    })?;
    unique(ty.enums.iter().map(|e| &e.name), || {
        format!("type '{}' enum codes", ty.name)
    })?;
    if !ty.is_enum_based() && !ty.enums.is_empty() {
        return Err(ValidationError::InvalidValue {
            field: format!("type '{}' enums", ty.name),
            value: ty.enums.len().to_string(),
            reason: "simple types have no enums".to_string(),
        });
    }
    Ok(())
}

fn require_dim_type(
    model: &ModelDef,
    type_id: i32,
    context: impl Fn() -> String,
) -> Result<(), ValidationError> {
    match model.type_by_id(type_id) {
        None => Err(ValidationError::MissingReference {
            id: type_id.to_string(),
            context: context(),
        }),
        Some(t) if !t.is_enum_based() => Err(ValidationError::InvalidValue {
            field: context(),
            value: t.name.clone(),
            reason: "dimension type must be enum-based".to_string(),
        }),
        Some(_) => Ok(()),
    }
}

fn validate_param(model: &ModelDef, param: &ParamDef) -> Result<(), ValidationError> {
    if param.rank != param.dims.len() {
        return Err(ValidationError::InvalidValue {
            field: format!("parameter '{}' rank", param.name),
            value: param.rank.to_string(),
            reason: format!("has {} dimensions", param.dims.len()),
        });
    }
    if model.type_by_id(param.type_id).is_none() {
        return Err(ValidationError::MissingReference {
            id: param.type_id.to_string(),
            context: format!("parameter '{}' type", param.name),
        });
    }
    unique(param.dims.iter().map(|d| &d.name), || {
        format!("parameter '{}' dimensions", param.name)
    })?;
    for dim in &param.dims {
        require_dim_type(model, dim.type_id, || {
            format!("parameter '{}' dimension '{}' type", param.name, dim.name)
        })?;
    }
    Ok(())
}

fn validate_table(model: &ModelDef, table: &TableDef) -> Result<(), ValidationError> {
    if table.rank != table.dims.len() {
        return Err(ValidationError::InvalidValue {
            field: format!("output table '{}' rank", table.name),
            value: table.rank.to_string(),
            reason: format!("has {} dimensions", table.dims.len()),
        });
    }
    unique(table.dims.iter().map(|d| &d.name), || {
        format!("output table '{}' dimensions", table.name)
    })?;
    for dim in &table.dims {
        require_dim_type(model, dim.type_id, || {
            format!("output table '{}' dimension '{}' type", table.name, dim.name)
        })?;
    }
    unique(table.accs.iter().map(|a| &a.name), || {
        format!("output table '{}' accumulators", table.name)
    })?;
    unique(table.accs.iter().map(|a| a.acc_id), || {
        format!("output table '{}' accumulator ids", table.name)
    })?;
    unique(table.exprs.iter().map(|e| &e.name), || {
        format!("output table '{}' expressions", table.name)
    })?;
    unique(table.exprs.iter().map(|e| e.expr_id), || {
        format!("output table '{}' expression ids", table.name)
    })?;
    Ok(())
}

/// Validate the model plus every run, workset and task against it.
pub fn validate_tree(tree: &MetaTree) -> Result<(), ValidationError> {
    let model = &tree.model;
    validate_model(model)?;

    unique(tree.runs.iter().map(|r| r.run_id), || "run ids".to_string())?;
    for run in &tree.runs {
        for p in &run.params {
            if model.param_by_name(&p.name).is_none() {
                return Err(ValidationError::MissingReference {
                    id: p.name.clone(),
                    context: format!("run '{}' parameters", run.name),
                });
            }
        }
        for t in &run.tables {
            if model.table_by_name(&t.name).is_none() {
                return Err(ValidationError::MissingReference {
                    id: t.name.clone(),
                    context: format!("run '{}' output tables", run.name),
                });
            }
        }
        for e in &run.entities {
            if model.entity_by_name(&e.name).is_none() {
                return Err(ValidationError::MissingReference {
                    id: e.name.clone(),
                    context: format!("run '{}' microdata", run.name),
                });
            }
        }
        unique(run.options.iter().map(|o| &o.key), || {
            format!("run '{}' options", run.name)
        })?;
    }

    unique(tree.worksets.iter().map(|s| s.set_id), || {
        "workset ids".to_string()
    })?;
    for set in &tree.worksets {
        for p in &set.params {
            if model.param_by_name(&p.name).is_none() {
                return Err(ValidationError::MissingReference {
                    id: p.name.clone(),
                    context: format!("workset '{}' parameters", set.name),
                });
            }
        }
    }

    unique(tree.tasks.iter().map(|t| t.task_id), || "task ids".to_string())?;
    Ok(())
}
