//! mc-meta: metadata tree, JSON documents and validation.

pub mod migrate;
pub mod schema;
pub mod validate;

pub use migrate::{LATEST_VERSION, Migrate, migrate_entity_doc, migrate_model_doc};
pub use schema::*;
pub use validate::{ValidationError, validate_model, validate_tree, validate_version};

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;

pub type MetaResult<T> = Result<T, MetaError>;

#[derive(thiserror::Error, Debug)]
pub enum MetaError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Migration error: {what}")]
    Migration { what: String },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        source: std::io::Error,
    },

    #[error("JSON error in {path}: {source}")]
    Json {
        path: std::path::PathBuf,
        source: serde_json::Error,
    },
}

fn read_json<T: DeserializeOwned>(path: &Path) -> MetaResult<T> {
    let content = std::fs::read_to_string(path).map_err(|source| MetaError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(content.trim_start_matches('\u{feff}')).map_err(|source| {
        MetaError::Json {
            path: path.to_path_buf(),
            source,
        }
    })
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> MetaResult<()> {
    let content = serde_json::to_string_pretty(value).map_err(|source| MetaError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    std::fs::write(path, content).map_err(|source| MetaError::Io {
        path: path.to_path_buf(),
        source,
    })
}

pub fn load_model_doc(path: &Path) -> MetaResult<ModelDef> {
    let doc: ModelDoc = read_json(path)?;
    validate_version(doc.doc_version)?;
    let doc = migrate_model_doc(doc)?;
    validate_model(&doc.model)?;
    Ok(doc.model)
}

pub fn save_model_doc(path: &Path, model: &ModelDef) -> MetaResult<()> {
    validate_model(model)?;
    let doc = ModelDoc {
        doc_version: LATEST_VERSION,
        model: model.clone(),
    };
    write_json(path, &doc)
}

/// Load a run, workset or task document, migrated to the latest version.
pub fn load_entity_doc<T>(path: &Path) -> MetaResult<EntityDoc<T>>
where
    T: DeserializeOwned + Migrate,
{
    let doc: EntityDoc<T> = read_json(path)?;
    validate_version(doc.doc_version)?;
    migrate_entity_doc(doc)
}

/// Save a run, workset or task document. `value_format` names the float
/// format of the value tables written beside it, if any.
pub fn save_entity_doc<T: Serialize>(
    path: &Path,
    model: &ModelDef,
    body: &T,
    value_format: Option<&str>,
) -> MetaResult<()> {
    #[derive(Serialize)]
    struct DocRef<'a, T> {
        doc_version: u32,
        model_name: &'a str,
        model_digest: &'a str,
        #[serde(skip_serializing_if = "Option::is_none")]
        value_format: Option<&'a str>,
        #[serde(flatten)]
        body: &'a T,
    }
    write_json(
        path,
        &DocRef {
            doc_version: LATEST_VERSION,
            model_name: &model.name,
            model_digest: &model.digest,
            value_format,
            body,
        },
    )
}
