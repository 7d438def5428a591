//! Document version migration.

use crate::MetaError;
use crate::schema::{
    EntityDoc, LangNote, ModelDef, ModelDoc, ParamNote, RunDef, TaskDef, WorksetDef,
};

pub const LATEST_VERSION: u32 = 2;

/// Bodies of metadata documents that can be migrated in place.
pub trait Migrate {
    /// Version 1 documents wrote an empty note where the note was absent.
    fn drop_empty_notes(&mut self);
}

fn drop_empty_lang_notes(texts: &mut [LangNote]) {
    for t in texts {
        if t.note.as_deref() == Some("") {
            t.note = None;
        }
    }
}

fn drop_empty_param_notes(notes: &mut [ParamNote]) {
    for n in notes {
        if n.note.as_deref() == Some("") {
            n.note = None;
        }
    }
}

impl Migrate for ModelDef {
    fn drop_empty_notes(&mut self) {
        drop_empty_lang_notes(&mut self.texts);
        for t in &mut self.types {
            drop_empty_lang_notes(&mut t.texts);
        }
        for p in &mut self.params {
            drop_empty_lang_notes(&mut p.texts);
        }
        for t in &mut self.tables {
            drop_empty_lang_notes(&mut t.texts);
        }
    }
}

impl Migrate for RunDef {
    fn drop_empty_notes(&mut self) {
        drop_empty_lang_notes(&mut self.texts);
        for p in &mut self.params {
            drop_empty_param_notes(&mut p.notes);
        }
    }
}

impl Migrate for WorksetDef {
    fn drop_empty_notes(&mut self) {
        drop_empty_lang_notes(&mut self.texts);
        for p in &mut self.params {
            drop_empty_param_notes(&mut p.notes);
        }
    }
}

impl Migrate for TaskDef {
    fn drop_empty_notes(&mut self) {
        drop_empty_lang_notes(&mut self.texts);
    }
}

pub fn migrate_model_doc(mut doc: ModelDoc) -> Result<ModelDoc, MetaError> {
    while doc.doc_version < LATEST_VERSION {
        doc.doc_version = migrate_one_version(doc.doc_version, &mut doc.model)?;
    }
    Ok(doc)
}

pub fn migrate_entity_doc<T: Migrate>(mut doc: EntityDoc<T>) -> Result<EntityDoc<T>, MetaError> {
    while doc.doc_version < LATEST_VERSION {
        doc.doc_version = migrate_one_version(doc.doc_version, &mut doc.body)?;
    }
    Ok(doc)
}

fn migrate_one_version<T: Migrate>(version: u32, body: &mut T) -> Result<u32, MetaError> {
    match version {
        0 => Ok(1),
        1 => {
            body.drop_empty_notes();
            Ok(2)
        }
        v => Err(MetaError::Migration {
            what: format!("No migration path from version {}", v),
        }),
    }
}
