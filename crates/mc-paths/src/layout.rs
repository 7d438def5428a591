//! File and directory names of the text form.
//!
//! ```text
//! {model}.json
//! {model}.{kind}.{slug}.json      entity document
//! {kind}.{slug}/                  entity values
//! {model}.{kind}.{slug}/          narrowed-scope output root
//! ```

use mc_core::EntityKind;

pub const PARAMETERS_DIR: &str = "parameters";
pub const OUTPUT_TABLES_DIR: &str = "output-tables";
pub const MICRODATA_DIR: &str = "microdata";

pub fn model_doc_name(model: &str) -> String {
    format!("{}.json", model)
}

pub fn entity_doc_name(model: &str, kind: EntityKind, slug: &str) -> String {
    format!("{}.{}.{}.json", model, kind.file_word(), slug)
}

pub fn entity_dir_name(kind: EntityKind, slug: &str) -> String {
    format!("{}.{}", kind.file_word(), slug)
}

pub fn scope_dir_name(model: &str, kind: EntityKind, slug: &str) -> String {
    format!("{}.{}.{}", model, kind.file_word(), slug)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_follow_layout() {
        assert_eq!(model_doc_name("M"), "M.json");
        assert_eq!(entity_doc_name("M", EntityKind::Workset, "7.Default"), "M.set.7.Default.json");
        assert_eq!(entity_dir_name(EntityKind::Run, "Base"), "run.Base");
        assert_eq!(scope_dir_name("M", EntityKind::Task, "T"), "M.task.T");
    }
}
