//! Metadata tree definitions.

use serde::{Deserialize, Serialize};

/// Description and optional note in one language.
///
/// `note: None` and `note: Some("")` are different values and are kept
/// distinct through every representation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LangNote {
    pub lang_code: String,
    #[serde(default)]
    pub descr: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Note attached to a run or workset parameter in one language.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParamNote {
    pub lang_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LangDef {
    pub lang_code: String,
    pub name: String,
    /// Ordered word list; keys are unique within a language.
    #[serde(default)]
    pub words: Vec<WordDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WordDef {
    pub code: String,
    pub label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelDef {
    pub model_id: i32,
    pub name: String,
    pub digest: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub create_dt: String,
    #[serde(default)]
    pub default_lang: String,
    #[serde(default)]
    pub langs: Vec<LangDef>,
    #[serde(default)]
    pub texts: Vec<LangNote>,
    #[serde(default)]
    pub types: Vec<TypeDef>,
    #[serde(default)]
    pub params: Vec<ParamDef>,
    #[serde(default)]
    pub tables: Vec<TableDef>,
    #[serde(default)]
    pub entities: Vec<EntityDef>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TypeKind {
    /// Built-in type: int, double, bool, file, ...
    Simple,
    Logical,
    Classification,
    Range,
    Partition,
}

impl TypeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TypeKind::Simple => "simple",
            TypeKind::Logical => "logical",
            TypeKind::Classification => "classification",
            TypeKind::Range => "range",
            TypeKind::Partition => "partition",
        }
    }

    pub fn from_str_opt(s: &str) -> Option<Self> {
        match s {
            "simple" => Some(TypeKind::Simple),
            "logical" => Some(TypeKind::Logical),
            "classification" => Some(TypeKind::Classification),
            "range" => Some(TypeKind::Range),
            "partition" => Some(TypeKind::Partition),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TypeDef {
    pub type_id: i32,
    pub name: String,
    #[serde(default)]
    pub digest: String,
    pub kind: TypeKind,
    #[serde(default)]
    pub total_enum_id: i32,
    #[serde(default)]
    pub enums: Vec<EnumDef>,
    #[serde(default)]
    pub texts: Vec<LangNote>,
}

impl TypeDef {
    /// Logical, classification, range and partition types enumerate their values.
    pub fn is_enum_based(&self) -> bool {
        !matches!(self.kind, TypeKind::Simple)
    }

    pub fn enum_by_id(&self, enum_id: i32) -> Option<&EnumDef> {
        self.enums.iter().find(|e| e.enum_id == enum_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EnumDef {
    pub enum_id: i32,
    /// Enum code.
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParamDef {
    pub param_id: i32,
    pub name: String,
    #[serde(default)]
    pub digest: String,
    pub rank: usize,
    pub type_id: i32,
    #[serde(default)]
    pub is_extendable: bool,
    #[serde(default)]
    pub is_hidden: bool,
    #[serde(default)]
    pub num_cumulated: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub import_digest: Option<String>,
    #[serde(default)]
    pub dims: Vec<DimDef>,
    #[serde(default)]
    pub texts: Vec<LangNote>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DimDef {
    pub dim_id: i32,
    pub name: String,
    pub type_id: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TableDef {
    pub table_id: i32,
    pub name: String,
    #[serde(default)]
    pub digest: String,
    #[serde(default)]
    pub is_user: bool,
    pub rank: usize,
    #[serde(default)]
    pub is_sparse: bool,
    #[serde(default)]
    pub expr_pos: i32,
    #[serde(default)]
    pub dims: Vec<TableDimDef>,
    #[serde(default)]
    pub accs: Vec<AccDef>,
    #[serde(default)]
    pub exprs: Vec<ExprDef>,
    #[serde(default)]
    pub texts: Vec<LangNote>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TableDimDef {
    pub dim_id: i32,
    pub name: String,
    pub type_id: i32,
    #[serde(default)]
    pub is_total: bool,
    pub dim_size: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccDef {
    pub acc_id: i32,
    pub name: String,
    #[serde(default)]
    pub is_derived: bool,
    #[serde(default)]
    pub src: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExprDef {
    pub expr_id: i32,
    pub name: String,
    #[serde(default)]
    pub decimals: i32,
    #[serde(default)]
    pub src: String,
}

/// Microdata entity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EntityDef {
    pub entity_id: i32,
    pub name: String,
    #[serde(default)]
    pub digest: String,
    #[serde(default)]
    pub attrs: Vec<AttrDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AttrDef {
    pub attr_id: i32,
    pub name: String,
    pub type_id: i32,
    #[serde(default)]
    pub is_internal: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OptionDef {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunDef {
    pub run_id: i32,
    pub name: String,
    #[serde(default = "default_sub_count")]
    pub sub_count: i32,
    #[serde(default)]
    pub sub_started: i32,
    #[serde(default)]
    pub sub_completed: i32,
    #[serde(default)]
    pub create_dt: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub update_dt: String,
    #[serde(default)]
    pub run_digest: String,
    #[serde(default)]
    pub value_digest: String,
    #[serde(default)]
    pub run_stamp: String,
    /// Run options in a stable order; see [`OptionDef`].
    #[serde(default)]
    pub options: Vec<OptionDef>,
    #[serde(default)]
    pub texts: Vec<LangNote>,
    #[serde(default)]
    pub params: Vec<RunParamDef>,
    #[serde(default)]
    pub tables: Vec<RunTableDef>,
    #[serde(default)]
    pub entities: Vec<RunEntityDef>,
}

fn default_sub_count() -> i32 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunParamDef {
    pub name: String,
    #[serde(default = "default_sub_count")]
    pub sub_count: i32,
    #[serde(default)]
    pub value_digest: String,
    #[serde(default)]
    pub notes: Vec<ParamNote>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunTableDef {
    pub name: String,
    #[serde(default)]
    pub value_digest: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunEntityDef {
    pub name: String,
    #[serde(default)]
    pub value_digest: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorksetDef {
    pub set_id: i32,
    pub name: String,
    /// Digest of the run supplying parameters absent from this set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_run_digest: Option<String>,
    #[serde(default)]
    pub is_readonly: bool,
    #[serde(default)]
    pub update_dt: String,
    #[serde(default)]
    pub texts: Vec<LangNote>,
    #[serde(default)]
    pub params: Vec<SetParamDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SetParamDef {
    pub name: String,
    #[serde(default = "default_sub_count")]
    pub sub_count: i32,
    #[serde(default)]
    pub default_sub_id: i32,
    #[serde(default)]
    pub notes: Vec<ParamNote>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaskDef {
    pub task_id: i32,
    pub name: String,
    #[serde(default)]
    pub texts: Vec<LangNote>,
    /// Names of the input worksets in the task.
    #[serde(default)]
    pub sets: Vec<String>,
    #[serde(default)]
    pub runs: Vec<TaskRunDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaskRunDef {
    pub task_run_id: i32,
    pub name: String,
    #[serde(default = "default_sub_count")]
    pub sub_count: i32,
    #[serde(default)]
    pub create_dt: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub update_dt: String,
    #[serde(default)]
    pub run_stamp: String,
    #[serde(default)]
    pub items: Vec<TaskRunItemDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaskRunItemDef {
    pub run_digest: String,
    pub set_name: String,
}

/// Whole metadata forest of one model, in source order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetaTree {
    pub model: ModelDef,
    #[serde(default)]
    pub runs: Vec<RunDef>,
    #[serde(default)]
    pub worksets: Vec<WorksetDef>,
    #[serde(default)]
    pub tasks: Vec<TaskDef>,
}

impl MetaTree {
    pub fn new(model: ModelDef) -> Self {
        Self {
            model,
            runs: Vec::new(),
            worksets: Vec::new(),
            tasks: Vec::new(),
        }
    }
}

impl ModelDef {
    pub fn type_by_id(&self, type_id: i32) -> Option<&TypeDef> {
        self.types.iter().find(|t| t.type_id == type_id)
    }

    pub fn param_by_name(&self, name: &str) -> Option<&ParamDef> {
        self.params.iter().find(|p| p.name == name)
    }

    pub fn table_by_name(&self, name: &str) -> Option<&TableDef> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn entity_by_name(&self, name: &str) -> Option<&EntityDef> {
        self.entities.iter().find(|e| e.name == name)
    }
}

/// Model metadata document (`{model}.json`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelDoc {
    /// Document format version; the model's own `version` is a separate field.
    pub doc_version: u32,
    #[serde(flatten)]
    pub model: ModelDef,
}

/// Run, workset or task document; carries the owning model's identity so
/// it can be matched without consulting storage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EntityDoc<T> {
    pub doc_version: u32,
    pub model_name: String,
    pub model_digest: String,
    /// Float format the value tables beside this document were written with.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_format: Option<String>,
    #[serde(flatten)]
    pub body: T,
}

pub type RunDoc = EntityDoc<RunDef>;
pub type WorksetDoc = EntityDoc<WorksetDef>;
pub type TaskDoc = EntityDoc<TaskDef>;
