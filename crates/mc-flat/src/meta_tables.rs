//! Catalogue of flat metadata tables.
//!
//! Every table has a fixed column list and a row producer built on the
//! sequencer. Nullable columns are written with the NULL marker.

use std::slice;

use mc_meta::schema::*;

use crate::row::{FlatRow, RowSource, column_names};
use crate::sequencer::{ListRows, PairRows, TripleRows};

type RowsFn = for<'a> fn(&'a MetaTree) -> Box<dyn RowSource + 'a>;

/// One flat destination table.
pub struct MetaTable {
    pub name: &'static str,
    pub columns: &'static [&'static str],
    rows: RowsFn,
}

impl MetaTable {
    pub fn rows<'a>(&self, tree: &'a MetaTree) -> Box<dyn RowSource + 'a> {
        (self.rows)(tree)
    }

    pub fn file_name(&self) -> String {
        format!("{}.csv", self.name)
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| *c == column)
    }
}

pub fn meta_table(name: &str) -> Option<&'static MetaTable> {
    META_TABLES.iter().find(|t| t.name == name)
}

pub const MODEL_DIC: &[&str] = &[
    "model_id",
    "model_name",
    "model_digest",
    "model_ver",
    "create_dt",
    "default_lang_code",
];
pub const MODEL_DIC_TXT: &[&str] = &["model_id", "lang_code", "descr", "note"];
pub const LANG_LST: &[&str] = &["lang_code", "lang_name"];
pub const LANG_WORD: &[&str] = &["lang_code", "word_code", "word_value"];
pub const TYPE_DIC: &[&str] = &[
    "type_id",
    "type_name",
    "type_digest",
    "dic_kind",
    "total_enum_id",
];
pub const TYPE_DIC_TXT: &[&str] = &["type_id", "lang_code", "descr", "note"];
pub const TYPE_ENUM_LST: &[&str] = &["type_id", "enum_id", "enum_name"];
pub const PARAMETER_DIC: &[&str] = &[
    "parameter_id",
    "parameter_name",
    "parameter_digest",
    "parameter_rank",
    "type_id",
    "is_extendable",
    "is_hidden",
    "num_cumulated",
    "import_digest",
];
pub const PARAMETER_DIC_TXT: &[&str] = &["parameter_id", "lang_code", "descr", "note"];
pub const PARAMETER_DIMS: &[&str] = &["parameter_id", "dim_id", "dim_name", "type_id"];
pub const TABLE_DIC: &[&str] = &[
    "table_id",
    "table_name",
    "table_digest",
    "is_user",
    "table_rank",
    "is_sparse",
    "expr_pos",
];
pub const TABLE_DIC_TXT: &[&str] = &["table_id", "lang_code", "descr", "note"];
pub const TABLE_DIMS: &[&str] = &[
    "table_id", "dim_id", "dim_name", "type_id", "is_total", "dim_size",
];
pub const TABLE_ACC: &[&str] = &["table_id", "acc_id", "acc_name", "is_derived", "acc_src"];
pub const TABLE_EXPR: &[&str] = &[
    "table_id",
    "expr_id",
    "expr_name",
    "expr_decimals",
    "expr_src",
];
pub const ENTITY_DIC: &[&str] = &["entity_id", "entity_name", "entity_digest"];
pub const ENTITY_ATTR: &[&str] = &["entity_id", "attr_id", "attr_name", "type_id", "is_internal"];
pub const RUN_LST: &[&str] = &[
    "run_id",
    "run_name",
    "sub_count",
    "sub_started",
    "sub_completed",
    "create_dt",
    "status",
    "update_dt",
    "run_digest",
    "value_digest",
    "run_stamp",
];
pub const RUN_TXT: &[&str] = &["run_id", "lang_code", "descr", "note"];
pub const RUN_OPTION: &[&str] = &["run_id", "option_key", "option_value"];
pub const RUN_PARAMETER: &[&str] = &["run_id", "parameter_name", "sub_count", "value_digest"];
pub const RUN_PARAMETER_TXT: &[&str] = &["run_id", "parameter_name", "lang_code", "note"];
pub const RUN_TABLE: &[&str] = &["run_id", "table_name", "value_digest"];
pub const RUN_ENTITY: &[&str] = &["run_id", "entity_name", "value_digest"];
pub const WORKSET_LST: &[&str] = &[
    "set_id",
    "set_name",
    "base_run_digest",
    "is_readonly",
    "update_dt",
];
pub const WORKSET_TXT: &[&str] = &["set_id", "lang_code", "descr", "note"];
pub const WORKSET_PARAMETER: &[&str] = &["set_id", "parameter_name", "sub_count", "default_sub_id"];
pub const WORKSET_PARAMETER_TXT: &[&str] = &["set_id", "parameter_name", "lang_code", "note"];
pub const TASK_LST: &[&str] = &["task_id", "task_name"];
pub const TASK_TXT: &[&str] = &["task_id", "lang_code", "descr", "note"];
pub const TASK_SET: &[&str] = &["task_id", "set_name"];
pub const TASK_RUN_LST: &[&str] = &[
    "task_id",
    "task_run_id",
    "run_name",
    "sub_count",
    "create_dt",
    "status",
    "update_dt",
    "run_stamp",
];
pub const TASK_RUN_SET: &[&str] = &["task_id", "task_run_id", "run_digest", "set_name"];

fn push_text(row: &mut FlatRow, t: &LangNote) {
    row.push_str(&t.lang_code);
    row.push_str(&t.descr);
    row.push_opt(t.note.as_deref());
}

fn model_dic(tree: &MetaTree) -> Box<dyn RowSource + '_> {
    Box::new(ListRows::new(
        "model_dic",
        column_names(MODEL_DIC),
        slice::from_ref(&tree.model),
        |m, row| {
            row.push(m.model_id);
            row.push_str(&m.name);
            row.push_str(&m.digest);
            row.push_str(&m.version);
            row.push_str(&m.create_dt);
            row.push_str(&m.default_lang);
        },
    ))
}

fn model_dic_txt(tree: &MetaTree) -> Box<dyn RowSource + '_> {
    Box::new(PairRows::new(
        "model_dic_txt",
        column_names(MODEL_DIC_TXT),
        slice::from_ref(&tree.model),
        |m| m.texts.as_slice(),
        |m, t, row| {
            row.push(m.model_id);
            push_text(row, t);
        },
    ))
}

fn lang_lst(tree: &MetaTree) -> Box<dyn RowSource + '_> {
    Box::new(ListRows::new(
        "lang_lst",
        column_names(LANG_LST),
        &tree.model.langs,
        |l, row| {
            row.push_str(&l.lang_code);
            row.push_str(&l.name);
        },
    ))
}

fn lang_word(tree: &MetaTree) -> Box<dyn RowSource + '_> {
    Box::new(PairRows::new(
        "lang_word",
        column_names(LANG_WORD),
        &tree.model.langs,
        |l| l.words.as_slice(),
        |l, w, row| {
            row.push_str(&l.lang_code);
            row.push_str(&w.code);
            row.push_str(&w.label);
        },
    ))
}

fn type_dic(tree: &MetaTree) -> Box<dyn RowSource + '_> {
    Box::new(ListRows::new(
        "type_dic",
        column_names(TYPE_DIC),
        &tree.model.types,
        |t, row| {
            row.push(t.type_id);
            row.push_str(&t.name);
            row.push_str(&t.digest);
            row.push_str(t.kind.as_str());
            row.push(t.total_enum_id);
        },
    ))
}

fn type_dic_txt(tree: &MetaTree) -> Box<dyn RowSource + '_> {
    Box::new(PairRows::new(
        "type_dic_txt",
        column_names(TYPE_DIC_TXT),
        &tree.model.types,
        |t| t.texts.as_slice(),
        |t, txt, row| {
            row.push(t.type_id);
            push_text(row, txt);
        },
    ))
}

fn type_enum_lst(tree: &MetaTree) -> Box<dyn RowSource + '_> {
    Box::new(PairRows::new(
        "type_enum_lst",
        column_names(TYPE_ENUM_LST),
        &tree.model.types,
        |t| t.enums.as_slice(),
        |t, e, row| {
            row.push(t.type_id);
            row.push(e.enum_id);
            row.push_str(&e.name);
        },
    ))
}

fn parameter_dic(tree: &MetaTree) -> Box<dyn RowSource + '_> {
    Box::new(ListRows::new(
        "parameter_dic",
        column_names(PARAMETER_DIC),
        &tree.model.params,
        |p, row| {
            row.push(p.param_id);
            row.push_str(&p.name);
            row.push_str(&p.digest);
            row.push(p.rank);
            row.push(p.type_id);
            row.push_bool(p.is_extendable);
            row.push_bool(p.is_hidden);
            row.push(p.num_cumulated);
            row.push_opt(p.import_digest.as_deref());
        },
    ))
}

fn parameter_dic_txt(tree: &MetaTree) -> Box<dyn RowSource + '_> {
    Box::new(PairRows::new(
        "parameter_dic_txt",
        column_names(PARAMETER_DIC_TXT),
        &tree.model.params,
        |p| p.texts.as_slice(),
        |p, txt, row| {
            row.push(p.param_id);
            push_text(row, txt);
        },
    ))
}

fn parameter_dims(tree: &MetaTree) -> Box<dyn RowSource + '_> {
    Box::new(PairRows::new(
        "parameter_dims",
        column_names(PARAMETER_DIMS),
        &tree.model.params,
        |p| p.dims.as_slice(),
        |p, d, row| {
            row.push(p.param_id);
            row.push(d.dim_id);
            row.push_str(&d.name);
            row.push(d.type_id);
        },
    ))
}

fn table_dic(tree: &MetaTree) -> Box<dyn RowSource + '_> {
    Box::new(ListRows::new(
        "table_dic",
        column_names(TABLE_DIC),
        &tree.model.tables,
        |t, row| {
            row.push(t.table_id);
            row.push_str(&t.name);
            row.push_str(&t.digest);
            row.push_bool(t.is_user);
            row.push(t.rank);
            row.push_bool(t.is_sparse);
            row.push(t.expr_pos);
        },
    ))
}

fn table_dic_txt(tree: &MetaTree) -> Box<dyn RowSource + '_> {
    Box::new(PairRows::new(
        "table_dic_txt",
        column_names(TABLE_DIC_TXT),
        &tree.model.tables,
        |t| t.texts.as_slice(),
        |t, txt, row| {
            row.push(t.table_id);
            push_text(row, txt);
        },
    ))
}

fn table_dims(tree: &MetaTree) -> Box<dyn RowSource + '_> {
    Box::new(PairRows::new(
        "table_dims",
        column_names(TABLE_DIMS),
        &tree.model.tables,
        |t| t.dims.as_slice(),
        |t, d, row| {
            row.push(t.table_id);
            row.push(d.dim_id);
            row.push_str(&d.name);
            row.push(d.type_id);
            row.push_bool(d.is_total);
            row.push(d.dim_size);
        },
    ))
}

fn table_acc(tree: &MetaTree) -> Box<dyn RowSource + '_> {
    Box::new(PairRows::new(
        "table_acc",
        column_names(TABLE_ACC),
        &tree.model.tables,
        |t| t.accs.as_slice(),
        |t, a, row| {
            row.push(t.table_id);
            row.push(a.acc_id);
            row.push_str(&a.name);
            row.push_bool(a.is_derived);
            row.push_str(&a.src);
        },
    ))
}

fn table_expr(tree: &MetaTree) -> Box<dyn RowSource + '_> {
    Box::new(PairRows::new(
        "table_expr",
        column_names(TABLE_EXPR),
        &tree.model.tables,
        |t| t.exprs.as_slice(),
        |t, e, row| {
            row.push(t.table_id);
            row.push(e.expr_id);
            row.push_str(&e.name);
            row.push(e.decimals);
            row.push_str(&e.src);
        },
    ))
}

fn entity_dic(tree: &MetaTree) -> Box<dyn RowSource + '_> {
    Box::new(ListRows::new(
        "entity_dic",
        column_names(ENTITY_DIC),
        &tree.model.entities,
        |e, row| {
            row.push(e.entity_id);
            row.push_str(&e.name);
            row.push_str(&e.digest);
        },
    ))
}

fn entity_attr(tree: &MetaTree) -> Box<dyn RowSource + '_> {
    Box::new(PairRows::new(
        "entity_attr",
        column_names(ENTITY_ATTR),
        &tree.model.entities,
        |e| e.attrs.as_slice(),
        |e, a, row| {
            row.push(e.entity_id);
            row.push(a.attr_id);
            row.push_str(&a.name);
            row.push(a.type_id);
            row.push_bool(a.is_internal);
        },
    ))
}

fn run_lst(tree: &MetaTree) -> Box<dyn RowSource + '_> {
    Box::new(ListRows::new(
        "run_lst",
        column_names(RUN_LST),
        &tree.runs,
        |r, row| {
            row.push(r.run_id);
            row.push_str(&r.name);
            row.push(r.sub_count);
            row.push(r.sub_started);
            row.push(r.sub_completed);
            row.push_str(&r.create_dt);
            row.push_str(&r.status);
            row.push_str(&r.update_dt);
            row.push_str(&r.run_digest);
            row.push_str(&r.value_digest);
            row.push_str(&r.run_stamp);
        },
    ))
}

fn run_txt(tree: &MetaTree) -> Box<dyn RowSource + '_> {
    Box::new(PairRows::new(
        "run_txt",
        column_names(RUN_TXT),
        &tree.runs,
        |r| r.texts.as_slice(),
        |r, t, row| {
            row.push(r.run_id);
            push_text(row, t);
        },
    ))
}

fn run_option(tree: &MetaTree) -> Box<dyn RowSource + '_> {
    Box::new(PairRows::new(
        "run_option",
        column_names(RUN_OPTION),
        &tree.runs,
        |r| r.options.as_slice(),
        |r, o, row| {
            row.push(r.run_id);
            row.push_str(&o.key);
            row.push_str(&o.value);
        },
    ))
}

fn run_parameter(tree: &MetaTree) -> Box<dyn RowSource + '_> {
    Box::new(PairRows::new(
        "run_parameter",
        column_names(RUN_PARAMETER),
        &tree.runs,
        |r| r.params.as_slice(),
        |r, p, row| {
            row.push(r.run_id);
            row.push_str(&p.name);
            row.push(p.sub_count);
            row.push_str(&p.value_digest);
        },
    ))
}

fn run_parameter_txt(tree: &MetaTree) -> Box<dyn RowSource + '_> {
    Box::new(TripleRows::new(
        "run_parameter_txt",
        column_names(RUN_PARAMETER_TXT),
        &tree.runs,
        |r| r.params.as_slice(),
        |p| p.notes.as_slice(),
        |r, p, n, row| {
            row.push(r.run_id);
            row.push_str(&p.name);
            row.push_str(&n.lang_code);
            row.push_opt(n.note.as_deref());
        },
    ))
}

fn run_table(tree: &MetaTree) -> Box<dyn RowSource + '_> {
    Box::new(PairRows::new(
        "run_table",
        column_names(RUN_TABLE),
        &tree.runs,
        |r| r.tables.as_slice(),
        |r, t, row| {
            row.push(r.run_id);
            row.push_str(&t.name);
            row.push_str(&t.value_digest);
        },
    ))
}

fn run_entity(tree: &MetaTree) -> Box<dyn RowSource + '_> {
    Box::new(PairRows::new(
        "run_entity",
        column_names(RUN_ENTITY),
        &tree.runs,
        |r| r.entities.as_slice(),
        |r, e, row| {
            row.push(r.run_id);
            row.push_str(&e.name);
            row.push_str(&e.value_digest);
        },
    ))
}

fn workset_lst(tree: &MetaTree) -> Box<dyn RowSource + '_> {
    Box::new(ListRows::new(
        "workset_lst",
        column_names(WORKSET_LST),
        &tree.worksets,
        |s, row| {
            row.push(s.set_id);
            row.push_str(&s.name);
            row.push_opt(s.base_run_digest.as_deref());
            row.push_bool(s.is_readonly);
            row.push_str(&s.update_dt);
        },
    ))
}

fn workset_txt(tree: &MetaTree) -> Box<dyn RowSource + '_> {
    Box::new(PairRows::new(
        "workset_txt",
        column_names(WORKSET_TXT),
        &tree.worksets,
        |s| s.texts.as_slice(),
        |s, t, row| {
            row.push(s.set_id);
            push_text(row, t);
        },
    ))
}

fn workset_parameter(tree: &MetaTree) -> Box<dyn RowSource + '_> {
    Box::new(PairRows::new(
        "workset_parameter",
        column_names(WORKSET_PARAMETER),
        &tree.worksets,
        |s| s.params.as_slice(),
        |s, p, row| {
            row.push(s.set_id);
            row.push_str(&p.name);
            row.push(p.sub_count);
            row.push(p.default_sub_id);
        },
    ))
}

fn workset_parameter_txt(tree: &MetaTree) -> Box<dyn RowSource + '_> {
    Box::new(TripleRows::new(
        "workset_parameter_txt",
        column_names(WORKSET_PARAMETER_TXT),
        &tree.worksets,
        |s| s.params.as_slice(),
        |p| p.notes.as_slice(),
        |s, p, n, row| {
            row.push(s.set_id);
            row.push_str(&p.name);
            row.push_str(&n.lang_code);
            row.push_opt(n.note.as_deref());
        },
    ))
}

fn task_lst(tree: &MetaTree) -> Box<dyn RowSource + '_> {
    Box::new(ListRows::new(
        "task_lst",
        column_names(TASK_LST),
        &tree.tasks,
        |t, row| {
            row.push(t.task_id);
            row.push_str(&t.name);
        },
    ))
}

fn task_txt(tree: &MetaTree) -> Box<dyn RowSource + '_> {
    Box::new(PairRows::new(
        "task_txt",
        column_names(TASK_TXT),
        &tree.tasks,
        |t| t.texts.as_slice(),
        |t, txt, row| {
            row.push(t.task_id);
            push_text(row, txt);
        },
    ))
}

fn task_set(tree: &MetaTree) -> Box<dyn RowSource + '_> {
    Box::new(PairRows::new(
        "task_set",
        column_names(TASK_SET),
        &tree.tasks,
        |t| t.sets.as_slice(),
        |t, name, row| {
            row.push(t.task_id);
            row.push_str(name);
        },
    ))
}

fn task_run_lst(tree: &MetaTree) -> Box<dyn RowSource + '_> {
    Box::new(PairRows::new(
        "task_run_lst",
        column_names(TASK_RUN_LST),
        &tree.tasks,
        |t| t.runs.as_slice(),
        |t, r, row| {
            row.push(t.task_id);
            row.push(r.task_run_id);
            row.push_str(&r.name);
            row.push(r.sub_count);
            row.push_str(&r.create_dt);
            row.push_str(&r.status);
            row.push_str(&r.update_dt);
            row.push_str(&r.run_stamp);
        },
    ))
}

fn task_run_set(tree: &MetaTree) -> Box<dyn RowSource + '_> {
    Box::new(TripleRows::new(
        "task_run_set",
        column_names(TASK_RUN_SET),
        &tree.tasks,
        |t| t.runs.as_slice(),
        |r| r.items.as_slice(),
        |t, r, item, row| {
            row.push(t.task_id);
            row.push(r.task_run_id);
            row.push_str(&item.run_digest);
            row.push_str(&item.set_name);
        },
    ))
}

/// Every flat metadata table, parents before children.
pub static META_TABLES: &[MetaTable] = &[
    MetaTable {
        name: "model_dic",
        columns: MODEL_DIC,
        rows: model_dic,
    },
    MetaTable {
        name: "model_dic_txt",
        columns: MODEL_DIC_TXT,
        rows: model_dic_txt,
    },
    MetaTable {
        name: "lang_lst",
        columns: LANG_LST,
        rows: lang_lst,
    },
    MetaTable {
        name: "lang_word",
        columns: LANG_WORD,
        rows: lang_word,
    },
    MetaTable {
        name: "type_dic",
        columns: TYPE_DIC,
        rows: type_dic,
    },
    MetaTable {
        name: "type_dic_txt",
        columns: TYPE_DIC_TXT,
        rows: type_dic_txt,
    },
    MetaTable {
        name: "type_enum_lst",
        columns: TYPE_ENUM_LST,
        rows: type_enum_lst,
    },
    MetaTable {
        name: "parameter_dic",
        columns: PARAMETER_DIC,
        rows: parameter_dic,
    },
    MetaTable {
        name: "parameter_dic_txt",
        columns: PARAMETER_DIC_TXT,
        rows: parameter_dic_txt,
    },
    MetaTable {
        name: "parameter_dims",
        columns: PARAMETER_DIMS,
        rows: parameter_dims,
    },
    MetaTable {
        name: "table_dic",
        columns: TABLE_DIC,
        rows: table_dic,
    },
    MetaTable {
        name: "table_dic_txt",
        columns: TABLE_DIC_TXT,
        rows: table_dic_txt,
    },
    MetaTable {
        name: "table_dims",
        columns: TABLE_DIMS,
        rows: table_dims,
    },
    MetaTable {
        name: "table_acc",
        columns: TABLE_ACC,
        rows: table_acc,
    },
    MetaTable {
        name: "table_expr",
        columns: TABLE_EXPR,
        rows: table_expr,
    },
    MetaTable {
        name: "entity_dic",
        columns: ENTITY_DIC,
        rows: entity_dic,
    },
    MetaTable {
        name: "entity_attr",
        columns: ENTITY_ATTR,
        rows: entity_attr,
    },
    MetaTable {
        name: "run_lst",
        columns: RUN_LST,
        rows: run_lst,
    },
    MetaTable {
        name: "run_txt",
        columns: RUN_TXT,
        rows: run_txt,
    },
    MetaTable {
        name: "run_option",
        columns: RUN_OPTION,
        rows: run_option,
    },
    MetaTable {
        name: "run_parameter",
        columns: RUN_PARAMETER,
        rows: run_parameter,
    },
    MetaTable {
        name: "run_parameter_txt",
        columns: RUN_PARAMETER_TXT,
        rows: run_parameter_txt,
    },
    MetaTable {
        name: "run_table",
        columns: RUN_TABLE,
        rows: run_table,
    },
    MetaTable {
        name: "run_entity",
        columns: RUN_ENTITY,
        rows: run_entity,
    },
    MetaTable {
        name: "workset_lst",
        columns: WORKSET_LST,
        rows: workset_lst,
    },
    MetaTable {
        name: "workset_txt",
        columns: WORKSET_TXT,
        rows: workset_txt,
    },
    MetaTable {
        name: "workset_parameter",
        columns: WORKSET_PARAMETER,
        rows: workset_parameter,
    },
    MetaTable {
        name: "workset_parameter_txt",
        columns: WORKSET_PARAMETER_TXT,
        rows: workset_parameter_txt,
    },
    MetaTable {
        name: "task_lst",
        columns: TASK_LST,
        rows: task_lst,
    },
    MetaTable {
        name: "task_txt",
        columns: TASK_TXT,
        rows: task_txt,
    },
    MetaTable {
        name: "task_set",
        columns: TASK_SET,
        rows: task_set,
    },
    MetaTable {
        name: "task_run_lst",
        columns: TASK_RUN_LST,
        rows: task_run_lst,
    },
    MetaTable {
        name: "task_run_set",
        columns: TASK_RUN_SET,
        rows: task_run_set,
    },
];
