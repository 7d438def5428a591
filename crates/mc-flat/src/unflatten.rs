//! Rebuild a metadata tree from flat tables.
//!
//! Inverse of [`crate::meta_tables`]: child rows are attached to the parent
//! named by their key columns, in file order.

use mc_core::{McError, McResult, parse_bool, parse_int, unescape_null_text};
use mc_meta::schema::*;

use crate::meta_tables::{META_TABLES, MetaTable};

/// One loaded row with typed field access.
struct Rec<'r> {
    table: &'static str,
    fields: &'r [String],
}

impl<'r> Rec<'r> {
    fn new(table: &MetaTable, fields: &'r [String]) -> McResult<Self> {
        if fields.len() != table.columns.len() {
            return Err(McError::Arity {
                table: table.name.to_string(),
                expected: table.columns.len(),
                actual: fields.len(),
            });
        }
        Ok(Self {
            table: table.name,
            fields,
        })
    }

    fn str(&self, i: usize) -> McResult<&'r str> {
        self.fields
            .get(i)
            .map(String::as_str)
            .ok_or_else(|| McError::invariant(format!("{}: no column {}", self.table, i)))
    }

    fn text(&self, i: usize) -> McResult<String> {
        self.str(i).map(str::to_string)
    }

    fn opt(&self, i: usize) -> McResult<Option<String>> {
        Ok(unescape_null_text(self.str(i)?).map(str::to_string))
    }

    fn int(&self, i: usize) -> McResult<i32> {
        let s = self.str(i)?;
        i32::try_from(parse_int(s)?).map_err(|_| McError::parse("int", s))
    }

    fn size(&self, i: usize) -> McResult<usize> {
        let s = self.str(i)?;
        usize::try_from(parse_int(s)?).map_err(|_| McError::parse("size", s))
    }

    fn flag(&self, i: usize) -> McResult<bool> {
        parse_bool(self.str(i)?)
    }

    fn lang_note(&self, first: usize) -> McResult<LangNote> {
        Ok(LangNote {
            lang_code: self.text(first)?,
            descr: self.text(first + 1)?,
            note: self.opt(first + 2)?,
        })
    }
}

fn parent<'t, T>(
    items: &'t mut [T],
    table: &str,
    key: &str,
    pred: impl Fn(&T) -> bool,
) -> McResult<&'t mut T> {
    items.iter_mut().find(|t| pred(t)).ok_or_else(|| {
        McError::invariant(format!("{}: row refers to unknown parent {}", table, key))
    })
}

/// Rebuild a tree by loading every table of [`META_TABLES`] through `load`.
///
/// `load` returns the data rows of one table, header excluded.
pub fn unflatten<E>(
    mut load: impl FnMut(&MetaTable) -> Result<Vec<Vec<String>>, E>,
) -> Result<MetaTree, E>
where
    E: From<McError>,
{
    let mut tables = Vec::with_capacity(META_TABLES.len());
    for table in META_TABLES {
        tables.push((table, load(table)?));
    }
    Ok(build(&tables)?)
}

fn build(tables: &[(&MetaTable, Vec<Vec<String>>)]) -> McResult<MetaTree> {
    let mut tree: Option<MetaTree> = None;

    for (table, rows) in tables {
        if table.name == "model_dic" {
            if rows.len() != 1 {
                return Err(McError::invariant(format!(
                    "model_dic: expected exactly one row, found {}",
                    rows.len()
                )));
            }
            let r = Rec::new(table, &rows[0])?;
            tree = Some(MetaTree::new(ModelDef {
                model_id: r.int(0)?,
                name: r.text(1)?,
                digest: r.text(2)?,
                version: r.text(3)?,
                create_dt: r.text(4)?,
                default_lang: r.text(5)?,
                langs: vec![],
                texts: vec![],
                types: vec![],
                params: vec![],
                tables: vec![],
                entities: vec![],
            }));
            continue;
        }
        let tree = tree
            .as_mut()
            .ok_or_else(|| McError::invariant("model_dic must come first"))?;
        for fields in rows {
            let r = Rec::new(table, fields)?;
            attach(tree, &r)?;
        }
    }

    tree.ok_or_else(|| McError::invariant("model_dic table is missing"))
}

fn attach(tree: &mut MetaTree, r: &Rec<'_>) -> McResult<()> {
    let t = r.table;
    let model = &mut tree.model;
    match t {
        "model_dic_txt" => {
            let id = r.int(0)?;
            if id != model.model_id {
                return Err(McError::invariant(format!(
                    "{}: row refers to unknown parent {}",
                    t, id
                )));
            }
            model.texts.push(r.lang_note(1)?);
        }
        "lang_lst" => model.langs.push(LangDef {
            lang_code: r.text(0)?,
            name: r.text(1)?,
            words: vec![],
        }),
        "lang_word" => {
            let code = r.str(0)?;
            parent(&mut model.langs, t, code, |l| l.lang_code == code)?
                .words
                .push(WordDef {
                    code: r.text(1)?,
                    label: r.text(2)?,
                });
        }
        "type_dic" => {
            let kind_text = r.str(3)?;
            let kind = TypeKind::from_str_opt(kind_text)
                .ok_or_else(|| McError::parse("type kind", kind_text))?;
            model.types.push(TypeDef {
                type_id: r.int(0)?,
                name: r.text(1)?,
                digest: r.text(2)?,
                kind,
                total_enum_id: r.int(4)?,
                enums: vec![],
                texts: vec![],
            });
        }
        "type_dic_txt" => {
            let id = r.int(0)?;
            parent(&mut model.types, t, r.str(0)?, |x| x.type_id == id)?
                .texts
                .push(r.lang_note(1)?);
        }
        "type_enum_lst" => {
            let id = r.int(0)?;
            parent(&mut model.types, t, r.str(0)?, |x| x.type_id == id)?
                .enums
                .push(EnumDef {
                    enum_id: r.int(1)?,
                    name: r.text(2)?,
                });
        }
        "parameter_dic" => model.params.push(ParamDef {
            param_id: r.int(0)?,
            name: r.text(1)?,
            digest: r.text(2)?,
            rank: r.size(3)?,
            type_id: r.int(4)?,
            is_extendable: r.flag(5)?,
            is_hidden: r.flag(6)?,
            num_cumulated: r.int(7)?,
            import_digest: r.opt(8)?,
            dims: vec![],
            texts: vec![],
        }),
        "parameter_dic_txt" => {
            let id = r.int(0)?;
            parent(&mut model.params, t, r.str(0)?, |x| x.param_id == id)?
                .texts
                .push(r.lang_note(1)?);
        }
        "parameter_dims" => {
            let id = r.int(0)?;
            parent(&mut model.params, t, r.str(0)?, |x| x.param_id == id)?
                .dims
                .push(DimDef {
                    dim_id: r.int(1)?,
                    name: r.text(2)?,
                    type_id: r.int(3)?,
                });
        }
        "table_dic" => model.tables.push(TableDef {
            table_id: r.int(0)?,
            name: r.text(1)?,
            digest: r.text(2)?,
            is_user: r.flag(3)?,
            rank: r.size(4)?,
            is_sparse: r.flag(5)?,
            expr_pos: r.int(6)?,
            dims: vec![],
            accs: vec![],
            exprs: vec![],
            texts: vec![],
        }),
        "table_dic_txt" | "table_dims" | "table_acc" | "table_expr" => {
            let id = r.int(0)?;
            let table = parent(&mut model.tables, t, r.str(0)?, |x| x.table_id == id)?;
            match t {
                "table_dic_txt" => table.texts.push(r.lang_note(1)?),
                "table_dims" => table.dims.push(TableDimDef {
                    dim_id: r.int(1)?,
                    name: r.text(2)?,
                    type_id: r.int(3)?,
                    is_total: r.flag(4)?,
                    dim_size: r.int(5)?,
                }),
                "table_acc" => table.accs.push(AccDef {
                    acc_id: r.int(1)?,
                    name: r.text(2)?,
                    is_derived: r.flag(3)?,
                    src: r.text(4)?,
                }),
                _ => table.exprs.push(ExprDef {
                    expr_id: r.int(1)?,
                    name: r.text(2)?,
                    decimals: r.int(3)?,
                    src: r.text(4)?,
                }),
            }
        }
        "entity_dic" => model.entities.push(EntityDef {
            entity_id: r.int(0)?,
            name: r.text(1)?,
            digest: r.text(2)?,
            attrs: vec![],
        }),
        "entity_attr" => {
            let id = r.int(0)?;
            parent(&mut model.entities, t, r.str(0)?, |x| x.entity_id == id)?
                .attrs
                .push(AttrDef {
                    attr_id: r.int(1)?,
                    name: r.text(2)?,
                    type_id: r.int(3)?,
                    is_internal: r.flag(4)?,
                });
        }
        "run_lst" => tree.runs.push(RunDef {
            run_id: r.int(0)?,
            name: r.text(1)?,
            sub_count: r.int(2)?,
            sub_started: r.int(3)?,
            sub_completed: r.int(4)?,
            create_dt: r.text(5)?,
            status: r.text(6)?,
            update_dt: r.text(7)?,
            run_digest: r.text(8)?,
            value_digest: r.text(9)?,
            run_stamp: r.text(10)?,
            options: vec![],
            texts: vec![],
            params: vec![],
            tables: vec![],
            entities: vec![],
        }),
        "run_txt" | "run_option" | "run_parameter" | "run_parameter_txt" | "run_table"
        | "run_entity" => {
            let id = r.int(0)?;
            let run = parent(&mut tree.runs, t, r.str(0)?, |x| x.run_id == id)?;
            match t {
                "run_txt" => run.texts.push(r.lang_note(1)?),
                "run_option" => run.options.push(OptionDef {
                    key: r.text(1)?,
                    value: r.text(2)?,
                }),
                "run_parameter" => run.params.push(RunParamDef {
                    name: r.text(1)?,
                    sub_count: r.int(2)?,
                    value_digest: r.text(3)?,
                    notes: vec![],
                }),
                "run_parameter_txt" => {
                    let name = r.str(1)?;
                    parent(&mut run.params, t, name, |p| p.name == name)?
                        .notes
                        .push(ParamNote {
                            lang_code: r.text(2)?,
                            note: r.opt(3)?,
                        });
                }
                "run_table" => run.tables.push(RunTableDef {
                    name: r.text(1)?,
                    value_digest: r.text(2)?,
                }),
                _ => run.entities.push(RunEntityDef {
                    name: r.text(1)?,
                    value_digest: r.text(2)?,
                }),
            }
        }
        "workset_lst" => tree.worksets.push(WorksetDef {
            set_id: r.int(0)?,
            name: r.text(1)?,
            base_run_digest: r.opt(2)?,
            is_readonly: r.flag(3)?,
            update_dt: r.text(4)?,
            texts: vec![],
            params: vec![],
        }),
        "workset_txt" | "workset_parameter" | "workset_parameter_txt" => {
            let id = r.int(0)?;
            let set = parent(&mut tree.worksets, t, r.str(0)?, |x| x.set_id == id)?;
            match t {
                "workset_txt" => set.texts.push(r.lang_note(1)?),
                "workset_parameter" => set.params.push(SetParamDef {
                    name: r.text(1)?,
                    sub_count: r.int(2)?,
                    default_sub_id: r.int(3)?,
                    notes: vec![],
                }),
                _ => {
                    let name = r.str(1)?;
                    parent(&mut set.params, t, name, |p| p.name == name)?
                        .notes
                        .push(ParamNote {
                            lang_code: r.text(2)?,
                            note: r.opt(3)?,
                        });
                }
            }
        }
        "task_lst" => tree.tasks.push(TaskDef {
            task_id: r.int(0)?,
            name: r.text(1)?,
            texts: vec![],
            sets: vec![],
            runs: vec![],
        }),
        "task_txt" | "task_set" | "task_run_lst" | "task_run_set" => {
            let id = r.int(0)?;
            let task = parent(&mut tree.tasks, t, r.str(0)?, |x| x.task_id == id)?;
            match t {
                "task_txt" => task.texts.push(r.lang_note(1)?),
                "task_set" => task.sets.push(r.text(1)?),
                "task_run_lst" => task.runs.push(TaskRunDef {
                    task_run_id: r.int(1)?,
                    name: r.text(2)?,
                    sub_count: r.int(3)?,
                    create_dt: r.text(4)?,
                    status: r.text(5)?,
                    update_dt: r.text(6)?,
                    run_stamp: r.text(7)?,
                    items: vec![],
                }),
                _ => {
                    let run_id = r.int(1)?;
                    parent(&mut task.runs, t, r.str(1)?, |x| x.task_run_id == run_id)?
                        .items
                        .push(TaskRunItemDef {
                            run_digest: r.text(2)?,
                            set_name: r.text(3)?,
                        });
                }
            }
        }
        other => {
            return Err(McError::invariant(format!("unknown metadata table {}", other)));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row::collect_rows;

    fn tiny_tree() -> MetaTree {
        let mut tree = MetaTree::new(ModelDef {
            model_id: 1,
            name: "M".to_string(),
            digest: "d1".to_string(),
            version: "1.0".to_string(),
            create_dt: String::new(),
            default_lang: "EN".to_string(),
            langs: vec![],
            texts: vec![LangNote {
                lang_code: "EN".to_string(),
                descr: "model".to_string(),
                note: Some(String::new()),
            }],
            types: vec![],
            params: vec![],
            tables: vec![],
            entities: vec![],
        });
        tree.tasks.push(TaskDef {
            task_id: 3,
            name: "T".to_string(),
            texts: vec![],
            sets: vec!["Default".to_string()],
            runs: vec![],
        });
        tree
    }

    fn export(tree: &MetaTree) -> Vec<(&'static MetaTable, Vec<Vec<String>>)> {
        META_TABLES
            .iter()
            .map(|t| (t, collect_rows(&mut *t.rows(tree)).unwrap()))
            .collect()
    }

    #[test]
    fn tiny_tree_round_trips() {
        let tree = tiny_tree();
        let flat = export(&tree);
        let back: MetaTree = unflatten::<McError>(|table| {
            Ok(flat
                .iter()
                .find(|(t, _)| t.name == table.name)
                .map(|(_, rows)| rows.clone())
                .unwrap_or_default())
        })
        .unwrap();
        assert_eq!(back, tree);
        assert_eq!(back.model.texts[0].note.as_deref(), Some(""));
    }

    #[test]
    fn orphan_row_is_an_error() {
        let tree = tiny_tree();
        let mut flat = export(&tree);
        for (t, rows) in &mut flat {
            if t.name == "task_set" {
                rows[0][0] = "99".to_string();
            }
        }
        let err = unflatten::<McError>(|table| {
            Ok(flat
                .iter()
                .find(|(t, _)| t.name == table.name)
                .map(|(_, rows)| rows.clone())
                .unwrap_or_default())
        })
        .unwrap_err();
        assert!(matches!(err, McError::Invariant { .. }));
    }

    #[test]
    fn short_row_is_an_arity_error() {
        let err = unflatten::<McError>(|table| {
            Ok(if table.name == "model_dic" {
                vec![vec!["1".to_string(), "M".to_string()]]
            } else {
                vec![]
            })
        })
        .unwrap_err();
        assert!(matches!(err, McError::Arity { actual: 2, .. }));
    }
}
