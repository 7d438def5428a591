//! Shared fixture: model "M" with two runs named "Base", two worksets and a task.

#![allow(dead_code)]

use mc_app::{MemoryStore, ModelStore, NamedCells, RunValues, ValueOwner};
use mc_flat::{AccCell, CellValue, ExprCell, MicroCell, ParamCell};
use mc_meta::*;

fn text(lang: &str, descr: &str, note: Option<&str>) -> LangNote {
    LangNote {
        lang_code: lang.to_string(),
        descr: descr.to_string(),
        note: note.map(str::to_string),
    }
}

fn simple(type_id: i32, name: &str) -> TypeDef {
    TypeDef {
        type_id,
        name: name.to_string(),
        digest: String::new(),
        kind: TypeKind::Simple,
        total_enum_id: 0,
        enums: vec![],
        texts: vec![],
    }
}

fn classification(type_id: i32, name: &str, codes: &[&str]) -> TypeDef {
    TypeDef {
        type_id,
        name: name.to_string(),
        digest: format!("{}-digest", name),
        kind: TypeKind::Classification,
        total_enum_id: codes.len() as i32,
        enums: codes
            .iter()
            .enumerate()
            .map(|(i, c)| EnumDef {
                enum_id: i as i32,
                name: c.to_string(),
            })
            .collect(),
        texts: vec![text("EN", name, None)],
    }
}

pub fn model() -> ModelDef {
    ModelDef {
        model_id: 0,
        name: "M".to_string(),
        digest: "m-digest".to_string(),
        version: "1.0.0".to_string(),
        create_dt: "2024-01-02 03:04:05.000".to_string(),
        default_lang: "EN".to_string(),
        langs: vec![
            LangDef {
                lang_code: "EN".to_string(),
                name: "English".to_string(),
                words: vec![WordDef {
                    code: "Sum".to_string(),
                    label: "Total".to_string(),
                }],
            },
            LangDef {
                lang_code: "FR".to_string(),
                name: "Français".to_string(),
                words: vec![],
            },
        ],
        texts: vec![text("EN", "Model M", Some("")), text("FR", "Modèle M", None)],
        types: vec![
            simple(4, "int"),
            simple(7, "double"),
            classification(101, "AgeGroup", &["young", "old"]),
            classification(102, "Sex", &["F", "M"]),
        ],
        params: vec![
            ParamDef {
                param_id: 0,
                name: "Age".to_string(),
                digest: "age-digest".to_string(),
                rank: 1,
                type_id: 7,
                is_extendable: false,
                is_hidden: false,
                num_cumulated: 0,
                import_digest: None,
                dims: vec![DimDef {
                    dim_id: 0,
                    name: "dim0".to_string(),
                    type_id: 101,
                }],
                texts: vec![text("EN", "Age by group", Some("years"))],
            },
            ParamDef {
                param_id: 1,
                name: "Count".to_string(),
                digest: "count-digest".to_string(),
                rank: 0,
                type_id: 4,
                is_extendable: false,
                is_hidden: true,
                num_cumulated: 0,
                import_digest: None,
                dims: vec![],
                texts: vec![],
            },
        ],
        tables: vec![TableDef {
            table_id: 0,
            name: "Income".to_string(),
            digest: "income-digest".to_string(),
            is_user: false,
            rank: 1,
            is_sparse: false,
            expr_pos: 0,
            dims: vec![TableDimDef {
                dim_id: 0,
                name: "dim0".to_string(),
                type_id: 101,
                is_total: true,
                dim_size: 3,
            }],
            accs: vec![
                AccDef {
                    acc_id: 0,
                    name: "acc0".to_string(),
                    is_derived: false,
                    src: "value_sum()".to_string(),
                },
                AccDef {
                    acc_id: 1,
                    name: "acc1".to_string(),
                    is_derived: false,
                    src: "value_count()".to_string(),
                },
            ],
            exprs: vec![ExprDef {
                expr_id: 0,
                name: "expr0".to_string(),
                decimals: 2,
                src: "OM_AVG(acc0)".to_string(),
            }],
            texts: vec![text("EN", "Income", None)],
        }],
        entities: vec![EntityDef {
            entity_id: 0,
            name: "Person".to_string(),
            digest: "person-digest".to_string(),
            attrs: vec![
                AttrDef {
                    attr_id: 0,
                    name: "age".to_string(),
                    type_id: 7,
                    is_internal: false,
                },
                AttrDef {
                    attr_id: 1,
                    name: "sex".to_string(),
                    type_id: 102,
                    is_internal: false,
                },
            ],
        }],
    }
}

fn run_param(name: &str, sub_count: i32, note: Option<&str>) -> RunParamDef {
    RunParamDef {
        name: name.to_string(),
        sub_count,
        value_digest: String::new(),
        notes: note
            .map(|n| {
                vec![ParamNote {
                    lang_code: "EN".to_string(),
                    note: Some(n.to_string()),
                }]
            })
            .unwrap_or_default(),
    }
}

pub fn run(name: &str, digest: &str, age_sub_count: i32) -> RunDef {
    RunDef {
        run_id: 0,
        name: name.to_string(),
        sub_count: age_sub_count,
        sub_started: age_sub_count,
        sub_completed: age_sub_count,
        create_dt: "2024-01-03 00:00:00.000".to_string(),
        status: "s".to_string(),
        update_dt: "2024-01-03 00:01:00.000".to_string(),
        run_digest: digest.to_string(),
        value_digest: String::new(),
        run_stamp: format!("stamp-{}", digest),
        options: vec![
            OptionDef {
                key: "OpenM.SubValues".to_string(),
                value: age_sub_count.to_string(),
            },
            OptionDef {
                key: "OpenM.Threads".to_string(),
                value: "1".to_string(),
            },
        ],
        texts: vec![text("EN", &format!("{} run", name), None)],
        params: vec![
            run_param("Age", age_sub_count, Some("age note")),
            run_param("Count", 1, None),
        ],
        tables: vec![RunTableDef {
            name: "Income".to_string(),
            value_digest: String::new(),
        }],
        entities: vec![RunEntityDef {
            name: "Person".to_string(),
            value_digest: String::new(),
        }],
    }
}

pub fn age_cells(sub_count: i32, scale: f64) -> Vec<ParamCell> {
    let mut cells = Vec::new();
    for sub_id in 0..sub_count {
        for (dim, v) in [(0, 10.5), (1, 20.25)] {
            cells.push(ParamCell {
                sub_id,
                dims: vec![dim],
                value: CellValue::Float(v * scale + f64::from(sub_id)),
            });
        }
    }
    cells
}

pub fn count_cells(n: i64) -> Vec<ParamCell> {
    vec![ParamCell {
        sub_id: 0,
        dims: vec![],
        value: CellValue::Int(n),
    }]
}

pub fn run_values(age_sub_count: i32, scale: f64) -> RunValues {
    RunValues {
        params: vec![
            NamedCells::new("Age", age_cells(age_sub_count, scale)),
            NamedCells::new("Count", count_cells(3)),
        ],
        exprs: vec![NamedCells::new(
            "Income",
            vec![
                ExprCell {
                    expr_id: 0,
                    dims: vec![0],
                    value: Some(1.5 * scale),
                },
                ExprCell {
                    expr_id: 0,
                    dims: vec![1],
                    value: Some(2.5),
                },
                ExprCell {
                    expr_id: 0,
                    dims: vec![2],
                    value: None,
                },
            ],
        )],
        accs: vec![NamedCells::new(
            "Income",
            vec![
                AccCell {
                    acc_id: 0,
                    sub_id: 0,
                    dims: vec![0],
                    value: Some(1.0),
                },
                AccCell {
                    acc_id: 1,
                    sub_id: 0,
                    dims: vec![0],
                    value: Some(2.0),
                },
                AccCell {
                    acc_id: 0,
                    sub_id: 0,
                    dims: vec![1],
                    value: Some(3.0 * scale),
                },
            ],
        )],
        micro: vec![NamedCells::new(
            "Person",
            vec![
                MicroCell {
                    key: 1,
                    values: vec![CellValue::Float(33.5), CellValue::Int(0)],
                },
                MicroCell {
                    key: 2,
                    values: vec![CellValue::Null, CellValue::Int(1)],
                },
            ],
        )],
    }
}

pub fn workset(name: &str, params: &[&str], base: Option<&str>) -> WorksetDef {
    WorksetDef {
        set_id: 0,
        name: name.to_string(),
        base_run_digest: base.map(str::to_string),
        is_readonly: false,
        update_dt: "2024-01-04 00:00:00.000".to_string(),
        texts: vec![text("EN", &format!("{} inputs", name), Some(""))],
        params: params
            .iter()
            .map(|p| SetParamDef {
                name: p.to_string(),
                sub_count: 1,
                default_sub_id: 0,
                notes: vec![],
            })
            .collect(),
    }
}

pub fn task() -> TaskDef {
    TaskDef {
        task_id: 0,
        name: "T".to_string(),
        texts: vec![text("EN", "Task T", None)],
        sets: vec!["Default".to_string()],
        runs: vec![TaskRunDef {
            task_run_id: 1,
            name: "T_1".to_string(),
            sub_count: 1,
            create_dt: "2024-01-05 00:00:00.000".to_string(),
            status: "s".to_string(),
            update_dt: "2024-01-05 00:10:00.000".to_string(),
            run_stamp: "task-stamp".to_string(),
            items: vec![TaskRunItemDef {
                run_digest: "r1".to_string(),
                set_name: "Default".to_string(),
            }],
        }],
    }
}

/// Model with runs 1 and 2 (both "Base"), worksets 3 "Default" and
/// 4 "Scenario", task 5 "T".
pub fn sample_store() -> MemoryStore {
    let mut store = MemoryStore::new();
    store.insert_model(&model()).unwrap();
    store
        .insert_run("M", &run("Base", "r1", 1), run_values(1, 1.0))
        .unwrap();
    store
        .insert_run("M", &run("Base", "r2", 2), run_values(2, 2.0))
        .unwrap();
    store
        .insert_workset(
            "M",
            &workset("Default", &["Age"], None),
            vec![NamedCells::new("Age", age_cells(1, 3.0))],
        )
        .unwrap();
    store
        .insert_workset(
            "M",
            &workset("Scenario", &["Count"], Some("r1")),
            vec![NamedCells::new("Count", count_cells(7))],
        )
        .unwrap();
    store.insert_task("M", &task()).unwrap();
    store
}

/// Tree with store-assigned ids and recorded digests cleared.
pub fn normalized(mut tree: MetaTree) -> MetaTree {
    tree.model.model_id = 0;
    for r in &mut tree.runs {
        r.run_id = 0;
        r.params.iter_mut().for_each(|p| p.value_digest.clear());
        r.tables.iter_mut().for_each(|t| t.value_digest.clear());
        r.entities.iter_mut().for_each(|e| e.value_digest.clear());
    }
    for s in &mut tree.worksets {
        s.set_id = 0;
    }
    for t in &mut tree.tasks {
        t.task_id = 0;
    }
    tree
}

/// Every value of every run and workset, keyed by entity name and digest.
pub fn all_values(store: &MemoryStore) -> Vec<String> {
    let tree = store.model_tree("M").unwrap();
    let m = &tree.model;
    let mut out = Vec::new();
    for r in &tree.runs {
        let owner = ValueOwner::Run(r.run_id);
        for p in &m.params {
            let cells: Vec<_> = store.param_cells(&m.digest, owner, &p.name).unwrap().collect();
            out.push(format!("{}/{} {}: {:?}", r.name, r.run_digest, p.name, cells));
        }
        for t in &m.tables {
            let e: Vec<_> = store.expr_cells(&m.digest, r.run_id, &t.name).unwrap().collect();
            let a: Vec<_> = store.acc_cells(&m.digest, r.run_id, &t.name).unwrap().collect();
            out.push(format!("{}/{} {}: {:?} {:?}", r.name, r.run_digest, t.name, e, a));
        }
        for e in &m.entities {
            let c: Vec<_> = store.micro_cells(&m.digest, r.run_id, &e.name).unwrap().collect();
            out.push(format!("{}/{} {}: {:?}", r.name, r.run_digest, e.name, c));
        }
    }
    for s in &tree.worksets {
        for p in &m.params {
            let cells: Vec<_> = store
                .param_cells(&m.digest, ValueOwner::Workset(s.set_id), &p.name)
                .unwrap()
                .collect();
            out.push(format!("set {} {}: {:?}", s.name, p.name, cells));
        }
    }
    out
}
