use mc_core::McError;
use mc_flat::{META_TABLES, PairRows, collect_rows, column_names, unflatten};
use mc_meta::schema::*;
use proptest::prelude::*;

fn note(lang: &str, descr: &str, note: Option<&str>) -> LangNote {
    LangNote {
        lang_code: lang.to_string(),
        descr: descr.to_string(),
        note: note.map(str::to_string),
    }
}

fn sample_tree() -> MetaTree {
    let model = ModelDef {
        model_id: 11,
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
                    code: "all".to_string(),
                    label: "All".to_string(),
                }],
            },
            LangDef {
                lang_code: "FR".to_string(),
                name: "Français".to_string(),
                words: vec![],
            },
        ],
        texts: vec![note("EN", "Model", None), note("FR", "Modèle", Some(""))],
        types: vec![
            TypeDef {
                type_id: 7,
                name: "double".to_string(),
                digest: String::new(),
                kind: TypeKind::Simple,
                total_enum_id: 0,
                enums: vec![],
                texts: vec![],
            },
            TypeDef {
                type_id: 101,
                name: "AgeGroup".to_string(),
                digest: "t-digest".to_string(),
                kind: TypeKind::Classification,
                total_enum_id: 2,
                enums: vec![
                    EnumDef {
                        enum_id: 0,
                        name: "young".to_string(),
                    },
                    EnumDef {
                        enum_id: 1,
                        name: "old".to_string(),
                    },
                ],
                texts: vec![note("EN", "Age group", Some("by decade"))],
            },
        ],
        params: vec![
            ParamDef {
                param_id: 0,
                name: "Age".to_string(),
                digest: "p0".to_string(),
                rank: 1,
                type_id: 7,
                is_extendable: true,
                is_hidden: false,
                num_cumulated: 0,
                import_digest: Some("imp".to_string()),
                dims: vec![DimDef {
                    dim_id: 0,
                    name: "dim0".to_string(),
                    type_id: 101,
                }],
                texts: vec![],
            },
            ParamDef {
                param_id: 1,
                name: "Scalar".to_string(),
                digest: "p1".to_string(),
                rank: 0,
                type_id: 7,
                is_extendable: false,
                is_hidden: true,
                num_cumulated: 0,
                import_digest: None,
                dims: vec![],
                texts: vec![note("EN", "A scalar", None)],
            },
        ],
        tables: vec![TableDef {
            table_id: 0,
            name: "Income".to_string(),
            digest: "tb0".to_string(),
            is_user: false,
            rank: 1,
            is_sparse: true,
            expr_pos: 1,
            dims: vec![TableDimDef {
                dim_id: 0,
                name: "dim0".to_string(),
                type_id: 101,
                is_total: true,
                dim_size: 3,
            }],
            accs: vec![AccDef {
                acc_id: 0,
                name: "acc0".to_string(),
                is_derived: false,
                src: "value_sum()".to_string(),
            }],
            exprs: vec![ExprDef {
                expr_id: 0,
                name: "expr0".to_string(),
                decimals: 2,
                src: "OM_AVG(acc0)".to_string(),
            }],
            texts: vec![],
        }],
        entities: vec![EntityDef {
            entity_id: 0,
            name: "Person".to_string(),
            digest: "e0".to_string(),
            attrs: vec![AttrDef {
                attr_id: 0,
                name: "age".to_string(),
                type_id: 101,
                is_internal: false,
            }],
        }],
    };

    let mut tree = MetaTree::new(model);
    tree.runs.push(RunDef {
        run_id: 5,
        name: "Base, first".to_string(),
        sub_count: 2,
        sub_started: 2,
        sub_completed: 2,
        create_dt: "2024-01-02".to_string(),
        status: "s".to_string(),
        update_dt: "2024-01-03".to_string(),
        run_digest: "r5".to_string(),
        value_digest: "v5".to_string(),
        run_stamp: "stamp".to_string(),
        options: vec![OptionDef {
            key: "OpenM.SubValues".to_string(),
            value: "2".to_string(),
        }],
        texts: vec![note("EN", "first run", Some("line one\nline two"))],
        params: vec![
            RunParamDef {
                name: "Age".to_string(),
                sub_count: 2,
                value_digest: "pa".to_string(),
                notes: vec![],
            },
            RunParamDef {
                name: "Scalar".to_string(),
                sub_count: 1,
                value_digest: "ps".to_string(),
                notes: vec![ParamNote {
                    lang_code: "EN".to_string(),
                    note: None,
                }],
            },
        ],
        tables: vec![RunTableDef {
            name: "Income".to_string(),
            value_digest: "ti".to_string(),
        }],
        entities: vec![RunEntityDef {
            name: "Person".to_string(),
            value_digest: "ep".to_string(),
        }],
    });
    tree.worksets.push(WorksetDef {
        set_id: 7,
        name: "Default".to_string(),
        base_run_digest: None,
        is_readonly: true,
        update_dt: String::new(),
        texts: vec![],
        params: vec![SetParamDef {
            name: "Age".to_string(),
            sub_count: 1,
            default_sub_id: 0,
            notes: vec![ParamNote {
                lang_code: "EN".to_string(),
                note: Some(String::new()),
            }],
        }],
    });
    tree.tasks.push(TaskDef {
        task_id: 3,
        name: "Batch".to_string(),
        texts: vec![note("EN", "batch", None)],
        sets: vec!["Default".to_string()],
        runs: vec![TaskRunDef {
            task_run_id: 1,
            name: "Batch_1".to_string(),
            sub_count: 1,
            create_dt: String::new(),
            status: "s".to_string(),
            update_dt: String::new(),
            run_stamp: String::new(),
            items: vec![TaskRunItemDef {
                run_digest: "r5".to_string(),
                set_name: "Default".to_string(),
            }],
        }],
    });
    tree
}

#[test]
fn metadata_tree_round_trips_through_flat_tables() {
    let tree = sample_tree();
    let mut flat = Vec::new();
    for table in META_TABLES {
        let mut rows = table.rows(&tree);
        assert_eq!(rows.columns().len(), table.columns.len());
        flat.push((table.name, collect_rows(&mut *rows).unwrap()));
    }

    let back = unflatten::<McError>(|table| {
        Ok(flat
            .iter()
            .find(|(name, _)| *name == table.name)
            .map(|(_, rows)| rows.clone())
            .unwrap_or_default())
    })
    .unwrap();
    assert_eq!(back, tree);
}

#[test]
fn null_and_empty_notes_flatten_differently() {
    let tree = sample_tree();
    let table = mc_flat::meta_table("model_dic_txt").unwrap();
    let rows = collect_rows(&mut *table.rows(&tree)).unwrap();
    assert_eq!(rows[0], vec!["11", "EN", "Model", "NULL"]);
    assert_eq!(rows[1], vec!["11", "FR", "Modèle", ""]);
}

#[test]
fn literal_null_note_reads_back_as_text() {
    let mut tree = sample_tree();
    tree.model.texts[0].note = Some("NULL".to_string());
    tree.model.texts[1].note = Some("\\NULL".to_string());
    let table = mc_flat::meta_table("model_dic_txt").unwrap();
    let rows = collect_rows(&mut *table.rows(&tree)).unwrap();
    assert_eq!(rows[0][3], "\\NULL");
    assert_eq!(rows[1][3], "\\\\NULL");

    let back = unflatten::<McError>(|t| collect_rows(&mut *t.rows(&tree))).unwrap();
    assert_eq!(back.model.texts[0].note.as_deref(), Some("NULL"));
    assert_eq!(back.model.texts[1].note.as_deref(), Some("\\NULL"));
}

#[test]
fn three_level_notes_skip_parameters_without_notes() {
    let tree = sample_tree();
    let table = mc_flat::meta_table("run_parameter_txt").unwrap();
    let rows = collect_rows(&mut *table.rows(&tree)).unwrap();
    assert_eq!(rows, vec![vec!["5", "Scalar", "EN", "NULL"]]);
}

proptest! {
    #[test]
    fn sparse_children_yield_exactly_all_pairs(counts in prop::collection::vec(0usize..4, 0..12)) {
        let parents: Vec<Vec<usize>> = counts.iter().map(|n| (0..*n).collect()).collect();
        let mut cursor = mc_flat::PairCursor::default();
        let mut seen = Vec::new();
        while let Some(pair) = cursor.next_pair(&parents, Vec::len) {
            seen.push(pair);
        }
        let expected: Vec<(usize, usize)> = counts
            .iter()
            .enumerate()
            .flat_map(|(o, n)| (0..*n).map(move |i| (o, i)))
            .collect();
        prop_assert_eq!(seen, expected);
    }

    #[test]
    fn pair_rows_count_matches_children(counts in prop::collection::vec(0usize..4, 0..12)) {
        let parents: Vec<Vec<usize>> = counts.iter().map(|n| (0..*n).collect()).collect();
        let mut src = PairRows::new(
            "prop",
            column_names(&["child"]),
            &parents,
            |p| p.as_slice(),
            |_, c, row| row.push(*c),
        );
        let rows = collect_rows(&mut src).unwrap();
        prop_assert_eq!(rows.len(), counts.iter().sum::<usize>());
    }
}
