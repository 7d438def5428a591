//! Export as flat metadata tables plus value files.

mod common;

use std::fs;

use common::*;
use mc_app::*;
use mc_core::Selector;
use mc_tabular::TextFormat;

#[test]
fn metadata_tables_read_back_to_same_forest() {
    let store = sample_store();
    let dir = tempfile::tempdir().unwrap();
    let request = CopyRequest {
        model: "M",
        scope: CopyScope::Model,
        dir: dir.path().to_path_buf(),
        options: CopyOptions::default(),
    };
    let summary = copy_to_csv(&store, &request, None).unwrap();
    let root = dir.path().join("M");
    assert_eq!(summary.root, root);

    for name in ["model_dic.csv", "run_lst.csv", "workset_lst.csv", "task_lst.csv"] {
        assert!(root.join(name).is_file(), "missing {}", name);
    }
    assert!(root.join("run.1.Base/parameters/Age.csv").is_file());
    assert!(root.join("set.Scenario/Count.csv").is_file());

    let back = load_csv_tree(&root, TextFormat::default()).unwrap();
    assert_eq!(back, store.model_tree("M").unwrap());
}

#[test]
fn all_in_one_shares_one_file_per_parameter() {
    let store = sample_store();
    let dir = tempfile::tempdir().unwrap();
    let request = CopyRequest {
        model: "M",
        scope: CopyScope::Model,
        dir: dir.path().to_path_buf(),
        options: CopyOptions {
            all_in_one: Some(LeadingColumn::Id),
            ..CopyOptions::default()
        },
    };
    copy_to_csv(&store, &request, None).unwrap();
    let root = dir.path().join("M");

    let age = fs::read_to_string(root.join(ALL_RUNS_DIR).join("parameters/Age.csv")).unwrap();
    assert_eq!(age.matches("run_id,sub_id,dim0,param_value").count(), 1);
    assert_eq!(age.lines().count(), 1 + 2 + 4);
    assert!(age.contains("\n1,0,young,10.5\n"));
    assert!(age.contains("\n2,1,old,41.5\n"));

    let income = fs::read_to_string(root.join(ALL_RUNS_DIR).join("output-tables/Income.csv"))
        .unwrap();
    assert!(income.starts_with("run_id,expr_name,dim0,expr_value\n"));
    assert_eq!(income.lines().count(), 1 + 3 + 3);

    let set_age = fs::read_to_string(root.join(ALL_SETS_DIR).join("Age.csv")).unwrap();
    assert_eq!(
        set_age,
        "set_id,sub_id,dim0,param_value\n3,0,young,31.5\n3,0,old,60.75\n"
    );
    assert!(!root.join("run.1.Base").exists());
}

#[test]
fn all_in_one_by_name_and_tab_delimited() {
    let store = sample_store();
    let dir = tempfile::tempdir().unwrap();
    let options = CopyOptions {
        all_in_one: Some(LeadingColumn::Name),
        delimiter: Delimiter::Tab,
        ..CopyOptions::default()
    };
    let request = CopyRequest {
        model: "M",
        scope: CopyScope::Workset(Selector::by_name("Scenario")),
        dir: dir.path().to_path_buf(),
        options: options.clone(),
    };
    let summary = copy_to_csv(&store, &request, None).unwrap();
    assert_eq!(summary.root, dir.path().join("M.set.Scenario"));
    assert_eq!((summary.runs, summary.worksets), (0, 1));

    let count = fs::read_to_string(summary.root.join(ALL_SETS_DIR).join("Count.csv")).unwrap();
    assert_eq!(count, "set_name\tsub_id\tparam_value\nScenario\t0\t7\n");

    let back = load_csv_tree(&summary.root, options.text_format()).unwrap();
    assert_eq!(back.worksets.len(), 1);
    assert!(back.runs.is_empty());
}
