use mc_meta::*;

fn sample_model() -> ModelDef {
    ModelDef {
        model_id: 1,
        name: "M".to_string(),
        digest: "m-digest".to_string(),
        version: "1.0.0".to_string(),
        create_dt: "2026-01-01 00:00:00.000".to_string(),
        default_lang: "EN".to_string(),
        langs: vec![LangDef {
            lang_code: "EN".to_string(),
            name: "English".to_string(),
            words: vec![WordDef {
                code: "all".to_string(),
                label: "All".to_string(),
            }],
        }],
        texts: vec![LangNote {
            lang_code: "EN".to_string(),
            descr: "Model".to_string(),
            note: Some(String::new()),
        }],
        types: vec![TypeDef {
            type_id: 101,
            name: "Sex".to_string(),
            digest: String::new(),
            kind: TypeKind::Classification,
            total_enum_id: 2,
            enums: vec![
                EnumDef {
                    enum_id: 0,
                    name: "F".to_string(),
                },
                EnumDef {
                    enum_id: 1,
                    name: "M".to_string(),
                },
            ],
            texts: vec![],
        }],
        params: vec![],
        tables: vec![],
        entities: vec![],
    }
}

#[test]
fn roundtrip_model_doc() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("M.json");
    let model = sample_model();

    save_model_doc(&path, &model).unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    assert_eq!(text.matches("\"version\"").count(), 1);
    assert!(text.contains("\"doc_version\": 2"));
    let loaded = load_model_doc(&path).unwrap();
    assert_eq!(loaded.version, "1.0.0");
    assert_eq!(model, loaded);
}

#[test]
fn empty_note_differs_from_absent_note() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("M.json");
    let mut model = sample_model();
    model.texts.push(LangNote {
        lang_code: "FR".to_string(),
        descr: "Modèle".to_string(),
        note: None,
    });

    save_model_doc(&path, &model).unwrap();
    let loaded = load_model_doc(&path).unwrap();
    assert_eq!(loaded.texts[0].note.as_deref(), Some(""));
    assert_eq!(loaded.texts[1].note, None);
}

#[test]
fn roundtrip_run_doc_keeps_model_identity() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("M.run.Default.json");
    let model = sample_model();
    let run = RunDef {
        run_id: 11,
        name: "Default".to_string(),
        sub_count: 1,
        sub_started: 1,
        sub_completed: 1,
        create_dt: "2026-01-01 00:00:00.000".to_string(),
        status: "s".to_string(),
        update_dt: "2026-01-01 00:00:01.000".to_string(),
        run_digest: "r-digest".to_string(),
        value_digest: String::new(),
        run_stamp: "2026_01_01_00_00_00_000".to_string(),
        options: vec![OptionDef {
            key: "OpenM.SubValues".to_string(),
            value: "1".to_string(),
        }],
        texts: vec![],
        params: vec![],
        tables: vec![],
        entities: vec![],
    };

    save_entity_doc(&path, &model, &run, Some("%.15g")).unwrap();
    let doc: RunDoc = load_entity_doc(&path).unwrap();
    assert_eq!(doc.value_format.as_deref(), Some("%.15g"));
    assert_eq!(doc.model_name, "M");
    assert_eq!(doc.model_digest, "m-digest");
    assert_eq!(doc.body, run);
}

#[test]
fn load_rejects_future_version() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("M.json");
    std::fs::write(
        &path,
        r#"{"doc_version": 99, "model_id": 1, "name": "M", "digest": "d"}"#,
    )
    .unwrap();
    assert!(matches!(
        load_model_doc(&path),
        Err(MetaError::Validation(ValidationError::UnsupportedVersion { version: 99 }))
    ));
}

#[test]
fn load_accepts_leading_bom() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("M.json");
    std::fs::write(
        &path,
        "\u{feff}{\"doc_version\": 2, \"model_id\": 1, \"name\": \"M\", \"digest\": \"d\"}",
    )
    .unwrap();
    let model = load_model_doc(&path).unwrap();
    assert_eq!(model.name, "M");
}
