use mc_core::FloatFormat;
use mc_flat::{CellOptions, CellValue, FlatRow, LeadingField, ParamCell, ValueCell, ValueLayout};
use mc_meta::schema::*;
use mc_tabular::{TextFormat, WriteRegistry, read_rows};

fn model() -> ModelDef {
    ModelDef {
        model_id: 1,
        name: "M".to_string(),
        digest: "d".to_string(),
        version: String::new(),
        create_dt: String::new(),
        default_lang: "EN".to_string(),
        langs: vec![],
        texts: vec![],
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
                digest: String::new(),
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
                texts: vec![],
            },
        ],
        params: vec![ParamDef {
            param_id: 0,
            name: "Age".to_string(),
            digest: String::new(),
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
            texts: vec![],
        }],
        tables: vec![],
        entities: vec![],
    }
}

#[test]
fn all_in_one_append_writes_one_header() {
    let m = model();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Age.csv");
    let mut registry = WriteRegistry::new();
    let mut layout = ValueLayout::parameter(
        &m,
        &m.params[0],
        false,
        CellOptions {
            use_enum_ids: false,
            float_format: FloatFormat::default(),
            leading: Some(LeadingField {
                column: "run_id".to_string(),
                value: String::new(),
            }),
        },
    )
    .unwrap();

    let runs = [(101, vec![1.5, 2.5]), (102, vec![3.0])];
    let mut row = FlatRow::new();
    for (run_id, values) in &runs {
        layout.set_leading_value(run_id.to_string());
        let mut writer = registry
            .open(&path, layout.columns(), TextFormat::default())
            .unwrap();
        for (i, v) in values.iter().enumerate() {
            let cell = ValueCell::Param(ParamCell {
                sub_id: 0,
                dims: vec![i as i32],
                value: CellValue::Float(*v),
            });
            layout.write_row(&cell, &mut row).unwrap();
            writer.write_row(row.fields()).unwrap();
        }
        writer.finish().unwrap();
    }

    let text = std::fs::read_to_string(&path).unwrap();
    assert_eq!(text.matches("run_id,dim0,param_value").count(), 1);
    assert_eq!(text.lines().count(), 1 + 3);

    let rows = read_rows(&path, layout.columns(), TextFormat::default()).unwrap();
    let leading: Vec<&str> = rows.iter().map(|r| r[0].as_str()).collect();
    assert_eq!(leading, vec!["101", "101", "102"]);
    assert_eq!(rows[2], vec!["102", "young", "3"]);
}
