//! Value cells: parameter values, output table values and microdata records.

use std::collections::BTreeMap;

use mc_core::{McError, McResult};
use mc_meta::schema::{ModelDef, TableDef, TypeKind};
use serde::{Deserialize, Serialize};

/// Single stored value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    Null,
    Bool(bool),
    /// Integer value, or enum id for enum-based types.
    Int(i64),
    Float(f64),
    Text(String),
}

/// How values of a type are stored and rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Int,
    Float,
    Bool,
    Text,
    /// Enum id, rendered as enum code in symbolic mode.
    Enum,
}

pub fn value_kind(model: &ModelDef, type_id: i32) -> McResult<ValueKind> {
    let ty = model.type_by_id(type_id).ok_or_else(|| McError::InvalidArg {
        what: format!("unknown type id {}", type_id),
    })?;
    Ok(match ty.kind {
        TypeKind::Logical => ValueKind::Bool,
        TypeKind::Simple => match ty.name.as_str() {
            "float" | "double" | "ldouble" | "real" | "Time" => ValueKind::Float,
            "bool" => ValueKind::Bool,
            "file" | "string" => ValueKind::Text,
            _ => ValueKind::Int,
        },
        _ => ValueKind::Enum,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamCell {
    pub sub_id: i32,
    /// One enum id per dimension, in declared order.
    pub dims: Vec<i32>,
    pub value: CellValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExprCell {
    pub expr_id: i32,
    pub dims: Vec<i32>,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccCell {
    pub acc_id: i32,
    pub sub_id: i32,
    pub dims: Vec<i32>,
    pub value: Option<f64>,
}

/// All accumulators of one sub-value and cell, in declared accumulator order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllAccCell {
    pub sub_id: i32,
    pub dims: Vec<i32>,
    pub values: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MicroCell {
    pub key: u64,
    /// One value per entity attribute, in declared order.
    pub values: Vec<CellValue>,
}

/// Any cell, tagged with the layout it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueCell {
    Param(ParamCell),
    Expr(ExprCell),
    Acc(AccCell),
    AllAcc(AllAccCell),
    Micro(MicroCell),
}

/// Regroup accumulator cells into one row per (sub-value, cell).
///
/// Rows come out ordered by sub-value id and then dimension ids.
pub fn all_acc_cells(
    table: &TableDef,
    cells: impl IntoIterator<Item = AccCell>,
) -> McResult<Vec<AllAccCell>> {
    let mut grouped: BTreeMap<(i32, Vec<i32>), Vec<Option<f64>>> = BTreeMap::new();
    for cell in cells {
        let pos = table
            .accs
            .iter()
            .position(|a| a.acc_id == cell.acc_id)
            .ok_or_else(|| McError::UnknownEnum {
                dim: table.name.clone(),
                key: cell.acc_id.to_string(),
            })?;
        let values = grouped
            .entry((cell.sub_id, cell.dims))
            .or_insert_with(|| vec![None; table.accs.len()]);
        values[pos] = cell.value;
    }
    Ok(grouped
        .into_iter()
        .map(|((sub_id, dims), values)| AllAccCell {
            sub_id,
            dims,
            values,
        })
        .collect())
}
