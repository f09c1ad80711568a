// Copyright (c) 2025 ADBC Drivers Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.


//! Row parsing for explorer queries.
//!
//! Servers answer tree queries in one of two shapes depending on the
//! negotiated API version (see [`RowShape`]). Rows are decoded into a
//! [`RawNode`] and normalized into [`ExplorerNode`] here, so nothing past
//! this module sees shape differences.

use crate::error::{Error, Result};
use crate::metadata::sql::RowShape;
use crate::metadata::types::{ColumnDetails, ColumnIcon, ExplorerNode, ObjectKind};
use crate::result::ResultRow;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::HashSet;

/// Row from the aliased projection.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionedNode {
    pub label: String,
    #[serde(default)]
    pub schema: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub child_type: Option<String>,
    #[serde(default)]
    pub icon_id: Option<String>,
    #[serde(default)]
    pub is_view: bool,
}

/// Row from the raw `%SQL_MANAGER` projection.
#[derive(Debug, Clone, Deserialize)]
pub struct LegacyNode {
    #[serde(rename = "SCHEMA_NAME")]
    pub schema_name: String,
    #[serde(default, alias = "TABLE_NAME", alias = "VIEW_NAME", alias = "PROCEDURE_NAME")]
    pub name: Option<String>,
}

#[derive(Debug, Clone)]
pub enum RawNode {
    Legacy(LegacyNode),
    Versioned(VersionedNode),
}

impl RawNode {
    pub fn from_row(shape: RowShape, row: &ResultRow) -> Result<Self> {
        match shape {
            RowShape::Legacy => decode_row(row).map(RawNode::Legacy),
            RowShape::Versioned => decode_row(row).map(RawNode::Versioned),
        }
    }

    fn into_schema_node(self, kind: ObjectKind) -> Option<ExplorerNode> {
        let (name, icon) = match self {
            RawNode::Legacy(n) => (n.schema_name, None),
            RawNode::Versioned(n) => (n.label, n.icon_id),
        };
        if name.is_empty() {
            return None;
        }
        let mut node = ExplorerNode::schema(name, kind);
        if icon.is_some() {
            node.icon_id = icon;
        }
        Some(node)
    }

    fn into_object_node(self, kind: ObjectKind) -> Option<ExplorerNode> {
        let (schema, name) = match self {
            RawNode::Legacy(n) => (n.schema_name, n.name?),
            RawNode::Versioned(n) => (n.schema?, n.label),
        };
        if name.is_empty() {
            return None;
        }
        Some(ExplorerNode::object(kind, schema, name))
    }
}

/// Row of a column listing or column search.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ColumnRow {
    #[serde(alias = "COLUMN_NAME")]
    label: String,
    #[serde(alias = "TABLE_NAME")]
    table: String,
    #[serde(default, alias = "TABLE_SCHEMA")]
    schema: Option<String>,
    #[serde(default, alias = "DATA_TYPE", deserialize_with = "lenient_string")]
    data_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    detail: Option<String>,
    #[serde(default, alias = "CHARACTER_MAXIMUM_LENGTH", deserialize_with = "lenient_int")]
    size: Option<i64>,
    #[serde(default, alias = "COLUMN_DEFAULT", deserialize_with = "lenient_string")]
    default_value: Option<String>,
    #[serde(default, alias = "IS_NULLABLE")]
    is_nullable: bool,
    #[serde(default, alias = "IS_PK")]
    is_pk: bool,
    #[serde(default, alias = "IS_FK")]
    is_fk: bool,
}

impl ColumnRow {
    fn into_node(self) -> ExplorerNode {
        let detail = self.detail.or_else(|| {
            self.data_type.as_ref().map(|t| match self.size {
                Some(n) if n > 0 => format!("{}({})", t.to_uppercase(), n),
                _ => t.to_uppercase(),
            })
        });
        let details = ColumnDetails {
            table: self.table,
            data_type: self.data_type,
            size: self.size,
            is_nullable: self.is_nullable,
            default_value: self.default_value,
            is_pk: self.is_pk,
            is_fk: self.is_fk,
            icon_name: ColumnIcon::derive(self.is_pk, self.is_fk),
        };
        let mut node = ExplorerNode::column(self.label, self.schema, details);
        node.detail = detail;
        node
    }
}

/// Coerce a boolean-like value. Strings `1`, `true` and `yes` are true in
/// any case; numbers are true when non-zero.
pub fn coerce_bool(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => {
            let s = s.trim();
            s == "1" || s.eq_ignore_ascii_case("true") || s.eq_ignore_ascii_case("yes")
        }
        _ => false,
    }
}

fn is_flag_field(key: &str) -> bool {
    let mut chars = key.chars();
    match (chars.next(), chars.next(), chars.next()) {
        (Some('i'), Some('s'), Some(c)) => c.is_ascii_uppercase(),
        (Some('I'), Some('S'), Some('_')) => true,
        _ => false,
    }
}

/// Replace every `isXxx` / `IS_XXX` field with a real boolean.
pub fn coerce_flags(row: &mut ResultRow) {
    for (key, value) in row.iter_mut() {
        if is_flag_field(key) && !value.is_boolean() {
            *value = Value::Bool(coerce_bool(value));
        }
    }
}

fn decode_row<T: DeserializeOwned>(row: &ResultRow) -> Result<T> {
    let mut row = row.clone();
    coerce_flags(&mut row);
    serde_json::from_value(Value::Object(row))
        .map_err(|e| Error::invalid_response(format!("unexpected explorer row: {}", e)))
}

fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

fn lenient_int<'de, D>(deserializer: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Schema nodes, one per distinct name, sorted by sort key.
pub fn parse_schema_nodes(
    rows: &[ResultRow],
    shape: RowShape,
    kind: ObjectKind,
) -> Result<Vec<ExplorerNode>> {
    let mut seen = HashSet::new();
    let mut nodes = Vec::new();
    for row in rows {
        let Some(node) = RawNode::from_row(shape, row)?.into_schema_node(kind) else {
            continue;
        };
        if seen.insert(node.label.clone()) {
            nodes.push(node);
        }
    }
    nodes.sort_by(|a, b| a.sort_text.cmp(&b.sort_text));
    Ok(nodes)
}

/// Table, view or procedure nodes in server order.
pub fn parse_object_nodes(
    rows: &[ResultRow],
    shape: RowShape,
    kind: ObjectKind,
) -> Result<Vec<ExplorerNode>> {
    let mut nodes = Vec::with_capacity(rows.len());
    for row in rows {
        if let Some(node) = RawNode::from_row(shape, row)?.into_object_node(kind) {
            nodes.push(node);
        }
    }
    Ok(nodes)
}

/// Column nodes. Rows use the aliased projection whatever the API version.
pub fn parse_column_nodes(rows: &[ResultRow]) -> Result<Vec<ExplorerNode>> {
    rows.iter()
        .map(|row| decode_row::<ColumnRow>(row).map(ColumnRow::into_node))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::types::{NodeDetails, NodeKind};
    use serde_json::json;

    fn rows(value: Value) -> Vec<ResultRow> {
        value
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_object().unwrap().clone())
            .collect()
    }

    #[test]
    fn test_coerce_bool() {
        for truthy in [json!(true), json!(1), json!("1"), json!("TRUE"), json!("Yes")] {
            assert!(coerce_bool(&truthy), "{truthy}");
        }
        for falsy in [json!(false), json!(0), json!("0"), json!("FALSE"), json!("no"), json!(null)] {
            assert!(!coerce_bool(&falsy), "{falsy}");
        }
    }

    #[test]
    fn test_coerce_flags_only_touches_flag_fields() {
        let mut row = rows(json!([{"isView": "TRUE", "IS_NULLABLE": "NO", "island": "yes", "label": "1"}]))
            .remove(0);
        coerce_flags(&mut row);
        assert_eq!(row["isView"], json!(true));
        assert_eq!(row["IS_NULLABLE"], json!(false));
        assert_eq!(row["island"], json!("yes"));
        assert_eq!(row["label"], json!("1"));
    }

    #[test]
    fn test_schema_rows_are_deduplicated_and_sorted() {
        let legacy = rows(json!([
            {"SCHEMA_NAME": "Sample"},
            {"SCHEMA_NAME": "Aviation"},
            {"SCHEMA_NAME": "Sample"}
        ]));
        let nodes = parse_schema_nodes(&legacy, RowShape::Legacy, ObjectKind::Table).unwrap();
        let labels: Vec<_> = nodes.iter().map(|n| n.label.as_str()).collect();
        assert_eq!(labels, vec!["Aviation", "Sample"]);
        assert_eq!(nodes[0].child_type, Some(NodeKind::Table));
        assert_eq!(nodes[0].sort_text.as_deref(), Some("0:Aviation"));
    }

    #[test]
    fn test_versioned_schema_rows() {
        let versioned = rows(json!([
            {"label": "Sample", "schema": "Sample", "type": "connection.schema",
             "childType": "connection.view", "iconId": "folder"},
            {"label": "Sample", "schema": "Sample", "type": "connection.schema",
             "childType": "connection.view", "iconId": "folder"}
        ]));
        let nodes = parse_schema_nodes(&versioned, RowShape::Versioned, ObjectKind::View).unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].kind, NodeKind::Schema);
        assert_eq!(nodes[0].icon_id.as_deref(), Some("folder"));
    }

    #[test]
    fn test_object_rows_both_shapes_normalize_alike() {
        let legacy = rows(json!([{"SCHEMA_NAME": "Sample", "VIEW_NAME": "PersonView"}]));
        let versioned = rows(json!([{
            "label": "PersonView", "schema": "Sample", "type": "connection.view",
            "childType": "connection.column", "isView": "TRUE"
        }]));
        let a = parse_object_nodes(&legacy, RowShape::Legacy, ObjectKind::View).unwrap();
        let b = parse_object_nodes(&versioned, RowShape::Versioned, ObjectKind::View).unwrap();
        assert_eq!(a, b);
        assert!(a[0].is_view());
        assert_eq!(a[0].kind, NodeKind::View);
    }

    #[test]
    fn test_malformed_row_is_an_error() {
        let bad = rows(json!([{"unexpected": 1}]));
        assert!(matches!(
            parse_object_nodes(&bad, RowShape::Legacy, ObjectKind::Table),
            Err(Error::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_column_rows() {
        let columns = rows(json!([
            {"label": "ID", "type": "connection.column", "table": "Person",
             "dataType": "INTEGER", "detail": "INTEGER", "size": null, "schema": "Sample",
             "defaultValue": null, "isNullable": "NO", "isPk": 1, "isFk": 1},
            {"label": "Name", "type": "connection.column", "table": "Person",
             "dataType": "varchar", "size": "50", "schema": "Sample",
             "defaultValue": "x", "isNullable": "YES", "isPk": 0, "isFk": 0},
            {"COLUMN_NAME": "Company", "TABLE_NAME": "Person", "DATA_TYPE": "INTEGER",
             "IS_NULLABLE": "YES", "IS_FK": "1"}
        ]));
        let nodes = parse_column_nodes(&columns).unwrap();
        assert_eq!(nodes.len(), 3);
        assert!(nodes.iter().all(|n| n.is_terminal()));

        let id = nodes[0].column_details().unwrap();
        assert!(id.is_pk && id.is_fk && !id.is_nullable);
        assert_eq!(id.icon_name, Some(ColumnIcon::Pk));

        assert_eq!(nodes[1].detail.as_deref(), Some("VARCHAR(50)"));
        let name = nodes[1].column_details().unwrap();
        assert_eq!(name.icon_name, None);
        assert!(name.is_nullable);
        assert_eq!(name.default_value.as_deref(), Some("x"));

        assert!(matches!(
            &nodes[2].details,
            Some(NodeDetails::Column(c)) if c.icon_name == Some(ColumnIcon::Fk)
        ));
        assert_eq!(nodes[2].schema, None);
    }
}
