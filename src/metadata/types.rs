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


//! Explorer node model.
//!
//! Nodes are produced fresh on every navigation request. A child never
//! points back at its parent: everything needed to fetch the next level is
//! carried in the node's own fields (`schema`, `label`, `child_type`).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of an explorer item, serialized with the host's context values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    #[serde(rename = "connection")]
    Connection,
    #[serde(rename = "connectedConnection")]
    ConnectedConnection,
    #[serde(rename = "connection.resource_group")]
    ResourceGroup,
    #[serde(rename = "connection.schema")]
    Schema,
    #[serde(rename = "connection.table")]
    Table,
    #[serde(rename = "connection.view")]
    View,
    #[serde(rename = "connection.function")]
    Procedure,
    #[serde(rename = "connection.column")]
    Column,
    #[serde(rename = "NO_CHILD")]
    NoChild,
}

impl NodeKind {
    pub const ALL: [NodeKind; 9] = [
        NodeKind::Connection,
        NodeKind::ConnectedConnection,
        NodeKind::ResourceGroup,
        NodeKind::Schema,
        NodeKind::Table,
        NodeKind::View,
        NodeKind::Procedure,
        NodeKind::Column,
        NodeKind::NoChild,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Connection => "connection",
            NodeKind::ConnectedConnection => "connectedConnection",
            NodeKind::ResourceGroup => "connection.resource_group",
            NodeKind::Schema => "connection.schema",
            NodeKind::Table => "connection.table",
            NodeKind::View => "connection.view",
            NodeKind::Procedure => "connection.function",
            NodeKind::Column => "connection.column",
            NodeKind::NoChild => "NO_CHILD",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == value)
    }

    /// The object kind listed by tree functions, if any.
    pub fn object_kind(&self) -> Option<ObjectKind> {
        match self {
            NodeKind::Table => Some(ObjectKind::Table),
            NodeKind::View => Some(ObjectKind::View),
            NodeKind::Procedure => Some(ObjectKind::Procedure),
            _ => None,
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Objects enumerated by `%SQL_MANAGER` tree functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    Table,
    View,
    Procedure,
}

impl ObjectKind {
    pub const ALL: [ObjectKind; 3] = [ObjectKind::Table, ObjectKind::View, ObjectKind::Procedure];

    /// Table-valued function enumerating this kind.
    pub fn tree_function(&self) -> &'static str {
        match self {
            ObjectKind::Table => "TablesTree",
            ObjectKind::View => "ViewsTree",
            ObjectKind::Procedure => "ProceduresTree",
        }
    }

    /// Column of the tree function holding the object name.
    pub fn name_column(&self) -> &'static str {
        match self {
            ObjectKind::Table => "TABLE_NAME",
            ObjectKind::View => "VIEW_NAME",
            ObjectKind::Procedure => "PROCEDURE_NAME",
        }
    }

    pub fn node_kind(&self) -> NodeKind {
        match self {
            ObjectKind::Table => NodeKind::Table,
            ObjectKind::View => NodeKind::View,
            ObjectKind::Procedure => NodeKind::Procedure,
        }
    }

    pub fn group_label(&self) -> &'static str {
        match self {
            ObjectKind::Table => "Tables",
            ObjectKind::View => "Views",
            ObjectKind::Procedure => "Procedures",
        }
    }

    pub fn is_view(&self) -> bool {
        matches!(self, ObjectKind::View)
    }

    /// Kind of this object's children.
    pub fn child_kind(&self) -> NodeKind {
        match self {
            ObjectKind::Table | ObjectKind::View => NodeKind::Column,
            ObjectKind::Procedure => NodeKind::NoChild,
        }
    }
}

/// Icon shown next to key columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnIcon {
    Pk,
    Fk,
}

impl ColumnIcon {
    /// Primary key wins over foreign key.
    pub fn derive(is_pk: bool, is_fk: bool) -> Option<Self> {
        if is_pk {
            Some(ColumnIcon::Pk)
        } else if is_fk {
            Some(ColumnIcon::Fk)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupDetails {
    pub object_kind: ObjectKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectDetails {
    pub is_view: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDetails {
    pub table: String,
    pub data_type: Option<String>,
    pub size: Option<i64>,
    pub is_nullable: bool,
    pub default_value: Option<String>,
    pub is_pk: bool,
    pub is_fk: bool,
    pub icon_name: Option<ColumnIcon>,
}

/// Variant-specific fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum NodeDetails {
    Group(GroupDetails),
    Object(ObjectDetails),
    Column(ColumnDetails),
}

/// One item of the explorer tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplorerNode {
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub child_type: Option<NodeKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_text: Option<String>,
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub details: Option<NodeDetails>,
}

impl ExplorerNode {
    fn base(label: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            label: label.into(),
            schema: None,
            kind,
            child_type: None,
            icon_id: None,
            detail: None,
            sort_text: None,
            details: None,
        }
    }

    /// Root node for a connection.
    pub fn connection(label: impl Into<String>) -> Self {
        Self::base(label, NodeKind::ConnectedConnection)
    }

    /// Folder grouping one object kind, optionally within a schema.
    pub fn group(object_kind: ObjectKind, schema: Option<&str>) -> Self {
        let mut node = Self::base(object_kind.group_label(), NodeKind::ResourceGroup);
        node.schema = schema.map(str::to_string);
        node.child_type = Some(if schema.is_some() {
            object_kind.node_kind()
        } else {
            NodeKind::Schema
        });
        node.icon_id = Some("folder".to_string());
        node.details = Some(NodeDetails::Group(GroupDetails { object_kind }));
        node
    }

    /// Schema listing objects of `object_kind`.
    pub fn schema(name: impl Into<String>, object_kind: ObjectKind) -> Self {
        let name = name.into();
        let mut node = Self::base(name.clone(), NodeKind::Schema);
        node.sort_text = Some(format!("0:{}", name));
        node.schema = Some(name);
        node.child_type = Some(object_kind.node_kind());
        node.icon_id = Some("folder".to_string());
        node
    }

    /// Table, view or procedure.
    pub fn object(
        object_kind: ObjectKind,
        schema: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        let mut node = Self::base(name, object_kind.node_kind());
        node.schema = Some(schema.into());
        node.child_type = Some(object_kind.child_kind());
        node.details = Some(NodeDetails::Object(ObjectDetails {
            is_view: object_kind.is_view(),
        }));
        node
    }

    /// Terminal column node.
    pub fn column(label: impl Into<String>, schema: Option<String>, details: ColumnDetails) -> Self {
        let mut node = Self::base(label, NodeKind::Column);
        node.schema = schema;
        node.child_type = Some(NodeKind::NoChild);
        node.detail = details.data_type.clone();
        node.details = Some(NodeDetails::Column(details));
        node
    }

    /// Object kind of a table/view/procedure node, or the kind a group or
    /// schema node lists.
    pub fn object_kind(&self) -> Option<ObjectKind> {
        if let Some(NodeDetails::Group(g)) = &self.details {
            return Some(g.object_kind);
        }
        self.kind
            .object_kind()
            .or_else(|| self.child_type.and_then(|c| c.object_kind()))
    }

    pub fn column_details(&self) -> Option<&ColumnDetails> {
        match &self.details {
            Some(NodeDetails::Column(c)) => Some(c),
            _ => None,
        }
    }

    pub fn is_view(&self) -> bool {
        match &self.details {
            Some(NodeDetails::Object(o)) => o.is_view,
            _ => self.kind == NodeKind::View,
        }
    }

    /// Whether the node has no children.
    pub fn is_terminal(&self) -> bool {
        self.child_type == Some(NodeKind::NoChild)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_node_kind_round_trip() {
        for kind in NodeKind::ALL {
            assert_eq!(NodeKind::parse(kind.as_str()), Some(kind));
            assert_eq!(
                serde_json::to_value(kind).unwrap(),
                json!(kind.as_str())
            );
        }
        assert_eq!(NodeKind::parse("connection.index"), None);
    }

    #[test]
    fn test_object_kind_mapping() {
        assert_eq!(ObjectKind::Table.tree_function(), "TablesTree");
        assert_eq!(ObjectKind::View.tree_function(), "ViewsTree");
        assert_eq!(ObjectKind::Procedure.tree_function(), "ProceduresTree");
        assert_eq!(ObjectKind::View.name_column(), "VIEW_NAME");
        assert_eq!(ObjectKind::Procedure.node_kind(), NodeKind::Procedure);
        assert_eq!(ObjectKind::Procedure.child_kind(), NodeKind::NoChild);
        for kind in ObjectKind::ALL {
            assert_eq!(kind.node_kind().object_kind(), Some(kind));
        }
    }

    #[test]
    fn test_column_icon_primary_key_wins() {
        assert_eq!(ColumnIcon::derive(true, true), Some(ColumnIcon::Pk));
        assert_eq!(ColumnIcon::derive(true, false), Some(ColumnIcon::Pk));
        assert_eq!(ColumnIcon::derive(false, true), Some(ColumnIcon::Fk));
        assert_eq!(ColumnIcon::derive(false, false), None);
    }

    #[test]
    fn test_group_nodes() {
        let top = ExplorerNode::group(ObjectKind::View, None);
        assert_eq!(top.label, "Views");
        assert_eq!(top.child_type, Some(NodeKind::Schema));
        assert_eq!(top.object_kind(), Some(ObjectKind::View));

        let scoped = ExplorerNode::group(ObjectKind::View, Some("Sample"));
        assert_eq!(scoped.child_type, Some(NodeKind::View));
        assert_eq!(scoped.schema.as_deref(), Some("Sample"));
    }

    #[test]
    fn test_schema_node_sort_key() {
        let node = ExplorerNode::schema("Sample", ObjectKind::Table);
        assert_eq!(node.sort_text.as_deref(), Some("0:Sample"));
        assert_eq!(node.object_kind(), Some(ObjectKind::Table));
    }

    #[test]
    fn test_serialize_object_node() {
        let node = ExplorerNode::object(ObjectKind::Table, "Sample", "Person");
        assert_eq!(
            serde_json::to_value(&node).unwrap(),
            json!({
                "label": "Person",
                "schema": "Sample",
                "type": "connection.table",
                "childType": "connection.column",
                "isView": false
            })
        );
    }

    #[test]
    fn test_serialize_column_node() {
        let node = ExplorerNode::column(
            "ID",
            Some("Sample".to_string()),
            ColumnDetails {
                table: "Person".to_string(),
                data_type: Some("INTEGER".to_string()),
                size: None,
                is_nullable: false,
                default_value: None,
                is_pk: true,
                is_fk: false,
                icon_name: ColumnIcon::derive(true, false),
            },
        );
        assert!(node.is_terminal());
        let value = serde_json::to_value(&node).unwrap();
        assert_eq!(value["type"], json!("connection.column"));
        assert_eq!(value["childType"], json!("NO_CHILD"));
        assert_eq!(value["iconName"], json!("pk"));
        assert_eq!(value["dataType"], json!("INTEGER"));
        assert_eq!(value["table"], json!("Person"));
    }
}
