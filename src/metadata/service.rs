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


//! Explorer tree navigation and search.
//!
//! Navigation follows
//! `Connection → group → schema → table/view/procedure → column`, with
//! schema nodes optionally expanding into groups scoped to that schema.
//! Navigation never fails: any error is logged and yields no children.
//! Search and record browsing propagate errors to the caller.

use crate::client::AtelierClient;
use crate::error::{Error, Result};
use crate::metadata::parse::{parse_column_nodes, parse_object_nodes, parse_schema_nodes};
use crate::metadata::pattern::{glob_match, prefix_glob};
use crate::metadata::sql::{
    MetadataQuery, SqlCommandBuilder, DEFAULT_COLUMN_SEARCH_LIMIT, DEFAULT_RECORD_LIMIT,
};
use crate::metadata::types::{ExplorerNode, NodeKind, ObjectKind};
use crate::result::{QueryOptions, ResultRow, ResultSet};
use futures::future::try_join_all;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, warn};

/// What a free-text search looks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchKind {
    /// Tables, views and procedures.
    Any,
    /// Tables and views.
    Table,
    View,
    Procedure,
    Column,
}

impl SearchKind {
    fn object_kinds(&self) -> &'static [ObjectKind] {
        match self {
            SearchKind::Any => &ObjectKind::ALL,
            SearchKind::Table => &[ObjectKind::Table, ObjectKind::View],
            SearchKind::View => &[ObjectKind::View],
            SearchKind::Procedure => &[ObjectKind::Procedure],
            SearchKind::Column => &[],
        }
    }
}

impl From<NodeKind> for SearchKind {
    fn from(kind: NodeKind) -> Self {
        match kind {
            NodeKind::Table => SearchKind::Table,
            NodeKind::View => SearchKind::View,
            NodeKind::Procedure => SearchKind::Procedure,
            NodeKind::Column => SearchKind::Column,
            _ => SearchKind::Any,
        }
    }
}

/// Extra search parameters supplied by the host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    /// Table names a column search is restricted to.
    #[serde(default)]
    pub tables: Vec<String>,
    /// Maximum number of results.
    #[serde(default)]
    pub limit: Option<usize>,
}

impl SearchParams {
    pub fn with_tables<I, S>(mut self, tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tables = tables.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Resolves explorer children and searches over one session.
#[derive(Debug, Clone)]
pub struct MetadataService {
    client: Arc<AtelierClient>,
}

impl MetadataService {
    pub fn new(client: Arc<AtelierClient>) -> Self {
        Self { client }
    }

    fn builder(&self) -> Result<SqlCommandBuilder> {
        let api_version = self.client.api_version().ok_or(Error::NotOpen)?;
        Ok(SqlCommandBuilder::new(api_version)
            .with_system_objects(self.client.config().show_system_objects()))
    }

    async fn run(&self, query: &MetadataQuery) -> Result<Vec<ResultRow>> {
        debug!("Explorer query: {}", query);
        self.client.query(query.sql(), &[]).await
    }

    /// Children of `node`. Errors degrade to an empty list.
    pub async fn get_children(&self, node: &ExplorerNode) -> Vec<ExplorerNode> {
        match self.try_get_children(node).await {
            Ok(children) => children,
            Err(e) => {
                warn!(
                    "Failed to list children of {} '{}': {}",
                    node.kind, node.label, e
                );
                Vec::new()
            }
        }
    }

    async fn try_get_children(&self, node: &ExplorerNode) -> Result<Vec<ExplorerNode>> {
        match node.kind {
            NodeKind::Connection | NodeKind::ConnectedConnection => Ok(ObjectKind::ALL
                .iter()
                .map(|kind| ExplorerNode::group(*kind, None))
                .collect()),
            NodeKind::ResourceGroup => {
                let Some(kind) = node.object_kind() else {
                    return Ok(Vec::new());
                };
                match node.schema.as_deref() {
                    Some(schema) => self.list_objects(kind, schema).await,
                    None => self.list_schemas(kind).await,
                }
            }
            NodeKind::Schema => {
                let schema = node.schema.as_deref().unwrap_or(&node.label);
                match node.child_type.and_then(|c| c.object_kind()) {
                    Some(kind) => self.list_objects(kind, schema).await,
                    None => Ok(ObjectKind::ALL
                        .iter()
                        .map(|kind| ExplorerNode::group(*kind, Some(schema)))
                        .collect()),
                }
            }
            NodeKind::Table | NodeKind::View => match node.schema.as_deref() {
                Some(schema) => self.list_columns(schema, &node.label).await,
                None => Ok(Vec::new()),
            },
            NodeKind::Procedure | NodeKind::Column | NodeKind::NoChild => Ok(Vec::new()),
        }
    }

    /// Distinct schemas holding objects of `kind`.
    pub async fn list_schemas(&self, kind: ObjectKind) -> Result<Vec<ExplorerNode>> {
        let query = self.builder()?.build_list_schemas(kind);
        let rows = self.run(&query).await?;
        parse_schema_nodes(&rows, query.shape(), kind)
    }

    /// Objects of `kind` in `schema`.
    pub async fn list_objects(&self, kind: ObjectKind, schema: &str) -> Result<Vec<ExplorerNode>> {
        let query = self.builder()?.build_list_objects(kind, Some(schema), None);
        let rows = self.run(&query).await?;
        parse_object_nodes(&rows, query.shape(), kind)
    }

    /// Columns of a table or view.
    pub async fn list_columns(&self, schema: &str, table: &str) -> Result<Vec<ExplorerNode>> {
        let query = self.builder()?.build_list_columns(schema, table);
        let rows = self.run(&query).await?;
        parse_column_nodes(&rows)
    }

    /// Free-text search.
    ///
    /// `schema.name` searches are restricted to that schema; unqualified
    /// text matches object names by prefix across all schemas.
    pub async fn search(
        &self,
        kind: SearchKind,
        text: &str,
        params: &SearchParams,
    ) -> Result<Vec<ExplorerNode>> {
        let text = text.trim();
        if kind == SearchKind::Column {
            return self.search_columns(text, params).await;
        }

        let found = try_join_all(
            kind.object_kinds()
                .iter()
                .map(|object_kind| self.search_objects(*object_kind, text)),
        )
        .await?;
        let mut nodes: Vec<ExplorerNode> = found.into_iter().flatten().collect();
        if let Some(limit) = params.limit {
            nodes.truncate(limit);
        }
        debug!("Search '{}' found {} item(s)", text, nodes.len());
        Ok(nodes)
    }

    async fn search_objects(&self, kind: ObjectKind, text: &str) -> Result<Vec<ExplorerNode>> {
        let builder = self.builder()?;
        let (schema, name) = match text.split_once('.') {
            Some((schema, name)) if !schema.is_empty() => (Some(schema), name),
            _ => (None, text),
        };
        let query = match schema {
            Some(schema) => builder.build_list_objects(kind, Some(schema), Some(name)),
            None => builder.build_list_objects(kind, None, None),
        };
        let rows = self.run(&query).await?;
        let pattern = prefix_glob(name);
        Ok(parse_object_nodes(&rows, query.shape(), kind)?
            .into_iter()
            .filter(|node| glob_match(&pattern, &node.label))
            .collect())
    }

    async fn search_columns(&self, text: &str, params: &SearchParams) -> Result<Vec<ExplorerNode>> {
        let query = self.builder()?.build_search_columns(
            Some(text),
            &params.tables,
            params.limit.unwrap_or(DEFAULT_COLUMN_SEARCH_LIMIT),
        );
        let rows = self.run(&query).await?;
        parse_column_nodes(&rows)
    }

    fn table_location(table: &ExplorerNode) -> Result<&str> {
        table.schema.as_deref().ok_or_else(|| {
            Error::invalid_config(format!("'{}' has no schema", table.label))
        })
    }

    /// First rows of a table or view.
    ///
    /// `limit` falls back to the configured row limit, then 50.
    pub async fn show_records(
        &self,
        table: &ExplorerNode,
        limit: Option<usize>,
        options: &QueryOptions,
    ) -> Result<ResultSet> {
        let schema = Self::table_location(table)?;
        let limit = limit
            .or(self.client.config().result_set_row_limit())
            .unwrap_or(DEFAULT_RECORD_LIMIT);
        let query = self.builder()?.build_show_records(schema, &table.label, limit);
        let rows = self.run(&query).await?;
        Ok(ResultSet::new(
            query.sql(),
            rows,
            options.request_id.clone(),
            self.client.config().id().map(str::to_string),
        ))
    }

    /// Number of rows in a table or view.
    pub async fn count_records(&self, table: &ExplorerNode) -> Result<u64> {
        let schema = Self::table_location(table)?;
        let query = self.builder()?.build_count_records(schema, &table.label);
        let rows = self.run(&query).await?;
        let total = rows.first().and_then(|row| {
            row.iter()
                .find(|(k, _)| k.eq_ignore_ascii_case("total"))
                .map(|(_, v)| v)
        });
        match total {
            Some(v) => v
                .as_u64()
                .or_else(|| v.as_str().and_then(|s| s.trim().parse().ok()))
                .ok_or_else(|| Error::invalid_response(format!("unexpected row count: {}", v))),
            None => Err(Error::invalid_response("row count query returned no total")),
        }
    }
}
