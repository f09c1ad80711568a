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


//! SQL command builder for explorer queries.
//!
//! Objects are enumerated through the `%SQL_MANAGER` tree functions
//! (`TablesTree`, `ViewsTree`, `ProceduresTree`), which take a system-object
//! flag and a wildcard-glob filter. Columns come from `INFORMATION_SCHEMA`.
//!
//! Every value spliced into SQL text goes through [`quote_literal`] or
//! [`quote_identifier`].

use crate::metadata::types::{NodeKind, ObjectKind};
use std::fmt;

/// First API version whose explorer queries use the aliased projection.
pub const VERSIONED_ROWS_MIN_API: u32 = 2;

/// Default `TOP` for record browsing when no row limit is configured.
pub const DEFAULT_RECORD_LIMIT: usize = 50;

/// Default `TOP` for column search.
pub const DEFAULT_COLUMN_SEARCH_LIMIT: usize = 100;

/// Projection used for explorer rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowShape {
    /// Raw `%SQL_MANAGER` columns (`SCHEMA_NAME`, `TABLE_NAME`, ...).
    Legacy,
    /// Host-ready aliases (`label`, `schema`, `type`, `childType`, ...).
    Versioned,
}

impl RowShape {
    pub fn for_api(api_version: u32) -> Self {
        if api_version >= VERSIONED_ROWS_MIN_API {
            RowShape::Versioned
        } else {
            RowShape::Legacy
        }
    }
}

/// An immutable SQL statement produced by [`SqlCommandBuilder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataQuery {
    sql: String,
    shape: RowShape,
}

impl MetadataQuery {
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Row shape the server will answer with.
    pub fn shape(&self) -> RowShape {
        self.shape
    }
}

impl fmt::Display for MetadataQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

/// Quote a string literal, doubling embedded single quotes.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Quote a delimited identifier, doubling embedded double quotes.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Tree function filter: `<schema>.<search>*`, or `*` without a schema.
pub fn tree_filter(schema: Option<&str>, search: Option<&str>) -> String {
    match schema {
        Some(schema) => format!("{}.{}*", schema, search.unwrap_or_default()),
        None => format!("{}*", search.unwrap_or_default()),
    }
}

/// Builds explorer SQL for one connection.
///
/// ```ignore
/// let query = SqlCommandBuilder::new(api_version)
///     .with_system_objects(false)
///     .build_list_objects(ObjectKind::View, Some("Sample"), None);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct SqlCommandBuilder {
    shape: RowShape,
    show_system: bool,
}

impl SqlCommandBuilder {
    pub fn new(api_version: u32) -> Self {
        Self {
            shape: RowShape::for_api(api_version),
            show_system: false,
        }
    }

    pub fn with_system_objects(mut self, show_system: bool) -> Self {
        self.show_system = show_system;
        self
    }

    pub fn shape(&self) -> RowShape {
        self.shape
    }

    fn tree_source(&self, kind: ObjectKind, filter: &str) -> String {
        format!(
            "%SQL_MANAGER.{}({}, {})",
            kind.tree_function(),
            u8::from(self.show_system),
            quote_literal(filter)
        )
    }

    fn query(&self, sql: String) -> MetadataQuery {
        MetadataQuery {
            sql,
            shape: self.shape,
        }
    }

    /// Distinct schemas holding objects of `kind`.
    pub fn build_list_schemas(&self, kind: ObjectKind) -> MetadataQuery {
        let source = self.tree_source(kind, &tree_filter(None, None));
        let sql = match self.shape {
            RowShape::Versioned => format!(
                "SELECT DISTINCT BY (SCHEMA_NAME) %EXACT(SCHEMA_NAME) AS label, \
                 %EXACT(SCHEMA_NAME) AS \"schema\", {} AS \"type\", {} AS \"childType\", \
                 'folder' AS \"iconId\" FROM {}",
                quote_literal(NodeKind::Schema.as_str()),
                quote_literal(kind.node_kind().as_str()),
                source
            ),
            RowShape::Legacy => format!(
                "SELECT DISTINCT BY (SCHEMA_NAME) %EXACT(SCHEMA_NAME) AS SCHEMA_NAME FROM {}",
                source
            ),
        };
        self.query(sql)
    }

    /// Objects of `kind`, optionally restricted to one schema and filtered
    /// by a name prefix.
    pub fn build_list_objects(
        &self,
        kind: ObjectKind,
        schema: Option<&str>,
        search: Option<&str>,
    ) -> MetadataQuery {
        let name = kind.name_column();
        let source = self.tree_source(kind, &tree_filter(schema, search));
        let mut sql = match self.shape {
            RowShape::Versioned => format!(
                "SELECT {} AS label, SCHEMA_NAME AS \"schema\", {} AS \"type\", \
                 {} AS \"childType\", {} AS \"isView\" FROM {}",
                name,
                quote_literal(kind.node_kind().as_str()),
                quote_literal(kind.child_kind().as_str()),
                quote_literal(if kind.is_view() { "TRUE" } else { "FALSE" }),
                source
            ),
            RowShape::Legacy => format!("SELECT SCHEMA_NAME, {} FROM {}", name, source),
        };
        if let Some(schema) = schema {
            sql.push_str(&format!(" WHERE SCHEMA_NAME = {}", quote_literal(schema)));
        }
        sql.push_str(&format!(" ORDER BY {}", name));
        self.query(sql)
    }

    /// Columns of one table or view, with key flags.
    pub fn build_list_columns(&self, schema: &str, table: &str) -> MetadataQuery {
        let sql = format!(
            "{} WHERE C.TABLE_SCHEMA = {} AND C.TABLE_NAME = {} \
             ORDER BY C.TABLE_NAME, C.ORDINAL_POSITION",
            column_projection(None),
            quote_literal(schema),
            quote_literal(table)
        );
        self.query(sql)
    }

    /// Columns whose name (or `table.column`) contains `search`, optionally
    /// restricted to the given tables.
    pub fn build_search_columns(
        &self,
        search: Option<&str>,
        tables: &[String],
        limit: usize,
    ) -> MetadataQuery {
        let mut sql = format!("{} WHERE 1 = 1", column_projection(Some(limit)));

        let tables: Vec<String> = tables
            .iter()
            .filter(|t| !t.is_empty())
            .map(|t| quote_literal(&t.to_lowercase()))
            .collect();
        if !tables.is_empty() {
            sql.push_str(&format!(" AND LOWER(C.TABLE_NAME) IN ({})", tables.join(", ")));
        }

        if let Some(search) = search.filter(|s| !s.is_empty()) {
            let needle = quote_literal(&format!("%{}%", search.to_lowercase()));
            sql.push_str(&format!(
                " AND (LOWER(C.TABLE_NAME || '.' || C.COLUMN_NAME) LIKE {needle} \
                 OR LOWER(C.COLUMN_NAME) LIKE {needle})"
            ));
        }

        sql.push_str(" ORDER BY C.COLUMN_NAME, C.ORDINAL_POSITION");
        self.query(sql)
    }

    /// First `limit` rows of a table.
    pub fn build_show_records(&self, schema: &str, table: &str, limit: usize) -> MetadataQuery {
        self.query(format!(
            "SELECT TOP {} * FROM {}.{}",
            limit,
            quote_identifier(schema),
            quote_identifier(table)
        ))
    }

    /// Row count of a table, returned as `total`.
    pub fn build_count_records(&self, schema: &str, table: &str) -> MetadataQuery {
        self.query(format!(
            "SELECT COUNT(1) AS total FROM {}.{}",
            quote_identifier(schema),
            quote_identifier(table)
        ))
    }
}

fn key_flag(constraint_type: &str, alias: &str) -> String {
    format!(
        "CASE WHEN EXISTS (SELECT 1 FROM INFORMATION_SCHEMA.KEY_COLUMN_USAGE K \
         JOIN INFORMATION_SCHEMA.TABLE_CONSTRAINTS T \
         ON T.CONSTRAINT_SCHEMA = K.CONSTRAINT_SCHEMA AND T.CONSTRAINT_NAME = K.CONSTRAINT_NAME \
         WHERE K.TABLE_SCHEMA = C.TABLE_SCHEMA AND K.TABLE_NAME = C.TABLE_NAME \
         AND K.COLUMN_NAME = C.COLUMN_NAME AND T.CONSTRAINT_TYPE = {}) \
         THEN 1 ELSE 0 END AS \"{}\"",
        quote_literal(constraint_type),
        alias
    )
}

fn column_projection(top: Option<usize>) -> String {
    let top = top.map(|n| format!("TOP {} ", n)).unwrap_or_default();
    format!(
        "SELECT {top}C.COLUMN_NAME AS label, {kind} AS \"type\", C.TABLE_NAME AS \"table\", \
         C.DATA_TYPE AS \"dataType\", \
         UPPER(C.DATA_TYPE || (CASE WHEN C.CHARACTER_MAXIMUM_LENGTH > 0 \
         THEN ('(' || C.CHARACTER_MAXIMUM_LENGTH || ')') ELSE '' END)) AS \"detail\", \
         C.CHARACTER_MAXIMUM_LENGTH AS \"size\", C.TABLE_SCHEMA AS \"schema\", \
         C.COLUMN_DEFAULT AS \"defaultValue\", C.IS_NULLABLE AS \"isNullable\", \
         {pk}, {fk} FROM INFORMATION_SCHEMA.COLUMNS C",
        kind = quote_literal(NodeKind::Column.as_str()),
        pk = key_flag("PRIMARY KEY", "isPk"),
        fk = key_flag("FOREIGN KEY", "isFk"),
    )
}
