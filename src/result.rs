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


//! Query results handed back to the host.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

/// One result row: column label to scalar value, in server column order.
pub type ResultRow = Map<String, Value>;

/// Per-call options passed by the host.
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    /// Host-side request identifier, echoed on every result set.
    pub request_id: Option<String>,
}

impl QueryOptions {
    pub fn with_request_id(request_id: impl Into<String>) -> Self {
        Self {
            request_id: Some(request_id.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryMessage {
    pub date: DateTime<Utc>,
    pub message: String,
}

/// Tabular result of one statement.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultSet {
    #[serde(rename = "connId", skip_serializing_if = "Option::is_none")]
    pub connection_id: Option<String>,
    /// Keys of the first row; empty when there are no rows.
    #[serde(rename = "cols")]
    pub columns: Vec<String>,
    pub messages: Vec<QueryMessage>,
    #[serde(rename = "results")]
    pub rows: Vec<ResultRow>,
    pub query: String,
    pub request_id: Option<String>,
    pub result_id: String,
}

impl ResultSet {
    /// Builds a result set with a fresh `result_id`.
    pub fn new(
        query: impl Into<String>,
        rows: Vec<ResultRow>,
        request_id: Option<String>,
        connection_id: Option<String>,
    ) -> Self {
        let columns = rows
            .first()
            .map(|row| row.keys().cloned().collect())
            .unwrap_or_default();
        let message = QueryMessage {
            date: Utc::now(),
            message: format!("Query ok with {} results", rows.len()),
        };
        Self {
            connection_id,
            columns,
            messages: vec![message],
            rows,
            query: query.into(),
            request_id,
            result_id: Uuid::new_v4().to_string(),
        }
    }

    pub fn message(&self) -> Option<&str> {
        self.messages.first().map(|m| m.message.as_str())
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}
