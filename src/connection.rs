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


//! Open IRIS session exposed to the host.

use crate::client::AtelierClient;
use crate::completions::{static_completions, CompletionItem};
use crate::error::{Error, Result};
use crate::metadata::{ExplorerNode, MetadataService, SearchKind, SearchParams};
use crate::result::{QueryOptions, ResultSet};
use crate::statement::{split_statements, Statement};
use crate::types::atelier::ServerInfo;
use futures::future::try_join_all;
use std::sync::Arc;
use tracing::debug;

/// An authenticated session against one IRIS namespace.
///
/// A Connection is created by [`Database::connect`](crate::Database::connect)
/// after the server has been probed and the namespace validated. It is
/// cheap to share behind an `Arc`; every method takes `&self`.
#[derive(Debug)]
pub struct Connection {
    client: Arc<AtelierClient>,
    server_info: ServerInfo,
    metadata: MetadataService,
}

impl Connection {
    pub(crate) fn new(client: Arc<AtelierClient>, server_info: ServerInfo) -> Self {
        debug!(
            "Connected to {} (API v{})",
            server_info.version.as_deref().unwrap_or("IRIS"),
            client.api_version().unwrap_or_default()
        );
        Self {
            metadata: MetadataService::new(client.clone()),
            client,
            server_info,
        }
    }

    /// Server information reported at open.
    pub fn server_info(&self) -> &ServerInfo {
        &self.server_info
    }

    /// Negotiated Atelier API version.
    pub fn api_version(&self) -> Option<u32> {
        self.client.api_version()
    }

    pub fn namespace(&self) -> &str {
        self.client.namespace()
    }

    pub fn is_open(&self) -> bool {
        self.client.is_open()
    }

    /// Creates a statement for one SQL text.
    pub fn new_statement(&self, query: impl Into<String>) -> Result<Statement> {
        if !self.is_open() {
            return Err(Error::NotOpen);
        }
        Ok(Statement::new(self.client.clone(), query))
    }

    /// Splits `text` into statements and runs them concurrently.
    ///
    /// Result sets come back in statement order. One failing statement
    /// fails the whole batch.
    pub async fn execute(&self, text: &str, options: &QueryOptions) -> Result<Vec<ResultSet>> {
        let statements = split_statements(text)
            .into_iter()
            .map(|sql| self.new_statement(sql))
            .collect::<Result<Vec<_>>>()?;
        debug!("Executing batch of {} statement(s)", statements.len());
        try_join_all(
            statements
                .iter()
                .map(|statement| statement.execute(options.request_id.clone())),
        )
        .await
    }

    /// Runs `SELECT 1`.
    pub async fn test_connection(&self) -> Result<()> {
        self.new_statement("SELECT 1")?.execute(None).await.map(|_| ())
    }

    /// Children of an explorer node; empty when anything goes wrong.
    pub async fn get_children(&self, node: &ExplorerNode) -> Vec<ExplorerNode> {
        self.metadata.get_children(node).await
    }

    /// Root node for this connection's explorer tree.
    pub fn root_node(&self) -> ExplorerNode {
        let label = self
            .client
            .config()
            .id()
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}:{}", self.client.config().host(), self.namespace()));
        ExplorerNode::connection(label)
    }

    pub async fn search(
        &self,
        kind: SearchKind,
        text: &str,
        params: &SearchParams,
    ) -> Result<Vec<ExplorerNode>> {
        self.metadata.search(kind, text, params).await
    }

    pub fn static_completions(&self) -> Vec<CompletionItem> {
        static_completions()
    }

    /// First rows of a table or view.
    pub async fn show_records(
        &self,
        table: &ExplorerNode,
        limit: Option<usize>,
        options: &QueryOptions,
    ) -> Result<ResultSet> {
        self.metadata.show_records(table, limit, options).await
    }

    pub async fn count_records(&self, table: &ExplorerNode) -> Result<u64> {
        self.metadata.count_records(table).await
    }

    /// Drops the session cookies. Later calls fail with [`Error::NotOpen`].
    pub fn close(&self) {
        self.client.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::testing::MockTransport;
    use crate::database::ConnectionConfig;
    use crate::metadata::{NodeKind, ObjectKind};
    use serde_json::{json, Value};
    use std::time::Duration;

    async fn connect(transport: Arc<MockTransport>) -> Connection {
        let client = Arc::new(AtelierClient::new(
            transport,
            ConnectionConfig::new("localhost", 52773, "USER").with_id("conn-1"),
        ));
        let info = client.open().await.unwrap();
        Connection::new(client, info)
    }

    fn echo(sql: &str) -> Result<Value> {
        match sql {
            "SELECT 1" => Ok(json!([{"Expression_1": 1}])),
            "SELECT 2" => Ok(json!([{"Expression_1": 2}])),
            s if s.starts_with("SELECT * FROM Empty") => Ok(json!([])),
            s if s.contains("Broken") => Err(Error::Query("SQLCODE: -30".into())),
            _ => Ok(json!([])),
        }
    }

    #[tokio::test]
    async fn test_execute_batch() {
        let transport = Arc::new(MockTransport::iris(6, &["USER"]).with_query(echo));
        let connection = connect(transport.clone()).await;

        let results = connection
            .execute("SELECT 1; SELECT 2;", &QueryOptions::with_request_id("r1"))
            .await
            .unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].query, "SELECT 1");
        assert_eq!(results[1].rows[0]["Expression_1"], json!(2));
        assert_ne!(results[0].result_id, results[1].result_id);
        assert!(results
            .iter()
            .all(|r| r.request_id.as_deref() == Some("r1")
                && r.connection_id.as_deref() == Some("conn-1")));
        assert_eq!(transport.queries().len(), 2);
    }

    #[tokio::test]
    async fn test_execute_runs_statements_concurrently() {
        let transport = Arc::new(
            MockTransport::iris(6, &["USER"])
                .with_query(echo)
                .with_delay(Duration::from_millis(50)),
        );
        let connection = connect(transport).await;
        let started = tokio::time::Instant::now();
        let results = connection
            .execute("SELECT 1;\nSELECT 2;\nSELECT 1", &QueryOptions::default())
            .await
            .unwrap();
        assert_eq!(results.len(), 3);
        assert!(started.elapsed() < Duration::from_millis(140));
    }

    #[tokio::test]
    async fn test_execute_empty_result() {
        let transport = Arc::new(MockTransport::iris(6, &["USER"]).with_query(echo));
        let connection = connect(transport).await;
        let results = connection
            .execute("SELECT * FROM Empty", &QueryOptions::default())
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert!(results[0].columns.is_empty());
        assert_eq!(results[0].message(), Some("Query ok with 0 results"));
    }

    #[tokio::test]
    async fn test_execute_blank_text() {
        let transport = Arc::new(MockTransport::iris(6, &["USER"]).with_query(echo));
        let connection = connect(transport.clone()).await;
        let results = connection
            .execute("  ;\n", &QueryOptions::default())
            .await
            .unwrap();
        assert!(results.is_empty());
        assert!(transport.queries().is_empty());
    }

    #[tokio::test]
    async fn test_one_failure_fails_batch() {
        let transport = Arc::new(MockTransport::iris(6, &["USER"]).with_query(echo));
        let connection = connect(transport).await;
        let err = connection
            .execute("SELECT 1; SELECT * FROM Broken;", &QueryOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Query(ref m) if m == "SQLCODE: -30"));
    }

    #[tokio::test]
    async fn test_test_connection() {
        let transport = Arc::new(MockTransport::iris(6, &["USER"]).with_query(echo));
        let connection = connect(transport.clone()).await;
        connection.test_connection().await.unwrap();
        assert_eq!(transport.queries(), vec!["SELECT 1"]);
    }

    #[tokio::test]
    async fn test_close_then_not_open() {
        let transport = Arc::new(MockTransport::iris(6, &["USER"]).with_query(echo));
        let connection = connect(transport.clone()).await;
        connection.close();
        assert!(!connection.is_open());
        assert!(matches!(
            connection.execute("SELECT 1", &QueryOptions::default()).await,
            Err(Error::NotOpen)
        ));
        assert!(matches!(
            connection.test_connection().await,
            Err(Error::NotOpen)
        ));
        assert!(connection
            .get_children(&ExplorerNode::group(ObjectKind::Table, None))
            .await
            .is_empty());
        assert!(transport.queries().is_empty());
    }

    #[tokio::test]
    async fn test_root_node_and_completions() {
        let transport = Arc::new(MockTransport::iris(6, &["USER"]).with_query(echo));
        let connection = connect(transport).await;
        let root = connection.root_node();
        assert_eq!(root.label, "conn-1");
        assert_eq!(root.kind, NodeKind::ConnectedConnection);
        assert_eq!(connection.get_children(&root).await.len(), 3);
        assert!(connection
            .static_completions()
            .iter()
            .any(|c| c.label == "SELECT"));
        assert_eq!(connection.server_info().api, 6);
        assert_eq!(connection.api_version(), Some(6));
        assert_eq!(connection.namespace(), "USER");
    }
}
