// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Scripted Atelier server shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use iris_sqltools::client::{AtelierTransport, HttpMethod, HttpRequest, HttpResponse};
use iris_sqltools::{Database, Error, Result};
use serde_json::{json, Value};
use std::sync::Mutex;

pub const SESSION_COOKIE: &str = "CSPSESSIONID-SP-52773-UP-api-atelier-=abc123; path=/api/atelier/";

type QueryHandler = dyn Fn(&str) -> std::result::Result<Value, String> + Send + Sync;

/// Answers the probe, the server info request and `action/query`.
///
/// Requests without the session cookie (other than the probe) are refused
/// with 401. Query handlers return `Err(status)` to report an SQL error.
pub struct ScriptedServer {
    api: i64,
    namespaces: Vec<String>,
    query: Box<QueryHandler>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl std::fmt::Debug for ScriptedServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptedServer")
            .field("api", &self.api)
            .field("namespaces", &self.namespaces)
            .finish_non_exhaustive()
    }
}

impl ScriptedServer {
    pub fn new(
        api: i64,
        namespaces: &[&str],
        query: impl Fn(&str) -> std::result::Result<Value, String> + Send + Sync + 'static,
    ) -> Self {
        Self {
            api,
            namespaces: namespaces.iter().map(|s| s.to_string()).collect(),
            query: Box::new(query),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn queries(&self) -> Vec<String> {
        self.requests()
            .iter()
            .filter_map(|r| r.body.as_ref()?.get("query")?.as_str().map(str::to_string))
            .collect()
    }

    pub fn count(&self, method: HttpMethod) -> usize {
        self.requests().iter().filter(|r| r.method == method).count()
    }

    fn ok(body: Value) -> HttpResponse {
        HttpResponse {
            status: 200,
            set_cookies: vec![],
            body: body.to_string(),
        }
    }

    fn envelope(content: Value) -> HttpResponse {
        Self::ok(json!({
            "status": {"errors": [], "summary": ""},
            "console": [],
            "result": {"content": content}
        }))
    }
}

#[async_trait]
impl AtelierTransport for ScriptedServer {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        self.requests.lock().unwrap().push(request.clone());

        if request.method == HttpMethod::Head {
            return Ok(HttpResponse {
                status: 204,
                set_cookies: vec![SESSION_COOKIE.to_string()],
                body: String::new(),
            });
        }
        let has_session = request
            .header("Cookie")
            .is_some_and(|c| c.contains("CSPSESSIONID-SP-52773-UP-api-atelier-=abc123"));
        if !has_session {
            return Err(Error::http_status(401, "Unauthorized"));
        }

        if request.method == HttpMethod::Get && request.url.ends_with("/api/atelier/") {
            return Ok(Self::envelope(json!({
                "version": "IRIS for UNIX (Ubuntu Server LTS for x86-64) 2024.1",
                "id": "instance-1",
                "api": self.api,
                "features": [],
                "namespaces": self.namespaces,
            })));
        }

        if request.method == HttpMethod::Post && request.url.ends_with("/action/query") {
            let sql = request
                .body
                .as_ref()
                .and_then(|b| b.get("query"))
                .and_then(Value::as_str)
                .unwrap_or_default();
            return Ok(match (self.query)(sql) {
                Ok(content) => Self::envelope(content),
                Err(status) => Self::ok(json!({
                    "status": {"errors": [], "summary": ""},
                    "console": [],
                    "result": {"status": status, "content": []}
                })),
            });
        }

        Err(Error::http_status(404, "Not Found"))
    }
}

/// A database pointing at `USER` on localhost.
pub fn database() -> Database {
    Database::new()
        .with_host("localhost")
        .with_port(52773)
        .with_namespace("user")
}
