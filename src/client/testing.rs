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


//! In-memory transport for unit tests.

use crate::client::{AtelierTransport, HttpMethod, HttpRequest, HttpResponse};
use crate::error::{Error, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Mutex;
use std::time::Duration;

type Handler = dyn Fn(&HttpRequest) -> Result<HttpResponse> + Send + Sync;
type QueryHandler = dyn Fn(&str) -> Result<Value> + Send + Sync;

pub(crate) const SESSION_COOKIE: &str =
    "CSPSESSIONID-SP-52773-UP-api-atelier-=session1; path=/api/atelier/; httpOnly;";

/// Wraps content in a successful envelope.
pub(crate) fn envelope(content: Value) -> HttpResponse {
    HttpResponse {
        status: 200,
        set_cookies: vec![],
        body: json!({
            "status": {"errors": [], "summary": ""},
            "console": [],
            "result": {"content": content}
        })
        .to_string(),
    }
}

/// Envelope carrying a `result.status` failure.
pub(crate) fn query_error(status: &str) -> HttpResponse {
    HttpResponse {
        status: 200,
        set_cookies: vec![],
        body: json!({
            "status": {"errors": [], "summary": ""},
            "console": [],
            "result": {"status": status, "content": []}
        })
        .to_string(),
    }
}

pub(crate) fn server_info(api: i64, namespaces: &[&str]) -> Value {
    json!({
        "version": "IRIS for UNIX (Ubuntu Server LTS for x86-64) 2024.1",
        "id": "5E3C7E4C-1D4B-11EF-9B4F-0242AC110002",
        "api": api,
        "features": [],
        "namespaces": namespaces,
    })
}

pub(crate) struct MockTransport {
    handler: Box<Handler>,
    query: Option<Box<QueryHandler>>,
    delay: Option<Duration>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl std::fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockTransport").finish_non_exhaustive()
    }
}

impl MockTransport {
    pub(crate) fn new(
        handler: impl Fn(&HttpRequest) -> Result<HttpResponse> + Send + Sync + 'static,
    ) -> Self {
        Self {
            handler: Box::new(handler),
            query: None,
            delay: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A server answering the probe, the root info request and queries.
    pub(crate) fn iris(api: i64, namespaces: &[&str]) -> Self {
        let info = server_info(api, namespaces);
        Self::new(move |req| match req.method {
            HttpMethod::Head => Ok(Self::cookie_response(SESSION_COOKIE)),
            HttpMethod::Get if req.url.ends_with("/api/atelier/") => Ok(envelope(info.clone())),
            _ => Err(Error::http_status(404, "Not Found")),
        })
    }

    /// Routes `action/query` POSTs to `query`.
    pub(crate) fn with_query(
        mut self,
        query: impl Fn(&str) -> Result<Value> + Send + Sync + 'static,
    ) -> Self {
        self.query = Some(Box::new(query));
        self
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(crate) fn cookie_response(cookie: &str) -> HttpResponse {
        HttpResponse {
            status: 200,
            set_cookies: vec![cookie.to_string()],
            body: String::new(),
        }
    }

    pub(crate) fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub(crate) fn count(&self, method: HttpMethod) -> usize {
        self.requests().iter().filter(|r| r.method == method).count()
    }

    /// SQL texts posted to `action/query`, in order.
    pub(crate) fn queries(&self) -> Vec<String> {
        self.requests()
            .iter()
            .filter_map(|r| r.body.as_ref())
            .filter_map(|b| b.get("query").and_then(Value::as_str))
            .map(str::to_string)
            .collect()
    }

    fn respond(&self, request: &HttpRequest) -> Result<HttpResponse> {
        if let (Some(query), Some(body)) = (&self.query, &request.body) {
            if request.url.ends_with("/action/query") {
                let sql = body.get("query").and_then(Value::as_str).unwrap_or_default();
                return match query(sql) {
                    Ok(content) => Ok(envelope(content)),
                    Err(Error::Query(status)) => Ok(query_error(&status)),
                    Err(e) => Err(e),
                };
            }
        }
        (self.handler)(request)
    }
}

#[async_trait]
impl AtelierTransport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.respond(&request)
    }
}
