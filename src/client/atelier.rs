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


//! Session-authenticated Atelier client.
//!
//! [`AtelierClient`] owns everything that is per-session: the cookie jar,
//! the negotiated API version and the open/closed flag. It builds request
//! paths, gates version-dependent endpoints, and passes every response
//! through the envelope decoder.

use crate::client::session::{CookieJar, SessionState};
use crate::client::{AtelierTransport, HttpMethod, HttpRequest, HttpResponse};
use crate::database::ConnectionConfig;
use crate::error::{Error, Result};
use crate::result::ResultRow;
use crate::types::atelier::{decode_envelope, QueryRequest, ResultContent, ServerInfo};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};
use tracing::{debug, warn};

/// API version assumed when the server does not report a usable one.
pub const LEGACY_API_VERSION: u32 = 1;

/// Minimum API version of `action/query`.
pub const QUERY_MIN_API_VERSION: u32 = 1;

/// Value of a query-string parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum QueryParam<'a> {
    /// Serialized as `1` / `0`.
    Bool(bool),
    /// Skipped when `None` or empty.
    Text(Option<&'a str>),
    /// Skipped when `None`.
    Int(Option<i64>),
}

/// Outcome of one decoded round trip.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    /// Probe (`HEAD`) calls yield the updated cookie jar.
    Cookies(CookieJar),
    Content(ResultContent),
}

impl Decoded {
    pub fn into_content(self) -> Result<ResultContent> {
        match self {
            Decoded::Content(content) => Ok(content),
            Decoded::Cookies(_) => Err(Error::invalid_response(
                "expected response content, got a probe result",
            )),
        }
    }
}

/// Client for one IRIS server session.
pub struct AtelierClient {
    transport: Arc<dyn AtelierTransport>,
    config: ConnectionConfig,
    state: Mutex<SessionState>,
    /// Single-flight guard for the session probe.
    auth_gate: tokio::sync::Mutex<()>,
    api_version: OnceLock<u32>,
    closed: AtomicBool,
}

impl std::fmt::Debug for AtelierClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AtelierClient")
            .field("base_url", &self.base_url())
            .field("namespace", &self.config.namespace())
            .field("api_version", &self.api_version.get())
            .field("closed", &self.closed.load(Ordering::SeqCst))
            .finish()
    }
}

impl AtelierClient {
    pub fn new(transport: Arc<dyn AtelierTransport>, config: ConnectionConfig) -> Self {
        Self {
            transport,
            config,
            state: Mutex::new(SessionState::Uninitialized),
            auth_gate: tokio::sync::Mutex::new(()),
            api_version: OnceLock::new(),
            closed: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub fn namespace(&self) -> &str {
        self.config.namespace()
    }

    /// Negotiated API version, `None` until `open` succeeds.
    pub fn api_version(&self) -> Option<u32> {
        self.api_version.get().copied()
    }

    pub fn is_open(&self) -> bool {
        self.api_version.get().is_some() && !self.closed.load(Ordering::SeqCst)
    }

    /// Snapshot of the session state.
    pub fn session_state(&self) -> SessionState {
        self.lock_state().clone()
    }

    /// `{scheme}://{host}:{port}`
    pub fn base_url(&self) -> String {
        let scheme = if self.config.use_tls() { "https" } else { "http" };
        format!("{}://{}:{}", scheme, self.config.host(), self.config.port())
    }

    /// Builds the percent-encoded request path, enforcing the version gate.
    ///
    /// Fails without I/O when `min_version` exceeds the negotiated version,
    /// or when a versioned path is requested before `open`.
    pub fn resolve_path(
        &self,
        min_version: u32,
        path: &str,
        params: &[(&str, QueryParam<'_>)],
    ) -> Result<String> {
        let path = if min_version > 0 {
            let api_version = self.api_version().ok_or(Error::NotOpen)?;
            if min_version > api_version {
                return Err(Error::UnsupportedApiVersion {
                    path: path.to_string(),
                    required: min_version,
                    api_version,
                });
            }
            format!("v{}/{}", api_version, path)
        } else {
            path.to_string()
        };

        Ok(encode_uri(&format!(
            "{}/api/atelier/{}{}",
            normalize_path_prefix(self.config.path_prefix()),
            path,
            build_query_string(params)
        )))
    }

    /// Returns the session cookies, probing the server once if there are none.
    ///
    /// Concurrent first callers share a single probe.
    pub async fn ensure_authenticated(&self) -> Result<CookieJar> {
        if let Some(jar) = self.current_cookies() {
            return Ok(jar);
        }

        let _gate = self.auth_gate.lock().await;
        if let Some(jar) = self.current_cookies() {
            return Ok(jar);
        }

        *self.lock_state() = SessionState::Authenticating;
        match self.probe().await {
            Ok(jar) => {
                let mut state = self.lock_state();
                if self.closed.load(Ordering::SeqCst) {
                    *state = SessionState::Uninitialized;
                    return Err(Error::NotOpen);
                }
                debug!("Session probe returned {} cookie(s)", jar.len());
                *state = SessionState::Ready(jar.clone());
                Ok(jar)
            }
            Err(e) => {
                *self.lock_state() = SessionState::Uninitialized;
                Err(e)
            }
        }
    }

    /// Zero-body request whose only purpose is the session cookie.
    async fn probe(&self) -> Result<CookieJar> {
        let path = self.resolve_path(0, "", &[])?;
        debug!("Probing {}{} for a session", self.base_url(), path);
        let request = self.build_request(HttpMethod::Head, &path, None, &[], None);
        let response = self.transport.send(request).await?;
        Ok(CookieJar::from_set_cookie(&response.set_cookies))
    }

    /// Issues one Atelier request and decodes its envelope.
    pub async fn send(
        &self,
        min_version: u32,
        method: HttpMethod,
        path: &str,
        body: Option<Value>,
        params: &[(&str, QueryParam<'_>)],
        headers: &[(&str, &str)],
    ) -> Result<Decoded> {
        self.ensure_not_closed()?;
        let path = self.resolve_path(min_version, path, params)?;

        let cookies = if method == HttpMethod::Head {
            self.current_cookies()
        } else {
            Some(self.ensure_authenticated().await?)
        };

        let request = self.build_request(method, &path, body, headers, cookies.as_ref());
        let response = self.transport.send(request).await?;
        let jar = self.merge_cookies(&response);

        if method == HttpMethod::Head {
            return Ok(Decoded::Cookies(jar));
        }
        Ok(Decoded::Content(decode_envelope(&response.body)?))
    }

    /// Negotiates the API version and validates the namespace.
    pub async fn open(&self) -> Result<ServerInfo> {
        let content = self
            .send(0, HttpMethod::Get, "", None, &[], &[])
            .await?
            .into_content()?
            .into_json()?;
        let info: ServerInfo = serde_json::from_value(content)
            .map_err(|e| Error::invalid_response(format!("malformed server info: {}", e)))?;

        let negotiated = if info.api > 0 {
            let namespace = self.config.namespace();
            if !info.has_namespace(namespace) {
                return Err(Error::NamespaceNotFound {
                    namespace: namespace.to_string(),
                    available: info.namespaces.clone(),
                });
            }
            u32::try_from(info.api).unwrap_or(u32::MAX)
        } else {
            warn!(
                "Server did not report an API version, assuming {}",
                LEGACY_API_VERSION
            );
            LEGACY_API_VERSION
        };

        if self.api_version.set(negotiated).is_err() {
            debug!("API version already negotiated, keeping {:?}", self.api_version());
        }
        debug!(
            "Opened {} namespace {} with API version {:?}",
            self.base_url(),
            self.config.namespace(),
            self.api_version()
        );
        Ok(info)
    }

    /// Runs one SQL statement through `action/query`.
    pub async fn query(&self, sql: &str, parameters: &[Value]) -> Result<Vec<ResultRow>> {
        debug!("SQL: {}", sql);
        let path = format!("{}/action/query", self.config.namespace());
        let body = serde_json::to_value(QueryRequest {
            query: sql,
            parameters,
        })
        .map_err(|e| Error::invalid_response(format!("failed to encode query: {}", e)))?;

        let content = self
            .send(
                QUERY_MIN_API_VERSION,
                HttpMethod::Post,
                &path,
                Some(body),
                &[],
                &[],
            )
            .await?
            .into_content()?
            .into_json()?;
        rows_from_content(content)
    }

    /// Ends the session. Later requests fail with `NotOpen`.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        *self.lock_state() = SessionState::Uninitialized;
        debug!("Closed session to {}", self.base_url());
    }

    fn ensure_not_closed(&self) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(Error::NotOpen);
        }
        Ok(())
    }

    fn build_request(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<Value>,
        headers: &[(&str, &str)],
        cookies: Option<&CookieJar>,
    ) -> HttpRequest {
        let mut all: Vec<(String, String)> = headers
            .iter()
            .map(|(n, v)| (n.to_string(), v.to_string()))
            .collect();
        let has = |all: &[(String, String)], name: &str| {
            all.iter().any(|(n, _)| n.eq_ignore_ascii_case(name))
        };

        all.push(("Accept".to_string(), "application/json".to_string()));
        if method.has_body() && !has(&all, "Content-Type") {
            all.push(("Content-Type".to_string(), "application/json".to_string()));
        }
        all.push(("Cache-Control".to_string(), "no-cache".to_string()));
        if let Some(cookie) = cookies.and_then(CookieJar::header_value) {
            all.push(("Cookie".to_string(), cookie));
        }

        HttpRequest {
            method,
            url: format!("{}{}", self.base_url(), path),
            headers: all,
            body: if method.has_body() { body } else { None },
        }
    }

    /// Merges response cookies and returns the resulting jar.
    fn merge_cookies(&self, response: &HttpResponse) -> CookieJar {
        let mut state = self.lock_state();
        state.merge_set_cookie(&response.set_cookies);
        match &*state {
            SessionState::Ready(jar) => jar.clone(),
            _ => CookieJar::from_set_cookie(&response.set_cookies),
        }
    }

    fn current_cookies(&self) -> Option<CookieJar> {
        self.lock_state().cookies().cloned()
    }

    fn lock_state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Normalizes a web application prefix to `/prefix` (or empty).
fn normalize_path_prefix(prefix: Option<&str>) -> String {
    match prefix.map(|p| p.trim().trim_matches('/')) {
        Some(p) if !p.is_empty() => format!("/{}", p),
        _ => String::new(),
    }
}

/// `?a=1&b=x` from the defined parameters, or empty.
fn build_query_string(params: &[(&str, QueryParam<'_>)]) -> String {
    let pairs: Vec<String> = params
        .iter()
        .filter_map(|(name, value)| match value {
            QueryParam::Bool(b) => Some(format!("{}={}", name, if *b { 1 } else { 0 })),
            QueryParam::Text(Some(s)) if !s.is_empty() => Some(format!("{}={}", name, s)),
            QueryParam::Int(Some(i)) => Some(format!("{}={}", name, i)),
            _ => None,
        })
        .collect();

    if pairs.is_empty() {
        String::new()
    } else {
        format!("?{}", pairs.join("&"))
    }
}

/// Percent-encodes everything except URI reserved and unreserved characters.
fn encode_uri(input: &str) -> String {
    const KEEP: &[u8] = b";,/?:@&=+$-_.!~*'()#";
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        if byte.is_ascii_alphanumeric() || KEEP.contains(&byte) {
            out.push(byte as char);
        } else {
            out.push_str(&format!("%{:02X}", byte));
        }
    }
    out
}

/// Extracts rows from `action/query` content.
///
/// Content is either a list of row objects or a list of result sets, each a
/// list of row objects; only the first result set is used.
pub(crate) fn rows_from_content(content: Value) -> Result<Vec<ResultRow>> {
    let items = match content {
        Value::Null => return Ok(Vec::new()),
        Value::Array(items) => items,
        other => {
            return Err(Error::invalid_response(format!(
                "query content is not a list: {}",
                other
            )))
        }
    };

    let items = match items.first() {
        Some(Value::Array(_)) => match items.into_iter().next() {
            Some(Value::Array(first)) => first,
            _ => Vec::new(),
        },
        _ => items,
    };

    items
        .into_iter()
        .map(|item| match item {
            Value::Object(row) => Ok(row),
            other => Err(Error::invalid_response(format!(
                "query row is not an object: {}",
                other
            ))),
        })
        .collect()
}
