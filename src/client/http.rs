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


//! HTTP transport for the Atelier REST API.
//!
//! - One pooled keep-alive `reqwest` client per session
//! - At most `max_connections_per_host` requests in flight at once
//! - Basic authentication on every call
//! - Configurable timeouts
//!
//! No retries: a failed round trip surfaces to the caller as
//! `Error::Transport`.

use crate::auth::AuthProvider;
use crate::client::{AtelierTransport, HttpMethod, HttpRequest, HttpResponse};
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::header::SET_COOKIE;
use reqwest::{Client, Method};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::debug;

/// Configuration for the HTTP client.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Connection timeout duration.
    pub connect_timeout: Duration,
    /// Whole-request timeout. `None` leaves slow statements to the server.
    pub read_timeout: Option<Duration>,
    /// Maximum number of concurrent requests, and so open sockets, per host.
    pub max_connections_per_host: usize,
    /// User agent string.
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            read_timeout: None,
            max_connections_per_host: 10,
            user_agent: format!("iris-sqltools/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// `reqwest` backed [`AtelierTransport`].
#[derive(Debug)]
pub struct AtelierHttpClient {
    client: Client,
    config: HttpClientConfig,
    auth_provider: Option<Arc<dyn AuthProvider>>,
    in_flight: Semaphore,
}

impl AtelierHttpClient {
    /// Creates a new HTTP client. `auth_provider` is `None` for anonymous
    /// web applications.
    pub fn new(
        config: HttpClientConfig,
        auth_provider: Option<Arc<dyn AuthProvider>>,
    ) -> Result<Self> {
        let mut builder = Client::builder()
            .connect_timeout(config.connect_timeout)
            .pool_max_idle_per_host(config.max_connections_per_host)
            .tcp_keepalive(Duration::from_secs(60))
            .user_agent(&config.user_agent);
        if let Some(timeout) = config.read_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| Error::transport_with_source("failed to create HTTP client", e))?;
        let in_flight = Semaphore::new(config.max_connections_per_host.max(1));

        Ok(Self {
            client,
            config,
            auth_provider,
            in_flight,
        })
    }

    /// Returns the client configuration.
    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    fn method(method: HttpMethod) -> Method {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Head => Method::HEAD,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Delete => Method::DELETE,
        }
    }
}

#[async_trait]
impl AtelierTransport for AtelierHttpClient {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let mut builder = self
            .client
            .request(Self::method(request.method), &request.url);

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        if let Some(ref auth) = self.auth_provider {
            builder = builder.header("Authorization", auth.get_auth_header()?);
        }

        if let Some(ref body) = request.body {
            let bytes = serde_json::to_vec(body)
                .map_err(|e| Error::transport_with_source("failed to encode request body", e))?;
            builder = builder.body(bytes);
        }

        // Held until the body is read so the socket is back in the pool.
        let _permit = self
            .in_flight
            .acquire()
            .await
            .map_err(|e| Error::transport_with_source("HTTP client is shut down", e))?;
        debug!("Executing {} {}", request.method, request.url);

        let response = builder.send().await.map_err(|e| {
            Error::transport_with_source(format!("HTTP request failed: {}", e), e)
        })?;

        let status = response.status();
        let set_cookies: Vec<String> = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(str::to_string)
            .collect();

        let body = response.text().await.map_err(|e| {
            Error::transport_with_source(format!("failed to read response: {}", e), e)
        })?;

        if !status.is_success() {
            return Err(Error::http_status(status.as_u16(), body));
        }

        Ok(HttpResponse {
            status: status.as_u16(),
            set_cookies,
            body,
        })
    }
}
