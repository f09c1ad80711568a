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


//! Client layer for the Atelier REST API.
//!
//! - [`AtelierTransport`]: abstract HTTP round trip, one request in, one
//!   response out
//! - [`AtelierHttpClient`]: pooled `reqwest` implementation
//! - [`AtelierClient`]: session cookies, API negotiation, path building and
//!   envelope decoding on top of a transport

pub mod atelier;
pub mod http;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

use crate::error::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;

pub use atelier::{AtelierClient, QueryParam};
pub use http::{AtelierHttpClient, HttpClientConfig};
pub use session::{CookieJar, SessionState};

/// HTTP verbs the Atelier API uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Head,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Head => "HEAD",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }

    /// Whether the verb carries a request body.
    pub fn has_body(&self) -> bool {
        matches!(self, HttpMethod::Post | HttpMethod::Put)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully resolved request ready for the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl HttpRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// A successful (2xx) response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    /// Raw `set-cookie` header values, in arrival order.
    pub set_cookies: Vec<String>,
    pub body: String,
}

/// One HTTP round trip.
///
/// Implementations return `Error::Transport` for network failures and for
/// non-2xx statuses; envelope-level failures are left to the caller.
#[async_trait]
pub trait AtelierTransport: Send + Sync + fmt::Debug {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse>;
}
