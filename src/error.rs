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


//! Error types for the IRIS driver.
//!
//! Every fallible operation in the crate returns [`Result`]. Failures are
//! never retried; callers that want resilience re-invoke `connect` or
//! `execute` themselves.

use std::error::Error as StdError;

/// Boxed underlying cause carried by transport failures.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Errors produced by the IRIS driver.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Network failure or a non-2xx HTTP status.
    #[error("{message}")]
    Transport {
        message: String,
        /// HTTP status code when the server answered.
        status: Option<u16>,
        #[source]
        source: Option<BoxError>,
    },

    /// The request needs a newer Atelier API than the server negotiated.
    /// Raised before any I/O happens.
    #[error("{path} not supported by API version {api_version} (requires {required})")]
    UnsupportedApiVersion {
        path: String,
        required: u32,
        api_version: u32,
    },

    /// The configured namespace is not served by the target server.
    #[error(
        "This server does not have specified namespace '{namespace}'. You must select one of the following: {}.",
        .available.join(", ")
    )]
    NamespaceNotFound {
        namespace: String,
        available: Vec<String>,
    },

    /// `status.summary` reported by the server envelope.
    #[error("{0}")]
    Server(String),

    /// `result.status` reported by the server envelope, e.g. an SQLCODE.
    #[error("{0}")]
    Query(String),

    /// Operation attempted before `open` succeeded, or after `close`.
    #[error("connection is not open")]
    NotOpen,

    /// The response body could not be interpreted.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Bad option key or value, or a required option is missing.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Transport failure without an underlying cause.
    pub fn transport(message: impl Into<String>) -> Self {
        Error::Transport {
            message: message.into(),
            status: None,
            source: None,
        }
    }

    /// Transport failure wrapping the error that caused it.
    pub fn transport_with_source(
        message: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Error::Transport {
            message: message.into(),
            status: None,
            source: Some(Box::new(source)),
        }
    }

    /// Non-2xx HTTP status.
    pub fn http_status(status: u16, body: impl AsRef<str>) -> Self {
        Error::Transport {
            message: format!("HTTP {} - {}", status, body.as_ref()),
            status: Some(status),
            source: None,
        }
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Error::InvalidResponse(message.into())
    }

    pub fn invalid_config(message: impl Into<String>) -> Self {
        Error::InvalidConfig(message.into())
    }

    /// Returns the HTTP status for transport failures that got an answer.
    pub fn http_status_code(&self) -> Option<u16> {
        match self {
            Error::Transport { status, .. } => *status,
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::InvalidResponse(e.to_string())
    }
}
