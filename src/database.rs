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


//! Connection configuration for the IRIS driver.
//!
//! A [`Database`] collects options (from builders, string options or the
//! host's credential JSON) and opens [`Connection`]s. The validated,
//! immutable per-session settings live in [`ConnectionConfig`].

use crate::auth::{AuthProvider, BasicAuth};
use crate::client::{AtelierClient, AtelierHttpClient, AtelierTransport, HttpClientConfig};
use crate::connection::Connection;
use crate::error::{Error, Result};
use crate::logging::{init_logging, LogConfig};
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Default port of the IRIS private web server.
pub const DEFAULT_PORT: u16 = 52773;

/// Settings for one session. The namespace is upper-cased on construction.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    id: Option<String>,
    use_tls: bool,
    host: String,
    port: u16,
    path_prefix: Option<String>,
    namespace: String,
    username: Option<String>,
    password: Option<String>,
    show_system_objects: bool,
    result_set_row_limit: Option<usize>,
}

impl ConnectionConfig {
    pub fn new(host: impl Into<String>, port: u16, namespace: impl AsRef<str>) -> Self {
        Self {
            id: None,
            use_tls: false,
            host: host.into(),
            port,
            path_prefix: None,
            namespace: namespace.as_ref().to_uppercase(),
            username: None,
            password: None,
            show_system_objects: false,
            result_set_row_limit: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_tls(mut self, use_tls: bool) -> Self {
        self.use_tls = use_tls;
        self
    }

    pub fn with_path_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.path_prefix = Some(prefix.into());
        self
    }

    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    pub fn with_show_system_objects(mut self, show: bool) -> Self {
        self.show_system_objects = show;
        self
    }

    pub fn with_result_set_row_limit(mut self, limit: usize) -> Self {
        self.result_set_row_limit = Some(limit);
        self
    }

    /// Builds a config from the host's credential payload.
    ///
    /// Accepts the driver form's camelCase keys: `server` (or `host`),
    /// `port`, `https`, `pathPrefix`, `namespace`, `username`, `password`,
    /// `showSystem`, `resultSetRowLimit` and an optional connection `id`.
    pub fn from_credentials(credentials: Value) -> Result<Self> {
        let c: Credentials = serde_json::from_value(credentials)
            .map_err(|e| Error::invalid_config(format!("malformed credentials: {}", e)))?;
        if c.server.trim().is_empty() {
            return Err(Error::invalid_config("server is required"));
        }
        if c.namespace.trim().is_empty() {
            return Err(Error::invalid_config("namespace is required"));
        }

        let mut config = Self::new(c.server.trim(), c.port.unwrap_or(DEFAULT_PORT), c.namespace.trim())
            .with_tls(c.https)
            .with_show_system_objects(c.show_system);
        config.id = c.id;
        config.path_prefix = c.path_prefix.filter(|p| !p.is_empty());
        config.username = c.username.filter(|u| !u.is_empty());
        config.password = c.password;
        config.result_set_row_limit = c.result_set_row_limit;
        Ok(config)
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn use_tls(&self) -> bool {
        self.use_tls
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn path_prefix(&self) -> Option<&str> {
        self.path_prefix.as_deref()
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn show_system_objects(&self) -> bool {
        self.show_system_objects
    }

    pub fn result_set_row_limit(&self) -> Option<usize> {
        self.result_set_row_limit
    }

    /// Basic credentials when a username is configured.
    pub fn auth_provider(&self) -> Option<Arc<dyn AuthProvider>> {
        self.username.as_ref().map(|user| {
            Arc::new(BasicAuth::new(
                user.clone(),
                self.password.clone().unwrap_or_default(),
            )) as Arc<dyn AuthProvider>
        })
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("id", &self.id)
            .field("use_tls", &self.use_tls)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("path_prefix", &self.path_prefix)
            .field("namespace", &self.namespace)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("show_system_objects", &self.show_system_objects)
            .field("result_set_row_limit", &self.result_set_row_limit)
            .finish()
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Credentials {
    #[serde(default)]
    id: Option<String>,
    #[serde(default, alias = "useTls")]
    https: bool,
    #[serde(alias = "host")]
    server: String,
    #[serde(default)]
    port: Option<u16>,
    #[serde(default)]
    path_prefix: Option<String>,
    namespace: String,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    password: Option<String>,
    #[serde(default, alias = "showSystemObjects")]
    show_system: bool,
    #[serde(default)]
    result_set_row_limit: Option<usize>,
}

/// Collects options and opens connections.
#[derive(Debug, Default)]
pub struct Database {
    id: Option<String>,
    use_tls: bool,
    host: Option<String>,
    port: Option<u16>,
    path_prefix: Option<String>,
    namespace: Option<String>,
    username: Option<String>,
    password: Option<String>,
    show_system_objects: bool,
    result_set_row_limit: Option<usize>,

    http_config: HttpClientConfig,
    log_config: LogConfig,
}

impl Database {
    /// Creates a new Database instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds all connection options from a [`ConnectionConfig`].
    pub fn from_config(config: ConnectionConfig) -> Self {
        Self {
            id: config.id,
            use_tls: config.use_tls,
            host: Some(config.host),
            port: Some(config.port),
            path_prefix: config.path_prefix,
            namespace: Some(config.namespace),
            username: config.username,
            password: config.password,
            show_system_objects: config.show_system_objects,
            result_set_row_limit: config.result_set_row_limit,
            ..Self::default()
        }
    }

    pub fn from_credentials(credentials: Value) -> Result<Self> {
        Ok(Self::from_config(ConnectionConfig::from_credentials(credentials)?))
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    pub fn with_http_config(mut self, http_config: HttpClientConfig) -> Self {
        self.http_config = http_config;
        self
    }

    /// Returns the configured host.
    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    /// Returns the configured namespace as given.
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn http_config(&self) -> &HttpClientConfig {
        &self.http_config
    }

    /// Parse a boolean option value.
    fn parse_bool_option(value: &str) -> Option<bool> {
        match value.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" => Some(true),
            "false" | "0" | "no" => Some(false),
            _ => None,
        }
    }

    fn parse_int_option<T: std::str::FromStr>(value: &str) -> Option<T> {
        value.trim().parse().ok()
    }

    fn invalid_value(key: &str, value: &str) -> Error {
        Error::invalid_config(format!("invalid value '{}' for option '{}'", value, key))
    }

    /// Sets one option by key.
    pub fn set_option(&mut self, key: &str, value: &str) -> Result<()> {
        let invalid = || Self::invalid_value(key, value);
        match key {
            "iris.host" => self.host = Some(value.to_string()),
            "iris.port" => self.port = Some(Self::parse_int_option(value).ok_or_else(invalid)?),
            "iris.https" => self.use_tls = Self::parse_bool_option(value).ok_or_else(invalid)?,
            "iris.path_prefix" => self.path_prefix = Some(value.to_string()),
            "iris.namespace" => self.namespace = Some(value.to_string()),
            "iris.username" => self.username = Some(value.to_string()),
            "iris.password" => self.password = Some(value.to_string()),
            "iris.connection_id" => self.id = Some(value.to_string()),
            "iris.show_system_objects" => {
                self.show_system_objects = Self::parse_bool_option(value).ok_or_else(invalid)?
            }
            "iris.result_set_row_limit" => {
                self.result_set_row_limit =
                    Some(Self::parse_int_option(value).ok_or_else(invalid)?)
            }
            "iris.log_level" => self.log_config.level = Some(value.to_string()),
            "iris.log_file" => self.log_config.file = Some(value.to_string()),
            "iris.http.connect_timeout_ms" => {
                let ms: u64 = Self::parse_int_option(value).ok_or_else(invalid)?;
                self.http_config.connect_timeout = Duration::from_millis(ms);
            }
            "iris.http.read_timeout_ms" => {
                let ms: u64 = Self::parse_int_option(value).ok_or_else(invalid)?;
                self.http_config.read_timeout = (ms > 0).then(|| Duration::from_millis(ms));
            }
            "iris.http.max_connections" => {
                self.http_config.max_connections_per_host =
                    Self::parse_int_option(value).ok_or_else(invalid)?
            }
            _ => return Err(Error::invalid_config(format!("unknown option '{}'", key))),
        }
        Ok(())
    }

    /// Reads one option back as a string. Passwords are write-only.
    pub fn get_option(&self, key: &str) -> Result<String> {
        let unset = || Error::invalid_config(format!("option '{}' is not set", key));
        match key {
            "iris.host" => self.host.clone().ok_or_else(unset),
            "iris.port" => Ok(self.port.unwrap_or(DEFAULT_PORT).to_string()),
            "iris.https" => Ok(self.use_tls.to_string()),
            "iris.path_prefix" => self.path_prefix.clone().ok_or_else(unset),
            "iris.namespace" => self.namespace.clone().ok_or_else(unset),
            "iris.username" => self.username.clone().ok_or_else(unset),
            "iris.connection_id" => self.id.clone().ok_or_else(unset),
            "iris.show_system_objects" => Ok(self.show_system_objects.to_string()),
            "iris.result_set_row_limit" => self
                .result_set_row_limit
                .map(|l| l.to_string())
                .ok_or_else(unset),
            "iris.log_level" => self.log_config.level.clone().ok_or_else(unset),
            "iris.log_file" => self.log_config.file.clone().ok_or_else(unset),
            _ => Err(Error::invalid_config(format!("unknown option '{}'", key))),
        }
    }

    /// Validates the options into a [`ConnectionConfig`].
    pub fn connection_config(&self) -> Result<ConnectionConfig> {
        let host = self
            .host
            .as_deref()
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .ok_or_else(|| Error::invalid_config("option 'iris.host' is required"))?;
        let namespace = self
            .namespace
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .ok_or_else(|| Error::invalid_config("option 'iris.namespace' is required"))?;

        let mut config = ConnectionConfig::new(host, self.port.unwrap_or(DEFAULT_PORT), namespace)
            .with_tls(self.use_tls)
            .with_show_system_objects(self.show_system_objects);
        config.id = self.id.clone();
        config.path_prefix = self.path_prefix.clone();
        config.username = self.username.clone().filter(|u| !u.is_empty());
        config.password = self.password.clone();
        config.result_set_row_limit = self.result_set_row_limit;
        Ok(config)
    }

    /// Opens a connection over HTTP.
    pub async fn connect(&self) -> Result<Connection> {
        init_logging(&self.log_config);
        let config = self.connection_config()?;
        let transport = AtelierHttpClient::new(self.http_config.clone(), config.auth_provider())?;
        self.connect_with_transport(Arc::new(transport)).await
    }

    /// Opens a connection over the given transport.
    pub async fn connect_with_transport(
        &self,
        transport: Arc<dyn AtelierTransport>,
    ) -> Result<Connection> {
        let config = self.connection_config()?;
        debug!(
            "Opening {}:{} namespace {}",
            config.host(),
            config.port(),
            config.namespace()
        );
        let client = Arc::new(AtelierClient::new(transport, config));
        let server_info = client.open().await?;
        Ok(Connection::new(client, server_info))
    }

    /// Opens a connection, runs `SELECT 1` and closes it again.
    pub async fn test_connection(&self) -> Result<()> {
        let connection = self.connect().await?;
        let result = connection.test_connection().await;
        connection.close();
        result
    }
}
