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

//! InterSystems IRIS driver over the Atelier REST API
//!
//! This crate talks to an IRIS server's `/api/atelier/` endpoints: it keeps
//! a cookie-authenticated session, negotiates the API version, runs SQL
//! through `action/query` and resolves the schema explorer tree.
//!
//! ## Overview
//!
//! - [`Driver`] - Entry point for creating databases
//! - [`Database`] - Holds connection configuration
//! - [`Connection`] - Open session against one namespace
//! - [`Statement`] - One SQL statement
//!
//! ## Example
//!
//! ```ignore
//! use iris_sqltools::{Driver, QueryOptions};
//!
//! let mut database = Driver::new().new_database()?;
//! database.set_option("iris.host", "localhost")?;
//! database.set_option("iris.namespace", "USER")?;
//! database.set_option("iris.username", "_SYSTEM")?;
//! database.set_option("iris.password", "SYS")?;
//!
//! let connection = database.connect().await?;
//! let results = connection
//!     .execute("SELECT 1; SELECT TOP 5 * FROM Sample.Person;", &QueryOptions::default())
//!     .await?;
//! let tree = connection.get_children(&connection.root_node()).await;
//! ```
//!
//! ## Configuration Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `iris.host` | | Server host name |
//! | `iris.port` | 52773 | Web server port |
//! | `iris.https` | false | Use TLS |
//! | `iris.path_prefix` | | Prefix before `/api/atelier/` |
//! | `iris.namespace` | | Namespace (upper-cased) |
//! | `iris.username` / `iris.password` | | Basic credentials |
//! | `iris.show_system_objects` | false | List system schemas in the explorer |
//! | `iris.result_set_row_limit` | 50 | `TOP` used when browsing records |
//! | `iris.connection_id` | | Identifier echoed on result sets |
//! | `iris.log_level` / `iris.log_file` | | Logging filter and destination |
//! | `iris.http.connect_timeout_ms` | 30000 | TCP connect timeout |
//! | `iris.http.read_timeout_ms` | | Per-request timeout |
//! | `iris.http.max_connections` | 10 | Concurrent requests (open sockets) per host |

pub mod auth;
pub mod client;
pub mod completions;
pub mod connection;
pub mod database;
pub mod driver;
pub mod error;
pub mod logging;
pub mod metadata;
pub mod result;
pub mod statement;
pub mod types;

// Re-export main types
pub use connection::Connection;
pub use database::{ConnectionConfig, Database};
pub use driver::Driver;
pub use error::{Error, Result};
pub use result::{QueryOptions, ResultRow, ResultSet};
pub use statement::Statement;

// Re-export client types for advanced users
pub use client::{AtelierClient, AtelierHttpClient, AtelierTransport, HttpClientConfig};

pub use metadata::{ExplorerNode, NodeKind, SearchKind, SearchParams};
