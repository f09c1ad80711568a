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


//! Schema explorer for the host's object tree.
//!
//! ## Module Structure
//!
//! - `types`: explorer node model
//! - `sql`: SQL command builder over `%SQL_MANAGER` and `INFORMATION_SCHEMA`
//! - `parse`: row decoding and normalization across API versions
//! - `pattern`: wildcard-glob matching for search
//! - `service`: navigation, search and record browsing

pub mod parse;
pub mod pattern;
pub mod service;
pub mod sql;
pub mod types;

pub use service::{MetadataService, SearchKind, SearchParams};
pub use sql::{MetadataQuery, RowShape, SqlCommandBuilder};
pub use types::{ColumnDetails, ColumnIcon, ExplorerNode, NodeDetails, NodeKind, ObjectKind};
