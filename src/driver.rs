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

//! Driver entry point.

use crate::database::Database;
use crate::Result;
use serde_json::Value;

/// The main entry point for the IRIS driver.
///
/// The Driver creates Database instances, which hold configuration and
/// open Connections.
#[derive(Debug, Default)]
pub struct Driver {}

impl Driver {
    /// Creates a new Driver instance.
    pub fn new() -> Self {
        Self {}
    }

    /// Creates an unconfigured Database.
    pub fn new_database(&self) -> Result<Database> {
        Ok(Database::new())
    }

    /// Creates a Database from the host's credential JSON.
    pub fn new_database_from_credentials(&self, credentials: Value) -> Result<Database> {
        Database::from_credentials(credentials)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn test_driver_new() {
        let driver = Driver::new();
        assert!(driver.new_database().is_ok());
    }

    #[test]
    fn test_driver_database_from_credentials() {
        let database = Driver::new()
            .new_database_from_credentials(json!({"server": "localhost", "namespace": "user"}))
            .unwrap();
        assert_eq!(database.get_option("iris.namespace").unwrap(), "USER");

        assert!(Driver::new()
            .new_database_from_credentials(json!({"server": "localhost"}))
            .is_err());
    }
}
