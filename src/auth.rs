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


//! Authentication providers for the Atelier REST API.
//!
//! IRIS web applications accept HTTP Basic credentials on every call; the
//! session cookie obtained by the first probe request is sent alongside.

use crate::error::Result;
use base64::{engine::general_purpose::STANDARD, Engine};
use std::fmt;

/// Produces the `Authorization` header value for outgoing requests.
pub trait AuthProvider: Send + Sync + fmt::Debug {
    fn get_auth_header(&self) -> Result<String>;
}

/// HTTP Basic authentication with a username and password.
#[derive(Clone)]
pub struct BasicAuth {
    username: String,
    password: String,
}

impl BasicAuth {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }
}

// Keep the password out of debug output.
impl fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicAuth")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl AuthProvider for BasicAuth {
    fn get_auth_header(&self) -> Result<String> {
        let credentials = format!("{}:{}", self.username, self.password);
        Ok(format!("Basic {}", STANDARD.encode(credentials)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_auth_header() {
        let auth = BasicAuth::new("_SYSTEM", "SYS");
        assert_eq!(auth.get_auth_header().unwrap(), "Basic X1NZU1RFTTpTWVM=");
    }

    #[test]
    fn test_basic_auth_empty_password() {
        let auth = BasicAuth::new("user", "");
        assert_eq!(auth.get_auth_header().unwrap(), "Basic dXNlcjo=");
    }

    #[test]
    fn test_debug_redacts_password() {
        let auth = BasicAuth::new("admin", "secret");
        let debug = format!("{:?}", auth);
        assert!(debug.contains("admin"));
        assert!(!debug.contains("secret"));
    }
}
