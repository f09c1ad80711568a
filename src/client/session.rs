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


//! Session cookie jar and session state.

/// Ordered cookie jar holding at most one entry per cookie name.
///
/// Merging is last-write-wins per name: an existing cookie is replaced in
/// place, a new one is appended.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieJar {
    entries: Vec<(String, String)>,
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a jar from raw `set-cookie` header values.
    pub fn from_set_cookie<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut jar = Self::new();
        jar.merge_set_cookie(headers);
        jar
    }

    /// Merges raw `set-cookie` header values into the jar.
    pub fn merge_set_cookie<I, S>(&mut self, headers: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for header in headers {
            if let Some((name, value)) = parse_set_cookie(header.as_ref()) {
                self.insert(name, value);
            }
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// `Cookie` request header value, or `None` when the jar is empty.
    pub fn header_value(&self) -> Option<String> {
        if self.entries.is_empty() {
            return None;
        }
        Some(
            self.entries
                .iter()
                .map(|(n, v)| format!("{}={}", n, v))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}

/// Extracts `name=value` from a `set-cookie` header, dropping attributes.
fn parse_set_cookie(header: &str) -> Option<(String, String)> {
    let pair = header.split(';').next()?.trim();
    let (name, value) = pair.split_once('=')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some((name.to_string(), value.trim().to_string()))
}

/// Authentication state of one session.
///
/// `Authenticating` is held by the single caller performing the probe;
/// concurrent first callers wait on the client's auth gate and then observe
/// `Ready`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Uninitialized,
    Authenticating,
    Ready(CookieJar),
}

impl SessionState {
    /// Cookies of a ready session that has at least one cookie.
    pub fn cookies(&self) -> Option<&CookieJar> {
        match self {
            SessionState::Ready(jar) if !jar.is_empty() => Some(jar),
            _ => None,
        }
    }

    /// Merges response cookies. Ignored until the probe has produced a jar.
    pub fn merge_set_cookie(&mut self, headers: &[String]) {
        if let SessionState::Ready(jar) = self {
            jar.merge_set_cookie(headers);
        }
    }
}
