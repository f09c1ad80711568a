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


//! Atelier REST API wire types and envelope decoding.
//!
//! Every Atelier response is wrapped in the same envelope:
//!
//! ```json
//! { "status": { "errors": [], "summary": "" },
//!   "console": [],
//!   "result": { "status": "", "content": ..., "enc": false } }
//! ```

use crate::error::{Error, Result};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::debug;

/// Raw decoded server response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Envelope {
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: EnvelopeStatus,
    #[serde(default, deserialize_with = "null_as_default")]
    pub console: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub result: EnvelopeResult,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EnvelopeStatus {
    #[serde(default, deserialize_with = "null_as_default")]
    pub errors: Vec<Value>,
    #[serde(default)]
    pub summary: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EnvelopeResult {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub content: Value,
    /// Content is a list of base64 fragments.
    #[serde(default, deserialize_with = "null_as_default")]
    pub enc: bool,
}

/// Decoded `result.content`.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultContent {
    Json(Value),
    Binary(Vec<u8>),
}

impl ResultContent {
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ResultContent::Json(v) => Some(v),
            ResultContent::Binary(_) => None,
        }
    }

    pub fn into_json(self) -> Result<Value> {
        match self {
            ResultContent::Json(v) => Ok(v),
            ResultContent::Binary(_) => Err(Error::invalid_response(
                "expected JSON content, got binary payload",
            )),
        }
    }
}

impl Envelope {
    /// Parses an envelope from a response body.
    pub fn parse(body: &str) -> Result<Self> {
        if body.trim().is_empty() {
            return Err(Error::invalid_response("empty response body"));
        }
        serde_json::from_str(body)
            .map_err(|e| Error::invalid_response(format!("malformed envelope: {}", e)))
    }

    /// Concatenates and decodes base64 content when `result.enc` is set.
    ///
    /// Returns the raw bytes and clears `enc`; `content` becomes null.
    pub fn decode_content(&mut self) -> Result<Option<Vec<u8>>> {
        if !self.result.enc {
            return Ok(None);
        }

        let joined = match &self.result.content {
            Value::Array(fragments) => {
                let mut joined = String::new();
                for fragment in fragments {
                    let part = fragment.as_str().ok_or_else(|| {
                        Error::invalid_response("encoded content fragment is not a string")
                    })?;
                    joined.push_str(part);
                }
                joined
            }
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => {
                return Err(Error::invalid_response(format!(
                    "encoded content must be a list of strings, got {}",
                    other
                )))
            }
        };

        let bytes = STANDARD
            .decode(joined.as_bytes())
            .map_err(|e| Error::invalid_response(format!("invalid base64 content: {}", e)))?;
        self.result.enc = false;
        self.result.content = Value::Null;
        Ok(Some(bytes))
    }

    /// Converts server-reported failures into errors.
    ///
    /// `result.status` wins over `status.summary`.
    pub fn check_status(&self) -> Result<()> {
        if let Some(status) = self.result.status.as_deref().filter(|s| !s.is_empty()) {
            return Err(Error::Query(status.to_string()));
        }
        if let Some(summary) = self.status.summary.as_deref().filter(|s| !s.is_empty()) {
            return Err(Error::Server(summary.to_string()));
        }
        Ok(())
    }
}

/// Decodes a response body into its content.
///
/// Console lines are logged and otherwise ignored.
pub fn decode_envelope(body: &str) -> Result<ResultContent> {
    let mut envelope = Envelope::parse(body)?;
    let binary = envelope.decode_content()?;

    for line in &envelope.console {
        debug!("server console: {}", line);
    }

    envelope.check_status()?;

    Ok(match binary {
        Some(bytes) => ResultContent::Binary(bytes),
        None => ResultContent::Json(envelope.result.content),
    })
}

/// Content of the unversioned root request (`GET /api/atelier/`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerInfo {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub api: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub namespaces: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub features: Vec<Value>,
}

impl ServerInfo {
    /// Case-insensitive namespace lookup.
    pub fn has_namespace(&self, namespace: &str) -> bool {
        self.namespaces
            .iter()
            .any(|ns| ns.eq_ignore_ascii_case(namespace))
    }
}

/// Body of `POST v{N}/{namespace}/action/query`.
#[derive(Debug, Clone, Serialize)]
pub struct QueryRequest<'a> {
    pub query: &'a str,
    pub parameters: &'a [Value],
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    let opt: Option<T> = Option::deserialize(deserializer)?;
    Ok(opt.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_plain_content() {
        let body = json!({
            "status": {"errors": [], "summary": ""},
            "console": [],
            "result": {"content": [{"ID": 1}]}
        })
        .to_string();
        let content = decode_envelope(&body).unwrap();
        assert_eq!(content, ResultContent::Json(json!([{"ID": 1}])));
    }

    #[test]
    fn test_result_status_takes_precedence() {
        let body = json!({
            "status": {"errors": [], "summary": "ERROR #5001"},
            "result": {"status": "SQLCODE: -1", "content": []}
        })
        .to_string();
        match decode_envelope(&body) {
            Err(Error::Query(msg)) => assert_eq!(msg, "SQLCODE: -1"),
            other => panic!("expected query error, got {:?}", other),
        }
    }

    #[test]
    fn test_summary_is_server_error() {
        let body = json!({
            "status": {"errors": [{"error": "x"}], "summary": "ERROR #5001: failure"},
            "result": {"content": null}
        })
        .to_string();
        match decode_envelope(&body) {
            Err(Error::Server(msg)) => assert_eq!(msg, "ERROR #5001: failure"),
            other => panic!("expected server error, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_status_strings_are_success() {
        let body = json!({
            "status": {"summary": ""},
            "result": {"status": "", "content": {"api": 6}}
        })
        .to_string();
        assert!(decode_envelope(&body).is_ok());
    }

    #[test]
    fn test_encoded_content_is_concatenated_before_decoding() {
        let mut envelope = Envelope::parse(
            &json!({"result": {"enc": true, "content": ["AB", "CD"]}}).to_string(),
        )
        .unwrap();
        let bytes = envelope.decode_content().unwrap().unwrap();
        assert_eq!(bytes, STANDARD.decode("ABCD").unwrap());
        assert!(!envelope.result.enc);
        assert_eq!(envelope.result.content, Value::Null);
    }

    #[test]
    fn test_decode_envelope_returns_binary() {
        let encoded = STANDARD.encode("hello world");
        let (a, b) = encoded.split_at(4);
        let body = json!({"result": {"enc": true, "content": [a, b]}}).to_string();
        assert_eq!(
            decode_envelope(&body).unwrap(),
            ResultContent::Binary(b"hello world".to_vec())
        );
    }

    #[test]
    fn test_invalid_base64_is_rejected() {
        let body = json!({"result": {"enc": true, "content": ["!!!"]}}).to_string();
        assert!(matches!(
            decode_envelope(&body),
            Err(Error::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_console_does_not_affect_result() {
        let body = json!({
            "console": ["Compiling class Foo", "ERROR in line 1"],
            "result": {"content": []}
        })
        .to_string();
        assert_eq!(decode_envelope(&body).unwrap(), ResultContent::Json(json!([])));
    }

    #[test]
    fn test_null_sections_default() {
        let body = r#"{"status": null, "console": null, "result": {"content": 1, "enc": null}}"#;
        assert_eq!(decode_envelope(body).unwrap(), ResultContent::Json(json!(1)));
    }

    #[test]
    fn test_malformed_body() {
        assert!(matches!(
            decode_envelope("<html>login</html>"),
            Err(Error::InvalidResponse(_))
        ));
        assert!(matches!(decode_envelope(""), Err(Error::InvalidResponse(_))));
    }

    #[test]
    fn test_server_info_namespaces() {
        let info: ServerInfo = serde_json::from_value(json!({
            "version": "IRIS for UNIX 2024.1",
            "id": "abc",
            "api": 8,
            "features": [],
            "namespaces": ["%SYS", "USER"]
        }))
        .unwrap();
        assert_eq!(info.api, 8);
        assert!(info.has_namespace("user"));
        assert!(!info.has_namespace("SAMPLES"));
    }

    #[test]
    fn test_query_request_body() {
        let body = serde_json::to_value(QueryRequest {
            query: "SELECT 1",
            parameters: &[],
        })
        .unwrap();
        assert_eq!(body, json!({"query": "SELECT 1", "parameters": []}));
    }
}
