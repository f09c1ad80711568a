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


//! Statement splitting and execution.

use crate::client::AtelierClient;
use crate::error::Result;
use crate::result::ResultSet;
use std::sync::Arc;
use tracing::debug;

/// Splits a batch into statements.
///
/// A statement ends at a `;` followed by whitespace or the end of the text.
/// Semicolons inside quoted literals, quoted identifiers and comments never
/// split, and quotes inside comments are not literals. Fragments that are
/// empty after trimming are dropped.
pub fn split_statements(text: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut scan = Scan::Code;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match scan {
            Scan::Quoted(q) if c == q => scan = Scan::Code,
            Scan::LineComment if c == '\n' => scan = Scan::Code,
            Scan::BlockComment if c == '*' && chars.peek() == Some(&'/') => {
                current.push(c);
                current.extend(chars.next());
                scan = Scan::Code;
                continue;
            }
            Scan::Quoted(_) | Scan::LineComment | Scan::BlockComment => {}
            Scan::Code => match c {
                '\'' | '"' => scan = Scan::Quoted(c),
                '-' if chars.peek() == Some(&'-') => scan = Scan::LineComment,
                '/' if chars.peek() == Some(&'*') => {
                    current.push(c);
                    current.extend(chars.next());
                    scan = Scan::BlockComment;
                    continue;
                }
                ';' if chars.peek().map_or(true, |next| next.is_whitespace()) => {
                    push_statement(&mut statements, &current);
                    current.clear();
                    continue;
                }
                _ => {}
            },
        }
        current.push(c);
    }
    push_statement(&mut statements, &current);
    statements
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scan {
    Code,
    Quoted(char),
    LineComment,
    BlockComment,
}

fn push_statement(statements: &mut Vec<String>, fragment: &str) {
    let trimmed = fragment.trim();
    if !trimmed.is_empty() {
        statements.push(trimmed.to_string());
    }
}

/// One SQL statement bound to a session.
#[derive(Debug, Clone)]
pub struct Statement {
    client: Arc<AtelierClient>,
    query: String,
}

impl Statement {
    pub(crate) fn new(client: Arc<AtelierClient>, query: impl Into<String>) -> Self {
        Self {
            client,
            query: query.into(),
        }
    }

    /// Returns the SQL text.
    pub fn sql_query(&self) -> &str {
        &self.query
    }

    /// Runs the statement without bound parameters.
    pub async fn execute(&self, request_id: Option<String>) -> Result<ResultSet> {
        let rows = self.client.query(&self.query, &[]).await?;
        debug!("Statement returned {} row(s)", rows.len());
        Ok(ResultSet::new(
            self.query.clone(),
            rows,
            request_id,
            self.client.config().id().map(str::to_string),
        ))
    }
}
