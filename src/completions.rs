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


//! Static keyword completions for the SQL editor.

use serde::Serialize;

/// Reserved words offered by the editor before any schema is known.
pub const KEYWORDS: &[&str] = &[
    "%ALPHAUP", "%EXACT", "%SQLSTRING", "%SQLUPPER", "%STRING", "%UPPER",
    "ADD", "ALL", "ALTER", "AND", "ANY", "AS", "ASC", "AVG", "BETWEEN", "BY",
    "CASE", "CAST", "CHECK", "COALESCE", "COLUMN", "COMMIT", "CONSTRAINT",
    "CONVERT", "COUNT", "CREATE", "CROSS", "CURRENT_DATE", "CURRENT_TIME",
    "CURRENT_TIMESTAMP", "DEFAULT", "DELETE", "DESC", "DISTINCT", "DROP",
    "ELSE", "END", "EXISTS", "FOREIGN", "FROM", "FULL", "GRANT", "GROUP",
    "HAVING", "IN", "INDEX", "INNER", "INSERT", "INTO", "IS", "JOIN", "KEY",
    "LEFT", "LIKE", "MAX", "MIN", "NOT", "NULL", "ON", "OR", "ORDER", "OUTER",
    "PRIMARY", "PROCEDURE", "REFERENCES", "REVOKE", "RIGHT", "ROLLBACK",
    "SELECT", "SET", "SOME", "SUM", "TABLE", "THEN", "TOP", "TRUNCATE",
    "UNION", "UNIQUE", "UPDATE", "VALUES", "VIEW", "WHEN", "WHERE", "WITH",
];

/// One completion entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionItem {
    pub label: String,
    pub kind: String,
    pub detail: String,
    pub sort_text: String,
}

impl CompletionItem {
    pub fn keyword(word: &str) -> Self {
        Self {
            label: word.to_string(),
            kind: "keyword".to_string(),
            detail: word.to_string(),
            sort_text: format!("3:{}", word),
        }
    }
}

/// Keyword completions in alphabetical order.
pub fn static_completions() -> Vec<CompletionItem> {
    KEYWORDS.iter().map(|w| CompletionItem::keyword(w)).collect()
}
