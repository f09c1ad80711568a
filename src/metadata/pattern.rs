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


//! Wildcard-glob matching for explorer search.
//!
//! `*` matches any sequence of characters (including empty) and `?` matches
//! exactly one. Matching ignores ASCII and Unicode case.

/// Match `text` against a glob `pattern`, case-insensitively.
///
/// Runs in `O(pattern * text)`: only the most recent `*` is ever retried.
pub fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().flat_map(char::to_lowercase).collect();
    let text: Vec<char> = text.chars().flat_map(char::to_lowercase).collect();

    let (mut pi, mut ti) = (0, 0);
    // Pattern index after the last `*` and the text index it is anchored at.
    let mut star: Option<(usize, usize)> = None;

    while ti < text.len() {
        match pattern.get(pi).copied() {
            Some('*') => {
                pi += 1;
                star = Some((pi, ti));
            }
            Some(ch) if ch == '?' || ch == text[ti] => {
                pi += 1;
                ti += 1;
            }
            _ => match star {
                Some((star_pi, star_ti)) => {
                    pi = star_pi;
                    ti = star_ti + 1;
                    star = Some((star_pi, ti));
                }
                None => return false,
            },
        }
    }
    pattern[pi..].iter().all(|&ch| ch == '*')
}

/// Prefix glob for a search term: `<search>*`.
pub fn prefix_glob(search: &str) -> String {
    format!("{}*", search)
}
