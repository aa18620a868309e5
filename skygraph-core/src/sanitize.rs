// Copyright 2025 Skygraph Contributors
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

//! Text sanitization for graph identities and indexed text.

/// Sanitize arbitrary text into a safe, whitespace-normalized string.
///
/// Strips control characters (including DEL) before collapsing whitespace,
/// so a tab or newline is removed outright rather than collapsed to a space.
/// Remaining runs of whitespace collapse to a single space and the ends are
/// trimmed. The result is suitable as a graph node identity or as indexed
/// chunk text. Idempotent: sanitizing sanitized text returns it unchanged.
pub fn sanitize_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;

    for c in text.chars() {
        if c.is_control() {
            continue;
        }
        if c.is_whitespace() {
            pending_space = !out.is_empty();
            continue;
        }
        if pending_space {
            out.push(' ');
            pending_space = false;
        }
        out.push(c);
    }

    out
}
