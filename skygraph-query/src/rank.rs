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

//! Type-aware mixing of retrieval hits.
//!
//! The top-k hits from the vector index get partitioned by content type and
//! recombined under per-bucket quotas. A question leans on FAQ material; a
//! general query leans on documentation. Similarity order inside each bucket
//! is never disturbed.

use once_cell::sync::Lazy;
use regex::Regex;
use skygraph_core::artifact::ContentType;
use skygraph_index::RetrievedChunk;

/// Default retrieval depth before mixing.
pub const DEFAULT_TOP_K: usize = 6;

static WH_WORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(what|how|why|when|where|which|who)\b")
        .unwrap_or_else(|e| panic!("invalid wh-word pattern: {e}"))
});

/// Coarse query classification driving the bucket quotas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryIntent {
    Question,
    General,
}

/// A query is a question when it carries a question mark or a WH-word.
pub fn detect_intent(query: &str) -> QueryIntent {
    if query.contains('?') || WH_WORD.is_match(query) {
        QueryIntent::Question
    } else {
        QueryIntent::General
    }
}

fn take_bucket(
    hits: &[RetrievedChunk],
    quota: usize,
    pred: impl Fn(ContentType) -> bool,
) -> Vec<RetrievedChunk> {
    hits.iter()
        .filter(|c| pred(c.content_type))
        .take(quota)
        .cloned()
        .collect()
}

/// Recombine `hits` under the intent's quotas.
///
/// `hits` must already be in similarity order; the output concatenates the
/// buckets without reordering inside any of them. An empty input stays an
/// empty output.
pub fn mix_by_intent(hits: &[RetrievedChunk], intent: QueryIntent) -> Vec<RetrievedChunk> {
    let mut mixed = Vec::new();
    match intent {
        QueryIntent::Question => {
            mixed.extend(take_bucket(hits, 2, |t| t.is_faq()));
            mixed.extend(take_bucket(hits, 2, |t| t.is_structured()));
            mixed.extend(take_bucket(hits, 2, |t| t == ContentType::RawData));
            mixed.extend(take_bucket(hits, 2, |t| t == ContentType::Document));
        }
        QueryIntent::General => {
            mixed.extend(take_bucket(hits, 3, |t| t == ContentType::Document));
            mixed.extend(take_bucket(hits, 2, |t| t.is_structured()));
            mixed.extend(take_bucket(hits, 1, |t| t == ContentType::RawData));
            mixed.extend(take_bucket(hits, 1, |t| t.is_faq()));
        }
    }
    mixed
}
