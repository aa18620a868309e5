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

//! Upstream text artifacts and their index composition rules.
//!
//! Documents, FAQs, dataset pages and site pages arrive as JSON artifacts from
//! the external crawling/extraction stages. Each record type knows how to
//! compose itself into the text that gets embedded, together with a provenance
//! label and a content type used by the ranking heuristics.

use crate::sanitize::sanitize_text;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification tag attached to every indexed chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    /// Extracted document text.
    Document,
    /// FAQ with both question and answer.
    FaqComplete,
    /// FAQ question with no recorded answer.
    FaqQuestionOnly,
    /// Dataset product page.
    Dataset,
    /// Mission/site structure page.
    SitePage,
    /// Unstructured raw data block.
    RawData,
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ContentType::Document => "document",
            ContentType::FaqComplete => "faq_complete",
            ContentType::FaqQuestionOnly => "faq_question_only",
            ContentType::Dataset => "dataset",
            ContentType::SitePage => "site_page",
            ContentType::RawData => "raw_data",
        };
        f.write_str(s)
    }
}

impl ContentType {
    /// FAQ content, answered or not.
    pub fn is_faq(&self) -> bool {
        matches!(self, ContentType::FaqComplete | ContentType::FaqQuestionOnly)
    }

    /// Structured page content (dataset or site page).
    pub fn is_structured(&self) -> bool {
        matches!(self, ContentType::Dataset | ContentType::SitePage)
    }
}

/// One unit of text ready for chunking/embedding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexableText {
    /// Composed text to embed.
    pub text: String,
    /// Provenance label stored alongside the index position.
    pub source: String,
    /// Content classification for ranking.
    pub content_type: ContentType,
}

/// Extracted document text with its originating filename.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub filename: String,
    pub text: String,
}

impl DocumentRecord {
    /// Sanitized document body, or `None` when nothing survives sanitization.
    pub fn composed(&self) -> Option<IndexableText> {
        let text = sanitize_text(&self.text);
        if text.is_empty() {
            return None;
        }
        Some(IndexableText {
            text,
            source: sanitize_text(&self.filename),
            content_type: ContentType::Document,
        })
    }
}

/// A frequently asked question, possibly without a recorded answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaqRecord {
    pub question: String,
    #[serde(default)]
    pub answer: Option<String>,
}

impl FaqRecord {
    /// Compose the FAQ into indexable text.
    ///
    /// Answered FAQs become `Question: ...\nAnswer: ...`; unanswered ones are
    /// kept as explicit question-only entries so the generator can still see
    /// what users commonly ask.
    pub fn composed(&self) -> Option<IndexableText> {
        let question = sanitize_text(&self.question);
        if question.is_empty() {
            return None;
        }
        let answer = self
            .answer
            .as_deref()
            .map(sanitize_text)
            .filter(|a| !a.is_empty());

        let (text, content_type) = match answer {
            Some(answer) => (
                format!("Question: {question}\nAnswer: {answer}"),
                ContentType::FaqComplete,
            ),
            None => (
                format!(
                    "Frequently Asked Question: {question}\n\
                     [Note: no recorded answer; respond from available knowledge]"
                ),
                ContentType::FaqQuestionOnly,
            ),
        };

        Some(IndexableText {
            text,
            source: faq_source_label(&question),
            content_type,
        })
    }
}

fn faq_source_label(question: &str) -> String {
    let prefix: String = question.chars().take(50).collect();
    format!("FAQ: {prefix}...")
}

/// Crawled dataset product page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetRecord {
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub paragraphs: Vec<String>,
    #[serde(default)]
    pub tables: Vec<Vec<Vec<String>>>,
}

impl DatasetRecord {
    /// Title, paragraphs and flattened table rows joined into one block.
    pub fn composed(&self) -> Option<IndexableText> {
        let mut sections = Vec::new();

        let title = sanitize_text(&self.title);
        if !title.is_empty() {
            sections.push(title);
        }
        for p in &self.paragraphs {
            let p = sanitize_text(p);
            if !p.is_empty() {
                sections.push(p);
            }
        }
        for table in &self.tables {
            for row in table {
                let row = flatten_row(row);
                if !row.is_empty() {
                    sections.push(row);
                }
            }
        }

        if sections.is_empty() {
            return None;
        }
        Some(IndexableText {
            text: sections.join("\n"),
            source: sanitize_text(&self.url),
            content_type: ContentType::Dataset,
        })
    }
}

/// Crawled mission/site structure page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SitePageRecord {
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub metadata: Vec<(String, String)>,
    #[serde(default)]
    pub tables: Vec<Vec<Vec<String>>>,
    #[serde(default)]
    pub catalog_rows: Vec<Vec<String>>,
}

impl SitePageRecord {
    /// Title, `key: value` metadata, table rows and catalog rows joined into
    /// one block.
    pub fn composed(&self) -> Option<IndexableText> {
        let mut sections = Vec::new();

        let title = sanitize_text(&self.title);
        if !title.is_empty() {
            sections.push(title);
        }
        for (key, value) in &self.metadata {
            let key = sanitize_text(key);
            let value = sanitize_text(value);
            if !key.is_empty() && !value.is_empty() {
                sections.push(format!("{key}: {value}"));
            }
        }
        for table in &self.tables {
            for row in table {
                let row = flatten_row(row);
                if !row.is_empty() {
                    sections.push(row);
                }
            }
        }
        for row in &self.catalog_rows {
            let row = flatten_row(row);
            if !row.is_empty() {
                sections.push(row);
            }
        }

        if sections.is_empty() {
            return None;
        }
        Some(IndexableText {
            text: sections.join("\n"),
            source: sanitize_text(&self.url),
            content_type: ContentType::SitePage,
        })
    }
}

fn flatten_row(cells: &[String]) -> String {
    cells
        .iter()
        .map(|c| sanitize_text(c))
        .filter(|c| !c.is_empty())
        .collect::<Vec<_>>()
        .join(" | ")
}
