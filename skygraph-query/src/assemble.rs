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

//! Deterministic prompt assembly.
//!
//! Sections always render in the same order with explicit placeholders for
//! whatever is missing, so the downstream model sees a stable layout and a
//! prompt diff always means a data diff.

use crate::traverse::Triple;
use serde::Serialize;
use skygraph_core::graph::GraphNode;
use skygraph_index::RetrievedChunk;

const NO_TRIPLES: &str = "No graph relationships found.";
const NO_CHUNKS: &str = "No relevant knowledge base content found.";
const NO_HISTORY: &str = "This is the start of the conversation.";

const PREAMBLE: &str = "You are an assistant for a satellite data portal. \
Provide detailed, factually accurate and structured answers using the context below.

Guidelines:
- Answer from the technical documentation and graph facts provided
- Treat FAQs with answers as verified information
- For common user questions without recorded answers, answer from the available knowledge
- For satellite or product questions, describe capabilities, applications, instruments and data products
- If the context is incomplete, say so and answer with what is available";

const FAQ_GUIDANCE: &str = "Note: some of the frequently asked questions above have no \
recorded answer. Answer them from the technical documentation and graph facts.";

/// Assembly limits.
#[derive(Debug, Clone)]
pub struct AssemblerConfig {
    /// Per-excerpt cap for document, structured and raw chunks, in chars.
    pub max_excerpt_chars: usize,
    /// Conversation turns kept in the history section.
    pub max_history_turns: usize,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self {
            max_excerpt_chars: 1200,
            max_history_turns: 5,
        }
    }
}

/// One past exchange.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryTurn {
    pub user: String,
    pub assistant: String,
}

/// The assembled prompt plus bookkeeping for logging and the CLI.
#[derive(Debug, Clone, Serialize)]
pub struct ContextDocument {
    pub prompt: String,
    pub focus_entity: Option<String>,
    pub triple_count: usize,
    pub chunk_count: usize,
}

/// Truncate on a char boundary.
fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

pub struct ContextAssembler {
    config: AssemblerConfig,
}

impl ContextAssembler {
    pub fn new(config: AssemblerConfig) -> Self {
        Self { config }
    }

    /// Render the full prompt from the retrieval outputs.
    pub fn assemble(
        &self,
        query: &str,
        history: &[HistoryTurn],
        focus: Option<&GraphNode>,
        triples: &[Triple],
        chunks: &[RetrievedChunk],
    ) -> ContextDocument {
        let mut sections: Vec<String> = vec![PREAMBLE.to_string()];

        if let Some(node) = focus {
            sections.push(self.focus_section(node));
        }
        sections.push(self.triples_section(focus, triples));
        sections.push(self.knowledge_section(chunks));
        if chunks
            .iter()
            .any(|c| c.content_type == skygraph_core::artifact::ContentType::FaqQuestionOnly)
        {
            sections.push(FAQ_GUIDANCE.to_string());
        }
        sections.push(self.history_section(history));
        sections.push(format!("Current Question:\n{query}"));
        sections.push("Provide a comprehensive answer based on the context above.".to_string());

        ContextDocument {
            prompt: sections.join("\n\n"),
            focus_entity: focus.map(|n| n.label.clone()),
            triple_count: triples.len(),
            chunk_count: chunks.len(),
        }
    }

    fn focus_section(&self, node: &GraphNode) -> String {
        let mut lines = vec![format!("{} Information:", node.label)];
        if !node.types.is_empty() {
            let types: Vec<&str> = node.types.iter().map(String::as_str).collect();
            lines.push(format!("• source types: {}", types.join(", ")));
        }
        if !node.sources.is_empty() {
            let sources: Vec<&str> = node.sources.iter().map(String::as_str).collect();
            lines.push(format!("• sources: {}", sources.join(", ")));
        }
        for raw in &node.raw_data {
            lines.push(format!(
                "• {}",
                truncate_chars(raw, self.config.max_excerpt_chars)
            ));
        }
        lines.push(format!("• mentioned in {} sources", node.source_count));
        lines.join("\n")
    }

    fn triples_section(&self, focus: Option<&GraphNode>, triples: &[Triple]) -> String {
        if triples.is_empty() {
            return format!("Graph Facts:\n{NO_TRIPLES}");
        }
        let focus_id = focus.map(|n| n.id.as_str());
        let lines: Vec<String> = triples
            .iter()
            .map(|t| {
                let incoming = focus_id.is_some_and(|id| t.subject != id && t.object == id);
                if incoming {
                    format!("• {} <--{}-- {}", t.object, t.relationship, t.subject)
                } else {
                    format!("• {} --{}--> {}", t.subject, t.relationship, t.object)
                }
            })
            .collect();
        format!("Graph Facts:\n{}", lines.join("\n"))
    }

    fn knowledge_section(&self, chunks: &[RetrievedChunk]) -> String {
        use skygraph_core::artifact::ContentType;

        if chunks.is_empty() {
            return format!("Knowledge Base:\n{NO_CHUNKS}");
        }

        let mut parts = vec!["Knowledge Base:".to_string()];

        let answered: Vec<&RetrievedChunk> = chunks
            .iter()
            .filter(|c| c.content_type == ContentType::FaqComplete)
            .collect();
        if !answered.is_empty() {
            parts.push("Relevant FAQs with Answers:".to_string());
            for (i, faq) in answered.iter().enumerate() {
                parts.push(format!("FAQ {}:\n{}", i + 1, faq.text));
            }
        }

        let question_only: Vec<&RetrievedChunk> = chunks
            .iter()
            .filter(|c| c.content_type == ContentType::FaqQuestionOnly)
            .collect();
        if !question_only.is_empty() {
            parts.push("Common User Questions (answer from available knowledge):".to_string());
            for faq in &question_only {
                let question = faq
                    .text
                    .split("\n[Note:")
                    .next()
                    .unwrap_or(&faq.text)
                    .trim_start_matches("Frequently Asked Question: ");
                parts.push(format!("Users often ask: {question}"));
            }
        }

        self.push_excerpts(
            &mut parts,
            chunks,
            ContentType::Document,
            "Technical Documentation:",
            "Document",
        );
        let structured: Vec<&RetrievedChunk> = chunks
            .iter()
            .filter(|c| c.content_type.is_structured())
            .collect();
        if !structured.is_empty() {
            parts.push("Structured Pages:".to_string());
            for (i, chunk) in structured.iter().enumerate() {
                parts.push(format!(
                    "[Page {} - {}]\n{}",
                    i + 1,
                    chunk.source,
                    truncate_chars(&chunk.text, self.config.max_excerpt_chars)
                ));
            }
        }
        self.push_excerpts(
            &mut parts,
            chunks,
            ContentType::RawData,
            "Raw Data:",
            "Raw Data",
        );

        parts.join("\n\n")
    }

    fn push_excerpts(
        &self,
        parts: &mut Vec<String>,
        chunks: &[RetrievedChunk],
        content_type: skygraph_core::artifact::ContentType,
        heading: &str,
        label: &str,
    ) {
        let selected: Vec<&RetrievedChunk> = chunks
            .iter()
            .filter(|c| c.content_type == content_type)
            .collect();
        if selected.is_empty() {
            return;
        }
        parts.push(heading.to_string());
        for (i, chunk) in selected.iter().enumerate() {
            parts.push(format!(
                "[{} {} - {}]\n{}",
                label,
                i + 1,
                chunk.source,
                truncate_chars(&chunk.text, self.config.max_excerpt_chars)
            ));
        }
    }

    fn history_section(&self, history: &[HistoryTurn]) -> String {
        if history.is_empty() {
            return format!("Previous Conversation:\n{NO_HISTORY}");
        }
        let start = history.len().saturating_sub(self.config.max_history_turns);
        let turns: Vec<String> = history[start..]
            .iter()
            .map(|t| format!("User: {}\nAssistant: {}", t.user, t.assistant))
            .collect();
        format!("Previous Conversation:\n{}", turns.join("\n\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skygraph_core::artifact::ContentType;

    fn chunk(content_type: ContentType, text: &str, source: &str) -> RetrievedChunk {
        RetrievedChunk {
            position: 0,
            score: 0.5,
            text: text.to_string(),
            source: source.to_string(),
            content_type,
        }
    }

    fn assembler() -> ContextAssembler {
        ContextAssembler::new(AssemblerConfig::default())
    }

    #[test]
    fn empty_inputs_render_all_placeholders() {
        let doc = assembler().assemble("hello", &[], None, &[], &[]);
        assert!(doc.prompt.contains("No graph relationships found."));
        assert!(doc.prompt.contains("No relevant knowledge base content found."));
        assert!(doc.prompt.contains("This is the start of the conversation."));
        assert!(doc.prompt.ends_with("Provide a comprehensive answer based on the context above."));
        assert_eq!(doc.focus_entity, None);
        assert_eq!(doc.triple_count, 0);
        assert_eq!(doc.chunk_count, 0);
    }

    #[test]
    fn sections_appear_in_fixed_order() {
        let node = GraphNode::new("INSAT-3D");
        let triples = vec![Triple {
            subject: "INSAT-3D".into(),
            relationship: "co_occurs_with".into(),
            object: "Imager".into(),
        }];
        let chunks = vec![chunk(ContentType::Document, "imager details", "doc.pdf")];
        let history = vec![HistoryTurn {
            user: "hi".into(),
            assistant: "hello".into(),
        }];

        let doc = assembler().assemble("what is INSAT-3D?", &history, Some(&node), &triples, &chunks);
        let prompt = &doc.prompt;

        let order = [
            "INSAT-3D Information:",
            "Graph Facts:",
            "Knowledge Base:",
            "Previous Conversation:",
            "Current Question:",
        ];
        let mut last = 0;
        for marker in order {
            let idx = prompt.find(marker).unwrap_or_else(|| panic!("missing {marker}"));
            assert!(idx > last, "{marker} out of order");
            last = idx;
        }
    }

    #[test]
    fn outgoing_and_incoming_arrows() {
        let node = GraphNode::new("INSAT-3D");
        let triples = vec![
            Triple {
                subject: "INSAT-3D".into(),
                relationship: "co_occurs_with".into(),
                object: "Imager".into(),
            },
            Triple {
                subject: "Sounder".into(),
                relationship: "co_occurs_with".into(),
                object: "INSAT-3D".into(),
            },
        ];
        let doc = assembler().assemble("q", &[], Some(&node), &triples, &[]);
        assert!(doc.prompt.contains("• INSAT-3D --co_occurs_with--> Imager"));
        assert!(doc.prompt.contains("• INSAT-3D <--co_occurs_with-- Sounder"));
    }

    #[test]
    fn long_excerpts_truncate_on_char_boundary() {
        let text = "é".repeat(2000);
        let chunks = vec![chunk(ContentType::Document, &text, "doc.pdf")];
        let doc = assembler().assemble("q", &[], None, &[], &chunks);
        // 1200 chars of the excerpt survive, not 2000.
        let excerpt_chars = doc
            .prompt
            .matches('é')
            .count();
        assert_eq!(excerpt_chars, 1200);
    }

    #[test]
    fn history_trims_to_last_five_turns() {
        let history: Vec<HistoryTurn> = (0..8)
            .map(|i| HistoryTurn {
                user: format!("question {i}"),
                assistant: format!("answer {i}"),
            })
            .collect();
        let doc = assembler().assemble("q", &history, None, &[], &[]);
        assert!(!doc.prompt.contains("question 2"));
        assert!(doc.prompt.contains("question 3"));
        assert!(doc.prompt.contains("question 7"));
    }

    #[test]
    fn question_only_faq_adds_guidance_note() {
        let chunks = vec![chunk(
            ContentType::FaqQuestionOnly,
            "Frequently Asked Question: How to register?\n[Note: no recorded answer; respond from available knowledge]",
            "FAQ: How to register?...",
        )];
        let doc = assembler().assemble("q", &[], None, &[], &chunks);
        assert!(doc.prompt.contains("Users often ask: How to register?"));
        assert!(doc.prompt.contains("no recorded answer. Answer them"));
    }

    #[test]
    fn answered_faq_needs_no_guidance_note() {
        let chunks = vec![chunk(
            ContentType::FaqComplete,
            "Question: What is MOSDAC?\nAnswer: A data archive.",
            "FAQ: What is MOSDAC?...",
        )];
        let doc = assembler().assemble("q", &[], None, &[], &chunks);
        assert!(doc.prompt.contains("Relevant FAQs with Answers:"));
        assert!(!doc.prompt.contains("no recorded answer. Answer them"));
    }

    #[test]
    fn assembly_is_deterministic() {
        let chunks = vec![
            chunk(ContentType::Document, "alpha", "a.pdf"),
            chunk(ContentType::Dataset, "beta", "https://example.org/b"),
        ];
        let a = assembler().assemble("q", &[], None, &[], &chunks);
        let b = assembler().assemble("q", &[], None, &[], &chunks);
        assert_eq!(a.prompt, b.prompt);
    }
}
