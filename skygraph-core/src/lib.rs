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

//! Skygraph Core
//!
//! Shared types for the hybrid retrieval engine: the knowledge graph data
//! model, upstream artifact records and their text composition rules, the
//! text sanitizer and the chunker.

pub mod artifact;
pub mod chunker;
pub mod graph;
pub mod sanitize;

pub use artifact::{
    ContentType, DatasetRecord, DocumentRecord, FaqRecord, IndexableText, SitePageRecord,
};
pub use chunker::{ChunkerError, TextChunker};
pub use graph::{EntityRecord, GraphEdge, GraphNode, KnowledgeGraph, CO_OCCURS_WITH};
pub use sanitize::sanitize_text;
