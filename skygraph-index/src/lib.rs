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

//! Skygraph Index Layer
//!
//! Offline build side of the engine: the co-occurrence knowledge graph
//! builder and normalizer, the embedding abstraction, the exact-scan vector
//! index with its position-aligned side arrays, and atomic persistence for
//! both artifacts.
//!
//! Both the graph and the vector index are rebuilt wholesale from upstream
//! artifacts and swapped into place with a write-then-rename, so a concurrent
//! query process never observes a partial write.

pub mod corpus;
pub mod embedding;
pub mod graph;
pub mod store;
pub mod vector;

pub use corpus::{CorpusBuildError, CorpusIndex, CorpusIndexBuilder, RetrievedChunk};
pub use embedding::{cosine_similarity, Embedder, EmbeddingError, HashEmbedder};
pub use graph::{normalize_graph, GraphBuilder, GraphConfig};
pub use store::{load_graph, load_index, save_graph, save_index, StoreError};
pub use vector::{FlatIndex, VectorError};
