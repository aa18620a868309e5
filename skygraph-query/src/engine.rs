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

//! Query engine facade.
//!
//! Owns the loaded graph, the corpus index and the embedder, and runs the
//! resolve, traverse, rank, assemble pipeline per query. A missing artifact
//! degrades the pipeline to its placeholders; a malformed one fails `open`.
//! The persisted artifacts are replaced atomically by the build side, so
//! several engines may read the same directory concurrently.

use crate::assemble::{AssemblerConfig, ContextAssembler, ContextDocument, HistoryTurn};
use crate::rank::{detect_intent, mix_by_intent, DEFAULT_TOP_K};
use crate::resolve::{EntityResolver, ResolverConfig};
use crate::traverse::{traverse, TraversalConfig, Triple};
use moka::sync::Cache;
use skygraph_core::graph::{GraphNode, KnowledgeGraph};
use skygraph_core::sanitize_text;
use skygraph_index::{
    load_graph, load_index, CorpusIndex, Embedder, EmbeddingError, RetrievedChunk, StoreError,
    VectorError,
};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Errors on the query path. Missing artifacts are not errors here; the
/// pipeline renders placeholders for them instead.
#[derive(Error, Debug)]
pub enum QueryError {
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    #[error(transparent)]
    Search(#[from] VectorError),

    #[error("generation failed: {0}")]
    Generation(String),
}

/// External model boundary. The engine only needs a completion per prompt.
pub trait GenerationService {
    fn complete(&self, prompt: &str) -> Result<String, QueryError>;
}

/// Where the persisted artifacts live.
#[derive(Debug, Clone)]
pub struct EnginePaths {
    pub graph: PathBuf,
    pub index_dir: PathBuf,
}

impl EnginePaths {
    /// Conventional layout under a data directory.
    pub fn under(data_dir: &std::path::Path) -> Self {
        Self {
            graph: data_dir.join("knowledge_graph_normalized.json"),
            index_dir: data_dir.join("vector_index"),
        }
    }
}

/// Engine tuning, one knob set per pipeline stage.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub resolver: ResolverConfig,
    pub traversal: TraversalConfig,
    pub assembler: AssemblerConfig,
    pub top_k: usize,
    pub embedding_cache_capacity: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            resolver: ResolverConfig::default(),
            traversal: TraversalConfig::default(),
            assembler: AssemblerConfig::default(),
            top_k: DEFAULT_TOP_K,
            embedding_cache_capacity: 256,
        }
    }
}

pub struct QueryEngine {
    graph: Option<KnowledgeGraph>,
    resolver: Option<EntityResolver>,
    index: Option<CorpusIndex>,
    embedder: Arc<dyn Embedder>,
    assembler: ContextAssembler,
    embedding_cache: Cache<String, Arc<Vec<f32>>>,
    config: EngineConfig,
}

impl QueryEngine {
    /// Load artifacts and wire the pipeline.
    ///
    /// A missing graph or index is remembered as unavailable and logged; a
    /// present but malformed one, or an index built by a different embedder,
    /// fails the open.
    pub fn open(
        paths: &EnginePaths,
        embedder: Arc<dyn Embedder>,
        config: EngineConfig,
    ) -> Result<Self, StoreError> {
        let graph = match load_graph(&paths.graph) {
            Ok(g) => {
                info!(nodes = g.nodes.len(), edges = g.edges.len(), "graph loaded");
                Some(g)
            }
            Err(StoreError::NotFound(path)) => {
                warn!(path = %path.display(), "graph artifact missing, continuing without it");
                None
            }
            Err(e) => return Err(e),
        };

        let index = match load_index(&paths.index_dir) {
            Ok(idx) => {
                if idx.embedder_id() != embedder.id() {
                    return Err(StoreError::Corrupt(format!(
                        "index was built with embedder {} but the engine uses {}",
                        idx.embedder_id(),
                        embedder.id()
                    )));
                }
                info!(chunks = idx.len(), "corpus index loaded");
                Some(idx)
            }
            Err(StoreError::NotFound(path)) => {
                warn!(path = %path.display(), "index artifact missing, continuing without it");
                None
            }
            Err(e) => return Err(e),
        };

        let resolver = graph
            .as_ref()
            .map(|g| EntityResolver::new(g, embedder.clone(), config.resolver.clone()));
        let assembler = ContextAssembler::new(config.assembler.clone());
        let embedding_cache = Cache::new(config.embedding_cache_capacity);

        Ok(Self {
            graph,
            resolver,
            index,
            embedder,
            assembler,
            embedding_cache,
            config,
        })
    }

    pub fn has_graph(&self) -> bool {
        self.graph.is_some()
    }

    pub fn has_index(&self) -> bool {
        self.index.is_some()
    }

    /// Query embedding, memoized on the sanitized lowercase text.
    fn query_embedding(&self, query: &str) -> Result<Arc<Vec<f32>>, QueryError> {
        let key = sanitize_text(query).to_lowercase();
        if let Some(cached) = self.embedding_cache.get(&key) {
            return Ok(cached);
        }
        let vector = Arc::new(self.embedder.embed(&key)?);
        self.embedding_cache.insert(key, vector.clone());
        Ok(vector)
    }

    fn graph_side(&self, query: &str) -> (Option<&GraphNode>, Vec<Triple>) {
        let (Some(graph), Some(resolver)) = (self.graph.as_ref(), self.resolver.as_ref()) else {
            return (None, Vec::new());
        };
        let entities = resolver.resolve(query);
        let focus = entities.first().and_then(|id| graph.node(id));
        let triples = traverse(graph, &entities, &self.config.traversal);
        (focus, triples)
    }

    fn vector_side(&self, query: &str) -> Result<Vec<RetrievedChunk>, QueryError> {
        let Some(index) = self.index.as_ref() else {
            return Ok(Vec::new());
        };
        let vector = self.query_embedding(query)?;
        let hits = index.search(&vector, self.config.top_k)?;
        Ok(mix_by_intent(&hits, detect_intent(query)))
    }

    /// Run the full pipeline and return the assembled prompt.
    pub fn assemble_context(
        &self,
        query: &str,
        history: &[HistoryTurn],
    ) -> Result<ContextDocument, QueryError> {
        let (focus, triples) = self.graph_side(query);
        let chunks = self.vector_side(query)?;
        let doc = self
            .assembler
            .assemble(query, history, focus, &triples, &chunks);
        info!(
            query,
            focus = doc.focus_entity.as_deref().unwrap_or("-"),
            triples = doc.triple_count,
            chunks = doc.chunk_count,
            "context assembled"
        );
        Ok(doc)
    }

    /// Assemble, complete, and record the exchange in `history`.
    pub fn answer<G: GenerationService>(
        &self,
        service: &G,
        query: &str,
        history: &mut Vec<HistoryTurn>,
    ) -> Result<String, QueryError> {
        let doc = self.assemble_context(query, history)?;
        let reply = service.complete(&doc.prompt)?;
        history.push(HistoryTurn {
            user: query.to_string(),
            assistant: reply.clone(),
        });
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skygraph_index::HashEmbedder;
    use tempfile::TempDir;

    fn open_empty(dir: &TempDir) -> QueryEngine {
        QueryEngine::open(
            &EnginePaths::under(dir.path()),
            Arc::new(HashEmbedder::new(32)),
            EngineConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn opens_without_any_artifacts() {
        let dir = TempDir::new().unwrap();
        let engine = open_empty(&dir);
        assert!(!engine.has_graph());
        assert!(!engine.has_index());
    }

    #[test]
    fn degraded_engine_still_assembles_placeholders() {
        let dir = TempDir::new().unwrap();
        let engine = open_empty(&dir);
        let doc = engine.assemble_context("what is INSAT-3D?", &[]).unwrap();
        assert!(doc.prompt.contains("No graph relationships found."));
        assert!(doc.prompt.contains("No relevant knowledge base content found."));
        assert_eq!(doc.focus_entity, None);
    }

    #[test]
    fn malformed_graph_fails_open() {
        let dir = TempDir::new().unwrap();
        let paths = EnginePaths::under(dir.path());
        std::fs::write(&paths.graph, b"not json").unwrap();

        let result = QueryEngine::open(
            &paths,
            Arc::new(HashEmbedder::new(32)),
            EngineConfig::default(),
        );
        assert!(matches!(result, Err(StoreError::Corrupt(_))));
    }

    #[test]
    fn answer_pushes_history() {
        struct Echo;
        impl GenerationService for Echo {
            fn complete(&self, _prompt: &str) -> Result<String, QueryError> {
                Ok("echo".to_string())
            }
        }

        let dir = TempDir::new().unwrap();
        let engine = open_empty(&dir);
        let mut history = Vec::new();
        let reply = engine.answer(&Echo, "hello", &mut history).unwrap();
        assert_eq!(reply, "echo");
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].user, "hello");
        assert_eq!(history[0].assistant, "echo");
    }

    #[test]
    fn generation_failure_leaves_history_untouched() {
        struct Broken;
        impl GenerationService for Broken {
            fn complete(&self, _prompt: &str) -> Result<String, QueryError> {
                Err(QueryError::Generation("upstream unavailable".to_string()))
            }
        }

        let dir = TempDir::new().unwrap();
        let engine = open_empty(&dir);
        let mut history = Vec::new();
        assert!(engine.answer(&Broken, "hello", &mut history).is_err());
        assert!(history.is_empty());
    }
}
