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

//! The corpus index: a flat vector index plus three position-aligned side
//! arrays (chunk text, provenance label, content type).
//!
//! Position `i` in the vector index, `corpus[i]`, `sources[i]` and
//! `content_types[i]` all describe the same logical chunk. The constructor
//! refuses misaligned arrays so the invariant holds everywhere downstream.

use crate::embedding::Embedder;
use crate::vector::{FlatIndex, VectorError};
use skygraph_core::artifact::{
    ContentType, DatasetRecord, DocumentRecord, FaqRecord, IndexableText, SitePageRecord,
};
use skygraph_core::chunker::TextChunker;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors from corpus index construction.
#[derive(Error, Debug)]
pub enum CorpusBuildError {
    /// Nothing to index: refusing to produce an unusable empty index.
    #[error("no chunks were produced from any source")]
    EmptyCorpus,

    /// Side arrays do not line up with the vector rows.
    #[error("side arrays are misaligned: {0}")]
    Misaligned(String),

    /// Underlying vector index error.
    #[error(transparent)]
    Vector(#[from] VectorError),
}

/// One retrieval hit with its aligned metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievedChunk {
    /// Index position of the chunk.
    pub position: usize,
    /// Cosine similarity against the query.
    pub score: f32,
    /// Chunk text.
    pub text: String,
    /// Provenance label.
    pub source: String,
    /// Content classification.
    pub content_type: ContentType,
}

/// Searchable corpus: vectors plus aligned text/source/type arrays.
#[derive(Debug, Clone)]
pub struct CorpusIndex {
    index: FlatIndex,
    corpus: Vec<String>,
    sources: Vec<String>,
    content_types: Vec<ContentType>,
    embedder_id: String,
}

impl CorpusIndex {
    /// Assemble an index from its parts, validating alignment.
    pub fn new(
        index: FlatIndex,
        corpus: Vec<String>,
        sources: Vec<String>,
        content_types: Vec<ContentType>,
        embedder_id: String,
    ) -> Result<Self, CorpusBuildError> {
        let rows = index.len();
        if corpus.len() != rows || sources.len() != rows || content_types.len() != rows {
            return Err(CorpusBuildError::Misaligned(format!(
                "{} vectors, {} texts, {} sources, {} content types",
                rows,
                corpus.len(),
                sources.len(),
                content_types.len()
            )));
        }
        Ok(Self {
            index,
            corpus,
            sources,
            content_types,
            embedder_id,
        })
    }

    /// Number of indexed chunks.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// True when no chunks are indexed.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Embedding dimension.
    pub fn dimension(&self) -> usize {
        self.index.dimension()
    }

    /// Identifier of the embedder the index was built with.
    pub fn embedder_id(&self) -> &str {
        &self.embedder_id
    }

    /// Top-`k` chunks for an already-embedded query, by descending cosine
    /// similarity.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<RetrievedChunk>, VectorError> {
        let hits = self.index.search(query, k)?;
        Ok(hits
            .into_iter()
            .map(|(position, score)| RetrievedChunk {
                position,
                score,
                text: self.corpus[position].clone(),
                source: self.sources[position].clone(),
                content_type: self.content_types[position],
            })
            .collect())
    }

    /// Underlying vector index (for persistence).
    pub fn flat(&self) -> &FlatIndex {
        &self.index
    }

    /// Chunk texts, aligned by position.
    pub fn corpus(&self) -> &[String] {
        &self.corpus
    }

    /// Provenance labels, aligned by position.
    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    /// Content types, aligned by position.
    pub fn content_types(&self) -> &[ContentType] {
        &self.content_types
    }
}

/// Gathers artifact text, chunks it, embeds it and builds a [`CorpusIndex`].
pub struct CorpusIndexBuilder {
    chunker: TextChunker,
    workers: usize,
    pending: Vec<IndexableText>,
}

impl CorpusIndexBuilder {
    /// Default fan-out width for embedding independent chunks.
    pub const DEFAULT_WORKERS: usize = 4;

    /// Create a builder using `chunker` for long-form text.
    pub fn new(chunker: TextChunker) -> Self {
        Self {
            chunker,
            workers: Self::DEFAULT_WORKERS,
            pending: Vec::new(),
        }
    }

    /// Set the embedding worker count (1 = serial).
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Number of chunks queued so far.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    fn push_chunked(&mut self, item: IndexableText) {
        for chunk in self.chunker.chunks(&item.text) {
            self.pending.push(IndexableText {
                text: chunk,
                source: item.source.clone(),
                content_type: item.content_type,
            });
        }
    }

    /// Queue extracted documents; each is chunked into overlapping windows.
    pub fn add_documents(&mut self, records: &[DocumentRecord]) -> &mut Self {
        for record in records {
            match record.composed() {
                Some(item) => self.push_chunked(item),
                None => warn!(filename = %record.filename, "skipping empty document"),
            }
        }
        self
    }

    /// Queue FAQs; each composition is indexed as a single chunk.
    pub fn add_faqs(&mut self, records: &[FaqRecord]) -> &mut Self {
        for record in records {
            match record.composed() {
                Some(item) => self.pending.push(item),
                None => warn!("skipping FAQ with empty question"),
            }
        }
        self
    }

    /// Queue dataset pages; compositions are chunked like documents.
    pub fn add_datasets(&mut self, records: &[DatasetRecord]) -> &mut Self {
        for record in records {
            match record.composed() {
                Some(item) => self.push_chunked(item),
                None => warn!(url = %record.url, "skipping empty dataset page"),
            }
        }
        self
    }

    /// Queue site structure pages; compositions are chunked like documents.
    pub fn add_site_pages(&mut self, records: &[SitePageRecord]) -> &mut Self {
        for record in records {
            match record.composed() {
                Some(item) => self.push_chunked(item),
                None => warn!(url = %record.url, "skipping empty site page"),
            }
        }
        self
    }

    /// Queue raw text blocks, tagged `raw_data` and chunked like documents.
    pub fn add_raw_data(&mut self, records: &[DocumentRecord]) -> &mut Self {
        for record in records {
            match record.composed() {
                Some(item) => self.push_chunked(IndexableText {
                    content_type: ContentType::RawData,
                    ..item
                }),
                None => warn!(filename = %record.filename, "skipping empty raw data block"),
            }
        }
        self
    }

    /// Embed every queued chunk and build the index.
    ///
    /// Independent chunks are embedded by a small worker pool; a chunk whose
    /// embedding fails is logged and dropped rather than aborting the build.
    /// An empty corpus is a build-time configuration error.
    pub fn build(self, embedder: &dyn Embedder) -> Result<CorpusIndex, CorpusBuildError> {
        if self.pending.is_empty() {
            return Err(CorpusBuildError::EmptyCorpus);
        }

        debug!(chunks = self.pending.len(), workers = self.workers, "embedding corpus");
        let embeddings = embed_all(&self.pending, embedder, self.workers);

        let mut rows = Vec::new();
        let mut corpus = Vec::new();
        let mut sources = Vec::new();
        let mut content_types = Vec::new();

        for (item, embedding) in self.pending.into_iter().zip(embeddings) {
            if let Some(vector) = embedding {
                rows.push(vector);
                corpus.push(item.text);
                sources.push(item.source);
                content_types.push(item.content_type);
            }
        }

        if rows.is_empty() {
            return Err(CorpusBuildError::EmptyCorpus);
        }

        let index = FlatIndex::from_rows(rows, embedder.dimension())?;
        CorpusIndex::new(index, corpus, sources, content_types, embedder.id())
    }
}

/// Embed all items, preserving input order in the output.
///
/// Workers share no mutable state: each receives `(position, text)` jobs and
/// sends back `(position, result)`; results are slotted by position so the
/// unordered completion across workers never leaks into index layout.
fn embed_all(
    items: &[IndexableText],
    embedder: &dyn Embedder,
    workers: usize,
) -> Vec<Option<Vec<f32>>> {
    let mut out: Vec<Option<Vec<f32>>> = vec![None; items.len()];

    if workers <= 1 || items.len() < 2 {
        for (i, item) in items.iter().enumerate() {
            match embedder.embed(&item.text) {
                Ok(v) => out[i] = Some(v),
                Err(e) => warn!(source = %item.source, error = %e, "dropping chunk: embedding failed"),
            }
        }
        return out;
    }

    let (job_tx, job_rx) = crossbeam_channel::unbounded::<(usize, &str)>();
    let (result_tx, result_rx) = crossbeam_channel::unbounded();

    std::thread::scope(|scope| {
        for _ in 0..workers {
            let job_rx = job_rx.clone();
            let result_tx = result_tx.clone();
            scope.spawn(move || {
                for (i, text) in job_rx {
                    let result = embedder.embed(text);
                    if result_tx.send((i, result)).is_err() {
                        break;
                    }
                }
            });
        }
        drop(job_rx);
        drop(result_tx);

        for (i, item) in items.iter().enumerate() {
            if job_tx.send((i, item.text.as_str())).is_err() {
                break;
            }
        }
        drop(job_tx);

        for (i, result) in result_rx {
            match result {
                Ok(v) => out[i] = Some(v),
                Err(e) => {
                    warn!(source = %items[i].source, error = %e, "dropping chunk: embedding failed")
                }
            }
        }
    });

    out
}
