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

//! Persistence for the graph and the corpus index.
//!
//! Every write goes to a sibling temp file and is renamed into place, so a
//! query process reading concurrently never observes a partial artifact.
//! Loads re-validate everything the query path relies on (array alignment,
//! dimension, row count) and fail immediately rather than at query time.

use crate::corpus::CorpusIndex;
use crate::vector::FlatIndex;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use skygraph_core::artifact::ContentType;
use skygraph_core::graph::KnowledgeGraph;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// File names inside a persisted index directory.
const CORPUS_FILE: &str = "corpus.json";
const SOURCES_FILE: &str = "sources.json";
const CONTENT_TYPES_FILE: &str = "content_types.json";
const EMBEDDINGS_FILE: &str = "embeddings.bin";
const META_FILE: &str = "meta.json";

/// Errors from artifact persistence.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The artifact does not exist; the query layer degrades to partial
    /// context on this variant.
    #[error("artifact not found at {0}")]
    NotFound(PathBuf),

    /// The artifact exists but fails validation.
    #[error("corrupt artifact: {0}")]
    Corrupt(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("binary decode error: {0}")]
    Bin(#[from] bincode::Error),
}

/// Index directory metadata, written last during a build.
#[derive(Debug, Serialize, Deserialize)]
struct IndexMeta {
    dimension: usize,
    rows: usize,
    embedder_id: String,
    built_at: DateTime<Utc>,
}

/// Write `bytes` to `path` via a sibling temp file and an atomic rename.
fn atomic_write(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| StoreError::Corrupt(format!("invalid artifact path {}", path.display())))?;
    let tmp = path.with_file_name(format!("{file_name}.tmp"));
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

fn read_existing(path: &Path) -> Result<Vec<u8>, StoreError> {
    if !path.exists() {
        return Err(StoreError::NotFound(path.to_path_buf()));
    }
    Ok(fs::read(path)?)
}

/// Persist a normalized graph as `{nodes: [...], edges: [...]}` JSON.
pub fn save_graph(path: &Path, graph: &KnowledgeGraph) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    atomic_write(path, &serde_json::to_vec_pretty(graph)?)?;
    info!(
        path = %path.display(),
        nodes = graph.nodes.len(),
        edges = graph.edges.len(),
        "graph saved"
    );
    Ok(())
}

/// Load a persisted graph.
pub fn load_graph(path: &Path) -> Result<KnowledgeGraph, StoreError> {
    let bytes = read_existing(path)?;
    let graph: KnowledgeGraph = serde_json::from_slice(&bytes)
        .map_err(|e| StoreError::Corrupt(format!("graph at {}: {e}", path.display())))?;
    Ok(graph)
}

/// Persist a corpus index into `dir`.
///
/// Layout: three plain JSON side arrays, the embedding matrix as bincode,
/// and a metadata file written last so a complete `meta.json` implies the
/// other files were fully written.
pub fn save_index(dir: &Path, index: &CorpusIndex) -> Result<(), StoreError> {
    fs::create_dir_all(dir)?;

    atomic_write(
        &dir.join(CORPUS_FILE),
        &serde_json::to_vec_pretty(index.corpus())?,
    )?;
    atomic_write(
        &dir.join(SOURCES_FILE),
        &serde_json::to_vec_pretty(index.sources())?,
    )?;
    atomic_write(
        &dir.join(CONTENT_TYPES_FILE),
        &serde_json::to_vec_pretty(index.content_types())?,
    )?;
    atomic_write(&dir.join(EMBEDDINGS_FILE), &bincode::serialize(index.flat())?)?;

    let meta = IndexMeta {
        dimension: index.dimension(),
        rows: index.len(),
        embedder_id: index.embedder_id().to_string(),
        built_at: Utc::now(),
    };
    atomic_write(&dir.join(META_FILE), &serde_json::to_vec_pretty(&meta)?)?;

    info!(dir = %dir.display(), rows = index.len(), "index saved");
    Ok(())
}

/// Load a persisted corpus index, validating positional alignment.
pub fn load_index(dir: &Path) -> Result<CorpusIndex, StoreError> {
    if !dir.exists() {
        return Err(StoreError::NotFound(dir.to_path_buf()));
    }

    let meta: IndexMeta = serde_json::from_slice(&read_existing(&dir.join(META_FILE))?)
        .map_err(|e| StoreError::Corrupt(format!("index metadata: {e}")))?;

    let corpus: Vec<String> = serde_json::from_slice(&read_existing(&dir.join(CORPUS_FILE))?)
        .map_err(|e| StoreError::Corrupt(format!("corpus array: {e}")))?;
    let sources: Vec<String> = serde_json::from_slice(&read_existing(&dir.join(SOURCES_FILE))?)
        .map_err(|e| StoreError::Corrupt(format!("sources array: {e}")))?;
    let content_types: Vec<ContentType> =
        serde_json::from_slice(&read_existing(&dir.join(CONTENT_TYPES_FILE))?)
            .map_err(|e| StoreError::Corrupt(format!("content types array: {e}")))?;
    let flat: FlatIndex = bincode::deserialize(&read_existing(&dir.join(EMBEDDINGS_FILE))?)
        .map_err(|e| StoreError::Corrupt(format!("embedding matrix: {e}")))?;

    if flat.len() != meta.rows || flat.dimension() != meta.dimension {
        return Err(StoreError::Corrupt(format!(
            "embedding matrix is {}x{}, metadata says {}x{}",
            flat.len(),
            flat.dimension(),
            meta.rows,
            meta.dimension
        )));
    }

    CorpusIndex::new(flat, corpus, sources, content_types, meta.embedder_id)
        .map_err(|e| StoreError::Corrupt(e.to_string()))
}
