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

//! Co-occurrence graph construction from extracted entity records.

use serde::{Deserialize, Serialize};
use skygraph_core::graph::{EntityRecord, GraphEdge, GraphNode, KnowledgeGraph};
use skygraph_core::sanitize::sanitize_text;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

/// Graph construction thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphConfig {
    /// A pair becomes an edge once it co-occurs in this many sources.
    pub min_cooccurrence: u32,
    /// Entities of sanitized length at or below this are dropped.
    pub min_entity_len: usize,
    /// Per-source entity cap bounding the quadratic pair loop.
    pub max_entities_per_source: usize,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            min_cooccurrence: 2,
            min_entity_len: 2,
            max_entities_per_source: 256,
        }
    }
}

impl GraphConfig {
    /// Set the co-occurrence edge threshold.
    pub fn with_min_cooccurrence(mut self, min: u32) -> Self {
        self.min_cooccurrence = min;
        self
    }
}

/// Builds a co-occurrence graph from per-source entity lists.
///
/// Node identity is the sanitized entity text; attributes (sources, label
/// types, raw data) union across every source the entity appears in. Every
/// unordered pair of distinct entities within one source increments a global
/// counter; pairs that reach `min_cooccurrence` become weighted edges.
pub struct GraphBuilder {
    config: GraphConfig,
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new(GraphConfig::default())
    }
}

impl GraphBuilder {
    /// Create a builder with the given thresholds.
    pub fn new(config: GraphConfig) -> Self {
        Self { config }
    }

    /// Build a graph from entity records. Records with no usable entities are
    /// skipped with a warning; an empty input yields an empty graph.
    pub fn build(&self, records: &[EntityRecord]) -> KnowledgeGraph {
        let mut nodes: BTreeMap<String, GraphNode> = BTreeMap::new();
        let mut pair_counts: BTreeMap<(String, String), u32> = BTreeMap::new();

        for record in records {
            let source = sanitize_text(&record.source);
            let entities = self.source_entities(record);

            if entities.is_empty() {
                warn!(source = %source, "record contributed no entities");
                continue;
            }

            for (entity, labels) in &entities {
                let node = nodes
                    .entry(entity.clone())
                    .or_insert_with(|| GraphNode::new(entity.clone()));
                if !source.is_empty() {
                    node.sources.insert(source.clone());
                }
                node.types.extend(labels.iter().cloned());
                if let Some(raw) = &record.raw_data {
                    let raw = sanitize_text(raw);
                    if !raw.is_empty() {
                        node.raw_data.insert(raw);
                    }
                }
            }

            // Unordered pairs within the source, counted once per source.
            for i in 0..entities.len() {
                for j in (i + 1)..entities.len() {
                    let (a, b) = (&entities[i].0, &entities[j].0);
                    let key = if a <= b {
                        (a.clone(), b.clone())
                    } else {
                        (b.clone(), a.clone())
                    };
                    *pair_counts.entry(key).or_insert(0) += 1;
                }
            }
        }

        for node in nodes.values_mut() {
            node.sync_source_count();
        }

        let edges: Vec<GraphEdge> = pair_counts
            .into_iter()
            .filter(|(_, weight)| *weight >= self.config.min_cooccurrence)
            .map(|((a, b), weight)| GraphEdge::co_occurrence(a, b, weight))
            .collect();

        debug!(nodes = nodes.len(), edges = edges.len(), "graph built");
        KnowledgeGraph {
            nodes: nodes.into_values().collect(),
            edges,
        }
    }

    /// Sanitized, deduplicated `(entity, labels)` list for one source, with
    /// short entities dropped and the per-source cap applied.
    ///
    /// An entity mentioned under several label types stays one entry for the
    /// pair loop, but keeps every label so node attributes union.
    fn source_entities(&self, record: &EntityRecord) -> Vec<(String, BTreeSet<String>)> {
        let mut positions: BTreeMap<String, usize> = BTreeMap::new();
        let mut out: Vec<(String, BTreeSet<String>)> = Vec::new();

        'outer: for (label, values) in &record.entities {
            let label = sanitize_text(label);
            for value in values {
                let entity = sanitize_text(value);
                if entity.chars().count() <= self.config.min_entity_len {
                    continue;
                }
                if let Some(&i) = positions.get(&entity) {
                    if !label.is_empty() {
                        out[i].1.insert(label.clone());
                    }
                    continue;
                }
                let mut labels = BTreeSet::new();
                if !label.is_empty() {
                    labels.insert(label.clone());
                }
                positions.insert(entity.clone(), out.len());
                out.push((entity, labels));
                if out.len() >= self.config.max_entities_per_source {
                    warn!(
                        source = %record.source,
                        cap = self.config.max_entities_per_source,
                        "entity list truncated at per-source cap"
                    );
                    break 'outer;
                }
            }
        }
        out
    }
}
