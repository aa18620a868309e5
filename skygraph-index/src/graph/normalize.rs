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

//! Graph normalization into the canonical persisted form.
//!
//! The builder and any alternate graph sources may emit slightly inconsistent
//! text (stray whitespace, control characters) or duplicate logical nodes.
//! Normalization re-sanitizes everything, dedups, and enforces the canonical
//! edge orientation. It is idempotent: normalizing its own output is a no-op.

use skygraph_core::graph::{GraphEdge, GraphNode, KnowledgeGraph, CO_OCCURS_WITH};
use skygraph_core::sanitize::sanitize_text;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Normalize a graph into the canonical persisted form.
///
/// - node ids/labels and edge endpoints/relationships are re-sanitized;
/// - duplicate node ids keep the first-seen attributes (deterministic given
///   the input ordering);
/// - edges dedup on `(min(a,b), max(a,b), relationship)` and are stored with
///   `source <= target`;
/// - self-loops and edges whose endpoints are not nodes are dropped.
pub fn normalize_graph(graph: &KnowledgeGraph) -> KnowledgeGraph {
    let mut nodes: BTreeMap<String, GraphNode> = BTreeMap::new();

    for node in &graph.nodes {
        let id = sanitize_text(&node.id);
        if id.is_empty() {
            continue;
        }
        nodes.entry(id.clone()).or_insert_with(|| {
            let label = sanitize_text(&node.label);
            let mut normalized = GraphNode {
                id: id.clone(),
                label: if label.is_empty() { id.clone() } else { label },
                sources: sanitize_set(&node.sources),
                types: sanitize_set(&node.types),
                raw_data: sanitize_set(&node.raw_data),
                source_count: 0,
            };
            normalized.sync_source_count();
            normalized
        });
    }

    let mut seen = BTreeSet::new();
    let mut edges = Vec::new();

    for edge in &graph.edges {
        let source = sanitize_text(&edge.source);
        let target = sanitize_text(&edge.target);
        let relationship = {
            let r = sanitize_text(&edge.relationship);
            if r.is_empty() {
                CO_OCCURS_WITH.to_string()
            } else {
                r
            }
        };

        if source.is_empty() || target.is_empty() || source == target {
            continue;
        }
        if !nodes.contains_key(&source) || !nodes.contains_key(&target) {
            continue;
        }

        let (a, b) = if source <= target {
            (source, target)
        } else {
            (target, source)
        };
        if !seen.insert((a.clone(), b.clone(), relationship.clone())) {
            continue;
        }
        edges.push(GraphEdge {
            source: a,
            target: b,
            relationship,
            weight: edge.weight,
        });
    }

    debug!(nodes = nodes.len(), edges = edges.len(), "graph normalized");
    KnowledgeGraph {
        nodes: nodes.into_values().collect(),
        edges,
    }
}

fn sanitize_set(values: &BTreeSet<String>) -> BTreeSet<String> {
    values
        .iter()
        .map(|v| sanitize_text(v))
        .filter(|v| !v.is_empty())
        .collect()
}
