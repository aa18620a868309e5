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

//! Knowledge graph data model.
//!
//! Node identity is the sanitized entity text, case-sensitive. Edges are
//! semantically undirected co-occurrence relationships; persisted edges use
//! the canonical orientation `source <= target` (lexicographic).

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Relationship label for co-occurrence edges.
pub const CO_OCCURS_WITH: &str = "co_occurs_with";

/// Input record from the external entity extraction stage: one source
/// document/page with its labelled entity mentions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityRecord {
    /// Originating document or page identifier.
    pub source: String,
    /// Source category tag ("document", "site_page", ...).
    #[serde(default)]
    pub source_type: String,
    /// Label type (ORG, DATE, ...) to raw entity strings.
    #[serde(default)]
    pub entities: BTreeMap<String, Vec<String>>,
    /// Optional raw text block for provenance.
    #[serde(default)]
    pub raw_data: Option<String>,
}

/// A canonical, deduplicated entity in the graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphNode {
    /// Canonical identity: sanitized entity text.
    pub id: String,
    /// Display label; equal to `id` unless an alternate source supplied one.
    pub label: String,
    /// Originating document/page identifiers.
    #[serde(default)]
    pub sources: BTreeSet<String>,
    /// Label categories seen for this entity (ORG, DATE, ...).
    #[serde(default)]
    pub types: BTreeSet<String>,
    /// Raw text blocks this entity was extracted from.
    #[serde(default)]
    pub raw_data: BTreeSet<String>,
    /// Derived: number of distinct sources.
    #[serde(default)]
    pub source_count: usize,
}

impl GraphNode {
    /// Create a node whose label equals its id.
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            label: id.clone(),
            id,
            sources: BTreeSet::new(),
            types: BTreeSet::new(),
            raw_data: BTreeSet::new(),
            source_count: 0,
        }
    }

    /// Recompute the derived source count.
    pub fn sync_source_count(&mut self) {
        self.source_count = self.sources.len();
    }
}

/// Weighted undirected co-occurrence edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    pub relationship: String,
    /// Number of distinct documents the pair co-occurred in.
    pub weight: u32,
}

impl GraphEdge {
    /// Create an edge in canonical orientation (`source <= target`).
    pub fn co_occurrence(a: impl Into<String>, b: impl Into<String>, weight: u32) -> Self {
        let (a, b) = (a.into(), b.into());
        let (source, target) = if a <= b { (a, b) } else { (b, a) };
        Self {
            source,
            target,
            relationship: CO_OCCURS_WITH.to_string(),
            weight,
        }
    }

    /// Dedup key treating `(a, b)` and `(b, a)` as the same pair.
    pub fn canonical_key(&self) -> (String, String, String) {
        let (a, b) = if self.source <= self.target {
            (self.source.clone(), self.target.clone())
        } else {
            (self.target.clone(), self.source.clone())
        };
        (a, b, self.relationship.clone())
    }
}

/// The persisted graph: `{nodes: [...], edges: [...]}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KnowledgeGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl KnowledgeGraph {
    /// True when the graph holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Look up a node by id.
    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// True when a node with this id exists.
    pub fn contains(&self, id: &str) -> bool {
        self.node(id).is_some()
    }

    /// Neighbors of `id` over the undirected edge set, with the relationship
    /// label, in edge order.
    pub fn neighbors<'a>(&'a self, id: &str) -> Vec<(&'a str, &'a str)> {
        let mut out = Vec::new();
        for edge in &self.edges {
            if edge.source == id {
                out.push((edge.target.as_str(), edge.relationship.as_str()));
            } else if edge.target == id {
                out.push((edge.source.as_str(), edge.relationship.as_str()));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn co_occurrence_edge_is_canonically_oriented() {
        let edge = GraphEdge::co_occurrence("Oceansat-2", "INSAT-3D", 3);
        assert_eq!(edge.source, "INSAT-3D");
        assert_eq!(edge.target, "Oceansat-2");
        assert_eq!(edge.relationship, CO_OCCURS_WITH);
    }

    #[test]
    fn canonical_key_ignores_orientation() {
        let ab = GraphEdge::co_occurrence("a", "b", 1);
        let ba = GraphEdge {
            source: "b".into(),
            target: "a".into(),
            relationship: CO_OCCURS_WITH.into(),
            weight: 1,
        };
        assert_eq!(ab.canonical_key(), ba.canonical_key());
    }

    #[test]
    fn neighbors_cover_both_orientations() {
        let graph = KnowledgeGraph {
            nodes: vec![GraphNode::new("a"), GraphNode::new("b"), GraphNode::new("c")],
            edges: vec![
                GraphEdge::co_occurrence("a", "b", 2),
                GraphEdge::co_occurrence("c", "b", 2),
            ],
        };
        let neighbors: Vec<&str> = graph.neighbors("b").iter().map(|(n, _)| *n).collect();
        assert_eq!(neighbors, vec!["a", "c"]);
    }

    #[test]
    fn graph_round_trips_through_json() {
        let mut node = GraphNode::new("SCATSAT-1");
        node.sources.insert("doc1".into());
        node.types.insert("ORG".into());
        node.sync_source_count();

        let graph = KnowledgeGraph {
            nodes: vec![node],
            edges: vec![GraphEdge::co_occurrence("SCATSAT-1", "ISRO", 2)],
        };
        let json = serde_json::to_string(&graph).unwrap();
        let parsed: KnowledgeGraph = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.nodes[0].id, "SCATSAT-1");
        assert_eq!(parsed.nodes[0].source_count, 1);
        assert_eq!(parsed.edges[0].weight, 2);
    }
}
