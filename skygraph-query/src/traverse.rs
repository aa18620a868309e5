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

//! Bounded breadth-first traversal from resolved entities.

use serde::Serialize;
use skygraph_core::graph::KnowledgeGraph;
use std::collections::{BTreeSet, VecDeque};
use tracing::debug;

/// One traversed edge, subject first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Triple {
    pub subject: String,
    pub relationship: String,
    pub object: String,
}

/// Traversal bounds. Depth 1 keeps prompts on direct neighbours; the triple
/// cap keeps dense hubs from flooding the context.
#[derive(Debug, Clone)]
pub struct TraversalConfig {
    pub max_depth: usize,
    pub max_triples: usize,
}

impl Default for TraversalConfig {
    fn default() -> Self {
        Self {
            max_depth: 1,
            max_triples: 8,
        }
    }
}

/// Collect triples reachable from `seeds`, in visitation order.
///
/// Each seed gets its own visited set. Unknown seeds are skipped. The
/// global cap truncates deterministically because both the seed order and
/// each node's neighbour order are fixed.
pub fn traverse(graph: &KnowledgeGraph, seeds: &[String], config: &TraversalConfig) -> Vec<Triple> {
    let mut triples = Vec::new();

    'seeds: for seed in seeds {
        if !graph.contains(seed) {
            debug!(seed, "seed not present in graph, skipping");
            continue;
        }

        let mut visited = BTreeSet::new();
        let mut queue = VecDeque::new();
        queue.push_back((seed.clone(), 0usize));

        while let Some((current, depth)) = queue.pop_front() {
            if depth >= config.max_depth {
                continue;
            }
            visited.insert(current.clone());

            for (neighbor, relationship) in graph.neighbors(&current) {
                if visited.contains(neighbor) {
                    continue;
                }
                triples.push(Triple {
                    subject: current.clone(),
                    relationship: relationship.to_string(),
                    object: neighbor.to_string(),
                });
                if triples.len() == config.max_triples {
                    break 'seeds;
                }
                queue.push_back((neighbor.to_string(), depth + 1));
            }
        }
    }

    triples
}
