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

//! Entity resolution: free-text query to graph node ids.
//!
//! Three tiers run in order, each strictly cheaper and more precise than the
//! next: lexical variation overlap, embedding similarity, and Levenshtein as
//! a last resort. Later tiers only run when earlier ones came up short, so
//! an exact name never pays for an embedding pass.

use crate::variations::variations;
use skygraph_core::graph::KnowledgeGraph;
use skygraph_core::sanitize_text;
use skygraph_index::{cosine_similarity, Embedder};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// How many query variations the semantic tier embeds besides the query
/// itself. Variation sets are small; this bounds the worst case.
const SEMANTIC_QUERY_VARIATIONS: usize = 4;

/// Resolver tuning knobs.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Cap on resolved entities per query.
    pub max_entities: usize,
    /// The semantic tier runs only when the lexical tier found fewer
    /// matches than this.
    pub min_lexical_matches: usize,
    /// Similarity bar for the semantic tier's first pass.
    pub semantic_threshold: f32,
    /// Relaxed bar for the semantic tier's single retry.
    pub semantic_floor: f32,
    /// Normalized Levenshtein similarity bar for the fuzzy tier.
    pub fuzzy_threshold: f32,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_entities: 3,
            min_lexical_matches: 3,
            semantic_threshold: 0.4,
            semantic_floor: 0.25,
            fuzzy_threshold: 0.6,
        }
    }
}

/// One graph node with its precomputed variation set.
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub node_id: String,
    pub label: String,
    pub variations: BTreeSet<String>,
}

/// All graph nodes indexed for matching, built once per loaded graph.
#[derive(Debug, Clone, Default)]
pub struct NodeCatalog {
    entries: Vec<CatalogEntry>,
}

impl NodeCatalog {
    pub fn from_graph(graph: &KnowledgeGraph) -> Self {
        let entries = graph
            .nodes
            .iter()
            .map(|node| {
                let mut vars = variations(&node.id);
                vars.extend(variations(&node.label));
                CatalogEntry {
                    node_id: node.id.clone(),
                    label: node.label.clone(),
                    variations: vars,
                }
            })
            .collect();
        Self { entries }
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A node id proposed by one matcher tier.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub node_id: String,
    pub confidence: f32,
}

/// One tier of the resolution chain.
pub trait Matcher {
    fn candidates(&self, query: &str, catalog: &NodeCatalog) -> Vec<Candidate>;
}

/// Tier 1: a query variation equals, contains or is contained in a node
/// variation. Catalog order, confidence 1.0.
#[derive(Debug, Default)]
pub struct LexicalMatcher;

impl Matcher for LexicalMatcher {
    fn candidates(&self, query: &str, catalog: &NodeCatalog) -> Vec<Candidate> {
        let query_vars = variations(query);
        if query_vars.is_empty() {
            return Vec::new();
        }

        let mut out = Vec::new();
        for entry in catalog.entries() {
            let hit = entry.variations.iter().any(|nv| {
                query_vars
                    .iter()
                    .any(|qv| qv == nv || qv.contains(nv.as_str()) || nv.contains(qv.as_str()))
            });
            if hit {
                out.push(Candidate {
                    node_id: entry.node_id.clone(),
                    confidence: 1.0,
                });
            }
        }
        out
    }
}

/// Tier 2: embedding similarity between query variations and node
/// variations, sharing the build-side `Embedder`.
pub struct SemanticMatcher {
    embedder: Arc<dyn Embedder>,
    threshold: f32,
    floor: f32,
}

impl SemanticMatcher {
    pub fn new(embedder: Arc<dyn Embedder>, threshold: f32, floor: f32) -> Self {
        Self {
            embedder,
            threshold,
            floor,
        }
    }

    fn embed_or_skip(&self, text: &str) -> Option<Vec<f32>> {
        match self.embedder.embed(text) {
            Ok(v) => Some(v),
            Err(e) => {
                warn!(text, error = %e, "embedding failed during resolution, skipping");
                None
            }
        }
    }

    /// Best similarity between any query vector and any of the entry's
    /// variation vectors.
    fn score_entry(&self, query_vectors: &[Vec<f32>], entry: &CatalogEntry) -> f32 {
        let mut best = 0.0f32;
        for variant in &entry.variations {
            if let Some(vector) = self.embed_or_skip(variant) {
                for qv in query_vectors {
                    best = best.max(cosine_similarity(qv, &vector));
                }
            }
        }
        best
    }
}

impl Matcher for SemanticMatcher {
    fn candidates(&self, query: &str, catalog: &NodeCatalog) -> Vec<Candidate> {
        let mut texts: Vec<String> = vec![query.to_string()];
        texts.extend(
            variations(query)
                .into_iter()
                .take(SEMANTIC_QUERY_VARIATIONS),
        );
        let query_vectors: Vec<Vec<f32>> = texts
            .iter()
            .filter_map(|t| self.embed_or_skip(t))
            .collect();
        if query_vectors.is_empty() {
            return Vec::new();
        }

        let scored: Vec<(f32, &CatalogEntry)> = catalog
            .entries()
            .iter()
            .map(|entry| (self.score_entry(&query_vectors, entry), entry))
            .collect();

        let mut accepted: Vec<&(f32, &CatalogEntry)> = scored
            .iter()
            .filter(|(score, _)| *score >= self.threshold)
            .collect();
        if accepted.is_empty() {
            debug!(
                floor = self.floor,
                "no semantic candidate cleared the threshold, retrying at the floor"
            );
            accepted = scored
                .iter()
                .filter(|(score, _)| *score >= self.floor)
                .collect();
        }

        let mut out: Vec<Candidate> = accepted
            .into_iter()
            .map(|(score, entry)| Candidate {
                node_id: entry.node_id.clone(),
                confidence: *score,
            })
            .collect();
        // Best first; ties resolve by node id for determinism.
        out.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.node_id.cmp(&b.node_id))
        });
        out
    }
}

/// Tier 3: normalized Levenshtein similarity against node labels.
#[derive(Debug)]
pub struct FuzzyMatcher {
    min_similarity: f32,
}

impl FuzzyMatcher {
    pub fn new(min_similarity: f32) -> Self {
        Self { min_similarity }
    }

    fn levenshtein(a: &str, b: &str) -> usize {
        let len_a = a.chars().count();
        let len_b = b.chars().count();
        if len_a == 0 {
            return len_b;
        }
        if len_b == 0 {
            return len_a;
        }

        let mut matrix = vec![vec![0usize; len_b + 1]; len_a + 1];
        for (i, row) in matrix.iter_mut().enumerate() {
            row[0] = i;
        }
        for (j, cell) in matrix[0].iter_mut().enumerate() {
            *cell = j;
        }

        for (i, ca) in a.chars().enumerate() {
            for (j, cb) in b.chars().enumerate() {
                let cost = usize::from(ca != cb);
                matrix[i + 1][j + 1] = (matrix[i][j + 1] + 1)
                    .min(matrix[i + 1][j] + 1)
                    .min(matrix[i][j] + cost);
            }
        }
        matrix[len_a][len_b]
    }

    fn similarity(a: &str, b: &str) -> f32 {
        let max_len = a.chars().count().max(b.chars().count());
        if max_len == 0 {
            return 1.0;
        }
        1.0 - Self::levenshtein(a, b) as f32 / max_len as f32
    }
}

impl Matcher for FuzzyMatcher {
    fn candidates(&self, query: &str, catalog: &NodeCatalog) -> Vec<Candidate> {
        let query = sanitize_text(query).to_lowercase();
        let mut out: Vec<Candidate> = catalog
            .entries()
            .iter()
            .filter_map(|entry| {
                let score = Self::similarity(&query, &entry.label.to_lowercase());
                (score >= self.min_similarity).then(|| Candidate {
                    node_id: entry.node_id.clone(),
                    confidence: score,
                })
            })
            .collect();
        out.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.node_id.cmp(&b.node_id))
        });
        out
    }
}

/// The full chain over a loaded graph.
pub struct EntityResolver {
    catalog: NodeCatalog,
    lexical: LexicalMatcher,
    semantic: SemanticMatcher,
    fuzzy: FuzzyMatcher,
    config: ResolverConfig,
}

impl EntityResolver {
    pub fn new(graph: &KnowledgeGraph, embedder: Arc<dyn Embedder>, config: ResolverConfig) -> Self {
        Self {
            catalog: NodeCatalog::from_graph(graph),
            lexical: LexicalMatcher,
            semantic: SemanticMatcher::new(
                embedder,
                config.semantic_threshold,
                config.semantic_floor,
            ),
            fuzzy: FuzzyMatcher::new(config.fuzzy_threshold),
            config,
        }
    }

    /// Resolve a query to at most `max_entities` node ids.
    pub fn resolve(&self, query: &str) -> Vec<String> {
        if self.catalog.is_empty() {
            return Vec::new();
        }

        let mut candidates = self.lexical.candidates(query, &self.catalog);
        if candidates.len() < self.config.min_lexical_matches {
            candidates.extend(self.semantic.candidates(query, &self.catalog));
        }
        if candidates.is_empty() {
            candidates = self.fuzzy.candidates(query, &self.catalog);
        }

        let mut seen = BTreeSet::new();
        let mut out = Vec::new();
        for candidate in candidates {
            if seen.insert(candidate.node_id.clone()) {
                out.push(candidate.node_id);
                if out.len() == self.config.max_entities {
                    break;
                }
            }
        }
        debug!(query, entities = ?out, "resolved entities");
        out
    }

    /// Single best candidate, for the assembler's focus-entity section.
    pub fn focus(&self, query: &str) -> Option<String> {
        self.resolve(query).into_iter().next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skygraph_core::graph::{GraphEdge, GraphNode};
    use skygraph_index::EmbeddingError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn graph_with(labels: &[&str]) -> KnowledgeGraph {
        KnowledgeGraph {
            nodes: labels.iter().map(|l| GraphNode::new(*l)).collect(),
            edges: Vec::new(),
        }
    }

    /// Embedder that counts calls; vectors are position-coded so distinct
    /// texts rarely collide.
    struct CountingEmbedder {
        calls: AtomicUsize,
    }

    impl CountingEmbedder {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Embedder for CountingEmbedder {
        fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut v = vec![0.0f32; 8];
            for (i, b) in text.bytes().enumerate() {
                v[i % 8] += b as f32;
            }
            let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
            Ok(v.into_iter().map(|x| x / norm).collect())
        }

        fn dimension(&self) -> usize {
            8
        }

        fn id(&self) -> String {
            "counting/8".to_string()
        }
    }

    #[test]
    fn lexical_tier_matches_exact_label() {
        let graph = graph_with(&["INSAT-3D", "Oceansat-2"]);
        let catalog = NodeCatalog::from_graph(&graph);
        let hits = LexicalMatcher.candidates("Tell me about INSAT-3D", &catalog);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].node_id, "INSAT-3D");
        assert_eq!(hits[0].confidence, 1.0);
    }

    #[test]
    fn lexical_tier_matches_variation_spellings() {
        let graph = graph_with(&["INSAT-3D"]);
        let catalog = NodeCatalog::from_graph(&graph);
        assert!(!LexicalMatcher.candidates("what is insat 3d", &catalog).is_empty());
        assert!(!LexicalMatcher.candidates("insat3d products", &catalog).is_empty());
    }

    #[test]
    fn exact_label_never_invokes_the_semantic_tier() {
        let graph = graph_with(&["INSAT-3D", "Oceansat-2", "Megha-Tropiques"]);
        let embedder = Arc::new(CountingEmbedder::new());
        let resolver = EntityResolver::new(
            &graph,
            embedder.clone(),
            ResolverConfig {
                min_lexical_matches: 1,
                ..ResolverConfig::default()
            },
        );

        let resolved = resolver.resolve("INSAT-3D");
        assert_eq!(resolved, vec!["INSAT-3D".to_string()]);
        assert_eq!(embedder.calls(), 0);
    }

    #[test]
    fn fuzzy_tier_catches_typos() {
        let graph = graph_with(&["Oceansat-2"]);
        let catalog = NodeCatalog::from_graph(&graph);
        let hits = FuzzyMatcher::new(0.6).candidates("Oceansst-2", &catalog);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].node_id, "Oceansat-2");
    }

    #[test]
    fn fuzzy_tier_rejects_unrelated_text() {
        let graph = graph_with(&["Oceansat-2"]);
        let catalog = NodeCatalog::from_graph(&graph);
        assert!(FuzzyMatcher::new(0.6)
            .candidates("rainfall accumulation", &catalog)
            .is_empty());
    }

    #[test]
    fn resolve_caps_at_max_entities() {
        let graph = graph_with(&["sat alpha", "sat beta", "sat gamma", "sat delta"]);
        let embedder = Arc::new(CountingEmbedder::new());
        let resolver = EntityResolver::new(&graph, embedder, ResolverConfig::default());
        let resolved = resolver.resolve("sat alpha sat beta sat gamma sat delta");
        assert_eq!(resolved.len(), 3);
    }

    #[test]
    fn empty_graph_resolves_nothing() {
        let graph = KnowledgeGraph::default();
        let embedder = Arc::new(CountingEmbedder::new());
        let resolver = EntityResolver::new(&graph, embedder.clone(), ResolverConfig::default());
        assert!(resolver.resolve("INSAT-3D").is_empty());
        assert!(resolver.focus("INSAT-3D").is_none());
        assert_eq!(embedder.calls(), 0);
    }

    #[test]
    fn focus_returns_first_resolved_entity() {
        let graph = KnowledgeGraph {
            nodes: vec![GraphNode::new("INSAT-3D"), GraphNode::new("Oceansat-2")],
            edges: vec![GraphEdge::co_occurrence("INSAT-3D", "Oceansat-2", 2)],
        };
        let embedder = Arc::new(CountingEmbedder::new());
        let resolver = EntityResolver::new(&graph, embedder, ResolverConfig::default());
        assert_eq!(resolver.focus("INSAT-3D rainfall"), Some("INSAT-3D".to_string()));
    }

    #[test]
    fn semantic_tier_runs_when_lexical_is_short() {
        let graph = graph_with(&["INSAT-3D"]);
        let embedder = Arc::new(CountingEmbedder::new());
        let resolver = EntityResolver::new(&graph, embedder.clone(), ResolverConfig::default());

        // One lexical match is below the default min of three, so the
        // semantic tier gets consulted too.
        resolver.resolve("INSAT-3D");
        assert!(embedder.calls() > 0);
    }
}
