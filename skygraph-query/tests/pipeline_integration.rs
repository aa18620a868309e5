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

//! End-to-end pipeline: build both artifacts, persist them, reopen through
//! the engine and assemble a context.

use skygraph_core::artifact::{DocumentRecord, FaqRecord};
use skygraph_core::chunker::TextChunker;
use skygraph_core::graph::EntityRecord;
use skygraph_index::{
    normalize_graph, save_graph, save_index, CorpusIndexBuilder, GraphBuilder, GraphConfig,
    HashEmbedder,
};
use skygraph_query::{EngineConfig, EnginePaths, GenerationService, QueryEngine, QueryError};
use std::collections::BTreeMap;
use std::sync::Arc;
use tempfile::TempDir;

fn entity_record(source: &str, entities: &[&str]) -> EntityRecord {
    let mut map = BTreeMap::new();
    map.insert(
        "satellite".to_string(),
        entities.iter().map(|e| e.to_string()).collect(),
    );
    EntityRecord {
        source: source.to_string(),
        source_type: "document".to_string(),
        entities: map,
        raw_data: None,
    }
}

fn build_artifacts(dir: &TempDir, embedder: &HashEmbedder) -> EnginePaths {
    let paths = EnginePaths::under(dir.path());

    let records = vec![
        entity_record("insat_brochure.pdf", &["INSAT-3D", "Imager"]),
        entity_record("insat_handbook.pdf", &["INSAT-3D", "Imager"]),
        entity_record("payload_overview.pdf", &["INSAT-3D", "Imager", "Sounder"]),
    ];
    let graph = normalize_graph(&GraphBuilder::new(GraphConfig::default()).build(&records));
    save_graph(&paths.graph, &graph).unwrap();

    let mut builder = CorpusIndexBuilder::new(TextChunker::new(200, 20).unwrap());
    builder.add_documents(&[DocumentRecord {
        filename: "insat_brochure.pdf".into(),
        text: "INSAT-3D carries a six channel imager and a nineteen channel sounder \
               for meteorological observation."
            .into(),
    }]);
    builder.add_faqs(&[FaqRecord {
        question: "What does the INSAT-3D imager measure?".into(),
        answer: Some("Radiance in six spectral channels.".into()),
    }]);
    let index = builder.build(embedder).unwrap();
    save_index(&paths.index_dir, &index).unwrap();

    paths
}

#[test]
fn full_pipeline_assembles_grounded_context() {
    let dir = TempDir::new().unwrap();
    let embedder = HashEmbedder::new(64);
    let paths = build_artifacts(&dir, &embedder);

    let engine = QueryEngine::open(
        &paths,
        Arc::new(HashEmbedder::new(64)),
        EngineConfig::default(),
    )
    .unwrap();
    assert!(engine.has_graph());
    assert!(engine.has_index());

    let doc = engine
        .assemble_context("What does the INSAT-3D imager measure?", &[])
        .unwrap();

    assert_eq!(doc.focus_entity.as_deref(), Some("INSAT-3D"));
    assert!(doc.triple_count > 0);
    assert!(doc.chunk_count > 0);
    assert!(doc.prompt.contains("Graph Facts:"));
    assert!(doc.prompt.contains("INSAT-3D"));
    assert!(doc.prompt.contains("Current Question:"));
}

#[test]
fn mismatched_embedder_is_rejected_at_open() {
    let dir = TempDir::new().unwrap();
    let embedder = HashEmbedder::new(64);
    let paths = build_artifacts(&dir, &embedder);

    // Different dimension means a different embedder id.
    let result = QueryEngine::open(
        &paths,
        Arc::new(HashEmbedder::new(128)),
        EngineConfig::default(),
    );
    assert!(result.is_err());
}

#[test]
fn answer_round_trip_through_a_stub_service() {
    struct Canned;
    impl GenerationService for Canned {
        fn complete(&self, prompt: &str) -> Result<String, QueryError> {
            assert!(prompt.contains("Current Question:"));
            Ok("The imager measures radiance in six channels.".to_string())
        }
    }

    let dir = TempDir::new().unwrap();
    let embedder = HashEmbedder::new(64);
    let paths = build_artifacts(&dir, &embedder);
    let engine = QueryEngine::open(
        &paths,
        Arc::new(HashEmbedder::new(64)),
        EngineConfig::default(),
    )
    .unwrap();

    let mut history = Vec::new();
    let first = engine
        .answer(&Canned, "What does the INSAT-3D imager measure?", &mut history)
        .unwrap();
    assert!(first.contains("six channels"));

    // The second turn sees the first one in its history section.
    let doc = engine
        .assemble_context("And the sounder?", &history)
        .unwrap();
    assert!(doc.prompt.contains("What does the INSAT-3D imager measure?"));
    assert!(doc.prompt.contains("six channels"));
}
