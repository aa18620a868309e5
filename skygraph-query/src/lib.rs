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

//! Skygraph Query Layer
//!
//! Online side of the engine: resolve query text to graph entities, walk
//! their neighbourhood, retrieve and mix corpus chunks by content type, and
//! assemble everything into one bounded prompt.

pub mod assemble;
pub mod engine;
pub mod rank;
pub mod resolve;
pub mod traverse;
pub mod variations;

pub use assemble::{AssemblerConfig, ContextAssembler, ContextDocument, HistoryTurn};
pub use engine::{EngineConfig, EnginePaths, GenerationService, QueryEngine, QueryError};
pub use rank::{detect_intent, mix_by_intent, QueryIntent, DEFAULT_TOP_K};
pub use resolve::{
    Candidate, EntityResolver, FuzzyMatcher, LexicalMatcher, Matcher, NodeCatalog, ResolverConfig,
    SemanticMatcher,
};
pub use traverse::{traverse, TraversalConfig, Triple};
pub use variations::variations;
