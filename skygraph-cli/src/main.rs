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

//! Skygraph CLI
//!
//! Builds the knowledge graph and vector index artifacts from crawled
//! portal data, and runs the query pipeline against them.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use skygraph_core::artifact::{DatasetRecord, DocumentRecord, FaqRecord, SitePageRecord};
use skygraph_core::chunker::TextChunker;
use skygraph_core::graph::{EntityRecord, KnowledgeGraph};
use skygraph_index::{
    load_graph, normalize_graph, save_graph, save_index, CorpusIndexBuilder, GraphBuilder,
    GraphConfig, HashEmbedder,
};
use skygraph_query::{EngineConfig, EnginePaths, EntityResolver, QueryEngine, ResolverConfig};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, Level};

/// Raw graph artifact, input to `normalize-graph`.
const RAW_GRAPH_FILE: &str = "knowledge_graph.json";

#[derive(Parser)]
#[command(name = "skygraph")]
#[command(about = "Skygraph - hybrid retrieval over a satellite data portal", long_about = None)]
struct Cli {
    /// Artifact directory
    #[arg(short, long, default_value = "./skygraph-data")]
    data_dir: PathBuf,

    /// Verbose mode
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the co-occurrence graph from extracted entity records
    BuildGraph {
        /// JSON array of per-source entity records
        entities: PathBuf,

        /// Minimum shared sources for an edge
        #[arg(long, default_value = "2")]
        min_cooccurrence: u32,
    },

    /// Normalize the raw graph (sanitize, dedup, canonical edge orientation)
    NormalizeGraph,

    /// Build the vector index from composed artifact files
    BuildIndex {
        /// JSON array of extracted documents
        #[arg(long)]
        docs: Option<PathBuf>,

        /// JSON array of FAQ records
        #[arg(long)]
        faqs: Option<PathBuf>,

        /// JSON array of crawled site pages
        #[arg(long)]
        pages: Option<PathBuf>,

        /// JSON array of dataset product pages
        #[arg(long)]
        datasets: Option<PathBuf>,

        /// JSON array of raw data blocks
        #[arg(long)]
        raw: Option<PathBuf>,

        /// Chunk size in characters
        #[arg(long, default_value = "800")]
        chunk_size: usize,

        /// Chunk overlap in characters
        #[arg(long, default_value = "80")]
        overlap: usize,
    },

    /// Resolve a query to graph entities
    Resolve {
        /// Query text
        query: String,
    },

    /// Assemble the retrieval context for a query
    Ask {
        /// Query text
        query: String,

        /// Print the full assembled prompt
        #[arg(long)]
        show_prompt: bool,
    },
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_slice(&bytes)
        .with_context(|| format!("failed to parse {}", path.display()))
}

fn read_optional<T: DeserializeOwned>(path: &Option<PathBuf>) -> Result<Vec<T>> {
    match path {
        Some(p) => read_json(p),
        None => Ok(Vec::new()),
    }
}

fn build_graph(data_dir: &Path, entities: &Path, min_cooccurrence: u32) -> Result<()> {
    let records: Vec<EntityRecord> = read_json(entities)?;
    info!(records = records.len(), "building graph");

    let config = GraphConfig::default().with_min_cooccurrence(min_cooccurrence);
    let graph = GraphBuilder::new(config).build(&records);
    let path = data_dir.join(RAW_GRAPH_FILE);
    save_graph(&path, &graph).context("failed to save graph")?;

    println!(
        "built graph: {} nodes, {} edges -> {}",
        graph.nodes.len(),
        graph.edges.len(),
        path.display()
    );
    Ok(())
}

fn normalize(data_dir: &Path) -> Result<()> {
    let raw_path = data_dir.join(RAW_GRAPH_FILE);
    let graph = load_graph(&raw_path)
        .with_context(|| format!("failed to load {}", raw_path.display()))?;

    let normalized = normalize_graph(&graph);
    let out = EnginePaths::under(data_dir).graph;
    save_graph(&out, &normalized).context("failed to save normalized graph")?;

    println!(
        "normalized graph: {} nodes, {} edges -> {}",
        normalized.nodes.len(),
        normalized.edges.len(),
        out.display()
    );
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn build_index(
    data_dir: &Path,
    docs: &Option<PathBuf>,
    faqs: &Option<PathBuf>,
    pages: &Option<PathBuf>,
    datasets: &Option<PathBuf>,
    raw: &Option<PathBuf>,
    chunk_size: usize,
    overlap: usize,
) -> Result<()> {
    let docs: Vec<DocumentRecord> = read_optional(docs)?;
    let faqs: Vec<FaqRecord> = read_optional(faqs)?;
    let pages: Vec<SitePageRecord> = read_optional(pages)?;
    let datasets: Vec<DatasetRecord> = read_optional(datasets)?;
    let raw: Vec<DocumentRecord> = read_optional(raw)?;

    let chunker = TextChunker::new(chunk_size, overlap).context("invalid chunker config")?;
    let mut builder = CorpusIndexBuilder::new(chunker);
    builder
        .add_documents(&docs)
        .add_faqs(&faqs)
        .add_site_pages(&pages)
        .add_datasets(&datasets)
        .add_raw_data(&raw);

    let embedder = HashEmbedder::default();
    let index = builder.build(&embedder).context("index build failed")?;

    let dir = EnginePaths::under(data_dir).index_dir;
    save_index(&dir, &index).context("failed to save index")?;

    println!("built index: {} chunks -> {}", index.len(), dir.display());
    Ok(())
}

fn load_normalized_graph(data_dir: &Path) -> Result<KnowledgeGraph> {
    let path = EnginePaths::under(data_dir).graph;
    load_graph(&path).with_context(|| {
        format!(
            "failed to load {} (run build-graph and normalize-graph first)",
            path.display()
        )
    })
}

fn resolve(data_dir: &Path, query: &str) -> Result<()> {
    let graph = load_normalized_graph(data_dir)?;
    let resolver = EntityResolver::new(
        &graph,
        Arc::new(HashEmbedder::default()),
        ResolverConfig::default(),
    );
    let entities = resolver.resolve(query);

    println!("{}", serde_json::to_string_pretty(&entities)?);
    Ok(())
}

fn ask(data_dir: &Path, query: &str, show_prompt: bool) -> Result<()> {
    let engine = QueryEngine::open(
        &EnginePaths::under(data_dir),
        Arc::new(HashEmbedder::default()),
        EngineConfig::default(),
    )
    .context("failed to open query engine")?;

    let doc = engine
        .assemble_context(query, &[])
        .context("context assembly failed")?;

    println!(
        "focus: {}",
        doc.focus_entity.as_deref().unwrap_or("(none)")
    );
    println!("triples: {}", doc.triple_count);
    println!("chunks: {}", doc.chunk_count);
    if show_prompt {
        println!("\n{}", doc.prompt);
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    std::fs::create_dir_all(&cli.data_dir)
        .with_context(|| format!("failed to create {}", cli.data_dir.display()))?;

    match &cli.command {
        Commands::BuildGraph {
            entities,
            min_cooccurrence,
        } => build_graph(&cli.data_dir, entities, *min_cooccurrence),
        Commands::NormalizeGraph => normalize(&cli.data_dir),
        Commands::BuildIndex {
            docs,
            faqs,
            pages,
            datasets,
            raw,
            chunk_size,
            overlap,
        } => build_index(
            &cli.data_dir,
            docs,
            faqs,
            pages,
            datasets,
            raw,
            *chunk_size,
            *overlap,
        ),
        Commands::Resolve { query } => resolve(&cli.data_dir, query),
        Commands::Ask { query, show_prompt } => ask(&cli.data_dir, query, *show_prompt),
    }
}
