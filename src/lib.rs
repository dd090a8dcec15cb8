//! # Multi-Source French Legal Retrieval Engine
//!
//! ## Overview
//! This library retrieves passages from four heterogeneous French legal
//! corpora (statute articles, court decisions, administrative circulars,
//! ministerial Q&A) for a natural-language query, cross-links the results and
//! produces a citation-grounded prose synthesis.
//!
//! ## Architecture
//! The system is composed of several key modules:
//! - `sources`: The four corpora, their record schemas and accessor sets
//! - `index`: Pre-built per-source vector indexes and the startup snapshot
//! - `embedding`: Query vectorization through an external capability
//! - `retrieval`: Per-source nearest-neighbour retrieval with over-fetch
//! - `filters`: Source-aware post-retrieval filtering
//! - `crossref`: Article-to-decision cross-references
//! - `citation`: French legal citation keys per source
//! - `synthesis`: Closed-world prose synthesis with inline citations
//! - `pipeline`: End-to-end query orchestration
//! - `api`: REST endpoints
//! - `config`: Configuration management and settings
//! - `errors`: Centralized error handling and types
//!
//! ## Input/Output Specification
//! - **Input**: Natural-language legal questions (French), optional filters
//! - **Output**: Prose synthesis with citations plus four structured result
//!   lists
//! - **Degradation**: A source that failed to load yields empty results; only
//!   an embedding failure aborts a query
//!
//! ## Usage
//! ```rust,no_run
//! use juris_retrieval::{Config, CorpusSnapshot, QueryPipeline};
//! use juris_retrieval::embedding::HttpEmbedder;
//! use juris_retrieval::synthesis::HttpGenerator;
//! use juris_retrieval::retrieval::SourceSelector;
//! use juris_retrieval::filters::FilterSet;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_file("config.toml")?;
//!     let snapshot = Arc::new(CorpusSnapshot::load(&config.data.data_dir));
//!     let token = Config::resolve_token(&config.embedding.token_env);
//!     let embedder = Arc::new(HttpEmbedder::new(&config.embedding, token.clone())?);
//!     let generator = Arc::new(HttpGenerator::new(&config.generation, token)?);
//!     let pipeline = QueryPipeline::new(snapshot, embedder, generator);
//!     let response = pipeline
//!         .run_query(
//!             "Quelles sont les conditions de la responsabilité civile ?",
//!             SourceSelector::All,
//!             &FilterSet::default(),
//!         )
//!         .await?;
//!     println!("{}", response.synthesis);
//!     Ok(())
//! }
//! ```

// Core modules
pub mod api;
pub mod citation;
pub mod config;
pub mod crossref;
pub mod embedding;
pub mod errors;
pub mod filters;
pub mod index;
pub mod pipeline;
pub mod retrieval;
pub mod sources;
pub mod synthesis;

// Utilities
pub mod utils;

// Re-exports for convenience
pub use config::Config;
pub use errors::{Result, RetrievalError};
pub use index::CorpusSnapshot;
pub use pipeline::{QueryPipeline, QueryResponse};
pub use sources::SourceType;

use std::sync::Arc;

/// Application state shared across components
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<config::Config>,
    pub snapshot: Arc<index::CorpusSnapshot>,
    pub pipeline: Arc<pipeline::QueryPipeline>,
}
