//! # Query Embedding Module
//!
//! ## Purpose
//! Turns raw query text into the fixed 1024-dimension vector consumed by all
//! four per-source retrievers, via an external inference capability.
//!
//! ## Input/Output Specification
//! - **Input**: Query text (truncated to 500 characters upstream)
//! - **Output**: `Vec<f32>` of the configured dimension
//! - **Failure**: `EmbeddingFailed` with a French remediation hint; fatal to
//!   the query, no retry
//!
//! ## Key Features
//! - `Embedder` trait so the pipeline and tests can substitute deterministic
//!   implementations
//! - HTTP implementation against a feature-extraction endpoint, with a
//!   bounded request timeout (a timeout is classified as an embedding failure)
//! - Output shape validation: a vector of the wrong length is rejected here,
//!   never silently passed downstream

use crate::config::EmbeddingConfig;
use crate::errors::{Result, RetrievalError};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

/// Capability interface: `embed(text) -> vector[D]`
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Expected output dimension
    fn dimension(&self) -> usize;
}

/// Embedder backed by an HTTP feature-extraction endpoint
pub struct HttpEmbedder {
    client: reqwest::Client,
    api_url: String,
    token: String,
    dimension: usize,
}

impl HttpEmbedder {
    pub fn new(config: &EmbeddingConfig, token: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| RetrievalError::Internal {
                message: format!("failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            api_url: format!("{}/{}", config.api_url.trim_end_matches('/'), config.model),
            token,
            dimension: config.dimension,
        })
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.token)
            .json(&serde_json::json!({ "inputs": text }))
            .send()
            .await
            .map_err(|e| embedding_failed(transport_detail(&e)))?;

        if !response.status().is_success() {
            return Err(embedding_failed(format!(
                "le service a répondu {}",
                response.status().as_u16()
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|_| embedding_failed("réponse illisible du service".to_string()))?;

        let embedding = flatten_vector(&body);
        if embedding.len() != self.dimension {
            return Err(embedding_failed(format!(
                "dimension inattendue ({} au lieu de {})",
                embedding.len(),
                self.dimension
            )));
        }
        Ok(embedding)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

fn embedding_failed(details: String) -> RetrievalError {
    RetrievalError::EmbeddingFailed { details }
}

/// The user-visible message must not leak transport internals, so reduce
/// reqwest errors to a coarse French description
fn transport_detail(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        "délai d'attente dépassé".to_string()
    } else if e.is_connect() {
        "service d'embedding injoignable".to_string()
    } else {
        "erreur réseau".to_string()
    }
}

/// Flatten the endpoint's response into a 1-D vector. Feature-extraction
/// APIs return either `[f32]` or `[[f32]]` depending on the model.
fn flatten_vector(value: &Value) -> Vec<f32> {
    let mut out = Vec::new();
    collect_numbers(value, &mut out);
    out
}

fn collect_numbers(value: &Value, out: &mut Vec<f32>) {
    match value {
        Value::Number(n) => {
            if let Some(f) = n.as_f64() {
                out.push(f as f32);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_numbers(item, out);
            }
        }
        _ => {}
    }
}
