//! # Query Pipeline Module
//!
//! ## Purpose
//! Orchestrates one query end to end: truncation, embedding, the four
//! per-source retrievals, filtering, cross-reference enrichment of article
//! hits, and synthesis.
//!
//! ## Input/Output Specification
//! - **Input**: Query text, active-source selector, filter set
//! - **Output**: `QueryResponse` with the synthesis text, the four structured
//!   result lists, the per-source load status and a truncation flag
//! - **Failure**: Only an embedding failure is returned as an error; every
//!   other failure degrades inside its component
//!
//! ## Control Flow
//! query text → embed → retrieve ×4 → filter ×4 → cross-reference articles →
//! synthesize. Query handling is a pure read path over the corpus snapshot;
//! nothing is mutated, so concurrent queries share the snapshot freely.

use crate::crossref::{related_decisions, RelatedDecision};
use crate::embedding::Embedder;
use crate::errors::Result;
use crate::index::{CorpusSnapshot, SourceStatus};
use crate::retrieval::{search_all, RankedCandidate, SourceSelector};
use crate::filters::FilterSet;
use crate::sources::{SourceRecord, SourceType};
use crate::synthesis::{synthesize, Generator};
use crate::utils::{truncate_chars, Timer};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

/// Queries longer than this are truncated before embedding
pub const MAX_QUERY_CHARS: usize = 500;

/// Appended to the synthesis when the query was truncated
pub const TRUNCATION_NOTICE: &str = "\n\n⚠️ *Requête tronquée à 500 caractères.*";

/// Shown when the query is empty or whitespace-only; no capability is called
pub const EMPTY_QUERY_MESSAGE: &str = "Veuillez entrer une question juridique.";

/// One result as exposed to the presentation layer
#[derive(Debug, Serialize)]
pub struct Hit {
    #[serde(flatten)]
    pub record: SourceRecord,
    pub score: f32,
    pub source_type: SourceType,
    /// Decisions citing this article; only populated for article hits
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub related_decisions: Vec<RelatedDecision>,
}

/// The four structured result lists
#[derive(Debug, Default, Serialize)]
pub struct SourceResults {
    pub articles: Vec<Hit>,
    pub jurisprudence: Vec<Hit>,
    pub circulaires: Vec<Hit>,
    pub reponses: Vec<Hit>,
}

/// Full response for one query
#[derive(Debug, Serialize)]
pub struct QueryResponse {
    pub synthesis: String,
    pub results: SourceResults,
    /// Per-source load status, so a source that failed to load is
    /// distinguishable from one that returned zero matches
    pub source_status: SourceStatus,
    pub truncated: bool,
}

/// Query orchestrator holding the corpus snapshot and the two capabilities
pub struct QueryPipeline {
    snapshot: Arc<CorpusSnapshot>,
    embedder: Arc<dyn Embedder>,
    generator: Arc<dyn Generator>,
}

impl QueryPipeline {
    pub fn new(
        snapshot: Arc<CorpusSnapshot>,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn Generator>,
    ) -> Self {
        Self {
            snapshot,
            embedder,
            generator,
        }
    }

    pub fn snapshot(&self) -> &CorpusSnapshot {
        &self.snapshot
    }

    /// Process one query end to end.
    ///
    /// Returns `Err` only when the query could not be vectorized; the error
    /// message is user-facing and carries a remediation hint.
    pub async fn run_query(
        &self,
        query: &str,
        selector: SourceSelector,
        filters: &FilterSet,
    ) -> Result<QueryResponse> {
        if query.trim().is_empty() {
            return Ok(QueryResponse {
                synthesis: EMPTY_QUERY_MESSAGE.to_string(),
                results: SourceResults::default(),
                source_status: self.snapshot.status(),
                truncated: false,
            });
        }

        let truncated = query.chars().count() > MAX_QUERY_CHARS;
        let query = if truncated {
            truncate_chars(query, MAX_QUERY_CHARS)
        } else {
            query.to_string()
        };

        let timer = Timer::new("run_query");

        // Fatal on failure: no partial results are meaningful without a vector
        let vector = self.embedder.embed(&query).await?;

        let results = search_all(&self.snapshot, &vector, selector, filters);
        info!(
            articles = results.articles.len(),
            jurisprudence = results.jurisprudence.len(),
            circulaires = results.circulaires.len(),
            reponses = results.reponses.len(),
            "retrieval complete"
        );

        let mut synthesis = synthesize(&query, &results, self.generator.as_ref()).await;
        if truncated {
            synthesis.push_str(TRUNCATION_NOTICE);
        }
        timer.stop();

        Ok(QueryResponse {
            synthesis,
            results: self.assemble_results(results),
            source_status: self.snapshot.status(),
            truncated,
        })
    }

    /// Convert candidates to presentation hits, enriching article results
    /// with the decisions that cite them
    fn assemble_results(&self, results: crate::retrieval::SearchResults) -> SourceResults {
        let jurisprudence_index = self.snapshot.get(SourceType::Jurisprudence);

        let articles = results
            .articles
            .into_iter()
            .map(|candidate| {
                let related = match &candidate.record {
                    SourceRecord::Article(a) => {
                        related_decisions(&a.id_legifrance, jurisprudence_index)
                    }
                    _ => Vec::new(),
                };
                hit_with_related(candidate, related)
            })
            .collect();

        SourceResults {
            articles,
            jurisprudence: plain_hits(results.jurisprudence),
            circulaires: plain_hits(results.circulaires),
            reponses: plain_hits(results.reponses),
        }
    }
}

fn hit_with_related(candidate: RankedCandidate, related: Vec<RelatedDecision>) -> Hit {
    Hit {
        record: candidate.record,
        score: candidate.score,
        source_type: candidate.source_type,
        related_decisions: related,
    }
}

fn plain_hits(candidates: Vec<RankedCandidate>) -> Vec<Hit> {
    candidates
        .into_iter()
        .map(|c| hit_with_related(c, Vec::new()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::RetrievalError;
    use crate::index::SourceIndex;
    use crate::sources::{ArticleRecord, DecisionRecord};
    use crate::synthesis::NO_RESULT_MESSAGE;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedEmbedder {
        vector: Vec<f32>,
        fail: bool,
        calls: AtomicUsize,
    }

    impl FixedEmbedder {
        fn ok(vector: Vec<f32>) -> Self {
            Self {
                vector,
                fail: false,
                calls: AtomicUsize::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                vector: vec![],
                fail: true,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Embedder for FixedEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(RetrievalError::EmbeddingFailed {
                    details: "service indisponible".to_string(),
                })
            } else {
                Ok(self.vector.clone())
            }
        }

        fn dimension(&self) -> usize {
            self.vector.len()
        }
    }

    struct EchoGenerator {
        calls: AtomicUsize,
        fail: bool,
    }

    impl EchoGenerator {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail: true,
            }
        }
    }

    #[async_trait]
    impl Generator for EchoGenerator {
        async fn generate(&self, _system: &str, user: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(RetrievalError::GenerationFailed {
                    details: "panne du service".to_string(),
                })
            } else {
                Ok(format!("Synthèse fondée sur : {}", user.len()))
            }
        }
    }

    fn article(i: usize, id: &str) -> SourceRecord {
        SourceRecord::Article(ArticleRecord {
            id_legifrance: id.to_string(),
            num: Some(format!("{}", 1240 + i)),
            code_name: Some("Code civil".to_string()),
            date_debut: Some("2016-10-01".to_string()),
            chunk_text: "Tout fait quelconque de l'homme".to_string(),
            embedding: vec![1.0, i as f32 * 0.1],
        })
    }

    fn decision(text: &str, i: usize) -> SourceRecord {
        SourceRecord::Decision(DecisionRecord {
            source_id: Some(format!("21-{:05}", i)),
            id_judilibre: None,
            jurisdiction: Some("Cour de cassation".to_string()),
            date_decision: Some("2023-04-13".to_string()),
            solution: Some("Cassation".to_string()),
            url_judilibre: None,
            chunk_text: text.to_string(),
            embedding: vec![1.0, i as f32 * 0.1],
        })
    }

    fn populated_snapshot() -> CorpusSnapshot {
        let articles = SourceIndex::new(
            SourceType::Articles,
            (0..5).map(|i| article(i, &format!("LEGIARTI{:04}", i))).collect(),
        );
        let jurisprudence = SourceIndex::new(
            SourceType::Jurisprudence,
            (0..5)
                .map(|i| decision(&format!("vu l'article LEGIARTI0000, moyen {}", i), i))
                .collect(),
        );
        CorpusSnapshot::empty()
            .with_source(articles)
            .with_source(jurisprudence)
    }

    fn pipeline(
        snapshot: CorpusSnapshot,
        embedder: FixedEmbedder,
        generator: EchoGenerator,
    ) -> (QueryPipeline, Arc<FixedEmbedder>, Arc<EchoGenerator>) {
        let embedder = Arc::new(embedder);
        let generator = Arc::new(generator);
        (
            QueryPipeline::new(Arc::new(snapshot), embedder.clone(), generator.clone()),
            embedder,
            generator,
        )
    }

    #[tokio::test]
    async fn full_query_returns_results_and_cross_references() {
        let (pipeline, _, _) = pipeline(
            populated_snapshot(),
            FixedEmbedder::ok(vec![1.0, 0.0]),
            EchoGenerator::new(),
        );
        let response = pipeline
            .run_query(
                "responsabilité civile délictuelle",
                SourceSelector::All,
                &FilterSet::default(),
            )
            .await
            .unwrap();

        assert_eq!(response.results.articles.len(), 3);
        assert_eq!(response.results.jurisprudence.len(), 3);
        assert!(response.synthesis.starts_with("Synthèse"));
        assert!(!response.truncated);

        // the top article is LEGIARTI0000, cited by every decision
        let top = &response.results.articles[0];
        assert!(!top.related_decisions.is_empty());
        assert!(top.related_decisions.len() <= 3);
    }

    #[tokio::test]
    async fn embedding_failure_aborts_before_generation() {
        let generator = EchoGenerator::new();
        let (pipeline, _, generator) =
            pipeline(populated_snapshot(), FixedEmbedder::failing(), generator);
        let err = pipeline
            .run_query("question", SourceSelector::All, &FilterSet::default())
            .await
            .unwrap_err();
        assert!(err.is_fatal_to_query());
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn generation_failure_keeps_structured_results() {
        let (pipeline, _, _) = pipeline(
            populated_snapshot(),
            FixedEmbedder::ok(vec![1.0, 0.0]),
            EchoGenerator::failing(),
        );
        let response = pipeline
            .run_query("question", SourceSelector::All, &FilterSet::default())
            .await
            .unwrap();
        assert!(response.synthesis.contains("Erreur lors de la synthèse"));
        assert!(!response.results.articles.is_empty());
    }

    #[tokio::test]
    async fn all_sources_absent_yield_sentinel_and_empty_lists() {
        let generator = EchoGenerator::new();
        let (pipeline, embedder, generator) = pipeline(
            CorpusSnapshot::empty(),
            FixedEmbedder::ok(vec![1.0, 0.0]),
            generator,
        );
        let response = pipeline
            .run_query("question", SourceSelector::All, &FilterSet::default())
            .await
            .unwrap();

        assert_eq!(response.synthesis, NO_RESULT_MESSAGE);
        assert!(response.results.articles.is_empty());
        assert!(response.results.reponses.is_empty());
        assert!(!response.source_status.articles);
        // embed still runs first in the degraded state; generation never does
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 1);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn long_query_is_truncated_with_notice() {
        let (pipeline, _, _) = pipeline(
            populated_snapshot(),
            FixedEmbedder::ok(vec![1.0, 0.0]),
            EchoGenerator::new(),
        );
        let long_query = "quelle est la règle ? ".repeat(60);
        assert!(long_query.chars().count() > MAX_QUERY_CHARS);

        let response = pipeline
            .run_query(&long_query, SourceSelector::All, &FilterSet::default())
            .await
            .unwrap();
        assert!(response.truncated);
        assert!(response.synthesis.ends_with(TRUNCATION_NOTICE));
    }

    #[tokio::test]
    async fn empty_query_short_circuits_without_capability_calls() {
        let generator = EchoGenerator::new();
        let (pipeline, embedder, generator) = pipeline(
            populated_snapshot(),
            FixedEmbedder::ok(vec![1.0, 0.0]),
            generator,
        );
        let response = pipeline
            .run_query("   ", SourceSelector::All, &FilterSet::default())
            .await
            .unwrap();
        assert_eq!(response.synthesis, EMPTY_QUERY_MESSAGE);
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    }
}
