//! # Synthesis Module
//!
//! ## Purpose
//! Builds the numbered, citation-keyed context block from the filtered
//! results and produces the final prose answer through an external generation
//! capability under a closed-world contract.
//!
//! ## Input/Output Specification
//! - **Input**: Query text, filtered per-source results, generation capability
//! - **Output**: French prose synthesis with inline citations, or the
//!   deterministic no-result sentinel, or a visible error string
//!
//! ## Key Features
//! - Empty-context fast path: the sentinel is returned without calling the
//!   generator at all (cost guard and hallucination guard)
//! - Citation numbers share one counter across the four sources in fixed
//!   order, so `[n]` references are globally unique
//! - A generation failure is folded into the returned string; retrieval
//!   results stay usable

use crate::citation::citation_key;
use crate::config::GenerationConfig;
use crate::errors::{Result, RetrievalError};
use crate::retrieval::SearchResults;
use crate::sources::SourceType;
use crate::utils::truncate_chars;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::error;

/// Deterministic outcome when no source produced a relevant extract.
/// The prompt instructs the model to emit the same sentence when the
/// extracts are insufficient.
pub const NO_RESULT_MESSAGE: &str = "Aucun résultat pertinent trouvé pour cette requête.";

/// Closed-world instruction: answer only from the numbered extracts, cite
/// every claim in French legal citation style.
pub const SYSTEM_PROMPT: &str = "\
Tu es un assistant juridique français expert. Réponds à la question en te basant UNIQUEMENT sur les extraits numérotés fournis. N'utilise aucune connaissance extérieure.

Pour chaque affirmation, cite la source entre crochets selon le style juridique français :
- Articles de loi : [Code civil, art. 1240] ou [C. trav., art. L.1237-19]
- Décisions de justice : [Cass. 1re civ., 13 avr. 2023, n° 21-20.145] ou [CA Paris, 15 janv. 2024]
- Circulaires : [Circ. n° 2023-045, ministère du Travail]
- Réponses ministérielles : [Q. n° 12345, ministère de la Justice]

Si les extraits ne permettent pas de répondre à la question, réponds exactement : \"Aucun résultat pertinent trouvé pour cette requête.\"
Réponds en français, en 3 à 6 phrases de prose juridique claire et structurée.";

const SNIPPET_CHARS: usize = 500;

/// Capability interface: `generate(prompt) -> text`
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, system: &str, user: &str) -> Result<String>;
}

/// Generator backed by an HTTP chat-completion endpoint
pub struct HttpGenerator {
    client: reqwest::Client,
    api_url: String,
    model: String,
    token: String,
    max_tokens: u32,
}

impl HttpGenerator {
    pub fn new(config: &GenerationConfig, token: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| RetrievalError::Internal {
                message: format!("failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            model: config.model.clone(),
            token,
            max_tokens: config.max_tokens,
        })
    }
}

#[async_trait]
impl Generator for HttpGenerator {
    async fn generate(&self, system: &str, user: &str) -> Result<String> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": user },
            ],
            "max_tokens": self.max_tokens,
        });

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(|e| RetrievalError::GenerationFailed {
                details: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(RetrievalError::GenerationFailed {
                details: format!("le service a répondu {}", response.status().as_u16()),
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| RetrievalError::GenerationFailed {
                details: e.to_string(),
            })?;

        body["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| RetrievalError::GenerationFailed {
                details: "réponse du service sans contenu".to_string(),
            })
    }
}

/// Build the numbered context block: one `[n] (citation)` entry per result,
/// sources in fixed order, counter shared across sources.
pub fn format_context(results: &SearchResults) -> String {
    let mut lines = Vec::new();
    let mut counter = 1usize;
    for source in SourceType::ALL {
        for candidate in results.get(source) {
            let snippet = truncate_chars(candidate.record.snippet(), SNIPPET_CHARS);
            let citation = citation_key(&candidate.record);
            lines.push(format!("[{}] ({})\n{}", counter, citation, snippet));
            counter += 1;
        }
    }
    lines.join("\n\n")
}

/// Produce the prose synthesis for a query.
///
/// Never returns an error: an empty context short-circuits to the sentinel
/// without calling the generator, and a generation failure becomes a visible
/// French error string so the structured results remain usable.
pub async fn synthesize(query: &str, results: &SearchResults, generator: &dyn Generator) -> String {
    if results.is_empty() {
        return NO_RESULT_MESSAGE.to_string();
    }

    let context = format_context(results);
    let user = format!("Question : {}\n\nExtraits :\n{}", query, context);

    match generator.generate(SYSTEM_PROMPT, &user).await {
        Ok(text) => text,
        Err(e) => {
            error!(category = e.category(), error = %e, "generation call failed");
            format!("Erreur lors de la synthèse : {}", e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retrieval::RankedCandidate;
    use crate::sources::{ArticleRecord, DecisionRecord, SourceRecord};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingGenerator {
        calls: AtomicUsize,
        response: Result<String>,
    }

    impl CountingGenerator {
        fn ok(text: &str) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                response: Ok(text.to_string()),
            }
        }

        fn failing(details: &str) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                response: Err(RetrievalError::GenerationFailed {
                    details: details.to_string(),
                }),
            }
        }
    }

    #[async_trait]
    impl Generator for CountingGenerator {
        async fn generate(&self, _system: &str, _user: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.response {
                Ok(text) => Ok(text.clone()),
                Err(e) => Err(RetrievalError::GenerationFailed {
                    details: e.to_string(),
                }),
            }
        }
    }

    fn article_candidate(num: &str, text: &str) -> RankedCandidate {
        RankedCandidate {
            record: SourceRecord::Article(ArticleRecord {
                id_legifrance: format!("LEGIARTI{}", num),
                num: Some(num.to_string()),
                code_name: Some("Code civil".to_string()),
                date_debut: None,
                chunk_text: text.to_string(),
                embedding: vec![],
            }),
            score: 0.9,
            source_type: SourceType::Articles,
        }
    }

    fn decision_candidate(text: &str) -> RankedCandidate {
        RankedCandidate {
            record: SourceRecord::Decision(DecisionRecord {
                source_id: Some("21-20.145".to_string()),
                id_judilibre: None,
                jurisdiction: Some("Cass. 1re civ.".to_string()),
                date_decision: Some("13 avr. 2023".to_string()),
                solution: None,
                url_judilibre: None,
                chunk_text: text.to_string(),
                embedding: vec![],
            }),
            score: 0.8,
            source_type: SourceType::Jurisprudence,
        }
    }

    #[tokio::test]
    async fn empty_results_return_sentinel_without_generating() {
        let generator = CountingGenerator::ok("ne devrait pas être appelé");
        let results = SearchResults::default();
        let text = synthesize("question", &results, &generator).await;
        assert_eq!(text, NO_RESULT_MESSAGE);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn generation_failure_becomes_visible_error_string() {
        let generator = CountingGenerator::failing("connexion refusée");
        let results = SearchResults {
            articles: vec![article_candidate("1240", "Tout fait quelconque")],
            ..SearchResults::default()
        };
        let text = synthesize("question", &results, &generator).await;
        assert!(text.starts_with("Erreur lors de la synthèse :"));
        assert!(text.contains("connexion refusée"));
    }

    #[test]
    fn context_numbering_is_global_and_increasing() {
        let results = SearchResults {
            articles: vec![
                article_candidate("1240", "premier extrait"),
                article_candidate("1241", "deuxième extrait"),
            ],
            jurisprudence: vec![decision_candidate("troisième extrait")],
            ..SearchResults::default()
        };
        let context = format_context(&results);
        assert!(context.contains("[1] (Code civil, art. 1240)"));
        assert!(context.contains("[2] (Code civil, art. 1241)"));
        assert!(context.contains("[3] (Cass. 1re civ., 13 avr. 2023, n° 21-20.145)"));
        assert!(!context.contains("[4]"));
    }

    #[test]
    fn context_snippets_are_truncated_to_500_chars() {
        let long = "considérant ".repeat(100);
        let results = SearchResults {
            articles: vec![article_candidate("1240", &long)],
            ..SearchResults::default()
        };
        let context = format_context(&results);
        let body = context.split('\n').nth(1).unwrap();
        assert_eq!(body.chars().count(), 500);
    }
}
