//! # Legal Sources Module
//!
//! ## Purpose
//! Defines the four fixed French legal corpora and their record schemas:
//! statute articles (Légifrance), court decisions (Judilibre), administrative
//! circulars, and ministerial questions/answers.
//!
//! ## Input/Output Specification
//! - **Input**: Pre-embedded corpus rows (JSONL, one record per line)
//! - **Output**: Typed records with uniform accessors for date, snippet and
//!   classification fields
//!
//! ## Key Features
//! - `SourceType` tagged enum selecting the per-source accessor set, so the
//!   date/snippet/identifier field differences stay in one place instead of
//!   being probed ad hoc at each call site
//! - Every record belongs to exactly one source and never migrates

use serde::{Deserialize, Serialize};

/// The four fixed legal corpora
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Articles,
    Jurisprudence,
    Circulaires,
    Reponses,
}

impl SourceType {
    /// Fixed iteration order, also the context-assembly order for synthesis
    pub const ALL: [SourceType; 4] = [
        SourceType::Articles,
        SourceType::Jurisprudence,
        SourceType::Circulaires,
        SourceType::Reponses,
    ];

    /// Stable key used for corpus file names, logs and API payloads
    pub fn key(&self) -> &'static str {
        match self {
            SourceType::Articles => "articles",
            SourceType::Jurisprudence => "jurisprudence",
            SourceType::Circulaires => "circulaires",
            SourceType::Reponses => "reponses",
        }
    }

    /// Default number of results per query. Asymmetric: article hits are
    /// structurally denser and more often the primary answer anchor.
    pub fn default_k(&self) -> usize {
        match self {
            SourceType::Articles => 3,
            SourceType::Jurisprudence => 3,
            SourceType::Circulaires => 2,
            SourceType::Reponses => 1,
        }
    }
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// One chunk of a statute article
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleRecord {
    /// Légifrance identifier, e.g. "LEGIARTI000006419320"
    #[serde(default)]
    pub id_legifrance: String,
    /// Article number, e.g. "1240" or "L.1237-19"
    #[serde(default)]
    pub num: Option<String>,
    /// Legal code the article belongs to, e.g. "Code civil"
    #[serde(default)]
    pub code_name: Option<String>,
    /// Date the current version came into force
    #[serde(default, rename = "article_dateDebut")]
    pub date_debut: Option<String>,
    #[serde(default)]
    pub chunk_text: String,
    #[serde(default, skip_serializing)]
    pub embedding: Vec<f32>,
}

/// One chunk of a court decision
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionRecord {
    #[serde(default)]
    pub source_id: Option<String>,
    #[serde(default)]
    pub id_judilibre: Option<String>,
    /// Deciding court, e.g. "Cour de cassation"
    #[serde(default)]
    pub jurisdiction: Option<String>,
    #[serde(default)]
    pub date_decision: Option<String>,
    /// Outcome of the decision, e.g. "Cassation partielle"
    #[serde(default)]
    pub solution: Option<String>,
    #[serde(default)]
    pub url_judilibre: Option<String>,
    #[serde(default)]
    pub chunk_text: String,
    #[serde(default, skip_serializing)]
    pub embedding: Vec<f32>,
}

/// One chunk of an administrative circular
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CirculaireRecord {
    /// Circular number, e.g. "2023-045"
    #[serde(default)]
    pub numero: Option<String>,
    #[serde(default)]
    pub source_id: Option<String>,
    #[serde(default)]
    pub ministere: Option<String>,
    #[serde(default)]
    pub date_parution: Option<String>,
    #[serde(default)]
    pub chunk_text: String,
    #[serde(default, skip_serializing)]
    pub embedding: Vec<f32>,
}

/// One ministerial question/answer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReponseRecord {
    #[serde(default)]
    pub numero_question: Option<String>,
    #[serde(default)]
    pub source_id: Option<String>,
    #[serde(default)]
    pub ministere: Option<String>,
    #[serde(default)]
    pub date_reponse: Option<String>,
    #[serde(default)]
    pub chunk_text: String,
    #[serde(default, skip_serializing)]
    pub embedding: Vec<f32>,
}

/// A record from any of the four corpora.
///
/// Serialized untagged so API payloads expose the source's native fields;
/// the owning result carries `source_type` separately.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum SourceRecord {
    Article(ArticleRecord),
    Decision(DecisionRecord),
    Circulaire(CirculaireRecord),
    Reponse(ReponseRecord),
}

impl SourceRecord {
    pub fn source_type(&self) -> SourceType {
        match self {
            SourceRecord::Article(_) => SourceType::Articles,
            SourceRecord::Decision(_) => SourceType::Jurisprudence,
            SourceRecord::Circulaire(_) => SourceType::Circulaires,
            SourceRecord::Reponse(_) => SourceType::Reponses,
        }
    }

    /// Text chunk used for relevance context, citations and cross-references
    pub fn snippet(&self) -> &str {
        match self {
            SourceRecord::Article(r) => &r.chunk_text,
            SourceRecord::Decision(r) => &r.chunk_text,
            SourceRecord::Circulaire(r) => &r.chunk_text,
            SourceRecord::Reponse(r) => &r.chunk_text,
        }
    }

    /// Source-specific date field: article start date, decision date,
    /// circular publication date, response date
    pub fn date(&self) -> Option<&str> {
        match self {
            SourceRecord::Article(r) => r.date_debut.as_deref(),
            SourceRecord::Decision(r) => r.date_decision.as_deref(),
            SourceRecord::Circulaire(r) => r.date_parution.as_deref(),
            SourceRecord::Reponse(r) => r.date_reponse.as_deref(),
        }
    }

    /// Jurisdiction classification; only decisions carry one
    pub fn jurisdiction(&self) -> Option<&str> {
        match self {
            SourceRecord::Decision(r) => r.jurisdiction.as_deref(),
            _ => None,
        }
    }

    /// Legal-code classification; only articles carry one
    pub fn code_name(&self) -> Option<&str> {
        match self {
            SourceRecord::Article(r) => r.code_name.as_deref(),
            _ => None,
        }
    }

    /// Ministry classification; circulars and ministerial answers carry one
    pub fn ministere(&self) -> Option<&str> {
        match self {
            SourceRecord::Circulaire(r) => r.ministere.as_deref(),
            SourceRecord::Reponse(r) => r.ministere.as_deref(),
            _ => None,
        }
    }

    pub fn embedding(&self) -> &[f32] {
        match self {
            SourceRecord::Article(r) => &r.embedding,
            SourceRecord::Decision(r) => &r.embedding,
            SourceRecord::Circulaire(r) => &r.embedding,
            SourceRecord::Reponse(r) => &r.embedding,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_source_order() {
        let keys: Vec<&str> = SourceType::ALL.iter().map(|s| s.key()).collect();
        assert_eq!(
            keys,
            vec!["articles", "jurisprudence", "circulaires", "reponses"]
        );
    }

    #[test]
    fn default_k_per_source() {
        assert_eq!(SourceType::Articles.default_k(), 3);
        assert_eq!(SourceType::Jurisprudence.default_k(), 3);
        assert_eq!(SourceType::Circulaires.default_k(), 2);
        assert_eq!(SourceType::Reponses.default_k(), 1);
    }

    #[test]
    fn date_accessor_follows_source_schema() {
        let article = SourceRecord::Article(ArticleRecord {
            id_legifrance: "LEGIARTI000006419320".into(),
            num: Some("1240".into()),
            code_name: Some("Code civil".into()),
            date_debut: Some("2016-10-01".into()),
            chunk_text: String::new(),
            embedding: vec![],
        });
        assert_eq!(article.date(), Some("2016-10-01"));

        let decision = SourceRecord::Decision(DecisionRecord {
            source_id: None,
            id_judilibre: None,
            jurisdiction: Some("Cour de cassation".into()),
            date_decision: Some("2023-04-13".into()),
            solution: None,
            url_judilibre: None,
            chunk_text: String::new(),
            embedding: vec![],
        });
        assert_eq!(decision.date(), Some("2023-04-13"));
        assert_eq!(decision.jurisdiction(), Some("Cour de cassation"));
        assert_eq!(decision.code_name(), None);
    }

    #[test]
    fn record_deserializes_with_missing_optionals() {
        let r: ArticleRecord =
            serde_json::from_str(r#"{"id_legifrance":"LEGIARTI0001","chunk_text":"texte"}"#)
                .unwrap();
        assert!(r.num.is_none());
        assert!(r.embedding.is_empty());
    }

    #[test]
    fn embedding_is_not_serialized() {
        let r = ArticleRecord {
            id_legifrance: "LEGIARTI0001".into(),
            num: None,
            code_name: None,
            date_debut: None,
            chunk_text: "texte".into(),
            embedding: vec![0.1, 0.2],
        };
        let json = serde_json::to_string(&r).unwrap();
        assert!(!json.contains("embedding"));
    }
}
