//! # Vector Index Module
//!
//! ## Purpose
//! Wraps the pre-built per-source nearest-neighbour indexes. The corpora are
//! produced by an upstream ingestion pipeline (chunking + embedding); this
//! module only loads them and answers ranked similarity queries.
//!
//! ## Input/Output Specification
//! - **Input**: One JSONL file per source (`{data_dir}/{source}.jsonl`), each
//!   line a record carrying its embedding
//! - **Output**: Ranked `(ordinal, score)` candidates per query vector
//!
//! ## Key Features
//! - Exact cosine-similarity scan with a deterministic total order: score
//!   descending, ties broken by record ordinal ascending
//! - `CorpusSnapshot`: immutable startup snapshot of the four indexes and
//!   their load status, threaded through query handling (no process-wide
//!   mutable state)
//! - Graceful degradation: a source that fails to load is a permanent,
//!   query-visible absent state, not a per-query error

use crate::errors::{Result, RetrievalError};
use crate::sources::{
    ArticleRecord, CirculaireRecord, DecisionRecord, ReponseRecord, SourceRecord, SourceType,
};
use serde::Serialize;
use std::io::BufRead;
use std::path::Path;
use tracing::{info, warn};

/// One corpus plus its nearest-neighbour structure. Read-only for the
/// lifetime of the process.
pub struct SourceIndex {
    source: SourceType,
    records: Vec<SourceRecord>,
    dimension: usize,
}

impl SourceIndex {
    pub fn new(source: SourceType, records: Vec<SourceRecord>) -> Self {
        let dimension = records.first().map(|r| r.embedding().len()).unwrap_or(0);
        Self {
            source,
            records,
            dimension,
        }
    }

    pub fn source(&self) -> SourceType {
        self.source
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in stable corpus order; ordinals returned by `nearest`
    /// index into this slice
    pub fn records(&self) -> &[SourceRecord] {
        &self.records
    }

    pub fn get(&self, ordinal: usize) -> Option<&SourceRecord> {
        self.records.get(ordinal)
    }

    /// Rank the whole corpus against a query vector and return the top
    /// `limit` `(ordinal, score)` pairs.
    ///
    /// Ordering is total and reproducible: cosine similarity descending,
    /// ties broken by the record's stable corpus ordinal.
    pub fn nearest(&self, query: &[f32], limit: usize) -> Result<Vec<(usize, f32)>> {
        if self.records.is_empty() {
            return Ok(Vec::new());
        }
        if query.len() != self.dimension {
            return Err(RetrievalError::IndexSearch {
                source: self.source.key().to_string(),
                details: format!(
                    "query dimension {} does not match index dimension {}",
                    query.len(),
                    self.dimension
                ),
            });
        }

        let mut scored: Vec<(usize, f32)> = self
            .records
            .iter()
            .enumerate()
            .map(|(ordinal, record)| (ordinal, cosine_similarity(query, record.embedding())))
            .collect();

        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        scored.truncate(limit);
        Ok(scored)
    }
}

/// Cosine similarity; zero vectors score 0.0
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Per-source load status, exposed so the presentation layer can tell a
/// source that failed to load apart from one that returned zero matches
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct SourceStatus {
    pub articles: bool,
    pub jurisprudence: bool,
    pub circulaires: bool,
    pub reponses: bool,
}

/// Immutable snapshot of the four source indexes, built once at startup.
///
/// Queries only read it; concurrent queries share it without locking.
pub struct CorpusSnapshot {
    articles: Option<SourceIndex>,
    jurisprudence: Option<SourceIndex>,
    circulaires: Option<SourceIndex>,
    reponses: Option<SourceIndex>,
}

impl CorpusSnapshot {
    /// Snapshot with every source absent; useful for degraded startup and tests
    pub fn empty() -> Self {
        Self {
            articles: None,
            jurisprudence: None,
            circulaires: None,
            reponses: None,
        }
    }

    pub fn with_source(mut self, index: SourceIndex) -> Self {
        match index.source() {
            SourceType::Articles => self.articles = Some(index),
            SourceType::Jurisprudence => self.jurisprudence = Some(index),
            SourceType::Circulaires => self.circulaires = Some(index),
            SourceType::Reponses => self.reponses = Some(index),
        }
        self
    }

    /// Load all four corpora from `data_dir`. A source that fails to load is
    /// logged and left absent; the snapshot is always returned.
    pub fn load(data_dir: &Path) -> Self {
        let mut snapshot = Self::empty();
        for source in SourceType::ALL {
            let path = data_dir.join(format!("{}.jsonl", source.key()));
            match load_source(&path, source) {
                Ok(index) => {
                    info!(source = source.key(), rows = index.len(), "source loaded");
                    snapshot = snapshot.with_source(index);
                }
                Err(e) => {
                    warn!(source = source.key(), error = %e, "source unavailable");
                }
            }
        }
        snapshot
    }

    pub fn get(&self, source: SourceType) -> Option<&SourceIndex> {
        match source {
            SourceType::Articles => self.articles.as_ref(),
            SourceType::Jurisprudence => self.jurisprudence.as_ref(),
            SourceType::Circulaires => self.circulaires.as_ref(),
            SourceType::Reponses => self.reponses.as_ref(),
        }
    }

    pub fn status(&self) -> SourceStatus {
        SourceStatus {
            articles: self.articles.is_some(),
            jurisprudence: self.jurisprudence.is_some(),
            circulaires: self.circulaires.is_some(),
            reponses: self.reponses.is_some(),
        }
    }

    /// Sorted distinct legal-code names from the articles corpus, for the
    /// filter dropdown. Empty when the source is absent.
    pub fn code_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .articles
            .iter()
            .flat_map(|idx| idx.records())
            .filter_map(|r| r.code_name())
            .map(str::to_string)
            .collect();
        names.sort();
        names.dedup();
        names
    }

    /// Sorted distinct non-empty ministry names from the circulars corpus
    pub fn ministeres(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .circulaires
            .iter()
            .flat_map(|idx| idx.records())
            .filter_map(|r| r.ministere())
            .filter(|m| !m.is_empty())
            .map(str::to_string)
            .collect();
        names.sort();
        names.dedup();
        names
    }
}

/// Load one source corpus from a JSONL file
fn load_source(path: &Path, source: SourceType) -> Result<SourceIndex> {
    let file = std::fs::File::open(path).map_err(|e| RetrievalError::SourceLoad {
        source: source.key().to_string(),
        details: format!("cannot open {}: {}", path.display(), e),
    })?;

    let reader = std::io::BufReader::new(file);
    let mut records = Vec::new();
    for (line_no, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| RetrievalError::SourceLoad {
            source: source.key().to_string(),
            details: format!("read error at line {}: {}", line_no + 1, e),
        })?;
        if line.trim().is_empty() {
            continue;
        }
        let record = parse_record(&line, source).map_err(|e| RetrievalError::SourceLoad {
            source: source.key().to_string(),
            details: format!("parse error at line {}: {}", line_no + 1, e),
        })?;
        records.push(record);
    }

    Ok(SourceIndex::new(source, records))
}

fn parse_record(line: &str, source: SourceType) -> serde_json::Result<SourceRecord> {
    Ok(match source {
        SourceType::Articles => SourceRecord::Article(serde_json::from_str::<ArticleRecord>(line)?),
        SourceType::Jurisprudence => {
            SourceRecord::Decision(serde_json::from_str::<DecisionRecord>(line)?)
        }
        SourceType::Circulaires => {
            SourceRecord::Circulaire(serde_json::from_str::<CirculaireRecord>(line)?)
        }
        SourceType::Reponses => SourceRecord::Reponse(serde_json::from_str::<ReponseRecord>(line)?),
    })
}
