//! # Per-Source Retrieval Module
//!
//! ## Purpose
//! Runs nearest-neighbour search against each source index and assembles the
//! four ranked, filtered candidate lists for one query vector.
//!
//! ## Input/Output Specification
//! - **Input**: Query vector, corpus snapshot, active-source selector, filters
//! - **Output**: `{articles, jurisprudence, circulaires, reponses}` candidate
//!   lists, each ordered by score and at most `k` long
//!
//! ## Key Features
//! - Over-fetches `k × 5` candidates before filtering so post-filter output
//!   stays close to `k`
//! - Graceful degradation: an absent index or a failed search yields an empty
//!   list, never an error — one broken source must not fail the whole query

use crate::filters::FilterSet;
use crate::index::{CorpusSnapshot, SourceIndex};
use crate::sources::{SourceRecord, SourceType};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Fixed over-fetch factor applied before filtering; not configurable per call
pub const OVERFETCH_FACTOR: usize = 5;

/// One record returned by nearest-neighbour search, before or after filtering
#[derive(Debug, Clone, Serialize)]
pub struct RankedCandidate {
    #[serde(flatten)]
    pub record: SourceRecord,
    pub score: f32,
    pub source_type: SourceType,
}

/// Active-source selector. Serialized values match the UI labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SourceSelector {
    #[default]
    #[serde(rename = "Tous")]
    All,
    Articles,
    Jurisprudence,
    Circulaires,
    #[serde(rename = "Q&R")]
    Reponses,
}

impl SourceSelector {
    pub fn includes(&self, source: SourceType) -> bool {
        match self {
            SourceSelector::All => true,
            SourceSelector::Articles => source == SourceType::Articles,
            SourceSelector::Jurisprudence => source == SourceType::Jurisprudence,
            SourceSelector::Circulaires => source == SourceType::Circulaires,
            SourceSelector::Reponses => source == SourceType::Reponses,
        }
    }
}

/// Filtered candidate lists keyed by source, in fixed source order
#[derive(Debug, Default)]
pub struct SearchResults {
    pub articles: Vec<RankedCandidate>,
    pub jurisprudence: Vec<RankedCandidate>,
    pub circulaires: Vec<RankedCandidate>,
    pub reponses: Vec<RankedCandidate>,
}

impl SearchResults {
    pub fn get(&self, source: SourceType) -> &[RankedCandidate] {
        match source {
            SourceType::Articles => &self.articles,
            SourceType::Jurisprudence => &self.jurisprudence,
            SourceType::Circulaires => &self.circulaires,
            SourceType::Reponses => &self.reponses,
        }
    }

    fn set(&mut self, source: SourceType, candidates: Vec<RankedCandidate>) {
        match source {
            SourceType::Articles => self.articles = candidates,
            SourceType::Jurisprudence => self.jurisprudence = candidates,
            SourceType::Circulaires => self.circulaires = candidates,
            SourceType::Reponses => self.reponses = candidates,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
            && self.jurisprudence.is_empty()
            && self.circulaires.is_empty()
            && self.reponses.is_empty()
    }
}

/// Retrieve up to `k` candidates from one source index.
///
/// Callers that run a filter pass should use [`retrieve_overfetched`] and
/// truncate to `k` after filtering, so the over-fetch headroom is not lost.
pub fn retrieve(
    index: Option<&SourceIndex>,
    query: &[f32],
    k: usize,
    source: SourceType,
) -> Vec<RankedCandidate> {
    let mut candidates = retrieve_overfetched(index, query, k, source);
    candidates.truncate(k);
    candidates
}

/// The over-fetched candidate list (`≤ k × OVERFETCH_FACTOR`), used when a
/// filter pass runs before the final truncation to `k`
pub fn retrieve_overfetched(
    index: Option<&SourceIndex>,
    query: &[f32],
    k: usize,
    source: SourceType,
) -> Vec<RankedCandidate> {
    let index = match index {
        Some(index) => index,
        None => return Vec::new(),
    };

    let ranked = match index.nearest(query, k * OVERFETCH_FACTOR) {
        Ok(ranked) => ranked,
        Err(e) => {
            warn!(source = source.key(), error = %e, "nearest-neighbour search failed");
            return Vec::new();
        }
    };

    ranked
        .into_iter()
        .filter_map(|(ordinal, score)| {
            index.get(ordinal).map(|record| RankedCandidate {
                record: record.clone(),
                score,
                source_type: source,
            })
        })
        .collect()
}

/// Run retrieval plus filtering across all four sources.
///
/// Sources excluded by the selector get an empty list without touching
/// their index. The four retrievals are independent reads of immutable
/// indexes; they run sequentially since each is an in-memory scan.
pub fn search_all(
    snapshot: &CorpusSnapshot,
    query: &[f32],
    selector: SourceSelector,
    filters: &FilterSet,
) -> SearchResults {
    let mut results = SearchResults::default();
    for source in SourceType::ALL {
        if !selector.includes(source) {
            continue;
        }
        let k = source.default_k();
        let overfetched = retrieve_overfetched(snapshot.get(source), query, k, source);
        let mut filtered = filters.apply(overfetched);
        filtered.truncate(k);
        results.set(source, filtered);
    }
    results
}
