//! # Cross-Reference Module
//!
//! ## Purpose
//! Links statute articles to court decisions that textually cite them, so an
//! article result can surface the case law applying it.
//!
//! ## Input/Output Specification
//! - **Input**: An article's Légifrance identifier, the jurisprudence index
//! - **Output**: At most three decision summaries, in corpus order
//!
//! ## Key Features
//! - Linear scan with substring containment; stops at the third match, so the
//!   lookup is bounded and deterministic with respect to corpus order
//! - Absent index or empty identifier returns an empty list, never an error

use crate::index::SourceIndex;
use crate::sources::SourceRecord;
use crate::utils::truncate_chars;
use serde::Serialize;

/// Upper bound on related decisions per article
pub const MAX_RELATED: usize = 3;

const SNIPPET_CHARS: usize = 300;

/// Summary of a decision citing a given article
#[derive(Debug, Clone, Serialize)]
pub struct RelatedDecision {
    pub jurisdiction: String,
    pub date_decision: String,
    pub solution: String,
    pub url_judilibre: String,
    pub chunk_text: String,
}

/// Find up to [`MAX_RELATED`] decisions whose text mentions the article
/// identifier.
pub fn related_decisions(
    article_id: &str,
    jurisprudence: Option<&SourceIndex>,
) -> Vec<RelatedDecision> {
    let index = match jurisprudence {
        Some(index) if !article_id.is_empty() => index,
        _ => return Vec::new(),
    };

    let mut related = Vec::new();
    for record in index.records() {
        let decision = match record {
            SourceRecord::Decision(d) => d,
            _ => continue,
        };
        if decision.chunk_text.contains(article_id) {
            related.push(RelatedDecision {
                jurisdiction: decision.jurisdiction.clone().unwrap_or_default(),
                date_decision: decision.date_decision.clone().unwrap_or_default(),
                solution: decision.solution.clone().unwrap_or_default(),
                url_judilibre: decision.url_judilibre.clone().unwrap_or_default(),
                chunk_text: truncate_chars(&decision.chunk_text, SNIPPET_CHARS),
            });
            if related.len() >= MAX_RELATED {
                break;
            }
        }
    }
    related
}
