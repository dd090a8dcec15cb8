//! # Result Filtering Module
//!
//! ## Purpose
//! Source-aware post-retrieval filtering: date range, jurisdiction,
//! legal code and ministry, composed as a logical AND.
//!
//! ## Input/Output Specification
//! - **Input**: Ordered candidate list, optional filter set
//! - **Output**: Order-preserving subsequence of the input
//! - **Policy**: A record whose date cannot be parsed is kept, not excluded —
//!   absence of a reliable date must not silently delete real content
//!
//! ## Key Features
//! - Each filter is independently optional; an empty set is the identity
//! - Filtering never reorders, so applying it twice equals applying it once

use crate::retrieval::RankedCandidate;
use crate::sources::SourceType;
use serde::{Deserialize, Serialize};

/// Optional post-retrieval constraints. Absent field = no constraint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterSet {
    /// Keep records whose year is >= this
    pub date_from: Option<i32>,
    /// Keep records whose year is <= this
    pub date_to: Option<i32>,
    /// Exact jurisdiction match; applies to jurisprudence only
    pub jurisdiction: Option<String>,
    /// Exact legal-code match; applies to articles only
    pub code_name: Option<String>,
    /// Exact ministry match; applies to circulaires and reponses
    pub ministere: Option<String>,
}

impl FilterSet {
    pub fn is_empty(&self) -> bool {
        self.date_from.is_none()
            && self.date_to.is_none()
            && self.jurisdiction.is_none()
            && self.code_name.is_none()
            && self.ministere.is_none()
    }

    /// Keep the candidates matching every active filter, in input order
    pub fn apply(&self, candidates: Vec<RankedCandidate>) -> Vec<RankedCandidate> {
        if self.is_empty() {
            return candidates;
        }
        candidates.into_iter().filter(|c| self.matches(c)).collect()
    }

    fn matches(&self, candidate: &RankedCandidate) -> bool {
        if self.date_from.is_some() || self.date_to.is_some() {
            // Unparseable or missing dates pass through
            if let Some(year) = candidate.record.date().and_then(year_prefix) {
                if let Some(from) = self.date_from {
                    if year < from {
                        return false;
                    }
                }
                if let Some(to) = self.date_to {
                    if year > to {
                        return false;
                    }
                }
            }
        }

        if let Some(jurisdiction) = &self.jurisdiction {
            if candidate.source_type == SourceType::Jurisprudence
                && candidate.record.jurisdiction() != Some(jurisdiction.as_str())
            {
                return false;
            }
        }

        if let Some(code_name) = &self.code_name {
            if candidate.source_type == SourceType::Articles
                && candidate.record.code_name() != Some(code_name.as_str())
            {
                return false;
            }
        }

        if let Some(ministere) = &self.ministere {
            if matches!(
                candidate.source_type,
                SourceType::Circulaires | SourceType::Reponses
            ) && candidate.record.ministere() != Some(ministere.as_str())
            {
                return false;
            }
        }

        true
    }
}

/// Parse the 4-digit year prefix of a date string, e.g. "2023-04-13" -> 2023
fn year_prefix(date: &str) -> Option<i32> {
    let prefix: String = date.chars().take(4).collect();
    prefix.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::{ArticleRecord, CirculaireRecord, DecisionRecord, SourceRecord};

    fn article(id: &str, code: Option<&str>, date: Option<&str>) -> RankedCandidate {
        RankedCandidate {
            record: SourceRecord::Article(ArticleRecord {
                id_legifrance: id.to_string(),
                num: None,
                code_name: code.map(str::to_string),
                date_debut: date.map(str::to_string),
                chunk_text: String::new(),
                embedding: vec![],
            }),
            score: 0.9,
            source_type: SourceType::Articles,
        }
    }

    fn decision(jurisdiction: &str, date: &str) -> RankedCandidate {
        RankedCandidate {
            record: SourceRecord::Decision(DecisionRecord {
                source_id: None,
                id_judilibre: None,
                jurisdiction: Some(jurisdiction.to_string()),
                date_decision: Some(date.to_string()),
                solution: None,
                url_judilibre: None,
                chunk_text: String::new(),
                embedding: vec![],
            }),
            score: 0.8,
            source_type: SourceType::Jurisprudence,
        }
    }

    fn circulaire(ministere: &str) -> RankedCandidate {
        RankedCandidate {
            record: SourceRecord::Circulaire(CirculaireRecord {
                numero: Some("2023-001".to_string()),
                source_id: None,
                ministere: Some(ministere.to_string()),
                date_parution: None,
                chunk_text: String::new(),
                embedding: vec![],
            }),
            score: 0.7,
            source_type: SourceType::Circulaires,
        }
    }

    fn ids(candidates: &[RankedCandidate]) -> Vec<String> {
        candidates
            .iter()
            .map(|c| match &c.record {
                SourceRecord::Article(a) => a.id_legifrance.clone(),
                _ => String::new(),
            })
            .collect()
    }

    #[test]
    fn empty_filter_set_is_identity() {
        let input = vec![article("A", None, None), article("B", None, None)];
        let filters = FilterSet::default();
        assert!(filters.is_empty());
        assert_eq!(filters.apply(input).len(), 2);
    }

    #[test]
    fn date_range_excludes_by_year_prefix() {
        let input = vec![
            article("A", None, Some("1999-01-01")),
            article("B", None, Some("2010-06-15")),
            article("C", None, Some("2030-01-01")),
        ];
        let filters = FilterSet {
            date_from: Some(2000),
            date_to: Some(2026),
            ..FilterSet::default()
        };
        assert_eq!(ids(&filters.apply(input)), vec!["B"]);
    }

    #[test]
    fn unparseable_dates_are_kept() {
        let input = vec![
            article("A", None, Some("date inconnue")),
            article("B", None, None),
            article("C", None, Some("1980-01-01")),
        ];
        let filters = FilterSet {
            date_from: Some(2000),
            ..FilterSet::default()
        };
        assert_eq!(ids(&filters.apply(input)), vec!["A", "B"]);
    }

    #[test]
    fn jurisdiction_filter_only_touches_jurisprudence() {
        let filters = FilterSet {
            jurisdiction: Some("Cour de cassation".to_string()),
            ..FilterSet::default()
        };
        let kept = filters.apply(vec![
            decision("Cour de cassation", "2023-01-01"),
            decision("Cour d'appel", "2023-01-01"),
            // articles pass even though they have no jurisdiction
            article("A", None, None),
        ]);
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn code_filter_only_touches_articles() {
        let filters = FilterSet {
            code_name: Some("Code civil".to_string()),
            ..FilterSet::default()
        };
        let kept = filters.apply(vec![
            article("A", Some("Code civil"), None),
            article("B", Some("Code du travail"), None),
            decision("Cour de cassation", "2023-01-01"),
        ]);
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn ministry_filter_touches_circulaires_and_reponses() {
        let filters = FilterSet {
            ministere: Some("ministère du Travail".to_string()),
            ..FilterSet::default()
        };
        let kept = filters.apply(vec![
            circulaire("ministère du Travail"),
            circulaire("ministère de la Justice"),
        ]);
        assert_eq!(kept.len(), 1);
    }

    #[test]
    fn filtering_is_idempotent_and_order_preserving() {
        let input = vec![
            article("A", Some("Code civil"), Some("2020-01-01")),
            article("B", Some("Code du travail"), Some("2021-01-01")),
            article("C", Some("Code civil"), Some("2022-01-01")),
        ];
        let filters = FilterSet {
            code_name: Some("Code civil".to_string()),
            ..FilterSet::default()
        };
        let once = filters.apply(input);
        let twice = filters.apply(once.clone());
        assert_eq!(ids(&once), vec!["A", "C"]);
        assert_eq!(ids(&once), ids(&twice));
    }
}
