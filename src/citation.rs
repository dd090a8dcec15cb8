//! # Citation Formatting Module
//!
//! ## Purpose
//! Maps each source's result shape to its French legal citation string.
//!
//! ## Input/Output Specification
//! - **Input**: A record from any of the four corpora
//! - **Output**: A short human-readable citation key
//! - **Totality**: Always returns a string; missing fields fall back to
//!   placeholders ("?", "Code", "Cass."), never to an error
//!
//! ## Grammar
//! - articles: `{code_name}, art. {num}`
//! - jurisprudence: `{jurisdiction}, {date}, n° {id}`
//! - circulaires: `Circ. n° {numero}, {ministere}`
//! - reponses: `Q. n° {numero_question}`

use crate::sources::{ArticleRecord, CirculaireRecord, DecisionRecord, ReponseRecord, SourceRecord};

/// Citation key for any record; recomputed on demand, never stored
pub fn citation_key(record: &SourceRecord) -> String {
    match record {
        SourceRecord::Article(r) => article_key(r),
        SourceRecord::Decision(r) => decision_key(r),
        SourceRecord::Circulaire(r) => circulaire_key(r),
        SourceRecord::Reponse(r) => reponse_key(r),
    }
}

fn article_key(r: &ArticleRecord) -> String {
    let code = r.code_name.as_deref().unwrap_or("Code");
    let num = r.num.as_deref().unwrap_or_else(|| {
        if r.id_legifrance.is_empty() {
            "?"
        } else {
            r.id_legifrance.as_str()
        }
    });
    format!("{}, art. {}", code, num)
}

fn decision_key(r: &DecisionRecord) -> String {
    let jurisdiction = r.jurisdiction.as_deref().unwrap_or("Cass.");
    let date = r.date_decision.as_deref().unwrap_or("");
    let id = r
        .source_id
        .as_deref()
        .or(r.id_judilibre.as_deref())
        .unwrap_or("");
    format!("{}, {}, n° {}", jurisdiction, date, id)
}

fn circulaire_key(r: &CirculaireRecord) -> String {
    let numero = r
        .numero
        .as_deref()
        .or(r.source_id.as_deref())
        .unwrap_or("?");
    let ministere = r.ministere.as_deref().unwrap_or("");
    format!("Circ. n° {}, {}", numero, ministere)
}

fn reponse_key(r: &ReponseRecord) -> String {
    let numero = r
        .numero_question
        .as_deref()
        .or(r.source_id.as_deref())
        .unwrap_or("?");
    format!("Q. n° {}", numero)
}
