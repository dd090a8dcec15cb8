//! # Error Handling Module
//!
//! ## Purpose
//! Centralized error handling for the legal retrieval engine, providing the
//! error taxonomy shared by all components.
//!
//! ## Input/Output Specification
//! - **Input**: Error conditions from various system components
//! - **Output**: Structured error types with context
//! - **Error Categories**: Configuration, Corpus, Embedding, Generation, API
//!
//! ## Propagation Policy
//! Only an embedding failure is fatal to a query: without a query vector no
//! partial result is meaningful. Corpus load and nearest-neighbour failures
//! degrade to empty per-source result lists at the component boundary, and a
//! generation failure is folded into a visible synthesis string. The embedding
//! message is user-facing (French, with a remediation hint) and never exposes
//! raw transport detail; see `EmbeddingFailed`.

use std::fmt;

/// Result type used throughout the application
pub type Result<T> = std::result::Result<T, RetrievalError>;

/// Error types for the legal retrieval engine
///
/// `Display`/`Error`/`From` are implemented by hand because the `source`
/// fields below name the corpus source (a `String`), which the thiserror
/// derive would otherwise infer as the error cause.
#[derive(Debug)]
pub enum RetrievalError {
    /// Configuration errors
    Config { message: String },

    /// Validation errors
    ValidationFailed { field: String, reason: String },

    /// A source corpus could not be loaded; callers convert this to an
    /// absent index rather than failing the process
    SourceLoad { source: String, details: String },

    /// Nearest-neighbour search failed for one source; the retriever
    /// converts this to an empty candidate list
    IndexSearch { source: String, details: String },

    /// Query vectorization failed. The message is shown to the user as-is,
    /// so it carries the remediation hint and no transport internals.
    EmbeddingFailed { details: String },

    /// Generation call failed; folded into the synthesis text, never fatal
    GenerationFailed { details: String },

    /// Internal system errors
    Internal { message: String },

    /// Generic I/O errors
    Io(std::io::Error),

    /// JSON parsing errors
    Json(serde_json::Error),

    /// TOML parsing errors
    Toml(toml::de::Error),
}

impl fmt::Display for RetrievalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetrievalError::Config { message } => {
                write!(f, "Configuration error: {message}")
            }
            RetrievalError::ValidationFailed { field, reason } => {
                write!(f, "Validation failed for field '{field}': {reason}")
            }
            RetrievalError::SourceLoad { source, details } => {
                write!(f, "Failed to load source '{source}': {details}")
            }
            RetrievalError::IndexSearch { source, details } => {
                write!(f, "Index search failed for '{source}': {details}")
            }
            RetrievalError::EmbeddingFailed { details } => {
                write!(
                    f,
                    "Impossible d'encoder la requête : {details}. \
                     Vérifiez que le jeton d'API est configuré et que le quota n'est pas dépassé."
                )
            }
            RetrievalError::GenerationFailed { details } => write!(f, "{details}"),
            RetrievalError::Internal { message } => {
                write!(f, "Internal error: {message}")
            }
            RetrievalError::Io(e) => write!(f, "I/O error: {e}"),
            RetrievalError::Json(e) => write!(f, "JSON error: {e}"),
            RetrievalError::Toml(e) => write!(f, "TOML error: {e}"),
        }
    }
}

impl std::error::Error for RetrievalError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RetrievalError::Io(e) => Some(e),
            RetrievalError::Json(e) => Some(e),
            RetrievalError::Toml(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for RetrievalError {
    fn from(e: std::io::Error) -> Self {
        RetrievalError::Io(e)
    }
}

impl From<serde_json::Error> for RetrievalError {
    fn from(e: serde_json::Error) -> Self {
        RetrievalError::Json(e)
    }
}

impl From<toml::de::Error> for RetrievalError {
    fn from(e: toml::de::Error) -> Self {
        RetrievalError::Toml(e)
    }
}

impl RetrievalError {
    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            RetrievalError::Config { .. } | RetrievalError::Toml(_) => "configuration",
            RetrievalError::SourceLoad { .. } | RetrievalError::IndexSearch { .. } => "corpus",
            RetrievalError::EmbeddingFailed { .. } => "embedding",
            RetrievalError::GenerationFailed { .. } => "generation",
            RetrievalError::ValidationFailed { .. } => "validation",
            RetrievalError::Io(_) | RetrievalError::Json(_) => "io",
            RetrievalError::Internal { .. } => "internal",
        }
    }

    /// Whether the error aborts the whole query (as opposed to degrading
    /// one component's output)
    pub fn is_fatal_to_query(&self) -> bool {
        matches!(self, RetrievalError::EmbeddingFailed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedding_failure_carries_remediation_hint() {
        let err = RetrievalError::EmbeddingFailed {
            details: "timeout".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("Impossible d'encoder la requête"));
        assert!(msg.contains("jeton d'API"));
        assert!(msg.contains("quota"));
    }

    #[test]
    fn only_embedding_failure_is_fatal() {
        assert!(RetrievalError::EmbeddingFailed {
            details: "x".into()
        }
        .is_fatal_to_query());
        assert!(!RetrievalError::GenerationFailed {
            details: "x".into()
        }
        .is_fatal_to_query());
        assert!(!RetrievalError::SourceLoad {
            source: "articles".into(),
            details: "x".into()
        }
        .is_fatal_to_query());
    }
}
