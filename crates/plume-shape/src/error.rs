use plume_rdf::RdfError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShapeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Rdf(#[from] RdfError),
    #[error("invalid property path: {0}")]
    InvalidPath(String),
    #[error("shape for {class} is malformed: {message}")]
    MalformedShape { class: String, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VocabularyError {
    #[error("unknown controlled vocabulary: {0}")]
    UnknownSource(String),
}
