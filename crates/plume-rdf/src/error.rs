use thiserror::Error;

/// Errors raised while reading RDF.
#[derive(Debug, Error)]
pub enum RdfError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse {format}: {message}")]
    Parse {
        format: &'static str,
        message: String,
    },
    #[error("unsupported RDF term form: {0}")]
    InvalidTerm(String),
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),
}
