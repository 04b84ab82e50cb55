use crate::key::KeyId;
use plume_shape::VocabularyError;
use thiserror::Error;

/// Errors raised by key tree operations. A failed operation leaves the tree
/// untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("forbidden operation on {key}: {message}")]
    ForbiddenOperation { key: KeyId, message: String },
    #[error("integrity breach on {key}: {message}")]
    IntegrityBreach { key: KeyId, message: String },
    #[error("unknown key: {0}")]
    UnknownKey(KeyId),
    #[error(transparent)]
    Vocabulary(#[from] VocabularyError),
}

impl TreeError {
    pub(crate) fn forbidden(key: KeyId, message: impl Into<String>) -> Self {
        TreeError::ForbiddenOperation {
            key,
            message: message.into(),
        }
    }

    pub(crate) fn breach(key: KeyId, message: impl Into<String>) -> Self {
        TreeError::IntegrityBreach {
            key,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TreeError>;
