use thiserror::Error;

/// Errors reported by the reconstruction library.
///
/// Configuration and shape problems are detected once, before the first
/// iteration; nothing inside the iteration loop produces an error.
#[derive(Debug, Error)]
pub enum EstError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("shape mismatch: expected {expected}, found {found}")]
    ShapeMismatch { expected: String, found: String },

    #[error("initializer failed: {0}")]
    Initializer(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to read array: {0}")]
    ReadNpy(#[from] ndarray_npy::ReadNpyError),

    #[error("failed to write array: {0}")]
    WriteNpy(#[from] ndarray_npy::WriteNpyError),

    #[error("failed to read NPZ archive: {0}")]
    ReadNpz(#[from] ndarray_npy::ReadNpzError),

    #[error("failed to write NPZ archive: {0}")]
    WriteNpz(#[from] ndarray_npy::WriteNpzError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EstError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }

    pub(crate) fn shape(expected: impl std::fmt::Debug, found: impl std::fmt::Debug) -> Self {
        Self::ShapeMismatch {
            expected: format!("{expected:?}"),
            found: format!("{found:?}"),
        }
    }
}

pub type Result<T> = std::result::Result<T, EstError>;
