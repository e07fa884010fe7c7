//! Error types for chat value validation.

use thiserror::Error;

/// Errors returned while constructing chat values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ChatDomainError {
    /// A message carried neither text nor an image.
    #[error("message must carry text or an image")]
    EmptyMessage,

    /// A proof message carried no image reference.
    #[error("proof messages must carry an image")]
    ProofWithoutImage,
}
