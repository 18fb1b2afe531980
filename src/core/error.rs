//! Error taxonomy surfaced to callers
//!
//! Every public operation returns either the affected entity or one of
//! these variants. Lower layers (storage, chain, validation) have their
//! own error types which are converted here.

use crate::chain::ChainError;
use crate::storage::StorageError;
use crate::validation::ValidationErrors;
use thiserror::Error;

/// Errors returned by the account registry, coordinator and proposal engine
#[derive(Error, Debug)]
pub enum CoordinatorError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },
    #[error("Invalid state: {0}")]
    InvalidState(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Rate limit exceeded for {operation} on {key}")]
    RateLimited { operation: &'static str, key: String },
    #[error("Chain error: {0}")]
    Chain(#[from] ChainError),
    #[error("Not supported: {0}")]
    Unsupported(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoordinatorError {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// Short machine-readable name of the variant
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::NotFound { .. } => "not_found",
            Self::InvalidState(_) => "invalid_state",
            Self::Unauthorized(_) => "unauthorized",
            Self::RateLimited { .. } => "rate_limited",
            Self::Chain(_) => "chain",
            Self::Unsupported(_) => "unsupported",
            Self::Internal(_) => "internal",
        }
    }
}

impl From<StorageError> for CoordinatorError {
    fn from(err: StorageError) -> Self {
        log::error!("Storage failure: {:?}", err);
        Self::Internal("storage failure".to_string())
    }
}

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, CoordinatorError>;
