//! External collaborator interfaces
//!
//! The coordinator never talks to a node or a wallet directly; it goes
//! through these traits so production backends and test fakes are
//! interchangeable.

use crate::chain::types::{AccountInfo, Coin};
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// Failures reported by the chain or the signing capability
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    #[error("Query failed: {0}")]
    Query(String),
    #[error("Broadcast rejected (code {code}): {log}")]
    Rejected { code: u32, log: String },
    #[error("Signing failed: {0}")]
    Signing(String),
    #[error("Timed out after {0:?}")]
    Timeout(Duration),
    #[error("Encoding error: {0}")]
    Encoding(String),
}

impl From<serde_json::Error> for ChainError {
    fn from(err: serde_json::Error) -> Self {
        ChainError::Encoding(err.to_string())
    }
}

/// Balance lookup, account metadata and transaction submission
#[async_trait]
pub trait ChainClient: Send + Sync {
    async fn balance(&self, address: &str) -> Result<Vec<Coin>, ChainError>;

    async fn account_info(&self, address: &str) -> Result<AccountInfo, ChainError>;

    /// Submit encoded transaction bytes, returning the chain-assigned hash
    async fn broadcast(&self, tx_bytes: &[u8]) -> Result<String, ChainError>;
}

/// A capability that signs on behalf of one member address
#[async_trait]
pub trait Signer: Send + Sync {
    fn address(&self) -> &str;

    async fn sign(&self, sign_bytes: &[u8]) -> Result<Vec<u8>, ChainError>;
}

/// Run a chain call under a deadline; elapsing counts as a failure
pub async fn with_timeout<T, F>(limit: Duration, call: F) -> Result<T, ChainError>
where
    F: Future<Output = Result<T, ChainError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(ChainError::Timeout(limit)),
    }
}
