//! In-process chain
//!
//! Backs the CLI's offline mode and the test-suite. Balances and account
//! metadata are set explicitly; broadcasts are recorded and answered with
//! the SHA-256 hash of the submitted bytes. Failures and latency can be
//! injected to exercise error paths.

use crate::chain::client::{ChainClient, ChainError};
use crate::chain::types::{AccountInfo, Coin, MultisigTxEnvelope};
use crate::crypto::sha256_hex;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Default)]
struct MemoryChainState {
    balances: HashMap<String, Vec<Coin>>,
    accounts: HashMap<String, AccountInfo>,
    broadcasts: Vec<Vec<u8>>,
    query_failure: Option<String>,
    broadcast_rejection: Option<(u32, String)>,
    delay: Option<Duration>,
}

/// In-memory [`ChainClient`]
#[derive(Debug, Default)]
pub struct MemoryChain {
    state: Mutex<MemoryChainState>,
}

impl MemoryChain {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, MemoryChainState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn set_balance(&self, address: &str, coins: Vec<Coin>) {
        self.state().balances.insert(address.to_string(), coins);
    }

    pub fn set_account(&self, address: &str, info: AccountInfo) {
        self.state().accounts.insert(address.to_string(), info);
    }

    /// Make every query fail with `reason` (`None` restores normal behaviour)
    pub fn fail_queries(&self, reason: Option<&str>) {
        self.state().query_failure = reason.map(str::to_string);
    }

    /// Make every broadcast fail with the given code and log
    pub fn reject_broadcasts(&self, rejection: Option<(u32, &str)>) {
        self.state().broadcast_rejection = rejection.map(|(code, log)| (code, log.to_string()));
    }

    /// Delay every call by `delay`
    pub fn set_delay(&self, delay: Option<Duration>) {
        self.state().delay = delay;
    }

    /// Number of transactions accepted so far
    pub fn broadcast_count(&self) -> usize {
        self.state().broadcasts.len()
    }

    pub fn last_broadcast(&self) -> Option<Vec<u8>> {
        self.state().broadcasts.last().cloned()
    }

    async fn pause(&self) {
        let delay = self.state().delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn check_queries(&self) -> Result<(), ChainError> {
        match &self.state().query_failure {
            Some(reason) => Err(ChainError::Query(reason.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ChainClient for MemoryChain {
    async fn balance(&self, address: &str) -> Result<Vec<Coin>, ChainError> {
        self.pause().await;
        self.check_queries()?;
        Ok(self
            .state()
            .balances
            .get(address)
            .cloned()
            .unwrap_or_default())
    }

    async fn account_info(&self, address: &str) -> Result<AccountInfo, ChainError> {
        self.pause().await;
        self.check_queries()?;
        Ok(self
            .state()
            .accounts
            .get(address)
            .copied()
            .unwrap_or_default())
    }

    async fn broadcast(&self, tx_bytes: &[u8]) -> Result<String, ChainError> {
        self.pause().await;

        let mut state = self.state();
        if let Some((code, log)) = &state.broadcast_rejection {
            return Err(ChainError::Rejected {
                code: *code,
                log: log.clone(),
            });
        }

        let envelope = MultisigTxEnvelope::from_bytes(tx_bytes).map_err(|e| ChainError::Rejected {
            code: 2,
            log: format!("tx parse error: {}", e),
        })?;
        if envelope.signatures.len() < envelope.threshold as usize {
            return Err(ChainError::Rejected {
                code: 4,
                log: "signature verification failed: not enough signatures".to_string(),
            });
        }

        // Accepted transactions consume the account's sequence
        let info = state
            .accounts
            .entry(envelope.multisig_address.clone())
            .or_default();
        info.sequence += 1;

        state.broadcasts.push(tx_bytes.to_vec());
        Ok(sha256_hex(tx_bytes).to_uppercase())
    }
}
