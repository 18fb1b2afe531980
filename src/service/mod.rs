//! Multisig service
//!
//! Wires the account registry, transaction coordinator and proposal engine
//! to one set of collaborators: a chain client, entity stores, a rate
//! limiter, a clock and the policy. Construct one explicitly and share it.

#[cfg(test)]
pub(crate) mod fixtures;

use crate::chain::ChainClient;
use crate::config::Policy;
use crate::core::{Clock, Result};
use crate::multisig::{AccountRegistry, MultisigAccount};
use crate::proposal::{Proposal, ProposalEngine};
use crate::storage::{JsonFileStore, MemoryStore, StorageConfig, StorageError, Store};
use crate::transaction::{PendingTransaction, TransactionCoordinator};
use crate::validation::RateLimiter;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// One store per entity collection
#[derive(Clone)]
pub struct Stores {
    pub accounts: Arc<dyn Store<MultisigAccount>>,
    pub transactions: Arc<dyn Store<PendingTransaction>>,
    pub proposals: Arc<dyn Store<Proposal>>,
}

impl Stores {
    pub fn in_memory() -> Self {
        Self {
            accounts: Arc::new(MemoryStore::<MultisigAccount>::new()),
            transactions: Arc::new(MemoryStore::<PendingTransaction>::new()),
            proposals: Arc::new(MemoryStore::<Proposal>::new()),
        }
    }

    /// Open every collection as a JSON file under `config.data_dir`
    pub fn json_files(config: StorageConfig) -> std::result::Result<Self, StorageError> {
        Ok(Self {
            accounts: Arc::new(JsonFileStore::<MultisigAccount>::open(config.clone())?),
            transactions: Arc::new(JsonFileStore::<PendingTransaction>::open(config.clone())?),
            proposals: Arc::new(JsonFileStore::<Proposal>::open(config)?),
        })
    }
}

/// Outcome of one cleanup sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    pub expired_transactions: usize,
    pub rejected_proposals: usize,
}

#[derive(Clone)]
pub struct MultisigService {
    accounts: Arc<AccountRegistry>,
    transactions: Arc<TransactionCoordinator>,
    proposals: Arc<ProposalEngine>,
    limiter: Arc<dyn RateLimiter>,
    policy: Arc<Policy>,
}

impl MultisigService {
    pub fn new(
        chain: Arc<dyn ChainClient>,
        stores: Stores,
        policy: Policy,
        clock: Arc<dyn Clock>,
        limiter: Arc<dyn RateLimiter>,
    ) -> Self {
        let policy = Arc::new(policy);
        let accounts = Arc::new(AccountRegistry::new(
            stores.accounts,
            chain.clone(),
            clock.clone(),
            policy.clone(),
        ));
        let transactions = Arc::new(TransactionCoordinator::new(
            stores.transactions,
            accounts.clone(),
            chain,
            limiter.clone(),
            clock.clone(),
            policy.clone(),
        ));
        let proposals = Arc::new(ProposalEngine::new(
            stores.proposals,
            accounts.clone(),
            limiter.clone(),
            clock,
            policy.clone(),
        ));

        Self {
            accounts,
            transactions,
            proposals,
            limiter,
            policy,
        }
    }

    pub fn accounts(&self) -> &AccountRegistry {
        &self.accounts
    }

    pub fn transactions(&self) -> &TransactionCoordinator {
        &self.transactions
    }

    pub fn proposals(&self) -> &ProposalEngine {
        &self.proposals
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    /// Sweep expired transactions and proposals, and idle rate-limit keys.
    /// Safe to run alongside in-flight requests and to repeat.
    pub async fn cleanup(&self) -> Result<CleanupReport> {
        let report = CleanupReport {
            expired_transactions: self.transactions.cleanup().await?,
            rejected_proposals: self.proposals.cleanup().await?,
        };
        let pruned = self.limiter.prune().await;
        if pruned > 0 {
            log::debug!("Pruned {} idle rate-limit keys", pruned);
        }
        if report != CleanupReport::default() {
            log::info!(
                "Cleanup removed {} expired transactions, rejected {} proposals",
                report.expired_transactions,
                report.rejected_proposals
            );
        }
        Ok(report)
    }

    /// Run [`cleanup`](Self::cleanup) every `period` until the handle is aborted
    pub fn spawn_cleanup(&self, period: Duration) -> JoinHandle<()> {
        let service = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if let Err(e) = service.cleanup().await {
                    log::error!("Cleanup sweep failed: {}", e);
                }
            }
        })
    }
}
