//! Shared test harness: a service over in-process collaborators with a
//! manual clock and a handful of member keys.

use crate::chain::{Coin, KeySigner, MemoryChain, Signer};
use crate::config::Policy;
use crate::core::ManualClock;
use crate::crypto::{encode_address, KeyPair};
use crate::multisig::{Member, MultisigAccount};
use crate::service::{MultisigService, Stores};
use crate::transaction::{Recipient, TransactionPayload};
use crate::validation::InMemoryRateLimiter;
use std::sync::Arc;

const MEMBER_KEYS: usize = 5;

pub(crate) struct Harness {
    pub clock: Arc<ManualClock>,
    pub chain: Arc<MemoryChain>,
    pub limiter: Arc<InMemoryRateLimiter>,
    pub service: MultisigService,
    pub keys: Vec<KeyPair>,
    pub signers: Vec<KeySigner>,
}

impl Harness {
    pub fn new() -> Self {
        Self::build(Policy::default(), Stores::in_memory())
    }

    pub fn with_policy(policy: Policy) -> Self {
        Self::build(policy, Stores::in_memory())
    }

    pub fn with_stores(stores: Stores) -> Self {
        Self::build(Policy::default(), stores)
    }

    fn build(policy: Policy, stores: Stores) -> Self {
        let clock = Arc::new(ManualClock::default());
        let chain = Arc::new(MemoryChain::new());
        let limiter = Arc::new(InMemoryRateLimiter::new(clock.clone()));
        let keys: Vec<KeyPair> = (0..MEMBER_KEYS).map(|_| KeyPair::generate()).collect();
        let signers = keys
            .iter()
            .map(|k| KeySigner::new(k.clone(), &policy.account_prefix).unwrap())
            .collect();
        let service = MultisigService::new(
            chain.clone(),
            stores,
            policy,
            clock.clone(),
            limiter.clone(),
        );

        Self {
            clock,
            chain,
            limiter,
            service,
            keys,
            signers,
        }
    }

    /// Member record for key `i`
    pub fn member(&self, i: usize) -> Member {
        Member::new(self.signers[i].address(), self.signers[i].public_key_hex())
    }

    /// A `threshold`-of-`n` account over the first `n` keys
    pub async fn account(&self, threshold: u32, n: usize) -> MultisigAccount {
        let members = (0..n).map(|i| self.member(i)).collect();
        self.service.accounts().create(threshold, members).await.unwrap()
    }

    /// A fresh account address outside every member set
    pub fn recipient(&self) -> String {
        encode_address(&self.service.policy().account_prefix, &rand::random::<[u8; 20]>()).unwrap()
    }

    pub fn validator(&self) -> String {
        encode_address(&self.service.policy().validator_prefix, &rand::random::<[u8; 20]>())
            .unwrap()
    }

    pub fn transfer(&self, amount: u128) -> TransactionPayload {
        TransactionPayload::Transfer {
            recipients: vec![Recipient {
                address: self.recipient(),
                amount: Coin::new(amount, "uatom"),
            }],
        }
    }
}
