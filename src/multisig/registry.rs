//! Account registry
//!
//! Creates, stores and looks up threshold accounts, and keeps a best-effort
//! balance snapshot for each.

use crate::chain::{with_timeout, ChainClient};
use crate::config::Policy;
use crate::core::{generate_id, Clock, CoordinatorError, Result};
use crate::crypto::derive_multisig_address;
use crate::multisig::account::{Member, MultisigAccount};
use crate::storage::{KeyedLocks, Store};
use crate::validation::{sanitize_text, AddressKind, ValidationErrors, Validator};
use std::collections::HashSet;
use std::sync::Arc;

/// Check a proposed member set; returns decoded public keys in member order
pub fn validate_member_set(
    threshold: u32,
    members: &[Member],
    policy: &Policy,
) -> std::result::Result<Vec<Vec<u8>>, ValidationErrors> {
    let mut v = Validator::new(policy);
    let count = members.len();

    v.ensure(
        count >= policy.min_members,
        "members",
        format!("need at least {} members, got {}", policy.min_members, count),
    );
    v.ensure(
        count <= policy.max_members,
        "members",
        format!("at most {} members allowed, got {}", policy.max_members, count),
    );
    v.ensure(threshold >= 1, "threshold", "threshold must be at least 1");
    v.ensure(
        threshold as usize <= count,
        "threshold",
        format!("threshold {} exceeds member count {}", threshold, count),
    );

    let mut addresses = HashSet::new();
    let mut keys = HashSet::new();
    let mut decoded = Vec::with_capacity(count);
    for (i, member) in members.iter().enumerate() {
        let field = |name: &str| format!("members[{}].{}", i, name);

        v.address(&field("address"), &member.address, AddressKind::Account);
        if let Some(bytes) = v.public_key(&field("public_key"), &member.public_key) {
            decoded.push(bytes);
        }
        if let Some(name) = &member.display_name {
            v.text(
                &field("display_name"),
                name,
                policy.max_display_name_len,
                false,
            );
        }

        v.ensure(
            addresses.insert(member.address.to_ascii_lowercase()),
            &field("address"),
            format!("duplicate member address {}", member.address),
        );
        v.ensure(
            keys.insert(member.public_key.to_ascii_lowercase()),
            &field("public_key"),
            "duplicate member public key",
        );
    }

    v.finish()?;
    Ok(decoded)
}

/// Normalize a validated member for storage: lowercase address and key
pub fn normalize_member(member: Member) -> Member {
    Member {
        address: member.address.to_ascii_lowercase(),
        public_key: member.public_key.to_ascii_lowercase(),
        display_name: member
            .display_name
            .map(|name| sanitize_text(&name))
            .filter(|name| !name.is_empty()),
    }
}

/// Registry of threshold accounts
pub struct AccountRegistry {
    store: Arc<dyn Store<MultisigAccount>>,
    chain: Arc<dyn ChainClient>,
    clock: Arc<dyn Clock>,
    policy: Arc<Policy>,
    locks: KeyedLocks,
}

impl AccountRegistry {
    pub fn new(
        store: Arc<dyn Store<MultisigAccount>>,
        chain: Arc<dyn ChainClient>,
        clock: Arc<dyn Clock>,
        policy: Arc<Policy>,
    ) -> Self {
        Self {
            store,
            chain,
            clock,
            policy,
            locks: KeyedLocks::new(),
        }
    }

    /// Create and store a new account
    pub async fn create(&self, threshold: u32, members: Vec<Member>) -> Result<MultisigAccount> {
        let public_keys = validate_member_set(threshold, &members, &self.policy)?;
        let address = derive_multisig_address(&self.policy.account_prefix, threshold, &public_keys)
            .map_err(|e| CoordinatorError::Internal(format!("address derivation failed: {}", e)))?;

        let now = self.clock.now();
        let account = MultisigAccount {
            id: generate_id("account", &address, now),
            address,
            threshold,
            members: members.into_iter().map(normalize_member).collect(),
            balance: Vec::new(),
            balance_updated_at: None,
            created_at: now,
            updated_at: now,
        };
        self.store.put(account.clone()).await?;

        log::info!(
            "Created {} account {} at {}",
            account.description(),
            account.id,
            account.address
        );
        Ok(account)
    }

    pub async fn get(&self, id: &str) -> Result<MultisigAccount> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| CoordinatorError::not_found("account", id))
    }

    /// All accounts, oldest first
    pub async fn list(&self) -> Result<Vec<MultisigAccount>> {
        let mut accounts = self.store.list().await?;
        accounts.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(accounts)
    }

    /// Refresh the cached balance; chain failures leave the old snapshot
    pub async fn refresh_balance(&self, id: &str) -> Result<MultisigAccount> {
        let account = self.get(id).await?;

        let balance = match with_timeout(
            self.policy.chain_timeout(),
            self.chain.balance(&account.address),
        )
        .await
        {
            Ok(balance) => balance,
            Err(e) => {
                log::warn!("Balance refresh for {} failed: {}", account.address, e);
                return Ok(account);
            }
        };

        self.update(id, |account| {
            account.balance = balance;
            account.balance_updated_at = Some(self.clock.now());
            Ok(())
        })
        .await
    }

    /// Apply a mutation under the account's lock; nothing is stored on error
    pub async fn update<F>(&self, id: &str, mutate: F) -> Result<MultisigAccount>
    where
        F: FnOnce(&mut MultisigAccount) -> Result<()> + Send,
    {
        let _guard = self.locks.lock(id).await;
        let mut account = self.get(id).await?;
        mutate(&mut account)?;
        self.store.put(account.clone()).await?;
        Ok(account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::{Coin, MemoryChain};
    use crate::core::SystemClock;
    use crate::crypto::KeyPair;
    use crate::storage::MemoryStore;

    fn members(n: usize) -> Vec<Member> {
        (0..n)
            .map(|_| {
                let key = KeyPair::generate();
                Member::new(key.address("cosmos").unwrap(), key.public_key_hex())
            })
            .collect()
    }

    fn registry(chain: Arc<MemoryChain>) -> AccountRegistry {
        AccountRegistry::new(
            Arc::new(MemoryStore::<MultisigAccount>::new()),
            chain,
            Arc::new(SystemClock),
            Arc::new(Policy::default()),
        )
    }

    #[tokio::test]
    async fn test_create_and_lookup() {
        let registry = registry(Arc::new(MemoryChain::new()));
        let account = registry.create(2, members(3)).await.unwrap();

        assert!(account.address.starts_with("cosmos1"));
        assert_eq!(account.description(), "2-of-3");
        assert_eq!(registry.get(&account.id).await.unwrap().address, account.address);
        assert_eq!(registry.list().await.unwrap().len(), 1);
        assert!(matches!(
            registry.get("missing").await,
            Err(CoordinatorError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_same_input_same_address() {
        let registry = registry(Arc::new(MemoryChain::new()));
        let set = members(4);

        let a = registry.create(3, set.clone()).await.unwrap();
        let b = registry.create(3, set.clone()).await.unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(a.address, b.address);

        let c = registry.create(2, set).await.unwrap();
        assert_ne!(a.address, c.address);
    }

    #[tokio::test]
    async fn test_every_violation_is_reported() {
        let registry = registry(Arc::new(MemoryChain::new()));
        let mut set = members(1);
        set.push(set[0].clone());
        set.push(Member::new("bogus", "zz").with_display_name("<script>"));

        let err = registry.create(5, set).await.unwrap_err();
        let CoordinatorError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        assert!(errors.has_field("threshold"));
        assert!(errors.has_field("members[1].address"));
        assert!(errors.has_field("members[1].public_key"));
        assert!(errors.has_field("members[2].address"));
        assert!(errors.has_field("members[2].public_key"));
        assert!(errors.has_field("members[2].display_name"));
        assert_eq!(registry.list().await.unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_address_case_does_not_defeat_uniqueness() {
        let registry = registry(Arc::new(MemoryChain::new()));
        let mut set = members(2);
        let mut shouted = set[0].clone();
        shouted.address = shouted.address.to_uppercase();
        shouted.public_key = KeyPair::generate().public_key_hex();
        set[1] = shouted;

        let err = registry.create(1, set.clone()).await.unwrap_err();
        let CoordinatorError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        assert!(errors.has_field("members[1].address"));

        // An uppercase address alone is accepted and stored lowercase
        let mut upper = members(2);
        upper[0].address = upper[0].address.to_uppercase();
        let account = registry.create(2, upper.clone()).await.unwrap();
        assert_eq!(account.members[0].address, upper[0].address.to_lowercase());
        assert!(account.is_member(&upper[0].address));
    }

    #[tokio::test]
    async fn test_member_bounds() {
        let registry = registry(Arc::new(MemoryChain::new()));
        assert!(registry.create(1, members(1)).await.is_err());
        assert!(registry.create(0, members(2)).await.is_err());
        assert!(registry.create(1, members(21)).await.is_err());
        assert!(registry.create(20, members(20)).await.is_ok());
    }

    #[tokio::test]
    async fn test_refresh_balance_is_best_effort() {
        let chain = Arc::new(MemoryChain::new());
        let registry = registry(chain.clone());
        let account = registry.create(2, members(2)).await.unwrap();

        chain.set_balance(&account.address, vec![Coin::new(500, "uatom")]);
        let refreshed = registry.refresh_balance(&account.id).await.unwrap();
        assert_eq!(refreshed.balance, vec![Coin::new(500, "uatom")]);
        assert!(refreshed.balance_updated_at.is_some());

        chain.set_balance(&account.address, vec![Coin::new(900, "uatom")]);
        chain.fail_queries(Some("node down"));
        let stale = registry.refresh_balance(&account.id).await.unwrap();
        assert_eq!(stale.balance, vec![Coin::new(500, "uatom")]);

        assert!(registry.refresh_balance("missing").await.is_err());
    }
}
