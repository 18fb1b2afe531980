//! Transaction coordinator
//!
//! Drives the create → sign → broadcast state machine. Every mutation of a
//! transaction happens under that transaction's lock, so concurrent
//! signers cannot race on the slots or on the ready transition.

use crate::chain::{with_timeout, ChainClient, SignDoc, Signer};
use crate::config::Policy;
use crate::core::{generate_id, Clock, CoordinatorError, Result};
use crate::multisig::AccountRegistry;
use crate::storage::{KeyedLocks, Store};
use crate::transaction::fee::estimate_fee;
use crate::transaction::pending::{PendingTransaction, TransactionPayload, TransactionStatus};
use crate::validation::{
    enforce, sanitize_text, AddressKind, RateLimiter, ValidationErrors, Validator,
};
use std::sync::Arc;

const OP_CREATE: &str = "tx_create";
const OP_SIGN: &str = "tx_sign";

/// Check a payload and memo against the policy, collecting every violation
pub fn validate_payload(
    payload: &TransactionPayload,
    memo: &str,
    policy: &Policy,
) -> std::result::Result<(), ValidationErrors> {
    let mut v = Validator::new(policy);

    match payload {
        TransactionPayload::Transfer { recipients } => {
            v.ensure(!recipients.is_empty(), "recipients", "at least one recipient is required");
            for (i, recipient) in recipients.iter().enumerate() {
                v.address(
                    &format!("recipients[{}].address", i),
                    &recipient.address,
                    AddressKind::Account,
                );
                v.coin(&format!("recipients[{}].amount", i), &recipient.amount);
            }
        }
        TransactionPayload::Delegate {
            validator_address,
            amount,
        } => {
            v.address("validator_address", validator_address, AddressKind::Validator);
            v.coin("amount", amount);
        }
        TransactionPayload::GovernanceVote { proposal_id, .. } => {
            v.ensure(*proposal_id > 0, "proposal_id", "proposal id must be positive");
        }
        TransactionPayload::Custom { messages } => {
            v.ensure(!messages.is_empty(), "messages", "at least one message is required");
            for (i, message) in messages.iter().enumerate() {
                let field = format!("messages[{}].type_url", i);
                if v.text(&field, &message.type_url, 256, true) {
                    v.ensure(
                        message.type_url.starts_with('/'),
                        &field,
                        "type url must start with '/'",
                    );
                }
            }
        }
    }

    v.text("memo", memo, policy.max_memo_len, false);
    v.finish()
}

/// Coordinates pending transactions for all accounts
pub struct TransactionCoordinator {
    store: Arc<dyn Store<PendingTransaction>>,
    accounts: Arc<AccountRegistry>,
    chain: Arc<dyn ChainClient>,
    limiter: Arc<dyn RateLimiter>,
    clock: Arc<dyn Clock>,
    policy: Arc<Policy>,
    locks: KeyedLocks,
}

impl TransactionCoordinator {
    pub fn new(
        store: Arc<dyn Store<PendingTransaction>>,
        accounts: Arc<AccountRegistry>,
        chain: Arc<dyn ChainClient>,
        limiter: Arc<dyn RateLimiter>,
        clock: Arc<dyn Clock>,
        policy: Arc<Policy>,
    ) -> Self {
        Self {
            store,
            accounts,
            chain,
            limiter,
            clock,
            policy,
            locks: KeyedLocks::new(),
        }
    }

    /// Create a pending transaction against an account
    pub async fn create(
        &self,
        account_id: &str,
        payload: TransactionPayload,
        memo: Option<String>,
    ) -> Result<PendingTransaction> {
        let account = self.accounts.get(account_id).await?;
        let memo = memo.unwrap_or_default();
        validate_payload(&payload, &memo, &self.policy)?;
        enforce(
            self.limiter.as_ref(),
            OP_CREATE,
            account_id,
            self.policy.tx_create_limit,
        )
        .await?;

        let now = self.clock.now();
        let message_count = payload.to_messages(&account.address).len();
        let tx = PendingTransaction::new(
            generate_id("tx", &account.address, now),
            &account,
            payload,
            sanitize_text(&memo),
            estimate_fee(message_count, &self.policy),
            now,
            now + self.policy.transaction_ttl(),
        );
        self.store.put(tx.clone()).await?;

        log::info!(
            "Created {} transaction {} for {} ({} slots, expires {})",
            tx.payload.kind(),
            tx.id,
            account.address,
            tx.signatures.len(),
            tx.expires_at
        );
        Ok(tx)
    }

    pub async fn get(&self, id: &str) -> Result<PendingTransaction> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| CoordinatorError::not_found("transaction", id))
    }

    /// Transactions, optionally for one account, oldest first
    pub async fn list(&self, account_id: Option<&str>) -> Result<Vec<PendingTransaction>> {
        let mut txs: Vec<PendingTransaction> = self
            .store
            .list()
            .await?
            .into_iter()
            .filter(|tx| account_id.map_or(true, |id| tx.account_id == id))
            .collect();
        txs.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(txs)
    }

    fn ensure_open(&self, tx: &PendingTransaction) -> Result<()> {
        if tx.status.is_open() && tx.is_expired(self.clock.now()) {
            return Err(CoordinatorError::InvalidState(format!(
                "transaction {} expired at {}",
                tx.id, tx.expires_at
            )));
        }
        Ok(())
    }

    /// Fix the account number / sequence the first time a sign document is needed
    async fn ensure_sign_context(&self, tx: &mut PendingTransaction) -> Result<SignDoc> {
        if tx.sign_context.is_none() {
            let info = with_timeout(
                self.policy.chain_timeout(),
                self.chain.account_info(&tx.multisig_address),
            )
            .await?;
            tx.sign_context = Some(info);
        }
        tx.sign_doc(&self.policy.chain_id)
            .ok_or_else(|| CoordinatorError::Internal("sign context missing".to_string()))
    }

    /// The document members must sign
    pub async fn sign_doc(&self, id: &str) -> Result<SignDoc> {
        let _guard = self.locks.lock(id).await;
        let mut tx = self.get(id).await?;
        self.ensure_open(&tx)?;
        if tx.status != TransactionStatus::Pending {
            return Err(CoordinatorError::InvalidState(format!(
                "transaction {} is {:?}, not pending",
                tx.id, tx.status
            )));
        }

        let had_context = tx.sign_context.is_some();
        let doc = self.ensure_sign_context(&mut tx).await?;
        if !had_context {
            self.store.put(tx).await?;
        }
        Ok(doc)
    }

    /// Collect one member's signature
    pub async fn sign(&self, id: &str, signer: &dyn Signer) -> Result<PendingTransaction> {
        let _guard = self.locks.lock(id).await;
        let mut tx = self.get(id).await?;
        enforce(self.limiter.as_ref(), OP_SIGN, id, self.policy.tx_sign_limit).await?;
        self.ensure_open(&tx)?;

        if tx.status != TransactionStatus::Pending {
            return Err(CoordinatorError::InvalidState(format!(
                "transaction {} is {:?}, not pending",
                tx.id, tx.status
            )));
        }

        let address = signer.address().to_string();
        match tx.slot(&address) {
            None => {
                return Err(CoordinatorError::Unauthorized(format!(
                    "{} has no signature slot on transaction {}",
                    address, tx.id
                )))
            }
            Some(slot) if slot.is_signed() => {
                return Err(CoordinatorError::Unauthorized(format!(
                    "{} already signed transaction {}",
                    address, tx.id
                )))
            }
            Some(_) => {}
        }

        let account = self.accounts.get(&tx.account_id).await?;
        let doc = self.ensure_sign_context(&mut tx).await?;
        let sign_bytes = doc.to_bytes().map_err(crate::chain::ChainError::from)?;
        let signature = signer.sign(&sign_bytes).await?;

        let now = self.clock.now();
        let became_ready = tx.record_signature(&address, &signature, account.threshold, now);
        log::debug!(
            "{} signed transaction {} ({}/{})",
            address,
            tx.id,
            tx.signed_count(),
            account.threshold
        );

        if became_ready {
            let envelope = tx
                .envelope(&self.policy.chain_id, account.threshold)
                .ok_or_else(|| CoordinatorError::Internal("sign context missing".to_string()))?;
            let bytes = envelope.to_bytes().map_err(crate::chain::ChainError::from)?;
            tx.tx_bytes = Some(hex::encode(bytes));
            log::info!(
                "Transaction {} is ready ({} of {} signatures)",
                tx.id,
                tx.signed_count(),
                tx.signatures.len()
            );
        }

        self.store.put(tx.clone()).await?;
        Ok(tx)
    }

    /// Submit a ready transaction. Never retried here: resubmission policy
    /// belongs to the caller.
    pub async fn broadcast(&self, id: &str) -> Result<PendingTransaction> {
        let _guard = self.locks.lock(id).await;
        let mut tx = self.get(id).await?;
        self.ensure_open(&tx)?;

        if tx.status != TransactionStatus::Ready {
            return Err(CoordinatorError::InvalidState(format!(
                "transaction {} is {:?}; only ready transactions can be broadcast ({} signatures collected)",
                tx.id,
                tx.status,
                tx.signed_count()
            )));
        }
        let bytes = tx
            .tx_bytes
            .as_deref()
            .map(hex::decode)
            .transpose()
            .map_err(|e| CoordinatorError::Internal(format!("corrupt tx bytes: {}", e)))?
            .ok_or_else(|| CoordinatorError::Internal("ready transaction has no bytes".to_string()))?;

        let result = with_timeout(self.policy.chain_timeout(), self.chain.broadcast(&bytes)).await;
        let now = self.clock.now();
        match result {
            Ok(hash) => {
                tx.mark_broadcast(hash, now);
                self.store.put(tx.clone()).await?;
                log::info!(
                    "Broadcast transaction {} as {}",
                    tx.id,
                    tx.tx_hash.as_deref().unwrap_or_default()
                );
                Ok(tx)
            }
            Err(e) => {
                tx.mark_failed(e.to_string(), now);
                self.store.put(tx.clone()).await?;
                log::warn!("Broadcast of transaction {} failed: {}", tx.id, e);
                Err(e.into())
            }
        }
    }

    /// Discard pending/ready transactions past their expiry; returns how many
    pub async fn cleanup(&self) -> Result<usize> {
        let now = self.clock.now();
        let candidates: Vec<String> = self
            .store
            .list()
            .await?
            .into_iter()
            .filter(|tx| tx.status.is_open() && tx.is_expired(now))
            .map(|tx| tx.id)
            .collect();

        let mut removed = 0;
        for id in candidates {
            let _guard = self.locks.lock(&id).await;
            // Re-check under the lock: a broadcast may have won the race
            let still_expired = matches!(
                self.store.get(&id).await?,
                Some(tx) if tx.status.is_open() && tx.is_expired(now)
            );
            if still_expired {
                self.store.remove(&id).await?;
                removed += 1;
                log::info!("Discarded expired transaction {}", id);
            }
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::{ChainError, Coin, PresignedSigner, Signer, VoteOption};
    use crate::config::RateLimit;
    use crate::service::fixtures::Harness;
    use crate::transaction::pending::{CustomMessage, Recipient};
    use std::time::Duration;

    #[tokio::test]
    async fn test_create_initializes_slots_fee_and_expiry() {
        let h = Harness::new();
        let account = h.account(2, 3).await;
        let tx = h
            .service
            .transactions()
            .create(&account.id, h.transfer(1_000_000), Some("rent".to_string()))
            .await
            .unwrap();

        assert_eq!(tx.status, TransactionStatus::Pending);
        assert_eq!(tx.signatures.len(), 3);
        assert_eq!(tx.fee.gas, 200_000);
        assert_eq!(tx.memo, "rent");
        assert_eq!(tx.expires_at - tx.created_at, chrono::Duration::hours(24));
    }

    #[tokio::test]
    async fn test_create_rejects_bad_payloads() {
        let h = Harness::new();
        let account = h.account(2, 3).await;
        let coordinator = h.service.transactions();

        let bad_transfer = TransactionPayload::Transfer {
            recipients: vec![Recipient {
                address: "cosmosvaloper1xyz".to_string(),
                amount: Coin::new(0, "btc"),
            }],
        };
        let err = coordinator.create(&account.id, bad_transfer, None).await.unwrap_err();
        let CoordinatorError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        assert!(errors.has_field("recipients[0].address"));
        assert!(errors.has_field("recipients[0].amount"));

        let empty_custom = TransactionPayload::Custom { messages: vec![] };
        assert!(matches!(
            coordinator.create(&account.id, empty_custom, None).await,
            Err(CoordinatorError::Validation(_))
        ));

        let vote = TransactionPayload::GovernanceVote {
            proposal_id: 0,
            option: VoteOption::Yes,
        };
        assert!(matches!(
            coordinator.create(&account.id, vote, None).await,
            Err(CoordinatorError::Validation(_))
        ));

        let custom = TransactionPayload::Custom {
            messages: vec![CustomMessage {
                type_url: "/cosmos.bank.v1beta1.MsgSend".to_string(),
                value: serde_json::json!({"amount": []}),
            }],
        };
        assert!(coordinator.create(&account.id, custom, Some("<b>hi</b>".to_string())).await.is_err());

        assert!(matches!(
            coordinator.create("missing", h.transfer(1), None).await,
            Err(CoordinatorError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_delegate_requires_validator_prefix() {
        let h = Harness::new();
        let account = h.account(2, 2).await;
        let payload = TransactionPayload::Delegate {
            validator_address: h.recipient(),
            amount: Coin::new(10, "uatom"),
        };
        let err = h
            .service
            .transactions()
            .create(&account.id, payload, None)
            .await
            .unwrap_err();
        assert!(matches!(err, CoordinatorError::Validation(e) if e.has_field("validator_address")));

        let payload = TransactionPayload::Delegate {
            validator_address: h.validator(),
            amount: Coin::new(10, "uatom"),
        };
        assert!(h.service.transactions().create(&account.id, payload, None).await.is_ok());
    }

    #[tokio::test]
    async fn test_create_rate_limit_per_account() {
        let h = Harness::new();
        let account = h.account(2, 3).await;
        let other = h.account(2, 2).await;
        let coordinator = h.service.transactions();

        // Rejected payloads are not counted against the account
        for _ in 0..5 {
            let empty = TransactionPayload::Custom { messages: vec![] };
            assert!(matches!(
                coordinator.create(&account.id, empty, None).await,
                Err(CoordinatorError::Validation(_))
            ));
        }
        for _ in 0..10 {
            coordinator.create(&account.id, h.transfer(1), None).await.unwrap();
        }
        assert!(matches!(
            coordinator.create(&account.id, h.transfer(1), None).await,
            Err(CoordinatorError::RateLimited { .. })
        ));
        assert!(coordinator.create(&other.id, h.transfer(1), None).await.is_ok());

        h.clock.advance(chrono::Duration::seconds(61));
        assert!(coordinator.create(&account.id, h.transfer(1), None).await.is_ok());
    }

    #[tokio::test]
    async fn test_threshold_minus_one_stays_pending() {
        let h = Harness::new();
        let account = h.account(3, 4).await;
        let coordinator = h.service.transactions();
        let tx = coordinator.create(&account.id, h.transfer(7), None).await.unwrap();

        coordinator.sign(&tx.id, &h.signers[0]).await.unwrap();
        let tx = coordinator.sign(&tx.id, &h.signers[1]).await.unwrap();
        assert_eq!(tx.status, TransactionStatus::Pending);
        assert!(tx.tx_bytes.is_none());

        let tx = coordinator.sign(&tx.id, &h.signers[3]).await.unwrap();
        assert_eq!(tx.status, TransactionStatus::Ready);
        assert!(tx.tx_bytes.is_some());
    }

    #[tokio::test]
    async fn test_double_sign_and_outsider_rejected() {
        let h = Harness::new();
        let account = h.account(2, 3).await;
        let coordinator = h.service.transactions();
        let tx = coordinator.create(&account.id, h.transfer(7), None).await.unwrap();

        coordinator.sign(&tx.id, &h.signers[0]).await.unwrap();
        assert!(matches!(
            coordinator.sign(&tx.id, &h.signers[0]).await,
            Err(CoordinatorError::Unauthorized(_))
        ));
        // signers[4] is not a member of a 3-member account
        assert!(matches!(
            coordinator.sign(&tx.id, &h.signers[4]).await,
            Err(CoordinatorError::Unauthorized(_))
        ));
        assert_eq!(coordinator.get(&tx.id).await.unwrap().signed_count(), 1);
    }

    #[tokio::test]
    async fn test_signing_failure_changes_nothing() {
        let h = Harness::new();
        let account = h.account(2, 3).await;
        let coordinator = h.service.transactions();
        let tx = coordinator.create(&account.id, h.transfer(7), None).await.unwrap();

        let forged = PresignedSigner::new(h.signers[1].address(), vec![0u8; 64])
            .with_public_key(hex::decode(h.signers[1].public_key_hex()).unwrap());
        assert!(matches!(
            coordinator.sign(&tx.id, &forged).await,
            Err(CoordinatorError::Chain(ChainError::Signing(_)))
        ));
        assert_eq!(coordinator.get(&tx.id).await.unwrap().signed_count(), 0);
    }

    #[tokio::test]
    async fn test_presigned_signature_over_sign_doc() {
        let h = Harness::new();
        let account = h.account(2, 2).await;
        let coordinator = h.service.transactions();
        let tx = coordinator.create(&account.id, h.transfer(7), None).await.unwrap();

        let doc = coordinator.sign_doc(&tx.id).await.unwrap();
        let bytes = doc.to_bytes().unwrap();
        let key = &h.keys[0];
        let signer = PresignedSigner::new(h.signers[0].address(), key.sign(&bytes).unwrap())
            .with_public_key(key.public_key_bytes());

        let tx = coordinator.sign(&tx.id, &signer).await.unwrap();
        assert_eq!(tx.signed_count(), 1);
    }

    #[tokio::test]
    async fn test_sign_rate_limit_per_transaction() {
        let mut policy = crate::config::Policy::default();
        policy.tx_sign_limit = RateLimit::new(2, 30);
        let h = Harness::with_policy(policy);
        let account = h.account(3, 3).await;
        let coordinator = h.service.transactions();
        let tx = coordinator.create(&account.id, h.transfer(7), None).await.unwrap();

        coordinator.sign(&tx.id, &h.signers[0]).await.unwrap();
        let _ = coordinator.sign(&tx.id, &h.signers[0]).await;
        assert!(matches!(
            coordinator.sign(&tx.id, &h.signers[1]).await,
            Err(CoordinatorError::RateLimited { .. })
        ));
    }

    #[tokio::test]
    async fn test_broadcast_requires_ready_without_chain_contact() {
        let h = Harness::new();
        let account = h.account(2, 3).await;
        let coordinator = h.service.transactions();
        let tx = coordinator.create(&account.id, h.transfer(7), None).await.unwrap();
        coordinator.sign(&tx.id, &h.signers[0]).await.unwrap();

        assert!(matches!(
            coordinator.broadcast(&tx.id).await,
            Err(CoordinatorError::InvalidState(_))
        ));
        assert_eq!(h.chain.broadcast_count(), 0);
    }

    #[tokio::test]
    async fn test_broadcast_failure_marks_failed() {
        let h = Harness::new();
        let account = h.account(2, 2).await;
        let coordinator = h.service.transactions();
        let tx = coordinator.create(&account.id, h.transfer(7), None).await.unwrap();
        coordinator.sign(&tx.id, &h.signers[0]).await.unwrap();
        coordinator.sign(&tx.id, &h.signers[1]).await.unwrap();

        h.chain.reject_broadcasts(Some((5, "insufficient funds")));
        assert!(matches!(
            coordinator.broadcast(&tx.id).await,
            Err(CoordinatorError::Chain(ChainError::Rejected { code: 5, .. }))
        ));

        let tx = coordinator.get(&tx.id).await.unwrap();
        assert_eq!(tx.status, TransactionStatus::Failed);
        assert!(tx.failure.as_deref().unwrap().contains("insufficient funds"));
        // Signatures stay in place, inert
        assert_eq!(tx.signed_count(), 2);

        // No automatic or repeated submission
        h.chain.reject_broadcasts(None);
        assert!(matches!(
            coordinator.broadcast(&tx.id).await,
            Err(CoordinatorError::InvalidState(_))
        ));
        assert_eq!(h.chain.broadcast_count(), 0);
        assert!(coordinator.locks.is_empty());
    }

    #[tokio::test]
    async fn test_broadcast_timeout_marks_failed() {
        let mut policy = crate::config::Policy::default();
        policy.chain_timeout_ms = 20;
        let h = Harness::with_policy(policy);
        let account = h.account(2, 2).await;
        let coordinator = h.service.transactions();
        let tx = coordinator.create(&account.id, h.transfer(7), None).await.unwrap();
        coordinator.sign(&tx.id, &h.signers[0]).await.unwrap();
        coordinator.sign(&tx.id, &h.signers[1]).await.unwrap();

        h.chain.set_delay(Some(Duration::from_millis(200)));
        assert!(matches!(
            coordinator.broadcast(&tx.id).await,
            Err(CoordinatorError::Chain(ChainError::Timeout(_)))
        ));
        assert_eq!(
            coordinator.get(&tx.id).await.unwrap().status,
            TransactionStatus::Failed
        );
    }

    #[tokio::test]
    async fn test_expired_transaction_is_inert_then_discarded() {
        let h = Harness::new();
        let account = h.account(2, 3).await;
        let coordinator = h.service.transactions();
        let tx = coordinator.create(&account.id, h.transfer(7), None).await.unwrap();
        let kept = coordinator.create(&account.id, h.transfer(8), None).await.unwrap();

        h.clock.advance(chrono::Duration::hours(25));
        assert!(matches!(
            coordinator.sign(&tx.id, &h.signers[0]).await,
            Err(CoordinatorError::InvalidState(_))
        ));

        // Broadcast transactions are never swept
        h.clock.advance(chrono::Duration::hours(-25));
        coordinator.sign(&kept.id, &h.signers[0]).await.unwrap();
        coordinator.sign(&kept.id, &h.signers[1]).await.unwrap();
        coordinator.broadcast(&kept.id).await.unwrap();
        h.clock.advance(chrono::Duration::hours(25));

        assert_eq!(coordinator.cleanup().await.unwrap(), 1);
        assert!(matches!(
            coordinator.get(&tx.id).await,
            Err(CoordinatorError::NotFound { .. })
        ));
        assert_eq!(coordinator.list(Some(&account.id)).await.unwrap().len(), 1);

        // Idempotent
        assert_eq!(coordinator.cleanup().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_slots_fixed_at_creation() {
        let h = Harness::new();
        let account = h.account(2, 3).await;
        let coordinator = h.service.transactions();
        let tx = coordinator.create(&account.id, h.transfer(7), None).await.unwrap();

        let member = h.member(4);
        h.service
            .accounts()
            .update(&account.id, |acc| acc.add_member(member, 20, chrono::Utc::now()))
            .await
            .unwrap();

        let tx = coordinator.get(&tx.id).await.unwrap();
        assert_eq!(tx.signatures.len(), 3);
        assert!(matches!(
            coordinator.sign(&tx.id, &h.signers[4]).await,
            Err(CoordinatorError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn test_concurrent_signers_do_not_race() {
        let h = Harness::new();
        let account = h.account(3, 5).await;
        let tx = h
            .service
            .transactions()
            .create(&account.id, h.transfer(7), None)
            .await
            .unwrap();

        let service = h.service.clone();
        let mut handles = Vec::new();
        for signer in h.signers.iter().take(3).cloned() {
            let service = service.clone();
            let id = tx.id.clone();
            handles.push(tokio::spawn(async move {
                service.transactions().sign(&id, &signer).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let tx = h.service.transactions().get(&tx.id).await.unwrap();
        assert_eq!(tx.signed_count(), 3);
        assert_eq!(tx.status, TransactionStatus::Ready);
    }

    #[tokio::test]
    async fn test_list_filters_by_account() {
        let h = Harness::new();
        let a = h.account(2, 2).await;
        let b = h.account(2, 3).await;
        let coordinator = h.service.transactions();
        coordinator.create(&a.id, h.transfer(1), None).await.unwrap();
        coordinator.create(&a.id, h.transfer(2), None).await.unwrap();
        coordinator.create(&b.id, h.transfer(3), None).await.unwrap();

        assert_eq!(coordinator.list(None).await.unwrap().len(), 3);
        assert_eq!(coordinator.list(Some(&a.id)).await.unwrap().len(), 2);
        assert_eq!(coordinator.list(Some(&b.id)).await.unwrap().len(), 1);
    }
}
