//! Pending multi-signature transactions
//!
//! A transaction is created against an account with one signature slot per
//! member, collects signatures until the account's threshold is met, and is
//! then encoded for broadcast.

use crate::chain::{
    AccountInfo, ChainMessage, Coin, Fee, MultisigTxEnvelope, SignDoc, VoteOption,
};
use crate::multisig::MultisigAccount;
use crate::storage::Entity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One recipient of a transfer
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    pub address: String,
    pub amount: Coin,
}

/// A raw chain message for custom transactions
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CustomMessage {
    pub type_url: String,
    pub value: serde_json::Value,
}

/// What the transaction does
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransactionPayload {
    Transfer {
        recipients: Vec<Recipient>,
    },
    Delegate {
        validator_address: String,
        amount: Coin,
    },
    GovernanceVote {
        proposal_id: u64,
        option: VoteOption,
    },
    Custom {
        messages: Vec<CustomMessage>,
    },
}

impl TransactionPayload {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transfer { .. } => "transfer",
            Self::Delegate { .. } => "delegate",
            Self::GovernanceVote { .. } => "governance_vote",
            Self::Custom { .. } => "custom",
        }
    }

    /// Expand into chain messages sent from `from_address`
    pub fn to_messages(&self, from_address: &str) -> Vec<ChainMessage> {
        match self {
            Self::Transfer { recipients } => recipients
                .iter()
                .map(|r| ChainMessage::Send {
                    from_address: from_address.to_string(),
                    to_address: r.address.clone(),
                    amount: vec![r.amount.clone()],
                })
                .collect(),
            Self::Delegate {
                validator_address,
                amount,
            } => vec![ChainMessage::Delegate {
                delegator_address: from_address.to_string(),
                validator_address: validator_address.clone(),
                amount: amount.clone(),
            }],
            Self::GovernanceVote {
                proposal_id,
                option,
            } => vec![ChainMessage::Vote {
                proposal_id: *proposal_id,
                voter: from_address.to_string(),
                option: *option,
            }],
            Self::Custom { messages } => messages
                .iter()
                .map(|m| ChainMessage::Custom {
                    type_url: m.type_url.clone(),
                    value: m.value.clone(),
                })
                .collect(),
        }
    }
}

/// Placeholder for one member's signature
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureSlot {
    pub member_address: String,
    /// Member public key (hex) captured at creation
    pub public_key: String,
    /// Signature (hex) once provided
    pub signature: Option<String>,
    pub signed_at: Option<DateTime<Utc>>,
}

impl SignatureSlot {
    pub fn is_signed(&self) -> bool {
        self.signature.is_some()
    }
}

/// Status of a pending transaction
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    /// Waiting for more signatures
    Pending,
    /// Has enough signatures, ready to broadcast
    Ready,
    /// Accepted by the chain
    Broadcast,
    /// Included in a block (set by external confirmation tracking)
    Confirmed,
    /// Broadcast was rejected or timed out
    Failed,
}

impl TransactionStatus {
    /// Statuses that expiry applies to
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Pending | Self::Ready)
    }
}

/// A transaction collecting signatures
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PendingTransaction {
    pub id: String,
    /// Owning account id
    pub account_id: String,
    /// Owning account address
    pub multisig_address: String,
    pub payload: TransactionPayload,
    #[serde(default)]
    pub memo: String,
    pub fee: Fee,
    /// One slot per member at creation time
    pub signatures: Vec<SignatureSlot>,
    /// Account number and sequence every member signs against
    #[serde(default)]
    pub sign_context: Option<AccountInfo>,
    pub status: TransactionStatus,
    /// Broadcast-ready bytes (hex), present once ready
    #[serde(default)]
    pub tx_bytes: Option<String>,
    #[serde(default)]
    pub tx_hash: Option<String>,
    #[serde(default)]
    pub failure: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Entity for PendingTransaction {
    const KIND: &'static str = "transactions";

    fn id(&self) -> &str {
        &self.id
    }
}

impl PendingTransaction {
    /// Create a pending transaction with an empty slot for every current member
    pub fn new(
        id: String,
        account: &MultisigAccount,
        payload: TransactionPayload,
        memo: String,
        fee: Fee,
        now: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        let signatures = account
            .members
            .iter()
            .map(|m| SignatureSlot {
                member_address: m.address.clone(),
                public_key: m.public_key.clone(),
                signature: None,
                signed_at: None,
            })
            .collect();

        Self {
            id,
            account_id: account.id.clone(),
            multisig_address: account.address.clone(),
            payload,
            memo,
            fee,
            signatures,
            sign_context: None,
            status: TransactionStatus::Pending,
            tx_bytes: None,
            tx_hash: None,
            failure: None,
            created_at: now,
            updated_at: now,
            expires_at,
        }
    }

    pub fn messages(&self) -> Vec<ChainMessage> {
        self.payload.to_messages(&self.multisig_address)
    }

    /// Number of signatures collected
    pub fn signed_count(&self) -> usize {
        self.signatures.iter().filter(|s| s.is_signed()).count()
    }

    pub fn slot(&self, address: &str) -> Option<&SignatureSlot> {
        self.signatures
            .iter()
            .find(|s| s.member_address.eq_ignore_ascii_case(address))
    }

    /// Addresses that have already signed
    pub fn signed_by(&self) -> Vec<&str> {
        self.signatures
            .iter()
            .filter(|s| s.is_signed())
            .map(|s| s.member_address.as_str())
            .collect()
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// The document members sign; `None` until the sign context is fixed
    pub fn sign_doc(&self, chain_id: &str) -> Option<SignDoc> {
        let context = self.sign_context?;
        Some(SignDoc {
            chain_id: chain_id.to_string(),
            account_number: context.account_number,
            sequence: context.sequence,
            fee: self.fee.clone(),
            memo: self.memo.clone(),
            messages: self.messages(),
        })
    }

    /// Record a member's signature and re-evaluate readiness.
    /// Returns true if this signature made the transaction ready.
    pub fn record_signature(
        &mut self,
        address: &str,
        signature: &[u8],
        threshold: u32,
        now: DateTime<Utc>,
    ) -> bool {
        if let Some(slot) = self
            .signatures
            .iter_mut()
            .find(|s| s.member_address.eq_ignore_ascii_case(address))
        {
            slot.signature = Some(hex::encode(signature));
            slot.signed_at = Some(now);
        }
        self.updated_at = now;

        if self.status == TransactionStatus::Pending && self.signed_count() >= threshold as usize {
            self.status = TransactionStatus::Ready;
            return true;
        }
        false
    }

    /// Build the broadcast envelope from the collected signatures
    pub fn envelope(&self, chain_id: &str, threshold: u32) -> Option<MultisigTxEnvelope> {
        let sign_doc = self.sign_doc(chain_id)?;
        Some(MultisigTxEnvelope {
            multisig_address: self.multisig_address.clone(),
            threshold,
            public_keys: self.signatures.iter().map(|s| s.public_key.clone()).collect(),
            signer_bits: self.signatures.iter().map(|s| s.is_signed()).collect(),
            signatures: self
                .signatures
                .iter()
                .filter_map(|s| s.signature.clone())
                .collect(),
            sign_doc,
        })
    }

    pub fn mark_broadcast(&mut self, tx_hash: String, now: DateTime<Utc>) {
        self.status = TransactionStatus::Broadcast;
        self.tx_hash = Some(tx_hash);
        self.updated_at = now;
    }

    pub fn mark_failed(&mut self, reason: String, now: DateTime<Utc>) {
        self.status = TransactionStatus::Failed;
        self.failure = Some(reason);
        self.updated_at = now;
    }
}
