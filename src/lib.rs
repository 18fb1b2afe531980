//! Multisig Coordinator: threshold account management in Rust
//!
//! This crate coordinates the lifecycle of M-of-N multi-signature accounts:
//! - Account registry with deterministic multisig address derivation
//! - Pending transactions that collect member signatures until ready
//! - Broadcast through a pluggable chain client with explicit timeouts
//! - Member proposals for membership and threshold changes, with yes-quorum voting
//! - Validation layer: bech32 addresses, amounts, text screening, rate limits
//! - In-memory and JSON file persistence behind one store interface
//! - REST API (axum) and CLI front ends
//!
//! # Example
//!
//! ```rust,ignore
//! use multisig_coordinator::chain::{KeySigner, MemoryChain};
//! use multisig_coordinator::service::{MultisigService, Stores};
//!
//! let service = MultisigService::new(chain, Stores::in_memory(), policy, clock, limiter);
//!
//! // 2-of-3 account
//! let account = service.accounts().create(2, members).await?;
//!
//! // Collect two signatures and broadcast
//! let tx = service.transactions().create(&account.id, payload, None).await?;
//! service.transactions().sign(&tx.id, &alice).await?;
//! service.transactions().sign(&tx.id, &bob).await?;
//! let tx = service.transactions().broadcast(&tx.id).await?;
//! println!("Broadcast as {:?}", tx.tx_hash);
//! ```

pub mod api;
pub mod chain;
pub mod cli;
pub mod config;
pub mod core;
pub mod crypto;
pub mod multisig;
pub mod proposal;
pub mod service;
pub mod storage;
pub mod transaction;
pub mod validation;

// Re-export commonly used types
pub use api::{create_router, ApiState};
pub use chain::{ChainClient, ChainError, KeySigner, MemoryChain, PresignedSigner, Signer};
pub use config::Policy;
pub use core::{Clock, CoordinatorError, ManualClock, Result, SystemClock};
pub use crypto::KeyPair;
pub use multisig::{AccountRegistry, Member, MultisigAccount};
pub use proposal::{Proposal, ProposalAction, ProposalEngine, ProposalStatus, VoteChoice};
pub use service::{CleanupReport, MultisigService, Stores};
pub use storage::{JsonFileStore, MemoryStore, Store};
pub use transaction::{PendingTransaction, TransactionCoordinator, TransactionPayload, TransactionStatus};
pub use validation::{InMemoryRateLimiter, RateLimiter, ValidationErrors};
