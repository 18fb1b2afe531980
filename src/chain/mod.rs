//! Chain collaborators
//!
//! Interfaces to the blockchain and to signing capabilities, the documents
//! exchanged with them, and in-process implementations.

pub mod client;
pub mod memory;
pub mod signer;
pub mod types;

pub use client::{with_timeout, ChainClient, ChainError, Signer};
pub use memory::MemoryChain;
pub use signer::{KeySigner, PresignedSigner};
pub use types::{AccountInfo, ChainMessage, Coin, Fee, MultisigTxEnvelope, SignDoc, VoteOption};
