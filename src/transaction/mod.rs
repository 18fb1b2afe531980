//! Multi-signature transactions
//!
//! A transaction moves through `Pending → Ready → Broadcast`, or ends in
//! `Failed` when the chain rejects it. Open transactions that outlive their
//! expiry are discarded by cleanup.

pub mod coordinator;
pub mod fee;
pub mod pending;

pub use coordinator::{validate_payload, TransactionCoordinator};
pub use fee::{estimate_fee, GasPrice};
pub use pending::{
    CustomMessage, PendingTransaction, Recipient, SignatureSlot, TransactionPayload,
    TransactionStatus,
};
