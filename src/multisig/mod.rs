//! Multi-signature accounts
//!
//! Provides M-of-N threshold accounts where M member signatures
//! from N registered members are required to act.
//!
//! # Example
//!
//! ```ignore
//! use multisig_coordinator::multisig::{AccountRegistry, Member};
//!
//! // Create a 2-of-3 account
//! let account = registry.create(2, vec![alice, bob, carol]).await?;
//! println!("{} at {}", account.description(), account.address);
//! ```

pub mod account;
pub mod registry;

pub use account::{Member, MultisigAccount};
pub use registry::{normalize_member, validate_member_set, AccountRegistry};
