//! Cryptographic utilities
//!
//! This module provides:
//! - SHA-256 / RIPEMD-160 hashing
//! - ECDSA key management (secp256k1)
//! - Bech32 address encoding and multisig address derivation

pub mod address;
pub mod hash;
pub mod keys;

pub use address::{decode_address, derive_multisig_address, encode_address, AddressError};
pub use hash::{hash160, sha256, sha256_hex};
pub use keys::{verify_signature, KeyError, KeyPair};
