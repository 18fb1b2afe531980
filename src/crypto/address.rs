//! Bech32 address encoding
//!
//! Account and validator addresses are bech32 strings whose human-readable
//! part identifies the chain and the address kind.

use super::hash::sha256;
use bech32::{FromBase32, ToBase32, Variant};
use thiserror::Error;

/// Length in bytes of the hash embedded in a multisig address
pub const MULTISIG_ADDRESS_BYTES: usize = 20;

/// Errors produced while encoding or decoding addresses
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("Malformed bech32 string: {0}")]
    Malformed(String),
    #[error("Wrong prefix: expected {expected}, found {found}")]
    WrongPrefix { expected: String, found: String },
    #[error("Unexpected payload length {0}")]
    BadLength(usize),
}

impl From<bech32::Error> for AddressError {
    fn from(err: bech32::Error) -> Self {
        AddressError::Malformed(err.to_string())
    }
}

/// Encode raw bytes under the given human-readable prefix
pub fn encode_address(prefix: &str, bytes: &[u8]) -> Result<String, AddressError> {
    Ok(bech32::encode(prefix, bytes.to_base32(), Variant::Bech32)?)
}

/// Decode an address, checking its prefix, and return the payload bytes
pub fn decode_address(address: &str, expected_prefix: &str) -> Result<Vec<u8>, AddressError> {
    let (hrp, data, variant) = bech32::decode(address)?;
    if variant != Variant::Bech32 {
        return Err(AddressError::Malformed("bech32m is not accepted".to_string()));
    }
    if hrp != expected_prefix {
        return Err(AddressError::WrongPrefix {
            expected: expected_prefix.to_string(),
            found: hrp,
        });
    }
    let bytes = Vec::<u8>::from_base32(&data)?;
    // 20-byte key hashes and 32-byte module/contract hashes
    if bytes.len() != 20 && bytes.len() != 32 {
        return Err(AddressError::BadLength(bytes.len()));
    }
    Ok(bytes)
}

/// Derive the threshold account address from its threshold and ordered key set
///
/// Address = Bech32(prefix, SHA256(threshold_be || (len || pubkey)*)[..20])
pub fn derive_multisig_address(
    prefix: &str,
    threshold: u32,
    public_keys: &[Vec<u8>],
) -> Result<String, AddressError> {
    let mut key_data = threshold.to_be_bytes().to_vec();
    for pubkey in public_keys {
        key_data.extend_from_slice(&(pubkey.len() as u32).to_be_bytes());
        key_data.extend_from_slice(pubkey);
    }

    let hash = sha256(&key_data);
    encode_address(prefix, &hash[..MULTISIG_ADDRESS_BYTES])
}
