//! Signing capabilities
//!
//! [`KeySigner`] signs with a local secp256k1 key. [`PresignedSigner`]
//! carries a signature produced elsewhere (a browser wallet, a hardware
//! device) and hands it over when asked.

use crate::chain::client::{ChainError, Signer};
use crate::crypto::{verify_signature, KeyError, KeyPair};
use async_trait::async_trait;

/// Signs with a key held in memory
#[derive(Debug, Clone)]
pub struct KeySigner {
    key: KeyPair,
    address: String,
}

impl KeySigner {
    pub fn new(key: KeyPair, prefix: &str) -> Result<Self, KeyError> {
        let address = key.address(prefix)?;
        Ok(Self { key, address })
    }

    pub fn public_key_hex(&self) -> String {
        self.key.public_key_hex()
    }
}

#[async_trait]
impl Signer for KeySigner {
    fn address(&self) -> &str {
        &self.address
    }

    async fn sign(&self, sign_bytes: &[u8]) -> Result<Vec<u8>, ChainError> {
        self.key
            .sign(sign_bytes)
            .map_err(|e| ChainError::Signing(e.to_string()))
    }
}

/// Wraps a signature that was produced out of process
#[derive(Debug, Clone)]
pub struct PresignedSigner {
    address: String,
    signature: Vec<u8>,
    public_key: Option<Vec<u8>>,
}

impl PresignedSigner {
    pub fn new(address: impl Into<String>, signature: Vec<u8>) -> Self {
        Self {
            address: address.into(),
            signature,
            public_key: None,
        }
    }

    /// Verify the signature against this key before handing it over
    pub fn with_public_key(mut self, public_key: Vec<u8>) -> Self {
        self.public_key = Some(public_key);
        self
    }
}

#[async_trait]
impl Signer for PresignedSigner {
    fn address(&self) -> &str {
        &self.address
    }

    async fn sign(&self, sign_bytes: &[u8]) -> Result<Vec<u8>, ChainError> {
        if let Some(public_key) = &self.public_key {
            let valid = verify_signature(public_key, sign_bytes, &self.signature)
                .map_err(|e| ChainError::Signing(e.to_string()))?;
            if !valid {
                return Err(ChainError::Signing(
                    "signature does not match the sign document".to_string(),
                ));
            }
        }
        Ok(self.signature.clone())
    }
}
