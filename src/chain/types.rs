//! Chain-level data types
//!
//! Messages, fees and the documents that members sign and the chain
//! receives. Encoding is canonical JSON: field order is fixed by the struct
//! definitions, so identical inputs always produce identical bytes.

use serde::{Deserialize, Serialize};

/// An amount in a single denomination (base units as a decimal string)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    pub denom: String,
    pub amount: String,
}

impl Coin {
    pub fn new(amount: u128, denom: &str) -> Self {
        Self {
            denom: denom.to_string(),
            amount: amount.to_string(),
        }
    }
}

/// Account number and sequence as reported by the chain
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInfo {
    pub account_number: u64,
    pub sequence: u64,
}

/// Fee attached to a transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fee {
    pub amount: Vec<Coin>,
    pub gas: u64,
}

/// On-chain governance vote option
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteOption {
    Yes,
    No,
    Abstain,
    NoWithVeto,
}

/// A message the chain executes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChainMessage {
    Send {
        from_address: String,
        to_address: String,
        amount: Vec<Coin>,
    },
    Delegate {
        delegator_address: String,
        validator_address: String,
        amount: Coin,
    },
    Vote {
        proposal_id: u64,
        voter: String,
        option: VoteOption,
    },
    Custom {
        type_url: String,
        value: serde_json::Value,
    },
}

/// The exact document every member signs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignDoc {
    pub chain_id: String,
    pub account_number: u64,
    pub sequence: u64,
    pub fee: Fee,
    pub memo: String,
    pub messages: Vec<ChainMessage>,
}

impl SignDoc {
    /// Canonical bytes handed to the signing capability
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

/// Broadcast-ready threshold-signed transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultisigTxEnvelope {
    pub multisig_address: String,
    pub threshold: u32,
    /// Member public keys (hex) in slot order
    pub public_keys: Vec<String>,
    /// Which slots contributed a signature
    pub signer_bits: Vec<bool>,
    /// Signatures (hex) of the set bits, in slot order
    pub signatures: Vec<String>,
    pub sign_doc: SignDoc,
}

impl MultisigTxEnvelope {
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> SignDoc {
        SignDoc {
            chain_id: "testnet-1".to_string(),
            account_number: 7,
            sequence: 3,
            fee: Fee {
                amount: vec![Coin::new(5000, "uatom")],
                gas: 200_000,
            },
            memo: String::new(),
            messages: vec![ChainMessage::Vote {
                proposal_id: 12,
                voter: "cosmos1voter".to_string(),
                option: VoteOption::NoWithVeto,
            }],
        }
    }

    #[test]
    fn test_sign_doc_bytes_are_stable() {
        assert_eq!(doc().to_bytes().unwrap(), doc().to_bytes().unwrap());

        let mut other = doc();
        other.sequence = 4;
        assert_ne!(doc().to_bytes().unwrap(), other.to_bytes().unwrap());
    }

    #[test]
    fn test_message_tagging() {
        let json = serde_json::to_value(&doc().messages[0]).unwrap();
        assert_eq!(json["type"], "vote");
        assert_eq!(json["option"], "no_with_veto");
    }
}
