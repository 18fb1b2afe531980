//! Reference policy and loading from disk

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

// =============================================================================
// Constants
// =============================================================================

/// Pending transactions expire 24 hours after creation
pub const DEFAULT_TRANSACTION_TTL_SECS: u64 = 24 * 60 * 60;

/// Proposals expire 7 days after creation
pub const DEFAULT_PROPOSAL_TTL_SECS: u64 = 7 * 24 * 60 * 60;

/// Hard cap on members per account
pub const DEFAULT_MAX_MEMBERS: usize = 20;

/// Gas charged per message in the linear fee model
pub const DEFAULT_GAS_PER_MESSAGE: u64 = 200_000;

/// Gas price in thousandths of the fee denomination (25 = 0.025)
pub const DEFAULT_GAS_PRICE_MILLI: u64 = 25;

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Parse error: {0}")]
    ParseError(#[from] serde_json::Error),
    #[error("Invalid policy: {0}")]
    Invalid(String),
}

/// A sliding-window cap: at most `max` operations per `window_secs`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimit {
    pub max: u32,
    pub window_secs: u64,
}

impl RateLimit {
    pub const fn new(max: u32, window_secs: u64) -> Self {
        Self { max, window_secs }
    }

    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

/// Tunable limits for every component
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Policy {
    /// Chain id embedded in every sign document
    pub chain_id: String,
    /// Human-readable bech32 prefix of account addresses
    pub account_prefix: String,
    /// Human-readable bech32 prefix of validator operator addresses
    pub validator_prefix: String,
    /// Denominations accepted in amounts
    pub allowed_denoms: Vec<String>,
    /// Denomination the fee is charged in
    pub fee_denom: String,
    /// Upper bound for any single amount (base units)
    pub max_amount: u128,
    pub min_members: usize,
    pub max_members: usize,
    pub transaction_ttl_secs: u64,
    pub proposal_ttl_secs: u64,
    pub tx_create_limit: RateLimit,
    pub tx_sign_limit: RateLimit,
    pub proposal_create_limit: RateLimit,
    pub gas_per_message: u64,
    pub gas_price_milli: u64,
    pub max_memo_len: usize,
    pub max_title_len: usize,
    pub max_description_len: usize,
    pub max_display_name_len: usize,
    pub public_key_min_bytes: usize,
    pub public_key_max_bytes: usize,
    /// Timeout applied to every chain query and broadcast
    pub chain_timeout_ms: u64,
    /// Period of the background cleanup sweep
    pub cleanup_interval_secs: u64,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            chain_id: "cosmoshub-4".to_string(),
            account_prefix: "cosmos".to_string(),
            validator_prefix: "cosmosvaloper".to_string(),
            allowed_denoms: vec!["uatom".to_string()],
            fee_denom: "uatom".to_string(),
            max_amount: 1_000_000_000_000_000_000,
            min_members: 2,
            max_members: DEFAULT_MAX_MEMBERS,
            transaction_ttl_secs: DEFAULT_TRANSACTION_TTL_SECS,
            proposal_ttl_secs: DEFAULT_PROPOSAL_TTL_SECS,
            tx_create_limit: RateLimit::new(10, 60),
            tx_sign_limit: RateLimit::new(5, 30),
            proposal_create_limit: RateLimit::new(3, 600),
            gas_per_message: DEFAULT_GAS_PER_MESSAGE,
            gas_price_milli: DEFAULT_GAS_PRICE_MILLI,
            max_memo_len: 256,
            max_title_len: 140,
            max_description_len: 5_000,
            max_display_name_len: 64,
            public_key_min_bytes: 33,
            public_key_max_bytes: 65,
            chain_timeout_ms: 10_000,
            cleanup_interval_secs: 60,
        }
    }
}

impl Policy {
    /// Load a policy from a JSON file; absent fields keep their defaults
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let data = fs::read_to_string(path)?;
        let policy: Policy = serde_json::from_str(&data)?;
        policy.check()?;
        Ok(policy)
    }

    /// Sanity-check internal consistency
    pub fn check(&self) -> Result<(), ConfigError> {
        if self.min_members < 1 || self.min_members > self.max_members {
            return Err(ConfigError::Invalid(format!(
                "member bounds {}..={} are inconsistent",
                self.min_members, self.max_members
            )));
        }
        if self.allowed_denoms.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one denomination must be allowed".to_string(),
            ));
        }
        if !self.allowed_denoms.contains(&self.fee_denom) {
            return Err(ConfigError::Invalid(format!(
                "fee denomination {} is not allowed",
                self.fee_denom
            )));
        }
        if self.public_key_min_bytes > self.public_key_max_bytes {
            return Err(ConfigError::Invalid(
                "public key byte bounds are inverted".to_string(),
            ));
        }
        Ok(())
    }

    pub fn transaction_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.transaction_ttl_secs as i64)
    }

    pub fn proposal_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.proposal_ttl_secs as i64)
    }

    pub fn chain_timeout(&self) -> Duration {
        Duration::from_millis(self.chain_timeout_ms)
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_secs)
    }

    pub fn is_allowed_denom(&self, denom: &str) -> bool {
        self.allowed_denoms.iter().any(|d| d == denom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_reference_policy() {
        let policy = Policy::default();
        assert!(policy.check().is_ok());
        assert_eq!(policy.transaction_ttl(), chrono::Duration::hours(24));
        assert_eq!(policy.proposal_ttl(), chrono::Duration::days(7));
        assert_eq!(policy.tx_create_limit, RateLimit::new(10, 60));
        assert_eq!(policy.tx_sign_limit.window(), Duration::from_secs(30));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "chain_id": "testnet-1", "max_members": 5 }}"#).unwrap();

        let policy = Policy::from_file(file.path()).unwrap();
        assert_eq!(policy.chain_id, "testnet-1");
        assert_eq!(policy.max_members, 5);
        assert_eq!(policy.account_prefix, "cosmos");
    }

    #[test]
    fn test_inconsistent_policy_rejected() {
        let policy = Policy {
            fee_denom: "uosmo".to_string(),
            ..Default::default()
        };
        assert!(matches!(policy.check(), Err(ConfigError::Invalid(_))));
    }
}
