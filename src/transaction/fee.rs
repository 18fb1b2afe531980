//! Fee estimation
//!
//! Linear model: gas = gas_per_message × message_count, fee = gas × price.

use crate::chain::{Coin, Fee};
use crate::config::Policy;
use serde::{Deserialize, Serialize};

/// Gas price in thousandths of the fee denomination per unit of gas
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GasPrice(pub u64);

impl GasPrice {
    pub fn from_milli(milli: u64) -> Self {
        Self(milli)
    }

    /// Fee for `gas`, rounded up to a whole base unit
    pub fn fee_for_gas(&self, gas: u64) -> u128 {
        (gas as u128 * self.0 as u128).div_ceil(1000)
    }
}

/// Estimate the fee for a transaction carrying `message_count` messages
pub fn estimate_fee(message_count: usize, policy: &Policy) -> Fee {
    let gas = policy
        .gas_per_message
        .saturating_mul(message_count.max(1) as u64);
    let amount = GasPrice::from_milli(policy.gas_price_milli).fee_for_gas(gas);

    Fee {
        amount: vec![Coin::new(amount, &policy.fee_denom)],
        gas,
    }
}
