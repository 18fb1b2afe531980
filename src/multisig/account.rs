//! Multi-signature account records
//!
//! An account is an M-of-N threshold account: `threshold` member
//! signatures (or yes-votes) out of `members` authorize an action.

use crate::chain::Coin;
use crate::core::Result;
use crate::storage::Entity;
use crate::validation::ValidationErrors;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One authorized member of an account
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    /// Bech32 account address of the member
    pub address: String,
    /// Compressed public key (hex)
    pub public_key: String,
    /// Optional human-readable label
    #[serde(default)]
    pub display_name: Option<String>,
}

impl Member {
    pub fn new(address: impl Into<String>, public_key: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            public_key: public_key.into(),
            display_name: None,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }
}

/// A threshold account
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MultisigAccount {
    /// Opaque identifier
    pub id: String,
    /// Chain address derived from threshold and member keys at creation
    pub address: String,
    /// Minimum signatures / yes-votes required
    pub threshold: u32,
    /// Members in key order
    pub members: Vec<Member>,
    /// Last fetched on-chain balance (best effort, may be stale)
    #[serde(default)]
    pub balance: Vec<Coin>,
    #[serde(default)]
    pub balance_updated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for MultisigAccount {
    const KIND: &'static str = "accounts";

    fn id(&self) -> &str {
        &self.id
    }
}

impl MultisigAccount {
    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Bech32 addresses are case-insensitive
    pub fn is_member(&self, address: &str) -> bool {
        self.member(address).is_some()
    }

    pub fn member(&self, address: &str) -> Option<&Member> {
        self.members
            .iter()
            .find(|m| m.address.eq_ignore_ascii_case(address))
    }

    /// Description like "2-of-3"
    pub fn description(&self) -> String {
        format!("{}-of-{}", self.threshold, self.members.len())
    }

    /// Append a member, keeping addresses and keys unique
    pub fn add_member(&mut self, member: Member, max_members: usize, now: DateTime<Utc>) -> Result<()> {
        let mut errors = ValidationErrors::new();
        if self.members.len() >= max_members {
            errors.push("members", format!("account already has the maximum of {} members", max_members));
        }
        if self.is_member(&member.address) {
            errors.push("member.address", format!("{} is already a member", member.address));
        }
        if self
            .members
            .iter()
            .any(|m| m.public_key.eq_ignore_ascii_case(&member.public_key))
        {
            errors.push("member.public_key", "public key is already registered");
        }
        errors.into_result()?;

        self.members.push(member);
        self.updated_at = now;
        Ok(())
    }

    /// Remove a member; the threshold is clamped to the new member count
    pub fn remove_member(&mut self, address: &str, min_members: usize, now: DateTime<Utc>) -> Result<Member> {
        let index = self
            .members
            .iter()
            .position(|m| m.address.eq_ignore_ascii_case(address))
            .ok_or_else(|| {
                ValidationErrors::single("address", format!("{} is not a member", address))
            })?;
        if self.members.len() <= min_members {
            return Err(ValidationErrors::single(
                "members",
                format!("account must keep at least {} members", min_members),
            )
            .into());
        }

        let removed = self.members.remove(index);
        let count = self.members.len() as u32;
        if self.threshold > count {
            log::info!(
                "Clamping threshold of {} from {} to {}",
                self.id,
                self.threshold,
                count
            );
            self.threshold = count;
        }
        self.updated_at = now;
        Ok(removed)
    }

    /// Set a new threshold within `1..=member_count`
    pub fn set_threshold(&mut self, threshold: u32, now: DateTime<Utc>) -> Result<()> {
        if threshold == 0 || threshold as usize > self.members.len() {
            return Err(ValidationErrors::single(
                "threshold",
                format!(
                    "threshold {} must be between 1 and the member count {}",
                    threshold,
                    self.members.len()
                ),
            )
            .into());
        }
        self.threshold = threshold;
        self.updated_at = now;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::CoordinatorError;

    fn account(threshold: u32, members: usize) -> MultisigAccount {
        let now = Utc::now();
        MultisigAccount {
            id: "acc".to_string(),
            address: "cosmos1multi".to_string(),
            threshold,
            members: (0..members)
                .map(|i| Member::new(format!("addr{}", i), format!("key{}", i)))
                .collect(),
            balance: vec![],
            balance_updated_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_description_and_lookup() {
        let acc = account(2, 3);
        assert_eq!(acc.description(), "2-of-3");
        assert!(acc.is_member("addr1"));
        assert!(!acc.is_member("addr9"));
        assert!(acc.is_member("ADDR1"));
        assert_eq!(acc.member("addr2").unwrap().public_key, "key2");
    }

    #[test]
    fn test_add_member_rejects_duplicates() {
        let mut acc = account(2, 3);
        let err = acc
            .add_member(Member::new("addr0", "key0"), 20, Utc::now())
            .unwrap_err();
        match err {
            CoordinatorError::Validation(errors) => assert_eq!(errors.len(), 2),
            other => panic!("unexpected error {:?}", other),
        }

        acc.add_member(Member::new("addr3", "key3"), 20, Utc::now()).unwrap();
        assert_eq!(acc.member_count(), 4);
        assert!(acc.add_member(Member::new("addr4", "key4"), 4, Utc::now()).is_err());
    }

    #[test]
    fn test_remove_member_clamps_threshold() {
        let mut acc = account(3, 3);
        acc.remove_member("addr1", 2, Utc::now()).unwrap();
        assert_eq!(acc.member_count(), 2);
        assert_eq!(acc.threshold, 2);

        // Floor on member count
        assert!(acc.remove_member("addr0", 2, Utc::now()).is_err());
        assert!(acc.remove_member("nobody", 1, Utc::now()).is_err());
    }

    #[test]
    fn test_set_threshold_bounds() {
        let mut acc = account(2, 3);
        assert!(acc.set_threshold(0, Utc::now()).is_err());
        assert!(acc.set_threshold(4, Utc::now()).is_err());
        acc.set_threshold(3, Utc::now()).unwrap();
        assert_eq!(acc.threshold, 3);
    }
}
