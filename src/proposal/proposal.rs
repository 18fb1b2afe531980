//! Proposal records
//!
//! A proposal asks an account's members to change the account itself:
//! its member set or its threshold.

use crate::multisig::{Member, MultisigAccount};
use crate::storage::Entity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The change a proposal makes once executed
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProposalAction {
    AddMember { member: Member },
    RemoveMember { address: String },
    ChangeThreshold { threshold: u32 },
    /// Accepted and voted on, but execution is not supported
    TransferOwnership { new_owner: String },
}

impl ProposalAction {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AddMember { .. } => "add_member",
            Self::RemoveMember { .. } => "remove_member",
            Self::ChangeThreshold { .. } => "change_threshold",
            Self::TransferOwnership { .. } => "transfer_ownership",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteChoice {
    Yes,
    No,
    Abstain,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub voter: String,
    pub choice: VoteChoice,
    pub voted_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalStatus {
    Active,
    Passed,
    Executed,
    Rejected,
}

/// Vote counts by choice
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub yes: usize,
    pub no: usize,
    pub abstain: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Proposal {
    pub id: String,
    pub account_id: String,
    pub multisig_address: String,
    pub title: String,
    pub description: String,
    /// Member address that opened the proposal
    pub proposer: String,
    pub action: ProposalAction,
    /// At most one per member
    pub votes: Vec<Vote>,
    pub status: ProposalStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    #[serde(default)]
    pub executed_at: Option<DateTime<Utc>>,
}

impl Entity for Proposal {
    const KIND: &'static str = "proposals";

    fn id(&self) -> &str {
        &self.id
    }
}

impl Proposal {
    /// Record a vote, replacing any earlier vote by the same member
    pub fn cast(&mut self, voter: &str, choice: VoteChoice, now: DateTime<Utc>) {
        self.votes.retain(|v| v.voter != voter);
        self.votes.push(Vote {
            voter: voter.to_string(),
            choice,
            voted_at: now,
        });
        self.updated_at = now;
    }

    /// Counts over every recorded vote, including those of former members
    pub fn tally(&self) -> Tally {
        self.count(|_| true)
    }

    /// Counts over the votes of members the account still has
    pub fn tally_among(&self, account: &MultisigAccount) -> Tally {
        self.count(|voter| account.is_member(voter))
    }

    fn count(&self, counts: impl Fn(&str) -> bool) -> Tally {
        self.votes
            .iter()
            .filter(|v| counts(v.voter.as_str()))
            .fold(Tally::default(), |mut t, v| {
                match v.choice {
                    VoteChoice::Yes => t.yes += 1,
                    VoteChoice::No => t.no += 1,
                    VoteChoice::Abstain => t.abstain += 1,
                }
                t
            })
    }

    /// Whether current members' yes-votes reach the account's threshold
    pub fn has_quorum(&self, account: &MultisigAccount) -> bool {
        self.tally_among(account).yes >= account.threshold as usize
    }

    /// Passes once yes-votes reach the threshold; no and abstain never block
    pub fn evaluate(&mut self, account: &MultisigAccount) -> bool {
        if self.status == ProposalStatus::Active && self.has_quorum(account) {
            self.status = ProposalStatus::Passed;
            return true;
        }
        false
    }

    /// Send a passed proposal back to voting
    pub fn reopen(&mut self, now: DateTime<Utc>) {
        if self.status == ProposalStatus::Passed {
            self.status = ProposalStatus::Active;
            self.updated_at = now;
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Reject an active proposal past its expiry; true if the status changed
    pub fn expire_if_due(&mut self, now: DateTime<Utc>) -> bool {
        if self.status == ProposalStatus::Active && self.is_expired(now) {
            self.status = ProposalStatus::Rejected;
            self.updated_at = now;
            return true;
        }
        false
    }

    pub fn mark_executed(&mut self, now: DateTime<Utc>) {
        self.status = ProposalStatus::Executed;
        self.executed_at = Some(now);
        self.updated_at = now;
    }
}
