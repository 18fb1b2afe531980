//! Proposal engine
//!
//! Members propose changes to their own account, vote on them, and execute
//! the ones that reach the account's threshold in yes-votes.

use crate::config::Policy;
use crate::core::{generate_id, Clock, CoordinatorError, Result};
use crate::multisig::{normalize_member, AccountRegistry, MultisigAccount};
use crate::proposal::proposal::{Proposal, ProposalAction, ProposalStatus, VoteChoice};
use crate::storage::{KeyedLocks, Store};
use crate::validation::{
    enforce, sanitize_text, AddressKind, RateLimiter, ValidationErrors, Validator,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;

const OP_CREATE: &str = "proposal_create";

/// Check title, description and the action against the account as it is now
pub fn validate_proposal(
    account: &MultisigAccount,
    title: &str,
    description: &str,
    action: &ProposalAction,
    policy: &Policy,
) -> std::result::Result<(), ValidationErrors> {
    let mut v = Validator::new(policy);
    v.text("title", title, policy.max_title_len, true);
    v.text("description", description, policy.max_description_len, true);

    match action {
        ProposalAction::AddMember { member } => {
            v.address("member.address", &member.address, AddressKind::Account);
            v.public_key("member.public_key", &member.public_key);
            if let Some(name) = &member.display_name {
                v.text("member.display_name", name, policy.max_display_name_len, false);
            }
            v.ensure(
                !account.is_member(&member.address),
                "member.address",
                format!("{} is already a member", member.address),
            );
            v.ensure(
                !account
                    .members
                    .iter()
                    .any(|m| m.public_key.eq_ignore_ascii_case(&member.public_key)),
                "member.public_key",
                "public key is already registered",
            );
            v.ensure(
                account.member_count() < policy.max_members,
                "member",
                format!("account already has the maximum of {} members", policy.max_members),
            );
        }
        ProposalAction::RemoveMember { address } => {
            v.ensure(
                account.is_member(address),
                "address",
                format!("{} is not a member", address),
            );
            v.ensure(
                account.member_count() > policy.min_members,
                "address",
                format!("account must keep at least {} members", policy.min_members),
            );
        }
        ProposalAction::ChangeThreshold { threshold } => {
            v.ensure(
                *threshold >= 1 && *threshold as usize <= account.member_count(),
                "threshold",
                format!(
                    "threshold {} must be between 1 and the member count {}",
                    threshold,
                    account.member_count()
                ),
            );
        }
        ProposalAction::TransferOwnership { new_owner } => {
            v.address("new_owner", new_owner, AddressKind::Account);
        }
    }

    v.finish()
}

/// Runs the propose / vote / execute loop for every account
pub struct ProposalEngine {
    store: Arc<dyn Store<Proposal>>,
    accounts: Arc<AccountRegistry>,
    limiter: Arc<dyn RateLimiter>,
    clock: Arc<dyn Clock>,
    policy: Arc<Policy>,
    locks: KeyedLocks,
}

impl ProposalEngine {
    pub fn new(
        store: Arc<dyn Store<Proposal>>,
        accounts: Arc<AccountRegistry>,
        limiter: Arc<dyn RateLimiter>,
        clock: Arc<dyn Clock>,
        policy: Arc<Policy>,
    ) -> Self {
        Self {
            store,
            accounts,
            limiter,
            clock,
            policy,
            locks: KeyedLocks::new(),
        }
    }

    /// Open a proposal on behalf of `proposer`
    pub async fn create(
        &self,
        account_id: &str,
        proposer: &str,
        title: &str,
        description: &str,
        action: ProposalAction,
    ) -> Result<Proposal> {
        let account = self.accounts.get(account_id).await?;
        let proposer = self.member_address(&account, proposer)?;

        validate_proposal(&account, title, description, &action, &self.policy)?;
        enforce(
            self.limiter.as_ref(),
            OP_CREATE,
            account_id,
            self.policy.proposal_create_limit,
        )
        .await?;

        let action = match action {
            ProposalAction::AddMember { member } => ProposalAction::AddMember {
                member: normalize_member(member),
            },
            other => other,
        };

        let now = self.clock.now();
        let proposal = Proposal {
            id: generate_id("proposal", &account.address, now),
            account_id: account.id.clone(),
            multisig_address: account.address.clone(),
            title: sanitize_text(title),
            description: sanitize_text(description),
            proposer: proposer.clone(),
            action,
            votes: Vec::new(),
            status: ProposalStatus::Active,
            created_at: now,
            updated_at: now,
            expires_at: now + self.policy.proposal_ttl(),
            executed_at: None,
        };
        self.store.put(proposal.clone()).await?;

        log::info!(
            "{} opened {} proposal {} on {}",
            proposer,
            proposal.action.kind(),
            proposal.id,
            account.address
        );
        Ok(proposal)
    }

    /// The member's stored address, or `Unauthorized` for outsiders
    fn member_address(&self, account: &MultisigAccount, address: &str) -> Result<String> {
        account
            .member(address)
            .map(|m| m.address.clone())
            .ok_or_else(|| {
                CoordinatorError::Unauthorized(format!(
                    "{} is not a member of account {}",
                    address, account.id
                ))
            })
    }

    async fn load(&self, id: &str) -> Result<Proposal> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| CoordinatorError::not_found("proposal", id))
    }

    /// Load under the caller's lock, rejecting an overdue active proposal
    async fn load_current(&self, id: &str) -> Result<Proposal> {
        let mut proposal = self.load(id).await?;
        if proposal.expire_if_due(self.clock.now()) {
            self.store.put(proposal.clone()).await?;
            log::info!("Proposal {} expired without passing", proposal.id);
        }
        Ok(proposal)
    }

    pub async fn get(&self, id: &str) -> Result<Proposal> {
        let _guard = self.locks.lock(id).await;
        self.load_current(id).await
    }

    /// Proposals, optionally for one account, oldest first
    pub async fn list(&self, account_id: Option<&str>) -> Result<Vec<Proposal>> {
        let now = self.clock.now();
        let mut proposals = Vec::new();
        for proposal in self.store.list().await? {
            if account_id.is_some_and(|id| proposal.account_id != id) {
                continue;
            }
            if proposal.status == ProposalStatus::Active && proposal.is_expired(now) {
                proposals.push(self.get(&proposal.id).await?);
            } else {
                proposals.push(proposal);
            }
        }
        proposals.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(proposals)
    }

    /// Record `voter`'s choice; the proposal passes once yes-votes reach the
    /// account's current threshold
    pub async fn vote(&self, id: &str, voter: &str, choice: VoteChoice) -> Result<Proposal> {
        let _guard = self.locks.lock(id).await;
        let mut proposal = self.load_current(id).await?;
        if proposal.status != ProposalStatus::Active {
            return Err(CoordinatorError::InvalidState(format!(
                "proposal {} is {:?}, not active",
                proposal.id, proposal.status
            )));
        }

        let account = self.accounts.get(&proposal.account_id).await?;
        let voter = self.member_address(&account, voter)?;

        proposal.cast(&voter, choice, self.clock.now());
        let passed = proposal.evaluate(&account);
        self.store.put(proposal.clone()).await?;

        let tally = proposal.tally_among(&account);
        log::debug!(
            "{} voted {:?} on proposal {} ({} yes / {} needed)",
            voter,
            choice,
            proposal.id,
            tally.yes,
            account.threshold
        );
        if passed {
            log::info!("Proposal {} passed", proposal.id);
        }
        Ok(proposal)
    }

    /// Apply a passed proposal to its account
    pub async fn execute(&self, id: &str) -> Result<Proposal> {
        let _guard = self.locks.lock(id).await;
        let mut proposal = self.load_current(id).await?;
        if proposal.status != ProposalStatus::Passed {
            return Err(CoordinatorError::InvalidState(format!(
                "proposal {} is {:?}; only passed proposals can be executed",
                proposal.id, proposal.status
            )));
        }

        if let ProposalAction::TransferOwnership { .. } = proposal.action {
            return Err(CoordinatorError::Unsupported(
                "transfer of ownership is not supported".to_string(),
            ));
        }

        let now = self.clock.now();
        let account = self.accounts.get(&proposal.account_id).await?;
        if !proposal.has_quorum(&account) {
            proposal.reopen(now);
            self.store.put(proposal.clone()).await?;
            log::warn!(
                "Proposal {} lost its quorum after member changes; voting reopened",
                proposal.id
            );
            return Err(CoordinatorError::InvalidState(format!(
                "proposal {} no longer has {} yes-votes from current members",
                proposal.id, account.threshold
            )));
        }

        // Marked before the account changes; restored to passed if the change fails
        let passed = proposal.clone();
        proposal.mark_executed(now);
        self.store.put(proposal.clone()).await?;

        let account = match self.apply(&proposal.account_id, &proposal.action, now).await {
            Ok(account) => account,
            Err(e) => {
                if let Err(rollback) = self.store.put(passed).await {
                    log::error!(
                        "Proposal {} stays executed though its change failed ({}): {}",
                        proposal.id,
                        e,
                        rollback
                    );
                }
                return Err(e);
            }
        };

        log::info!(
            "Executed {} proposal {}; account {} is now {}",
            proposal.action.kind(),
            proposal.id,
            account.id,
            account.description()
        );
        Ok(proposal)
    }

    async fn apply(
        &self,
        account_id: &str,
        action: &ProposalAction,
        now: DateTime<Utc>,
    ) -> Result<MultisigAccount> {
        let max_members = self.policy.max_members;
        let min_members = self.policy.min_members;
        match action.clone() {
            ProposalAction::AddMember { member } => {
                self.accounts
                    .update(account_id, |account| {
                        account.add_member(member, max_members, now)
                    })
                    .await
            }
            ProposalAction::RemoveMember { address } => {
                self.accounts
                    .update(account_id, |account| {
                        account.remove_member(&address, min_members, now).map(|_| ())
                    })
                    .await
            }
            ProposalAction::ChangeThreshold { threshold } => {
                self.accounts
                    .update(account_id, |account| account.set_threshold(threshold, now))
                    .await
            }
            ProposalAction::TransferOwnership { .. } => Err(CoordinatorError::Unsupported(
                "transfer of ownership is not supported".to_string(),
            )),
        }
    }

    /// Reject every active proposal past its expiry; returns how many
    pub async fn cleanup(&self) -> Result<usize> {
        let now = self.clock.now();
        let candidates: Vec<String> = self
            .store
            .list()
            .await?
            .into_iter()
            .filter(|p| p.status == ProposalStatus::Active && p.is_expired(now))
            .map(|p| p.id)
            .collect();

        let mut rejected = 0;
        for id in candidates {
            let _guard = self.locks.lock(&id).await;
            let Some(mut proposal) = self.store.get(&id).await? else {
                continue;
            };
            if proposal.expire_if_due(self.clock.now()) {
                self.store.put(proposal).await?;
                rejected += 1;
            }
        }
        if rejected > 0 {
            log::info!("Rejected {} expired proposals", rejected);
        }
        Ok(rejected)
    }
}
