//! Account governance proposals
//!
//! Members vote on changes to their own account. Only yes-votes count
//! toward the threshold.

pub mod engine;
pub mod proposal;

pub use engine::{validate_proposal, ProposalEngine};
pub use proposal::{Proposal, ProposalAction, ProposalStatus, Tally, Vote, VoteChoice};
