//! CLI commands for the multisig coordinator
//!
//! Implements all command handlers for the CLI interface. State lives in
//! JSON files under the data directory; the chain is an offline in-process
//! one, so broadcasts are recorded locally.

use crate::chain::{Coin, KeySigner, MemoryChain};
use crate::config::Policy;
use crate::core::SystemClock;
use crate::crypto::KeyPair;
use crate::multisig::{Member, MultisigAccount};
use crate::proposal::{Proposal, ProposalAction, ProposalStatus, VoteChoice};
use crate::service::{MultisigService, Stores};
use crate::storage::StorageConfig;
use crate::transaction::{PendingTransaction, Recipient, TransactionPayload};
use crate::validation::InMemoryRateLimiter;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Application state
pub struct AppState {
    pub service: MultisigService,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Open the JSON stores under `data_dir` and wire the service
    pub fn new(data_dir: PathBuf, policy: Policy) -> CliResult<Self> {
        let storage_config = StorageConfig {
            data_dir: data_dir.clone(),
            ..Default::default()
        };
        let stores = Stores::json_files(storage_config)?;

        let clock = Arc::new(SystemClock);
        let service = MultisigService::new(
            Arc::new(MemoryChain::new()),
            stores,
            policy,
            clock.clone(),
            Arc::new(InMemoryRateLimiter::new(clock)),
        );

        Ok(Self { service, data_dir })
    }
}

/// Parse `address:public_key[:display name]`
pub fn parse_member(spec: &str) -> CliResult<Member> {
    let mut parts = spec.splitn(3, ':');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(address), Some(public_key), name) if !address.is_empty() && !public_key.is_empty() => {
            let member = Member::new(address, public_key);
            Ok(match name {
                Some(name) => member.with_display_name(name),
                None => member,
            })
        }
        _ => Err(format!("invalid member '{}', expected address:public_key[:name]", spec).into()),
    }
}

pub fn parse_choice(value: &str) -> CliResult<VoteChoice> {
    match value.to_ascii_lowercase().as_str() {
        "yes" | "y" => Ok(VoteChoice::Yes),
        "no" | "n" => Ok(VoteChoice::No),
        "abstain" | "a" => Ok(VoteChoice::Abstain),
        other => Err(format!("unknown vote choice '{}' (yes, no, abstain)", other).into()),
    }
}

fn print_account(account: &MultisigAccount) {
    println!("🔐 Account {}", account.id);
    println!("   ├─ Address: {}", account.address);
    println!("   ├─ Policy: {}", account.description());
    for member in &account.members {
        println!(
            "   ├─ Member: {} ({})",
            member.address,
            member.display_name.as_deref().unwrap_or("-")
        );
    }
    println!("   └─ Created: {}", account.created_at);
}

fn print_transaction(tx: &PendingTransaction) {
    println!("📄 Transaction {}", tx.id);
    println!("   ├─ Account: {}", tx.multisig_address);
    println!("   ├─ Type: {}", tx.payload.kind());
    println!("   ├─ Status: {:?}", tx.status);
    println!(
        "   ├─ Signatures: {}/{}",
        tx.signed_count(),
        tx.signatures.len()
    );
    for slot in &tx.signatures {
        let mark = if slot.is_signed() { "✅" } else { "⏳" };
        println!("   │   {} {}", mark, slot.member_address);
    }
    if let Some(hash) = &tx.tx_hash {
        println!("   ├─ Hash: {}", hash);
    }
    if let Some(reason) = &tx.failure {
        println!("   ├─ Failure: {}", reason);
    }
    println!("   └─ Expires: {}", tx.expires_at);
}

fn print_proposal(proposal: &Proposal) {
    let tally = proposal.tally();
    println!("🗳️  Proposal {}: {}", proposal.id, proposal.title);
    println!("   ├─ Action: {}", proposal.action.kind());
    println!("   ├─ Proposer: {}", proposal.proposer);
    println!("   ├─ Status: {:?}", proposal.status);
    println!(
        "   ├─ Votes: {} yes / {} no / {} abstain",
        tally.yes, tally.no, tally.abstain
    );
    println!("   └─ Expires: {}", proposal.expires_at);
}

/// Generate a member key
pub fn cmd_keygen(policy: &Policy) -> CliResult<()> {
    let key = KeyPair::generate();

    println!("🔑 New member key");
    println!("   📍 Address: {}", key.address(&policy.account_prefix)?);
    println!("   🔓 Public Key: {}", key.public_key_hex());
    println!("   🔒 Private Key: {}", key.private_key_hex());
    println!("\n   ⚠️  The private key is not stored. Keep it safe.");
    Ok(())
}

pub async fn cmd_account_create(state: &AppState, threshold: u32, members: &[String]) -> CliResult<()> {
    let members = members
        .iter()
        .map(|m| parse_member(m))
        .collect::<CliResult<Vec<_>>>()?;
    let account = state.service.accounts().create(threshold, members).await?;

    println!("✅ Account created!");
    print_account(&account);
    Ok(())
}

pub async fn cmd_account_list(state: &AppState) -> CliResult<()> {
    let accounts = state.service.accounts().list().await?;
    if accounts.is_empty() {
        println!("📭 No accounts found. Create one with: multisig account create");
        return Ok(());
    }

    println!("📋 Accounts:");
    for account in &accounts {
        println!("   {} {} ({})", account.id, account.address, account.description());
    }
    Ok(())
}

pub async fn cmd_account_show(state: &AppState, id: &str) -> CliResult<()> {
    let account = state.service.accounts().get(id).await?;
    print_account(&account);
    Ok(())
}

/// Create a transfer, or any payload read from a JSON file
pub async fn cmd_tx_create(
    state: &AppState,
    account_id: &str,
    to: Option<&str>,
    amount: Option<u128>,
    denom: Option<&str>,
    payload_file: Option<&Path>,
    memo: Option<String>,
) -> CliResult<()> {
    let payload = match (payload_file, to, amount) {
        (Some(path), _, _) => {
            let data = std::fs::read_to_string(path)?;
            serde_json::from_str::<TransactionPayload>(&data)?
        }
        (None, Some(to), Some(amount)) => {
            let denom = match denom {
                Some(d) => d.to_string(),
                None => state.service.policy().fee_denom.clone(),
            };
            TransactionPayload::Transfer {
                recipients: vec![Recipient {
                    address: to.to_string(),
                    amount: Coin::new(amount, &denom),
                }],
            }
        }
        _ => return Err("either --payload or both --to and --amount are required".into()),
    };

    let tx = state
        .service
        .transactions()
        .create(account_id, payload, memo)
        .await?;

    println!("📤 Transaction created!");
    print_transaction(&tx);
    let fee: Vec<String> = tx
        .fee
        .amount
        .iter()
        .map(|c| format!("{}{}", c.amount, c.denom))
        .collect();
    println!("   💸 Estimated fee: {} (gas {})", fee.join(","), tx.fee.gas);
    Ok(())
}

pub async fn cmd_tx_list(state: &AppState, account_id: Option<&str>) -> CliResult<()> {
    let txs = state.service.transactions().list(account_id).await?;
    if txs.is_empty() {
        println!("📭 No transactions");
        return Ok(());
    }

    println!("📋 Transactions:");
    for tx in &txs {
        println!(
            "   {} {:<16} {:?} {}/{}",
            tx.id,
            tx.payload.kind(),
            tx.status,
            tx.signed_count(),
            tx.signatures.len()
        );
    }
    Ok(())
}

pub async fn cmd_tx_show(state: &AppState, id: &str) -> CliResult<()> {
    let tx = state.service.transactions().get(id).await?;
    print_transaction(&tx);
    Ok(())
}

/// Sign with a private key given on the command line
pub async fn cmd_tx_sign(state: &AppState, id: &str, private_key: &str) -> CliResult<()> {
    let key = KeyPair::from_private_key_hex(private_key)?;
    let signer = KeySigner::new(key, &state.service.policy().account_prefix)?;
    let tx = state.service.transactions().sign(id, &signer).await?;

    println!("✍️  Signature recorded");
    print_transaction(&tx);
    Ok(())
}

pub async fn cmd_tx_broadcast(state: &AppState, id: &str) -> CliResult<()> {
    let tx = state.service.transactions().broadcast(id).await?;

    println!("🚀 Transaction broadcast!");
    print_transaction(&tx);
    Ok(())
}

pub async fn cmd_proposal_create(
    state: &AppState,
    account_id: &str,
    proposer: &str,
    title: &str,
    description: &str,
    action: ProposalAction,
) -> CliResult<()> {
    let proposal = state
        .service
        .proposals()
        .create(account_id, proposer, title, description, action)
        .await?;

    println!("✅ Proposal opened!");
    print_proposal(&proposal);
    Ok(())
}

pub async fn cmd_proposal_vote(state: &AppState, id: &str, voter: &str, choice: VoteChoice) -> CliResult<()> {
    let proposal = state.service.proposals().vote(id, voter, choice).await?;
    if proposal.status == ProposalStatus::Passed {
        println!("🎉 Proposal passed and can be executed");
    } else {
        println!("🗳️  Vote recorded");
    }
    print_proposal(&proposal);
    Ok(())
}

pub async fn cmd_proposal_execute(state: &AppState, id: &str) -> CliResult<()> {
    let proposal = state.service.proposals().execute(id).await?;
    println!("✅ Proposal executed");
    print_proposal(&proposal);

    let account = state.service.accounts().get(&proposal.account_id).await?;
    print_account(&account);
    Ok(())
}

pub async fn cmd_proposal_list(state: &AppState, account_id: Option<&str>) -> CliResult<()> {
    let proposals = state.service.proposals().list(account_id).await?;
    if proposals.is_empty() {
        println!("📭 No proposals");
        return Ok(());
    }

    println!("📋 Proposals:");
    for p in &proposals {
        println!(
            "   {} {:<18} {:?} {}",
            p.id,
            p.action.kind(),
            p.status,
            p.title
        );
    }
    Ok(())
}

pub async fn cmd_cleanup(state: &AppState) -> CliResult<()> {
    let report = state.service.cleanup().await?;
    println!("🧹 Cleanup complete");
    println!("   ├─ Expired transactions removed: {}", report.expired_transactions);
    println!("   └─ Proposals rejected: {}", report.rejected_proposals);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parse_member() {
        let m = parse_member("cosmos1abc:02ff").unwrap();
        assert_eq!(m.address, "cosmos1abc");
        assert_eq!(m.public_key, "02ff");
        assert!(m.display_name.is_none());

        let m = parse_member("cosmos1abc:02ff:Alice: treasurer").unwrap();
        assert_eq!(m.display_name.as_deref(), Some("Alice: treasurer"));

        assert!(parse_member("cosmos1abc").is_err());
        assert!(parse_member(":02ff").is_err());
    }

    #[test]
    fn test_parse_choice() {
        assert_eq!(parse_choice("YES").unwrap(), VoteChoice::Yes);
        assert_eq!(parse_choice("abstain").unwrap(), VoteChoice::Abstain);
        assert!(parse_choice("veto").is_err());
    }

    #[tokio::test]
    async fn test_commands_share_state_through_files() {
        let dir = tempdir().unwrap();
        let policy = Policy::default();
        let keys: Vec<KeyPair> = (0..2).map(|_| KeyPair::generate()).collect();
        let members: Vec<String> = keys
            .iter()
            .map(|k| format!("{}:{}", k.address("cosmos").unwrap(), k.public_key_hex()))
            .collect();

        let state = AppState::new(dir.path().to_path_buf(), policy.clone()).unwrap();
        cmd_account_create(&state, 2, &members).await.unwrap();
        let account = state.service.accounts().list().await.unwrap().remove(0);
        let to = KeyPair::generate().address("cosmos").unwrap();
        cmd_tx_create(&state, &account.id, Some(&to), Some(10), None, None, None)
            .await
            .unwrap();
        drop(state);

        let state = AppState::new(dir.path().to_path_buf(), policy).unwrap();
        let tx = state.service.transactions().list(None).await.unwrap().remove(0);
        for key in &keys {
            cmd_tx_sign(&state, &tx.id, &key.private_key_hex()).await.unwrap();
        }
        cmd_tx_broadcast(&state, &tx.id).await.unwrap();
        assert!(state
            .service
            .transactions()
            .get(&tx.id)
            .await
            .unwrap()
            .tx_hash
            .is_some());
    }
}
