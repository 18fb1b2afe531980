//! Multisig coordinator CLI application
//!
//! Command-line access to threshold accounts, their transactions and their
//! governance proposals, plus the REST API server.

use clap::{ArgGroup, Args, Parser, Subcommand};
use multisig_coordinator::api::{create_router, ApiState};
use multisig_coordinator::cli::{self, AppState};
use multisig_coordinator::config::Policy;
use multisig_coordinator::proposal::ProposalAction;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "multisig")]
#[command(author = "Darshan")]
#[command(version = "0.1.0")]
#[command(about = "Multi-signature transaction and proposal coordinator", long_about = None)]
struct Cli {
    /// Data directory for account, transaction and proposal storage
    #[arg(short, long, default_value = ".multisig_data")]
    data_dir: PathBuf,

    /// Policy file (JSON); missing fields use the defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a member key pair
    Keygen,

    /// Account operations
    Account {
        #[command(subcommand)]
        action: AccountCommands,
    },

    /// Transaction operations
    Tx {
        #[command(subcommand)]
        action: TxCommands,
    },

    /// Proposal operations
    Proposal {
        #[command(subcommand)]
        action: ProposalCommands,
    },

    /// Remove expired transactions and reject expired proposals
    Cleanup,

    /// Start the REST API server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },
}

#[derive(Subcommand)]
enum AccountCommands {
    /// Create a threshold account
    Create {
        /// Signatures required
        #[arg(short, long)]
        threshold: u32,

        /// Member as address:public_key[:name] (repeat for each member)
        #[arg(short, long = "member", required = true)]
        members: Vec<String>,
    },

    /// List accounts
    List,

    /// Show one account
    Show {
        #[arg(short, long)]
        id: String,
    },
}

#[derive(Subcommand)]
enum TxCommands {
    /// Create a pending transaction
    Create {
        /// Account id
        #[arg(short, long)]
        account: String,

        /// Transfer recipient
        #[arg(long)]
        to: Option<String>,

        /// Transfer amount in base units
        #[arg(long)]
        amount: Option<u128>,

        /// Transfer denomination (defaults to the fee denomination)
        #[arg(long)]
        denom: Option<String>,

        /// JSON file holding any payload (transfer, delegate, governance_vote, custom)
        #[arg(long, conflicts_with_all = ["to", "amount", "denom"])]
        payload: Option<PathBuf>,

        #[arg(long)]
        memo: Option<String>,
    },

    /// List transactions
    List {
        /// Only transactions of this account
        #[arg(short, long)]
        account: Option<String>,
    },

    /// Show one transaction
    Show {
        #[arg(short, long)]
        id: String,
    },

    /// Sign as a member
    Sign {
        #[arg(short, long)]
        id: String,

        /// Member private key (hex)
        #[arg(short, long)]
        key: String,
    },

    /// Broadcast a ready transaction
    Broadcast {
        #[arg(short, long)]
        id: String,
    },
}

#[derive(Args)]
#[command(group(ArgGroup::new("change").required(true).args(["add_member", "remove_member", "threshold", "transfer_to"])))]
struct ProposalChange {
    /// Add a member (address:public_key[:name])
    #[arg(long)]
    add_member: Option<String>,

    /// Remove the member with this address
    #[arg(long)]
    remove_member: Option<String>,

    /// Change the threshold
    #[arg(long)]
    threshold: Option<u32>,

    /// Transfer ownership (accepted for voting, not executable)
    #[arg(long)]
    transfer_to: Option<String>,
}

impl ProposalChange {
    fn into_action(self) -> Result<ProposalAction, Box<dyn std::error::Error>> {
        if let Some(spec) = self.add_member {
            return Ok(ProposalAction::AddMember {
                member: cli::parse_member(&spec)?,
            });
        }
        if let Some(address) = self.remove_member {
            return Ok(ProposalAction::RemoveMember { address });
        }
        if let Some(threshold) = self.threshold {
            return Ok(ProposalAction::ChangeThreshold { threshold });
        }
        match self.transfer_to {
            Some(new_owner) => Ok(ProposalAction::TransferOwnership { new_owner }),
            None => Err("no change given".into()),
        }
    }
}

#[derive(Subcommand)]
enum ProposalCommands {
    /// Open a proposal
    Create {
        #[arg(short, long)]
        account: String,

        /// Proposing member address
        #[arg(short, long)]
        proposer: String,

        #[arg(short, long)]
        title: String,

        #[arg(short, long)]
        description: String,

        #[command(flatten)]
        change: ProposalChange,
    },

    /// Vote on a proposal
    Vote {
        #[arg(short, long)]
        id: String,

        /// Voting member address
        #[arg(short, long)]
        voter: String,

        /// yes, no or abstain
        #[arg(short, long)]
        choice: String,
    },

    /// Execute a passed proposal
    Execute {
        #[arg(short, long)]
        id: String,
    },

    /// List proposals
    List {
        /// Only proposals of this account
        #[arg(short, long)]
        account: Option<String>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let policy = match &cli.config {
        Some(path) => Policy::from_file(path)?,
        None => Policy::default(),
    };
    policy.check()?;

    // Keygen needs no state
    if let Commands::Keygen = cli.command {
        return cli::cmd_keygen(&policy);
    }

    let state = AppState::new(cli.data_dir.clone(), policy)?;
    let rt = tokio::runtime::Runtime::new()?;

    rt.block_on(async {
        match cli.command {
            Commands::Keygen => unreachable!(),

            Commands::Account { action } => match action {
                AccountCommands::Create { threshold, members } => {
                    cli::cmd_account_create(&state, threshold, &members).await
                }
                AccountCommands::List => cli::cmd_account_list(&state).await,
                AccountCommands::Show { id } => cli::cmd_account_show(&state, &id).await,
            },

            Commands::Tx { action } => match action {
                TxCommands::Create {
                    account,
                    to,
                    amount,
                    denom,
                    payload,
                    memo,
                } => {
                    cli::cmd_tx_create(
                        &state,
                        &account,
                        to.as_deref(),
                        amount,
                        denom.as_deref(),
                        payload.as_deref(),
                        memo,
                    )
                    .await
                }
                TxCommands::List { account } => cli::cmd_tx_list(&state, account.as_deref()).await,
                TxCommands::Show { id } => cli::cmd_tx_show(&state, &id).await,
                TxCommands::Sign { id, key } => cli::cmd_tx_sign(&state, &id, &key).await,
                TxCommands::Broadcast { id } => cli::cmd_tx_broadcast(&state, &id).await,
            },

            Commands::Proposal { action } => match action {
                ProposalCommands::Create {
                    account,
                    proposer,
                    title,
                    description,
                    change,
                } => {
                    let action = change.into_action()?;
                    cli::cmd_proposal_create(&state, &account, &proposer, &title, &description, action)
                        .await
                }
                ProposalCommands::Vote { id, voter, choice } => {
                    let choice = cli::parse_choice(&choice)?;
                    cli::cmd_proposal_vote(&state, &id, &voter, choice).await
                }
                ProposalCommands::Execute { id } => cli::cmd_proposal_execute(&state, &id).await,
                ProposalCommands::List { account } => {
                    cli::cmd_proposal_list(&state, account.as_deref()).await
                }
            },

            Commands::Cleanup => cli::cmd_cleanup(&state).await,

            Commands::Serve { port } => serve(&state, port).await,
        }
    })
}

async fn serve(state: &AppState, port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let service = state.service.clone();
    let sweeper = service.spawn_cleanup(service.policy().cleanup_interval());
    let app = create_router(ApiState { service });

    let addr = format!("0.0.0.0:{}", port);
    println!("🚀 REST API server starting on http://localhost:{}", port);
    println!("   📁 Data directory: {:?}", state.data_dir);
    println!();
    println!("📖 Available endpoints:");
    println!("   GET  /health                              - Health check");
    println!("   POST /api/accounts                        - Create account");
    println!("   GET  /api/accounts                        - List accounts");
    println!("   GET  /api/accounts/{{id}}                   - Get account");
    println!("   POST /api/transactions                    - Create transaction");
    println!("   GET  /api/transactions/{{id}}/sign-doc      - Sign document");
    println!("   POST /api/transactions/{{id}}/signatures    - Submit signature");
    println!("   POST /api/transactions/{{id}}/broadcast     - Broadcast");
    println!("   POST /api/proposals                       - Open proposal");
    println!("   POST /api/proposals/{{id}}/votes            - Vote");
    println!("   POST /api/proposals/{{id}}/execute          - Execute");
    println!("   POST /api/maintenance/cleanup             - Sweep expired entities");
    println!();

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let result = axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            println!("\n📴 Shutting down...");
        })
        .await;
    sweeper.abort();
    result?;
    Ok(())
}
