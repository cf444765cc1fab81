mod accounts;
mod auth;
mod show;

use clap::{Parser, Subcommand};
use mondo_client::Result;

pub use accounts::TransactionArgs;
pub use show::ShowResource;

#[derive(Parser, Debug)]
#[command(name = "mondo-client")]
#[command(about = "Read accounts, balances and transactions from the Mondo API", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub async fn run(&self) -> Result<()> {
        match &self.command {
            Commands::Auth { reset, manual } => auth::execute(*reset, *manual).await,
            Commands::Accounts => accounts::list_accounts().await,
            Commands::Balance { account_id } => accounts::show_balance(account_id).await,
            Commands::Transactions(args) => accounts::list_transactions(args).await,
            Commands::Show { resource } => resource.execute().await,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Authorize with Mondo and cache the tokens
    Auth {
        /// Discard cached tokens first
        #[arg(long)]
        reset: bool,
        /// Paste the redirect URL instead of running a local callback listener
        #[arg(long)]
        manual: bool,
    },
    /// List accounts
    Accounts,
    /// Show the balance of an account
    Balance { account_id: String },
    /// List transactions for an account
    Transactions(TransactionArgs),
    Show {
        #[command(subcommand)]
        resource: ShowResource,
    },
}
