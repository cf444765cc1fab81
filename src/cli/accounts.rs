use super::auth::connect;
use chrono::{DateTime, Utc};
use clap::Args;
use mondo_client::config::Config;
use mondo_client::dispatch::{self, Dispatcher};
use mondo_client::error::{AppError, Result};
use mondo_client::models::{Account, Pagination, Since, ToCsv};
use mondo_client::mondo::{MondoClient, MondoOperations, TokenCache};
use std::io::Write;
use std::sync::Arc;
use tracing::info;

#[derive(Args, Debug)]
pub struct TransactionArgs {
    pub account_id: String,
    /// Include full merchant details
    #[arg(long)]
    pub expand_merchant: bool,
    #[arg(long)]
    pub limit: Option<u32>,
    /// RFC 3339 timestamp or transaction id
    #[arg(long)]
    pub since: Option<String>,
    /// RFC 3339 timestamp
    #[arg(long)]
    pub before: Option<DateTime<Utc>>,
    /// Write CSV to stdout
    #[arg(long)]
    pub csv: bool,
}

impl TransactionArgs {
    fn pagination(&self) -> Option<Pagination> {
        let pagination = Pagination {
            limit: self.limit,
            since: self.since.as_deref().map(Since::parse),
            before: self.before,
        };
        (pagination != Pagination::default()).then_some(pagination)
    }
}

async fn client() -> Result<MondoClient> {
    let config = Config::load()?;
    let cache = TokenCache::default_location()?;
    connect(&config, &cache, false).await
}

async fn find_account(client: &MondoClient, account_id: &str) -> Result<Account> {
    client
        .list_accounts()
        .await?
        .into_iter()
        .find(|a| a.id == account_id)
        .ok_or_else(|| AppError::Other(anyhow::anyhow!("No account with id {}", account_id)))
}

pub(super) async fn list_accounts() -> Result<()> {
    let dispatcher = Dispatcher::new(Arc::new(client().await?));

    let (sink, mut results) = dispatch::channel();
    dispatcher.list_accounts(sink);

    let accounts = results
        .recv()
        .await
        .ok_or_else(|| AppError::Other(anyhow::anyhow!("Account listing was not delivered")))??;

    if accounts.is_empty() {
        info!("No accounts found");
    }
    for account in &accounts {
        info!(
            id = %account.id,
            created = %account.created,
            "{}",
            account.description
        );
    }

    Ok(())
}

pub(super) async fn show_balance(account_id: &str) -> Result<()> {
    let client = client().await?;
    let account = find_account(&client, account_id).await?;
    let balance = client.get_balance(&account).await?;

    info!(
        account = %account.id,
        balance = %balance.balance_major(),
        spend_today = %balance.spend_today_major(),
        currency = %balance.currency,
        "Balance"
    );

    Ok(())
}

pub(super) async fn list_transactions(args: &TransactionArgs) -> Result<()> {
    let client = client().await?;
    let account = find_account(&client, &args.account_id).await?;
    let pagination = args.pagination();

    let transactions = client
        .list_transactions(&account, args.expand_merchant, pagination.as_ref())
        .await?;

    if args.csv {
        let csv = transactions.to_csv()?;
        std::io::stdout().write_all(csv.as_bytes())?;
        return Ok(());
    }

    for t in &transactions {
        info!(
            id = %t.id,
            created = %t.created,
            amount = %t.amount_major(),
            currency = %t.currency,
            merchant = t.merchant_name().unwrap_or(""),
            "{}",
            t.description
        );
    }
    info!(count = transactions.len(), "Transactions listed");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> TransactionArgs {
        TransactionArgs {
            account_id: "acc_1".to_string(),
            expand_merchant: false,
            limit: None,
            since: None,
            before: None,
            csv: false,
        }
    }

    #[test]
    fn test_no_pagination_flags() {
        assert_eq!(args().pagination(), None);
    }

    #[test]
    fn test_pagination_flags() {
        let args = TransactionArgs {
            limit: Some(10),
            since: Some("tx_1".to_string()),
            ..args()
        };
        assert_eq!(
            args.pagination(),
            Some(
                Pagination::default()
                    .limit(10)
                    .since(Since::TransactionId("tx_1".to_string()))
            )
        );
    }
}
