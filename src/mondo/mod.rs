mod auth;
mod client;
pub mod decode;
mod presenter;
pub mod request;
mod session;
pub mod types;

pub use auth::{AuthorizationCallback, AuthorizationRequest, TokenCache};
pub use client::MondoClient;
pub use presenter::{AuthorizationPresenter, ConsolePresenter, LocalCallbackPresenter};
pub use session::{Credentials, Session, Tokens};

use crate::error::Result;
use crate::models::{Account, AccountBalance, Pagination, Transaction};

use async_trait::async_trait;

#[async_trait]
pub trait MondoOperations {
    async fn list_accounts(&self) -> Result<Vec<Account>>;

    async fn get_balance(&self, account: &Account) -> Result<AccountBalance>;

    async fn list_transactions(
        &self,
        account: &Account,
        expand_merchant: bool,
        pagination: Option<&Pagination>,
    ) -> Result<Vec<Transaction>>;
}
