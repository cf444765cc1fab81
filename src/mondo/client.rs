use super::MondoOperations;
use super::auth::{AuthorizationCallback, AuthorizationRequest, MondoAuth};
use super::decode::{decode_list, decode_object};
use super::presenter::AuthorizationPresenter;
use super::request::{self, Endpoint};
use super::session::{Session, Tokens};
use super::types::{MondoAccount, MondoBalance, MondoTransaction, MondoWhoAmI};
use crate::config::MondoConfig;
use crate::error::{AppError, Result};
use crate::models::{Account, AccountBalance, Pagination, Transaction, WhoAmI};
use async_trait::async_trait;
use reqwest::Client;
use reqwest::redirect::Policy;
use std::sync::Arc;
use tracing::{debug, instrument};

pub struct MondoClient {
    client: Client,
    api_base_url: String,
    auth_url: String,
    token_url: String,
    redirect_url: String,
    session: Arc<Session>,
}

impl MondoClient {
    pub fn new(config: &MondoConfig, session: Arc<Session>) -> Result<Self> {
        // The token endpoint must not be followed through redirects
        let client = reqwest::ClientBuilder::new()
            .redirect(Policy::none())
            .build()
            .map_err(|e| AppError::Auth(format!("Failed to build reqwest client: {}", e)))?;

        Ok(Self {
            client,
            api_base_url: config.api_base_url(),
            auth_url: config.auth_url(),
            token_url: config.token_url(),
            redirect_url: config.redirect_url(),
            session,
        })
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    fn auth(&self) -> Result<MondoAuth> {
        let credentials = self.session.credentials()?;
        MondoAuth::new(
            credentials,
            &self.auth_url,
            &self.token_url,
            &self.redirect_url,
            self.client.clone(),
        )
    }

    /// Start the authorization-code flow. Requires an initialized session.
    pub fn begin_authorization(&self) -> Result<AuthorizationRequest> {
        Ok(self.auth()?.authorization_request())
    }

    /// Exchange the captured code for tokens and store them in the session.
    #[instrument(name = "Completing Mondo authorization", skip_all)]
    pub async fn complete_authorization(
        &self,
        request: &AuthorizationRequest,
        callback: AuthorizationCallback,
    ) -> Result<Tokens> {
        let tokens = self.auth()?.exchange_code(request, callback).await?;
        self.session.set_tokens(tokens.clone()).await;
        debug!("Authorization complete");
        Ok(tokens)
    }

    /// Run the whole flow through `presenter`.
    pub async fn authorize(&self, presenter: &dyn AuthorizationPresenter) -> Result<Tokens> {
        let request = self.begin_authorization()?;
        let callback = presenter.present(&request).await?;
        self.complete_authorization(&request, callback).await
    }

    #[instrument(name = "Refreshing Mondo access token", skip_all)]
    pub async fn refresh(&self) -> Result<Tokens> {
        let refresh_token = self
            .session
            .tokens()
            .await
            .and_then(|tokens| tokens.refresh_token)
            .ok_or_else(|| AppError::Auth("No refresh token available".to_string()))?;

        let tokens = self.auth()?.refresh(&refresh_token).await?;
        self.session.set_tokens(tokens.clone()).await;
        Ok(tokens)
    }

    #[instrument(name = "Checking Mondo identity", skip_all)]
    pub async fn whoami(&self) -> Result<WhoAmI> {
        let (status, body) = self.send(Endpoint::WhoAmI, None).await?;
        decode_object::<MondoWhoAmI, WhoAmI>(status, &body)
    }

    /// One round trip. Fails with `NotAuthenticated` before touching the network.
    async fn send(
        &self,
        endpoint: Endpoint<'_>,
        pagination: Option<&Pagination>,
    ) -> Result<(u16, String)> {
        let access_token = self.session.access_token().await?;
        let request = request::build(endpoint, Some(&access_token), &[], pagination)?;
        debug!(method = %request.method, path = %request.path, "Sending request");

        let response = request
            .into_request(&self.client, &self.api_base_url)
            .send()
            .await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        Ok((status, body))
    }
}

#[async_trait]
impl MondoOperations for MondoClient {
    #[instrument(name = "Fetching accounts", skip_all)]
    async fn list_accounts(&self) -> Result<Vec<Account>> {
        let (status, body) = self.send(Endpoint::Accounts, None).await?;
        decode_list::<MondoAccount, Account>(status, &body, "accounts")
    }

    #[instrument(name = "Fetching balance", skip_all, fields(account = %account.id))]
    async fn get_balance(&self, account: &Account) -> Result<AccountBalance> {
        let endpoint = Endpoint::Balance {
            account_id: &account.id,
        };
        let (status, body) = self.send(endpoint, None).await?;
        decode_object::<MondoBalance, AccountBalance>(status, &body)
    }

    #[instrument(name = "Fetching transactions", skip_all, fields(account = %account.id))]
    async fn list_transactions(
        &self,
        account: &Account,
        expand_merchant: bool,
        pagination: Option<&Pagination>,
    ) -> Result<Vec<Transaction>> {
        let endpoint = Endpoint::Transactions {
            account_id: &account.id,
            expand_merchant,
        };
        let (status, body) = self.send(endpoint, pagination).await?;
        decode_list::<MondoTransaction, Transaction>(status, &body, "transactions")
    }
}

#[cfg(test)]
pub(crate) mod test_helpers {
    use super::*;

    pub(crate) fn mock_config(base_url: &str) -> MondoConfig {
        MondoConfig {
            client_id: "oauthclient_1".to_string(),
            client_secret: "secret".to_string(),
            api_base_url: Some(base_url.to_string()),
            auth_url: Some(format!("{}/auth", base_url)),
            redirect_port: None,
        }
    }

    pub(crate) async fn authenticated_client(base_url: &str) -> MondoClient {
        let session = crate::mondo::session::test_helpers::authenticated_session().await;
        MondoClient::new(&mock_config(base_url), Arc::new(session)).unwrap()
    }
}
