use super::session::{Credentials, Tokens};
use crate::config::Config;
use crate::error::{AppError, Result};
use oauth2::{
    AuthUrl, AuthorizationCode, Client, ClientId, ClientSecret, CsrfToken, EndpointNotSet,
    EndpointSet, RedirectUrl, RefreshToken, StandardRevocableToken, TokenResponse, TokenUrl,
    basic::{
        BasicClient, BasicErrorResponse, BasicRevocationErrorResponse,
        BasicTokenIntrospectionResponse, BasicTokenResponse,
    },
};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, instrument};
use url::Url;

const TOKEN_CACHE_FILE: &str = "mondo_tokens.json";
const DEFAULT_EXPIRES_IN_SECS: i64 = 3600;

/// A pending authorization: the URL to present and the CSRF state it carries.
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    pub url: Url,
    state: CsrfToken,
}

impl AuthorizationRequest {
    pub fn state(&self) -> &str {
        self.state.secret()
    }
}

/// What the presenter captured from the redirect back to the client.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthorizationCallback {
    pub code: String,
    /// Absent when the user entered a bare code
    pub state: Option<String>,
}

impl AuthorizationCallback {
    pub fn from_redirect_url(url: &Url) -> Result<Self> {
        let param = |name: &str| {
            url.query_pairs()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.into_owned())
        };

        if let Some(error) = param("error") {
            let reason = param("error_description").unwrap_or(error);
            return Err(AppError::AuthorizationCancelled(reason));
        }

        let code =
            param("code").ok_or_else(|| AppError::Auth("No code in callback".to_string()))?;
        let state =
            param("state").ok_or_else(|| AppError::Auth("No state in callback".to_string()))?;

        Ok(Self {
            code,
            state: Some(state),
        })
    }
}

// Type alias for the client when Auth and Token URLs are set
type ConfiguredClient = Client<
    BasicErrorResponse,
    BasicTokenResponse,
    BasicTokenIntrospectionResponse,
    StandardRevocableToken,
    BasicRevocationErrorResponse,
    EndpointSet,    // HasAuthUrl
    EndpointNotSet, // HasDeviceAuthUrl
    EndpointNotSet, // HasIntrospectionUrl
    EndpointNotSet, // HasRevocationUrl
    EndpointSet,    // HasTokenUrl
>;

pub(super) struct MondoAuth {
    client: ConfiguredClient,
    http_client: reqwest::Client,
}

impl MondoAuth {
    pub(super) fn new(
        credentials: &Credentials,
        auth_url: &str,
        token_url: &str,
        redirect_url: &str,
        http_client: reqwest::Client,
    ) -> Result<Self> {
        let auth_url = AuthUrl::new(auth_url.to_string())
            .map_err(|e| AppError::Auth(format!("Invalid auth URL: {}", e)))?;
        let token_url = TokenUrl::new(token_url.to_string())
            .map_err(|e| AppError::Auth(format!("Invalid token URL: {}", e)))?;
        let redirect_url = RedirectUrl::new(redirect_url.to_string())
            .map_err(|e| AppError::Auth(format!("Invalid redirect URL: {}", e)))?;

        let client = BasicClient::new(ClientId::new(credentials.client_id.clone()))
            .set_client_secret(ClientSecret::new(credentials.client_secret.clone()))
            .set_auth_uri(auth_url)
            .set_token_uri(token_url)
            .set_redirect_uri(redirect_url);

        Ok(Self {
            client,
            http_client,
        })
    }

    pub(super) fn authorization_request(&self) -> AuthorizationRequest {
        let (url, state) = self.client.authorize_url(CsrfToken::new_random).url();
        AuthorizationRequest { url, state }
    }

    pub(super) async fn exchange_code(
        &self,
        request: &AuthorizationRequest,
        callback: AuthorizationCallback,
    ) -> Result<Tokens> {
        if callback
            .state
            .as_deref()
            .is_some_and(|state| state != request.state())
        {
            return Err(AppError::Auth("CSRF token mismatch".to_string()));
        }

        let token_result = self
            .client
            .exchange_code(AuthorizationCode::new(callback.code))
            .request_async(&self.http_client)
            .await
            .map_err(|e| AppError::Auth(format!("Failed to exchange code: {:?}", e)))?;

        Ok(Self::parse_tokens(token_result, None))
    }

    pub(super) async fn refresh(&self, refresh_token: &str) -> Result<Tokens> {
        let token_result = self
            .client
            .exchange_refresh_token(&RefreshToken::new(refresh_token.to_string()))
            .request_async(&self.http_client)
            .await
            .map_err(|e| AppError::Auth(format!("Failed to refresh token: {:?}", e)))?;

        Ok(Self::parse_tokens(token_result, Some(refresh_token)))
    }

    /// Refresh responses may omit the refresh token; keep the previous one then.
    fn parse_tokens(
        token_result: BasicTokenResponse,
        fallback_refresh_token: Option<&str>,
    ) -> Tokens {
        let refresh_token = token_result
            .refresh_token()
            .map(|token| token.secret().clone())
            .or_else(|| fallback_refresh_token.map(str::to_string));

        Tokens {
            access_token: token_result.access_token().secret().clone(),
            refresh_token,
            expires_at: expires_at(chrono::Utc::now().timestamp(), token_result.expires_in()),
        }
    }
}

/// Absolute expiry in epoch seconds, clamped rather than overflowing.
fn expires_at(now: i64, expires_in: Option<Duration>) -> i64 {
    let expires_in = match expires_in {
        Some(d) => i64::try_from(d.as_secs()).unwrap_or(i64::MAX),
        None => DEFAULT_EXPIRES_IN_SECS,
    };
    now.saturating_add(expires_in)
}

/// On-disk token store, readable only by the owning user.
#[derive(Debug, Clone)]
pub struct TokenCache {
    path: PathBuf,
}

impl TokenCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The cache file under the XDG cache directory
    pub fn default_location() -> Result<Self> {
        Ok(Self::new(Config::cache_file(TOKEN_CACHE_FILE)?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Option<Tokens>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&self.path)
            .map_err(|e| AppError::Auth(format!("Failed to read tokens file: {}", e)))?;

        let tokens: Tokens = serde_json::from_str(&contents)
            .map_err(|e| AppError::Auth(format!("Failed to parse tokens: {}", e)))?;

        Ok(Some(tokens))
    }

    pub fn save(&self, tokens: &Tokens) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                AppError::Auth(format!("Failed to create token cache directory: {}", e))
            })?;
        }

        let contents = serde_json::to_string_pretty(tokens)
            .map_err(|e| AppError::Auth(format!("Failed to serialize tokens: {}", e)))?;

        // Create file with owner-only permissions from the start to avoid race condition
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .mode(0o600)
            .open(&self.path)
            .map_err(|e| AppError::Auth(format!("Failed to create tokens file: {}", e)))?;

        file.write_all(contents.as_bytes())
            .map_err(|e| AppError::Auth(format!("Failed to write tokens file: {}", e)))?;

        debug!(path = ?self.path, "Saved Mondo tokens");
        Ok(())
    }

    #[instrument(name = "Clearing auth tokens for Mondo", skip_all)]
    pub fn clear(&self) -> Result<()> {
        if !self.path.exists() {
            debug!("No Mondo tokens to clear");
            return Ok(());
        }

        fs::remove_file(&self.path)
            .map_err(|e| AppError::Auth(format!("Failed to delete tokens file: {}", e)))?;
        info!("Cleared Mondo cached tokens");

        Ok(())
    }
}
