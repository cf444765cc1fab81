use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use tokio::sync::RwLock;

/// Seconds before expiry at which a token is treated as expired.
const EXPIRY_MARGIN_SECS: i64 = 300;

#[derive(Debug, Clone)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Tokens {
    pub access_token: String,
    /// Only issued to confidential clients
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Expiry time as seconds since Unix epoch
    pub expires_at: i64,
}

impl Tokens {
    /// Check if the access token is expired or about to expire (within 5 minutes)
    pub fn is_expired(&self) -> bool {
        let now = chrono::Utc::now().timestamp();
        self.expires_at < (now + EXPIRY_MARGIN_SECS)
    }
}

/// Client identity plus the current token set.
///
/// Credentials are set once. Tokens are replaced on authorization or refresh
/// and only read by API calls.
#[derive(Debug, Default)]
pub struct Session {
    credentials: OnceLock<Credentials>,
    tokens: RwLock<Option<Tokens>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credentials(client_id: &str, client_secret: &str) -> Result<Self> {
        let session = Self::new();
        session.initialize(client_id, client_secret)?;
        Ok(session)
    }

    pub fn initialize(&self, client_id: &str, client_secret: &str) -> Result<()> {
        if client_id.is_empty() || client_secret.is_empty() {
            return Err(AppError::Config(
                "client_id and client_secret must not be empty".to_string(),
            ));
        }

        self.credentials
            .set(Credentials {
                client_id: client_id.to_string(),
                client_secret: client_secret.to_string(),
            })
            .map_err(|_| AppError::AlreadyInitialized)
    }

    pub fn credentials(&self) -> Result<&Credentials> {
        self.credentials.get().ok_or(AppError::NotInitialized)
    }

    pub async fn tokens(&self) -> Option<Tokens> {
        self.tokens.read().await.clone()
    }

    pub async fn set_tokens(&self, tokens: Tokens) {
        *self.tokens.write().await = Some(tokens);
    }

    pub async fn clear_tokens(&self) {
        *self.tokens.write().await = None;
    }

    /// The current access token, or `NotAuthenticated` when none is held.
    pub async fn access_token(&self) -> Result<String> {
        match self.tokens.read().await.as_ref() {
            Some(tokens) if !tokens.access_token.is_empty() => Ok(tokens.access_token.clone()),
            _ => Err(AppError::NotAuthenticated),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_helpers {
    use super::*;

    pub(crate) fn mock_tokens() -> Tokens {
        Tokens {
            access_token: "test-token".to_string(),
            refresh_token: Some("test-refresh".to_string()),
            expires_at: chrono::Utc::now().timestamp() + 3600,
        }
    }

    pub(crate) async fn authenticated_session() -> Session {
        let session = Session::with_credentials("oauthclient_1", "secret").unwrap();
        session.set_tokens(mock_tokens()).await;
        session
    }
}
