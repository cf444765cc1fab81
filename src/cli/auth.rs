use mondo_client::config::Config;
use mondo_client::error::{AppError, Result};
use mondo_client::mondo::{
    AuthorizationPresenter, ConsolePresenter, LocalCallbackPresenter, MondoClient, Session,
    TokenCache,
};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

pub(super) async fn execute(reset: bool, manual: bool) -> Result<()> {
    let cache = TokenCache::default_location()?;
    if reset {
        cache.clear()?;
    }

    let config = Config::load()?;
    let client = connect(&config, &cache, manual).await?;
    let whoami = client.whoami().await?;

    if !whoami.authenticated {
        return Err(AppError::NotAuthenticated);
    }
    info!(user_id = ?whoami.user_id, "Mondo authentication verified");

    Ok(())
}

/// Build a client holding valid tokens, refreshing or re-authorizing as needed.
#[instrument(name = "Authenticating to Mondo", skip_all)]
pub(super) async fn connect(
    config: &Config,
    cache: &TokenCache,
    manual: bool,
) -> Result<MondoClient> {
    let session = Session::with_credentials(&config.mondo.client_id, &config.mondo.client_secret)?;
    let client = MondoClient::new(&config.mondo, Arc::new(session))?;

    let Some(tokens) = cache.load()? else {
        debug!("No cached tokens found, authorizing with Mondo...");
        return authorize(client, cache, config, manual).await;
    };

    let expired = tokens.is_expired();
    client.session().set_tokens(tokens).await;

    if !expired {
        debug!("Using cached Mondo tokens");
        return Ok(client);
    }

    debug!("Access token expired, refreshing...");
    match client.refresh().await {
        Ok(refreshed) => {
            debug!("Token refresh successful");
            cache.save(&refreshed)?;
            Ok(client)
        }
        Err(e) => {
            warn!("Token refresh failed ({}), re-authorizing...", e);
            client.session().clear_tokens().await;
            authorize(client, cache, config, manual).await
        }
    }
}

async fn authorize(
    client: MondoClient,
    cache: &TokenCache,
    config: &Config,
    manual: bool,
) -> Result<MondoClient> {
    let presenter: Box<dyn AuthorizationPresenter> = match manual {
        true => Box::new(ConsolePresenter),
        false => Box::new(LocalCallbackPresenter::new(config.mondo.redirect_port())),
    };

    let tokens = client.authorize(presenter.as_ref()).await?;
    cache.save(&tokens)?;

    Ok(client)
}
