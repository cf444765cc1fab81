use clap::Subcommand;
use mondo_client::Result;
use mondo_client::config::Config;
use mondo_client::mondo::TokenCache;
use tracing::info;

#[derive(Subcommand, Debug)]
pub enum ShowResource {
    /// Show configuration and cache paths
    Paths,
}

impl ShowResource {
    pub async fn execute(&self) -> Result<()> {
        match self {
            ShowResource::Paths => show_paths(),
        }
    }
}

fn show_paths() -> Result<()> {
    let config_path = Config::config_file()?;
    let cache_dir = Config::cache_dir()?;
    let token_cache = TokenCache::default_location()?;

    info!(path = ?config_path, "Config path");
    info!(path = ?cache_dir, "Cache path");
    info!(path = ?token_cache.path(), "Token cache");

    Ok(())
}
