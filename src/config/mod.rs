mod file_config;

pub use file_config::{
    CatalogFileConfig, EnrichmentFileConfig, FileConfig, RateLimitFileConfig, RetryFileConfig,
};

use crate::catalog::{
    Credentials, RateLimitConfig, RetryPolicy, SpotifyClientConfig, AUDIO_FEATURES_BATCH_LIMIT,
    PLAYLIST_PAGE_LIMIT, SPOTIFY_API_BASE, SPOTIFY_AUTH_URL,
};
use crate::enrichment::MergeOptions;
use anyhow::{bail, Result};
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

/// Directory name used by the streaming history export archive.
pub const DEFAULT_HISTORY_DIR: &str = "MyData";
pub const DEFAULT_DB_PATH: &str = "harmonic_history.db";

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub history_dir: Option<PathBuf>,
    pub db_path: Option<PathBuf>,
    pub playlists: Vec<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub access_token: Option<String>,
    pub max_items: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    // Core settings
    pub history_dir: PathBuf,
    pub db_path: PathBuf,
    pub playlists: Vec<String>,

    // Feature configs (with defaults)
    pub catalog: CatalogSettings,
    pub rate_limit: RateLimitConfig,
    pub retry: RetryPolicy,
    pub enrichment: MergeOptions,
}

#[derive(Debug, Clone)]
pub struct CatalogSettings {
    pub api_base_url: String,
    pub auth_url: String,
    /// `None` when no credentials were configured.
    pub credentials: Option<Credentials>,
    pub timeout_sec: u64,
    pub page_size: usize,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            api_base_url: SPOTIFY_API_BASE.to_string(),
            auth_url: SPOTIFY_AUTH_URL.to_string(),
            credentials: None,
            timeout_sec: 30,
            page_size: PLAYLIST_PAGE_LIMIT,
        }
    }
}

impl CatalogSettings {
    /// Client configuration, if credentials are available.
    pub fn client_config(&self) -> Option<SpotifyClientConfig> {
        let credentials = self.credentials.clone()?;
        Some(SpotifyClientConfig {
            api_base_url: self.api_base_url.clone(),
            auth_url: self.auth_url.clone(),
            credentials,
            timeout: Duration::from_secs(self.timeout_sec),
        })
    }
}

fn resolve_credentials(
    cli: &CliConfig,
    file: &CatalogFileConfig,
) -> Result<Option<Credentials>> {
    let access_token = file
        .access_token
        .clone()
        .or_else(|| cli.access_token.clone());
    let client_id = file.client_id.clone().or_else(|| cli.client_id.clone());
    let client_secret = file
        .client_secret
        .clone()
        .or_else(|| cli.client_secret.clone());

    match (access_token, client_id, client_secret) {
        (Some(token), _, _) => Ok(Some(Credentials::Token(token))),
        (None, Some(client_id), Some(client_secret)) => Ok(Some(Credentials::ClientCredentials {
            client_id,
            client_secret,
        })),
        (None, Some(_), None) | (None, None, Some(_)) => {
            bail!("client_id and client_secret must be provided together")
        }
        (None, None, None) => Ok(None),
    }
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let history_dir = file
            .history_dir
            .map(PathBuf::from)
            .or_else(|| cli.history_dir.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_HISTORY_DIR));

        let db_path = file
            .db_path
            .map(PathBuf::from)
            .or_else(|| cli.db_path.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH));
        if db_path.is_dir() {
            bail!("db_path is a directory: {:?}", db_path);
        }

        let playlists = file.playlists.unwrap_or_else(|| cli.playlists.clone());

        // Catalog settings
        let catalog_file = file.catalog.unwrap_or_default();
        let credentials = resolve_credentials(cli, &catalog_file)?;
        let defaults = CatalogSettings::default();
        let page_size = catalog_file.page_size.unwrap_or(defaults.page_size);
        if page_size == 0 || page_size > PLAYLIST_PAGE_LIMIT {
            bail!(
                "catalog.page_size must be between 1 and {}, got {}",
                PLAYLIST_PAGE_LIMIT,
                page_size
            );
        }
        let timeout_sec = catalog_file.timeout_sec.unwrap_or(defaults.timeout_sec);
        if timeout_sec == 0 {
            bail!("catalog.timeout_sec must be greater than zero");
        }
        let catalog = CatalogSettings {
            api_base_url: catalog_file.api_base_url.unwrap_or(defaults.api_base_url),
            auth_url: catalog_file.auth_url.unwrap_or(defaults.auth_url),
            credentials,
            timeout_sec,
            page_size,
        };

        // Rate limit settings
        let rl_file = file.rate_limit.unwrap_or_default();
        let rl_defaults = RateLimitConfig::default();
        let rate_limit = RateLimitConfig {
            max_calls: rl_file.max_calls.unwrap_or(rl_defaults.max_calls),
            window: rl_file
                .window_secs
                .map(Duration::from_secs)
                .unwrap_or(rl_defaults.window),
        };
        if rate_limit.max_calls == 0 {
            bail!("rate_limit.max_calls must be greater than zero");
        }
        if rate_limit.window.is_zero() {
            bail!("rate_limit.window_secs must be greater than zero");
        }

        // Retry settings
        let retry_file = file.retry.unwrap_or_default();
        let retry_defaults = RetryPolicy::default();
        let retry = RetryPolicy {
            max_retries: retry_file.max_retries.unwrap_or(retry_defaults.max_retries),
            initial_backoff: retry_file
                .initial_backoff_ms
                .map(Duration::from_millis)
                .unwrap_or(retry_defaults.initial_backoff),
            max_backoff: retry_file
                .max_backoff_ms
                .map(Duration::from_millis)
                .unwrap_or(retry_defaults.max_backoff),
            backoff_multiplier: retry_file
                .backoff_multiplier
                .unwrap_or(retry_defaults.backoff_multiplier),
        };
        if retry.backoff_multiplier < 1.0 {
            bail!(
                "retry.backoff_multiplier must be at least 1.0, got {}",
                retry.backoff_multiplier
            );
        }

        // Enrichment settings
        let enrichment_file = file.enrichment.unwrap_or_default();
        let requested_window = enrichment_file
            .batch_window
            .unwrap_or(AUDIO_FEATURES_BATCH_LIMIT);
        let batch_window = requested_window.clamp(1, AUDIO_FEATURES_BATCH_LIMIT);
        if batch_window != requested_window {
            warn!(
                "enrichment.batch_window {} clamped to {}",
                requested_window, batch_window
            );
        }
        let enrichment = MergeOptions {
            batch_window,
            max_items: enrichment_file.max_items.or(cli.max_items),
        };

        Ok(Self {
            history_dir,
            db_path,
            playlists,
            catalog,
            rate_limit,
            retry,
            enrichment,
        })
    }
}
