//! Configuration management for the release radar.
//!
//! Configuration is read from environment variables, optionally populated from
//! a `.env` file in the local data directory, and turned into one explicit
//! [`Config`] value at startup. That value is shared by reference (behind an
//! `Arc`) with every component; nothing reads the environment afterwards.
//!
//! The configuration system follows a hierarchical approach:
//! 1. Environment variables (highest priority)
//! 2. `.env` file in the local data directory
//! 3. Application defaults (where applicable)

use std::{
    collections::{BTreeMap, HashSet},
    env,
    path::PathBuf,
    str::FromStr,
    time::Duration,
};

use crate::{error::ConfigError, types::ExtendedCategory, warning};

pub const DEFAULT_API_URL: &str = "https://api.spotify.com/v1";
pub const DEFAULT_AUTH_URL: &str = "https://accounts.spotify.com/authorize";
pub const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
pub const DEFAULT_SERVER_ADDRESS: &str = "127.0.0.1:8888";
pub const DEFAULT_SCOPE: &str = "user-follow-read user-read-currently-playing playlist-read-private playlist-modify-private playlist-modify-public";

/// Loads environment variables from a `.env` file in the local data directory.
///
/// Creates the necessary directory structure if it doesn't exist and loads
/// environment variables from `sporlradar/.env` below the platform-specific
/// local data directory:
/// - Linux: `~/.local/share/sporlradar/.env`
/// - macOS: `~/Library/Application Support/sporlradar/.env`
/// - Windows: `%LOCALAPPDATA%/sporlradar/.env`
///
/// A missing `.env` file is not an error; the process environment alone is
/// then used.
///
/// # Errors
///
/// Returns an error if the parent directory cannot be created or if an
/// existing `.env` file cannot be parsed.
pub async fn load_env() -> Result<(), String> {
    let mut path = default_data_dir();
    path.push(".env");
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent)
            .await
            .map_err(|e| e.to_string())?;
    }

    if !path.is_file() {
        warning!("No .env file found at {}, using process environment.", path.display());
        return Ok(());
    }

    dotenv::from_path(&path).map_err(|e| e.to_string())
}

/// Default root for every persisted file of the service.
pub fn default_data_dir() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("sporlradar");
    path
}

/// Credentials and endpoints for the Spotify Web API.
#[derive(Debug, Clone)]
pub struct SpotifyConfig {
    pub api_url: String,
    pub auth_url: String,
    pub token_url: String,
    pub client_id: String,
    pub redirect_uri: String,
    pub scope: String,
}

/// Optional forwarding of written releases to an external HTTP sink.
#[derive(Debug, Clone)]
pub struct ForwardConfig {
    pub url: String,
    /// Artist ids a release must credit to be forwarded; empty forwards all.
    pub artists: HashSet<String>,
    /// Categories to forward; empty forwards all.
    pub categories: HashSet<ExtendedCategory>,
}

/// Complete runtime configuration, constructed once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub spotify: SpotifyConfig,
    pub server_addr: String,
    pub data_dir: PathBuf,
    /// Market used for album listings and re-release completeness checks.
    pub market: Option<String>,
    pub lookback_days: u32,
    pub artist_cache_ttl: chrono::Duration,
    pub crawl_interval: Duration,
    pub notifier_interval: Duration,
    pub notifier_timeout: chrono::Duration,
    pub pool_size: usize,
    pub circular_fitting: bool,
    pub separate_rereleases: bool,
    pub intelligent_appears_on: bool,
    pub live_audio_features: bool,
    pub auto_purge_days: Option<u32>,
    pub playlists: BTreeMap<ExtendedCategory, String>,
    pub forward: Option<ForwardConfig>,
    /// Delay after a 5xx response before the same call is retried.
    pub server_error_backoff: Duration,
    /// Pause between two insertion batches of the playlist writer.
    pub insert_cooldown: Duration,
}

impl Config {
    /// Configuration with all defaults, persisting below `data_dir`.
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            spotify: SpotifyConfig {
                api_url: DEFAULT_API_URL.to_string(),
                auth_url: DEFAULT_AUTH_URL.to_string(),
                token_url: DEFAULT_TOKEN_URL.to_string(),
                client_id: String::new(),
                redirect_uri: format!("http://{}/callback", DEFAULT_SERVER_ADDRESS),
                scope: DEFAULT_SCOPE.to_string(),
            },
            server_addr: DEFAULT_SERVER_ADDRESS.to_string(),
            data_dir,
            market: None,
            lookback_days: 3,
            artist_cache_ttl: chrono::Duration::hours(24),
            crawl_interval: Duration::from_secs(30 * 60),
            notifier_interval: Duration::from_secs(5 * 60),
            notifier_timeout: chrono::Duration::days(31),
            pool_size: 5,
            circular_fitting: true,
            separate_rereleases: false,
            intelligent_appears_on: false,
            live_audio_features: false,
            auto_purge_days: None,
            playlists: BTreeMap::new(),
            forward: None,
            server_error_backoff: Duration::from_secs(60),
            insert_cooldown: Duration::from_secs(1),
        }
    }

    /// Builds the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when a numeric or boolean value cannot be
    /// parsed, when the pool size is zero, or when re-release separation is
    /// enabled without a market to judge track availability against.
    pub fn from_env() -> Result<Self, ConfigError> {
        let data_dir = var("SPORLRADAR_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(default_data_dir);
        let mut config = Config::new(data_dir);

        if let Some(v) = var("SPOTIFY_API_URL") {
            config.spotify.api_url = v.trim_end_matches('/').to_string();
        }
        if let Some(v) = var("SPOTIFY_API_AUTH_URL") {
            config.spotify.auth_url = v;
        }
        if let Some(v) = var("SPOTIFY_API_TOKEN_URL") {
            config.spotify.token_url = v;
        }
        if let Some(v) = var("SPOTIFY_API_AUTH_CLIENT_ID") {
            config.spotify.client_id = v;
        }
        if let Some(v) = var("SPOTIFY_API_REDIRECT_URI") {
            config.spotify.redirect_uri = v;
        }
        if let Some(v) = var("SPOTIFY_API_AUTH_SCOPE") {
            config.spotify.scope = v;
        }
        if let Some(v) = var("SERVER_ADDRESS") {
            config.server_addr = v;
        }

        config.market = var("SPORLRADAR_MARKET").map(|m| m.to_ascii_uppercase());
        config.lookback_days = parsed("SPORLRADAR_LOOKBACK_DAYS")?.unwrap_or(config.lookback_days);
        if let Some(hours) = parsed::<i64>("SPORLRADAR_ARTIST_CACHE_TTL_HOURS")? {
            config.artist_cache_ttl = chrono::Duration::hours(hours);
        }
        if let Some(minutes) = parsed::<u64>("SPORLRADAR_CRAWL_INTERVAL_MINUTES")? {
            config.crawl_interval = Duration::from_secs(minutes * 60);
        }
        if let Some(minutes) = parsed::<u64>("SPORLRADAR_NOTIFIER_INTERVAL_MINUTES")? {
            config.notifier_interval = Duration::from_secs(minutes * 60);
        }
        if let Some(days) = parsed::<i64>("SPORLRADAR_NOTIFIER_TIMEOUT_DAYS")? {
            config.notifier_timeout = chrono::Duration::days(days);
        }
        config.pool_size = parsed("SPORLRADAR_POOL_SIZE")?.unwrap_or(config.pool_size);
        config.circular_fitting =
            parsed_bool("SPORLRADAR_CIRCULAR_FITTING")?.unwrap_or(config.circular_fitting);
        config.separate_rereleases =
            parsed_bool("SPORLRADAR_SEPARATE_RERELEASES")?.unwrap_or(config.separate_rereleases);
        config.intelligent_appears_on = parsed_bool("SPORLRADAR_INTELLIGENT_APPEARS_ON")?
            .unwrap_or(config.intelligent_appears_on);
        config.live_audio_features =
            parsed_bool("SPORLRADAR_LIVE_AUDIO_FEATURES")?.unwrap_or(config.live_audio_features);
        config.auto_purge_days = parsed("SPORLRADAR_AUTO_PURGE_DAYS")?;

        for category in ExtendedCategory::ALL {
            let key = format!("SPORLRADAR_PLAYLIST_{}", category.env_suffix());
            if let Some(playlist_id) = var(&key) {
                config.playlists.insert(category, playlist_id);
            }
        }

        if let Some(url) = var("SPORLRADAR_FORWARD_URL") {
            let artists = var("SPORLRADAR_FORWARD_ARTISTS")
                .map(|v| split_list(&v).collect())
                .unwrap_or_default();
            let categories = match var("SPORLRADAR_FORWARD_CATEGORIES") {
                Some(v) => split_list(&v)
                    .map(|c| {
                        ExtendedCategory::from_str(&c).map_err(|reason| ConfigError::Invalid {
                            key: "SPORLRADAR_FORWARD_CATEGORIES".to_string(),
                            value: c.clone(),
                            reason,
                        })
                    })
                    .collect::<Result<HashSet<_>, _>>()?,
                None => HashSet::new(),
            };
            config.forward = Some(ForwardConfig {
                url,
                artists,
                categories,
            });
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pool_size == 0 {
            return Err(ConfigError::Invalid {
                key: "SPORLRADAR_POOL_SIZE".to_string(),
                value: "0".to_string(),
                reason: "the fetch pool needs at least one worker".to_string(),
            });
        }
        if self.separate_rereleases && self.market.is_none() {
            return Err(ConfigError::Missing("SPORLRADAR_MARKET"));
        }
        Ok(())
    }

    pub fn playlist_for(&self, category: ExtendedCategory) -> Option<&str> {
        self.playlists.get(&category).map(String::as_str)
    }

    pub fn token_path(&self) -> PathBuf {
        self.data_dir.join("cache/token.json")
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parsed<T>(key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match var(key) {
        Some(value) => value
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::Invalid {
                key: key.to_string(),
                value: value.clone(),
                reason: e.to_string(),
            }),
        None => Ok(None),
    }
}

fn parsed_bool(key: &'static str) -> Result<Option<bool>, ConfigError> {
    match var(key) {
        Some(value) => parse_bool(&value).map(Some).ok_or(ConfigError::Invalid {
            key: key.to_string(),
            value,
            reason: "expected true/false".to_string(),
        }),
        None => Ok(None),
    }
}

pub fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn split_list(value: &str) -> impl Iterator<Item = String> + '_ {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
