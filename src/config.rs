//! Configuration resolution for tracktempo
//!
//! Settings resolve with Environment → TOML → default priority. Spotify
//! client credentials have no default and must come from one of the first
//! two tiers.

use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::PathBuf;

use crate::services::SpotifyCredentials;

const ENV_CLIENT_ID: &str = "TRACKTEMPO_SPOTIFY_CLIENT_ID";
const ENV_CLIENT_SECRET: &str = "TRACKTEMPO_SPOTIFY_CLIENT_SECRET";
const ENV_BIND_ADDRESS: &str = "TRACKTEMPO_BIND_ADDRESS";
const ENV_DATABASE_PATH: &str = "TRACKTEMPO_DATABASE_PATH";
const ENV_CONFIG_PATH: &str = "TRACKTEMPO_CONFIG";

const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:5760";

/// On-disk TOML configuration, all fields optional
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    pub spotify_client_id: Option<String>,
    pub spotify_client_secret: Option<String>,
    pub bind_address: Option<String>,
    pub database_path: Option<String>,
}

/// Fully resolved runtime configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub credentials: SpotifyCredentials,
    pub bind_address: String,
    pub database_path: PathBuf,
}

/// Default config file path: `~/.config/tracktempo/config.toml`
fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("tracktempo").join("config.toml"))
}

/// Default database path: `~/.local/share/tracktempo/tracktempo.db`
/// (platform equivalent), falling back to the working directory.
fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("tracktempo").join("tracktempo.db"))
        .unwrap_or_else(|| PathBuf::from("tracktempo.db"))
}

/// Load the TOML tier, if a config file exists.
fn load_toml() -> Result<TomlConfig> {
    let path = match std::env::var(ENV_CONFIG_PATH) {
        Ok(p) => PathBuf::from(p),
        Err(_) => match default_config_path() {
            Some(p) if p.exists() => p,
            _ => return Ok(TomlConfig::default()),
        },
    };

    let content = std::fs::read_to_string(&path)
        .map_err(|e| anyhow!("Failed to read config file {}: {}", path.display(), e))?;
    let config = toml::from_str(&content)
        .map_err(|e| anyhow!("Failed to parse config file {}: {}", path.display(), e))?;

    tracing::info!("Configuration loaded from {}", path.display());

    Ok(config)
}

fn env_or(toml_value: Option<String>, env_var: &str) -> Option<String> {
    std::env::var(env_var).ok().or(toml_value)
}

/// Resolve the full runtime configuration.
pub fn load() -> Result<Config> {
    let toml_config = load_toml()?;

    let client_id = env_or(toml_config.spotify_client_id, ENV_CLIENT_ID);
    let client_secret = env_or(toml_config.spotify_client_secret, ENV_CLIENT_SECRET);

    let (Some(client_id), Some(client_secret)) = (client_id, client_secret) else {
        return Err(anyhow!(
            "Spotify credentials not configured. Provide them via:\n\
             1. Environment: {ENV_CLIENT_ID} / {ENV_CLIENT_SECRET}\n\
             2. TOML config: ~/.config/tracktempo/config.toml\n\
                (spotify_client_id = \"...\", spotify_client_secret = \"...\")\n\
             \n\
             Obtain credentials at: https://developer.spotify.com/dashboard"
        ));
    };

    let bind_address = env_or(toml_config.bind_address, ENV_BIND_ADDRESS)
        .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

    let database_path = env_or(toml_config.database_path, ENV_DATABASE_PATH)
        .map(PathBuf::from)
        .unwrap_or_else(default_database_path);

    Ok(Config {
        credentials: SpotifyCredentials {
            client_id,
            client_secret,
        },
        bind_address,
        database_path,
    })
}
