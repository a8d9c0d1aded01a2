// Configuration loading and parsing (league.toml, credentials.toml).

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::models::SourceWeights;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("no Sleeper token: set `token` in config/credentials.toml or SLEEPER_TOKEN")]
    MissingToken,
}

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub league_id: String,
    pub token: String,
    /// Per-source weight multipliers for valuation scoring. Passed
    /// explicitly wherever scores are computed.
    pub weights: SourceWeights,
    /// Whether the cycle may push the optimized lineup back to Sleeper.
    pub manage_roster: bool,
    /// Taxi moves are separately gated and default off.
    pub manage_taxi: bool,
    /// Override for the response cache directory; `None` uses the platform
    /// default.
    pub cache_dir: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// league.toml structs
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct LeagueFile {
    league: LeagueSection,
    #[serde(default)]
    weights: HashMap<String, f64>,
    #[serde(default)]
    manage: ManageSection,
    #[serde(default)]
    cache: CacheSection,
}

#[derive(Debug, Deserialize)]
struct LeagueSection {
    id: String,
}

#[derive(Debug, Default, Deserialize)]
struct ManageSection {
    #[serde(default)]
    roster: bool,
    #[serde(default)]
    taxi: bool,
}

#[derive(Debug, Default, Deserialize)]
struct CacheSection {
    dir: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// credentials.toml structs
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
struct CredentialsFile {
    #[serde(default)]
    sleeper: SleeperCredentials,
}

#[derive(Debug, Default, Deserialize)]
struct SleeperCredentials {
    token: Option<String>,
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/league.toml` and
/// (optionally) `config/credentials.toml` relative to the current directory.
/// The Sleeper token falls back to the `SLEEPER_TOKEN` environment variable
/// when `credentials.toml` does not provide one.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    load_config_from(&cwd)
}

pub(crate) fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let config_dir = base_dir.join("config");

    // --- league.toml (required) ---
    let league_path = config_dir.join("league.toml");
    let league_text = read_file(&league_path)?;
    let league_file: LeagueFile =
        toml::from_str(&league_text).map_err(|e| ConfigError::ParseError {
            path: league_path.clone(),
            source: e,
        })?;

    // --- credentials.toml (optional, env fallback) ---
    let credentials_path = config_dir.join("credentials.toml");
    let credentials: CredentialsFile = match read_file(&credentials_path) {
        Ok(text) => toml::from_str(&text).map_err(|e| ConfigError::ParseError {
            path: credentials_path.clone(),
            source: e,
        })?,
        Err(ConfigError::FileNotFound { .. }) => CredentialsFile::default(),
        Err(e) => return Err(e),
    };

    let token = credentials
        .sleeper
        .token
        .or_else(|| std::env::var("SLEEPER_TOKEN").ok())
        .filter(|t| !t.is_empty())
        .ok_or(ConfigError::MissingToken)?;

    let config = Config {
        league_id: league_file.league.id,
        token,
        weights: SourceWeights::new(league_file.weights),
        manage_roster: league_file.manage.roster,
        manage_taxi: league_file.manage.taxi,
        cache_dir: league_file.cache.dir,
    };

    validate(&config)?;
    Ok(config)
}

fn read_file(path: &Path) -> Result<String, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.league_id.is_empty() {
        return Err(ConfigError::ValidationError {
            field: "league.id".to_string(),
            message: "league id must not be empty".to_string(),
        });
    }

    let mut any_positive = false;
    for (source, weight) in config.weights.iter() {
        if weight < 0.0 {
            return Err(ConfigError::ValidationError {
                field: format!("weights.{source}"),
                message: "source weights must be non-negative".to_string(),
            });
        }
        if weight > 0.0 {
            any_positive = true;
        }
    }
    // An explicit all-zero weight table would score every player 0.
    if !any_positive && config.weights.iter().count() > 0 {
        return Err(ConfigError::ValidationError {
            field: "weights".to_string(),
            message: "at least one source weight must be positive".to_string(),
        });
    }

    Ok(())
}
