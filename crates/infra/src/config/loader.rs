//! Configuration loader
//!
//! Loads engine configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If the required variables are missing, falls back to a config file
//! 3. Probes multiple paths for config files
//! 4. Supports TOML and JSON formats
//!
//! ## Environment Variables
//! - `CASEBRIDGE_CRM_BASE_URL`: CRM REST base URL (required)
//! - `CASEBRIDGE_OAUTH_TOKEN_URL`: OAuth token endpoint (required)
//! - `CASEBRIDGE_OAUTH_CLIENT_ID`: OAuth client id (required)
//! - `CASEBRIDGE_OAUTH_CLIENT_SECRET`: OAuth client secret (optional)
//! - `CASEBRIDGE_CRM_PAGE_SIZE`: Requested page size
//! - `CASEBRIDGE_CRM_RATE_LIMIT`: Requests per second against the CRM
//! - `CASEBRIDGE_SYNC_INTERVAL`: Scheduler interval in seconds
//! - `CASEBRIDGE_SYNC_ENABLED`: Whether scheduled sync is enabled
//!
//! ## File Locations
//! The loader probes, in order: `./config.toml`, `./config.json`,
//! `./casebridge.toml`, `./casebridge.json`, then the same names in the
//! parent directory.

use std::path::{Path, PathBuf};

use casebridge_domain::{EngineConfig, Result, SyncError};

/// Load configuration with automatic fallback strategy.
///
/// A `.env` file is honored in development before the environment is read.
///
/// # Errors
/// Returns `SyncError::Config` when neither source yields a configuration.
pub fn load() -> Result<EngineConfig> {
    dotenvy::dotenv().ok();

    match load_from_env() {
        Ok(config) => {
            tracing::info!("configuration loaded from environment variables");
            Ok(config)
        }
        Err(err) => {
            tracing::debug!(error = ?err, "environment incomplete; trying config file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables.
///
/// # Errors
/// Returns `SyncError::Config` when a required variable is missing or a
/// numeric variable fails to parse.
pub fn load_from_env() -> Result<EngineConfig> {
    let mut config = EngineConfig::default();

    config.crm.base_url = env_var("CASEBRIDGE_CRM_BASE_URL")?;
    config.oauth.token_url = env_var("CASEBRIDGE_OAUTH_TOKEN_URL")?;
    config.oauth.client_id = env_var("CASEBRIDGE_OAUTH_CLIENT_ID")?;
    config.oauth.client_secret = std::env::var("CASEBRIDGE_OAUTH_CLIENT_SECRET").ok();

    if let Some(page_size) = env_parsed::<u32>("CASEBRIDGE_CRM_PAGE_SIZE")? {
        config.crm.page_size = page_size;
    }
    if let Some(rate_limit) = env_parsed::<u64>("CASEBRIDGE_CRM_RATE_LIMIT")? {
        config.crm.rate_limit_per_sec = rate_limit;
    }
    if let Some(interval) = env_parsed::<u64>("CASEBRIDGE_SYNC_INTERVAL")? {
        config.schedule.interval_secs = interval;
    }
    config.schedule.enabled = env_bool("CASEBRIDGE_SYNC_ENABLED", true);

    Ok(config)
}

/// Load configuration from a file.
///
/// If `path` is `None`, probes the standard locations. Format is detected
/// by file extension.
///
/// # Errors
/// Returns `SyncError::Config` when no file is found or parsing fails.
pub fn load_from_file(path: Option<PathBuf>) -> Result<EngineConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(SyncError::Config(format!("config file not found: {}", p.display())));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            SyncError::Config("no config file found in any of the standard locations".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|err| SyncError::Config(format!("failed to read config file: {err}")))?;

    parse_config(&contents, &config_path)
}

fn parse_config(contents: &str, path: &Path) -> Result<EngineConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|err| SyncError::Config(format!("invalid TOML config: {err}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|err| SyncError::Config(format!("invalid JSON config: {err}"))),
        other => Err(SyncError::Config(format!("unsupported config format: .{other}"))),
    }
}

fn probe_config_paths() -> Option<PathBuf> {
    const CANDIDATES: [&str; 4] =
        ["config.toml", "config.json", "casebridge.toml", "casebridge.json"];

    for dir in [".", ".."] {
        for name in CANDIDATES {
            let path = Path::new(dir).join(name);
            if path.exists() {
                return Some(path);
            }
        }
    }
    None
}

fn env_var(name: &str) -> Result<String> {
    std::env::var(name)
        .map_err(|_| SyncError::Config(format!("missing environment variable {name}")))
}

fn env_parsed<T: std::str::FromStr>(name: &str) -> Result<Option<T>> {
    match std::env::var(name) {
        Ok(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|_| SyncError::Config(format!("invalid value for {name}: {raw}"))),
        Err(_) => Ok(None),
    }
}

fn env_bool(name: &str, default: bool) -> bool {
    std::env::var(name)
        .map(|raw| matches!(raw.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
