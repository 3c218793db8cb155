use dotenvy::dotenv;
use std::env;
use std::time::Duration;

use crate::error::{Error, Result};

pub const DEFAULT_MAX_REQUESTS: u64 = 10_000;

#[derive(Debug, Clone)]
pub struct Config {
    pub environment: String,
    pub protocol: String,
    pub project_id: String,
    pub auth_token: String,
    pub max_requests: u64,
    pub max_elapsed: Option<Duration>,
    pub mongo_uri: String,
    pub mongo_db_name: String,
}

impl Config {
    /// Read configuration from the process environment (and `.env` if present).
    pub fn from_env() -> Result<Config> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Config>
    where
        F: Fn(&str) -> Option<String>,
    {
        let max_requests = get_number_or_default(&lookup, "WSK_MAX_REQUESTS", DEFAULT_MAX_REQUESTS)?;
        let max_elapsed = get_number(&lookup, "WSK_MAX_ELAPSED_SECS")?.map(Duration::from_secs);
        Ok(Config {
            environment: get_or_default(&lookup, "WSK_ENVIRONMENT", "www.lexisnexis.com"),
            protocol: get_or_default(&lookup, "WSK_PROTOCOL", "http"),
            project_id: get_required(&lookup, "WSK_PROJECT_ID")?,
            auth_token: get_required(&lookup, "WSK_AUTH_TOKEN")?,
            max_requests,
            max_elapsed,
            mongo_uri: get_or_default(&lookup, "MONGO_URI", "mongodb://localhost:27017"),
            mongo_db_name: get_or_default(&lookup, "MONGO_DB_NAME", "wsk"),
        })
    }
}

fn get_required<F>(lookup: &F, key: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| Error::config(key, "missing required environment variable"))
}

fn get_or_default<F>(lookup: &F, key: &str, default: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).unwrap_or_else(|| default.to_string())
}

fn get_number_or_default<F>(lookup: &F, key: &str, default: u64) -> Result<u64>
where
    F: Fn(&str) -> Option<String>,
{
    Ok(get_number(lookup, key)?.unwrap_or(default))
}

fn get_number<F>(lookup: &F, key: &str) -> Result<Option<u64>>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(v) if !v.trim().is_empty() => v
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| Error::config(key, format!("not a number: {e}"))),
        _ => Ok(None),
    }
}
