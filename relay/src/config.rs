use anyhow::{anyhow, Context, Result};
use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_TELEGRAM_API_URL: &str = "https://api.telegram.org";
const DEFAULT_BASE_URL: &str = "https://ecsr.io";
const DEFAULT_CATEGORY: &str = "Featured";
const DEFAULT_LIMIT: u32 = 28;
const DEFAULT_POLL_DELAY_SECS: u64 = 5;
const DEFAULT_REFRESH_SECS: u64 = 90;
const DEFAULT_SEEN_FILE: &str = "seen_items.json";

#[derive(Debug, Clone)]
pub(crate) struct Config {
    pub telegram_token: String,
    pub chat_id: String,
    pub telegram_api_url: String,
    pub base_url: String,
    pub category: String,
    pub limit: u32,
    pub poll_delay: Duration,
    pub refresh_interval: Duration,
    pub state_path: PathBuf,
    pub csrf_on_search: bool,
}

impl Config {
    pub(crate) fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key).with_context(|| format!("{key} not found in environment"))
        };

        Ok(Self {
            telegram_token: required("TELEGRAM_BOT_TOKEN")?,
            chat_id: required("TELEGRAM_CHAT_ID")?,
            telegram_api_url: lookup("TELEGRAM_API_URL")
                .unwrap_or_else(|| DEFAULT_TELEGRAM_API_URL.to_string()),
            base_url: lookup("CATALOG_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            category: lookup("CATALOG_CATEGORY").unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            limit: parse_or(&lookup, "CATALOG_LIMIT", DEFAULT_LIMIT)?,
            poll_delay: Duration::from_secs(parse_or(
                &lookup,
                "POLL_DELAY_SECS",
                DEFAULT_POLL_DELAY_SECS,
            )?),
            refresh_interval: Duration::from_secs(parse_or(
                &lookup,
                "SESSION_REFRESH_SECS",
                DEFAULT_REFRESH_SECS,
            )?),
            state_path: lookup("SEEN_FILE")
                .unwrap_or_else(|| DEFAULT_SEEN_FILE.to_string())
                .into(),
            csrf_on_search: parse_or(&lookup, "CSRF_ON_SEARCH", true)?,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|e| anyhow!("Invalid value {value:?} for {key}: {e}")),
        None => Ok(default),
    }
}
