use anyhow::{Context, Result};
use ecsr::{Client, SearchQuery};
use log::info;
use std::env;

const DEFAULT_BASE_URL: &str = "https://ecsr.io";
const DEFAULT_LIMIT: u32 = 28;

#[tokio::main]
async fn main() -> Result<()> {
    common::setup_env();
    probe().await
}

/// Checks the CSRF handshake and one search against the live catalog.
async fn probe() -> Result<()> {
    let base_url = env::var("CATALOG_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
    let category = env::var("CATALOG_CATEGORY").unwrap_or_else(|_| "Featured".to_string());
    let limit = match env::var("CATALOG_LIMIT") {
        Ok(value) => value
            .trim()
            .parse::<u32>()
            .with_context(|| format!("Invalid value {value:?} for CATALOG_LIMIT"))?,
        Err(_) => DEFAULT_LIMIT,
    };

    let client = Client::new(&base_url)?;
    let session = client
        .acquire_session()
        .await
        .context("Couldn't obtain a CSRF token")?;
    info!("Obtained CSRF token from {base_url}");

    let items = client
        .search_items(&session, &SearchQuery::new(category, limit))
        .await?;
    info!("Search returned {} items", items.len());
    for item in items {
        info!("{} ({})", item.id, item.item_type);
    }

    Ok(())
}
