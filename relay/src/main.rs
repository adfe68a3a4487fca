mod config;
mod format;
mod notifier;
mod relay;
mod seen;

use anyhow::Result;
use config::Config;
use log::info;
use relay::Relay;

#[tokio::main]
async fn main() -> Result<()> {
    common::setup_env();
    let config = Config::from_env()?;
    info!(
        "Watching category {} every {:?}",
        config.category, config.poll_delay
    );

    let relay = Relay::new(config).await?;
    relay.run().await;

    Ok(())
}
