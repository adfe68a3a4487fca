use crate::config::Config;
use crate::format::format_item;
use crate::notifier::Notifier;
use crate::seen::SeenSet;
use anyhow::{Context, Result};
use ecsr::{Client, ItemDetail, SearchQuery, Session};
use log::{error, info, warn};
use tokio::time::{sleep, Instant};

/// Owns all state of the polling loop.
pub(crate) struct Relay {
    config: Config,
    catalog: Client,
    notifier: Notifier,
    query: SearchQuery,
    session: Session,
    seen: SeenSet,
    last_refresh: Instant,
}

impl Relay {
    /// Fails if no initial CSRF session can be obtained.
    pub(crate) async fn new(config: Config) -> Result<Self> {
        let catalog = Client::new(&config.base_url)?.with_csrf_on_search(config.csrf_on_search);
        let session = catalog
            .acquire_session()
            .await
            .context("Cannot continue without a CSRF session")?;

        let seen = SeenSet::load(&config.state_path);
        info!(
            "Loaded {} seen items from {}",
            seen.len(),
            seen.path().display()
        );

        Ok(Self {
            notifier: Notifier::new(
                &config.telegram_api_url,
                &config.telegram_token,
                &config.chat_id,
            ),
            query: SearchQuery::new(config.category.clone(), config.limit),
            catalog,
            session,
            seen,
            last_refresh: Instant::now(),
            config,
        })
    }

    pub(crate) async fn run(mut self) {
        loop {
            self.refresh_if_due(Instant::now()).await;

            if let Err(e) = self.poll().await {
                match e.downcast_ref::<ecsr::Error>() {
                    Some(err) => error!("Catalog error: {err}"),
                    None => error!("Unexpected error: {e:#}"),
                }
            }

            sleep(self.config.poll_delay).await;
        }
    }

    /// A failed refresh keeps the previous session; the timer resets either way.
    async fn refresh_if_due(&mut self, now: Instant) {
        if now.duration_since(self.last_refresh) < self.config.refresh_interval {
            return;
        }

        info!("Refreshing CSRF token");
        match self.catalog.acquire_session().await {
            Ok(session) => {
                self.session = session;
                info!("CSRF token refreshed");
            }
            Err(e) => warn!("Failed to refresh CSRF token, retrying next loop: {e}"),
        }
        self.last_refresh = now;
    }

    pub(crate) async fn poll(&mut self) -> Result<()> {
        info!("Fetching catalog items");
        let items = self.catalog.search_items(&self.session, &self.query).await?;
        let new_items = self.seen.filter_new(&items);

        if new_items.is_empty() {
            info!("No new items found");
            return Ok(());
        }

        info!("Found {} new items, fetching details", new_items.len());
        let details = self
            .catalog
            .fetch_details(&mut self.session, &new_items)
            .await?;

        if details.is_empty() {
            warn!("No details returned, the CSRF session is likely stale");
            return Ok(());
        }

        for item in details {
            self.deliver(item).await?;
        }

        Ok(())
    }

    /// Marks the item seen even when delivery fails.
    async fn deliver(&mut self, item: ItemDetail) -> Result<()> {
        let message = format_item(&item, &self.config.base_url);

        match self.notifier.notify(&message).await {
            Ok(()) => info!("Sent: {}", item.name),
            Err(e) => error!("Failed to deliver {}: {e:#}", item.name),
        }

        self.seen.insert(item.id);
        self.seen.persist()
    }
}
