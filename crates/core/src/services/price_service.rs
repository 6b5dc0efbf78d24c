use std::sync::Arc;

use crate::errors::CoreError;
use crate::models::catalog::{ItemCatalog, ItemId};
use crate::models::price::{PriceCache, PriceSnapshot};
use crate::providers::traits::PriceFeed;

/// Resolved current price of an item, or `None` without a snapshot or quote.
///
/// Total: never fails, whatever the snapshot contains.
pub fn resolve_price(snapshot: Option<&PriceSnapshot>, item_id: ItemId) -> Option<i64> {
    snapshot.and_then(|s| s.resolve(item_id))
}

/// Fetches price snapshots and reference data from a `PriceFeed`.
///
/// Cache strategy for snapshots:
/// - A cached snapshot is served as-is; there is no expiry timer.
/// - `force` invalidates the slot first, so a user-initiated refresh always fetches.
/// - A failed fetch leaves the slot empty rather than serving stale prices.
pub struct PriceService {
    feed: Arc<dyn PriceFeed>,
}

impl PriceService {
    pub fn new(feed: Arc<dyn PriceFeed>) -> Self {
        Self { feed }
    }

    pub fn feed_name(&self) -> &str {
        self.feed.name()
    }

    /// Latest snapshot: from the cache when present, otherwise fetched and cached.
    pub async fn latest(
        &self,
        cache: &mut PriceCache,
        force: bool,
    ) -> Result<Arc<PriceSnapshot>, CoreError> {
        if force {
            cache.invalidate();
        }

        if let Some(snapshot) = cache.get() {
            tracing::debug!(items = snapshot.len(), "serving cached price snapshot");
            return Ok(snapshot);
        }

        match self.feed.fetch_latest().await {
            Ok(snapshot) => {
                let snapshot = Arc::new(snapshot);
                tracing::info!(
                    feed = self.feed.name(),
                    items = snapshot.len(),
                    "fetched latest prices"
                );
                cache.set(Arc::clone(&snapshot));
                Ok(snapshot)
            }
            Err(e) => {
                tracing::error!(feed = self.feed.name(), error = %e, "could not fetch latest prices");
                cache.invalidate();
                Err(e)
            }
        }
    }

    /// Fetch the item mapping and build the catalog.
    pub async fn load_catalog(&self) -> Result<ItemCatalog, CoreError> {
        let entries = self.feed.fetch_mapping().await?;
        tracing::info!(feed = self.feed.name(), items = entries.len(), "loaded item mapping");
        Ok(ItemCatalog::from_entries(entries))
    }
}
