use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use super::catalog::ItemId;

/// Latest instant-buy (`high`) and instant-sell (`low`) prices for one item.
/// Either side may be missing when the item has not traded recently.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceQuote {
    #[serde(default)]
    pub high: Option<i64>,
    #[serde(default)]
    pub low: Option<i64>,
}

impl PriceQuote {
    pub fn new(high: Option<i64>, low: Option<i64>) -> Self {
        Self { high, low }
    }

    /// Single current price for this quote.
    ///
    /// Mean of both sides rounded half-up when both are present, the present
    /// side when only one is, `None` when neither is.
    pub fn resolve(&self) -> Option<i64> {
        match (self.high, self.low) {
            (Some(high), Some(low)) => Some((high + low + 1).div_euclid(2)),
            (Some(high), None) => Some(high),
            (None, Some(low)) => Some(low),
            (None, None) => None,
        }
    }
}

/// Immutable point-in-time price table for all items.
///
/// Replaced wholesale on every refresh, never patched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSnapshot {
    quotes: HashMap<ItemId, PriceQuote>,
    fetched_at: DateTime<Utc>,
}

impl PriceSnapshot {
    /// Snapshot stamped with the current time.
    pub fn new(quotes: HashMap<ItemId, PriceQuote>) -> Self {
        Self::with_fetched_at(quotes, Utc::now())
    }

    pub fn with_fetched_at(quotes: HashMap<ItemId, PriceQuote>, fetched_at: DateTime<Utc>) -> Self {
        Self { quotes, fetched_at }
    }

    pub fn quote(&self, item_id: ItemId) -> Option<&PriceQuote> {
        self.quotes.get(&item_id)
    }

    /// Resolved current price for an item; `None` if the item is absent or
    /// has neither a high nor a low price.
    pub fn resolve(&self, item_id: ItemId) -> Option<i64> {
        self.quote(item_id).and_then(PriceQuote::resolve)
    }

    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }
}

impl FromIterator<(ItemId, PriceQuote)> for PriceSnapshot {
    fn from_iter<T: IntoIterator<Item = (ItemId, PriceQuote)>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Single-slot cache holding the latest price snapshot.
///
/// There is no expiry: a cached snapshot is served until the slot is
/// explicitly invalidated (a forced refresh does this first).
#[derive(Debug, Clone, Default)]
pub struct PriceCache {
    latest: Option<Arc<PriceSnapshot>>,
}

impl PriceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached snapshot, if any. Cheap: clones the `Arc`.
    pub fn get(&self) -> Option<Arc<PriceSnapshot>> {
        self.latest.clone()
    }

    /// Replace the slot. Last write wins.
    pub fn set(&mut self, snapshot: Arc<PriceSnapshot>) {
        self.latest = Some(snapshot);
    }

    /// Clear the slot so the next read has to fetch.
    pub fn invalidate(&mut self) {
        self.latest = None;
    }

    pub fn is_empty(&self) -> bool {
        self.latest.is_none()
    }
}
