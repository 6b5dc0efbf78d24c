use async_trait::async_trait;

use crate::errors::CoreError;
use crate::models::catalog::CatalogEntry;
use crate::models::price::PriceSnapshot;

/// Source of market data: the latest price table and the item mapping.
///
/// The engine only depends on this trait, so the HTTP client can be
/// replaced (or mocked in tests) without touching valuation or caching.
#[async_trait]
pub trait PriceFeed: Send + Sync {
    /// Human-readable name of this feed (for logs/errors).
    fn name(&self) -> &str;

    /// Fetch the full latest-price table as one snapshot.
    async fn fetch_latest(&self) -> Result<PriceSnapshot, CoreError>;

    /// Fetch the item mapping the catalog is built from.
    async fn fetch_mapping(&self) -> Result<Vec<CatalogEntry>, CoreError>;
}

/// Source of item icon bytes.
#[async_trait]
pub trait IconSource: Send + Sync {
    /// Fetch the raw bytes of an icon by its file name.
    async fn fetch_icon(&self, icon_key: &str) -> Result<Vec<u8>, CoreError>;
}
