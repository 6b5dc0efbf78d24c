use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

use super::traits::{IconSource, PriceFeed};
use crate::errors::CoreError;
use crate::models::catalog::{CatalogEntry, ItemId};
use crate::models::price::{PriceQuote, PriceSnapshot};
use crate::models::settings::Settings;

const PROVIDER: &str = "OSRS Wiki";

/// Real-time prices API of the Old School RuneScape wiki, plus its image host.
///
/// - **Free**: no API key, but every request must carry a descriptive `User-Agent`.
/// - **Endpoints**: `/latest` (all items, high/low), `/mapping` (item reference data).
/// - **Icons**: `{image_base_url}{icon file name with spaces as underscores}`.
pub struct WikiClient {
    client: Client,
    api_base_url: String,
    image_base_url: String,
}

impl WikiClient {
    pub fn new(settings: &Settings) -> Result<Self, CoreError> {
        let client = Client::builder()
            .user_agent(settings.user_agent.clone())
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            api_base_url: settings.api_base_url.trim_end_matches('/').to_string(),
            image_base_url: settings.image_base_url.clone(),
        })
    }

    /// URL an icon file is served from.
    pub fn icon_url(&self, icon_key: &str) -> String {
        icon_url(&self.image_base_url, icon_key)
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, CoreError> {
        let url = format!("{}/{endpoint}", self.api_base_url);
        let resp = self.client.get(&url).send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(CoreError::Api {
                provider: PROVIDER.into(),
                message: format!("API request failed: {status}"),
            });
        }

        resp.json().await.map_err(|e| CoreError::Api {
            provider: PROVIDER.into(),
            message: format!("Failed to parse /{endpoint} response: {e}"),
        })
    }
}

/// Build an icon URL the way the wiki names its files.
pub fn icon_url(image_base_url: &str, icon_key: &str) -> String {
    format!("{image_base_url}{}", icon_key.replace(' ', "_"))
}

/// Price history page for an item.
pub fn price_page_url(item_id: ItemId) -> String {
    format!("https://prices.runescape.wiki/osrs/item/{item_id}")
}

/// Wiki article for an item.
pub fn wiki_page_url(item_id: ItemId) -> String {
    format!("https://oldschool.runescape.wiki/w/Special:Lookup?type=item&id={item_id}")
}

// ── API response types ──────────────────────────────────────────────

/// Body of `/latest`: item ids are JSON object keys.
#[derive(Debug, Deserialize)]
pub struct LatestResponse {
    pub data: HashMap<String, PriceQuote>,
}

impl LatestResponse {
    /// Convert to a snapshot, skipping keys that are not item ids.
    pub fn into_snapshot(self) -> PriceSnapshot {
        self.data
            .into_iter()
            .filter_map(|(key, quote)| match key.parse::<ItemId>() {
                Ok(id) => Some((id, quote)),
                Err(_) => {
                    tracing::debug!(key = %key, "skipping non-numeric item id in latest prices");
                    None
                }
            })
            .collect()
    }
}

#[async_trait]
impl PriceFeed for WikiClient {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn fetch_latest(&self) -> Result<PriceSnapshot, CoreError> {
        let resp: LatestResponse = self.get_json("latest").await?;
        Ok(resp.into_snapshot())
    }

    async fn fetch_mapping(&self) -> Result<Vec<CatalogEntry>, CoreError> {
        self.get_json("mapping").await
    }
}

#[async_trait]
impl IconSource for WikiClient {
    async fn fetch_icon(&self, icon_key: &str) -> Result<Vec<u8>, CoreError> {
        let resp = self.client.get(self.icon_url(icon_key)).send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(CoreError::Api {
                provider: PROVIDER.into(),
                message: format!("Icon request for {icon_key} failed: {status}"),
            });
        }

        Ok(resp.bytes().await?.to_vec())
    }
}
