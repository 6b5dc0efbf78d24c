use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::CoreError;
use crate::models::catalog::{ItemCatalog, ItemId};
use crate::models::holding::Holding;

/// URL-safe alphabet, unpadded on encode.
const URL_SAFE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Standard alphabet, as produced by links from older versions (`btoa`).
const STANDARD: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Minimal shared form of a holding: `{"i": itemId, "p": purchasePrice, "q": quantity}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharedHolding {
    #[serde(rename = "i")]
    pub item_id: ItemId,
    #[serde(rename = "p")]
    pub purchase_price: f64,
    #[serde(rename = "q")]
    pub quantity: u64,
}

/// Lossy, URL-safe encoding of a holding collection for share links.
///
/// Only `(item id, purchase price, quantity)` travel in the token; names and
/// icons are looked up again in the catalog on decode. Read-only handling of
/// decoded portfolios is up to the caller.
pub struct ShareCodec;

impl ShareCodec {
    /// Encode holdings as Base64 (URL-safe alphabet) of a JSON array of triples.
    pub fn encode(holdings: &[Holding]) -> Result<String, CoreError> {
        let triples: Vec<SharedHolding> = holdings
            .iter()
            .map(|h| SharedHolding {
                item_id: h.item_id,
                purchase_price: h.purchase_price,
                quantity: h.quantity,
            })
            .collect();

        let json = serde_json::to_string(&triples)
            .map_err(|e| CoreError::Serialization(format!("Failed to serialize share data: {e}")))?;
        Ok(URL_SAFE.encode(json))
    }

    /// Decode the raw triples of a token without touching the catalog.
    pub fn decode_triples(token: &str) -> Result<Vec<SharedHolding>, CoreError> {
        // Query-string parsing turns an unescaped '+' into a space.
        let token = token.trim().replace(' ', "+");
        if token.is_empty() {
            return Err(CoreError::MalformedShareToken("token is empty".into()));
        }

        let bytes = if token.contains(['+', '/']) {
            STANDARD.decode(&token)
        } else {
            URL_SAFE.decode(&token)
        }
        .map_err(|e| CoreError::MalformedShareToken(format!("not valid Base64: {e}")))?;

        serde_json::from_slice(&bytes)
            .map_err(|e| CoreError::MalformedShareToken(format!("unexpected contents: {e}")))
    }

    /// Rebuild holdings from a token.
    ///
    /// Triples whose item id is not in the catalog are dropped; a token that
    /// is not Base64 of a JSON array of triples fails as a whole.
    pub fn decode(token: &str, catalog: &ItemCatalog) -> Result<Vec<Holding>, CoreError> {
        let triples = Self::decode_triples(token)?;
        let total = triples.len();

        let holdings: Vec<Holding> = triples
            .into_iter()
            .filter_map(|t| {
                let entry = catalog.find_by_id(t.item_id)?;
                let unique_id = format!("shared-{}-{}", entry.id, Uuid::new_v4());
                Some(Holding::with_id(unique_id, entry, t.purchase_price, t.quantity))
            })
            .collect();

        if holdings.len() < total {
            tracing::warn!(
                dropped = total - holdings.len(),
                "shared portfolio references items missing from the catalog"
            );
        }
        Ok(holdings)
    }
}
