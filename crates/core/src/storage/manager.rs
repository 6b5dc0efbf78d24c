use crate::errors::CoreError;
use crate::models::holding::Holding;

use super::store::KeyValueStore;

/// Persistence of the holding collection.
///
/// Holdings are stored as one JSON array under a single well-known key:
/// `[{"uniqueId", "id", "name", "purchasePrice", "quantity", "icon"}, ...]`.
pub struct StorageManager;

impl StorageManager {
    /// Load the holding collection. An absent key is an empty portfolio.
    pub fn load_holdings(store: &dyn KeyValueStore, key: &str) -> Result<Vec<Holding>, CoreError> {
        let Some(bytes) = store.get(key)? else {
            return Ok(Vec::new());
        };

        let holdings: Vec<Holding> = serde_json::from_slice(&bytes)
            .map_err(|e| CoreError::Deserialization(format!("Failed to read saved holdings: {e}")))?;
        tracing::debug!(count = holdings.len(), key, "loaded holdings");
        Ok(holdings)
    }

    /// Serialize and write the holding collection.
    pub fn save_holdings(
        store: &dyn KeyValueStore,
        key: &str,
        holdings: &[Holding],
    ) -> Result<(), CoreError> {
        let bytes = Self::to_json(holdings)?;
        store.put(key, bytes.as_bytes())
    }

    /// The persisted JSON form of a holding collection.
    pub fn to_json(holdings: &[Holding]) -> Result<String, CoreError> {
        serde_json::to_string(holdings)
            .map_err(|e| CoreError::Serialization(format!("Failed to serialize holdings: {e}")))
    }
}
