use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Item id as used by the price feed and the item mapping.
pub type ItemId = u32;

/// Reference data for one tradeable item, as served by the mapping endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: ItemId,

    /// Canonical item name (e.g., "Dragon claws")
    pub name: String,

    /// Icon file name on the wiki (e.g., "Dragon claws.png")
    #[serde(default)]
    pub icon: String,

    #[serde(default)]
    pub examine: Option<String>,

    #[serde(default)]
    pub members: Option<bool>,

    /// Grand Exchange buy limit per four hours
    #[serde(default)]
    pub limit: Option<u64>,

    /// Store value
    #[serde(default)]
    pub value: Option<u64>,

    #[serde(default)]
    pub lowalch: Option<u64>,

    #[serde(default)]
    pub highalch: Option<u64>,
}

impl CatalogEntry {
    /// Minimal entry with just the fields the tracker needs.
    pub fn new(id: ItemId, name: impl Into<String>, icon: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            icon: icon.into(),
            examine: None,
            members: None,
            limit: None,
            value: None,
            lowalch: None,
            highalch: None,
        }
    }
}

/// Immutable item catalog, loaded once at startup.
///
/// Indexed by lower-cased name (for adding items by name) and by item id
/// (for resolving shared portfolios). When two entries share a name, the
/// later one wins the name index.
#[derive(Debug, Clone, Default)]
pub struct ItemCatalog {
    entries: Vec<CatalogEntry>,
    by_name: HashMap<String, usize>,
    by_id: HashMap<ItemId, usize>,
}

impl ItemCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: Vec<CatalogEntry>) -> Self {
        let mut by_name = HashMap::with_capacity(entries.len());
        let mut by_id = HashMap::with_capacity(entries.len());
        for (idx, entry) in entries.iter().enumerate() {
            by_name.insert(entry.name.to_lowercase(), idx);
            by_id.insert(entry.id, idx);
        }
        Self {
            entries,
            by_name,
            by_id,
        }
    }

    /// Look up an item by name (trimmed, case-insensitive).
    pub fn find_by_name(&self, name: &str) -> Option<&CatalogEntry> {
        let key = name.trim().to_lowercase();
        self.by_name.get(&key).map(|&idx| &self.entries[idx])
    }

    pub fn find_by_id(&self, id: ItemId) -> Option<&CatalogEntry> {
        self.by_id.get(&id).map(|&idx| &self.entries[idx])
    }

    /// Autocomplete: up to `limit` entries whose name contains `query`
    /// (case-insensitive), in catalog order. An empty query suggests nothing.
    pub fn suggest(&self, query: &str, limit: usize) -> Vec<&CatalogEntry> {
        let q = query.trim().to_lowercase();
        if q.is_empty() {
            return Vec::new();
        }
        self.entries
            .iter()
            .filter(|e| e.name.to_lowercase().contains(&q))
            .take(limit)
            .collect()
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
