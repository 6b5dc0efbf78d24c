use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use super::catalog::{CatalogEntry, ItemId};

/// A tracked position in one item.
///
/// `name` and `icon` are copied from the catalog when the holding is created,
/// so a holding can be displayed without a catalog lookup. Only
/// `purchase_price` and `quantity` ever change after creation.
///
/// The serialized layout (`uniqueId`, `id`, `name`, `purchasePrice`,
/// `quantity`, `icon`) is the persisted format and must stay stable.
/// A saved record with a null or missing `purchasePrice` loads with a NaN
/// price, and a null, missing or non-integer `quantity` loads as zero.
/// Either way the holding reads as having no valid investment instead of
/// failing the whole load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Holding {
    /// Client-generated identity, never reused
    pub unique_id: String,

    /// Catalog item id
    #[serde(rename = "id")]
    pub item_id: ItemId,

    /// Display name, denormalized from the catalog
    pub name: String,

    /// Price paid per unit
    #[serde(default = "missing_price", deserialize_with = "nullable_price")]
    pub purchase_price: f64,

    /// Number of units held
    #[serde(default, deserialize_with = "lenient_quantity")]
    pub quantity: u64,

    /// Icon file name, denormalized from the catalog
    #[serde(default)]
    pub icon: String,
}

impl Holding {
    /// Create a holding for a catalog item with a fresh unique id.
    pub fn new(entry: &CatalogEntry, purchase_price: f64, quantity: u64) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), entry, purchase_price, quantity)
    }

    /// Create a holding with an explicit unique id.
    pub fn with_id(
        unique_id: impl Into<String>,
        entry: &CatalogEntry,
        purchase_price: f64,
        quantity: u64,
    ) -> Self {
        Self {
            unique_id: unique_id.into(),
            item_id: entry.id,
            name: entry.name.clone(),
            purchase_price,
            quantity,
            icon: entry.icon.clone(),
        }
    }

    /// Total amount paid: `purchase_price * quantity`.
    ///
    /// Returns `None` when the purchase price is not a finite number or the
    /// quantity is zero, so a corrupted holding reads as "unavailable" rather
    /// than as a zero cost.
    pub fn investment(&self) -> Option<f64> {
        if self.quantity == 0 {
            return None;
        }
        let investment = self.purchase_price * self.quantity as f64;
        investment.is_finite().then_some(investment)
    }
}

fn missing_price() -> f64 {
    f64::NAN
}

fn nullable_price<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
}

fn lenient_quantity<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let quantity = Option::<f64>::deserialize(deserializer)?;
    Ok(match quantity {
        Some(q) if q.is_finite() && q >= 1.0 && q.fract() == 0.0 => q as u64,
        _ => 0,
    })
}
