use serde::{Deserialize, Serialize};

use super::catalog::ItemId;

/// Profit percentage above which a figure is flagged as hot.
pub const HOT_THRESHOLD_PCT: f64 = 30.0;

/// Profit percentage at or below which a figure is flagged as cold.
pub const COLD_THRESHOLD_PCT: f64 = -30.0;

/// Profit/loss as a percentage of the investment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value")]
pub enum ProfitPercent {
    /// No current price, or nothing to compare against
    Unavailable,
    /// Zero investment with positive sale value
    Infinite,
    Value(f64),
}

impl ProfitPercent {
    pub fn value(&self) -> Option<f64> {
        match self {
            ProfitPercent::Value(v) => Some(*v),
            _ => None,
        }
    }

    /// Total sort key: Unavailable < any value < Infinite.
    pub fn sort_key(&self) -> f64 {
        match self {
            ProfitPercent::Unavailable => f64::NEG_INFINITY,
            ProfitPercent::Infinite => f64::INFINITY,
            ProfitPercent::Value(v) if v.is_nan() => f64::NEG_INFINITY,
            ProfitPercent::Value(v) => *v,
        }
    }

    /// Presentational marker for this percentage.
    pub fn emphasis(&self) -> Emphasis {
        match self {
            ProfitPercent::Infinite => Emphasis::Hot,
            ProfitPercent::Value(v) if *v > HOT_THRESHOLD_PCT => Emphasis::Hot,
            ProfitPercent::Value(v) if *v <= COLD_THRESHOLD_PCT => Emphasis::Cold,
            _ => Emphasis::Neutral,
        }
    }
}

/// Display-only classification of a profit percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Emphasis {
    Hot,
    Neutral,
    Cold,
}

/// Derived figures for one holding against one snapshot.
///
/// Never stored: recomputed from `(Holding, PriceSnapshot)` on every read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldingValuation {
    pub unique_id: String,

    pub item_id: ItemId,

    /// `purchase_price * quantity`; `None` for a malformed holding
    pub investment: Option<f64>,

    /// Resolved price from the snapshot
    pub current_price: Option<i64>,

    /// Resolved price minus the capped sale tax
    pub price_after_tax: Option<i64>,

    /// `price_after_tax * quantity`
    pub sale_value_after_tax: Option<f64>,

    /// `sale_value_after_tax - investment`
    pub profit_loss: Option<f64>,

    pub profit_loss_percent: ProfitPercent,
}

impl HoldingValuation {
    pub fn emphasis(&self) -> Emphasis {
        self.profit_loss_percent.emphasis()
    }

    pub fn has_price(&self) -> bool {
        self.current_price.is_some()
    }
}

/// Totals over a set of holdings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioStatistics {
    /// Number of holdings summarized
    pub item_count: usize,

    /// Number of holdings with a resolved price
    pub priced_count: usize,

    pub total_investment: f64,

    /// Pre-tax market value; unpriced holdings contribute their investment
    pub total_current_value: f64,

    /// After-tax profit/loss over priced holdings only
    pub total_profit_loss: f64,

    /// `total_profit_loss / total_investment * 100`
    pub profit_loss_percent: ProfitPercent,
}

impl PortfolioStatistics {
    pub fn emphasis(&self) -> Emphasis {
        self.profit_loss_percent.emphasis()
    }
}
