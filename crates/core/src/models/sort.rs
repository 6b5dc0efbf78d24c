use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::errors::CoreError;

/// Column the holding table can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortColumn {
    /// Case-insensitive, code-point order; no locale collation
    Name,
    PurchasePrice,
    Quantity,
    Investment,
    CurrentPrice,
    PriceAfterTax,
    ProfitLoss,
    ProfitLossPercent,
}

impl SortColumn {
    pub const ALL: [SortColumn; 8] = [
        SortColumn::Name,
        SortColumn::PurchasePrice,
        SortColumn::Quantity,
        SortColumn::Investment,
        SortColumn::CurrentPrice,
        SortColumn::PriceAfterTax,
        SortColumn::ProfitLoss,
        SortColumn::ProfitLossPercent,
    ];

    /// Whether ordering by this column needs a price snapshot.
    pub fn is_price_derived(&self) -> bool {
        matches!(
            self,
            SortColumn::CurrentPrice
                | SortColumn::PriceAfterTax
                | SortColumn::ProfitLoss
                | SortColumn::ProfitLossPercent
        )
    }

    /// Identifier used by the table headers.
    pub fn as_str(&self) -> &'static str {
        match self {
            SortColumn::Name => "name",
            SortColumn::PurchasePrice => "purchasePrice",
            SortColumn::Quantity => "quantity",
            SortColumn::Investment => "investment",
            SortColumn::CurrentPrice => "currentPrice",
            SortColumn::PriceAfterTax => "priceAfterTax",
            SortColumn::ProfitLoss => "profitLoss",
            SortColumn::ProfitLossPercent => "profitLossPercent",
        }
    }
}

impl std::fmt::Display for SortColumn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortColumn {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SortColumn::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| CoreError::ValidationError(format!("Unknown sort column: {s}")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

/// Current ordering of the holding table.
///
/// Selecting the active column flips the direction; selecting another
/// column switches to it in ascending order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortState {
    pub column: SortColumn,
    pub direction: SortDirection,
}

impl SortState {
    pub fn new(column: SortColumn, direction: SortDirection) -> Self {
        Self { column, direction }
    }

    /// Apply a column selection and return the new state.
    pub fn select(&mut self, column: SortColumn) -> SortState {
        if self.column == column {
            self.direction = self.direction.flipped();
        } else {
            self.column = column;
            self.direction = SortDirection::Asc;
        }
        *self
    }
}

impl Default for SortState {
    fn default() -> Self {
        Self::new(SortColumn::ProfitLoss, SortDirection::Desc)
    }
}
