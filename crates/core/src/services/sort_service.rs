use std::cmp::Ordering;

use crate::models::holding::Holding;
use crate::models::price::PriceSnapshot;
use crate::models::sort::{SortColumn, SortDirection, SortState};
use crate::services::valuation_service::ValuationService;

/// Sort value substituted for a missing current or after-tax price.
const MISSING_PRICE: f64 = -1.0;

/// Orders holdings by any table column.
///
/// Intrinsic columns (name, purchase price, quantity, investment) read the
/// holding directly. Price-derived columns are valued against the snapshot;
/// a holding without market data takes the lowest possible value (`-1` for
/// prices, `-inf` for profit figures) so it always lands at the low end
/// instead of among genuine break-even holdings.
///
/// Names compare case-insensitively by Unicode code point of the lower-cased
/// text; names differing only in case put the lower-case letter first. There
/// is no locale collation, so accented letters sort after `z` ("Élite" comes
/// after "Zombie").
///
/// The sort is unstable: holdings with equal keys have no guaranteed order.
pub struct SortService {
    valuation: ValuationService,
}

/// Comparable key extracted from one holding for one column.
#[derive(Debug, Clone, PartialEq)]
enum SortKey {
    /// Case-folded name, then the name as written.
    Text { folded: String, original: String },
    Number(f64),
}

impl SortKey {
    fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (
                SortKey::Text { folded: a, original: a_orig },
                SortKey::Text { folded: b, original: b_orig },
            ) => a.cmp(b).then_with(|| b_orig.cmp(a_orig)),
            (SortKey::Number(a), SortKey::Number(b)) => a.total_cmp(b),
            (SortKey::Text { .. }, SortKey::Number(_)) => Ordering::Less,
            (SortKey::Number(_), SortKey::Text { .. }) => Ordering::Greater,
        }
    }
}

fn number_or_lowest(value: Option<f64>) -> SortKey {
    match value {
        Some(v) if !v.is_nan() => SortKey::Number(v),
        _ => SortKey::Number(f64::NEG_INFINITY),
    }
}

impl SortService {
    pub fn new() -> Self {
        Self {
            valuation: ValuationService::new(),
        }
    }

    /// Reorder `holdings` in place. Holdings themselves are not modified.
    pub fn sort(&self, holdings: &mut Vec<Holding>, state: SortState, snapshot: Option<&PriceSnapshot>) {
        let mut keyed: Vec<(SortKey, Holding)> = holdings
            .drain(..)
            .map(|h| (self.key(&h, state.column, snapshot), h))
            .collect();
        keyed.sort_unstable_by(|a, b| directed(a.0.compare(&b.0), state.direction));
        holdings.extend(keyed.into_iter().map(|(_, h)| h));
    }

    /// Sorted view over borrowed holdings.
    pub fn sorted<'a, I>(&self, holdings: I, state: SortState, snapshot: Option<&PriceSnapshot>) -> Vec<&'a Holding>
    where
        I: IntoIterator<Item = &'a Holding>,
    {
        let mut keyed: Vec<(SortKey, &Holding)> = holdings
            .into_iter()
            .map(|h| (self.key(h, state.column, snapshot), h))
            .collect();
        keyed.sort_unstable_by(|a, b| directed(a.0.compare(&b.0), state.direction));
        keyed.into_iter().map(|(_, h)| h).collect()
    }

    fn key(&self, holding: &Holding, column: SortColumn, snapshot: Option<&PriceSnapshot>) -> SortKey {
        match column {
            SortColumn::Name => SortKey::Text {
                folded: holding.name.to_lowercase(),
                original: holding.name.clone(),
            },
            SortColumn::PurchasePrice => number_or_lowest(Some(holding.purchase_price)),
            SortColumn::Quantity => SortKey::Number(holding.quantity as f64),
            SortColumn::Investment => number_or_lowest(holding.investment()),
            SortColumn::CurrentPrice
            | SortColumn::PriceAfterTax
            | SortColumn::ProfitLoss
            | SortColumn::ProfitLossPercent => {
                let valuation = self.valuation.value_holding(holding, snapshot);
                match column {
                    SortColumn::CurrentPrice => SortKey::Number(
                        valuation.current_price.map_or(MISSING_PRICE, |p| p as f64),
                    ),
                    SortColumn::PriceAfterTax => SortKey::Number(
                        valuation.price_after_tax.map_or(MISSING_PRICE, |p| p as f64),
                    ),
                    SortColumn::ProfitLoss => number_or_lowest(valuation.profit_loss),
                    _ => SortKey::Number(valuation.profit_loss_percent.sort_key()),
                }
            }
        }
    }
}

fn directed(ordering: Ordering, direction: SortDirection) -> Ordering {
    match direction {
        SortDirection::Asc => ordering,
        SortDirection::Desc => ordering.reverse(),
    }
}

impl Default for SortService {
    fn default() -> Self {
        Self::new()
    }
}
