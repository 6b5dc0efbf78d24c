use crate::models::holding::Holding;
use crate::models::price::PriceSnapshot;
use crate::models::valuation::{HoldingValuation, PortfolioStatistics, ProfitPercent};
use crate::services::price_service::resolve_price;
use crate::services::tax_model::price_after_tax;

/// Derives value and profit figures from holdings and a price snapshot.
///
/// Pure business logic: nothing is cached or stored, every call recomputes
/// from its inputs. Missing prices propagate as `None`/`Unavailable`, never
/// as zero.
pub struct ValuationService;

impl ValuationService {
    pub fn new() -> Self {
        Self
    }

    /// Figures for one holding.
    pub fn value_holding(
        &self,
        holding: &Holding,
        snapshot: Option<&PriceSnapshot>,
    ) -> HoldingValuation {
        let investment = holding.investment();
        let current_price = resolve_price(snapshot, holding.item_id);
        let price_after_tax = price_after_tax(current_price.map(|p| p as f64));
        let sale_value_after_tax = price_after_tax.map(|p| p as f64 * holding.quantity as f64);

        let profit_loss = match (sale_value_after_tax, investment) {
            (Some(sale), Some(investment)) => Some(sale - investment),
            _ => None,
        };

        let profit_loss_percent = match (profit_loss, investment, sale_value_after_tax) {
            (Some(profit), Some(investment), _) if investment != 0.0 => {
                ProfitPercent::Value(profit / investment * 100.0)
            }
            (Some(_), Some(_), Some(sale)) if sale > 0.0 => ProfitPercent::Infinite,
            _ => ProfitPercent::Unavailable,
        };

        HoldingValuation {
            unique_id: holding.unique_id.clone(),
            item_id: holding.item_id,
            investment,
            current_price,
            price_after_tax,
            sale_value_after_tax,
            profit_loss,
            profit_loss_percent,
        }
    }

    /// Portfolio totals.
    ///
    /// - Investment is summed over every holding.
    /// - Current value uses the pre-tax price; a holding without a price
    ///   counts at its own investment so it does not show as a loss.
    /// - Profit/loss is after tax and covers priced holdings only.
    pub fn summarize<'a, I>(&self, holdings: I, snapshot: Option<&PriceSnapshot>) -> PortfolioStatistics
    where
        I: IntoIterator<Item = &'a Holding>,
    {
        let mut item_count = 0;
        let mut priced_count = 0;
        let mut total_investment = 0.0;
        let mut total_current_value = 0.0;
        let mut total_profit_loss = 0.0;

        for holding in holdings {
            item_count += 1;
            let Some(investment) = holding.investment() else {
                tracing::warn!(unique_id = %holding.unique_id, "holding has no valid investment, leaving it out of totals");
                continue;
            };
            total_investment += investment;

            let quantity = holding.quantity as f64;
            match resolve_price(snapshot, holding.item_id) {
                Some(price) => {
                    priced_count += 1;
                    total_current_value += price as f64 * quantity;
                    if let Some(after_tax) = price_after_tax(Some(price as f64)) {
                        total_profit_loss += after_tax as f64 * quantity - investment;
                    }
                }
                None => total_current_value += investment,
            }
        }

        let profit_loss_percent = if total_investment != 0.0 {
            ProfitPercent::Value(total_profit_loss / total_investment * 100.0)
        } else {
            ProfitPercent::Unavailable
        };

        PortfolioStatistics {
            item_count,
            priced_count,
            total_investment,
            total_current_value,
            total_profit_loss,
            profit_loss_percent,
        }
    }
}

impl Default for ValuationService {
    fn default() -> Self {
        Self::new()
    }
}
