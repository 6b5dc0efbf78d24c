use crate::errors::CoreError;
use crate::models::catalog::ItemCatalog;
use crate::models::holding::Holding;
use crate::models::portfolio::{ImportReport, PortfolioState};
use crate::services::csv_service::CsvRow;

/// Manages the holding collection: add, edit, remove, bulk import.
///
/// Pure business logic: no I/O, no API calls. Every mutation is refused
/// with `CoreError::ReadOnly` while the portfolio is a shared view.
pub struct PortfolioService;

impl PortfolioService {
    pub fn new() -> Self {
        Self
    }

    /// Add a holding for a catalog item looked up by name.
    /// Returns the new holding's unique id.
    pub fn add_holding(
        &self,
        state: &mut PortfolioState,
        catalog: &ItemCatalog,
        name: &str,
        purchase_price: f64,
        quantity: u64,
    ) -> Result<String, CoreError> {
        Self::ensure_writable(state)?;
        if name.trim().is_empty() {
            return Err(CoreError::ValidationError(
                "Please enter a valid item name, purchase price, and quantity.".into(),
            ));
        }
        Self::validate_amounts(purchase_price, quantity)?;

        let entry = catalog
            .find_by_name(name)
            .ok_or_else(|| CoreError::UnknownItem(name.trim().to_string()))?;

        let holding = Holding::new(entry, purchase_price, quantity);
        let id = holding.unique_id.clone();
        state.holdings.push(holding);
        Ok(id)
    }

    /// Change the purchase price and quantity of an existing holding.
    pub fn update_holding(
        &self,
        state: &mut PortfolioState,
        unique_id: &str,
        purchase_price: f64,
        quantity: u64,
    ) -> Result<(), CoreError> {
        Self::ensure_writable(state)?;
        Self::validate_amounts(purchase_price, quantity)?;

        let holding = state
            .find_mut(unique_id)
            .ok_or_else(|| CoreError::HoldingNotFound(unique_id.to_string()))?;
        holding.purchase_price = purchase_price;
        holding.quantity = quantity;
        Ok(())
    }

    /// Remove a holding by its unique id and return it.
    pub fn remove_holding(
        &self,
        state: &mut PortfolioState,
        unique_id: &str,
    ) -> Result<Holding, CoreError> {
        Self::ensure_writable(state)?;
        let idx = state
            .holdings
            .iter()
            .position(|h| h.unique_id == unique_id)
            .ok_or_else(|| CoreError::HoldingNotFound(unique_id.to_string()))?;
        Ok(state.holdings.remove(idx))
    }

    /// Remove every holding. Returns how many were removed.
    pub fn clear(&self, state: &mut PortfolioState) -> Result<usize, CoreError> {
        Self::ensure_writable(state)?;
        let count = state.holdings.len();
        state.holdings.clear();
        Ok(count)
    }

    /// Add holdings from parsed CSV rows.
    ///
    /// A row is skipped (and counted) when it fails validation, names an
    /// unknown item, or repeats an existing holding with the same item and
    /// purchase price. One bad row never aborts the batch.
    pub fn import_rows(
        &self,
        state: &mut PortfolioState,
        catalog: &ItemCatalog,
        rows: &[CsvRow],
    ) -> Result<ImportReport, CoreError> {
        Self::ensure_writable(state)?;
        let mut report = ImportReport::default();

        for row in rows {
            let Some(valid) = row.validate() else {
                tracing::debug!(item = %row.item_name, "skipping invalid CSV row");
                report.skipped += 1;
                continue;
            };

            let Some(entry) = catalog.find_by_name(&valid.item_name) else {
                tracing::debug!(item = %valid.item_name, "skipping CSV row for unknown item");
                report.skipped += 1;
                continue;
            };

            let duplicate = state
                .holdings
                .iter()
                .any(|h| h.item_id == entry.id && h.purchase_price == valid.purchase_price);
            if duplicate {
                report.skipped += 1;
                continue;
            }

            state
                .holdings
                .push(Holding::new(entry, valid.purchase_price, valid.quantity));
            report.imported += 1;
        }

        Ok(report)
    }

    fn ensure_writable(state: &PortfolioState) -> Result<(), CoreError> {
        if state.read_only {
            return Err(CoreError::ReadOnly);
        }
        Ok(())
    }

    /// Rules: purchase price finite and positive, quantity positive.
    fn validate_amounts(purchase_price: f64, quantity: u64) -> Result<(), CoreError> {
        if !purchase_price.is_finite() || purchase_price <= 0.0 {
            return Err(CoreError::ValidationError(
                "Purchase price must be a positive number".into(),
            ));
        }
        if quantity == 0 {
            return Err(CoreError::ValidationError("Quantity must be positive".into()));
        }
        Ok(())
    }
}

impl Default for PortfolioService {
    fn default() -> Self {
        Self::new()
    }
}
