use chrono::NaiveDate;

use crate::errors::CoreError;
use crate::models::holding::Holding;

pub const COL_ITEM_NAME: &str = "Item Name";
pub const COL_PURCHASE_PRICE: &str = "Purchase Price";
pub const COL_QUANTITY: &str = "Quantity";
pub const COL_TOTAL_INVESTMENT: &str = "Total Investment";

/// One data row of an imported CSV, as raw text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvRow {
    pub item_name: String,
    pub purchase_price: String,
    pub quantity: String,
}

/// A CSV row that passed numeric validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportRow {
    pub item_name: String,
    pub purchase_price: f64,
    pub quantity: u64,
}

impl CsvRow {
    /// Parse and validate the row. `None` when the name is blank, the price
    /// is not a positive number, or the quantity is not a positive integer.
    pub fn validate(&self) -> Option<ImportRow> {
        let item_name = self.item_name.trim();
        if item_name.is_empty() {
            return None;
        }
        let purchase_price = parse_price(&self.purchase_price)?;
        let quantity = parse_quantity(&self.quantity)?;
        Some(ImportRow {
            item_name: item_name.to_string(),
            purchase_price,
            quantity,
        })
    }
}

/// Parse a user-entered price: thousands separators allowed, must be finite and > 0.
pub fn parse_price(raw: &str) -> Option<f64> {
    let price: f64 = strip_separators(raw).parse().ok()?;
    (price.is_finite() && price > 0.0).then_some(price)
}

/// Parse a user-entered quantity: thousands separators allowed, fractional
/// part truncated, must be > 0.
pub fn parse_quantity(raw: &str) -> Option<u64> {
    let cleaned = strip_separators(raw);
    let quantity = match cleaned.parse::<u64>() {
        Ok(q) => q,
        Err(_) => {
            let q: f64 = cleaned.parse().ok()?;
            if !q.is_finite() || q < 1.0 {
                return None;
            }
            q.trunc() as u64
        }
    };
    (quantity > 0).then_some(quantity)
}

fn strip_separators(raw: &str) -> String {
    raw.trim().chars().filter(|c| *c != ',').collect()
}

/// CSV export and import of the holding collection.
///
/// Export columns: `Item Name,Purchase Price,Quantity,Total Investment`.
/// Import needs at least the first three, in any order.
pub struct CsvService;

impl CsvService {
    pub fn new() -> Self {
        Self
    }

    /// One header line plus one row per holding, `\n`-separated with no
    /// trailing newline.
    pub fn export(&self, holdings: &[Holding]) -> Result<String, CoreError> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record([COL_ITEM_NAME, COL_PURCHASE_PRICE, COL_QUANTITY, COL_TOTAL_INVESTMENT])
            .map_err(|e| CoreError::Serialization(e.to_string()))?;
        for holding in holdings {
            let investment = holding.purchase_price * holding.quantity as f64;
            writer
                .write_record([
                    holding.name.clone(),
                    holding.purchase_price.to_string(),
                    holding.quantity.to_string(),
                    investment.to_string(),
                ])
                .map_err(|e| CoreError::Serialization(e.to_string()))?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| CoreError::Serialization(e.to_string()))?;
        let mut text =
            String::from_utf8(bytes).map_err(|e| CoreError::Serialization(e.to_string()))?;
        if text.ends_with('\n') {
            text.pop();
        }
        Ok(text)
    }

    /// Suggested download name, e.g. `osrs-portfolio-2025-01-15.csv`.
    pub fn export_file_name(&self, date: NaiveDate) -> String {
        format!("osrs-portfolio-{}.csv", date.format("%Y-%m-%d"))
    }

    /// Split CSV text into raw rows.
    ///
    /// Fails when the header lacks a required column or the text is not
    /// well-formed CSV. Text with no data rows gives an empty list; blank
    /// lines are ignored.
    pub fn parse(&self, text: &str) -> Result<Vec<CsvRow>, CoreError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(Vec::new());
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(text.as_bytes());

        let headers = reader.headers()?.clone();
        let column = |name: &str| headers.iter().position(|h| h == name);
        let (Some(name_idx), Some(price_idx), Some(qty_idx)) = (
            column(COL_ITEM_NAME),
            column(COL_PURCHASE_PRICE),
            column(COL_QUANTITY),
        ) else {
            return Err(CoreError::InvalidCsv(format!(
                "header does not match expected format ({COL_ITEM_NAME}, {COL_PURCHASE_PRICE}, {COL_QUANTITY})"
            )));
        };

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            if record.iter().all(str::is_empty) {
                continue;
            }
            let field = |idx: usize| record.get(idx).unwrap_or("").to_string();
            rows.push(CsvRow {
                item_name: field(name_idx),
                purchase_price: field(price_idx),
                quantity: field(qty_idx),
            });
        }
        Ok(rows)
    }
}

impl Default for CsvService {
    fn default() -> Self {
        Self::new()
    }
}
