use std::sync::Arc;

use super::holding::Holding;
use super::price::PriceSnapshot;
use super::sort::SortState;

/// The aggregate root the UI renders from.
///
/// Holdings are kept in display order: after the first sort the order is
/// defined by `sort`, not by insertion.
#[derive(Debug, Clone, Default)]
pub struct PortfolioState {
    /// All tracked holdings, in display order
    pub holdings: Vec<Holding>,

    /// Active sort column and direction
    pub sort: SortState,

    /// Current search box text (raw, untrimmed)
    pub search_query: String,

    /// Snapshot the derived figures are computed from.
    /// `None` before the first refresh or after a failed one.
    pub snapshot: Option<Arc<PriceSnapshot>>,

    /// Set when the portfolio came from a shared link.
    /// All mutations are rejected and nothing is persisted.
    pub read_only: bool,
}

impl PortfolioState {
    pub fn with_holdings(holdings: Vec<Holding>) -> Self {
        Self {
            holdings,
            ..Self::default()
        }
    }

    pub fn snapshot(&self) -> Option<&PriceSnapshot> {
        self.snapshot.as_deref()
    }

    pub fn find(&self, unique_id: &str) -> Option<&Holding> {
        self.holdings.iter().find(|h| h.unique_id == unique_id)
    }

    pub fn find_mut(&mut self, unique_id: &str) -> Option<&mut Holding> {
        self.holdings.iter_mut().find(|h| h.unique_id == unique_id)
    }
}

/// Outcome of a CSV import. Bad rows are counted, never fatal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub imported: usize,
    pub skipped: usize,
}
