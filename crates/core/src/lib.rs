pub mod errors;
pub mod models;
pub mod providers;
pub mod services;
pub mod storage;

use chrono::NaiveDate;
use std::sync::Arc;

use errors::CoreError;
use models::{
    catalog::{CatalogEntry, ItemCatalog, ItemId},
    holding::Holding,
    portfolio::{ImportReport, PortfolioState},
    price::{PriceCache, PriceSnapshot},
    settings::Settings,
    sort::{SortColumn, SortState},
    valuation::{HoldingValuation, PortfolioStatistics},
};
use providers::traits::{IconSource, PriceFeed};
use providers::wiki::{self, WikiClient};
use services::{
    csv_service::CsvService, image_cache::ImageCache, portfolio_service::PortfolioService,
    price_service::PriceService, search_service::SearchService, share_codec::ShareCodec,
    sort_service::SortService, valuation_service::ValuationService,
};
use storage::manager::StorageManager;
use storage::store::KeyValueStore;

/// Maximum number of autocomplete suggestions.
pub const SUGGESTION_LIMIT: usize = 10;

/// Main entry point for the merch tracker core library.
/// Holds the portfolio state, both caches, and all services needed to operate on them.
#[must_use]
pub struct MerchTracker {
    state: PortfolioState,
    catalog: ItemCatalog,
    price_cache: PriceCache,
    settings: Settings,
    store: Arc<dyn KeyValueStore>,
    image_cache: ImageCache,
    price_service: PriceService,
    portfolio_service: PortfolioService,
    valuation_service: ValuationService,
    sort_service: SortService,
    search_service: SearchService,
    csv_service: CsvService,
}

impl std::fmt::Debug for MerchTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MerchTracker")
            .field("holdings", &self.state.holdings.len())
            .field("sort", &self.state.sort)
            .field("read_only", &self.state.read_only)
            .field("catalog_items", &self.catalog.len())
            .field("has_prices", &self.state.snapshot.is_some())
            .finish()
    }
}

impl MerchTracker {
    /// Build a tracker around an already-loaded catalog and load the
    /// locally persisted holdings (none saved yet is an empty portfolio).
    pub fn new(
        catalog: ItemCatalog,
        feed: Arc<dyn PriceFeed>,
        icons: Arc<dyn IconSource>,
        store: Arc<dyn KeyValueStore>,
        settings: Settings,
    ) -> Result<Self, CoreError> {
        let holdings = StorageManager::load_holdings(store.as_ref(), &settings.storage_key)?;
        let image_cache = ImageCache::new(
            Arc::clone(&store),
            icons,
            settings.icon_key_prefix.clone(),
            settings.max_icon_bytes,
        );

        let mut tracker = Self {
            state: PortfolioState::with_holdings(holdings),
            catalog,
            price_cache: PriceCache::new(),
            settings,
            store,
            image_cache,
            price_service: PriceService::new(feed),
            portfolio_service: PortfolioService::new(),
            valuation_service: ValuationService::new(),
            sort_service: SortService::new(),
            search_service: SearchService::new(),
            csv_service: CsvService::new(),
        };
        tracker.resort();
        Ok(tracker)
    }

    /// Load the item catalog from the feed, then the persisted holdings.
    /// Without a catalog nothing can be added or resolved, so a failed
    /// mapping fetch is fatal.
    pub async fn connect(
        settings: Settings,
        feed: Arc<dyn PriceFeed>,
        icons: Arc<dyn IconSource>,
        store: Arc<dyn KeyValueStore>,
    ) -> Result<Self, CoreError> {
        let catalog = PriceService::new(Arc::clone(&feed)).load_catalog().await?;
        Self::new(catalog, feed, icons, store, settings)
    }

    /// `connect` against the OSRS Wiki prices API and image host.
    pub async fn connect_wiki(
        settings: Settings,
        store: Arc<dyn KeyValueStore>,
    ) -> Result<Self, CoreError> {
        let client = Arc::new(WikiClient::new(&settings)?);
        Self::connect(settings, client.clone(), client, store).await
    }

    // ── Shared Portfolios ───────────────────────────────────────────

    /// Replace the holdings with the ones in a share token and switch to
    /// read-only mode. Returns the number of holdings loaded.
    ///
    /// On a malformed token the local persisted holdings are (re)loaded
    /// and the error is returned so the caller can report it once.
    pub fn load_shared(&mut self, token: &str) -> Result<usize, CoreError> {
        match ShareCodec::decode(token, &self.catalog) {
            Ok(holdings) => {
                let count = holdings.len();
                self.state.holdings = holdings;
                self.state.read_only = true;
                self.resort();
                self.schedule_icons();
                tracing::info!(count, "loaded shared portfolio");
                Ok(count)
            }
            Err(e) => {
                tracing::warn!(error = %e, "could not load shared portfolio, using local data");
                if let Err(load_err) = self.reload_local() {
                    tracing::error!(error = %load_err, "could not reload local holdings");
                }
                Err(e)
            }
        }
    }

    /// Share token for the current holdings.
    pub fn share_token(&self) -> Result<String, CoreError> {
        if self.state.holdings.is_empty() {
            return Err(CoreError::EmptyPortfolio);
        }
        ShareCodec::encode(&self.state.holdings)
    }

    /// Full share link: `{base_url}?shared={token}`.
    pub fn share_link(&self, base_url: &str) -> Result<String, CoreError> {
        Ok(format!("{base_url}?shared={}", self.share_token()?))
    }

    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.state.read_only
    }

    // ── Holding Management ──────────────────────────────────────────

    /// Add a holding for the catalog item called `name`.
    /// Returns the new holding's unique id.
    pub fn add_item(
        &mut self,
        name: &str,
        purchase_price: f64,
        quantity: u64,
    ) -> Result<String, CoreError> {
        let id = self.portfolio_service.add_holding(
            &mut self.state,
            &self.catalog,
            name,
            purchase_price,
            quantity,
        )?;
        self.resort();
        self.persist()?;
        if let Some(holding) = self.state.find(&id) {
            self.image_cache.ensure(&holding.icon);
        }
        Ok(id)
    }

    /// Change a holding's purchase price and quantity.
    pub fn update_item(
        &mut self,
        unique_id: &str,
        purchase_price: f64,
        quantity: u64,
    ) -> Result<(), CoreError> {
        self.portfolio_service
            .update_holding(&mut self.state, unique_id, purchase_price, quantity)?;
        self.resort();
        self.persist()
    }

    /// Delete a holding and return it.
    pub fn remove_item(&mut self, unique_id: &str) -> Result<Holding, CoreError> {
        let removed = self.portfolio_service.remove_holding(&mut self.state, unique_id)?;
        self.persist()?;
        Ok(removed)
    }

    /// Delete every holding. Returns how many were deleted.
    pub fn clear_all(&mut self) -> Result<usize, CoreError> {
        let count = self.portfolio_service.clear(&mut self.state)?;
        self.persist()?;
        Ok(count)
    }

    #[must_use]
    pub fn holding(&self, unique_id: &str) -> Option<&Holding> {
        self.state.find(unique_id)
    }

    /// All holdings in display order.
    #[must_use]
    pub fn holdings(&self) -> &[Holding] {
        &self.state.holdings
    }

    // ── Prices ──────────────────────────────────────────────────────

    /// Bring prices up to date and re-sort.
    ///
    /// Uses the cached snapshot unless there is none or `force` is set. If
    /// the feed fails, every holding falls back to "no current price" and
    /// the error is returned for a transient notice.
    pub async fn refresh_prices(&mut self, force: bool) -> Result<(), CoreError> {
        let outcome = match self.price_service.latest(&mut self.price_cache, force).await {
            Ok(snapshot) => {
                self.state.snapshot = Some(snapshot);
                Ok(())
            }
            Err(e) => {
                self.state.snapshot = None;
                Err(e)
            }
        };
        self.resort();
        self.schedule_icons();
        outcome
    }

    /// Snapshot the current figures are computed from.
    #[must_use]
    pub fn snapshot(&self) -> Option<&PriceSnapshot> {
        self.state.snapshot()
    }

    // ── Sorting & Search ────────────────────────────────────────────

    /// Select a table column: the active column flips direction, another
    /// column becomes active in ascending order. Returns the new state.
    pub fn select_sort(&mut self, column: SortColumn) -> SortState {
        let sort = self.state.sort.select(column);
        self.resort();
        sort
    }

    #[must_use]
    pub fn sort_state(&self) -> SortState {
        self.state.sort
    }

    pub fn set_search(&mut self, query: impl Into<String>) {
        self.state.search_query = query.into();
    }

    #[must_use]
    pub fn search_query(&self) -> &str {
        &self.state.search_query
    }

    /// Holdings matching the search box, in display order.
    #[must_use]
    pub fn visible_holdings(&self) -> Vec<&Holding> {
        self.search_service
            .filter(&self.state.holdings, &self.state.search_query)
    }

    // ── Valuation ───────────────────────────────────────────────────

    /// Figures for each visible holding against the latest snapshot.
    #[must_use]
    pub fn valuations(&self) -> Vec<HoldingValuation> {
        let snapshot = self.state.snapshot();
        self.visible_holdings()
            .into_iter()
            .map(|h| self.valuation_service.value_holding(h, snapshot))
            .collect()
    }

    #[must_use]
    pub fn valuation(&self, unique_id: &str) -> Option<HoldingValuation> {
        self.state
            .find(unique_id)
            .map(|h| self.valuation_service.value_holding(h, self.state.snapshot()))
    }

    /// Totals over the visible holdings.
    #[must_use]
    pub fn statistics(&self) -> PortfolioStatistics {
        self.valuation_service
            .summarize(self.visible_holdings(), self.state.snapshot())
    }

    // ── Export / Import ─────────────────────────────────────────────

    /// All holdings as CSV.
    pub fn export_csv(&self) -> Result<String, CoreError> {
        if self.state.holdings.is_empty() {
            return Err(CoreError::EmptyPortfolio);
        }
        self.csv_service.export(&self.state.holdings)
    }

    #[must_use]
    pub fn export_file_name(&self, date: NaiveDate) -> String {
        self.csv_service.export_file_name(date)
    }

    /// Import holdings from CSV text. Bad rows are skipped and counted;
    /// only an unusable header fails the whole import.
    pub fn import_csv(&mut self, text: &str) -> Result<ImportReport, CoreError> {
        let rows = self.csv_service.parse(text)?;
        let report = self
            .portfolio_service
            .import_rows(&mut self.state, &self.catalog, &rows)?;
        tracing::info!(imported = report.imported, skipped = report.skipped, "CSV import finished");

        if report.imported > 0 {
            self.resort();
            self.persist()?;
            self.schedule_icons();
        }
        Ok(report)
    }

    // ── Catalog ─────────────────────────────────────────────────────

    #[must_use]
    pub fn catalog(&self) -> &ItemCatalog {
        &self.catalog
    }

    /// Autocomplete suggestions for the add-item name box.
    #[must_use]
    pub fn suggest(&self, query: &str) -> Vec<&CatalogEntry> {
        self.catalog.suggest(query, SUGGESTION_LIMIT)
    }

    #[must_use]
    pub fn price_page_url(&self, item_id: ItemId) -> String {
        wiki::price_page_url(item_id)
    }

    #[must_use]
    pub fn wiki_page_url(&self, item_id: ItemId) -> String {
        wiki::wiki_page_url(item_id)
    }

    // ── Icons ───────────────────────────────────────────────────────

    /// Cached icon bytes, if already downloaded. Never waits on the network.
    #[must_use]
    pub fn icon(&self, icon_key: &str) -> Option<Vec<u8>> {
        self.image_cache.try_get(icon_key)
    }

    /// Wait for every icon download scheduled so far.
    pub async fn settle_icons(&self) {
        self.image_cache.settle().await;
    }

    #[must_use]
    pub fn image_cache(&self) -> &ImageCache {
        &self.image_cache
    }

    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    // ── Internal ────────────────────────────────────────────────────

    fn resort(&mut self) {
        self.sort_service.sort(
            &mut self.state.holdings,
            self.state.sort,
            self.state.snapshot.as_deref(),
        );
    }

    /// Write the holdings to the store. A no-op in read-only mode.
    fn persist(&self) -> Result<(), CoreError> {
        if self.state.read_only {
            return Ok(());
        }
        StorageManager::save_holdings(
            self.store.as_ref(),
            &self.settings.storage_key,
            &self.state.holdings,
        )
    }

    fn reload_local(&mut self) -> Result<(), CoreError> {
        self.state.read_only = false;
        self.state.holdings =
            StorageManager::load_holdings(self.store.as_ref(), &self.settings.storage_key)?;
        self.resort();
        Ok(())
    }

    fn schedule_icons(&self) {
        self.image_cache
            .ensure_all(self.state.holdings.iter().map(|h| h.icon.as_str()));
    }
}
