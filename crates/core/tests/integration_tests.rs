// ═══════════════════════════════════════════════════════════════════
// Integration Tests — MerchTracker end to end with mock feed and icons
// ═══════════════════════════════════════════════════════════════════

use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use merch_tracker_core::errors::CoreError;
use merch_tracker_core::models::catalog::{CatalogEntry, ItemCatalog};
use merch_tracker_core::models::price::{PriceQuote, PriceSnapshot};
use merch_tracker_core::models::settings::Settings;
use merch_tracker_core::models::sort::{SortColumn, SortDirection};
use merch_tracker_core::models::valuation::{Emphasis, ProfitPercent};
use merch_tracker_core::providers::traits::{IconSource, PriceFeed};
use merch_tracker_core::services::image_cache::ImageCache;
use merch_tracker_core::storage::store::{KeyValueStore, MemoryStore};
use merch_tracker_core::{MerchTracker, SUGGESTION_LIMIT};

const RING: u32 = 1635;
const AMULET: u32 = 1692;
const STORAGE_KEY: &str = "osrsMerchItems";

// ═══════════════════════════════════════════════════════════════════
// Test Helpers — Mock Feed & Icon Source
// ═══════════════════════════════════════════════════════════════════

fn entries() -> Vec<CatalogEntry> {
    let mut entries = vec![
        CatalogEntry::new(RING, "Ring", "Ring.png"),
        CatalogEntry::new(AMULET, "Amulet", "Amulet.png"),
    ];
    for i in 0..15 {
        entries.push(CatalogEntry::new(2000 + i, format!("Rune item {i}"), format!("Rune item {i}.png")));
    }
    entries
}

/// Price feed with adjustable prices, an outage switch, and call counting.
struct MockFeed {
    prices: Mutex<Vec<(u32, i64)>>,
    down: AtomicBool,
    latest_calls: AtomicUsize,
}

impl MockFeed {
    fn new(prices: &[(u32, i64)]) -> Self {
        Self {
            prices: Mutex::new(prices.to_vec()),
            down: AtomicBool::new(false),
            latest_calls: AtomicUsize::new(0),
        }
    }

    fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    fn set_prices(&self, prices: &[(u32, i64)]) {
        *self.prices.lock().unwrap() = prices.to_vec();
    }

    fn calls(&self) -> usize {
        self.latest_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PriceFeed for MockFeed {
    fn name(&self) -> &str {
        "Mock"
    }

    async fn fetch_latest(&self) -> Result<PriceSnapshot, CoreError> {
        self.latest_calls.fetch_add(1, Ordering::SeqCst);
        if self.down.load(Ordering::SeqCst) {
            return Err(CoreError::Api {
                provider: "Mock".into(),
                message: "API request failed: 503 Service Unavailable".into(),
            });
        }
        Ok(self
            .prices
            .lock()
            .unwrap()
            .iter()
            .map(|&(id, p)| (id, PriceQuote::new(Some(p), Some(p))))
            .collect())
    }

    async fn fetch_mapping(&self) -> Result<Vec<CatalogEntry>, CoreError> {
        if self.down.load(Ordering::SeqCst) {
            return Err(CoreError::Network("connection refused".into()));
        }
        Ok(entries())
    }
}

/// Icon source returning `size` bytes for any key.
struct MockIcons {
    size: usize,
    fail: bool,
    calls: AtomicUsize,
}

impl MockIcons {
    fn new(size: usize) -> Self {
        Self { size, fail: false, calls: AtomicUsize::new(0) }
    }

    fn failing() -> Self {
        Self { size: 0, fail: true, calls: AtomicUsize::new(0) }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IconSource for MockIcons {
    async fn fetch_icon(&self, _icon_key: &str) -> Result<Vec<u8>, CoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(CoreError::Network("timed out".into()));
        }
        Ok(vec![0x42; self.size])
    }
}

struct Harness {
    feed: Arc<MockFeed>,
    icons: Arc<MockIcons>,
    store: Arc<MemoryStore>,
}

impl Harness {
    fn new() -> Self {
        Self::with_icons(MockIcons::new(512))
    }

    fn with_icons(icons: MockIcons) -> Self {
        Self {
            feed: Arc::new(MockFeed::new(&[(RING, 150)])),
            icons: Arc::new(icons),
            store: Arc::new(MemoryStore::new()),
        }
    }

    async fn tracker(&self) -> MerchTracker {
        MerchTracker::connect(
            Settings::default(),
            self.feed.clone(),
            self.icons.clone(),
            self.store.clone(),
        )
        .await
        .unwrap()
    }

    fn persisted(&self) -> Option<Vec<u8>> {
        self.store.get(STORAGE_KEY).unwrap()
    }
}

/// Ring: 10 bought at 100, priced at 150. Amulet: 5 bought at 50, never traded.
async fn ring_and_amulet(h: &Harness) -> MerchTracker {
    let mut tracker = h.tracker().await;
    tracker.add_item("Ring", 100.0, 10).unwrap();
    tracker.add_item("amulet", 50.0, 5).unwrap();
    tracker
}

fn names(tracker: &MerchTracker) -> Vec<&str> {
    tracker.holdings().iter().map(|h| h.name.as_str()).collect()
}

// ═══════════════════════════════════════════════════════════════════
//  Startup & persistence
// ═══════════════════════════════════════════════════════════════════

mod startup {
    use super::*;

    #[tokio::test]
    async fn fresh_store_gives_empty_portfolio() {
        let h = Harness::new();
        let tracker = h.tracker().await;
        assert!(tracker.holdings().is_empty());
        assert_eq!(tracker.catalog().len(), 17);
        assert!(!tracker.is_read_only());
        assert!(tracker.snapshot().is_none());
    }

    #[tokio::test]
    async fn catalog_failure_is_fatal() {
        let h = Harness::new();
        h.feed.set_down(true);
        let result = MerchTracker::connect(
            Settings::default(),
            h.feed.clone(),
            h.icons.clone(),
            h.store.clone(),
        )
        .await;
        assert!(matches!(result, Err(CoreError::Network(_))));
    }

    #[tokio::test]
    async fn holdings_survive_restart() {
        let h = Harness::new();
        {
            let tracker = ring_and_amulet(&h).await;
            tracker.settle_icons().await;
        }
        let tracker = h.tracker().await;
        assert_eq!(tracker.holdings().len(), 2);
        assert!(tracker.holdings().iter().any(|x| x.item_id == AMULET && x.quantity == 5));
    }

    #[tokio::test]
    async fn corrupt_saved_data_is_reported() {
        let h = Harness::new();
        h.store.put(STORAGE_KEY, b"not json").unwrap();
        let result = MerchTracker::connect(
            Settings::default(),
            h.feed.clone(),
            h.icons.clone(),
            h.store.clone(),
        )
        .await;
        assert!(matches!(result, Err(CoreError::Deserialization(_))));
    }

    #[test]
    fn new_with_preloaded_catalog() {
        let h = Harness::new();
        let tracker = MerchTracker::new(
            ItemCatalog::from_entries(entries()),
            h.feed.clone(),
            h.icons.clone(),
            h.store.clone(),
            Settings::default(),
        )
        .unwrap();
        assert!(tracker.catalog().find_by_id(RING).is_some());
        assert_eq!(h.feed.calls(), 0);
    }
}

// ═══════════════════════════════════════════════════════════════════
//  Holding management
// ═══════════════════════════════════════════════════════════════════

mod holdings {
    use super::*;

    #[tokio::test]
    async fn add_persists() {
        let h = Harness::new();
        let mut tracker = h.tracker().await;
        let id = tracker.add_item("  ring ", 100.0, 10).unwrap();

        assert_eq!(tracker.holding(&id).unwrap().name, "Ring");
        let saved: serde_json::Value = serde_json::from_slice(&h.persisted().unwrap()).unwrap();
        assert_eq!(saved[0]["uniqueId"], id.as_str());
        assert_eq!(saved[0]["id"], RING);
    }

    #[tokio::test]
    async fn add_unknown_item_changes_nothing() {
        let h = Harness::new();
        let mut tracker = h.tracker().await;
        let err = tracker.add_item("Twisted bow", 1.0, 1).unwrap_err();
        assert!(matches!(err, CoreError::UnknownItem(ref name) if name == "Twisted bow"));
        assert!(tracker.holdings().is_empty());
        assert!(h.persisted().is_none());
    }

    #[tokio::test]
    async fn update_and_remove_persist() {
        let h = Harness::new();
        let mut tracker = ring_and_amulet(&h).await;
        let ring_id = tracker.holdings().iter().find(|x| x.item_id == RING).unwrap().unique_id.clone();

        tracker.update_item(&ring_id, 120.0, 3).unwrap();
        assert_eq!(tracker.holding(&ring_id).unwrap().quantity, 3);

        let removed = tracker.remove_item(&ring_id).unwrap();
        assert_eq!(removed.purchase_price, 120.0);
        assert!(tracker.holding(&ring_id).is_none());

        let reloaded = h.tracker().await;
        assert_eq!(reloaded.holdings().len(), 1);
        assert_eq!(reloaded.holdings()[0].item_id, AMULET);
    }

    #[tokio::test]
    async fn clear_all() {
        let h = Harness::new();
        let mut tracker = ring_and_amulet(&h).await;
        assert_eq!(tracker.clear_all().unwrap(), 2);
        assert!(tracker.holdings().is_empty());
        assert_eq!(h.persisted().unwrap(), b"[]");
    }

    #[tokio::test]
    async fn suggestions_are_limited() {
        let h = Harness::new();
        let tracker = h.tracker().await;
        assert_eq!(tracker.suggest("rune").len(), SUGGESTION_LIMIT);
        assert_eq!(tracker.suggest("amu")[0].id, AMULET);
        assert!(tracker.suggest("").is_empty());
    }

    #[tokio::test]
    async fn item_links() {
        let h = Harness::new();
        let tracker = h.tracker().await;
        assert_eq!(tracker.price_page_url(RING), "https://prices.runescape.wiki/osrs/item/1635");
        assert!(tracker.wiki_page_url(RING).ends_with("Special:Lookup?type=item&id=1635"));
    }
}

// ═══════════════════════════════════════════════════════════════════
//  Prices, valuation & sorting
// ═══════════════════════════════════════════════════════════════════

mod prices {
    use super::*;

    #[tokio::test]
    async fn refresh_values_and_sorts() {
        let h = Harness::new();
        let mut tracker = ring_and_amulet(&h).await;
        tracker.refresh_prices(false).await.unwrap();

        // Default sort is profit/loss descending: the unpriced Amulet sinks.
        assert_eq!(names(&tracker), vec!["Ring", "Amulet"]);

        let valuations = tracker.valuations();
        assert_eq!(valuations[0].profit_loss, Some(470.0));
        assert_eq!(valuations[0].emphasis(), Emphasis::Hot);
        assert_eq!(valuations[1].current_price, None);
        assert_eq!(valuations[1].profit_loss_percent, ProfitPercent::Unavailable);

        let stats = tracker.statistics();
        assert_eq!(stats.total_investment, 1250.0);
        assert_eq!(stats.total_current_value, 1750.0);
        assert_eq!(stats.total_profit_loss, 470.0);
    }

    #[tokio::test]
    async fn cached_snapshot_is_reused_unless_forced() {
        let h = Harness::new();
        let mut tracker = ring_and_amulet(&h).await;

        tracker.refresh_prices(false).await.unwrap();
        tracker.refresh_prices(false).await.unwrap();
        assert_eq!(h.feed.calls(), 1);

        h.feed.set_prices(&[(RING, 90)]);
        tracker.refresh_prices(false).await.unwrap();
        assert_eq!(tracker.snapshot().unwrap().resolve(RING), Some(150));

        tracker.refresh_prices(true).await.unwrap();
        assert_eq!(h.feed.calls(), 2);
        assert_eq!(tracker.snapshot().unwrap().resolve(RING), Some(90));
    }

    #[tokio::test]
    async fn failed_refresh_falls_back_to_no_prices() {
        let h = Harness::new();
        let mut tracker = ring_and_amulet(&h).await;
        tracker.refresh_prices(false).await.unwrap();

        h.feed.set_down(true);
        let err = tracker.refresh_prices(true).await.unwrap_err();
        assert!(err.is_feed_unavailable());
        assert!(tracker.snapshot().is_none());

        let stats = tracker.statistics();
        assert_eq!(stats.priced_count, 0);
        assert_eq!(stats.total_current_value, stats.total_investment);
        assert!(tracker.valuations().iter().all(|v| v.profit_loss.is_none()));

        // The failure left nothing cached, so a plain refresh retries.
        h.feed.set_down(false);
        tracker.refresh_prices(false).await.unwrap();
        assert_eq!(tracker.snapshot().unwrap().resolve(RING), Some(150));
    }

    #[tokio::test]
    async fn header_clicks_flip_and_switch() {
        let h = Harness::new();
        let mut tracker = ring_and_amulet(&h).await;
        tracker.refresh_prices(false).await.unwrap();

        let state = tracker.select_sort(SortColumn::ProfitLoss);
        assert_eq!(state.direction, SortDirection::Asc);
        assert_eq!(names(&tracker), vec!["Amulet", "Ring"]);

        let state = tracker.select_sort(SortColumn::Name);
        assert_eq!((state.column, state.direction), (SortColumn::Name, SortDirection::Asc));
        assert_eq!(names(&tracker), vec!["Amulet", "Ring"]);

        tracker.select_sort(SortColumn::Name);
        assert_eq!(names(&tracker), vec!["Ring", "Amulet"]);
        assert_eq!(tracker.sort_state().direction, SortDirection::Desc);
    }

    #[tokio::test]
    async fn persisted_order_follows_display_order() {
        let h = Harness::new();
        let mut tracker = ring_and_amulet(&h).await;
        tracker.select_sort(SortColumn::Name);
        tracker.add_item("Rune item 3", 5.0, 1).unwrap();

        let saved: Vec<serde_json::Value> = serde_json::from_slice(&h.persisted().unwrap()).unwrap();
        let saved_names: Vec<&str> = saved.iter().map(|v| v["name"].as_str().unwrap()).collect();
        assert_eq!(saved_names, names(&tracker));
        assert_eq!(saved_names, vec!["Amulet", "Ring", "Rune item 3"]);
    }

    #[tokio::test]
    async fn search_narrows_statistics() {
        let h = Harness::new();
        let mut tracker = ring_and_amulet(&h).await;
        tracker.refresh_prices(false).await.unwrap();

        tracker.set_search("RIN");
        assert_eq!(tracker.search_query(), "RIN");
        assert_eq!(tracker.visible_holdings().len(), 1);
        assert_eq!(tracker.valuations().len(), 1);

        let stats = tracker.statistics();
        assert_eq!(stats.item_count, 1);
        assert_eq!(stats.total_investment, 1000.0);

        tracker.set_search("");
        assert_eq!(tracker.statistics().item_count, 2);
        // Searching never reorders or drops holdings.
        assert_eq!(tracker.holdings().len(), 2);
    }

    #[tokio::test]
    async fn single_valuation_ignores_search() {
        let h = Harness::new();
        let mut tracker = ring_and_amulet(&h).await;
        tracker.refresh_prices(false).await.unwrap();
        tracker.set_search("amulet");

        let ring_id = tracker.holdings()[0].unique_id.clone();
        assert_eq!(tracker.valuation(&ring_id).unwrap().price_after_tax, Some(147));
        assert!(tracker.valuation("missing").is_none());
    }
}

// ═══════════════════════════════════════════════════════════════════
//  Shared portfolios
// ═══════════════════════════════════════════════════════════════════

mod sharing {
    use super::*;

    #[tokio::test]
    async fn shared_link_opens_read_only_copy() {
        let owner = Harness::new();
        let tracker = ring_and_amulet(&owner).await;
        let link = tracker.share_link("https://merch.example/").unwrap();
        let token = link.split("?shared=").nth(1).unwrap().to_string();
        assert!(link.starts_with("https://merch.example/?shared="));

        let viewer = Harness::new();
        let mut shared = viewer.tracker().await;
        assert_eq!(shared.load_shared(&token).unwrap(), 2);
        assert!(shared.is_read_only());
        assert!(shared.holdings().iter().all(|x| x.unique_id.starts_with("shared-")));

        // Read-only: every mutation is refused and nothing is written.
        assert!(matches!(shared.add_item("Ring", 1.0, 1), Err(CoreError::ReadOnly)));
        let id = shared.holdings()[0].unique_id.clone();
        assert!(matches!(shared.update_item(&id, 1.0, 1), Err(CoreError::ReadOnly)));
        assert!(matches!(shared.remove_item(&id), Err(CoreError::ReadOnly)));
        assert!(matches!(shared.clear_all(), Err(CoreError::ReadOnly)));
        assert!(matches!(
            shared.import_csv("Item Name,Purchase Price,Quantity\nRing,1,1"),
            Err(CoreError::ReadOnly)
        ));
        assert!(viewer.persisted().is_none());

        // Viewing still works: prices, sorting, statistics.
        shared.refresh_prices(false).await.unwrap();
        assert_eq!(names(&shared), vec!["Ring", "Amulet"]);
        assert_eq!(shared.statistics().total_profit_loss, 470.0);
    }

    #[tokio::test]
    async fn malformed_token_falls_back_to_local_data() {
        let h = Harness::new();
        let mut tracker = h.tracker().await;
        tracker.add_item("Ring", 100.0, 10).unwrap();

        let err = tracker.load_shared("%%% definitely not a token %%%").unwrap_err();
        assert!(matches!(err, CoreError::MalformedShareToken(_)));
        assert!(!tracker.is_read_only());
        assert_eq!(names(&tracker), vec!["Ring"]);
    }

    #[tokio::test]
    async fn bad_link_after_shared_view_restores_local() {
        let owner = Harness::new();
        let token = ring_and_amulet(&owner).await.share_token().unwrap();

        let h = Harness::new();
        let mut tracker = h.tracker().await;
        tracker.add_item("Rune item 1", 10.0, 1).unwrap();
        tracker.load_shared(&token).unwrap();
        assert_eq!(tracker.holdings().len(), 2);

        assert!(tracker.load_shared("").is_err());
        assert!(!tracker.is_read_only());
        assert_eq!(names(&tracker), vec!["Rune item 1"]);
    }

    #[tokio::test]
    async fn empty_portfolio_cannot_be_shared() {
        let h = Harness::new();
        let tracker = h.tracker().await;
        assert!(matches!(tracker.share_token(), Err(CoreError::EmptyPortfolio)));
    }
}

// ═══════════════════════════════════════════════════════════════════
//  CSV export / import
// ═══════════════════════════════════════════════════════════════════

mod csv {
    use super::*;

    #[tokio::test]
    async fn export_then_import_elsewhere() {
        let owner = Harness::new();
        let csv = ring_and_amulet(&owner).await.export_csv().unwrap();

        let h = Harness::new();
        let mut tracker = h.tracker().await;
        let report = tracker.import_csv(&csv).unwrap();
        assert_eq!((report.imported, report.skipped), (2, 0));
        assert!(h.persisted().is_some());

        // Same file again: every row is a duplicate.
        let report = tracker.import_csv(&csv).unwrap();
        assert_eq!((report.imported, report.skipped), (0, 2));
        assert_eq!(tracker.holdings().len(), 2);
    }

    #[tokio::test]
    async fn import_skips_bad_rows() {
        let h = Harness::new();
        let mut tracker = h.tracker().await;
        let text = "Item Name,Purchase Price,Quantity\n\
                    Ring,\"1,000\",2\n\
                    Twisted bow,1,1\n\
                    Amulet,abc,1\n\
                    Amulet,50,0\n";
        let report = tracker.import_csv(text).unwrap();
        assert_eq!((report.imported, report.skipped), (1, 3));
        assert_eq!(tracker.holdings()[0].purchase_price, 1000.0);
    }

    #[tokio::test]
    async fn import_rejects_unknown_layout() {
        let h = Harness::new();
        let mut tracker = h.tracker().await;
        let err = tracker.import_csv("Name;Price;Qty\nRing;1;1").unwrap_err();
        assert!(matches!(err, CoreError::InvalidCsv(_)));
        assert!(h.persisted().is_none());
    }

    #[tokio::test]
    async fn nothing_to_export() {
        let h = Harness::new();
        let tracker = h.tracker().await;
        assert!(matches!(tracker.export_csv(), Err(CoreError::EmptyPortfolio)));
        let date = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        assert_eq!(tracker.export_file_name(date), "osrs-portfolio-2024-12-31.csv");
    }
}

// ═══════════════════════════════════════════════════════════════════
//  Icon cache
// ═══════════════════════════════════════════════════════════════════

mod icons {
    use super::*;

    fn cache(icons: Arc<MockIcons>, store: Arc<MemoryStore>) -> ImageCache {
        ImageCache::new(store, icons, "imgcache_", 100 * 1024)
    }

    #[tokio::test]
    async fn added_items_get_icons() {
        let h = Harness::new();
        let tracker = ring_and_amulet(&h).await;
        tracker.settle_icons().await;
        assert_eq!(tracker.icon("Ring.png").unwrap().len(), 512);
        assert!(h.store.get("imgcache_Amulet.png").unwrap().is_some());
        assert_eq!(tracker.image_cache().pending(), 0);
    }

    #[tokio::test]
    async fn cached_icons_are_not_refetched() {
        let h = Harness::new();
        let mut tracker = h.tracker().await;
        tracker.add_item("Ring", 100.0, 1).unwrap();
        tracker.settle_icons().await;
        tracker.add_item("Ring", 120.0, 1).unwrap();
        tracker.refresh_prices(false).await.unwrap();
        tracker.settle_icons().await;
        assert_eq!(h.icons.calls(), 1);
    }

    #[tokio::test]
    async fn concurrent_requests_share_one_fetch() {
        let icons = Arc::new(MockIcons::new(10));
        let cache = cache(icons.clone(), Arc::new(MemoryStore::new()));

        assert!(cache.ensure("Ring.png"));
        assert!(!cache.ensure("Ring.png"));
        assert_eq!(cache.ensure_all(["Ring.png", "Amulet.png", "Amulet.png", ""]), 1);

        cache.settle().await;
        assert_eq!(icons.calls(), 2);
        assert!(cache.try_get("Amulet.png").is_some());
    }

    #[tokio::test]
    async fn oversized_icons_are_not_cached() {
        let h = Harness::with_icons(MockIcons::new(100 * 1024 + 1));
        let tracker = ring_and_amulet(&h).await;
        tracker.settle_icons().await;

        assert!(tracker.icon("Ring.png").is_none());
        assert_eq!(h.store.keys(), vec![STORAGE_KEY.to_string()]);
    }

    #[tokio::test]
    async fn oversized_icons_are_fetched_once() {
        let icons = Arc::new(MockIcons::new(200));
        let cache = ImageCache::new(Arc::new(MemoryStore::new()), icons.clone(), "imgcache_", 100);

        assert!(cache.ensure("Ring.png"));
        cache.settle().await;
        assert!(cache.is_rejected("Ring.png"));

        for _ in 0..3 {
            assert!(!cache.ensure("Ring.png"));
            cache.settle().await;
        }
        assert_eq!(icons.calls(), 1);
        assert!(cache.try_get("Ring.png").is_none());
    }

    #[tokio::test]
    async fn repeated_refreshes_do_not_refetch_oversized_icons() {
        let h = Harness::with_icons(MockIcons::new(100 * 1024 + 1));
        let mut tracker = ring_and_amulet(&h).await;
        tracker.settle_icons().await;
        for _ in 0..3 {
            tracker.refresh_prices(true).await.unwrap();
            tracker.settle_icons().await;
        }
        assert_eq!(h.icons.calls(), 2);
    }

    #[tokio::test]
    async fn finished_tasks_are_pruned_when_scheduling() {
        let icons = Arc::new(MockIcons::new(10));
        let cache = cache(icons.clone(), Arc::new(MemoryStore::new()));

        for i in 0..50 {
            let key = format!("Rune item {i}.png");
            assert!(cache.ensure(&key));
            while cache.try_get(&key).is_none() {
                tokio::task::yield_now().await;
            }
        }
        assert!(cache.ensure("Ring.png"));
        assert_eq!(cache.held_tasks(), 1);
        cache.settle().await;
        assert_eq!(cache.held_tasks(), 0);
        assert_eq!(icons.calls(), 51);
    }

    #[tokio::test]
    async fn icon_at_the_limit_is_cached() {
        let icons = Arc::new(MockIcons::new(100 * 1024));
        let cache = cache(icons, Arc::new(MemoryStore::new()));
        cache.ensure("Ring.png");
        cache.settle().await;
        assert_eq!(cache.try_get("Ring.png").unwrap().len(), cache.max_bytes());
    }

    #[tokio::test]
    async fn failed_fetch_can_be_retried() {
        let icons = Arc::new(MockIcons::failing());
        let cache = cache(icons.clone(), Arc::new(MemoryStore::new()));

        assert!(cache.ensure("Ring.png"));
        cache.settle().await;
        assert!(cache.try_get("Ring.png").is_none());

        assert!(cache.ensure("Ring.png"));
        cache.settle().await;
        assert_eq!(icons.calls(), 2);
    }

    #[test]
    fn no_runtime_schedules_nothing() {
        let icons = Arc::new(MockIcons::new(10));
        let cache = cache(icons.clone(), Arc::new(MemoryStore::new()));
        assert!(!cache.ensure("Ring.png"));
        assert_eq!(cache.pending(), 0);
        assert_eq!(icons.calls(), 0);
    }

    #[test]
    fn empty_key_is_ignored() {
        let cache = cache(Arc::new(MockIcons::new(10)), Arc::new(MemoryStore::new()));
        assert!(cache.try_get("").is_none());
        assert!(!cache.ensure(""));
    }
}
