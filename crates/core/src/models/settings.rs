use serde::{Deserialize, Serialize};

pub const DEFAULT_API_BASE_URL: &str = "https://prices.runescape.wiki/api/v1/osrs";
pub const DEFAULT_IMAGE_BASE_URL: &str = "https://oldschool.runescape.wiki/images/";
pub const DEFAULT_USER_AGENT: &str = "merch_tracker_app - github.com/merch-tracker";
pub const DEFAULT_STORAGE_KEY: &str = "osrsMerchItems";
pub const DEFAULT_ICON_KEY_PREFIX: &str = "imgcache_";

/// Largest icon that will be cached, in bytes (100 KiB).
pub const DEFAULT_MAX_ICON_BYTES: usize = 100 * 1024;

/// Runtime configuration for the tracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Base URL of the real-time prices API (`/latest`, `/mapping`)
    pub api_base_url: String,

    /// Base URL icon file names are appended to
    pub image_base_url: String,

    /// The prices API asks every client to identify itself
    pub user_agent: String,

    pub request_timeout_secs: u64,

    /// Icons larger than this are never cached
    pub max_icon_bytes: usize,

    /// Storage key the holding collection is persisted under
    pub storage_key: String,

    /// Prefix for icon entries in the key-value store
    pub icon_key_prefix: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            image_base_url: DEFAULT_IMAGE_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_timeout_secs: 30,
            max_icon_bytes: DEFAULT_MAX_ICON_BYTES,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            icon_key_prefix: DEFAULT_ICON_KEY_PREFIX.to_string(),
        }
    }
}

impl Settings {
    /// Defaults overridden by `MERCH_TRACKER_*` environment variables.
    ///
    /// Recognized: `MERCH_TRACKER_API_BASE_URL`, `MERCH_TRACKER_IMAGE_BASE_URL`,
    /// `MERCH_TRACKER_USER_AGENT`, `MERCH_TRACKER_TIMEOUT_SECS`,
    /// `MERCH_TRACKER_MAX_ICON_BYTES`.
    pub fn from_env() -> Self {
        Self::default().with_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides from any variable source. Unparseable numbers are ignored.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup("MERCH_TRACKER_API_BASE_URL") {
            self.api_base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(url) = lookup("MERCH_TRACKER_IMAGE_BASE_URL") {
            self.image_base_url = url;
        }
        if let Some(agent) = lookup("MERCH_TRACKER_USER_AGENT") {
            self.user_agent = agent;
        }
        if let Some(raw) = lookup("MERCH_TRACKER_TIMEOUT_SECS") {
            match raw.trim().parse() {
                Ok(secs) => self.request_timeout_secs = secs,
                Err(_) => tracing::warn!(value = %raw, "ignoring invalid MERCH_TRACKER_TIMEOUT_SECS"),
            }
        }
        if let Some(raw) = lookup("MERCH_TRACKER_MAX_ICON_BYTES") {
            match raw.trim().parse() {
                Ok(bytes) => self.max_icon_bytes = bytes,
                Err(_) => tracing::warn!(value = %raw, "ignoring invalid MERCH_TRACKER_MAX_ICON_BYTES"),
            }
        }
        self
    }
}
