use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;

use crate::providers::traits::IconSource;
use crate::storage::store::KeyValueStore;

/// Persistent cache of item icon bytes.
///
/// - `try_get` is synchronous and only ever reads the store.
/// - `ensure` schedules a background fetch on the tokio runtime and returns
///   immediately. Icons larger than `max_bytes` are dropped, logged and
///   remembered, so later `ensure` calls for the same key do not fetch it
///   again for the lifetime of the cache.
/// - Entries are written once and never evicted.
///
/// Cloning is cheap; clones share the same in-flight set, rejected set and
/// task list.
#[derive(Clone)]
pub struct ImageCache {
    inner: Arc<Inner>,
}

struct Inner {
    store: Arc<dyn KeyValueStore>,
    source: Arc<dyn IconSource>,
    key_prefix: String,
    max_bytes: usize,
    in_flight: Mutex<HashSet<String>>,
    rejected: Mutex<HashSet<String>>,
    pending: Mutex<Vec<JoinHandle<()>>>,
}

impl ImageCache {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        source: Arc<dyn IconSource>,
        key_prefix: impl Into<String>,
        max_bytes: usize,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                source,
                key_prefix: key_prefix.into(),
                max_bytes,
                in_flight: Mutex::new(HashSet::new()),
                rejected: Mutex::new(HashSet::new()),
                pending: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn max_bytes(&self) -> usize {
        self.inner.max_bytes
    }

    /// Cached icon bytes, if present. Never fetches, never blocks on the network.
    pub fn try_get(&self, icon_key: &str) -> Option<Vec<u8>> {
        if icon_key.is_empty() {
            return None;
        }
        match self.inner.store.get(&self.inner.storage_key(icon_key)) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(icon = icon_key, error = %e, "could not read cached icon");
                None
            }
        }
    }

    /// Make sure an icon will end up in the cache.
    ///
    /// No-op when it is already cached, already being fetched, or was
    /// rejected as oversized. Returns
    /// `true` if a fetch was scheduled. Needs a running tokio runtime;
    /// without one nothing is scheduled.
    pub fn ensure(&self, icon_key: &str) -> bool {
        if icon_key.is_empty() || self.is_rejected(icon_key) || self.try_get(icon_key).is_some() {
            return false;
        }

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(icon = icon_key, "no async runtime, icon not fetched");
            return false;
        };

        {
            let mut in_flight = self.inner.in_flight.lock().unwrap_or_else(|e| e.into_inner());
            if !in_flight.insert(icon_key.to_string()) {
                return false;
            }
        }

        let inner = Arc::clone(&self.inner);
        let key = icon_key.to_string();
        let handle = runtime.spawn(async move {
            inner.populate(&key).await;
            inner
                .in_flight
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .remove(&key);
        });

        let mut pending = self.inner.pending.lock().unwrap_or_else(|e| e.into_inner());
        pending.retain(|h| !h.is_finished());
        pending.push(handle);
        true
    }

    /// `true` once a fetch of this icon came back larger than `max_bytes`.
    pub fn is_rejected(&self, icon_key: &str) -> bool {
        self.inner
            .rejected
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(icon_key)
    }

    /// `ensure` every distinct, non-empty key. Returns how many fetches were scheduled.
    pub fn ensure_all<'a, I>(&self, icon_keys: I) -> usize
    where
        I: IntoIterator<Item = &'a str>,
    {
        let unique: HashSet<&str> = icon_keys.into_iter().filter(|k| !k.is_empty()).collect();
        unique.into_iter().filter(|key| self.ensure(key)).count()
    }

    /// Number of population tasks scheduled and not yet awaited by `settle`.
    pub fn pending(&self) -> usize {
        let mut pending = self.inner.pending.lock().unwrap_or_else(|e| e.into_inner());
        pending.retain(|h| !h.is_finished());
        pending.len()
    }

    /// Number of task handles currently held, finished or not. Finished
    /// handles are dropped whenever a new fetch is scheduled.
    pub fn held_tasks(&self) -> usize {
        self.inner.pending.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Wait until every scheduled population task has finished.
    pub async fn settle(&self) {
        loop {
            let handles =
                std::mem::take(&mut *self.inner.pending.lock().unwrap_or_else(|e| e.into_inner()));
            if handles.is_empty() {
                return;
            }
            for handle in handles {
                if let Err(e) = handle.await {
                    tracing::error!(error = %e, "icon task failed");
                }
            }
        }
    }
}

impl Inner {
    fn storage_key(&self, icon_key: &str) -> String {
        format!("{}{icon_key}", self.key_prefix)
    }

    /// Fetch and store one icon. Failures are logged, never returned.
    async fn populate(&self, icon_key: &str) {
        let storage_key = self.storage_key(icon_key);

        // Another task (or process) may have stored it since `ensure` checked.
        if matches!(self.store.contains(&storage_key), Ok(true)) {
            return;
        }

        let bytes = match self.source.fetch_icon(icon_key).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(icon = icon_key, error = %e, "could not fetch icon");
                return;
            }
        };

        if bytes.len() > self.max_bytes {
            tracing::warn!(
                icon = icon_key,
                size = bytes.len(),
                max = self.max_bytes,
                "icon too large to cache"
            );
            self.rejected
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .insert(icon_key.to_string());
            return;
        }

        if let Err(e) = self.store.put(&storage_key, &bytes) {
            tracing::warn!(icon = icon_key, error = %e, "could not store icon");
        } else {
            tracing::debug!(icon = icon_key, size = bytes.len(), "cached icon");
        }
    }
}

impl std::fmt::Debug for ImageCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageCache")
            .field("key_prefix", &self.inner.key_prefix)
            .field("max_bytes", &self.inner.max_bytes)
            .finish()
    }
}

