use thiserror::Error;

/// Unified error type for the entire merch-tracker-core library.
/// Every public function returns `Result<T, CoreError>`.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Storage / Serialization ─────────────────────────────────────
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    // ── File I/O (native only) ──────────────────────────────────────
    #[error("File I/O error: {0}")]
    FileIO(String),

    // ── API / Network ───────────────────────────────────────────────
    #[error("API error ({provider}): {message}")]
    Api {
        provider: String,
        message: String,
    },

    #[error("Network error: {0}")]
    Network(String),

    // ── Business Logic ──────────────────────────────────────────────
    #[error("Validation failed: {0}")]
    ValidationError(String),

    #[error("Item \"{0}\" not found. Check spelling.")]
    UnknownItem(String),

    #[error("Holding not found: {0}")]
    HoldingNotFound(String),

    #[error("Portfolio is read-only (loaded from a shared link)")]
    ReadOnly,

    #[error("Portfolio is empty")]
    EmptyPortfolio,

    // ── Import / Share ──────────────────────────────────────────────
    #[error("Invalid share token: {0}")]
    MalformedShareToken(String),

    #[error("Invalid CSV: {0}")]
    InvalidCsv(String),
}

// ── Conversion helpers (From impls) ─────────────────────────────────

impl From<std::io::Error> for CoreError {
    fn from(e: std::io::Error) -> Self {
        CoreError::FileIO(e.to_string())
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::Deserialization(e.to_string())
    }
}

impl From<csv::Error> for CoreError {
    fn from(e: csv::Error) -> Self {
        CoreError::InvalidCsv(e.to_string())
    }
}

impl From<reqwest::Error> for CoreError {
    fn from(e: reqwest::Error) -> Self {
        // reqwest errors carry the full URL; drop the query string.
        let msg = e.to_string();
        let sanitized = if let Some(idx) = msg.find('?') {
            format!("{}?<query redacted>", &msg[..idx])
        } else {
            msg
        };
        CoreError::Network(sanitized)
    }
}

impl CoreError {
    /// `true` for failures of the price feed itself (network or non-success status).
    /// The caller shows these as a transient, dismissible notice.
    pub fn is_feed_unavailable(&self) -> bool {
        matches!(self, CoreError::Network(_) | CoreError::Api { .. })
    }
}
