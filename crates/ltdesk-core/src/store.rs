use ltdesk_types::{Credentials, HistoryEntry, StoredPair};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backing store could not be opened or created
    #[error("Persistence unavailable: {0}")]
    Unavailable(String),

    #[error("Storage error: {0}")]
    Backend(String),

    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

/// Read/write contract for preferences and history.
///
/// Implementations serialize their own writes; callers may share one
/// instance between tasks.
pub trait SettingsStore: Send + Sync {
    /// Most recently saved pair
    fn load_language_pair(&self) -> Result<Option<StoredPair>, StoreError>;

    fn save_language_pair(&self, pair: &StoredPair) -> Result<(), StoreError>;

    /// Most recently saved endpoint and key
    fn load_api_credentials(&self) -> Result<Option<Credentials>, StoreError>;

    fn save_api_credentials(&self, credentials: &Credentials) -> Result<(), StoreError>;

    fn append_history(&self, entry: &HistoryEntry) -> Result<(), StoreError>;

    /// Newest first, at most `limit` entries
    fn load_history(&self, limit: usize) -> Result<Vec<HistoryEntry>, StoreError>;

    fn clear_history(&self) -> Result<(), StoreError>;
}
