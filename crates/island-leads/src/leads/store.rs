use async_trait::async_trait;

use super::domain::Lead;

/// Storage abstraction over the external key-value lead table, so intake and
/// export can be exercised against an in-memory double.
#[async_trait]
pub trait LeadStore: Send + Sync {
    /// Point write. Keys are never overwritten by this system.
    async fn set(&self, key: &str, lead: &Lead) -> Result<(), StoreError>;

    /// Point read of a single record.
    async fn get(&self, key: &str) -> Result<Option<Lead>, StoreError>;

    /// Scan of every `(key, record)` pair whose key starts with `prefix`.
    async fn get_by_prefix(&self, prefix: &str) -> Result<Vec<(String, Lead)>, StoreError>;
}

/// Error enumeration for store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("store rejected the request ({status}): {body}")]
    Upstream { status: u16, body: String },
    #[error("stored value could not be decoded: {0}")]
    Decode(String),
}
