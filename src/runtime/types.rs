use crate::ingest::StorageRecord;
use async_trait::async_trait;

/// Persistence seam for flattened records, keyed by composite id.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn exists(&self, id: &str) -> Result<bool, String>;
    async fn save(&self, record: StorageRecord) -> Result<(), String>;
}
