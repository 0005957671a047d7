//! Backend-agnostic profile store trait.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::registration::model::ProfileRecord;

/// The persistence boundary the registration flow writes completed records
/// through. One record per user; writes are last-write-wins by user id.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Insert or overwrite the user's profile record.
    ///
    /// The caller guarantees the record is complete; the store never receives
    /// a partial profile.
    async fn upsert(&self, record: &ProfileRecord) -> Result<(), StoreError>;

    /// Fetch a stored profile by user id.
    async fn get(&self, user_id: i64) -> Result<Option<ProfileRecord>, StoreError>;
}
