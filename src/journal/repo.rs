use axum::async_trait;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::error::AppError;
use crate::journal::repo_types::{EntryFields, JournalEntry};

#[async_trait]
pub trait EntryRepo: Send + Sync {
    async fn find_entry(&self, user_id: Uuid, date: Date)
        -> Result<Option<JournalEntry>, AppError>;

    /// Insert or overwrite the entry for (user_id, date). An existing row keeps its id.
    async fn upsert_entry(
        &self,
        user_id: Uuid,
        date: Date,
        fields: &EntryFields,
        now: OffsetDateTime,
    ) -> Result<JournalEntry, AppError>;

    /// Delete the entry for (user_id, date) if present; returns rows removed.
    async fn delete_entry(&self, user_id: Uuid, date: Date) -> Result<u64, AppError>;

    /// Every date with an entry, newest first.
    async fn list_entry_dates(&self, user_id: Uuid) -> Result<Vec<Date>, AppError>;
}
