use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use super::date::iso_date;

/// The ten free-text prompts of a day's entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct EntryFields {
    pub morning_gratitude1: Option<String>,
    pub morning_gratitude2: Option<String>,
    pub morning_gratitude3: Option<String>,
    pub morning_intention: Option<String>,
    pub morning_prayer: Option<String>,
    pub evening_reflection1: Option<String>,
    pub evening_reflection2: Option<String>,
    pub evening_reflection3: Option<String>,
    pub evening_learning: Option<String>,
    pub evening_gratitude: Option<String>,
}

/// Journal entry row; unique per (user_id, date).
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct JournalEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    #[sqlx(rename = "entry_date")]
    #[serde(with = "iso_date")]
    pub date: Date,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub fields: EntryFields,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}
