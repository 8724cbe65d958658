use serde::{Deserialize, Serialize};
use time::Date;

use super::{date::iso_date, repo_types::EntryFields};

/// Body of `POST /journal`: an optional day plus the ten prompts.
#[derive(Debug, Deserialize)]
pub struct SaveEntryRequest {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(flatten)]
    pub fields: EntryFields,
}

/// `?date=` on reads, `{date}` on deletes.
#[derive(Debug, Default, Deserialize)]
pub struct DateParam {
    #[serde(default)]
    pub date: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

#[derive(Debug, Serialize)]
pub struct EntryDate {
    #[serde(with = "iso_date")]
    pub date: Date,
}
