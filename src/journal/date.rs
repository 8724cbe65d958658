use time::{macros::format_description, Date, OffsetDateTime};

use crate::error::AppError;

time::serde::format_description!(pub iso_date, Date, "[year]-[month]-[day]");

/// Today's entry key, taken from the server clock in UTC.
pub fn today() -> Date {
    OffsetDateTime::now_utc().date()
}

/// Parse a `YYYY-MM-DD` key; absent or blank means today.
pub fn resolve(raw: Option<&str>) -> Result<Date, AppError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(today()),
        Some(s) => Date::parse(s, format_description!("[year]-[month]-[day]"))
            .map_err(|_| AppError::Validation(format!("Invalid date {s:?}, expected YYYY-MM-DD"))),
    }
}
