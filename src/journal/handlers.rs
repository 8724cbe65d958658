use axum::{
    body::Bytes,
    extract::{Query, State},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use time::OffsetDateTime;
use tracing::{debug, info, instrument};

use crate::{
    auth::extractors::AuthUser,
    error::AppError,
    extract::JsonBody,
    journal::{
        date,
        dto::{DateParam, EntryDate, SaveEntryRequest, SuccessResponse},
        repo::EntryRepo,
    },
    state::AppState,
};

pub fn journal_routes() -> Router<AppState> {
    Router::new()
        .route("/journal", get(get_entry).post(save_entry))
        .route("/journal/delete", post(delete_entry))
        .route("/journal/dates", get(list_dates))
}

#[instrument(skip(state, auth, body), fields(user_id = %auth.user.id))]
pub async fn save_entry(
    State(state): State<AppState>,
    auth: AuthUser,
    JsonBody(body): JsonBody<SaveEntryRequest>,
) -> Result<Json<SuccessResponse>, AppError> {
    let day = date::resolve(body.date.as_deref())?;
    let entry = state
        .store
        .upsert_entry(auth.user.id, day, &body.fields, OffsetDateTime::now_utc())
        .await?;
    info!(entry_id = %entry.id, date = %day, "journal entry saved");
    Ok(Json(SuccessResponse::ok()))
}

/// The entry for `?date=` (default today), or `{}` when there is none.
#[instrument(skip(state, auth), fields(user_id = %auth.user.id))]
pub async fn get_entry(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(q): Query<DateParam>,
) -> Result<Response, AppError> {
    let day = date::resolve(q.date.as_deref())?;
    match state.store.find_entry(auth.user.id, day).await? {
        Some(entry) => Ok(Json(entry).into_response()),
        None => {
            debug!(date = %day, "no journal entry");
            Ok(Json(serde_json::json!({})).into_response())
        }
    }
}

/// Deletes the entry for `{date}` (default today). An empty body is allowed.
#[instrument(skip(state, auth, body), fields(user_id = %auth.user.id))]
pub async fn delete_entry(
    State(state): State<AppState>,
    auth: AuthUser,
    body: Bytes,
) -> Result<Json<SuccessResponse>, AppError> {
    let param: DateParam = if body.iter().all(u8::is_ascii_whitespace) {
        DateParam::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| AppError::Validation(format!("Invalid JSON body: {e}")))?
    };
    let day = date::resolve(param.date.as_deref())?;
    let removed = state.store.delete_entry(auth.user.id, day).await?;
    info!(date = %day, removed, "journal entry deleted");
    Ok(Json(SuccessResponse::ok()))
}

#[instrument(skip(state, auth), fields(user_id = %auth.user.id))]
pub async fn list_dates(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<EntryDate>>, AppError> {
    let dates = state.store.list_entry_dates(auth.user.id).await?;
    Ok(Json(dates.into_iter().map(|date| EntryDate { date }).collect()))
}
