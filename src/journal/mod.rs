use crate::state::AppState;
use axum::Router;

pub mod date;
mod dto;
pub mod handlers;
pub mod repo;
pub mod repo_types;

pub fn router() -> Router<AppState> {
    handlers::journal_routes()
}
