mod app;
mod auth;
mod config;
mod cors;
mod db;
mod error;
mod extract;
mod journal;
mod memory;
mod state;
mod store;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "daily_pause=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let app_state = state::AppState::init().await?;

    auth::services::spawn_session_sweeper(
        app_state.store.clone(),
        app_state.config.session.sweep_minutes,
    );

    let app = app::build_app(app_state);
    app::serve(app).await
}
