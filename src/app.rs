use std::net::SocketAddr;

use axum::{
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tower_http::trace::TraceLayer;

use crate::{auth, cors, error::AppError, journal, state::AppState};

/// Route table. Exact routes live under `/api`; anything else, including a
/// known path with the wrong method, is a JSON 404. Preflight never reaches
/// the table: the CORS layer answers it first.
pub fn build_app(state: AppState) -> Router {
    let cors_policy = state.cors.clone();

    Router::new()
        .nest(
            "/api",
            Router::new()
                .merge(auth::router())
                .merge(journal::router())
                .route("/health", get(|| async { "ok" })),
        )
        .fallback(not_found)
        .layer(middleware::map_response(method_mismatch_as_not_found))
        .with_state(state)
        .layer(middleware::from_fn_with_state(cors_policy, cors::cors))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!(
                        "http_request",
                        %method,
                        uri = %uri,
                        status = tracing::field::Empty
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     _latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        if status.is_server_error() {
                            tracing::error!(%status, "response");
                        } else {
                            tracing::info!(%status, "response");
                        }
                    },
                ),
        )
}

async fn not_found() -> AppError {
    AppError::NotFound
}

async fn method_mismatch_as_not_found(res: Response) -> Response {
    if res.status() == StatusCode::METHOD_NOT_ALLOWED {
        AppError::NotFound.into_response()
    } else {
        res
    }
}

pub async fn serve(app: Router) -> anyhow::Result<()> {
    let addr: SocketAddr = format!(
        "{}:{}",
        std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
        std::env::var("APP_PORT").unwrap_or_else(|_| "8080".into())
    )
    .parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
