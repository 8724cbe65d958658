use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::config::CorsConfig;

const ALLOW_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";
const ALLOW_HEADERS: &str = "Content-Type, Authorization";

/// Origin policy. Never rejects: an origin that is not allowed is answered
/// with `default_origin` and the browser enforces the mismatch.
#[derive(Debug)]
pub struct CorsPolicy {
    allowed_origins: Vec<String>,
    allowed_suffixes: Vec<String>,
    default_origin: HeaderValue,
}

impl CorsPolicy {
    pub fn new(cfg: &CorsConfig) -> anyhow::Result<Self> {
        let default_origin = HeaderValue::from_str(&cfg.default_origin)
            .with_context(|| format!("invalid CORS default origin {:?}", cfg.default_origin))?;
        Ok(Self {
            allowed_origins: cfg.allowed_origins.clone(),
            allowed_suffixes: cfg.allowed_origin_suffixes.clone(),
            default_origin,
        })
    }

    fn is_allowed(&self, origin: &str) -> bool {
        self.allowed_origins.iter().any(|o| o == origin)
            || self.allowed_suffixes.iter().any(|s| origin.ends_with(s.as_str()))
    }

    /// Value for `Access-Control-Allow-Origin`.
    pub fn allow_origin(&self, origin: Option<&HeaderValue>) -> HeaderValue {
        match origin {
            Some(v) if v.to_str().map(|o| self.is_allowed(o)).unwrap_or(false) => v.clone(),
            _ => self.default_origin.clone(),
        }
    }

    pub fn apply(&self, origin: Option<&HeaderValue>, headers: &mut HeaderMap) {
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            self.allow_origin(origin),
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOW_METHODS),
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOW_HEADERS),
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
            HeaderValue::from_static("true"),
        );
        headers.append(header::VARY, HeaderValue::from_static("origin"));
    }
}

/// Answers preflight before routing and decorates every other response.
pub async fn cors(State(policy): State<Arc<CorsPolicy>>, req: Request, next: Next) -> Response {
    let origin = req.headers().get(header::ORIGIN).cloned();
    let mut res = if req.method() == Method::OPTIONS {
        StatusCode::OK.into_response()
    } else {
        next.run(req).await
    };
    policy.apply(origin.as_ref(), res.headers_mut());
    res
}
