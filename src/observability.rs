//! Logging setup and per-request log lines.
//!
//! `Telemetry` is built once in `main` from [`LogConfig`] and handed to the
//! router as middleware state. Business code only emits `tracing` events and
//! never reaches for a logger of its own, so it runs unchanged in tests where
//! no subscriber is installed.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use axum::extract::State;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::EnvFilter;

use crate::models::UserId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub service: String,
    /// `EnvFilter` directives; `RUST_LOG` takes precedence when set.
    pub filter: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone)]
pub struct Telemetry {
    service: Arc<str>,
}

impl Telemetry {
    /// A handle that logs through whatever subscriber is current.
    pub fn new(service: &str) -> Self {
        Self {
            service: Arc::from(service),
        }
    }

    /// Installs the process-wide subscriber described by `config` and returns
    /// the handle to pass to the router.
    pub fn install(config: &LogConfig) -> Result<Self, TryInitError> {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&config.filter))
            .unwrap_or_else(|_| EnvFilter::new("info"));
        let registry = tracing_subscriber::registry().with(filter);

        match config.format {
            LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).try_init()?,
            LogFormat::Json => registry
                .with(tracing_subscriber::fmt::layer().json().with_current_span(false))
                .try_init()?,
        }

        Ok(Self::new(&config.service))
    }

    pub fn service(&self) -> &str {
        &self.service
    }
}

/// One structured line per request, level by status class. Runs inside the
/// auth layer so the caller's user id is known.
pub async fn log_requests(
    State(telemetry): State<Telemetry>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string();
    let user_id = request
        .extensions()
        .get::<UserId>()
        .map(|u| u.to_string())
        .unwrap_or_else(|| "-".into());

    let response = next.run(request).await;

    let status = response.status().as_u16();
    let latency_ms = start.elapsed().as_millis() as u64;

    macro_rules! log_request {
        ($level:ident) => {
            tracing::$level!(
                service = telemetry.service(),
                status,
                method = %method,
                path = %path,
                latency_ms,
                user_id = %user_id,
                request_id = %request_id,
                "http_request"
            )
        };
    }

    match status {
        500..=599 => log_request!(error),
        400..=499 => log_request!(warn),
        _ => log_request!(info),
    }

    response
}
