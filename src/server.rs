use std::sync::Arc;

use axum::middleware;
use axum::Router;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::compression::CompressionLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::auth::{self, StaticTokens};
use crate::config::{AuthMode, Config};
use crate::db::{create_pool, migrations};
use crate::handlers;
use crate::observability::{self, Telemetry};
use crate::services::forecast::TrailingAverage;
use crate::state::AppState;

/// Build the application state and Axum router from a [`Config`].
///
/// Creates the database pool, runs migrations, and assembles the full
/// middleware stack. Returns the shared state and a ready-to-serve router.
pub fn build_app(
    config: Config,
    telemetry: Telemetry,
) -> Result<(AppState, Router), Box<dyn std::error::Error>> {
    let db = create_pool(&config.database_path)?;

    {
        let conn = db.get()?;
        migrations::run_migrations(&conn, &config.migrations_path)?;
    }

    let verifier = match &config.auth_mode {
        AuthMode::Bearer { tokens } => {
            tracing::info!(tokens = tokens.len(), "Bearer token authentication enabled");
            StaticTokens::new(tokens)
        }
        AuthMode::Unauthenticated { dev_user } => {
            tracing::warn!(%dev_user, "Authentication disabled, all requests act as the dev user");
            StaticTokens::default()
        }
    };

    let state = AppState {
        db,
        config: Arc::new(config),
        verifier: Arc::new(verifier),
        projection: Arc::new(TrailingAverage),
        telemetry,
    };

    let app = router(state.clone());
    Ok((state, app))
}

/// The full route tree and middleware stack over an existing state.
///
/// Request flow, outermost first: request id, tracing, compression, then for
/// protected routes auth and the per-request log line.
pub fn router(state: AppState) -> Router {
    let protected = handlers::protected_routes()
        .route_layer(middleware::from_fn_with_state(
            state.telemetry.clone(),
            observability::log_requests,
        ))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::auth_middleware,
        ));

    let api = handlers::public_routes().merge(protected);

    Router::new()
        .nest("/api", api)
        .fallback(handlers::fallback_handler)
        .layer(CompressionLayer::new())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .with_state(state)
}

/// Bind the router to `host:port` and spawn the server as a tokio task that
/// stops gracefully on Ctrl-C or SIGTERM.
///
/// Returns the actual port the server bound to (useful when `port` is 0 for
/// OS-assigned ports) and a [`JoinHandle`] for the server task.
pub async fn serve(
    app: Router,
    host: &str,
    port: u16,
) -> Result<(u16, JoinHandle<std::io::Result<()>>), Box<dyn std::error::Error>> {
    let addr = format!("{host}:{port}");
    let listener = TcpListener::bind(&addr).await?;
    let actual_port = listener.local_addr()?.port();

    let handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
    });

    Ok((actual_port, handle))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
