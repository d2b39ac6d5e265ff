use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;

use crate::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;
use crate::VERSION;

fn ping(state: &AppState) -> Result<(), AppError> {
    let conn = state.db.get()?;
    conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
    Ok(())
}

/// Liveness plus a database ping. A broken database gives 503, not 500.
pub async fn health(State(state): State<AppState>) -> Response {
    match ping(&state) {
        Ok(()) => Json(json!({
            "ok": true,
            "service": state.telemetry.service(),
            "version": VERSION,
        }))
        .into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "Health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "ok": false,
                    "error": "db_unavailable",
                    "detail": e.to_string(),
                })),
            )
                .into_response()
        }
    }
}

pub async fn me(AuthUser(user_id): AuthUser) -> Json<serde_json::Value> {
    Json(json!({ "user_id": user_id }))
}
