pub mod analytics;
pub mod budgets;
pub mod categories;
pub mod health;
pub mod transactions;

use axum::extract::rejection::JsonRejection;
use axum::routing::{delete, get};
use axum::{Json, Router};

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Routes reachable without credentials.
pub fn public_routes() -> Router<AppState> {
    Router::new().route("/health", get(health::health))
}

/// Routes that require an authenticated user; the caller wraps them in the
/// auth layer.
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/me", get(health::me))
        // Ledger entries
        .route(
            "/transactions",
            get(transactions::list).post(transactions::create),
        )
        .route("/transactions/:id", delete(transactions::delete))
        // Categories
        .route("/categories", get(categories::list).post(categories::create))
        // Budgets
        .route("/budgets", get(budgets::list).post(budgets::upsert))
        // Analytics
        .route("/analytics/spend_summary", get(analytics::spend_summary))
        .route(
            "/analytics/cashflow_forecast",
            get(analytics::cashflow_forecast),
        )
}

pub async fn fallback_handler() -> AppError {
    AppError::NotFound("not_found")
}

/// Unwraps a JSON body, reporting any malformed payload as `bad_json`.
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> AppResult<T> {
    match payload {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Rejected request body");
            Err(AppError::BadRequest("bad_json"))
        }
    }
}

/// Treats blank optional strings as absent.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
