use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::json_body;
use crate::auth::AuthUser;
use crate::db::queries::budgets;
use crate::error::AppResult;
use crate::models::{Budget, UpsertOutcome};
use crate::services::budgets::{self as budget_service, BudgetInput};
use crate::services::summary::resolve_month;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct BudgetListParams {
    pub month: Option<String>,
}

pub async fn list(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(params): Query<BudgetListParams>,
) -> AppResult<Json<Vec<Budget>>> {
    let conn = state.db.get()?;
    let month = resolve_month(params.month.as_deref(), Utc::now());

    Ok(Json(budgets::list_budgets(&conn, &user_id, month)?))
}

#[derive(Debug, Serialize)]
pub struct UpsertedBudget {
    #[serde(flatten)]
    pub budget: Budget,
    pub status: UpsertOutcome,
}

/// Sets or replaces the budget for `(month, category_id)`: 201 when a row
/// was created, 200 when an existing amount was replaced.
pub async fn upsert(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    payload: Result<Json<BudgetInput>, JsonRejection>,
) -> AppResult<(StatusCode, Json<UpsertedBudget>)> {
    let input = json_body(payload)?;
    let conn = state.db.get()?;

    let (budget, outcome) = budget_service::upsert_budget(&conn, &user_id, &input)?;
    let status = match outcome {
        UpsertOutcome::Created => StatusCode::CREATED,
        UpsertOutcome::Replaced => StatusCode::OK,
    };

    Ok((
        status,
        Json(UpsertedBudget {
            budget,
            status: outcome,
        }),
    ))
}
