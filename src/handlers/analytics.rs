use axum::extract::{Query, State};
use axum::response::Json;
use chrono::Utc;
use serde::Deserialize;

use crate::auth::AuthUser;
use crate::error::AppResult;
use crate::services::forecast::{self, CashflowForecast, ForecastParams};
use crate::services::summary::{self, SpendSummary};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct SpendSummaryParams {
    /// `YYYY-MM`, defaults to the current month.
    pub month: Option<String>,
}

pub async fn spend_summary(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(params): Query<SpendSummaryParams>,
) -> AppResult<Json<SpendSummary>> {
    let conn = state.db.get()?;
    let month = summary::resolve_month(params.month.as_deref(), Utc::now());

    let result = summary::summarize_spend(&conn, &user_id, month)?;
    Ok(Json(result))
}

/// Raw query values; anything that is not an integer falls back to the
/// default rather than failing the request.
#[derive(Debug, Default, Deserialize)]
pub struct CashflowForecastParams {
    #[serde(alias = "window")]
    pub window_months: Option<String>,
    pub horizon: Option<String>,
}

impl CashflowForecastParams {
    pub fn resolve(&self) -> ForecastParams {
        let parse = |v: &Option<String>| v.as_deref().and_then(|s| s.trim().parse::<i64>().ok());
        ForecastParams::new(parse(&self.window_months), parse(&self.horizon))
    }
}

pub async fn cashflow_forecast(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(params): Query<CashflowForecastParams>,
) -> AppResult<Json<CashflowForecast>> {
    let conn = state.db.get()?;

    let result = forecast::forecast_cashflow(
        &conn,
        &user_id,
        params.resolve(),
        Utc::now(),
        state.projection.as_ref(),
    )?;
    Ok(Json(result))
}
