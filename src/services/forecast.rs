//! Cashflow forecast: the trailing months of actual income and expense,
//! followed by a projection of the months after the current one.
//!
//! The projection is a [`ProjectionModel`]. The shipped [`TrailingAverage`]
//! repeats the mean of the historical window for every future month; its
//! name is part of the response so a different model is visible to clients.

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::Serialize;

use crate::date_utils::Month;
use crate::db::queries::analytics::{self, MonthlyTotals};
use crate::error::{AppError, AppResult};
use crate::models::{Money, UserId};

pub const DEFAULT_WINDOW_MONTHS: u32 = 3;
pub const DEFAULT_HORIZON: u32 = 3;
pub const MAX_MONTHS: u32 = 12;

/// Window and horizon, each clamped to `1..=12`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForecastParams {
    pub window_months: u32,
    pub horizon: u32,
}

impl ForecastParams {
    pub fn new(window_months: Option<i64>, horizon: Option<i64>) -> Self {
        Self {
            window_months: clamp_months(window_months, DEFAULT_WINDOW_MONTHS),
            horizon: clamp_months(horizon, DEFAULT_HORIZON),
        }
    }
}

impl Default for ForecastParams {
    fn default() -> Self {
        Self::new(None, None)
    }
}

fn clamp_months(requested: Option<i64>, default: u32) -> u32 {
    requested
        .map(|n| n.clamp(1, MAX_MONTHS as i64) as u32)
        .unwrap_or(default)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CashflowPoint {
    /// `YYYY-MM`
    pub month: String,
    pub income: Money,
    pub expense: Money,
    pub net: Money,
    /// True for projected months.
    pub forecast: bool,
}

impl CashflowPoint {
    pub fn actual(month: impl Into<String>, income: Money, expense: Money) -> AppResult<Self> {
        Ok(Self {
            month: month.into(),
            income,
            expense,
            net: net(income, expense)?,
            forecast: false,
        })
    }

    pub fn projected(month: Month, projection: Projection) -> AppResult<Self> {
        Ok(Self {
            month: month.to_string(),
            income: projection.income,
            expense: projection.expense,
            net: net(projection.income, projection.expense)?,
            forecast: true,
        })
    }
}

fn net(income: Money, expense: Money) -> AppResult<Money> {
    income
        .checked_sub(expense)
        .ok_or(AppError::Overflow("cashflow net"))
}

impl TryFrom<MonthlyTotals> for CashflowPoint {
    type Error = AppError;

    fn try_from(totals: MonthlyTotals) -> AppResult<Self> {
        Self::actual(totals.month, totals.income, totals.expense)
    }
}

/// Monthly income and expense a model expects for every forecast month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Projection {
    pub income: Money,
    pub expense: Money,
}

pub trait ProjectionModel: Send + Sync {
    /// Stable identifier reported to clients.
    fn name(&self) -> &'static str;

    /// `history` is in ascending month order and may be empty.
    fn project(&self, history: &[CashflowPoint]) -> Projection;
}

/// Flat projection: the arithmetic mean of the historical income and expense.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrailingAverage;

impl ProjectionModel for TrailingAverage {
    fn name(&self) -> &'static str {
        "trailing_average"
    }

    fn project(&self, history: &[CashflowPoint]) -> Projection {
        Projection {
            income: Money::mean(history.iter().map(|p| p.income)),
            expense: Money::mean(history.iter().map(|p| p.expense)),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CashflowForecast {
    pub window_months: u32,
    pub horizon: u32,
    pub model: &'static str,
    pub points: Vec<CashflowPoint>,
}

/// Appends `horizon` projected points for the months after `current` to the
/// ascending `history`.
pub fn extend_with_projection(
    mut history: Vec<CashflowPoint>,
    current: Month,
    horizon: u32,
    model: &dyn ProjectionModel,
) -> AppResult<Vec<CashflowPoint>> {
    let projection = model.project(&history);
    for i in 1..=horizon {
        history.push(CashflowPoint::projected(
            current.shift(i as i32),
            projection,
        )?);
    }
    Ok(history)
}

/// Historical months come strictly before the current UTC month, so partial
/// data for the month in progress never enters the window.
pub fn forecast_cashflow(
    conn: &Connection,
    user_id: &UserId,
    params: ForecastParams,
    now: DateTime<Utc>,
    model: &dyn ProjectionModel,
) -> AppResult<CashflowForecast> {
    let current = Month::current(now);

    let mut history: Vec<CashflowPoint> = analytics::monthly_totals_before(
        conn,
        user_id,
        &current.start_timestamp(),
        params.window_months,
    )?
    .into_iter()
    .map(CashflowPoint::try_from)
    .collect::<AppResult<_>>()?;
    history.reverse();

    tracing::debug!(
        user_id = %user_id,
        history_months = history.len(),
        window_months = params.window_months,
        horizon = params.horizon,
        model = model.name(),
        "Forecasting cashflow"
    );

    Ok(CashflowForecast {
        window_months: params.window_months,
        horizon: params.horizon,
        model: model.name(),
        points: extend_with_projection(history, current, params.horizon, model)?,
    })
}
