//! Monthly spend summary: income and expense totals plus an expense
//! breakdown by category for one calendar month.

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::Serialize;

use crate::date_utils::Month;
use crate::db::queries::analytics::{self, CategoryTotal};
use crate::error::AppResult;
use crate::models::{Money, UserId};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySpend {
    pub category_id: Option<String>,
    pub category_name: Option<String>,
    pub total: Money,
}

impl From<CategoryTotal> for CategorySpend {
    fn from(row: CategoryTotal) -> Self {
        Self {
            category_id: row.category_id,
            category_name: row.category_name,
            total: row.total,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SpendSummary {
    /// `YYYY-MM`
    pub month: String,
    pub total_income: Money,
    pub total_expense: Money,
    pub by_category: Vec<CategorySpend>,
}

/// The requested month, or the current UTC month when the parameter is
/// missing or not a valid `YYYY-MM`.
pub fn resolve_month(param: Option<&str>, now: DateTime<Utc>) -> Month {
    param
        .and_then(Month::parse)
        .unwrap_or_else(|| Month::current(now))
}

pub fn summarize_spend(
    conn: &Connection,
    user_id: &UserId,
    month: Month,
) -> AppResult<SpendSummary> {
    let (from, to) = month.bounds();

    let (total_income, total_expense) = analytics::totals_by_kind(conn, user_id, &from, &to)?;
    let by_category: Vec<CategorySpend> =
        analytics::expense_by_category(conn, user_id, &from, &to)?
            .into_iter()
            .map(CategorySpend::from)
            .collect();

    tracing::debug!(
        user_id = %user_id,
        month = %month,
        categories = by_category.len(),
        "Summarized spend"
    );

    Ok(SpendSummary {
        month: month.to_string(),
        total_income,
        total_expense,
        by_category,
    })
}
