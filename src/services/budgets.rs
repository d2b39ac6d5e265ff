use rusqlite::Connection;
use serde::Deserialize;

use crate::date_utils::Month;
use crate::db::queries::budgets;
use crate::error::{AppResult, ValidationError};
use crate::models::{parse_amount, Budget, Money, UpsertOutcome, UserId};

/// Request body for setting a budget. Every field is optional here so that
/// a missing field is reported with its own reason code.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct BudgetInput {
    pub month: Option<String>,
    pub category_id: Option<String>,
    pub amount: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidBudget {
    pub month: Month,
    pub category_id: String,
    pub amount: Money,
}

impl BudgetInput {
    pub fn validate(&self) -> Result<ValidBudget, ValidationError> {
        let month = self
            .month
            .as_deref()
            .filter(|m| m.len() == 7)
            .and_then(Month::parse)
            .ok_or(ValidationError::MonthFormat)?;

        let category_id = self
            .category_id
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or(ValidationError::CategoryRequired)?;

        let amount = parse_amount(self.amount)?;

        Ok(ValidBudget {
            month,
            category_id: category_id.to_string(),
            amount,
        })
    }
}

/// Validates, then writes with a single conflict-resolving statement.
/// Nothing is written when validation fails or when the category is not one
/// of the caller's own.
pub fn upsert_budget(
    conn: &Connection,
    user_id: &UserId,
    input: &BudgetInput,
) -> AppResult<(Budget, UpsertOutcome)> {
    let valid = input.validate()?;
    let result = budgets::upsert_budget(
        conn,
        user_id,
        valid.month,
        &valid.category_id,
        valid.amount,
    )?
    .ok_or(ValidationError::UnknownCategory)?;
    Ok(result)
}
