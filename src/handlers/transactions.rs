use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::{json_body, non_blank};
use crate::auth::AuthUser;
use crate::date_utils::{format_timestamp, parse_timestamp};
use crate::db::queries::transactions;
use crate::error::{AppError, AppResult, ValidationError};
use crate::models::{parse_amount, NewTransaction, Transaction, TransactionKind};
use crate::state::AppState;

/// How many entries the list endpoint returns.
pub const LIST_LIMIT: i64 = 100;

#[derive(Debug, Default, Deserialize)]
pub struct CreateTransaction {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// RFC 3339 or `YYYY-MM-DD`; defaults to now.
    pub date: Option<String>,
    pub amount: Option<f64>,
    pub payee: Option<String>,
    pub memo: Option<String>,
    pub category_id: Option<String>,
    pub tags: Option<String>,
}

impl CreateTransaction {
    pub fn validate(self, now: DateTime<Utc>) -> Result<NewTransaction, ValidationError> {
        let kind: TransactionKind = self
            .kind
            .as_deref()
            .and_then(|k| k.parse().ok())
            .ok_or(ValidationError::InvalidKind)?;

        let occurred_at = match non_blank(self.date) {
            Some(date) => parse_timestamp(&date).ok_or(ValidationError::DateFormat)?,
            None => now,
        };

        let amount = parse_amount(self.amount)?;

        Ok(NewTransaction {
            kind,
            occurred_at: format_timestamp(occurred_at),
            amount,
            payee: self.payee,
            memo: self.memo,
            category_id: non_blank(self.category_id),
            tags: self.tags,
        })
    }
}

pub async fn list(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<Vec<Transaction>>> {
    let conn = state.db.get()?;
    Ok(Json(transactions::list_transactions(
        &conn, &user_id, LIST_LIMIT,
    )?))
}

pub async fn create(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    payload: Result<Json<CreateTransaction>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Transaction>)> {
    let new_transaction = json_body(payload)?.validate(Utc::now())?;
    let conn = state.db.get()?;

    let transaction = transactions::create_transaction(&conn, &user_id, &new_transaction)?
        .ok_or(ValidationError::UnknownCategory)?;
    Ok((StatusCode::CREATED, Json(transaction)))
}

pub async fn delete(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    let conn = state.db.get()?;

    if transactions::soft_delete_transaction(&conn, &user_id, &id)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound("transaction_not_found"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn body(kind: &str, amount: Option<f64>) -> CreateTransaction {
        CreateTransaction {
            kind: Some(kind.to_string()),
            amount,
            ..Default::default()
        }
    }

    #[test]
    fn test_date_defaults_to_now() {
        let tx = body("expense", Some(4.5)).validate(now()).unwrap();
        assert_eq!(tx.occurred_at, "2024-06-01T12:00:00Z");
        assert_eq!(tx.amount.cents(), 450);
        assert_eq!(tx.category_id, None);
    }

    #[test]
    fn test_rejects_unknown_kind_and_negative_amount() {
        assert_eq!(
            body("transfer", Some(1.0)).validate(now()).unwrap_err(),
            ValidationError::InvalidKind
        );
        assert_eq!(
            body("income", Some(-1.0)).validate(now()).unwrap_err(),
            ValidationError::NegativeAmount
        );
        assert_eq!(
            body("income", None).validate(now()).unwrap_err(),
            ValidationError::AmountRequired
        );
        assert_eq!(
            body("income", Some(5e16)).validate(now()).unwrap_err(),
            ValidationError::AmountOutOfRange
        );
    }

    #[test]
    fn test_rejects_malformed_date() {
        let mut tx = body("income", Some(1.0));
        tx.date = Some("01/02/2024".into());
        assert_eq!(tx.validate(now()).unwrap_err(), ValidationError::DateFormat);
    }
}
