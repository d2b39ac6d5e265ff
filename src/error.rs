use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;
use thiserror::Error;

/// Caller mistakes detected before any write. Each carries a stable,
/// machine-readable reason code.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("month must be formatted as YYYY-MM")]
    MonthFormat,

    #[error("category_id is required")]
    CategoryRequired,

    #[error("amount is required")]
    AmountRequired,

    #[error("amount must be a non-negative number")]
    NegativeAmount,

    #[error("amount is too large")]
    AmountOutOfRange,

    #[error("category_id does not name one of the caller's categories")]
    UnknownCategory,

    #[error("name is required")]
    NameRequired,

    #[error("type must be income or expense")]
    InvalidKind,

    #[error("date must be RFC 3339 or YYYY-MM-DD")]
    DateFormat,
}

impl ValidationError {
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::MonthFormat => "month_format_YYYY-MM",
            ValidationError::CategoryRequired => "category_id_required",
            ValidationError::AmountRequired => "amount_required",
            ValidationError::NegativeAmount => "amount_must_be_non_negative",
            ValidationError::AmountOutOfRange => "amount_out_of_range",
            ValidationError::UnknownCategory => "category_not_found",
            ValidationError::NameRequired => "name_required",
            ValidationError::InvalidKind => "type_must_be_income_or_expense",
            ValidationError::DateFormat => "date_format_rfc3339",
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Bad request: {0}")]
    BadRequest(&'static str),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Not found: {0}")]
    NotFound(&'static str),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Amount overflow in {0}")]
    Overflow(&'static str),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Database(_) | AppError::Pool(_) | AppError::Io(_) | AppError::Overflow(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            AppError::Validation(e) => json!({ "error": e.code() }),
            AppError::BadRequest(code) | AppError::NotFound(code) => json!({ "error": code }),
            AppError::Unauthorized => json!({ "error": "unauthorized" }),
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                json!({ "error": "database_error", "detail": e.to_string() })
            }
            AppError::Pool(e) => {
                tracing::error!("Pool error: {:?}", e);
                json!({ "error": "database_unavailable", "detail": e.to_string() })
            }
            AppError::Io(e) => {
                tracing::error!("IO error: {:?}", e);
                json!({ "error": "io_error", "detail": e.to_string() })
            }
            AppError::Overflow(context) => {
                tracing::error!(context = *context, "Amount overflow");
                json!({ "error": "amount_overflow", "detail": self.to_string() })
            }
        };

        (status, Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

/// Startup configuration problems.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{name} is not a valid port: {value}")]
    InvalidPort { name: &'static str, value: String },

    #[error("BUDGEX_API_TOKENS entry {0:?} must look like token=user_id")]
    InvalidTokenEntry(String),

    #[error("BUDGEX_API_TOKENS is not set. Configure token=user_id pairs or '{0}' to explicitly allow unauthenticated access.")]
    MissingTokens(&'static str),

    #[error("BUDGEX_DEV_USER must not be empty")]
    EmptyDevUser,

    #[error("Unknown log format {0:?}, expected 'pretty' or 'json'")]
    InvalidLogFormat(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::from(ValidationError::MonthFormat).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(AppError::BadRequest("bad_json").status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AppError::from(rusqlite::Error::QueryReturnedNoRows).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::Overflow("cashflow net").status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_reason_codes_are_stable() {
        assert_eq!(ValidationError::MonthFormat.code(), "month_format_YYYY-MM");
        assert_eq!(
            ValidationError::NegativeAmount.code(),
            "amount_must_be_non_negative"
        );
        assert_eq!(ValidationError::AmountOutOfRange.code(), "amount_out_of_range");
        assert_eq!(ValidationError::UnknownCategory.code(), "category_not_found");
    }
}
