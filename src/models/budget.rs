use serde::{Deserialize, Serialize};

use super::Money;

/// Planned spend for one category in one month. At most one live row exists
/// per `(user_id, month, category_id)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Budget {
    pub id: String,
    pub user_id: String,
    pub month: String,
    pub category_id: String,
    pub amount: Money,
    pub created_at: String,
    pub updated_at: String,
}

/// Which path an upsert took.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UpsertOutcome {
    Created,
    Replaced,
}
