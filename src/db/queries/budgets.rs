use crate::date_utils::Month;
use crate::models::{Budget, Money, UpsertOutcome, UserId};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::debug;
use uuid::Uuid;

fn map_budget(row: &Row<'_>) -> rusqlite::Result<Budget> {
    Ok(Budget {
        id: row.get(0)?,
        user_id: row.get(1)?,
        month: row.get(2)?,
        category_id: row.get(3)?,
        amount: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

pub fn list_budgets(
    conn: &Connection,
    user_id: &UserId,
    month: Month,
) -> rusqlite::Result<Vec<Budget>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, month, category_id, amount_cents, created_at, updated_at
         FROM budgets
         WHERE user_id = ? AND month = ? AND deleted_at IS NULL
         ORDER BY category_id",
    )?;

    let budgets = stmt
        .query_map(params![user_id.as_str(), month.to_string()], map_budget)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(budgets)
}

/// Sets the amount for `(user, month, category)` in one statement.
///
/// The insert carries a fresh id; on a key conflict the existing row keeps
/// its id and only `amount` (plus `updated_at`) changes, and a soft-deleted
/// row is revived. Comparing the returned id with the fresh one tells which
/// path the store took without a separate read. Returns `None`, writing
/// nothing, when the category is not a live category of the same user.
pub fn upsert_budget(
    conn: &Connection,
    user_id: &UserId,
    month: Month,
    category_id: &str,
    amount: Money,
) -> rusqlite::Result<Option<(Budget, UpsertOutcome)>> {
    let id = Uuid::new_v4().to_string();
    let budget = conn
        .query_row(
            "INSERT INTO budgets (id, user_id, month, category_id, amount_cents)
             SELECT ?1, ?2, ?3, ?4, ?5
             WHERE EXISTS (
                 SELECT 1 FROM categories
                 WHERE id = ?4 AND user_id = ?2 AND deleted_at IS NULL
             )
             ON CONFLICT (user_id, month, category_id) DO UPDATE SET
                 amount_cents = excluded.amount_cents,
                 updated_at = strftime('%Y-%m-%dT%H:%M:%SZ', 'now'),
                 deleted_at = NULL
             RETURNING id, user_id, month, category_id, amount_cents, created_at, updated_at",
            params![id, user_id.as_str(), month.to_string(), category_id, amount],
            map_budget,
        )
        .optional()?;

    let Some(budget) = budget else {
        debug!(%month, category_id, "Rejected budget for a category the user does not own");
        return Ok(None);
    };

    let outcome = if budget.id == id {
        UpsertOutcome::Created
    } else {
        UpsertOutcome::Replaced
    };
    debug!(
        budget_id = %budget.id,
        month = %budget.month,
        category_id = %budget.category_id,
        ?outcome,
        "Upserted budget"
    );
    Ok(Some((budget, outcome)))
}
