use crate::models::{NewTransaction, Transaction, UserId};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::debug;
use uuid::Uuid;

const TRANSACTION_COLUMNS: &str = "id, user_id, kind, occurred_at, amount_cents, payee, memo,
     category_id, source, tags, created_at, updated_at";

fn map_transaction(row: &Row<'_>) -> rusqlite::Result<Transaction> {
    Ok(Transaction {
        id: row.get(0)?,
        user_id: row.get(1)?,
        kind: row.get(2)?,
        occurred_at: row.get(3)?,
        amount: row.get(4)?,
        payee: row.get(5)?,
        memo: row.get(6)?,
        category_id: row.get(7)?,
        source: row.get(8)?,
        tags: row.get(9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}

/// Most recent live transactions first.
pub fn list_transactions(
    conn: &Connection,
    user_id: &UserId,
    limit: i64,
) -> rusqlite::Result<Vec<Transaction>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {TRANSACTION_COLUMNS}
         FROM transactions
         WHERE user_id = ? AND deleted_at IS NULL
         ORDER BY occurred_at DESC, created_at DESC, id DESC
         LIMIT ?"
    ))?;

    let transactions = stmt
        .query_map(params![user_id.as_str(), limit], map_transaction)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    debug!(count = transactions.len(), "Listed transactions");
    Ok(transactions)
}

/// Inserts a transaction. A `category_id` must name a live category owned by
/// the same user; otherwise nothing is written and `None` is returned.
pub fn create_transaction(
    conn: &Connection,
    user_id: &UserId,
    transaction: &NewTransaction,
) -> rusqlite::Result<Option<Transaction>> {
    let id = Uuid::new_v4().to_string();
    let created = conn
        .query_row(
            &format!(
                "INSERT INTO transactions
                    (id, user_id, kind, occurred_at, amount_cents, payee, memo, category_id, tags)
                 SELECT ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9
                 WHERE ?8 IS NULL OR EXISTS (
                     SELECT 1 FROM categories
                     WHERE id = ?8 AND user_id = ?2 AND deleted_at IS NULL
                 )
                 RETURNING {TRANSACTION_COLUMNS}"
            ),
            params![
                id,
                user_id.as_str(),
                transaction.kind,
                transaction.occurred_at,
                transaction.amount,
                transaction.payee,
                transaction.memo,
                transaction.category_id,
                transaction.tags,
            ],
            map_transaction,
        )
        .optional()?;

    match &created {
        Some(tx) => debug!(transaction_id = %tx.id, kind = %tx.kind, "Created transaction"),
        None => debug!(
            category_id = ?transaction.category_id,
            "Rejected transaction for a category the user does not own"
        ),
    }
    Ok(created)
}

/// Marks a live transaction as deleted. Returns false when the user has no
/// live transaction with that id.
pub fn soft_delete_transaction(
    conn: &Connection,
    user_id: &UserId,
    id: &str,
) -> rusqlite::Result<bool> {
    let rows = conn.execute(
        "UPDATE transactions
         SET deleted_at = strftime('%Y-%m-%dT%H:%M:%SZ', 'now'),
             updated_at = strftime('%Y-%m-%dT%H:%M:%SZ', 'now')
         WHERE id = ? AND user_id = ? AND deleted_at IS NULL",
        params![id, user_id.as_str()],
    )?;
    if rows > 0 {
        debug!(transaction_id = id, "Soft-deleted transaction");
    }
    Ok(rows > 0)
}
