use rusqlite::{params, Connection};

use crate::models::{Money, TransactionKind, UserId};

/// Summed expense amount for one `(category id, category name)` group.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryTotal {
    pub category_id: Option<String>,
    pub category_name: Option<String>,
    pub total: Money,
}

/// Income and expense sums for one calendar month.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyTotals {
    /// `YYYY-MM`
    pub month: String,
    pub income: Money,
    pub expense: Money,
}

/// Sum of live amounts per kind with `from <= occurred_at < to`.
/// Kinds without rows are zero.
pub fn totals_by_kind(
    conn: &Connection,
    user_id: &UserId,
    from: &str,
    to: &str,
) -> rusqlite::Result<(Money, Money)> {
    let mut stmt = conn.prepare(
        "SELECT kind, COALESCE(SUM(amount_cents), 0)
         FROM transactions
         WHERE user_id = ? AND deleted_at IS NULL
           AND occurred_at >= ? AND occurred_at < ?
         GROUP BY kind",
    )?;

    let rows = stmt
        .query_map(params![user_id.as_str(), from, to], |row| {
            Ok((row.get::<_, TransactionKind>(0)?, row.get::<_, Money>(1)?))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut income = Money::ZERO;
    let mut expense = Money::ZERO;
    for (kind, total) in rows {
        match kind {
            TransactionKind::Income => income = total,
            TransactionKind::Expense => expense = total,
        }
    }
    Ok((income, expense))
}

/// Live expense sums in `[from, to)` grouped by category, largest first, with
/// the uncategorised bucket always last.
pub fn expense_by_category(
    conn: &Connection,
    user_id: &UserId,
    from: &str,
    to: &str,
) -> rusqlite::Result<Vec<CategoryTotal>> {
    let mut stmt = conn.prepare(
        "SELECT t.category_id, c.name, COALESCE(SUM(t.amount_cents), 0) AS total
         FROM transactions t
         LEFT JOIN categories c ON c.id = t.category_id AND c.user_id = t.user_id
         WHERE t.user_id = ? AND t.deleted_at IS NULL
           AND t.kind = 'expense'
           AND t.occurred_at >= ? AND t.occurred_at < ?
         GROUP BY t.category_id, c.name
         ORDER BY t.category_id IS NULL, total DESC, c.name ASC, t.category_id ASC",
    )?;

    let totals = stmt
        .query_map(params![user_id.as_str(), from, to], |row| {
            Ok(CategoryTotal {
                category_id: row.get(0)?,
                category_name: row.get(1)?,
                total: row.get(2)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(totals)
}

/// Per-month live totals for months strictly before `before`, newest first,
/// at most `limit` months.
pub fn monthly_totals_before(
    conn: &Connection,
    user_id: &UserId,
    before: &str,
    limit: u32,
) -> rusqlite::Result<Vec<MonthlyTotals>> {
    let mut stmt = conn.prepare(
        "SELECT substr(occurred_at, 1, 7) AS month,
                COALESCE(SUM(CASE WHEN kind = 'income' THEN amount_cents ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN kind = 'expense' THEN amount_cents ELSE 0 END), 0)
         FROM transactions
         WHERE user_id = ? AND deleted_at IS NULL
           AND occurred_at < ?
         GROUP BY month
         ORDER BY month DESC
         LIMIT ?",
    )?;

    let months = stmt
        .query_map(params![user_id.as_str(), before, limit], |row| {
            Ok(MonthlyTotals {
                month: row.get(0)?,
                income: row.get(1)?,
                expense: row.get(2)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(months)
}
