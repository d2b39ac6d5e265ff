use crate::models::{Category, NewCategory, UserId};
use rusqlite::{params, Connection, Row};
use tracing::debug;
use uuid::Uuid;

fn map_category(row: &Row<'_>) -> rusqlite::Result<Category> {
    Ok(Category {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        parent_id: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

pub fn list_categories(conn: &Connection, user_id: &UserId) -> rusqlite::Result<Vec<Category>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, name, parent_id, created_at, updated_at
         FROM categories
         WHERE user_id = ? AND deleted_at IS NULL
         ORDER BY name ASC, id ASC",
    )?;

    let categories = stmt
        .query_map([user_id.as_str()], map_category)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(categories)
}

pub fn create_category(
    conn: &Connection,
    user_id: &UserId,
    category: &NewCategory,
) -> rusqlite::Result<Category> {
    let id = Uuid::new_v4().to_string();
    let created = conn.query_row(
        "INSERT INTO categories (id, user_id, name, parent_id)
         VALUES (?, ?, ?, ?)
         RETURNING id, user_id, name, parent_id, created_at, updated_at",
        params![id, user_id.as_str(), category.name, category.parent_id],
        map_category,
    )?;
    debug!(category_id = %created.id, name = %created.name, "Created category");
    Ok(created)
}
