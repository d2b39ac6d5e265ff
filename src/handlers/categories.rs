use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use serde::Deserialize;

use super::{json_body, non_blank};
use crate::auth::AuthUser;
use crate::db::queries::categories;
use crate::error::{AppResult, ValidationError};
use crate::models::{Category, NewCategory};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct CreateCategory {
    pub name: Option<String>,
    pub parent_id: Option<String>,
}

impl CreateCategory {
    pub fn validate(self) -> Result<NewCategory, ValidationError> {
        let name = self
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .ok_or(ValidationError::NameRequired)?;

        Ok(NewCategory {
            name,
            parent_id: non_blank(self.parent_id),
        })
    }
}

pub async fn list(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<Vec<Category>>> {
    let conn = state.db.get()?;
    Ok(Json(categories::list_categories(&conn, &user_id)?))
}

pub async fn create(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    payload: Result<Json<CreateCategory>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Category>)> {
    let new_category = json_body(payload)?.validate()?;
    let conn = state.db.get()?;

    let category = categories::create_category(&conn, &user_id, &new_category)?;
    Ok((StatusCode::CREATED, Json(category)))
}
