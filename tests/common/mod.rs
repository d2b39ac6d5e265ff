//! Shared test utilities for integration tests.
//!
//! `TestClient` drives the full router (auth layer included) against a fresh
//! in-memory database. Requests are made as one of the users in the static
//! token table; `token_for("u1")` is `"token-u1"`.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use budgex::auth::StaticTokens;
use budgex::config::{AuthMode, Config};
use budgex::db::{create_in_memory_pool, create_pool, migrations, DbPool};
use budgex::models::UserId;
use budgex::observability::{LogConfig, LogFormat, Telemetry};
use budgex::server;
use budgex::services::forecast::TrailingAverage;
use budgex::state::AppState;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

pub const USERS: &[&str] = &["u1", "u2"];

pub fn token_for(user: &str) -> String {
    format!("token-{user}")
}

pub fn user(id: &str) -> UserId {
    UserId::new(id).expect("non-empty user id")
}

/// In-memory pool with all migrations applied.
pub fn migrated_pool() -> DbPool {
    let pool = create_in_memory_pool().expect("Failed to create in-memory pool");
    {
        let conn = pool.get().expect("Failed to get connection");
        migrations::run_migrations(&conn, Path::new("migrations"))
            .expect("Failed to run migrations");
    }
    pool
}

/// File-backed pool with several connections, for tests that need real
/// concurrency. Keep the returned directory alive for the test's duration.
pub fn migrated_file_pool() -> (tempfile::TempDir, DbPool) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let pool = create_pool(&dir.path().join("budgex.db")).expect("Failed to create pool");
    {
        let conn = pool.get().expect("Failed to get connection");
        migrations::run_migrations(&conn, Path::new("migrations"))
            .expect("Failed to run migrations");
    }
    (dir, pool)
}

pub struct TestClient {
    state: AppState,
}

impl TestClient {
    /// Bearer-token mode with a token for every entry in [`USERS`].
    pub fn new() -> Self {
        let tokens: HashMap<String, String> = USERS
            .iter()
            .map(|u| (token_for(u), u.to_string()))
            .collect();
        Self::with_auth_mode(AuthMode::Bearer { tokens })
    }

    pub fn with_auth_mode(auth_mode: AuthMode) -> Self {
        let verifier = match &auth_mode {
            AuthMode::Bearer { tokens } => StaticTokens::new(tokens),
            AuthMode::Unauthenticated { .. } => StaticTokens::default(),
        };

        let config = Config {
            host: "127.0.0.1".into(),
            port: 8080,
            database_path: PathBuf::from(":memory:"),
            migrations_path: PathBuf::from("migrations"),
            auth_mode,
            log: LogConfig {
                service: "budgex-test".into(),
                filter: "budgex=debug".into(),
                format: LogFormat::Pretty,
            },
        };

        let state = AppState {
            db: migrated_pool(),
            config: Arc::new(config),
            verifier: Arc::new(verifier),
            projection: Arc::new(TrailingAverage),
            telemetry: Telemetry::new("budgex-test"),
        };

        Self { state }
    }

    pub fn pool(&self) -> &DbPool {
        &self.state.db
    }

    pub fn router(&self) -> Router {
        server::router(self.state.clone())
    }

    /// Sends a request and returns the status and the parsed JSON body
    /// (`Value::Null` for an empty body).
    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).to_string())
            })
        };
        (status, value)
    }

    pub async fn get_as(&self, user: &str, uri: &str) -> (StatusCode, Value) {
        self.send("GET", uri, Some(&token_for(user)), None).await
    }

    pub async fn post_as(&self, user: &str, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send("POST", uri, Some(&token_for(user)), Some(body))
            .await
    }

    pub async fn delete_as(&self, user: &str, uri: &str) -> (StatusCode, Value) {
        self.send("DELETE", uri, Some(&token_for(user)), None).await
    }

    /// Sends a raw, possibly malformed, JSON body.
    pub async fn post_raw_as(&self, user: &str, uri: &str, body: &str) -> StatusCode {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("Authorization", format!("Bearer {}", token_for(user)))
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.router().oneshot(request).await.unwrap().status()
    }

    // =========================================================================
    // Helper methods for creating entities through the API
    // =========================================================================

    /// Creates a category and returns its id.
    pub async fn create_category(&self, user: &str, name: &str) -> String {
        let (status, body) = self
            .post_as(user, "/api/categories", serde_json::json!({ "name": name }))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_str().unwrap().to_string()
    }

    /// Creates a transaction and returns its id.
    pub async fn create_transaction(
        &self,
        user: &str,
        kind: &str,
        date: &str,
        amount: f64,
        category_id: Option<&str>,
    ) -> String {
        let (status, body) = self
            .post_as(
                user,
                "/api/transactions",
                serde_json::json!({
                    "type": kind,
                    "date": date,
                    "amount": amount,
                    "category_id": category_id,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_str().unwrap().to_string()
    }
}

impl Default for TestClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Inserts a transaction straight into the store, bypassing HTTP.
pub fn insert_transaction(
    conn: &rusqlite::Connection,
    user_id: &str,
    kind: budgex::models::TransactionKind,
    occurred_at: &str,
    cents: i64,
    category_id: Option<&str>,
) -> String {
    let new = budgex::models::NewTransaction {
        kind,
        occurred_at: occurred_at.to_string(),
        amount: budgex::models::Money::from_cents(cents),
        payee: None,
        memo: None,
        category_id: category_id.map(String::from),
        tags: None,
    };
    budgex::db::queries::transactions::create_transaction(conn, &user(user_id), &new)
        .expect("Failed to insert transaction")
        .expect("Category must belong to the user")
        .id
}

/// Inserts a category straight into the store and returns its id.
pub fn insert_category(conn: &rusqlite::Connection, user_id: &str, name: &str) -> String {
    let new = budgex::models::NewCategory {
        name: name.to_string(),
        parent_id: None,
    };
    budgex::db::queries::categories::create_category(conn, &user(user_id), &new)
        .expect("Failed to insert category")
        .id
}

/// Live and soft-deleted budget rows stored for one key.
pub fn budget_rows(conn: &rusqlite::Connection, user_id: &str, month: &str, category_id: &str) -> i64 {
    conn.query_row(
        "SELECT COUNT(*) FROM budgets WHERE user_id = ? AND month = ? AND category_id = ?",
        [user_id, month, category_id],
        |row| row.get(0),
    )
    .expect("Failed to count budget rows")
}
