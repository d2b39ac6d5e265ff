//! Integration tests for the auth layer and the public surface.

mod common;

use axum::http::StatusCode;
use budgex::config::AuthMode;
use common::TestClient;

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let client = TestClient::new();

    for uri in [
        "/api/me",
        "/api/transactions",
        "/api/budgets",
        "/api/analytics/spend_summary?month=2024-01",
        "/api/analytics/cashflow_forecast",
    ] {
        let (status, body) = client.send("GET", uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
        assert_eq!(body["error"], "unauthorized", "{uri}");
    }
}

#[tokio::test]
async fn test_unknown_token_is_unauthorized() {
    let client = TestClient::new();

    let (status, _) = client
        .send("GET", "/api/me", Some("not-a-token"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_rejected_write_leaves_store_untouched() {
    let client = TestClient::new();

    let (status, _) = client
        .send(
            "POST",
            "/api/categories",
            None,
            Some(serde_json::json!({ "name": "food" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let conn = client.pool().get().unwrap();
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM categories", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn test_token_resolves_to_user() {
    let client = TestClient::new();

    let (status, body) = client.get_as("u2", "/api/me").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user_id"], "u2");
}

#[tokio::test]
async fn test_unauthenticated_mode_uses_dev_user() {
    let client = TestClient::with_auth_mode(AuthMode::Unauthenticated {
        dev_user: "local".into(),
    });

    let (status, body) = client.send("GET", "/api/me", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user_id"], "local");
}

#[tokio::test]
async fn test_health_is_public() {
    let client = TestClient::new();

    let (status, body) = client.send("GET", "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert_eq!(body["service"], "budgex-test");
    assert_eq!(body["version"], budgex::VERSION);
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let client = TestClient::new();

    let (status, body) = client.send("GET", "/nope", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}
