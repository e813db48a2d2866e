//! HTTP API integration tests.
//!
//! Tests for REST API endpoints (health check, participant list, CORS).

mod fixtures;
use fixtures::{TestServer, connect, join, next_message, wait_for_connections};

#[tokio::test]
async fn test_health_endpoint() {
    // テスト項目: /api/health エンドポイントが正常に動作する
    // given (前提条件):
    let server = TestServer::start().await;
    let client = reqwest::Client::new();

    // when (操作):
    let response = client
        .get(format!("{}/api/health", server.base_url()))
        .send()
        .await
        .expect("Failed to send request");

    // then (期待する結果):
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_participants_endpoint_empty() {
    // テスト項目: 接続がない場合は空の一覧を返す
    // given (前提条件):
    let server = TestServer::start().await;
    let client = reqwest::Client::new();

    // when (操作):
    let response = client
        .get(format!("{}/api/participants", server.base_url()))
        .send()
        .await
        .expect("Failed to send request");

    // then (期待する結果):
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["connections"], 0);
    assert_eq!(body["participants"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_participants_endpoint_lists_joined_only() {
    // テスト項目: 参加済みの接続だけが participants に含まれ、connections は全接続数になる
    // given (前提条件):
    let server = TestServer::start().await;
    let mut alice = connect(&server).await;
    let _lurker = connect(&server).await;
    join(&mut alice, "Alice").await;
    next_message(&mut alice).await;
    wait_for_connections(&server, 2).await;

    // when (操作):
    let body: serde_json::Value = reqwest::get(format!("{}/api/participants", server.base_url()))
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse JSON");

    // then (期待する結果):
    assert_eq!(body["connections"], 2);
    let participants = body["participants"].as_array().unwrap();
    assert_eq!(participants.len(), 1);
    assert_eq!(participants[0]["display_name"], "Alice");
    assert!(participants[0]["connection_id"].is_string());
    assert!(
        participants[0]["joined_at"]
            .as_str()
            .unwrap()
            .ends_with("+09:00")
    );
}

#[tokio::test]
async fn test_cors_allows_configured_origin() {
    // テスト項目: 設定されたオリジンに対して CORS ヘッダーが返される
    // given (前提条件):
    let server = TestServer::start().await;
    let client = reqwest::Client::new();

    // when (操作):
    let response = client
        .get(format!("{}/api/health", server.base_url()))
        .header("Origin", "http://localhost:3000")
        .send()
        .await
        .expect("Failed to send request");

    // then (期待する結果):
    assert_eq!(response.status(), 200);
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("http://localhost:3000")
    );
}

#[tokio::test]
async fn test_cors_ignores_other_origin() {
    // テスト項目: 他のオリジンには CORS 許可ヘッダーを返さない
    // given (前提条件):
    let server = TestServer::start().await;
    let client = reqwest::Client::new();

    // when (操作):
    let response = client
        .get(format!("{}/api/health", server.base_url()))
        .header("Origin", "http://evil.example")
        .send()
        .await
        .expect("Failed to send request");

    // then (期待する結果):
    assert!(response.headers().get("access-control-allow-origin").is_none());
}
