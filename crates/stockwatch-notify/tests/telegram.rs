//! Integration tests for `TelegramNotifier::deliver`.
//!
//! Uses `wiremock` so no real Telegram traffic is made. Covers payload
//! shape, thread routing, the stale-thread fallback, and rejection
//! propagation.

use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use stockwatch_notify::{NotifyError, TelegramNotifier};

fn notifier(server: &MockServer) -> TelegramNotifier {
    TelegramNotifier::with_base_url(
        reqwest::Client::new(),
        "123:token",
        "-1001234567890",
        server.uri(),
    )
}

fn ok_body() -> serde_json::Value {
    json!({"ok": true, "result": {"message_id": 42}})
}

#[tokio::test]
async fn deliver_posts_a_markdown_message_to_the_chat() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/bot123:token/sendMessage"))
        .and(body_partial_json(json!({
            "chat_id": "-1001234567890",
            "text": "🔥 *Croma Stock Alert* 🏬",
            "parse_mode": "Markdown",
            "disable_web_page_preview": true
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_body()))
        .expect(1)
        .mount(&server)
        .await;

    let result = notifier(&server)
        .deliver("🔥 *Croma Stock Alert* 🏬", None)
        .await;

    assert!(result.is_ok(), "expected Ok, got: {result:?}");
}

#[tokio::test]
async fn deliver_routes_into_the_requested_thread() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/bot123:token/sendMessage"))
        .and(body_partial_json(json!({"message_thread_id": 99})))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_body()))
        .expect(1)
        .mount(&server)
        .await;

    let result = notifier(&server).deliver("alert", Some(99)).await;

    assert!(result.is_ok(), "expected Ok, got: {result:?}");
}

#[tokio::test]
async fn stale_thread_falls_back_to_the_default_channel() {
    let server = MockServer::start().await;

    // The threaded attempt is rejected with Telegram's thread-missing
    // description; the bare retry must succeed.
    Mock::given(method("POST"))
        .and(path("/bot123:token/sendMessage"))
        .and(body_partial_json(json!({"message_thread_id": 99})))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "ok": false,
            "error_code": 400,
            "description": "Bad Request: message thread not found"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/bot123:token/sendMessage"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_body()))
        .expect(1)
        .mount(&server)
        .await;

    let result = notifier(&server).deliver("alert", Some(99)).await;

    assert!(result.is_ok(), "expected Ok after fallback, got: {result:?}");
}

#[tokio::test]
async fn other_rejections_propagate_without_a_retry() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/bot123:token/sendMessage"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "ok": false,
            "error_code": 400,
            "description": "Bad Request: chat not found"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let result = notifier(&server).deliver("alert", Some(99)).await;

    match result {
        Err(NotifyError::Rejected { status, description }) => {
            assert_eq!(status, 400);
            assert!(description.contains("chat not found"));
        }
        other => panic!("expected NotifyError::Rejected, got: {other:?}"),
    }
}

#[tokio::test]
async fn server_error_with_an_empty_body_is_a_rejection() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/bot123:token/sendMessage"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let result = notifier(&server).deliver("alert", None).await;

    assert!(
        matches!(
            result,
            Err(NotifyError::Rejected { status: 502, ref description }) if description == "no description"
        ),
        "expected NotifyError::Rejected, got: {result:?}"
    );
}
