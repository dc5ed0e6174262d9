//! HttpMailSender against a local stand-in for the mail API.

use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use wordrop_mailer::{HttpMailSender, MailConfig, MailError, NotificationSender};
use wordrop_types::Email;

#[derive(Default)]
struct Captured {
    bodies: Vec<serde_json::Value>,
    api_keys: Vec<String>,
}

struct MockApi {
    status: StatusCode,
    captured: Mutex<Captured>,
}

async fn accept(
    State(api): State<Arc<MockApi>>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> StatusCode {
    let mut captured = api.captured.lock().unwrap();
    captured.bodies.push(body);
    captured.api_keys.push(
        headers
            .get("api-key")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string(),
    );
    api.status
}

async fn spawn_mock(status: StatusCode) -> (String, Arc<MockApi>) {
    let api = Arc::new(MockApi {
        status,
        captured: Mutex::new(Captured::default()),
    });
    let app = Router::new()
        .route("/v3/smtp/email", post(accept))
        .with_state(api.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}/v3/smtp/email"), api)
}

fn config(api_url: String) -> MailConfig {
    MailConfig {
        api_url,
        api_key: "test-key".into(),
        sender_email: "noreply@wordrop.example".into(),
        base_url: "https://wordrop.example".into(),
        ..MailConfig::default()
    }
}

#[tokio::test]
async fn posts_message_with_api_key() {
    let (url, api) = spawn_mock(StatusCode::CREATED).await;
    let sender = HttpMailSender::new(config(url)).unwrap();
    let email = Email::parse("reader@example.com").unwrap();

    sender
        .send_verification(&email, "reader", "aaa.bbb.ccc")
        .await
        .unwrap();

    let captured = api.captured.lock().unwrap();
    assert_eq!(captured.api_keys, vec!["test-key".to_string()]);
    let body = &captured.bodies[0];
    assert_eq!(body["to"][0]["email"], "reader@example.com");
    assert_eq!(body["to"][0]["name"], "reader");
    assert!(body["textContent"]
        .as_str()
        .unwrap()
        .contains("https://wordrop.example/subscriptions/verify?token=aaa.bbb.ccc"));
}

#[tokio::test]
async fn non_success_status_is_rejected() {
    let (url, _api) = spawn_mock(StatusCode::BAD_REQUEST).await;
    let sender = HttpMailSender::new(config(url)).unwrap();
    let email = Email::parse("reader@example.com").unwrap();

    let err = sender
        .send_verification(&email, "reader", "t")
        .await
        .unwrap_err();
    assert!(matches!(err, MailError::Rejected { status: 400 }));
}

#[tokio::test]
async fn unreachable_api_is_transport_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let sender = HttpMailSender::new(config(format!("http://{addr}/v3/smtp/email"))).unwrap();
    let email = Email::parse("reader@example.com").unwrap();
    let err = sender
        .send_verification(&email, "reader", "t")
        .await
        .unwrap_err();
    assert!(matches!(err, MailError::Transport(_)));
}
