//! End-to-end HTTP behaviour over nullable collaborators.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use tower::ServiceExt;
use wordrop_crypto::{CodeGenerator, TokenCodec};
use wordrop_nullables::{NullClock, NullEntropy, NullMailer, NullStore};
use wordrop_rpc::router;
use wordrop_subscription::Governor;
use wordrop_types::{Clock, Email, GovernorParams};

struct Api {
    app: Router,
    store: Arc<NullStore>,
    mailer: Arc<NullMailer>,
    clock: Arc<NullClock>,
}

fn api_with(params: GovernorParams) -> Api {
    let store = Arc::new(NullStore::new());
    let mailer = Arc::new(NullMailer::new());
    let clock = Arc::new(NullClock::new(1_700_000_000));
    let governor = Governor::new(
        store.clone(),
        mailer.clone(),
        TokenCodec::new(b"http-test-secret", params.token_ttl_secs).unwrap(),
        CodeGenerator::with_entropy(params.code_length, Box::new(NullEntropy::new())).unwrap(),
        clock.clone() as Arc<dyn Clock>,
        params,
    );
    Api {
        app: router(Arc::new(governor)),
        store,
        mailer,
        clock,
    }
}

fn api() -> Api {
    api_with(GovernorParams::default())
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn subscribe(body: &str) -> Request<Body> {
    Request::post("/subscriptions")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn verify(token: &str) -> Request<Body> {
    Request::get(format!("/subscriptions/verify?token={token}"))
        .body(Body::empty())
        .unwrap()
}

const READER: &str = r#"{"username":"reader","email":"reader@example.com"}"#;

#[tokio::test]
async fn health_is_ok() {
    let api = api();
    let (status, body) = send(
        &api.app,
        Request::get("/health").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!({"status": "ok"}));
}

#[tokio::test]
async fn subscribe_then_verify() {
    let api = api();

    let (status, _) = send(&api.app, subscribe(READER)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(api.mailer.sent_count(), 1);

    let token = api.mailer.last_token().unwrap();
    let (status, _) = send(&api.app, verify(&token)).await;
    assert_eq!(status, StatusCode::OK);
    let email = Email::parse("reader@example.com").unwrap();
    assert!(api.store.get(&email).unwrap().verified);

    api.clock.advance(61);
    let (status, body) = send(&api.app, subscribe(READER)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "subscription is already verified");
}

#[tokio::test]
async fn invalid_input_is_bad_request() {
    let api = api();
    for body in [
        r#"{"username":"","email":"reader@example.com"}"#,
        r#"{"username":"reader","email":"nope"}"#,
        r#"{"username":"reader"}"#,
        "not json",
    ] {
        let (status, response) = send(&api.app, subscribe(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
        assert!(response["message"].is_string());
    }
    assert_eq!(api.mailer.sent_count(), 0);
    assert!(api.store.is_empty());
}

#[tokio::test]
async fn cooldown_is_too_many_requests() {
    let api = api();
    send(&api.app, subscribe(READER)).await;

    api.clock.advance(30);
    let response = api.app.clone().oneshot(subscribe(READER)).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response.headers()[header::RETRY_AFTER], "30");
}

#[tokio::test]
async fn ban_is_forbidden() {
    let api = api();
    for _ in 0..3 {
        let (status, _) = send(&api.app, subscribe(READER)).await;
        assert_eq!(status, StatusCode::OK);
        api.clock.advance(61);
    }
    let (status, _) = send(&api.app, subscribe(READER)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(api.mailer.sent_count(), 3);
}

#[tokio::test]
async fn bad_tokens_get_one_opaque_answer() {
    let api = api();
    send(&api.app, subscribe(READER)).await;
    let token = api.mailer.last_token().unwrap();

    let (garbage_status, garbage) = send(&api.app, verify("garbage")).await;
    assert_eq!(garbage_status, StatusCode::BAD_REQUEST);

    api.clock.advance(15 * 60);
    let (expired_status, expired) = send(&api.app, verify(&token)).await;
    assert_eq!(expired_status, StatusCode::BAD_REQUEST);
    assert_eq!(garbage, expired);
    assert_eq!(expired["message"], "invalid or expired verification link");
}

#[tokio::test]
async fn missing_token_is_bad_request() {
    let api = api();
    let (status, body) = send(
        &api.app,
        Request::get("/subscriptions/verify").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "token is required");
}

#[tokio::test]
async fn mail_outage_is_internal_error_without_details() {
    let api = api();
    api.mailer.set_failing(true);
    let (status, body) = send(&api.app, subscribe(READER)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "internal server error");
}

#[tokio::test]
async fn stalled_store_is_unavailable() {
    let api = api_with(GovernorParams {
        call_timeout_ms: 50,
        ..GovernorParams::default()
    });
    api.store.set_delay(Some(Duration::from_millis(500)));
    let (status, _) = send(&api.app, subscribe(READER)).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}
