//! Shared helpers: an in-process mock upstream and a gateway app built like production.
#![allow(dead_code)]

use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, Method, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use di::{Injectable, ServiceCollection};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tower::ServiceExt;
use tutor_gateway::api;
use tutor_gateway::core::services::MyTutorService;
use tutor_gateway::infrastructure::config::GatewayConfig;
use tutor_gateway::infrastructure::upstream::AnthropicClient;

pub const TEST_API_KEY: &str = "test-key";

pub enum MockReply {
    /// Answer 200 with this text as the only content block.
    Text(String),
    /// Answer 200 with this exact body.
    Raw(Value),
    Status(u16),
}

type Recorded = Arc<Mutex<Vec<(HeaderMap, Value)>>>;

pub struct MockUpstream {
    pub url: String,
    pub requests: Recorded,
}

impl MockUpstream {
    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

/// Serves a fake completion API on an ephemeral local port.
pub async fn spawn_upstream(reply: MockReply) -> MockUpstream {
    let requests: Recorded = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new()
        .route("/v1/messages", post(mock_messages))
        .with_state((Arc::new(reply), requests.clone()));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockUpstream {
        url: format!("http://{addr}/v1/messages"),
        requests,
    }
}

async fn mock_messages(
    State((reply, requests)): State<(Arc<MockReply>, Recorded)>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    requests.lock().unwrap().push((headers, body));
    match &*reply {
        MockReply::Text(text) => {
            Json(json!({ "content": [{ "type": "text", "text": text }] })).into_response()
        }
        MockReply::Raw(body) => Json(body.clone()).into_response(),
        MockReply::Status(status) => {
            (StatusCode::from_u16(*status).unwrap(), "upstream unavailable").into_response()
        }
    }
}

/// Configuration pointing at `upstream` with a credential, or credential-less for `None`.
pub fn config_for(upstream: Option<&MockUpstream>) -> GatewayConfig {
    match upstream {
        Some(upstream) => GatewayConfig {
            api_key: Some(TEST_API_KEY.to_owned()),
            upstream_url: upstream.url.clone(),
            upstream_timeout: Duration::from_secs(5),
            ..GatewayConfig::default()
        },
        None => GatewayConfig::default(),
    }
}

/// Builds the gateway exactly as `main` does, using `config` instead of the environment.
pub fn create_test_app(config: GatewayConfig) -> Router {
    GatewayConfig::set_test_config(config);

    let provider = ServiceCollection::new()
        .add(GatewayConfig::singleton())
        .add(AnthropicClient::singleton())
        .add(MyTutorService::scoped())
        .build_provider()
        .unwrap();

    api::app(provider)
}

pub fn cleanup_test_config() {
    GatewayConfig::clear_test_config();
}

pub async fn call(
    app: Router,
    method: Method,
    uri: &str,
    body: Option<&str>,
) -> (StatusCode, HeaderMap, Vec<u8>) {
    let mut builder = Request::builder().method(method).uri(uri);
    if body.is_some() {
        builder = builder.header("content-type", "application/json");
    }
    let request = builder
        .body(body.map_or_else(Body::empty, |b| Body::from(b.to_owned())))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    (status, headers, body.to_vec())
}

pub async fn post_json(app: Router, uri: &str, body: &str) -> (StatusCode, Value) {
    let (status, _, body) = call(app, Method::POST, uri, Some(body)).await;
    (status, serde_json::from_slice(&body).unwrap())
}

/// Checks every key of the reply contract is present with the right type.
pub fn assert_tutor_reply_shape(reply: &Value) {
    assert!(
        reply["tutorResponse"].as_str().is_some_and(|s| !s.is_empty()),
        "tutorResponse must be a non-empty string: {reply}"
    );
    assert!(reply["czechTranslation"].is_string() || reply["czechTranslation"].is_null());
    for key in ["positive", "corrections", "suggestions"] {
        assert!(reply["feedback"][key].is_array(), "feedback.{key} missing: {reply}");
    }
    let accuracy = reply["grammarAnalysis"]["accuracy"].as_u64().unwrap();
    assert!(accuracy <= 100);
    assert!(reply["grammarAnalysis"]["detectedLevel"].is_string());
    assert!(reply["grammarAnalysis"]["strengths"].is_array());
    assert!(reply["grammarAnalysis"]["improvements"].is_array());
    assert!(reply["vocabularyUsed"].as_array().unwrap().len() <= 5);
    assert!(reply["progressNotes"].is_string());
}
