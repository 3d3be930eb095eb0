//! Unit tests for the JSON body extractor

use axum::extract::FromRequest;
use axum::http::{Request, StatusCode};
use axum::response::IntoResponse;
use tutor_gateway::api::GatewayJson;
use tutor_gateway::api::chat::schemas::ChatRequest;
use tutor_gateway::core::error::GatewayError;
use tutor_gateway::core::models::Language;

fn request(body: &str) -> Request<axum::body::Body> {
    Request::builder()
        .method("POST")
        .uri("/api/chat")
        .body(axum::body::Body::from(body.to_owned()))
        .unwrap()
}

#[tokio::test]
async fn test_extract_valid_body_without_content_type() {
    let req = request(r#"{"message":"hello","userProfile":{"selectedLanguage":"swedish"}}"#);

    let result = GatewayJson::<ChatRequest>::from_request(req, &()).await;

    let GatewayJson(chat) = result.unwrap();
    assert_eq!(chat.message.as_deref(), Some("hello"));
    assert_eq!(chat.user_profile.unwrap().selected_language, Language::Swedish);
    assert!(chat.conversation_history.is_none());
}

#[tokio::test]
async fn test_extract_empty_object() {
    let result = GatewayJson::<ChatRequest>::from_request(request("{}"), &()).await;

    let GatewayJson(chat) = result.unwrap();
    assert!(chat.message.is_none());
}

#[tokio::test]
async fn test_extract_malformed_json() {
    let result = GatewayJson::<ChatRequest>::from_request(request("{\"message\":"), &()).await;

    let error = result.unwrap_err();
    assert!(matches!(error, GatewayError::Validation(_)));
    assert_eq!(error.into_response().status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_extract_empty_body() {
    let result = GatewayJson::<ChatRequest>::from_request(request(""), &()).await;

    assert!(matches!(result, Err(GatewayError::Validation(_))));
}

#[tokio::test]
async fn test_extract_wrong_field_type() {
    let result =
        GatewayJson::<ChatRequest>::from_request(request(r#"{"message":42}"#), &()).await;

    let error = result.unwrap_err();
    assert!(error.to_string().contains("invalid request body"));
}
