//! GeminiClient against a local stand-in for the generateContent API.

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use logo_verify::analysis::ImagePayload;
use logo_verify::clients::{AnalyzerError, GeminiClient, LogoAnalyzer};

#[derive(Clone)]
struct Recorded {
    path: String,
    api_key: Option<String>,
    body: Value,
}

#[derive(Clone)]
struct MockState {
    reply: Arc<dyn Fn() -> Response + Send + Sync>,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

async fn mock_generate(
    State(state): State<MockState>,
    uri: Uri,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.requests.lock().unwrap().push(Recorded {
        path: uri.path().to_string(),
        api_key: headers
            .get("x-goog-api-key")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body,
    });
    (state.reply)()
}

async fn start_mock<F>(reply: F) -> (String, Arc<Mutex<Vec<Recorded>>>)
where
    F: Fn() -> Response + Send + Sync + 'static,
{
    let requests = Arc::new(Mutex::new(Vec::new()));
    let state = MockState {
        reply: Arc::new(reply),
        requests: requests.clone(),
    };
    let app = Router::new().fallback(mock_generate).with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{}/v1beta", addr), requests)
}

fn client(base: &str) -> GeminiClient {
    GeminiClient::new("test-key", base, "gemini-test", Duration::from_secs(5)).unwrap()
}

fn candidate_reply(text: &str) -> Response {
    Json(json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] },
            "finishReason": "STOP"
        }]
    }))
    .into_response()
}

const ANALYSIS_JSON: &str = r#"{
  "brandName": "Acme",
  "companyInfo": "Maker of anvils",
  "foundingBackground": "Founded in 1920",
  "symbolicMeaning": "The anvil stands for strength",
  "similarityPercentage": 64.5,
  "originalityInterpretation": "Proportions differ from the official mark"
}"#;

#[tokio::test]
async fn test_analyze_sends_inline_image_and_schema() {
    let (base, requests) = start_mock(|| candidate_reply(ANALYSIS_JSON)).await;
    let image = ImagePayload::from_bytes(b"fake-png", "image/png");

    let result = client(&base).analyze(&image).await.unwrap();
    assert_eq!(result.brand_name, "Acme");
    assert_eq!(result.similarity_percentage, 64.5);

    let recorded = requests.lock().unwrap();
    assert_eq!(recorded.len(), 1);
    let req = &recorded[0];
    assert_eq!(req.path, "/v1beta/models/gemini-test:generateContent");
    assert_eq!(req.api_key.as_deref(), Some("test-key"));

    let parts = &req.body["contents"][0]["parts"];
    assert!(parts[0]["text"].as_str().unwrap().contains("logo"));
    assert_eq!(parts[1]["inlineData"]["mimeType"], "image/png");
    assert_eq!(parts[1]["inlineData"]["data"], image.base64());
    assert_eq!(
        req.body["generationConfig"]["responseSchema"]["required"]
            .as_array()
            .unwrap()
            .len(),
        6
    );
}

#[tokio::test]
async fn test_analyze_non_success_status() {
    let (base, _) = start_mock(|| {
        (
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({ "error": { "message": "quota exceeded" } })),
        )
            .into_response()
    })
    .await;

    let err = client(&base)
        .analyze(&ImagePayload::from_bytes(b"x", "image/png"))
        .await
        .unwrap_err();
    match err {
        AnalyzerError::Status { status, body } => {
            assert_eq!(status, 429);
            assert!(body.contains("quota exceeded"));
        }
        other => panic!("expected Status error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_analyze_blocked_prompt() {
    let (base, _) = start_mock(|| {
        Json(json!({ "promptFeedback": { "blockReason": "SAFETY" } })).into_response()
    })
    .await;

    let err = client(&base)
        .analyze(&ImagePayload::from_bytes(b"x", "image/png"))
        .await
        .unwrap_err();
    assert!(matches!(err, AnalyzerError::Blocked(_)));
}

#[tokio::test]
async fn test_analyze_schema_mismatch() {
    let (base, _) = start_mock(|| candidate_reply(r#"{"brandName":"Acme"}"#)).await;

    let err = client(&base)
        .analyze(&ImagePayload::from_bytes(b"x", "image/png"))
        .await
        .unwrap_err();
    assert!(matches!(err, AnalyzerError::ParseError(_)));
}

#[tokio::test]
async fn test_analyze_unreachable_host() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = client(&format!("http://{}/v1beta", addr))
        .analyze(&ImagePayload::from_bytes(b"x", "image/png"))
        .await
        .unwrap_err();
    assert!(matches!(err, AnalyzerError::Http(_)));
}
