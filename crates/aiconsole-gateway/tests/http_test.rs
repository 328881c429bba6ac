use std::sync::Arc;

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use aiconsole_agents::ToolServices;
use aiconsole_config::AppConfig;
use aiconsole_db::ConversationStore;
use aiconsole_gateway::router::build_router;
use aiconsole_gateway::state::AppState;

/// Config pointed at a mock completion backend.
fn test_config(backend_url: &str) -> AppConfig {
    let mut config = AppConfig::default();
    config.llm.base_url = Some(backend_url.to_string());
    config.llm.api_key = Some("sk-test".to_string());
    config
}

/// Spawn the gateway on an ephemeral port and return its base URL.
async fn spawn_gateway(config: AppConfig) -> String {
    let store = ConversationStore::in_memory().expect("in-memory store should open");
    let state = AppState::new(config, store, ToolServices::default()).expect("state should build");
    let app = build_router(Arc::new(state));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });

    format!("http://{addr}")
}

fn content_response(content: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "choices": [{"message": {"role": "assistant", "content": content}}]
    }))
}

fn audio_form() -> reqwest::multipart::Form {
    reqwest::multipart::Form::new().part(
        "audio",
        reqwest::multipart::Part::bytes(vec![1u8, 2, 3]).file_name("clip.wav"),
    )
}

#[tokio::test]
async fn test_health() {
    let backend = MockServer::start().await;
    let base = spawn_gateway(test_config(&backend.uri())).await;

    let resp = reqwest::get(format!("{base}/health")).await.expect("get");
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.expect("body"), "ok");
}

#[tokio::test]
async fn test_endpoints_reject_non_xhr() {
    let backend = MockServer::start().await;
    let base = spawn_gateway(test_config(&backend.uri())).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{base}/ai-console/process"))
        .form(&[("input", "Hello")])
        .send()
        .await
        .expect("post");
    assert_eq!(resp.status(), 400);
    let body: serde_json::Value = resp.json().await.expect("json");
    assert_eq!(body["error"], "Invalid request");

    let resp = client
        .post(format!("{base}/ai-console/history"))
        .send()
        .await
        .expect("post");
    assert_eq!(resp.status(), 400);
    let body: serde_json::Value = resp.json().await.expect("json");
    assert_eq!(body["error"], "Invalid request");

    let resp = client
        .post(format!("{base}/ai-console/speech-to-text"))
        .multipart(audio_form())
        .send()
        .await
        .expect("post");
    assert_eq!(resp.status(), 400);
    let body: serde_json::Value = resp.json().await.expect("json");
    assert_eq!(body["error"], "Invalid request");
}

#[tokio::test]
async fn test_process_requires_input() {
    let backend = MockServer::start().await;
    let base = spawn_gateway(test_config(&backend.uri())).await;

    let resp = reqwest::Client::new()
        .post(format!("{base}/ai-console/process"))
        .header("X-Requested-With", "XMLHttpRequest")
        .form(&[("input", "")])
        .send()
        .await
        .expect("post");

    assert_eq!(resp.status(), 400);
    let body: serde_json::Value = resp.json().await.expect("json");
    assert_eq!(body["error"], "No input provided");
}

#[tokio::test]
async fn test_process_when_console_disabled() {
    let backend = MockServer::start().await;
    let mut config = test_config(&backend.uri());
    config.console.enabled = false;
    let base = spawn_gateway(config).await;

    let resp = reqwest::Client::new()
        .post(format!("{base}/ai-console/process"))
        .header("X-Requested-With", "XMLHttpRequest")
        .form(&[("input", "Hello")])
        .send()
        .await
        .expect("post");

    assert_eq!(resp.status(), 403);
    let body: serde_json::Value = resp.json().await.expect("json");
    assert_eq!(body["error"], "Console is not enabled");
}

#[tokio::test]
async fn test_process_and_history_roundtrip() {
    let backend = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(content_response("Hi there"))
        .mount(&backend)
        .await;

    let base = spawn_gateway(test_config(&backend.uri())).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{base}/ai-console/process"))
        .header("X-Requested-With", "XMLHttpRequest")
        .header("X-User-Id", "3")
        .form(&[("input", "Hello")])
        .send()
        .await
        .expect("post");

    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.expect("json");
    assert_eq!(body["success"], true);
    assert_eq!(body["response"], "Hi there");
    assert_eq!(body["timestamp"].as_str().expect("timestamp").len(), 19);

    let resp = client
        .post(format!("{base}/ai-console/history"))
        .header("X-Requested-With", "XMLHttpRequest")
        .header("X-User-Id", "3")
        .send()
        .await
        .expect("post");

    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.expect("json");
    assert_eq!(body["success"], true);
    let history = body["history"].as_array().expect("history array");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["prompt"], "Hello");
    assert_eq!(history[0]["output"], "Hi there");
    assert_eq!(
        history[0]["timestamp"].as_str().expect("timestamp").len(),
        19
    );
}

#[tokio::test]
async fn test_process_reports_backend_failure() {
    let backend = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream down"))
        .mount(&backend)
        .await;

    let base = spawn_gateway(test_config(&backend.uri())).await;

    let resp = reqwest::Client::new()
        .post(format!("{base}/ai-console/process"))
        .header("X-Requested-With", "XMLHttpRequest")
        .form(&[("input", "Hello")])
        .send()
        .await
        .expect("post");

    assert_eq!(resp.status(), 500);
    let body: serde_json::Value = resp.json().await.expect("json");
    assert_eq!(body["success"], false);
    let error = body["error"].as_str().expect("error message");
    assert!(error.contains("completion API error"), "got: {error}");
}

#[tokio::test]
async fn test_history_is_scoped_and_oldest_first() {
    let backend = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(content_response("first answer"))
        .up_to_n_times(1)
        .mount(&backend)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(content_response("second answer"))
        .mount(&backend)
        .await;

    let base = spawn_gateway(test_config(&backend.uri())).await;
    let client = reqwest::Client::new();

    for input in ["first question", "second question"] {
        let resp = client
            .post(format!("{base}/ai-console/process"))
            .header("X-Requested-With", "XMLHttpRequest")
            .header("X-User-Id", "3")
            .form(&[("input", input)])
            .send()
            .await
            .expect("post");
        assert_eq!(resp.status(), 200);
    }
    let resp = client
        .post(format!("{base}/ai-console/process"))
        .header("X-Requested-With", "XMLHttpRequest")
        .form(&[("input", "anonymous question")])
        .send()
        .await
        .expect("post");
    assert_eq!(resp.status(), 200);

    let resp = client
        .post(format!("{base}/ai-console/history"))
        .header("X-Requested-With", "XMLHttpRequest")
        .header("X-User-Id", "3")
        .send()
        .await
        .expect("post");
    let body: serde_json::Value = resp.json().await.expect("json");
    let history = body["history"].as_array().expect("history array");
    assert_eq!(history.len(), 2);
    assert_eq!(history[0]["prompt"], "first question");
    assert_eq!(history[0]["output"], "first answer");
    assert_eq!(history[1]["prompt"], "second question");
    assert_eq!(history[1]["output"], "second answer");

    let resp = client
        .post(format!("{base}/ai-console/history"))
        .header("X-Requested-With", "XMLHttpRequest")
        .send()
        .await
        .expect("post");
    let body: serde_json::Value = resp.json().await.expect("json");
    let history = body["history"].as_array().expect("history array");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["prompt"], "anonymous question");
}

#[tokio::test]
async fn test_speech_probe_reflects_config() {
    let backend = MockServer::start().await;
    let client = reqwest::Client::new();

    let mut config = test_config(&backend.uri());
    config.speech.enabled = true;
    let base = spawn_gateway(config).await;
    let resp = client
        .head(format!("{base}/ai-console/speech-to-text"))
        .send()
        .await
        .expect("head");
    assert_eq!(resp.status(), 200);

    let base = spawn_gateway(test_config(&backend.uri())).await;
    let resp = client
        .head(format!("{base}/ai-console/speech-to-text"))
        .send()
        .await
        .expect("head");
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn test_speech_submit_when_disabled() {
    let backend = MockServer::start().await;
    let base = spawn_gateway(test_config(&backend.uri())).await;

    let resp = reqwest::Client::new()
        .post(format!("{base}/ai-console/speech-to-text"))
        .header("X-Requested-With", "XMLHttpRequest")
        .multipart(audio_form())
        .send()
        .await
        .expect("post");

    assert_eq!(resp.status(), 403);
    let body: serde_json::Value = resp.json().await.expect("json");
    assert_eq!(body["error"], "Speech-to-text is not enabled");
}

#[tokio::test]
async fn test_speech_requires_audio_field() {
    let backend = MockServer::start().await;
    let mut config = test_config(&backend.uri());
    config.speech.enabled = true;
    let base = spawn_gateway(config).await;

    let form = reqwest::multipart::Form::new().text("note", "no audio here");
    let resp = reqwest::Client::new()
        .post(format!("{base}/ai-console/speech-to-text"))
        .header("X-Requested-With", "XMLHttpRequest")
        .multipart(form)
        .send()
        .await
        .expect("post");

    assert_eq!(resp.status(), 400);
    let body: serde_json::Value = resp.json().await.expect("json");
    assert_eq!(body["error"], "No audio file provided");
}

#[tokio::test]
async fn test_speech_transcription_forwards_language() {
    let backend = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/audio/transcriptions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"text": "hello from mic"})))
        .mount(&backend)
        .await;

    let mut config = test_config(&backend.uri());
    config.speech.enabled = true;
    let base = spawn_gateway(config).await;

    let resp = reqwest::Client::new()
        .post(format!("{base}/ai-console/speech-to-text"))
        .header("X-Requested-With", "XMLHttpRequest")
        .header("X-User-Locale", "fr_FR")
        .multipart(audio_form())
        .send()
        .await
        .expect("post");

    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.expect("json");
    assert_eq!(body["success"], true);
    assert_eq!(body["text"], "hello from mic");

    let requests = backend.received_requests().await.expect("requests");
    assert_eq!(requests.len(), 1);
    let wire = String::from_utf8_lossy(&requests[0].body);
    assert!(wire.contains("name=\"file\""), "got: {wire}");
    assert!(wire.contains("filename=\"audio.wav\""), "got: {wire}");
    assert!(wire.contains("name=\"language\""), "got: {wire}");
    assert!(wire.contains("\r\n\r\nfr\r\n"), "got: {wire}");
    assert!(wire.contains("name=\"model\""), "got: {wire}");
    assert!(wire.contains("whisper-1"), "got: {wire}");
    assert!(wire.contains("name=\"fingerprint\""), "got: {wire}");
}

#[tokio::test]
async fn test_speech_backend_failure() {
    let backend = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/audio/transcriptions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("backend down"))
        .mount(&backend)
        .await;

    let mut config = test_config(&backend.uri());
    config.speech.enabled = true;
    let base = spawn_gateway(config).await;

    let resp = reqwest::Client::new()
        .post(format!("{base}/ai-console/speech-to-text"))
        .header("X-Requested-With", "XMLHttpRequest")
        .multipart(audio_form())
        .send()
        .await
        .expect("post");

    assert_eq!(resp.status(), 500);
    let body: serde_json::Value = resp.json().await.expect("json");
    assert_eq!(body["error"], "Speech-to-text processing failed");
}
