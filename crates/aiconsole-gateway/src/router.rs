use axum::Router;
use axum::extract::Multipart;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, head, post};
use tower_http::trace::TraceLayer;
use tracing::warn;

use aiconsole_common::UserContext;
use aiconsole_db::DEFAULT_HISTORY_LIMIT;

use crate::state::SharedState;

/// Timestamp format used in process responses and the history view.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Build the application router with all console routes.
pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ai-console/process", post(process))
        .route("/ai-console/history", post(history))
        .route(
            "/ai-console/speech-to-text",
            head(speech_probe).post(speech_to_text),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn health() -> &'static str {
    "ok"
}

#[derive(serde::Deserialize)]
struct ProcessForm {
    input: Option<String>,
}

/// POST /ai-console/process runs one console turn for the requesting user.
async fn process(
    axum::extract::State(state): axum::extract::State<SharedState>,
    headers: HeaderMap,
    axum::extract::Form(form): axum::extract::Form<ProcessForm>,
) -> (StatusCode, axum::Json<serde_json::Value>) {
    if !is_xhr(&headers) {
        return (
            StatusCode::BAD_REQUEST,
            axum::Json(serde_json::json!({ "error": "Invalid request" })),
        );
    }

    if !state.config.console.enabled {
        return (
            StatusCode::FORBIDDEN,
            axum::Json(serde_json::json!({ "error": "Console is not enabled" })),
        );
    }

    let input = form.input.unwrap_or_default();
    if input.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            axum::Json(serde_json::json!({ "error": "No input provided" })),
        );
    }

    let user = user_from_headers(&headers);
    match state.orchestrator.process(&user, &input).await {
        Ok(response) => (
            StatusCode::OK,
            axum::Json(serde_json::json!({
                "success": true,
                "response": response,
                "timestamp": chrono::Local::now().format(TIMESTAMP_FORMAT).to_string(),
            })),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            axum::Json(serde_json::json!({
                "success": false,
                "error": e.to_string(),
            })),
        ),
    }
}

/// POST /ai-console/history lists the user's completed turns, oldest first.
async fn history(
    axum::extract::State(state): axum::extract::State<SharedState>,
    headers: HeaderMap,
) -> (StatusCode, axum::Json<serde_json::Value>) {
    if !is_xhr(&headers) {
        return (
            StatusCode::BAD_REQUEST,
            axum::Json(serde_json::json!({ "error": "Invalid request" })),
        );
    }

    let user = user_from_headers(&headers);
    let entries = {
        let store = state.store.lock().await;
        store.history(user.user_id.as_deref(), DEFAULT_HISTORY_LIMIT)
    };

    match entries {
        Ok(mut entries) => {
            entries.reverse();
            let history: Vec<serde_json::Value> = entries
                .iter()
                .map(|entry| {
                    serde_json::json!({
                        "prompt": entry.prompt,
                        "output": entry.output,
                        "timestamp": entry
                            .timestamp
                            .with_timezone(&chrono::Local)
                            .format(TIMESTAMP_FORMAT)
                            .to_string(),
                    })
                })
                .collect();
            (
                StatusCode::OK,
                axum::Json(serde_json::json!({
                    "success": true,
                    "history": history,
                })),
            )
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            axum::Json(serde_json::json!({
                "success": false,
                "error": e.to_string(),
            })),
        ),
    }
}

/// HEAD /ai-console/speech-to-text is the capability probe for the widget's
/// microphone button.
async fn speech_probe(
    axum::extract::State(state): axum::extract::State<SharedState>,
) -> (StatusCode, axum::Json<serde_json::Value>) {
    if state.config.speech.enabled {
        (
            StatusCode::OK,
            axum::Json(serde_json::json!({ "enabled": true })),
        )
    } else {
        (
            StatusCode::NOT_FOUND,
            axum::Json(serde_json::json!({ "enabled": false })),
        )
    }
}

/// POST /ai-console/speech-to-text forwards an audio clip to the
/// transcription backend.
async fn speech_to_text(
    axum::extract::State(state): axum::extract::State<SharedState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> (StatusCode, axum::Json<serde_json::Value>) {
    if !is_xhr(&headers) {
        return (
            StatusCode::BAD_REQUEST,
            axum::Json(serde_json::json!({ "error": "Invalid request" })),
        );
    }

    if !state.config.speech.enabled {
        return (
            StatusCode::FORBIDDEN,
            axum::Json(serde_json::json!({ "error": "Speech-to-text is not enabled" })),
        );
    }

    let Some(audio) = read_audio_part(multipart).await else {
        return (
            StatusCode::BAD_REQUEST,
            axum::Json(serde_json::json!({ "error": "No audio file provided" })),
        );
    };

    let user = user_from_headers(&headers);
    let language = user.language_code().unwrap_or("auto");

    match state
        .client
        .transcribe(
            audio,
            language,
            &state.config.speech.model,
            Some(&state.fingerprint),
        )
        .await
    {
        Ok(text) => (
            StatusCode::OK,
            axum::Json(serde_json::json!({ "success": true, "text": text })),
        ),
        Err(e) => {
            warn!("speech-to-text failed: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                axum::Json(serde_json::json!({ "error": "Speech-to-text processing failed" })),
            )
        }
    }
}

/// Pull the bytes of the `audio` multipart field, if present.
async fn read_audio_part(mut multipart: Multipart) -> Option<Vec<u8>> {
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() == Some("audio") {
            return field.bytes().await.ok().map(|bytes| bytes.to_vec());
        }
    }
    None
}

/// The console widget marks every call with this header, Symfony-style.
fn is_xhr(headers: &HeaderMap) -> bool {
    headers
        .get("x-requested-with")
        .and_then(|value| value.to_str().ok())
        == Some("XMLHttpRequest")
}

/// Identity forwarded by the fronting host. Missing headers mean an
/// anonymous session.
fn user_from_headers(headers: &HeaderMap) -> UserContext {
    UserContext {
        user_id: header_value(headers, "x-user-id"),
        first_name: header_value(headers, "x-user-firstname"),
        last_name: header_value(headers, "x-user-lastname"),
        email: header_value(headers, "x-user-email"),
        locale: header_value(headers, "x-user-locale"),
    }
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(|value| value.to_string())
}
