use aiconsole_common::{Error, Result};
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::tools::ToolDescriptor;

/// Endpoint used when no base URL is configured.
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Sampling temperature sent with every console completion.
const COMPLETION_TEMPERATURE: f64 = 0.3;

/// OpenAI-compatible completion and transcription client.
#[derive(Clone)]
pub struct CompletionClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl CompletionClient {
    pub fn new(api_key: String, base_url: Option<String>) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        }
    }

    /// One chat completion round-trip. Tools are advertised (with
    /// `tool_choice = "auto"`) only when `tools` is non-empty.
    pub async fn complete(
        &self,
        model: &str,
        messages: Vec<ChatMessage>,
        tools: &[ToolDescriptor],
        fingerprint: Option<&str>,
    ) -> Result<CompletionMessage> {
        let url = format!("{}/chat/completions", self.base_url);

        let wire_tools = if tools.is_empty() {
            None
        } else {
            Some(
                tools
                    .iter()
                    .map(|tool| WireTool {
                        kind: "function".to_string(),
                        function: WireFunction {
                            name: tool.function_name.clone(),
                            description: tool.description.clone(),
                            parameters: tool.input_schema(),
                        },
                    })
                    .collect(),
            )
        };
        let tool_choice = wire_tools.as_ref().map(|_| "auto".to_string());

        let request = CompletionRequest {
            model: model.to_string(),
            messages,
            temperature: COMPLETION_TEMPERATURE,
            tools: wire_tools,
            tool_choice,
            fingerprint: fingerprint.map(|f| f.to_string()),
        };

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Service(format!("completion request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Service(format!(
                "completion API error ({status}): {body}"
            )));
        }

        let completion: CompletionResponse = response
            .json()
            .await
            .map_err(|e| Error::Service(format!("failed to parse completion response: {e}")))?;

        let choice = completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| Error::Service("no choices in completion response".to_string()))?;

        Ok(convert_message(choice.message))
    }

    /// Transcribe an audio clip. `language` is a base language subtag; the
    /// value "auto" means unspecified and is not forwarded.
    pub async fn transcribe(
        &self,
        audio: Vec<u8>,
        language: &str,
        model: &str,
        fingerprint: Option<&str>,
    ) -> Result<String> {
        let url = format!("{}/audio/transcriptions", self.base_url);

        let mut form = Form::new()
            .part("file", Part::bytes(audio).file_name("audio.wav"))
            .text("model", model.to_string());
        if language != "auto" {
            form = form.text("language", language.to_string());
        }
        if let Some(fingerprint) = fingerprint {
            form = form.text("fingerprint", fingerprint.to_string());
        }

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .multipart(form)
            .send()
            .await
            .map_err(|e| Error::Service(format!("transcription request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Service(format!(
                "transcription API error ({status}): {body}"
            )));
        }

        let transcription: TranscriptionResponse = response
            .json()
            .await
            .map_err(|e| Error::Service(format!("failed to parse transcription response: {e}")))?;

        Ok(transcription.text)
    }

    /// Model ids available behind the configured endpoint.
    pub async fn list_models(&self) -> Result<Vec<String>> {
        let url = format!("{}/models", self.base_url);

        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
            .map_err(|e| Error::Service(format!("models request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Service(format!(
                "models API error ({status}): {body}"
            )));
        }

        let listing: ModelsResponse = response
            .json()
            .await
            .map_err(|e| Error::Service(format!("failed to parse models response: {e}")))?;

        Ok(listing.data.into_iter().map(|model| model.id).collect())
    }
}

/// Chat message in the completion request body.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum ChatMessage {
    System { content: String },
    User { content: String },
    Assistant { content: String },
}

#[derive(Debug, Serialize)]
struct CompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<WireTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fingerprint: Option<String>,
}

#[derive(Debug, Serialize)]
struct WireTool {
    #[serde(rename = "type")]
    kind: String,
    function: WireFunction,
}

#[derive(Debug, Serialize)]
struct WireFunction {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: WireMessage,
}

#[derive(Debug, Deserialize)]
struct WireMessage {
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<WireToolCall>,
}

#[derive(Debug, Deserialize)]
struct WireToolCall {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    function: Option<WireFunctionCall>,
}

#[derive(Debug, Deserialize)]
struct WireFunctionCall {
    name: String,
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

#[derive(Debug, Deserialize)]
struct ModelsResponse {
    data: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
struct ModelEntry {
    id: String,
}

/// The assistant message from `choices[0]`.
#[derive(Debug, Clone)]
pub struct CompletionMessage {
    pub content: Option<String>,
    pub tool_calls: Vec<ToolCallRequest>,
}

/// One tool invocation requested by the model. `arguments` is the decoded
/// JSON object, or a string value when the model emitted malformed JSON.
#[derive(Debug, Clone)]
pub struct ToolCallRequest {
    pub id: String,
    pub kind: String,
    pub function_name: String,
    pub arguments: Value,
}

fn convert_message(message: WireMessage) -> CompletionMessage {
    let tool_calls = message
        .tool_calls
        .into_iter()
        .map(|call| {
            let (function_name, raw_arguments) = match call.function {
                Some(function) => (function.name, function.arguments),
                None => (String::new(), String::new()),
            };
            let arguments = serde_json::from_str(&raw_arguments)
                .unwrap_or_else(|_| Value::String(raw_arguments.clone()));
            ToolCallRequest {
                id: call.id,
                kind: call.kind,
                function_name,
                arguments,
            }
        })
        .collect();

    CompletionMessage {
        content: message.content,
        tool_calls,
    }
}
