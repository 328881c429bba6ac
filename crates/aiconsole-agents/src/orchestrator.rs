use std::sync::Arc;

use aiconsole_common::{Error, Result, UserContext};
use aiconsole_db::{ConversationStore, DEFAULT_CONTEXT_LIMIT};
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

use crate::client::{CompletionClient, ToolCallRequest};
use crate::prompt::{build_messages, build_system_prompt};
use crate::registry::ToolRegistry;
use crate::tools::ToolResult;

/// Static settings for the orchestrator, resolved once at startup.
#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    pub model: String,
    pub system_prompt: String,
    pub app_version: Option<String>,
    pub fingerprint: Option<String>,
}

/// Runs one console submission end to end: log a pending conversation entry,
/// call the completion service with recent context, dispatch any requested
/// tools, and persist the final answer.
pub struct ConsoleOrchestrator {
    store: Arc<Mutex<ConversationStore>>,
    registry: ToolRegistry,
    client: CompletionClient,
    model: String,
    system_prompt: String,
    app_version: Option<String>,
    fingerprint: Option<String>,
}

impl ConsoleOrchestrator {
    pub fn new(
        store: Arc<Mutex<ConversationStore>>,
        registry: ToolRegistry,
        client: CompletionClient,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            store,
            registry,
            client,
            model: settings.model,
            system_prompt: settings.system_prompt,
            app_version: settings.app_version,
            fingerprint: settings.fingerprint,
        }
    }

    /// Process one user input and return the assistant's answer.
    ///
    /// The pending entry is appended before the completion call; if that call
    /// (or tool dispatch persistence) fails, the entry keeps `output = NULL`
    /// and never shows up in context or history.
    #[instrument(skip(self, input), fields(user_id = ?user.user_id))]
    pub async fn process(&self, user: &UserContext, input: &str) -> Result<String> {
        let entry_id = {
            let store = self.store.lock().await;
            store.append(user.user_id.as_deref(), input, Some(&self.model))?
        };

        let history = {
            let store = self.store.lock().await;
            let mut entries =
                store.recent_completed(user.user_id.as_deref(), DEFAULT_CONTEXT_LIMIT)?;
            entries.reverse();
            entries
        };

        let system_prompt = build_system_prompt(
            &self.system_prompt,
            user,
            self.app_version.as_deref(),
        );
        let messages = build_messages(&system_prompt, &history, input);
        let descriptors = self.registry.descriptors();

        let completion = self
            .client
            .complete(
                &self.model,
                messages,
                &descriptors,
                self.fingerprint.as_deref(),
            )
            .await?;

        let answer = if !completion.tool_calls.is_empty() {
            self.dispatch_tool_calls(&completion.tool_calls).await
        } else if let Some(content) = completion.content.filter(|content| !content.is_empty()) {
            content
        } else {
            // Empty content with no tool calls is a malformed response, not
            // an empty answer; the pending entry stays incomplete.
            return Err(Error::Service(
                "completion response contained neither content nor tool calls".to_string(),
            ));
        };

        let completed = {
            let store = self.store.lock().await;
            store.complete_entry(entry_id, &answer)?
        };
        if !completed {
            warn!(entry_id, "conversation entry vanished before completion");
        }

        Ok(answer)
    }

    /// Execute the requested calls sequentially, in model order. Only calls
    /// of type "function" are honored. Each outcome renders as one line;
    /// lines are joined with a blank line to form the final answer.
    async fn dispatch_tool_calls(&self, calls: &[ToolCallRequest]) -> String {
        info!(count = calls.len(), "dispatching tool calls");

        let mut lines = Vec::new();
        for call in calls {
            if call.kind != "function" {
                continue;
            }
            let rendered = match self.registry.resolve(&call.function_name) {
                Some(tool) => match tool.execute(call.arguments.clone()).await {
                    Ok(result) => format_tool_result(&call.function_name, &result),
                    Err(e) => format!("Error executing {}: {e}", call.function_name),
                },
                None => format!(
                    "Error executing {}: unknown tool: {}",
                    call.function_name, call.function_name
                ),
            };
            lines.push(rendered);
        }
        lines.join("\n\n")
    }
}

fn format_tool_result(function_name: &str, result: &ToolResult) -> String {
    if result.success {
        let message = result.message.as_deref().unwrap_or("");
        format!("✅ **{function_name}** executed successfully: {message}")
    } else {
        let error = result.error.as_deref().unwrap_or("unknown error");
        format!("❌ **{function_name}** failed: {error}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_success_line() {
        let result = ToolResult::success("Cache cleared");
        assert_eq!(
            format_tool_result("clear_cache", &result),
            "✅ **clear_cache** executed successfully: Cache cleared"
        );
    }

    #[test]
    fn test_format_failure_line() {
        let result = ToolResult::failure("Segment name is required");
        assert_eq!(
            format_tool_result("create_segment", &result),
            "❌ **create_segment** failed: Segment name is required"
        );
    }

    #[test]
    fn test_format_failure_without_detail() {
        let result = ToolResult {
            success: false,
            message: None,
            error: None,
            data: serde_json::Value::Null,
        };
        assert_eq!(
            format_tool_result("create_contact", &result),
            "❌ **create_contact** failed: unknown error"
        );
    }
}
