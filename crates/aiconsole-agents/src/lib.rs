pub mod client;
pub mod orchestrator;
pub mod prompt;
pub mod registry;
pub mod tools;

pub use client::{ChatMessage, CompletionClient, CompletionMessage, ToolCallRequest};
pub use orchestrator::{ConsoleOrchestrator, OrchestratorSettings};
pub use prompt::{build_messages, build_system_prompt, language_from_locale};
pub use registry::{ToolRegistry, ToolServices, function_name, tool_identifier};
pub use tools::{
    CacheService, ContactFields, ContactService, CreatedContact, CreatedSegment, NewSegment,
    ParameterSpec, ParameterType, SegmentService, Tool, ToolDescriptor, ToolResult,
};
