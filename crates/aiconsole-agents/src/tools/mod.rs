use aiconsole_common::Result;
use async_trait::async_trait;
use serde_json::{Map, Value, json};

pub mod builtin;

/// JSON schema type of a tool parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterType {
    String,
    Boolean,
    Integer,
}

impl ParameterType {
    pub fn json_name(self) -> &'static str {
        match self {
            ParameterType::String => "string",
            ParameterType::Boolean => "boolean",
            ParameterType::Integer => "integer",
        }
    }
}

/// One declared parameter of a tool.
#[derive(Debug, Clone, Copy)]
pub struct ParameterSpec {
    pub name: &'static str,
    pub kind: ParameterType,
    pub description: &'static str,
    pub required: bool,
}

/// Outcome of a tool execution. A `success = false` result carries the error
/// text shown to the user; `data` is a structured payload for embedders.
#[derive(Debug, Clone)]
pub struct ToolResult {
    pub success: bool,
    pub message: Option<String>,
    pub error: Option<String>,
    pub data: Value,
}

impl ToolResult {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            error: None,
            data: Value::Null,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: None,
            error: Some(error.into()),
            data: Value::Null,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }
}

/// A console tool the model can invoke by function name.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Type identifier such as `CreateContactTool`. The wire-facing function
    /// name is derived from it, see [`crate::registry::function_name`].
    fn identifier(&self) -> &'static str;

    /// Human-readable title.
    fn title(&self) -> &'static str;

    fn description(&self) -> &'static str;

    fn parameters(&self) -> &'static [ParameterSpec];

    /// Execute with the model-supplied arguments. Expected failures (bad
    /// input, missing collaborator, backend errors) come back as a
    /// `success = false` result; `Err` is reserved for faults the tool could
    /// not handle itself.
    async fn execute(&self, args: Value) -> Result<ToolResult>;
}

/// Wire-facing description of an enabled tool, advertised to the model.
#[derive(Debug, Clone)]
pub struct ToolDescriptor {
    pub function_name: String,
    pub description: String,
    pub parameters: &'static [ParameterSpec],
}

impl ToolDescriptor {
    /// JSON schema for the function parameters. The `required` list is
    /// omitted when no parameter is required.
    pub fn input_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();
        for param in self.parameters {
            properties.insert(
                param.name.to_string(),
                json!({
                    "type": param.kind.json_name(),
                    "description": param.description,
                }),
            );
            if param.required {
                required.push(Value::String(param.name.to_string()));
            }
        }

        let mut schema = Map::new();
        schema.insert("type".to_string(), Value::String("object".to_string()));
        schema.insert("properties".to_string(), Value::Object(properties));
        if !required.is_empty() {
            schema.insert("required".to_string(), Value::Array(required));
        }
        Value::Object(schema)
    }
}

/// Fields for a new CRM contact. `None` fields are left unset on the created
/// record.
#[derive(Debug, Clone, Default)]
pub struct ContactFields {
    pub email: Option<String>,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CreatedContact {
    pub id: i64,
}

/// A segment to create, alias already derived from the name.
#[derive(Debug, Clone)]
pub struct NewSegment {
    pub name: String,
    pub alias: String,
    pub active: bool,
}

#[derive(Debug, Clone)]
pub struct CreatedSegment {
    pub id: i64,
}

/// Host-side contact backend. The shipped binary wires no collaborators;
/// embedders provide implementations against their own stores.
#[async_trait]
pub trait ContactService: Send + Sync {
    async fn create_contact(&self, fields: &ContactFields) -> Result<CreatedContact>;
}

#[async_trait]
pub trait SegmentService: Send + Sync {
    async fn create_segment(&self, segment: &NewSegment) -> Result<CreatedSegment>;
}

#[async_trait]
pub trait CacheService: Send + Sync {
    async fn clear_cache(&self) -> Result<()>;
}
