use std::sync::Arc;

use aiconsole_common::Result;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Value, json};

use crate::tools::{
    CacheService, ContactFields, ContactService, NewSegment, ParameterSpec, ParameterType,
    SegmentService, Tool, ToolResult,
};

/// Non-empty string argument, treating absent, null, and "" alike.
fn string_arg(args: &Value, name: &str) -> Option<String> {
    args.get(name)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
        .map(|value| value.to_string())
}

// ---------------------------------------------------------------------------
// CreateContactTool
// ---------------------------------------------------------------------------

const CONTACT_PARAMETERS: &[ParameterSpec] = &[
    ParameterSpec {
        name: "email",
        kind: ParameterType::String,
        description: "Email address of the contact",
        required: false,
    },
    ParameterSpec {
        name: "name",
        kind: ParameterType::String,
        description: "Last name of the contact",
        required: false,
    },
    ParameterSpec {
        name: "firstname",
        kind: ParameterType::String,
        description: "First name of the contact",
        required: false,
    },
];

/// Creates a CRM contact from whichever of email, firstname, and name the
/// model supplied. The `name` argument maps to the last-name field.
pub struct CreateContactTool {
    contacts: Option<Arc<dyn ContactService>>,
}

impl CreateContactTool {
    pub fn new(contacts: Option<Arc<dyn ContactService>>) -> Self {
        Self { contacts }
    }
}

#[async_trait]
impl Tool for CreateContactTool {
    fn identifier(&self) -> &'static str {
        "CreateContactTool"
    }

    fn title(&self) -> &'static str {
        "Create Contact"
    }

    fn description(&self) -> &'static str {
        "Tool to create a contact in the CRM"
    }

    fn parameters(&self) -> &'static [ParameterSpec] {
        CONTACT_PARAMETERS
    }

    async fn execute(&self, args: Value) -> Result<ToolResult> {
        let email = string_arg(&args, "email");
        let firstname = string_arg(&args, "firstname");
        let lastname = string_arg(&args, "name");

        if email.is_none() && firstname.is_none() && lastname.is_none() {
            return Ok(ToolResult::failure(
                "At least one contact field (email, firstname, or name) is required",
            ));
        }

        let Some(contacts) = &self.contacts else {
            return Ok(ToolResult::failure(
                "Contact service not available for contact creation",
            ));
        };

        let fields = ContactFields {
            email: email.clone(),
            firstname: firstname.clone(),
            lastname: lastname.clone(),
        };
        let created = match contacts.create_contact(&fields).await {
            Ok(created) => created,
            Err(e) => return Ok(ToolResult::failure(e.to_string())),
        };

        let values: Vec<&str> = [&email, &firstname, &lastname]
            .into_iter()
            .filter_map(|field| field.as_deref())
            .collect();

        let mut contact_data = serde_json::Map::new();
        if let Some(email) = &email {
            contact_data.insert("email".to_string(), json!(email));
        }
        if let Some(firstname) = &firstname {
            contact_data.insert("firstname".to_string(), json!(firstname));
        }
        if let Some(lastname) = &lastname {
            contact_data.insert("lastname".to_string(), json!(lastname));
        }

        let url = format!("/s/contacts/edit/{}", created.id);
        let message = format!(
            "Contact created successfully with <strong>{}</strong>. \
             <a href=\"{url}\" target=\"_blank\">View contact</a>",
            values.join(", ")
        );

        Ok(ToolResult::success(message).with_data(json!({
            "contact_id": created.id,
            "contact_data": contact_data,
            "url": url,
        })))
    }
}

// ---------------------------------------------------------------------------
// CreateSegmentTool
// ---------------------------------------------------------------------------

const SEGMENT_PARAMETERS: &[ParameterSpec] = &[
    ParameterSpec {
        name: "name",
        kind: ParameterType::String,
        description: "Name of the segment",
        required: true,
    },
    ParameterSpec {
        name: "active",
        kind: ParameterType::Boolean,
        description: "Whether the segment should be active (defaults to true)",
        required: false,
    },
];

/// Creates a contact segment. The alias is derived from the name: lowercased
/// alphanumeric characters plus a unix-seconds suffix.
pub struct CreateSegmentTool {
    segments: Option<Arc<dyn SegmentService>>,
}

impl CreateSegmentTool {
    pub fn new(segments: Option<Arc<dyn SegmentService>>) -> Self {
        Self { segments }
    }
}

fn segment_alias(name: &str) -> String {
    let base: String = name.chars().filter(|c| c.is_ascii_alphanumeric()).collect();
    format!("{}_{}", base.to_ascii_lowercase(), Utc::now().timestamp())
}

#[async_trait]
impl Tool for CreateSegmentTool {
    fn identifier(&self) -> &'static str {
        "CreateSegmentTool"
    }

    fn title(&self) -> &'static str {
        "Create Segment"
    }

    fn description(&self) -> &'static str {
        "Tool to create a contact segment in the CRM"
    }

    fn parameters(&self) -> &'static [ParameterSpec] {
        SEGMENT_PARAMETERS
    }

    async fn execute(&self, args: Value) -> Result<ToolResult> {
        let Some(name) = string_arg(&args, "name") else {
            return Ok(ToolResult::failure("Segment name is required"));
        };
        let active = args.get("active").and_then(Value::as_bool).unwrap_or(true);

        let Some(segments) = &self.segments else {
            return Ok(ToolResult::failure(
                "Segment service not available for segment creation",
            ));
        };

        let segment = NewSegment {
            name: name.clone(),
            alias: segment_alias(&name),
            active,
        };
        let created = match segments.create_segment(&segment).await {
            Ok(created) => created,
            Err(e) => return Ok(ToolResult::failure(e.to_string())),
        };

        let url = format!("/s/segments/edit/{}", created.id);
        let state = if active { "(active)" } else { "(inactive)" };
        let message = format!(
            "Segment <strong>\"{name}\"</strong> created successfully {state}. \
             <a href=\"{url}\" target=\"_blank\">View segment</a>"
        );

        Ok(ToolResult::success(message).with_data(json!({
            "segment_id": created.id,
            "segment_name": name,
            "is_active": active,
            "alias": segment.alias,
            "url": url,
        })))
    }
}

// ---------------------------------------------------------------------------
// ClearCacheTool
// ---------------------------------------------------------------------------

/// Clears the host application cache. Takes no parameters.
pub struct ClearCacheTool {
    cache: Option<Arc<dyn CacheService>>,
}

impl ClearCacheTool {
    pub fn new(cache: Option<Arc<dyn CacheService>>) -> Self {
        Self { cache }
    }
}

#[async_trait]
impl Tool for ClearCacheTool {
    fn identifier(&self) -> &'static str {
        "ClearCacheTool"
    }

    fn title(&self) -> &'static str {
        "Clear Cache"
    }

    fn description(&self) -> &'static str {
        "Tool to clear the application cache"
    }

    fn parameters(&self) -> &'static [ParameterSpec] {
        &[]
    }

    async fn execute(&self, _args: Value) -> Result<ToolResult> {
        let Some(cache) = &self.cache else {
            return Ok(ToolResult::failure("Cache service not available"));
        };

        match cache.clear_cache().await {
            Ok(()) => Ok(ToolResult::success(
                "Cache cleared successfully. The application will regenerate cache files as needed.",
            )),
            Err(e) => Ok(ToolResult::failure(format!("Error clearing cache: {e}"))),
        }
    }
}
