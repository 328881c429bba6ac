use std::collections::HashMap;
use std::sync::Arc;

use aiconsole_common::{Error, Result};
use tracing::info;

use crate::tools::builtin::{ClearCacheTool, CreateContactTool, CreateSegmentTool};
use crate::tools::{CacheService, ContactService, SegmentService, Tool, ToolDescriptor};

/// External collaborators the built-in tools call into. All optional; a tool
/// whose collaborator is absent still registers and reports the missing
/// dependency when executed.
#[derive(Default)]
pub struct ToolServices {
    pub contacts: Option<Arc<dyn ContactService>>,
    pub segments: Option<Arc<dyn SegmentService>>,
    pub cache: Option<Arc<dyn CacheService>>,
}

/// The set of enabled tools, resolved once at startup from the per-tool
/// configuration flags.
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
    by_function: HashMap<String, usize>,
}

impl ToolRegistry {
    /// Instantiate every known tool, keep the ones whose function name is
    /// flagged on in `enabled`. Two tools resolving to the same function name
    /// is a configuration error.
    pub fn build(enabled: &HashMap<String, bool>, services: ToolServices) -> Result<Self> {
        let candidates: Vec<Box<dyn Tool>> = vec![
            Box::new(CreateContactTool::new(services.contacts)),
            Box::new(CreateSegmentTool::new(services.segments)),
            Box::new(ClearCacheTool::new(services.cache)),
        ];

        let mut tools: Vec<Box<dyn Tool>> = Vec::new();
        let mut by_function = HashMap::new();
        for tool in candidates {
            let function = function_name(tool.identifier());
            if !enabled.get(&function).copied().unwrap_or(false) {
                continue;
            }
            if by_function.contains_key(&function) {
                return Err(Error::Config(format!(
                    "duplicate tool function name: {function}"
                )));
            }
            info!("registered tool: {}", function);
            by_function.insert(function, tools.len());
            tools.push(tool);
        }

        Ok(Self { tools, by_function })
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Descriptors for every enabled tool, in registration order.
    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        self.tools
            .iter()
            .map(|tool| ToolDescriptor {
                function_name: function_name(tool.identifier()),
                description: tool.description().to_string(),
                parameters: tool.parameters(),
            })
            .collect()
    }

    /// Look up an enabled tool by its wire-facing function name.
    pub fn resolve(&self, function_name: &str) -> Option<&dyn Tool> {
        self.by_function
            .get(function_name)
            .map(|&index| self.tools[index].as_ref())
    }
}

/// Derive the wire-facing function name from a tool type identifier:
/// `CreateContactTool` becomes `create_contact`.
pub fn function_name(identifier: &str) -> String {
    let base = identifier.strip_suffix("Tool").unwrap_or(identifier);
    let mut out = String::with_capacity(base.len() + 4);
    for (i, ch) in base.chars().enumerate() {
        if ch.is_ascii_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

/// Inverse of [`function_name`]: `create_contact` becomes `CreateContactTool`.
pub fn tool_identifier(function_name: &str) -> String {
    let mut out = String::with_capacity(function_name.len() + 4);
    for segment in function_name.split('_') {
        let mut chars = segment.chars();
        if let Some(first) = chars.next() {
            out.push(first.to_ascii_uppercase());
            out.extend(chars);
        }
    }
    out.push_str("Tool");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flags(entries: &[(&str, bool)]) -> HashMap<String, bool> {
        entries
            .iter()
            .map(|(name, on)| (name.to_string(), *on))
            .collect()
    }

    #[test]
    fn test_function_name_transform() {
        assert_eq!(function_name("CreateContactTool"), "create_contact");
        assert_eq!(function_name("CreateSegmentTool"), "create_segment");
        assert_eq!(function_name("ClearCacheTool"), "clear_cache");
    }

    #[test]
    fn test_identifier_round_trip() {
        for identifier in ["CreateContactTool", "CreateSegmentTool", "ClearCacheTool"] {
            assert_eq!(tool_identifier(&function_name(identifier)), identifier);
        }
    }

    #[test]
    fn test_build_honors_enable_flags() {
        let registry = ToolRegistry::build(
            &flags(&[("clear_cache", true), ("create_contact", false)]),
            ToolServices::default(),
        )
        .expect("build registry");

        assert_eq!(registry.len(), 1);
        assert!(registry.resolve("clear_cache").is_some());
        assert!(registry.resolve("create_contact").is_none());
    }

    #[test]
    fn test_unlisted_tools_are_off() {
        let registry =
            ToolRegistry::build(&HashMap::new(), ToolServices::default()).expect("build registry");
        assert!(registry.is_empty());
    }

    #[test]
    fn test_descriptors_carry_schema() {
        let registry = ToolRegistry::build(
            &flags(&[("create_segment", true)]),
            ToolServices::default(),
        )
        .expect("build registry");

        let descriptors = registry.descriptors();
        assert_eq!(descriptors.len(), 1);
        assert_eq!(descriptors[0].function_name, "create_segment");

        let schema = descriptors[0].input_schema();
        assert_eq!(schema["properties"]["name"]["type"], "string");
        assert_eq!(schema["required"], serde_json::json!(["name"]));
    }
}
