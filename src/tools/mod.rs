//! Tool system: the trait every callable capability implements, and the
//! registry the agent resolves model-requested tools against.

mod math;
mod web;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ToolError;
use crate::llm::{FunctionSchema, ToolSchema};

pub use math::Multiply;
pub use web::WebSearch;

/// A capability the model can invoke.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique name advertised to the model.
    fn name(&self) -> &str;

    /// What the tool does, in terms the model can act on.
    fn description(&self) -> &str;

    /// JSON Schema of the argument object.
    fn parameters_schema(&self) -> Value;

    /// Run the tool. Argument validation is the tool's own job.
    async fn execute(&self, args: Value) -> anyhow::Result<String>;
}

/// Name and description of a registered tool.
#[derive(Debug, Clone)]
pub struct ToolInfo {
    pub name: String,
    pub description: String,
}

/// Immutable name-to-tool mapping built at startup.
#[derive(Clone)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
    /// Registration order, so schemas are advertised deterministically.
    order: Vec<String>,
}

impl ToolRegistry {
    /// Registry with the built-in tools.
    pub fn new() -> Self {
        Self::with_tools(vec![Arc::new(WebSearch::new()), Arc::new(Multiply)])
    }

    pub fn empty() -> Self {
        Self {
            tools: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Build a registry from an explicit tool list. On duplicate names the
    /// first registration wins.
    pub fn with_tools(tools: Vec<Arc<dyn Tool>>) -> Self {
        let mut registry = Self::empty();
        for tool in tools {
            let name = tool.name().to_string();
            if registry.tools.contains_key(&name) {
                tracing::warn!(tool = %name, "Duplicate tool registration ignored");
                continue;
            }
            registry.order.push(name.clone());
            registry.tools.insert(name, tool);
        }
        registry
    }

    pub fn resolve(&self, name: &str) -> Result<Arc<dyn Tool>, ToolError> {
        self.tools
            .get(name)
            .cloned()
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn list_tools(&self) -> Vec<ToolInfo> {
        self.ordered()
            .map(|t| ToolInfo {
                name: t.name().to_string(),
                description: t.description().to_string(),
            })
            .collect()
    }

    /// Function-calling descriptors for every registered tool.
    pub fn describe_all(&self) -> Vec<ToolSchema> {
        self.ordered()
            .map(|t| ToolSchema {
                kind: "function".to_string(),
                function: FunctionSchema {
                    name: t.name().to_string(),
                    description: t.description().to_string(),
                    parameters: t.parameters_schema(),
                },
            })
            .collect()
    }

    fn ordered(&self) -> impl Iterator<Item = &Arc<dyn Tool>> {
        self.order.iter().filter_map(|name| self.tools.get(name))
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Named(&'static str, &'static str);

    #[async_trait]
    impl Tool for Named {
        fn name(&self) -> &str {
            self.0
        }

        fn description(&self) -> &str {
            self.1
        }

        fn parameters_schema(&self) -> Value {
            json!({"type": "object", "properties": {}})
        }

        async fn execute(&self, _args: Value) -> anyhow::Result<String> {
            Ok(self.1.to_string())
        }
    }

    #[test]
    fn builtins_are_registered() {
        let registry = ToolRegistry::new();
        let names: Vec<_> = registry.list_tools().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["web_search", "multiply"]);
        assert!(registry.resolve("multiply").is_ok());
    }

    #[test]
    fn resolve_unknown_tool() {
        let registry = ToolRegistry::new();
        match registry.resolve("frobnicate") {
            Err(ToolError::UnknownTool(name)) => assert_eq!(name, "frobnicate"),
            _ => panic!("expected unknown tool"),
        }
    }

    #[test]
    fn schemas_follow_registration_order() {
        let registry = ToolRegistry::new();
        let schemas = registry.describe_all();
        assert_eq!(schemas.len(), 2);
        assert_eq!(schemas[0].kind, "function");
        assert_eq!(schemas[0].function.name, "web_search");
        assert_eq!(schemas[0].function.parameters["required"], json!(["query"]));
        assert_eq!(schemas[1].function.parameters["required"], json!(["a", "b"]));
    }

    #[tokio::test]
    async fn first_registration_wins() {
        let registry = ToolRegistry::with_tools(vec![
            Arc::new(Named("echo", "first")),
            Arc::new(Named("echo", "second")),
        ]);
        assert_eq!(registry.len(), 1);
        let tool = registry.resolve("echo").unwrap();
        assert_eq!(tool.execute(json!({})).await.unwrap(), "first");
    }
}
