//! Local tools — functions the model can ask us to run.
//!
//! Tools don't think — they execute. Each one describes itself with a JSON
//! schema derived from its argument struct; the registry turns a model's
//! `ToolCall` into a call on the matching tool.

pub mod calculator;
pub mod weather;

use async_trait::async_trait;
use schemars::JsonSchema;
use tracing::debug;

use crate::pipe::{ToolCall, ToolDefinition};

/// Errors from tool execution.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("unknown tool: {0}")]
    Unknown(String),

    #[error("invalid arguments for {tool}: {message}")]
    InvalidArguments { tool: String, message: String },

    #[error("{0}")]
    Failed(String),
}

/// A tool the model can call.
#[async_trait]
pub trait LocalTool: Send + Sync {
    /// Tool name (what the model calls).
    fn name(&self) -> &str;

    /// Human-readable description shown to the model.
    fn description(&self) -> &str;

    /// JSON schema for the arguments object.
    fn parameters(&self) -> serde_json::Value;

    /// Run the tool on already-parsed arguments.
    async fn call(&self, arguments: serde_json::Value) -> Result<String, ToolError>;

    fn definition(&self) -> ToolDefinition {
        ToolDefinition::function(self.name(), self.description(), self.parameters())
    }
}

/// JSON schema for an argument struct, without the root `$schema`/`title` noise.
pub fn schema_for<T: JsonSchema>() -> serde_json::Value {
    let schema = schemars::schema_for!(T);
    let mut value = serde_json::to_value(schema).unwrap_or_default();
    if let Some(obj) = value.as_object_mut() {
        obj.remove("$schema");
        obj.remove("title");
    }
    value
}

/// Decode a tool's arguments into its typed struct.
pub fn parse_args<T: serde::de::DeserializeOwned>(
    tool: &str,
    arguments: serde_json::Value,
) -> Result<T, ToolError> {
    serde_json::from_value(arguments).map_err(|e| ToolError::InvalidArguments {
        tool: tool.to_string(),
        message: e.to_string(),
    })
}

/// Name-indexed set of tools, kept in registration order.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Box<dyn LocalTool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the built-in tools.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(weather::WeatherTool);
        registry.register(calculator::CalculatorTool);
        registry
    }

    /// Register a tool, replacing any tool with the same name.
    pub fn register<T: LocalTool + 'static>(&mut self, tool: T) {
        self.tools.retain(|t| t.name() != tool.name());
        self.tools.push(Box::new(tool));
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    /// Definitions to send with a pipe run.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.definition()).collect()
    }

    /// Execute a model's tool call.
    pub async fn dispatch(&self, call: &ToolCall) -> Result<String, ToolError> {
        let name = call.function.name.as_str();
        let tool = self
            .tools
            .iter()
            .find(|t| t.name() == name)
            .ok_or_else(|| ToolError::Unknown(name.to_string()))?;

        let raw = call.function.arguments.trim();
        let arguments = if raw.is_empty() {
            serde_json::json!({})
        } else {
            serde_json::from_str(raw).map_err(|e| ToolError::InvalidArguments {
                tool: name.to_string(),
                message: format!("arguments are not JSON: {e}"),
            })?
        };

        debug!(tool = name, call_id = %call.id, "dispatching tool call");
        tool.call(arguments).await
    }
}
