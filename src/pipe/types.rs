//! Rust types for the hosted pipe API.
//!
//! Serde-serializable to JSON for HTTP calls. Wire-only shapes (`Wire*`)
//! stay private to the client; everything else is what patterns work with.

use serde::{Deserialize, Serialize};

/// Model used when an agent config doesn't name one.
pub const DEFAULT_MODEL: &str = "openai:gpt-4o-mini";

/// Resolve short model aliases to provider-qualified model IDs.
pub fn resolve_model(alias: &str) -> &str {
    match alias {
        "mini" => "openai:gpt-4o-mini",
        "gpt-4o" => "openai:gpt-4o",
        "sonnet" => "anthropic:claude-3-5-sonnet-latest",
        "haiku" => "anthropic:claude-3-5-haiku-latest",
        "flash" => "google:gemini-1.5-flash",
        _ => alias, // pass through qualified model IDs
    }
}

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// A single message in a pipe conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
}

impl Message {
    fn plain(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_call_id: None,
            name: None,
            tool_calls: None,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::plain(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::plain(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::plain(Role::Assistant, content)
    }

    /// Assistant turn that requested tool execution.
    pub fn assistant_tool_calls(content: impl Into<String>, calls: Vec<ToolCall>) -> Self {
        Self {
            tool_calls: Some(calls),
            ..Self::plain(Role::Assistant, content)
        }
    }

    /// Result of one tool call, answering `call`.
    pub fn tool_result(call: &ToolCall, content: impl Into<String>) -> Self {
        Self {
            tool_call_id: Some(call.id.clone()),
            name: Some(call.function.name.clone()),
            ..Self::plain(Role::Tool, content)
        }
    }
}

/// A function tool offered to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    #[serde(rename = "type")]
    pub kind: String,
    pub function: FunctionDefinition,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

impl ToolDefinition {
    pub fn function(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        Self {
            kind: "function".into(),
            function: FunctionDefinition {
                name: name.into(),
                description: description.into(),
                parameters,
            },
        }
    }
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type", default = "function_kind")]
    pub kind: String,
    pub function: FunctionCall,
}

fn function_kind() -> String {
    "function".into()
}

/// Function name plus JSON-encoded arguments, as sent by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    #[serde(default)]
    pub arguments: String,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: function_kind(),
            function: FunctionCall {
                name: name.into(),
                arguments: arguments.into(),
            },
        }
    }
}

/// Reference to a memory a pipe retrieves from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryRef {
    pub name: String,
}

/// Request body for creating (or updating) a pipe.
#[derive(Debug, Clone, Serialize)]
pub struct CreatePipeRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub model: String,
    pub upsert: bool,
    pub stream: bool,
    pub json: bool,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub memory: Vec<MemoryRef>,
}

/// What the service returns for a created pipe.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PipeHandle {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// Request body for running a pipe.
#[derive(Debug, Clone, Serialize)]
pub struct RunPipeRequest {
    pub name: String,
    pub messages: Vec<Message>,
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ToolDefinition>>,
    #[serde(rename = "threadId", skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
}

impl RunPipeRequest {
    /// Non-streamed run of `name` over `messages`.
    pub fn new(name: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            name: name.into(),
            messages,
            stream: false,
            tools: None,
            thread_id: None,
        }
    }

    pub fn with_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = if tools.is_empty() { None } else { Some(tools) };
        self
    }

    pub fn with_thread(mut self, thread_id: Option<String>) -> Self {
        self.thread_id = thread_id;
        self
    }
}

/// Token usage reported for a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
    #[serde(default)]
    pub total_tokens: u32,
}

/// Result of a pipe run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunOutcome {
    pub completion: String,
    pub thread_id: Option<String>,
    pub tool_calls: Vec<ToolCall>,
    pub usage: Option<Usage>,
}

impl RunOutcome {
    /// Plain text completion with no tool calls.
    pub fn text(completion: impl Into<String>) -> Self {
        Self {
            completion: completion.into(),
            ..Self::default()
        }
    }

    /// Completion that requests tool execution.
    pub fn tool_calls(calls: Vec<ToolCall>) -> Self {
        Self {
            tool_calls: calls,
            ..Self::default()
        }
    }

    pub fn with_thread(mut self, thread_id: impl Into<String>) -> Self {
        self.thread_id = Some(thread_id.into());
        self
    }

    pub fn wants_tools(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

// ── Wire shapes ──

/// Body of a non-streamed run response.
#[derive(Debug, Deserialize)]
pub(crate) struct WireRunResponse {
    #[serde(default)]
    pub completion: Option<String>,
    #[serde(default, rename = "threadId")]
    pub thread_id: Option<String>,
    #[serde(default)]
    pub raw: Option<WireRaw>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireRaw {
    #[serde(default)]
    pub choices: Vec<WireChoice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireChoice {
    pub message: WireMessage,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireMessage {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub tool_calls: Option<Vec<ToolCall>>,
}

impl WireRunResponse {
    /// Flatten into a `RunOutcome`, preferring the header thread id when present.
    pub(crate) fn into_outcome(self, header_thread: Option<String>) -> RunOutcome {
        let first = self
            .raw
            .as_ref()
            .and_then(|raw| raw.choices.first())
            .map(|c| &c.message);

        let completion = self
            .completion
            .or_else(|| first.and_then(|m| m.content.clone()))
            .unwrap_or_default();
        let tool_calls = first
            .and_then(|m| m.tool_calls.clone())
            .unwrap_or_default();
        let usage = self.raw.as_ref().and_then(|raw| raw.usage);

        RunOutcome {
            completion,
            thread_id: header_thread.or(self.thread_id),
            tool_calls,
            usage,
        }
    }
}
