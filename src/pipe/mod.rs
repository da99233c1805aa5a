//! Pipes — named, remotely hosted model + system prompt bindings.
//!
//! `PipeBackend` is the seam every pattern talks through: the HTTP
//! `PipeClient` in production, `ScriptedBackend` in tests.

pub mod client;
pub mod provision;
pub mod scripted;
pub mod types;

#[cfg(test)]
pub(crate) mod test_server;

use async_trait::async_trait;
use tracing::debug;

pub use client::{PipeClient, PipeError};
pub use provision::provision;
pub use scripted::ScriptedBackend;
pub use types::{
    CreatePipeRequest, Message, PipeHandle, Role, RunOutcome, RunPipeRequest, ToolCall,
    ToolDefinition,
};

/// The two operations the hosted service exposes.
#[async_trait]
pub trait PipeBackend: Send + Sync {
    /// Create a pipe, or update it in place if the name already exists.
    async fn create_pipe(&self, request: &CreatePipeRequest) -> Result<PipeHandle, PipeError>;

    /// Run a pipe over a message list and wait for the full completion.
    async fn run_pipe(&self, request: &RunPipeRequest) -> Result<RunOutcome, PipeError>;
}

/// Send a single user message to `pipe` and return the completion text.
pub async fn run_text(
    backend: &dyn PipeBackend,
    pipe: &str,
    input: &str,
) -> Result<String, PipeError> {
    debug!(pipe, chars = input.len(), "running pipe");
    let request = RunPipeRequest::new(pipe, vec![Message::user(input)]);
    let outcome = backend.run_pipe(&request).await?;
    Ok(outcome.completion)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn run_text_sends_one_user_message() {
        let backend = ScriptedBackend::new().reply("echo", "hello back");

        let text = run_text(&backend, "echo", "hello").await.unwrap();
        assert_eq!(text, "hello back");

        let runs = backend.runs().await;
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].name, "echo");
        assert_eq!(runs[0].messages, vec![Message::user("hello")]);
        assert!(!runs[0].stream);
    }
}
