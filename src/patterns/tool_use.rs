//! Tool-augmented calls — run the tools the model asks for, feed results back.
//!
//! Each round: run the pipe with tool definitions; if the reply carries tool
//! calls, answer every call with a `tool` message and run again on the same
//! thread. A tool failure becomes an `error: ...` result, not an abort.
//!
//! Once the service hands back a thread id it holds the conversation, so later
//! rounds send only the new tool results. Without a thread the full history
//! is resent every round.

use std::sync::Arc;

use tracing::{info, warn};

use super::{agent, PatternError};
use crate::config::{defaults, AgentTable};
use crate::pipe::{provision, Message, PipeBackend, RunPipeRequest};
use crate::tools::ToolRegistry;

/// Default bound on tool-call rounds.
pub const DEFAULT_MAX_ROUNDS: usize = 5;

/// Result of a tool-augmented run.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolRun {
    pub completion: String,
    pub thread_id: Option<String>,
    /// (tool name, result) for every call executed, in order.
    pub calls: Vec<(String, String)>,
}

pub struct ToolAgent {
    backend: Arc<dyn PipeBackend>,
    agents: AgentTable,
    tools: ToolRegistry,
    max_rounds: usize,
}

impl ToolAgent {
    pub fn new(backend: Arc<dyn PipeBackend>, agents: AgentTable, tools: ToolRegistry) -> Self {
        Self {
            backend,
            agents,
            tools,
            max_rounds: DEFAULT_MAX_ROUNDS,
        }
    }

    /// Assistant with the built-in weather and calculator tools.
    pub fn with_defaults(backend: Arc<dyn PipeBackend>) -> Self {
        Self::new(backend, defaults::tools(), ToolRegistry::builtin())
    }

    pub fn max_rounds(mut self, max: usize) -> Self {
        self.max_rounds = max;
        self
    }

    pub async fn setup(&self) -> Result<(), PatternError> {
        provision(self.backend.as_ref(), &self.agents).await?;
        Ok(())
    }

    pub async fn run(&self, input: &str) -> Result<ToolRun, PatternError> {
        let assistant = agent(&self.agents, "assistant")?;
        let definitions = self.tools.definitions();

        let mut history = vec![Message::user(input)];
        let mut outgoing = history.clone();
        let mut thread_id: Option<String> = None;
        let mut calls = Vec::new();

        for round in 0..=self.max_rounds {
            let request = RunPipeRequest::new(&assistant.name, outgoing)
                .with_tools(definitions.clone())
                .with_thread(thread_id.clone());
            let outcome = self.backend.run_pipe(&request).await?;
            if outcome.thread_id.is_some() {
                thread_id = outcome.thread_id.clone();
            }

            if !outcome.wants_tools() {
                return Ok(ToolRun {
                    completion: outcome.completion,
                    thread_id,
                    calls,
                });
            }
            if round == self.max_rounds {
                break;
            }

            info!(round = round + 1, calls = outcome.tool_calls.len(), "model requested tools");
            history.push(Message::assistant_tool_calls(
                outcome.completion.clone(),
                outcome.tool_calls.clone(),
            ));
            let mut results = Vec::with_capacity(outcome.tool_calls.len());
            for call in &outcome.tool_calls {
                let result = match self.tools.dispatch(call).await {
                    Ok(result) => result,
                    Err(e) => {
                        warn!(tool = %call.function.name, error = %e, "tool failed");
                        format!("error: {e}")
                    }
                };
                results.push(Message::tool_result(call, result.clone()));
                calls.push((call.function.name.clone(), result));
            }
            history.extend(results.iter().cloned());

            outgoing = if thread_id.is_some() {
                results
            } else {
                history.clone()
            };
        }

        Err(PatternError::ToolRoundsExceeded(self.max_rounds))
    }
}
