//! Composition patterns — agents wired together over pipes.
//!
//! ## Patterns
//!
//! - `chain`: each step's completion feeds the next step
//! - `router`: classify once, dispatch to one specialist
//! - `parallel`: fan out to independent agents, aggregate once
//! - `orchestrator`: plan subtasks, run workers concurrently, synthesize
//! - `evaluator`: bounded generate/evaluate loop
//! - `tool_use`: run local tools the model asks for, feed results back
//! - `retrieval`: answer from a hosted memory
//!
//! Every pattern holds an `Arc<dyn PipeBackend>` plus its `AgentTable`,
//! provisions its pipes in `setup()`, and answers in `run()`.

pub mod chain;
pub mod evaluator;
pub mod orchestrator;
pub mod parallel;
pub mod retrieval;
pub mod router;
pub mod tool_use;

use crate::config::{AgentConfig, AgentTable};
use crate::download::DownloadError;
use crate::memory::MemoryError;
use crate::pipe::PipeError;
use crate::tools::ToolError;

pub use chain::{ChainOutcome, PromptChain};
pub use evaluator::{EvaluatorOptimizer, Refinement};
pub use orchestrator::{Orchestrated, Orchestrator};
pub use parallel::{Parallel, ParallelOutcome};
pub use retrieval::RetrievalAgent;
pub use router::{Routed, Router};
pub use tool_use::{ToolAgent, ToolRun};

/// Errors from running a pattern.
#[derive(Debug, thiserror::Error)]
pub enum PatternError {
    #[error(transparent)]
    Pipe(#[from] PipeError),

    #[error(transparent)]
    Memory(#[from] MemoryError),

    #[error(transparent)]
    Download(#[from] DownloadError),

    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error("no agent configured for role '{0}'")]
    MissingAgent(String),

    #[error("router chose unknown agent '{0}'")]
    UnknownRoute(String),

    #[error("{agent} returned malformed JSON: {message}")]
    MalformedJson { agent: String, message: String },

    #[error("orchestrator produced no subtasks")]
    EmptyPlan,

    #[error("model kept requesting tools after {0} rounds")]
    ToolRoundsExceeded(usize),
}

/// Look up `role`, turning a miss into `MissingAgent`.
pub(crate) fn agent<'a>(table: &'a AgentTable, role: &str) -> Result<&'a AgentConfig, PatternError> {
    table
        .get(role)
        .ok_or_else(|| PatternError::MissingAgent(role.to_string()))
}

/// Strip a surrounding markdown code fence (```json ... ```), if any.
pub(crate) fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.trim_end().strip_suffix("```").unwrap_or(rest);
    match rest.split_once('\n') {
        // Drop the info string ("json") up to the first newline.
        Some((_, body)) => body.trim(),
        // One-line fence: the body starts at the first JSON bracket.
        None => rest
            .find(|c: char| c == '{' || c == '[')
            .map_or("", |at| rest[at..].trim()),
    }
}

/// Render labelled sections for an aggregating prompt.
pub(crate) fn labelled(sections: &[(String, String)]) -> String {
    sections
        .iter()
        .map(|(label, text)| format!("## {label}\n{}", text.trim()))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_fence_with_info_string() {
        let text = "```json\n{\"agent\": \"coding\"}\n```";
        assert_eq!(strip_code_fence(text), "{\"agent\": \"coding\"}");
    }

    #[test]
    fn strip_one_line_fence() {
        assert_eq!(strip_code_fence("```{\"agent\":\"coding\"}```"), "{\"agent\":\"coding\"}");
        assert_eq!(strip_code_fence("```json {\"agent\": \"summary\"} ```"), "{\"agent\": \"summary\"}");
        assert_eq!(strip_code_fence("```json [1, 2]```"), "[1, 2]");
    }

    #[test]
    fn strip_fence_passthrough() {
        assert_eq!(strip_code_fence("  {\"a\": 1} \n"), "{\"a\": 1}");
    }

    #[test]
    fn labelled_sections() {
        let out = labelled(&[
            ("sentiment".into(), "positive\n".into()),
            ("summary".into(), "short".into()),
        ]);
        assert_eq!(out, "## sentiment\npositive\n\n## summary\nshort");
    }

    #[test]
    fn missing_agent_error_names_role() {
        let err = agent(&AgentTable::new(), "router").unwrap_err();
        assert_eq!(err.to_string(), "no agent configured for role 'router'");
    }
}
