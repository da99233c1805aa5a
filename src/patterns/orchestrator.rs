//! Orchestrator / workers — plan subtasks, work them concurrently, synthesize.
//!
//! The orchestrator pipe is asked for `{"subtasks": [{"description": ...}]}`.
//! Models drift, so a bare array, plain strings, and a numbered plain-text
//! list are all accepted.

use std::sync::Arc;

use futures_util::future::try_join_all;
use serde::Deserialize;
use tracing::{info, warn};

use super::{agent, labelled, strip_code_fence, PatternError};
use crate::config::{defaults, AgentTable};
use crate::pipe::{provision, run_text, PipeBackend};

/// One unit of work handed to a worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subtask {
    /// 1-based position in the plan.
    pub number: usize,
    pub description: String,
}

/// Result of an orchestrated run.
#[derive(Debug, Clone, PartialEq)]
pub struct Orchestrated {
    pub subtasks: Vec<Subtask>,
    /// Worker completion per subtask, same order.
    pub results: Vec<String>,
    pub output: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PlanShape {
    Object { subtasks: Vec<SubtaskShape> },
    List(Vec<SubtaskShape>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SubtaskShape {
    Described { description: String },
    Text(String),
}

/// Parse the orchestrator's plan into numbered subtasks.
pub fn parse_plan(text: &str) -> Vec<Subtask> {
    let descriptions: Vec<String> = match serde_json::from_str::<PlanShape>(strip_code_fence(text)) {
        Ok(PlanShape::Object { subtasks }) | Ok(PlanShape::List(subtasks)) => subtasks
            .into_iter()
            .map(|s| match s {
                SubtaskShape::Described { description } => description,
                SubtaskShape::Text(text) => text,
            })
            .collect(),
        Err(_) => text.lines().filter_map(numbered_item).collect(),
    };

    descriptions
        .into_iter()
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
        .enumerate()
        .map(|(i, description)| Subtask {
            number: i + 1,
            description,
        })
        .collect()
}

/// Text of a numbered list item like "1. Do X" or "2) Do Y".
fn numbered_item(line: &str) -> Option<String> {
    let trimmed = line.trim();
    let first = trimmed.chars().next()?;
    if !first.is_ascii_digit() {
        return None;
    }
    let rest = trimmed.trim_start_matches(|c: char| c.is_ascii_digit());
    let item = rest
        .strip_prefix(". ")
        .or_else(|| rest.strip_prefix(") "))?;
    Some(item.trim_start_matches("**").trim().to_string())
}

pub struct Orchestrator {
    backend: Arc<dyn PipeBackend>,
    agents: AgentTable,
}

impl Orchestrator {
    pub fn new(backend: Arc<dyn PipeBackend>, agents: AgentTable) -> Self {
        Self { backend, agents }
    }

    pub fn with_defaults(backend: Arc<dyn PipeBackend>) -> Self {
        Self::new(backend, defaults::orchestrator())
    }

    pub async fn setup(&self) -> Result<(), PatternError> {
        provision(self.backend.as_ref(), &self.agents).await?;
        Ok(())
    }

    /// Ask the orchestrator for a plan.
    pub async fn plan(&self, task: &str) -> Result<Vec<Subtask>, PatternError> {
        let planner = agent(&self.agents, "orchestrator")?;
        let raw = run_text(self.backend.as_ref(), &planner.name, task).await?;

        let subtasks = parse_plan(&raw);
        if subtasks.is_empty() {
            warn!(pipe = %planner.name, "plan had no subtasks");
            return Err(PatternError::EmptyPlan);
        }
        info!(subtasks = subtasks.len(), "plan ready");
        Ok(subtasks)
    }

    pub async fn run(&self, task: &str) -> Result<Orchestrated, PatternError> {
        let worker = agent(&self.agents, "worker")?;
        let synthesizer = agent(&self.agents, "synthesizer")?;
        let backend = self.backend.as_ref();

        let subtasks = self.plan(task).await?;

        let prompts: Vec<String> = subtasks
            .iter()
            .map(|s| {
                format!(
                    "Overall task:\n{}\n\nYour subtask ({} of {}):\n{}",
                    task.trim(),
                    s.number,
                    subtasks.len(),
                    s.description
                )
            })
            .collect();
        let results = try_join_all(prompts.iter().map(|p| run_text(backend, &worker.name, p))).await?;

        let sections: Vec<(String, String)> = subtasks
            .iter()
            .zip(&results)
            .map(|(s, r)| (format!("Subtask {}: {}", s.number, s.description), r.clone()))
            .collect();
        let prompt = format!("Task:\n{}\n\n{}", task.trim(), labelled(&sections));
        let output = run_text(backend, &synthesizer.name, &prompt).await?;

        Ok(Orchestrated {
            subtasks,
            results,
            output,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipe::ScriptedBackend;

    #[test]
    fn parse_object_plan() {
        let plan = parse_plan(r#"{"subtasks": [{"description": "Research"}, {"description": "Draft"}]}"#);
        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0], Subtask { number: 1, description: "Research".into() });
        assert_eq!(plan[1].number, 2);
    }

    #[test]
    fn parse_bare_array_of_strings() {
        let plan = parse_plan("```json\n[\"Outline\", \"  \", \"Write\"]\n```");
        let descriptions: Vec<_> = plan.iter().map(|s| s.description.as_str()).collect();
        assert_eq!(descriptions, vec!["Outline", "Write"]);
        assert_eq!(plan[1].number, 2);
    }

    #[test]
    fn parse_numbered_list_fallback() {
        let text = "Here is the plan:\n1. Gather requirements\n2) Sketch the API\n   details\n10. Ship it\n";
        let plan = parse_plan(text);
        let descriptions: Vec<_> = plan.iter().map(|s| s.description.as_str()).collect();
        assert_eq!(descriptions, vec!["Gather requirements", "Sketch the API", "Ship it"]);
    }

    #[test]
    fn parse_empty_plan() {
        assert!(parse_plan(r#"{"subtasks": []}"#).is_empty());
        assert!(parse_plan("I cannot help with that.").is_empty());
    }

    #[tokio::test]
    async fn workers_run_per_subtask_then_synthesize() {
        let backend = Arc::new(
            ScriptedBackend::new()
                .reply(
                    "orchestrator-agent",
                    r#"{"subtasks": [{"description": "History of Rust"}, {"description": "Rust today"}]}"#,
                )
                .reply("worker-agent", "result")
                .reply("worker-agent", "result")
                .reply("synthesizer-agent", "Rust: then and now."),
        );
        let orchestrator = Orchestrator::with_defaults(backend.clone());

        let out = orchestrator.run("Write a short article about Rust").await.unwrap();
        assert_eq!(out.output, "Rust: then and now.");
        assert_eq!(out.subtasks.len(), 2);
        assert_eq!(out.results, vec!["result".to_string(), "result".to_string()]);

        let worker_prompts: Vec<String> = backend
            .runs_for("worker-agent")
            .await
            .into_iter()
            .map(|r| r.messages[0].content.clone())
            .collect();
        assert!(worker_prompts.iter().any(|p| p.contains("(1 of 2):\nHistory of Rust")));
        assert!(worker_prompts.iter().any(|p| p.contains("(2 of 2):\nRust today")));

        let synth = backend.runs_for("synthesizer-agent").await;
        let prompt = &synth[0].messages[0].content;
        assert!(prompt.contains("## Subtask 1: History of Rust\nresult"));
        assert!(prompt.contains("## Subtask 2: Rust today\nresult"));
    }

    #[tokio::test]
    async fn empty_plan_is_an_error() {
        let backend = Arc::new(ScriptedBackend::new().reply("orchestrator-agent", r#"{"subtasks": []}"#));
        let err = Orchestrator::with_defaults(backend.clone()).run("task").await.unwrap_err();
        assert!(matches!(err, PatternError::EmptyPlan));
        assert!(backend.runs_for("worker-agent").await.is_empty());
    }
}
