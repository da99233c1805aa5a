//! Evaluator / optimizer — draft, review, revise, at most `max_iterations` times.

use std::sync::Arc;

use tracing::{info, warn};

use super::{agent, PatternError};
use crate::config::defaults::{self, ACCEPTED};
use crate::config::AgentTable;
use crate::pipe::{provision, run_text, PipeBackend};

/// Default bound on generate/evaluate rounds.
pub const DEFAULT_MAX_ITERATIONS: usize = 5;

/// Result of the loop.
#[derive(Debug, Clone, PartialEq)]
pub struct Refinement {
    /// The last draft produced.
    pub draft: String,
    /// Rounds actually run (1-based count).
    pub iterations: usize,
    /// Whether the evaluator accepted `draft`.
    pub accepted: bool,
    /// Feedback from each rejected round, in order.
    pub feedback: Vec<String>,
}

/// Evaluator verdicts are compared exactly, after trimming whitespace.
pub fn is_accepted(verdict: &str) -> bool {
    verdict.trim() == ACCEPTED
}

pub struct EvaluatorOptimizer {
    backend: Arc<dyn PipeBackend>,
    agents: AgentTable,
    max_iterations: usize,
}

impl EvaluatorOptimizer {
    pub fn new(backend: Arc<dyn PipeBackend>, agents: AgentTable) -> Self {
        Self {
            backend,
            agents,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    pub fn with_defaults(backend: Arc<dyn PipeBackend>) -> Self {
        Self::new(backend, defaults::evaluator())
    }

    /// Override the round bound (at least one round always runs).
    pub fn max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max.max(1);
        self
    }

    pub async fn setup(&self) -> Result<(), PatternError> {
        provision(self.backend.as_ref(), &self.agents).await?;
        Ok(())
    }

    pub async fn run(&self, task: &str) -> Result<Refinement, PatternError> {
        let generator = agent(&self.agents, "generator")?;
        let evaluator = agent(&self.agents, "evaluator")?;
        let backend = self.backend.as_ref();

        let mut draft = String::new();
        let mut feedback: Vec<String> = Vec::new();

        for iteration in 1..=self.max_iterations {
            let prompt = match feedback.last() {
                None => task.to_string(),
                Some(last) => format!(
                    "Task:\n{}\n\nPrevious draft:\n{}\n\nFeedback:\n{}\n\nWrite an improved draft.",
                    task.trim(),
                    draft.trim(),
                    last.trim()
                ),
            };
            draft = run_text(backend, &generator.name, &prompt).await?;

            let review = format!("Task:\n{}\n\nDraft:\n{}", task.trim(), draft.trim());
            let verdict = run_text(backend, &evaluator.name, &review).await?;

            if is_accepted(&verdict) {
                info!(iteration, "draft accepted");
                return Ok(Refinement {
                    draft,
                    iterations: iteration,
                    accepted: true,
                    feedback,
                });
            }
            info!(iteration, "draft rejected");
            feedback.push(verdict);
        }

        warn!(max = self.max_iterations, "no draft accepted, returning last");
        Ok(Refinement {
            draft,
            iterations: self.max_iterations,
            accepted: false,
            feedback,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipe::ScriptedBackend;

    #[test]
    fn acceptance_is_exact_after_trim() {
        assert!(is_accepted("ACCEPTED"));
        assert!(is_accepted("  ACCEPTED\n"));
        assert!(!is_accepted("accepted"));
        assert!(!is_accepted("ACCEPTED, but tighten the intro"));
    }

    #[tokio::test]
    async fn accepted_on_second_round() {
        let backend = Arc::new(
            ScriptedBackend::new()
                .reply("generator-agent", "draft one")
                .reply("evaluator-agent", "Too long.")
                .reply("generator-agent", "draft two")
                .reply("evaluator-agent", "ACCEPTED"),
        );
        let optimizer = EvaluatorOptimizer::with_defaults(backend.clone());

        let out = optimizer.run("Write a haiku about rust").await.unwrap();
        assert!(out.accepted);
        assert_eq!(out.iterations, 2);
        assert_eq!(out.draft, "draft two");
        assert_eq!(out.feedback, vec!["Too long.".to_string()]);

        let gen_runs = backend.runs_for("generator-agent").await;
        assert_eq!(gen_runs[0].messages[0].content, "Write a haiku about rust");
        let revision = &gen_runs[1].messages[0].content;
        assert!(revision.contains("Previous draft:\ndraft one"));
        assert!(revision.contains("Feedback:\nToo long."));
    }

    #[tokio::test]
    async fn stops_at_the_bound() {
        let mut backend = ScriptedBackend::new();
        for i in 0..3 {
            backend = backend
                .reply("generator-agent", &format!("draft {i}"))
                .reply("evaluator-agent", "Not yet.");
        }
        let backend = Arc::new(backend);
        let optimizer = EvaluatorOptimizer::with_defaults(backend.clone()).max_iterations(3);

        let out = optimizer.run("task").await.unwrap();
        assert!(!out.accepted);
        assert_eq!(out.iterations, 3);
        assert_eq!(out.draft, "draft 2");
        assert_eq!(out.feedback.len(), 3);
        assert_eq!(backend.runs_for("generator-agent").await.len(), 3);
    }

    #[tokio::test]
    async fn default_bound_is_five() {
        let mut backend = ScriptedBackend::new();
        for _ in 0..DEFAULT_MAX_ITERATIONS {
            backend = backend
                .reply("generator-agent", "draft")
                .reply("evaluator-agent", "again");
        }
        let backend = Arc::new(backend);
        let out = EvaluatorOptimizer::with_defaults(backend.clone()).run("t").await.unwrap();
        assert_eq!(out.iterations, 5);
        assert!(backend.runs_for("evaluator-agent").await.len() == 5);
    }

    #[tokio::test]
    async fn zero_bound_still_runs_once() {
        let backend = Arc::new(
            ScriptedBackend::new()
                .reply("generator-agent", "d")
                .reply("evaluator-agent", "ACCEPTED"),
        );
        let out = EvaluatorOptimizer::with_defaults(backend).max_iterations(0).run("t").await.unwrap();
        assert!(out.accepted);
        assert_eq!(out.iterations, 1);
    }
}
