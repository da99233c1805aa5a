//! Parallelization — independent agents on the same input, then one aggregator.

use std::sync::Arc;

use futures_util::future::try_join_all;
use tracing::info;

use super::{agent, labelled, PatternError};
use crate::config::defaults::{self, AGGREGATOR_ROLE};
use crate::config::AgentTable;
use crate::pipe::{provision, run_text, PipeBackend};

#[derive(Debug, Clone, PartialEq)]
pub struct ParallelOutcome {
    /// (role, completion) for every fan-out agent, in table order.
    pub branches: Vec<(String, String)>,
    /// The aggregator's completion.
    pub output: String,
}

pub struct Parallel {
    backend: Arc<dyn PipeBackend>,
    agents: AgentTable,
}

impl Parallel {
    pub fn new(backend: Arc<dyn PipeBackend>, agents: AgentTable) -> Self {
        Self { backend, agents }
    }

    /// Sentiment + summary in parallel, decision maker on top.
    pub fn with_defaults(backend: Arc<dyn PipeBackend>) -> Self {
        Self::new(backend, defaults::parallel())
    }

    pub async fn setup(&self) -> Result<(), PatternError> {
        provision(self.backend.as_ref(), &self.agents).await?;
        Ok(())
    }

    pub async fn run(&self, input: &str) -> Result<ParallelOutcome, PatternError> {
        let aggregator = agent(&self.agents, AGGREGATOR_ROLE)?;
        let backend = self.backend.as_ref();

        let branches: Vec<_> = self
            .agents
            .roles()
            .filter(|r| *r != AGGREGATOR_ROLE)
            .filter_map(|r| self.agents.get(r).map(|a| (r, a)))
            .collect();
        info!(branches = branches.len(), "fanning out");

        let completions = try_join_all(
            branches
                .iter()
                .map(|(_, a)| run_text(backend, &a.name, input)),
        )
        .await?;

        let branches: Vec<(String, String)> = branches
            .iter()
            .map(|(role, _)| role.to_string())
            .zip(completions)
            .collect();

        let prompt = format!("Original text:\n{}\n\n{}", input.trim(), labelled(&branches));
        let output = run_text(backend, &aggregator.name, &prompt).await?;

        Ok(ParallelOutcome { branches, output })
    }
}
