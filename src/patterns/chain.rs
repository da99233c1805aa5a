//! Prompt chaining — each step's completion is the next step's input.

use std::sync::Arc;

use tracing::info;

use super::PatternError;
use crate::config::{defaults, AgentTable};
use crate::pipe::{provision, run_text, PipeBackend};

/// Output of a chain run.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainOutcome {
    /// (pipe name, completion) for every step, in order.
    pub steps: Vec<(String, String)>,
}

impl ChainOutcome {
    /// Completion of the last step (empty for an empty chain).
    pub fn output(&self) -> &str {
        self.steps.last().map(|(_, out)| out.as_str()).unwrap_or("")
    }
}

/// Sequential chain over every agent in the table, in table order.
pub struct PromptChain {
    backend: Arc<dyn PipeBackend>,
    agents: AgentTable,
}

impl PromptChain {
    pub fn new(backend: Arc<dyn PipeBackend>, agents: AgentTable) -> Self {
        Self { backend, agents }
    }

    /// Chain with the built-in summary → features → marketing steps.
    pub fn with_defaults(backend: Arc<dyn PipeBackend>) -> Self {
        Self::new(backend, defaults::chain())
    }

    pub async fn setup(&self) -> Result<(), PatternError> {
        provision(self.backend.as_ref(), &self.agents).await?;
        Ok(())
    }

    pub async fn run(&self, input: &str) -> Result<ChainOutcome, PatternError> {
        let mut steps = Vec::with_capacity(self.agents.len());
        let mut current = input.to_string();

        for (index, agent) in self.agents.agents().enumerate() {
            info!(step = index + 1, pipe = %agent.name, "chain step");
            current = run_text(self.backend.as_ref(), &agent.name, &current).await?;
            steps.push((agent.name.clone(), current.clone()));
        }

        Ok(ChainOutcome { steps })
    }
}
