//! Routing — one classification hop, then dispatch to a specialist.
//!
//! The router pipe runs in JSON mode and answers `{"agent": "<role>"}`.
//! Every role in the table other than the router is a routing target.

use std::sync::Arc;

use serde::Deserialize;
use tracing::info;

use super::{agent, strip_code_fence, PatternError};
use crate::config::defaults::{self, ROUTER_ROLE};
use crate::config::AgentTable;
use crate::pipe::{provision, run_text, PipeBackend};

#[derive(Debug, Deserialize)]
struct RouteDecision {
    agent: String,
}

/// Which specialist answered, and what it said.
#[derive(Debug, Clone, PartialEq)]
pub struct Routed {
    pub role: String,
    pub completion: String,
}

pub struct Router {
    backend: Arc<dyn PipeBackend>,
    agents: AgentTable,
}

impl Router {
    pub fn new(backend: Arc<dyn PipeBackend>, agents: AgentTable) -> Self {
        Self { backend, agents }
    }

    /// Router over the built-in summary / reasoning / coding specialists.
    pub fn with_defaults(backend: Arc<dyn PipeBackend>) -> Self {
        Self::new(backend, defaults::routing())
    }

    pub async fn setup(&self) -> Result<(), PatternError> {
        provision(self.backend.as_ref(), &self.agents).await?;
        Ok(())
    }

    /// Roles the router may choose from.
    pub fn specialists(&self) -> Vec<&str> {
        self.agents.roles().filter(|r| *r != ROUTER_ROLE).collect()
    }

    /// Ask the router which specialist should handle `input`.
    pub async fn classify(&self, input: &str) -> Result<String, PatternError> {
        let router = agent(&self.agents, ROUTER_ROLE)?;
        let raw = run_text(self.backend.as_ref(), &router.name, input).await?;

        let decision: RouteDecision =
            serde_json::from_str(strip_code_fence(&raw)).map_err(|e| PatternError::MalformedJson {
                agent: router.name.clone(),
                message: e.to_string(),
            })?;
        let role = decision.agent.trim().to_ascii_lowercase();

        if role == ROUTER_ROLE || self.agents.get(&role).is_none() {
            return Err(PatternError::UnknownRoute(decision.agent));
        }
        Ok(role)
    }

    pub async fn run(&self, input: &str) -> Result<Routed, PatternError> {
        let role = self.classify(input).await?;
        let specialist = agent(&self.agents, &role)?;
        info!(%role, pipe = %specialist.name, "routed");

        let completion = run_text(self.backend.as_ref(), &specialist.name, input).await?;
        Ok(Routed { role, completion })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipe::{Message, ScriptedBackend};

    #[tokio::test]
    async fn dispatches_original_input_to_chosen_agent() {
        let backend = Arc::new(
            ScriptedBackend::new()
                .reply("router-agent", r#"{"agent": "coding"}"#)
                .reply("coding-agent", "fn main() {}"),
        );
        let router = Router::with_defaults(backend.clone());

        let routed = router.run("Write a hello world in Rust").await.unwrap();
        assert_eq!(routed.role, "coding");
        assert_eq!(routed.completion, "fn main() {}");

        let runs = backend.runs_for("coding-agent").await;
        assert_eq!(runs[0].messages, vec![Message::user("Write a hello world in Rust")]);
        assert!(backend.runs_for("summary-agent").await.is_empty());
    }

    #[tokio::test]
    async fn accepts_fenced_and_mixed_case_answers() {
        let backend = Arc::new(
            ScriptedBackend::new()
                .reply("router-agent", "```json\n{\"agent\": \"Reasoning\"}\n```"),
        );
        let router = Router::with_defaults(backend);
        assert_eq!(router.classify("Compare A and B").await.unwrap(), "reasoning");
    }

    #[tokio::test]
    async fn accepts_one_line_fence() {
        let backend = Arc::new(
            ScriptedBackend::new().reply("router-agent", "```{\"agent\":\"coding\"}```"),
        );
        let router = Router::with_defaults(backend);
        assert_eq!(router.classify("fix my loop").await.unwrap(), "coding");
    }

    #[tokio::test]
    async fn unknown_agent_is_an_error() {
        let backend = Arc::new(ScriptedBackend::new().reply("router-agent", r#"{"agent": "poetry"}"#));
        let err = Router::with_defaults(backend).run("a sonnet").await.unwrap_err();
        assert!(matches!(err, PatternError::UnknownRoute(ref a) if a == "poetry"));
    }

    #[tokio::test]
    async fn router_cannot_route_to_itself() {
        let backend = Arc::new(ScriptedBackend::new().reply("router-agent", r#"{"agent": "router"}"#));
        let err = Router::with_defaults(backend).classify("x").await.unwrap_err();
        assert!(matches!(err, PatternError::UnknownRoute(_)));
    }

    #[tokio::test]
    async fn malformed_json_is_an_error() {
        let backend = Arc::new(ScriptedBackend::new().reply("router-agent", "coding, probably"));
        let err = Router::with_defaults(backend).classify("x").await.unwrap_err();
        assert!(matches!(err, PatternError::MalformedJson { ref agent, .. } if agent == "router-agent"));
    }

    #[test]
    fn specialists_exclude_router() {
        let router = Router::with_defaults(Arc::new(ScriptedBackend::new()));
        assert_eq!(router.specialists(), vec!["summary", "reasoning", "coding"]);
    }
}
