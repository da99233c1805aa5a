//! Built-in agent tables and system prompts, one table per pattern.
//!
//! Pipe names are distinct across patterns: creation upserts, so two
//! patterns sharing a name would overwrite each other's prompt.

use super::{AgentConfig, AgentTable};

// ── Prompt chain ──

pub const CHAIN_SUMMARY_PROMPT: &str = "\
You are a product analyst. Summarize the product description you are given \
in three sentences, keeping every concrete fact (specs, prices, audiences).";

pub const CHAIN_FEATURES_PROMPT: &str = "\
You extract product features. From the summary you are given, list the key \
features as short bullet points, most important first.";

pub const CHAIN_MARKETING_PROMPT: &str = "\
You are a marketing copywriter. Turn the feature list you are given into a \
punchy paragraph of marketing copy with a clear call to action.";

pub fn chain() -> AgentTable {
    AgentTable::new()
        .with("summary", AgentConfig::new("product-summary-agent", CHAIN_SUMMARY_PROMPT))
        .with("features", AgentConfig::new("product-features-agent", CHAIN_FEATURES_PROMPT))
        .with("marketing", AgentConfig::new("marketing-copy-agent", CHAIN_MARKETING_PROMPT))
}

// ── Routing ──

pub const ROUTER_PROMPT: &str = "\
You are a router. Decide which specialist should handle the user's request:
- \"summary\" for summarizing or condensing text
- \"reasoning\" for analysis, comparisons, and step-by-step thinking
- \"coding\" for writing, explaining, or fixing code

Respond ONLY with a JSON object of the form {\"agent\": \"summary\"}.";

pub const SUMMARY_PROMPT: &str = "\
You summarize text. Produce a concise summary that keeps the key points.";

pub const REASONING_PROMPT: &str = "\
You are an analytical reasoner. Work through the problem step by step and \
finish with a clear conclusion.";

pub const CODING_PROMPT: &str = "\
You are an expert programmer. Answer with working code and a short \
explanation of how it works.";

/// Router role; every other role in the table is a routable specialist.
pub const ROUTER_ROLE: &str = "router";

pub fn routing() -> AgentTable {
    AgentTable::new()
        .with(ROUTER_ROLE, AgentConfig::new("router-agent", ROUTER_PROMPT).json())
        .with("summary", AgentConfig::new("summary-agent", SUMMARY_PROMPT))
        .with("reasoning", AgentConfig::new("reasoning-agent", REASONING_PROMPT))
        .with("coding", AgentConfig::new("coding-agent", CODING_PROMPT))
}

// ── Parallel ──

pub const SENTIMENT_PROMPT: &str = "\
You analyze sentiment. State whether the text is positive, negative, or \
mixed, and quote the phrases that show it.";

pub const BRIEF_SUMMARY_PROMPT: &str = "\
You summarize customer feedback in two sentences.";

pub const DECISION_PROMPT: &str = "\
You are a decision maker. You receive several independent analyses of the \
same text. Combine them into one recommendation with a short rationale.";

/// Aggregator role; every other role runs in the parallel fan-out.
pub const AGGREGATOR_ROLE: &str = "decision";

pub fn parallel() -> AgentTable {
    AgentTable::new()
        .with("sentiment", AgentConfig::new("sentiment-agent", SENTIMENT_PROMPT))
        .with("summary", AgentConfig::new("brief-summary-agent", BRIEF_SUMMARY_PROMPT))
        .with(AGGREGATOR_ROLE, AgentConfig::new("decision-maker-agent", DECISION_PROMPT))
}

// ── Orchestrator / workers ──

pub const ORCHESTRATOR_PROMPT: &str = "\
You are an orchestrator. Break the user's task into 2-5 independent \
subtasks that can be worked on in parallel.

Respond ONLY with a JSON object:
{\"subtasks\": [{\"description\": \"...\"}, ...]}";

pub const WORKER_PROMPT: &str = "\
You are a worker. Complete exactly the subtask you are given. Be thorough \
but do not go beyond its scope.";

pub const SYNTHESIZER_PROMPT: &str = "\
You are a synthesizer. You receive a task and the results of its subtasks. \
Merge them into one coherent, well-structured answer to the original task.";

pub fn orchestrator() -> AgentTable {
    AgentTable::new()
        .with("orchestrator", AgentConfig::new("orchestrator-agent", ORCHESTRATOR_PROMPT).json())
        .with("worker", AgentConfig::new("worker-agent", WORKER_PROMPT))
        .with("synthesizer", AgentConfig::new("synthesizer-agent", SYNTHESIZER_PROMPT))
}

// ── Evaluator / optimizer ──

/// The exact evaluator answer that ends the loop.
pub const ACCEPTED: &str = "ACCEPTED";

pub const GENERATOR_PROMPT: &str = "\
You are a writer. Complete the task you are given. When you receive \
feedback on a previous draft, revise the draft to address every point.";

pub const EVALUATOR_PROMPT: &str = "\
You are a strict reviewer. Judge whether the draft fully completes the task.
If it does, respond with exactly the single word ACCEPTED and nothing else.
Otherwise respond with specific, actionable feedback for the next revision.";

pub fn evaluator() -> AgentTable {
    AgentTable::new()
        .with("generator", AgentConfig::new("generator-agent", GENERATOR_PROMPT))
        .with("evaluator", AgentConfig::new("evaluator-agent", EVALUATOR_PROMPT))
}

// ── Tools ──

pub const TOOL_AGENT_PROMPT: &str = "\
You are a helpful assistant with access to tools. Call a tool whenever it \
gives a more accurate answer than guessing, then answer in plain language.";

pub fn tools() -> AgentTable {
    AgentTable::new().with("assistant", AgentConfig::new("tool-agent", TOOL_AGENT_PROMPT))
}

// ── Memory ──

pub const DEFAULT_MEMORY: &str = "agent-knowledge-base";

pub const MEMORY_AGENT_PROMPT: &str = "\
You answer questions using the retrieved documents. If the documents do not \
contain the answer, say so instead of guessing. Cite the document you used.";

pub fn memory(memory_name: &str) -> AgentTable {
    AgentTable::new().with(
        "assistant",
        AgentConfig::new("memory-agent", MEMORY_AGENT_PROMPT).with_memory(memory_name),
    )
}

// ── Chat ──

pub const CHAT_PROMPT: &str = "You are a friendly, concise assistant.";

pub fn chat() -> AgentTable {
    AgentTable::new().with("assistant", AgentConfig::new("chat-agent", CHAT_PROMPT))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn pipe_names_are_unique_across_patterns() {
        let tables = [
            chain(),
            routing(),
            parallel(),
            orchestrator(),
            evaluator(),
            tools(),
            memory(DEFAULT_MEMORY),
            chat(),
        ];
        let mut seen = HashSet::new();
        for table in &tables {
            for agent in table.agents() {
                assert!(seen.insert(agent.name.clone()), "duplicate pipe {}", agent.name);
            }
        }
    }

    #[test]
    fn json_mode_only_for_structured_agents() {
        assert!(routing().get(ROUTER_ROLE).unwrap().json);
        assert!(orchestrator().get("orchestrator").unwrap().json);
        assert!(!routing().get("coding").unwrap().json);
    }

    #[test]
    fn evaluator_prompt_names_the_accept_token() {
        assert!(EVALUATOR_PROMPT.contains(ACCEPTED));
    }

    #[test]
    fn memory_agent_binds_memory() {
        let t = memory("docs");
        assert_eq!(t.get("assistant").unwrap().memory, vec!["docs".to_string()]);
    }
}
