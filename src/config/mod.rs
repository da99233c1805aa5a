//! Agent configuration — role → pipe name, model, system prompt.
//!
//! Built-in tables live in `defaults`; a YAML file can override any agent
//! by pipe name without restating the fields it leaves alone.

pub mod defaults;

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::pipe::types::{resolve_model, CreatePipeRequest, MemoryRef, Message, DEFAULT_MODEL};

/// Errors from loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid config YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// One agent: a pipe bound to a model and a system prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentConfig {
    /// Pipe name on the remote service.
    pub name: String,
    pub model: String,
    pub prompt: String,
    /// Ask the model for a JSON object.
    pub json: bool,
    /// Memories the pipe retrieves from.
    pub memory: Vec<String>,
}

impl AgentConfig {
    pub fn new(name: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: DEFAULT_MODEL.into(),
            prompt: prompt.into(),
            json: false,
            memory: Vec::new(),
        }
    }

    pub fn model(mut self, model: &str) -> Self {
        self.model = resolve_model(model).to_string();
        self
    }

    pub fn json(mut self) -> Self {
        self.json = true;
        self
    }

    pub fn with_memory(mut self, memory: impl Into<String>) -> Self {
        self.memory.push(memory.into());
        self
    }

    /// The create-or-reuse request for this agent's pipe.
    pub fn create_request(&self) -> CreatePipeRequest {
        CreatePipeRequest {
            name: self.name.clone(),
            description: None,
            model: self.model.clone(),
            upsert: true,
            stream: false,
            json: self.json,
            messages: vec![Message::system(self.prompt.clone())],
            memory: self
                .memory
                .iter()
                .map(|name| MemoryRef { name: name.clone() })
                .collect(),
        }
    }

    fn apply(&mut self, patch: &AgentOverride) {
        if let Some(ref model) = patch.model {
            self.model = resolve_model(model).to_string();
        }
        if let Some(ref prompt) = patch.prompt {
            self.prompt = prompt.clone();
        }
        if let Some(json) = patch.json {
            self.json = json;
        }
        if let Some(ref memory) = patch.memory {
            self.memory = memory.clone();
        }
    }
}

/// Ordered mapping of role → agent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AgentTable {
    entries: Vec<(String, AgentConfig)>,
}

impl AgentTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the agent for `role`.
    pub fn insert(&mut self, role: &str, agent: AgentConfig) {
        if let Some(slot) = self.entries.iter_mut().find(|(r, _)| r == role) {
            slot.1 = agent;
        } else {
            self.entries.push((role.to_string(), agent));
        }
    }

    pub fn with(mut self, role: &str, agent: AgentConfig) -> Self {
        self.insert(role, agent);
        self
    }

    pub fn get(&self, role: &str) -> Option<&AgentConfig> {
        self.entries.iter().find(|(r, _)| r == role).map(|(_, a)| a)
    }

    pub fn roles(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(r, _)| r.as_str())
    }

    pub fn agents(&self) -> impl Iterator<Item = &AgentConfig> {
        self.entries.iter().map(|(_, a)| a)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Apply per-pipe overrides. Entries naming unknown pipes are ignored.
    pub fn apply_overrides(&mut self, overrides: &Overrides) {
        for (_, agent) in self.entries.iter_mut() {
            if let Some(patch) = overrides.agents.get(&agent.name) {
                debug!(pipe = %agent.name, "applying config override");
                agent.apply(patch);
            }
        }
    }
}

/// Partial agent settings from a config file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AgentOverride {
    pub model: Option<String>,
    pub prompt: Option<String>,
    pub json: Option<bool>,
    pub memory: Option<Vec<String>>,
}

/// Memory settings for the retrieval pattern.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MemorySettings {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub documents: Vec<String>,
}

/// Contents of an overrides file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Overrides {
    #[serde(default)]
    pub agents: HashMap<String, AgentOverride>,
    #[serde(default)]
    pub memory: Option<MemorySettings>,
}

impl Overrides {
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&text)
    }
}
