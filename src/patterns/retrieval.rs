//! Memory-augmented answers — documents into a hosted memory, pipe bound to it.

use std::sync::Arc;

use tracing::info;

use super::{agent, PatternError};
use crate::config::{defaults, AgentTable};
use crate::download::download;
use crate::memory::{content_type_for, is_supported, MemoryBackend, MemoryChunk};
use crate::pipe::{provision, run_text, PipeBackend};

/// Backend that speaks both the pipe and memory APIs.
pub trait Backend: PipeBackend + MemoryBackend {
    fn as_pipes(&self) -> &dyn PipeBackend;
}

impl<T: PipeBackend + MemoryBackend> Backend for T {
    fn as_pipes(&self) -> &dyn PipeBackend {
        self
    }
}

pub struct RetrievalAgent {
    backend: Arc<dyn Backend>,
    memory: String,
    documents: Vec<String>,
    agents: AgentTable,
}

impl RetrievalAgent {
    /// `agents` must hold an `assistant` bound to `memory`.
    pub fn new(backend: Arc<dyn Backend>, memory: &str, agents: AgentTable) -> Self {
        Self {
            backend,
            memory: memory.to_string(),
            documents: Vec::new(),
            agents,
        }
    }

    pub fn with_defaults(backend: Arc<dyn Backend>, memory: &str) -> Self {
        Self::new(backend, memory, defaults::memory(memory))
    }

    /// Document URLs to download and upload during `setup()`.
    pub fn documents(mut self, urls: Vec<String>) -> Self {
        self.documents = urls;
        self
    }

    pub fn memory(&self) -> &str {
        &self.memory
    }

    /// Ensure the memory exists, fill it, then provision the pipe.
    pub async fn setup(&self) -> Result<(), PatternError> {
        self.backend
            .create_memory(&self.memory, "Documents for retrieval-augmented answers")
            .await?;

        for url in &self.documents {
            let doc = download(url).await?;
            self.upload(&doc.file_name, doc.bytes, doc.content_type.as_deref()).await?;
        }

        provision(self.backend.as_pipes(), &self.agents).await?;
        Ok(())
    }

    /// Upload one document. A supported server content type wins; otherwise
    /// the type is derived from the document name.
    pub async fn upload(
        &self,
        document: &str,
        bytes: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<(), PatternError> {
        let content_type = match content_type {
            Some(ct) if is_supported(ct) => ct,
            _ => content_type_for(document)?,
        };
        self.backend
            .upload_document(&self.memory, document, bytes, content_type)
            .await?;
        info!(memory = %self.memory, document, "document stored");
        Ok(())
    }

    /// Ask the memory-bound pipe a question.
    pub async fn run(&self, question: &str) -> Result<String, PatternError> {
        let assistant = agent(&self.agents, "assistant")?;
        Ok(run_text(self.backend.as_pipes(), &assistant.name, question).await?)
    }

    /// Raw retrieval without a model call.
    pub async fn recall(&self, query: &str, top_k: usize) -> Result<Vec<MemoryChunk>, PatternError> {
        let memories = [self.memory.clone()];
        Ok(self.backend.retrieve(query, &memories, top_k).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipe::ScriptedBackend;

    #[tokio::test]
    async fn setup_creates_memory_and_bound_pipe() {
        let backend = Arc::new(ScriptedBackend::new());
        let agent = RetrievalAgent::with_defaults(backend.clone(), "product-docs");

        agent.setup().await.unwrap();

        assert_eq!(backend.memories().await, vec!["product-docs".to_string()]);
        let created = backend.created().await;
        assert_eq!(created[0].name, "memory-agent");
        assert_eq!(created[0].memory[0].name, "product-docs");
    }

    #[tokio::test]
    async fn upload_derives_content_type_from_name() {
        let backend = Arc::new(ScriptedBackend::new());
        let agent = RetrievalAgent::with_defaults(backend.clone(), "docs");

        agent
            .upload("faq.md", b"# FAQ".to_vec(), Some("application/octet-stream"))
            .await
            .unwrap();

        let uploads = backend.uploads().await;
        assert_eq!(uploads[0].memory, "docs");
        assert_eq!(uploads[0].document, "faq.md");
        assert_eq!(uploads[0].content_type, "text/markdown");
        assert_eq!(uploads[0].bytes, b"# FAQ");
    }

    #[tokio::test]
    async fn supported_server_type_wins_over_name() {
        let backend = Arc::new(ScriptedBackend::new());
        let agent = RetrievalAgent::with_defaults(backend.clone(), "docs");

        agent.upload("changelog", b"v1".to_vec(), Some("text/plain")).await.unwrap();
        assert_eq!(backend.uploads().await[0].content_type, "text/plain");
    }

    #[tokio::test]
    async fn unsupported_document_is_not_uploaded() {
        let backend = Arc::new(ScriptedBackend::new());
        let agent = RetrievalAgent::with_defaults(backend.clone(), "docs");

        let err = agent.upload("logo.png", vec![1, 2, 3], None).await.unwrap_err();
        assert!(matches!(err, PatternError::Memory(_)));
        assert!(backend.uploads().await.is_empty());
    }

    #[tokio::test]
    async fn run_asks_memory_agent() {
        let backend = Arc::new(ScriptedBackend::new().reply("memory-agent", "Refunds take 30 days."));
        let agent = RetrievalAgent::with_defaults(backend.clone(), "docs");
        assert_eq!(agent.run("How long do refunds take?").await.unwrap(), "Refunds take 30 days.");
    }

    #[tokio::test]
    async fn recall_limits_chunks() {
        let chunk = |text: &str| MemoryChunk {
            text: text.into(),
            similarity: 0.5,
            meta: serde_json::Value::Null,
        };
        let backend = Arc::new(ScriptedBackend::new().with_chunks(vec![chunk("a"), chunk("b"), chunk("c")]));
        let agent = RetrievalAgent::with_defaults(backend, "docs");
        let chunks = agent.recall("q", 2).await.unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1].text, "b");
    }
}
