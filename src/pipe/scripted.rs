//! In-process backend with canned responses.
//!
//! Each pipe name owns a FIFO of outcomes. Every request is recorded so
//! tests can assert on what a pattern actually sent.

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::types::{CreatePipeRequest, PipeHandle, RunOutcome, RunPipeRequest};
use super::{PipeBackend, PipeError};
use crate::memory::{MemoryBackend, MemoryChunk, MemoryError};

/// A document upload seen by the scripted backend.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedUpload {
    pub memory: String,
    pub document: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Default)]
struct Recorded {
    created: Vec<CreatePipeRequest>,
    runs: Vec<RunPipeRequest>,
    memories: Vec<String>,
    uploads: Vec<RecordedUpload>,
}

/// Deterministic backend for tests.
#[derive(Debug, Default)]
pub struct ScriptedBackend {
    replies: Mutex<HashMap<String, VecDeque<Result<RunOutcome, String>>>>,
    chunks: Vec<MemoryChunk>,
    recorded: Mutex<Recorded>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a text completion for `pipe`.
    pub fn reply(self, pipe: &str, completion: &str) -> Self {
        self.outcome(pipe, RunOutcome::text(completion))
    }

    /// Queue a full outcome for `pipe`.
    pub fn outcome(mut self, pipe: &str, outcome: RunOutcome) -> Self {
        self.replies
            .get_mut()
            .entry(pipe.to_string())
            .or_default()
            .push_back(Ok(outcome));
        self
    }

    /// Queue a failure for `pipe`; surfaces as `PipeError::Api` with status 500.
    pub fn fail(mut self, pipe: &str, message: &str) -> Self {
        self.replies
            .get_mut()
            .entry(pipe.to_string())
            .or_default()
            .push_back(Err(message.to_string()));
        self
    }

    /// Chunks returned by every `retrieve` call.
    pub fn with_chunks(mut self, chunks: Vec<MemoryChunk>) -> Self {
        self.chunks = chunks;
        self
    }

    pub async fn created(&self) -> Vec<CreatePipeRequest> {
        self.recorded.lock().await.created.clone()
    }

    pub async fn runs(&self) -> Vec<RunPipeRequest> {
        self.recorded.lock().await.runs.clone()
    }

    /// Runs sent to one pipe, in order.
    pub async fn runs_for(&self, pipe: &str) -> Vec<RunPipeRequest> {
        self.recorded
            .lock()
            .await
            .runs
            .iter()
            .filter(|r| r.name == pipe)
            .cloned()
            .collect()
    }

    pub async fn memories(&self) -> Vec<String> {
        self.recorded.lock().await.memories.clone()
    }

    pub async fn uploads(&self) -> Vec<RecordedUpload> {
        self.recorded.lock().await.uploads.clone()
    }
}

#[async_trait]
impl PipeBackend for ScriptedBackend {
    async fn create_pipe(&self, request: &CreatePipeRequest) -> Result<PipeHandle, PipeError> {
        self.recorded.lock().await.created.push(request.clone());
        Ok(PipeHandle {
            name: request.name.clone(),
            description: request.description.clone(),
            status: Some("private".into()),
            url: None,
        })
    }

    async fn run_pipe(&self, request: &RunPipeRequest) -> Result<RunOutcome, PipeError> {
        self.recorded.lock().await.runs.push(request.clone());

        let next = self
            .replies
            .lock()
            .await
            .get_mut(&request.name)
            .and_then(VecDeque::pop_front);

        match next {
            Some(Ok(outcome)) => Ok(outcome),
            Some(Err(message)) => Err(PipeError::Api {
                status: 500,
                message,
            }),
            None => Err(PipeError::InvalidResponse(format!(
                "no scripted response for pipe '{}'",
                request.name
            ))),
        }
    }
}

#[async_trait]
impl MemoryBackend for ScriptedBackend {
    async fn create_memory(&self, name: &str, _description: &str) -> Result<(), MemoryError> {
        let mut recorded = self.recorded.lock().await;
        if !recorded.memories.iter().any(|m| m == name) {
            recorded.memories.push(name.to_string());
        }
        Ok(())
    }

    async fn upload_document(
        &self,
        memory: &str,
        document: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), MemoryError> {
        self.recorded.lock().await.uploads.push(RecordedUpload {
            memory: memory.to_string(),
            document: document.to_string(),
            content_type: content_type.to_string(),
            bytes,
        });
        Ok(())
    }

    async fn retrieve(
        &self,
        _query: &str,
        _memories: &[String],
        top_k: usize,
    ) -> Result<Vec<MemoryChunk>, MemoryError> {
        Ok(self.chunks.iter().take(top_k).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipe::Message;

    #[tokio::test]
    async fn replies_pop_in_order_per_pipe() {
        let backend = ScriptedBackend::new()
            .reply("a", "first")
            .reply("b", "other")
            .reply("a", "second");

        let req = RunPipeRequest::new("a", vec![Message::user("x")]);
        assert_eq!(backend.run_pipe(&req).await.unwrap().completion, "first");
        assert_eq!(backend.run_pipe(&req).await.unwrap().completion, "second");
        assert_eq!(backend.runs_for("a").await.len(), 2);
    }

    #[tokio::test]
    async fn exhausted_queue_is_an_error() {
        let backend = ScriptedBackend::new();
        let req = RunPipeRequest::new("missing", vec![]);
        let err = backend.run_pipe(&req).await.unwrap_err();
        assert!(err.to_string().contains("missing"));
    }

    #[tokio::test]
    async fn scripted_failure_maps_to_api_error() {
        let backend = ScriptedBackend::new().fail("a", "boom");
        let req = RunPipeRequest::new("a", vec![]);
        let err = backend.run_pipe(&req).await.unwrap_err();
        assert!(matches!(err, PipeError::Api { status: 500, .. }));
    }

    #[tokio::test]
    async fn create_memory_is_idempotent() {
        let backend = ScriptedBackend::new();
        backend.create_memory("docs", "d").await.unwrap();
        backend.create_memory("docs", "d").await.unwrap();
        assert_eq!(backend.memories().await, vec!["docs".to_string()]);
    }
}
