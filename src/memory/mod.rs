//! Memory — remotely hosted document stores for retrieval-augmented answers.
//!
//! The service does chunking, embedding and ranking. We only create the
//! store, push documents into it, and ask it for chunks.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::pipe::client::{check_status, PipeClient};
use crate::pipe::PipeError;

/// Errors from memory operations.
#[derive(Debug, thiserror::Error)]
pub enum MemoryError {
    #[error(transparent)]
    Pipe(#[from] PipeError),

    #[error("unsupported document type: {0}")]
    UnsupportedDocument(String),

    #[error("upload URL missing from response")]
    MissingSignedUrl,
}

/// A chunk returned by retrieval.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MemoryChunk {
    pub text: String,
    #[serde(default)]
    pub similarity: f32,
    #[serde(default)]
    pub meta: serde_json::Value,
}

/// Operations on hosted memories.
#[async_trait]
pub trait MemoryBackend: Send + Sync {
    /// Create a memory; an existing memory with the same name is reused.
    async fn create_memory(&self, name: &str, description: &str) -> Result<(), MemoryError>;

    /// Add one document to a memory.
    async fn upload_document(
        &self,
        memory: &str,
        document: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), MemoryError>;

    /// Top `top_k` chunks across `memories` for `query`.
    async fn retrieve(
        &self,
        query: &str,
        memories: &[String],
        top_k: usize,
    ) -> Result<Vec<MemoryChunk>, MemoryError>;
}

/// Content types the service indexes.
pub const SUPPORTED_TYPES: &[&str] = &["text/plain", "text/markdown", "application/pdf", "text/csv"];

pub fn is_supported(content_type: &str) -> bool {
    SUPPORTED_TYPES.contains(&content_type)
}

/// Content type for a document, by file extension.
pub fn content_type_for(document: &str) -> Result<&'static str, MemoryError> {
    let ext = document
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "txt" => Ok("text/plain"),
        "md" => Ok("text/markdown"),
        "pdf" => Ok("application/pdf"),
        "csv" => Ok("text/csv"),
        _ => Err(MemoryError::UnsupportedDocument(document.to_string())),
    }
}

// ── HTTP implementation ──

#[derive(Serialize)]
struct CreateMemoryBody<'a> {
    name: &'a str,
    description: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UploadBody<'a> {
    memory_name: &'a str,
    document_name: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadTicket {
    signed_url: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RetrieveBody<'a> {
    query: &'a str,
    memory: Vec<MemoryName<'a>>,
    top_k: usize,
}

#[derive(Serialize)]
struct MemoryName<'a> {
    name: &'a str,
}

#[async_trait]
impl MemoryBackend for PipeClient {
    async fn create_memory(&self, name: &str, description: &str) -> Result<(), MemoryError> {
        let body = CreateMemoryBody { name, description };
        match self.post_json("/v1/memory", &body).await {
            Ok(_) => {
                info!(memory = name, "memory created");
                Ok(())
            }
            Err(PipeError::Api { status: 409, .. }) => {
                debug!(memory = name, "memory exists, reusing");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn upload_document(
        &self,
        memory: &str,
        document: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), MemoryError> {
        let body = UploadBody {
            memory_name: memory,
            document_name: document,
        };
        let ticket: UploadTicket = self
            .post_json("/v1/memory/documents", &body)
            .await?
            .json()
            .await
            .map_err(|e| PipeError::InvalidResponse(format!("failed to parse upload ticket: {e}")))?;
        let signed_url = ticket.signed_url.ok_or(MemoryError::MissingSignedUrl)?;

        let response = self
            .http()
            .put(&signed_url)
            .header("content-type", content_type)
            .body(bytes)
            .send()
            .await
            .map_err(PipeError::from)?;
        check_status(response).await?;

        info!(memory, document, "document uploaded");
        Ok(())
    }

    async fn retrieve(
        &self,
        query: &str,
        memories: &[String],
        top_k: usize,
    ) -> Result<Vec<MemoryChunk>, MemoryError> {
        let body = RetrieveBody {
            query,
            memory: memories.iter().map(|name| MemoryName { name }).collect(),
            top_k,
        };
        let chunks = self
            .post_json("/v1/memory/retrieve", &body)
            .await?
            .json::<Vec<MemoryChunk>>()
            .await
            .map_err(|e| PipeError::InvalidResponse(format!("failed to parse chunks: {e}")))?;
        Ok(chunks)
    }
}
