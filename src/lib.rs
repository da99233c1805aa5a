//! agent-pipes — agent architecture patterns over hosted LLM pipes.
//!
//! ## Architecture
//!
//! - `pipe`: `PipeBackend` trait, HTTP `PipeClient`, provisioning, scripted backend
//! - `memory`: hosted document stores (create, upload, retrieve)
//! - `config`: agent tables, built-in prompts, YAML overrides
//! - `patterns`: chain, router, parallel, orchestrator, evaluator, tool use, retrieval
//! - `tools`: local tools the model can call
//! - `download`: buffered HTTP GET for documents
//! - `chat`: stdin/stdout conversation loop

pub mod chat;
pub mod config;
pub mod download;
pub mod memory;
pub mod patterns;
pub mod pipe;
pub mod tools;
