//! Unified infrastructure error type.
//!
//! Aggregates every adapter-layer failure so application services can
//! propagate with `?` across port boundaries, mirroring the teacher's
//! `InfraError` aggregate in `crates/engine/src/infrastructure/error.rs`.
//! Per §7, transient I/O never reaches this type on the hot paths (LLM,
//! memory recall) — those return `Option`/`bool` and log instead. This
//! type exists for the paths that *are* allowed to fail loudly: schema
//! bootstrap, the KB seed loader, and the CLI.

use loreweave_domain::DomainError;
use thiserror::Error;

use crate::infrastructure::queue::QueueError;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),

    #[error("llm error: {0}")]
    Llm(String),

    #[error("repository error: {0}")]
    Repo(String),

    #[error(transparent)]
    Queue(#[from] QueueError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}
