//! Concrete adapters behind the application layer's ports: SQLite
//! persistence, the bounded memory-write queue, the HTTP LLM client, the
//! trace fabric, and the aggregated infrastructure error type.

pub mod error;
pub mod kb_seed;
pub mod llm;
pub mod persistence;
pub mod queue;
pub mod trace;

pub use error::CoreError;
pub use trace::TraceFabric;
