//! Concrete `LlmPort` adapters (§4.B, §6): an HTTP client talking to an
//! Ollama-shaped endpoint, wrapped in retry-with-backoff resilience.

mod http_client;
mod resilient;

pub use http_client::HttpLlmClient;
pub use resilient::{ResilientLlmClient, RetryConfig};
