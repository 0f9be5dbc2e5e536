//! Engine configuration, loaded from environment variables (§6
//! "Configuration"). Grounded on the teacher's `engine-adapters::infrastructure::config::AppConfig`
//! (env-first, `unwrap_or_else` defaults, `anyhow::Context` on the few
//! required values) — `dotenvy` loads an optional `.env` before reading,
//! exactly as the teacher's binary entrypoint does.

use std::env;

use anyhow::{Context, Result};

/// Memory-store configuration (§4.A, §6 `memory.*`).
#[derive(Debug, Clone)]
pub struct MemoryConfig {
    pub enabled: bool,
    /// SQLite connection string (a file path or `sqlite::memory:`).
    pub connection_string: String,
    pub use_pgvector: bool,
    pub default_memory_top_k: usize,
    pub default_kb_top_k: usize,
    pub candidate_limit: usize,
    pub max_write_queue: usize,
    pub max_writes_per_second: u32,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            connection_string: "sqlite://loreweave.db".to_string(),
            use_pgvector: false,
            default_memory_top_k: 5,
            default_kb_top_k: 5,
            candidate_limit: 200,
            max_write_queue: 100,
            max_writes_per_second: 20,
        }
    }
}

/// LLM client configuration (§4.B, §6 `llm.*`).
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub enabled: bool,
    pub base_url: String,
    pub model: String,
    pub story_model: String,
    pub api_key: Option<String>,
    pub temperature: f32,
    pub story_temperature: f32,
    pub max_tokens: u32,
    pub story_max_tokens: u32,
    pub timeout_ms: u64,
    pub story_timeout_ms: u64,
    pub embedding_model: String,
}

impl LlmConfig {
    /// The HTTP client timeout is the maximum of the two profile timeouts
    /// (§4.B: "The effective HTTP timeout is the maximum of NPC and Story
    /// timeouts").
    pub fn effective_timeout_ms(&self) -> u64 {
        self.timeout_ms.max(self.story_timeout_ms)
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "http://localhost:11434".to_string(),
            model: "llama3.1".to_string(),
            story_model: "llama3.1".to_string(),
            api_key: None,
            temperature: 0.7,
            story_temperature: 0.5,
            max_tokens: 256,
            story_max_tokens: 1024,
            timeout_ms: 8_000,
            story_timeout_ms: 30_000,
            embedding_model: "nomic-embed-text".to_string(),
        }
    }
}

/// World tick scheduler configuration (§4.J, §6 `driver.loopDelayMs`).
#[derive(Debug, Clone)]
pub struct DriverConfig {
    pub loop_delay_ms: u64,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self { loop_delay_ms: 50 }
    }
}

/// Root engine configuration.
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub memory: MemoryConfig,
    pub llm: LlmConfig,
    pub driver: DriverConfig,
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_bool_or(key: &str, default: bool) -> bool {
    env::var(key)
        .ok()
        .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}

impl EngineConfig {
    /// Load from environment variables, falling back to an optional
    /// `.env` file first (teacher's binary entrypoint convention).
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let memory = MemoryConfig {
            enabled: env_bool_or("MEMORY_ENABLED", defaults.memory.enabled),
            connection_string: env_or("MEMORY_CONNECTION_STRING", &defaults.memory.connection_string),
            use_pgvector: env_bool_or("MEMORY_USE_PGVECTOR", defaults.memory.use_pgvector),
            default_memory_top_k: env_parse_or(
                "MEMORY_DEFAULT_MEMORY_TOP_K",
                defaults.memory.default_memory_top_k,
            ),
            default_kb_top_k: env_parse_or("MEMORY_DEFAULT_KB_TOP_K", defaults.memory.default_kb_top_k),
            candidate_limit: env_parse_or("MEMORY_CANDIDATE_LIMIT", defaults.memory.candidate_limit),
            max_write_queue: env_parse_or("MEMORY_MAX_WRITE_QUEUE", defaults.memory.max_write_queue),
            max_writes_per_second: env_parse_or(
                "MEMORY_MAX_WRITES_PER_SECOND",
                defaults.memory.max_writes_per_second,
            ),
        };

        let llm = LlmConfig {
            enabled: env_bool_or("LLM_ENABLED", defaults.llm.enabled),
            base_url: env_or("LLM_BASE_URL", &defaults.llm.base_url),
            model: env_or("LLM_MODEL", &defaults.llm.model),
            story_model: env_or("LLM_STORY_MODEL", &defaults.llm.story_model),
            api_key: env::var("LLM_API_KEY").ok().filter(|s| !s.is_empty()),
            temperature: env_parse_or("LLM_TEMPERATURE", defaults.llm.temperature),
            story_temperature: env_parse_or("LLM_STORY_TEMPERATURE", defaults.llm.story_temperature),
            max_tokens: env_parse_or("LLM_MAX_TOKENS", defaults.llm.max_tokens),
            story_max_tokens: env_parse_or("LLM_STORY_MAX_TOKENS", defaults.llm.story_max_tokens),
            timeout_ms: env_parse_or("LLM_TIMEOUT_MS", defaults.llm.timeout_ms),
            story_timeout_ms: env_parse_or("LLM_STORY_TIMEOUT_MS", defaults.llm.story_timeout_ms),
            embedding_model: env_or("LLM_EMBEDDING_MODEL", &defaults.llm.embedding_model),
        };

        let driver = DriverConfig {
            loop_delay_ms: env_parse_or("DRIVER_LOOP_DELAY_MS", defaults.driver.loop_delay_ms),
        };

        if llm.enabled && llm.base_url.is_empty() {
            return Err(anyhow::anyhow!("LLM_BASE_URL must not be empty when LLM_ENABLED is set"))
                .context("invalid llm configuration");
        }

        Ok(Self { memory, llm, driver })
    }
}
