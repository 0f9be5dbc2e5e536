//! §4.B LLM client contract. Never throws into callers: every failure
//! mode (timeout, network error, non-success status, malformed body)
//! collapses to `None`.

use async_trait::async_trait;

/// Which profile to decode a turn with. NPC turns are short and hot
/// (favor latency); Story turns are long and cool (favor coherence).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProfile {
    Npc,
    Story,
}

#[derive(Debug, Clone)]
pub struct ChatTurn {
    pub role: &'static str,
    pub content: String,
}

impl ChatTurn {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: "system", content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user", content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: "assistant", content: content.into() }
    }
}

#[async_trait]
pub trait LlmPort: Send + Sync {
    /// `complete(systemPrompt, userMessage, profile, cancel) → text or null`.
    async fn complete(
        &self,
        system_prompt: &str,
        user_message: &str,
        profile: LlmProfile,
    ) -> Option<String>;

    /// `completeWithHistory(systemPrompt, [(role,content)…], profile, cancel)`.
    async fn complete_with_history(
        &self,
        system_prompt: &str,
        history: &[ChatTurn],
        profile: LlmProfile,
    ) -> Option<String>;

    /// `embed(text, cancel) → dense float vector or null`.
    async fn embed(&self, text: &str) -> Option<Vec<f32>>;
}
