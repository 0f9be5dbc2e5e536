//! Raw HTTP `LlmPort` adapter (§4.B, §6 "LLM HTTP surface"). Talks to an
//! Ollama-shaped chat/embedding endpoint over `reqwest`. Every failure
//! mode — timeout, connection error, non-success status, malformed body —
//! collapses to `None` rather than propagating, per the port contract.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::application::ports::{ChatTurn, LlmPort, LlmProfile};
use crate::config::LlmConfig;

#[derive(Debug, Clone, Copy)]
struct ProfileSettings {
    model: &'static str,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatMessageBody {
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponseBody {
    message: Option<ChatMessageBody>,
    response: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EmbedResponseBody {
    embeddings: Vec<Vec<f32>>,
}

#[derive(Debug, Serialize)]
struct ChatOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Debug, Serialize)]
struct ChatRequestMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequestBody<'a> {
    model: &'a str,
    stream: bool,
    options: ChatOptions,
    messages: Vec<ChatRequestMessage<'a>>,
}

pub struct HttpLlmClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    story_model: String,
    temperature: f32,
    story_temperature: f32,
    max_tokens: u32,
    story_max_tokens: u32,
    api_key: Option<String>,
    embedding_model: String,
}

impl HttpLlmClient {
    pub fn new(config: &LlmConfig) -> Self {
        let timeout = std::time::Duration::from_millis(config.effective_timeout_ms());
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            story_model: config.story_model.clone(),
            temperature: config.temperature,
            story_temperature: config.story_temperature,
            max_tokens: config.max_tokens,
            story_max_tokens: config.story_max_tokens,
            api_key: config.api_key.clone(),
            embedding_model: config.embedding_model.clone(),
        }
    }

    fn settings_for(&self, profile: LlmProfile) -> (String, ProfileSettings) {
        match profile {
            LlmProfile::Npc => (
                self.model.clone(),
                ProfileSettings { model: "npc", temperature: self.temperature, max_tokens: self.max_tokens },
            ),
            LlmProfile::Story => (
                self.story_model.clone(),
                ProfileSettings {
                    model: "story",
                    temperature: self.story_temperature,
                    max_tokens: self.story_max_tokens,
                },
            ),
        }
    }

    fn request_builder(&self, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut builder = self.client.post(url);
        if let Some(token) = &self.api_key {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    async fn chat(&self, system_prompt: &str, turns: &[ChatTurn], profile: LlmProfile) -> Option<String> {
        let (model, settings) = self.settings_for(profile);
        let mut messages = vec![ChatRequestMessage { role: "system", content: system_prompt }];
        messages.extend(turns.iter().map(|t| ChatRequestMessage { role: t.role, content: &t.content }));

        let body = ChatRequestBody {
            model: &model,
            stream: false,
            options: ChatOptions { temperature: settings.temperature, num_predict: settings.max_tokens },
            messages,
        };

        tracing::debug!(profile = settings.model, model = %model, "dispatching llm chat request");

        let response = self.request_builder("/api/chat").json(&body).send().await;
        let response = match response {
            Ok(r) if r.status().is_success() => r,
            Ok(r) => {
                tracing::warn!(status = %r.status(), "llm chat request returned non-success status");
                return None;
            }
            Err(err) => {
                tracing::warn!(error = %err, "llm chat request failed");
                return None;
            }
        };

        let parsed: ChatResponseBody = match response.json().await {
            Ok(parsed) => parsed,
            Err(err) => {
                tracing::warn!(error = %err, "llm chat response body was malformed");
                return None;
            }
        };

        parsed.message.map(|m| m.content).or(parsed.response)
    }
}

#[async_trait]
impl LlmPort for HttpLlmClient {
    async fn complete(&self, system_prompt: &str, user_message: &str, profile: LlmProfile) -> Option<String> {
        self.chat(system_prompt, &[ChatTurn::user(user_message)], profile).await
    }

    async fn complete_with_history(
        &self,
        system_prompt: &str,
        history: &[ChatTurn],
        profile: LlmProfile,
    ) -> Option<String> {
        self.chat(system_prompt, history, profile).await
    }

    async fn embed(&self, text: &str) -> Option<Vec<f32>> {
        let body = json!({ "model": self.embedding_model, "input": text });
        let response = self.request_builder("/api/embed").json(&body).send().await;
        let response = match response {
            Ok(r) if r.status().is_success() => r,
            Ok(r) => {
                tracing::warn!(status = %r.status(), "llm embed request returned non-success status");
                return None;
            }
            Err(err) => {
                tracing::warn!(error = %err, "llm embed request failed");
                return None;
            }
        };
        let parsed: EmbedResponseBody = match response.json().await {
            Ok(parsed) => parsed,
            Err(err) => {
                tracing::warn!(error = %err, "llm embed response body was malformed");
                return None;
            }
        };
        parsed.embeddings.into_iter().next()
    }
}
