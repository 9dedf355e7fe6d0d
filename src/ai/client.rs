use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use async_openai::{Client, config::OpenAIConfig};
use async_trait::async_trait;
use tokio::time::timeout;

use crate::config::ShellConfig;

/// Low temperature keeps command generation close to deterministic.
pub const DEFAULT_TEMPERATURE: f32 = 0.1;

/// One single-turn chat request: a role-specific system instruction plus
/// the user content for this call site.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub system: String,
    pub user: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl ChatRequest {
    pub fn new(system: impl Into<String>, user: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            max_tokens,
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

/// Anything that can answer a chat request with plain text.
///
/// Wrap network-backed implementations in [`TimeoutClient`]; callers rely
/// on an error coming back rather than the session hanging.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, request: ChatRequest) -> Result<String>;
}

/// Bounds every request of the inner client by a fixed deadline.
pub struct TimeoutClient<C> {
    inner: C,
    limit: Duration,
}

impl<C: LlmClient> TimeoutClient<C> {
    pub fn new(inner: C, limit: Duration) -> Self {
        Self { inner, limit }
    }
}

#[async_trait]
impl<C: LlmClient> LlmClient for TimeoutClient<C> {
    async fn complete(&self, request: ChatRequest) -> Result<String> {
        timeout(self.limit, self.inner.complete(request))
            .await
            .map_err(|_| anyhow!("model request timed out after {:?}", self.limit))?
    }
}

/// OpenAI-compatible chat completions client (OpenRouter by default).
///
/// Has no deadline of its own; see [`TimeoutClient`].
pub struct OpenAiClient {
    client: Client<OpenAIConfig>,
    pub model: String,
}

impl OpenAiClient {
    pub fn new(config: &ShellConfig) -> Self {
        let mut openai_config = OpenAIConfig::new().with_api_base(config.api_base.clone());
        if let Some(key) = &config.api_key {
            openai_config = openai_config.with_api_key(key.clone());
        }

        Self {
            client: Client::with_config(openai_config),
            model: config.model.clone(),
        }
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    #[allow(deprecated)]
    async fn complete(&self, request: ChatRequest) -> Result<String> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(request.system)
                .build()?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(request.user)
                .build()?
                .into(),
        ];

        let body = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .max_tokens(request.max_tokens)
            .temperature(request.temperature)
            .build()
            .context("Failed to build chat request")?;

        let response = self
            .client
            .chat()
            .create(body)
            .await
            .context("model request failed")?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| anyhow!("model returned an empty response"))?;

        Ok(content.trim().to_string())
    }
}
