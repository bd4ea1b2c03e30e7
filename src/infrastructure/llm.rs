//! LLM client
//!
//! Prose for the weekly reports comes from an OpenAI-compatible chat API via
//! async-openai. The generator only sees the `TextGenerator` trait, so tests
//! and offline runs can swap in their own implementation.

use anyhow::{Context, Result};
use async_openai::config::OpenAIConfig;
use async_openai::types::chat::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use async_openai::Client;
use async_trait::async_trait;

/// Anything that turns a prompt into free text
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// OpenAI client
#[derive(Clone)]
pub struct OpenAIClient {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAIClient {
    /// Create a client against `base_url`
    pub fn new_with_base_url(api_key: String, model: String, base_url: String) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();

        let config = OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(base_url);

        let client = Client::with_config(config);

        Self { client, model }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Call the chat API
    pub async fn chat(&self, messages: Vec<Message>) -> Result<String> {
        let messages: Vec<ChatCompletionRequestMessage> = messages
            .into_iter()
            .map(|msg| match msg.role.as_str() {
                "system" => ChatCompletionRequestSystemMessageArgs::default()
                    .content(msg.content)
                    .build()
                    .map(ChatCompletionRequestMessage::System),
                _ => ChatCompletionRequestUserMessageArgs::default()
                    .content(msg.content)
                    .build()
                    .map(ChatCompletionRequestMessage::User),
            })
            .collect::<Result<Vec<_>, _>>()
            .context("failed to build chat messages")?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .build()
            .context("failed to build chat request")?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .context("LLM API call failed")?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        if content.trim().is_empty() {
            anyhow::bail!("LLM returned an empty reply");
        }

        Ok(content)
    }

    /// Single user-turn completion
    pub async fn complete(&self, prompt: &str) -> Result<String> {
        let messages = vec![Message::user(prompt)];

        self.chat(messages).await
    }
}

#[async_trait]
impl TextGenerator for OpenAIClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.complete(prompt).await
    }
}

/// Chat message
#[derive(Clone, Debug)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = OpenAIClient::new_with_base_url(
            "test-key".to_string(),
            "gpt-4o-mini".to_string(),
            "https://api.openai.com/v1/".to_string(),
        );

        assert_eq!(client.model(), "gpt-4o-mini");
    }

    #[test]
    fn test_message_creation() {
        let msg = Message::user("Hello");

        assert_eq!(msg.role, "user");
        assert_eq!(msg.content, "Hello");
    }
}
