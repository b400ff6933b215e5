use async_trait::async_trait;
use llm::builder::{LLMBackend, LLMBuilder};
use llm::chat::ChatMessage;
use thiserror::Error;

use redline_core::Settings;

use crate::retry::RetryPolicy;

/// Sampling temperature for every review call. Kept low so reviews of the
/// same code stay stable across runs.
pub const TEMPERATURE: f32 = 0.2;

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("unknown provider: {0}")]
    UnknownProvider(String),
    #[error("build LLM: {0}")]
    Backend(String),
    #[error("chat: {0}")]
    Request(String),
    #[error("LLM returned empty text")]
    EmptyReply,
    #[error("LLM returned no text")]
    NoReply,
}

/// Role tag for one prompt turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    System,
    User,
}

/// One role-tagged message in the outgoing prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

impl ChatTurn {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        ChatTurn {
            role,
            content: content.into(),
        }
    }
}

/// Everything one completion attempt needs.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub messages: Vec<ChatTurn>,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// A single completion attempt against some model service. Implementations
/// do exactly one try; retry scheduling lives in [`CompletionClient`].
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send(&self, request: &CompletionRequest) -> Result<String, CompletionError>;
}

fn map_backend(provider: &str) -> Result<LLMBackend, CompletionError> {
    match provider {
        "openai" => Ok(LLMBackend::OpenAI),
        "anthropic" => Ok(LLMBackend::Anthropic),
        "google" => Ok(LLMBackend::Google),
        "ollama" => Ok(LLMBackend::Ollama),
        "groq" => Ok(LLMBackend::Groq),
        "mistral" => Ok(LLMBackend::Mistral),
        "deepseek" => Ok(LLMBackend::DeepSeek),
        other => Err(CompletionError::UnknownProvider(other.to_string())),
    }
}

/// The llm builder takes one system string; multiple system turns collapse
/// into one, blank-line separated.
fn join_system(messages: &[ChatTurn]) -> String {
    messages
        .iter()
        .filter(|turn| turn.role == ChatRole::System)
        .map(|turn| turn.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Production transport over the `llm` crate. The provider is rebuilt on
/// every attempt; credentials and provider choice come from [`Settings`],
/// the model comes from the request.
pub struct LlmTransport {
    settings: Settings,
}

impl LlmTransport {
    pub fn new(settings: Settings) -> Self {
        LlmTransport { settings }
    }
}

#[async_trait]
impl ChatTransport for LlmTransport {
    async fn send(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        let backend = map_backend(&self.settings.provider)?;

        tracing::debug!(
            provider = %self.settings.provider,
            model = %request.model,
            "sending completion request"
        );

        let mut builder = LLMBuilder::new()
            .backend(backend)
            .model(&request.model)
            .max_tokens(request.max_tokens)
            .temperature(request.temperature);

        let system = join_system(&request.messages);
        if !system.is_empty() {
            builder = builder.system(&system);
        }
        if !self.settings.api_key.is_empty() {
            builder = builder.api_key(&self.settings.api_key);
        }

        let llm = builder
            .build()
            .map_err(|e| CompletionError::Backend(e.to_string()))?;

        let messages: Vec<ChatMessage> = request
            .messages
            .iter()
            .filter(|turn| turn.role == ChatRole::User)
            .map(|turn| ChatMessage::user().content(turn.content.clone()).build())
            .collect();

        let response = llm
            .chat(&messages)
            .await
            .map_err(|e| CompletionError::Request(e.to_string()))?;

        match response.text() {
            Some(text) if !text.trim().is_empty() => Ok(text),
            Some(_) => Err(CompletionError::EmptyReply),
            None => Err(CompletionError::NoReply),
        }
    }
}

/// Retrying front door for completions: one `complete` call is up to
/// `max_attempts` transport attempts with backoff in between.
pub struct CompletionClient<T: ChatTransport> {
    transport: T,
    policy: RetryPolicy,
}

impl<T: ChatTransport> CompletionClient<T> {
    pub fn new(transport: T) -> Self {
        CompletionClient {
            transport,
            policy: RetryPolicy::default(),
        }
    }

    pub fn with_policy(transport: T, policy: RetryPolicy) -> Self {
        CompletionClient { transport, policy }
    }

    /// Request one completion, retrying any failure including blank
    /// replies. The error of the final attempt is returned as-is.
    pub async fn complete(
        &self,
        messages: &[ChatTurn],
        model: &str,
        max_tokens: u32,
    ) -> Result<String, CompletionError> {
        let request = CompletionRequest {
            messages: messages.to_vec(),
            model: model.to_string(),
            max_tokens,
            temperature: TEMPERATURE,
        };
        let request = &request;
        let transport = &self.transport;

        self.policy
            .run(|| async move {
                let text = transport.send(request).await?;
                if text.trim().is_empty() {
                    return Err(CompletionError::EmptyReply);
                }
                Ok(text)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unknown_provider() {
        let err = map_backend("cohere").unwrap_err();
        assert!(matches!(err, CompletionError::UnknownProvider(ref p) if p == "cohere"));
    }

    #[test]
    fn known_providers_map() {
        for provider in [
            "openai",
            "anthropic",
            "google",
            "ollama",
            "groq",
            "mistral",
            "deepseek",
        ] {
            assert!(map_backend(provider).is_ok(), "{provider} should map");
        }
    }

    #[test]
    fn system_turns_collapse_into_one() {
        let messages = [
            ChatTurn::new(ChatRole::System, "a"),
            ChatTurn::new(ChatRole::User, "code"),
            ChatTurn::new(ChatRole::System, "b"),
        ];
        assert_eq!(join_system(&messages), "a\n\nb");
    }

    #[tokio::test(start_paused = true)]
    async fn whitespace_replies_are_retried_then_fail() {
        struct BlankTransport;

        #[async_trait]
        impl ChatTransport for BlankTransport {
            async fn send(&self, _request: &CompletionRequest) -> Result<String, CompletionError> {
                Ok("   \n".to_string())
            }
        }

        let client = CompletionClient::new(BlankTransport);
        let err = client
            .complete(&[ChatTurn::new(ChatRole::User, "hi")], "test-model", 16)
            .await
            .unwrap_err();
        assert!(matches!(err, CompletionError::EmptyReply));
    }
}
