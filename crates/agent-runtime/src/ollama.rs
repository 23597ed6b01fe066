//! Ollama LLM Provider
//!
//! Local inference through `ollama-rs`. No credential is needed; the base
//! URL, when given, selects the host and port.

use agent_core::{
    error::{AgentError, Result},
    message::{Message, Role},
    provider::{
        Completion, CompletionStream, FinishReason, GenerationOptions, LlmProvider, ProviderInfo,
        StreamChunk, TokenUsage,
    },
};
use async_trait::async_trait;
use futures::StreamExt;
use ollama_rs::{
    Ollama,
    generation::chat::{
        ChatMessage, ChatMessageFinalResponseData, ChatMessageResponse, MessageRole,
        request::ChatMessageRequest,
    },
    models::ModelOptions,
};

const DEFAULT_HOST: &str = "http://localhost";
const DEFAULT_PORT: u16 = 11434;

/// Ollama endpoint
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OllamaConfig {
    pub host: String,
    pub port: u16,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.into(),
            port: DEFAULT_PORT,
        }
    }
}

impl OllamaConfig {
    /// Split `scheme://host:port` into its parts, falling back to the
    /// local default for anything missing.
    pub fn from_base_url(base_url: Option<&str>) -> Self {
        let Some(url) = base_url.map(|u| u.trim().trim_end_matches('/')).filter(|u| !u.is_empty()) else {
            return Self::default();
        };

        let authority_start = url.find("://").map_or(0, |i| i + 3);
        match url[authority_start..].rfind(':') {
            Some(offset) => {
                let split = authority_start + offset;
                let port = url[split + 1..].parse().unwrap_or(DEFAULT_PORT);
                Self { host: url[..split].to_string(), port }
            }
            None => Self { host: url.to_string(), port: DEFAULT_PORT },
        }
    }

    fn base_url(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Ollama LLM provider
pub struct OllamaProvider {
    client: Ollama,
    config: OllamaConfig,
}

impl OllamaProvider {
    pub fn from_config(config: OllamaConfig) -> Self {
        Self {
            client: Ollama::new(config.host.clone(), config.port),
            config,
        }
    }

    pub fn localhost() -> Self {
        Self::from_config(OllamaConfig::default())
    }

    fn convert_messages(messages: &[Message]) -> Vec<ChatMessage> {
        messages
            .iter()
            .map(|m| {
                let role = match m.role {
                    Role::System => MessageRole::System,
                    Role::Assistant => MessageRole::Assistant,
                    // Tools appear as user context
                    Role::User | Role::Tool => MessageRole::User,
                };
                ChatMessage::new(role, m.content.clone())
            })
            .collect()
    }

    fn usage(data: &ChatMessageFinalResponseData) -> TokenUsage {
        let prompt = u32::try_from(data.prompt_eval_count).unwrap_or(u32::MAX);
        let completion = u32::try_from(data.eval_count).unwrap_or(u32::MAX);
        TokenUsage::new(prompt, completion)
    }

    fn convert_completion(response: ChatMessageResponse, model: &str) -> Completion {
        Completion {
            usage: response.final_data.as_ref().map(Self::usage),
            content: response.message.content,
            model: model.to_string(),
            finish_reason: Some(FinishReason::Stop),
        }
    }

    fn build_request(messages: &[Message], options: &GenerationOptions) -> ChatMessageRequest {
        let ollama_options = ModelOptions::default()
            .temperature(options.temperature)
            .top_p(options.top_p)
            .num_predict(i32::try_from(options.max_tokens).unwrap_or(i32::MAX));

        ChatMessageRequest::new(options.model.clone(), Self::convert_messages(messages))
            .options(ollama_options)
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    fn info(&self) -> ProviderInfo {
        ProviderInfo {
            name: "ollama".into(),
            base_url: self.config.base_url(),
            supports_streaming: true,
        }
    }

    async fn complete(
        &self,
        messages: &[Message],
        options: &GenerationOptions,
    ) -> Result<Completion> {
        let request = Self::build_request(messages, options);

        let response = self
            .client
            .send_chat_messages(request)
            .await
            .map_err(|e| AgentError::ProviderUnavailable(format!("ollama: {e}")))?;

        Ok(Self::convert_completion(response, &options.model))
    }

    async fn complete_stream(
        &self,
        messages: &[Message],
        options: &GenerationOptions,
    ) -> Result<CompletionStream> {
        let request = Self::build_request(messages, options);

        let stream = self
            .client
            .send_chat_messages_stream(request)
            .await
            .map_err(|e| AgentError::ProviderUnavailable(format!("ollama: {e}")))?;

        let mapped = stream.map(|result| {
            result
                .map(|chunk| StreamChunk {
                    done: chunk.done,
                    usage: chunk.final_data.as_ref().map(Self::usage),
                    delta: chunk.message.content,
                })
                .map_err(|()| AgentError::Provider("ollama stream interrupted".into()))
        });

        Ok(Box::pin(mapped))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_base_url() {
        assert_eq!(OllamaConfig::from_base_url(None), OllamaConfig::default());
        assert_eq!(OllamaConfig::from_base_url(Some("  ")), OllamaConfig::default());

        let config = OllamaConfig::from_base_url(Some("http://gpu-box:11500/"));
        assert_eq!(config.host, "http://gpu-box");
        assert_eq!(config.port, 11500);

        let config = OllamaConfig::from_base_url(Some("http://gpu-box"));
        assert_eq!(config.host, "http://gpu-box");
        assert_eq!(config.port, 11434);
    }

    #[test]
    fn test_message_conversion() {
        let messages = vec![
            Message::system("You are helpful."),
            Message::user("Hello"),
            Message::tool("[Tool 'x' returned]\nok", None),
        ];

        let converted = OllamaProvider::convert_messages(&messages);
        assert_eq!(converted.len(), 3);
    }

    #[test]
    fn test_info() {
        let provider = OllamaProvider::localhost();
        let info = provider.info();
        assert_eq!(info.name, "ollama");
        assert_eq!(info.base_url, "http://localhost:11434");
        assert!(info.supports_streaming);
    }
}
