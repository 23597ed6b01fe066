//! OpenAI chat-completions backend.
//!
//! Also serves every vendor that speaks the same protocol (DeepSeek,
//! DashScope, Zhipu) when constructed with their base URL.

use std::time::Duration;

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
use serde::Deserialize;
use serde_json::{Value, json};

use crate::http;

pub const OPENAI_API_URL: &str = "https://api.openai.com/v1";

const VENDOR: &str = "openai";

/// Client for `/chat/completions`
pub struct OpenAiProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl OpenAiProvider {
    pub fn new(api_key: impl Into<String>, base_url: Option<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: http::client(timeout)?,
            api_key: api_key.into(),
            base_url: base_url.unwrap_or_else(|| OPENAI_API_URL.into()),
        })
    }

    fn endpoint(&self) -> String {
        http::join(&self.base_url, "chat/completions")
    }

    fn convert_messages(messages: &[Message]) -> Vec<Value> {
        messages
            .iter()
            .map(|m| {
                // Tool output is fed back as plain user context
                let role = match m.role {
                    Role::Tool => "user",
                    other => other.as_str(),
                };
                json!({ "role": role, "content": m.content })
            })
            .collect()
    }

    fn build_body(messages: &[Message], options: &GenerationOptions, stream: bool) -> Value {
        let mut body = json!({
            "model": options.model,
            "messages": Self::convert_messages(messages),
            "temperature": options.temperature,
            "top_p": options.top_p,
            "max_tokens": options.max_tokens,
            "stream": stream,
        });
        if !options.stop_sequences.is_empty() {
            body["stop"] = json!(options.stop_sequences);
        }
        body
    }

    async fn send(&self, body: &Value) -> Result<reqwest::Response> {
        tracing::debug!(url = %self.endpoint(), "sending chat completion request");

        let resp = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| http::transport(VENDOR, &e))?;

        http::check_status(VENDOR, resp).await
    }

    fn convert_completion(response: ChatResponse, model: &str) -> Result<Completion> {
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AgentError::Parse("No choices in response".into()))?;

        Ok(Completion {
            content: choice.message.content.unwrap_or_default(),
            model: response.model.unwrap_or_else(|| model.to_string()),
            usage: response.usage.map(Usage::into_token_usage),
            finish_reason: choice.finish_reason.as_deref().map(FinishReason::from_vendor),
        })
    }

    /// Parse one SSE `data:` payload. `None` means nothing to emit.
    fn parse_stream_data(data: &str) -> Option<Result<StreamChunk>> {
        if data == "[DONE]" {
            return Some(Ok(StreamChunk {
                delta: String::new(),
                done: true,
                usage: None,
            }));
        }

        let chunk: StreamResponse = match serde_json::from_str(data) {
            Ok(chunk) => chunk,
            Err(e) => return Some(Err(AgentError::Parse(format!("stream chunk: {e}")))),
        };

        let delta = chunk
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.delta.content)
            .unwrap_or_default();
        let usage = chunk.usage.map(Usage::into_token_usage);

        if delta.is_empty() && usage.is_none() {
            return None;
        }

        Some(Ok(StreamChunk {
            delta,
            done: false,
            usage,
        }))
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn info(&self) -> ProviderInfo {
        ProviderInfo {
            name: VENDOR.into(),
            base_url: self.base_url.clone(),
            supports_streaming: true,
        }
    }

    async fn complete(
        &self,
        messages: &[Message],
        options: &GenerationOptions,
    ) -> Result<Completion> {
        let body = Self::build_body(messages, options, false);
        let resp = self.send(&body).await?;
        let parsed: ChatResponse = resp.json().await.map_err(|e| http::transport(VENDOR, &e))?;

        Self::convert_completion(parsed, &options.model)
    }

    async fn complete_stream(
        &self,
        messages: &[Message],
        options: &GenerationOptions,
    ) -> Result<CompletionStream> {
        let body = Self::build_body(messages, options, true);
        let resp = self.send(&body).await?;

        let stream = resp
            .bytes_stream()
            .scan(String::new(), |buf, chunk| {
                let items: Vec<Result<StreamChunk>> = match chunk {
                    Ok(bytes) => {
                        buf.push_str(&String::from_utf8_lossy(&bytes));
                        http::drain_sse_data(buf)
                            .iter()
                            .filter_map(|data| Self::parse_stream_data(data))
                            .collect()
                    }
                    Err(e) => vec![Err(http::transport(VENDOR, &e))],
                };
                futures::future::ready(Some(items))
            })
            .flat_map(futures::stream::iter);

        Ok(Box::pin(stream))
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    model: Option<String>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamResponse {
    #[serde(default)]
    choices: Vec<StreamChoice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    delta: Delta,
}

#[derive(Debug, Deserialize)]
struct Delta {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

impl Usage {
    fn into_token_usage(self) -> TokenUsage {
        TokenUsage::new(self.prompt_tokens, self.completion_tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_override() {
        let p = OpenAiProvider::new("sk-test", Some("https://api.deepseek.com".into()), Duration::from_secs(5)).unwrap();
        assert_eq!(p.endpoint(), "https://api.deepseek.com/chat/completions");
        assert_eq!(p.info().name, "openai");

        let p = OpenAiProvider::new("sk-test", None, Duration::from_secs(5)).unwrap();
        assert_eq!(p.endpoint(), "https://api.openai.com/v1/chat/completions");
    }

    #[test]
    fn test_tool_messages_become_user_context() {
        let body = OpenAiProvider::build_body(
            &[Message::system("sys"), Message::tool("[Tool 'x' returned]\nok", None)],
            &GenerationOptions::default(),
            false,
        );
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["model"], "deepseek-chat");
        assert!(body.get("stop").is_none());
    }

    #[test]
    fn test_convert_completion() {
        let raw = r#"{"model":"deepseek-chat","choices":[{"message":{"role":"assistant","content":"你好"},"finish_reason":"stop"}],"usage":{"prompt_tokens":10,"completion_tokens":2,"total_tokens":12}}"#;
        let parsed: ChatResponse = serde_json::from_str(raw).unwrap();
        let completion = OpenAiProvider::convert_completion(parsed, "fallback").unwrap();

        assert_eq!(completion.content, "你好");
        assert_eq!(completion.model, "deepseek-chat");
        assert_eq!(completion.finish_reason, Some(FinishReason::Stop));
        assert_eq!(completion.usage.unwrap().total_tokens, 12);
    }

    #[test]
    fn test_parse_stream_data() {
        let chunk = OpenAiProvider::parse_stream_data(r#"{"choices":[{"delta":{"content":"Hel"}}]}"#)
            .unwrap()
            .unwrap();
        assert_eq!(chunk.delta, "Hel");
        assert!(!chunk.done);

        assert!(OpenAiProvider::parse_stream_data(r#"{"choices":[{"delta":{"role":"assistant"}}]}"#).is_none());
        assert!(OpenAiProvider::parse_stream_data("[DONE]").unwrap().unwrap().done);
        assert!(OpenAiProvider::parse_stream_data("{not json").unwrap().is_err());
    }
}
