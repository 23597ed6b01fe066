//! Anthropic Messages API backend.

use std::time::Duration;

use agent_core::{
    error::{AgentError, Result},
    message::{Message, Role},
    provider::{Completion, FinishReason, GenerationOptions, LlmProvider, ProviderInfo, TokenUsage},
};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::http;

pub const ANTHROPIC_API_URL: &str = "https://api.anthropic.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";

const VENDOR: &str = "anthropic";

pub struct AnthropicProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl AnthropicProvider {
    pub fn new(api_key: impl Into<String>, base_url: Option<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: http::client(timeout)?,
            api_key: api_key.into(),
            base_url: base_url.unwrap_or_else(|| ANTHROPIC_API_URL.into()),
        })
    }

    /// System text goes in its own field; tool output is sent as user turns.
    fn build_body(messages: &[Message], options: &GenerationOptions) -> Value {
        let system: Vec<&str> = messages
            .iter()
            .filter(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
            .collect();

        let turns: Vec<Value> = messages
            .iter()
            .filter(|m| m.role != Role::System)
            .map(|m| {
                let role = if m.role == Role::Assistant { "assistant" } else { "user" };
                json!({ "role": role, "content": m.content })
            })
            .collect();

        let mut body = json!({
            "model": options.model,
            "messages": turns,
            "max_tokens": options.max_tokens,
            "temperature": options.temperature,
        });
        if !system.is_empty() {
            body["system"] = json!(system.join("\n\n"));
        }
        if !options.stop_sequences.is_empty() {
            body["stop_sequences"] = json!(options.stop_sequences);
        }
        body
    }

    fn convert_completion(response: MessagesResponse, model: &str) -> Completion {
        let content = response
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text)
            .collect::<Vec<_>>()
            .join("");

        Completion {
            content,
            model: response.model.unwrap_or_else(|| model.to_string()),
            usage: response
                .usage
                .map(|u| TokenUsage::new(u.input_tokens, u.output_tokens)),
            finish_reason: response.stop_reason.as_deref().map(FinishReason::from_vendor),
        }
    }
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    fn info(&self) -> ProviderInfo {
        ProviderInfo {
            name: VENDOR.into(),
            base_url: self.base_url.clone(),
            supports_streaming: false,
        }
    }

    async fn complete(
        &self,
        messages: &[Message],
        options: &GenerationOptions,
    ) -> Result<Completion> {
        let body = Self::build_body(messages, options);
        tracing::debug!(model = %options.model, "sending anthropic request");

        let resp = self
            .client
            .post(http::join(&self.base_url, "v1/messages"))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| http::transport(VENDOR, &e))?;

        let resp = http::check_status(VENDOR, resp).await?;
        let parsed: MessagesResponse = resp
            .json()
            .await
            .map_err(|e| AgentError::Parse(format!("anthropic response: {e}")))?;

        Ok(Self::convert_completion(parsed, &options.model))
    }
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    model: Option<String>,
    stop_reason: Option<String>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    input_tokens: u32,
    #[serde(default)]
    output_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_is_lifted_out_of_turns() {
        let body = AnthropicProvider::build_body(
            &[
                Message::system("Be brief."),
                Message::user("Hi"),
                Message::tool("[Tool 'calculate' returned]\n4", None),
            ],
            &GenerationOptions::default(),
        );

        assert_eq!(body["system"], "Be brief.");
        let turns = body["messages"].as_array().unwrap();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[1]["role"], "user");
    }

    #[test]
    fn test_convert_completion_joins_text_blocks() {
        let raw = r#"{"content":[{"type":"text","text":"Hello "},{"type":"text","text":"there"}],"model":"claude-sonnet-4-5","stop_reason":"end_turn","usage":{"input_tokens":5,"output_tokens":3}}"#;
        let parsed: MessagesResponse = serde_json::from_str(raw).unwrap();
        let completion = AnthropicProvider::convert_completion(parsed, "x");

        assert_eq!(completion.content, "Hello there");
        assert_eq!(completion.finish_reason, Some(FinishReason::Stop));
        assert_eq!(completion.usage.unwrap().total_tokens, 8);
    }
}
