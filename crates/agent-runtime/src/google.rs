//! Google Gemini backend (`generateContent`, API key auth).

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

pub const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com";

const VENDOR: &str = "google";

pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl GeminiProvider {
    pub fn new(api_key: impl Into<String>, base_url: Option<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: http::client(timeout)?,
            api_key: api_key.into(),
            base_url: base_url.unwrap_or_else(|| GEMINI_API_URL.into()),
        })
    }

    fn endpoint(&self, model: &str) -> String {
        http::join(&self.base_url, &format!("v1beta/models/{model}:generateContent"))
    }

    fn convert_messages(messages: &[Message]) -> Vec<Value> {
        messages
            .iter()
            .filter(|m| m.role != Role::System)
            .map(|m| {
                let role = match m.role {
                    Role::Assistant => "model",
                    _ => "user",
                };
                json!({ "role": role, "parts": [{ "text": m.content }] })
            })
            .collect()
    }

    fn system_instruction(messages: &[Message]) -> Option<String> {
        messages
            .iter()
            .find(|m| m.role == Role::System)
            .map(|m| m.content.clone())
    }

    fn build_body(messages: &[Message], options: &GenerationOptions) -> Value {
        let mut body = json!({
            "contents": Self::convert_messages(messages),
            "generationConfig": {
                "temperature": options.temperature,
                "topP": options.top_p,
                "maxOutputTokens": options.max_tokens,
            }
        });

        if let Some(system) = Self::system_instruction(messages) {
            body["systemInstruction"] = json!({ "parts": [{ "text": system }] });
        }
        if !options.stop_sequences.is_empty() {
            body["generationConfig"]["stopSequences"] = json!(options.stop_sequences);
        }
        body
    }

    fn parse_response(response: GeminiResponse, model: &str) -> Result<Completion> {
        let candidate = response
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| AgentError::Parse("No candidates in response".into()))?;

        let content = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect::<String>())
            .unwrap_or_default();

        Ok(Completion {
            content,
            model: model.to_string(),
            usage: response.usage_metadata.map(|u| {
                TokenUsage::new(
                    u.prompt_token_count.unwrap_or(0),
                    u.candidates_token_count.unwrap_or(0),
                )
            }),
            finish_reason: candidate.finish_reason.as_deref().map(FinishReason::from_vendor),
        })
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
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
        tracing::debug!(model = %options.model, "sending gemini request");

        let resp = self
            .client
            .post(self.endpoint(&options.model))
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| http::transport(VENDOR, &e))?;

        let resp = http::check_status(VENDOR, resp).await?;
        let parsed: GeminiResponse = resp
            .json()
            .await
            .map_err(|e| AgentError::Parse(format!("gemini response: {e}")))?;

        Self::parse_response(parsed, &options.model)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    prompt_token_count: Option<u32>,
    candidates_token_count: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_carries_model() {
        let p = GeminiProvider::new("g-key", None, Duration::from_secs(5)).unwrap();
        assert_eq!(
            p.endpoint("gemini-2.0-flash-exp"),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash-exp:generateContent"
        );
    }

    #[test]
    fn test_body_uses_model_role_and_system_instruction() {
        let body = GeminiProvider::build_body(
            &[Message::system("sys"), Message::user("hi"), Message::assistant("hello")],
            &GenerationOptions::default(),
        );

        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "sys");
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][1]["role"], "model");
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 2048);
    }

    #[test]
    fn test_parse_response() {
        let raw = r#"{"candidates":[{"content":{"parts":[{"text":"晴"},{"text":"天"}],"role":"model"},"finishReason":"STOP"}],"usageMetadata":{"promptTokenCount":4,"candidatesTokenCount":2,"totalTokenCount":6}}"#;
        let parsed: GeminiResponse = serde_json::from_str(raw).unwrap();
        let completion = GeminiProvider::parse_response(parsed, "gemini-2.0-flash-exp").unwrap();

        assert_eq!(completion.content, "晴天");
        assert_eq!(completion.finish_reason, Some(FinishReason::Stop));
        assert_eq!(completion.usage.unwrap().total_tokens, 6);
    }

    #[test]
    fn test_empty_candidates_is_parse_error() {
        let parsed: GeminiResponse = serde_json::from_str(r#"{"candidates":[]}"#).unwrap();
        assert!(matches!(
            GeminiProvider::parse_response(parsed, "m"),
            Err(AgentError::Parse(_))
        ));
    }
}
