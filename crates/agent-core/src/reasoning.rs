//! Reasoning Loop
//!
//! Implements the ReAct (Reason + Act) pattern for agent behavior.
//! The agent observes, thinks, acts (via tools), and responds.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{AgentError, Result};
use crate::message::{Conversation, Message};
use crate::provider::{CompletionStream, GenerationOptions, LlmProvider};
use crate::tool::{SkillSet, ToolCall, ToolResult};

/// Runtime knobs for an agent (everything except tools and prompt)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AgentOptions {
    /// Maximum reasoning iterations before giving up
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    #[serde(default)]
    pub generation: GenerationOptions,

    /// Whether to append tool descriptions to system prompt
    #[serde(default = "default_inject")]
    pub inject_tool_descriptions: bool,
}

fn default_max_iterations() -> usize { 10 }
fn default_inject() -> bool { true }

impl Default for AgentOptions {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            generation: GenerationOptions::default(),
            inject_tool_descriptions: default_inject(),
        }
    }
}

const TOOL_PROTOCOL: &str = r#"When you need to use a tool, respond with a JSON block in this exact format:
```tool
{"tool": "tool_name", "arguments": {"arg1": "value1"}}
```

After receiving tool results, synthesize them into a helpful response.
If you can answer directly without tools, do so."#;

/// A runnable agent bound to one provider, one skill set and one prompt.
///
/// None of these can change after construction.
pub struct Agent {
    provider: Arc<dyn LlmProvider>,
    tools: Arc<SkillSet>,
    system_prompt: String,
    options: AgentOptions,
}

impl fmt::Debug for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Agent")
            .field("tools", &self.tools)
            .field("system_prompt", &self.system_prompt)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Agent {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        tools: Arc<SkillSet>,
        system_prompt: impl Into<String>,
        options: AgentOptions,
    ) -> Self {
        Self {
            provider,
            tools,
            system_prompt: system_prompt.into(),
            options,
        }
    }

    pub fn builder() -> AgentBuilder {
        AgentBuilder::new()
    }

    /// Build the full system prompt including tool descriptions
    fn build_system_prompt(&self) -> String {
        let mut prompt = self.system_prompt.clone();

        if self.options.inject_tool_descriptions && !self.tools.is_empty() {
            prompt.push_str("\n\n");
            prompt.push_str(TOOL_PROTOCOL);
            prompt.push_str("\n\n");
            prompt.push_str(&self.tools.generate_prompt_section());
        }

        prompt
    }

    /// Run the agent over the caller's conversation.
    ///
    /// Assistant turns and tool results are appended to `conversation`; the
    /// final assistant text is returned.
    pub async fn invoke(&self, conversation: &mut Conversation) -> Result<String> {
        conversation.ensure_system_prompt(self.build_system_prompt());

        let mut iterations = 0;

        loop {
            iterations += 1;

            if iterations > self.options.max_iterations {
                return Err(AgentError::MaxIterations(self.options.max_iterations));
            }

            let completion = self
                .provider
                .complete(conversation.messages(), &self.options.generation)
                .await?;

            let content = completion.content;
            conversation.push(Message::assistant(&content));

            if let Some(tool_call) = Self::parse_tool_call(&content) {
                tracing::debug!(tool = %tool_call.name, iteration = iterations, "Executing tool");

                let result = self.execute_tool(&tool_call).await;
                conversation.push(Message::tool(
                    Self::format_tool_result(&result),
                    tool_call.id.clone(),
                ));

                continue;
            }

            return Ok(content);
        }
    }

    /// Stream a single model turn over the conversation.
    ///
    /// Tool blocks in the streamed text are not executed; use
    /// [`invoke`](Self::invoke) for the full reasoning loop.
    pub async fn stream(&self, conversation: &Conversation) -> Result<CompletionStream> {
        let mut conversation = conversation.clone();
        conversation.ensure_system_prompt(self.build_system_prompt());

        self.provider
            .complete_stream(conversation.messages(), &self.options.generation)
            .await
    }

    /// Run with a simple string input (creates temporary conversation)
    pub async fn ask(&self, question: &str) -> Result<String> {
        let mut conversation = Conversation::with_system_prompt(self.build_system_prompt());
        conversation.push(Message::user(question));
        self.invoke(&mut conversation).await
    }

    /// Parse a tool call from LLM response
    fn parse_tool_call(content: &str) -> Option<ToolCall> {
        let tool_start = "```tool";
        let tool_end = "```";

        if let Some(start_idx) = content.find(tool_start) {
            let after_marker = &content[start_idx + tool_start.len()..];
            if let Some(end_idx) = after_marker.find(tool_end) {
                let json_str = after_marker[..end_idx].trim();

                if let Ok(mut call) = serde_json::from_str::<ToolCall>(json_str) {
                    if call.id.is_none() {
                        call.id = Some(uuid::Uuid::new_v4().to_string());
                    }
                    return Some(call);
                }
            }
        }

        Self::parse_inline_tool_call(content)
    }

    /// Try to parse inline JSON tool call
    fn parse_inline_tool_call(content: &str) -> Option<ToolCall> {
        if !content.contains(r#""tool""#) {
            return None;
        }

        let start = content.find('{')?;
        let end = content.rfind('}')?;

        if end <= start {
            return None;
        }

        serde_json::from_str::<ToolCall>(&content[start..=end]).ok()
    }

    async fn execute_tool(&self, call: &ToolCall) -> ToolResult {
        match self.tools.execute(call).await {
            Ok(mut result) => {
                result.id.clone_from(&call.id);
                result
            }
            Err(e) => ToolResult {
                name: call.name.clone(),
                id: call.id.clone(),
                success: false,
                output: format!("Error: {e}"),
                data: None,
            },
        }
    }

    fn format_tool_result(result: &ToolResult) -> String {
        if result.success {
            format!("[Tool '{}' returned]\n{}", result.name, result.output)
        } else {
            format!("[Tool '{}' failed]\n{}", result.name, result.output)
        }
    }

    pub fn tools(&self) -> &SkillSet {
        &self.tools
    }

    /// The definition's prompt, without injected tool descriptions
    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Vendor-local model name
    pub fn model(&self) -> &str {
        &self.options.generation.model
    }

    /// Provider-qualified model identifier, e.g. `openai:deepseek-chat`
    pub fn model_identifier(&self) -> String {
        format!("{}:{}", self.provider.info().name, self.model())
    }

    pub fn options(&self) -> &AgentOptions {
        &self.options
    }
}

/// Builder for Agent configuration
pub struct AgentBuilder {
    provider: Option<Arc<dyn LlmProvider>>,
    tools: Arc<SkillSet>,
    system_prompt: String,
    options: AgentOptions,
}

impl Default for AgentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentBuilder {
    pub fn new() -> Self {
        Self {
            provider: None,
            tools: Arc::new(SkillSet::default()),
            system_prompt: String::new(),
            options: AgentOptions::default(),
        }
    }

    pub fn provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn tools(mut self, tools: Arc<SkillSet>) -> Self {
        self.tools = tools;
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn options(mut self, options: AgentOptions) -> Self {
        self.options = options;
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.options.generation.model = model.into();
        self
    }

    pub fn temperature(mut self, temp: f32) -> Self {
        self.options.generation.temperature = temp;
        self
    }

    pub fn max_iterations(mut self, max: usize) -> Self {
        self.options.max_iterations = max;
        self
    }

    pub fn build(self) -> Result<Agent> {
        let provider = self
            .provider
            .ok_or_else(|| AgentError::Config("Provider is required".into()))?;

        if self.options.generation.model.trim().is_empty() {
            return Err(AgentError::Config("Model name is required".into()));
        }

        Ok(Agent::new(provider, self.tools, self.system_prompt, self.options))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Role;
    use crate::provider::{Completion, FinishReason, ProviderInfo};
    use crate::tool::tests::FixedTool;
    use async_trait::async_trait;
    use futures::StreamExt;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Provider that replays scripted replies and records what it saw
    struct MockProvider {
        replies: Mutex<VecDeque<String>>,
        seen: Mutex<Vec<Vec<Message>>>,
    }

    impl MockProvider {
        fn new(replies: &[&str]) -> Self {
            Self {
                replies: Mutex::new(replies.iter().map(|r| (*r).to_string()).collect()),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LlmProvider for MockProvider {
        fn info(&self) -> ProviderInfo {
            ProviderInfo {
                name: "mock".into(),
                base_url: "memory://mock".into(),
                supports_streaming: false,
            }
        }

        async fn complete(
            &self,
            messages: &[Message],
            options: &GenerationOptions,
        ) -> Result<Completion> {
            self.seen.lock().unwrap().push(messages.to_vec());
            let content = self
                .replies
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| AgentError::Provider("script exhausted".into()))?;
            Ok(Completion {
                content,
                model: options.model.clone(),
                usage: None,
                finish_reason: Some(FinishReason::Stop),
            })
        }
    }

    fn agent(provider: Arc<MockProvider>) -> Agent {
        let tools = SkillSet::new("test")
            .with(FixedTool { name: "get_weather", reply: "多云，温度 15°C" })
            .unwrap();
        Agent::builder()
            .provider(provider)
            .tools(Arc::new(tools))
            .system_prompt("You are a weather assistant.")
            .model("deepseek-chat")
            .max_iterations(3)
            .build()
            .unwrap()
    }

    #[test]
    fn test_parse_tool_call() {
        let content = r#"Let me check that for you.
```tool
{"tool": "calculate", "arguments": {"expression": "2 + 2"}}
```"#;

        let call = Agent::parse_tool_call(content).unwrap();
        assert_eq!(call.name, "calculate");
        assert!(call.id.is_some());
    }

    #[test]
    fn test_parse_inline_tool_call() {
        let call = Agent::parse_tool_call(r#"{"tool": "get_weather", "arguments": {"city": "北京"}}"#).unwrap();
        assert_eq!(call.str_arg("city"), Some("北京"));

        assert!(Agent::parse_tool_call("No tools needed.").is_none());
    }

    #[test]
    fn test_builder_requires_provider() {
        assert!(matches!(AgentBuilder::new().build(), Err(AgentError::Config(_))));
    }

    #[tokio::test]
    async fn test_invoke_runs_tool_then_answers() {
        let provider = Arc::new(MockProvider::new(&[
            "```tool\n{\"tool\": \"get_weather\", \"arguments\": {\"input\": \"北京\"}}\n```",
            "北京今天多云。",
        ]));
        let agent = agent(Arc::clone(&provider));

        let mut conversation = Conversation::from_messages(vec![Message::user("北京的天气怎么样？")]);
        let answer = agent.invoke(&mut conversation).await.unwrap();

        assert_eq!(answer, "北京今天多云。");
        // system, user, assistant(tool), tool, assistant
        assert_eq!(conversation.len(), 5);
        assert_eq!(conversation.messages()[3].role, Role::Tool);
        assert!(conversation.messages()[3].content.contains("15°C"));

        let seen = provider.seen.lock().unwrap();
        assert!(seen[0][0].content.starts_with("You are a weather assistant."));
        assert!(seen[0][0].content.contains("### get_weather"));
    }

    #[tokio::test]
    async fn test_invoke_stops_at_max_iterations() {
        let looping = "```tool\n{\"tool\": \"get_weather\", \"arguments\": {\"input\": \"x\"}}\n```";
        let provider = Arc::new(MockProvider::new(&[looping, looping, looping, looping]));
        let agent = agent(provider);

        let err = agent.ask("loop forever").await.unwrap_err();
        assert!(matches!(err, AgentError::MaxIterations(3)));
    }

    #[tokio::test]
    async fn test_stream_leaves_history_untouched() {
        let provider = Arc::new(MockProvider::new(&["streamed"]));
        let agent = agent(provider);
        let conversation = Conversation::from_messages(vec![Message::user("hi")]);

        let chunks: Vec<_> = agent.stream(&conversation).await.unwrap().collect().await;

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].as_ref().unwrap().delta, "streamed");
        assert_eq!(conversation.len(), 1);
    }

    #[test]
    fn test_model_identifier_uses_provider_name() {
        let agent = agent(Arc::new(MockProvider::new(&[])));
        assert_eq!(agent.model_identifier(), "mock:deepseek-chat");
        assert_eq!(agent.system_prompt(), "You are a weather assistant.");
    }
}
