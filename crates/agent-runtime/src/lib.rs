//! # agent-runtime
//!
//! Turns a provider-qualified model identifier (`"<vendor>:<model>"`), a
//! skill set, a system prompt and explicit credentials into a runnable
//! [`Agent`].
//!
//! ## Backends
//!
//! - **openai**: OpenAI chat-completions, and every vendor speaking it via a
//!   base URL override (DeepSeek, DashScope, Zhipu)
//! - **anthropic**: Messages API
//! - **google**: Gemini `generateContent`
//! - **ollama** (feature, on by default): local inference
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agent_runtime::{AgentRuntime, ConstructRequest, Credentials, DefaultRuntime};
//!
//! let runtime = DefaultRuntime::default();
//! let agent = runtime.construct(ConstructRequest {
//!     model_identifier: "openai:deepseek-chat",
//!     tools: Arc::new(skills),
//!     system_prompt: "You are helpful.",
//!     credentials: &Credentials::new("sk-...", Some("https://api.deepseek.com".into())),
//! })?;
//! ```

pub mod anthropic;
pub mod google;
mod http;
pub mod openai;

#[cfg(feature = "ollama")]
pub mod ollama;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use agent_core::{Agent, AgentError, AgentOptions, LlmProvider, Result, SkillSet};
use serde::{Deserialize, Serialize};

pub use anthropic::AnthropicProvider;
pub use google::GeminiProvider;
pub use openai::OpenAiProvider;

#[cfg(feature = "ollama")]
pub use ollama::OllamaProvider;

/// Per-construction credentials. The runtime never reads the environment.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
}

impl Credentials {
    pub fn new(api_key: impl Into<String>, base_url: Option<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            base_url,
        }
    }

    /// No key, default endpoint (local backends)
    pub fn none() -> Self {
        Self::default()
    }

    fn require_key(&self, vendor: &str) -> Result<&str> {
        self.api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| AgentError::Config(format!("no API key supplied for vendor '{vendor}'")))
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// `vendor:model` split at the first colon
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModelId<'a> {
    pub vendor: &'a str,
    pub model: &'a str,
}

impl<'a> ModelId<'a> {
    pub fn parse(identifier: &'a str) -> Result<Self> {
        let (vendor, model) = identifier.split_once(':').ok_or_else(|| {
            AgentError::Config(format!("model identifier '{identifier}' has no vendor prefix"))
        })?;

        if vendor.is_empty() || model.is_empty() {
            return Err(AgentError::Config(format!(
                "model identifier '{identifier}' must be '<vendor>:<model>'"
            )));
        }

        Ok(Self { vendor, model })
    }
}

/// Everything the runtime gets to build one agent
pub struct ConstructRequest<'a> {
    pub model_identifier: &'a str,
    pub tools: Arc<SkillSet>,
    pub system_prompt: &'a str,
    pub credentials: &'a Credentials,
}

/// The agent runtime capability.
///
/// Construction is synchronous and performs no network I/O beyond
/// building an HTTP client.
pub trait AgentRuntime: Send + Sync {
    fn construct(&self, request: ConstructRequest<'_>) -> Result<Agent>;
}

/// Runtime knobs applied to every constructed agent
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RuntimeOptions {
    #[serde(default)]
    pub agent: AgentOptions,

    /// Per-request HTTP timeout
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_timeout_secs() -> u64 { 120 }

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            agent: AgentOptions::default(),
            request_timeout_secs: default_timeout_secs(),
        }
    }
}

/// Dispatches on the vendor prefix to one of the bundled backends
#[derive(Clone, Debug, Default)]
pub struct DefaultRuntime {
    options: RuntimeOptions,
}

impl DefaultRuntime {
    pub fn new(options: RuntimeOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &RuntimeOptions {
        &self.options
    }

    fn provider(&self, id: &ModelId<'_>, credentials: &Credentials) -> Result<Arc<dyn LlmProvider>> {
        let timeout = Duration::from_secs(self.options.request_timeout_secs);
        let base_url = credentials.base_url.clone();

        let provider: Arc<dyn LlmProvider> = match id.vendor {
            "openai" => Arc::new(OpenAiProvider::new(credentials.require_key(id.vendor)?, base_url, timeout)?),
            "anthropic" => Arc::new(AnthropicProvider::new(credentials.require_key(id.vendor)?, base_url, timeout)?),
            "google" => Arc::new(GeminiProvider::new(credentials.require_key(id.vendor)?, base_url, timeout)?),
            #[cfg(feature = "ollama")]
            "ollama" => Arc::new(OllamaProvider::from_config(ollama::OllamaConfig::from_base_url(
                base_url.as_deref(),
            ))),
            other => {
                return Err(AgentError::Config(format!("unsupported model vendor '{other}'")));
            }
        };
        Ok(provider)
    }
}

impl AgentRuntime for DefaultRuntime {
    fn construct(&self, request: ConstructRequest<'_>) -> Result<Agent> {
        let id = ModelId::parse(request.model_identifier)?;
        let provider = self.provider(&id, request.credentials)?;

        tracing::debug!(
            vendor = id.vendor,
            model = id.model,
            base_url = ?request.credentials.base_url,
            "constructing agent backend"
        );

        Agent::builder()
            .provider(provider)
            .tools(request.tools)
            .system_prompt(request.system_prompt)
            .options(self.options.agent.clone())
            .model(id.model)
            .build()
    }
}
