//! Builds runnable agents through the runtime capability.

use std::sync::Arc;

use agent_core::{Agent, AgentError, SkillSet};
use agent_runtime::{AgentRuntime, ConstructRequest, Credentials, DefaultRuntime};

use crate::definition::{AgentConfig, AgentInfo, config_problem};
use crate::error::BuildError;
use crate::resolver::{ModelProviderConfig, ResolvedProvider};

/// Hands `(model identifier, tools, prompt, credentials)` to the runtime.
///
/// Does no I/O of its own and never swallows a construction error.
#[derive(Clone)]
pub struct AgentFactory {
    runtime: Arc<dyn AgentRuntime>,
}

impl Default for AgentFactory {
    fn default() -> Self {
        Self::new(Arc::new(DefaultRuntime::default()))
    }
}

impl AgentFactory {
    pub fn new(runtime: Arc<dyn AgentRuntime>) -> Self {
        Self { runtime }
    }

    /// Build the agent described by a registered definition
    pub fn build(
        &self,
        provider: &ResolvedProvider,
        info: &AgentInfo,
        config: &AgentConfig,
    ) -> Result<Agent, BuildError> {
        tracing::info!(
            agent = %info.name,
            model = %provider.config.display_name,
            tools = config.tools().len(),
            version = %info.version,
            "creating agent"
        );
        self.construct(&provider.config, &provider.credentials, Arc::clone(config.tools()), config.system_prompt())
    }

    /// Build an agent with no registry entry behind it.
    ///
    /// Held to the same rules as a registered definition: at least one tool
    /// and a non-blank prompt.
    pub fn build_ad_hoc(
        &self,
        provider: &ResolvedProvider,
        tools: Arc<SkillSet>,
        system_prompt: &str,
    ) -> Result<Agent, BuildError> {
        if let Some(reason) = config_problem(&tools, system_prompt) {
            tracing::error!(model = %provider.config.model_identifier, reason, "ad-hoc agent rejected");
            return Err(BuildError {
                model: provider.config.model_identifier.clone(),
                cause: AgentError::Config(reason.into()),
            });
        }

        tracing::info!(
            model = %provider.config.display_name,
            tools = tools.len(),
            "creating ad-hoc agent"
        );
        self.construct(&provider.config, &provider.credentials, tools, system_prompt)
    }

    fn construct(
        &self,
        config: &ModelProviderConfig,
        credentials: &Credentials,
        tools: Arc<SkillSet>,
        system_prompt: &str,
    ) -> Result<Agent, BuildError> {
        self.runtime
            .construct(ConstructRequest {
                model_identifier: &config.model_identifier,
                tools,
                system_prompt,
                credentials,
            })
            .map_err(|cause| {
                tracing::error!(model = %config.model_identifier, error = %cause, "agent construction failed");
                BuildError {
                    model: config.model_identifier.clone(),
                    cause,
                }
            })
    }
}
