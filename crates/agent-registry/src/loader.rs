//! Selection → registry → provider resolution → factory.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use agent_core::{Agent, SkillSet};
use agent_runtime::AgentRuntime;

use crate::definition::{AgentDefinition, AgentInfo, DefinitionRegistry};
use crate::environment::{CredentialStore, Environment, MODEL_PROVIDER};
use crate::error::{LoadError, RegistryError, SelectionError};
use crate::factory::AgentFactory;
use crate::resolver::{ProviderResolver, ResolverConfig};

/// Opt into rejecting unknown `MODEL_PROVIDER` values
pub const STRICT_PROVIDER_VAR: &str = "MODEL_PROVIDER_STRICT";

/// Comma-separated extra placeholder values
pub const PLACEHOLDERS_VAR: &str = "API_KEY_PLACEHOLDERS";

/// A caller's raw choice: a 1-based ordinal or a definition id
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Ordinal(usize),
    Id(String),
}

impl Selection {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        raw.parse::<usize>()
            .map_or_else(|_| Self::Id(raw.to_string()), Self::Ordinal)
    }
}

impl FromStr for Selection {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ordinal(n) => write!(f, "#{n}"),
            Self::Id(id) => f.write_str(id),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct LoaderConfig {
    pub resolver: ResolverConfig,
}

impl LoaderConfig {
    /// Resolver switches from the environment. `MODEL_PROVIDER` itself is
    /// read on every load, not here.
    pub fn from_env(env: &Environment) -> Self {
        let mut resolver = ResolverConfig::default();

        if let Some(strict) = env.get(STRICT_PROVIDER_VAR) {
            resolver.strict_unknown_provider = matches!(strict.trim(), "1" | "true" | "yes");
        }
        if let Some(list) = env.get(PLACEHOLDERS_VAR) {
            resolver.placeholders = list
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(String::from)
                .collect();
        }

        Self { resolver }
    }
}

/// Goes from a selection straight to a runnable agent.
///
/// Every load is single-attempt: the first failing stage is returned.
pub struct AgentLoader {
    registry: Arc<DefinitionRegistry>,
    resolver: ProviderResolver,
    factory: AgentFactory,
    store: Arc<CredentialStore>,
}

impl AgentLoader {
    pub fn new(
        registry: Arc<DefinitionRegistry>,
        resolver: ProviderResolver,
        factory: AgentFactory,
        store: Arc<CredentialStore>,
    ) -> Self {
        Self {
            registry,
            resolver,
            factory,
            store,
        }
    }

    /// Loader over the shared built-in catalog
    pub fn with_builtins(
        store: Arc<CredentialStore>,
        runtime: Arc<dyn AgentRuntime>,
        config: LoaderConfig,
    ) -> Result<Self, RegistryError> {
        Ok(Self::new(
            DefinitionRegistry::builtin()?,
            ProviderResolver::new(config.resolver),
            AgentFactory::new(runtime),
            store,
        ))
    }

    pub fn registry(&self) -> &DefinitionRegistry {
        &self.registry
    }

    pub fn resolver(&self) -> &ProviderResolver {
        &self.resolver
    }

    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    pub fn load_all(&self) -> Vec<AgentInfo> {
        self.registry.load_all()
    }

    pub fn info_by_ordinal(&self, ordinal: usize) -> Result<&AgentInfo, SelectionError> {
        self.registry.get_by_ordinal(ordinal).map(AgentDefinition::info)
    }

    /// Provider key currently selected, before any fallback
    pub fn selected_provider(&self) -> String {
        self.selected_in(&self.store.lock())
    }

    pub fn create(&self, selection: &Selection) -> Result<(Agent, AgentInfo), LoadError> {
        match selection {
            Selection::Ordinal(n) => self.create_by_ordinal(*n),
            Selection::Id(id) => self.create_by_id(id),
        }
    }

    pub fn create_by_ordinal(&self, ordinal: usize) -> Result<(Agent, AgentInfo), LoadError> {
        let definition = self.registry.get_by_ordinal(ordinal)?;
        self.instantiate(definition)
    }

    pub fn create_by_id(&self, id: &str) -> Result<(Agent, AgentInfo), LoadError> {
        let definition = self.registry.get_by_id(id)?;
        self.instantiate(definition)
    }

    /// Build an agent from tools and a prompt that are not registered
    pub fn create_with(&self, tools: Arc<SkillSet>, system_prompt: &str) -> Result<Agent, LoadError> {
        let mut env = self.store.lock();
        let key = self.selected_in(&env);
        let resolved = self.resolver.resolve(&key, &mut env)?;
        Ok(self.factory.build_ad_hoc(&resolved, tools, system_prompt)?)
    }

    // The store stays locked from reading the selection until the agent
    // exists, so concurrent loads never interleave their remaps.
    fn instantiate(&self, definition: &AgentDefinition) -> Result<(Agent, AgentInfo), LoadError> {
        let mut env = self.store.lock();
        let key = self.selected_in(&env);
        let resolved = self.resolver.resolve(&key, &mut env)?;
        let agent = self.factory.build(&resolved, definition.info(), definition.config())?;
        drop(env);

        Ok((agent, definition.info().clone()))
    }

    fn selected_in(&self, env: &Environment) -> String {
        env.get(MODEL_PROVIDER)
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map_or_else(|| self.resolver.config().default_provider.clone(), String::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_parse() {
        assert_eq!(Selection::parse("2"), Selection::Ordinal(2));
        assert_eq!(Selection::parse(" 0 "), Selection::Ordinal(0));
        assert_eq!(Selection::parse("advanced"), Selection::Id("advanced".into()));
        assert_eq!(Selection::parse("-1"), Selection::Id("-1".into()));
        assert_eq!("custom".parse::<Selection>().unwrap().to_string(), "custom");
    }

    #[test]
    fn test_loader_config_from_env() {
        let env = Environment::from_vars([
            (STRICT_PROVIDER_VAR, "true"),
            (PLACEHOLDERS_VAR, "changeme, xxx,,"),
        ]);
        let config = LoaderConfig::from_env(&env);
        assert!(config.resolver.strict_unknown_provider);
        assert_eq!(config.resolver.placeholders, vec!["changeme", "xxx"]);
        assert_eq!(config.resolver.default_provider, "deepseek");

        assert!(!LoaderConfig::from_env(&Environment::new()).resolver.strict_unknown_provider);
    }
}
