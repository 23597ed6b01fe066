//! Agent definitions and the registry that enumerates them.

use std::collections::HashSet;
use std::sync::{Arc, OnceLock};

use agent_core::SkillSet;
use serde::{Deserialize, Serialize};

use crate::definitions;
use crate::error::{RegistryError, SelectionError};

/// Identity and display metadata of an agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentInfo {
    /// Stable, globally unique
    pub id: String,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub version: String,
    pub author: String,
}

/// Behaviour of an agent: its tools and system prompt
#[derive(Debug, Clone)]
pub struct AgentConfig {
    tools: Arc<SkillSet>,
    system_prompt: String,
}

impl AgentConfig {
    pub fn new(tools: SkillSet, system_prompt: impl Into<String>) -> Self {
        Self {
            tools: Arc::new(tools),
            system_prompt: system_prompt.into(),
        }
    }

    pub fn tools(&self) -> &Arc<SkillSet> {
        &self.tools
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }
}

/// Unit of discovery: `(AgentInfo, AgentConfig)`
#[derive(Debug, Clone)]
pub struct AgentDefinition {
    info: AgentInfo,
    config: AgentConfig,
}

impl AgentDefinition {
    pub fn new(info: AgentInfo, config: AgentConfig) -> Self {
        Self { info, config }
    }

    pub fn id(&self) -> &str {
        &self.info.id
    }

    pub fn info(&self) -> &AgentInfo {
        &self.info
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    fn check(&self) -> Result<(), RegistryError> {
        let reason = if self.info.id.trim().is_empty() {
            Some("id is empty")
        } else {
            config_problem(&self.config.tools, &self.config.system_prompt)
        };

        match reason {
            None => Ok(()),
            Some(reason) => Err(RegistryError::InvalidDefinition {
                id: self.info.id.clone(),
                reason: reason.into(),
            }),
        }
    }
}

/// Why `(tools, system_prompt)` cannot back an agent, if anything
pub(crate) fn config_problem(tools: &SkillSet, system_prompt: &str) -> Option<&'static str> {
    if tools.is_empty() {
        Some("tool list is empty")
    } else if system_prompt.trim().is_empty() {
        Some("system prompt is empty")
    } else {
        None
    }
}

/// Builds one definition. Run exactly once, when the registry is built.
pub type DefinitionFn = fn() -> agent_core::Result<AgentDefinition>;

type Constructor = Box<dyn Fn() -> agent_core::Result<AgentDefinition> + Send + Sync>;

/// Collects `(id, constructor)` entries ahead of [`RegistryBuilder::build`]
#[derive(Default)]
pub struct RegistryBuilder {
    entries: Vec<(String, Constructor)>,
}

impl RegistryBuilder {
    pub fn register<F>(mut self, id: impl Into<String>, constructor: F) -> Self
    where
        F: Fn() -> agent_core::Result<AgentDefinition> + Send + Sync + 'static,
    {
        self.entries.push((id.into(), Box::new(constructor)));
        self
    }

    /// Register every entry of the compiled-in table
    pub fn with_builtins(self) -> Self {
        definitions::BUILTIN
            .iter()
            .fold(self, |builder, &(id, constructor)| builder.register(id, constructor))
    }

    /// Run every constructor in registration order and freeze the result
    pub fn build(self) -> Result<DefinitionRegistry, RegistryError> {
        let mut seen = HashSet::new();
        let mut built = Vec::with_capacity(self.entries.len());

        for (id, constructor) in self.entries {
            if !seen.insert(id.clone()) {
                return Err(RegistryError::DuplicateId(id));
            }

            let definition = constructor().map_err(|e| RegistryError::Definition {
                id: id.clone(),
                reason: e.to_string(),
            })?;

            if definition.id() != id {
                return Err(RegistryError::IdMismatch {
                    registered: id,
                    actual: definition.info.id,
                });
            }
            definition.check()?;

            tracing::debug!(agent = %id, tools = definition.config.tools.len(), "registered agent definition");
            built.push(definition);
        }

        Ok(DefinitionRegistry { definitions: built })
    }
}

/// Immutable, ordered catalog of agent definitions.
///
/// Ordinals are 1-based and follow registration order.
#[derive(Debug, Clone)]
pub struct DefinitionRegistry {
    definitions: Vec<AgentDefinition>,
}

impl DefinitionRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Fresh registry holding the built-in definitions
    pub fn with_builtins() -> Result<Self, RegistryError> {
        Self::builder().with_builtins().build()
    }

    /// Shared built-in catalog, built on first use
    pub fn builtin() -> Result<Arc<Self>, RegistryError> {
        static BUILTIN: OnceLock<Result<Arc<DefinitionRegistry>, RegistryError>> = OnceLock::new();
        BUILTIN
            .get_or_init(|| Self::with_builtins().map(Arc::new))
            .clone()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    pub fn definitions(&self) -> &[AgentDefinition] {
        &self.definitions
    }

    /// Every definition's info, in order
    pub fn load_all(&self) -> Vec<AgentInfo> {
        self.definitions.iter().map(|d| d.info.clone()).collect()
    }

    /// `(ordinal, info)` pairs for menus
    pub fn catalog(&self) -> Vec<(usize, &AgentInfo)> {
        self.definitions
            .iter()
            .enumerate()
            .map(|(i, d)| (i + 1, &d.info))
            .collect()
    }

    pub fn get_by_ordinal(&self, ordinal: usize) -> Result<&AgentDefinition, SelectionError> {
        ordinal
            .checked_sub(1)
            .and_then(|i| self.definitions.get(i))
            .ok_or(SelectionError::OutOfRange {
                ordinal,
                count: self.definitions.len(),
            })
    }

    pub fn get_by_id(&self, id: &str) -> Result<&AgentDefinition, SelectionError> {
        self.definitions
            .iter()
            .find(|d| d.info.id == id)
            .ok_or_else(|| SelectionError::NotFound(id.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_core::AgentError;

    fn info(id: &str) -> AgentInfo {
        AgentInfo {
            id: id.into(),
            name: format!("{id} agent"),
            description: "test".into(),
            icon: "🧪".into(),
            version: "0.0.1".into(),
            author: "Test".into(),
        }
    }

    fn probe() -> agent_core::Result<AgentDefinition> {
        let tools = agent_skills::basic_skills()?.take("probe", 1);
        Ok(AgentDefinition::new(info("probe"), AgentConfig::new(tools, "prompt")))
    }

    #[test]
    fn test_builtin_order_and_lookup() {
        let registry = DefinitionRegistry::builtin().unwrap();
        let ids: Vec<_> = registry.load_all().into_iter().map(|i| i.id).collect();
        assert_eq!(ids, vec!["basic", "advanced", "custom"]);

        assert_eq!(registry.get_by_ordinal(1).unwrap().id(), "basic");
        assert_eq!(registry.get_by_ordinal(3).unwrap().id(), "custom");
        assert_eq!(registry.get_by_id("advanced").unwrap().config().tools().len(), 7);
        assert_eq!(registry.catalog()[1].0, 2);
    }

    #[test]
    fn test_builtin_is_shared() {
        let a = DefinitionRegistry::builtin().unwrap();
        let b = DefinitionRegistry::builtin().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.load_all(), b.load_all());
    }

    #[test]
    fn test_ordinal_bounds() {
        let registry = DefinitionRegistry::with_builtins().unwrap();
        let count = registry.len();

        assert_eq!(
            registry.get_by_ordinal(0).unwrap_err(),
            SelectionError::OutOfRange { ordinal: 0, count }
        );
        assert_eq!(
            registry.get_by_ordinal(count + 1).unwrap_err(),
            SelectionError::OutOfRange { ordinal: count + 1, count }
        );
        assert_eq!(
            registry.get_by_id("nonexistent").unwrap_err(),
            SelectionError::NotFound("nonexistent".into())
        );
    }

    #[test]
    fn test_extra_registration_appends() {
        let registry = DefinitionRegistry::builder()
            .with_builtins()
            .register("probe", probe)
            .build()
            .unwrap();
        assert_eq!(registry.len(), 4);
        assert_eq!(registry.get_by_ordinal(4).unwrap().id(), "probe");
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let err = DefinitionRegistry::builder()
            .register("probe", probe)
            .register("probe", probe)
            .build()
            .unwrap_err();
        assert_eq!(err, RegistryError::DuplicateId("probe".into()));
    }

    #[test]
    fn test_id_mismatch_rejected() {
        let err = DefinitionRegistry::builder()
            .register("other", probe)
            .build()
            .unwrap_err();
        assert!(matches!(err, RegistryError::IdMismatch { .. }));
    }

    #[test]
    fn test_invalid_definitions_rejected() {
        let err = DefinitionRegistry::builder()
            .register("empty", || {
                Ok(AgentDefinition::new(info("empty"), AgentConfig::new(SkillSet::new("none"), "prompt")))
            })
            .build()
            .unwrap_err();
        assert!(matches!(err, RegistryError::InvalidDefinition { ref reason, .. } if reason == "tool list is empty"));

        let err = DefinitionRegistry::builder()
            .register("mute", || {
                let tools = agent_skills::basic_skills()?;
                Ok(AgentDefinition::new(info("mute"), AgentConfig::new(tools, "  ")))
            })
            .build()
            .unwrap_err();
        assert!(matches!(err, RegistryError::InvalidDefinition { .. }));
    }

    #[test]
    fn test_constructor_error_surfaces() {
        let err = DefinitionRegistry::builder()
            .register("broken", || Err(AgentError::DuplicateToolName("calculate".into())))
            .build()
            .unwrap_err();
        assert!(matches!(err, RegistryError::Definition { ref id, .. } if id == "broken"));
    }
}
