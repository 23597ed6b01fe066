//! Error types for the registry, resolver, factory and loader.
//!
//! Every failure has its own kind so the caller can tell a bad selection
//! from a missing credential from a runtime that refused its configuration.

use agent_core::AgentError;
use thiserror::Error;

/// A selection did not name a registered definition
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("ordinal {ordinal} is out of range (1..={count})")]
    OutOfRange { ordinal: usize, count: usize },

    #[error("no agent definition with id '{0}'")]
    NotFound(String),
}

/// Provider resolution failed before any agent was built
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("provider '{provider}' needs {env_var} to be set to a real API key")]
    MissingCredential { provider: String, env_var: String },

    /// Only raised when strict provider matching is switched on
    #[error("unknown model provider '{0}'")]
    UnknownProvider(String),
}

/// The runtime rejected the construction request
#[derive(Debug, Error)]
#[error("failed to construct agent for model '{model}': {cause}")]
pub struct BuildError {
    pub model: String,
    #[source]
    pub cause: AgentError,
}

/// The definition table is inconsistent
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("agent id '{0}' is registered more than once")]
    DuplicateId(String),

    #[error("definition registered as '{registered}' reports id '{actual}'")]
    IdMismatch { registered: String, actual: String },

    #[error("definition '{id}' is invalid: {reason}")]
    InvalidDefinition { id: String, reason: String },

    #[error("definition '{id}' failed to build: {reason}")]
    Definition { id: String, reason: String },
}

/// Everything [`AgentLoader`](crate::AgentLoader) can fail with
#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    SelectionInvalid(#[from] SelectionError),

    #[error(transparent)]
    ProviderResolutionFailed(#[from] ResolveError),

    #[error(transparent)]
    AgentConstructionFailed(#[from] BuildError),
}

impl LoadError {
    /// Message suitable for showing to an end user
    pub fn user_message(&self) -> String {
        match self {
            Self::SelectionInvalid(SelectionError::OutOfRange { count, .. }) => {
                format!("Invalid choice. Please pick a number between 1 and {count}.")
            }
            Self::SelectionInvalid(SelectionError::NotFound(id)) => {
                format!("No agent named '{id}' exists.")
            }
            Self::ProviderResolutionFailed(ResolveError::MissingCredential { env_var, .. }) => {
                format!("The model provider is not configured. Set {env_var} in your environment or .env file.")
            }
            Self::ProviderResolutionFailed(ResolveError::UnknownProvider(key)) => {
                format!("Unknown model provider '{key}'. Check MODEL_PROVIDER.")
            }
            Self::AgentConstructionFailed(e) => format!("Could not start the agent: {}", e.cause.user_message()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversions_keep_kind() {
        let err: LoadError = SelectionError::NotFound("ghost".into()).into();
        assert!(matches!(err, LoadError::SelectionInvalid(SelectionError::NotFound(_))));

        let err: LoadError = ResolveError::MissingCredential {
            provider: "deepseek".into(),
            env_var: "DEEPSEEK_API_KEY".into(),
        }
        .into();
        assert!(err.user_message().contains("DEEPSEEK_API_KEY"));
    }

    #[test]
    fn test_build_error_exposes_cause() {
        use std::error::Error as _;

        let err = BuildError {
            model: "mistral:large".into(),
            cause: AgentError::Config("unsupported model vendor 'mistral'".into()),
        };
        assert!(err.to_string().contains("mistral:large"));
        assert!(err.source().is_some());
    }
}
