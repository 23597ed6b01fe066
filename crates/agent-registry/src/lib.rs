//! # agent-registry
//!
//! Turns declarative agent definitions into runnable agents.
//!
//! ```text
//!  Selection ──► DefinitionRegistry ──► ProviderResolver ──► AgentFactory ──► Agent
//!  (ordinal|id)   (basic, advanced,     (MODEL_PROVIDER,       (AgentRuntime)
//!                  custom, ...)          credential remap)
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! let store = Arc::new(CredentialStore::from_process());
//! let loader = AgentLoader::with_builtins(
//!     store,
//!     Arc::new(DefaultRuntime::default()),
//!     LoaderConfig::default(),
//! )?;
//!
//! let (agent, info) = loader.create(&Selection::parse("1"))?;
//! let reply = agent.ask("北京天气怎么样？").await?;
//! ```

pub mod definition;
pub mod definitions;
pub mod environment;
pub mod error;
pub mod factory;
pub mod loader;
pub mod resolver;

pub use definition::{AgentConfig, AgentDefinition, AgentInfo, DefinitionRegistry, RegistryBuilder};
pub use environment::{CredentialStore, Environment};
pub use error::{BuildError, LoadError, RegistryError, ResolveError, SelectionError};
pub use factory::AgentFactory;
pub use loader::{AgentLoader, LoaderConfig, Selection};
pub use resolver::{ModelProviderConfig, ProviderResolver, ResolvedProvider, ResolverConfig};
