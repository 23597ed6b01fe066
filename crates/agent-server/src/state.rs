//! Application State

use std::sync::Arc;

use agent_registry::AgentLoader;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Registry, resolver and factory behind one entry point
    pub loader: Arc<AgentLoader>,
}
