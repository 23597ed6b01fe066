//! Server configuration

use agent_registry::Environment;
use agent_runtime::RuntimeOptions;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub runtime: RuntimeOptions,
}

impl ServerConfig {
    /// `BIND_ADDR`, `AGENT_MAX_ITERATIONS`, `REQUEST_TIMEOUT_SECS`
    pub fn from_env(env: &Environment) -> Self {
        let mut runtime = RuntimeOptions::default();

        if let Some(n) = env.get("AGENT_MAX_ITERATIONS").and_then(|v| v.trim().parse().ok()) {
            runtime.agent.max_iterations = n;
        }
        if let Some(secs) = env.get("REQUEST_TIMEOUT_SECS").and_then(|v| v.trim().parse().ok()) {
            runtime.request_timeout_secs = secs;
        }

        Self {
            bind_addr: env.get("BIND_ADDR").unwrap_or(DEFAULT_BIND_ADDR).to_string(),
            runtime,
        }
    }
}
