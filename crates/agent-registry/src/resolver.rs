//! Model-provider resolution.
//!
//! Maps a provider key to its [`ModelProviderConfig`], checks that a real
//! credential is present, and remaps OpenAI-compatible vendors onto the
//! generic OpenAI slots.

use agent_runtime::Credentials;
use serde::Serialize;

use crate::environment::Environment;
use crate::error::ResolveError;

/// Static description of one known provider
#[derive(Debug, Clone, Copy)]
pub struct ProviderSpec {
    pub key: &'static str,
    /// `<vendor>:<model>`, the vendor prefix selects the runtime backend
    pub model_identifier: &'static str,
    pub display_name: &'static str,
    /// `None` for keyless local providers
    pub credential_env_var: Option<&'static str>,
    /// Set when the vendor speaks the OpenAI protocol at another endpoint
    pub compatibility_base_url: Option<&'static str>,
}

pub static PROVIDERS: &[ProviderSpec] = &[
    ProviderSpec {
        key: "deepseek",
        model_identifier: "openai:deepseek-chat",
        display_name: "DeepSeek V3",
        credential_env_var: Some("DEEPSEEK_API_KEY"),
        compatibility_base_url: Some("https://api.deepseek.com"),
    },
    ProviderSpec {
        key: "anthropic",
        model_identifier: "anthropic:claude-sonnet-4-5",
        display_name: "Anthropic Claude Sonnet 4.5",
        credential_env_var: Some("ANTHROPIC_API_KEY"),
        compatibility_base_url: None,
    },
    ProviderSpec {
        key: "openai",
        model_identifier: "openai:gpt-4o",
        display_name: "OpenAI GPT-4o",
        credential_env_var: Some("OPENAI_API_KEY"),
        compatibility_base_url: None,
    },
    ProviderSpec {
        key: "google",
        model_identifier: "google:gemini-2.0-flash-exp",
        display_name: "Google Gemini 2.0 Flash",
        credential_env_var: Some("GOOGLE_API_KEY"),
        compatibility_base_url: None,
    },
    ProviderSpec {
        key: "dashscope",
        model_identifier: "openai:qwen-max",
        display_name: "Alibaba Qwen Max",
        credential_env_var: Some("DASHSCOPE_API_KEY"),
        compatibility_base_url: Some("https://dashscope.aliyuncs.com/compatible-mode/v1"),
    },
    ProviderSpec {
        key: "zhipuai",
        model_identifier: "openai:glm-4",
        display_name: "Zhipu GLM-4",
        credential_env_var: Some("ZHIPUAI_API_KEY"),
        compatibility_base_url: Some("https://open.bigmodel.cn/api/paas/v4"),
    },
    ProviderSpec {
        key: "ollama",
        model_identifier: "ollama:llama3.2",
        display_name: "Ollama Llama 3.2 (local)",
        credential_env_var: None,
        compatibility_base_url: None,
    },
];

/// The provider an agent will be bound to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelProviderConfig {
    pub provider_key: String,
    pub model_identifier: String,
    pub display_name: String,
    pub credential_env_var: Option<String>,
    pub compatibility_base_url: Option<String>,
}

impl From<&ProviderSpec> for ModelProviderConfig {
    fn from(spec: &ProviderSpec) -> Self {
        Self {
            provider_key: spec.key.into(),
            model_identifier: spec.model_identifier.into(),
            display_name: spec.display_name.into(),
            credential_env_var: spec.credential_env_var.map(Into::into),
            compatibility_base_url: spec.compatibility_base_url.map(Into::into),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Used when no provider is selected, and for unknown keys
    pub default_provider: String,

    /// Extra values treated as "not configured"
    pub placeholders: Vec<String>,

    /// Reject unknown provider keys instead of using the default
    pub strict_unknown_provider: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            default_provider: "deepseek".into(),
            placeholders: Vec::new(),
            strict_unknown_provider: false,
        }
    }
}

/// Resolution output: the provider config plus the exact credentials the
/// runtime should use
#[derive(Debug, Clone)]
pub struct ResolvedProvider {
    pub config: ModelProviderConfig,
    pub credentials: Credentials,
}

#[derive(Debug, Clone, Default)]
pub struct ProviderResolver {
    config: ResolverConfig,
}

impl ProviderResolver {
    pub fn new(config: ResolverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn known() -> &'static [ProviderSpec] {
        PROVIDERS
    }

    /// Case-sensitive table lookup
    pub fn lookup(key: &str) -> Option<&'static ProviderSpec> {
        PROVIDERS.iter().find(|p| p.key == key)
    }

    /// Whether `value` is an unfilled template value rather than a key
    pub fn is_placeholder(&self, value: &str) -> bool {
        let value = value.trim();
        value.is_empty()
            || (value.starts_with("your_") && value.ends_with("_api_key_here"))
            || self.config.placeholders.iter().any(|p| p == value)
    }

    /// Resolve `key` against `env`.
    ///
    /// Any previous compatibility remap is undone first, so the generic
    /// slots only ever hold the caller's own values or exactly one
    /// vendor's. Resolving the same key twice leaves the same state.
    pub fn resolve(&self, key: &str, env: &mut Environment) -> Result<ResolvedProvider, ResolveError> {
        env.restore_generic();

        let spec = self.select(key)?;
        let config = ModelProviderConfig::from(spec);

        let api_key = match spec.credential_env_var {
            Some(var) => {
                let value = env
                    .get(var)
                    .filter(|v| !self.is_placeholder(v))
                    .ok_or_else(|| ResolveError::MissingCredential {
                        provider: spec.key.into(),
                        env_var: var.into(),
                    })?;
                Some(value.to_string())
            }
            None => None,
        };

        if let (Some(base), Some(secret)) = (spec.compatibility_base_url, api_key.as_deref()) {
            env.remap_generic(secret, base);
        }

        tracing::info!(
            provider = spec.key,
            model = spec.model_identifier,
            remapped = env.is_remapped(),
            "resolved model provider"
        );

        Ok(ResolvedProvider {
            config,
            credentials: Credentials {
                api_key,
                base_url: spec.compatibility_base_url.map(Into::into),
            },
        })
    }

    fn select(&self, key: &str) -> Result<&'static ProviderSpec, ResolveError> {
        if let Some(spec) = Self::lookup(key) {
            return Ok(spec);
        }
        if self.config.strict_unknown_provider {
            return Err(ResolveError::UnknownProvider(key.into()));
        }

        tracing::warn!(
            provider = key,
            default = %self.config.default_provider,
            "unknown model provider, using default"
        );
        Self::lookup(&self.config.default_provider)
            .ok_or_else(|| ResolveError::UnknownProvider(self.config.default_provider.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::{GENERIC_API_BASE, GENERIC_API_KEY};

    #[test]
    fn test_table_keys_are_unique_and_qualified() {
        for (i, spec) in PROVIDERS.iter().enumerate() {
            assert!(PROVIDERS[i + 1..].iter().all(|p| p.key != spec.key));
            assert!(spec.model_identifier.contains(':'));
        }
    }

    #[test]
    fn test_missing_and_placeholder_credentials() {
        let resolver = ProviderResolver::default();

        let mut env = Environment::new();
        let err = resolver.resolve("deepseek", &mut env).unwrap_err();
        assert_eq!(
            err,
            ResolveError::MissingCredential {
                provider: "deepseek".into(),
                env_var: "DEEPSEEK_API_KEY".into()
            }
        );

        for placeholder in ["your_deepseek_api_key_here", "   ", ""] {
            let mut env = Environment::from_vars([("DEEPSEEK_API_KEY", placeholder)]);
            assert!(resolver.resolve("deepseek", &mut env).is_err());
            assert_eq!(env.get(GENERIC_API_KEY), None);
        }
    }

    #[test]
    fn test_configured_placeholder() {
        let resolver = ProviderResolver::new(ResolverConfig {
            placeholders: vec!["changeme".into()],
            ..ResolverConfig::default()
        });
        let mut env = Environment::from_vars([("ANTHROPIC_API_KEY", "changeme")]);
        assert!(resolver.resolve("anthropic", &mut env).is_err());
    }

    #[test]
    fn test_compat_provider_remaps_generic_slots() {
        let resolver = ProviderResolver::default();
        let mut env = Environment::from_vars([("DASHSCOPE_API_KEY", "sk-qwen")]);

        let resolved = resolver.resolve("dashscope", &mut env).unwrap();
        assert_eq!(resolved.config.model_identifier, "openai:qwen-max");
        assert_eq!(resolved.credentials.api_key.as_deref(), Some("sk-qwen"));
        assert_eq!(
            resolved.credentials.base_url.as_deref(),
            Some("https://dashscope.aliyuncs.com/compatible-mode/v1")
        );
        assert_eq!(env.get(GENERIC_API_KEY), Some("sk-qwen"));
        assert_eq!(
            env.get(GENERIC_API_BASE),
            Some("https://dashscope.aliyuncs.com/compatible-mode/v1")
        );
    }

    #[test]
    fn test_remapped_key_is_stored_verbatim() {
        let mut env = Environment::from_vars([("DEEPSEEK_API_KEY", "sk-deepseek\n")]);

        let resolved = ProviderResolver::default().resolve("deepseek", &mut env).unwrap();
        assert_eq!(resolved.credentials.api_key.as_deref(), Some("sk-deepseek\n"));
        assert_eq!(env.get(GENERIC_API_KEY), Some("sk-deepseek\n"));
    }

    #[test]
    fn test_openai_reads_callers_key_not_remapped_one() {
        let resolver = ProviderResolver::default();
        let mut env = Environment::from_vars([
            ("DEEPSEEK_API_KEY", "sk-deepseek"),
            ("OPENAI_API_KEY", "sk-openai"),
        ]);

        resolver.resolve("deepseek", &mut env).unwrap();
        assert_eq!(env.get(GENERIC_API_KEY), Some("sk-deepseek"));

        let resolved = resolver.resolve("openai", &mut env).unwrap();
        assert_eq!(resolved.credentials.api_key.as_deref(), Some("sk-openai"));
        assert_eq!(resolved.credentials.base_url, None);
        assert_eq!(env.get(GENERIC_API_KEY), Some("sk-openai"));
        assert_eq!(env.get(GENERIC_API_BASE), None);
    }

    #[test]
    fn test_keyless_provider() {
        let resolved = ProviderResolver::default()
            .resolve("ollama", &mut Environment::new())
            .unwrap();
        assert_eq!(resolved.config.credential_env_var, None);
        assert_eq!(resolved.credentials, Credentials::none());
    }

    #[test]
    fn test_unknown_provider_modes() {
        let mut env = Environment::from_vars([("DEEPSEEK_API_KEY", "sk-deepseek")]);

        let lenient = ProviderResolver::default().resolve("unknown-vendor", &mut env).unwrap();
        assert_eq!(lenient.config.provider_key, "deepseek");

        // Lookup is case-sensitive
        let upper = ProviderResolver::default().resolve("DeepSeek", &mut env).unwrap();
        assert_eq!(upper.config, lenient.config);

        let strict = ProviderResolver::new(ResolverConfig {
            strict_unknown_provider: true,
            ..ResolverConfig::default()
        });
        assert_eq!(
            strict.resolve("unknown-vendor", &mut env).unwrap_err(),
            ResolveError::UnknownProvider("unknown-vendor".into())
        );
        assert!(!env.is_remapped());
    }

    #[test]
    fn test_config_renders_for_catalog() {
        let config = ModelProviderConfig::from(ProviderResolver::lookup("ollama").unwrap());
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["provider_key"], "ollama");
        assert_eq!(json["model_identifier"], "ollama:llama3.2");
        assert!(json["credential_env_var"].is_null());
    }
}
