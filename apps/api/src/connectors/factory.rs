//! Client Factory: resolves a backend's parameters from configuration and
//! runs the registered constructor. Never retries; every failure is returned
//! to whoever asked for the build.

use std::sync::Arc;

use tracing::debug;

use super::registry::{BackendSpec, ParamName, Registry, ResolvedConfig};
use super::ConnectorError;
use crate::config::ConfigSource;
use crate::llm_client::ServiceClient;

/// Suffix of the alternate variant of a configuration key.
pub const ALT_SUFFIX: &str = "_ALT";

/// Output of one successful build.
pub struct BuiltClient {
    pub spec: &'static BackendSpec,
    pub config: ResolvedConfig,
    pub client: Arc<dyn ServiceClient>,
}

pub struct ClientFactory {
    registry: Registry,
    source: Arc<dyn ConfigSource>,
}

impl ClientFactory {
    pub fn new(registry: Registry, source: Arc<dyn ConfigSource>) -> Self {
        Self { registry, source }
    }

    pub fn source(&self) -> &Arc<dyn ConfigSource> {
        &self.source
    }

    /// Configuration key to read for `key`: the `_ALT` variant when alt-config
    /// is on and some allowlist entry occurs (case-insensitively) inside `key`.
    pub fn param_key(key: &str, alt_config: bool, allowlist: &[&str]) -> String {
        let upper = key.to_uppercase();
        let rotate = alt_config
            && allowlist
                .iter()
                .any(|entry| !entry.is_empty() && upper.contains(&entry.to_uppercase()));
        if rotate {
            format!("{key}{ALT_SUFFIX}")
        } else {
            key.to_string()
        }
    }

    pub fn resolve_param(&self, key: &str, alt_config: bool, allowlist: &[&str]) -> Option<String> {
        let env_key = Self::param_key(key, alt_config, allowlist);
        let value = self.source.get(&env_key);
        debug!(
            key = %env_key,
            found = value.is_some(),
            "Resolved connector parameter"
        );
        value
    }

    /// Builds a client for `backend` (aliases allowed). `alt_params` names the
    /// parameter families read from their `_ALT` keys when `alt_config` is set.
    pub fn build(
        &self,
        backend: &str,
        alt_config: bool,
        alt_params: &[ParamName],
    ) -> Result<BuiltClient, ConnectorError> {
        let (spec, constructor) = self.registry.resolve(backend)?;
        let allowlist: Vec<&str> = alt_params.iter().map(|p| p.family()).collect();

        let mut config = ResolvedConfig::default();
        let mut missing = Vec::new();

        for (param, required) in spec.params() {
            let env_key = Self::param_key(param.key, alt_config, &allowlist);
            match self.resolve_param(param.key, alt_config, &allowlist) {
                Some(value) => config.insert(param.name, env_key, value),
                None if required => missing.push(env_key),
                None => {}
            }
        }

        if !missing.is_empty() {
            return Err(ConnectorError::Configuration {
                backend: spec.canonical_name,
                missing,
            });
        }

        let client = constructor(&config)?;
        Ok(BuiltClient {
            spec,
            config,
            client,
        })
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;

    use crate::connectors::registry::{BackendKind, Constructor, ParamName, Registry, ResolvedConfig};
    use crate::llm_client::{LlmError, ServiceClient};

    /// Client that echoes the parameters it was built with.
    pub struct StubClient {
        pub backend: &'static str,
        pub model: Option<String>,
        pub endpoint: Option<String>,
        pub credential: Option<String>,
        pub calls: AtomicUsize,
    }

    #[async_trait]
    impl ServiceClient for StubClient {
        async fn submit(&self, prompt: &str) -> Result<String, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("{}:{}", self.backend, prompt))
        }

        fn backend(&self) -> &'static str {
            self.backend
        }

        fn model(&self) -> Option<&str> {
            self.model.as_deref()
        }
    }

    pub fn stub_constructor(kind: BackendKind, builds: Arc<AtomicUsize>) -> Constructor {
        Arc::new(move |config: &ResolvedConfig| {
            builds.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(StubClient {
                backend: kind.canonical_name(),
                model: config.get(ParamName::Model).map(str::to_string),
                endpoint: config.get(ParamName::Endpoint).map(str::to_string),
                credential: config.get(ParamName::Credential).map(str::to_string),
                calls: AtomicUsize::new(0),
            }) as Arc<dyn ServiceClient>)
        })
    }

    /// Registry where every backend builds a [`StubClient`], counting builds.
    pub fn stub_registry(builds: Arc<AtomicUsize>) -> Registry {
        let mut registry = Registry::new();
        for kind in BackendKind::ALL {
            registry.register(kind, stub_constructor(kind, builds.clone()));
        }
        registry
    }
}
