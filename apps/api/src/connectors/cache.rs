//! Client Cache: task name → active client handle.
//!
//! The cache is owned by the process context (`AppState`) and injected where
//! needed; tests build isolated instances. Entries live in a sharded
//! concurrent map, so lookups and reloads for different tasks never contend on
//! the same lock. Builds run outside any map lock: two concurrent misses for
//! one task may both build, the last insert wins and the other client is dropped.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use super::factory::{BuiltClient, ClientFactory};
use super::registry::{BackendSpec, ParamName, ResolvedConfig};
use super::{task_env_prefix, task_key, ConnectorError, DEFAULT_CONNECTOR_KEY, GLOBAL_PRECEDENCE_KEY};
use crate::config::ConfigSource;
use crate::llm_client::ServiceClient;

/// One constructed client and everything it was built from.
pub struct ClientHandle {
    pub task: String,
    pub spec: &'static BackendSpec,
    pub config: ResolvedConfig,
    pub client: Arc<dyn ServiceClient>,
    pub alt_config: bool,
    pub generation: Uuid,
    pub built_at: DateTime<Utc>,
}

/// Serializable view of a handle for the status endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct HandleSummary {
    pub task: String,
    pub backend: &'static str,
    pub model: Option<String>,
    pub model_key: Option<String>,
    pub alt_config: bool,
    pub generation: Uuid,
    pub built_at: DateTime<Utc>,
}

impl ClientHandle {
    pub fn summary(&self) -> HandleSummary {
        HandleSummary {
            task: self.task.clone(),
            backend: self.spec.canonical_name,
            model: self.config.get(ParamName::Model).map(str::to_string),
            model_key: self.config.source_key(ParamName::Model).map(str::to_string),
            alt_config: self.alt_config,
            generation: self.generation,
            built_at: self.built_at,
        }
    }
}

/// How a client should be obtained. `Default` is a plain cached lookup.
#[derive(Debug, Clone, Default)]
pub struct ClientRequest {
    pub reload: bool,
    pub override_backend: Option<String>,
    pub alt_config: bool,
    pub alt_params: Vec<ParamName>,
}

impl ClientRequest {
    /// Rebuild from current configuration.
    pub fn reload() -> Self {
        Self {
            reload: true,
            ..Self::default()
        }
    }

    /// Rebuild on a specific backend.
    pub fn reload_with_backend(backend: impl Into<String>) -> Self {
        Self {
            reload: true,
            override_backend: Some(backend.into()),
            ..Self::default()
        }
    }

    /// Rebuild reading the given parameter families from their `_ALT` keys.
    pub fn reload_with_alt(params: &[ParamName]) -> Self {
        Self {
            reload: true,
            alt_config: true,
            alt_params: params.to_vec(),
            ..Self::default()
        }
    }
}

pub struct ClientCache {
    factory: ClientFactory,
    handles: DashMap<String, Arc<ClientHandle>>,
}

impl ClientCache {
    pub fn new(factory: ClientFactory) -> Self {
        Self {
            factory,
            handles: DashMap::new(),
        }
    }

    pub fn source(&self) -> &Arc<dyn ConfigSource> {
        self.factory.source()
    }

    /// Returns the active client for `task`, building one on a miss or when
    /// `request.reload` is set.
    pub fn get_client(
        &self,
        task: &str,
        request: &ClientRequest,
    ) -> Result<Arc<dyn ServiceClient>, ConnectorError> {
        Ok(self.resolve(task, request)?.client.clone())
    }

    /// Like [`get_client`](Self::get_client) but returns the whole handle.
    pub fn resolve(
        &self,
        task: &str,
        request: &ClientRequest,
    ) -> Result<Arc<ClientHandle>, ConnectorError> {
        let key = task_key(task);

        if !request.reload {
            if let Some(handle) = self.handles.get(&key) {
                return Ok(handle.value().clone());
            }
        }

        let backend = request
            .override_backend
            .clone()
            .or_else(|| self.configured_backend(&key))
            .ok_or_else(|| ConnectorError::NoBackendConfigured(task.to_string()))?;

        let BuiltClient {
            spec,
            config,
            client,
        } = self
            .factory
            .build(&backend, request.alt_config, &request.alt_params)?;

        let handle = Arc::new(ClientHandle {
            task: key.clone(),
            spec,
            config,
            client,
            alt_config: request.alt_config,
            generation: Uuid::new_v4(),
            built_at: Utc::now(),
        });

        let previous = self.handles.insert(key.clone(), handle.clone());
        info!(
            task = %key,
            backend = spec.canonical_name,
            generation = %handle.generation,
            replaced = previous.is_some(),
            "Connector client built"
        );

        Ok(handle)
    }

    /// Backend configured for a task: `<TASK>_AGENT_CONNECTOR`, else `DEFAULT_CONNECTOR`.
    pub fn configured_backend(&self, task: &str) -> Option<String> {
        let source = self.source();
        source
            .get(&format!("{}_AGENT_CONNECTOR", task_env_prefix(task)))
            .or_else(|| source.get(DEFAULT_CONNECTOR_KEY))
    }

    /// Fallback order for a task: `<TASK>_CONNECTOR_PRECEDENCE`, else `CONNECTOR_PRECEDENCE`.
    pub fn precedence(&self, task: &str) -> Vec<String> {
        let source = self.source();
        let own = source.get_list(&format!("{}_CONNECTOR_PRECEDENCE", task_env_prefix(task)));
        if own.is_empty() {
            source.get_list(GLOBAL_PRECEDENCE_KEY)
        } else {
            own
        }
    }

    /// Currently stored handle for a task, without building.
    pub fn handle(&self, task: &str) -> Option<Arc<ClientHandle>> {
        self.handles.get(&task_key(task)).map(|h| h.value().clone())
    }

    /// Drops the handle for a task; the next lookup rebuilds it.
    pub fn invalidate(&self, task: &str) -> bool {
        let removed = self.handles.remove(&task_key(task)).is_some();
        debug!(task, removed, "Connector cache entry invalidated");
        removed
    }

    pub fn clear(&self) {
        self.handles.clear();
    }

    pub fn snapshot(&self) -> Vec<HandleSummary> {
        let mut summaries: Vec<_> = self.handles.iter().map(|h| h.value().summary()).collect();
        summaries.sort_by(|a, b| a.task.cmp(&b.task));
        summaries
    }
}
