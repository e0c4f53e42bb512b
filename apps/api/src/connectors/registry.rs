//! Client Registry: the finite set of backend families, their parameter
//! contracts, and the constructor registered for each.
//!
//! Names coming from configuration are untrusted strings; they are turned into
//! a [`BackendKind`] (aliases included) before anything else happens, and an
//! unknown name is a typed [`ConnectorError::UnsupportedBackend`].

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use super::ConnectorError;
use crate::llm_client::{
    HttpClient, HuggingFaceClient, OpenAiClient, ServiceClient, DEFAULT_TEMPERATURE,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    HuggingFace,
    OpenAi,
    Http,
}

/// Alias → canonical name. Lookup is case-insensitive.
const ALIASES: &[(&str, &str)] = &[
    ("hf", "huggingface"),
    ("hugging_face", "huggingface"),
    ("oa", "openai"),
    ("rest", "http"),
];

impl BackendKind {
    pub const ALL: [BackendKind; 3] = [BackendKind::HuggingFace, BackendKind::OpenAi, BackendKind::Http];

    /// Parses a configured backend name, translating aliases first.
    pub fn parse(name: &str) -> Option<Self> {
        let lowered = name.trim().to_lowercase();
        let canonical = ALIASES
            .iter()
            .find(|(alias, _)| *alias == lowered)
            .map(|(_, canonical)| *canonical)
            .unwrap_or(lowered.as_str());

        Self::ALL
            .into_iter()
            .find(|kind| kind.canonical_name() == canonical)
    }

    pub fn canonical_name(self) -> &'static str {
        match self {
            BackendKind::HuggingFace => "huggingface",
            BackendKind::OpenAi => "openai",
            BackendKind::Http => "http",
        }
    }

    pub fn spec(self) -> &'static BackendSpec {
        match self {
            BackendKind::HuggingFace => &HUGGINGFACE_SPEC,
            BackendKind::OpenAi => &OPENAI_SPEC,
            BackendKind::Http => &HTTP_SPEC,
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical_name())
    }
}

/// Parameter families. The family fragment is what recovery allowlists match
/// against configuration keys (substring, case-insensitive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamName {
    Endpoint,
    Credential,
    Model,
    Provider,
}

impl ParamName {
    pub fn family(self) -> &'static str {
        match self {
            ParamName::Endpoint => "URL",
            ParamName::Credential => "TOKEN",
            ParamName::Model => "MODEL",
            ParamName::Provider => "PROVIDER",
        }
    }
}

#[derive(Debug)]
pub struct ParamSpec {
    pub name: ParamName,
    pub key: &'static str,
}

/// Immutable parameter contract of one backend family.
#[derive(Debug)]
pub struct BackendSpec {
    pub kind: BackendKind,
    pub canonical_name: &'static str,
    pub required: &'static [ParamSpec],
    pub optional: &'static [ParamSpec],
}

impl BackendSpec {
    pub fn params(&self) -> impl Iterator<Item = (&ParamSpec, bool)> {
        self.required
            .iter()
            .map(|p| (p, true))
            .chain(self.optional.iter().map(|p| (p, false)))
    }
}

static HUGGINGFACE_SPEC: BackendSpec = BackendSpec {
    kind: BackendKind::HuggingFace,
    canonical_name: "huggingface",
    required: &[
        ParamSpec { name: ParamName::Credential, key: "HUGGINGFACE_CON_TOKEN" },
        ParamSpec { name: ParamName::Model, key: "HUGGINGFACE_CON_MODEL" },
    ],
    optional: &[
        ParamSpec { name: ParamName::Provider, key: "HUGGINGFACE_CON_PROVIDER" },
        ParamSpec { name: ParamName::Endpoint, key: "HUGGINGFACE_CON_URL" },
    ],
};

static OPENAI_SPEC: BackendSpec = BackendSpec {
    kind: BackendKind::OpenAi,
    canonical_name: "openai",
    required: &[
        ParamSpec { name: ParamName::Credential, key: "OPENAI_CON_API_TOKEN" },
        ParamSpec { name: ParamName::Model, key: "OPENAI_CON_MODEL" },
    ],
    optional: &[ParamSpec { name: ParamName::Endpoint, key: "OPENAI_CON_URL" }],
};

static HTTP_SPEC: BackendSpec = BackendSpec {
    kind: BackendKind::Http,
    canonical_name: "http",
    required: &[
        ParamSpec { name: ParamName::Endpoint, key: "HTTP_CON_URL" },
        ParamSpec { name: ParamName::Credential, key: "HTTP_CON_API_TOKEN" },
    ],
    optional: &[ParamSpec { name: ParamName::Model, key: "HTTP_CON_MODEL" }],
};

/// Parameter values resolved for one build, with the configuration key each
/// value was actually read from (primary or `_ALT`).
#[derive(Debug, Clone, Default)]
pub struct ResolvedConfig {
    values: HashMap<ParamName, (String, String)>,
}

impl ResolvedConfig {
    pub fn insert(&mut self, name: ParamName, key: String, value: String) {
        self.values.insert(name, (key, value));
    }

    pub fn get(&self, name: ParamName) -> Option<&str> {
        self.values.get(&name).map(|(_, value)| value.as_str())
    }

    /// Configuration key the value for `name` came from.
    pub fn source_key(&self, name: ParamName) -> Option<&str> {
        self.values.get(&name).map(|(key, _)| key.as_str())
    }

    fn require(&self, spec: &BackendSpec, name: ParamName) -> Result<String, ConnectorError> {
        self.get(name).map(str::to_string).ok_or_else(|| {
            let key = spec
                .params()
                .find(|(p, _)| p.name == name)
                .map(|(p, _)| p.key.to_string())
                .unwrap_or_else(|| name.family().to_string());
            ConnectorError::Configuration {
                backend: spec.canonical_name,
                missing: vec![key],
            }
        })
    }
}

pub type Constructor =
    Arc<dyn Fn(&ResolvedConfig) -> Result<Arc<dyn ServiceClient>, ConnectorError> + Send + Sync>;

/// Backend kind → constructor table. Populated once at startup.
#[derive(Clone, Default)]
pub struct Registry {
    constructors: HashMap<BackendKind, Constructor>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the three built-in HTTP clients.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(BackendKind::HuggingFace, Arc::new(build_huggingface));
        registry.register(BackendKind::OpenAi, Arc::new(build_openai));
        registry.register(BackendKind::Http, Arc::new(build_http));
        registry
    }

    pub fn register(&mut self, kind: BackendKind, constructor: Constructor) {
        tracing::debug!("Registered connector type: {}", kind);
        self.constructors.insert(kind, constructor);
    }

    /// Resolves a configured name (aliases allowed) to its spec and constructor.
    pub fn resolve(
        &self,
        name: &str,
    ) -> Result<(&'static BackendSpec, Constructor), ConnectorError> {
        let kind = BackendKind::parse(name)
            .ok_or_else(|| ConnectorError::UnsupportedBackend(name.trim().to_string()))?;
        let constructor = self
            .constructors
            .get(&kind)
            .cloned()
            .ok_or_else(|| ConnectorError::UnsupportedBackend(name.trim().to_string()))?;
        Ok((kind.spec(), constructor))
    }
}

fn init_error(kind: BackendKind) -> impl FnOnce(crate::llm_client::LlmError) -> ConnectorError {
    move |source| ConnectorError::ClientInit {
        backend: kind.canonical_name(),
        source,
    }
}

fn build_huggingface(config: &ResolvedConfig) -> Result<Arc<dyn ServiceClient>, ConnectorError> {
    let spec = BackendKind::HuggingFace.spec();
    let client = HuggingFaceClient::new(
        config.require(spec, ParamName::Credential)?,
        config.require(spec, ParamName::Model)?,
        config.get(ParamName::Provider).map(str::to_string),
        config.get(ParamName::Endpoint),
    )
    .map_err(init_error(BackendKind::HuggingFace))?;
    Ok(Arc::new(client))
}

fn build_openai(config: &ResolvedConfig) -> Result<Arc<dyn ServiceClient>, ConnectorError> {
    let spec = BackendKind::OpenAi.spec();
    let client = OpenAiClient::new(
        config.get(ParamName::Endpoint),
        config.require(spec, ParamName::Credential)?,
        config.require(spec, ParamName::Model)?,
        DEFAULT_TEMPERATURE,
    )
    .map_err(init_error(BackendKind::OpenAi))?;
    Ok(Arc::new(client))
}

fn build_http(config: &ResolvedConfig) -> Result<Arc<dyn ServiceClient>, ConnectorError> {
    let spec = BackendKind::Http.spec();
    let client = HttpClient::new(
        &config.require(spec, ParamName::Endpoint)?,
        config.require(spec, ParamName::Credential)?,
        config.get(ParamName::Model).map(str::to_string),
        DEFAULT_TEMPERATURE,
    )
    .map_err(init_error(BackendKind::Http))?;
    Ok(Arc::new(client))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_translates_aliases_case_insensitively() {
        assert_eq!(BackendKind::parse("HF"), Some(BackendKind::HuggingFace));
        assert_eq!(BackendKind::parse("Hugging_Face"), Some(BackendKind::HuggingFace));
        assert_eq!(BackendKind::parse(" oa "), Some(BackendKind::OpenAi));
        assert_eq!(BackendKind::parse("REST"), Some(BackendKind::Http));
        assert_eq!(BackendKind::parse("openai"), Some(BackendKind::OpenAi));
        assert_eq!(BackendKind::parse("anthropic"), None);
    }

    #[test]
    fn test_resolve_unknown_backend_is_typed_error() {
        let registry = Registry::with_builtins();
        let err = registry.resolve("ollama").err().unwrap();
        assert!(matches!(err, ConnectorError::UnsupportedBackend(ref n) if n == "ollama"));
    }

    #[test]
    fn test_resolve_known_but_unregistered_backend_fails() {
        let registry = Registry::new();
        assert!(matches!(
            registry.resolve("openai"),
            Err(ConnectorError::UnsupportedBackend(_))
        ));
    }

    #[test]
    fn test_specs_mark_required_params() {
        let openai = BackendKind::OpenAi.spec();
        let required: Vec<_> = openai.required.iter().map(|p| p.key).collect();
        assert_eq!(required, vec!["OPENAI_CON_API_TOKEN", "OPENAI_CON_MODEL"]);

        let http = BackendKind::Http.spec();
        assert!(http.required.iter().any(|p| p.name == ParamName::Endpoint));
        assert!(http.optional.iter().any(|p| p.name == ParamName::Model));
    }

    #[test]
    fn test_builtin_openai_constructor_builds_client() {
        let registry = Registry::with_builtins();
        let (spec, constructor) = registry.resolve("oa").unwrap();
        assert_eq!(spec.canonical_name, "openai");

        let mut config = ResolvedConfig::default();
        config.insert(ParamName::Credential, "OPENAI_CON_API_TOKEN".into(), "sk-test".into());
        config.insert(ParamName::Model, "OPENAI_CON_MODEL".into(), "gpt-4o-mini".into());
        let client = constructor(&config).unwrap();
        assert_eq!(client.backend(), "openai");
        assert_eq!(client.model(), Some("gpt-4o-mini"));
    }

    #[test]
    fn test_builtin_http_constructor_rejects_malformed_url() {
        let registry = Registry::with_builtins();
        let (_, constructor) = registry.resolve("http").unwrap();

        let mut config = ResolvedConfig::default();
        config.insert(ParamName::Endpoint, "HTTP_CON_URL".into(), "not-a-url".into());
        config.insert(ParamName::Credential, "HTTP_CON_API_TOKEN".into(), "t".into());
        let err = constructor(&config).err().unwrap();
        assert!(matches!(err, ConnectorError::ClientInit { backend: "http", .. }));
    }
}
