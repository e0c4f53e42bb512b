use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;
use std::time::Duration;

use anyhow::{Context, Result};

/// Fallback delay for the `retry after delay` recovery action.
pub const DEFAULT_DIAGNOSTIC_DELAY_SECS: u64 = 5;
const DEFAULT_GMAIL_API_URL: &str = "https://gmail.googleapis.com/gmail/v1/users/me/messages/send";

/// Service configuration loaded from environment variables.
///
/// Connector parameters (endpoints, tokens, models) are NOT held here: they are
/// read through a [`ConfigSource`] on every client build so that recovery
/// rotations always see current values.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub resume_dir: PathBuf,
    pub cover_letter_dir: PathBuf,
    pub diagnostic_delay: Duration,
    pub pdflatex_bin: String,
    pub gmail_access_token: Option<String>,
    pub gmail_api_url: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let delay_secs = match optional_env("DIAGNOSTIC_TOOL_DELAY_IN_SECS") {
            Some(raw) => raw
                .parse::<u64>()
                .context("DIAGNOSTIC_TOOL_DELAY_IN_SECS must be a whole number of seconds")?,
            None => DEFAULT_DIAGNOSTIC_DELAY_SECS,
        };

        Ok(Config {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            resume_dir: optional_env("RESUME_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".")),
            cover_letter_dir: optional_env("COVER_LETTER_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".")),
            diagnostic_delay: Duration::from_secs(delay_secs),
            pdflatex_bin: optional_env("PDFLATEX_BIN").unwrap_or_else(|| "pdflatex".to_string()),
            gmail_access_token: optional_env("GMAIL_ACCESS_TOKEN"),
            gmail_api_url: optional_env("GMAIL_API_URL")
                .unwrap_or_else(|| DEFAULT_GMAIL_API_URL.to_string()),
        })
    }
}

#[cfg(test)]
impl Config {
    /// Defaults with both output directories pointed at `output_dir` and no
    /// mail token.
    pub(crate) fn for_tests(output_dir: PathBuf) -> Self {
        Config {
            port: 0,
            rust_log: "debug".to_string(),
            resume_dir: output_dir.clone(),
            cover_letter_dir: output_dir,
            diagnostic_delay: Duration::ZERO,
            pdflatex_bin: "pdflatex".to_string(),
            gmail_access_token: None,
            gmail_api_url: DEFAULT_GMAIL_API_URL.to_string(),
        }
    }
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

// ────────────────────────────────────────────────────────────────────────────
// Key/value configuration source
// ────────────────────────────────────────────────────────────────────────────

/// Key → string lookup used by the connector factory, the recovery actions and
/// the decision engine. Empty values are reported as absent.
pub trait ConfigSource: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    /// Reads a comma-separated list, dropping blank items.
    fn get_list(&self, key: &str) -> Vec<String> {
        self.get(key)
            .map(|raw| {
                raw.split(',')
                    .map(|item| item.trim().to_string())
                    .filter(|item| !item.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Reads the process environment (after `.env` has been loaded by `Config::from_env`).
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvSource;

impl ConfigSource for EnvSource {
    fn get(&self, key: &str) -> Option<String> {
        optional_env(key)
    }
}

/// In-memory source. Values can be changed at runtime, which is how tests
/// simulate an operator editing the alternate keys between rotations.
#[derive(Debug, Default)]
pub struct MapSource {
    values: RwLock<HashMap<String, String>>,
}

impl MapSource {
    pub fn new<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self {
            values: RwLock::new(
                pairs
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }

    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        if let Ok(mut values) = self.values.write() {
            values.insert(key.into(), value.into());
        }
    }
}

impl ConfigSource for MapSource {
    fn get(&self, key: &str) -> Option<String> {
        self.values
            .read()
            .ok()?
            .get(key)
            .filter(|v| !v.trim().is_empty())
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_source_treats_blank_as_missing() {
        let source = MapSource::new([("A", "1"), ("B", "  ")]);
        assert_eq!(source.get("A").as_deref(), Some("1"));
        assert_eq!(source.get("B"), None);
        assert_eq!(source.get("C"), None);
    }

    #[test]
    fn test_get_list_splits_and_trims() {
        let source = MapSource::new([("CONNECTOR_PRECEDENCE", " openai, http ,,huggingface ")]);
        assert_eq!(
            source.get_list("CONNECTOR_PRECEDENCE"),
            vec!["openai", "http", "huggingface"]
        );
        assert!(source.get_list("MISSING").is_empty());
    }

    #[test]
    fn test_map_source_set_overwrites() {
        let source = MapSource::new([("OPENAI_CON_MODEL", "gpt-4o")]);
        source.set("OPENAI_CON_MODEL", "gpt-4o-mini");
        assert_eq!(source.get("OPENAI_CON_MODEL").as_deref(), Some("gpt-4o-mini"));
    }
}
