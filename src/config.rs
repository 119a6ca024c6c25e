//! Configuration management for the chat relay.
//!
//! Configuration is read once at startup from environment variables, after a
//! `.env` file in the working directory (if any) has been loaded into them:
//! - `GOOGLE_GEMINI_API_KEY` - Gemini API key. Not validated; calls fail downstream when unset.
//! - `GOOGLE_API_KEY` - Google Custom Search API key.
//! - `SEARCH_ENGINE_ID` - Google Custom Search engine identifier (`cx`).
//! - `GEMINI_MODEL` - Optional. Defaults to `gemini-2.5-flash`.
//! - `GEMINI_BASE_URL` - Optional. Defaults to the public `v1beta` endpoint.
//! - `SEARCH_BASE_URL` - Optional. Defaults to the Custom Search JSON API.
//! - `WIKIPEDIA_BASE_URL` - Optional. Defaults to `https://en.wikipedia.org`.
//! - `HOST` - Optional. Server host. Defaults to `0.0.0.0`.
//! - `PORT` - Optional. Server port. Defaults to `5000`.
//! - `MAX_TOOL_ROUNDS` - Optional. Tool-call rounds allowed per request. Defaults to `10`.
//! - `PAGE_FETCH_TIMEOUT_SECS` - Optional. Defaults to `10`.
//! - `PERSONA` / `PERSONA_FILE` - Optional. Persona preamble text, inline or from a file.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::agent::DEFAULT_PERSONA;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),

    #[error("Failed to read persona file {path}: {source}")]
    PersonaFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Upstream endpoints and credentials used by the tool executors.
#[derive(Debug, Clone)]
pub struct ToolsConfig {
    /// Custom Search API key
    pub search_api_key: String,

    /// Custom Search engine identifier
    pub search_engine_id: String,

    /// Custom Search endpoint
    pub search_base_url: String,

    /// Wikipedia origin (action API and REST API live under it)
    pub wikipedia_base_url: String,

    /// Timeout applied to page fetches
    pub page_fetch_timeout: Duration,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            search_api_key: String::new(),
            search_engine_id: String::new(),
            search_base_url: "https://www.googleapis.com/customsearch/v1".to_string(),
            wikipedia_base_url: "https://en.wikipedia.org".to_string(),
            page_fetch_timeout: Duration::from_secs(10),
        }
    }
}

/// Service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Gemini API key
    pub gemini_api_key: String,

    /// Gemini model identifier
    pub model: String,

    /// Gemini API base URL (without the `/models/...` suffix)
    pub gemini_base_url: String,

    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Maximum tool-call rounds before a request is abandoned
    pub max_tool_rounds: usize,

    /// Persona preamble prepended to every user message
    pub persona: String,

    /// Tool executor configuration
    pub tools: ToolsConfig,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` when a numeric variable does not parse, and
    /// `ConfigError::PersonaFile` when `PERSONA_FILE` cannot be read.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let gemini_api_key = lookup("GOOGLE_GEMINI_API_KEY").unwrap_or_default();
        if gemini_api_key.is_empty() {
            tracing::warn!("GOOGLE_GEMINI_API_KEY is not set; model calls will fail");
        }

        let search_api_key = lookup("GOOGLE_API_KEY").unwrap_or_default();
        let search_engine_id = lookup("SEARCH_ENGINE_ID").unwrap_or_default();
        if search_api_key.is_empty() || search_engine_id.is_empty() {
            tracing::warn!("GOOGLE_API_KEY or SEARCH_ENGINE_ID is not set; web search will fail");
        }

        let defaults = ToolsConfig::default();

        let model = lookup("GEMINI_MODEL").unwrap_or_else(|| "gemini-2.5-flash".to_string());

        let gemini_base_url = lookup("GEMINI_BASE_URL")
            .unwrap_or_else(|| "https://generativelanguage.googleapis.com/v1beta".to_string());

        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());

        let port = parse_var(&lookup, "PORT", 5000)?;
        let max_tool_rounds = parse_var(&lookup, "MAX_TOOL_ROUNDS", 10)?;
        let page_fetch_timeout_secs = parse_var(&lookup, "PAGE_FETCH_TIMEOUT_SECS", 10u64)?;

        let persona = match lookup("PERSONA_FILE") {
            Some(path) => {
                let path = PathBuf::from(path);
                std::fs::read_to_string(&path)
                    .map_err(|source| ConfigError::PersonaFile { path, source })?
            }
            None => lookup("PERSONA").unwrap_or_else(|| DEFAULT_PERSONA.to_string()),
        };

        let tools = ToolsConfig {
            search_api_key,
            search_engine_id,
            search_base_url: lookup("SEARCH_BASE_URL").unwrap_or(defaults.search_base_url),
            wikipedia_base_url: lookup("WIKIPEDIA_BASE_URL")
                .unwrap_or(defaults.wikipedia_base_url),
            page_fetch_timeout: Duration::from_secs(page_fetch_timeout_secs),
        };

        Ok(Self {
            gemini_api_key,
            model,
            gemini_base_url,
            host,
            port,
            max_tool_rounds,
            persona,
            tools,
        })
    }

    /// Create a config with custom values (useful for testing).
    pub fn new(gemini_api_key: String, model: String) -> Self {
        Self {
            gemini_api_key,
            model,
            gemini_base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            host: "127.0.0.1".to_string(),
            port: 5000,
            max_tool_rounds: 10,
            persona: DEFAULT_PERSONA.to_string(),
            tools: ToolsConfig::default(),
        }
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| ConfigError::InvalidValue(key.to_string(), format!("{}", e))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.model, "gemini-2.5-flash");
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 5000);
        assert_eq!(config.max_tool_rounds, 10);
        assert_eq!(config.tools.page_fetch_timeout, Duration::from_secs(10));
        assert_eq!(config.persona, DEFAULT_PERSONA);
        assert!(config.gemini_api_key.is_empty());
    }

    #[test]
    fn reads_keys_and_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("GOOGLE_GEMINI_API_KEY", "gem-key"),
            ("GOOGLE_API_KEY", "search-key"),
            ("SEARCH_ENGINE_ID", "cx-1"),
            ("GEMINI_MODEL", "gemini-2.0-flash"),
            ("PORT", "8080"),
            ("MAX_TOOL_ROUNDS", " 3 "),
            ("PERSONA", "You are terse."),
        ]))
        .unwrap();

        assert_eq!(config.gemini_api_key, "gem-key");
        assert_eq!(config.tools.search_api_key, "search-key");
        assert_eq!(config.tools.search_engine_id, "cx-1");
        assert_eq!(config.model, "gemini-2.0-flash");
        assert_eq!(config.port, 8080);
        assert_eq!(config.max_tool_rounds, 3);
        assert_eq!(config.persona, "You are terse.");
    }

    #[test]
    fn dotenv_file_values_feed_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# local settings").unwrap();
        writeln!(file, "GOOGLE_GEMINI_API_KEY=from-dotenv").unwrap();
        writeln!(file, "PORT=8081").unwrap();
        writeln!(file, "PERSONA=\"You are a helpful crab.\"").unwrap();

        let vars: HashMap<String, String> = dotenvy::from_path_iter(file.path())
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        let config = Config::from_lookup(|key| vars.get(key).cloned()).unwrap();

        assert_eq!(config.gemini_api_key, "from-dotenv");
        assert_eq!(config.port, 8081);
        assert_eq!(config.persona, "You are a helpful crab.");
    }

    #[test]
    fn invalid_port_is_rejected() {
        let err = Config::from_lookup(lookup_from(&[("PORT", "not-a-port")])).unwrap_err();
        match err {
            ConfigError::InvalidValue(key, _) => assert_eq!(key, "PORT"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn persona_file_takes_precedence() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "Persona from disk").unwrap();
        let path = file.path().to_string_lossy().to_string();

        let config = Config::from_lookup(lookup_from(&[
            ("PERSONA_FILE", path.as_str()),
            ("PERSONA", "inline persona"),
        ]))
        .unwrap();
        assert_eq!(config.persona, "Persona from disk");
    }

    #[test]
    fn missing_persona_file_is_an_error() {
        let err = Config::from_lookup(lookup_from(&[(
            "PERSONA_FILE",
            "/definitely/not/here/persona.txt",
        )]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::PersonaFile { .. }));
    }
}
