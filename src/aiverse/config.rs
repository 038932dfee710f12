//! Process-wide configuration for AIVerse.
//!
//! [`AiverseConfig`] carries the credentials the tools and model providers need. It is read once
//! at process start via [`AiverseConfig::from_env`], after [`load_dotenv`] has merged a local
//! `.env` file into the environment. A missing key is *not* an error at that
//! point. The tool or provider that needs it fails when it is actually invoked, which turns the
//! problem into a per-agent failure instead of aborting the whole run.
//!
//! # Example
//!
//! ```rust
//! use aiverse::AiverseConfig;
//!
//! let config = AiverseConfig {
//!     weather_api_key: Some("weather-key".into()),
//!     ..AiverseConfig::default()
//! };
//! assert_eq!(config.ollama_base_url, "http://localhost:11434");
//! ```

use std::env;
use std::path::Path;

/// Default endpoint of a local Ollama daemon.
pub const DEFAULT_OLLAMA_BASE_URL: &str = "http://localhost:11434";

/// Credentials and endpoints used by tools and model providers.
///
/// Users construct this however they want. The only file ever read is an optional `.env`.
#[derive(Clone, Debug)]
pub struct AiverseConfig {
    /// weatherapi.com key (`WEATHER_API_KEY`).
    pub weather_api_key: Option<String>,
    /// currencyapi.com key (`CURRENCY_API_KEY`).
    pub currency_api_key: Option<String>,
    /// serper.dev key for Google search (`SERPER_API_KEY`).
    pub serper_api_key: Option<String>,
    /// Groq key (`GROQ_API_KEY`).
    pub groq_api_key: Option<String>,
    /// Google AI Studio key (`GOOGLE_API_KEY`, falling back to `GEMINI_API_KEY`).
    pub google_api_key: Option<String>,
    /// OpenAI key (`OPENAI_API_KEY`).
    pub openai_api_key: Option<String>,
    /// Optional bearer token for a remote Ollama endpoint (`OLLAMA_API_KEY`).
    pub ollama_api_key: Option<String>,
    /// Base URL of the Ollama daemon (`OLLAMA_BASE_URL`).
    pub ollama_base_url: String,
}

impl Default for AiverseConfig {
    /// No credentials, Ollama on localhost.
    fn default() -> Self {
        Self {
            weather_api_key: None,
            currency_api_key: None,
            serper_api_key: None,
            groq_api_key: None,
            google_api_key: None,
            openai_api_key: None,
            ollama_api_key: None,
            ollama_base_url: DEFAULT_OLLAMA_BASE_URL.to_string(),
        }
    }
}

/// Merge `./.env` (or the first one found in a parent directory) into the process environment.
///
/// Variables already set in the environment win. A missing file is not an error; an unreadable
/// or malformed one is logged and skipped.
pub fn load_dotenv() {
    match dotenv::dotenv() {
        Ok(path) => log::debug!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => log::debug!("No .env file found"),
        Err(e) => log::warn!("Ignoring .env file: {}", e),
    }
}

/// Merge a specific env file into the process environment. Returns `Ok(false)` when the file
/// does not exist.
pub fn load_dotenv_from(path: &Path) -> Result<bool, dotenv::Error> {
    match dotenv::from_path(path) {
        Ok(()) => Ok(true),
        Err(e) if e.not_found() => Ok(false),
        Err(e) => Err(e),
    }
}

impl AiverseConfig {
    /// Read every setting from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup. Empty values count as absent.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let config = Self {
            weather_api_key: get("WEATHER_API_KEY"),
            currency_api_key: get("CURRENCY_API_KEY"),
            serper_api_key: get("SERPER_API_KEY"),
            groq_api_key: get("GROQ_API_KEY"),
            google_api_key: get("GOOGLE_API_KEY").or_else(|| get("GEMINI_API_KEY")),
            openai_api_key: get("OPENAI_API_KEY"),
            ollama_api_key: get("OLLAMA_API_KEY"),
            ollama_base_url: get("OLLAMA_BASE_URL")
                .unwrap_or_else(|| DEFAULT_OLLAMA_BASE_URL.to_string()),
        };

        log::debug!(
            "AiverseConfig::from_lookup(): weather={} currency={} serper={} groq={} google={} openai={}",
            config.weather_api_key.is_some(),
            config.currency_api_key.is_some(),
            config.serper_api_key.is_some(),
            config.groq_api_key.is_some(),
            config.google_api_key.is_some(),
            config.openai_api_key.is_some(),
        );

        config
    }
}
