use std::time::Duration;

use anyhow::{Context, Result};

use crate::generation::pipeline::{PipelineConfig, DEFAULT_REQUEST_TIMEOUT};
use crate::llm_client::{ProviderConfig, DEFAULT_BASE_URL, DEFAULT_MODEL};

const DEFAULT_CORS_ORIGIN: &str = "http://localhost:3000";

/// Application configuration loaded from environment variables.
/// The provider key is optional at startup; requests fail with a descriptive
/// error until it is set.
#[derive(Debug, Clone)]
pub struct Config {
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub openai_model: String,
    pub port: u16,
    pub rust_log: String,
    pub cors_allowed_origins: Vec<String>,
    pub request_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            openai_base_url: DEFAULT_BASE_URL.to_string(),
            openai_model: DEFAULT_MODEL.to_string(),
            port: 8000,
            rust_log: "info".to_string(),
            cors_allowed_origins: vec![DEFAULT_CORS_ORIGIN.to_string()],
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Config::default();

        Ok(Config {
            openai_api_key: var("OPENAI_API_KEY"),
            openai_base_url: var("OPENAI_BASE_URL").unwrap_or(defaults.openai_base_url),
            openai_model: var("OPENAI_MODEL").unwrap_or(defaults.openai_model),
            port: match var("PORT") {
                Some(port) => port
                    .trim()
                    .parse::<u16>()
                    .context("PORT must be a valid port number")?,
                None => defaults.port,
            },
            rust_log: var("RUST_LOG").unwrap_or(defaults.rust_log),
            cors_allowed_origins: match var("CORS_ALLOWED_ORIGINS") {
                Some(origins) => origins
                    .split(',')
                    .map(str::trim)
                    .filter(|o| !o.is_empty())
                    .map(str::to_string)
                    .collect(),
                None => defaults.cors_allowed_origins,
            },
            request_timeout: match var("REQUEST_TIMEOUT_SECS") {
                Some(secs) => Duration::from_secs(
                    secs.trim()
                        .parse::<u64>()
                        .context("REQUEST_TIMEOUT_SECS must be a whole number of seconds")?,
                ),
                None => defaults.request_timeout,
            },
        })
    }

    pub fn provider(&self) -> ProviderConfig {
        ProviderConfig {
            api_key: self.openai_api_key.clone(),
            base_url: self.openai_base_url.clone(),
            model: self.openai_model.clone(),
        }
    }

    pub fn pipeline(&self) -> PipelineConfig {
        PipelineConfig {
            request_timeout: self.request_timeout,
            ..PipelineConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_defaults_without_env() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.port, 8000);
        assert_eq!(config.openai_model, "gpt-4o-mini");
        assert_eq!(config.openai_api_key, None);
        assert_eq!(config.cors_allowed_origins, vec!["http://localhost:3000"]);
        assert_eq!(config.request_timeout, Duration::from_secs(120));
    }

    #[test]
    fn test_env_overrides() {
        let config = config_from(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("PORT", "9000"),
            ("CORS_ALLOWED_ORIGINS", "https://a.example, https://b.example ,"),
            ("REQUEST_TIMEOUT_SECS", "45"),
        ])
        .unwrap();
        assert_eq!(config.provider().api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.port, 9000);
        assert_eq!(
            config.cors_allowed_origins,
            vec!["https://a.example", "https://b.example"]
        );
        assert_eq!(config.pipeline().request_timeout, Duration::from_secs(45));
        assert_eq!(config.pipeline().retry.max_attempts, 3);
    }

    #[test]
    fn test_blank_api_key_counts_as_missing() {
        let config = config_from(&[("OPENAI_API_KEY", "  ")]).unwrap();
        assert!(config.openai_api_key.is_none());
    }

    #[test]
    fn test_invalid_port_is_an_error() {
        let err = config_from(&[("PORT", "eighty")]).unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }
}
