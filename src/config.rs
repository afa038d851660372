use dotenvy::dotenv;
use reqwest::Url;
use std::env;

use crate::error::ConfigError;

pub const DEFAULT_SEARCH_URL: &str = "https://api.tavily.com/search";

pub const API_KEY_VAR: &str = "API_KEY";
pub const SEARCH_URL_VAR: &str = "TAVILY_SEARCH_URL";

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub endpoint: Url,
}

impl Config {
    pub fn new(api_key: impl Into<String>, endpoint: &str) -> Result<Self, ConfigError> {
        Ok(Config {
            api_key: api_key.into(),
            endpoint: parse_endpoint(endpoint)?,
        })
    }

    /// Build the configuration from the process environment, loading `.env`
    /// first if one exists. A missing credential is only warned about: the
    /// positive scenarios will fail against the real API on their own.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok(); // Load .env file if present

        let api_key = env::var(API_KEY_VAR).unwrap_or_else(|_| {
            log::warn!("{API_KEY_VAR} is not set, requests will carry an empty bearer credential");
            String::new()
        });
        let endpoint = get_env_or_default(SEARCH_URL_VAR, DEFAULT_SEARCH_URL);

        Self::new(api_key, &endpoint)
    }

    pub fn with_endpoint(mut self, endpoint: &str) -> Result<Self, ConfigError> {
        self.endpoint = parse_endpoint(endpoint)?;
        Ok(self)
    }
}

fn parse_endpoint(url: &str) -> Result<Url, ConfigError> {
    let parsed = Url::parse(url).map_err(|e| ConfigError::InvalidEndpoint {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(ConfigError::InvalidEndpoint {
            url: url.to_string(),
            reason: format!("unsupported scheme {other}"),
        }),
    }
}

fn get_env_or_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}
