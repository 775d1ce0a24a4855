use std::collections::HashMap;
use std::env;
use thiserror::Error;

/// Service configuration loaded from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_address: String,
    /// Base URL of the media backend's REST API.
    pub media_backend_url: String,
    /// Shared secret used to authenticate against the media backend.
    pub media_backend_secret: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing)
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let bind_address = vars
            .get("BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| "0.0.0.0:8083".to_string());

        let media_backend_url = vars
            .get("MEDIA_BACKEND_URL")
            .ok_or_else(|| ConfigError::MissingEnvVar("MEDIA_BACKEND_URL".to_string()))?
            .trim_end_matches('/')
            .to_string();

        let media_backend_secret = vars
            .get("MEDIA_BACKEND_SECRET")
            .ok_or_else(|| ConfigError::MissingEnvVar("MEDIA_BACKEND_SECRET".to_string()))?
            .clone();

        Ok(Config {
            bind_address,
            media_backend_url,
            media_backend_secret,
        })
    }
}
