use mr_decorator::ProviderConfig;
use thiserror::Error;

/// Boot-time configuration problems.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnv(&'static str),
}

/// Server configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Listen address, e.g. "0.0.0.0:8080".
    pub api_address: String,
    /// Token for GitLab API ("PRIVATE-TOKEN" PAT or project access token).
    pub gitlab_token: String,
    /// Public root of the analysis dashboard; status links point there.
    pub public_root_url: String,
    /// Shared secret to protect the trigger endpoint from random callers.
    pub trigger_secret: String,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let require = |key: &'static str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::MissingEnv(key))
        };
        Ok(Self {
            api_address: require("API_ADDRESS")?,
            gitlab_token: require("GITLAB_TOKEN")?,
            public_root_url: require("PUBLIC_ROOT_URL")?,
            trigger_secret: require("TRIGGER_SECRET")?,
        })
    }

    /// Provider settings handed to every decoration pass.
    pub fn provider_config(&self) -> ProviderConfig {
        ProviderConfig {
            token: self.gitlab_token.clone(),
            public_root_url: self.public_root_url.clone(),
        }
    }
}

/// Shared state for all HTTP handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: AppConfig,
}
