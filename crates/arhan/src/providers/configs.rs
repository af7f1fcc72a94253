use anyhow::{anyhow, Result};
use std::env;

pub const OPENROUTER_HOST: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_TOKENS: i32 = 4096;

pub struct OpenRouterProviderConfig {
    pub host: String,
    pub api_key: String,
    /// Sent as `HTTP-Referer`, which OpenRouter uses to attribute traffic
    pub app_url: String,
    /// Sent as `X-Title`
    pub app_name: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<i32>,
}

impl OpenRouterProviderConfig {
    pub fn new(api_key: String) -> Self {
        Self {
            host: OPENROUTER_HOST.to_string(),
            api_key,
            app_url: "http://localhost".to_string(),
            app_name: "Arhan CLI".to_string(),
            temperature: Some(DEFAULT_TEMPERATURE),
            max_tokens: Some(DEFAULT_MAX_TOKENS),
        }
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let api_key = get_env("OPENROUTER_API_KEY", true, None)?
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| anyhow!("OPENROUTER_API_KEY environment variable is required"))?;

        let mut config = Self::new(api_key);
        if let Some(host) = get_env("OPENROUTER_HOST", false, None)? {
            config.host = host;
        }
        if let Some(app_url) = get_env("APP_URL", false, None)? {
            config.app_url = app_url;
        }
        if let Some(app_name) = get_env("APP_NAME", false, None)? {
            config.app_name = app_name;
        }
        Ok(config)
    }
}

/// Helper function to get environment variables with error handling
fn get_env(key: &str, required: bool, default: Option<String>) -> Result<Option<String>> {
    match env::var(key) {
        Ok(value) => Ok(Some(value)),
        Err(env::VarError::NotPresent) if !required => Ok(default),
        Err(env::VarError::NotPresent) => Err(anyhow!(
            "Environment variable '{}' is required but not set.",
            key
        )),
        Err(e) => Err(e.into()),
    }
}
