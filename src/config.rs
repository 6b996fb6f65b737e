use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

use crate::search::SERPAPI_URL;
use crate::transport::GROQ_API_URL;

const PLACEHOLDER_GROQ_API_KEY: &str = "PLACEHOLDER_GROQ_API_KEY";
const PLACEHOLDER_SERPAPI_KEY: &str = "PLACEHOLDER_SERPAPI_KEY";

/// Main configuration structure for the query router
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub persona: PersonaConfig,
    pub groq: GroqConfig,
    pub search: SearchConfig,
    pub transcript: TranscriptConfig,
    pub retry: RetryConfig,
    pub classifier: ClassifierConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind: String,
}

/// Names woven into the persona prompts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonaConfig {
    pub username: String,
    pub assistant_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroqConfig {
    pub api_key: String,
    pub base_url: String,
    pub chat_model: String,
    pub realtime_model: String,
    pub intent_model: String,
    pub temperature: f32,
    pub top_p: f32,
    pub chat_max_tokens: i32,
    pub realtime_max_tokens: i32,
    pub intent_max_tokens: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    pub api_key: String,
    pub base_url: String,
    pub num_results: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptConfig {
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    pub rate_limit_backoff_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Classification calls allowed before falling back to `unknown`
    pub max_attempts: u32,
    pub temperature: f32,
}

impl Config {
    /// Load configuration from file with environment variable overrides
    /// ALWAYS returns a valid config - never fails
    pub fn load() -> Self {
        let env_paths = ["../.env", ".env"];

        let mut env_loaded = false;
        for path in &env_paths {
            if dotenvy::from_path(path).is_ok() {
                tracing::info!("Loaded .env from: {}", path);
                env_loaded = true;
                break;
            }
        }

        if !env_loaded {
            tracing::warn!("No .env file found - continuing with env vars only");
        }

        let config_path =
            env::var("ROUTER_CONFIG_PATH").unwrap_or_else(|_| "config.yaml".to_string());

        let mut config = if Path::new(&config_path).exists() {
            match fs::read_to_string(&config_path) {
                Ok(contents) => match serde_yaml::from_str::<Config>(&contents) {
                    Ok(config) => {
                        tracing::info!("Loaded configuration from {}", config_path);
                        config
                    }
                    Err(e) => {
                        tracing::error!(
                            "Failed to parse config file {}: {} - using defaults",
                            config_path,
                            e
                        );
                        Self::default()
                    }
                },
                Err(e) => {
                    tracing::error!(
                        "Failed to read config file {}: {} - using defaults",
                        config_path,
                        e
                    );
                    Self::default()
                }
            }
        } else {
            tracing::info!("Config file not found at {} - using defaults", config_path);
            Self::default()
        };

        config.apply_env_overrides();

        if let Err(e) = config.validate() {
            tracing::warn!("Config validation warnings: {} - continuing anyway", e);
        }

        config
    }

    /// First set variable wins; the CamelCase names are the legacy `.env` keys
    fn env_any(keys: &[&str]) -> Option<String> {
        keys.iter()
            .find_map(|k| env::var(k).ok())
            .filter(|v| !v.trim().is_empty())
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        if let Some(bind) = Self::env_any(&["ROUTER_HTTP_BIND"]) {
            self.server.bind = bind;
        }

        // Persona overrides
        if let Some(username) = Self::env_any(&["ROUTER_USERNAME", "Username"]) {
            self.persona.username = username;
        }
        if let Some(name) = Self::env_any(&["ROUTER_ASSISTANT_NAME", "Assistantname"]) {
            self.persona.assistant_name = name;
        }

        // Groq overrides
        if let Some(api_key) = Self::env_any(&["GROQ_API_KEY", "GroqAPIKey"]) {
            self.groq.api_key = api_key;
        }
        if let Some(url) = Self::env_any(&["GROQ_BASE_URL"]) {
            self.groq.base_url = url;
        }
        if let Some(model) = Self::env_any(&["GROQ_CHAT_MODEL"]) {
            self.groq.chat_model = model;
        }
        if let Some(model) = Self::env_any(&["GROQ_REALTIME_MODEL"]) {
            self.groq.realtime_model = model;
        }
        if let Some(model) = Self::env_any(&["GROQ_INTENT_MODEL"]) {
            self.groq.intent_model = model;
        }

        // Search overrides
        if let Some(api_key) = Self::env_any(&["SERPAPI_API_KEY", "SerpAPIKey"]) {
            self.search.api_key = api_key;
        }

        if let Some(path) = Self::env_any(&["ROUTER_TRANSCRIPT_PATH"]) {
            self.transcript.path = path;
        }

        // Retry overrides
        if let Some(secs) = Self::env_any(&["ROUTER_RATE_LIMIT_BACKOFF_SECS"]) {
            if let Ok(secs) = secs.parse() {
                self.retry.rate_limit_backoff_secs = secs;
            }
        }
        if let Some(attempts) = Self::env_any(&["ROUTER_RETRY_MAX_ATTEMPTS"]) {
            if let Ok(attempts) = attempts.parse() {
                self.retry.max_attempts = attempts;
            }
        }
        if let Some(attempts) = Self::env_any(&["ROUTER_CLASSIFIER_MAX_ATTEMPTS"]) {
            if let Ok(attempts) = attempts.parse() {
                self.classifier.max_attempts = attempts;
            }
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), Box<dyn std::error::Error>> {
        if self.groq.api_key == PLACEHOLDER_GROQ_API_KEY || self.groq.api_key.is_empty() {
            return Err("GROQ_API_KEY environment variable must be set".into());
        }
        if self.search.api_key == PLACEHOLDER_SERPAPI_KEY || self.search.api_key.is_empty() {
            return Err("SERPAPI_API_KEY environment variable must be set".into());
        }
        if self.retry.max_attempts == 0 {
            return Err("retry.max_attempts cannot be 0".into());
        }
        if self.classifier.max_attempts == 0 {
            return Err("classifier.max_attempts cannot be 0".into());
        }
        if self.search.num_results == 0 {
            return Err("search.num_results cannot be 0".into());
        }
        if !(0.0..=2.0).contains(&self.groq.temperature) {
            return Err("groq.temperature must be between 0.0 and 2.0".into());
        }
        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8000".to_string(),
        }
    }
}

impl Default for PersonaConfig {
    fn default() -> Self {
        Self {
            username: "User".to_string(),
            assistant_name: "Tinsi".to_string(),
        }
    }
}

impl Default for GroqConfig {
    fn default() -> Self {
        Self {
            api_key: PLACEHOLDER_GROQ_API_KEY.to_string(),
            base_url: GROQ_API_URL.to_string(),
            chat_model: "llama3-70b-8192".to_string(),
            realtime_model: "llama3-70b-8192".to_string(),
            intent_model: "llama3-8b-8192".to_string(),
            temperature: 0.7,
            top_p: 1.0,
            chat_max_tokens: 1024,
            realtime_max_tokens: 2048,
            intent_max_tokens: 256,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_key: PLACEHOLDER_SERPAPI_KEY.to_string(),
            base_url: SERPAPI_URL.to_string(),
            num_results: 5,
        }
    }
}

impl Default for TranscriptConfig {
    fn default() -> Self {
        Self {
            path: "Data/ChatLog.json".to_string(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            rate_limit_backoff_secs: 45,
        }
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            temperature: 0.7,
        }
    }
}
