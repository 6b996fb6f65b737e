use thiserror::Error;

/// Errors raised anywhere in the routing pipeline
#[derive(Error, Debug)]
pub enum RouterError {
    #[error("Upstream rate limit hit: {body}")]
    RateLimited { body: String },

    #[error("Upstream returned {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Transcript error: {0}")]
    Transcript(String),

    #[error("Search error: {0}")]
    Search(String),

    #[error("Validation error on {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl RouterError {
    /// Whether the completion service asked us to slow down (HTTP 429)
    pub fn is_rate_limited(&self) -> bool {
        match self {
            Self::RateLimited { .. } => true,
            Self::Upstream { status, .. } => *status == 429,
            Self::Http(e) => e.status().is_some_and(|s| s.as_u16() == 429),
            _ => false,
        }
    }

    pub fn is_transcript(&self) -> bool {
        matches!(self, Self::Transcript(_))
    }

    pub fn empty_query() -> Self {
        Self::Validation {
            field: "query".to_string(),
            reason: "Query cannot be empty.".to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RouterError>;
