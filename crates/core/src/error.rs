use thiserror::Error;

#[derive(Error, Debug)]
pub enum KonspektError {
    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error("Transcript not available for {url}")]
    NotAvailable { url: String },

    #[error("{service} unavailable: {reason}")]
    UpstreamUnavailable {
        service: &'static str,
        reason: String,
    },

    #[error("Rate limited, gave up after {attempts} attempts")]
    RateLimited { attempts: u32 },

    #[error("Model returned malformed output: {reason}")]
    OracleRejected { reason: String },

    #[error("Missing API key: {env_var} environment variable is not set")]
    MissingApiKey { env_var: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, KonspektError>;
