// Credential provider errors

/// Errors raised while resolving credentials
#[derive(Debug, thiserror::Error)]
pub enum CredentialsError {
    #[error("{provider} credentials not available: {reason}")]
    NotAvailable {
        provider: &'static str,
        reason: String,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Credentials endpoint returned {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("No provider in the chain returned credentials (tried: {})", tried.join(", "))]
    ChainExhausted { tried: Vec<&'static str> },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl CredentialsError {
    pub(crate) fn not_available(provider: &'static str, reason: impl Into<String>) -> Self {
        Self::NotAvailable {
            provider,
            reason: reason.into(),
        }
    }
}

impl From<reqwest::Error> for CredentialsError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => Self::ApiError {
                status: status.as_u16(),
                message: err.to_string(),
            },
            None if err.is_decode() => Self::ParseError(err.to_string()),
            None => Self::NetworkError(err.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, CredentialsError>;
