// Credential provider trait
//
// Every credential source offers a single capability: produce credentials
// or report that it cannot.

use super::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of credential source, in the order the chain may contain them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// IoT role alias over mutual TLS
    IotRole,
    /// `AWS_ACCESS_KEY_ID` / `AWS_SECRET_ACCESS_KEY`
    Environment,
    /// Shared credentials file
    Profile,
    /// Container task role at a path relative to the container endpoint
    ContainerRelativeUri,
    /// Container task role at an absolute URI
    ContainerFullUri,
    /// Instance metadata service role
    InstanceMetadata,
}

impl ProviderKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::IotRole => "iot_role",
            Self::Environment => "environment",
            Self::Profile => "profile",
            Self::ContainerRelativeUri => "container_relative_uri",
            Self::ContainerFullUri => "container_full_uri",
            Self::InstanceMetadata => "instance_metadata",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Credentials as returned by a provider
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
    /// Expiry reported by the source, if any
    pub expires_at: Option<DateTime<Utc>>,
}

impl Credentials {
    pub fn new(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        session_token: Option<String>,
    ) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token: session_token.filter(|t| !t.is_empty()),
            expires_at: None,
        }
    }

    #[must_use]
    pub fn with_expiry(mut self, expires_at: Option<DateTime<Utc>>) -> Self {
        self.expires_at = expires_at;
        self
    }
}

// Secrets never reach logs
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field(
                "session_token",
                &self.session_token.as_ref().map(|_| "<redacted>"),
            )
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// A source of credentials
#[async_trait]
pub trait CredentialsProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    /// Produce credentials, or an error when this source is not usable
    async fn credentials(&self) -> Result<Credentials>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_secrets() {
        let creds = Credentials::new("AKIDEXAMPLE", "very-secret", Some("token-value".to_string()));
        let rendered = format!("{creds:?}");

        assert!(rendered.contains("AKIDEXAMPLE"));
        assert!(!rendered.contains("very-secret"));
        assert!(!rendered.contains("token-value"));
    }

    #[test]
    fn test_empty_session_token_is_none() {
        let creds = Credentials::new("AKID", "secret", Some(String::new()));
        assert_eq!(creds.session_token, None);
    }
}
