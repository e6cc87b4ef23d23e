// Container task-role credentials
//
// Orchestrated containers get credentials injected through an endpoint
// named by environment variables: either a path relative to the
// link-local container endpoint or a full URI plus an authorization token.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::error::{CredentialsError, Result};
use super::provider::{Credentials, CredentialsProvider, ProviderKind};

/// Link-local endpoint serving task-role credentials
pub const CONTAINER_CREDENTIALS_ENDPOINT: &str = "http://169.254.170.2";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

enum Endpoint {
    Relative { base: String, path: String },
    Full { uri: String, authorization_token: String },
}

/// Task-role credentials served to a container
pub struct ContainerProvider {
    endpoint: Endpoint,
    timeout: Duration,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ContainerCredentialsResponse {
    access_key_id: String,
    secret_access_key: String,
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    expiration: Option<DateTime<Utc>>,
}

impl ContainerProvider {
    /// Provider for a path relative to [`CONTAINER_CREDENTIALS_ENDPOINT`]
    pub fn relative(path: impl Into<String>) -> Self {
        Self {
            endpoint: Endpoint::Relative {
                base: CONTAINER_CREDENTIALS_ENDPOINT.to_string(),
                path: path.into(),
            },
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Provider for an absolute URI; an empty token sends no header
    pub fn full(uri: impl Into<String>, authorization_token: impl Into<String>) -> Self {
        Self {
            endpoint: Endpoint::Full {
                uri: uri.into(),
                authorization_token: authorization_token.into(),
            },
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Replace the link-local base for relative paths
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        if let Endpoint::Relative { base, .. } = &mut self.endpoint {
            *base = base_url.into();
        }
        self
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn url(&self) -> Result<Url> {
        let raw = match &self.endpoint {
            Endpoint::Relative { base, path } => {
                format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
            }
            Endpoint::Full { uri, .. } => uri.clone(),
        };
        Url::parse(&raw)
            .map_err(|e| CredentialsError::InvalidConfig(format!("container credentials URI: {e}")))
    }
}

#[async_trait]
impl CredentialsProvider for ContainerProvider {
    fn kind(&self) -> ProviderKind {
        match self.endpoint {
            Endpoint::Relative { .. } => ProviderKind::ContainerRelativeUri,
            Endpoint::Full { .. } => ProviderKind::ContainerFullUri,
        }
    }

    async fn credentials(&self) -> Result<Credentials> {
        let url = self.url()?;
        let client = reqwest::Client::builder().timeout(self.timeout).build()?;

        let mut request = client.get(url.clone());
        if let Endpoint::Full { authorization_token, .. } = &self.endpoint {
            if !authorization_token.is_empty() {
                request = request.header(reqwest::header::AUTHORIZATION, authorization_token);
            }
        }

        debug!(url = %url, "Requesting container credentials");
        let body: ContainerCredentialsResponse = request
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(Credentials::new(body.access_key_id, body.secret_access_key, body.token)
            .with_expiry(body.expiration))
    }
}
