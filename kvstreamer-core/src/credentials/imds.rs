// Instance metadata service role credentials (IMDSv2 with v1 fallback)

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::error::{CredentialsError, Result};
use super::provider::{Credentials, CredentialsProvider, ProviderKind};

/// Link-local instance metadata endpoint
pub const INSTANCE_METADATA_ENDPOINT: &str = "http://169.254.169.254";

const TOKEN_PATH: &str = "/latest/api/token";
const SECURITY_CREDENTIALS_PATH: &str = "/latest/meta-data/iam/security-credentials/";
const TOKEN_TTL_HEADER: &str = "x-aws-ec2-metadata-token-ttl-seconds";
const TOKEN_HEADER: &str = "x-aws-ec2-metadata-token";
const TOKEN_TTL_SECONDS: &str = "21600";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

/// Role credentials from the instance metadata service
#[derive(Debug, Clone)]
pub struct InstanceMetadataProvider {
    endpoint: String,
    timeout: Duration,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct MetadataCredentialsResponse {
    #[serde(default)]
    code: Option<String>,
    access_key_id: String,
    secret_access_key: String,
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    expiration: Option<DateTime<Utc>>,
}

impl Default for InstanceMetadataProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl InstanceMetadataProvider {
    #[must_use]
    pub fn new() -> Self {
        Self {
            endpoint: INSTANCE_METADATA_ENDPOINT.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.endpoint.trim_end_matches('/'), path)
    }

    /// Session token for IMDSv2; `None` falls back to unauthenticated v1 requests
    async fn session_token(&self, client: &reqwest::Client) -> Option<String> {
        let response = client
            .put(self.url(TOKEN_PATH))
            .header(TOKEN_TTL_HEADER, TOKEN_TTL_SECONDS)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status);

        match response {
            Ok(response) => response.text().await.ok().filter(|t| !t.is_empty()),
            Err(e) => {
                debug!(error = %e, "IMDSv2 token request failed, falling back to IMDSv1");
                None
            }
        }
    }

    async fn get_text(
        &self,
        client: &reqwest::Client,
        path: &str,
        token: Option<&str>,
    ) -> Result<String> {
        let mut request = client.get(self.url(path));
        if let Some(token) = token {
            request = request.header(TOKEN_HEADER, token);
        }
        Ok(request.send().await?.error_for_status()?.text().await?)
    }
}

#[async_trait]
impl CredentialsProvider for InstanceMetadataProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::InstanceMetadata
    }

    async fn credentials(&self) -> Result<Credentials> {
        let client = reqwest::Client::builder().timeout(self.timeout).build()?;
        let token = self.session_token(&client).await;

        let roles = self
            .get_text(&client, SECURITY_CREDENTIALS_PATH, token.as_deref())
            .await?;
        let role = roles
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .ok_or_else(|| {
                CredentialsError::not_available("instance_metadata", "no role attached to instance")
            })?;

        debug!(role, "Requesting instance role credentials");
        let body = self
            .get_text(
                &client,
                &format!("{SECURITY_CREDENTIALS_PATH}{role}"),
                token.as_deref(),
            )
            .await?;
        let response: MetadataCredentialsResponse = serde_json::from_str(&body)?;

        if let Some(code) = response.code.as_deref().filter(|c| *c != "Success") {
            return Err(CredentialsError::not_available(
                "instance_metadata",
                format!("metadata service returned code {code}"),
            ));
        }

        Ok(Credentials::new(
            response.access_key_id,
            response.secret_access_key,
            response.token,
        )
        .with_expiry(response.expiration))
    }
}
