// IoT role alias credentials
//
// The device authenticates with its X.509 certificate over mutual TLS and
// exchanges a role alias for temporary credentials.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::error::{CredentialsError, Result};
use super::provider::{Credentials, CredentialsProvider, ProviderKind};
use crate::config::IotRoleConfig;

const THING_NAME_HEADER: &str = "x-amzn-iot-thingname";

/// Temporary credentials for an IoT role alias
pub struct IotRoleProvider {
    config: IotRoleConfig,
}

#[derive(Deserialize)]
struct IotCredentialsResponse {
    credentials: IotCredentials,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct IotCredentials {
    access_key_id: String,
    secret_access_key: String,
    #[serde(default)]
    session_token: Option<String>,
    #[serde(default)]
    expiration: Option<DateTime<Utc>>,
}

impl IotRoleProvider {
    /// Build a provider for a fully specified config
    pub fn new(config: IotRoleConfig) -> Result<Self> {
        if !config.is_valid() {
            return Err(CredentialsError::InvalidConfig(
                "IoT role config requires cafile, certfile, keyfile, endpoint, role, thing_name and positive timeouts"
                    .to_string(),
            ));
        }
        Ok(Self { config })
    }

    fn credentials_url(&self) -> String {
        format!(
            "https://{}/role-aliases/{}/credentials",
            self.config.endpoint, self.config.role
        )
    }

    async fn client(&self) -> Result<reqwest::Client> {
        let ca = tokio::fs::read(&self.config.cafile).await?;
        let mut identity_pem = tokio::fs::read(&self.config.certfile).await?;
        identity_pem.push(b'\n');
        identity_pem.extend(tokio::fs::read(&self.config.keyfile).await?);

        let ca = reqwest::Certificate::from_pem(&ca)
            .map_err(|e| CredentialsError::InvalidConfig(format!("CA file {}: {e}", self.config.cafile)))?;
        let identity = reqwest::Identity::from_pem(&identity_pem)
            .map_err(|e| CredentialsError::InvalidConfig(format!("client certificate/key: {e}")))?;

        Ok(reqwest::Client::builder()
            .add_root_certificate(ca)
            .identity(identity)
            .connect_timeout(Duration::from_millis(self.config.connect_timeout_ms))
            .timeout(Duration::from_millis(self.config.total_timeout_ms))
            .build()?)
    }
}

fn parse_response(body: &str) -> Result<Credentials> {
    let response: IotCredentialsResponse = serde_json::from_str(body)?;
    let creds = response.credentials;
    Ok(Credentials::new(creds.access_key_id, creds.secret_access_key, creds.session_token)
        .with_expiry(creds.expiration))
}

#[async_trait]
impl CredentialsProvider for IotRoleProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::IotRole
    }

    async fn credentials(&self) -> Result<Credentials> {
        let client = self.client().await?;
        let url = self.credentials_url();

        debug!(url = %url, thing_name = %self.config.thing_name, "Requesting IoT role credentials");
        let body = client
            .get(&url)
            .header(THING_NAME_HEADER, &self.config.thing_name)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        parse_response(&body)
    }
}
