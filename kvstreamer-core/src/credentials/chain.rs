// Credential provider chain
//
// Candidates are appended in a fixed priority order. The chain evaluator
// tries them in that order and the first provider returning credentials wins.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::container::ContainerProvider;
use super::env::Env;
use super::environment::EnvironmentProvider;
use super::error::{CredentialsError, Result};
use super::imds::InstanceMetadataProvider;
use super::iot::IotRoleProvider;
use super::profile::ProfileFileProvider;
use super::provider::{Credentials, CredentialsProvider, ProviderKind};
use crate::config::CredentialsConfig;

pub const CONTAINER_CREDENTIALS_RELATIVE_URI: &str = "AWS_CONTAINER_CREDENTIALS_RELATIVE_URI";
pub const CONTAINER_CREDENTIALS_FULL_URI: &str = "AWS_CONTAINER_CREDENTIALS_FULL_URI";
pub const CONTAINER_AUTHORIZATION_TOKEN: &str = "AWS_CONTAINER_AUTHORIZATION_TOKEN";
pub const EC2_METADATA_DISABLED: &str = "AWS_EC2_METADATA_DISABLED";

/// Environment signals selecting the dynamic provider
#[derive(Default, Clone)]
pub struct EnvironmentSignals {
    pub relative_uri: String,
    pub full_uri: String,
    pub authorization_token: String,
    pub metadata_disabled: String,
}

impl EnvironmentSignals {
    #[must_use]
    pub fn from_env(env: &Env) -> Self {
        Self {
            relative_uri: env.var(CONTAINER_CREDENTIALS_RELATIVE_URI).unwrap_or_default(),
            full_uri: env.var(CONTAINER_CREDENTIALS_FULL_URI).unwrap_or_default(),
            authorization_token: env.var(CONTAINER_AUTHORIZATION_TOKEN).unwrap_or_default(),
            metadata_disabled: env.var(EC2_METADATA_DISABLED).unwrap_or_default(),
        }
    }

    fn metadata_disabled(&self) -> bool {
        self.metadata_disabled.eq_ignore_ascii_case("true")
    }
}

/// Ordered list of providers; the first one yielding credentials wins
#[derive(Default, Clone)]
pub struct ProviderChain {
    providers: Vec<Arc<dyn CredentialsProvider>>,
}

impl ProviderChain {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_provider(&mut self, provider: Arc<dyn CredentialsProvider>) {
        self.providers.push(provider);
    }

    /// Provider kinds in evaluation order
    #[must_use]
    pub fn kinds(&self) -> Vec<ProviderKind> {
        self.providers.iter().map(|p| p.kind()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

#[async_trait]
impl CredentialsProvider for ProviderChain {
    fn kind(&self) -> ProviderKind {
        self.providers
            .first()
            .map_or(ProviderKind::Environment, |p| p.kind())
    }

    async fn credentials(&self) -> Result<Credentials> {
        let mut tried = Vec::with_capacity(self.providers.len());
        for provider in &self.providers {
            let kind = provider.kind();
            match provider.credentials().await {
                Ok(creds) => {
                    debug!(provider = %kind, "Resolved credentials");
                    return Ok(creds);
                }
                Err(e @ (CredentialsError::ParseError(_) | CredentialsError::InvalidConfig(_))) => {
                    warn!(provider = %kind, error = %e, "Provider is misconfigured, skipping");
                    tried.push(kind.as_str());
                }
                Err(e) => {
                    debug!(provider = %kind, error = %e, "Provider did not return credentials");
                    tried.push(kind.as_str());
                }
            }
        }
        Err(CredentialsError::ChainExhausted { tried })
    }
}

/// Build the provider chain for `config` and the environment signals in `env`
///
/// Order:
/// 1. IoT role, only when its config is fully specified
/// 2. environment variables
/// 3. shared credentials profile
/// 4. at most one of: container relative URI, container full URI, instance
///    metadata (unless `AWS_EC2_METADATA_DISABLED` is `true`)
#[must_use]
pub fn build_provider_chain(config: &CredentialsConfig, env: &Env) -> ProviderChain {
    let mut chain = ProviderChain::new();

    match IotRoleProvider::new(config.iot.clone()) {
        Ok(provider) => {
            info!("Found valid IoT auth config, adding IoT role credentials provider");
            chain.add_provider(Arc::new(provider));
        }
        Err(_) => info!("No valid IoT auth config, skipping IoT role credentials provider"),
    }

    chain.add_provider(Arc::new(EnvironmentProvider::new(env.clone())));
    chain.add_provider(Arc::new(ProfileFileProvider::from_env(env)));

    let signals = EnvironmentSignals::from_env(env);
    debug!(
        relative_uri = %signals.relative_uri,
        full_uri = %signals.full_uri,
        metadata_disabled = %signals.metadata_disabled,
        "Container and metadata environment signals"
    );

    if !signals.relative_uri.is_empty() {
        chain.add_provider(Arc::new(ContainerProvider::relative(signals.relative_uri.clone())));
        info!(
            relative_uri = %signals.relative_uri,
            "Added container credentials provider with relative path to the provider chain"
        );
    } else if !signals.full_uri.is_empty() {
        let token_state = if signals.authorization_token.is_empty() {
            "empty"
        } else {
            "non-empty"
        };
        chain.add_provider(Arc::new(ContainerProvider::full(
            signals.full_uri.clone(),
            signals.authorization_token.clone(),
        )));
        // The token itself is a bearer secret and is never logged
        info!(
            full_uri = %signals.full_uri,
            authorization_token = token_state,
            "Added container credentials provider with full URI to the provider chain"
        );
    } else if !signals.metadata_disabled() {
        chain.add_provider(Arc::new(InstanceMetadataProvider::new()));
        info!("Added instance metadata credentials provider to the provider chain");
    } else {
        warn!("Instance metadata disabled and no container credentials configured");
    }

    chain
}
