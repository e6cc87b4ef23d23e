use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use super::chain::build_provider_chain;
use super::env::Env;
use super::error::Result;
use super::provider::CredentialsProvider;
use crate::config::CredentialsConfig;

/// Interval after which the producer is expected to fetch credentials again
pub const REFRESH_THRESHOLD: Duration = Duration::from_secs(5 * 60);

/// Credentials in the shape the producer consumes
#[derive(Clone, PartialEq, Eq)]
pub struct ProducerCredentials {
    pub access_key: String,
    pub secret_key: String,
    pub session_token: Option<String>,
    /// Always fetch time plus [`REFRESH_THRESHOLD`]
    pub expiration: DateTime<Utc>,
}

impl fmt::Debug for ProducerCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProducerCredentials")
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .field(
                "session_token",
                &self.session_token.as_ref().map(|_| "<redacted>"),
            )
            .field("expiration", &self.expiration)
            .finish()
    }
}

/// Adapts a credentials provider to the producer's pull model
///
/// Nothing is cached: every fetch asks the provider again and stamps a fixed
/// refresh deadline, so the producer re-polls at a bounded interval whatever
/// lifetime the source reports.
#[derive(Clone)]
pub struct ProducerCredentialsProvider {
    provider: Arc<dyn CredentialsProvider>,
}

impl ProducerCredentialsProvider {
    /// Wrap `provider`, or the default chain over the process environment
    #[must_use]
    pub fn new(provider: Option<Arc<dyn CredentialsProvider>>) -> Self {
        Self::with_env(provider, &Env::process())
    }

    /// As [`ProducerCredentialsProvider::new`], building the default chain
    /// over `env`
    pub(crate) fn with_env(provider: Option<Arc<dyn CredentialsProvider>>, env: &Env) -> Self {
        let provider = provider.unwrap_or_else(|| {
            Arc::new(build_provider_chain(&CredentialsConfig::default(), env))
        });
        Self { provider }
    }

    /// Fetch current credentials; provider errors propagate unchanged
    pub async fn fetch(&self) -> Result<ProducerCredentials> {
        let creds = self.provider.credentials().await?;
        let refresh = chrono::Duration::seconds(
            i64::try_from(REFRESH_THRESHOLD.as_secs()).unwrap_or(i64::MAX),
        );

        Ok(ProducerCredentials {
            access_key: creds.access_key_id,
            secret_key: creds.secret_access_key,
            session_token: creds.session_token,
            expiration: Utc::now() + refresh,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::error::CredentialsError;
    use crate::credentials::provider::{Credentials, ProviderKind};
    use async_trait::async_trait;

    struct FixedProvider(Option<Credentials>);

    #[async_trait]
    impl CredentialsProvider for FixedProvider {
        fn kind(&self) -> ProviderKind {
            ProviderKind::Environment
        }

        async fn credentials(&self) -> Result<Credentials> {
            self.0
                .clone()
                .ok_or_else(|| CredentialsError::not_available("fixed", "no credentials"))
        }
    }

    #[tokio::test]
    async fn test_expiration_ignores_source_expiry() {
        // Source claims the credentials live for years
        let long_lived = Credentials::new("AKID", "secret", Some("token".to_string()))
            .with_expiry(Some(Utc::now() + chrono::Duration::days(3650)));
        let provider = ProducerCredentialsProvider::new(Some(Arc::new(FixedProvider(Some(long_lived)))));

        let before = Utc::now();
        let creds = provider.fetch().await.unwrap();
        let after = Utc::now();

        let threshold = chrono::Duration::seconds(300);
        assert!(creds.expiration >= before + threshold);
        assert!(creds.expiration <= after + threshold);
        assert_eq!(creds.access_key, "AKID");
        assert_eq!(creds.secret_key, "secret");
        assert_eq!(creds.session_token.as_deref(), Some("token"));
    }

    #[tokio::test]
    async fn test_provider_error_propagates() {
        let provider = ProducerCredentialsProvider::new(Some(Arc::new(FixedProvider(None))));
        let err = provider.fetch().await.unwrap_err();
        assert!(matches!(err, CredentialsError::NotAvailable { .. }));
    }

    #[tokio::test]
    async fn test_default_chain_used_without_provider() {
        let env = Env::from_pairs([
            ("AWS_ACCESS_KEY_ID", "AKIDDEFAULTCHAIN"),
            ("AWS_SECRET_ACCESS_KEY", "chain-secret"),
            ("AWS_SHARED_CREDENTIALS_FILE", "/nonexistent/credentials"),
            ("AWS_EC2_METADATA_DISABLED", "true"),
        ]);

        let provider = ProducerCredentialsProvider::with_env(None, &env);
        let creds = provider.fetch().await.unwrap();
        assert_eq!(creds.access_key, "AKIDDEFAULTCHAIN");
        assert_eq!(creds.secret_key, "chain-secret");
    }

    #[tokio::test]
    async fn test_default_chain_exhausted_without_sources() {
        let env = Env::from_pairs([
            ("AWS_SHARED_CREDENTIALS_FILE", "/nonexistent/credentials"),
            ("AWS_EC2_METADATA_DISABLED", "true"),
        ]);

        let err = ProducerCredentialsProvider::with_env(None, &env)
            .fetch()
            .await
            .unwrap_err();
        assert!(matches!(err, CredentialsError::ChainExhausted { .. }));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let creds = ProducerCredentials {
            access_key: "AKID".to_string(),
            secret_key: "hidden".to_string(),
            session_token: None,
            expiration: Utc::now(),
        };
        assert!(!format!("{creds:?}").contains("hidden"));
    }
}
