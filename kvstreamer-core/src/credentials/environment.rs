use async_trait::async_trait;

use super::env::Env;
use super::error::{CredentialsError, Result};
use super::provider::{Credentials, CredentialsProvider, ProviderKind};

const ACCESS_KEY_ID: &str = "AWS_ACCESS_KEY_ID";
const ACCESS_KEY_ID_ALT: &str = "AWS_ACCESS_KEY";
const SECRET_ACCESS_KEY: &str = "AWS_SECRET_ACCESS_KEY";
const SECRET_ACCESS_KEY_ALT: &str = "AWS_SECRET_KEY";
const SESSION_TOKEN: &str = "AWS_SESSION_TOKEN";

/// Static credentials from environment variables
#[derive(Clone, Default)]
pub struct EnvironmentProvider {
    env: Env,
}

impl EnvironmentProvider {
    #[must_use]
    pub fn new(env: Env) -> Self {
        Self { env }
    }
}

#[async_trait]
impl CredentialsProvider for EnvironmentProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Environment
    }

    async fn credentials(&self) -> Result<Credentials> {
        let access_key_id = self
            .env
            .non_empty(ACCESS_KEY_ID)
            .or_else(|| self.env.non_empty(ACCESS_KEY_ID_ALT))
            .ok_or_else(|| {
                CredentialsError::not_available("environment", format!("{ACCESS_KEY_ID} is not set"))
            })?;
        let secret_access_key = self
            .env
            .non_empty(SECRET_ACCESS_KEY)
            .or_else(|| self.env.non_empty(SECRET_ACCESS_KEY_ALT))
            .ok_or_else(|| {
                CredentialsError::not_available(
                    "environment",
                    format!("{SECRET_ACCESS_KEY} is not set"),
                )
            })?;

        Ok(Credentials::new(
            access_key_id,
            secret_access_key,
            self.env.non_empty(SESSION_TOKEN),
        ))
    }
}
