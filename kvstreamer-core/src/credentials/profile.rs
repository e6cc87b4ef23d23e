use async_trait::async_trait;
use ini::{Ini, ParseOption, Properties};
use std::path::PathBuf;
use tracing::debug;

use super::env::Env;
use super::error::{CredentialsError, Result};
use super::provider::{Credentials, CredentialsProvider, ProviderKind};

const SHARED_CREDENTIALS_FILE: &str = "AWS_SHARED_CREDENTIALS_FILE";
const PROFILE: &str = "AWS_PROFILE";
const DEFAULT_PROFILE: &str = "default";

/// Static credentials from a profile in the shared credentials file
#[derive(Debug, Clone)]
pub struct ProfileFileProvider {
    path: Option<PathBuf>,
    profile: String,
}

impl ProfileFileProvider {
    /// Locate the credentials file and profile from the environment
    #[must_use]
    pub fn from_env(env: &Env) -> Self {
        let path = env
            .non_empty(SHARED_CREDENTIALS_FILE)
            .map(PathBuf::from)
            .or_else(|| {
                env.non_empty("HOME")
                    .or_else(|| env.non_empty("USERPROFILE"))
                    .map(|home| PathBuf::from(home).join(".aws").join("credentials"))
            });
        let profile = env
            .non_empty(PROFILE)
            .unwrap_or_else(|| DEFAULT_PROFILE.to_string());
        Self { path, profile }
    }

    pub fn new(path: impl Into<PathBuf>, profile: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            profile: profile.into(),
        }
    }

    fn parse(&self, content: &str) -> Result<Credentials> {
        // Section names are taken literally; `[robot.prod]` is one profile
        let options = ParseOption {
            enabled_quote: false,
            enabled_escape: false,
            ..ParseOption::default()
        };
        let profiles = Ini::load_from_str_opt(content, options)
            .map_err(|e| CredentialsError::ParseError(format!("credentials file: {e}")))?;

        let section = find_section(&profiles, &self.profile).ok_or_else(|| {
            CredentialsError::not_available("profile", format!("profile '{}' not found", self.profile))
        })?;

        let field = |key: &str| {
            find_value(section, key)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };
        let access_key_id = field("aws_access_key_id").ok_or_else(|| {
            CredentialsError::not_available(
                "profile",
                format!("profile '{}' has no aws_access_key_id", self.profile),
            )
        })?;
        let secret_access_key = field("aws_secret_access_key").ok_or_else(|| {
            CredentialsError::not_available(
                "profile",
                format!("profile '{}' has no aws_secret_access_key", self.profile),
            )
        })?;

        Ok(Credentials::new(
            access_key_id,
            secret_access_key,
            field("aws_session_token"),
        ))
    }
}

/// Exact section match first, then case-insensitive
fn find_section<'a>(profiles: &'a Ini, name: &str) -> Option<&'a Properties> {
    profiles.section(Some(name)).or_else(|| {
        profiles
            .iter()
            .find(|(section, _)| section.is_some_and(|s| s.eq_ignore_ascii_case(name)))
            .map(|(_, props)| props)
    })
}

fn find_value<'a>(props: &'a Properties, key: &str) -> Option<&'a str> {
    props.get(key).or_else(|| {
        props
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v)
    })
}

#[async_trait]
impl CredentialsProvider for ProfileFileProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Profile
    }

    async fn credentials(&self) -> Result<Credentials> {
        let path = self.path.as_ref().ok_or_else(|| {
            CredentialsError::not_available("profile", "no credentials file location")
        })?;

        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(CredentialsError::not_available(
                    "profile",
                    format!("{} does not exist", path.display()),
                ));
            }
            Err(e) => return Err(e.into()),
        };

        debug!(path = %path.display(), profile = %self.profile, "Reading shared credentials file");
        self.parse(&content)
    }
}
