use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::stream::TopicType;

/// Worker threads used to serve inbound requests when no override is configured
pub const DEFAULT_SPINNER_THREAD_COUNT: usize = 2;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Region handed to the producer at initialization
    pub region: String,
    /// Whether the stream group is enabled on start
    pub enabled: bool,
    /// Override for the request worker pool size
    pub spinner_thread_count: Option<usize>,
    pub credentials: CredentialsConfig,
    pub streams: Vec<StreamConfig>,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            region: "us-west-2".to_string(),
            enabled: true,
            spinner_thread_count: None,
            credentials: CredentialsConfig::default(),
            streams: Vec::new(),
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:8089".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String, // "json" or "pretty"
    pub file_path: Option<String>,
    /// File holding filter directives, e.g. `kvstreamer_core=debug,info`
    pub directives_path: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            file_path: None,
            directives_path: None,
        }
    }
}

/// Credential candidate configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialsConfig {
    pub iot: IotRoleConfig,
}

/// Hardware-identity role (IoT role alias) candidate
///
/// The candidate only takes part in the chain when every field is set,
/// see [`IotRoleConfig::is_valid`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IotRoleConfig {
    pub cafile: String,
    pub certfile: String,
    pub keyfile: String,
    /// Credentials endpoint host, without scheme
    pub endpoint: String,
    /// Role alias name
    pub role: String,
    /// Thing name sent with every request
    pub thing_name: String,
    pub connect_timeout_ms: u64,
    pub total_timeout_ms: u64,
}

impl IotRoleConfig {
    /// All file paths and identifiers are set and both timeouts are positive
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.cafile.is_empty()
            && !self.certfile.is_empty()
            && !self.keyfile.is_empty()
            && !self.endpoint.is_empty()
            && !self.role.is_empty()
            && !self.thing_name.is_empty()
            && self.connect_timeout_ms > 0
            && self.total_timeout_ms > 0
    }
}

/// One outbound stream and the topic feeding it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamConfig {
    pub stream_name: String,
    pub topic_name: String,
    #[serde(default)]
    pub topic_type: TopicType,
}

impl Config {
    /// Load configuration from multiple sources with priority:
    /// 1. Environment variables (highest priority)
    /// 2. Config file (if provided)
    /// 3. Defaults (lowest priority)
    pub fn load(config_file: Option<&str>) -> Result<Self, ConfigError> {
        Self::load_with_env(config_file, None)
    }

    /// Like [`Config::load`], with `env` standing in for the process
    /// environment when given
    pub fn load_with_env(
        config_file: Option<&str>,
        env: Option<HashMap<String, String>>,
    ) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();

        if let Some(path) = config_file {
            if Path::new(path).exists() {
                builder = builder.add_source(File::with_name(path));
            }
        }

        // KVSTREAMER_REGION, KVSTREAMER_CREDENTIALS__IOT__ROLE, ...
        builder = builder.add_source(
            Environment::with_prefix("KVSTREAMER")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .source(env),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Load from file path
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        Self::load(Some(path))
    }

    /// Size of the request worker pool
    #[must_use]
    pub fn worker_threads(&self) -> usize {
        self.spinner_thread_count
            .unwrap_or(DEFAULT_SPINNER_THREAD_COUNT)
    }

    /// Check for misconfigurations, returning every problem found
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.region.is_empty() {
            errors.push("region must not be empty".to_string());
        }
        if self.spinner_thread_count == Some(0) {
            errors.push("spinner_thread_count must be at least 1".to_string());
        }

        let mut names = HashSet::new();
        let mut topics = HashSet::new();
        for (idx, stream) in self.streams.iter().enumerate() {
            if stream.stream_name.is_empty() {
                errors.push(format!("streams[{idx}].stream_name must not be empty"));
            } else if !names.insert(stream.stream_name.as_str()) {
                errors.push(format!(
                    "streams[{idx}].stream_name '{}' is configured more than once",
                    stream.stream_name
                ));
            }
            // Frame ingress addresses `/camera/front` and `camera/front` alike
            let topic = stream.topic_name.trim_start_matches('/');
            if topic.is_empty() {
                errors.push(format!("streams[{idx}].topic_name must not be empty"));
            } else if !topics.insert(topic) {
                errors.push(format!(
                    "streams[{idx}].topic_name '{}' is configured more than once",
                    stream.topic_name
                ));
            }
        }

        if !matches!(self.logging.format.as_str(), "json" | "pretty") {
            errors.push(format!(
                "logging.format must be 'json' or 'pretty', got '{}'",
                self.logging.format
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
