//! Configuration loading

use anyhow::Result;
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

use crate::Config;

/// Load configuration from config file or environment variables
///
/// Config file search order:
/// 1. `explicit` (the `--config` flag)
/// 2. KVSTREAMER_CONFIG_PATH environment variable
/// 3. ./config.yaml (current working directory)
/// 4. /etc/kvstreamer/config.yaml
/// 5. Fall back to environment variables only
pub fn load_config(explicit: Option<&str>) -> Result<Config> {
    let config_path = explicit
        .map(str::to_string)
        .or_else(|| {
            std::env::var("KVSTREAMER_CONFIG_PATH")
                .ok()
                .filter(|p| Path::new(p).exists())
        })
        .or_else(|| {
            ["config.yaml", "/etc/kvstreamer/config.yaml"]
                .into_iter()
                .find(|p| Path::new(p).exists())
                .map(str::to_string)
        });

    build_config(config_path.as_deref(), None)
}

/// Load and validate; `env` replaces the process environment when given
fn build_config(config_path: Option<&str>, env: Option<HashMap<String, String>>) -> Result<Config> {
    let config = if let Some(path) = config_path {
        if !Path::new(path).exists() {
            return Err(anyhow::anyhow!("Config file not found: {path}"));
        }
        eprintln!("Loading config from {path}");
        Config::load_with_env(Some(path), env)
            .map_err(|e| anyhow::anyhow!("Failed to load {path}: {e}"))?
    } else {
        eprintln!("No config file found, using environment variables");
        Config::load_with_env(None, env)
            .map_err(|e| anyhow::anyhow!("Failed to load config from environment: {e}"))?
    };

    // Fail fast on misconfigurations
    if let Err(errors) = config.validate() {
        for error in &errors {
            eprintln!("Config validation error: {error}");
        }
        return Err(anyhow::anyhow!(
            "Configuration validation failed with {} error(s): {}",
            errors.len(),
            errors.join("; ")
        ));
    }

    info!(
        region = %config.region,
        streams = config.streams.len(),
        "Configuration loaded and validated"
    );

    Ok(config)
}
