use anyhow::Context;
use std::fs::OpenOptions;
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::{
    fmt::{self, writer::BoxMakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

use crate::config::LoggingConfig;

/// Install the global subscriber described by `config`
///
/// Output is JSON lines or pretty text, to stdout or appended to
/// `file_path`.
pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let filter = build_filter(config, std::env::var("RUST_LOG").ok())?;
    let writer = make_writer(config.file_path.as_deref())?;

    let layer = fmt::layer().with_writer(writer).with_target(true);
    let layer = if config.format == "json" {
        layer.json().with_current_span(false).boxed()
    } else {
        layer.pretty().with_ansi(config.file_path.is_none()).boxed()
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init()
        .context("a global tracing subscriber is already installed")?;
    Ok(())
}

/// Filter precedence: `rust_log`, then the directives file, then `level`
fn build_filter(config: &LoggingConfig, rust_log: Option<String>) -> anyhow::Result<EnvFilter> {
    let level = parse_log_level(&config.level)?;

    if let Some(directives) = rust_log.filter(|d| !d.trim().is_empty()) {
        return EnvFilter::try_new(&directives)
            .with_context(|| format!("Invalid RUST_LOG directives: {directives}"));
    }
    if let Some(directives) = load_directives(config)? {
        return EnvFilter::try_new(&directives)
            .with_context(|| format!("Invalid log directives: {directives}"));
    }
    Ok(EnvFilter::new(level.to_string()))
}

fn make_writer(file_path: Option<&str>) -> anyhow::Result<BoxMakeWriter> {
    let Some(path) = file_path else {
        return Ok(BoxMakeWriter::new(std::io::stdout));
    };
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {path}"))?;
    Ok(BoxMakeWriter::new(Arc::new(file)))
}

/// Read filter directives from the configured file, one or more per line
fn load_directives(config: &LoggingConfig) -> anyhow::Result<Option<String>> {
    let Some(path) = &config.directives_path else {
        return Ok(None);
    };

    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read log directives from {path}: {e}"))?;

    let directives = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .collect::<Vec<_>>()
        .join(",");

    Ok((!directives.is_empty()).then_some(directives))
}

/// Parse log level string to tracing Level
fn parse_log_level(level: &str) -> anyhow::Result<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" | "warning" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => Err(anyhow::anyhow!("Invalid log level: {level}")),
    }
}
