//! CLI argument definitions for the `colloquy` binary.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use std::path::PathBuf;

use colloquy_core::types::Locale;
use colloquy_core::ColloquyError;

/// Colloquy: a terminal client for a question-answering chat service.
#[derive(Parser, Debug)]
#[command(name = "colloquy", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Base URL of the chat service.
    #[arg(short = 'u', long = "base-url")]
    pub base_url: Option<String>,

    /// Speech/answer locale (en-US, hi-IN, gu-IN).
    #[arg(long = "locale")]
    pub locale: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// Use an in-memory store instead of the remote service.
    #[arg(long = "offline")]
    pub offline: bool,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > COLLOQUY_CONFIG env var > ~/.colloquy/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("COLLOQUY_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the service base URL.
    ///
    /// Priority: --base-url flag > COLLOQUY_BASE_URL env var > config file value.
    pub fn resolve_base_url(&self, config_url: &str) -> String {
        first_set(
            self.base_url.as_deref(),
            std::env::var("COLLOQUY_BASE_URL").ok().as_deref(),
            config_url,
        )
    }

    /// Resolve the starting locale.
    ///
    /// Priority: --locale flag > config file value. An unknown tag is an error.
    pub fn resolve_locale(&self, config_locale: Locale) -> Result<Locale, ColloquyError> {
        match self.locale {
            Some(ref tag) => tag.parse(),
            None => Ok(config_locale),
        }
    }

    /// Resolve the log level.
    ///
    /// Priority: --log-level flag > config file value.
    pub fn resolve_log_level(&self, config_level: &str) -> String {
        first_set(self.log_level.as_deref(), None, config_level)
    }
}

/// First non-blank value among flag, env and config.
fn first_set(flag: Option<&str>, env: Option<&str>, config: &str) -> String {
    [flag, env]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|v| !v.is_empty())
        .unwrap_or(config)
        .to_string()
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".colloquy").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".colloquy").join("config.toml");
    }
    PathBuf::from("config.toml")
}
