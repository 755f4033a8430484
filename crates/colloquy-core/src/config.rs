use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{ColloquyError, Result};
use crate::types::Locale;

/// Top-level configuration for the Colloquy client.
///
/// Loaded from `~/.colloquy/config.toml` by default. Every section and field
/// has a default, so a partial or empty file is valid.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ColloquyConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub remote: RemoteConfig,
    #[serde(default)]
    pub speech: SpeechConfig,
}

impl ColloquyConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ColloquyConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| ColloquyError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Remote question-answering service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Base URL of the session/answer service, without a trailing slash.
    pub base_url: String,
    /// Per-request timeout in seconds. A timeout is treated as the service
    /// being unavailable.
    pub timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Speech input settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Locale used for recognition and for the answer language hint.
    pub default_locale: Locale,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            default_locale: Locale::EnUs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config() {
        let config = ColloquyConfig::default();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.remote.base_url, "http://127.0.0.1:8000");
        assert_eq!(config.remote.timeout_secs, 30);
        assert_eq!(config.speech.default_locale, Locale::EnUs);
    }

    #[test]
    fn test_load_valid_config() {
        let content = r#"
[general]
log_level = "debug"

[remote]
base_url = "http://chat.internal:9000"
timeout_secs = 5

[speech]
default_locale = "hi-IN"
"#;
        let file = create_temp_config(content);
        let config = ColloquyConfig::load(file.path()).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.remote.base_url, "http://chat.internal:9000");
        assert_eq!(config.remote.timeout_secs, 5);
        assert_eq!(config.speech.default_locale, Locale::HiIn);
    }

    #[test]
    fn test_load_partial_config_uses_defaults() {
        let file = create_temp_config("[remote]\ntimeout_secs = 10\n");
        let config = ColloquyConfig::load(file.path()).unwrap();
        assert_eq!(config.remote.timeout_secs, 10);
        assert_eq!(config.remote.base_url, "http://127.0.0.1:8000");
        assert_eq!(config.general.log_level, "info");
    }

    #[test]
    fn test_config_empty_toml_uses_all_defaults() {
        let file = create_temp_config("");
        let config = ColloquyConfig::load(file.path()).unwrap();
        assert_eq!(config.speech.default_locale, Locale::EnUs);
    }

    #[test]
    fn test_config_load_invalid_toml() {
        let file = create_temp_config("remote = [[[");
        let result = ColloquyConfig::load(file.path());
        assert!(matches!(result, Err(ColloquyError::Config(_))));
    }

    #[test]
    fn test_config_unknown_locale_rejected() {
        let file = create_temp_config("[speech]\ndefault_locale = \"fr-FR\"\n");
        assert!(ColloquyConfig::load(file.path()).is_err());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = ColloquyConfig::default();
        config.remote.base_url = "http://10.0.0.2:8000".to_string();
        config.speech.default_locale = Locale::GuIn;
        config.save(&path).unwrap();

        let reloaded = ColloquyConfig::load(&path).unwrap();
        assert_eq!(reloaded.remote.base_url, "http://10.0.0.2:8000");
        assert_eq!(reloaded.speech.default_locale, Locale::GuIn);
    }
}
