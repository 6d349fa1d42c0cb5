use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use url::Url;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Speech-to-text service settings
    pub stt: SttConfig,

    /// Artifact delivery webhook settings
    pub delivery: DeliveryConfig,

    /// Application settings
    pub app: AppConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SttConfig {
    /// API key for the speech-to-text service
    pub api_key: Option<String>,

    /// Model identifier sent with each transcription request
    pub model: String,

    /// Transcription endpoint (OpenAI-compatible)
    pub endpoint: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryConfig {
    /// Webhook endpoint that receives produced documents
    pub webhook_url: Option<String>,

    /// Origin tag attached to delivery metadata
    pub origin_tag: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Directory artifacts are written into; defaults to ./downloads
    pub download_dir: Option<PathBuf>,

    /// Base URL prepended when building servable artifact URLs
    pub public_base_url: Option<String>,
}

impl Default for SttConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "whisper-1".to_string(),
            endpoint: "https://api.openai.com/v1/audio/transcriptions".to_string(),
        }
    }
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            origin_tag: "mediagrab".to_string(),
        }
    }
}

impl SttConfig {
    /// Whether a usable credential is present
    pub fn is_configured(&self) -> bool {
        self.api_key
            .as_deref()
            .map(|key| !key.trim().is_empty())
            .unwrap_or(false)
    }
}

impl DeliveryConfig {
    /// Whether a delivery webhook is set up
    pub fn is_configured(&self) -> bool {
        self.webhook_url
            .as_deref()
            .map(|u| !u.trim().is_empty())
            .unwrap_or(false)
    }
}

impl Config {
    /// Load configuration from file or create default
    pub async fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        let mut config = if config_path.exists() {
            let content =
                fs_err::read_to_string(&config_path).context("Failed to read config file")?;

            serde_yaml::from_str(&content).context("Failed to parse config file")?
        } else {
            let config = Self::default();
            config.save().await?;
            config
        };

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Save configuration to file
    pub async fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            fs_err::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(self).context("Failed to serialize config")?;

        fs_err::write(&config_path, content).context("Failed to write config file")?;

        Ok(())
    }

    /// Get configuration file path
    pub fn config_path() -> Result<PathBuf> {
        // First try current directory for easy testing
        let local_config = PathBuf::from("config.yaml");
        if local_config.exists() {
            return Ok(local_config);
        }

        let config_dir = dirs::config_dir().context("Could not determine config directory")?;

        Ok(config_dir.join("mediagrab").join("config.yaml"))
    }

    /// Environment wins over the config file for secrets
    fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var("MEDIAGRAB_STT_API_KEY") {
            if !key.trim().is_empty() {
                self.stt.api_key = Some(key);
            }
        }

        if let Ok(url) = std::env::var("MEDIAGRAB_WEBHOOK_URL") {
            if !url.trim().is_empty() {
                self.delivery.webhook_url = Some(url);
            }
        }
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        if self.stt.model.trim().is_empty() {
            anyhow::bail!("Speech-to-text model must not be empty");
        }

        Url::parse(&self.stt.endpoint).context("Speech-to-text endpoint is not a valid URL")?;

        if let Some(url) = self.delivery.webhook_url.as_deref() {
            if !url.trim().is_empty() {
                Url::parse(url).context("Delivery webhook is not a valid URL")?;
            }
        }

        Ok(())
    }

    /// Directory artifacts are written into
    pub fn download_dir(&self) -> PathBuf {
        self.app
            .download_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("downloads"))
    }

    /// Display current configuration without echoing secrets
    pub fn display(&self) {
        println!("Current Configuration:");
        println!(
            "  Speech-to-text: {}",
            if self.stt.is_configured() {
                "configured"
            } else {
                "not configured"
            }
        );
        println!("  STT Model: {}", self.stt.model);
        println!("  STT Endpoint: {}", self.stt.endpoint);
        println!(
            "  Delivery Webhook: {}",
            if self.delivery.is_configured() {
                "configured"
            } else {
                "not configured"
            }
        );
        println!("  Download Dir: {}", self.download_dir().display());
        if let Some(base) = &self.app.public_base_url {
            println!("  Public Base URL: {}", base);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid_but_unconfigured() {
        let config = Config::default();

        assert!(config.validate().is_ok());
        assert!(!config.stt.is_configured());
        assert!(!config.delivery.is_configured());
    }

    #[test]
    fn test_placeholder_like_blank_key_is_unconfigured() {
        let mut config = Config::default();
        config.stt.api_key = Some("  ".to_string());

        assert!(!config.stt.is_configured());
    }

    #[test]
    fn test_configured_predicates() {
        let mut config = Config::default();
        config.stt.api_key = Some("sk-test".to_string());
        config.delivery.webhook_url = Some("https://hooks.example/drop".to_string());

        assert!(config.stt.is_configured());
        assert!(config.delivery.is_configured());
    }

    #[test]
    fn test_validate_rejects_bad_webhook() {
        let mut config = Config::default();
        config.delivery.webhook_url = Some("not a url".to_string());

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_download_dir_default() {
        let config = Config::default();
        assert_eq!(config.download_dir(), PathBuf::from("downloads"));
    }
}
