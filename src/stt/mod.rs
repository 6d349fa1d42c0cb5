use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;

#[cfg(test)]
use mockall::automock;

use crate::config::SttConfig;
use crate::{PipelineError, Result};

/// Boundary to the external speech-to-text service.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SpeechToText: Send + Sync {
    /// Whether a usable credential is present. Callers check this before
    /// spending any work on the transcription path.
    fn is_configured(&self) -> bool;

    /// Transcribe an audio file into plain text
    async fn transcribe(&self, audio_path: &Path) -> Result<String>;
}

/// Client for a Whisper-compatible `audio/transcriptions` endpoint
pub struct WhisperClient {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

impl WhisperClient {
    pub fn new(config: &SttConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
        }
    }

    fn credential(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                PipelineError::MissingCredential(
                    "set the speech-to-text API key in the config file or environment".to_string(),
                )
                .into()
            })
    }
}

#[async_trait]
impl SpeechToText for WhisperClient {
    fn is_configured(&self) -> bool {
        self.credential().is_ok()
    }

    async fn transcribe(&self, audio_path: &Path) -> Result<String> {
        let key = self.credential()?.to_string();

        tracing::info!("Transcribing audio file: {}", audio_path.display());

        let file_name = audio_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "audio.mp3".to_string());

        let content = fs_err::read(audio_path)?;

        let part = reqwest::multipart::Part::bytes(content)
            .file_name(file_name)
            .mime_str("audio/mpeg")?;

        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("model", self.model.clone());

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(key)
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Speech-to-text request failed: HTTP {}: {}", status, body);
        }

        let parsed: TranscriptionResponse = response.json().await?;

        tracing::info!("Transcription completed successfully");

        Ok(parsed.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SttConfig;

    fn stt_config(api_key: Option<&str>) -> SttConfig {
        SttConfig {
            api_key: api_key.map(|k| k.to_string()),
            ..SttConfig::default()
        }
    }

    #[test]
    fn test_unconfigured_without_key() {
        let client = WhisperClient::new(&stt_config(None));
        assert!(!client.is_configured());
    }

    #[test]
    fn test_blank_key_is_unconfigured() {
        let client = WhisperClient::new(&stt_config(Some("   ")));
        assert!(!client.is_configured());
    }

    #[test]
    fn test_configured_with_key() {
        let client = WhisperClient::new(&stt_config(Some("sk-test")));
        assert!(client.is_configured());
    }

    #[test]
    fn test_transcribe_without_key_is_missing_credential() {
        let client = WhisperClient::new(&stt_config(None));
        let err = tokio_test::block_on(client.transcribe(Path::new("/tmp/nothing.mp3")))
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::MissingCredential(_))
        ));
    }
}
