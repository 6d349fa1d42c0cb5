use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::Serialize;
use std::path::Path;

#[cfg(test)]
use mockall::automock;

use crate::config::DeliveryConfig;
use crate::{PipelineError, Result};

/// Metadata shipped alongside a delivered artifact
#[derive(Debug, Clone)]
pub struct DeliveryMetadata {
    pub title: String,
    pub duration_seconds: f64,
    pub source_url: String,
}

/// Boundary to the remote-storage webhook.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ArtifactDelivery: Send + Sync {
    /// Ship a produced artifact with its metadata. A non-2xx response is a
    /// delivery failure.
    async fn deliver(&self, file_path: &Path, metadata: &DeliveryMetadata) -> Result<()>;
}

/// Delivery via a JSON webhook carrying the file content base64-encoded
pub struct WebhookDelivery {
    client: reqwest::Client,
    webhook_url: Option<String>,
    origin_tag: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WebhookPayload {
    file_name: String,
    file_extension: String,
    file_content: String,
    metadata: PayloadMetadata,
}

#[derive(Debug, Serialize)]
struct PayloadMetadata {
    title: String,
    duration: f64,
    source: String,
    timestamp: String,
    origin: String,
}

impl WebhookDelivery {
    pub fn new(config: &DeliveryConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            webhook_url: config.webhook_url.clone(),
            origin_tag: config.origin_tag.clone(),
        }
    }

    fn build_payload(&self, file_path: &Path, metadata: &DeliveryMetadata) -> Result<WebhookPayload> {
        let file_name = file_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| anyhow::anyhow!("Delivery path has no file name: {}", file_path.display()))?;

        let file_extension = file_path
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_default();

        let content = fs_err::read(file_path)?;

        Ok(WebhookPayload {
            file_name,
            file_extension,
            file_content: BASE64.encode(content),
            metadata: PayloadMetadata {
                title: metadata.title.clone(),
                duration: metadata.duration_seconds,
                source: metadata.source_url.clone(),
                timestamp: chrono::Utc::now().to_rfc3339(),
                origin: self.origin_tag.clone(),
            },
        })
    }
}

#[async_trait]
impl ArtifactDelivery for WebhookDelivery {
    async fn deliver(&self, file_path: &Path, metadata: &DeliveryMetadata) -> Result<()> {
        let url = self.webhook_url.as_deref().filter(|u| !u.trim().is_empty()).ok_or_else(|| {
            PipelineError::Delivery("no webhook URL is configured".to_string())
        })?;

        let payload = self.build_payload(file_path, metadata)?;

        tracing::info!("Delivering {} to webhook", payload.file_name);

        let response = self
            .client
            .post(url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| PipelineError::Delivery(e.to_string()))?;

        if !response.status().is_success() {
            return Err(PipelineError::Delivery(format!(
                "webhook responded with HTTP {}",
                response.status()
            ))
            .into());
        }

        tracing::info!("Artifact delivered: {}", payload.file_name);

        Ok(())
    }
}
