//! Top-level media-processing orchestration.
//!
//! One request is one URL plus a requested output type. The pipeline resolves
//! metadata, derives the artifact stem, then runs the matching branch: video
//! download, audio extraction, or the text-extraction fallback chain followed
//! by document rendering and optional webhook delivery.

use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::captions;
use crate::config::Config;
use crate::delivery::{ArtifactDelivery, DeliveryMetadata, WebhookDelivery};
use crate::extractor::formats::select_format;
use crate::extractor::ytdlp::YtDlp;
use crate::extractor::{ExtractionTool, MediaInfo};
use crate::stt::{SpeechToText, WhisperClient};
use crate::transcribe::TranscriptExtractor;
use crate::utils;
use crate::{PipelineError, Result};

/// Requested output type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Video,
    Audio,
    Text,
}

impl std::str::FromStr for MediaKind {
    type Err = PipelineError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "video" => Ok(MediaKind::Video),
            "audio" => Ok(MediaKind::Audio),
            "text" => Ok(MediaKind::Text),
            other => Err(PipelineError::InvalidMediaType(other.to_string())),
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaKind::Video => write!(f, "video"),
            MediaKind::Audio => write!(f, "audio"),
            MediaKind::Text => write!(f, "text"),
        }
    }
}

/// What kind of artifact a request produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Video,
    Audio,
    Document,
}

/// Uniform output of one processed request
#[derive(Debug)]
pub struct ProcessingResult {
    /// Artifact on disk
    pub output_path: PathBuf,

    /// Artifact kind
    pub kind: ArtifactKind,

    /// Human-readable status message
    pub message: String,

    /// Servable URL for the artifact
    pub file_url: String,

    /// Resolved source metadata
    pub media_info: MediaInfo,
}

/// Raw request shape accepted at the surface
#[derive(Debug, Clone, Deserialize)]
pub struct ProcessRequest {
    pub url: String,

    #[serde(rename = "type")]
    pub media_type: String,
}

/// Uniform response shape returned at the surface
#[derive(Debug, Serialize)]
pub struct ProcessResponse {
    pub success: bool,
    pub message: String,

    #[serde(rename = "fileUrl", skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,

    #[serde(rename = "mediaInfo", skip_serializing_if = "Option::is_none")]
    pub media_info: Option<MediaSummary>,
}

/// Metadata subset echoed back to the caller
#[derive(Debug, Serialize)]
pub struct MediaSummary {
    pub title: String,
    pub duration: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

impl ProcessResponse {
    fn from_result(result: &ProcessingResult) -> Self {
        Self {
            success: true,
            message: result.message.clone(),
            file_url: Some(result.file_url.clone()),
            media_info: Some(MediaSummary {
                title: result.media_info.title.clone(),
                duration: utils::duration_display(result.media_info.duration_seconds),
                thumbnail: result.media_info.thumbnail_url.clone(),
            }),
        }
    }

    fn failure(message: String) -> Self {
        Self {
            success: false,
            message,
            file_url: None,
            media_info: None,
        }
    }
}

/// Main media-processing pipeline
pub struct MediaPipeline {
    config: Config,
    extractor: Arc<dyn ExtractionTool>,
    stt: Arc<dyn SpeechToText>,
    delivery: Arc<dyn ArtifactDelivery>,
}

impl MediaPipeline {
    /// Create a pipeline backed by yt-dlp, the configured speech-to-text
    /// endpoint, and the configured delivery webhook.
    pub fn new(config: Config) -> Self {
        let stt = WhisperClient::new(&config.stt);
        let delivery = WebhookDelivery::new(&config.delivery);

        Self {
            extractor: Arc::new(YtDlp::new()),
            stt: Arc::new(stt),
            delivery: Arc::new(delivery),
            config,
        }
    }

    #[cfg(test)]
    fn with_components(
        config: Config,
        extractor: Arc<dyn ExtractionTool>,
        stt: Arc<dyn SpeechToText>,
        delivery: Arc<dyn ArtifactDelivery>,
    ) -> Self {
        Self {
            config,
            extractor,
            stt,
            delivery,
        }
    }

    /// Resolve metadata for a URL without producing an artifact
    pub async fn media_info(&self, url: &str) -> Result<MediaInfo> {
        utils::validate_and_normalize_url(url)?;
        self.extractor.probe(url).await
    }

    /// Process one request into an artifact
    pub async fn process(&self, url: &str, kind: MediaKind) -> Result<ProcessingResult> {
        utils::validate_and_normalize_url(url)?;

        tracing::info!("Resolving media info for: {}", url);
        let info = self.extractor.probe(url).await?;

        let stem = utils::artifact_stem(&info.title, url);
        let dir = self.config.download_dir();
        fs_err::create_dir_all(&dir)?;

        let (output_path, artifact_kind, message) = match kind {
            MediaKind::Video => {
                let format = select_format(&info.formats, true)?;
                tracing::debug!("Best combined format: {}", format.download_url);

                let output = dir.join(format!("{}.mp4", stem));
                let progress = download_spinner("Downloading video with yt-dlp...");
                self.extractor.download_video(url, &output).await?;
                progress.finish_with_message("Download complete");

                (
                    output,
                    ArtifactKind::Video,
                    "Video downloaded successfully. Click to download.".to_string(),
                )
            }
            MediaKind::Audio => {
                let format = select_format(&info.formats, false)?;
                tracing::debug!("Best audio format: {}", format.download_url);

                let output = dir.join(format!("{}.mp3", stem));
                let progress = download_spinner("Extracting audio with yt-dlp...");
                self.extractor.download_audio(url, &output).await?;
                progress.finish_with_message("Extraction complete");

                (
                    output,
                    ArtifactKind::Audio,
                    "Audio extracted successfully. Click to download.".to_string(),
                )
            }
            MediaKind::Text => {
                let outcome = TranscriptExtractor::new(
                    Arc::clone(&self.extractor),
                    Arc::clone(&self.stt),
                )
                .run(url, info.duration_seconds, &dir, &stem)
                .await?;

                tracing::info!("Transcript produced from {}", outcome.source);

                let document = captions::render_document(&outcome.cues)?;
                let output = dir.join(format!("{}.docx", stem));
                fs_err::write(&output, document)?;

                if self.config.delivery.is_configured() {
                    let metadata = DeliveryMetadata {
                        title: info.title.clone(),
                        duration_seconds: info.duration_seconds,
                        source_url: url.to_string(),
                    };

                    // Delivery is best-effort; the artifact already exists locally
                    if let Err(e) = self.delivery.deliver(&output, &metadata).await {
                        tracing::warn!("Artifact delivery failed, continuing: {:#}", e);
                    }
                }

                (
                    output,
                    ArtifactKind::Document,
                    "Audio transcribed successfully. Click to download the document.".to_string(),
                )
            }
        };

        Ok(ProcessingResult {
            file_url: self.artifact_url(&output_path),
            output_path,
            kind: artifact_kind,
            message,
            media_info: info,
        })
    }

    /// Process a raw surface request, mapping every error into the uniform
    /// failure response. The type tag is validated before anything touches the
    /// filesystem.
    pub async fn process_request(&self, request: ProcessRequest) -> ProcessResponse {
        let kind = match request.media_type.parse::<MediaKind>() {
            Ok(kind) => kind,
            Err(e) => return ProcessResponse::failure(e.to_string()),
        };

        match self.process(&request.url, kind).await {
            Ok(result) => ProcessResponse::from_result(&result),
            Err(e) => ProcessResponse::failure(e.to_string()),
        }
    }

    /// Ship an existing artifact through the delivery webhook. Unlike the text
    /// path, failures here surface to the caller.
    pub async fn deliver_artifact(
        &self,
        file: &Path,
        metadata: &DeliveryMetadata,
    ) -> Result<()> {
        if !self.config.delivery.is_configured() {
            return Err(
                PipelineError::Delivery("no webhook URL is configured".to_string()).into(),
            );
        }

        if !file.is_file() {
            anyhow::bail!("File not found: {}", file.display());
        }

        self.delivery.deliver(file, metadata).await
    }

    /// Servable URL for a produced artifact
    fn artifact_url(&self, path: &Path) -> String {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        match self.config.app.public_base_url.as_deref() {
            Some(base) => format!("{}/downloads/{}", base.trim_end_matches('/'), name),
            None => path
                .canonicalize()
                .map(|p| format!("file://{}", p.display()))
                .unwrap_or_else(|_| path.display().to_string()),
        }
    }
}

fn download_spinner(message: &str) -> ProgressBar {
    let progress = ProgressBar::new_spinner();
    progress.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap(),
    );
    progress.set_message(message.to_string());
    progress
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delivery::MockArtifactDelivery;
    use crate::extractor::{FormatDescriptor, FormatQuality, MockExtractionTool};
    use crate::stt::MockSpeechToText;

    fn sample_info() -> MediaInfo {
        MediaInfo {
            title: "My Talk".to_string(),
            duration_seconds: 212.0,
            thumbnail_url: Some("https://example.com/thumb.jpg".to_string()),
            formats: vec![
                FormatDescriptor {
                    has_video: true,
                    has_audio: true,
                    quality: FormatQuality::Best,
                    download_url: "https://cdn.example/av".to_string(),
                },
                FormatDescriptor {
                    has_video: false,
                    has_audio: true,
                    quality: FormatQuality::Best,
                    download_url: "https://cdn.example/a".to_string(),
                },
            ],
        }
    }

    fn test_config(dir: &Path) -> Config {
        let mut config = Config::default();
        config.app.download_dir = Some(dir.join("downloads"));
        config
    }

    fn idle_stt() -> Arc<MockSpeechToText> {
        let mut stt = MockSpeechToText::new();
        stt.expect_is_configured().return_const(false);
        Arc::new(stt)
    }

    #[test]
    fn test_media_kind_parsing() {
        assert_eq!("video".parse::<MediaKind>().unwrap(), MediaKind::Video);
        assert_eq!("AUDIO".parse::<MediaKind>().unwrap(), MediaKind::Audio);
        assert_eq!("text".parse::<MediaKind>().unwrap(), MediaKind::Text);

        let err = "subtitle".parse::<MediaKind>().unwrap_err();
        assert!(matches!(err, PipelineError::InvalidMediaType(_)));
    }

    #[test]
    fn test_invalid_type_fails_without_filesystem_writes() {
        tokio_test::block_on(async {
            let root = tempfile::tempdir().unwrap();

            // No expectations: any call into a collaborator would panic
            let pipeline = MediaPipeline::with_components(
                test_config(root.path()),
                Arc::new(MockExtractionTool::new()),
                idle_stt(),
                Arc::new(MockArtifactDelivery::new()),
            );

            let response = pipeline
                .process_request(ProcessRequest {
                    url: "https://example.com/watch?v=abc".to_string(),
                    media_type: "subtitle".to_string(),
                })
                .await;

            assert!(!response.success);
            assert!(response.message.contains("Invalid media type"));
            assert!(response.file_url.is_none());
            assert!(!root.path().join("downloads").exists());
        });
    }

    #[tokio::test]
    async fn test_video_branch_produces_mp4_result() {
        let root = tempfile::tempdir().unwrap();

        let mut extractor = MockExtractionTool::new();
        extractor
            .expect_probe()
            .times(1)
            .returning(|_| Ok(sample_info()));
        extractor
            .expect_download_video()
            .times(1)
            .returning(|_, output| {
                fs_err::write(output, b"mp4 bytes")?;
                Ok(())
            });

        let pipeline = MediaPipeline::with_components(
            test_config(root.path()),
            Arc::new(extractor),
            idle_stt(),
            Arc::new(MockArtifactDelivery::new()),
        );

        let url = "https://example.com/watch?v=abc";
        let result = pipeline.process(url, MediaKind::Video).await.unwrap();

        let stem = utils::artifact_stem("My Talk", url);
        assert_eq!(result.kind, ArtifactKind::Video);
        assert_eq!(
            result.output_path.file_name().unwrap().to_string_lossy(),
            format!("{}.mp4", stem)
        );
        assert!(result.output_path.exists());
        assert!(result.message.contains("Video downloaded"));
    }

    #[tokio::test]
    async fn test_audio_branch_requires_audio_only_format() {
        let root = tempfile::tempdir().unwrap();

        let mut extractor = MockExtractionTool::new();
        extractor.expect_probe().times(1).returning(|_| {
            let mut info = sample_info();
            // Combined format only: audio selection must fail, not guess
            info.formats.retain(|f| f.has_video);
            Ok(info)
        });

        let pipeline = MediaPipeline::with_components(
            test_config(root.path()),
            Arc::new(extractor),
            idle_stt(),
            Arc::new(MockArtifactDelivery::new()),
        );

        let err = pipeline
            .process("https://example.com/watch?v=abc", MediaKind::Audio)
            .await
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::NoSuitableFormat(_))
        ));
    }

    #[tokio::test]
    async fn test_text_branch_renders_document_and_survives_delivery_failure() {
        let root = tempfile::tempdir().unwrap();
        let mut config = test_config(root.path());
        config.delivery.webhook_url = Some("https://hooks.example/drop".to_string());

        let url = "https://example.com/watch?v=abc";
        let stem = utils::artifact_stem("My Talk", url);
        let downloads = root.path().join("downloads");

        let mut extractor = MockExtractionTool::new();
        extractor
            .expect_probe()
            .times(1)
            .returning(|_| Ok(sample_info()));

        let caption_name = format!("{}.en.vtt", stem);
        extractor
            .expect_download_subtitles()
            .times(1)
            .returning(move |_, dir, _, _| {
                let path = dir.join(&caption_name);
                fs_err::write(
                    &path,
                    "WEBVTT\n\n1\n00:00:00.000 --> 00:00:02.000\nHello world\n",
                )?;
                Ok(vec![path])
            });

        let mut delivery = MockArtifactDelivery::new();
        delivery
            .expect_deliver()
            .times(1)
            .returning(|_, _| Err(PipelineError::Delivery("HTTP 500".to_string()).into()));

        let pipeline = MediaPipeline::with_components(
            config,
            Arc::new(extractor),
            idle_stt(),
            Arc::new(delivery),
        );

        let result = pipeline.process(url, MediaKind::Text).await.unwrap();

        assert_eq!(result.kind, ArtifactKind::Document);
        assert!(downloads.join(format!("{}.docx", stem)).exists());
        assert!(downloads.join(format!("{}.txt", stem)).exists());
        assert!(result.message.contains("transcribed"));
    }

    #[tokio::test]
    async fn test_process_request_success_shape() {
        let root = tempfile::tempdir().unwrap();

        let mut extractor = MockExtractionTool::new();
        extractor
            .expect_probe()
            .times(1)
            .returning(|_| Ok(sample_info()));
        extractor
            .expect_download_audio()
            .times(1)
            .returning(|_, _| Ok(()));

        let pipeline = MediaPipeline::with_components(
            test_config(root.path()),
            Arc::new(extractor),
            idle_stt(),
            Arc::new(MockArtifactDelivery::new()),
        );

        let response = pipeline
            .process_request(ProcessRequest {
                url: "https://example.com/watch?v=abc".to_string(),
                media_type: "audio".to_string(),
            })
            .await;

        assert!(response.success);
        let summary = response.media_info.unwrap();
        assert_eq!(summary.title, "My Talk");
        assert_eq!(summary.duration, "212");
        assert!(response.file_url.unwrap().ends_with(".mp3"));
    }
}
