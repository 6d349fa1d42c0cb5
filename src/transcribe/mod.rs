//! Text-extraction fallback chain.
//!
//! A transcript request tries speech-to-text first, then manually authored
//! captions, then auto-generated captions. The stages are strictly ordered and
//! short-circuit on the first success; only when every stage comes up empty
//! does the request fail.

use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use uuid::Uuid;

use crate::captions::{self, TranscriptCue};
use crate::extractor::ExtractionTool;
use crate::stt::SpeechToText;
use crate::{PipelineError, Result};

/// Where a produced transcript came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranscriptSource {
    SpeechToText,
    ManualCaptions,
    AutoCaptions,
}

impl std::fmt::Display for TranscriptSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TranscriptSource::SpeechToText => write!(f, "speech-to-text"),
            TranscriptSource::ManualCaptions => write!(f, "manual captions"),
            TranscriptSource::AutoCaptions => write!(f, "auto-generated captions"),
        }
    }
}

/// Result of a successful text extraction
#[derive(Debug)]
pub struct TranscriptOutcome {
    /// Ordered transcript cues
    pub cues: Vec<TranscriptCue>,

    /// Plain-text transcript file
    pub text_path: PathBuf,

    /// Caption document backing the transcript
    pub caption_path: PathBuf,

    /// Stage that produced the transcript
    pub source: TranscriptSource,
}

/// Fallback stages, in the order they are attempted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Transcription,
    ManualSubtitles,
    AutoSubtitles,
    Failed,
}

impl Stage {
    /// Transition taken when a stage produces nothing
    fn after_miss(self) -> Stage {
        match self {
            Stage::Transcription => Stage::ManualSubtitles,
            Stage::ManualSubtitles => Stage::AutoSubtitles,
            Stage::AutoSubtitles => Stage::Failed,
            Stage::Failed => Stage::Failed,
        }
    }
}

/// Runs the fallback chain for one request
pub struct TranscriptExtractor {
    extractor: Arc<dyn ExtractionTool>,
    stt: Arc<dyn SpeechToText>,
}

impl TranscriptExtractor {
    pub fn new(extractor: Arc<dyn ExtractionTool>, stt: Arc<dyn SpeechToText>) -> Self {
        Self { extractor, stt }
    }

    /// Produce a transcript for `url`, writing `<stem>.txt` and `<stem>.vtt`
    /// into `dir`.
    pub async fn run(
        &self,
        url: &str,
        duration_seconds: f64,
        dir: &Path,
        stem: &str,
    ) -> Result<TranscriptOutcome> {
        let mut stage = Stage::Transcription;

        loop {
            stage = match stage {
                Stage::Transcription => {
                    match self.attempt_transcription(url, duration_seconds, dir, stem).await {
                        Ok(outcome) => return Ok(outcome),
                        Err(e) => {
                            tracing::warn!(
                                "Speech-to-text failed, falling back to captions: {:#}",
                                e
                            );
                            stage.after_miss()
                        }
                    }
                }
                Stage::ManualSubtitles => {
                    match self.attempt_captions(url, dir, stem, false).await? {
                        Some(outcome) => return Ok(outcome),
                        None => {
                            tracing::info!(
                                "No manually authored captions found, trying auto-generated"
                            );
                            stage.after_miss()
                        }
                    }
                }
                Stage::AutoSubtitles => match self.attempt_captions(url, dir, stem, true).await? {
                    Some(outcome) => return Ok(outcome),
                    None => stage.after_miss(),
                },
                Stage::Failed => {
                    return Err(PipelineError::TranscriptionUnavailable(
                        "no captions found and speech-to-text did not produce a transcript; \
                         configure a speech-to-text API key or choose a source with captions"
                            .to_string(),
                    )
                    .into())
                }
            };
        }
    }

    /// Stage 1: extract audio and run speech-to-text over it.
    ///
    /// The credential check runs before any download so an unconfigured key
    /// costs nothing. The transcript has no native timing, so it persists as a
    /// single cue spanning the whole duration.
    async fn attempt_transcription(
        &self,
        url: &str,
        duration_seconds: f64,
        dir: &Path,
        stem: &str,
    ) -> Result<TranscriptOutcome> {
        if !self.stt.is_configured() {
            return Err(PipelineError::MissingCredential(
                "set the speech-to-text API key in the config file or environment".to_string(),
            )
            .into());
        }

        let scratch = TempDir::new()?;
        let audio_path = scratch
            .path()
            .join(format!("audio_{}.mp3", &Uuid::new_v4().to_string()[..8]));

        let progress = ProgressBar::new_spinner();
        progress.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap(),
        );
        progress.set_message("Extracting audio for transcription...");

        self.extractor.download_audio(url, &audio_path).await?;

        progress.set_message("Transcribing audio...");
        let transcript = self.stt.transcribe(&audio_path).await?;
        progress.finish_with_message("Transcription complete");

        let text_path = dir.join(format!("{}.txt", stem));
        fs_err::write(&text_path, &transcript)?;

        let caption_path = dir.join(format!("{}.vtt", stem));
        fs_err::write(
            &caption_path,
            captions::single_cue_vtt(&transcript, duration_seconds),
        )?;

        Ok(TranscriptOutcome {
            cues: vec![TranscriptCue {
                start_seconds: 0.0,
                end_seconds: duration_seconds,
                text: transcript,
            }],
            text_path,
            caption_path,
            source: TranscriptSource::SpeechToText,
        })
    }

    /// Stages 2 and 3: request caption files and parse the first one found.
    ///
    /// Returns `Ok(None)` when the tool produced no caption files, which is the
    /// condition that advances the chain; tool and parse errors are terminal.
    async fn attempt_captions(
        &self,
        url: &str,
        dir: &Path,
        stem: &str,
        auto: bool,
    ) -> Result<Option<TranscriptOutcome>> {
        let files = self.extractor.download_subtitles(url, dir, stem, auto).await?;

        let Some(first) = files.first() else {
            return Ok(None);
        };

        tracing::debug!("Parsing caption file: {}", first.display());

        let content = fs_err::read_to_string(first)?;
        let cues = captions::parse_vtt(&content)?;

        let text_path = dir.join(format!("{}.txt", stem));
        fs_err::write(&text_path, captions::plain_text(&cues))?;

        let source = if auto {
            TranscriptSource::AutoCaptions
        } else {
            TranscriptSource::ManualCaptions
        };

        Ok(Some(TranscriptOutcome {
            cues,
            text_path,
            caption_path: first.clone(),
            source,
        }))
    }
}
