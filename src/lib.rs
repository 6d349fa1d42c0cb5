//! Mediagrab - a Rust CLI tool for turning media URLs into downloadable artifacts
//!
//! This library accepts a media URL plus a requested output type (video, audio, or
//! text) and produces a file: an mp4, an mp3, or a rendered transcript document.
//! Text extraction falls back from speech-to-text to manually authored captions to
//! auto-generated captions before giving up.

pub mod captions;
pub mod cli;
pub mod config;
pub mod delivery;
pub mod extractor;
pub mod pipeline;
pub mod stt;
pub mod transcribe;
pub mod utils;

pub use config::Config;
pub use extractor::{FormatDescriptor, FormatQuality, MediaInfo};
pub use pipeline::{MediaKind, MediaPipeline, ProcessRequest, ProcessResponse, ProcessingResult};

/// Result type used throughout the library
pub type Result<T> = anyhow::Result<T>;

/// Error types specific to the media pipeline
#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("Failed to get media info: {0}")]
    MetadataFetch(String),

    #[error("No suitable format found: {0}")]
    NoSuitableFormat(String),

    #[error("Speech-to-text API key is not configured: {0}")]
    MissingCredential(String),

    #[error("Failed to parse captions: {0}")]
    CaptionParse(String),

    #[error("Transcription unavailable: {0}")]
    TranscriptionUnavailable(String),

    #[error("Invalid media type: {0}")]
    InvalidMediaType(String),

    #[error("Artifact delivery failed: {0}")]
    Delivery(String),
}
