use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub mod formats;
pub mod ytdlp;

#[cfg(test)]
use mockall::automock;

use crate::Result;

/// Resolved metadata for a source URL
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaInfo {
    /// Media title as reported by the source
    pub title: String,

    /// Duration in seconds
    pub duration_seconds: f64,

    /// Thumbnail image URL if available
    pub thumbnail_url: Option<String>,

    /// Available encodings, in the order the tool lists them
    pub formats: Vec<FormatDescriptor>,
}

/// One available encoding of the source media
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormatDescriptor {
    /// Whether the encoding carries a video stream
    pub has_video: bool,

    /// Whether the encoding carries an audio stream
    pub has_audio: bool,

    /// Declared quality tier
    pub quality: FormatQuality,

    /// Direct download URL for this encoding
    pub download_url: String,
}

/// Quality tier declared by the extraction tool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormatQuality {
    Best,
    Other,
}

/// Boundary to the external media-extraction tool.
///
/// One implementation wraps yt-dlp; tests substitute mocks to drive the
/// pipeline without network or subprocess access.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ExtractionTool: Send + Sync {
    /// Query metadata for a URL without downloading anything
    async fn probe(&self, url: &str) -> Result<MediaInfo>;

    /// Download the best combined video+audio rendition to `output`
    async fn download_video(&self, url: &str, output: &Path) -> Result<()>;

    /// Extract the best audio rendition as mp3 to `output`
    async fn download_audio(&self, url: &str, output: &Path) -> Result<()>;

    /// Download caption files for a URL into `dir` using the given filename
    /// stem; `auto` selects auto-generated captions instead of manually
    /// authored ones. Returns the produced caption files, name-sorted.
    async fn download_subtitles(
        &self,
        url: &str,
        dir: &Path,
        stem: &str,
        auto: bool,
    ) -> Result<Vec<PathBuf>>;
}
