use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

use super::{ExtractionTool, FormatDescriptor, FormatQuality, MediaInfo};
use crate::{PipelineError, Result};

/// Media extraction via yt-dlp
pub struct YtDlp {
    program: String,
}

/// Raw `--dump-json` payload, reduced to the fields the pipeline needs
#[derive(Debug, Deserialize)]
struct RawInfo {
    title: Option<String>,
    duration: Option<f64>,
    thumbnail: Option<String>,
    #[serde(default)]
    formats: Vec<RawFormat>,
}

#[derive(Debug, Deserialize)]
struct RawFormat {
    vcodec: Option<String>,
    acodec: Option<String>,
    quality: Option<Value>,
    url: Option<String>,
}

impl YtDlp {
    pub fn new() -> Self {
        Self {
            program: "yt-dlp".to_string(),
        }
    }

    /// Check if yt-dlp is available
    pub async fn check_availability(&self) -> Result<bool> {
        let output = Command::new(&self.program)
            .arg("--version")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await;

        Ok(output.map(|o| o.status.success()).unwrap_or(false))
    }

    async fn run(&self, args: &[&str]) -> Result<Vec<u8>> {
        tracing::debug!("Running {} {}", self.program, args.join(" "));

        let output = Command::new(&self.program)
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("{} failed: {}", self.program, error);
        }

        Ok(output.stdout)
    }
}

impl Default for YtDlp {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExtractionTool for YtDlp {
    async fn probe(&self, url: &str) -> Result<MediaInfo> {
        if !self.check_availability().await? {
            return Err(PipelineError::MetadataFetch(
                "yt-dlp is not available. Please install it: https://github.com/yt-dlp/yt-dlp"
                    .to_string(),
            )
            .into());
        }

        tracing::debug!("Querying media info for: {}", url);

        let stdout = self
            .run(&["--dump-json", "--no-playlist", url])
            .await
            .map_err(|e| PipelineError::MetadataFetch(e.to_string()))?;

        let json = String::from_utf8(stdout)
            .map_err(|e| PipelineError::MetadataFetch(format!("non-UTF-8 payload: {}", e)))?;

        let raw: RawInfo = serde_json::from_str(&json)
            .map_err(|e| PipelineError::MetadataFetch(format!("unparseable payload: {}", e)))?;

        let title = raw
            .title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                PipelineError::MetadataFetch("payload carries no usable title".to_string())
            })?
            .to_string();

        Ok(MediaInfo {
            title,
            duration_seconds: raw.duration.unwrap_or(0.0).max(0.0),
            thumbnail_url: raw.thumbnail,
            formats: map_formats(&raw.formats),
        })
    }

    async fn download_video(&self, url: &str, output: &Path) -> Result<()> {
        tracing::debug!("Downloading video for: {}", url);

        self.run(&[
            url,
            "-f",
            "bestvideo[ext=mp4]+bestaudio[ext=m4a]/best[ext=mp4]/best",
            "--no-playlist",
            "-o",
            &output.to_string_lossy(),
        ])
        .await?;

        Ok(())
    }

    async fn download_audio(&self, url: &str, output: &Path) -> Result<()> {
        tracing::debug!("Extracting audio for: {}", url);

        self.run(&[
            url,
            "-x",
            "--audio-format",
            "mp3",
            "--no-playlist",
            "-o",
            &output.to_string_lossy(),
        ])
        .await?;

        Ok(())
    }

    async fn download_subtitles(
        &self,
        url: &str,
        dir: &Path,
        stem: &str,
        auto: bool,
    ) -> Result<Vec<PathBuf>> {
        let mode = if auto { "--write-auto-sub" } else { "--write-sub" };
        tracing::debug!("Downloading captions ({}) for: {}", mode, url);

        let template = dir.join(stem);

        self.run(&[
            url,
            mode,
            "--skip-download",
            "--sub-format",
            "vtt",
            "--no-playlist",
            "-o",
            &template.to_string_lossy(),
        ])
        .await?;

        list_caption_files(dir, stem)
    }
}

/// Map raw tool formats onto descriptors.
///
/// yt-dlp reports `quality` as a number (occasionally a string); the formats
/// carrying the maximum value in the listing, or the literal string "best",
/// are tagged `Best`.
fn map_formats(raw: &[RawFormat]) -> Vec<FormatDescriptor> {
    let max_quality = raw
        .iter()
        .filter_map(|f| f.quality.as_ref().and_then(Value::as_f64))
        .fold(None::<f64>, |acc, q| {
            Some(acc.map_or(q, |m| if q > m { q } else { m }))
        });

    raw.iter()
        .filter_map(|f| {
            let download_url = f.url.clone()?;
            let quality = match &f.quality {
                Some(Value::String(s)) if s == "best" => FormatQuality::Best,
                Some(v) => match (v.as_f64(), max_quality) {
                    (Some(q), Some(max)) if q == max => FormatQuality::Best,
                    _ => FormatQuality::Other,
                },
                None => FormatQuality::Other,
            };

            Some(FormatDescriptor {
                has_video: has_codec(&f.vcodec),
                has_audio: has_codec(&f.acodec),
                quality,
                download_url,
            })
        })
        .collect()
}

fn has_codec(codec: &Option<String>) -> bool {
    codec.as_deref().map(|c| c != "none" && !c.is_empty()).unwrap_or(false)
}

/// Discover caption files the tool produced for a request.
///
/// yt-dlp derives the final caption filename from the output template (adding
/// language suffixes), so the produced files are found by listing the output
/// directory and filtering on the stem prefix and `.vtt` extension. Name-sorted
/// so repeated runs see the same first file.
pub fn list_caption_files(dir: &Path, stem: &str) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs_err::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            name.starts_with(stem) && name.ends_with(".vtt")
        })
        .collect();

    files.sort();

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(vcodec: &str, acodec: &str, quality: Value) -> RawFormat {
        RawFormat {
            vcodec: Some(vcodec.to_string()),
            acodec: Some(acodec.to_string()),
            quality: Some(quality),
            url: Some("https://cdn.example/stream".to_string()),
        }
    }

    #[test]
    fn test_map_formats_tags_numeric_maximum_as_best() {
        let formats = map_formats(&[
            raw("avc1", "mp4a", Value::from(5.0)),
            raw("avc1", "mp4a", Value::from(9.0)),
            raw("none", "mp4a", Value::from(3.0)),
        ]);

        assert_eq!(formats.len(), 3);
        assert_eq!(formats[0].quality, FormatQuality::Other);
        assert_eq!(formats[1].quality, FormatQuality::Best);
        assert_eq!(formats[2].quality, FormatQuality::Other);
    }

    #[test]
    fn test_map_formats_accepts_best_string() {
        let formats = map_formats(&[raw("avc1", "mp4a", Value::from("best"))]);
        assert_eq!(formats[0].quality, FormatQuality::Best);
    }

    #[test]
    fn test_map_formats_codec_presence() {
        let formats = map_formats(&[raw("none", "mp4a", Value::from(1.0))]);

        assert!(!formats[0].has_video);
        assert!(formats[0].has_audio);
    }

    #[test]
    fn test_map_formats_skips_entries_without_url() {
        let formats = map_formats(&[RawFormat {
            vcodec: Some("avc1".to_string()),
            acodec: Some("mp4a".to_string()),
            quality: None,
            url: None,
        }]);

        assert!(formats.is_empty());
    }

    #[test]
    fn test_list_caption_files_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        let stem = "my_video-a1b2c3d4";

        for name in [
            "my_video-a1b2c3d4.en.vtt",
            "my_video-a1b2c3d4.de.vtt",
            "my_video-a1b2c3d4.mp3",
            "unrelated.en.vtt",
        ] {
            fs_err::write(dir.path().join(name), "WEBVTT\n").unwrap();
        }

        let files = list_caption_files(dir.path(), stem).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();

        assert_eq!(
            names,
            vec!["my_video-a1b2c3d4.de.vtt", "my_video-a1b2c3d4.en.vtt"]
        );
    }

    #[test]
    fn test_list_caption_files_empty_dir() {
        let dir = tempfile::tempdir().unwrap();
        let files = list_caption_files(dir.path(), "anything").unwrap();
        assert!(files.is_empty());
    }
}
