//! Timed-caption handling: WebVTT parsing and transcript document rendering.
//!
//! Captions arrive either from yt-dlp subtitle downloads or from the minimal
//! single-cue document the speech-to-text path writes. Both funnel through
//! [`parse_vtt`] into [`TranscriptCue`] sequences, which render into a .docx
//! transcript with per-cue timestamps.

use std::io::Cursor;
use std::sync::OnceLock;

use anyhow::Result;
use docx_rs::{Docx, Paragraph, Run};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::PipelineError;

/// One timed caption unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptCue {
    /// Start offset in seconds
    pub start_seconds: f64,

    /// End offset in seconds
    pub end_seconds: f64,

    /// Spoken text; may be empty, the cue still renders
    pub text: String,
}

fn timing_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^(?:(\d{1,2}):)?(\d{2}):(\d{2})[.,](\d{3})\s*-->\s*(?:(\d{1,2}):)?(\d{2}):(\d{2})[.,](\d{3})",
        )
        .expect("timing pattern compiles")
    })
}

fn markup_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]*>").expect("markup pattern compiles"))
}

/// Parse a WebVTT caption document into an ordered cue sequence.
///
/// Cue blocks are separated by blank lines; a timing line opens a cue and every
/// following non-blank line joins its text. The `WEBVTT` header, metadata lines
/// yt-dlp emits (`Kind:`, `Language:`), `NOTE`/`STYLE` blocks, and bare cue
/// index lines are discarded. Inline markup tags are stripped.
pub fn parse_vtt(document: &str) -> Result<Vec<TranscriptCue>> {
    let mut cues: Vec<TranscriptCue> = Vec::new();
    let mut current: Option<TranscriptCue> = None;

    for raw_line in document.lines() {
        let line = markup_pattern().replace_all(raw_line.trim(), "").into_owned();

        if line.is_empty() {
            if let Some(cue) = current.take() {
                cues.push(cue);
            }
            continue;
        }

        if let Some((start, end)) = parse_timing_line(&line) {
            if let Some(cue) = current.take() {
                cues.push(cue);
            }
            current = Some(TranscriptCue {
                start_seconds: start,
                end_seconds: end,
                text: String::new(),
            });
            continue;
        }

        if current.is_none() {
            // Between cues only headers, block markers, and index lines appear
            continue;
        }

        if let Some(cue) = current.as_mut() {
            if !cue.text.is_empty() {
                cue.text.push('\n');
            }
            cue.text.push_str(&line);
        }
    }

    if let Some(cue) = current.take() {
        cues.push(cue);
    }

    if cues.is_empty() {
        return Err(PipelineError::CaptionParse(
            "caption document contains no parsable cues".to_string(),
        )
        .into());
    }

    Ok(cues)
}

/// Parse a `HH:MM:SS.mmm --> HH:MM:SS.mmm` timing line (hours optional)
fn parse_timing_line(line: &str) -> Option<(f64, f64)> {
    let caps = timing_pattern().captures(line)?;

    let field = |i: usize| -> f64 {
        caps.get(i)
            .map(|m| m.as_str().parse::<f64>().unwrap_or(0.0))
            .unwrap_or(0.0)
    };

    let start = field(1) * 3600.0 + field(2) * 60.0 + field(3) + field(4) / 1000.0;
    let end = field(5) * 3600.0 + field(6) * 60.0 + field(7) + field(8) / 1000.0;

    Some((start, end))
}

/// Format an offset as `HH:MM:SS`, truncating to whole seconds.
pub fn format_clock(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;

    format!("{:02}:{:02}:{:02}", hours, minutes, secs)
}

/// Format an offset as a WebVTT timestamp, whole seconds only
fn vtt_timestamp(seconds: f64) -> String {
    format!("{}.000", format_clock(seconds))
}

/// The bold timestamp prefix rendered in front of each transcript paragraph
pub fn cue_prefix(cue: &TranscriptCue) -> String {
    format!(
        "[{} - {}]",
        format_clock(cue.start_seconds),
        format_clock(cue.end_seconds)
    )
}

/// Build the minimal caption document for a transcript without native timing:
/// a single cue spanning the whole duration.
pub fn single_cue_vtt(text: &str, duration_seconds: f64) -> String {
    format!(
        "WEBVTT\n\n1\n00:00:00.000 --> {}\n{}\n",
        vtt_timestamp(duration_seconds),
        text
    )
}

/// Concatenate cue texts into the plain-text transcript file body
pub fn plain_text(cues: &[TranscriptCue]) -> String {
    cues.iter()
        .map(|cue| cue.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render cues into transcript document bytes (.docx).
///
/// Layout: a bold "Transcript" heading, one blank separator, then one paragraph
/// per cue with a bold timestamp prefix and regular-weight body text.
pub fn render_document(cues: &[TranscriptCue]) -> Result<Vec<u8>> {
    let mut doc = Docx::new()
        .add_paragraph(
            Paragraph::new().add_run(Run::new().add_text("Transcript").bold().size(28)),
        )
        .add_paragraph(Paragraph::new());

    for cue in cues {
        doc = doc.add_paragraph(
            Paragraph::new()
                .add_run(
                    Run::new()
                        .add_text(format!("{} ", cue_prefix(cue)))
                        .bold()
                        .size(20),
                )
                .add_run(Run::new().add_text(cue.text.clone()).size(24)),
        );
    }

    let mut buffer = Cursor::new(Vec::new());
    doc.build()
        .pack(&mut buffer)
        .map_err(|e| anyhow::anyhow!("Failed to pack transcript document: {}", e))?;

    Ok(buffer.into_inner())
}
