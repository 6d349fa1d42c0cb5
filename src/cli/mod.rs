use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::pipeline::MediaKind;

#[derive(Parser)]
#[command(
    name = "mediagrab",
    about = "Mediagrab - Download video or audio and extract transcripts from YouTube and other platforms",
    version,
    long_about = "A CLI tool that turns a media URL into a downloadable artifact: an mp4, an mp3, or a transcript document. Text extraction uses speech-to-text when an API key is configured and falls back to the source's captions otherwise."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Process a media URL into a downloadable artifact
    Process {
        /// Media URL to process
        #[arg(value_name = "URL")]
        url: String,

        /// Requested output type
        #[arg(short = 't', long = "type", value_enum, default_value = "video")]
        media_type: MediaTypeArg,

        /// Directory artifacts are written into (overrides the config file)
        #[arg(short, long, value_name = "DIR")]
        output_dir: Option<PathBuf>,

        /// Emit the raw JSON response instead of human-readable output
        #[arg(long)]
        json: bool,
    },

    /// Show resolved metadata for a URL without downloading anything
    Info {
        /// Media URL to inspect
        #[arg(value_name = "URL")]
        url: String,
    },

    /// Ship an existing artifact through the delivery webhook
    Deliver {
        /// File to deliver
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Title recorded in the delivery metadata (defaults to the file stem)
        #[arg(long)]
        title: Option<String>,

        /// Source URL recorded in the delivery metadata
        #[arg(long)]
        source: Option<String>,

        /// Duration in seconds recorded in the delivery metadata
        #[arg(long, default_value = "0")]
        duration: f64,
    },

    /// Inspect speech-to-text and delivery settings
    Config {
        /// Show current configuration
        #[arg(short, long)]
        show: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum MediaTypeArg {
    /// Best combined video+audio as mp4
    Video,
    /// Best audio-only extraction as mp3
    Audio,
    /// Transcript document
    Text,
}

impl MediaTypeArg {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaTypeArg::Video => "video",
            MediaTypeArg::Audio => "audio",
            MediaTypeArg::Text => "text",
        }
    }
}

impl From<MediaTypeArg> for MediaKind {
    fn from(arg: MediaTypeArg) -> Self {
        match arg {
            MediaTypeArg::Video => MediaKind::Video,
            MediaTypeArg::Audio => MediaKind::Audio,
            MediaTypeArg::Text => MediaKind::Text,
        }
    }
}
