use anyhow::Result;
use sha2::{Digest, Sha256};
use url::Url;

/// Validate a URL and return normalized version
pub fn validate_and_normalize_url(url: &str) -> Result<String> {
    let parsed = Url::parse(url)
        .map_err(|_| anyhow::anyhow!("Invalid URL format: {}", url))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        anyhow::bail!("URL must use HTTP or HTTPS protocol");
    }

    Ok(parsed.to_string())
}

/// Sanitize a media title into a filesystem-safe key.
///
/// Every character that is not ASCII alphanumeric becomes an underscore, and the
/// result is lower-cased. Deterministic for a given title.
pub fn sanitize_title(title: &str) -> String {
    title
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// Derive the filename stem shared by every artifact of one request.
///
/// The sanitized title alone can collide across distinct sources with the same
/// title, so a short digest of the source URL is appended. The human-readable
/// title survives only in metadata.
pub fn artifact_stem(title: &str, url: &str) -> String {
    format!("{}-{}", sanitize_title(title), short_hash(url))
}

/// First 8 hex characters of SHA-256 of the input
fn short_hash(input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    digest[..4].iter().map(|b| format!("{:02x}", b)).collect()
}

/// Format duration in human-readable format
pub fn format_duration(seconds: f64) -> String {
    let total_seconds = seconds as u64;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, secs)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, secs)
    } else {
        format!("{}s", secs)
    }
}

/// Render a duration the way the response surface expects it: whole seconds
/// without a trailing fraction when there is none.
pub fn duration_display(seconds: f64) -> String {
    if seconds.fract() == 0.0 {
        format!("{}", seconds as u64)
    } else {
        format!("{}", seconds)
    }
}

/// Check if the current environment has required tools
pub async fn check_dependencies() -> Vec<String> {
    let mut missing = Vec::new();

    if !check_command_available("yt-dlp").await {
        missing.push("yt-dlp - required for media extraction and caption download".to_string());
    }

    if !check_command_available("ffmpeg").await {
        missing.push("ffmpeg - required for mp3 extraction and stream merging".to_string());
    }

    missing
}

/// Check if a command is available in PATH
async fn check_command_available(command: &str) -> bool {
    use tokio::process::Command;

    Command::new(command)
        .arg("--version")
        .output()
        .await
        .map(|output| output.status.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_title() {
        assert_eq!(sanitize_title("My Video! #1"), "my_video___1");
        assert_eq!(sanitize_title("Hello World"), "hello_world");
        assert_eq!(sanitize_title("ALLCAPS123"), "allcaps123");
        assert_eq!(sanitize_title("café"), "caf_");
        assert_eq!(sanitize_title(""), "");
    }

    #[test]
    fn test_sanitize_title_is_deterministic() {
        let a = sanitize_title("Some: Title / With * Junk?");
        let b = sanitize_title("Some: Title / With * Junk?");
        assert_eq!(a, b);
        assert_eq!(a, "some__title___with___junk_");
    }

    #[test]
    fn test_artifact_stem_separates_identical_titles() {
        let a = artifact_stem("Same Title", "https://example.com/watch?v=one");
        let b = artifact_stem("Same Title", "https://example.com/watch?v=two");
        assert_ne!(a, b);
        assert!(a.starts_with("same_title-"));
        assert!(b.starts_with("same_title-"));
    }

    #[test]
    fn test_artifact_stem_is_stable() {
        let a = artifact_stem("Same Title", "https://example.com/watch?v=one");
        let b = artifact_stem("Same Title", "https://example.com/watch?v=one");
        assert_eq!(a, b);
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(30.0), "30s");
        assert_eq!(format_duration(90.0), "1m 30s");
        assert_eq!(format_duration(3661.0), "1h 1m 1s");
    }

    #[test]
    fn test_duration_display() {
        assert_eq!(duration_display(212.0), "212");
        assert_eq!(duration_display(0.0), "0");
        assert_eq!(duration_display(12.5), "12.5");
    }

    #[test]
    fn test_validate_and_normalize_url() {
        assert!(validate_and_normalize_url("https://example.com").is_ok());
        assert!(validate_and_normalize_url("http://example.com").is_ok());
        assert!(validate_and_normalize_url("ftp://example.com").is_err());
        assert!(validate_and_normalize_url("not-a-url").is_err());
    }
}
