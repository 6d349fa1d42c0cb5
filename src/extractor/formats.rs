//! Format selection over the descriptors a probe returns.
//!
//! Pure logic, no I/O. The selector never guesses: zero matching descriptors is
//! an error, and so is a match set where nothing is declared best.

use super::{FormatDescriptor, FormatQuality};
use crate::{PipelineError, Result};

/// Pick the encoding to report for a request.
///
/// Video requests need combined video+audio; audio requests need audio-only.
/// Among the matches the one declared `Best` wins. When matches exist but none
/// is declared best the source listing is ambiguous and selection fails rather
/// than picking an arbitrary entry.
pub fn select_format(formats: &[FormatDescriptor], want_video: bool) -> Result<&FormatDescriptor> {
    let matches: Vec<&FormatDescriptor> = formats
        .iter()
        .filter(|f| {
            if want_video {
                f.has_video && f.has_audio
            } else {
                !f.has_video && f.has_audio
            }
        })
        .collect();

    if matches.is_empty() {
        let wanted = if want_video { "video" } else { "audio" };
        return Err(PipelineError::NoSuitableFormat(format!(
            "no {} format available for this source",
            wanted
        ))
        .into());
    }

    matches
        .iter()
        .find(|f| f.quality == FormatQuality::Best)
        .copied()
        .ok_or_else(|| {
            PipelineError::NoSuitableFormat(
                "source lists candidate formats but none is declared best".to_string(),
            )
            .into()
        })
}
