// Playback sources and queue assembly

use crate::error::{Result, SessionError};

/// MIME hints understood by downstream engines
pub mod mime {
    pub const DASH_MANIFEST: &str = "application/dash+xml";
    pub const VIDEO_MP4: &str = "video/mp4";
    pub const AUDIO_MPEG: &str = "audio/mpeg";
    pub const AUDIO_MP4: &str = "audio/mp4";
}

/// One playable unit: a URI, an optional content-type hint, and its
/// ordering index within the queue. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackSource {
    uri: String,
    mime_hint: Option<String>,
    index: usize,
}

impl PlaybackSource {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            mime_hint: None,
            index: 0,
        }
    }

    /// Attach an explicit content-type hint (e.g. a DASH manifest)
    pub fn with_mime_hint(mut self, mime: impl Into<String>) -> Self {
        self.mime_hint = Some(mime.into());
        self
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn mime_hint(&self) -> Option<&str> {
        self.mime_hint.as_deref()
    }

    /// Position of this source within its queue
    pub fn index(&self) -> usize {
        self.index
    }
}

/// Guess a content-type hint from the URI suffix.
/// Engines sniff containers themselves; this only covers the formats the
/// session layer is commonly fed.
pub fn mime_hint_for_uri(uri: &str) -> Option<&'static str> {
    let uri_lower = uri.to_lowercase();
    if uri_lower.contains(".mpd") {
        Some(mime::DASH_MANIFEST)
    } else if uri_lower.contains(".mp4") {
        Some(mime::VIDEO_MP4)
    } else if uri_lower.contains(".mp3") {
        Some(mime::AUDIO_MPEG)
    } else if uri_lower.contains(".m4a") || uri_lower.contains(".m4b") {
        Some(mime::AUDIO_MP4)
    } else {
        None
    }
}

fn validate(source: &PlaybackSource) -> Result<()> {
    let uri = source.uri.trim();
    if uri.is_empty() {
        return Err(SessionError::Configuration(
            "playback source has an empty URI".to_string(),
        ));
    }
    if !uri.contains("://") {
        return Err(SessionError::Configuration(format!(
            "playback source URI has no scheme: {}",
            uri
        )));
    }
    Ok(())
}

/// Resolve a source list into the ordered queue submitted to the engine.
///
/// Validation is best-effort: an empty list or a malformed URI fails here;
/// unreachable sources do not (the engine reports those asynchronously).
/// Insertion order is preserved and each entry gets its queue index.
/// Missing content-type hints are filled in from the URI suffix when
/// recognized.
pub fn build_queue(sources: &[PlaybackSource]) -> Result<Vec<PlaybackSource>> {
    if sources.is_empty() {
        return Err(SessionError::Configuration(
            "no playback sources configured".to_string(),
        ));
    }

    sources
        .iter()
        .enumerate()
        .map(|(index, source)| {
            validate(source)?;
            let mime_hint = source
                .mime_hint
                .clone()
                .or_else(|| mime_hint_for_uri(&source.uri).map(str::to_string));
            if mime_hint.is_none() {
                log::debug!("no content-type hint for {}", source.uri);
            }
            Ok(PlaybackSource {
                uri: source.uri.clone(),
                mime_hint,
                index,
            })
        })
        .collect()
}
