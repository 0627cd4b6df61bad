use std::path::Path;

const DEFAULT_AUDIO_CONTENT_TYPE: &str = "audio/mpeg";

/// Content type of an audio file, picked from its extension.
pub fn audio_content_type<P: AsRef<Path>>(path: P) -> &'static str {
    let extension = path
        .as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    match extension.as_deref() {
        Some("mp3") => "audio/mpeg",
        Some("wav") => "audio/wav",
        Some("ogg") => "audio/ogg",
        Some("m4a") => "audio/mp4",
        Some("flac") => "audio/flac",
        _ => DEFAULT_AUDIO_CONTENT_TYPE,
    }
}
