//! Byte-range resolution and bounded copying of audio files.

mod byte_range;
mod content_type;
mod copier;

pub use byte_range::{ByteWindow, ResolvedRange};
pub use content_type::audio_content_type;
pub use copier::{copy_window, CopyCompletion, CopyOutcome, COPY_BUFFER_SIZE};
