use super::byte_range::ByteWindow;
use std::io::SeekFrom;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeek, AsyncSeekExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

pub const COPY_BUFFER_SIZE: usize = 8192;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyCompletion {
    /// Every byte of the window was written.
    Complete,
    /// The source ended before the window was filled.
    SourceExhausted,
    /// The sink stopped accepting writes, usually a client disconnect.
    SinkClosed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CopyOutcome {
    pub bytes_copied: u64,
    pub completion: CopyCompletion,
}

/// Copies the bytes of `window` from `source` into `sink`, one buffer at a
/// time. Never reads past `window.end`.
pub async fn copy_window<S, W>(
    source: &mut S,
    window: ByteWindow,
    sink: &mut W,
) -> std::io::Result<CopyOutcome>
where
    S: AsyncRead + AsyncSeek + Unpin,
    W: AsyncWrite + Unpin,
{
    source.seek(SeekFrom::Start(window.start)).await?;

    let mut buffer = vec![0u8; COPY_BUFFER_SIZE];
    let mut remaining = window.len();
    let mut bytes_copied = 0u64;

    let outcome = |bytes_copied, completion| CopyOutcome {
        bytes_copied,
        completion,
    };

    while remaining > 0 {
        let to_read = remaining.min(COPY_BUFFER_SIZE as u64) as usize;
        let read = source.read(&mut buffer[..to_read]).await?;
        if read == 0 {
            debug!(
                "Source exhausted after {} of {} bytes",
                bytes_copied,
                window.len()
            );
            return Ok(outcome(bytes_copied, CopyCompletion::SourceExhausted));
        }

        if let Err(err) = sink.write_all(&buffer[..read]).await {
            debug!("Sink closed after {} bytes: {}", bytes_copied, err);
            return Ok(outcome(bytes_copied, CopyCompletion::SinkClosed));
        }
        bytes_copied += read as u64;
        remaining -= read as u64;
    }

    if let Err(err) = sink.flush().await {
        debug!("Sink closed while flushing: {}", err);
        return Ok(outcome(bytes_copied, CopyCompletion::SinkClosed));
    }
    Ok(outcome(bytes_copied, CopyCompletion::Complete))
}
