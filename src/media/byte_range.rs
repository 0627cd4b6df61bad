//! Resolution of `Range` request headers against a known resource length.

use axum::http::StatusCode;

const BYTES_UNIT_PREFIX: &str = "bytes=";

/// An inclusive byte window, `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteWindow {
    pub start: u64,
    pub end: u64,
}

impl ByteWindow {
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedRange {
    /// The whole resource. `window` is None only for an empty resource.
    Full {
        window: Option<ByteWindow>,
        total_length: u64,
    },
    Partial {
        window: ByteWindow,
        total_length: u64,
    },
    Unsatisfiable { total_length: u64 },
}

/// The two bounds as written in the header, before looking at the length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RequestedRange {
    start: u64,
    end: Option<u64>,
}

impl RequestedRange {
    fn parse(header: &str) -> Option<RequestedRange> {
        let value = header.trim().strip_prefix(BYTES_UNIT_PREFIX)?;
        if value.contains(',') {
            return None;
        }

        let parts: Vec<&str> = value.split('-').map(str::trim).collect();
        if parts.len() != 2 {
            return None;
        }

        // Suffix ranges ("bytes=-500") are not supported.
        let start = parts[0].parse::<u64>().ok()?;
        let end = match parts[1] {
            "" => None,
            end => Some(end.parse::<u64>().ok()?),
        };
        if matches!(end, Some(end) if end < start) {
            return None;
        }

        Some(RequestedRange { start, end })
    }
}

impl ResolvedRange {
    /// Malformed headers are served as if no header had been sent.
    pub fn resolve(header: Option<&str>, total_length: u64) -> ResolvedRange {
        let full = ResolvedRange::Full {
            window: total_length.checked_sub(1).map(|end| ByteWindow { start: 0, end }),
            total_length,
        };

        let requested = match header.and_then(RequestedRange::parse) {
            Some(requested) => requested,
            None => return full,
        };
        if requested.start >= total_length {
            return ResolvedRange::Unsatisfiable { total_length };
        }

        let last_byte = total_length - 1;
        let end = requested.end.map_or(last_byte, |end| end.min(last_byte));
        ResolvedRange::Partial {
            window: ByteWindow {
                start: requested.start,
                end,
            },
            total_length,
        }
    }

    pub fn window(&self) -> Option<ByteWindow> {
        match self {
            ResolvedRange::Full { window, .. } => *window,
            ResolvedRange::Partial { window, .. } => Some(*window),
            ResolvedRange::Unsatisfiable { .. } => None,
        }
    }

    pub fn content_length(&self) -> u64 {
        self.window().map_or(0, |window| window.len())
    }

    pub fn content_range(&self) -> Option<String> {
        match self {
            ResolvedRange::Full { .. } => None,
            ResolvedRange::Partial {
                window,
                total_length,
            } => Some(format!(
                "bytes {}-{}/{}",
                window.start, window.end, total_length
            )),
            ResolvedRange::Unsatisfiable { total_length } => {
                Some(format!("bytes */{}", total_length))
            }
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ResolvedRange::Full { .. } => StatusCode::OK,
            ResolvedRange::Partial { .. } => StatusCode::PARTIAL_CONTENT,
            ResolvedRange::Unsatisfiable { .. } => StatusCode::RANGE_NOT_SATISFIABLE,
        }
    }
}
