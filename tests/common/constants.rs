//! Shared constants for end-to-end tests
//!
//! When test data changes (user credentials, song ids, etc.), update only
//! this file.
#![allow(dead_code)]

// ============================================================================
// Test User Credentials
// ============================================================================

pub const TEST_USER: &str = "testuser";
pub const TEST_EMAIL: &str = "testuser@example.com";
pub const TEST_PASS: &str = "testpass123";

/// A second user, for ownership checks.
pub const OTHER_USER: &str = "otheruser";
pub const OTHER_EMAIL: &str = "otheruser@example.com";
pub const OTHER_PASS: &str = "otherpass123";

// ============================================================================
// Test Library
// ============================================================================

pub const ARTIST_1_NAME: &str = "The Test Band";
pub const ARTIST_2_NAME: &str = "Jazz Ensemble";

pub const ALBUM_1_TITLE: &str = "First Album";
pub const ALBUM_2_TITLE: &str = "Jazz Collection";

/// "Opening Track", mp3 audio of TEST_AUDIO_SIZE_BYTES bytes.
pub const SONG_1_ID: i64 = 1;
pub const SONG_1_TITLE: &str = "Opening Track";
pub const SONG_1_AUDIO_FILE: &str = "opening.mp3";

/// "Middle Track", flac audio stored with an absolute path.
pub const SONG_2_ID: i64 = 2;
pub const SONG_2_TITLE: &str = "Middle Track";
pub const SONG_2_AUDIO_FILE: &str = "middle.flac";

/// "Closing Track", no audio at all.
pub const SONG_3_ID: i64 = 3;
pub const SONG_3_TITLE: &str = "Closing Track";

/// "Smooth Jazz", its audio file is missing from the media directory.
pub const SONG_4_ID: i64 = 4;
pub const SONG_4_TITLE: &str = "Smooth Jazz";
pub const SONG_4_AUDIO_FILE: &str = "missing.ogg";

/// "Upbeat Jazz", its audio file is empty.
pub const SONG_5_ID: i64 = 5;
pub const SONG_5_TITLE: &str = "Upbeat Jazz";
pub const SONG_5_AUDIO_FILE: &str = "empty.wav";

pub const SONGS_COUNT: usize = 5;

pub const NONEXISTENT_ID: i64 = 9999;

/// Size of the generated audio files. Spans several copy buffers.
pub const TEST_AUDIO_SIZE_BYTES: usize = 20_000;

// ============================================================================
// Test Timeouts and Configuration
// ============================================================================

/// Maximum time to wait for server to become ready (milliseconds)
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;

/// Timeout for individual HTTP requests (seconds)
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Polling interval when waiting for server ready (milliseconds)
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 50;
