//! Music library server
//!
//! A song catalog with user playlists, served over HTTP together with the
//! audio files, which can be streamed with byte range requests.

pub mod config;
pub mod library;
pub mod library_db;
pub mod media;
pub mod playlist;
pub mod server;
pub mod sqlite_persistence;
pub mod user;

// Re-export commonly used types for convenience
pub use library::{LibraryStore, SqliteLibraryStore};
pub use library_db::open_library_db;
pub use playlist::{PlaylistStore, SqlitePlaylistStore};
pub use server::{make_app, run_server, RequestsLoggingLevel, ServerConfig};
pub use user::{SqliteUserStore, UserManager};
