mod models;
mod store;
mod trait_def;

pub use models::*;
pub use store::SqlitePlaylistStore;
pub use trait_def::PlaylistStore;
