mod models;
mod store;
mod trait_def;

pub use models::*;
pub use store::SqliteLibraryStore;
pub use trait_def::LibraryStore;
