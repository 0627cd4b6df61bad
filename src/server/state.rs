use axum::extract::FromRef;

use crate::library::LibraryStore;
use crate::playlist::PlaylistStore;
use crate::user::UserManager;
use std::sync::Arc;
use std::time::Instant;

use super::ServerConfig;

pub type GuardedLibraryStore = Arc<dyn LibraryStore>;
pub type GuardedPlaylistStore = Arc<dyn PlaylistStore>;
pub type GuardedUserManager = Arc<UserManager>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub library_store: GuardedLibraryStore,
    pub playlist_store: GuardedPlaylistStore,
    pub user_manager: GuardedUserManager,
}

impl ServerState {
    pub fn new(
        config: ServerConfig,
        library_store: GuardedLibraryStore,
        playlist_store: GuardedPlaylistStore,
        user_manager: GuardedUserManager,
    ) -> ServerState {
        ServerState {
            config,
            start_time: Instant::now(),
            library_store,
            playlist_store,
            user_manager,
        }
    }
}

impl FromRef<ServerState> for GuardedLibraryStore {
    fn from_ref(input: &ServerState) -> Self {
        input.library_store.clone()
    }
}

impl FromRef<ServerState> for GuardedPlaylistStore {
    fn from_ref(input: &ServerState) -> Self {
        input.playlist_store.clone()
    }
}

impl FromRef<ServerState> for GuardedUserManager {
    fn from_ref(input: &ServerState) -> Self {
        input.user_manager.clone()
    }
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}
