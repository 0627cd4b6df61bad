pub mod config;
mod http_layers;
mod playlists;
mod responses;
pub mod server;
mod session;
mod songs;
pub mod state;
mod stream_song;

pub use config::ServerConfig;
pub use http_layers::*;
pub use server::{make_app, run_server};
pub use session::{
    Session, COOKIE_SESSION_TOKEN_KEY, HEADER_SESSION_TOKEN_KEY, HEADER_USER_ID_KEY,
};
