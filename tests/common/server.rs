//! Test server lifecycle management
//!
//! Each test gets an isolated server with its own library database.

use super::constants::*;
use super::fixtures::create_test_library;
use music_library_server::{
    make_app, open_library_db, RequestsLoggingLevel, ServerConfig, SqliteLibraryStore,
    SqlitePlaylistStore, SqliteUserStore, UserManager,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Test server instance with an isolated library.
///
/// When dropped, the server gracefully shuts down and temp resources are cleaned up.
pub struct TestServer {
    /// Base URL for making requests (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    /// The port the server is listening on
    #[allow(dead_code)]
    pub port: u16,

    /// Where the audio files live
    #[allow(dead_code)]
    pub media_path: PathBuf,

    // Private fields - keep resources alive until drop
    _temp_dir: TempDir,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestServer {
    /// Spawns a new test server on a random port.
    ///
    /// # Panics
    ///
    /// Panics if the fixtures cannot be created or the server does not
    /// become ready within the timeout.
    pub async fn spawn() -> Self {
        Self::spawn_with(|_| {}).await
    }

    /// Like `spawn`, letting the caller adjust the server config first.
    pub async fn spawn_with<F: FnOnce(&mut ServerConfig)>(configure: F) -> Self {
        let (temp_dir, db_dir, media_path) =
            create_test_library().expect("Failed to create test library");

        let db = open_library_db(db_dir.join("library.db")).expect("Failed to open library db");
        let library_store = Arc::new(SqliteLibraryStore::new(db.clone()));
        let playlist_store = Arc::new(SqlitePlaylistStore::new(db.clone()));
        let user_manager = Arc::new(UserManager::new(Arc::new(SqliteUserStore::new(db))));

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();
        let base_url = format!("http://127.0.0.1:{}", port);

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        let mut config = ServerConfig {
            port,
            requests_logging_level: RequestsLoggingLevel::None,
            frontend_dir_path: None,
            trust_user_id_header: false,
            media_path: media_path.clone(),
        };
        configure(&mut config);

        let app = make_app(config, library_store, playlist_store, user_manager)
            .expect("Failed to build app");

        // Spawn server in background task with graceful shutdown
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Server failed");
        });

        let server = Self {
            base_url,
            port,
            media_path,
            _temp_dir: temp_dir,
            _shutdown_tx: Some(shutdown_tx),
        };
        server.wait_for_ready().await;
        server
    }

    /// Polls the home endpoint until the server answers.
    async fn wait_for_ready(&self) {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("Failed to build reqwest client");

        let start = std::time::Instant::now();
        let timeout = Duration::from_millis(SERVER_READY_TIMEOUT_MS);

        loop {
            if start.elapsed() > timeout {
                panic!(
                    "Server did not become ready within {}ms",
                    SERVER_READY_TIMEOUT_MS
                );
            }

            match client.get(format!("{}/", self.base_url)).send().await {
                Ok(response) if response.status().is_success() => return,
                _ => {
                    tokio::time::sleep(Duration::from_millis(SERVER_READY_POLL_INTERVAL_MS)).await;
                }
            }
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
