//! HTTP client for end-to-end tests
//!
//! Wraps reqwest with one method per server endpoint. When API routes or
//! request formats change, update only this file.
#![allow(dead_code)]

use super::constants::*;
use reqwest::Response;
use serde_json::{json, Value};
use std::time::Duration;

/// HTTP test client with cookie-based session management
pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    /// The base URL of the test server
    pub base_url: String,
}

impl TestClient {
    /// Creates a new unauthenticated client
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .cookie_store(true) // Automatically handle session cookies
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self { client, base_url }
    }

    /// Creates a client logged in as the regular test user.
    ///
    /// # Panics
    ///
    /// Panics if authentication fails (indicates test infrastructure problem).
    pub async fn authenticated(base_url: String) -> Self {
        Self::authenticated_as(base_url, TEST_USER, TEST_PASS).await
    }

    pub async fn authenticated_as(base_url: String, username: &str, password: &str) -> Self {
        let client = Self::new(base_url);

        let response = client.login(username, password).await;
        assert_eq!(
            response.status(),
            reqwest::StatusCode::OK,
            "Authentication of {} failed: {:?}",
            username,
            response.text().await
        );

        client
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    // ========================================================================
    // Home
    // ========================================================================

    /// GET /
    pub async fn get_home(&self) -> Response {
        self.client
            .get(self.url("/"))
            .send()
            .await
            .expect("Home request failed")
    }

    // ========================================================================
    // Authentication Endpoints
    // ========================================================================

    /// POST /api/auth/register
    pub async fn register(&self, username: &str, email: &str, password: &str) -> Response {
        self.client
            .post(self.url("/api/auth/register"))
            .json(&json!({ "username": username, "email": email, "password": password }))
            .send()
            .await
            .expect("Register request failed")
    }

    /// POST /api/auth/login
    pub async fn login(&self, username: &str, password: &str) -> Response {
        self.client
            .post(self.url("/api/auth/login"))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await
            .expect("Login request failed")
    }

    /// POST /api/auth/logout
    pub async fn logout(&self) -> Response {
        self.client
            .post(self.url("/api/auth/logout"))
            .send()
            .await
            .expect("Logout request failed")
    }

    /// GET /api/auth/session
    pub async fn get_session(&self) -> Response {
        self.client
            .get(self.url("/api/auth/session"))
            .send()
            .await
            .expect("Session request failed")
    }

    // ========================================================================
    // Catalog Endpoints
    // ========================================================================

    /// GET /api/songs
    pub async fn get_songs(&self) -> Response {
        self.client
            .get(self.url("/api/songs"))
            .send()
            .await
            .expect("Get songs request failed")
    }

    /// GET /api/songs?search={fragment}
    pub async fn search_songs(&self, fragment: &str) -> Response {
        self.client
            .get(self.url("/api/songs"))
            .query(&[("search", fragment)])
            .send()
            .await
            .expect("Search songs request failed")
    }

    /// GET /api/songs/{id}
    pub async fn get_song(&self, id: i64) -> Response {
        self.client
            .get(self.url(&format!("/api/songs/{}", id)))
            .send()
            .await
            .expect("Get song request failed")
    }

    /// POST /api/songs
    pub async fn add_song(&self, song: Value) -> Response {
        self.client
            .post(self.url("/api/songs"))
            .json(&song)
            .send()
            .await
            .expect("Add song request failed")
    }

    /// DELETE /api/songs/{id}
    pub async fn delete_song(&self, id: i64) -> Response {
        self.client
            .delete(self.url(&format!("/api/songs/{}", id)))
            .send()
            .await
            .expect("Delete song request failed")
    }

    /// GET /api/artists/{id}
    pub async fn get_artist(&self, id: i64) -> Response {
        self.client
            .get(self.url(&format!("/api/artists/{}", id)))
            .send()
            .await
            .expect("Get artist request failed")
    }

    /// GET /api/albums/{id}
    pub async fn get_album(&self, id: i64) -> Response {
        self.client
            .get(self.url(&format!("/api/albums/{}", id)))
            .send()
            .await
            .expect("Get album request failed")
    }

    // ========================================================================
    // Playlist Endpoints
    // ========================================================================

    /// GET /api/playlists
    pub async fn get_playlists(&self) -> Response {
        self.client
            .get(self.url("/api/playlists"))
            .send()
            .await
            .expect("Get playlists request failed")
    }

    /// GET /api/playlists/{id}
    pub async fn get_playlist(&self, id: i64) -> Response {
        self.client
            .get(self.url(&format!("/api/playlists/{}", id)))
            .send()
            .await
            .expect("Get playlist request failed")
    }

    /// POST /api/playlists
    pub async fn create_playlist(&self, name: &str, description: Option<&str>) -> Response {
        self.client
            .post(self.url("/api/playlists"))
            .json(&json!({ "name": name, "description": description }))
            .send()
            .await
            .expect("Create playlist request failed")
    }

    /// Creates a playlist and returns its id.
    pub async fn create_playlist_id(&self, name: &str) -> i64 {
        let response = self.create_playlist(name, None).await;
        assert_eq!(response.status(), reqwest::StatusCode::CREATED);
        let body: Value = response.json().await.expect("Invalid playlist JSON");
        body["playlistId"].as_i64().expect("Missing playlistId")
    }

    /// PUT /api/playlists/{id}
    pub async fn update_playlist(
        &self,
        id: i64,
        name: &str,
        description: Option<&str>,
    ) -> Response {
        self.client
            .put(self.url(&format!("/api/playlists/{}", id)))
            .json(&json!({ "name": name, "description": description }))
            .send()
            .await
            .expect("Update playlist request failed")
    }

    /// DELETE /api/playlists/{id}
    pub async fn delete_playlist(&self, id: i64) -> Response {
        self.client
            .delete(self.url(&format!("/api/playlists/{}", id)))
            .send()
            .await
            .expect("Delete playlist request failed")
    }

    /// POST /api/playlists/{id}
    pub async fn add_song_to_playlist(&self, id: i64, song_id: i64) -> Response {
        self.client
            .post(self.url(&format!("/api/playlists/{}", id)))
            .json(&json!({ "songId": song_id }))
            .send()
            .await
            .expect("Add song to playlist request failed")
    }

    /// DELETE /api/playlists/{id}/{song_id}
    pub async fn remove_song_from_playlist(&self, id: i64, song_id: i64) -> Response {
        self.client
            .delete(self.url(&format!("/api/playlists/{}/{}", id, song_id)))
            .send()
            .await
            .expect("Remove song from playlist request failed")
    }

    // ========================================================================
    // Streaming Endpoints
    // ========================================================================

    /// GET /api/audio?id={id}
    pub async fn stream_song(&self, id: &str) -> Response {
        self.client
            .get(self.url("/api/audio"))
            .query(&[("id", id)])
            .send()
            .await
            .expect("Stream request failed")
    }

    /// GET /api/audio?id={id} with a Range header
    pub async fn stream_song_with_range(&self, id: &str, range: &str) -> Response {
        self.client
            .get(self.url("/api/audio"))
            .query(&[("id", id)])
            .header("Range", range)
            .send()
            .await
            .expect("Stream request with range failed")
    }

    /// GET /api/audio/{id}
    pub async fn stream_song_by_path(&self, id: i64) -> Response {
        self.client
            .get(self.url(&format!("/api/audio/{}", id)))
            .send()
            .await
            .expect("Stream request failed")
    }
}
