//! HTTP client for end-to-end tests
//!
//! Wraps reqwest with one method per server endpoint. When routes or
//! request formats change, update only this file.

use reqwest::Response;
use serde_json::{json, Value};
use std::time::Duration;

const REQUEST_TIMEOUT_SECS: u64 = 5;

pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    /// The base URL of the test server
    pub base_url: String,
}

impl TestClient {
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self { client, base_url }
    }

    /// GET /
    pub async fn home(&self) -> Response {
        self.client
            .get(format!("{}/", self.base_url))
            .send()
            .await
            .expect("Home request failed")
    }

    /// GET /health
    pub async fn health(&self) -> Response {
        self.client
            .get(format!("{}/health", self.base_url))
            .send()
            .await
            .expect("Health request failed")
    }

    // ========================================================================
    // Player Endpoints
    // ========================================================================

    /// POST /player
    pub async fn create_player(&self, player_name: &str, email: &str) -> Response {
        self.create_player_json(json!({
            "player_name": player_name,
            "email": email,
        }))
        .await
    }

    /// POST /player with an arbitrary body
    pub async fn create_player_json(&self, body: Value) -> Response {
        self.client
            .post(format!("{}/player", self.base_url))
            .json(&body)
            .send()
            .await
            .expect("Create player request failed")
    }

    /// GET /players
    pub async fn list_players(&self) -> Response {
        self.client
            .get(format!("{}/players", self.base_url))
            .send()
            .await
            .expect("List players request failed")
    }

    /// DELETE /player/{id}
    pub async fn delete_player(&self, id: i64) -> Response {
        self.client
            .delete(format!("{}/player/{}", self.base_url, id))
            .send()
            .await
            .expect("Delete player request failed")
    }

    // ========================================================================
    // Session Endpoints
    // ========================================================================

    /// POST /player/{id}/session
    pub async fn create_session(&self, player_id: i64, date: &str, location: &str) -> Response {
        self.create_session_json(
            player_id,
            json!({
                "date": date,
                "location": location,
                "game_type": "NLHE",
            }),
        )
        .await
    }

    /// POST /player/{id}/session with an arbitrary body
    pub async fn create_session_json(&self, player_id: i64, body: Value) -> Response {
        self.client
            .post(format!("{}/player/{}/session", self.base_url, player_id))
            .json(&body)
            .send()
            .await
            .expect("Create session request failed")
    }

    /// GET /sessions
    pub async fn list_sessions(&self) -> Response {
        self.client
            .get(format!("{}/sessions", self.base_url))
            .send()
            .await
            .expect("List sessions request failed")
    }

    /// PUT /session/{id}
    pub async fn update_session(&self, id: i64, body: Value) -> Response {
        self.client
            .put(format!("{}/session/{}", self.base_url, id))
            .json(&body)
            .send()
            .await
            .expect("Update session request failed")
    }

    /// DELETE /session/{id}
    pub async fn delete_session(&self, id: i64) -> Response {
        self.client
            .delete(format!("{}/session/{}", self.base_url, id))
            .send()
            .await
            .expect("Delete session request failed")
    }

    // ========================================================================
    // Interval Endpoints
    // ========================================================================

    /// POST /session/{id}/interval
    pub async fn create_interval(&self, session_id: i64, timestamp: &str, stack: i64) -> Response {
        self.create_interval_json(
            session_id,
            json!({
                "timestamp": timestamp,
                "stack": stack,
            }),
        )
        .await
    }

    /// POST /session/{id}/interval with an arbitrary body
    pub async fn create_interval_json(&self, session_id: i64, body: Value) -> Response {
        self.client
            .post(format!("{}/session/{}/interval", self.base_url, session_id))
            .json(&body)
            .send()
            .await
            .expect("Create interval request failed")
    }

    /// GET /intervals
    pub async fn list_intervals(&self) -> Response {
        self.client
            .get(format!("{}/intervals", self.base_url))
            .send()
            .await
            .expect("List intervals request failed")
    }

    /// DELETE /interval/{id}
    pub async fn delete_interval(&self, id: i64) -> Response {
        self.client
            .delete(format!("{}/interval/{}", self.base_url, id))
            .send()
            .await
            .expect("Delete interval request failed")
    }
}
