//! Common test infrastructure
//!
//! This module provides everything needed for end-to-end tests: an isolated
//! server per test and an HTTP client with one method per endpoint.
//!
//! # Example
//!
//! ```no_run
//! mod common;
//! use common::{TestClient, TestServer};
//! use reqwest::StatusCode;
//!
//! #[tokio::test]
//! async fn test_list_players() {
//!     let server = TestServer::spawn().await;
//!     let client = TestClient::new(server.base_url.clone());
//!
//!     let response = client.list_players().await;
//!     assert_eq!(response.status(), StatusCode::OK);
//! }
//! ```

mod client;
mod server;

// Public API - this is what tests import
pub use client::TestClient;
pub use server::TestServer;
