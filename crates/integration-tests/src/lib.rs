//! Integration tests for the booklist back-office.
//!
//! # Running Tests
//!
//! ```bash
//! # Migrate and seed a database, then start the server
//! cargo run -p booklist-cli -- migrate
//! cargo run -p booklist-cli -- seed
//! cargo run -p booklist-server
//!
//! # Run the ignored integration tests against it
//! cargo test -p booklist-integration-tests -- --ignored
//! ```
//!
//! # Environment Variables
//!
//! - `BOOKLIST_TEST_URL` - Server base URL (default `http://localhost:3001`)
//! - `BOOKLIST_TEST_USERNAME` / `BOOKLIST_TEST_PASSWORD` - Admin login
//!   (default: the seeded `admin` / `admin123`)
//! - `BOOKLIST_DATABASE_URL` - Used by tests that inspect rows directly

#![allow(clippy::expect_used)]

use reqwest::Client;
use serde_json::{Value, json};

/// Base URL of the running server.
#[must_use]
pub fn base_url() -> String {
    std::env::var("BOOKLIST_TEST_URL").unwrap_or_else(|_| "http://localhost:3001".to_string())
}

/// Absolute URL for an API path such as `/api/stock`.
#[must_use]
pub fn url(path: &str) -> String {
    format!("{}{path}", base_url())
}

/// A client without a session.
#[must_use]
pub fn anonymous_client() -> Client {
    Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to create HTTP client")
}

/// A client logged in as the admin user.
///
/// # Panics
///
/// Panics if the login request fails.
pub async fn admin_client() -> Client {
    let client = anonymous_client();
    let username = std::env::var("BOOKLIST_TEST_USERNAME").unwrap_or_else(|_| "admin".into());
    let password = std::env::var("BOOKLIST_TEST_PASSWORD").unwrap_or_else(|_| "admin123".into());

    let resp = client
        .post(url("/api/auth/login"))
        .json(&json!({ "username": username, "password": password }))
        .send()
        .await
        .expect("Failed to send login request");
    assert!(resp.status().is_success(), "admin login failed: {}", resp.status());

    client
}

/// Id of the logged-in user.
///
/// # Panics
///
/// Panics if the session has no user.
pub async fn current_user_id(client: &Client) -> String {
    let me: Value = client
        .get(url("/api/auth/me"))
        .send()
        .await
        .expect("Failed to fetch current user")
        .json()
        .await
        .expect("Invalid /api/auth/me response");
    me["id"].as_str().expect("session user has no id").to_owned()
}

/// A location name no other test run uses, so ledger keys never collide.
#[must_use]
pub fn unique_location(prefix: &str) -> String {
    format!("{prefix}-{}", uuid::Uuid::new_v4().simple())
}
